use murk_core::{LuaParser, NodeKind, ParserAdapter, SourceBuffer, Span, Splice};

#[test]
fn test_descending_splices_keep_earlier_spans_valid() {
    let source = "print('a', 'bb', 'ccc')";
    let tree = LuaParser::new().parse(source).unwrap();
    let splices: Vec<Splice> = tree
        .literals()
        .filter(|node| matches!(node.kind, NodeKind::StringLiteral(_)))
        .map(|node| Splice::new(node.span.unwrap(), "X"))
        .collect();

    let mut buffer = SourceBuffer::new(source);
    assert_eq!(buffer.splice_descending(splices).unwrap(), 3);
    assert_eq!(buffer.as_str(), "print(X, X, X)");
}

#[test]
fn test_overlapping_splices_are_rejected() {
    let mut buffer = SourceBuffer::new("abcdef");
    let result = buffer.splice_descending(vec![
        Splice::new(Span::new(0, 3), "x"),
        Splice::new(Span::new(2, 4), "y"),
    ]);
    assert!(result.is_err());
}

#[test]
fn test_splice_outside_buffer_is_rejected() {
    let mut buffer = SourceBuffer::new("abc");
    assert!(buffer.splice(Span::new(2, 9), "x").is_err());
    assert_eq!(buffer.as_str(), "abc");
}
