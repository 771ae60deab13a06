use murk_core::{LuaNumber, LuaParser, NodeKind, ParserAdapter, process_source};

#[test]
fn test_literal_values_are_decoded() {
    let source = r#"local a, b, c, d = "x\65", [[
long]], 0x10, 2.5 local e = 'it\'s'"#;
    let tree = LuaParser::new().parse(source).unwrap();

    let strings: Vec<Vec<u8>> = tree
        .literals()
        .filter_map(|node| match &node.kind {
            NodeKind::StringLiteral(value) => value.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(strings, vec![b"xA".to_vec(), b"long".to_vec(), b"it's".to_vec()]);

    let numbers: Vec<LuaNumber> = tree
        .literals()
        .filter_map(|node| match &node.kind {
            NodeKind::NumberLiteral(value) => *value,
            _ => None,
        })
        .collect();
    assert_eq!(numbers, vec![LuaNumber::Integer(16), LuaNumber::Float(2.5)]);
}

#[test]
fn test_spans_are_byte_offsets() {
    // multi-byte text before the identifier shifts byte offsets, not char offsets
    let source = "local s = \"h\u{e9}llo\" local after = s";
    let tree = LuaParser::new().parse(source).unwrap();
    let (_, span) = tree
        .identifiers()
        .find(|(name, _)| *name == "after")
        .unwrap();
    let span = span.unwrap();
    assert_eq!(&source[span.start..span.end], "after");
}

#[test]
fn test_parse_error_carries_message() {
    let err = LuaParser::new().parse("if then end").unwrap_err();
    match err {
        murk_core::Error::Parse { message } => assert!(!message.is_empty()),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_process_source_metrics() {
    let (tree, metrics) = process_source(&LuaParser, "local x = 5 print(x + 1, 'y')").unwrap();
    assert_eq!(metrics.number_cnt, 2);
    assert_eq!(metrics.string_cnt, 1);
    assert_eq!(metrics.identifier_cnt, 3);
    assert_eq!(metrics.distinct_identifiers, 2);
    assert!(!tree.is_empty());
}

#[test]
fn test_each_token_is_reported_once() {
    let source = "print('x') local y = 1";
    let tree = LuaParser::new().parse(source).unwrap();
    assert_eq!(tree.len(), 8);
    assert_eq!(tree.identifiers().count(), 2);
    assert_eq!(tree.literals().count(), 2);

    let starts: Vec<usize> = tree.iter().filter_map(|node| node.span).map(|s| s.start).collect();
    assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
}
