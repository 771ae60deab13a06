pub mod buffer;
pub mod cipher;
pub mod lexicon;
pub mod literal;
pub mod metrics;
pub mod parser;
pub mod result;
pub mod seed;
pub mod tree;

pub use buffer::{SourceBuffer, Splice};
pub use cipher::{EncryptionKey, SymbolAlphabet};
pub use lexicon::ReservedSet;
pub use parser::{LuaParser, ParserAdapter};
pub use result::{Error, Result};
pub use tree::{LuaNumber, NodeKind, Span, Tree, TreeNode};

/// Returns true if `name` is a syntactically valid Lua identifier.
///
/// Does not check against keywords; see [`ReservedSet`] for that.
#[inline]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// High-level convenience function to parse source text and collect its metrics.
///
/// # Example
/// ```rust,ignore
/// let (tree, metrics) = process_source(&LuaParser, "local x = 5 print(x + 1)")?;
/// assert_eq!(metrics.number_cnt, 2);
/// ```
pub fn process_source(
    parser: &dyn ParserAdapter,
    source: &str,
) -> Result<(Tree, metrics::Metrics)> {
    let tree = parser.parse(source)?;
    let metrics = metrics::collect_metrics(source, &tree);
    Ok((tree, metrics))
}
