//! The Parser Adapter seam and its default Lua implementation.
//!
//! Passes never talk to the grammar library directly; they receive a
//! [`Tree`] from whatever [`ParserAdapter`] the pipeline was built with.

use crate::literal::{decode_number, decode_string};
use crate::result::{Error, Result};
use crate::tree::{NodeKind, Span, Tree, TreeNode};
use full_moon::tokenizer::{Token, TokenType};
use full_moon::visitors::Visitor;

/// Turns source text into a token tree with byte spans.
pub trait ParserAdapter: Send + Sync {
    /// Parses `text`, failing with [`Error::Parse`] on malformed input.
    fn parse(&self, text: &str) -> Result<Tree>;
}

/// Lua 5.1 - 5.4 parser backed by `full_moon`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LuaParser;

impl LuaParser {
    pub fn new() -> Self {
        Self
    }
}

impl ParserAdapter for LuaParser {
    fn parse(&self, text: &str) -> Result<Tree> {
        let ast = full_moon::parse(text).map_err(|errors| Error::Parse {
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })?;

        let mut collector = TokenCollector {
            source: text,
            nodes: Vec::new(),
        };
        collector.visit_ast(&ast);

        // The visitor reaches a token once through its reference and once
        // directly; kept token kinds never share a start offset.
        let mut nodes = collector.nodes;
        nodes.sort_by_key(|node| node.span.map(|s| s.start));
        nodes.dedup_by_key(|node| node.span);

        tracing::debug!("parsed {} bytes into {} nodes", text.len(), nodes.len());
        Ok(Tree::new(nodes))
    }
}

struct TokenCollector<'a> {
    source: &'a str,
    nodes: Vec<TreeNode>,
}

impl TokenCollector<'_> {
    fn slice(&self, span: Span) -> Option<&str> {
        self.source.get(span.start..span.end)
    }
}

impl Visitor for TokenCollector<'_> {
    fn visit_token(&mut self, token: &Token) {
        let span = Span::new(token.start_position().bytes(), token.end_position().bytes());
        let Some(raw) = self.slice(span) else {
            return;
        };

        let kind = match token.token_type() {
            TokenType::Identifier { .. } => NodeKind::Identifier(raw.to_string()),
            TokenType::StringLiteral { .. } => NodeKind::StringLiteral(decode_string(raw)),
            TokenType::Number { .. } => NodeKind::NumberLiteral(decode_number(raw)),
            TokenType::Symbol { .. } => NodeKind::Other(raw.to_string()),
            _ => return,
        };
        self.nodes.push(TreeNode::new(kind, span));
    }
}
