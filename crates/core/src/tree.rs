//! The token tree handed out by a [`ParserAdapter`](crate::parser::ParserAdapter).
//!
//! The obfuscation passes only need lexical facts about the program (where each
//! identifier and literal sits, and which punctuation surrounds it), so the tree
//! is a flat, source-ordered sequence of typed nodes. Trivia is dropped.

use serde::Serialize;
use std::fmt;

/// A `[start, end)` byte range into the text a tree was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Numeric value of a Lua number literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LuaNumber {
    Integer(i64),
    Float(f64),
}

/// What a node is. Literal values are `None` when they could not be decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    Identifier(String),
    StringLiteral(Option<Vec<u8>>),
    NumberLiteral(Option<LuaNumber>),
    /// Keywords and punctuation, carried as their source text.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub span: Option<Span>,
}

impl TreeNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }

    /// The identifier name, if this node is one.
    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// True for keyword or punctuation nodes whose text equals `text`.
    pub fn is_other(&self, text: &str) -> bool {
        matches!(&self.kind, NodeKind::Other(t) if t == text)
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::StringLiteral(_) | NodeKind::NumberLiteral(_)
        )
    }

    /// Short label used by the token dump.
    pub fn label(&self) -> &'static str {
        match self.kind {
            NodeKind::Identifier(_) => "ident",
            NodeKind::StringLiteral(_) => "string",
            NodeKind::NumberLiteral(_) => "number",
            NodeKind::Other(_) => "other",
        }
    }
}

/// Source-ordered nodes of one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn new(mut nodes: Vec<TreeNode>) -> Self {
        nodes.sort_by_key(|node| node.span.map(|s| s.start).unwrap_or(usize::MAX));
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// All identifier nodes, in source order.
    pub fn identifiers(&self) -> impl Iterator<Item = (&str, Option<Span>)> {
        self.nodes
            .iter()
            .filter_map(|node| node.identifier().map(|name| (name, node.span)))
    }

    /// All string and number literal nodes, in source order.
    pub fn literals(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().filter(|node| node.is_literal())
    }

    /// The node at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&TreeNode> {
        self.nodes.get(index)
    }
}
