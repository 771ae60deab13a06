/// Module for computing simple text metrics to evaluate source obfuscation passes.
///
/// Metrics are lexical: sizes, and how many identifiers and literals remain
/// readable. `distinct_identifiers` dropping while `byte_len` grows is the
/// expected shape of a literal pass followed by renaming.
use crate::tree::{NodeKind, Tree};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Size of the text in bytes.
    pub byte_len: usize,
    /// Number of lines.
    pub line_cnt: usize,
    /// Number of identifier tokens.
    pub identifier_cnt: usize,
    /// Number of distinct identifier names.
    pub distinct_identifiers: usize,
    /// Number of string literal tokens.
    pub string_cnt: usize,
    /// Number of number literal tokens.
    pub number_cnt: usize,
}

/// Collects metrics from a text and the tree parsed from it.
pub fn collect_metrics(text: &str, tree: &Tree) -> Metrics {
    let mut names = HashSet::new();
    let mut metrics = Metrics {
        byte_len: text.len(),
        line_cnt: text.lines().count(),
        ..Metrics::default()
    };

    for node in tree.iter() {
        match &node.kind {
            NodeKind::Identifier(name) => {
                metrics.identifier_cnt += 1;
                names.insert(name.as_str());
            }
            NodeKind::StringLiteral(_) => metrics.string_cnt += 1,
            NodeKind::NumberLiteral(_) => metrics.number_cnt += 1,
            NodeKind::Other(_) => {}
        }
    }
    metrics.distinct_identifiers = names.len();
    metrics
}

/// Relative size growth between two snapshots, as a ratio.
pub fn compare(before: &Metrics, after: &Metrics) -> f64 {
    if before.byte_len == 0 {
        return 0.0;
    }
    (after.byte_len as f64 - before.byte_len as f64) / before.byte_len as f64
}
