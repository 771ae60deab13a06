//! Identifier renaming.
//!
//! Every identifier that is neither reserved nor injected by the pipeline gets
//! one opaque replacement for the whole run, applied by a single
//! word-boundary substitution over the buffer. Lexical scope is not tracked:
//! a name reused in unrelated scopes gets the same replacement everywhere,
//! which keeps the substitution a plain bijection. Fields read through string
//! keys (`t["x"]`) are not renamed alongside `t.x`.

use crate::context::RunContext;
use crate::names::RenameTable;
use crate::{Error, Result, Stage, Transform};
use murk_core::{NodeKind, Span};
use rand::rngs::StdRng;
use regex::{Captures, Regex};
use tracing::debug;

#[derive(Debug, Default)]
pub struct IdentifierRenamer;

impl IdentifierRenamer {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for IdentifierRenamer {
    fn name(&self) -> &'static str {
        "IdentifierRenamer"
    }

    fn stage(&self) -> Stage {
        Stage::Rename
    }

    fn apply(&self, ctx: &mut RunContext<'_>, rng: &mut StdRng) -> Result<bool> {
        // Splicing shifted every offset, so walk a fresh tree.
        let tree = ctx.reparse()?;
        let mut added = 0usize;

        for (name, _) in tree.identifiers() {
            if ctx.reserved.contains(name) || ctx.is_injected(name) || ctx.renames.contains(name) {
                continue;
            }
            let fresh = ctx.names.fresh(rng)?;
            ctx.renames.insert(name.to_string(), fresh)?;
            added += 1;
        }

        if added == 0 {
            debug!("IdentifierRenamer: nothing to rename");
            return Ok(false);
        }

        let protected: Vec<Span> = tree
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::StringLiteral(_)))
            .filter_map(|node| node.span)
            .collect();
        let text = substitute_outside(ctx.buffer.as_str(), &ctx.renames, &protected)?;
        ctx.buffer.replace_all(text);
        ctx.stats.identifiers_renamed = ctx.renames.len();

        debug!("IdentifierRenamer: {} identifiers renamed", added);
        Ok(true)
    }
}

fn pattern(table: &RenameTable) -> Result<Option<Regex>> {
    if table.is_empty() {
        return Ok(None);
    }
    // Longest first so that no alternative shadows a longer one.
    let mut names: Vec<&str> = table.iter().map(|(original, _)| original).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b"))
        .map(Some)
        .map_err(|e| Error::Encoding(e.to_string()))
}

/// Replaces every whole-word occurrence of a mapped name in `text`.
///
/// Replacements are never keys of the table, so applying the same table
/// twice gives the same text as applying it once.
pub fn substitute(text: &str, table: &RenameTable) -> Result<String> {
    substitute_outside(text, table, &[])
}

/// Like [`substitute`], but leaves the byte ranges in `protected` untouched.
/// `protected` must be sorted and non-overlapping.
pub fn substitute_outside(text: &str, table: &RenameTable, protected: &[Span]) -> Result<String> {
    let Some(re) = pattern(table)? else {
        return Ok(text.to_string());
    };
    let replace = |caps: &Captures<'_>| {
        let found = &caps[0];
        table.get(found).unwrap_or(found).to_string()
    };

    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut cursor = 0;
    for span in protected {
        let (Some(open), Some(kept)) = (text.get(cursor..span.start), text.get(span.start..span.end))
        else {
            return Err(murk_core::Error::InvalidSpan {
                start: span.start,
                end: span.end,
                len: text.len(),
            }
            .into());
        };
        out.push_str(&re.replace_all(open, &replace));
        out.push_str(kept);
        cursor = span.end;
    }
    out.push_str(&re.replace_all(&text[cursor..], &replace));
    Ok(out)
}
