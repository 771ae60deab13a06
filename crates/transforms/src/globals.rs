//! Global and keyword indirection.
//!
//! Reads of runtime globals become `T[1][j]` and the value keywords become
//! `T[2][1]` (`true`), `T[2][2]` (`false`) and `T[2][3]` (`nil`, never
//! assigned). `T` is built in the module prologue, so it is populated before
//! the first statement of the body runs. Global names are looked up through
//! `_G` with the name itself passed through the literal decoder.
//!
//! A global is only indirected when the program never binds it. Anything
//! that looks like a binding (local, parameter, loop variable, function name,
//! assignment target) disqualifies the name for the whole run.

use crate::context::RunContext;
use crate::runtime::decompose_integer;
use crate::{Result, Stage, Transform};
use murk_core::{NodeKind, Span, Splice, Tree};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Globals that must stay literal: `_ENV` is not a table field, `_G` is the
/// lookup root itself.
const NEVER_INDIRECT: &[&str] = &["_ENV", "_G"];

enum Read<'t> {
    Global(&'t str),
    Keyword(usize),
}

#[derive(Debug, Default)]
pub struct GlobalIndirection;

impl GlobalIndirection {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for GlobalIndirection {
    fn name(&self) -> &'static str {
        "GlobalIndirection"
    }

    fn stage(&self) -> Stage {
        Stage::Globals
    }

    fn apply(&self, ctx: &mut RunContext<'_>, rng: &mut StdRng) -> Result<bool> {
        let tree = ctx.reparse()?;
        let bound = bound_names(&tree);

        let mut reads: Vec<(Span, Read<'_>)> = Vec::new();
        let mut globals: BTreeMap<&str, usize> = BTreeMap::new();
        let mut keywords = false;

        for (index, node) in tree.iter().enumerate() {
            let Some(span) = node.span else {
                continue;
            };
            match &node.kind {
                NodeKind::Identifier(name)
                    if ctx.reserved.is_global(name)
                        && !NEVER_INDIRECT.contains(&name.as_str())
                        && !bound.contains(name.as_str())
                        && is_read_position(&tree, index) =>
                {
                    let next = globals.len() + 1;
                    globals.entry(name.as_str()).or_insert(next);
                    reads.push((span, Read::Global(name)));
                }
                NodeKind::Other(word) => {
                    let slot = match word.as_str() {
                        "true" => 1,
                        "false" => 2,
                        "nil" => 3,
                        _ => continue,
                    };
                    keywords = true;
                    reads.push((span, Read::Keyword(slot)));
                }
                _ => {}
            }
        }

        if reads.is_empty() {
            debug!("GlobalIndirection: no eligible reads");
            return Ok(false);
        }

        let table = ctx.inject_name(rng)?;

        // Slot numbers must not follow first-use order.
        let mut slots: Vec<usize> = (1..=globals.len()).collect();
        slots.shuffle(rng);
        let slot_of: BTreeMap<&str, usize> = globals
            .iter()
            .map(|(name, order)| (*name, slots[order - 1]))
            .collect();

        let mut prologue = format!("local {table} = {{{{}}, {{}}}}\n");
        let mut ordered: Vec<(&str, usize)> = slot_of.iter().map(|(n, s)| (*n, *s)).collect();
        ordered.shuffle(rng);
        for (name, slot) in &ordered {
            let lookup = ctx.encrypted_call(name.as_bytes(), rng)?;
            prologue.push_str(&format!("{table}[1][{slot}] = _G[{lookup}]\n"));
        }
        if keywords {
            let (a, b) = (decompose_integer(7, 999, rng), decompose_integer(7, 999, rng));
            prologue.push_str(&format!(
                "{table}[2][1], {table}[2][2] = ({a} == {b}), ({a} ~= {b})\n"
            ));
        }

        let splices = reads
            .into_iter()
            .map(|(span, read)| {
                let text = match read {
                    Read::Global(name) => format!("{table}[1][{}]", slot_of[name]),
                    Read::Keyword(slot) => format!("{table}[2][{slot}]"),
                };
                Splice::new(span, text)
            })
            .collect::<Vec<_>>();

        ctx.buffer.splice_descending(splices)?;
        ctx.push_prologue(prologue);
        ctx.stats.globals_indirected = globals.len();

        debug!(
            "GlobalIndirection: {} globals in table, keywords={}",
            globals.len(),
            keywords
        );
        Ok(true)
    }
}

fn other_at<'t>(tree: &'t Tree, index: usize) -> Option<&'t str> {
    match &tree.get(index)?.kind {
        NodeKind::Other(text) => Some(text),
        _ => None,
    }
}

/// True if the identifier at `index` is read as a plain variable.
fn is_read_position(tree: &Tree, index: usize) -> bool {
    let prev = index.checked_sub(1).and_then(|i| other_at(tree, i));
    if matches!(
        prev,
        Some("." | ":" | "::" | "goto" | "local" | "function" | "for")
    ) {
        return false;
    }
    // Assignment targets and table keys.
    !matches!(other_at(tree, index + 1), Some("=" | ","))
}

/// Every name the program binds somewhere, over-approximated.
fn bound_names(tree: &Tree) -> HashSet<&str> {
    let mut bound = HashSet::new();
    let len = tree.len();
    let ident = |i: usize| tree.get(i).and_then(|n| n.identifier());

    for index in 0..len {
        match other_at(tree, index) {
            // `local a, b <const>`, `local function f`, `for k, v in`, `for i =`
            Some("local" | "for") => {
                let mut i = index + 1;
                while i < len {
                    if let Some(name) = ident(i) {
                        bound.insert(name);
                    } else if !matches!(other_at(tree, i), Some("," | "<" | ">" | "function")) {
                        break;
                    }
                    i += 1;
                }
            }
            // `function a.b:c(p, q)`: the root name and every parameter
            Some("function") => {
                let mut i = index + 1;
                let mut root = true;
                while i < len && other_at(tree, i) != Some("(") {
                    if root && let Some(name) = ident(i) {
                        bound.insert(name);
                        root = false;
                    }
                    i += 1;
                }
                i += 1;
                while i < len && other_at(tree, i) != Some(")") {
                    if let Some(name) = ident(i) {
                        bound.insert(name);
                    }
                    i += 1;
                }
            }
            Some("=") => collect_targets(tree, index, &mut bound),
            _ => {}
        }
    }
    bound
}

/// Walks back from an `=` over `a, b.c, d[e]` and records each name.
fn collect_targets<'t>(tree: &'t Tree, eq: usize, bound: &mut HashSet<&'t str>) {
    let mut i = eq;
    loop {
        // Expect the end of a target expression.
        let Some(prev) = i.checked_sub(1) else {
            return;
        };
        i = prev;
        match &tree.nodes[i].kind {
            NodeKind::Identifier(name) => {
                bound.insert(name);
            }
            NodeKind::Other(text) if text == "]" => {
                let mut depth = 1usize;
                while depth > 0 {
                    let Some(prev) = i.checked_sub(1) else {
                        return;
                    };
                    i = prev;
                    match other_at(tree, i) {
                        Some("]") => depth += 1,
                        Some("[") => depth -= 1,
                        _ => {}
                    }
                }
                // `[` belongs to a prefix expression; keep walking it.
                continue;
            }
            _ => return,
        }
        // Then a separator, or the target list is done.
        match i.checked_sub(1).and_then(|p| other_at(tree, p)) {
            Some("," | "." | ":") => i -= 1,
            _ => return,
        }
    }
}
