//! Module for the `tokens` subcommand, which dumps the token tree the parser
//! adapter hands to the transforms.

use crate::commands::{ObfuscateError, read_input};
use async_trait::async_trait;
use clap::Args;
use murk_core::metrics::collect_metrics;
use murk_core::{LuaParser, NodeKind, ParserAdapter, Tree};
use std::error::Error;

/// Arguments for the `tokens` subcommand.
#[derive(Args)]
pub struct TokensArgs {
    /// Lua source file, or `-` for stdin.
    pub input: String,
    /// Emit the tree as JSON.
    #[arg(long)]
    json: bool,
    /// Only list identifiers and literals.
    #[arg(long)]
    interesting: bool,
}

#[async_trait]
impl super::Command for TokensArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let source = read_input(&self.input)?;
        let tree = LuaParser::new()
            .parse(&source)
            .map_err(ObfuscateError::from)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&tree)?);
            return Ok(());
        }

        print!("{}", render(&source, &tree, self.interesting));
        let metrics = collect_metrics(&source, &tree);
        eprintln!(
            "{} bytes, {} lines, {} identifiers ({} distinct), {} strings, {} numbers",
            metrics.byte_len,
            metrics.line_cnt,
            metrics.identifier_cnt,
            metrics.distinct_identifiers,
            metrics.string_cnt,
            metrics.number_cnt
        );
        Ok(())
    }
}

/// One line per node: kind, span and source text.
pub fn render(source: &str, tree: &Tree, interesting: bool) -> String {
    let mut out = String::new();
    for node in tree.iter() {
        if interesting && matches!(node.kind, NodeKind::Other(_)) {
            continue;
        }
        let (span, text) = match node.span {
            Some(span) => (span.to_string(), source.get(span.start..span.end).unwrap_or("?")),
            None => ("-".to_string(), ""),
        };
        let value = match &node.kind {
            NodeKind::StringLiteral(None) | NodeKind::NumberLiteral(None) => "  (undecoded)",
            _ => "",
        };
        out.push_str(&format!("{:<6} {:>12}  {}{}\n", node.label(), span, text, value));
    }
    out
}
