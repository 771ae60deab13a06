//! Module for the `obfuscate` subcommand, which runs the source obfuscation
//! pipeline over one Lua file.
//!
//! Control-flow flattening runs the program under `pcall`: a runtime error in
//! the obfuscated program ends it quietly instead of propagating.

use crate::commands::{ObfuscateError, read_input};
use async_trait::async_trait;
use clap::Args;
use murk_core::seed::Seed;
use murk_transform::layers::LayerKind;
use murk_transform::obfuscator::{ObfuscationConfig, ObfuscationResult, obfuscate_source};
use murk_transform::{PassConfig, build_passes};
use serde::Serialize;
use std::error::Error;
use std::fs;

/// Arguments for the `obfuscate` subcommand.
#[derive(Args)]
pub struct ObfuscateArgs {
    /// Lua source file, or `-` for stdin.
    pub input: String,
    /// Write the artifact here instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
    /// 64 hex character seed; the same seed reproduces the same output.
    #[arg(long)]
    seed: Option<String>,
    /// Comma-separated transforms: literals, rename, globals, flatten, default, all.
    /// Flattening swallows runtime errors of the obfuscated program.
    #[arg(long, default_value = "default")]
    passes: String,
    /// Comma-separated encoding layers, innermost first: hex, xor, symbol, base64.
    #[arg(long, default_value = "")]
    layers: String,
    /// Number of decoy blocks in the flattened dispatch table.
    #[arg(long, default_value_t = 4)]
    decoys: usize,
    /// Path to emit a JSON report (sizes, metadata, rename mapping).
    #[arg(long)]
    emit: Option<String>,
}

/// Report written by `--emit`.
#[derive(Serialize)]
struct Report<'a> {
    seed: String,
    original_size: usize,
    obfuscated_size: usize,
    size_increase_percentage: f64,
    metadata: &'a murk_transform::obfuscator::ObfuscationMetadata,
    rename_mapping: &'a std::collections::BTreeMap<String, String>,
}

/// Executes the `obfuscate` subcommand.
#[async_trait]
impl super::Command for ObfuscateArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let ObfuscateArgs {
            input,
            output,
            seed,
            passes,
            layers,
            decoys,
            emit,
        } = self;

        let source = read_input(&input)?;

        let seed = match seed {
            Some(seed_hex) => {
                Seed::from_hex(&seed_hex).map_err(|e| ObfuscateError::InvalidSeed(e.to_string()))?
            }
            None => Seed::generate(),
        };
        let seed_hex = seed.to_hex();

        let pass_config = PassConfig {
            dispatch_states: decoys + 1,
            ..PassConfig::default()
        };
        let mut config = ObfuscationConfig::with_seed(seed);
        config.transforms = build_passes(&passes, &pass_config).map_err(ObfuscateError::from)?;
        config.layers = LayerKind::parse_list(&layers).map_err(ObfuscateError::from)?;
        config.pass_config = pass_config;

        let result = obfuscate_source(&source, &config).map_err(ObfuscateError::from)?;
        print_summary(&result);

        if let Some(path) = emit.as_ref() {
            let report = Report {
                seed: seed_hex,
                original_size: result.original_size,
                obfuscated_size: result.obfuscated_size,
                size_increase_percentage: result.size_increase_percentage,
                metadata: &result.metadata,
                rename_mapping: &result.rename_mapping,
            };
            fs::write(path, serde_json::to_string_pretty(&report)?)?;
            eprintln!("Wrote report to {path}");
        }

        match output {
            Some(path) => {
                fs::write(&path, &result.obfuscated_code)?;
                eprintln!("Wrote obfuscated source to {path}");
            }
            None => print!("{}", result.obfuscated_code),
        }
        Ok(())
    }
}

/// Prints a short summary of the run to stderr.
fn print_summary(result: &ObfuscationResult) {
    let meta = &result.metadata;
    eprintln!("=== Obfuscation summary ===");
    eprintln!(
        "size: {} -> {} bytes ({:+.1}%)",
        result.original_size, result.obfuscated_size, result.size_increase_percentage
    );
    eprintln!("transforms: {}", meta.transforms_applied.join(", "));
    if !meta.layers_applied.is_empty() {
        let layers: Vec<String> = meta.layers_applied.iter().map(|l| l.to_string()).collect();
        eprintln!("layers: {}", layers.join(" -> "));
    }
    eprintln!(
        "literals: {} strings, {} integers | identifiers: {} | globals: {} | states: {}",
        meta.literals_encrypted,
        meta.numbers_decomposed,
        meta.identifiers_renamed,
        meta.globals_indirected,
        meta.dispatch_states
    );
}
