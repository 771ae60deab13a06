use crate::Transform;
use crate::context::{RunContext, RunStats};
use crate::layers::{LayerKind, wrap_layers};
use crate::pass::{DefaultPass, Pass};
use crate::{Error, PassConfig, Result};
use murk_core::seed::Seed;
use murk_core::{LuaParser, ParserAdapter, ReservedSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Configuration for the obfuscation pipeline.
///
/// Holds only read-only state, so one config can serve any number of
/// concurrent runs.
pub struct ObfuscationConfig {
    /// Seed for deterministic obfuscation
    pub seed: Seed,
    /// Transforms to apply; they run in stage order whatever order they are listed in
    pub transforms: Vec<Box<dyn Transform>>,
    /// Encoding layers, innermost first
    pub layers: Vec<LayerKind>,
    /// Knobs shared by the transforms and layers
    pub pass_config: PassConfig,
    /// Names that are never renamed
    pub reserved: Arc<ReservedSet>,
    /// Parser used for every parse and re-parse of the run
    pub parser: Arc<dyn ParserAdapter>,
}

impl ObfuscationConfig {
    /// Create config with a specific seed
    pub fn with_seed(seed: Seed) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for ObfuscationConfig {
    fn default() -> Self {
        Self {
            seed: Seed::generate(),
            transforms: Vec::new(),
            layers: Vec::new(),
            pass_config: PassConfig::default(),
            reserved: Arc::new(ReservedSet::lua()),
            parser: Arc::new(LuaParser::new()),
        }
    }
}

impl std::fmt::Debug for ObfuscationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObfuscationConfig")
            .field(
                "transforms",
                &format!("{} transforms", self.transforms.len()),
            )
            .field("layers", &self.layers)
            .field("pass_config", &self.pass_config)
            .finish()
    }
}

/// Result of the obfuscation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationResult {
    /// The emitted artifact; runs with no arguments
    pub obfuscated_code: String,
    /// Original source size in bytes
    pub original_size: usize,
    /// Emitted artifact size in bytes
    pub obfuscated_size: usize,
    /// Size increase as percentage
    pub size_increase_percentage: f64,
    /// Metadata about the obfuscation process
    pub metadata: ObfuscationMetadata,
    /// Original identifier to replacement, for this run only
    pub rename_mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObfuscationMetadata {
    /// Names of transforms that changed the program
    pub transforms_applied: Vec<String>,
    /// Layers applied, innermost first
    pub layers_applied: Vec<LayerKind>,
    /// String literals replaced by decoder calls
    pub literals_encrypted: usize,
    /// Integer literals replaced by arithmetic
    pub numbers_decomposed: usize,
    /// Distinct identifiers renamed
    pub identifiers_renamed: usize,
    /// Distinct globals read through the indirection table
    pub globals_indirected: usize,
    /// Dispatch table size, decoys included; 0 when not flattened
    pub dispatch_states: usize,
    /// Hash of the seed, for reproducing the run
    pub seed_hash: String,
}

impl ObfuscationMetadata {
    fn new(applied: Vec<String>, layers: &[LayerKind], stats: &RunStats, seed: &Seed) -> Self {
        Self {
            transforms_applied: applied,
            layers_applied: layers.to_vec(),
            literals_encrypted: stats.literals_encrypted,
            numbers_decomposed: stats.numbers_decomposed,
            identifiers_renamed: stats.identifiers_renamed,
            globals_indirected: stats.globals_indirected,
            dispatch_states: stats.dispatch_states,
            seed_hash: seed.hash_hex(),
        }
    }
}

/// Main obfuscation pipeline.
///
/// Parses `source`, runs the configured transforms in stage order, assembles
/// the module and wraps it in the configured layers. All mutable state of the
/// run (buffer, keys, rename table, name generator) is created here and
/// dropped on return.
pub fn obfuscate_source(source: &str, config: &ObfuscationConfig) -> Result<ObfuscationResult> {
    tracing::debug!("Starting obfuscation pipeline:");
    tracing::debug!("  Transforms: {}", config.transforms.len());
    tracing::debug!("  Layers: {:?}", config.layers);
    tracing::debug!("  Input size: {} bytes", source.len());

    let mut rng = config.seed.create_deterministic_rng();
    let mut ctx = RunContext::new(
        source,
        config.parser.as_ref(),
        config.reserved.as_ref(),
        &config.pass_config,
        &mut rng,
    )?;

    let mut ordered: Vec<&dyn Transform> = config.transforms.iter().map(|t| t.as_ref()).collect();
    ordered.sort_by_key(|t| t.stage());

    let applied = DefaultPass.run(&mut ctx, &ordered, &mut rng)?;
    tracing::debug!("  Transforms applied: {:?}", applied);

    let module = ctx.assemble(&mut rng)?;
    validate(config.parser.as_ref(), &module, "assembled module")?;
    tracing::debug!("  Assembled module: {} bytes", module.len());

    let artifact = wrap_layers(
        module,
        &config.layers,
        &config.pass_config,
        &mut ctx.names,
        &mut rng,
    )?;
    if !config.layers.is_empty() {
        validate(config.parser.as_ref(), &artifact, "outermost layer")?;
    }

    let original_size = source.len();
    let obfuscated_size = artifact.len();
    let size_increase_percentage = if original_size == 0 {
        0.0
    } else {
        (obfuscated_size as f64 - original_size as f64) / original_size as f64 * 100.0
    };
    tracing::debug!(
        "  Output size: {} bytes ({:+.1}%)",
        obfuscated_size,
        size_increase_percentage
    );

    let metadata = ObfuscationMetadata::new(applied, &config.layers, &ctx.stats, &config.seed);
    Ok(ObfuscationResult {
        obfuscated_code: artifact,
        original_size,
        obfuscated_size,
        size_increase_percentage,
        metadata,
        rename_mapping: ctx.renames.into_map().into_iter().collect(),
    })
}

fn validate(parser: &dyn ParserAdapter, text: &str, what: &str) -> Result<()> {
    parser.parse(text).map(|_| ()).map_err(|e| {
        tracing::error!("{} failed to re-parse: {}", what, e);
        Error::Validation(format!("{what}: {e}"))
    })
}
