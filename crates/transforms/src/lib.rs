pub mod context;
pub mod flatten;
pub mod globals;
pub mod layers;
pub mod literals;
pub mod names;
pub mod obfuscator;
pub mod pass;
pub mod rename;
pub mod runtime;

use crate::context::RunContext;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transform error type encompassing all transform module errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Core operation failed (parsing, splicing, framing).
    #[error(transparent)]
    Core(#[from] murk_core::Error),

    /// No fresh opaque name could be drawn.
    #[error("opaque name space exhausted after {0} attempts")]
    NameSpaceExhausted(usize),

    /// An original name was mapped twice within one run.
    #[error("identifier {0:?} already has a replacement")]
    DuplicateRename(String),

    /// Payload encoding or decoding failed.
    #[error("payload encoding failed: {0}")]
    Encoding(String),

    /// Unknown layer name.
    #[error("invalid layer: {0}")]
    InvalidLayer(String),

    /// Unknown transform name.
    #[error("invalid pass: {0}")]
    InvalidPass(String),

    /// The assembled module no longer parses.
    #[error("emitted module failed validation: {0}")]
    Validation(String),
}

impl Error {
    /// True when the failure is the caller's fault (malformed source).
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Core(murk_core::Error::Parse { .. }))
    }
}

/// Transform result type
pub type Result<T> = std::result::Result<T, Error>;

/// Position of a transform in the pipeline. Transforms always run in this
/// order, whatever order they were configured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Literals,
    Rename,
    Globals,
    Flatten,
}

/// Trait for source obfuscation transforms.
pub trait Transform: Send + Sync {
    /// Returns the transform's name for logging and identification.
    fn name(&self) -> &'static str;
    /// Where the transform runs in the pipeline.
    fn stage(&self) -> Stage;
    /// Applies the transform to the run, returning whether changes were made.
    fn apply(&self, ctx: &mut RunContext<'_>, rng: &mut StdRng) -> Result<bool>;
}

/// Configuration for transform passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassConfig {
    /// Number of states in the flattened dispatch table, the real block included.
    pub dispatch_states: usize,
    /// Shortest key drawn for literals and layers.
    pub min_key_len: usize,
    /// Longest key drawn for literals and layers.
    pub max_key_len: usize,
    /// Integers with a larger magnitude are not decomposed.
    pub max_decomposed_integer: i64,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            dispatch_states: 5,
            min_key_len: 8,
            max_key_len: 16,
            max_decomposed_integer: 1 << 31,
        }
    }
}

/// Builds a list of transforms from a comma-separated string.
///
/// `all` expands to every transform, `default` to everything except the
/// optional global indirection.
pub fn build_passes(list: &str, config: &PassConfig) -> Result<Vec<Box<dyn Transform>>> {
    let mut passes: Vec<Box<dyn Transform>> = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name {
            "all" => {
                passes.extend(build_passes("literals,rename,globals,flatten", config)?);
            }
            "default" => passes.extend(build_passes("literals,rename,flatten", config)?),
            "literals" | "strings" => {
                passes.push(Box::new(literals::LiteralEncryptor::new(config.clone())))
            }
            "rename" => passes.push(Box::new(rename::IdentifierRenamer::new())),
            "globals" | "indirection" => {
                passes.push(Box::new(globals::GlobalIndirection::new()))
            }
            "flatten" => passes.push(Box::new(flatten::ControlFlowFlattener::new(config.clone()))),
            other => return Err(Error::InvalidPass(other.to_string())),
        }
    }
    passes.sort_by_key(|pass| pass.stage());
    passes.dedup_by_key(|pass| pass.stage());
    Ok(passes)
}
