//! Replaces string and number literals with expressions that rebuild them at
//! run time.
//!
//! Strings become `(D("<payload>", "<key>"))` calls against the run's literal
//! decoder. Integers become `(a + b)` with a fresh split per occurrence, so
//! two equal constants never share operands.

use crate::context::RunContext;
use crate::runtime::decompose_integer;
use crate::{PassConfig, Result, Stage, Transform};
use murk_core::{LuaNumber, NodeKind, Splice};
use rand::rngs::StdRng;
use tracing::debug;

pub struct LiteralEncryptor {
    config: PassConfig,
}

impl LiteralEncryptor {
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }
}

impl Default for LiteralEncryptor {
    fn default() -> Self {
        Self::new(PassConfig::default())
    }
}

impl Transform for LiteralEncryptor {
    fn name(&self) -> &'static str {
        "LiteralEncryptor"
    }

    fn stage(&self) -> Stage {
        Stage::Literals
    }

    fn apply(&self, ctx: &mut RunContext<'_>, rng: &mut StdRng) -> Result<bool> {
        let tree = ctx.reparse()?;
        let mut splices = Vec::new();
        let mut strings = 0usize;
        let mut numbers = 0usize;
        let max = self.config.max_decomposed_integer;

        for node in tree.literals() {
            let Some(span) = node.span else {
                continue;
            };
            match &node.kind {
                NodeKind::StringLiteral(Some(bytes)) if !bytes.is_empty() => {
                    let call = ctx.encrypted_call(bytes, rng)?;
                    splices.push(Splice::new(span, format!("({call})")));
                    strings += 1;
                }
                NodeKind::NumberLiteral(Some(LuaNumber::Integer(value)))
                    if value.unsigned_abs() <= max.unsigned_abs() =>
                {
                    let spread = max.min(1 << 20);
                    splices.push(Splice::new(span, decompose_integer(*value, spread, rng)));
                    numbers += 1;
                }
                NodeKind::StringLiteral(value) => {
                    if value.is_none() {
                        debug!("leaving undecodable string literal at {span}");
                    }
                }
                _ => {}
            }
        }

        if splices.is_empty() {
            debug!("LiteralEncryptor: no eligible literals");
            return Ok(false);
        }

        ctx.buffer.splice_descending(splices)?;
        ctx.stats.literals_encrypted += strings;
        ctx.stats.numbers_decomposed += numbers;
        debug!(
            "LiteralEncryptor: encrypted {} strings, decomposed {} integers",
            strings, numbers
        );
        Ok(true)
    }
}
