use crate::Result;
use crate::Transform;
use crate::context::RunContext;
use murk_core::metrics::{Metrics, collect_metrics, compare};
use rand::rngs::StdRng;
use tracing::info;

/// Trait for running a sequence of obfuscation transforms on one run.
pub trait Pass {
    /// Applies `passes` in order and returns the names of those that changed
    /// the program.
    fn run(
        &self,
        ctx: &mut RunContext<'_>,
        passes: &[&dyn Transform],
        rng: &mut StdRng,
    ) -> Result<Vec<String>>;
}

/// Default implementation of the Pass trait.
///
/// Each transform works on a snapshot of the run; the snapshot replaces the
/// run only if the transform reports a change and the result still parses.
pub struct DefaultPass;

impl Pass for DefaultPass {
    fn run(
        &self,
        ctx: &mut RunContext<'_>,
        passes: &[&dyn Transform],
        rng: &mut StdRng,
    ) -> Result<Vec<String>> {
        let mut applied = Vec::new();

        for pass in passes {
            let before = metrics_of(ctx)?;
            let mut snapshot = ctx.clone();

            let mutated = pass.apply(&mut snapshot, rng)?;
            if !mutated {
                continue;
            }

            let after = metrics_of(&snapshot)?;
            let delta = compare(&before, &after);

            info!(
                "{:>20} Δ{:+.2} bytes={} idents={}",
                pass.name(),
                delta,
                after.byte_len,
                after.distinct_identifiers
            );
            *ctx = snapshot;
            applied.push(pass.name().to_string());
        }
        Ok(applied)
    }
}

fn metrics_of(ctx: &RunContext<'_>) -> Result<Metrics> {
    let tree = ctx.reparse()?;
    Ok(collect_metrics(ctx.buffer.as_str(), &tree))
}
