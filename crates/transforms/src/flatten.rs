//! Control-flow flattening into a state-dispatch loop.
//!
//! The whole body becomes block 1 of a dispatch table; blocks `2..N` are
//! decoys. A driver loop calls the block selected by the state variable until
//! the state reaches `0` or names a missing block:
//!
//! ```lua
//! local S, B = 1, {}
//! B[1] = function(...) do <body> end S = 0 end
//! B[3] = function(...) <junk> end
//! ...
//! while S ~= 0 and B[S] do
//!   local s = S
//!   local n, r = C(P(B[s], ...))
//!   if not r[1] then S = 0
//!   elseif S == s then S, R, N = 0, r, n end
//! end
//! if R then return U(R, 2, N) end
//! ```
//!
//! Every block runs under `pcall`. An error raised by the body does **not**
//! propagate: the loop forces the state to `0` and the chunk ends quietly,
//! so a failing program looks like one that stopped early. A block that
//! returns without advancing the state ends the loop and its values become the
//! chunk's return values, so module chunks ending in `return M` keep working.

use crate::context::RunContext;
use crate::runtime::decompose_integer;
use crate::{PassConfig, Result, Stage, Transform};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

pub struct ControlFlowFlattener {
    config: PassConfig,
}

impl ControlFlowFlattener {
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }

    /// A block that is never dispatched to. It computes junk and contains a
    /// state write that its own guard makes unreachable.
    fn decoy(
        &self,
        ctx: &mut RunContext<'_>,
        state: &str,
        states: usize,
        rng: &mut StdRng,
    ) -> Result<String> {
        let [a, b] = ctx.inject_array(rng)?;
        let x = decompose_integer(rng.random_range(1..=9999), 9999, rng);
        let y = decompose_integer(rng.random_range(1..=99), 999, rng);
        let target = rng.random_range(1..=states.max(1));
        Ok(format!(
            "function(...)\n  local {a} = {x} * {y}\n  local {b} = {a} % {}\n  \
             if {b} < 0 and {b} > 0 then {state} = {target} end\nend",
            rng.random_range(2..=97)
        ))
    }
}

impl Default for ControlFlowFlattener {
    fn default() -> Self {
        Self::new(PassConfig::default())
    }
}

impl Transform for ControlFlowFlattener {
    fn name(&self) -> &'static str {
        "ControlFlowFlattener"
    }

    fn stage(&self) -> Stage {
        Stage::Flatten
    }

    fn apply(&self, ctx: &mut RunContext<'_>, rng: &mut StdRng) -> Result<bool> {
        if ctx.buffer.as_str().trim().is_empty() {
            debug!("ControlFlowFlattener: empty body");
            return Ok(false);
        }

        let states = self.config.dispatch_states.max(1);
        let [state, blocks, pcall, select, unpack, capture, snapshot, count, results, ret, ret_n] =
            ctx.inject_array(rng)?;

        let mut entries = vec![format!(
            "{blocks}[1] = function(...)\ndo\n{body}\nend\n{state} = 0\nend\n",
            body = ctx.buffer.as_str().trim_end(),
        )];
        for index in 2..=states {
            let decoy = self.decoy(ctx, &state, states, rng)?;
            entries.push(format!("{blocks}[{index}] = {decoy}\n"));
        }
        entries.shuffle(rng);

        let mut text = format!("local {state}, {blocks} = 1, {{}}\n");
        for entry in &entries {
            text.push_str(entry);
        }
        text.push_str(&format!(
            "local {pcall}, {select}, {unpack} = pcall, select, table.unpack or unpack
local {capture} = function(...) return {select}(\"#\", ...), {{...}} end
local {ret}, {ret_n}
while {state} ~= 0 and {blocks}[{state}] do
  local {snapshot} = {state}
  local {count}, {results} = {capture}({pcall}({blocks}[{snapshot}], ...))
  if not {results}[1] then
    {state} = 0
  elseif {state} == {snapshot} then
    {state}, {ret}, {ret_n} = 0, {results}, {count}
  end
end
if {ret} then return {unpack}({ret}, 2, {ret_n}) end
"
        ));

        ctx.buffer.replace_all(text);
        ctx.stats.dispatch_states = states;
        debug!("ControlFlowFlattener: {} states, {} decoys", states, states - 1);
        Ok(true)
    }
}
