//! Lua snippets emitted around the transformed program.
//!
//! Everything here is written to run unmodified on Lua 5.1 through 5.4: no
//! bitwise operators, no integer division, and `load`/`loadstring` chosen at
//! run time. Runtime primitives are fetched from `_G` by decimal-escaped name
//! so their names never appear in the emitted text.

use crate::Result;
use crate::names::NameGenerator;
use murk_core::SymbolAlphabet;
use murk_core::literal::decimal_escaped;
use rand::Rng;

/// `_G` lookup of `name` with the name hidden behind decimal escapes.
pub fn global_lookup(globals: &str, name: &str) -> String {
    format!("{globals}[{}]", decimal_escaped(name.as_bytes()))
}

/// Renders `value` as `(a + b)` or `(a - b)` with a random split point.
pub fn decompose_integer<R: Rng + ?Sized>(value: i64, spread: i64, rng: &mut R) -> String {
    let a = rng.random_range(-spread..=spread);
    let b = value - a;
    if b < 0 {
        format!("({a} - {})", -b)
    } else {
        format!("({a} + {b})")
    }
}

/// A Lua table constructor whose entries evaluate to `bytes`.
pub fn key_expression<R: Rng + ?Sized>(bytes: &[u8], rng: &mut R) -> String {
    let entries: Vec<String> = bytes
        .iter()
        .map(|&b| decompose_integer(i64::from(b), 999, rng))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// A portable bytewise XOR `local function name(a, b)`.
pub fn xor_function<R: Rng + ?Sized>(
    name: &str,
    names: &mut NameGenerator,
    rng: &mut R,
) -> Result<String> {
    let [a, b, r, p, u, v] = names.fresh_array(rng)?;
    Ok(format!(
        "local function {name}({a}, {b})
  local {r}, {p} = 0, 1
  while {a} > 0 or {b} > 0 do
    local {u}, {v} = {a} % 2, {b} % 2
    if {u} ~= {v} then {r} = {r} + {p} end
    {a}, {b}, {p} = ({a} - {u}) / 2, ({b} - {v}) / 2, {p} * 2
  end
  return {r}
end
"
    ))
}

/// Local bindings for the primitives every decoder needs.
///
/// Only `_G` is referenced literally; it is the one bootstrap symbol that has
/// to exist before anything can be looked up.
pub struct Primitives {
    pub char: String,
    pub byte: String,
    pub sub: String,
    pub concat: String,
    pub tonumber: String,
    pub load: String,
    source: String,
}

impl Primitives {
    pub fn new<R: Rng + ?Sized>(names: &mut NameGenerator, rng: &mut R) -> Result<Self> {
        let [g, s, t, char, byte, sub, concat, tonumber, load] = names.fresh_array(rng)?;
        let source = format!(
            "local {g} = _G
local {s}, {t} = {}, {}
local {char}, {byte}, {sub} = {s}[{}], {s}[{}], {s}[{}]
local {concat}, {tonumber} = {t}[{}], {}
local {load} = {} or {}
",
            global_lookup(&g, "string"),
            global_lookup(&g, "table"),
            decimal_escaped(b"char"),
            decimal_escaped(b"byte"),
            decimal_escaped(b"sub"),
            decimal_escaped(b"concat"),
            global_lookup(&g, "tonumber"),
            global_lookup(&g, "loadstring"),
            global_lookup(&g, "load"),
        );
        Ok(Self {
            char,
            byte,
            sub,
            concat,
            tonumber,
            load,
            source,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Source of the literal decoder bound to the local `decoder`.
///
/// `decoder(payload, key)` takes two symbol-framed strings, XORs the payload
/// with the repeating key and returns the plaintext. Malformed input yields
/// `""` instead of raising.
pub fn literal_decoder<R: Rng + ?Sized>(
    decoder: &str,
    alphabet: &SymbolAlphabet,
    names: &mut NameGenerator,
    rng: &mut R,
) -> Result<String> {
    let prims = Primitives::new(names, rng)?;
    let [alpha, map, xor, unframe, text, out, i, hi, lo, payload, key, bytes, key_bytes] =
        names.fresh_array(rng)?;
    let xor_src = xor_function(&xor, names, rng)?;
    let (ch, sb, cc) = (&prims.char, &prims.sub, &prims.concat);

    Ok(format!(
        "local {decoder}
do
{prims}local {alpha} = \"{symbols}\"
local {map} = {{}}
for {i} = 1, #{alpha} do {map}[{sb}({alpha}, {i}, {i})] = {i} - 1 end
{xor_src}local function {unframe}({text})
  local {out} = {{}}
  for {i} = 1, #{text} - 1, 2 do
    local {hi}, {lo} = {map}[{sb}({text}, {i}, {i})], {map}[{sb}({text}, {i} + 1, {i} + 1)]
    if not {hi} or not {lo} then return nil end
    {out}[#{out} + 1] = {hi} * 16 + {lo}
  end
  return {out}
end
{decoder} = function({payload}, {key})
  local {bytes}, {key_bytes} = {unframe}({payload}), {unframe}({key})
  if not {bytes} or not {key_bytes} or #{key_bytes} == 0 then return \"\" end
  local {out} = {{}}
  for {i} = 1, #{bytes} do
    {out}[{i}] = {ch}({xor}({bytes}[{i}], {key_bytes}[({i} - 1) % #{key_bytes} + 1]))
  end
  return {cc}({out})
end
end
",
        prims = prims.source(),
        symbols = alphabet.as_str(),
    ))
}
