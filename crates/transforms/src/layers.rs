//! Layered payload encoding.
//!
//! Each layer turns a whole module into a quoted payload plus a small stub
//! that rebuilds the text at run time and executes it. Layers nest: the stub
//! produced for layer `k` is the module text wrapped by layer `k + 1`, and
//! the outermost stub is the emitted artifact. Every layer draws its own key.
//!
//! The stubs themselves are not obfuscated, apart from reaching runtime
//! primitives through `_G` by escaped name and spelling the key as
//! arithmetic. A corrupted payload yields an empty chunk instead of an error.

use crate::names::NameGenerator;
use crate::runtime::{Primitives, key_expression, xor_function};
use crate::{Error, PassConfig, Result};
use murk_core::cipher::{base64_decode, base64_encode};
use murk_core::literal::unescape;
use murk_core::{EncryptionKey, SymbolAlphabet};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const BASE64_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Additive key, lowercase hex digits.
    Hex,
    /// XOR key, decimal escapes.
    Xor,
    /// Additive key, base-16 over a shuffled punctuation alphabet.
    Symbol,
    /// XOR key, standard base64.
    Base64,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Hex,
        LayerKind::Xor,
        LayerKind::Symbol,
        LayerKind::Base64,
    ];

    fn keystream(self) -> Keystream {
        match self {
            LayerKind::Hex | LayerKind::Symbol => Keystream::Additive,
            LayerKind::Xor | LayerKind::Base64 => Keystream::Xor,
        }
    }

    /// Parses a comma separated list such as `hex,xor`.
    pub fn parse_list(list: &str) -> Result<Vec<LayerKind>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for LayerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(LayerKind::Hex),
            "xor" => Ok(LayerKind::Xor),
            "symbol" | "symbols" => Ok(LayerKind::Symbol),
            "base64" | "b64" => Ok(LayerKind::Base64),
            other => Err(Error::InvalidLayer(other.to_string())),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Hex => "hex",
            LayerKind::Xor => "xor",
            LayerKind::Symbol => "symbol",
            LayerKind::Base64 => "base64",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keystream {
    Additive,
    Xor,
}

/// One encoding layer with its own key material.
#[derive(Debug, Clone)]
pub struct PayloadLayer {
    kind: LayerKind,
    key: EncryptionKey,
    alphabet: SymbolAlphabet,
}

impl PayloadLayer {
    pub fn new<R: Rng + ?Sized>(kind: LayerKind, config: &PassConfig, rng: &mut R) -> Self {
        Self {
            kind,
            key: EncryptionKey::generate(rng, config.min_key_len, config.max_key_len),
            alphabet: SymbolAlphabet::shuffled(rng),
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    fn apply_key(&self, data: &[u8]) -> Vec<u8> {
        match self.kind.keystream() {
            Keystream::Additive => self.key.add(data),
            Keystream::Xor => self.key.xor(data),
        }
    }

    fn remove_key(&self, data: &[u8]) -> Vec<u8> {
        match self.kind.keystream() {
            Keystream::Additive => self.key.sub(data),
            Keystream::Xor => self.key.xor(data),
        }
    }

    /// Keys and frames `text`. The result is safe inside a double-quoted Lua
    /// string.
    pub fn encode(&self, text: &[u8]) -> String {
        let keyed = self.apply_key(text);
        match self.kind {
            LayerKind::Hex => hex::encode(keyed),
            LayerKind::Xor => keyed.iter().map(|b| format!("\\{b}")).collect(),
            LayerKind::Symbol => self.alphabet.encode(&keyed),
            LayerKind::Base64 => base64_encode(&keyed),
        }
    }

    /// Inverse of [`PayloadLayer::encode`].
    pub fn decode(&self, framed: &str) -> Result<Vec<u8>> {
        let keyed = match self.kind {
            LayerKind::Hex => hex::decode(framed).map_err(murk_core::Error::from)?,
            LayerKind::Xor => unescape(framed.as_bytes())
                .ok_or_else(|| Error::Encoding("malformed escape in payload".into()))?,
            LayerKind::Symbol => self.alphabet.decode(framed)?,
            LayerKind::Base64 => base64_decode(framed)?,
        };
        Ok(self.remove_key(&keyed))
    }

    /// The stub that decodes `module` and runs it, forwarding chunk varargs
    /// and return values.
    pub fn stub<R: Rng + ?Sized>(
        &self,
        module: &str,
        names: &mut NameGenerator,
        rng: &mut R,
    ) -> Result<String> {
        let prims = Primitives::new(names, rng)?;
        let [payload, key, out, pos, put, value, chunk] = names.fresh_array(rng)?;
        let mut src = prims.source().to_string();

        let slot = format!("{key}[({pos} - 1) % #{key} + 1]");
        let combine = match self.kind.keystream() {
            Keystream::Additive => format!("({value} - {slot}) % 256"),
            Keystream::Xor => {
                let xor = names.fresh(rng)?;
                src.push_str(&xor_function(&xor, names, rng)?);
                format!("{xor}({value}, {slot})")
            }
        };

        src.push_str(&format!(
            "local {payload} = \"{encoded}\"
local {key} = {key_expr}
local {out}, {pos} = {{}}, 0
local function {put}({value})
  {pos} = {pos} + 1
  {out}[{pos}] = {ch}({combine})
end
",
            encoded = self.encode(module.as_bytes()),
            key_expr = key_expression(self.key.as_bytes(), rng),
            ch = prims.char,
        ));
        src.push_str(&self.read_loop(&prims, &payload, &out, &put, names, rng)?);
        src.push_str(&format!(
            "local {chunk} = {load}({concat}({out}))
if {chunk} then return {chunk}(...) end
",
            load = prims.load,
            concat = prims.concat,
        ));
        Ok(src)
    }

    /// The loop that walks the payload and feeds each keyed byte to `put`.
    fn read_loop<R: Rng + ?Sized>(
        &self,
        prims: &Primitives,
        payload: &str,
        out: &str,
        put: &str,
        names: &mut NameGenerator,
        rng: &mut R,
    ) -> Result<String> {
        let (sb, by, tn) = (&prims.sub, &prims.byte, &prims.tonumber);
        let [i, map, alpha, a, b, c, d, n] = names.fresh_array(rng)?;

        let text = match self.kind {
            LayerKind::Hex => format!(
                "for {i} = 1, #{payload} - 1, 2 do
  local {a} = {tn}({sb}({payload}, {i}, {i} + 1), 16)
  if not {a} then {out} = {{}} break end
  {put}({a})
end
"
            ),
            LayerKind::Xor => format!(
                "for {i} = 1, #{payload} do {put}({by}({payload}, {i})) end
"
            ),
            LayerKind::Symbol => format!(
                "local {alpha}, {map} = \"{symbols}\", {{}}
for {i} = 1, #{alpha} do {map}[{sb}({alpha}, {i}, {i})] = {i} - 1 end
for {i} = 1, #{payload} - 1, 2 do
  local {a}, {b} = {map}[{sb}({payload}, {i}, {i})], {map}[{sb}({payload}, {i} + 1, {i} + 1)]
  if not {a} or not {b} then {out} = {{}} break end
  {put}({a} * 16 + {b})
end
",
                symbols = self.alphabet.as_str(),
            ),
            LayerKind::Base64 => format!(
                "local {alpha}, {map} = \"{BASE64_ALPHABET}\", {{[\"=\"] = 0}}
for {i} = 1, #{alpha} do {map}[{sb}({alpha}, {i}, {i})] = {i} - 1 end
for {i} = 1, #{payload} - 3, 4 do
  local {a}, {b} = {map}[{sb}({payload}, {i}, {i})], {map}[{sb}({payload}, {i} + 1, {i} + 1)]
  local {c}, {d} = {map}[{sb}({payload}, {i} + 2, {i} + 2)], {map}[{sb}({payload}, {i} + 3, {i} + 3)]
  if not {a} or not {b} or not {c} or not {d} then {out} = {{}} break end
  local {n} = (({a} * 64 + {b}) * 64 + {c}) * 64 + {d}
  {put}(({n} - {n} % 65536) / 65536)
  if {sb}({payload}, {i} + 2, {i} + 2) ~= \"=\" then {put}(({n} - {n} % 256) / 256 % 256) end
  if {sb}({payload}, {i} + 3, {i} + 3) ~= \"=\" then {put}({n} % 256) end
end
"
            ),
        };
        Ok(text)
    }
}

/// Wraps `module` in each layer in turn; the first layer is the innermost.
pub fn wrap_layers<R: Rng + ?Sized>(
    module: String,
    kinds: &[LayerKind],
    config: &PassConfig,
    names: &mut NameGenerator,
    rng: &mut R,
) -> Result<String> {
    kinds.iter().try_fold(module, |text, kind| {
        let layer = PayloadLayer::new(*kind, config, rng);
        let stub = layer.stub(&text, names, rng)?;
        debug!(
            "layer {}: {} -> {} bytes, key {} bytes",
            kind,
            text.len(),
            stub.len(),
            layer.key().len()
        );
        Ok(stub)
    })
}
