//! State owned by exactly one obfuscation run.
//!
//! A [`RunContext`] is built per call to
//! [`obfuscate_source`](crate::obfuscator::obfuscate_source) and dropped with
//! it. Key material, the rename table and the name generator therefore never
//! leak between runs, concurrent or not. Only the parser and the reserved set
//! are shared, and both are read-only.

use crate::names::{NameGenerator, RenameTable};
use crate::runtime;
use crate::{PassConfig, Result};
use murk_core::{EncryptionKey, ParserAdapter, ReservedSet, SourceBuffer, SymbolAlphabet, Tree};
use rand::Rng;
use std::collections::HashSet;

/// Counters reported in the obfuscation metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub literals_encrypted: usize,
    pub numbers_decomposed: usize,
    pub identifiers_renamed: usize,
    pub globals_indirected: usize,
    pub dispatch_states: usize,
}

#[derive(Clone)]
pub struct RunContext<'a> {
    pub buffer: SourceBuffer,
    pub parser: &'a dyn ParserAdapter,
    pub reserved: &'a ReservedSet,
    pub renames: RenameTable,
    pub names: NameGenerator,
    pub stats: RunStats,
    literal_key: EncryptionKey,
    literal_alphabet: SymbolAlphabet,
    /// Names the pipeline itself introduced; never renamed.
    injected: HashSet<String>,
    decoder: Option<String>,
    prologue: Vec<String>,
}

impl<'a> RunContext<'a> {
    /// Parses `source` once to validate it and to reserve every name it uses,
    /// then draws the run's literal key.
    pub fn new<R: Rng + ?Sized>(
        source: &str,
        parser: &'a dyn ParserAdapter,
        reserved: &'a ReservedSet,
        config: &PassConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let tree = parser.parse(source)?;
        let mut names = NameGenerator::new();
        for (name, _) in tree.identifiers() {
            names.reserve(name);
        }

        Ok(Self {
            buffer: SourceBuffer::new(source),
            parser,
            reserved,
            renames: RenameTable::new(),
            names,
            stats: RunStats::default(),
            literal_key: EncryptionKey::generate(rng, config.min_key_len, config.max_key_len),
            literal_alphabet: SymbolAlphabet::shuffled(rng),
            injected: HashSet::new(),
            decoder: None,
            prologue: Vec::new(),
        })
    }

    /// Re-parses the current buffer. Spans in the returned tree refer to the
    /// buffer as it is now.
    pub fn reparse(&self) -> Result<Tree> {
        Ok(self.parser.parse(self.buffer.as_str())?)
    }

    /// Draws an opaque name for pipeline-emitted code and protects it from renaming.
    pub fn inject_name<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<String> {
        let name = self.names.fresh(rng)?;
        self.injected.insert(name.clone());
        Ok(name)
    }

    pub fn inject_array<const N: usize, R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<[String; N]> {
        let names = self.names.fresh_array(rng)?;
        self.injected.extend(names.iter().cloned());
        Ok(names)
    }

    pub fn is_injected(&self, name: &str) -> bool {
        self.injected.contains(name)
    }

    /// The literal decoder's name, allocating it on first use.
    pub fn decoder_name<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<String> {
        if let Some(name) = &self.decoder {
            return Ok(name.clone());
        }
        let name = self.inject_name(rng)?;
        self.decoder = Some(name.clone());
        Ok(name)
    }

    /// A call expression that evaluates to `bytes` at run time.
    pub fn encrypted_call<R: Rng + ?Sized>(&mut self, bytes: &[u8], rng: &mut R) -> Result<String> {
        let decoder = self.decoder_name(rng)?;
        let payload = self.literal_alphabet.encode(&self.literal_key.xor(bytes));
        let key = self.literal_alphabet.encode(self.literal_key.as_bytes());
        Ok(format!("{decoder}(\"{payload}\", \"{key}\")"))
    }

    /// Queues a section to be emitted after the decoder and before the body.
    pub fn push_prologue(&mut self, section: String) {
        self.prologue.push(section);
    }

    /// Joins decoder, prologue sections and body into the module text.
    pub fn assemble<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<String> {
        let mut module = String::new();
        if let Some(decoder) = self.decoder.clone() {
            module.push_str(&runtime::literal_decoder(
                &decoder,
                &self.literal_alphabet,
                &mut self.names,
                rng,
            )?);
        }
        for section in &self.prologue {
            module.push_str(section);
        }
        module.push_str(self.buffer.as_str());
        if !module.ends_with('\n') {
            module.push('\n');
        }
        Ok(module)
    }

    #[cfg(test)]
    pub(crate) fn literal_material(&self) -> (&EncryptionKey, &SymbolAlphabet) {
        (&self.literal_key, &self.literal_alphabet)
    }
}
