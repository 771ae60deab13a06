//! Opaque name generation and the per-run rename table.

use crate::{Error, Result};
use rand::Rng;
use std::collections::{HashMap, HashSet};

const LEADING: &[u8] = b"lIO";
const BODY: &[u8] = b"lI1O0";
const NAME_LEN: usize = 12;
const MAX_ATTEMPTS: usize = 64;

/// Draws opaque identifiers that collide with nothing already taken.
///
/// Names look like `_lI10OlIlO01I`: a leading underscore, then a letter,
/// then confusable letters and digits.
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    taken: HashSet<String>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `name` as unavailable for generation.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Draws a fresh name and marks it taken.
    pub fn fresh<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<String> {
        for _ in 0..MAX_ATTEMPTS {
            let mut name = String::with_capacity(NAME_LEN + 1);
            name.push('_');
            name.push(LEADING[rng.random_range(0..LEADING.len())] as char);
            for _ in 1..NAME_LEN {
                name.push(BODY[rng.random_range(0..BODY.len())] as char);
            }
            if self.taken.insert(name.clone()) {
                return Ok(name);
            }
        }
        Err(Error::NameSpaceExhausted(MAX_ATTEMPTS))
    }

    /// Draws `N` fresh names at once.
    pub fn fresh_array<const N: usize, R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<[String; N]> {
        let names = (0..N)
            .map(|_| self.fresh(rng))
            .collect::<Result<Vec<_>>>()?;
        names
            .try_into()
            .map_err(|_| Error::NameSpaceExhausted(N))
    }
}

/// Original identifier to opaque replacement, for one run only.
///
/// Append-only: a name is mapped once and keeps its replacement for the
/// rest of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    map: HashMap<String, String>,
}

impl RenameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.map.get(original).map(String::as_str)
    }

    pub fn contains(&self, original: &str) -> bool {
        self.map.contains_key(original)
    }

    pub fn insert(&mut self, original: String, replacement: String) -> Result<()> {
        if self.map.contains_key(&original) {
            return Err(Error::DuplicateRename(original));
        }
        self.map.insert(original, replacement);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.map
    }
}
