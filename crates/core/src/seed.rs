use crate::result::Error;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// A 256-bit seed from which all per-run randomness is derived.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    inner: [u8; 32],
}

impl Seed {
    /// Generate a new random 256-bit seed
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        Self { inner: seed }
    }

    /// Create from hex string (with or without 0x prefix)
    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        if hex.len() != 64 {
            return Err(Error::InvalidSeedLength(hex.len()));
        }

        let bytes = hex::decode(hex).map_err(|_| Error::InvalidSeedHex)?;
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes);
        Ok(Self { inner: seed })
    }

    /// Convert to hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.inner))
    }

    /// Create the RNG that drives one obfuscation run.
    ///
    /// The same seed always yields the same key material, names and decoy
    /// layout, so a run can be reproduced by replaying its seed.
    pub fn create_deterministic_rng(&self) -> StdRng {
        let mut hasher = Sha3_256::new();
        hasher.update(b"MURK_SOURCE_OBFUSCATION");
        hasher.update(self.inner);
        let seed_hash: [u8; 32] = hasher.finalize().into();

        StdRng::from_seed(seed_hash)
    }

    /// Get a hash of this seed for identification in reports
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update(self.inner);
        hasher.finalize().into()
    }

    /// Get the hash as hex string
    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash()))
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the raw seed; it reproduces every key of the run.
        f.debug_struct("Seed").field("hash", &self.hash_hex()).finish()
    }
}
