// src/digest/engine.rs
// =============================================================================
// This module fingerprints page titles.
//
// For every title we compute:
// 1. SHA3-256            (Keccak sponge construction)
// 2. BLAKE2b-256         (a completely different design, HAIFA/ChaCha-based)
// 3. PBKDF2-HMAC-SHA3    (10,000 rounds, salted, 32 bytes out)
// 4. the salt itself     (so the derivation can be repeated later)
//
// Two unrelated hash families let a consumer cross-check one against the
// other. The BLAKE2b value doubles as the integrity digest: to check that
// a title hasn't changed, hash it again and compare.
//
// Rust concepts:
// - Generic functions: Digest::digest works for any hash type
// - Type aliases: Blake2b<U32> is BLAKE2b with a 32-byte output
// =============================================================================

use blake2::digest::consts::U32;
use blake2::Blake2b;
use hmac::Hmac;
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_256};
use tracing::debug;

use super::salt::Salt;
use super::set::{self, DigestSet};
use crate::error::PageError;

/// PBKDF2 work factor
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Length of the PBKDF2 output in bytes
pub const DERIVED_KEY_LEN: usize = 32;

type Blake2b256 = Blake2b<U32>;
type HmacSha3 = Hmac<Sha3_256>;

// Holds the salt and does all hashing
//
// The salt is created once in new() and never changes, so two calls to
// hash_title() with the same text always produce the same DigestSet.
#[derive(Debug, Clone)]
pub struct DigestEngine {
    salt: Salt,
}

impl DigestEngine {
    // Creates an engine with a fresh salt from the operating system RNG
    //
    // Returns: PageError::Entropy if the OS can't give us random bytes
    pub fn new() -> Result<Self, PageError> {
        let salt = Salt::generate(&mut OsRng)?;
        debug!(salt = %salt.to_hex(), "created digest engine");
        Ok(Self { salt })
    }

    // Creates an engine around an existing salt
    //
    // Used to repeat a derivation: take the "salt" value out of a
    // DigestSet, parse it with Salt::from_hex, and build an engine from it.
    pub fn with_salt(salt: Salt) -> Self {
        Self { salt }
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    // Computes every digest for a title
    //
    // Parameters:
    //   text: the title (may be empty; hashing "" is perfectly well defined)
    //
    // Returns: a DigestSet with the keys sha3-256, blake2b-256,
    //          pbkdf2-sha3 and salt
    pub fn hash_title(&self, text: &str) -> Result<DigestSet, PageError> {
        let bytes = text.as_bytes();
        let mut hashes = DigestSet::default();

        hashes.insert(set::SHA3_256, hex::encode(Sha3_256::digest(bytes)));
        hashes.insert(set::BLAKE2B_256, blake2b_hex(text));
        hashes.insert(set::PBKDF2_SHA3, self.derive_key_hex(text)?);
        hashes.insert(set::SALT, self.salt.to_hex());

        Ok(hashes)
    }

    // Runs PBKDF2 with HMAC-SHA3-256 over the text and our salt
    //
    // pbkdf2() only fails if HMAC rejects the key length, which it never
    // does, but we still pass that through as HashCompute.
    fn derive_key_hex(&self, text: &str) -> Result<String, PageError> {
        let mut key = [0u8; DERIVED_KEY_LEN];
        pbkdf2::pbkdf2::<HmacSha3>(
            text.as_bytes(),
            self.salt.as_bytes(),
            PBKDF2_ITERATIONS,
            &mut key,
        )
        .map_err(|e| PageError::HashCompute(format!("pbkdf2: {}", e)))?;
        Ok(hex::encode(key))
    }

    // Checks that content still hashes to the digest we stored for it
    //
    // Plain string equality is fine here: titles are public content, so
    // there is no secret for a timing attack to recover.
    pub fn validate_integrity(&self, content: &str, expected_hex_digest: &str) -> bool {
        blake2b_hex(content) == expected_hex_digest
    }
}

// BLAKE2b-256 of a string, as lowercase hex
pub fn blake2b_hex(content: &str) -> String {
    hex::encode(Blake2b256::digest(content.as_bytes()))
}
