// src/digest/set.rs
// =============================================================================
// DigestSet: the map from algorithm name to hex-encoded output.
//
// The key names are a contract with anything that reads our output
// (the JSON report, integrity checks), so they live here as constants:
//
//   "sha3-256"     SHA3-256 of the title
//   "blake2b-256"  BLAKE2b-256 of the title
//   "pbkdf2-sha3"  PBKDF2-HMAC-SHA3-256 of the title, 32 bytes
//   "salt"         the salt used for the derivation
//
// Every value is lowercase hex.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

pub const SHA3_256: &str = "sha3-256";
pub const BLAKE2B_256: &str = "blake2b-256";
pub const PBKDF2_SHA3: &str = "pbkdf2-sha3";
pub const SALT: &str = "salt";

// BTreeMap keeps the keys sorted, so printing and JSON output come out
// in the same order every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DigestSet(BTreeMap<String, String>);

impl DigestSet {
    pub(crate) fn insert(&mut self, algorithm: &str, hex_value: String) {
        self.0.insert(algorithm.to_string(), hex_value);
    }

    pub fn get(&self, algorithm: &str) -> Option<&str> {
        self.0.get(algorithm).map(String::as_str)
    }

    pub fn sha3_256(&self) -> Option<&str> {
        self.get(SHA3_256)
    }

    pub fn blake2b_256(&self) -> Option<&str> {
        self.get(BLAKE2B_256)
    }

    pub fn pbkdf2_sha3(&self) -> Option<&str> {
        self.get(PBKDF2_SHA3)
    }

    pub fn salt(&self) -> Option<&str> {
        self.get(SALT)
    }

    // Iterates (algorithm, hex value) pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
