// src/digest/mod.rs
// =============================================================================
// This module turns page titles into cryptographic fingerprints.
//
// Submodules:
// - salt: The random salt each engine owns
// - set: DigestSet, the algorithm-name -> hex map we hand back
// - engine: DigestEngine, which computes the hashes and checks integrity
// =============================================================================

mod engine;
mod salt;
mod set;

pub use engine::DigestEngine;
pub use salt::Salt;
pub use set::DigestSet;

#[cfg(test)]
pub use engine::blake2b_hex;
