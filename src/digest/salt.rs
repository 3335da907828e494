// src/digest/salt.rs
// =============================================================================
// The salt that key derivation mixes into every title.
//
// A salt is 16 random bytes. Each DigestEngine makes one when it is created
// and keeps it for its whole life, so every derivation from the same engine
// uses the same salt and can be compared with the others.
//
// The salt travels with the results (hex-encoded under the "salt" key), so
// it can be turned back into a Salt with from_hex() to re-derive a value.
// =============================================================================

use std::fmt;

use rand::RngCore;

use crate::error::PageError;

/// Number of random bytes in a salt
pub const SALT_LEN: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    // Fills a new salt from the given random source
    //
    // Uses try_fill_bytes so that a broken entropy source turns into
    // PageError::Entropy instead of a panic.
    pub fn generate<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, PageError> {
        let mut bytes = [0u8; SALT_LEN];
        rng.try_fill_bytes(&mut bytes).map_err(PageError::Entropy)?;
        Ok(Salt(bytes))
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Salt(bytes)
    }

    // Parses a salt from its hex form, as found under the "salt" key
    //
    // Example:
    //   "000102030405060708090a0b0c0d0e0f" -> Salt([0, 1, 2, ..., 15])
    pub fn from_hex(text: &str) -> Result<Self, PageError> {
        let decoded = hex::decode(text).map_err(|e| PageError::SaltFormat(e.to_string()))?;
        let bytes: [u8; SALT_LEN] = decoded.try_into().map_err(|v: Vec<u8>| {
            PageError::SaltFormat(format!("expected {} bytes, got {}", SALT_LEN, v.len()))
        })?;
        Ok(Salt(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

// Debug prints hex rather than a list of numbers
impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Salt").field(&self.to_hex()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    // A random source that always fails, standing in for a broken OS RNG
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    #[test]
    fn test_generate_salt() {
        let salt = Salt::generate(&mut OsRng).unwrap();
        assert_eq!(salt.as_bytes().len(), SALT_LEN);
        assert_eq!(salt.to_hex().len(), SALT_LEN * 2);
    }

    #[test]
    fn test_two_salts_differ() {
        let a = Salt::generate(&mut OsRng).unwrap();
        let b = Salt::generate(&mut OsRng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_broken_rng_is_entropy_error() {
        let result = Salt::generate(&mut BrokenRng);
        assert!(matches!(result, Err(PageError::Entropy(_))));
    }

    #[test]
    fn test_from_hex_round_trip() {
        let salt = Salt::from_bytes([7u8; SALT_LEN]);
        assert_eq!(Salt::from_hex(&salt.to_hex()).unwrap(), salt);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(Salt::from_hex("zz"), Err(PageError::SaltFormat(_))));
        assert!(matches!(Salt::from_hex("0011"), Err(PageError::SaltFormat(_))));
    }

    #[test]
    fn test_debug_shows_hex() {
        let salt = Salt::from_bytes([0xab; SALT_LEN]);
        assert!(format!("{:?}", salt).contains("abababab"));
    }
}
