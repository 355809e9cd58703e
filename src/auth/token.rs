//! API tokens: `stampbook_<lookup>_<secret>`.
//!
//! The lookup half is stored in clear and indexed so a presented token can be
//! found without scanning. The whole token is only ever stored as an argon2id
//! hash.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;

use crate::error::{Error, Result};

const TOKEN_PREFIX: &str = "stampbook";
const LOOKUP_BYTES: usize = 4;
const SECRET_BYTES: usize = 12;

const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

/// A freshly minted token. `raw` is shown to the caller once and never stored.
#[derive(Debug)]
pub struct IssuedToken {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
}

/// The two halves of a presented token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub lookup: &'a str,
    pub secret: &'a str,
}

pub struct TokenGenerator {
    argon2: Argon2<'static>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .unwrap_or_default();

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn issue(&self) -> Result<IssuedToken> {
        let lookup = random_hex(LOOKUP_BYTES);
        let raw = format!("{TOKEN_PREFIX}_{lookup}_{}", random_hex(SECRET_BYTES));
        let hash = self.hash(&raw)?;
        Ok(IssuedToken { raw, lookup, hash })
    }

    pub fn hash(&self, raw: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Config(format!("failed to hash token: {e}")))
    }

    /// `Ok(false)` means a wrong token; `Err` means the stored hash is unusable.
    pub fn verify(&self, raw: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| Error::Config(format!("invalid token hash: {e}")))?;

        match self.argon2.verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify token: {e}"))),
        }
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Splits a presented token without touching the store.
pub fn parse_token(token: &str) -> Result<TokenParts<'_>> {
    let (lookup, secret) = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.split_once('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    if !is_lower_hex(lookup, LOOKUP_BYTES * 2) || !is_lower_hex(secret, SECRET_BYTES * 2) {
        return Err(Error::InvalidTokenFormat);
    }

    Ok(TokenParts { lookup, secret })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_shape() {
        let issued = TokenGenerator::new().issue().unwrap();

        let parts = parse_token(&issued.raw).unwrap();
        assert_eq!(parts.lookup, issued.lookup);
        assert_eq!(parts.lookup.len(), 8);
        assert_eq!(parts.secret.len(), 24);
        assert!(issued.hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_tokens_are_unique() {
        let generator = TokenGenerator::new();
        let a = generator.issue().unwrap();
        let b = generator.issue().unwrap();
        assert_ne!(a.raw, b.raw);
    }

    #[test]
    fn test_verify() {
        let generator = TokenGenerator::new();
        let issued = generator.issue().unwrap();

        assert!(generator.verify(&issued.raw, &issued.hash).unwrap());

        let mut tampered = issued.raw.clone();
        tampered.pop();
        tampered.push(if issued.raw.ends_with('0') { '1' } else { '0' });
        assert!(!generator.verify(&tampered, &issued.hash).unwrap());

        assert!(generator.verify(&issued.raw, "not-a-hash").is_err());
    }

    #[test]
    fn test_parse_token() {
        let parts = parse_token("stampbook_0a1b2c3d_00112233445566778899aabb").unwrap();
        assert_eq!(
            parts,
            TokenParts {
                lookup: "0a1b2c3d",
                secret: "00112233445566778899aabb",
            }
        );
    }

    #[test]
    fn test_parse_token_rejects_malformed() {
        for bad in [
            "",
            "cutlass_0a1b2c3d_00112233445566778899aabb",
            "stampbook_0a1b2c3d",
            "stampbook_0a1b2c3d_0011223344",
            "stampbook_0A1B2C3D_00112233445566778899aabb",
            "stampbook_0a1b2c3d_00112233_445566778899aabb",
            "stampbook_0a1b2c3d_00112233445566778899aabbcc",
        ] {
            assert!(parse_token(bad).is_err(), "{bad}");
        }
    }
}
