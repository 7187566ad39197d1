//! Random secret generation.
//!
//! Draws from the operating system CSPRNG (`OsRng`). There is no seedable
//! generator anywhere in this path: the outputs protect the TLS keystore and
//! the admin account.

use rand::distr::{Distribution, Uniform};
use rand::{rngs::OsRng, TryRngCore};
use thiserror::Error;

use super::SecretString;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// Length of generated keystore and admin passwords.
pub const DEFAULT_PASSWORD_LEN: usize = 16;

/// Character set a secret is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretAlphabet {
    /// `a-zA-Z0-9`
    Alphanumeric,
    /// `a-z0-9`, safe for storage account names.
    LowercaseAlphanumeric,
}

impl SecretAlphabet {
    pub fn symbols(&self) -> Vec<u8> {
        match self {
            SecretAlphabet::Alphanumeric => [LOWERCASE, UPPERCASE, DIGITS].concat(),
            SecretAlphabet::LowercaseAlphanumeric => [LOWERCASE, DIGITS].concat(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("cannot draw symbols from an empty alphabet")]
    EmptyAlphabet,
}

/// Generate a secret of `length` symbols drawn uniformly from `alphabet`.
///
/// # Panics
///
/// If the operating system random source fails, as `rand::rng()` would.
pub fn generate_secret(length: usize, alphabet: SecretAlphabet) -> Result<SecretString, SecretError> {
    random_string(length, alphabet).map(SecretString::new)
}

/// Same source as [`generate_secret`] but returns a plain string, for values
/// that are random but not sensitive (e.g. name suffixes).
pub fn random_suffix(length: usize, alphabet: SecretAlphabet) -> Result<String, SecretError> {
    random_string(length, alphabet)
}

fn random_string(length: usize, alphabet: SecretAlphabet) -> Result<String, SecretError> {
    let symbols = alphabet.symbols();
    let index = Uniform::new(0, symbols.len()).map_err(|_| SecretError::EmptyAlphabet)?;
    let mut rng = OsRng.unwrap_err();
    Ok(index
        .sample_iter(&mut rng)
        .take(length)
        .map(|i| char::from(symbols[i]))
        .collect())
}
