//! Login codes and the generator that mints them.
//!
//! Codes are relayed by a human (typed or scanned from a QR image), so the
//! alphabet skips glyphs that are easy to confuse (`0`/`O`, `1`/`I`).

use once_cell::sync::Lazy;
use rand::{RngCore, rngs::OsRng};
use regex::Regex;
use std::fmt;

use super::error::HandshakeError;

/// 32 symbols, so every random byte maps onto the alphabet without bias.
const ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 32;
pub const DEFAULT_CODE_LENGTH: usize = 8;

static CODE_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{4,32}$"));

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoginCode(String);

impl LoginCode {
    /// Normalize and validate a code received from a client.
    ///
    /// Returns `None` when the value cannot be a login code, so callers can
    /// reject it without touching the store.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        if valid_code(&normalized) {
            Some(Self(normalized))
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoginCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn valid_code(code: &str) -> bool {
    CODE_PATTERN
        .as_ref()
        .is_ok_and(|pattern| pattern.is_match(code))
}

/// Source of fresh login codes.
pub trait CodeSource: Send + Sync {
    /// Produce a new code.
    ///
    /// # Errors
    /// Returns `HandshakeError::Entropy` if the random source is unavailable.
    fn issue(&self) -> Result<LoginCode, HandshakeError>;
}

/// Draws codes from the operating system CSPRNG.
#[derive(Clone, Copy, Debug)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH),
        }
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeSource for RandomCodeGenerator {
    fn issue(&self) -> Result<LoginCode, HandshakeError> {
        let mut bytes = vec![0u8; self.length];
        OsRng.try_fill_bytes(&mut bytes)?;
        let code = bytes
            .iter()
            .map(|byte| char::from(ALPHABET[usize::from(byte & 0x1f)]))
            .collect();
        Ok(LoginCode(code))
    }
}
