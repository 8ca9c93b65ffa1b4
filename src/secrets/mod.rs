//! Secret handling
//!
//! The API key is the only secret this engine touches. It is read once at
//! startup, wrapped in [`SecretString`] so it can never leak through `Debug`
//! or `Display` formatting, and zeroized when dropped.

use std::fmt;
use zeroize::Zeroize;

/// Environment variable the API key is read from.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `Debug` and `Display` always print `[REDACTED]`. To access the actual
/// secret value, use the `unsecure()` method. The underlying buffer is
/// wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new SecretString
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn unsecure(&self) -> &str {
        &self.0
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Read the API key from the environment, once, at startup.
///
/// Returns `None` when the variable is unset or blank. The engine treats an
/// absent key as a user-facing configuration condition, not an error.
pub fn api_key_from_env() -> Option<SecretString> {
    match std::env::var(API_KEY_ENV) {
        Ok(v) if !v.trim().is_empty() => Some(SecretString::new(v)),
        _ => None,
    }
}
