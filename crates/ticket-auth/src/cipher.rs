//! Cipher strategies used to seal ticket payloads

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::asymmetric::RsaCipher;
use crate::symmetric::AesCipher;

/// Cipher errors
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Failed to seal ticket: {0}")]
    Seal(String),

    #[error("Failed to open ticket: {0}")]
    Open(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),
}

/// How a ticket is protected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketMethod {
    /// AES-256-GCM keyed from the site secret
    #[default]
    Symmetric,
    /// RS256 signature with the site keypair
    Asymmetric,
}

impl TicketMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketMethod::Symmetric => "symmetric",
            TicketMethod::Asymmetric => "asymmetric",
        }
    }
}

impl fmt::Display for TicketMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "symmetric" | "aes" | "des" => Ok(TicketMethod::Symmetric),
            "asymmetric" | "rsa" => Ok(TicketMethod::Asymmetric),
            other => Err(format!(
                "Unknown ticket method '{}' (expected symmetric or asymmetric)",
                other
            )),
        }
    }
}

/// Seal/open capability shared by both ticket methods
///
/// `open` must be the exact inverse of `seal` for the same key material.
/// Implementations hold only read-only key material and can be shared freely
/// between threads.
pub trait TicketCipher: Send + Sync {
    /// Protect a serialized payload. The output is treated as opaque bytes.
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Recover the serialized payload from `seal` output
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError>;

    fn method(&self) -> TicketMethod;
}

/// The cipher strategy selected for a deployment
pub enum CipherStrategy {
    Symmetric(AesCipher),
    Asymmetric(RsaCipher),
}

impl From<AesCipher> for CipherStrategy {
    fn from(cipher: AesCipher) -> Self {
        CipherStrategy::Symmetric(cipher)
    }
}

impl From<RsaCipher> for CipherStrategy {
    fn from(cipher: RsaCipher) -> Self {
        CipherStrategy::Asymmetric(cipher)
    }
}

impl TicketCipher for CipherStrategy {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self {
            CipherStrategy::Symmetric(c) => c.seal(plaintext),
            CipherStrategy::Asymmetric(c) => c.seal(plaintext),
        }
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self {
            CipherStrategy::Symmetric(c) => c.open(sealed),
            CipherStrategy::Asymmetric(c) => c.open(sealed),
        }
    }

    fn method(&self) -> TicketMethod {
        match self {
            CipherStrategy::Symmetric(c) => c.method(),
            CipherStrategy::Asymmetric(c) => c.method(),
        }
    }
}

impl fmt::Debug for CipherStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs
        f.debug_tuple("CipherStrategy")
            .field(&self.method())
            .finish()
    }
}
