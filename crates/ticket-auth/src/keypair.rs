//! Site keypair provisioning for the asymmetric ticket method

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keypair errors
#[derive(Debug, Error)]
pub enum KeypairError {
    #[error("Failed to read key file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// For sources backed by a vault or key service that has no keypair to hand out
    #[error("Keypair unavailable: {0}")]
    Missing(String),
}

/// PEM-encoded site keypair
#[derive(Clone)]
pub struct Keypair {
    pub public_key_pem: String,
    pub private_key_pem: String,
}

impl Keypair {
    pub fn new(public_key_pem: String, private_key_pem: String) -> Self {
        Self {
            public_key_pem,
            private_key_pem,
        }
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key_pem", &self.public_key_pem)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Source of the site keypair
///
/// The host application usually already manages a keypair for
/// server-to-server trust; implement this trait to hand it over.
pub trait KeypairSource: Send + Sync {
    fn keypair(&self) -> Result<Keypair, KeypairError>;
}

/// Keypair held in memory
pub struct StaticKeypair(Keypair);

impl StaticKeypair {
    pub fn new(keypair: Keypair) -> Self {
        Self(keypair)
    }
}

impl KeypairSource for StaticKeypair {
    fn keypair(&self) -> Result<Keypair, KeypairError> {
        Ok(self.0.clone())
    }
}

/// Keypair read from two PEM files on every call
#[derive(Debug, Clone)]
pub struct PemFiles {
    public_key: PathBuf,
    private_key: PathBuf,
}

impl PemFiles {
    pub fn new(public_key: impl Into<PathBuf>, private_key: impl Into<PathBuf>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }
}

fn read_pem(path: &Path) -> Result<String, KeypairError> {
    std::fs::read_to_string(path).map_err(|source| KeypairError::Read {
        path: path.to_path_buf(),
        source,
    })
}

impl KeypairSource for PemFiles {
    fn keypair(&self) -> Result<Keypair, KeypairError> {
        Ok(Keypair {
            public_key_pem: read_pem(&self.public_key)?,
            private_key_pem: read_pem(&self.private_key)?,
        })
    }
}
