//! Shared-secret ticket sealing
//!
//! The key is the first 32 characters of the base64 form of the site secret,
//! taken as the raw bytes of an AES-256 key. Each ticket is sealed with
//! AES-256-GCM under a fresh 96-bit nonce and written out as upper-case hex of
//! `nonce || ciphertext || tag`.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::cipher::{CipherError, TicketCipher, TicketMethod};

/// Length of the derived key, in characters of the base64 secret
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AES-256-GCM cipher keyed from the site secret
#[derive(Clone)]
pub struct AesCipher {
    cipher: Aes256Gcm,
}

impl AesCipher {
    /// Derive the ticket key from the site-wide secret
    ///
    /// Fails when the base64 form of the secret is shorter than 32 characters,
    /// i.e. for secrets shorter than 22 bytes.
    pub fn from_site_secret(secret: &str) -> Result<Self, CipherError> {
        let key = derive_key(secret)?;
        Ok(Self::from_key(&key))
    }

    pub fn from_key(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }
}

/// `base64(secret)` truncated to 32 characters
pub fn derive_key(secret: &str) -> Result<[u8; KEY_LEN], CipherError> {
    let encoded = STANDARD.encode(secret.as_bytes());
    if encoded.len() < KEY_LEN {
        return Err(CipherError::InvalidKey(format!(
            "site secret too short: base64 form has {} characters, {} required",
            encoded.len(),
            KEY_LEN
        )));
    }

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&encoded.as_bytes()[..KEY_LEN]);
    Ok(key)
}

impl TicketCipher for AesCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CipherError::Seal(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(hex::encode_upper(combined).into_bytes())
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        let combined =
            hex::decode(sealed).map_err(|e| CipherError::Open(format!("not hex: {}", e)))?;

        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Open(format!(
                "sealed ticket too short ({} bytes)",
                combined.len()
            )));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Open("authentication failed".to_string()))
    }

    fn method(&self) -> TicketMethod {
        TicketMethod::Symmetric
    }
}
