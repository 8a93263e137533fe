//! Keypair ticket sealing
//!
//! The site private key signs the serialized payload with RS256 and the
//! public key verifies it on return. Anyone holding the public key can read
//! the payload; what the keypair guarantees is that only the site issued it.
//!
//! Sealed form: `base64url(plaintext) "." base64url(signature)`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey};

use crate::cipher::{CipherError, TicketCipher, TicketMethod};
use crate::keypair::Keypair;

const ALGORITHM: Algorithm = Algorithm::RS256;

/// RS256 signer/verifier over the site keypair
pub struct RsaCipher {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl RsaCipher {
    /// Build from PEM-encoded keys
    ///
    /// The private key may be PKCS#1 (`BEGIN RSA PRIVATE KEY`) or PKCS#8
    /// (`BEGIN PRIVATE KEY`); the public key is `BEGIN PUBLIC KEY` or
    /// `BEGIN RSA PUBLIC KEY`.
    pub fn from_pem(private_key_pem: &[u8], public_key_pem: &[u8]) -> Result<Self, CipherError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| CipherError::InvalidKey(format!("private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem)
            .map_err(|e| CipherError::InvalidKey(format!("public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
        })
    }

    pub fn from_keypair(keypair: &Keypair) -> Result<Self, CipherError> {
        Self::from_pem(
            keypair.private_key_pem.as_bytes(),
            keypair.public_key_pem.as_bytes(),
        )
    }
}

impl TicketCipher for RsaCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let message = URL_SAFE_NO_PAD.encode(plaintext);
        let signature = crypto::sign(message.as_bytes(), &self.encoding_key, ALGORITHM)
            .map_err(|e| CipherError::Seal(e.to_string()))?;

        Ok(format!("{}.{}", message, signature).into_bytes())
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        let sealed = std::str::from_utf8(sealed)
            .map_err(|_| CipherError::Open("sealed ticket is not text".to_string()))?;
        let (message, signature) = sealed
            .split_once('.')
            .ok_or_else(|| CipherError::Open("missing signature".to_string()))?;

        let valid = crypto::verify(signature, message.as_bytes(), &self.decoding_key, ALGORITHM)
            .map_err(|e| CipherError::Open(e.to_string()))?;
        if !valid {
            return Err(CipherError::Open("signature mismatch".to_string()));
        }

        URL_SAFE_NO_PAD
            .decode(message)
            .map_err(|e| CipherError::Open(e.to_string()))
    }

    fn method(&self) -> TicketMethod {
        TicketMethod::Asymmetric
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str = include_str!("../tests/fixtures/private_key.pem");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/public_key.pem");
    const OTHER_PUBLIC_KEY: &str = include_str!("../tests/fixtures/other_public_key.pem");

    fn cipher() -> RsaCipher {
        RsaCipher::from_pem(PRIVATE_KEY.as_bytes(), PUBLIC_KEY.as_bytes()).unwrap()
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let cipher = cipher();
        let plaintext = br#"{"username":"jdoe","wantsurl":"https://lms.example.com/"}"#;

        let sealed = cipher.seal(plaintext).unwrap();
        assert_eq!(cipher.open(&sealed).unwrap(), plaintext.to_vec());
    }

    #[test]
    fn test_open_with_foreign_public_key_fails() {
        let sealed = cipher().seal(b"payload").unwrap();
        let foreign =
            RsaCipher::from_pem(PRIVATE_KEY.as_bytes(), OTHER_PUBLIC_KEY.as_bytes()).unwrap();

        assert!(foreign.open(&sealed).is_err());
    }

    #[test]
    fn test_open_rejects_swapped_message() {
        let cipher = cipher();
        let sealed = String::from_utf8(cipher.seal(b"alice").unwrap()).unwrap();
        let (_, signature) = sealed.split_once('.').unwrap();

        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode(b"mallory"), signature);
        assert!(cipher.open(forged.as_bytes()).is_err());
        assert!(cipher.open(b"no-signature-here").is_err());
    }

    #[test]
    fn test_invalid_pem_rejected() {
        let result = RsaCipher::from_pem(b"not a key", PUBLIC_KEY.as_bytes());
        assert!(matches!(result, Err(CipherError::InvalidKey(_))));

        let result = RsaCipher::from_pem(PRIVATE_KEY.as_bytes(), b"not a key");
        assert!(matches!(result, Err(CipherError::InvalidKey(_))));
    }
}
