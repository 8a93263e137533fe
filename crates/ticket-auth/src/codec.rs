//! Ticket encoding and decoding

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;
use tracing::debug;

use crate::asymmetric::RsaCipher;
use crate::cipher::{CipherError, CipherStrategy, TicketCipher, TicketMethod};
use crate::config::{ConfigError, TicketConfig};
use crate::keypair::KeypairSource;
use crate::locale::Locale;
use crate::payload::{Ticket, TicketPayload};
use crate::symmetric::AesCipher;

/// Ticket errors
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Failed making encoded ticket: {0}")]
    Encryption(#[source] CipherError),

    #[error("Ticket decode error: {0}")]
    Decode(String),

    #[error("Ticket format error: {0}")]
    TicketFormat(String),
}

impl TicketError {
    /// Message suitable for the person who followed the link
    ///
    /// Never contains cipher details or ticket content.
    pub fn user_message(&self, locale: Locale) -> &'static str {
        match self {
            TicketError::Encryption(_) => locale.encryption_error(),
            TicketError::Decode(_) => locale.decode_error(),
            TicketError::TicketFormat(_) => locale.format_error(),
        }
    }
}

/// Issues and reads return tickets with one cipher strategy
pub struct TicketCodec<C = CipherStrategy> {
    cipher: C,
    debug_trace: bool,
}

impl TicketCodec<CipherStrategy> {
    /// Build the codec a deployment is configured for
    ///
    /// `keys` is only consulted for the asymmetric method; a configured
    /// `keypair` section takes its place when `keys` is `None`.
    pub fn from_config(
        config: &TicketConfig,
        keys: Option<&dyn KeypairSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let strategy = match config.method {
            TicketMethod::Symmetric => {
                CipherStrategy::Symmetric(AesCipher::from_site_secret(&config.site_secret)?)
            }
            TicketMethod::Asymmetric => {
                let keypair = match (keys, config.keypair_source()) {
                    (Some(source), _) => source.keypair()?,
                    (None, Some(files)) => files.keypair()?,
                    (None, None) => return Err(ConfigError::MissingKeypair),
                };
                CipherStrategy::Asymmetric(RsaCipher::from_keypair(&keypair)?)
            }
        };

        Ok(TicketCodec::new(strategy).with_debug_trace(config.debug_trace))
    }
}

impl<C: TicketCipher> TicketCodec<C> {
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            debug_trace: false,
        }
    }

    /// Trace decrypted ticket content before parsing
    ///
    /// Off by default. The trace contains the user's login name and
    /// destination; keep it off outside of diagnosis sessions.
    pub fn with_debug_trace(mut self, enabled: bool) -> Self {
        self.debug_trace = enabled;
        self
    }

    pub fn method(&self) -> TicketMethod {
        self.cipher.method()
    }

    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Issue a ticket for `username`, valid for `destination`
    ///
    /// Returns `Ok(None)` without touching the cipher when there is nobody to
    /// authenticate (empty username) or nowhere to send them (empty
    /// destination).
    pub fn issue(
        &self,
        username: &str,
        reason: &str,
        destination: &str,
    ) -> Result<Option<Ticket>, TicketError> {
        if username.is_empty() || destination.is_empty() {
            debug!(
                username_set = !username.is_empty(),
                destination_set = !destination.is_empty(),
                "No ticket needed"
            );
            return Ok(None);
        }

        let payload = TicketPayload::new(
            username.to_string(),
            reason.to_string(),
            destination.to_string(),
        );
        self.encode(&payload).map(Some)
    }

    /// Encode an already-built payload
    pub fn encode(&self, payload: &TicketPayload) -> Result<Ticket, TicketError> {
        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| TicketError::Encryption(CipherError::Seal(e.to_string())))?;

        let sealed = self
            .cipher
            .seal(&plaintext)
            .map_err(TicketError::Encryption)?;

        debug!(
            username = %payload.username,
            method = %self.method(),
            "Issued return ticket"
        );

        Ok(Ticket::new(URL_SAFE_NO_PAD.encode(sealed)))
    }

    /// Decode a ticket produced by [`TicketCodec::encode`] under the same key
    /// material and method
    ///
    /// Does not look at `issued_at`; see [`TicketPayload::is_expired`].
    pub fn decode(&self, ticket: &str) -> Result<TicketPayload, TicketError> {
        let trimmed = ticket.trim().trim_end_matches('=');
        if trimmed.is_empty() {
            return Err(TicketError::Decode("empty ticket".to_string()));
        }

        let sealed = URL_SAFE_NO_PAD
            .decode(trimmed)
            .map_err(|e| TicketError::Decode(format!("invalid base64: {}", e)))?;

        let plaintext = self
            .cipher
            .open(&sealed)
            .map_err(|e| TicketError::Decode(e.to_string()))?;

        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| TicketError::TicketFormat("ticket content is not UTF-8".to_string()))?;

        let escaped = escape_slashes(&plaintext);
        if self.debug_trace {
            debug!(target: "ticket_auth::trace", plaintext = %escaped, "Decrypted ticket");
        }

        let payload: TicketPayload = serde_json::from_str(&escaped)
            .map_err(|e| TicketError::TicketFormat(e.to_string()))?;

        debug!(username = %payload.username, "Decoded return ticket");
        Ok(payload)
    }
}

/// Escape every `/` as `\/`
///
/// Tickets have always been parsed with slashes escaped. For well-formed JSON
/// this is lossless: `/` only occurs inside strings, where `\/` reads back as
/// `/`, and an escaped backslash before it stays an escaped backslash.
pub fn escape_slashes(plaintext: &str) -> String {
    plaintext.replace('/', "\\/")
}
