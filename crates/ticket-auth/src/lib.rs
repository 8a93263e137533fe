//! Return tickets for email notification links
//!
//! A return ticket is a small encrypted (or RSA-signed) payload naming a user,
//! a reason and a destination URL. It is embedded in a link sent by email so
//! the recipient can be authenticated automatically when following it.
//!
//! # Usage
//!
//! ```
//! use ticket_auth::{AesCipher, TicketCodec};
//!
//! let cipher = AesCipher::from_site_secret("a-long-site-wide-password-salt").unwrap();
//! let codec = TicketCodec::new(cipher);
//!
//! let ticket = codec
//!     .issue("jdoe", "forum reply", "https://lms.example.com/mod/forum/view.php?id=7")
//!     .unwrap()
//!     .expect("username and destination are set");
//!
//! let payload = codec.decode(ticket.as_str()).unwrap();
//! assert_eq!(payload.username, "jdoe");
//! ```

pub mod asymmetric;
pub mod cipher;
pub mod codec;
pub mod config;
pub mod keypair;
pub mod locale;
pub mod payload;
pub mod symmetric;

pub use asymmetric::RsaCipher;
pub use cipher::{CipherError, CipherStrategy, TicketCipher, TicketMethod};
pub use codec::{TicketCodec, TicketError};
pub use config::{
    time_guard, ConfigError, KeypairPaths, MemorySettings, SettingsStore, TicketConfig,
    DEFAULT_TIME_GUARD,
};
pub use keypair::{Keypair, KeypairError, KeypairSource, PemFiles, StaticKeypair};
pub use locale::Locale;
pub use payload::{Ticket, TicketPayload};
pub use symmetric::AesCipher;
