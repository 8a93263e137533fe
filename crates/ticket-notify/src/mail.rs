//! Mail delivery seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mail delivery errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Recipient rejected: {0}")]
    Rejected(String),

    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// A user account, as sender or recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name; tickets are only issued when this is set
    #[serde(default)]
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

impl User {
    pub fn new(username: &str, email: &str, full_name: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
        }
    }
}

/// Notification template shared by every recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    /// Plain-text body
    #[serde(default)]
    pub text: String,
    /// HTML body; the only place a ticket is ever written
    #[serde(default)]
    pub html: String,
}

impl Notification {
    pub fn new(subject: &str, text: &str, html: &str) -> Self {
        Self {
            subject: subject.to_string(),
            text: text.to_string(),
            html: html.to_string(),
        }
    }
}

/// A fully rendered message for one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: User,
    pub from: User,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Sends rendered messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}
