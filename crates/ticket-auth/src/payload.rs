//! Ticket payload and the encoded ticket string

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content carried inside a return ticket
///
/// The JSON keys (`username`, `reason`, `wantsurl`, `date`) are part of the
/// wire format and must not change while tickets issued under the same key
/// material are still in circulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketPayload {
    /// Login name of the recipient
    pub username: String,
    /// Free-text purpose of the ticket
    pub reason: String,
    /// Where the recipient is sent once the ticket is accepted
    #[serde(rename = "wantsurl")]
    pub destination: String,
    /// Issue time (unix seconds)
    #[serde(rename = "date")]
    pub issued_at: i64,
}

impl TicketPayload {
    /// Build a payload stamped with the current time
    pub fn new(username: String, reason: String, destination: String) -> Self {
        Self::with_issue_time(username, reason, destination, Utc::now())
    }

    pub fn with_issue_time(
        username: String,
        reason: String,
        destination: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            username,
            reason,
            destination,
            issued_at: at.timestamp(),
        }
    }

    pub fn issued_at_time(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.issued_at, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether the ticket is older than `time_guard`
    ///
    /// Decoding never calls this. The authentication handler that consumes the
    /// ticket decides whether the time guard applies.
    pub fn is_expired(&self, time_guard: Duration) -> bool {
        self.is_expired_at(time_guard, Utc::now())
    }

    pub fn is_expired_at(&self, time_guard: Duration, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.issued_at.saturating_add(time_guard.num_seconds())
    }

    /// Same payload, ignoring when it was issued
    pub fn same_grant(&self, other: &TicketPayload) -> bool {
        self.username == other.username
            && self.reason == other.reason
            && self.destination == other.destination
    }
}

/// An encoded return ticket, safe to place in a URL query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Ticket {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Ticket> for String {
    fn from(ticket: Ticket) -> Self {
        ticket.0
    }
}
