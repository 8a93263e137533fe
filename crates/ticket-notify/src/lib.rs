//! Email notifications carrying return tickets
//!
//! Notification templates contain the [`TICKET_PLACEHOLDER`] marker inside a
//! link. Before a message goes out the marker is replaced by a ticket issued
//! for that recipient, or removed when no ticket applies.
//!
//! Mail delivery and role lookup belong to the host application and are
//! reached through the [`Mailer`] and [`RoleDirectory`] traits.

pub mod directory;
pub mod mail;
pub mod notifier;

pub use directory::{DirectoryError, RoleDirectory};
pub use mail::{MailError, Mailer, Notification, OutgoingMail, User};
pub use notifier::{
    render, BroadcastReport, NotifyError, RecipientFailure, TicketNotifier, TICKET_PLACEHOLDER,
};

// Re-export the ticket types callers need alongside the notifier
pub use ticket_auth::{Ticket, TicketCodec, TicketError};
