//! Single-recipient and role-wide notification senders

use std::sync::Arc;

use thiserror::Error;
use ticket_auth::{CipherStrategy, Ticket, TicketCipher, TicketCodec, TicketError};
use tracing::{debug, info, warn};

use crate::directory::{DirectoryError, RoleDirectory};
use crate::mail::{MailError, Mailer, Notification, OutgoingMail, User};

/// Marker replaced by the recipient's ticket in notification templates
pub const TICKET_PLACEHOLDER: &str = "<%%TICKET%%>";

/// Notification errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// One recipient a broadcast could not reach
#[derive(Debug)]
pub struct RecipientFailure {
    pub username: String,
    pub error: NotifyError,
}

/// Outcome of a role broadcast
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Usernames whose message was handed to the mailer
    pub delivered: Vec<String>,
    pub failed: Vec<RecipientFailure>,
}

impl BroadcastReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Fill the placeholder in a notification template
///
/// The ticket only ever goes into the HTML body, where it sits in a link. The
/// text body always has the placeholder removed, as does the HTML body when
/// there is no ticket. Returns `(text, html)`.
pub fn render(notification: &Notification, ticket: Option<&Ticket>) -> (String, String) {
    let text = notification.text.replace(TICKET_PLACEHOLDER, "");
    let html = notification
        .html
        .replace(TICKET_PLACEHOLDER, ticket.map(Ticket::as_str).unwrap_or(""));
    (text, html)
}

/// Sends notifications with per-recipient return tickets
pub struct TicketNotifier<C = CipherStrategy> {
    codec: Arc<TicketCodec<C>>,
    mailer: Arc<dyn Mailer>,
}

impl<C: TicketCipher> TicketNotifier<C> {
    pub fn new(codec: Arc<TicketCodec<C>>, mailer: Arc<dyn Mailer>) -> Self {
        Self { codec, mailer }
    }

    pub fn codec(&self) -> &TicketCodec<C> {
        &self.codec
    }

    /// Send `notification` to one recipient
    ///
    /// A ticket is issued when `destination` is non-empty and the recipient
    /// has a username. If issuing fails nothing is sent. Returns the ticket
    /// that went out, if any.
    pub async fn notify(
        &self,
        recipient: &User,
        sender: &User,
        notification: &Notification,
        destination: &str,
        purpose: &str,
    ) -> Result<Option<Ticket>, NotifyError> {
        let ticket = if destination.is_empty() {
            None
        } else {
            self.codec
                .issue(&recipient.username, purpose, destination)?
        };

        let (text, html) = render(notification, ticket.as_ref());

        debug!(
            to = %recipient.email,
            username = %recipient.username,
            with_ticket = ticket.is_some(),
            "Sending notification"
        );

        self.mailer
            .send(OutgoingMail {
                to: recipient.clone(),
                from: sender.clone(),
                subject: notification.subject.clone(),
                text,
                html,
            })
            .await?;

        Ok(ticket)
    }

    /// Send `notification` to every user holding `role_id` in `context_id`
    ///
    /// Each recipient gets a ticket of their own. A failure for one recipient
    /// is recorded in the report and the remaining recipients are still
    /// notified; messages already sent are not recalled. Only a failed
    /// directory lookup aborts the broadcast.
    #[allow(clippy::too_many_arguments)]
    pub async fn notify_role(
        &self,
        directory: &dyn RoleDirectory,
        role_id: i64,
        context_id: i64,
        sender: &User,
        notification: &Notification,
        destination: &str,
        purpose: &str,
    ) -> Result<BroadcastReport, NotifyError> {
        let users = directory.users_with_role(role_id, context_id).await?;
        let mut report = BroadcastReport::default();

        for user in &users {
            match self
                .notify(user, sender, notification, destination, purpose)
                .await
            {
                Ok(_) => report.delivered.push(user.username.clone()),
                Err(error) => {
                    warn!(
                        username = %user.username,
                        role_id,
                        context_id,
                        "Notification failed: {}",
                        error
                    );
                    report.failed.push(RecipientFailure {
                        username: user.username.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            role_id,
            context_id,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Role notification finished"
        );

        Ok(report)
    }
}
