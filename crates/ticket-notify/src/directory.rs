//! Role membership lookup

use async_trait::async_trait;
use thiserror::Error;

use crate::mail::User;

/// Directory errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Role {0} not found")]
    RoleNotFound(i64),

    /// Backend failure reported by a host directory (database, LDAP)
    #[error("Directory lookup failed: {0}")]
    Lookup(String),
}

/// Resolves the users holding a role in a given context
///
/// # Example
///
/// ```ignore
/// use ticket_notify::{DirectoryError, RoleDirectory, User};
/// use async_trait::async_trait;
///
/// struct CourseInstructors {
///     instructors: Vec<User>,
/// }
///
/// #[async_trait]
/// impl RoleDirectory for CourseInstructors {
///     async fn users_with_role(&self, _role_id: i64, _context_id: i64) -> Result<Vec<User>, DirectoryError> {
///         Ok(self.instructors.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Users assigned `role_id` in `context_id`, in a stable order
    async fn users_with_role(
        &self,
        role_id: i64,
        context_id: i64,
    ) -> Result<Vec<User>, DirectoryError>;
}
