//! The signed-in user, passed explicitly into the workspace.
//!
//! Access control is a client-side role check only; nothing here is enforced
//! by a server.

use crate::error::{Result, ReviewError};
use crate::types::{User, UserRole};

/// Identity used to attribute history entries, comments, and approvals.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn display_name(&self) -> String {
        self.user.display_name()
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == UserRole::Admin
    }

    /// Fails with [`ReviewError::Forbidden`] unless the session user is an admin.
    pub fn require_admin(&self, what: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ReviewError::Forbidden(format!("{what} requires the Admin role")))
        }
    }
}
