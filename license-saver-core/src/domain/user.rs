//! User domain model

use serde::{Deserialize, Serialize};

/// A provisioned seat on the vendor side, identified by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// Records without an email are listing metadata, not real users
    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }
}
