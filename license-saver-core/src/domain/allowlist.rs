//! Allowlist of emails exempt from deletion

use std::collections::BTreeSet;

/// Set of emails that must never be deleted.
///
/// Entries are trimmed and compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    emails: BTreeSet<String>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Allowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an email; returns false if it was already present or blank
    pub fn insert(&mut self, email: &str) -> bool {
        let email = normalize(email);
        if email.is_empty() {
            return false;
        }
        self.emails.insert(email)
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&normalize(email))
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }
}

/// Each item may itself be a comma-separated list.
impl<S: AsRef<str>> FromIterator<S> for Allowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut allowlist = Allowlist::new();
        for item in iter {
            for email in item.as_ref().split(',') {
                allowlist.insert(email);
            }
        }
        allowlist
    }
}
