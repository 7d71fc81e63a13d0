//! Seat provider port
//!
//! Defines the interface for listing and deleting licensed users on the
//! vendor side. The prune service uses this trait without knowing about
//! HTTP, sessions or wire formats.

use crate::domain::result::Result;
use crate::domain::{Job, User};

/// One page of the user listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPage {
    pub users: Vec<User>,
    /// Offset of the following page, `None` when this page was the last one
    pub next_offset: Option<usize>,
}

/// Seat provider trait
///
/// Every call is a single request/response cycle. Retrying and polling
/// belong to the caller.
pub trait SeatProvider {
    /// Authenticate and keep the session for all following calls
    fn login(&mut self) -> Result<()>;

    /// Fetch one page of users starting at `offset`
    fn list_users_page(&self, offset: usize) -> Result<UserPage>;

    /// Fetch the first page of users
    fn list_users(&self) -> Result<Vec<User>> {
        self.list_users_page(0).map(|page| page.users)
    }

    /// Schedule deletion of a user and return the created job
    fn delete_user(&self, user: &User) -> Result<Job>;

    /// Refresh a job in place from the job status endpoint
    fn refresh_job(&self, job: &mut Job) -> Result<()>;
}
