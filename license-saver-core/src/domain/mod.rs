//! Core domain entities
//!
//! Plain data structures for users, deletion jobs and the allowlist.
//! No I/O happens here.

mod allowlist;
mod job;
pub mod result;
mod user;

pub use allowlist::Allowlist;
pub use job::{Job, JobStatus, JobUpdate};
pub use user::User;
