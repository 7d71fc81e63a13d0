//! Prune service - delete every user that is not on the allowlist
//!
//! Users are processed strictly one at a time: the vendor runs a single
//! deletion job at a time, so each job is polled to completion before the
//! next user is touched.

use std::collections::HashSet;
use std::thread;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{Config, PollPolicy};
use crate::domain::result::{Error, Result};
use crate::domain::{Allowlist, Job, JobStatus, User};
use crate::ports::SeatProvider;

/// Behaviour switches for a prune run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOptions {
    /// Log what would be deleted without scheduling any deletion
    pub dry_run: bool,
    /// Follow the user listing across pages instead of reading the first one
    pub all_pages: bool,
    pub poll: PollPolicy,
}

/// What happened to a single listed user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    /// Listing record without an email
    Skipped,
    Kept,
    WouldDelete,
    /// Deletion job reached a terminal status
    Deleted { job: Job },
    /// Scheduling the deletion failed; the run went on with the next user
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserOutcome {
    pub email: String,
    #[serde(flatten)]
    pub action: UserAction,
}

/// Result of a prune run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneReport {
    pub dry_run: bool,
    pub outcomes: Vec<UserOutcome>,
}

impl PruneReport {
    fn push(&mut self, email: &str, action: UserAction) {
        self.outcomes.push(UserOutcome {
            email: email.to_string(),
            action,
        });
    }

    fn count(&self, f: impl Fn(&UserAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.action)).count()
    }

    pub fn kept(&self) -> usize {
        self.count(|a| matches!(a, UserAction::Kept))
    }

    /// Deletions whose job completed
    pub fn deleted(&self) -> usize {
        self.count(|a| matches!(a, UserAction::Deleted { job } if job.status == JobStatus::Completed))
    }

    pub fn would_delete(&self) -> usize {
        self.count(|a| matches!(a, UserAction::WouldDelete))
    }

    /// Failed schedules plus jobs that ended in a non-completed status
    pub fn failed(&self) -> usize {
        self.count(|a| match a {
            UserAction::Failed { .. } => true,
            UserAction::Deleted { job } => job.status != JobStatus::Completed,
            _ => false,
        })
    }
}

/// Prune service for enforcing the seat allowlist
#[derive(Debug, Clone)]
pub struct PruneService {
    allowlist: Allowlist,
    options: PruneOptions,
}

impl PruneService {
    /// Create the service; `api_user` is always added to the allowlist so
    /// the run can never delete its own account.
    pub fn new(mut allowlist: Allowlist, api_user: &str, options: PruneOptions) -> Self {
        if allowlist.insert(api_user) {
            info!(email = %api_user, "API user is not in allowlist, adding for safety");
        }
        Self { allowlist, options }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.allowlist.clone(),
            &config.user,
            PruneOptions {
                dry_run: config.dry_run,
                all_pages: config.all_pages,
                poll: config.poll,
            },
        )
    }

    /// Effective allowlist, including the API user
    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    /// Log in, list users and delete everyone not on the allowlist.
    ///
    /// Login and listing failures abort the run, as does losing track of a
    /// deletion job. A failure to schedule one deletion only skips that user.
    pub fn run<P: SeatProvider + ?Sized>(&self, provider: &mut P) -> Result<PruneReport> {
        provider
            .login()
            .inspect_err(|e| error!(error = %e, "Login failed"))?;
        info!("Logged in");

        let users = self
            .fetch_users(provider)
            .inspect_err(|e| error!(error = %e, "GetUsers failed"))?;
        info!(users = users.len(), "Retrieved users");

        let mut report = PruneReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        for user in &users {
            let action = self.process_user(provider, user)?;
            report.push(&user.email, action);
        }

        Ok(report)
    }

    fn fetch_users<P: SeatProvider + ?Sized>(&self, provider: &P) -> Result<Vec<User>> {
        if !self.options.all_pages {
            return provider.list_users();
        }

        let mut users = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0;

        loop {
            let page = provider.list_users_page(offset)?;
            let before = users.len();
            for user in page.users {
                // Info records have no email and are never deduplicated away
                if !user.has_email() || seen.insert(user.email.to_lowercase()) {
                    users.push(user);
                }
            }

            match page.next_offset {
                // A page without unseen users means the API ignores the offset
                Some(next) if users.len() > before => offset = next,
                _ => break,
            }
        }

        Ok(users)
    }

    fn process_user<P: SeatProvider + ?Sized>(&self, provider: &P, user: &User) -> Result<UserAction> {
        if !user.has_email() {
            debug!("Skipping record without email");
            return Ok(UserAction::Skipped);
        }

        if self.allowlist.contains(&user.email) {
            info!(email = %user.email, "Keeping user");
            return Ok(UserAction::Kept);
        }

        if self.options.dry_run {
            info!(email = %user.email, "Would delete user");
            return Ok(UserAction::WouldDelete);
        }

        info!(email = %user.email, "Deleting user");
        let job = match provider.delete_user(user) {
            Ok(job) => job,
            Err(e) => {
                error!(email = %user.email, error = %e, "DeleteUser failed");
                return Ok(UserAction::Failed { error: e.to_string() });
            }
        };

        let job = self.wait_for_job(provider, job)?;
        if job.status == JobStatus::Completed {
            info!(email = %user.email, job_id = %job.id, status = %job.status, "Job finished");
        } else {
            warn!(email = %user.email, job_id = %job.id, status = %job.status, "Job finished");
        }
        Ok(UserAction::Deleted { job })
    }

    /// Poll a job until it leaves SCHEDULED/RUNNING.
    ///
    /// The first status request must succeed. Later failures are retried
    /// until `max_errors` consecutive failures or the deadline.
    fn wait_for_job<P: SeatProvider + ?Sized>(&self, provider: &P, mut job: Job) -> Result<Job> {
        let policy = &self.options.poll;
        let job_id = job.id.clone();

        provider
            .refresh_job(&mut job)
            .inspect_err(|e| error!(job_id = %job_id, error = %e, "GetJobStatus failed"))?;

        let started = Instant::now();
        let mut consecutive_errors = 0;

        while job.status.is_pending() {
            if let Some(deadline) = policy.deadline {
                if started.elapsed() >= deadline {
                    error!(job_id = %job_id, status = %job.status, "Job did not finish in time");
                    return Err(Error::PollExhausted(format!(
                        "job {} still {} after {:?}",
                        job_id, job.status, deadline
                    )));
                }
            }

            thread::sleep(policy.interval);

            match provider.refresh_job(&mut job) {
                Ok(()) => {
                    consecutive_errors = 0;
                    debug!(job_id = %job_id, status = %job.status, "Polled job");
                }
                Err(e) => {
                    consecutive_errors += 1;
                    error!(job_id = %job_id, attempt = consecutive_errors, error = %e, "GetJobStatus failed");
                    if consecutive_errors >= policy.max_errors {
                        return Err(Error::PollExhausted(format!(
                            "job {}: {} consecutive status requests failed, last error: {}",
                            job_id, consecutive_errors, e
                        )));
                    }
                }
            }
        }

        Ok(job)
    }
}
