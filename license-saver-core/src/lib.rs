//! License Saver Core - enforce a Signavio license seat allowlist
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: Core entities (User, Job, Allowlist) and the error type
//! - **ports**: Trait definitions for external dependencies (SeatProvider)
//! - **services**: Business logic orchestration (PruneService)
//! - **adapters**: Concrete implementations (Signavio HTTP client)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use adapters::signavio::SignavioClient;
pub use config::{Config, PollPolicy, Settings};
pub use domain::result::{Error, Result};
pub use domain::{Allowlist, Job, JobStatus, User};
pub use ports::{SeatProvider, UserPage};
pub use services::{PruneOptions, PruneReport, PruneService, UserAction, UserOutcome};
