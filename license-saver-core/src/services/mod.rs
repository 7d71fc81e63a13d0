//! Service layer - business logic orchestration

mod prune;

pub use prune::{PruneOptions, PruneReport, PruneService, UserAction, UserOutcome};
