//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The services
//! depend only on these traits, not on concrete implementations.

mod seat_provider;

pub use seat_provider::{SeatProvider, UserPage};
