//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Blocking HTTP transport with gzip handling
//! - Multipart CSV upload encoding
//! - Signavio HTTP client for the SeatProvider port
//! - Mock Signavio server for testing

pub mod http;
pub mod multipart;
pub mod signavio;
