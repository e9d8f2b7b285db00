//! # domains
//!
//! Entities, value types and port traits for the community event board.
//! Nothing in this crate performs I/O.

pub mod catalog;
pub mod clock;
pub mod error;
pub mod models;
pub mod names;
pub mod ports;
pub mod query;
pub mod tags;

// Re-exporting for easier access in other crates
pub use catalog::*;
pub use clock::*;
pub use error::*;
pub use models::*;
pub use names::*;
pub use ports::*;
pub use query::*;
pub use tags::*;
