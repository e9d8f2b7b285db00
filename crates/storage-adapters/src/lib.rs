//! # storage-adapters
//!
//! Store and object-storage implementations of the `domains` ports.
//!
//! | Feature       | Adapter                                   |
//! |---------------|-------------------------------------------|
//! | (always)      | `memory::MemoryStore`, `MemoryMediaStorage`, `ImageProcessor` |
//! | `db-postgres` | `postgres::PgStore`                       |
//! | `media-local` | `media::LocalMediaStorage`                |
//! | `media-s3`    | `media::S3MediaStorage`                   |

pub mod media;
pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use media::ImageProcessor;
pub use memory::{MemoryMediaStorage, MemoryStore};

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
