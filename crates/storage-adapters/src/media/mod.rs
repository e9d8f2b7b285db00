//! Media adapters: upload preparation (always compiled) and the object
//! storage backends behind `media-local` / `media-s3`.

pub mod processing;

#[cfg(feature = "media-local")]
pub mod local;

#[cfg(feature = "media-s3")]
pub mod s3;

pub use processing::ImageProcessor;

#[cfg(feature = "media-local")]
pub use local::LocalMediaStorage;

#[cfg(feature = "media-s3")]
pub use s3::S3MediaStorage;
