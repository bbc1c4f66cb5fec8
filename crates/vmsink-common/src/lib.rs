//! vmsink common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the vmsink crates:
//! - Block and epoch identity types
//! - CSV layout constants shared by the export and import paths
//! - The unified error type and its stable error codes

pub mod error;
pub mod format;
pub mod id;

pub use error::{Error, Result};
pub use format::EPOCH_HEADER;
pub use id::{BlockNum, Epoch};
