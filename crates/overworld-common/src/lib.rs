//! # Overworld Common
//!
//! Shared types for the Overworld level-audio stack:
//! - The `AudioError` taxonomy and `AudioResult` alias
//! - Asset kind tags used by the registries
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
}

pub use prelude::*;
