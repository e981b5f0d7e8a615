//! # paperforge-core
//!
//! Core types, traits, and abstractions for the paperforge system.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other paperforge crates depend on: the document/chunk/
//! job data model, the error taxonomy, centralized defaults, structured
//! logging field names, and the capability ports for embedding and text
//! generation.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
