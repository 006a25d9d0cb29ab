//! # Labelcheck Common Library
//!
//! Shared code for the labelcheck crates including:
//! - Error types
//! - Configuration loading
//! - Retry policies for external collaborators
//! - Dosage unit normalization and conversion

pub mod config;
pub mod error;
pub mod retry;
pub mod units;

pub use error::{Error, Result};
pub use retry::{retry_with_policy, RetryPolicy};
