//! Test Helper Utilities
//!
//! Shared utilities for testing labelcheck-core

#![allow(dead_code)]

pub mod db_utils;
pub mod label_tokens;

pub use db_utils::{create_test_db, seed_products, seed_reference};
pub use label_tokens::{label_row, LabelBuilder};
