//! # Recipe Audit Common Library
//!
//! Shared code for the recipe audit services:
//! - Common error type
//! - Configuration loading (CLI → ENV → TOML → compiled defaults)
//! - Timestamp helpers for result artifacts

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
