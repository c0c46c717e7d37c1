//! # SecureCheck Common Library
//!
//! Shared code for SecureCheck services:
//! - Configuration loading (TOML file + compiled defaults)
//! - `traffic_stops` table model, schema bootstrap and insert statement
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
