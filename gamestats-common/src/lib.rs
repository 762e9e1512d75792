//! # GameStats Common Library
//!
//! Shared code for the GameStats tools including:
//! - Entity store schema and initialization
//! - Configuration loading
//! - Common error types
//! - Password digest helpers

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
