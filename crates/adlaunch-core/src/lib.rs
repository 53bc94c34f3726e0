//! Adlaunch Core Library
//!
//! This crate provides core domain models, error types, configuration, and
//! the credential cipher shared across all adlaunch components.

pub mod aspect;
pub mod config;
pub mod encryption;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use aspect::{AspectRatio, Placement};
pub use config::{BaseConfig, Config, LaunchConfig};
pub use encryption::TokenCipher;
pub use error::{AppError, ErrorMetadata, LogLevel};
