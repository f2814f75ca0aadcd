//! Core module - shared infrastructure for Medscribe
//!
//! This module contains foundational types, configuration, logging and error
//! handling used throughout the crate.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{AgentConfig, Config, LoggingConfig, ProviderConfig, ProviderType};
pub use error::{MedscribeError, Result};
pub use types::*;
