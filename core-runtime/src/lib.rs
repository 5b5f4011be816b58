//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the playback crates:
//! - Logging and tracing setup, with host `LoggerSink` forwarding
//! - `CoreConfig`, the validated set of host bridges
//! - A typed event bus the engine publishes state changes on

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
