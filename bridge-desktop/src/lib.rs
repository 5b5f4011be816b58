//! # Desktop Bridge Implementations
//!
//! Default implementations of the storage and network bridge traits for
//! desktop hosts (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `SettingsStore` held purely in memory, for tests and ephemeral sessions
//! - `HttpClient` using `reqwest`
//!
//! Playback surfaces, frame bridges and media sessions are inherently tied to
//! the host UI and are not provided here.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let settings = SqliteSettingsStore::new("/tmp/feedplay/settings.db".into()).await?;
//!     let http = ReqwestHttpClient::new()?;
//!     // Hand both to CoreConfig::builder()
//!     Ok(())
//! }
//! ```

mod http;
mod settings;

pub use http::ReqwestHttpClient;
pub use settings::{MemorySettingsStore, SqliteSettingsStore};
