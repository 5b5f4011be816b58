//! Settings Storage Abstraction
//!
//! Durable key-value preferences. The playback core persists exactly one
//! setting today (the repeat mode), but the trait is shaped after the
//! host preference stores it is backed by:
//! - Desktop: SQLite settings table
//! - Mobile: UserDefaults / SharedPreferences
//! - Web: localStorage

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Writes must be durable once the returned future resolves. Values written
/// before the application restarts must be visible to the next session.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_preference(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("playback.repeat_mode", "all").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_string(key, if value { "true" } else { "false" })
            .await
    }

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self
            .get_string(key)
            .await?
            .map(|value| value == "true" || value == "1"))
    }

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }
}
