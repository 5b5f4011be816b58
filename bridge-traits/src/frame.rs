//! Embedded secondary frame bridge.
//!
//! Some hosts embed an independently running module (e.g. chat) that owns its
//! own audio element. The core cannot pause it directly; it can only broadcast
//! a request. Delivery is best effort and the frame may not exist at all.

use crate::error::Result;
use async_trait::async_trait;

/// One-way channel to an embedded frame.
#[async_trait]
pub trait FrameBridge: Send + Sync {
    /// Ask the frame to silence every playback resource it owns except the one
    /// identified by `token`. `None` silences everything.
    ///
    /// Returns [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable)
    /// when no frame is mounted.
    async fn silence_except(&self, token: Option<&str>) -> Result<()>;
}
