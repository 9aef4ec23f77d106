//! Connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// USB vendor ID used by Loupedeck devices.
pub const LOUPEDECK_VENDOR_ID: u16 = 0x2ec2;

/// USB vendor ID used by the Razer Stream Controller.
pub const RAZER_VENDOR_ID: u16 = 0x1532;

/// Settings used while opening a session.
///
/// Serializable so applications can embed it in their own settings; the
/// driver itself never reads or writes files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    /// Deadline for the first websocket handshake attempt. The second
    /// attempt runs without one.
    pub handshake_timeout_ms: u64,

    /// Brightness sent right after connecting.
    pub initial_brightness: u8,

    pub baud_rate: u32,

    /// Vendor IDs considered during auto-detection.
    pub vendor_ids: Vec<u16>,
}

impl ConnectConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: 2000,
            initial_brightness: 9,
            baud_rate: 256_000,
            vendor_ids: vec![LOUPEDECK_VENDOR_ID, RAZER_VENDOR_ID],
        }
    }
}
