//! Error type shared by every layer of the driver.

use thiserror::Error;

use crate::protocol::FrameError;

/// Errors that can occur while talking to a Loupedeck.
#[derive(Debug, Error)]
pub enum Error {
    /// Port enumeration succeeded but returned nothing at all.
    #[error("no serial ports found")]
    NoSerialPorts,

    /// Serial ports exist, but none of them belongs to a supported vendor.
    #[error("no Loupedeck devices found")]
    DeviceNotFound,

    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// The device was found but the websocket upgrade over the serial link failed.
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("transport error: {0}")]
    Transport(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("connection closed")]
    Disconnected,

    #[error("timed out waiting for response to transaction {0}")]
    Timeout(u8),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("unknown device type: {0}")]
    UnsupportedModel(String),

    #[error("no display named {0:?} on this device")]
    UnknownDisplay(String),

    /// The image or its position does not fit the 16-bit framebuffer header.
    #[error("{width}x{height} image at ({x}, {y}) is out of range for display {display:?}")]
    DrawOutOfRange {
        display: &'static str,
        x: u16,
        y: u16,
        width: u32,
        height: u32,
    },

    #[error("receive loop is already running")]
    AlreadyListening,

    #[error("a widget holder needs between 1 and {max} widgets, got {count}")]
    WidgetCount { count: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
