//! Host-side driver for Loupedeck control surfaces.
//!
//! Supports the Loupedeck Live, Live S, CT (v1 and v2) and the Razer
//! Stream Controller:
//! - Button, knob and touch input delivered to bound handlers
//! - Drawing to the touch displays
//! - Button LEDs, brightness and vibration
//!
//! # Architecture
//!
//! The device enumerates as a USB serial port and speaks a binary protocol
//! inside websocket messages on top of that port:
//! - **transport**: serial link and the websocket message halves
//! - **protocol**: framing, transaction IDs and event decoding
//! - **device**: the session handle, receive loop and display framing
//! - **inputs**: knobs, multi-state buttons and dial widgets built on top
//!
//! # Example
//!
//! ```no_run
//! use loupedeck::{Button, ButtonStatus, ConnectConfig, Device};
//!
//! # async fn run() -> loupedeck::Result<()> {
//! let device = Device::connect_auto(ConnectConfig::default()).await?;
//! device.bind_button(Button::CIRCLE, ButtonStatus::Down, |button, _| {
//!     tracing::info!(?button, "pressed");
//! });
//! device.listen().await
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod inputs;
pub mod protocol;
pub mod transport;

pub use config::ConnectConfig;
pub use device::{Canvas, Device, Display, Link, Model};
pub use error::{Error, Result};
pub use protocol::{Button, ButtonStatus, Knob, TouchZone};
