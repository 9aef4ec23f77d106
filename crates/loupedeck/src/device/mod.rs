//! A live session with one device.
//!
//! [`Device`] is a cheap, cloneable handle. Run [`Device::listen`] on its
//! own task to receive input; everything else can be called from anywhere,
//! including from inside input handlers.

mod bindings;
mod canvas;
mod connect;
mod display;
mod link;
mod listener;
mod model;

use std::sync::Arc;

use embedded_graphics::pixelcolor::Rgb888;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use bindings::{ButtonHandler, DialTouchHandler, KnobHandler, TouchHandler};
pub use canvas::Canvas;
pub use display::{rgb565, ByteOrder, Display};
pub use link::Link;
pub use model::Model;

use crate::config::ConnectConfig;
use crate::error::{Error, Result};
use crate::protocol::{Button, ButtonStatus, Knob, MessageType, TouchZone, Transactions};
use crate::transport::{MessageSink, MessageStream};
use bindings::Bindings;

/// Identification reported by the device after connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DeviceInfo {
    version: Option<String>,
    serial_number: Option<String>,
}

struct Shared {
    model: Model,
    link: Link,
    bindings: Bindings,
    info: Arc<Mutex<DeviceInfo>>,
    inbound: Mutex<Option<Box<dyn MessageStream>>>,
    cancel: CancellationToken,
}

/// Handle to a connected device.
#[derive(Clone)]
pub struct Device {
    shared: Arc<Shared>,
}

impl Device {
    /// Build a session over an already established message transport.
    ///
    /// No handshake or initialization is sent. Must be called from within a
    /// tokio runtime; the writer task is spawned immediately.
    pub fn from_transport<W, R>(sink: W, stream: R, model: Model) -> Self
    where
        W: MessageSink + 'static,
        R: MessageStream + 'static,
    {
        let (outbound, queue) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(link::write_loop(sink, queue, cancel.clone()));

        tracing::info!(%model, "Session started");
        Self {
            shared: Arc::new(Shared {
                model,
                link: Link::new(outbound, Arc::new(Transactions::new())),
                bindings: Bindings::new(),
                info: Arc::new(Mutex::new(DeviceInfo::default())),
                inbound: Mutex::new(Some(Box::new(stream))),
                cancel,
            }),
        }
    }

    /// Hardware model this session was opened for.
    pub fn model(&self) -> Model {
        self.shared.model
    }

    /// All displays of the connected model.
    pub fn displays(&self) -> &'static [Display] {
        self.shared.model.displays()
    }

    /// Look up a display by name.
    pub fn display(&self, name: &str) -> Option<&'static Display> {
        self.shared.model.display(name)
    }

    /// Like [`Device::display`], but a missing display is an error.
    pub fn require_display(&self, name: &str) -> Result<&'static Display> {
        self.display(name)
            .ok_or_else(|| Error::UnknownDisplay(name.to_string()))
    }

    /// The send half of the session.
    pub fn link(&self) -> &Link {
        &self.shared.link
    }

    /// Firmware version as `major.minor.patch`, once the device has answered.
    pub fn version(&self) -> Option<String> {
        self.shared.info.lock().version.clone()
    }

    /// Serial number, once the device has answered.
    pub fn serial_number(&self) -> Option<String> {
        self.shared.info.lock().serial_number.clone()
    }

    /// Bind one edge of a button, replacing any handler already bound to it.
    pub fn bind_button<F>(&self, button: Button, status: ButtonStatus, handler: F)
    where
        F: Fn(Button, ButtonStatus) + Send + Sync + 'static,
    {
        self.shared
            .bindings
            .bind_button(button, status, Arc::new(handler));
    }

    /// Remove the handler for one edge of a button.
    pub fn unbind_button(&self, button: Button, status: ButtonStatus) {
        self.shared.bindings.unbind_button(button, status);
    }

    /// Bind a knob. The handler receives the signed step count.
    pub fn bind_knob<F>(&self, knob: Knob, handler: F)
    where
        F: Fn(Knob, i32) + Send + Sync + 'static,
    {
        self.shared.bindings.bind_knob(knob, Arc::new(handler));
    }

    /// Remove the handler for a knob.
    pub fn unbind_knob(&self, knob: Knob) {
        self.shared.bindings.unbind_knob(knob);
    }

    /// Bind one edge of a touch zone. The handler receives panel
    /// coordinates.
    pub fn bind_touch<F>(&self, zone: TouchZone, status: ButtonStatus, handler: F)
    where
        F: Fn(TouchZone, ButtonStatus, u16, u16) + Send + Sync + 'static,
    {
        self.shared
            .bindings
            .bind_touch(zone, status, Arc::new(handler));
    }

    pub fn unbind_touch(&self, zone: TouchZone, status: ButtonStatus) {
        self.shared.bindings.unbind_touch(zone, status);
    }

    /// Bind touches on the rotary knob's display. One handler covers both
    /// edges; it replaces any previous one.
    pub fn bind_dial_touch<F>(&self, handler: F)
    where
        F: Fn(ButtonStatus, u16, u16) + Send + Sync + 'static,
    {
        self.shared.bindings.bind_dial_touch(Some(Arc::new(handler)));
    }

    pub fn unbind_dial_touch(&self) {
        self.shared.bindings.bind_dial_touch(None);
    }

    /// Draw `canvas` at (`x`, `y`) of `display`. See [`Link::draw`].
    pub fn draw(&self, display: &Display, canvas: &Canvas, x: u16, y: u16) -> Result<()> {
        self.shared.link.draw(display, canvas, x, y)
    }

    /// Set the backlight level.
    pub fn set_brightness(&self, level: u8) -> Result<()> {
        self.shared.link.set_brightness(level)
    }

    /// Set the LED colour of a button.
    pub fn set_button_color(&self, button: Button, color: Rgb888) -> Result<()> {
        self.shared.link.set_button_color(button, color)
    }

    /// Trigger a vibration pattern.
    pub fn set_vibration(&self, pattern: u8) -> Result<()> {
        self.shared.link.set_vibration(pattern)
    }

    /// Send a reset request.
    pub fn reset(&self) -> Result<()> {
        self.shared.link.reset()
    }

    /// Stop the receive loop and the writer, and drop all handlers and
    /// pending callbacks.
    pub fn close(&self) {
        tracing::info!(model = %self.shared.model, "Closing session");
        self.shared.cancel.cancel();
        self.shared.bindings.clear();
        let dropped = self.shared.link.transactions().clear();
        if dropped > 0 {
            tracing::debug!(dropped, "dropped pending callbacks");
        }
    }

    /// True once [`Device::close`] ran or the receive loop hit an error.
    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Send the post-handshake initialization sequence.
    fn initialize(&self, config: &ConnectConfig) -> Result<()> {
        let link = &self.shared.link;
        link.reset()?;
        link.set_brightness(config.initial_brightness)?;

        let info = self.shared.info.clone();
        link.send_with_callback(MessageType::Version, Vec::new(), move |frame| {
            match frame.payload[..] {
                [major, minor, patch, ..] => {
                    let version = format!("{major}.{minor}.{patch}");
                    tracing::info!(%version, "Firmware version");
                    info.lock().version = Some(version);
                }
                _ => tracing::warn!(%frame, "short version response"),
            }
        })?;

        let info = self.shared.info.clone();
        link.send_with_callback(MessageType::Serial, Vec::new(), move |frame| {
            let serial = String::from_utf8_lossy(&frame.payload)
                .trim_matches(|c: char| c.is_whitespace() || c == '\0')
                .to_string();
            tracing::info!(%serial, "Serial number");
            info.lock().serial_number = Some(serial);
        })?;
        Ok(())
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("model", &self.shared.model)
            .field("info", &*self.shared.info.lock())
            .field("closed", &self.is_closed())
            .finish()
    }
}
