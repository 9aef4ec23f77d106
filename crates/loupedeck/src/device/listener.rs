//! Receive loop and event dispatch.

use super::Device;
use crate::error::{Error, Result};
use crate::protocol::{
    ButtonEvent, ButtonStatus, Frame, KnobEvent, MessageType, TouchEvent, TouchZone,
};

impl Device {
    /// Read and dispatch messages until the session ends.
    ///
    /// Handlers run on this task, one at a time, in arrival order. Returns
    /// `Ok(())` after [`Device::close`], [`Error::Disconnected`] if the
    /// device closed the connection and [`Error::Transport`] on a read
    /// failure. Either error closes the session first, so later sends fail
    /// and pending requests end with [`Error::Disconnected`]. Can only be
    /// run once per session.
    pub async fn listen(&self) -> Result<()> {
        let mut stream = self
            .shared
            .inbound
            .lock()
            .take()
            .ok_or(Error::AlreadyListening)?;
        tracing::info!(model = %self.shared.model, "Listening for device messages");

        loop {
            let message = tokio::select! {
                _ = self.shared.cancel.cancelled() => {
                    tracing::debug!("receive loop cancelled");
                    return Ok(());
                }
                message = stream.next_message() => message,
            };

            match message {
                Some(Ok(message)) => self.dispatch(&message),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "read failed, stopping receive loop");
                    self.close();
                    return Err(e);
                }
                None => {
                    tracing::info!("Device closed the connection");
                    self.close();
                    return Err(Error::Disconnected);
                }
            }
        }
    }

    /// Handle one raw message from the device.
    pub(crate) fn dispatch(&self, message: &[u8]) {
        if message.is_empty() {
            tracing::warn!("dropping zero-length message");
            return;
        }

        let frame = match Frame::decode(message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed message");
                return;
            }
        };
        tracing::trace!(%frame, "received");

        if let Some(callback) = self.shared.link.transactions().complete(frame.transaction_id) {
            callback(frame);
            return;
        }

        match frame.message_type {
            MessageType::ButtonPress => self.on_button(message),
            MessageType::KnobRotate => self.on_knob(message),
            MessageType::Touch => self.on_touch(message, ButtonStatus::Down),
            MessageType::TouchEnd => self.on_touch(message, ButtonStatus::Up),
            MessageType::TouchCt => self.on_dial_touch(message, ButtonStatus::Down),
            MessageType::TouchEndCt => self.on_dial_touch(message, ButtonStatus::Up),
            MessageType::SetColor
            | MessageType::SetBrightness
            | MessageType::SetVibration
            | MessageType::Draw
            | MessageType::WriteFramebuff => {}
            MessageType::Reset
            | MessageType::Version
            | MessageType::Serial
            | MessageType::Mcu => {
                tracing::debug!(%frame, "response with no pending transaction");
            }
            MessageType::Other(code) => {
                tracing::warn!(code, %frame, "unknown message type");
            }
        }
    }

    fn on_button(&self, message: &[u8]) {
        let Some(event) = ButtonEvent::parse(message) else {
            tracing::warn!(len = message.len(), "short button message");
            return;
        };
        let Some(status) = event.status() else {
            tracing::warn!(?event, "unknown button status");
            return;
        };

        match self.shared.bindings.button(event.button, status) {
            Some(handler) => handler(event.button, status),
            None => tracing::debug!(button = event.button.0, ?status, "unbound button"),
        }
    }

    fn on_knob(&self, message: &[u8]) {
        let Some(event) = KnobEvent::parse(message) else {
            tracing::warn!(len = message.len(), "short knob message");
            return;
        };

        match self.shared.bindings.knob(event.knob) {
            Some(handler) => handler(event.knob, event.delta),
            None => tracing::debug!(knob = event.knob.0, delta = event.delta, "unbound knob"),
        }
    }

    fn on_touch(&self, message: &[u8], status: ButtonStatus) {
        let Some(event) = TouchEvent::parse(message) else {
            tracing::warn!(len = message.len(), "short touch message");
            return;
        };
        let zone = TouchZone::from_coords(event.x, event.y);

        match self.shared.bindings.touch(zone, status) {
            Some(handler) => handler(zone, status, event.x, event.y),
            None => tracing::debug!(
                zone = zone.0,
                ?status,
                x = event.x,
                y = event.y,
                "unbound touch"
            ),
        }
    }

    fn on_dial_touch(&self, message: &[u8], status: ButtonStatus) {
        let Some(event) = TouchEvent::parse(message) else {
            tracing::warn!(len = message.len(), "short dial touch message");
            return;
        };

        match self.shared.bindings.dial_touch() {
            Some(handler) => handler(status, event.x, event.y),
            None => tracing::debug!(?status, x = event.x, y = event.y, "unbound dial touch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    use super::*;
    use crate::device::Model;
    use crate::protocol::{Button, Knob};

    fn device() -> (Device, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (sink, wire) = mpsc::unbounded_channel::<Vec<u8>>();
        let (_inject, stream) = mpsc::unbounded_channel::<Vec<u8>>();
        (Device::from_transport(sink, stream, Model::CtV2), wire)
    }

    #[tokio::test]
    async fn test_button_edges() {
        let (device, _wire) = device();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for status in [ButtonStatus::Down, ButtonStatus::Up] {
            let seen = seen.clone();
            device.bind_button(Button::CIRCLE, status, move |button, status| {
                seen.lock().push((button, status));
            });
        }

        device.dispatch(&[5, 0x00, 0x00, 0x07, 0x00]);
        device.dispatch(&[5, 0x00, 0x00, 0x07, 0x01]);
        // Unbound button and bad status are ignored.
        device.dispatch(&[5, 0x00, 0x00, 0x08, 0x00]);
        device.dispatch(&[5, 0x00, 0x00, 0x07, 0x05]);

        assert_eq!(
            *seen.lock(),
            vec![
                (Button::CIRCLE, ButtonStatus::Down),
                (Button::CIRCLE, ButtonStatus::Up)
            ]
        );
    }

    #[tokio::test]
    async fn test_knob_left_sentinel() {
        let (device, _wire) = device();
        let total = Arc::new(AtomicI32::new(0));
        let sum = total.clone();
        device.bind_knob(Knob::KNOB_2, move |_, delta| {
            sum.fetch_add(delta, Ordering::SeqCst);
        });

        device.dispatch(&[5, 0x01, 0x00, 0x02, 0x01]);
        device.dispatch(&[5, 0x01, 0x00, 0x02, 0xff]);
        device.dispatch(&[5, 0x01, 0x00, 0x02, 0xff]);
        assert_eq!(total.load(Ordering::SeqCst), -1);
    }

    #[tokio::test]
    async fn test_touch_maps_zone() {
        let (device, _wire) = device();
        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        device.bind_touch(TouchZone::TOUCH_2, ButtonStatus::Up, move |zone, status, x, y| {
            *slot.lock() = Some((zone, status, x, y));
        });

        // x = 150, y = 10
        device.dispatch(&[9, 0x6d, 0x00, 0x00, 0x00, 0x96, 0x00, 0x0a, 0x01]);
        assert_eq!(
            *seen.lock(),
            Some((TouchZone::TOUCH_2, ButtonStatus::Up, 150, 10))
        );
    }

    #[tokio::test]
    async fn test_dial_touch_skips_zone_mapping() {
        let (device, _wire) = device();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        device.bind_dial_touch(move |status, x, y| log.lock().push((status, x, y)));

        device.dispatch(&[9, 0x52, 0x00, 0x00, 0x00, 0x10, 0x00, 0x20, 0x00]);
        device.dispatch(&[9, 0x72, 0x00, 0x00, 0x00, 0x11, 0x00, 0x21, 0x00]);
        assert_eq!(
            *seen.lock(),
            vec![(ButtonStatus::Down, 16, 32), (ButtonStatus::Up, 17, 33)]
        );
    }

    #[tokio::test]
    async fn test_correlated_response_is_not_an_event() {
        let (device, _wire) = device();
        let events = Arc::new(AtomicUsize::new(0));
        let responses = Arc::new(AtomicUsize::new(0));

        let counter = events.clone();
        device.bind_button(Button(0x0107), ButtonStatus::Down, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = responses.clone();
        let id = device
            .link()
            .send_with_callback(MessageType::ButtonPress, vec![], move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(id, 1);

        // Transaction byte 1 doubles as the high byte of the button ID.
        let message = [5, 0x00, 0x01, 0x07, 0x00];
        device.dispatch(&message);
        assert_eq!(responses.load(Ordering::SeqCst), 1);
        assert_eq!(events.load(Ordering::SeqCst), 0);

        // Once consumed, the same bytes are an ordinary event.
        device.dispatch(&message);
        assert_eq!(responses.load(Ordering::SeqCst), 1);
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    struct FailingStream;

    #[async_trait::async_trait]
    impl crate::transport::MessageStream for FailingStream {
        async fn next_message(&mut self) -> Option<Result<Vec<u8>>> {
            Some(Err(Error::Transport(
                tokio_tungstenite::tungstenite::Error::ConnectionClosed,
            )))
        }
    }

    #[tokio::test]
    async fn test_read_failure_closes_session() {
        let (sink, _wire) = mpsc::unbounded_channel::<Vec<u8>>();
        let device = Device::from_transport(sink, FailingStream, Model::Live);
        device.bind_knob(Knob::KNOB_1, |_, _| {});
        let id = device
            .link()
            .send_with_callback(MessageType::Version, vec![], |_| {})
            .unwrap();

        assert!(matches!(device.listen().await, Err(Error::Transport(_))));
        assert!(device.is_closed());
        assert!(!device.link().is_pending(id));
        assert!(device.shared.bindings.knob(Knob::KNOB_1).is_none());
    }

    #[tokio::test]
    async fn test_garbage_is_dropped() {
        let (device, _wire) = device();
        device.dispatch(&[]);
        device.dispatch(&[1, 2]);
        device.dispatch(&[3, 0xee, 0x00]);
        device.dispatch(&[2, 0x00, 0x00]);
        device.dispatch(&[4, 0x09, 0x00, 0x05]);
    }
}
