//! Outbound half of a session.
//!
//! Frames are queued on an unbounded channel and written by a single
//! writer task, so every send here is synchronous and safe to call from
//! inside an input handler or response callback.

use std::sync::Arc;
use std::time::Duration;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::canvas::Canvas;
use super::display::Display;
use crate::error::{Error, Result};
use crate::protocol::{Button, Frame, MessageType, Transactions};
use crate::transport::MessageSink;

/// Cloneable handle for sending requests to the device.
#[derive(Clone)]
pub struct Link {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    transactions: Arc<Transactions>,
}

impl Link {
    pub(crate) fn new(
        outbound: mpsc::UnboundedSender<Vec<u8>>,
        transactions: Arc<Transactions>,
    ) -> Self {
        Self {
            outbound,
            transactions,
        }
    }

    pub(crate) fn transactions(&self) -> &Transactions {
        &self.transactions
    }

    fn write(&self, frame: Frame) -> Result<()> {
        tracing::trace!(%frame, "send");
        self.outbound
            .send(frame.encode())
            .map_err(|_| Error::Disconnected)
    }

    /// Send without waiting for a response. Returns the transaction ID used.
    pub fn send(&self, message_type: MessageType, payload: Vec<u8>) -> Result<u8> {
        let id = self.transactions.begin(None);
        self.write(Frame::new(message_type, id, payload))?;
        Ok(id)
    }

    /// Send and run `callback` with the response, from the receive loop.
    ///
    /// The callback is removed from the pending table before it runs, so it
    /// may send further requests.
    pub fn send_with_callback<F>(
        &self,
        message_type: MessageType,
        payload: Vec<u8>,
        callback: F,
    ) -> Result<u8>
    where
        F: FnOnce(Frame) + Send + 'static,
    {
        let id = self.transactions.begin(Some(Box::new(callback)));
        if let Err(e) = self.write(Frame::new(message_type, id, payload)) {
            self.transactions.cancel(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Send and wait for the matching response.
    ///
    /// On timeout the pending entry is removed before returning
    /// [`Error::Timeout`]. Responses to `Draw` are interleaved with the next
    /// command on real hardware, so don't rely on this for draw commits.
    pub async fn send_and_wait(
        &self,
        message_type: MessageType,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Frame> {
        let (tx, rx) = oneshot::channel();
        let id = self.send_with_callback(message_type, payload, move |frame| {
            // The waiter may already have timed out.
            let _ = tx.send(frame);
        })?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(frame)) => Ok(frame),
            // Callback dropped without running: the session closed.
            Ok(Err(_)) => Err(Error::Disconnected),
            Err(_) => {
                self.transactions.cancel(id);
                tracing::debug!(transaction_id = id, ?message_type, "request timed out");
                Err(Error::Timeout(id))
            }
        }
    }

    pub fn is_pending(&self, id: u8) -> bool {
        self.transactions.is_pending(id)
    }

    /// Write `canvas` at (`x`, `y`) of `display`, then commit it. Nothing is
    /// sent if the region cannot be addressed.
    pub fn draw(&self, display: &Display, canvas: &Canvas, x: u16, y: u16) -> Result<()> {
        let payload = display.framebuffer_payload(canvas, x, y)?;
        self.send(MessageType::WriteFramebuff, payload)?;
        self.send(MessageType::Draw, display.draw_payload())?;
        Ok(())
    }

    pub fn set_brightness(&self, level: u8) -> Result<()> {
        self.send(MessageType::SetBrightness, vec![level]).map(drop)
    }

    /// Set the LED colour of a physical button.
    pub fn set_button_color(&self, button: Button, color: Rgb888) -> Result<()> {
        let payload = vec![button.0 as u8, color.r(), color.g(), color.b()];
        self.send(MessageType::SetColor, payload).map(drop)
    }

    /// Trigger a vibration pattern. Pattern values are model specific.
    pub fn set_vibration(&self, pattern: u8) -> Result<()> {
        self.send(MessageType::SetVibration, vec![pattern]).map(drop)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(MessageType::Reset, Vec::new()).map(drop)
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("closed", &self.outbound.is_closed())
            .field("transactions", &self.transactions)
            .finish()
    }
}

/// Drain the outbound queue into `sink` until cancelled, the queue closes
/// or a write fails.
pub(crate) async fn write_loop<W: MessageSink>(
    mut sink: W,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = outbound.recv() => message,
        };
        let Some(message) = message else {
            break;
        };
        if let Err(e) = sink.send_message(message).await {
            tracing::warn!(error = %e, "write failed, stopping writer");
            break;
        }
    }

    outbound.close();
    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "closing transport failed");
    }
    tracing::debug!("writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> (Link, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Link::new(tx, Arc::new(Transactions::new())), rx)
    }

    #[test]
    fn test_send_uses_fresh_ids() {
        let (link, mut rx) = link();
        assert_eq!(link.send(MessageType::Reset, vec![]).unwrap(), 1);
        assert_eq!(link.send(MessageType::Reset, vec![]).unwrap(), 2);
        assert_eq!(rx.try_recv().unwrap(), vec![3, 0x06, 1]);
        assert_eq!(rx.try_recv().unwrap(), vec![3, 0x06, 2]);
    }

    #[test]
    fn test_device_operations() {
        let (link, mut rx) = link();
        link.set_brightness(7).unwrap();
        link.set_button_color(Button::BUTTON_2, Rgb888::new(1, 2, 3))
            .unwrap();
        link.set_vibration(0x22).unwrap();

        assert_eq!(rx.try_recv().unwrap(), vec![4, 0x09, 1, 7]);
        assert_eq!(rx.try_recv().unwrap(), vec![7, 0x02, 2, 9, 1, 2, 3]);
        assert_eq!(rx.try_recv().unwrap(), vec![4, 0x1b, 3, 0x22]);
    }

    #[test]
    fn test_failed_write_cancels_callback() {
        let (link, rx) = link();
        drop(rx);
        let result = link.send_with_callback(MessageType::Version, vec![], |_| {});
        assert!(matches!(result, Err(Error::Disconnected)));
        assert_eq!(link.transactions().pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_and_wait_timeout_clears_entry() {
        let (link, _rx) = link();
        let result = link
            .send_and_wait(MessageType::Version, vec![], Duration::from_millis(100))
            .await;

        assert!(matches!(result, Err(Error::Timeout(1))));
        assert!(!link.is_pending(1));
    }

    #[tokio::test]
    async fn test_writer_stops_on_cancel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (sink, mut wire) = mpsc::unbounded_channel::<Vec<u8>>();
        let cancel = CancellationToken::new();
        let link = Link::new(tx, Arc::new(Transactions::new()));
        let writer = tokio::spawn(write_loop(sink, rx, cancel.clone()));

        link.reset().unwrap();
        assert_eq!(wire.recv().await.unwrap(), vec![3, 0x06, 1]);

        cancel.cancel();
        writer.await.unwrap();
        assert!(matches!(link.reset(), Err(Error::Disconnected)));
    }
}
