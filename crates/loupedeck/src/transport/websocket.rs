//! Message transport seams.
//!
//! The session only needs "send one binary message" and "receive the next
//! binary message". The websocket halves produced by `tokio-tungstenite`
//! implement both traits, as do in-memory `mpsc` channels for tests and
//! in-process bridges.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::{Error, Result};

/// Write half of a message transport.
#[async_trait]
pub trait MessageSink: Send {
    async fn send_message(&mut self, message: Vec<u8>) -> Result<()>;

    /// Flush and close the write half.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Read half of a message transport.
#[async_trait]
pub trait MessageStream: Send {
    /// Next binary message; `None` once the peer has closed.
    async fn next_message(&mut self) -> Option<Result<Vec<u8>>>;
}

#[async_trait]
impl<S> MessageSink for SplitSink<WebSocketStream<S>, Message>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_message(&mut self, message: Vec<u8>) -> Result<()> {
        self.send(Message::Binary(message))
            .await
            .map_err(Error::Transport)
    }

    async fn close(&mut self) -> Result<()> {
        SinkExt::close(self).await.map_err(Error::Transport)
    }
}

#[async_trait]
impl<S> MessageStream for SplitStream<WebSocketStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn next_message(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            match self.next().await? {
                Ok(Message::Binary(data)) => return Some(Ok(data)),
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Websocket closed by device");
                    return None;
                }
                Ok(Message::Text(text)) => {
                    tracing::warn!(%text, "Ignoring non-binary websocket message");
                }
                // Ping/pong are answered by tungstenite itself.
                Ok(_) => {}
                Err(e) => return Some(Err(Error::Transport(e))),
            }
        }
    }
}

#[async_trait]
impl MessageSink for mpsc::UnboundedSender<Vec<u8>> {
    async fn send_message(&mut self, message: Vec<u8>) -> Result<()> {
        self.send(message).map_err(|_| Error::Disconnected)
    }
}

#[async_trait]
impl MessageStream for mpsc::UnboundedReceiver<Vec<u8>> {
    async fn next_message(&mut self) -> Option<Result<Vec<u8>>> {
        self.recv().await.map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_transport() {
        let (mut tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        tx.send_message(vec![3, 0x06, 1]).await.unwrap();
        drop(tx);

        assert_eq!(rx.next_message().await.unwrap().unwrap(), vec![3, 0x06, 1]);
        assert!(rx.next_message().await.is_none());
    }

    #[tokio::test]
    async fn test_websocket_halves() {
        let (client, server) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move {
            let ws = tokio_tungstenite::accept_async(server).await.unwrap();
            let (mut sink, mut stream) = ws.split();
            let message = stream.next_message().await.unwrap().unwrap();
            sink.send_message(message).await.unwrap();
            MessageSink::close(&mut sink).await.unwrap();
        });

        let (ws, _) = tokio_tungstenite::client_async("ws://fake", client)
            .await
            .unwrap();
        let (mut sink, mut stream) = ws.split();
        sink.send_message(vec![4, 0x09, 1, 9]).await.unwrap();
        assert_eq!(stream.next_message().await.unwrap().unwrap(), vec![4, 0x09, 1, 9]);
        assert!(stream.next_message().await.is_none());

        server.await.unwrap();
    }
}
