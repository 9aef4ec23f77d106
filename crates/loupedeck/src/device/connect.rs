//! Opening a session: port discovery, websocket handshake, initialization.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;

use super::{Device, Model};
use crate::config::ConnectConfig;
use crate::error::{Error, Result};
use crate::transport::serial;

/// The device ignores the URL, but the handshake needs one.
const HANDSHAKE_URL: &str = "ws://fake";

impl Device {
    /// Connect to the first supported device found.
    pub async fn connect_auto(config: ConnectConfig) -> Result<Self> {
        let ports = serial::find_devices(&config.vendor_ids)?;
        tracing::info!(found = ports.len(), "Looking for a supported device");

        let (port, model) = ports
            .into_iter()
            .find_map(|port| match Model::from_product_code(&port.product_code()) {
                Ok(model) => Some((port, model)),
                Err(e) => {
                    tracing::debug!(path = %port.path, error = %e, "skipping port");
                    None
                }
            })
            .ok_or(Error::DeviceNotFound)?;

        Self::connect_path_as(&port.path, model, config).await
    }

    /// Connect to the device on `path`, detecting its model from the port's
    /// USB product ID.
    pub async fn connect_path(path: &str, config: ConnectConfig) -> Result<Self> {
        let port = serial::find_device(path, &config.vendor_ids)?;
        let model = Model::from_product_code(&port.product_code())?;
        Self::connect_path_as(path, model, config).await
    }

    /// Connect to `path`, trusting the caller about the model.
    pub async fn connect_path_as(path: &str, model: Model, config: ConnectConfig) -> Result<Self> {
        tracing::info!(path, %model, "Connecting");
        let baud_rate = config.baud_rate;
        let ws = handshake_with_retry(
            || serial::open(path, baud_rate),
            config.handshake_timeout(),
        )
        .await?;

        let (sink, stream) = ws.split();
        let device = Self::from_transport(sink, stream, model);
        device.initialize(&config)?;
        Ok(device)
    }

    /// Handshake and initialize over an arbitrary byte stream. Makes a
    /// single attempt with no deadline.
    pub async fn connect_stream<S>(stream: S, model: Model, config: ConnectConfig) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let ws = handshake(stream).await?;
        let (sink, stream) = ws.split();
        let device = Self::from_transport(sink, stream, model);
        device.initialize(&config)?;
        Ok(device)
    }
}

async fn handshake<S>(stream: S) -> Result<WebSocketStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (ws, response) = tokio_tungstenite::client_async(HANDSHAKE_URL, stream)
        .await
        .map_err(Error::Handshake)?;
    tracing::debug!(status = %response.status(), "Websocket handshake complete");
    Ok(ws)
}

/// Handshake with a deadline on the first attempt.
///
/// The first handshake over a freshly opened port fails about half the
/// time. If it times out, `open` is called again and a second attempt runs
/// without a deadline.
pub(crate) async fn handshake_with_retry<S, F>(
    mut open: F,
    deadline: Duration,
) -> Result<WebSocketStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnMut() -> Result<S>,
{
    match tokio::time::timeout(deadline, handshake(open()?)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?deadline, "Handshake timed out, reopening port");
            handshake(open()?).await
        }
    }
}
