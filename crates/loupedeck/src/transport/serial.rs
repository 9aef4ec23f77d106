//! Serial link to the device.
//!
//! The Loupedeck enumerates as a USB serial port and expects a websocket
//! session on top of it. [`SerialLink`] gives the raw port the byte-stream
//! shape the websocket client wants.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_serial::{SerialPortBuilderExt, SerialPortType, SerialStream};

use crate::error::{Error, Result};

/// A byte stream with trace logging of traffic.
pub struct SerialLink<S> {
    name: String,
    inner: S,
}

impl<S> SerialLink<S> {
    pub fn new(name: impl Into<String>, inner: S) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for SerialLink<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        match &poll {
            Poll::Ready(Ok(())) => {
                tracing::trace!(port = %this.name, bytes = buf.filled().len() - before, "read");
            }
            Poll::Ready(Err(e)) => {
                tracing::debug!(port = %this.name, error = %e, "read failed");
            }
            Poll::Pending => {}
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for SerialLink<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(written)) = &poll {
            tracing::trace!(port = %this.name, bytes = written, "write");
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// A serial port that belongs to a supported vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl PortInfo {
    /// Product ID as four lowercase hex digits, e.g. `"0004"`.
    pub fn product_code(&self) -> String {
        format!("{:04x}", self.product_id)
    }
}

/// List USB serial ports whose vendor ID is in `vendor_ids`.
///
/// Fails with [`Error::NoSerialPorts`] when the system has no serial ports
/// at all, and returns an empty list when there are ports but none match.
pub fn find_devices(vendor_ids: &[u16]) -> Result<Vec<PortInfo>> {
    tracing::info!("Enumerating serial ports");
    let ports = tokio_serial::available_ports()?;
    if ports.is_empty() {
        return Err(Error::NoSerialPorts);
    }

    Ok(ports
        .into_iter()
        .filter_map(|port| match port.port_type {
            SerialPortType::UsbPort(usb) if vendor_ids.contains(&usb.vid) => Some(PortInfo {
                path: port.port_name,
                vendor_id: usb.vid,
                product_id: usb.pid,
            }),
            _ => None,
        })
        .collect())
}

/// Look up one port by path among the supported devices.
pub fn find_device(path: &str, vendor_ids: &[u16]) -> Result<PortInfo> {
    find_devices(vendor_ids)?
        .into_iter()
        .find(|port| port.path == path)
        .ok_or(Error::DeviceNotFound)
}

/// Open a serial port for async I/O.
pub fn open(path: &str, baud_rate: u32) -> Result<SerialLink<SerialStream>> {
    tracing::info!(port = path, "Opening serial port");
    let stream = tokio_serial::new(path, baud_rate).open_native_async()?;
    Ok(SerialLink::new(path, stream))
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn test_link_forwards_bytes() {
        let (near, mut far) = tokio::io::duplex(64);
        let mut link = SerialLink::new("test", near);

        link.write_all(b"GET / HTTP/1.1").await.unwrap();
        let mut received = [0u8; 14];
        far.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"GET / HTTP/1.1");

        far.write_all(&[1, 2, 3]).await.unwrap();
        let mut back = [0u8; 3];
        link.read_exact(&mut back).await.unwrap();
        assert_eq!(back, [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_link_over_scripted_port() {
        let port = tokio_test::io::Builder::new()
            .write(&[0x82, 0x03])
            .read(&[0x82, 0x00])
            .build();
        let mut link = SerialLink::new("/dev/ttyACM0", port);
        assert_eq!(link.name(), "/dev/ttyACM0");

        tokio_test::assert_ok!(link.write_all(&[0x82, 0x03]).await);
        let mut reply = [0u8; 2];
        tokio_test::assert_ok!(link.read_exact(&mut reply).await);
        assert_eq!(reply, [0x82, 0x00]);
    }

    #[test]
    fn test_product_code() {
        let port = PortInfo {
            path: "/dev/ttyACM0".to_string(),
            vendor_id: 0x1532,
            product_id: 0x0d06,
        };
        assert_eq!(port.product_code(), "0d06");
    }
}
