//! Byte and message transports underneath the protocol.

pub mod serial;
mod websocket;

pub use serial::{PortInfo, SerialLink};
pub use websocket::{MessageSink, MessageStream};
