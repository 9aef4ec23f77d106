//! Loupedeck wire protocol.
//!
//! Handles framing, transaction correlation state and decoding of the
//! device's input events. Nothing in here touches I/O.

mod controls;
mod events;
mod message;
mod transaction;

pub use controls::{
    Button, ButtonStatus, Knob, TouchZone, RIGHT_STRIP_START, SIDE_STRIP_WIDTH, TOUCH_COLUMNS,
    TOUCH_KEY_SIZE,
};
pub use events::{knob_delta, ButtonEvent, KnobEvent, TouchEvent, KNOB_LEFT_SENTINEL};
pub use message::{advisory_length, Frame, FrameError, MessageType, HEADER_LEN, NO_TRANSACTION};
pub use transaction::{ResponseCallback, TransactionIds, Transactions};
