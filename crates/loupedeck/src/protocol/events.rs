//! Typed decoding of input event frames.
//!
//! Offsets are into the whole wire message, header included. Control
//! identifiers are big-endian u16 at offset 2; the high byte shares that
//! position with the transaction byte, which is always zero on unsolicited
//! input events. Each parser returns `None` if the message is too short.

use super::controls::{Button, ButtonStatus, Knob};

/// Knob delta the device sends for one counter-clockwise step.
pub const KNOB_LEFT_SENTINEL: u8 = 255;

fn u16_at(message: &[u8], offset: usize) -> Option<u16> {
    let bytes = message.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Translate the wire rotation byte into a signed step count.
///
/// 255 means one step left. Every other value is taken literally; the
/// device does not use two's complement here.
pub const fn knob_delta(raw: u8) -> i32 {
    if raw == KNOB_LEFT_SENTINEL {
        -1
    } else {
        raw as i32
    }
}

/// `ButtonPress`: `[len][type][txn|id_hi][id_lo][status]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: Button,
    /// Raw status byte; see [`ButtonStatus::from_wire`].
    pub status: u8,
}

impl ButtonEvent {
    pub fn parse(message: &[u8]) -> Option<Self> {
        Some(Self {
            button: Button(u16_at(message, 2)?),
            status: *message.get(4)?,
        })
    }

    pub fn status(&self) -> Option<ButtonStatus> {
        ButtonStatus::from_wire(self.status)
    }
}

/// `KnobRotate`: `[len][type][txn|id_hi][id_lo][delta]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnobEvent {
    pub knob: Knob,
    pub delta: i32,
}

impl KnobEvent {
    pub fn parse(message: &[u8]) -> Option<Self> {
        Some(Self {
            knob: Knob(u16_at(message, 2)?),
            delta: knob_delta(*message.get(4)?),
        })
    }
}

/// `Touch`, `TouchEnd` and their CT variants:
/// `[len][type][txn][?][x:u16][y:u16][contact]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub x: u16,
    pub y: u16,
    /// Contact byte of unknown meaning. Carried along, never interpreted.
    pub contact: u8,
}

impl TouchEvent {
    pub fn parse(message: &[u8]) -> Option<Self> {
        Some(Self {
            x: u16_at(message, 4)?,
            y: u16_at(message, 6)?,
            contact: *message.get(8)?,
        })
    }
}
