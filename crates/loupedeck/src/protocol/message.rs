//! Wire frames.
//!
//! Every message in either direction has the same shape:
//!
//! ```text
//! [length:u8][type:u8][transaction:u8][payload...]
//! ```
//!
//! The length byte counts the 3 header bytes plus the payload and saturates
//! at 255. Large framebuffer writes blow straight past it, so it is written
//! for compliance and never read back; decoding always uses the size of the
//! received buffer.

use std::fmt;

use thiserror::Error;

/// Size of the `[length][type][transaction]` header.
pub const HEADER_LEN: usize = 3;

/// Transaction ID used by the device for unsolicited events.
pub const NO_TRANSACTION: u8 = 0;

/// Number of payload bytes shown by the `Display` impl before truncating.
const DISPLAY_PAYLOAD_BYTES: usize = 16;

/// Message type byte.
///
/// Codes come from the device firmware. Anything not listed here is kept as
/// [`MessageType::Other`] so newer firmware never breaks decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    ButtonPress,
    KnobRotate,
    SetColor,
    Serial,
    Reset,
    Version,
    SetBrightness,
    Mcu,
    Draw,
    /// Also used by the device to confirm a framebuffer write.
    WriteFramebuff,
    SetVibration,
    Touch,
    /// Touch on the display inside the CT's large knob.
    TouchCt,
    TouchEnd,
    TouchEndCt,
    Other(u8),
}

impl MessageType {
    /// Wire byte for this type.
    pub const fn code(self) -> u8 {
        match self {
            Self::ButtonPress => 0x00,
            Self::KnobRotate => 0x01,
            Self::SetColor => 0x02,
            Self::Serial => 0x03,
            Self::Reset => 0x06,
            Self::Version => 0x07,
            Self::SetBrightness => 0x09,
            Self::Mcu => 0x0d,
            Self::Draw => 0x0f,
            Self::WriteFramebuff => 0x10,
            Self::SetVibration => 0x1b,
            Self::Touch => 0x4d,
            Self::TouchCt => 0x52,
            Self::TouchEnd => 0x6d,
            Self::TouchEndCt => 0x72,
            Self::Other(code) => code,
        }
    }

    /// Type for a wire byte. Never fails; unknown codes become `Other`.
    pub const fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::ButtonPress,
            0x01 => Self::KnobRotate,
            0x02 => Self::SetColor,
            0x03 => Self::Serial,
            0x06 => Self::Reset,
            0x07 => Self::Version,
            0x09 => Self::SetBrightness,
            0x0d => Self::Mcu,
            0x0f => Self::Draw,
            0x10 => Self::WriteFramebuff,
            0x1b => Self::SetVibration,
            0x4d => Self::Touch,
            0x52 => Self::TouchCt,
            0x6d => Self::TouchEnd,
            0x72 => Self::TouchEndCt,
            other => Self::Other(other),
        }
    }
}

impl From<u8> for MessageType {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<MessageType> for u8 {
    fn from(message_type: MessageType) -> Self {
        message_type.code()
    }
}

/// Errors produced while decoding a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short: {len} bytes, need at least 3")]
    TooShort { len: usize },
}

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Advisory length byte as sent or received. Never used for slicing.
    pub length: u8,
    pub message_type: MessageType,
    pub transaction_id: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Build a frame, computing the saturated length byte.
    pub fn new(message_type: MessageType, transaction_id: u8, payload: Vec<u8>) -> Self {
        Self {
            length: advisory_length(payload.len()),
            message_type,
            transaction_id,
            payload,
        }
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.payload.len());
        bytes.push(self.length);
        bytes.push(self.message_type.code());
        bytes.push(self.transaction_id);
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parse wire bytes. Everything after the header is payload, regardless
    /// of what the length byte claims.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_LEN {
            return Err(FrameError::TooShort { len: bytes.len() });
        }

        Ok(Self {
            length: bytes[0],
            message_type: MessageType::from_code(bytes[1]),
            transaction_id: bytes[2],
            payload: bytes[HEADER_LEN..].to_vec(),
        })
    }

    /// True for frames the device sent without being asked.
    pub fn is_unsolicited(&self) -> bool {
        self.transaction_id == NO_TRANSACTION
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{len: {}, type: {:02x}, txn: {:02x}, data: ",
            self.length,
            self.message_type.code(),
            self.transaction_id
        )?;
        if self.payload.len() > DISPLAY_PAYLOAD_BYTES {
            write!(
                f,
                "{:02x?}..., actual_len: {}}}",
                &self.payload[..DISPLAY_PAYLOAD_BYTES],
                self.payload.len()
            )
        } else {
            write!(f, "{:02x?}}}", self.payload)
        }
    }
}

/// Length byte for a payload of `payload_len` bytes.
pub fn advisory_length(payload_len: usize) -> u8 {
    u8::try_from(HEADER_LEN + payload_len).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = Frame::new(MessageType::SetBrightness, 7, vec![9]);
        assert_eq!(frame.encode(), vec![4, 0x09, 7, 9]);
    }

    #[test]
    fn test_round_trip() {
        for payload_len in [0usize, 1, 16, 252] {
            let payload: Vec<u8> = (0..payload_len).map(|i| i as u8).collect();
            let frame = Frame::new(MessageType::Version, 200, payload.clone());
            let decoded = Frame::decode(&frame.encode()).unwrap();
            assert_eq!(decoded.message_type, MessageType::Version);
            assert_eq!(decoded.transaction_id, 200);
            assert_eq!(decoded.payload, payload);
        }
    }

    #[test]
    fn test_length_saturates() {
        assert_eq!(advisory_length(252), 255);
        assert_eq!(advisory_length(253), 255);
        assert_eq!(advisory_length(4000), 255);

        let frame = Frame::new(MessageType::WriteFramebuff, 1, vec![0; 1000]);
        let decoded = Frame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded.length, 255);
        assert_eq!(decoded.payload.len(), 1000);
    }

    #[test]
    fn test_decode_ignores_length_byte() {
        // Claims 4 bytes, carries 6.
        let decoded = Frame::decode(&[4, 0x4d, 0, 1, 2, 3]).unwrap();
        assert_eq!(decoded.payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(Frame::decode(&[]), Err(FrameError::TooShort { len: 0 }));
        assert_eq!(Frame::decode(&[3, 0]), Err(FrameError::TooShort { len: 2 }));
        assert!(Frame::decode(&[3, 0, 0]).unwrap().payload.is_empty());
    }

    #[test]
    fn test_message_type_codes() {
        for code in 0..=u8::MAX {
            assert_eq!(MessageType::from_code(code).code(), code);
        }
        assert_eq!(MessageType::from_code(0x72), MessageType::TouchEndCt);
        assert_eq!(MessageType::from_code(0x40), MessageType::Other(0x40));
    }

    #[test]
    fn test_display_truncates_payload() {
        let frame = Frame::new(MessageType::WriteFramebuff, 3, vec![0xab; 40]);
        let text = frame.to_string();
        assert!(text.contains("actual_len: 40"));
        assert!(text.starts_with("{len: 43, type: 10, txn: 03"));
    }
}
