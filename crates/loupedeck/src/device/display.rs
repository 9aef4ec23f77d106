//! Display descriptors and pixel framing.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;

use super::canvas::Canvas;
use crate::error::{Error, Result};

/// Byte order of RGB565 pixels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// One addressable display region.
///
/// Several logical displays may share a protocol `id` and differ only by
/// offset, which is how the unified-panel models emulate the three-panel
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Display {
    pub name: &'static str,
    pub id: u8,
    pub width: u16,
    pub height: u16,
    pub offset_x: u16,
    pub offset_y: u16,
    pub byte_order: ByteOrder,
}

impl Display {
    pub const fn new(
        name: &'static str,
        id: u8,
        width: u16,
        height: u16,
        offset_x: u16,
        offset_y: u16,
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            name,
            id,
            width,
            height,
            offset_x,
            offset_y,
            byte_order,
        }
    }

    /// Payload of the `WriteFramebuff` command for `canvas` placed at
    /// (`x`, `y`) within this display.
    ///
    /// `[id:u16][x:u16][y:u16][w:u16][h:u16][pixels]`, all header fields
    /// big-endian, with the display's offset added to x and y. Fails with
    /// [`Error::DrawOutOfRange`] if any header field would not fit in 16
    /// bits.
    pub fn framebuffer_payload(&self, canvas: &Canvas, x: u16, y: u16) -> Result<Vec<u8>> {
        let out_of_range = || Error::DrawOutOfRange {
            display: self.name,
            x,
            y,
            width: canvas.width(),
            height: canvas.height(),
        };
        let panel_x = x.checked_add(self.offset_x).ok_or_else(out_of_range)?;
        let panel_y = y.checked_add(self.offset_y).ok_or_else(out_of_range)?;
        let width = u16::try_from(canvas.width()).map_err(|_| out_of_range())?;
        let height = u16::try_from(canvas.height()).map_err(|_| out_of_range())?;

        let pixels = canvas.pixels();
        let mut payload = Vec::with_capacity(10 + pixels.len() * 2);
        payload.extend_from_slice(&u16::from(self.id).to_be_bytes());
        payload.extend_from_slice(&panel_x.to_be_bytes());
        payload.extend_from_slice(&panel_y.to_be_bytes());
        payload.extend_from_slice(&width.to_be_bytes());
        payload.extend_from_slice(&height.to_be_bytes());

        for pixel in pixels {
            let value = rgb565(*pixel);
            match self.byte_order {
                ByteOrder::LittleEndian => payload.extend_from_slice(&value.to_le_bytes()),
                ByteOrder::BigEndian => payload.extend_from_slice(&value.to_be_bytes()),
            }
        }
        Ok(payload)
    }

    /// Payload of the `Draw` command that latches the framebuffer.
    pub fn draw_payload(&self) -> Vec<u8> {
        u16::from(self.id).to_be_bytes().to_vec()
    }
}

/// Pack a colour into 5-6-5 bits.
pub fn rgb565(color: Rgb888) -> u16 {
    let r = u16::from(color.r() >> 3);
    let g = u16::from(color.g() >> 2);
    let b = u16::from(color.b() >> 3);
    (r << 11) | (g << 5) | b
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: Display = Display::new("main", b'A', 360, 270, 60, 0, ByteOrder::LittleEndian);

    #[test]
    fn test_rgb565() {
        assert_eq!(rgb565(Rgb888::BLACK), 0x0000);
        assert_eq!(rgb565(Rgb888::WHITE), 0xffff);
        assert_eq!(rgb565(Rgb888::RED), 0xf800);
        assert_eq!(rgb565(Rgb888::GREEN), 0x07e0);
        assert_eq!(rgb565(Rgb888::BLUE), 0x001f);
    }

    #[test]
    fn test_framebuffer_header_applies_offset() {
        let canvas = Canvas::filled(2, 2, Rgb888::RED);
        let payload = MAIN.framebuffer_payload(&canvas, 10, 20).unwrap();

        assert_eq!(
            &payload[..10],
            &[0x00, 0x41, 0x00, 0x46, 0x00, 0x14, 0x00, 0x02, 0x00, 0x02]
        );
        assert_eq!(payload.len(), 10 + 8);
        // 0xf800 little-endian
        assert_eq!(&payload[10..], &[0x00, 0xf8].repeat(4)[..]);
        assert_eq!(MAIN.draw_payload(), vec![0x00, 0x41]);
    }

    #[test]
    fn test_big_endian_pixels() {
        let dial = Display::new("dial", b'W', 240, 240, 0, 0, ByteOrder::BigEndian);
        let canvas = Canvas::filled(1, 1, Rgb888::RED);
        let payload = dial.framebuffer_payload(&canvas, 0, 0).unwrap();
        assert_eq!(&payload[10..], &[0xf8, 0x00]);
    }

    #[test]
    fn test_pixels_are_row_major() {
        let mut canvas = Canvas::new(2, 1);
        canvas.set_pixel(1, 0, Rgb888::BLUE);
        let payload = MAIN.framebuffer_payload(&canvas, 0, 0).unwrap();
        assert_eq!(&payload[10..], &[0x00, 0x00, 0x1f, 0x00]);
    }

    #[test]
    fn test_header_overflow_is_rejected() {
        let canvas = Canvas::new(1, 1);
        // 65500 + 60 offset does not fit in the x field.
        assert!(matches!(
            MAIN.framebuffer_payload(&canvas, 65_500, 0),
            Err(Error::DrawOutOfRange { display: "main", x: 65_500, .. })
        ));
        assert!(MAIN.framebuffer_payload(&canvas, 65_475, 0).is_ok());

        let wide = Canvas::new(70_000, 1);
        assert!(matches!(
            MAIN.framebuffer_payload(&wide, 0, 0),
            Err(Error::DrawOutOfRange { width: 70_000, .. })
        ));
    }
}
