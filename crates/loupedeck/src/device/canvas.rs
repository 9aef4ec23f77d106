//! In-memory RGB image that can be pushed to a display.
//!
//! `Canvas` is an `embedded-graphics` draw target, so text, shapes and
//! images from that ecosystem can be rendered straight into it.

use std::convert::Infallible;

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Text};

/// Row-major RGB pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Canvas {
    /// Create a black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgb888::BLACK)
    }

    pub fn filled(width: u32, height: u32, color: Rgb888) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Set one pixel. Out-of-bounds writes are clipped.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[(y * self.width + x) as usize] = color;
    }

    pub fn fill(&mut self, color: Rgb888) {
        self.pixels.fill(color);
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }

    /// Render one line of text with its baseline at `position`.
    ///
    /// `alignment` anchors the text horizontally on `position.x`.
    pub fn draw_text(&mut self, text: &str, position: Point, color: Rgb888, alignment: Alignment) {
        let style = MonoTextStyle::new(&FONT_10X20, color);
        Text::with_alignment(text, position, style, alignment)
            .draw(self)
            .ok();
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }
}
