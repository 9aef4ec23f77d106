//! Three knobs shown on a side display, adjustable together by dragging.

use std::sync::{Arc, Weak};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::{Point, RgbColor};
use embedded_graphics::text::Alignment;
use parking_lot::Mutex;

use super::knob::IntKnob;
use super::watched::WatchedValue;
use crate::device::{Canvas, Device, Display};
use crate::error::Result;
use crate::protocol::{ButtonStatus, Knob, TouchZone};

/// Text baselines of the three values.
const ROWS: [i32; 3] = [30, 150, 260];

/// Gap between the right edge of the display and the text.
const RIGHT_MARGIN: i32 = 4;

/// Which side strip, and which column of knobs, a [`TouchDial`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Name of the side display.
    pub fn display_name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// The three knobs next to this side, top to bottom.
    pub fn knobs(self) -> [Knob; 3] {
        match self {
            Side::Left => [Knob::KNOB_1, Knob::KNOB_2, Knob::KNOB_3],
            Side::Right => [Knob::KNOB_4, Knob::KNOB_5, Knob::KNOB_6],
        }
    }

    /// Touch zone covering this side's strip.
    pub fn touch_zone(self) -> TouchZone {
        match self {
            Side::Left => TouchZone::LEFT,
            Side::Right => TouchZone::RIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { start_y: u16, start_values: [i32; 3] },
}

/// Vertical drag reconstructed from repeated touch-down reports.
#[derive(Debug, Clone)]
pub struct DragTracker {
    state: DragState,
    divisor: i32,
}

impl DragTracker {
    /// `divisor` is the number of pixels per step; values below 1 are
    /// treated as 1.
    pub fn new(divisor: i32) -> Self {
        Self {
            state: DragState::Idle,
            divisor: divisor.max(1),
        }
    }

    /// Pixels per step for a touch strip `height` pixels tall covering
    /// `[min, max]`.
    pub fn divisor_for(height: u16, min: i32, max: i32) -> i32 {
        (i32::from(height) / max.saturating_sub(min).max(1)).max(1)
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Feed a touch-down. The first one of a drag records the reference
    /// point and returns `None`; later ones return the new values.
    pub fn touch_down(&mut self, y: u16, current: [i32; 3]) -> Option<[i32; 3]> {
        match self.state {
            DragState::Idle => {
                self.state = DragState::Dragging {
                    start_y: y,
                    start_values: current,
                };
                None
            }
            DragState::Dragging {
                start_y,
                start_values,
            } => {
                let delta = (i32::from(start_y) - i32::from(y)) / self.divisor;
                Some(start_values.map(|value| value.saturating_add(delta)))
            }
        }
    }

    pub fn touch_up(&mut self) {
        self.state = DragState::Idle;
    }
}

struct Inner {
    device: Device,
    display: &'static Display,
    knobs: [IntKnob; 3],
    drag: Mutex<DragTracker>,
}

impl Inner {
    fn values(&self) -> [i32; 3] {
        [self.knobs[0].get(), self.knobs[1].get(), self.knobs[2].get()]
    }

    fn draw(&self) -> Result<()> {
        let width = u32::from(self.display.width);
        let mut canvas = Canvas::new(width, u32::from(self.display.height));
        let x = width as i32 - RIGHT_MARGIN;
        for (value, y) in self.values().into_iter().zip(ROWS) {
            canvas.draw_text(
                &value.to_string(),
                Point::new(x, y),
                Rgb888::WHITE,
                Alignment::Right,
            );
        }
        self.device.draw(self.display, &canvas, 0, 0)
    }

    fn on_touch_down(&self, y: u16) {
        let current = self.values();
        let next = self.drag.lock().touch_down(y, current);
        if let Some(next) = next {
            for (knob, value) in self.knobs.iter().zip(next) {
                knob.set(value);
            }
        }
    }
}

/// Three knobs on one side of the device, with their values drawn on the
/// side display next to them.
///
/// Turning a knob steps its value, pressing it resets to 0, and dragging
/// up or down on the display moves all three together.
#[derive(Clone)]
pub struct TouchDial {
    inner: Arc<Inner>,
}

impl TouchDial {
    pub fn new(
        device: &Device,
        side: Side,
        values: [WatchedValue; 3],
        min: i32,
        max: i32,
    ) -> Result<Self> {
        let display = device.require_display(side.display_name())?;
        let [k1, k2, k3] = side.knobs();
        let [v1, v2, v3] = values;
        let knobs = [
            IntKnob::bind(device, k1, min, max, v1),
            IntKnob::bind(device, k2, min, max, v2),
            IntKnob::bind(device, k3, min, max, v3),
        ];
        let divisor = DragTracker::divisor_for(display.height, min, max);

        let inner = Arc::new(Inner {
            device: device.clone(),
            display,
            knobs,
            drag: Mutex::new(DragTracker::new(divisor)),
        });

        let zone = side.touch_zone();
        let target = inner.clone();
        device.bind_touch(zone, ButtonStatus::Down, move |_, _, _, y| target.on_touch_down(y));
        let target = inner.clone();
        device.bind_touch(zone, ButtonStatus::Up, move |_, _, _, _| {
            target.drag.lock().touch_up()
        });

        // Watchers hold weak references: the values can outlive the device.
        for knob in &inner.knobs {
            let target: Weak<Inner> = Arc::downgrade(&inner);
            knob.bounded().value().add_watcher(move |_| {
                if let Some(inner) = target.upgrade() {
                    if let Err(e) = inner.draw() {
                        tracing::warn!(error = %e, "touch dial redraw failed");
                    }
                }
            });
        }

        inner.draw()?;
        Ok(Self { inner })
    }

    pub fn knobs(&self) -> &[IntKnob; 3] {
        &self.inner.knobs
    }

    pub fn values(&self) -> [i32; 3] {
        self.inner.values()
    }

    pub fn draw(&self) -> Result<()> {
        self.inner.draw()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::device::Model;

    #[test]
    fn test_divisor() {
        assert_eq!(DragTracker::divisor_for(270, 0, 100), 2);
        assert_eq!(DragTracker::divisor_for(270, 0, 1000), 1);
        assert_eq!(DragTracker::divisor_for(270, 5, 5), 270);
    }

    #[test]
    fn test_drag_moves_all_values() {
        let mut drag = DragTracker::new(2);
        assert_eq!(drag.touch_down(200, [1, 2, 3]), None);
        assert!(matches!(drag.state(), DragState::Dragging { start_y: 200, .. }));

        // Up 20 pixels is +10 steps.
        assert_eq!(drag.touch_down(180, [9, 9, 9]), Some([11, 12, 13]));
        // Down past the start goes negative; division truncates.
        assert_eq!(drag.touch_down(203, [0, 0, 0]), Some([0, 1, 2]));
        assert_eq!(drag.touch_down(205, [0, 0, 0]), Some([-1, 0, 1]));

        drag.touch_up();
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.touch_down(50, [7, 7, 7]), None);
    }

    #[tokio::test]
    async fn test_touch_dial_on_device() {
        let (sink, mut wire) = mpsc::unbounded_channel::<Vec<u8>>();
        let (_inject, stream) = mpsc::unbounded_channel::<Vec<u8>>();
        let device = Device::from_transport(sink, stream, Model::CtV2);

        let values = [WatchedValue::new(0), WatchedValue::new(0), WatchedValue::new(0)];
        let dial = TouchDial::new(&device, Side::Right, values.clone(), 0, 27).unwrap();

        // Initial draw to the right strip of the unified panel.
        let write = wire.recv().await.unwrap();
        assert_eq!(&write[1..9], &[0x10, 1, 0x00, b'M', 0x01, 0xa4, 0x00, 0x00]);
        assert_eq!(wire.recv().await.unwrap()[1], 0x0f);

        // Knob 5 steps the middle value.
        device.dispatch(&[5, 0x01, 0x00, 0x05, 0x01]);
        assert_eq!(dial.values(), [0, 1, 0]);

        // Divisor is 270 / 27 = 10. Drag up 50 pixels on the right strip.
        device.dispatch(&[9, 0x4d, 0x00, 0x00, 0x01, 0xc2, 0x00, 200, 0x00]);
        device.dispatch(&[9, 0x4d, 0x00, 0x00, 0x01, 0xc2, 0x00, 150, 0x00]);
        assert_eq!(dial.values(), [5, 6, 5]);
        device.dispatch(&[9, 0x6d, 0x00, 0x00, 0x01, 0xc2, 0x00, 150, 0x00]);

        // Dragging far clamps at max.
        device.dispatch(&[9, 0x4d, 0x00, 0x00, 0x01, 0xc2, 0x01, 0x00, 0x00]);
        device.dispatch(&[9, 0x4d, 0x00, 0x00, 0x01, 0xc2, 0x00, 0x00, 0x00]);
        assert_eq!(dial.values(), [27, 27, 27]);
        assert_eq!(values[2].get(), 27);
    }
}
