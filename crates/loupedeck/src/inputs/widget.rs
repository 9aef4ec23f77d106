//! Swipeable widgets on the rotary knob's display.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Arc as ArcShape, Circle, PrimitiveStyle};
use embedded_graphics::text::Alignment;
use parking_lot::Mutex;

use super::gesture::{watch_dial_gestures, Gesture};
use super::knob::DisplayKnob;
use super::watched::WatchedValue;
use crate::device::{Canvas, Device};
use crate::error::{Error, Result};

pub const MAX_WIDGETS: usize = 10;

/// Horizontal drag distance that switches widgets.
pub const SWIPE_THRESHOLD: i32 = 20;

const COLOR_ACTIVE: Rgb888 = Rgb888::new(192, 192, 192);
const COLOR_INACTIVE: Rgb888 = Rgb888::new(64, 64, 64);

const WIDGET_WIDTH: u32 = 240;
const WIDGET_HEIGHT: u32 = 210;
const NAV_BAR_HEIGHT: u32 = 30;

/// Something that can own the rotary knob and its display while focused.
pub trait Widget: Send + Sync {
    /// Take over the rotary knob and draw.
    fn activate(&self, device: &Device) -> Result<()>;

    fn deactivate(&self, device: &Device);
}

struct AnalogInner {
    min: i32,
    max: i32,
    start_degrees: f32,
    sweep_degrees: f32,
    value: WatchedValue,
    name: String,
    active: AtomicBool,
    watching: AtomicBool,
}

impl AnalogInner {
    /// Share of the sweep covered by the current value, in `[0, 1]`.
    fn fraction(&self) -> f32 {
        let range = self.max - self.min;
        if range <= 0 {
            return 0.0;
        }
        ((self.value.get() - self.min) as f32 / range as f32).clamp(0.0, 1.0)
    }

    fn render(&self) -> Canvas {
        let mut canvas = Canvas::new(WIDGET_WIDTH, WIDGET_HEIGHT);
        let center = Point::new(120, 120);
        let start = Angle::from_degrees(self.start_degrees);

        ArcShape::with_center(center, 220, start, Angle::from_degrees(self.sweep_degrees))
            .into_styled(PrimitiveStyle::with_stroke(COLOR_INACTIVE, 1))
            .draw(&mut canvas)
            .ok();
        let filled = self.sweep_degrees * self.fraction();
        if filled > 0.0 {
            ArcShape::with_center(center, 220, start, Angle::from_degrees(filled))
                .into_styled(PrimitiveStyle::with_stroke(COLOR_ACTIVE, 4))
                .draw(&mut canvas)
                .ok();
        }

        canvas.draw_text(&self.name, Point::new(120, 80), COLOR_ACTIVE, Alignment::Center);
        canvas.draw_text(
            &self.value.get().to_string(),
            Point::new(120, 160),
            COLOR_ACTIVE,
            Alignment::Center,
        );
        canvas
    }

    fn draw(&self, device: &Device) -> Result<()> {
        if !self.active.load(Ordering::SeqCst) {
            return Ok(());
        }
        let display = device.require_display("dial")?;
        device.draw(display, &self.render(), 0, 0)
    }
}

/// A single value shown as a gauge; turning the rotary knob changes it.
#[derive(Clone)]
pub struct AnalogWidget {
    inner: Arc<AnalogInner>,
}

impl AnalogWidget {
    pub fn new(min: i32, max: i32, value: WatchedValue, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(AnalogInner {
                min,
                max,
                start_degrees: 135.0,
                sweep_degrees: 270.0,
                value,
                name: name.into(),
                active: AtomicBool::new(false),
                watching: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    pub fn value(&self) -> &WatchedValue {
        &self.inner.value
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The gauge as it would be drawn now.
    pub fn render(&self) -> Canvas {
        self.inner.render()
    }

    /// Redraw, if active.
    pub fn draw(&self, device: &Device) -> Result<()> {
        self.inner.draw(device)
    }
}

impl Widget for AnalogWidget {
    fn activate(&self, device: &Device) -> Result<()> {
        self.inner.active.store(true, Ordering::SeqCst);
        DisplayKnob::bind(device, self.inner.min, self.inner.max, self.inner.value.clone());

        if !self.inner.watching.swap(true, Ordering::SeqCst) {
            let target: Weak<AnalogInner> = Arc::downgrade(&self.inner);
            let device = device.clone();
            self.inner.value.add_watcher(move |_| {
                if let Some(inner) = target.upgrade() {
                    if let Err(e) = inner.draw(&device) {
                        tracing::warn!(error = %e, "widget redraw failed");
                    }
                }
            });
        }

        self.inner.draw(device)
    }

    fn deactivate(&self, _device: &Device) {
        self.inner.active.store(false, Ordering::SeqCst);
    }
}

/// One navigation dot, in nav bar coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavDot {
    pub x: f32,
    pub y: f32,
    pub diameter: u32,
    pub active: bool,
}

/// Dots for `count` widgets along the bottom of the round display.
///
/// Angle 0 points straight down; the dots sit on a circle of radius 110
/// around the display centre, which is (120, -90) in the 30 pixel high
/// bar.
pub fn nav_dots(active: usize, count: usize) -> Vec<NavDot> {
    if count == 0 {
        return Vec::new();
    }
    let step = (60.0 / count as f32).min(20.0).to_radians();
    let first = -(step * (count - 1) as f32) / 2.0;

    (0..count)
        .map(|i| {
            let angle = first + step * i as f32;
            NavDot {
                x: angle.sin() * 110.0 + 120.0,
                y: angle.cos() * 110.0 - 90.0,
                diameter: if i == active { 10 } else { 8 },
                active: i == active,
            }
        })
        .collect()
}

fn render_nav_bar(active: usize, count: usize) -> Canvas {
    let mut canvas = Canvas::new(WIDGET_WIDTH, NAV_BAR_HEIGHT);
    for dot in nav_dots(active, count) {
        let color = if dot.active {
            COLOR_ACTIVE
        } else {
            COLOR_INACTIVE
        };
        let center = Point::new(dot.x.round() as i32, dot.y.round() as i32);
        Circle::with_center(center, dot.diameter)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut canvas)
            .ok();
    }
    canvas
}

struct HolderInner {
    device: Device,
    widgets: Vec<Box<dyn Widget>>,
    active: Mutex<usize>,
}

impl HolderInner {
    fn step(&self, forward: bool) {
        let count = self.widgets.len();
        let (previous, next) = {
            let mut active = self.active.lock();
            let previous = *active;
            *active = if forward {
                (previous + 1) % count
            } else {
                (previous + count - 1) % count
            };
            (previous, *active)
        };
        tracing::debug!(previous, next, "switching widget");

        self.widgets[previous].deactivate(&self.device);
        if let Err(e) = self.widgets[next].activate(&self.device) {
            tracing::warn!(error = %e, "widget activation failed");
        }
        if let Err(e) = self.draw_nav_bar(next) {
            tracing::warn!(error = %e, "nav bar redraw failed");
        }
    }

    fn draw_nav_bar(&self, active: usize) -> Result<()> {
        let display = self.device.require_display("dial")?;
        let canvas = render_nav_bar(active, self.widgets.len());
        self.device
            .draw(display, &canvas, 0, WIDGET_HEIGHT as u16)
    }
}

/// Hosts several widgets on the rotary display and switches between them
/// on left/right swipes.
#[derive(Clone)]
pub struct WidgetHolder {
    inner: Arc<HolderInner>,
}

impl WidgetHolder {
    /// Activate the first widget and start listening for swipes. Takes over
    /// the dial touch binding.
    pub fn new(device: &Device, widgets: Vec<Box<dyn Widget>>) -> Result<Self> {
        if widgets.is_empty() || widgets.len() > MAX_WIDGETS {
            return Err(Error::WidgetCount {
                count: widgets.len(),
                max: MAX_WIDGETS,
            });
        }
        device.require_display("dial")?;

        let inner = Arc::new(HolderInner {
            device: device.clone(),
            widgets,
            active: Mutex::new(0),
        });
        inner.widgets[0].activate(device)?;

        // The binding keeps the holder alive until it is replaced or the
        // device is closed.
        let holder = inner.clone();
        watch_dial_gestures(device, move |gesture| {
            match gesture {
                Gesture::Click { x, y } => tracing::debug!(x, y, "dial click"),
                Gesture::Drag { dx, .. } if dx < -SWIPE_THRESHOLD => holder.step(true),
                Gesture::Drag { dx, .. } if dx > SWIPE_THRESHOLD => holder.step(false),
                Gesture::Drag { dx, dy } => tracing::debug!(dx, dy, "drag ignored"),
            }
        });

        inner.draw_nav_bar(0)?;
        Ok(Self { inner })
    }

    pub fn active_index(&self) -> usize {
        *self.inner.active.lock()
    }

    pub fn len(&self) -> usize {
        self.inner.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.widgets.is_empty()
    }

    /// Switch to the next widget, as a right-to-left swipe would.
    pub fn next(&self) {
        self.inner.step(true);
    }

    pub fn previous(&self) {
        self.inner.step(false);
    }
}
