//! Touch key that cycles through a set of images and values.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::watched::WatchedValue;
use crate::device::{Canvas, Device, Display};
use crate::error::Result;
use crate::protocol::{ButtonStatus, TouchZone};

struct Inner {
    device: Device,
    display: &'static Display,
    x: u16,
    y: u16,
    entries: RwLock<Vec<(Canvas, i32)>>,
    value: WatchedValue,
}

fn index_of(entries: &[(Canvas, i32)], current: i32) -> usize {
    match entries.iter().position(|(_, value)| *value == current) {
        Some(index) => index,
        None => {
            tracing::warn!(value = current, "value not in multi button, showing first entry");
            0
        }
    }
}

impl Inner {
    fn current_index(&self) -> usize {
        index_of(&self.entries.read(), self.value.get())
    }

    fn advance(&self) {
        let next = {
            let entries = self.entries.read();
            let index = (index_of(&entries, self.value.get()) + 1) % entries.len().max(1);
            entries.get(index).map(|(_, value)| *value)
        };
        if let Some(next) = next {
            self.value.set(next);
        }
    }

    fn draw(&self) -> Result<()> {
        let entries = self.entries.read();
        match entries.get(index_of(&entries, self.value.get())) {
            Some((image, _)) => self.device.draw(self.display, image, self.x, self.y),
            None => Ok(()),
        }
    }
}

/// A touch key on the main display that steps through (image, value)
/// pairs, wrapping after the last.
///
/// The shared value decides which image is shown, so setting it from
/// elsewhere redraws the key too.
#[derive(Clone)]
pub struct MultiButton {
    inner: Arc<Inner>,
}

impl MultiButton {
    /// Create the button with its first entry and set `value` to
    /// `initial`, which draws it.
    pub fn new(
        device: &Device,
        value: WatchedValue,
        zone: TouchZone,
        image: Canvas,
        initial: i32,
    ) -> Result<Self> {
        let display = device.require_display("main")?;
        let (x, y) = zone.main_origin().unwrap_or_else(|| {
            tracing::warn!(zone = zone.0, "not a touch key, drawing at the origin");
            (0, 0)
        });

        let inner = Arc::new(Inner {
            device: device.clone(),
            display,
            x,
            y,
            entries: RwLock::new(vec![(image, initial)]),
            value: value.clone(),
        });

        let watcher: Weak<Inner> = Arc::downgrade(&inner);
        value.add_watcher(move |_| {
            if let Some(inner) = watcher.upgrade() {
                if let Err(e) = inner.draw() {
                    tracing::warn!(error = %e, "multi button redraw failed");
                }
            }
        });

        let target = inner.clone();
        device.bind_touch(zone, ButtonStatus::Down, move |_, _, _, _| target.advance());

        value.set(initial);
        Ok(Self { inner })
    }

    /// Append another (image, value) entry.
    pub fn add(&self, image: Canvas, value: i32) {
        self.inner.entries.write().push((image, value));
    }

    /// Index of the entry matching the current value, or 0 if none does.
    pub fn current_index(&self) -> usize {
        self.inner.current_index()
    }

    /// Move to the next entry, as a touch would.
    pub fn advance(&self) {
        self.inner.advance();
    }

    pub fn draw(&self) -> Result<()> {
        self.inner.draw()
    }

    pub fn value(&self) -> &WatchedValue {
        &self.inner.value
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
