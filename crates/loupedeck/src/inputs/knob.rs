//! Knobs that drive a bounded [`WatchedValue`].

use super::watched::WatchedValue;
use crate::device::Device;
use crate::protocol::{Button, ButtonStatus, Knob};

/// A watched value confined to `[min, max]`.
///
/// Out-of-range input is clamped, never rejected.
#[derive(Debug, Clone)]
pub struct BoundedValue {
    value: WatchedValue,
    min: i32,
    max: i32,
}

impl BoundedValue {
    /// Wrap `value` without touching it; the first `set` clamps.
    pub fn new(value: WatchedValue, min: i32, max: i32) -> Self {
        Self { value, min, max }
    }

    /// Current value.
    pub fn get(&self) -> i32 {
        self.value.get()
    }

    /// Store `value` clamped to `[min, max]` and notify watchers.
    pub fn set(&self, value: i32) {
        self.value.set(self.clamp(value));
    }

    /// Add `delta` (which may be negative) to the current value.
    pub fn inc(&self, delta: i32) {
        self.set(self.get().saturating_add(delta));
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// The underlying watched value, for adding watchers.
    pub fn value(&self) -> &WatchedValue {
        &self.value
    }

    fn clamp(&self, value: i32) -> i32 {
        // Not `i32::clamp`: that panics when min > max.
        let value = if value < self.min { self.min } else { value };
        if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Value the knob's button resets to.
pub const KNOB_RESET_VALUE: i32 = 0;

/// One of the small knobs: turning steps the value, pressing resets it.
#[derive(Debug, Clone)]
pub struct IntKnob {
    knob: Knob,
    bounded: BoundedValue,
}

impl IntKnob {
    /// Bind `knob` and its push button on `device`.
    pub fn bind(device: &Device, knob: Knob, min: i32, max: i32, value: WatchedValue) -> Self {
        let bounded = BoundedValue::new(value, min, max);

        let target = bounded.clone();
        device.bind_knob(knob, move |_, delta| target.inc(delta));

        let target = bounded.clone();
        device.bind_button(Button::from(knob), ButtonStatus::Down, move |_, _| {
            target.set(KNOB_RESET_VALUE)
        });

        Self { knob, bounded }
    }

    /// The knob this is bound to.
    pub fn knob(&self) -> Knob {
        self.knob
    }

    pub fn get(&self) -> i32 {
        self.bounded.get()
    }

    pub fn set(&self, value: i32) {
        self.bounded.set(value);
    }

    pub fn inc(&self, delta: i32) {
        self.bounded.inc(delta);
    }

    pub fn bounded(&self) -> &BoundedValue {
        &self.bounded
    }
}

/// The large CT knob. It has no push button, so there is no reset.
#[derive(Debug, Clone)]
pub struct DisplayKnob {
    bounded: BoundedValue,
}

impl DisplayKnob {
    /// Bind the rotary knob on `device`, replacing any existing binding.
    pub fn bind(device: &Device, min: i32, max: i32, value: WatchedValue) -> Self {
        let bounded = BoundedValue::new(value, min, max);
        let target = bounded.clone();
        device.bind_knob(Knob::CT, move |_, delta| target.inc(delta));
        Self { bounded }
    }

    pub fn get(&self) -> i32 {
        self.bounded.get()
    }

    pub fn set(&self, value: i32) {
        self.bounded.set(value);
    }

    pub fn inc(&self, delta: i32) {
        self.bounded.inc(delta);
    }
}
