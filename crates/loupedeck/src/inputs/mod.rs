//! Stateful controls built on top of a [`Device`](crate::Device).
//!
//! Everything here is driven by a [`WatchedValue`]: controls change it, and
//! displays redraw when it changes.

mod gesture;
mod knob;
mod multi_button;
mod touch_dial;
mod watched;
mod widget;

pub use gesture::{
    is_click, watch_dial_gestures, Gesture, GestureTracker, CLICK_MAX_DISTANCE, CLICK_MAX_DURATION,
};
pub use knob::{BoundedValue, DisplayKnob, IntKnob, KNOB_RESET_VALUE};
pub use multi_button::MultiButton;
pub use touch_dial::{DragState, DragTracker, Side, TouchDial};
pub use watched::{WatchedValue, Watcher};
pub use widget::{
    nav_dots, AnalogWidget, NavDot, Widget, WidgetHolder, MAX_WIDGETS, SWIPE_THRESHOLD,
};
