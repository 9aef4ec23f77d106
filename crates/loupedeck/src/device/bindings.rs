//! Per-session input binding tables.
//!
//! One optional handler per control and edge. Handlers are cloned out of
//! the table before they run, so a handler may rebind controls (including
//! itself) without deadlocking the dispatcher.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::protocol::{Button, ButtonStatus, Knob, TouchZone};

pub type ButtonHandler = Arc<dyn Fn(Button, ButtonStatus) + Send + Sync>;
pub type KnobHandler = Arc<dyn Fn(Knob, i32) + Send + Sync>;
/// Called with the zone, the edge and the panel coordinates of the touch.
pub type TouchHandler = Arc<dyn Fn(TouchZone, ButtonStatus, u16, u16) + Send + Sync>;
/// Touches on the rotary knob's display, in dial coordinates.
pub type DialTouchHandler = Arc<dyn Fn(ButtonStatus, u16, u16) + Send + Sync>;

struct Table<K, H> {
    handlers: RwLock<HashMap<K, H>>,
}

impl<K: Eq + Hash, H: Clone> Table<K, H> {
    fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    fn set(&self, key: K, handler: H) {
        self.handlers.write().insert(key, handler);
    }

    fn remove(&self, key: &K) {
        self.handlers.write().remove(key);
    }

    fn get(&self, key: &K) -> Option<H> {
        self.handlers.read().get(key).cloned()
    }

    fn clear(&self) {
        self.handlers.write().clear();
    }
}

pub(crate) struct Bindings {
    buttons: Table<(Button, ButtonStatus), ButtonHandler>,
    knobs: Table<Knob, KnobHandler>,
    touches: Table<(TouchZone, ButtonStatus), TouchHandler>,
    dial_touch: RwLock<Option<DialTouchHandler>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self {
            buttons: Table::new(),
            knobs: Table::new(),
            touches: Table::new(),
            dial_touch: RwLock::new(None),
        }
    }

    pub fn bind_button(&self, button: Button, status: ButtonStatus, handler: ButtonHandler) {
        self.buttons.set((button, status), handler);
    }

    pub fn unbind_button(&self, button: Button, status: ButtonStatus) {
        self.buttons.remove(&(button, status));
    }

    pub fn button(&self, button: Button, status: ButtonStatus) -> Option<ButtonHandler> {
        self.buttons.get(&(button, status))
    }

    pub fn bind_knob(&self, knob: Knob, handler: KnobHandler) {
        self.knobs.set(knob, handler);
    }

    pub fn unbind_knob(&self, knob: Knob) {
        self.knobs.remove(&knob);
    }

    pub fn knob(&self, knob: Knob) -> Option<KnobHandler> {
        self.knobs.get(&knob)
    }

    pub fn bind_touch(&self, zone: TouchZone, status: ButtonStatus, handler: TouchHandler) {
        self.touches.set((zone, status), handler);
    }

    pub fn unbind_touch(&self, zone: TouchZone, status: ButtonStatus) {
        self.touches.remove(&(zone, status));
    }

    pub fn touch(&self, zone: TouchZone, status: ButtonStatus) -> Option<TouchHandler> {
        self.touches.get(&(zone, status))
    }

    pub fn bind_dial_touch(&self, handler: Option<DialTouchHandler>) {
        *self.dial_touch.write() = handler;
    }

    pub fn dial_touch(&self) -> Option<DialTouchHandler> {
        self.dial_touch.read().clone()
    }

    /// Drop every handler. Handlers usually capture a device handle, so
    /// this is what breaks the reference cycle on close.
    pub fn clear(&self) {
        self.buttons.clear();
        self.knobs.clear();
        self.touches.clear();
        *self.dial_touch.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_edges_are_separate() {
        let bindings = Bindings::new();
        bindings.bind_button(Button::CIRCLE, ButtonStatus::Down, Arc::new(|_, _| {}));

        assert!(bindings.button(Button::CIRCLE, ButtonStatus::Down).is_some());
        assert!(bindings.button(Button::CIRCLE, ButtonStatus::Up).is_none());
        assert!(bindings.button(Button::BUTTON_1, ButtonStatus::Down).is_none());
    }

    #[test]
    fn test_handler_can_rebind_itself() {
        let bindings = Arc::new(Bindings::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let inner = bindings.clone();
        let counter = calls.clone();
        bindings.bind_knob(
            Knob::CT,
            Arc::new(move |knob, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                inner.bind_knob(knob, Arc::new(|_, _| {}));
            }),
        );

        let handler = bindings.knob(Knob::CT).unwrap();
        handler(Knob::CT, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The replacement no longer counts.
        bindings.knob(Knob::CT).unwrap()(Knob::CT, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear() {
        let bindings = Bindings::new();
        bindings.bind_touch(TouchZone::TOUCH_1, ButtonStatus::Up, Arc::new(|_, _, _, _| {}));
        bindings.bind_dial_touch(Some(Arc::new(|_, _, _| {})));
        bindings.clear();
        assert!(bindings.touch(TouchZone::TOUCH_1, ButtonStatus::Up).is_none());
        assert!(bindings.dial_touch().is_none());
    }
}
