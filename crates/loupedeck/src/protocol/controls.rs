//! Physical control identifiers.
//!
//! # Layout (Loupedeck Live)
//!
//! ```text
//!  Knob1 ┌──────┬────┬────┬────┬────┬───────┐ Knob4
//!  Knob2 │ Left │ T1 │ T2 │ T3 │ T4 │ Right │ Knob5
//!  Knob3 │      │ T5 │ T6 │ T7 │ T8 │       │ Knob6
//!        │      │ T9 │T10 │T11 │T12 │       │
//!        └──────┴────┴────┴────┴────┴───────┘
//!    Circle  B1  B2  B3  B4  B5  B6  B7
//! ```
//!
//! Touch zones T1-T12 are 90x90 pixels; the side strips are 60 pixels wide.

/// A physical push button, including the click action of each knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Button(pub u16);

impl Button {
    // Knob clicks share IDs with the knobs themselves.
    pub const KNOB_PRESS_1: Button = Button(1);
    pub const KNOB_PRESS_2: Button = Button(2);
    pub const KNOB_PRESS_3: Button = Button(3);
    pub const KNOB_PRESS_4: Button = Button(4);
    pub const KNOB_PRESS_5: Button = Button(5);
    pub const KNOB_PRESS_6: Button = Button(6);

    /// Leftmost button under the display. Labelled "1" on the CT.
    pub const CIRCLE: Button = Button(7);
    pub const BUTTON_1: Button = Button(8);
    pub const BUTTON_2: Button = Button(9);
    pub const BUTTON_3: Button = Button(10);
    pub const BUTTON_4: Button = Button(11);
    pub const BUTTON_5: Button = Button(12);
    pub const BUTTON_6: Button = Button(13);
    pub const BUTTON_7: Button = Button(14);
}

impl From<Knob> for Button {
    fn from(knob: Knob) -> Self {
        Button(knob.0)
    }
}

/// Edge reported with a button or touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonStatus {
    Down,
    Up,
}

impl ButtonStatus {
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Down),
            1 => Some(Self::Up),
            _ => None,
        }
    }
}

/// A rotary knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Knob(pub u16);

impl Knob {
    /// The large knob with an embedded display on CT models.
    pub const CT: Knob = Knob(0);
    pub const KNOB_1: Knob = Knob(1);
    pub const KNOB_2: Knob = Knob(2);
    pub const KNOB_3: Knob = Knob(3);
    pub const KNOB_4: Knob = Knob(4);
    pub const KNOB_5: Knob = Knob(5);
    pub const KNOB_6: Knob = Knob(6);
}

/// Logical region of the main touch surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TouchZone(pub u16);

/// Width of the left and right touch strips.
pub const SIDE_STRIP_WIDTH: u16 = 60;

/// X coordinate where the right strip begins.
pub const RIGHT_STRIP_START: u16 = 420;

/// Edge length of one square touch key.
pub const TOUCH_KEY_SIZE: u16 = 90;

/// Touch keys per row.
pub const TOUCH_COLUMNS: u16 = 4;

impl TouchZone {
    pub const LEFT: TouchZone = TouchZone(1);
    pub const RIGHT: TouchZone = TouchZone(2);
    pub const TOUCH_1: TouchZone = TouchZone(3);
    pub const TOUCH_2: TouchZone = TouchZone(4);
    pub const TOUCH_3: TouchZone = TouchZone(5);
    pub const TOUCH_4: TouchZone = TouchZone(6);
    pub const TOUCH_5: TouchZone = TouchZone(7);
    pub const TOUCH_6: TouchZone = TouchZone(8);
    pub const TOUCH_7: TouchZone = TouchZone(9);
    pub const TOUCH_8: TouchZone = TouchZone(10);
    pub const TOUCH_9: TouchZone = TouchZone(11);
    pub const TOUCH_10: TouchZone = TouchZone(12);
    pub const TOUCH_11: TouchZone = TouchZone(13);
    pub const TOUCH_12: TouchZone = TouchZone(14);

    /// Zone under a panel-absolute touch coordinate.
    ///
    /// Works on the full 480-pixel-wide panel. Callers holding coordinates
    /// relative to an offset display must add the offset first.
    pub const fn from_coords(x: u16, y: u16) -> Self {
        if x < SIDE_STRIP_WIDTH {
            return Self::LEFT;
        }
        if x >= RIGHT_STRIP_START {
            return Self::RIGHT;
        }
        let column = (x - SIDE_STRIP_WIDTH) / TOUCH_KEY_SIZE;
        let row = y / TOUCH_KEY_SIZE;
        TouchZone(Self::TOUCH_1.0 + column + TOUCH_COLUMNS * row)
    }

    /// Top-left pixel of a touch key within the "main" display.
    pub const fn main_origin(self) -> Option<(u16, u16)> {
        if self.0 < Self::TOUCH_1.0 || self.0 > Self::TOUCH_12.0 {
            return None;
        }
        let index = self.0 - Self::TOUCH_1.0;
        Some((
            (index % TOUCH_COLUMNS) * TOUCH_KEY_SIZE,
            (index / TOUCH_COLUMNS) * TOUCH_KEY_SIZE,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        assert_eq!(TouchZone::from_coords(0, 0), TouchZone::LEFT);
        assert_eq!(TouchZone::from_coords(59, 269), TouchZone::LEFT);
        assert_eq!(TouchZone::from_coords(420, 0), TouchZone::RIGHT);
        assert_eq!(TouchZone::from_coords(425, 0), TouchZone::RIGHT);
    }

    #[test]
    fn test_grid() {
        assert_eq!(TouchZone::from_coords(60, 0), TouchZone::TOUCH_1);
        assert_eq!(TouchZone::from_coords(149, 0), TouchZone::TOUCH_1);
        assert_eq!(TouchZone::from_coords(150, 0), TouchZone::TOUCH_2);
        assert_eq!(TouchZone::from_coords(60, 90), TouchZone::TOUCH_5);
        assert_eq!(TouchZone::from_coords(60, 180), TouchZone::TOUCH_9);
        assert_eq!(TouchZone::from_coords(419, 269), TouchZone::TOUCH_12);
    }

    #[test]
    fn test_main_origin() {
        assert_eq!(TouchZone::TOUCH_1.main_origin(), Some((0, 0)));
        assert_eq!(TouchZone::TOUCH_4.main_origin(), Some((270, 0)));
        assert_eq!(TouchZone::TOUCH_6.main_origin(), Some((90, 90)));
        assert_eq!(TouchZone::TOUCH_12.main_origin(), Some((270, 180)));
        assert_eq!(TouchZone::LEFT.main_origin(), None);
        assert_eq!(TouchZone(15).main_origin(), None);
    }

    #[test]
    fn test_origin_maps_back_to_zone() {
        for zone in 3..=14 {
            let zone = TouchZone(zone);
            let (x, y) = zone.main_origin().unwrap();
            assert_eq!(TouchZone::from_coords(x + SIDE_STRIP_WIDTH, y), zone);
        }
    }

    #[test]
    fn test_button_status_from_wire() {
        assert_eq!(ButtonStatus::from_wire(0), Some(ButtonStatus::Down));
        assert_eq!(ButtonStatus::from_wire(1), Some(ButtonStatus::Up));
        assert_eq!(ButtonStatus::from_wire(2), None);
    }
}
