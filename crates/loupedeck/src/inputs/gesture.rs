//! Click/drag recognition on the rotary knob's touch display.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::device::Device;
use crate::protocol::ButtonStatus;

/// Longest touch still counted as a click.
pub const CLICK_MAX_DURATION: Duration = Duration::from_millis(500);

/// Largest movement on either axis still counted as a click.
pub const CLICK_MAX_DISTANCE: i32 = 20;

/// A completed touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Short touch that barely moved, at the release position.
    Click { x: u16, y: u16 },
    /// Anything else. `dx`/`dy` are the displacement from the start of the
    /// touch; negative is up and to the left.
    Drag { dx: i32, dy: i32 },
}

pub fn is_click(elapsed: Duration, dx: i32, dy: i32) -> bool {
    elapsed <= CLICK_MAX_DURATION
        && (-CLICK_MAX_DISTANCE..=CLICK_MAX_DISTANCE).contains(&dx)
        && (-CLICK_MAX_DISTANCE..=CLICK_MAX_DISTANCE).contains(&dy)
}

#[derive(Debug, Clone, Copy)]
struct TouchStart {
    x: u16,
    y: u16,
    at: Instant,
}

/// Turns a stream of touch down/up reports into gestures.
///
/// The device repeats touch-down while a finger moves; only the first one
/// of a touch matters here.
#[derive(Debug, Default)]
pub struct GestureTracker {
    start: Option<TouchStart>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }

    /// Feed one touch report. Returns a gesture when a touch ends.
    pub fn touch(&mut self, status: ButtonStatus, x: u16, y: u16, now: Instant) -> Option<Gesture> {
        match (status, self.start) {
            (ButtonStatus::Down, None) => {
                self.start = Some(TouchStart { x, y, at: now });
                None
            }
            (ButtonStatus::Down, Some(_)) => None,
            (ButtonStatus::Up, None) => {
                tracing::warn!(x, y, "dial touch released without a press");
                None
            }
            (ButtonStatus::Up, Some(start)) => {
                self.start = None;
                let elapsed = now.saturating_duration_since(start.at);
                let dx = i32::from(x) - i32::from(start.x);
                let dy = i32::from(y) - i32::from(start.y);
                tracing::debug!(dx, dy, ?elapsed, "dial touch finished");

                if is_click(elapsed, dx, dy) {
                    Some(Gesture::Click { x, y })
                } else {
                    Some(Gesture::Drag { dx, dy })
                }
            }
        }
    }
}

/// Report gestures on the rotary display to `handler`.
///
/// Takes over the device's dial touch binding; calling it again replaces
/// the previous handler.
pub fn watch_dial_gestures<F>(device: &Device, handler: F)
where
    F: Fn(Gesture) + Send + Sync + 'static,
{
    let tracker = Mutex::new(GestureTracker::new());
    device.bind_dial_touch(move |status, x, y| {
        let gesture = tracker.lock().touch(status, x, y, Instant::now());
        if let Some(gesture) = gesture {
            handler(gesture);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(from: (u16, u16), to: (u16, u16), elapsed_ms: u64) -> Option<Gesture> {
        let start = Instant::now();
        let mut tracker = GestureTracker::new();
        assert!(tracker
            .touch(ButtonStatus::Down, from.0, from.1, start)
            .is_none());
        tracker.touch(
            ButtonStatus::Up,
            to.0,
            to.1,
            start + Duration::from_millis(elapsed_ms),
        )
    }

    #[test]
    fn test_short_small_touch_is_click() {
        assert_eq!(
            run((100, 100), (105, 97), 300),
            Some(Gesture::Click { x: 105, y: 97 })
        );
    }

    #[test]
    fn test_slow_touch_is_drag() {
        assert_eq!(
            run((100, 100), (105, 97), 600),
            Some(Gesture::Drag { dx: 5, dy: -3 })
        );
    }

    #[test]
    fn test_long_move_is_drag() {
        assert_eq!(
            run((100, 100), (125, 100), 100),
            Some(Gesture::Drag { dx: 25, dy: 0 })
        );
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert!(is_click(Duration::from_millis(500), 20, -20));
        assert!(!is_click(Duration::from_millis(501), 0, 0));
        assert!(!is_click(Duration::ZERO, 21, 0));
        assert!(!is_click(Duration::ZERO, 0, -21));
    }

    #[test]
    fn test_repeated_down_keeps_first_position() {
        let start = Instant::now();
        let mut tracker = GestureTracker::new();
        tracker.touch(ButtonStatus::Down, 200, 50, start);
        tracker.touch(ButtonStatus::Down, 150, 50, start);
        tracker.touch(ButtonStatus::Down, 100, 50, start);
        let gesture = tracker.touch(ButtonStatus::Up, 100, 55, start);
        assert_eq!(gesture, Some(Gesture::Drag { dx: -100, dy: 5 }));
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn test_stray_release_is_ignored() {
        let mut tracker = GestureTracker::new();
        assert!(tracker
            .touch(ButtonStatus::Up, 1, 1, Instant::now())
            .is_none());
        assert!(!tracker.is_tracking());
    }
}
