//! Swipe and tap recognition for pointer input.

use std::time::{Duration, Instant};

use engine::app::PointerEvent;

use crate::grid::Direction;

pub const SWIPE_MIN_DISTANCE: f32 = 50.0;
pub const SWIPE_MAX_DURATION: Duration = Duration::from_millis(500);
pub const TAP_MAX_DISTANCE: f32 = 20.0;
pub const TAP_MAX_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Swipe(Direction),
    Tap,
}

/// Classifies a press-to-release displacement. Long or slow drags are neither.
pub fn classify(dx: f32, dy: f32, elapsed: Duration) -> Option<Gesture> {
    let distance = (dx * dx + dy * dy).sqrt();
    if distance >= SWIPE_MIN_DISTANCE && elapsed <= SWIPE_MAX_DURATION {
        return Some(Gesture::Swipe(swipe_direction(dx, dy)));
    }
    if distance < TAP_MAX_DISTANCE && elapsed < TAP_MAX_DURATION {
        return Some(Gesture::Tap);
    }
    None
}

/// Quadrant of the drag angle; y grows downward so positive angles point down.
fn swipe_direction(dx: f32, dy: f32) -> Direction {
    let angle = dy.atan2(dx).to_degrees();
    if (-45.0..=45.0).contains(&angle) {
        Direction::Right
    } else if (45.0..=135.0).contains(&angle) {
        Direction::Down
    } else if angle >= 135.0 || angle <= -135.0 {
        Direction::Left
    } else {
        Direction::Up
    }
}

/// Pairs press and release events into gestures.
#[derive(Debug, Default)]
pub struct GestureTracker {
    pressed: Option<(f32, f32, Instant)>,
}

impl GestureTracker {
    pub fn on_pointer(&mut self, event: PointerEvent) -> Option<Gesture> {
        match event {
            PointerEvent::Pressed { x, y, at } => {
                self.pressed = Some((x, y, at));
                None
            }
            PointerEvent::Released { x, y, at } => {
                let (x0, y0, t0) = self.pressed.take()?;
                classify(x - x0, y - y0, at.saturating_duration_since(t0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swipe_quadrants() {
        let fast = Duration::from_millis(100);
        assert_eq!(classify(80.0, 10.0, fast), Some(Gesture::Swipe(Direction::Right)));
        assert_eq!(classify(-80.0, 10.0, fast), Some(Gesture::Swipe(Direction::Left)));
        assert_eq!(classify(5.0, 80.0, fast), Some(Gesture::Swipe(Direction::Down)));
        assert_eq!(classify(5.0, -80.0, fast), Some(Gesture::Swipe(Direction::Up)));
    }

    #[test]
    fn slow_or_mid_length_drags_are_ignored() {
        assert_eq!(classify(80.0, 0.0, Duration::from_millis(900)), None);
        assert_eq!(classify(30.0, 0.0, Duration::from_millis(100)), None);
        assert_eq!(classify(5.0, 5.0, Duration::from_millis(400)), None);
    }

    #[test]
    fn short_quick_touch_is_a_tap() {
        assert_eq!(classify(3.0, -4.0, Duration::from_millis(120)), Some(Gesture::Tap));
    }

    #[test]
    fn tracker_needs_a_press_before_release() {
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        assert_eq!(
            tracker.on_pointer(PointerEvent::Released { x: 0.0, y: 0.0, at: t0 }),
            None
        );
        tracker.on_pointer(PointerEvent::Pressed { x: 10.0, y: 10.0, at: t0 });
        let got = tracker.on_pointer(PointerEvent::Released {
            x: 10.0,
            y: 90.0,
            at: t0 + Duration::from_millis(200),
        });
        assert_eq!(got, Some(Gesture::Swipe(Direction::Down)));
    }
}
