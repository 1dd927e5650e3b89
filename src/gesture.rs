use crate::events::{TouchAction, TouchEvent};
use crate::geometry::Point;

/// Tells a drag apart from a tap by how far the finger travelled since the press.
///
/// Long press is never reported; holding is handled by the hold timer instead.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    touch_slop: f64,
    down: Option<Point>,
}

impl GestureClassifier {
    pub fn new(touch_slop: f64) -> Self {
        Self {
            touch_slop,
            down: None,
        }
    }

    /// Returns whether this event shows drag motion.
    pub fn on_touch_event(&mut self, event: &TouchEvent) -> bool {
        match event.action {
            TouchAction::Down => {
                self.down = Some(event.position);
                false
            }
            TouchAction::Move => self.down.is_some_and(|down| {
                exceeds_slop(
                    event.position.x - down.x,
                    event.position.y - down.y,
                    self.touch_slop,
                )
            }),
            TouchAction::Up | TouchAction::Cancel => {
                self.down = None;
                false
            }
            TouchAction::PointerDown | TouchAction::PointerUp => false,
        }
    }
}

pub fn exceeds_slop(dx: f64, dy: f64, slop: f64) -> bool {
    dx.abs() + dy.abs() > slop
}
