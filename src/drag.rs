use crate::events::{TouchAction, TouchEvent};
use crate::geometry::{Point, Rect};
use crate::slot::SlotId;
use thiserror::Error;

/// Callbacks the [`DragController`] uses to see and move the owner's slots.
pub trait DragHost {
    /// Front-most slot whose rect contains `point`.
    fn top_slot_under(&self, point: Point) -> Option<SlotId>;

    fn slot_rect(&self, slot: SlotId) -> Rect;

    /// Capture predicate, evaluated each time a capture is attempted.
    fn try_capture(&mut self, slot: SlotId) -> bool;

    fn clamp_horizontal(&mut self, slot: SlotId, left: f64, dx: f64) -> f64;

    fn clamp_vertical(&mut self, slot: SlotId, top: f64, dy: f64) -> f64;

    fn move_slot(&mut self, slot: SlotId, left: f64, top: f64);

    fn on_position_changed(&mut self, slot: SlotId, left: f64, top: f64, dx: f64, dy: f64);

    fn on_released(&mut self, slot: SlotId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

#[derive(Debug, Error, PartialEq)]
pub enum DragError {
    #[error("{0:?} received with no pointer down")]
    NoActivePointer(TouchAction),
    #[error("Pointer {got} is not the tracked pointer {tracked}")]
    UnknownPointer { got: u32, tracked: u32 },
}

/// Single-pointer capture and drag engine.
///
/// Only the slot under the press can ever be captured. A finger that slides
/// onto another slot does not pick it up.
#[derive(Debug, Clone)]
pub struct DragController {
    touch_slop: f64,
    state: DragState,
    active_pointer: Option<u32>,
    initial: Point,
    last: Point,
    candidate: Option<SlotId>,
    captured: Option<SlotId>,
}

impl DragController {
    /// A higher `sensitivity` shrinks the slop needed before a move captures.
    pub fn new(touch_slop: f64, sensitivity: f64) -> Self {
        Self {
            touch_slop: touch_slop / sensitivity.max(f64::EPSILON),
            state: DragState::Idle,
            active_pointer: None,
            initial: Point::default(),
            last: Point::default(),
            candidate: None,
            captured: None,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    pub fn captured(&self) -> Option<SlotId> {
        self.captured
    }

    /// Watches the stream on behalf of the owner's intercept decision.
    /// Returns whether the controller is dragging.
    pub fn should_intercept(&mut self, event: &TouchEvent, host: &mut impl DragHost) -> bool {
        match event.action {
            TouchAction::Down => self.start_pointer(event, &*host),
            TouchAction::Move => {
                if self.active_pointer == Some(event.pointer_id) {
                    if !self.is_dragging() {
                        self.capture_past_slop(event.position, host);
                    }
                    self.last = event.position;
                }
            }
            TouchAction::Up | TouchAction::Cancel => self.cancel(),
            TouchAction::PointerDown | TouchAction::PointerUp => {}
        }
        self.is_dragging()
    }

    pub fn process(&mut self, event: &TouchEvent, host: &mut impl DragHost) -> Result<(), DragError> {
        match event.action {
            TouchAction::Down => {
                self.start_pointer(event, &*host);
                if let Some(slot) = self.candidate {
                    self.try_capture_for_drag(slot, host);
                }
            }
            TouchAction::Move => {
                self.check_pointer(event)?;
                if self.is_dragging() {
                    let dx = event.position.x - self.last.x;
                    let dy = event.position.y - self.last.y;
                    self.drag_by(dx, dy, host);
                } else {
                    self.capture_past_slop(event.position, host);
                }
                self.last = event.position;
            }
            TouchAction::Up => {
                self.check_pointer(event)?;
                self.release(host);
                self.cancel();
            }
            TouchAction::Cancel => {
                self.release(host);
                self.cancel();
            }
            TouchAction::PointerDown | TouchAction::PointerUp => {}
        }
        Ok(())
    }

    /// Drops all capture state without notifying the host.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
        self.active_pointer = None;
        self.candidate = None;
        self.captured = None;
    }

    fn start_pointer(&mut self, event: &TouchEvent, host: &impl DragHost) {
        self.cancel();
        self.active_pointer = Some(event.pointer_id);
        self.initial = event.position;
        self.last = event.position;
        self.candidate = host.top_slot_under(event.position);
    }

    fn check_pointer(&self, event: &TouchEvent) -> Result<(), DragError> {
        match self.active_pointer {
            None => Err(DragError::NoActivePointer(event.action)),
            Some(tracked) if tracked != event.pointer_id => Err(DragError::UnknownPointer {
                got: event.pointer_id,
                tracked,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Retries the press candidate once the pointer has moved past the slop.
    fn capture_past_slop(&mut self, position: Point, host: &mut impl DragHost) {
        let (dx, dy) = (position.x - self.initial.x, position.y - self.initial.y);
        if dx.hypot(dy) > self.touch_slop
            && let Some(slot) = self.candidate
        {
            self.try_capture_for_drag(slot, host);
        }
    }

    fn try_capture_for_drag(&mut self, slot: SlotId, host: &mut impl DragHost) -> bool {
        if self.is_dragging() && self.captured == Some(slot) {
            return true;
        }
        if host.try_capture(slot) {
            log::debug!("Captured slot {}", slot);
            self.captured = Some(slot);
            self.state = DragState::Dragging;
            true
        } else {
            false
        }
    }

    fn drag_by(&mut self, dx: f64, dy: f64, host: &mut impl DragHost) {
        let Some(slot) = self.captured else {
            return;
        };
        let rect = host.slot_rect(slot);
        let left = host.clamp_horizontal(slot, rect.left + dx, dx);
        let top = host.clamp_vertical(slot, rect.top + dy, dy);

        if left != rect.left || top != rect.top {
            host.move_slot(slot, left, top);
            host.on_position_changed(slot, left, top, left - rect.left, top - rect.top);
        }
    }

    fn release(&mut self, host: &mut impl DragHost) {
        if self.is_dragging()
            && let Some(slot) = self.captured
        {
            host.on_released(slot);
        }
    }
}
