use crate::config::Position;
use crate::geometry::Point;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
    /// A secondary finger went down; the panel tracks one pointer only.
    PointerDown,
    PointerUp,
}

/// One sample of the raw pointer stream. `time` is monotonic event time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointer_id: u32,
    pub position: Point,
    pub time: Duration,
}

impl TouchEvent {
    pub fn new(action: TouchAction, position: Point, time: Duration) -> Self {
        Self {
            action,
            pointer_id: 0,
            position,
            time,
        }
    }

    pub fn down(x: f64, y: f64, millis: u64) -> Self {
        Self::new(TouchAction::Down, Point::new(x, y), Duration::from_millis(millis))
    }

    pub fn moved(x: f64, y: f64, millis: u64) -> Self {
        Self::new(TouchAction::Move, Point::new(x, y), Duration::from_millis(millis))
    }

    pub fn up(x: f64, y: f64, millis: u64) -> Self {
        Self::new(TouchAction::Up, Point::new(x, y), Duration::from_millis(millis))
    }

    pub fn cancel(x: f64, y: f64, millis: u64) -> Self {
        Self::new(TouchAction::Cancel, Point::new(x, y), Duration::from_millis(millis))
    }

    pub fn with_pointer(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }

    pub fn ends_gesture(&self) -> bool {
        matches!(self.action, TouchAction::Up | TouchAction::Cancel)
    }
}

/// Posted back to the owner thread by background tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMessage {
    HoldElapsed { generation: u64 },
}

/// Everything that arrives on the host's owner-thread queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Panel(PanelMessage),
    ConfigReload,
}

impl From<PanelMessage> for HostEvent {
    fn from(msg: PanelMessage) -> Self {
        HostEvent::Panel(msg)
    }
}

/// Outbound notifications for the host container, drained with
/// [`crate::Panel::take_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// Ask ancestors to stop (`true`) or resume (`false`) intercepting touches.
    DisallowIntercept(bool),
    SlotClicked(Position),
    Swapped { from: Position, to: Position },
}
