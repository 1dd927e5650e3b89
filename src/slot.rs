use crate::config::Position;
use crate::geometry::{GeometryTable, Point, Rect, Size};
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stable identity of a slot; never changes when slots swap positions.
///
/// Only the panel hands these out, so every id indexes a real slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Deref)]
pub struct SlotId(usize);

impl SlotId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Deref, From, Into, AsRef)]
#[serde(transparent)]
pub struct ImagePath(PathBuf);

crate::impl_newtype!(ImagePath, PathBuf);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotPhase {
    #[default]
    Idle,
    /// Pressed long enough (or moved far enough) to show it can be dragged.
    Ready,
}

#[derive(Debug, Clone)]
pub struct Slot {
    id: SlotId,
    position: Position,
    content: Option<ImagePath>,
    rect: Rect,
    anchor: Option<Point>,
    phase: SlotPhase,
    dragging: bool,
    ready_scale: f64,
}

impl Slot {
    pub fn new(id: SlotId, position: Position, ready_scale: f64) -> Self {
        Self {
            id,
            position,
            content: None,
            rect: Rect::default(),
            anchor: None,
            phase: SlotPhase::Idle,
            dragging: false,
            ready_scale,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn content(&self) -> Option<&ImagePath> {
        self.content.as_ref()
    }

    pub fn is_draggable(&self) -> bool {
        self.content.is_some()
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn phase(&self) -> SlotPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_ready_scale(&mut self, ready_scale: f64) {
        self.ready_scale = ready_scale;
    }

    pub fn scale(&self) -> f64 {
        match self.phase {
            SlotPhase::Idle => 1.0,
            SlotPhase::Ready => self.ready_scale,
        }
    }

    /// Point the ready scale shrinks toward: the saved anchor, or the center.
    pub fn scale_pivot(&self) -> Point {
        match self.anchor {
            Some(anchor) => Point::new(self.rect.left + anchor.x, self.rect.top + anchor.y),
            None => self.rect.center(),
        }
    }

    /// Where the slot is drawn, after the ready scale.
    pub fn display_rect(&self) -> Rect {
        self.rect.scaled_about(self.scale_pivot(), self.scale())
    }

    pub fn layout(&mut self, table: &GeometryTable) {
        self.rect = table.rect(self.position);
    }

    /// Reassigns the slot to `position`. A slot under the finger keeps its
    /// on-screen rect and only snaps there on release.
    pub fn switch_position(&mut self, position: Position, table: &GeometryTable) {
        self.position = position;
        if !self.dragging {
            self.rect = table.rect(position);
        }
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn move_to(&mut self, left: f64, top: f64) {
        self.rect = self.rect.moved_to(left, top);
    }

    pub fn compute_dragging_x(&self, dx: f64, bounds: Size) -> f64 {
        let max_left = (bounds.width - self.rect.width()).max(0.0);
        (self.rect.left + dx).clamp(0.0, max_left)
    }

    pub fn compute_dragging_y(&self, dy: f64, bounds: Size) -> f64 {
        let max_top = (bounds.height - self.rect.height()).max(0.0);
        (self.rect.top + dy).clamp(0.0, max_top)
    }

    pub fn on_drag_release(&mut self, table: &GeometryTable) {
        self.dragging = false;
        self.phase = SlotPhase::Idle;
        self.anchor = None;
        self.rect = table.rect(self.position);
    }

    /// Returns `false` when the slot is empty or already showing the ready state.
    pub fn start_anchor_animation(&mut self) -> bool {
        if !self.is_draggable() || self.phase == SlotPhase::Ready {
            return false;
        }
        log::debug!("Slot {} at {} is ready to drag", self.id, self.position);
        self.phase = SlotPhase::Ready;
        true
    }

    pub fn save_anchor_info(&mut self, x: f64, y: f64) {
        self.anchor = Some(Point::new(x - self.rect.left, y - self.rect.top));
    }

    pub fn fill_image_view(&mut self, path: ImagePath) {
        self.content = Some(path);
    }

    pub fn clear_image(&mut self) -> Option<ImagePath> {
        self.content.take()
    }
}
