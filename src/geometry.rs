use crate::config::{PanelConfig, Position, SLOT_COUNT};
use std::f64::consts::FRAC_1_SQRT_2;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_center(center: Point, radius: f64) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Slots are square, so the center is derived from the width on both axes.
    pub fn center(&self) -> Point {
        let half = self.width() / 2.0;
        Point::new(self.left + half, self.top + half)
    }

    /// Interior test with all four edges excluded.
    pub fn contains_strict(&self, p: Point) -> bool {
        self.left < p.x && p.x < self.right && self.top < p.y && p.y < self.bottom
    }

    /// Half-open test used when picking the front-most child under a pointer.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    pub fn moved_to(&self, left: f64, top: f64) -> Self {
        Self::new(left, top, left + self.width(), top + self.height())
    }

    /// Scales every edge toward `pivot`, which stays put.
    pub fn scaled_about(&self, pivot: Point, scale: f64) -> Self {
        Self::new(
            pivot.x + (self.left - pivot.x) * scale,
            pivot.y + (self.top - pivot.y) * scale,
            pivot.x + (self.right - pivot.x) * scale,
            pivot.y + (self.bottom - pivot.y) * scale,
        )
    }
}

/// Parent constraint handed to [`crate::Panel::on_measure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureSpec {
    Exactly(f64),
    AtMost(f64),
    Unspecified,
}

/// Pixel radii derived from the dp values in [`PanelConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub layout_radius: f64,
    pub big_radius: f64,
    pub small_radius: f64,
}

impl LayoutMetrics {
    pub fn from_config(cfg: &PanelConfig) -> Self {
        let big_radius = dip_to_px(cfg.big_radius_dp, cfg.density);
        let small_radius = if cfg.uniform_slots {
            big_radius
        } else {
            dip_to_px(cfg.small_radius_dp, cfg.density)
        };

        Self {
            layout_radius: dip_to_px(cfg.layout_radius_dp, cfg.density),
            big_radius,
            small_radius,
        }
    }

    pub fn measured_height(&self) -> f64 {
        self.layout_radius + self.big_radius + self.small_radius
    }

    pub fn natural_width(&self) -> f64 {
        2.0 * (self.layout_radius + self.small_radius)
    }

    pub fn radius_for(&self, position: Position) -> f64 {
        match position {
            Position::LeftTop => self.big_radius,
            _ => self.small_radius,
        }
    }
}

pub fn dip_to_px(dp: f64, density: f64) -> f64 {
    (dp * density + 0.5).floor()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryEntry {
    pub origin: Point,
    pub rect: Rect,
}

/// Resting rectangle of every fixed position for the current layout pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryTable {
    entries: [GeometryEntry; SLOT_COUNT],
}

impl GeometryTable {
    pub fn compute(width: f64, metrics: &LayoutMetrics) -> Self {
        let center = Point::new(width / 2.0, metrics.big_radius);
        let mut entries = [GeometryEntry::default(); SLOT_COUNT];

        for position in Position::iter() {
            let rect = Rect::from_center(
                Self::slot_center(position, center, metrics.layout_radius),
                metrics.radius_for(position),
            );
            entries[position.as_index()] = GeometryEntry {
                origin: rect.origin(),
                rect,
            };
        }

        Self { entries }
    }

    /// The big slot sits on the layout center; the rest ride a half circle below it.
    fn slot_center(position: Position, center: Point, radius: f64) -> Point {
        let diagonal = radius * FRAC_1_SQRT_2;
        match position {
            Position::LeftTop => center,
            Position::RightTop => Point::new(center.x + radius, center.y),
            Position::RightMiddle => Point::new(center.x + diagonal, center.y + diagonal),
            Position::RightBottom => Point::new(center.x, center.y + radius),
            Position::MiddleBottom => Point::new(center.x - diagonal, center.y + diagonal),
            Position::LeftBottom => Point::new(center.x - radius, center.y),
        }
    }

    pub fn entry(&self, position: Position) -> &GeometryEntry {
        &self.entries[position.as_index()]
    }

    pub fn origin(&self, position: Position) -> Point {
        self.entry(position).origin
    }

    pub fn rect(&self, position: Position) -> Rect {
        self.entry(position).rect
    }
}
