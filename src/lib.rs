pub mod macros;

pub mod config;
pub mod drag;
pub mod events;
pub mod geometry;
pub mod gesture;
pub mod hold;
pub mod panel;
pub mod slot;

pub use config::{Config, PanelConfig, Position};
pub use events::{PanelEvent, PanelMessage, TouchAction, TouchEvent};
pub use geometry::{GeometryTable, MeasureSpec, Point, Rect, Size};
pub use panel::Panel;
pub use slot::{ImagePath, Slot, SlotId, SlotPhase};
