use crate::config::{Config, PanelConfig, Position, SLOT_COUNT};
use crate::drag::DragController;
use crate::events::{HostEvent, PanelEvent, PanelMessage};
use crate::geometry::{GeometryTable, LayoutMetrics, MeasureSpec, Point, Size};
use crate::gesture::GestureClassifier;
use crate::hold::HoldTimer;
use crate::slot::{Slot, SlotId};
use async_channel::Sender;
use std::time::Duration;
use tokio::runtime::Handle;

mod arrange;
mod touch;

/// Per-gesture state, alive from a press to its release or cancel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchSession {
    pub down_point: Option<Point>,
    pub down_time: Option<Duration>,
    pub dragged: Option<SlotId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TouchTarget {
    #[default]
    None,
    /// The slot under the press owns the gesture until the panel intercepts.
    Child(SlotId),
    Panel,
}

/// Six-slot drag-to-swap panel.
///
/// All methods run on the owner thread. Background work (the hold timer)
/// reaches the panel only through [`Panel::handle_message`].
pub struct Panel {
    metrics: LayoutMetrics,
    intercept_time_slop: Duration,
    slots: [Slot; SLOT_COUNT],
    z_order: Vec<SlotId>,
    geometry: GeometryTable,
    bounds: Size,
    drag: DragController,
    classifier: GestureClassifier,
    hold: HoldTimer,
    session: TouchSession,
    target: TouchTarget,
    events: Vec<PanelEvent>,
}

impl Panel {
    pub fn new(config: &PanelConfig, runtime: Handle, tx: Sender<HostEvent>) -> Self {
        let slots = std::array::from_fn(|i| {
            Slot::new(SlotId::new(i), Position::ALL[i], config.ready_scale)
        });

        Self {
            metrics: LayoutMetrics::from_config(config),
            intercept_time_slop: Duration::from_millis(config.intercept_time_slop_ms),
            slots,
            z_order: (0..SLOT_COUNT).map(SlotId::new).collect(),
            geometry: GeometryTable::default(),
            bounds: Size::default(),
            drag: DragController::new(config.touch_slop, config.drag_sensitivity),
            classifier: GestureClassifier::new(config.touch_slop),
            hold: HoldTimer::new(
                runtime,
                tx,
                Duration::from_millis(config.hold_delay_ms),
            ),
            session: TouchSession::default(),
            target: TouchTarget::None,
            events: Vec::new(),
        }
    }

    /// Builds a panel and seeds slot images from the config's slot list.
    pub fn from_config(config: &Config, runtime: Handle, tx: Sender<HostEvent>) -> Self {
        let mut panel = Self::new(&config.panel, runtime, tx);

        config
            .slots
            .iter()
            .filter_map(|cfg| cfg.position.zip(cfg.image.clone()))
            .for_each(|(position, image)| {
                panel.fill_item_image(position, image, true);
            });

        panel
    }

    /// Applies new tunables. Any gesture in progress is abandoned and its
    /// slot snaps home.
    pub fn reconfigure(&mut self, config: &PanelConfig) {
        self.on_release();
        self.reset_session();
        self.metrics = LayoutMetrics::from_config(config);
        self.intercept_time_slop = Duration::from_millis(config.intercept_time_slop_ms);
        self.drag = DragController::new(config.touch_slop, config.drag_sensitivity);
        self.classifier = GestureClassifier::new(config.touch_slop);
        self.hold.set_delay(Duration::from_millis(config.hold_delay_ms));
        for slot in &mut self.slots {
            slot.set_ready_scale(config.ready_scale);
        }
        self.on_layout(self.bounds);
    }

    pub fn on_measure(&self, width: MeasureSpec, _height: MeasureSpec) -> Size {
        let width = match width {
            MeasureSpec::Exactly(w) | MeasureSpec::AtMost(w) => w,
            MeasureSpec::Unspecified => self.metrics.natural_width(),
        };
        Size::new(width, self.metrics.measured_height())
    }

    pub fn on_layout(&mut self, bounds: Size) {
        self.bounds = bounds;
        self.geometry = GeometryTable::compute(bounds.width, &self.metrics);
        for slot in &mut self.slots {
            slot.layout(&self.geometry);
        }
        log::debug!("Laid out panel at {:?}", bounds);
    }

    pub fn handle_message(&mut self, msg: PanelMessage) {
        match msg {
            PanelMessage::HoldElapsed { generation } => {
                if !self.hold.accept(generation) {
                    return;
                }
                if let Some(id) = self.session.dragged {
                    self.slots[*id].start_anchor_animation();
                }
            }
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[*id]
    }

    pub fn slot_at(&self, position: Position) -> Option<&Slot> {
        self.slot_id_at(position).map(|id| self.slot(id))
    }

    /// Assigned position of every slot, indexed by slot id.
    pub fn positions(&self) -> [Position; SLOT_COUNT] {
        std::array::from_fn(|i| self.slots[i].position())
    }

    pub fn is_permutation(&self) -> bool {
        let mut positions = self.positions();
        positions.sort();
        positions == Position::ALL
    }

    pub fn occupied_positions(&self) -> Vec<Position> {
        Position::ALL
            .into_iter()
            .filter(|&p| self.slot_at(p).is_some_and(Slot::is_draggable))
            .collect()
    }

    pub fn geometry(&self) -> &GeometryTable {
        &self.geometry
    }

    /// Back to front.
    pub fn z_order(&self) -> &[SlotId] {
        &self.z_order
    }

    pub fn dragged(&self) -> Option<SlotId> {
        self.session.dragged
    }

    pub fn session(&self) -> &TouchSession {
        &self.session
    }

    pub fn is_hold_pending(&self) -> bool {
        self.hold.is_pending()
    }

    pub fn take_events(&mut self) -> Vec<PanelEvent> {
        std::mem::take(&mut self.events)
    }

    fn slot_id_at(&self, position: Position) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|s| s.position() == position)
            .map(Slot::id)
    }

    /// Slot whose rect strictly contains `point`, scanning in position order.
    fn position_under(&self, point: Point) -> Option<Position> {
        Position::ALL.into_iter().find(|&p| {
            self.slot_at(p)
                .is_some_and(|s| s.rect().contains_strict(point))
        })
    }

    fn bring_to_front(&mut self, id: SlotId) {
        if self.z_order.last() != Some(&id) {
            self.z_order.retain(|&z| z != id);
            self.z_order.push(id);
        }
    }

    fn reset_session(&mut self) {
        self.session = TouchSession::default();
        self.target = TouchTarget::None;
        self.drag.cancel();
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::slot::{ImagePath, SlotPhase};

    #[tokio::test]
    async fn test_measure_uses_fixed_height() {
        let (panel, _rx) = panel();
        assert_eq!(
            panel.on_measure(MeasureSpec::Exactly(400.0), MeasureSpec::Unspecified),
            Size::new(400.0, 180.0)
        );
        assert_eq!(
            panel.on_measure(MeasureSpec::AtMost(320.0), MeasureSpec::Exactly(999.0)),
            Size::new(320.0, 180.0)
        );
        assert_eq!(
            panel.on_measure(MeasureSpec::Unspecified, MeasureSpec::Unspecified),
            Size::new(280.0, 180.0)
        );
    }

    #[tokio::test]
    async fn test_layout_places_every_slot_on_its_entry() {
        let (panel, _rx) = panel();
        for slot in panel.slots() {
            assert_eq!(slot.rect(), panel.geometry().rect(slot.position()));
        }
        assert!(panel.is_permutation());
    }

    #[tokio::test]
    async fn test_handed_out_ids_index_their_slots() {
        let (panel, _rx) = panel();
        assert_eq!(panel.z_order().len(), SLOT_COUNT);
        for &id in panel.z_order() {
            assert_eq!(panel.slot(id).id(), id);
        }
    }

    #[tokio::test]
    async fn test_from_config_seeds_images() {
        let (tx, _rx) = async_channel::unbounded();
        let config = Config {
            panel: PanelConfig::default(),
            slots: vec![crate::config::SlotConfig {
                position: Some(Position::RightBottom),
                image: Some(ImagePath::new("seed.png")),
            }],
        };
        let panel = Panel::from_config(&config, Handle::current(), tx);
        assert_eq!(panel.occupied_positions(), vec![Position::RightBottom]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_promotes_pressed_slot() {
        let (mut panel, rx) = filled(1);
        let start = tokio::time::Instant::now();
        let press = center_of(&panel, Position::LeftTop);
        panel.dispatch_touch_event(&crate::events::TouchEvent::down(press.x, press.y, 0));
        assert!(panel.is_hold_pending());

        let HostEvent::Panel(msg) = rx.recv().await.unwrap() else {
            panic!("expected a panel message");
        };
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(210));

        panel.handle_message(msg);
        let id = panel.dragged().unwrap();
        assert_eq!(panel.slot(id).phase(), SlotPhase::Ready);
    }

    #[tokio::test]
    async fn test_stale_hold_message_is_ignored() {
        let (mut panel, _rx) = filled(1);
        panel.handle_message(PanelMessage::HoldElapsed { generation: 42 });
        assert!(
            panel
                .slots()
                .iter()
                .all(|s| s.phase() == SlotPhase::Idle)
        );
    }

    #[tokio::test]
    async fn test_reconfigure_relayouts() {
        let (mut panel, _rx) = panel();
        panel.reconfigure(&PanelConfig {
            density: 2.0,
            ..PanelConfig::default()
        });
        assert_eq!(
            panel.on_measure(MeasureSpec::Exactly(400.0), MeasureSpec::Unspecified),
            Size::new(400.0, 360.0)
        );
        assert_eq!(panel.slot_at(Position::LeftTop).unwrap().rect().width(), 160.0);
    }
}
