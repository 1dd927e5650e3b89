use super::arrange::switch_position_if_needed;
use super::{Panel, TouchSession, TouchTarget};
use crate::config::SLOT_COUNT;
use crate::drag::{DragController, DragHost};
use crate::events::{PanelEvent, TouchAction, TouchEvent};
use crate::geometry::{GeometryTable, Point, Rect, Size};
use crate::slot::{Slot, SlotId};

/// The panel's slots as seen by the drag controller during one event.
struct SlotHost<'a> {
    slots: &'a mut [Slot; SLOT_COUNT],
    z_order: &'a [SlotId],
    geometry: &'a GeometryTable,
    bounds: Size,
    dragged: &'a mut Option<SlotId>,
    events: &'a mut Vec<PanelEvent>,
}

impl DragHost for SlotHost<'_> {
    fn top_slot_under(&self, point: Point) -> Option<SlotId> {
        top_slot_under(&self.slots[..], self.z_order, point)
    }

    fn slot_rect(&self, slot: SlotId) -> Rect {
        self.slots[*slot].rect()
    }

    fn try_capture(&mut self, slot: SlotId) -> bool {
        *self.dragged = Some(slot);
        let item = &mut self.slots[*slot];
        if item.is_draggable() {
            item.begin_drag();
            true
        } else {
            false
        }
    }

    fn clamp_horizontal(&mut self, slot: SlotId, _left: f64, dx: f64) -> f64 {
        self.slots[*slot].compute_dragging_x(dx, self.bounds)
    }

    fn clamp_vertical(&mut self, slot: SlotId, _top: f64, dy: f64) -> f64 {
        self.slots[*slot].compute_dragging_y(dy, self.bounds)
    }

    fn move_slot(&mut self, slot: SlotId, left: f64, top: f64) {
        self.slots[*slot].move_to(left, top);
    }

    fn on_position_changed(&mut self, slot: SlotId, _left: f64, _top: f64, _dx: f64, _dy: f64) {
        // swaps move other slots too; only the finger's slot resolves swaps
        if *self.dragged != Some(slot) {
            return;
        }
        if let Some((from, to)) = switch_position_if_needed(self.slots, self.geometry, slot) {
            self.events.push(PanelEvent::Swapped { from, to });
        }
    }

    fn on_released(&mut self, slot: SlotId) {
        self.slots[*slot].on_drag_release(self.geometry);
    }
}

fn top_slot_under(slots: &[Slot], z_order: &[SlotId], point: Point) -> Option<SlotId> {
    z_order
        .iter()
        .rev()
        .copied()
        .find(|id| slots[**id].rect().contains(point))
}

impl Panel {
    /// Entry point for the raw pointer stream. Always consumes the event.
    pub fn dispatch_touch_event(&mut self, event: &TouchEvent) -> bool {
        match event.action {
            TouchAction::Down => self.on_press(event),
            TouchAction::Up | TouchAction::Cancel => self.on_release(),
            _ => {}
        }

        let handled = self.route(event);

        if event.ends_gesture() {
            self.reset_session();
        }
        handled
    }

    /// Decides whether the panel steals the gesture from the touched slot.
    pub fn on_intercept_touch_event(&mut self, event: &TouchEvent) -> bool {
        if let Some(down_time) = self.session.down_time
            && event.time.saturating_sub(down_time) > self.intercept_time_slop
        {
            return true;
        }

        let should_intercept = {
            let (drag, mut host) = self.split_for_drag();
            let should_intercept = drag.should_intercept(event, &mut host);
            if event.action == TouchAction::Down
                && let Err(e) = drag.process(event, &mut host)
            {
                log::warn!("Ignoring press: {}", e);
            }
            should_intercept
        };

        let moving = self.classifier.on_touch_event(event);
        if moving {
            if self.hold.cancel() {
                log::debug!("Drag motion cancelled the hold timer");
            }
            if let Some(id) = self.session.dragged
                && self.slots[*id].is_draggable()
            {
                self.slots[*id].start_anchor_animation();
            }
        }

        should_intercept && moving
    }

    pub fn on_touch_event(&mut self, event: &TouchEvent) -> bool {
        let (drag, mut host) = self.split_for_drag();
        if let Err(e) = drag.process(event, &mut host) {
            log::warn!("Ignoring touch event: {}", e);
        }
        true
    }

    fn on_press(&mut self, event: &TouchEvent) {
        let down = event.position;
        // a press without a release in between still ends the old gesture
        self.on_release();
        self.session = TouchSession {
            down_point: Some(down),
            down_time: Some(event.time),
            dragged: None,
        };

        let Some(id) = self
            .position_under(down)
            .and_then(|position| self.slot_id_at(position))
        else {
            return;
        };

        self.bring_to_front(id);

        if !self.slots[*id].is_draggable() {
            self.events.push(PanelEvent::DisallowIntercept(false));
            return;
        }
        self.events.push(PanelEvent::DisallowIntercept(true));

        self.slots[*id].save_anchor_info(down.x, down.y);
        self.hold.arm();
    }

    pub(super) fn on_release(&mut self) {
        if let Some(id) = self.session.dragged.take() {
            self.slots[*id].on_drag_release(&self.geometry);
        }
        self.hold.cancel();
    }

    fn route(&mut self, event: &TouchEvent) -> bool {
        if event.action == TouchAction::Down {
            self.target = TouchTarget::None;
        }

        match self.target {
            TouchTarget::Panel => self.on_touch_event(event),
            TouchTarget::Child(id) => {
                if self.on_intercept_touch_event(event) {
                    log::debug!("Panel took the gesture from slot {}", id);
                    self.target = TouchTarget::Panel;
                } else if event.action == TouchAction::Up
                    && self.slots[*id].rect().contains(event.position)
                {
                    let position = self.slots[*id].position();
                    self.events.push(PanelEvent::SlotClicked(position));
                }
                true
            }
            TouchTarget::None if event.action == TouchAction::Down => {
                if self.on_intercept_touch_event(event) {
                    self.target = TouchTarget::Panel;
                    return self.on_touch_event(event);
                }
                match top_slot_under(&self.slots, &self.z_order, event.position) {
                    Some(id) => {
                        self.target = TouchTarget::Child(id);
                        true
                    }
                    None => {
                        self.target = TouchTarget::Panel;
                        self.on_touch_event(event)
                    }
                }
            }
            TouchTarget::None => self.on_touch_event(event),
        }
    }

    fn split_for_drag(&mut self) -> (&mut DragController, SlotHost<'_>) {
        (
            &mut self.drag,
            SlotHost {
                slots: &mut self.slots,
                z_order: &self.z_order,
                geometry: &self.geometry,
                bounds: self.bounds,
                dragged: &mut self.session.dragged,
                events: &mut self.events,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::config::{PanelConfig, Position};
    use crate::events::{HostEvent, PanelEvent, TouchEvent};
    use crate::geometry::Point;
    use crate::slot::{SlotId, SlotPhase};
    use std::time::Duration;

    #[tokio::test]
    async fn test_drag_onto_filled_slot_swaps() {
        let (mut panel, _rx) = filled(3);
        let from = center_of(&panel, Position::LeftTop);
        let to = center_of(&panel, Position::RightTop);

        drag_path(&mut panel, from, to, 0);

        assert_eq!(panel.slot(SlotId::new(0)).position(), Position::RightTop);
        assert_eq!(panel.slot(SlotId::new(1)).position(), Position::LeftTop);
        assert!(panel.is_permutation());
        assert!(panel.dragged().is_none());

        // both slots end up resting on their new entries
        for slot in panel.slots() {
            assert_eq!(slot.rect(), panel.geometry().rect(slot.position()));
            assert_eq!(slot.phase(), SlotPhase::Idle);
        }

        let events = panel.take_events();
        assert_eq!(events[0], PanelEvent::DisallowIntercept(true));
        assert!(events.contains(&PanelEvent::Swapped {
            from: Position::LeftTop,
            to: Position::RightTop,
        }));
        assert!(!events.iter().any(|e| matches!(e, PanelEvent::SlotClicked(_))));
    }

    #[tokio::test]
    async fn test_drag_onto_empty_slot_snaps_back() {
        let (mut panel, _rx) = filled(1);
        let from = center_of(&panel, Position::LeftTop);
        let to = center_of(&panel, Position::RightTop);

        drag_path(&mut panel, from, to, 0);

        assert_eq!(panel.slot(SlotId::new(0)).position(), Position::LeftTop);
        assert_eq!(
            panel.slot(SlotId::new(0)).rect(),
            panel.geometry().rect(Position::LeftTop)
        );
        assert!(
            !panel
                .take_events()
                .iter()
                .any(|e| matches!(e, PanelEvent::Swapped { .. }))
        );
    }

    #[tokio::test]
    async fn test_drag_within_own_rect_never_swaps() {
        let (mut panel, _rx) = filled(6);
        let from = center_of(&panel, Position::LeftTop);
        let to = Point::new(from.x + 25.0, from.y + 25.0);
        let before = panel.positions();

        drag_path(&mut panel, from, to, 0);

        assert_eq!(panel.positions(), before);
    }

    #[tokio::test]
    async fn test_slot_follows_finger_while_dragging() {
        let (mut panel, _rx) = filled(1);
        panel.dispatch_touch_event(&TouchEvent::down(200.0, 40.0, 0));
        panel.dispatch_touch_event(&TouchEvent::moved(215.0, 40.0, 10));
        panel.dispatch_touch_event(&TouchEvent::moved(235.0, 50.0, 20));

        let slot = panel.slot(SlotId::new(0));
        assert!(slot.is_dragging());
        assert_eq!(slot.rect().left, 180.0);
        assert_eq!(slot.rect().top, 10.0);
        assert_eq!(slot.phase(), SlotPhase::Ready);
        assert_eq!(panel.dragged(), Some(SlotId::new(0)));
    }

    #[tokio::test]
    async fn test_every_drag_keeps_a_permutation() {
        let (mut panel, _rx) = filled(4);
        let mut t = 0;

        for from in Position::ALL {
            for to in Position::ALL {
                let start = center_of(&panel, from);
                let end = center_of(&panel, to);
                drag_path(&mut panel, start, end, t);
                t += 1_000;
                assert!(panel.is_permutation(), "{from} -> {to}");
                assert_eq!(panel.occupied_positions().len(), 4);
            }
        }
    }

    #[tokio::test]
    async fn test_sliding_from_empty_slot_captures_nothing() {
        let (mut panel, _rx) = filled(1);
        let from = center_of(&panel, Position::RightTop);
        let to = center_of(&panel, Position::LeftTop);

        drag_path(&mut panel, from, to, 0);

        let slot = panel.slot(SlotId::new(0));
        assert!(!slot.is_dragging());
        assert_eq!(slot.phase(), SlotPhase::Idle);
        assert_eq!(slot.rect(), panel.geometry().rect(Position::LeftTop));
        // released outside the pressed slot, so no click either
        assert_eq!(panel.take_events(), vec![PanelEvent::DisallowIntercept(false)]);
    }

    #[tokio::test]
    async fn test_drag_after_long_hold_tracks_finger() {
        let (mut panel, _rx) = filled(2);
        panel.dispatch_touch_event(&TouchEvent::down(200.0, 40.0, 0));
        panel.dispatch_touch_event(&TouchEvent::moved(205.0, 40.0, 250));
        assert_eq!(panel.slot(SlotId::new(0)).rect().left, 160.0);

        for (i, x) in [230.0, 260.0, 290.0, 300.0].into_iter().enumerate() {
            panel.dispatch_touch_event(&TouchEvent::moved(x, 40.0, 260 + 10 * i as u64));
            let rect = panel.slot(SlotId::new(0)).rect();
            assert_eq!(rect.left, x - 40.0, "at x = {x}");
            assert_eq!(rect.top, 0.0);
        }
        panel.dispatch_touch_event(&TouchEvent::up(300.0, 40.0, 300));

        assert_eq!(panel.slot(SlotId::new(0)).position(), Position::RightTop);
        assert_eq!(panel.slot(SlotId::new(1)).position(), Position::LeftTop);
        for slot in panel.slots() {
            assert_eq!(slot.rect(), panel.geometry().rect(slot.position()));
        }
        assert!(panel.take_events().contains(&PanelEvent::Swapped {
            from: Position::LeftTop,
            to: Position::RightTop,
        }));
    }

    #[tokio::test]
    async fn test_reconfigure_mid_drag_releases_the_slot() {
        let (mut panel, _rx) = filled(2);
        panel.dispatch_touch_event(&TouchEvent::down(200.0, 40.0, 0));
        panel.dispatch_touch_event(&TouchEvent::moved(220.0, 40.0, 10));
        assert_eq!(panel.slot(SlotId::new(0)).phase(), SlotPhase::Ready);

        panel.reconfigure(&PanelConfig::default());

        let slot = panel.slot(SlotId::new(0));
        assert!(!slot.is_dragging());
        assert_eq!(slot.phase(), SlotPhase::Idle);
        assert_eq!(slot.rect(), panel.geometry().rect(Position::LeftTop));
        assert!(panel.dragged().is_none());

        // the released slot must still move when it becomes a swap target
        let from = center_of(&panel, Position::RightTop);
        let to = center_of(&panel, Position::LeftTop);
        drag_path(&mut panel, from, to, 1_000);

        assert_eq!(panel.slot(SlotId::new(0)).position(), Position::RightTop);
        for slot in panel.slots() {
            assert_eq!(slot.rect(), panel.geometry().rect(slot.position()));
            assert!(!slot.is_dragging());
        }
    }

    #[tokio::test]
    async fn test_quick_tap_clicks_the_slot() {
        let (mut panel, _rx) = filled(1);
        let empty = center_of(&panel, Position::RightTop);

        panel.dispatch_touch_event(&TouchEvent::down(empty.x, empty.y, 0));
        assert!(!panel.is_hold_pending());
        panel.dispatch_touch_event(&TouchEvent::up(empty.x, empty.y, 50));

        assert_eq!(
            panel.take_events(),
            vec![
                PanelEvent::DisallowIntercept(false),
                PanelEvent::SlotClicked(Position::RightTop),
            ]
        );
    }

    #[tokio::test]
    async fn test_long_hold_swallows_the_click() {
        let (mut panel, _rx) = filled(1);
        let press = center_of(&panel, Position::LeftTop);

        panel.dispatch_touch_event(&TouchEvent::down(press.x, press.y, 0));
        panel.dispatch_touch_event(&TouchEvent::up(press.x, press.y, 300));

        assert_eq!(panel.take_events(), vec![PanelEvent::DisallowIntercept(true)]);
    }

    #[tokio::test]
    async fn test_intercepts_after_time_slop() {
        let (mut panel, _rx) = filled(1);
        let press = center_of(&panel, Position::LeftTop);

        panel.dispatch_touch_event(&TouchEvent::down(press.x, press.y, 0));
        assert!(!panel.on_intercept_touch_event(&TouchEvent::moved(press.x, press.y, 150)));
        assert!(!panel.on_intercept_touch_event(&TouchEvent::moved(press.x, press.y, 200)));
        assert!(panel.on_intercept_touch_event(&TouchEvent::moved(press.x, press.y, 201)));
    }

    #[tokio::test]
    async fn test_intercept_needs_capture_and_motion() {
        let (mut panel, _rx) = filled(1);
        let empty = center_of(&panel, Position::RightTop);

        // motion alone over an empty slot is not enough
        panel.dispatch_touch_event(&TouchEvent::down(empty.x, empty.y, 0));
        assert!(!panel.on_intercept_touch_event(&TouchEvent::moved(empty.x + 20.0, empty.y, 10)));
        panel.dispatch_touch_event(&TouchEvent::up(empty.x + 20.0, empty.y, 20));

        let press = center_of(&panel, Position::LeftTop);
        panel.dispatch_touch_event(&TouchEvent::down(press.x, press.y, 100));
        assert!(!panel.on_intercept_touch_event(&TouchEvent::moved(press.x + 4.0, press.y, 110)));
        assert!(panel.on_intercept_touch_event(&TouchEvent::moved(press.x + 20.0, press.y, 120)));
    }

    #[tokio::test]
    async fn test_press_brings_slot_to_front() {
        let (mut panel, _rx) = filled(2);
        let press = center_of(&panel, Position::RightTop);

        panel.dispatch_touch_event(&TouchEvent::down(press.x, press.y, 0));
        assert_eq!(panel.z_order().last(), Some(&SlotId::new(1)));
        assert_eq!(panel.session().down_point, Some(press));
        assert_eq!(panel.session().down_time, Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_press_outside_slots_does_nothing() {
        let (mut panel, _rx) = filled(6);
        panel.dispatch_touch_event(&TouchEvent::down(5.0, 170.0, 0));
        panel.dispatch_touch_event(&TouchEvent::moved(60.0, 170.0, 10));
        panel.dispatch_touch_event(&TouchEvent::up(60.0, 170.0, 20));

        assert!(panel.take_events().is_empty());
        assert!(panel.is_permutation());
    }

    #[tokio::test]
    async fn test_malformed_stream_is_suppressed() {
        let (mut panel, _rx) = filled(2);
        let before = panel.positions();

        assert!(panel.dispatch_touch_event(&TouchEvent::moved(200.0, 40.0, 0)));
        assert!(panel.dispatch_touch_event(&TouchEvent::up(200.0, 40.0, 10)));

        panel.dispatch_touch_event(&TouchEvent::down(200.0, 40.0, 100));
        panel.dispatch_touch_event(&TouchEvent::moved(230.0, 40.0, 110));
        assert!(panel.dispatch_touch_event(&TouchEvent::moved(260.0, 40.0, 120).with_pointer(7)));
        panel.dispatch_touch_event(&TouchEvent::up(230.0, 40.0, 130));

        assert_eq!(panel.positions(), before);
        assert!(panel.dragged().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_before_delay_prevents_promotion() {
        let (mut panel, rx) = filled(1);
        let press = center_of(&panel, Position::LeftTop);

        panel.dispatch_touch_event(&TouchEvent::down(press.x, press.y, 0));
        tokio::time::sleep(Duration::from_millis(100)).await;
        panel.dispatch_touch_event(&TouchEvent::up(press.x, press.y, 100));
        assert!(!panel.is_hold_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_motion_prevents_promotion_message() {
        let (mut panel, rx) = filled(1);
        let press = center_of(&panel, Position::LeftTop);

        panel.dispatch_touch_event(&TouchEvent::down(press.x, press.y, 0));
        panel.dispatch_touch_event(&TouchEvent::moved(press.x + 20.0, press.y, 50));
        assert!(!panel.is_hold_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
        // motion promotes the slot directly
        let id = panel.dragged().unwrap();
        assert_eq!(panel.slot(id).phase(), SlotPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_press_cancels_previous_hold() {
        let (mut panel, rx) = filled(2);
        let first = center_of(&panel, Position::LeftTop);
        let second = center_of(&panel, Position::RightTop);

        panel.dispatch_touch_event(&TouchEvent::down(first.x, first.y, 0));
        panel.dispatch_touch_event(&TouchEvent::down(second.x, second.y, 50));

        let HostEvent::Panel(msg) = rx.recv().await.unwrap() else {
            panic!("expected a panel message");
        };
        panel.handle_message(msg);
        assert_eq!(panel.slot(SlotId::new(1)).phase(), SlotPhase::Ready);
        assert_eq!(panel.slot(SlotId::new(0)).phase(), SlotPhase::Idle);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
