use super::Panel;
use crate::config::{Position, SLOT_COUNT};
use crate::geometry::GeometryTable;
use crate::slot::{ImagePath, Slot, SlotId};

/// Swaps the dragged slot with the draggable slot under its center.
///
/// Returns the dragged slot's old and new position when a swap happened.
pub(super) fn switch_position_if_needed(
    slots: &mut [Slot; SLOT_COUNT],
    geometry: &GeometryTable,
    dragged: SlotId,
) -> Option<(Position, Position)> {
    let center = slots[*dragged].rect().center();
    let from = slots[*dragged].position();

    let target = Position::ALL
        .into_iter()
        .filter(|&p| p != from)
        .find_map(|p| {
            slots
                .iter()
                .find(|s| s.position() == p && s.rect().contains_strict(center))
                .map(Slot::id)
        })?;

    if !slots[*target].is_draggable() {
        return None;
    }

    let to = slots[*target].position();
    slots[*target].switch_position(from, geometry);
    slots[*dragged].switch_position(to, geometry);
    log::debug!("Slot {} moved {} -> {}", dragged, from, to);
    Some((from, to))
}

impl Panel {
    /// Empties the slot at `position` and compacts the images after it.
    ///
    /// Every draggable slot following `position` moves one step back, up to
    /// the first empty one. The emptied slot takes the last vacated position.
    pub fn delete_image(&mut self, position: Position) -> Option<ImagePath> {
        let deleted = self.slot_id_at(position)?;
        let image = self.slots[*deleted].clear_image();

        let run: Vec<(Position, SlotId)> = Position::ALL[position.as_index() + 1..]
            .iter()
            .map_while(|&p| {
                self.slot_id_at(p)
                    .filter(|&id| self.slots[*id].is_draggable())
                    .map(|id| (p, id))
            })
            .collect();

        for &(p, id) in &run {
            if let Some(prev) = p.prev() {
                self.slots[*id].switch_position(prev, &self.geometry);
            }
        }
        if let Some(&(last, _)) = run.last() {
            self.slots[*deleted].switch_position(last, &self.geometry);
        }

        log::debug!("Deleted image at {}, {} slots shifted", position, run.len());
        image
    }

    /// Puts `path` into a slot and returns where it landed.
    ///
    /// With `modify` the slot at `position` is overwritten. Otherwise the
    /// first empty slot in position order is filled and `position` is unused.
    pub fn fill_item_image(
        &mut self,
        position: Position,
        path: ImagePath,
        modify: bool,
    ) -> Option<Position> {
        let target = if modify {
            self.slot_id_at(position)
        } else {
            Position::ALL
                .into_iter()
                .filter_map(|p| self.slot_id_at(p))
                .find(|&id| !self.slots[*id].is_draggable())
        };

        let Some(id) = target else {
            log::warn!("No empty slot left for {}", path.display());
            return None;
        };
        self.slots[*id].fill_image_view(path);
        Some(self.slots[*id].position())
    }
}
