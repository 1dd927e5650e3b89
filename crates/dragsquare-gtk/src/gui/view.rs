use crate::gui::theme::ThemeColors;
use cairo::Context;
use dragsquare::{ImagePath, Panel, Rect, Slot, SlotPhase};
use gdk_pixbuf::Pixbuf;
use gdk4::prelude::*;
use palette::Srgba;
use std::collections::HashMap;

const IMAGE_SIZE: i32 = 256;
const IMAGE_INSET: f64 = 4.0;

/// Decoded slot images, keyed by path. Failed loads are remembered too.
#[derive(Default)]
pub struct PixbufCache {
    images: HashMap<ImagePath, Option<Pixbuf>>,
}

impl PixbufCache {
    pub fn get(&mut self, path: &ImagePath) -> Option<&Pixbuf> {
        self.images
            .entry(path.clone())
            .or_insert_with(|| {
                Pixbuf::from_file_at_scale(path.as_path(), IMAGE_SIZE, IMAGE_SIZE, true)
                    .inspect_err(|e| log::error!("Failed to load {}: {}", path.display(), e))
                    .ok()
            })
            .as_ref()
    }

    /// Drops decoded images no slot refers to any more.
    pub fn retain_used(&mut self, panel: &Panel) {
        self.images
            .retain(|path, _| panel.slots().iter().any(|s| s.content() == Some(path)));
    }
}

struct SlotRenderer<'a> {
    slot: &'a Slot,
    rect: Rect,
}

impl<'a> SlotRenderer<'a> {
    fn new(slot: &'a Slot) -> Self {
        Self {
            slot,
            rect: slot.display_rect(),
        }
    }

    fn draw(
        &self,
        cr: &Context,
        colors: &ThemeColors,
        cache: &mut PixbufCache,
    ) -> Result<(), cairo::Error> {
        let background = if self.slot.is_draggable() {
            colors.filled
        } else {
            colors.empty
        };
        self.fill_rect(cr, background)?;

        if let Some(pixbuf) = self.slot.content().and_then(|path| cache.get(path)) {
            self.draw_image(cr, pixbuf)?;
        }

        if self.slot.phase() == SlotPhase::Ready {
            self.fill_rect(cr, colors.ready)?;
        }
        self.stroke_rect(cr, colors.outline)
    }

    fn fill_rect(&self, cr: &Context, color: Srgba<f64>) -> Result<(), cairo::Error> {
        let (r, g, b, a) = color.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.rectangle(
            self.rect.left,
            self.rect.top,
            self.rect.width(),
            self.rect.height(),
        );
        cr.fill()
    }

    fn stroke_rect(&self, cr: &Context, color: Srgba<f64>) -> Result<(), cairo::Error> {
        let (r, g, b, a) = color.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.set_line_width(1.0);
        cr.rectangle(
            self.rect.left + 0.5,
            self.rect.top + 0.5,
            self.rect.width() - 1.0,
            self.rect.height() - 1.0,
        );
        cr.stroke()
    }

    fn draw_image(&self, cr: &Context, pixbuf: &Pixbuf) -> Result<(), cairo::Error> {
        let inner = self.rect.width() - 2.0 * IMAGE_INSET;
        if inner <= 0.0 {
            return Ok(());
        }
        // fit the longer side, centre the other
        let image_scale = inner / pixbuf.width().max(pixbuf.height()) as f64;
        let (iw, ih) = (
            pixbuf.width() as f64 * image_scale,
            pixbuf.height() as f64 * image_scale,
        );
        let center = self.rect.center();

        cr.save()?;
        cr.translate(center.x - iw / 2.0, center.y - ih / 2.0);
        cr.scale(image_scale, image_scale);
        cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
        cr.paint()?;
        cr.restore()
    }
}

/// Paints the slots back to front so the last touched one stays on top.
pub fn draw(
    cr: &Context,
    panel: &Panel,
    colors: &ThemeColors,
    cache: &mut PixbufCache,
) -> Result<(), cairo::Error> {
    for &id in panel.z_order() {
        SlotRenderer::new(panel.slot(id)).draw(cr, colors, cache)?;
    }
    Ok(())
}
