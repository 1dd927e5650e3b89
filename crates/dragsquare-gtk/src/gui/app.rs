use crate::gui::theme::{self, ThemeColors};
use crate::gui::view::{self, PixbufCache};
use dragsquare::events::HostEvent;
use dragsquare::{
    ImagePath, MeasureSpec, Panel, PanelEvent, Point, Position, Size, TouchAction, TouchEvent,
    config,
};
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

pub struct AppModel {
    pub panel: Rc<RefCell<Panel>>,
    pub pending_images: VecDeque<ImagePath>,
    pub drawing_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum AppMsg {
    Touch(TouchEvent),
    Resize(i32, i32),
    Host(HostEvent),
}

impl From<HostEvent> for AppMsg {
    fn from(event: HostEvent) -> Self {
        AppMsg::Host(event)
    }
}

fn touch_event(gesture: &gtk::GestureDrag, action: TouchAction, x: f64, y: f64) -> TouchEvent {
    TouchEvent::new(
        action,
        Point::new(x, y),
        Duration::from_millis(gesture.current_event_time() as u64),
    )
}

/// Pointer position for a drag signal carrying an offset from the start point.
fn offset_event(
    gesture: &gtk::GestureDrag,
    action: TouchAction,
    dx: f64,
    dy: f64,
) -> Option<TouchEvent> {
    gesture
        .start_point()
        .map(|(x, y)| touch_event(gesture, action, x + dx, y + dy))
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        Panel,
        Vec<ImagePath>,
        async_channel::Receiver<HostEvent>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Drag Square"),
            set_default_width: 480,

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[root] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        root.close();
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                add_css_class: "dragsquare-panel",

                connect_resize[sender] => move |_, width, height| {
                    sender.input(AppMsg::Resize(width, height));
                },

                add_controller = gtk::GestureDrag {
                    connect_drag_begin[sender] => move |gesture, x, y| {
                        sender.input(AppMsg::Touch(touch_event(gesture, TouchAction::Down, x, y)));
                    },
                    connect_drag_update[sender] => move |gesture, dx, dy| {
                        if let Some(event) = offset_event(gesture, TouchAction::Move, dx, dy) {
                            sender.input(AppMsg::Touch(event));
                        }
                    },
                    connect_drag_end[sender] => move |gesture, dx, dy| {
                        if let Some(event) = offset_event(gesture, TouchAction::Up, dx, dy) {
                            sender.input(AppMsg::Touch(event));
                        }
                    },
                    connect_cancel[sender] => move |gesture, _| {
                        let (dx, dy) = gesture.offset().unwrap_or_default();
                        if let Some(event) = offset_event(gesture, TouchAction::Cancel, dx, dy) {
                            sender.input(AppMsg::Touch(event));
                        }
                    },
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (panel, images, rx) = init;

        theme::load_css();

        let natural = panel.on_measure(MeasureSpec::Unspecified, MeasureSpec::Unspecified);
        let model = AppModel {
            panel: Rc::new(RefCell::new(panel)),
            pending_images: images.into(),
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();
        model.drawing_area.set_content_width(natural.width as i32);
        model.drawing_area.set_content_height(natural.height as i32);

        let panel_draw = model.panel.clone();
        let cache = RefCell::new(PixbufCache::default());
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, _, _| {
                let colors = ThemeColors::from_context(&drawing_area.style_context());
                let panel = panel_draw.borrow();
                let mut cache = cache.borrow_mut();
                cache.retain_used(&panel);
                if let Err(e) = view::draw(cr, &panel, &colors, &mut cache) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Touch(event) => {
                self.panel.borrow_mut().dispatch_touch_event(&event);
                self.handle_panel_events();
            }
            AppMsg::Resize(width, _height) => {
                let mut panel = self.panel.borrow_mut();
                let size = panel.on_measure(
                    MeasureSpec::Exactly(width as f64),
                    MeasureSpec::Unspecified,
                );
                self.drawing_area.set_content_height(size.height as i32);
                panel.on_layout(Size::new(width as f64, size.height));
            }
            AppMsg::Host(HostEvent::Panel(msg)) => {
                self.panel.borrow_mut().handle_message(msg);
            }
            AppMsg::Host(HostEvent::ConfigReload) => match config::load_config() {
                Ok(new_config) => {
                    self.panel.borrow_mut().reconfigure(&new_config.panel);
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
        self.drawing_area.queue_draw();
    }
}

impl AppModel {
    fn handle_panel_events(&mut self) {
        let events = self.panel.borrow_mut().take_events();
        for event in events {
            match event {
                PanelEvent::SlotClicked(position) => self.on_slot_clicked(position),
                PanelEvent::Swapped { from, to } => {
                    log::info!("Moved image from {} to {}", from, to);
                }
                PanelEvent::DisallowIntercept(disallow) => {
                    log::debug!("Panel requests disallow intercept: {}", disallow);
                }
            }
        }
    }

    fn on_slot_clicked(&mut self, position: Position) {
        let mut panel = self.panel.borrow_mut();
        let occupied = panel.slot_at(position).is_some_and(|s| s.is_draggable());

        if occupied {
            if let Some(image) = panel.delete_image(position) {
                log::info!("Removed {}", image.display());
            }
            return;
        }

        match self.pending_images.pop_front() {
            Some(image) => {
                if let Some(filled) = panel.fill_item_image(position, image, false) {
                    log::info!("Filled slot {}", filled);
                }
            }
            None => log::info!("No more images to add"),
        }
    }
}
