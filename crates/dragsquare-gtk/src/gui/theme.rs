use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;

pub struct ThemeColors {
    pub empty: Srgba<f64>,
    pub filled: Srgba<f64>,
    pub ready: Srgba<f64>,
    pub outline: Srgba<f64>,
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        Self {
            empty: Self::lookup_color(
                context,
                "theme_unfocused_bg_color",
                Srgba::new(0.85, 0.85, 0.85, 1.0),
                None,
            ),
            filled: Self::lookup_color(
                context,
                "theme_bg_color",
                Srgba::new(0.95, 0.95, 0.95, 1.0),
                None,
            ),
            ready: Self::lookup_color(
                context,
                "theme_selected_bg_color",
                Srgba::new(0.2, 0.45, 0.85, 0.35),
                Some(0.35),
            ),
            outline: Self::lookup_color(
                context,
                "borders",
                Srgba::new(0.6, 0.6, 0.6, 1.0),
                None,
            ),
        }
    }

    fn lookup_color(
        context: &gtk::StyleContext,
        name: &str,
        fallback: Srgba<f64>,
        alpha_override: Option<f64>,
    ) -> Srgba<f64> {
        context
            .lookup_color(name)
            .map(|c| {
                Srgba::new(
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    alpha_override.unwrap_or(c.alpha() as f64),
                )
            })
            .unwrap_or(fallback)
    }
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    provider.load_from_data(
        "
.dragsquare-panel {
    margin: 12px;
}
",
    );

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
