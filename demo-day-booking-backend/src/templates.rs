use handlebars::Handlebars;
use serde::Serialize;

use crate::error::AppError;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout", include_str!("../templates/layout.hbs")),
    ("room_picker", include_str!("../templates/room_picker.hbs")),
    ("startup_picker", include_str!("../templates/startup_picker.hbs")),
    ("booking_form", include_str!("../templates/booking_form.hbs")),
    ("success", include_str!("../templates/success.hbs")),
    ("admin_login", include_str!("../templates/admin_login.hbs")),
    ("admin_dashboard", include_str!("../templates/admin_dashboard.hbs")),
    ("reset_confirm", include_str!("../templates/reset_confirm.hbs")),
    ("error", include_str!("../templates/error.hbs")),
];

// https://handlebarsjs.com/api-reference/
// https://handlebarsjs.com/api-reference/data-variables.html

pub fn load_templates() -> Result<Handlebars<'static>, AppError> {
    let mut handlebars = Handlebars::new();
    for (name, source) in TEMPLATES {
        handlebars.register_template_string(name, source)?;
    }
    Ok(handlebars)
}

/// Everything around the screen itself.
#[derive(Serialize)]
pub struct LayoutTemplate<'a> {
    pub page_title: &'a str,
    pub event_title: &'a str,
    pub css_version: &'a str,
    pub csrf_token: &'a str,
    /// Already rendered screen, inserted unescaped.
    pub content: String,
    pub show_admin_button: bool,
    pub notice: Option<&'a str>,
    pub live: bool,
    pub redirect_ms: Option<u64>,
    pub redirect_seconds: Option<u64>,
}

/// Renders a screen template and wraps it in the layout.
pub fn render_page<'a, T: Serialize>(
    templates: &Handlebars<'_>,
    screen: &str,
    data: &T,
    layout: impl FnOnce(String) -> LayoutTemplate<'a>,
) -> Result<String, AppError> {
    let content = templates.render(screen, data)?;
    Ok(templates.render("layout", &layout(content))?)
}
