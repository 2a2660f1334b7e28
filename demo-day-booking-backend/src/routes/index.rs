use demo_day_booking_database::models::Room;
use headers::{CacheControl, ContentType};
use http::{Response, StatusCode};
use serde::Serialize;

use crate::error::AppError;
use crate::report::{build_report, Report};
use crate::session::{ResponseSessionExt as _, Session};
use crate::templates::{render_page, LayoutTemplate};
use crate::view::{Action, Screen, ViewState};
use crate::workflow::{is_full, spots_left, Selection, COUNTRY_CODES, MAX_SELECTIONS};
use crate::{full, AppState, ResponseBody, ResponseTypedHeaderExt as _};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 15;

#[derive(Serialize)]
struct CsrfTemplate<'a> {
    csrf_token: &'a str,
}

#[derive(Serialize)]
struct RoomPickerTemplate<'a> {
    csrf_token: &'a str,
    rooms: &'a [Room],
}

#[derive(Serialize)]
struct StartupCard<'a> {
    id: &'a str,
    name: &'a str,
    spots_left: i32,
    selected: bool,
    full: bool,
    /// Clicking it would change nothing.
    inert: bool,
}

#[derive(Serialize)]
struct StartupPickerTemplate<'a> {
    csrf_token: &'a str,
    room_name: &'a str,
    max_selections: usize,
    selected_count: usize,
    selected_names: Vec<&'a str>,
    can_confirm: bool,
    startups: Vec<StartupCard<'a>>,
}

#[derive(Serialize)]
struct CountryOption {
    code: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct BookingFormTemplate<'a> {
    csrf_token: &'a str,
    selected_names: Vec<&'a str>,
    name: &'a str,
    phone: &'a str,
    max_name_len: usize,
    max_phone_len: usize,
    country_codes: Vec<CountryOption>,
}

#[derive(Serialize)]
struct AdminDashboardTemplate<'a> {
    csrf_token: &'a str,
    report: Report,
}

fn selected_names<'a>(room: &'a Room, selection: &'a Selection) -> Vec<&'a str> {
    selection
        .ids()
        .iter()
        .map(|id| room.startup(id).map_or(id.as_str(), |startup| startup.name.as_str()))
        .collect()
}

fn startup_picker<'a>(
    room: &'a Room,
    view: &'a ViewState,
    csrf_token: &'a str,
) -> StartupPickerTemplate<'a> {
    let selection = &view.selection;
    StartupPickerTemplate {
        csrf_token,
        room_name: &room.name,
        max_selections: MAX_SELECTIONS,
        selected_count: selection.len(),
        selected_names: selected_names(room, selection),
        can_confirm: !selection.is_empty(),
        startups: room
            .startups
            .iter()
            .map(|startup| {
                let selected = selection.contains(&startup.id);
                let full = is_full(startup.spots, selected);
                StartupCard {
                    id: &startup.id,
                    name: &startup.name,
                    spots_left: spots_left(startup.spots, selected),
                    selected,
                    full,
                    inert: full || (!selected && !selection.can_select_more()),
                }
            })
            .collect(),
    }
}

fn booking_form<'a>(
    room: &'a Room,
    view: &'a ViewState,
    csrf_token: &'a str,
) -> BookingFormTemplate<'a> {
    BookingFormTemplate {
        csrf_token,
        selected_names: selected_names(room, &view.selection),
        name: &view.name,
        phone: &view.phone,
        max_name_len: MAX_NAME_LEN,
        max_phone_len: MAX_PHONE_LEN,
        country_codes: COUNTRY_CODES
            .iter()
            .map(|&(code, label)| CountryOption {
                code,
                label,
                selected: code == view.country_code,
            })
            .collect(),
    }
}

/// Renders the one screen the session is on.
pub fn index(state: &AppState, session: &mut Session) -> Result<Response<ResponseBody>, AppError> {
    let room = session
        .view()
        .room
        .as_deref()
        .map(|room_id| state.board.room(room_id));
    let room = match room {
        Some(Some(room)) => Some(room),
        Some(None) => {
            // the room is gone, start over
            session.apply(Action::BackToRooms);
            None
        }
        None => None,
    };

    let view = session.view().clone();
    let csrf_token = session.csrf_token().to_owned();
    let csrf_token = csrf_token.as_str();
    let screen = Screen::select(&view);
    let templates = &state.templates;
    let config = &state.config;
    let css_version = state.css.version();
    let notice = view.notice.as_deref();
    let success = screen == Screen::Success;

    let layout = |page_title: &'static str| {
        move |content: String| LayoutTemplate {
            page_title,
            event_title: &config.event_title,
            css_version,
            csrf_token,
            content,
            show_admin_button: screen.shows_admin_button(),
            notice,
            live: screen.is_live() && notice.is_none(),
            redirect_ms: success.then_some(config.success_display_ms),
            redirect_seconds: success.then(|| config.success_display_ms.div_ceil(1000)),
        }
    };

    let html = match (screen, &room) {
        (Screen::ResetConfirm, _) => render_page(
            templates,
            "reset_confirm",
            &CsrfTemplate { csrf_token },
            layout("Confirm Reset"),
        )?,
        (Screen::AdminDashboard, _) => render_page(
            templates,
            "admin_dashboard",
            &AdminDashboardTemplate {
                csrf_token,
                report: build_report(&state.board.rooms(), &state.board.bookings()),
            },
            layout("Admin Dashboard"),
        )?,
        (Screen::AdminLogin, _) => render_page(
            templates,
            "admin_login",
            &CsrfTemplate { csrf_token },
            layout("Admin Login"),
        )?,
        (Screen::Success, _) => render_page(
            templates,
            "success",
            &CsrfTemplate { csrf_token },
            layout("Thank you"),
        )?,
        (Screen::BookingForm, Some(room)) => render_page(
            templates,
            "booking_form",
            &booking_form(room, &view, csrf_token),
            layout("Complete Your Booking"),
        )?,
        (Screen::StartupPicker, Some(room)) => render_page(
            templates,
            "startup_picker",
            &startup_picker(room, &view, csrf_token),
            layout("Select Startups"),
        )?,
        (Screen::RoomPicker | Screen::BookingForm | Screen::StartupPicker, _) => render_page(
            templates,
            "room_picker",
            &RoomPickerTemplate {
                csrf_token,
                rooms: &state.board.rooms(),
            },
            layout("Select Your Room"),
        )?,
    };

    // both are shown exactly once
    if view.notice.is_some() {
        session.apply(Action::NoticeShown);
    }
    if success {
        session.apply(Action::SuccessShown);
    }

    Ok(Response::builder()
        .status(StatusCode::OK)
        .typed_header(ContentType::html())
        .typed_header(CacheControl::new().with_no_store())
        .with_session(session, &state.key)
        .body(full(html))?)
}
