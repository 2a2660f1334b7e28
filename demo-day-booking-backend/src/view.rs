//! What the attendee currently sees.
//!
//! The whole per-browser UI state lives in [`ViewState`]. Every form post is
//! turned into one [`Action`] and folded in with [`reduce`], rendering then
//! only looks at the resulting state through [`Screen::select`].

use serde::{Deserialize, Serialize};

use crate::workflow::{Selection, DEFAULT_COUNTRY_CODE};

pub const INCORRECT_PASSWORD: &str = "Incorrect password";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub room: Option<String>,
    pub selection: Selection,
    pub show_form: bool,
    pub show_success: bool,
    pub show_admin_login: bool,
    pub show_reset_confirm: bool,
    /// Shown once as a blocking dialog, then cleared.
    pub notice: Option<String>,
    pub name: String,
    pub phone: String,
    pub country_code: String,
    /// Kept in its own signed cookie.
    #[serde(skip)]
    pub is_admin: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            room: None,
            selection: Selection::default(),
            show_form: false,
            show_success: false,
            show_admin_login: false,
            show_reset_confirm: false,
            notice: None,
            name: String::new(),
            phone: String::new(),
            country_code: DEFAULT_COUNTRY_CODE.to_owned(),
            is_admin: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SelectRoom(String),
    BackToRooms,
    /// `spots` is the remaining count of the startup at the time of the click.
    Toggle {
        startup_id: String,
        spots: i32,
    },
    Confirm,
    BackFromForm,
    EditDraft {
        name: String,
        phone: String,
        country_code: String,
    },
    Submitted,
    SubmitFailed(String),
    SuccessShown,
    OpenAdminLogin,
    CancelAdminLogin,
    AdminLogin {
        granted: bool,
    },
    LeaveAdmin,
    AskResetConfirm,
    CancelReset,
    ResetDone,
    ResetFailed(String),
    NoticeShown,
}

#[must_use]
pub fn reduce(mut state: ViewState, action: Action) -> ViewState {
    match action {
        Action::SelectRoom(room) => {
            state.room = Some(room);
            state.selection.clear();
            state.show_form = false;
        }
        Action::BackToRooms => {
            state.room = None;
            state.selection.clear();
            state.show_form = false;
        }
        Action::Toggle { startup_id, spots } => {
            // a startup that can't be acted on is just ignored
            state.selection.toggle(&startup_id, spots);
        }
        Action::Confirm => {
            state.show_form = !state.selection.is_empty();
        }
        Action::BackFromForm => {
            state.show_form = false;
            state.selection.clear();
        }
        Action::EditDraft {
            name,
            phone,
            country_code,
        } => {
            state.name = name;
            state.phone = phone;
            state.country_code = country_code;
        }
        Action::Submitted => {
            state.selection.clear();
            state.name.clear();
            state.phone.clear();
            DEFAULT_COUNTRY_CODE.clone_into(&mut state.country_code);
            state.show_form = false;
            state.show_success = true;
        }
        Action::SubmitFailed(message) | Action::ResetFailed(message) => {
            state.show_reset_confirm = false;
            state.notice = Some(message);
        }
        Action::SuccessShown => state.show_success = false,
        Action::OpenAdminLogin => state.show_admin_login = true,
        Action::CancelAdminLogin => state.show_admin_login = false,
        Action::AdminLogin { granted: true } => {
            state.is_admin = true;
            state.show_admin_login = false;
        }
        Action::AdminLogin { granted: false } => {
            state.notice = Some(INCORRECT_PASSWORD.to_owned());
        }
        Action::LeaveAdmin => {
            state.is_admin = false;
            state.show_reset_confirm = false;
        }
        Action::AskResetConfirm => state.show_reset_confirm = state.is_admin,
        Action::CancelReset | Action::ResetDone => state.show_reset_confirm = false,
        Action::NoticeShown => state.notice = None,
    }
    state
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    ResetConfirm,
    AdminDashboard,
    AdminLogin,
    Success,
    RoomPicker,
    BookingForm,
    StartupPicker,
}

impl Screen {
    /// Exactly one screen is shown, the first flag that is set wins.
    #[must_use]
    pub const fn select(state: &ViewState) -> Self {
        if state.is_admin {
            if state.show_reset_confirm {
                Self::ResetConfirm
            } else {
                Self::AdminDashboard
            }
        } else if state.show_admin_login {
            Self::AdminLogin
        } else if state.show_success {
            Self::Success
        } else if state.room.is_none() {
            Self::RoomPicker
        } else if state.show_form {
            Self::BookingForm
        } else {
            Self::StartupPicker
        }
    }

    /// Screens that display rooms or bookings and reload when those change.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(
            self,
            Self::AdminDashboard | Self::RoomPicker | Self::StartupPicker
        )
    }

    #[must_use]
    pub const fn shows_admin_button(self) -> bool {
        matches!(
            self,
            Self::RoomPicker | Self::StartupPicker | Self::BookingForm
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(actions: impl IntoIterator<Item = Action>) -> ViewState {
        actions.into_iter().fold(ViewState::default(), reduce)
    }

    fn toggle(id: &str) -> Action {
        Action::Toggle {
            startup_id: id.to_owned(),
            spots: 4,
        }
    }

    #[test]
    fn starts_at_room_picker() {
        assert_eq!(Screen::select(&ViewState::default()), Screen::RoomPicker);
    }

    #[test]
    fn booking_walkthrough() {
        let state = apply([
            Action::SelectRoom("room1".to_owned()),
            toggle("1"),
            toggle("4"),
        ]);
        assert_eq!(Screen::select(&state), Screen::StartupPicker);
        assert_eq!(state.selection.ids(), ["1", "4"]);

        let state = reduce(state, Action::Confirm);
        assert_eq!(Screen::select(&state), Screen::BookingForm);

        let state = reduce(state, Action::Submitted);
        assert_eq!(Screen::select(&state), Screen::Success);
        assert!(state.selection.is_empty());

        let state = reduce(state, Action::SuccessShown);
        assert_eq!(Screen::select(&state), Screen::StartupPicker);
        assert_eq!(state.room.as_deref(), Some("room1"));
    }

    #[test]
    fn confirm_needs_a_selection() {
        let state = apply([Action::SelectRoom("room1".to_owned()), Action::Confirm]);
        assert_eq!(Screen::select(&state), Screen::StartupPicker);
    }

    #[test]
    fn going_back_clears_selection() {
        let state = apply([
            Action::SelectRoom("room1".to_owned()),
            toggle("3"),
            Action::Confirm,
            Action::BackFromForm,
        ]);
        assert_eq!(Screen::select(&state), Screen::StartupPicker);
        assert!(state.selection.is_empty());

        let state = apply([
            Action::SelectRoom("room1".to_owned()),
            toggle("3"),
            Action::BackToRooms,
        ]);
        assert_eq!(Screen::select(&state), Screen::RoomPicker);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn full_startup_is_not_toggled() {
        let state = apply([
            Action::SelectRoom("room1".to_owned()),
            Action::Toggle {
                startup_id: "5".to_owned(),
                spots: 0,
            },
        ]);
        assert!(state.selection.is_empty());
        assert_eq!(state.notice, None);
    }

    #[test]
    fn correct_password_grants_admin() {
        let state = apply([
            Action::OpenAdminLogin,
            Action::AdminLogin { granted: true },
        ]);
        assert!(state.is_admin);
        assert_eq!(Screen::select(&state), Screen::AdminDashboard);
    }

    #[test]
    fn wrong_password_shows_notice() {
        let state = apply([
            Action::OpenAdminLogin,
            Action::AdminLogin { granted: false },
        ]);
        assert!(!state.is_admin);
        assert_eq!(state.notice.as_deref(), Some(INCORRECT_PASSWORD));
        assert_eq!(Screen::select(&state), Screen::AdminLogin);

        let state = reduce(state, Action::NoticeShown);
        assert_eq!(state.notice, None);
    }

    #[test]
    fn reset_is_confirmed_first() {
        let state = apply([
            Action::AdminLogin { granted: true },
            Action::AskResetConfirm,
        ]);
        assert_eq!(Screen::select(&state), Screen::ResetConfirm);
        let state = reduce(state, Action::CancelReset);
        assert_eq!(Screen::select(&state), Screen::AdminDashboard);
    }

    #[test]
    fn reset_confirm_requires_admin() {
        let state = apply([Action::AskResetConfirm]);
        assert!(!state.show_reset_confirm);
    }

    #[test]
    fn leaving_admin_returns_to_user_view() {
        let state = apply([
            Action::SelectRoom("room1".to_owned()),
            Action::AdminLogin { granted: true },
            Action::LeaveAdmin,
        ]);
        assert_eq!(Screen::select(&state), Screen::StartupPicker);
    }

    #[test]
    fn failed_submit_keeps_form_and_draft() {
        let state = apply([
            Action::SelectRoom("room1".to_owned()),
            toggle("1"),
            Action::Confirm,
            Action::EditDraft {
                name: "Aisha".to_owned(),
                phone: "33123456".to_owned(),
                country_code: "966".to_owned(),
            },
            Action::SubmitFailed("Booking failed".to_owned()),
        ]);
        assert_eq!(Screen::select(&state), Screen::BookingForm);
        assert_eq!(state.name, "Aisha");
        assert_eq!(state.notice.as_deref(), Some("Booking failed"));
    }

    #[test]
    fn admin_flag_is_not_serialized() {
        let state = apply([Action::AdminLogin { granted: true }]);
        let json = serde_json::to_string(&state).unwrap();
        let restored: ViewState = serde_json::from_str(&json).unwrap();
        assert!(!restored.is_admin);
    }
}
