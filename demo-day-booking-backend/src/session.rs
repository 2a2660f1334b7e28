use cookie::{Cookie, CookieJar, Key, SameSite};
use http::header::{COOKIE, SET_COOKIE};
use http::Request;
use rand::{thread_rng, Rng as _};
use tracing::debug;

use crate::view::{reduce, Action, ViewState};

const COOKIE_NAME_CSRF_TOKEN: &str = "__Host_csrf_token";
const COOKIE_NAME_VIEW: &str = "__Host_view";
const COOKIE_NAME_ADMIN: &str = "__Host_admin";

const CSRF_TOKEN_LEN: usize = 30;

/// Per-browser state, kept entirely in cookies.
///
/// Every value is paired with whether it changed during this request, only
/// changed values are sent back.
#[derive(Clone, Debug)]
#[must_use]
pub struct Session {
    csrf_token: (String, bool),
    view: (ViewState, bool),
    admin: (bool, bool),
}

impl Default for Session {
    fn default() -> Self {
        Self {
            csrf_token: (new_csrf_token(), true),
            view: (ViewState::default(), false),
            admin: (false, false),
        }
    }
}

fn new_csrf_token() -> String {
    thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(CSRF_TOKEN_LEN)
        .map(char::from)
        .collect()
}

impl Session {
    pub fn new<T>(request: &Request<T>, key: &Key) -> Self {
        let mut jar = CookieJar::new();
        request
            .headers()
            .get_all(COOKIE)
            .into_iter()
            .filter_map(|value| value.to_str().ok())
            .map(std::borrow::ToOwned::to_owned)
            .flat_map(Cookie::split_parse_encoded)
            .filter_map(std::result::Result::ok)
            .for_each(|cookie| jar.add_original(cookie));

        let csrf_token = jar
            .get(COOKIE_NAME_CSRF_TOKEN)
            .map(|cookie| cookie.value().to_owned())
            .filter(|token| !token.is_empty())
            .map_or_else(|| (new_csrf_token(), true), |token| (token, false));

        let mut view = jar
            .get(COOKIE_NAME_VIEW)
            .and_then(|cookie| match serde_json::from_str::<ViewState>(cookie.value()) {
                Ok(view) => Some(view),
                Err(err) => {
                    debug!("ignoring unreadable view cookie: {err}");
                    None
                }
            })
            .unwrap_or_default();

        // a tampered admin cookie fails verification and is treated as absent
        let admin = jar
            .signed(key)
            .get(COOKIE_NAME_ADMIN)
            .is_some_and(|cookie| cookie.value() == "1");
        view.is_admin = admin;

        Self {
            csrf_token,
            view: (view, false),
            admin: (admin, false),
        }
    }

    #[must_use]
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token.0
    }

    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view.0
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.admin.0
    }

    pub fn apply(&mut self, action: Action) {
        let next = reduce(self.view.0.clone(), action);
        if next.is_admin != self.admin.0 {
            self.admin = (next.is_admin, true);
        }
        if next != self.view.0 {
            self.view = (next, true);
        }
    }
}

fn build_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

pub trait ResponseSessionExt {
    #[must_use]
    fn with_session(self, session: &Session, key: &Key) -> Self;
}

impl ResponseSessionExt for http::response::Builder {
    fn with_session(self, session: &Session, key: &Key) -> Self {
        let mut this = self;
        if let (value, true) = &session.csrf_token {
            let cookie = build_cookie(COOKIE_NAME_CSRF_TOKEN, value.clone());
            this = this.header(SET_COOKIE, cookie.to_string());
        }
        if let (value, true) = &session.view {
            match serde_json::to_string(value) {
                Ok(json) => {
                    let cookie = build_cookie(COOKIE_NAME_VIEW, json);
                    this = this.header(SET_COOKIE, cookie.encoded().to_string());
                }
                Err(err) => debug!("failed to store view state: {err}"),
            }
        }
        if let (admin, true) = session.admin {
            let mut jar = CookieJar::new();
            let mut cookie = build_cookie(COOKIE_NAME_ADMIN, "1".to_owned());
            if admin {
                jar.signed_mut(key).add(cookie);
                if let Some(signed) = jar.get(COOKIE_NAME_ADMIN) {
                    this = this.header(SET_COOKIE, signed.encoded().to_string());
                }
            } else {
                cookie.make_removal();
                this = this.header(SET_COOKIE, cookie.to_string());
            }
        }
        this
    }
}
