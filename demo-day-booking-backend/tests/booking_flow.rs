use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use demo_day_booking_backend::router::handle;
use demo_day_booking_backend::{AppState, ResponseBody};
use demo_day_booking_config::Config;
use demo_day_booking_database::{ChangeFeed, MemoryStore, NotifyingStore, Store as _};
use http::header::{CONTENT_TYPE, COOKIE, ETAG, IF_NONE_MATCH, LOCATION, SET_COOKIE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt as _, Full};

async fn app() -> Arc<AppState> {
    let feed = ChangeFeed::new();
    let store = Arc::new(NotifyingStore::new(MemoryStore::new(), feed.clone()));
    AppState::new(Config::default(), store, &feed).await.unwrap()
}

/// Keeps the cookies between requests like a browser would.
struct Browser {
    state: Arc<AppState>,
    cookies: BTreeMap<String, String>,
}

impl Browser {
    fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: Arc::clone(state),
            cookies: BTreeMap::new(),
        }
    }

    async fn send(&mut self, request: http::request::Builder, body: String) -> Response<ResponseBody> {
        let cookies: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        let request = request
            .header(COOKIE, cookies.join("; "))
            .body(Full::new(Bytes::from(body)))
            .unwrap();
        let response = handle(Arc::clone(&self.state), request).await.unwrap();
        for header in response.headers().get_all(SET_COOKIE) {
            let pair = header.to_str().unwrap().split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_owned(), value.to_owned());
            }
        }
        response
    }

    async fn get(&mut self, path: &str) -> (StatusCode, String) {
        let response = self
            .send(Request::builder().method(Method::GET).uri(path), String::new())
            .await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn csrf_token(&self) -> String {
        self.cookies["__Host_csrf_token"].clone()
    }

    /// Posts a form with the token of this browser.
    async fn post(&mut self, path: &str, fields: &[(&str, &str)]) -> StatusCode {
        let token = self.csrf_token();
        let mut form = vec![("csrf_token", token.as_str())];
        form.extend_from_slice(fields);
        self.post_raw(path, serde_urlencoded::to_string(form).unwrap())
            .await
    }

    async fn post_raw(&mut self, path: &str, body: String) -> StatusCode {
        let response = self
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri(path)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded"),
                body,
            )
            .await;
        if response.status() == StatusCode::SEE_OTHER {
            assert_eq!(response.headers()[LOCATION], "/");
        }
        response.status()
    }
}

#[tokio::test]
async fn attendee_books_two_startups() {
    let state = app().await;
    let mut browser = Browser::new(&state);

    let (status, page) = browser.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Select Your Room"));
    assert!(page.contains("Product Demo Day Startups"));

    assert_eq!(browser.post("/room", &[("room_id", "room1")]).await, StatusCode::SEE_OTHER);
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Selected: 0 / 2"));

    assert_eq!(browser.post("/toggle", &[("startup_id", "1")]).await, StatusCode::SEE_OTHER);
    assert_eq!(browser.post("/toggle", &[("startup_id", "4")]).await, StatusCode::SEE_OTHER);
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Selected: 2 / 2"));
    assert!(page.contains("Tamam"));
    assert!(page.contains("Soor"));

    assert_eq!(browser.post("/confirm", &[]).await, StatusCode::SEE_OTHER);
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Complete Your Booking"));

    assert_eq!(
        browser
            .post(
                "/book",
                &[("name", "Aisha"), ("phone", "33123456"), ("country_code", "973")]
            )
            .await,
        StatusCode::SEE_OTHER
    );
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Thank you for your booking!"));

    // the confirmation is shown once, then the picker again
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Selected: 0 / 2"));
    assert!(page.contains("3 spots left"));

    let bookings = state.store.list_bookings().await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].name, "Aisha");
    assert_eq!(bookings[0].phone, "+97333123456");
    assert_eq!(bookings[0].startups, ["1", "4"]);

    let room = state.board.room("room1").unwrap();
    assert_eq!(room.startup("1").unwrap().spots, 3);
    assert_eq!(room.startup("3").unwrap().spots, 4);
    assert_eq!(room.startup("4").unwrap().spots, 3);
}

#[tokio::test]
async fn invalid_booking_stays_on_the_form() {
    let state = app().await;
    let mut browser = Browser::new(&state);
    browser.get("/").await;
    browser.post("/room", &[("room_id", "room1")]).await;
    browser.post("/toggle", &[("startup_id", "3")]).await;
    browser.post("/confirm", &[]).await;

    browser
        .post(
            "/book",
            &[("name", "   "), ("phone", "33123456"), ("country_code", "973")],
        )
        .await;
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Complete Your Booking"));
    assert!(page.contains("<dialog id=\"notice\" open>"));
    assert!(page.contains("showModal()"));

    assert!(state.store.list_bookings().await.unwrap().is_empty());
    assert_eq!(state.board.startup("3").unwrap().spots, 4);
}

/// The card of one startup on the picker.
fn card<'a>(page: &'a str, startup_id: &str) -> &'a str {
    let start = page
        .find(&format!("name=\"startup_id\" value=\"{startup_id}\""))
        .unwrap();
    let end = start + page[start..].find("</form>").unwrap();
    &page[start..end]
}

#[tokio::test]
async fn startup_without_spots_is_shown_full() {
    let state = app().await;
    state.store.set_startup_spots("5", 0).await.unwrap();
    state.board.refresh_all(&*state.store).await.unwrap();

    let mut browser = Browser::new(&state);
    browser.get("/").await;
    browser.post("/room", &[("room_id", "room1")]).await;
    let (_, page) = browser.get("/").await;
    let full = card(&page, "5");
    assert!(full.contains(">Full<"));
    assert!(full.contains(" disabled>"));
    assert!(!card(&page, "3").contains(" disabled>"));

    assert_eq!(browser.post("/toggle", &[("startup_id", "5")]).await, StatusCode::SEE_OTHER);
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Selected: 0 / 2"));

    // with two selected the others can't be picked, the selected ones can be removed
    browser.post("/toggle", &[("startup_id", "1")]).await;
    browser.post("/toggle", &[("startup_id", "4")]).await;
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Selected: 2 / 2"));
    assert!(card(&page, "3").contains(" disabled>"));
    assert!(!card(&page, "3").contains(">Full<"));
    assert!(card(&page, "1").contains(">Remove<"));
    assert!(!card(&page, "1").contains(" disabled>"));
}

#[tokio::test]
async fn booking_ignores_startups_outside_the_room() {
    let state = app().await;
    let mut browser = Browser::new(&state);
    browser.get("/").await;
    // {"room":"room1","selection":["1","99"],"show_form":true}
    browser.cookies.insert(
        "__Host_view".to_owned(),
        "%7B%22room%22%3A%22room1%22%2C%22selection%22%3A%5B%221%22%2C%2299%22%5D%2C%22show_form%22%3Atrue%7D"
            .to_owned(),
    );

    assert_eq!(
        browser
            .post(
                "/book",
                &[("name", "Aisha"), ("phone", "33123456"), ("country_code", "973")]
            )
            .await,
        StatusCode::SEE_OTHER
    );
    let (_, page) = browser.get("/").await;
    assert!(page.contains("Thank you for your booking!"));

    let bookings = state.store.list_bookings().await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].startups, ["1"]);
    assert_eq!(state.board.startup("1").unwrap().spots, 3);
}

#[tokio::test]
async fn booking_needs_the_form_screen() {
    let state = app().await;
    let mut browser = Browser::new(&state);
    browser.get("/").await;
    browser.post("/room", &[("room_id", "room1")]).await;
    browser.post("/toggle", &[("startup_id", "1")]).await;

    let status = browser
        .post(
            "/book",
            &[("name", "Aisha"), ("phone", "33123456"), ("country_code", "973")],
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(state.store.list_bookings().await.unwrap().is_empty());
    assert_eq!(state.board.startup("1").unwrap().spots, 4);

    let (_, page) = browser.get("/").await;
    assert!(page.contains("Selected: 1 / 2"));
}

#[tokio::test]
async fn wrong_csrf_token_is_rejected() {
    let state = app().await;
    let mut browser = Browser::new(&state);
    browser.get("/").await;

    let status = browser
        .post_raw("/room", "csrf_token=guessed&room_id=room1".to_owned())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page) = browser.get("/").await;
    assert!(page.contains("Select Your Room"));
}

#[tokio::test]
async fn unknown_room_and_path_are_not_found() {
    let state = app().await;
    let mut browser = Browser::new(&state);
    browser.get("/").await;

    assert_eq!(
        browser.post("/room", &[("room_id", "nowhere")]).await,
        StatusCode::NOT_FOUND
    );
    let (status, _) = browser.get("/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_sees_bookings_and_resets() {
    let state = app().await;

    let mut attendee = Browser::new(&state);
    attendee.get("/").await;
    attendee.post("/room", &[("room_id", "room1")]).await;
    attendee.post("/toggle", &[("startup_id", "5")]).await;
    attendee.post("/confirm", &[]).await;
    attendee
        .post(
            "/book",
            &[("name", "Aisha"), ("phone", "33123456"), ("country_code", "973")],
        )
        .await;

    let mut admin = Browser::new(&state);
    admin.get("/").await;
    assert_eq!(admin.post("/admin/reset", &[]).await, StatusCode::FORBIDDEN);

    admin.post("/admin/open", &[]).await;
    let (_, page) = admin.get("/").await;
    assert!(page.contains("Enter admin password"));

    admin.post("/admin/login", &[("password", "1234")]).await;
    let (_, page) = admin.get("/").await;
    assert!(page.contains("Incorrect password"));
    assert!(!admin.cookies.contains_key("__Host_admin"));

    admin.post("/admin/login", &[("password", "0000")]).await;
    assert!(admin.cookies.contains_key("__Host_admin"));
    let (_, page) = admin.get("/").await;
    assert!(page.contains("Admin Dashboard"));
    assert!(page.contains("Aisha"));
    assert!(page.contains("+97333123456"));
    assert!(page.contains("Rentat"));

    admin.post("/admin/reset/ask", &[]).await;
    let (_, page) = admin.get("/").await;
    assert!(page.contains("This cannot be undone."));
    assert_eq!(admin.post("/admin/reset", &[]).await, StatusCode::SEE_OTHER);

    let (_, page) = admin.get("/").await;
    assert!(page.contains("No bookings yet."));
    assert!(state.store.list_bookings().await.unwrap().is_empty());
    assert_eq!(state.board.startup("5").unwrap().spots, 4);

    admin.post("/admin/leave", &[]).await;
    assert!(!admin.cookies.contains_key("__Host_admin"));
    let (_, page) = admin.get("/").await;
    assert!(page.contains("Select Your Room"));
}

#[tokio::test]
async fn stylesheet_is_cached_by_etag() {
    let state = app().await;
    let mut browser = Browser::new(&state);

    let response = browser
        .send(Request::builder().uri("/index.css"), String::new())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let etag = response.headers()[ETAG].clone();

    let response = browser
        .send(
            Request::builder()
                .uri("/index.css")
                .header(IF_NONE_MATCH, etag),
            String::new(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn events_are_a_stream() {
    let state = app().await;
    let mut browser = Browser::new(&state);
    let response = browser
        .send(Request::builder().uri("/events"), String::new())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");
}
