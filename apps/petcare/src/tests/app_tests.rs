use super::*;

use std::time::Duration;

use view_core::QueryKey;

use crate::api::{HOME_KEY, NOTIFICATIONS_KEY, SERVICE_CATALOG_KEY};

fn app_at(route: Route, api: MockApi) -> PetcareApp {
    let cache = QueryCache::try_current().expect("runtime");
    PetcareApp::new(cache, api, route)
}

fn output_text(out: Vec<u8>) -> String {
    String::from_utf8(out).expect("utf8 output")
}

#[tokio::test]
async fn scripted_reservation_books_and_returns_home() {
    let mut app = app_at(Route::Reservation, MockApi::new(Duration::ZERO));
    let mut out = Vec::new();

    // date, service, back, service, book
    run(&mut app, &b""[..], &mut out, vec![1, 2, 2, 1, 1])
        .await
        .expect("script runs");

    let booking = app.last_booking().expect("booking recorded");
    assert_eq!(booking.date.as_deref(), Some("2025-12-15 (Mon)"));
    assert_eq!(booking.service_name.as_deref(), Some("Daycare (full day)"));
    assert_eq!(booking.price, 35_000);

    assert_eq!(app.route(), Route::Home);
    assert!(app.view().contains_text("Hello, Dubu mom!"));

    let text = output_text(out);
    assert!(text.contains("Loading services..."));
    assert!(text.contains("Please confirm your reservation"));
    assert!(text.contains("Total: 50,000원"));
    assert!(text.contains("(!) Reservation requested: Daycare (full day) on 2025-12-15 (Mon)."));
}

#[tokio::test]
async fn scripted_retry_recovers_a_failed_catalog() {
    let api = MockApi::new(Duration::ZERO);
    api.fail_first(SERVICE_CATALOG_KEY, 1);
    let mut app = app_at(Route::Reservation, api);
    let mut out = Vec::new();

    // date, retry, second service
    run(&mut app, &b""[..], &mut out, vec![1, 1, 2])
        .await
        .expect("script runs");

    assert!(app.view().contains_text("Service: Hygiene grooming"));
    let text = output_text(out);
    assert!(text.contains("Could not load services: network error"));
    assert!(text.contains("Check your connection and retry."));
    assert!(text.contains("Date: 2025-12-15 (Mon)"));
}

#[tokio::test]
async fn events_for_a_torn_down_screen_are_ignored() {
    let mut app = app_at(Route::Notifications, MockApi::new(Duration::from_secs(60)));
    app.render();
    assert!(app.is_pending());
    assert!(app.is_relevant(&CacheEvent::Settled {
        key: QueryKey::from(NOTIFICATIONS_KEY),
        ok: true,
    }));

    let flow = app.apply(Action::Open(Route::Home));
    assert_eq!(flow, Flow::Navigate(Route::Home));
    app.render();

    assert!(!app.is_relevant(&CacheEvent::Settled {
        key: QueryKey::from(NOTIFICATIONS_KEY),
        ok: true,
    }));
    assert!(app.is_relevant(&CacheEvent::Settled {
        key: QueryKey::from(HOME_KEY),
        ok: true,
    }));
}

#[tokio::test]
async fn interactive_input_reports_unknown_choices() {
    let mut app = app_at(Route::Home, MockApi::new(Duration::from_secs(60)));
    let mut out = Vec::new();

    run(&mut app, &b"42\nq\n"[..], &mut out, Vec::new())
        .await
        .expect("session runs");

    let text = output_text(out);
    assert!(text.contains("---- Home ----"));
    assert!(text.contains("Type a listed number, or q to quit."));
}

#[tokio::test]
async fn pressing_a_missing_button_is_rejected() {
    let mut app = app_at(Route::Home, MockApi::new(Duration::from_secs(60)));
    app.render();
    assert_eq!(app.press(0), None);
    assert_eq!(app.press(99), None);
    assert_eq!(app.press(1), Some(Flow::Navigate(Route::Notifications)));
    assert_eq!(app.route(), Route::Notifications);
}

#[tokio::test]
async fn notifications_list_marks_unread_entries() {
    let mut app = app_at(Route::Notifications, MockApi::new(Duration::ZERO));
    let mut events = app.cache().subscribe();
    assert!(app.render().contains_text("Loading notifications..."));

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("settled in time")
        .expect("channel open");
    assert!(app.is_relevant(&event));

    let view = app.render();
    assert!(view.contains_text("Notifications (2 unread)"));
    assert!(view.contains_text("● [Reservation] Reservation confirmed · 10 min ago"));
    assert!(view.contains_text("[Notice] Holiday hours"));
}
