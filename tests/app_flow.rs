//! End-to-end flows through `AppState` against a scripted backend.

use futures::executor::{block_on, LocalPool};
use medpal_client::models::NewAppointment;
use medpal_client::services::Method;
use medpal_client::state::{AppServices, AppState, RouteAccess, SessionPhase};
use medpal_client::testing::{MockReply, MockTransport, RecordingNavigator};
use medpal_client::utils::clock::FixedClock;
use medpal_client::utils::constants::{
    MSG_DELETE_APPOINTMENT_FAILED, STORAGE_KEY_TOKEN, STORAGE_KEY_USER,
};
use medpal_client::utils::storage::{KeyValueStorage, MemoryStorage};
use medpal_client::AppConfig;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::rc::Rc;

struct World {
    pool: LocalPool,
    mock: Rc<MockTransport>,
    storage: MemoryStorage,
    navigator: Rc<RecordingNavigator>,
    app: AppState,
}

fn world_with(storage: MemoryStorage) -> World {
    let pool = LocalPool::new();
    let mock = MockTransport::new();
    let navigator = RecordingNavigator::new();
    let services = AppServices {
        transport: mock.clone(),
        storage: Rc::new(storage.clone()),
        navigator: navigator.clone(),
        spawner: Rc::new(pool.spawner()),
        clock: Rc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap())),
    };
    let app = AppState::new(AppConfig::for_backend("http://api.test"), services);
    World { pool, mock, storage, navigator, app }
}

fn world() -> World {
    world_with(MemoryStorage::new())
}

fn demo_backend(mock: &MockTransport) {
    mock.on(
        Method::Post,
        "/api/auth/login",
        MockReply::json(200, json!({"token": "demo-token", "user": {}})),
    );
    mock.on(
        Method::Get,
        "/api/profile",
        MockReply::json(
            200,
            json!({"_id": "u-demo", "name": "Demo User", "email": "demo@medpal.com"}),
        ),
    );
}

fn appt(id: &str, doctor: &str) -> serde_json::Value {
    json!({"_id": id, "doctor": doctor, "date": "2025-03-01T10:00", "reason": "Checkup"})
}

#[test]
fn demo_login_loads_profile_and_appointments() {
    let mut w = world();
    demo_backend(&w.mock);
    w.mock.on(
        Method::Get,
        "/api/appointments",
        MockReply::json(200, json!({"appointments": [appt("a1", "Dr. Who")]})),
    );

    assert!(block_on(w.app.session.login("demo@medpal.com", "password")));
    w.pool.run_until_stalled();

    assert_eq!(w.app.route_access(), RouteAccess::Granted);
    assert_eq!(w.app.session.user().unwrap().name, "Demo User");
    assert_eq!(w.app.appointments.appointments().len(), 1);
    assert_eq!(w.storage.get_item(STORAGE_KEY_TOKEN).unwrap().as_deref(), Some("demo-token"));
    assert_eq!(w.app.dashboard().next_appointment().unwrap().id, "a1");
}

#[test]
fn register_with_short_password_never_reaches_backend() {
    let w = world();
    assert!(!block_on(w.app.session.register("Jane", "jane@x.com", "short")));
    assert_eq!(w.mock.request_count(), 0);
    assert!(!w.app.session.is_logged_in());
}

#[test]
fn add_appointment_round_trips_to_backend_truth() {
    let mut w = world();
    demo_backend(&w.mock);
    w.mock.on(Method::Get, "/api/appointments", MockReply::json(200, json!([])));
    assert!(block_on(w.app.session.login("demo@medpal.com", "password")));
    w.pool.run_until_stalled();
    assert!(w.app.appointments.appointments().is_empty());

    w.mock.on(Method::Post, "/api/appointments", MockReply::json(201, json!({"ok": true})));
    w.mock.on(
        Method::Get,
        "/api/appointments",
        MockReply::json(200, json!([appt("srv-7", "Dr. Lee")])),
    );

    let data = NewAppointment::new("Dr. Lee", "2025-03-01T10:00", "Checkup");
    assert!(block_on(w.app.appointments.add(data)));

    let list = w.app.appointments.appointments();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "srv-7");
    assert_eq!(list[0].doctor, "Dr. Lee");
}

#[test]
fn removing_unknown_id_resyncs_and_reports() {
    let mut w = world();
    demo_backend(&w.mock);
    w.mock.on(Method::Get, "/api/appointments", MockReply::json(200, json!([appt("a1", "Dr. A")])));
    assert!(block_on(w.app.session.login("demo@medpal.com", "password")));
    w.pool.run_until_stalled();

    w.mock.on(
        Method::Delete,
        "/api/appointments/missing",
        MockReply::json(404, json!({"message": "Not found"})),
    );
    assert!(!block_on(w.app.appointments.remove("missing")));

    assert_eq!(w.mock.count(Method::Get, "/api/appointments"), 2);
    assert_eq!(w.app.appointments.appointments().len(), 1);
    assert_eq!(w.app.appointments.error().as_deref(), Some(MSG_DELETE_APPOINTMENT_FAILED));
}

#[test]
fn logout_clears_everything_synchronously() {
    let mut w = world();
    demo_backend(&w.mock);
    let five: Vec<_> = (1..=5).map(|i| appt(&format!("a{}", i), "Dr. A")).collect();
    w.mock.on(Method::Get, "/api/appointments", MockReply::json(200, json!(five)));
    assert!(block_on(w.app.session.login("demo@medpal.com", "password")));
    w.pool.run_until_stalled();
    assert_eq!(w.app.appointments.appointments().len(), 5);
    let before = w.mock.request_count();

    w.app.session.logout();

    assert!(w.app.appointments.appointments().is_empty());
    assert_eq!(w.app.session.user(), None);
    assert!(!w.storage.contains_key(STORAGE_KEY_TOKEN));
    assert!(!w.storage.contains_key(STORAGE_KEY_USER));
    assert_eq!(w.navigator.home_visits(), 1);
    assert_eq!(w.app.route_access(), RouteAccess::RedirectToLogin);
    w.pool.run_until_stalled();
    assert_eq!(w.mock.request_count(), before);
}

#[test]
fn startup_with_valid_stored_credential() {
    let storage = MemoryStorage::new();
    storage.set_item(STORAGE_KEY_TOKEN, "remembered").unwrap();
    let mut w = world_with(storage);
    demo_backend(&w.mock);
    w.mock.on(Method::Get, "/api/appointments", MockReply::json(200, json!([appt("a1", "Dr. A")])));

    assert_eq!(w.app.route_access(), RouteAccess::Pending);
    w.app.launch();
    w.pool.run_until_stalled();

    assert_eq!(w.app.session.phase(), SessionPhase::Authenticated);
    assert_eq!(w.app.appointments.appointments().len(), 1);
    assert_eq!(w.mock.count(Method::Post, "/api/auth/login"), 0);
}

#[test]
fn startup_with_rejected_credential_starts_anonymous() {
    let storage = MemoryStorage::new();
    storage.set_item(STORAGE_KEY_TOKEN, "stale").unwrap();
    let w = world_with(storage);
    w.mock.on(
        Method::Get,
        "/api/profile",
        MockReply::json(401, json!({"message": "invalid token"})),
    );

    assert_eq!(block_on(w.app.start()), SessionPhase::Anonymous);
    assert!(w.storage.is_empty());
    assert_eq!(w.mock.count(Method::Get, "/api/appointments"), 0);
    assert_eq!(w.navigator.home_visits(), 0);
    assert_eq!(w.app.route_access(), RouteAccess::RedirectToLogin);
}

#[test]
fn switching_accounts_reloads_for_the_new_user() {
    let mut w = world();
    demo_backend(&w.mock);
    w.mock.on(Method::Get, "/api/appointments", MockReply::json(200, json!([appt("a1", "Dr. A")])));
    assert!(block_on(w.app.session.login("demo@medpal.com", "password")));
    w.pool.run_until_stalled();

    w.mock.clear_route(Method::Post, "/api/auth/login");
    w.mock.clear_route(Method::Get, "/api/profile");
    w.mock.clear_route(Method::Get, "/api/appointments");
    w.mock.on(
        Method::Post,
        "/api/auth/login",
        MockReply::json(200, json!({"token": "other-token"})),
    );
    w.mock.on(
        Method::Get,
        "/api/profile",
        MockReply::json(200, json!({"_id": "u2", "name": "Other", "email": "o@x.com"})),
    );
    w.mock.on(
        Method::Get,
        "/api/appointments",
        MockReply::json(200, json!([appt("b1", "Dr. B"), appt("b2", "Dr. C")])),
    );

    assert!(block_on(w.app.session.login("o@x.com", "password")));
    // previous user's data is gone before the new list arrives
    assert!(w.app.appointments.appointments().is_empty());
    w.pool.run_until_stalled();

    let ids: Vec<_> = w.app.appointments.appointments().into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["b1", "b2"]);
    let last = w.mock.requests().into_iter().last().unwrap();
    assert_eq!(last.bearer.unwrap().as_str(), "other-token");
}

#[test]
fn shutdown_detaches_store() {
    let mut w = world();
    demo_backend(&w.mock);
    w.app.shutdown();

    assert!(block_on(w.app.session.login("demo@medpal.com", "password")));
    w.pool.run_until_stalled();
    assert_eq!(w.mock.count(Method::Get, "/api/appointments"), 0);
}
