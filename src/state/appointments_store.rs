// ============================================================================
// APPOINTMENTS STORE - the signed-in user's appointments
// ============================================================================
// The collection is never edited locally: every mutation is followed by a
// full refresh so it always mirrors what the backend returned last. Nothing
// here is persisted.
// ============================================================================

use crate::models::{Appointment, AppointmentPatch, Credential, NewAppointment};
use crate::services::{ApiClient, ApiError};
use crate::state::reactivity::{BusyGuard, ReactiveState, Spawner, SubscriptionId};
use crate::state::session_manager::SessionHandle;
use crate::utils::constants::{
    MSG_ADD_APPOINTMENT_FAILED, MSG_DELETE_APPOINTMENT_FAILED, MSG_EDIT_APPOINTMENT_FAILED,
    MSG_LOAD_APPOINTMENTS_FAILED, MSG_NOT_SIGNED_IN,
};
use crate::utils::validation::validate_new_appointment;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub struct AppointmentsStore {
    api: ApiClient,
    session: Rc<dyn SessionHandle>,
    appointments: ReactiveState<Vec<Appointment>>,
    error: RefCell<Option<String>>,
    in_flight: Cell<usize>,
    binding: Cell<Option<SubscriptionId>>,
}

impl AppointmentsStore {
    pub fn new(api: ApiClient, session: Rc<dyn SessionHandle>) -> Rc<Self> {
        Rc::new(Self {
            api,
            session,
            appointments: ReactiveState::new(Vec::new()),
            error: RefCell::new(None),
            in_flight: Cell::new(0),
            binding: Cell::new(None),
        })
    }

    /// Follows the session's liveness flag: going live spawns a refresh,
    /// going dead clears the collection on the spot. Refreshes right away
    /// when the session is already live.
    pub fn bind(self: &Rc<Self>, spawner: Rc<dyn Spawner>) -> SubscriptionId {
        if let Some(previous) = self.binding.take() {
            self.session.unsubscribe_liveness(previous);
        }

        let weak = Rc::downgrade(self);
        let task_spawner = spawner.clone();
        let id = self.session.subscribe_liveness(Box::new(move |live: &bool| {
            let Some(store) = weak.upgrade() else {
                return;
            };
            if *live {
                log::debug!("[APPOINTMENTS] Session is live, refreshing");
                task_spawner.spawn(Box::pin(async move { store.refresh().await }));
            } else {
                log::debug!("[APPOINTMENTS] Session ended, clearing");
                store.clear();
            }
        }));
        self.binding.set(Some(id));

        if self.session.is_logged_in() {
            let store = self.clone();
            spawner.spawn(Box::pin(async move { store.refresh().await }));
        }
        id
    }

    pub fn unbind(&self) {
        if let Some(id) = self.binding.take() {
            self.session.unsubscribe_liveness(id);
        }
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    pub fn appointments(&self) -> Vec<Appointment> {
        self.appointments.get()
    }

    pub fn find(&self, id: &str) -> Option<Appointment> {
        self.appointments.get().into_iter().find(|a| a.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.get() > 0
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    /// Called with the new collection after every replacement.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Vec<Appointment>) + 'static,
    {
        self.appointments.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.appointments.unsubscribe(id)
    }

    /// Empties the collection and the error without touching the network.
    pub fn clear(&self) {
        self.set_error(None);
        self.appointments.set_if_changed(Vec::new());
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Replaces the collection with the backend's. On failure the collection
    /// is emptied and an error message set.
    pub async fn refresh(&self) {
        let _busy = BusyGuard::enter(&self.in_flight);
        self.set_error(None);

        let Some(credential) = self.session.credential() else {
            log::warn!("⚠️ [APPOINTMENTS] Refresh without a session");
            self.appointments.set_if_changed(Vec::new());
            self.set_error(Some(MSG_NOT_SIGNED_IN));
            return;
        };

        let result = self.api.list_appointments(&credential).await;
        if !self.still_current(&credential) {
            log::debug!("[APPOINTMENTS] Dropping result fetched for an ended session");
            return;
        }

        match result {
            Ok(appointments) => {
                log::info!("📅 [APPOINTMENTS] Loaded {} appointments", appointments.len());
                self.appointments.set(appointments);
            }
            Err(e) => {
                log::warn!("❌ [APPOINTMENTS] Load failed: {}", e);
                self.appointments.set(Vec::new());
                self.set_error(Some(MSG_LOAD_APPOINTMENTS_FAILED));
            }
        }
    }

    /// Returns whether the backend accepted the new appointment.
    pub async fn add(&self, data: NewAppointment) -> bool {
        let _busy = BusyGuard::enter(&self.in_flight);
        if let Err(e) = validate_new_appointment(&data) {
            self.set_error(Some(e.to_string().as_str()));
            return false;
        }
        let Some(credential) = self.require_credential() else {
            return false;
        };

        log::info!("➕ [APPOINTMENTS] Adding appointment with {}", data.doctor);
        let result = self.api.create_appointment(&credential, &data).await;
        self.settle_mutation(result, MSG_ADD_APPOINTMENT_FAILED).await
    }

    pub async fn edit(&self, id: &str, patch: AppointmentPatch) -> bool {
        let _busy = BusyGuard::enter(&self.in_flight);
        let Some(credential) = self.require_credential() else {
            return false;
        };

        log::info!("✏️ [APPOINTMENTS] Editing appointment {}", id);
        let result = self.api.update_appointment(&credential, id, &patch).await;
        self.settle_mutation(result, MSG_EDIT_APPOINTMENT_FAILED).await
    }

    pub async fn remove(&self, id: &str) -> bool {
        let _busy = BusyGuard::enter(&self.in_flight);
        let Some(credential) = self.require_credential() else {
            return false;
        };

        log::info!("🗑️ [APPOINTMENTS] Deleting appointment {}", id);
        let result = self.api.delete_appointment(&credential, id).await;
        self.settle_mutation(result, MSG_DELETE_APPOINTMENT_FAILED).await
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    // Resync after every outcome except a connection failure, where the
    // backend state cannot have moved and a refresh would only fail again.
    async fn settle_mutation(&self, result: Result<(), ApiError>, failure: &str) -> bool {
        match result {
            Ok(()) => {
                self.refresh().await;
                true
            }
            Err(e) if e.is_connection_failure() => {
                log::warn!("📡 [APPOINTMENTS] {} (offline, not resyncing): {}", failure, e);
                self.set_error(Some(failure));
                false
            }
            Err(e) => {
                log::warn!("❌ [APPOINTMENTS] {}: {}", failure, e);
                self.refresh().await;
                self.set_error(Some(failure));
                false
            }
        }
    }

    fn require_credential(&self) -> Option<Credential> {
        let credential = self.session.credential();
        if credential.is_none() {
            self.set_error(Some(MSG_NOT_SIGNED_IN));
        }
        credential
    }

    fn still_current(&self, credential: &Credential) -> bool {
        self.session.is_logged_in() && self.session.credential().as_ref() == Some(credential)
    }

    fn set_error(&self, message: Option<&str>) {
        *self.error.borrow_mut() = message.map(str::to_string);
    }
}

impl Drop for AppointmentsStore {
    fn drop(&mut self) {
        self.unbind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Method;
    use crate::state::session_manager::SessionManager;
    use crate::testing::{MockReply, MockTransport, RecordingNavigator};
    use crate::utils::clock::SystemClock;
    use crate::utils::storage::MemoryStorage;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Harness {
        mock: Rc<MockTransport>,
        session: Rc<SessionManager>,
        store: Rc<AppointmentsStore>,
    }

    fn harness() -> Harness {
        let mock = MockTransport::new();
        let api = ApiClient::new("http://api.test", mock.clone());
        let session = Rc::new(SessionManager::new(
            api.clone(),
            Rc::new(MemoryStorage::new()),
            RecordingNavigator::new(),
            Rc::new(SystemClock),
        ));
        let store = AppointmentsStore::new(api, session.clone());
        Harness { mock, session, store }
    }

    fn appt(id: &str, doctor: &str) -> serde_json::Value {
        json!({"_id": id, "doctor": doctor, "date": "2025-03-01T10:00", "reason": "Checkup"})
    }

    fn signed_in() -> Harness {
        let h = harness();
        h.mock.on(Method::Post, "/api/auth/login", MockReply::json(200, json!({"token": "tok"})));
        h.mock.on(
            Method::Get,
            "/api/profile",
            MockReply::json(200, json!({"_id": "u1", "name": "Demo", "email": "demo@medpal.com"})),
        );
        assert!(block_on(h.session.login("demo@medpal.com", "password")));
        h
    }

    fn ids(store: &AppointmentsStore) -> Vec<String> {
        store.appointments().into_iter().map(|a| a.id).collect()
    }

    #[test]
    fn refresh_accepts_wrapped_and_bare_lists() {
        let h = signed_in();
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!({"appointments": [appt("a1", "Dr. A")]})),
        );
        block_on(h.store.refresh());
        assert_eq!(ids(&h.store), vec!["a1"]);

        h.mock.clear_route(Method::Get, "/api/appointments");
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!([appt("b1", "Dr. B"), appt("b2", "Dr. C")])),
        );
        block_on(h.store.refresh());
        assert_eq!(ids(&h.store), vec!["b1", "b2"]);
        assert_eq!(h.store.error(), None);
    }

    #[test]
    fn failed_refresh_empties_and_flags_error() {
        let h = signed_in();
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!([appt("a1", "Dr. A")])),
        );
        block_on(h.store.refresh());
        assert_eq!(h.store.appointments().len(), 1);

        h.mock.clear_route(Method::Get, "/api/appointments");
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(500, json!({"message": "db down"})),
        );
        block_on(h.store.refresh());

        assert!(h.store.appointments().is_empty());
        assert_eq!(h.store.error().as_deref(), Some(MSG_LOAD_APPOINTMENTS_FAILED));
        assert!(!h.store.is_loading());
    }

    #[test]
    fn record_without_reason_still_loads_with_the_rest() {
        let h = signed_in();
        let bare = json!({"_id": "a2", "doctor": "Dr. B", "date": "2025-03-02T09:00"});
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!([appt("a1", "Dr. A"), bare])),
        );

        block_on(h.store.refresh());

        assert_eq!(ids(&h.store), vec!["a1", "a2"]);
        assert_eq!(h.store.error(), None);
        assert_eq!(h.store.find("a2").unwrap().reason, "");
    }

    #[test]
    fn refresh_while_signed_out_makes_no_request() {
        let h = harness();
        block_on(h.store.refresh());
        assert_eq!(h.mock.request_count(), 0);
        assert_eq!(h.store.error().as_deref(), Some(MSG_NOT_SIGNED_IN));
    }

    #[test]
    fn add_resyncs_to_backend_truth() {
        let h = signed_in();
        h.mock.on(Method::Post, "/api/appointments", MockReply::status(201));
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!({"appointments": [appt("srv-1", "Dr. Lee")]})),
        );

        let data = NewAppointment::new("Dr. Lee", "2025-03-01T10:00", "Checkup");
        assert!(block_on(h.store.add(data)));

        assert_eq!(h.mock.count(Method::Post, "/api/appointments"), 1);
        assert_eq!(h.mock.count(Method::Get, "/api/appointments"), 1);
        let stored = h.store.find("srv-1").unwrap();
        assert_eq!(stored.doctor, "Dr. Lee");
        assert_eq!(h.store.error(), None);
    }

    #[test]
    fn add_with_blank_fields_is_rejected_offline() {
        let h = signed_in();
        let before = h.mock.request_count();
        assert!(!block_on(h.store.add(NewAppointment::new("  ", "2025-03-01", "Checkup"))));
        assert_eq!(h.mock.request_count(), before);
        assert!(h.store.error().is_some());
    }

    #[test]
    fn remove_of_unknown_id_still_resyncs() {
        let h = signed_in();
        h.mock.on(
            Method::Delete,
            "/api/appointments/ghost",
            MockReply::json(404, json!({"message": "Not found"})),
        );
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!([appt("a1", "Dr. A")])),
        );

        assert!(!block_on(h.store.remove("ghost")));

        assert_eq!(h.mock.count(Method::Get, "/api/appointments"), 1);
        assert_eq!(ids(&h.store), vec!["a1"]);
        assert_eq!(h.store.error().as_deref(), Some(MSG_DELETE_APPOINTMENT_FAILED));
        assert!(!h.store.is_loading());
    }

    #[test]
    fn edit_sends_only_set_fields() {
        let h = signed_in();
        h.mock.on(Method::Put, "/api/appointments/a1", MockReply::status(200));
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!([appt("a1", "Dr. A")])),
        );

        let patch = AppointmentPatch {
            reason: Some("Follow-up".into()),
            ..Default::default()
        };
        assert!(block_on(h.store.edit("a1", patch)));

        let put = h.mock.requests().into_iter().find(|r| r.method == Method::Put).unwrap();
        assert_eq!(put.body, crate::services::RequestBody::Json(json!({"reason": "Follow-up"})));
    }

    #[test]
    fn connection_failure_skips_resync_and_keeps_collection() {
        let h = signed_in();
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!([appt("a1", "Dr. A")])),
        );
        block_on(h.store.refresh());

        h.mock.on(Method::Put, "/api/appointments/a1", MockReply::network_error("offline"));
        assert!(!block_on(h.store.edit("a1", AppointmentPatch::default())));

        assert_eq!(h.mock.count(Method::Get, "/api/appointments"), 1);
        assert_eq!(ids(&h.store), vec!["a1"]);
        assert_eq!(h.store.error().as_deref(), Some(MSG_EDIT_APPOINTMENT_FAILED));
        assert!(!h.store.is_loading());
    }

    #[test]
    fn overlapping_adds_end_with_the_last_refresh_to_settle() {
        let h = signed_in();
        h.mock.on(Method::Post, "/api/appointments", MockReply::status(201));
        let first_list = h.mock.on_deferred(Method::Get, "/api/appointments");
        let second_list = h.mock.on_deferred(Method::Get, "/api/appointments");

        let mut pool = LocalPool::new();
        for doctor in ["Dr. A", "Dr. B"] {
            let store = h.store.clone();
            pool.spawner()
                .spawn_local(async move {
                    store
                        .add(NewAppointment::new(doctor, "2025-03-01T10:00", "Checkup"))
                        .await;
                })
                .unwrap();
        }
        pool.run_until_stalled();
        assert_eq!(h.mock.count(Method::Post, "/api/appointments"), 2);
        assert_eq!(h.mock.count(Method::Get, "/api/appointments"), 2);
        assert!(h.store.is_loading());

        // settle in reverse order: the first request's answer lands last
        second_list.send(MockReply::json(200, json!([appt("b1", "Dr. B")]))).unwrap();
        pool.run_until_stalled();
        assert_eq!(ids(&h.store), vec!["b1"]);
        assert!(h.store.is_loading());

        first_list.send(MockReply::json(200, json!([appt("a1", "Dr. A")]))).unwrap();
        pool.run_until_stalled();
        assert_eq!(ids(&h.store), vec!["a1"]);
        assert!(!h.store.is_loading());
    }

    #[test]
    fn logout_clears_synchronously_without_network() {
        let h = signed_in();
        let mut pool = LocalPool::new();
        h.store.bind(Rc::new(pool.spawner()));
        let five: Vec<_> = (1..=5).map(|i| appt(&format!("a{}", i), "Dr. A")).collect();
        h.mock.on(Method::Get, "/api/appointments", MockReply::json(200, json!(five)));
        pool.run_until_stalled();
        assert_eq!(h.store.appointments().len(), 5);

        let requests_before = h.mock.request_count();
        h.session.logout();

        assert!(h.store.appointments().is_empty());
        pool.run_until_stalled();
        assert_eq!(h.mock.request_count(), requests_before);
    }

    #[test]
    fn login_triggers_refresh_after_liveness_flips() {
        let h = harness();
        let mut pool = LocalPool::new();
        h.store.bind(Rc::new(pool.spawner()));
        h.mock.on(Method::Post, "/api/auth/login", MockReply::json(200, json!({"token": "tok"})));
        h.mock.on(
            Method::Get,
            "/api/profile",
            MockReply::json(200, json!({"_id": "u1", "name": "Demo", "email": "demo@medpal.com"})),
        );
        h.mock.on(
            Method::Get,
            "/api/appointments",
            MockReply::json(200, json!([appt("a1", "Dr. A")])),
        );

        assert!(block_on(h.session.login("demo@medpal.com", "password")));
        assert_eq!(h.mock.count(Method::Get, "/api/appointments"), 0);

        pool.run_until_stalled();
        assert_eq!(ids(&h.store), vec!["a1"]);
        let list_call = h.mock.requests().into_iter().last().unwrap();
        assert_eq!(list_call.bearer.map(|c| c.as_str().to_string()).as_deref(), Some("tok"));
    }

    #[test]
    fn refresh_settling_after_logout_is_dropped() {
        let h = signed_in();
        let release = h.mock.on_deferred(Method::Get, "/api/appointments");
        let mut pool = LocalPool::new();
        h.store.bind(Rc::new(pool.spawner()));
        pool.run_until_stalled();
        assert!(h.store.is_loading());

        h.session.logout();
        release.send(MockReply::json(200, json!([appt("a1", "Dr. A")]))).unwrap();
        pool.run_until_stalled();

        assert!(h.store.appointments().is_empty());
        assert!(!h.store.is_loading());
        assert_eq!(h.store.error(), None);
    }

    #[test]
    fn dropping_the_store_detaches_it_from_the_session() {
        let h = harness();
        let pool = LocalPool::new();
        h.store.bind(Rc::new(pool.spawner()));
        let Harness { session, store, .. } = h;
        drop(store);
        // the subscription is gone, so logging out touches nothing
        session.logout();
    }
}
