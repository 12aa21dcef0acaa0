// ============================================================================
// SESSION MANAGER - single source of truth for "who is logged in"
// ============================================================================
// Owns the credential, the user profile and the liveness flag. Everything
// else reads them through `SessionHandle`. Durable storage mirrors the
// credential and the sanitized user; memory stays authoritative when a write
// to storage fails.
// ============================================================================

use crate::models::{Credential, User};
use crate::services::{ApiClient, ApiError};
use crate::state::navigation::Navigator;
use crate::state::reactivity::{BusyGuard, ReactiveState, SubscriptionId};
use crate::utils::clock::{CacheBust, Clock};
use crate::utils::constants::{STORAGE_KEY_TOKEN, STORAGE_KEY_USER};
use crate::utils::storage::{
    load_from_storage, remove_from_storage, save_to_storage, KeyValueStorage, StorageError,
};
use crate::utils::validation::{validate_login, validate_new_account};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Constructed, stored credential not looked at yet.
    Unknown,
    /// Startup validation of a stored credential in flight.
    Authenticating,
    Authenticated,
    Anonymous,
}

/// Read-only view of the session handed to other state containers.
pub trait SessionHandle {
    fn credential(&self) -> Option<Credential>;
    fn is_logged_in(&self) -> bool;
    /// Called after every change of the liveness flag, with the new value.
    fn subscribe_liveness(&self, callback: Box<dyn Fn(&bool)>) -> SubscriptionId;
    fn unsubscribe_liveness(&self, id: SubscriptionId) -> bool;
}

pub struct SessionManager {
    api: ApiClient,
    storage: Rc<dyn KeyValueStorage>,
    navigator: Rc<dyn Navigator>,
    clock: Rc<dyn Clock>,

    phase: Cell<SessionPhase>,
    credential: RefCell<Option<Credential>>,
    user: RefCell<Option<User>>,
    logged_in: ReactiveState<bool>,
    auth_in_flight: Cell<usize>,
    profile_image_ts: CacheBust,
    // Bumped whenever the session is established or torn down, so results of
    // requests started under an older session are dropped.
    generation: Cell<u64>,
}

fn report_storage_failure(action: &str, err: StorageError) {
    match err {
        StorageError::QuotaExceeded => {
            log::error!("💾 [SESSION] localStorage quota exceeded. {} not saved.", action)
        }
        other => log::warn!("⚠️ [SESSION] {} failed: {}", action, other),
    }
}

impl SessionManager {
    pub fn new(
        api: ApiClient,
        storage: Rc<dyn KeyValueStorage>,
        navigator: Rc<dyn Navigator>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let profile_image_ts = CacheBust::new(clock.as_ref());
        Self {
            api,
            storage,
            navigator,
            clock,
            phase: Cell::new(SessionPhase::Unknown),
            credential: RefCell::new(None),
            user: RefCell::new(None),
            logged_in: ReactiveState::new(false),
            auth_in_flight: Cell::new(0),
            profile_image_ts,
            generation: Cell::new(0),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase.get()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.get()
    }

    /// True only while a stored credential is being validated at startup.
    pub fn is_loading(&self) -> bool {
        self.phase.get() == SessionPhase::Authenticating
    }

    /// True while a login or register call is in flight.
    pub fn is_busy(&self) -> bool {
        self.auth_in_flight.get() > 0
    }

    pub fn user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.credential.borrow().clone()
    }

    pub fn profile_image_ts(&self) -> i64 {
        self.profile_image_ts.current()
    }

    /// New avatar cache-bust value; call after the profile picture changed.
    pub fn touch_profile_image(&self) -> i64 {
        self.profile_image_ts.stamp(self.clock.as_ref())
    }

    /// Avatar URL for the current user, if any.
    pub fn profile_image_url(&self) -> Option<String> {
        self.user
            .borrow()
            .as_ref()
            .map(|user| self.api.profile_image_url(&user.id, self.profile_image_ts()))
    }

    // ------------------------------------------------------------------------
    // Startup
    // ------------------------------------------------------------------------

    /// Validates a stored credential against the backend. Runs once; later
    /// calls just report the current phase.
    pub async fn initialize(&self) -> SessionPhase {
        if self.phase.get() != SessionPhase::Unknown {
            log::warn!("⚠️ [SESSION] initialize called twice, ignoring");
            return self.phase.get();
        }

        let stored = match self.storage.get_item(STORAGE_KEY_TOKEN) {
            Ok(token) => token.map(Credential::new).filter(|c| !c.is_empty()),
            Err(e) => {
                log::warn!("⚠️ [SESSION] Could not read stored credential: {}", e);
                None
            }
        };

        let Some(credential) = stored else {
            log::info!("👤 [SESSION] No stored credential, starting anonymous");
            self.reset_session();
            return self.phase.get();
        };

        // Last known profile, shown while the credential is being checked
        if let Some(cached) = load_from_storage::<User>(self.storage.as_ref(), STORAGE_KEY_USER) {
            *self.user.borrow_mut() = Some(cached);
        }

        self.phase.set(SessionPhase::Authenticating);
        let generation = self.generation.get();
        log::info!("🔐 [SESSION] Validating stored credential...");

        let result = self.api.get_profile(&credential).await;
        if self.generation.get() != generation {
            log::info!("[SESSION] Startup validation superseded by a newer session");
            return self.phase.get();
        }

        match result {
            Ok(user) => {
                log::info!("✅ [SESSION] Session restored for {}", user.email);
                self.establish(credential, user);
            }
            Err(e) => {
                log::warn!("❌ [SESSION] Stored credential rejected ({}), clearing session", e);
                self.reset_session();
            }
        }
        self.phase.get()
    }

    // ------------------------------------------------------------------------
    // Login / register / logout
    // ------------------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> bool {
        if let Err(e) = validate_login(email, password) {
            log::warn!("⚠️ [SESSION] Login rejected before sending: {}", e);
            return false;
        }
        let _busy = BusyGuard::enter(&self.auth_in_flight);
        log::info!("🔐 [SESSION] Logging in {}", email);

        match self.api.login(email, password).await {
            Ok(credential) => self.complete_sign_in(credential).await,
            Err(e) => {
                log::warn!("❌ [SESSION] Login failed for {}: {}", email, e);
                false
            }
        }
    }

    /// Creates the account and signs straight into it.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> bool {
        if let Err(e) = validate_new_account(name, email, password) {
            log::warn!("⚠️ [SESSION] Registration rejected before sending: {}", e);
            return false;
        }
        let _busy = BusyGuard::enter(&self.auth_in_flight);
        log::info!("📝 [SESSION] Registering {}", email);

        match self.api.register(name, email, password).await {
            Ok(credential) => self.complete_sign_in(credential).await,
            Err(e) => {
                log::warn!("❌ [SESSION] Registration failed for {}: {}", email, e);
                false
            }
        }
    }

    // The profile is fetched before anything is committed, so a failure here
    // leaves the previous session untouched.
    async fn complete_sign_in(&self, credential: Credential) -> bool {
        match self.api.get_profile(&credential).await {
            Ok(user) => {
                log::info!("✅ [SESSION] Signed in as {}", user.email);
                self.establish(credential, user);
                self.touch_profile_image();
                true
            }
            Err(e) => {
                log::warn!("❌ [SESSION] Profile fetch after sign-in failed: {}", e);
                false
            }
        }
    }

    /// Hard reset: clears everything and sends the browser home.
    pub fn logout(&self) {
        log::info!("👋 [SESSION] Logout");
        self.reset_session();
        self.touch_profile_image();
        self.navigator.navigate_home();
    }

    /// Re-fetches the profile with the current credential. No-op when signed out.
    pub async fn refresh_user(&self) -> Result<(), ApiError> {
        let Some(credential) = self.credential() else {
            return Ok(());
        };
        let generation = self.generation.get();

        let user = self.api.get_profile(&credential).await?;
        if self.generation.get() != generation {
            log::debug!("[SESSION] Dropping profile for a session that has ended");
            return Ok(());
        }
        self.set_user(Some(user));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn establish(&self, credential: Credential, user: User) {
        self.generation.set(self.generation.get() + 1);

        // Switching accounts: let observers drop the previous user's data first
        if self.logged_in.get() {
            self.logged_in.set_if_changed(false);
        }

        if let Err(e) = self.storage.set_item(STORAGE_KEY_TOKEN, credential.as_str()) {
            report_storage_failure("Credential", e);
        }
        *self.credential.borrow_mut() = Some(credential);
        self.set_user(Some(user));
        self.phase.set(SessionPhase::Authenticated);

        // Last, so observers see the complete session
        self.logged_in.set_if_changed(true);
    }

    fn reset_session(&self) {
        self.generation.set(self.generation.get() + 1);

        if let Err(e) = remove_from_storage(self.storage.as_ref(), STORAGE_KEY_TOKEN) {
            report_storage_failure("Credential removal", e);
        }
        *self.credential.borrow_mut() = None;
        self.set_user(None);
        self.phase.set(SessionPhase::Anonymous);

        self.logged_in.set_if_changed(false);
    }

    /// Every in-memory change of the user is mirrored to storage.
    fn set_user(&self, user: Option<User>) {
        let persisted = match &user {
            Some(user) => save_to_storage(self.storage.as_ref(), STORAGE_KEY_USER, user),
            None => remove_from_storage(self.storage.as_ref(), STORAGE_KEY_USER),
        };
        if let Err(e) = persisted {
            report_storage_failure("User data", e);
            // Never leave an older record behind that disagrees with memory
            if user.is_some() {
                if let Err(e) = remove_from_storage(self.storage.as_ref(), STORAGE_KEY_USER) {
                    report_storage_failure("Stale user data removal", e);
                }
            }
        }
        *self.user.borrow_mut() = user;
    }
}

impl SessionHandle for SessionManager {
    fn credential(&self) -> Option<Credential> {
        SessionManager::credential(self)
    }

    fn is_logged_in(&self) -> bool {
        SessionManager::is_logged_in(self)
    }

    fn subscribe_liveness(&self, callback: Box<dyn Fn(&bool)>) -> SubscriptionId {
        self.logged_in.subscribe(move |value: &bool| callback(value))
    }

    fn unsubscribe_liveness(&self, id: SubscriptionId) -> bool {
        self.logged_in.unsubscribe(id)
    }
}
