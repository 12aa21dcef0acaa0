// ============================================================================
// APP STATE - wires the state containers together at startup
// ============================================================================
// No globals: the host builds one `AppState` from a config plus the platform
// services and hands clones of it to whatever renders the screens.
// ============================================================================

use crate::config::AppConfig;
use crate::services::{ApiClient, HttpTransport};
use crate::state::appointments_store::AppointmentsStore;
use crate::state::navigation::Navigator;
use crate::state::reactivity::Spawner;
use crate::state::route_guard::{guard, RouteAccess};
use crate::state::session_manager::{SessionManager, SessionPhase};
use crate::utils::clock::Clock;
use crate::utils::storage::KeyValueStorage;
use crate::viewmodels::{
    ChatViewModel, ClinicViewModel, DashboardViewModel, NotificationsViewModel, ProfileViewModel,
};
use std::rc::Rc;

/// Platform pieces the state containers depend on.
#[derive(Clone)]
pub struct AppServices {
    pub transport: Rc<dyn HttpTransport>,
    pub storage: Rc<dyn KeyValueStorage>,
    pub navigator: Rc<dyn Navigator>,
    pub spawner: Rc<dyn Spawner>,
    pub clock: Rc<dyn Clock>,
}

#[cfg(target_arch = "wasm32")]
impl AppServices {
    /// fetch, localStorage, `window.location` and the browser event loop.
    pub fn browser(config: &AppConfig) -> Self {
        use crate::services::GlooTransport;
        use crate::state::navigation::BrowserNavigator;
        use crate::state::reactivity::WasmSpawner;
        use crate::utils::clock::SystemClock;
        use crate::utils::storage::BrowserStorage;

        Self {
            transport: Rc::new(GlooTransport::new(config.network_timeout())),
            storage: Rc::new(BrowserStorage::new()),
            navigator: Rc::new(BrowserNavigator),
            spawner: Rc::new(WasmSpawner),
            clock: Rc::new(SystemClock),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AppServices {
    /// reqwest with in-memory storage, for headless hosts. Tasks go to `spawner`.
    pub fn native(
        config: &AppConfig,
        spawner: Rc<dyn Spawner>,
    ) -> Result<Self, crate::services::TransportError> {
        use crate::services::ReqwestTransport;
        use crate::state::navigation::NoopNavigator;
        use crate::utils::clock::SystemClock;
        use crate::utils::storage::MemoryStorage;

        Ok(Self {
            transport: Rc::new(ReqwestTransport::new(config.network_timeout())?),
            storage: Rc::new(MemoryStorage::new()),
            navigator: Rc::new(NoopNavigator),
            spawner,
            clock: Rc::new(SystemClock),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub api: ApiClient,
    pub session: Rc<SessionManager>,
    pub appointments: Rc<AppointmentsStore>,
    spawner: Rc<dyn Spawner>,
    clock: Rc<dyn Clock>,
}

impl AppState {
    /// Builds the containers and subscribes the appointments store to the
    /// session's liveness. Call `start` afterwards.
    pub fn new(config: AppConfig, services: AppServices) -> Self {
        let api = ApiClient::from_config(&config, services.transport);
        let session = Rc::new(SessionManager::new(
            api.clone(),
            services.storage,
            services.navigator,
            services.clock.clone(),
        ));
        let appointments = AppointmentsStore::new(api.clone(), session.clone());
        appointments.bind(services.spawner.clone());

        log::info!("🚀 [APP] State ready, backend {}", api.base_url());
        Self {
            config,
            api,
            session,
            appointments,
            spawner: services.spawner,
            clock: services.clock,
        }
    }

    /// Validates any stored credential.
    pub async fn start(&self) -> SessionPhase {
        self.session.initialize().await
    }

    /// `start` on the spawner, for hosts that cannot await.
    pub fn launch(&self) {
        let session = self.session.clone();
        self.spawner.spawn(Box::pin(async move {
            session.initialize().await;
        }));
    }

    /// Detaches the appointments store from the session.
    pub fn shutdown(&self) {
        self.appointments.unbind();
        self.appointments.clear();
    }

    pub fn route_access(&self) -> RouteAccess {
        guard(&self.session)
    }

    pub fn dashboard(&self) -> DashboardViewModel {
        DashboardViewModel::new(self.appointments.clone(), self.clock.clone())
    }

    pub fn profile(&self) -> ProfileViewModel {
        ProfileViewModel::new(self.api.clone(), self.session.clone())
    }

    pub fn notifications(&self) -> NotificationsViewModel {
        NotificationsViewModel::new(self.api.clone(), self.session.clone())
    }

    pub fn clinics(&self) -> ClinicViewModel {
        ClinicViewModel::new(self.api.clone())
    }

    pub fn chat(&self) -> ChatViewModel {
        ChatViewModel::new(self.api.clone())
    }
}
