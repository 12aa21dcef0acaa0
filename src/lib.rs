// ============================================================================
// MEDPAL CLIENT CORE
// ============================================================================
// Layers:
// - Models: wire shapes shared with the backend
// - Services: HTTP only (transport + stateless API client)
// - State: session manager, appointments store, wiring
// - ViewModels: screen logic on top of the state containers
// - Utils: storage, validation, clock, constants
// ============================================================================

pub mod config;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;
pub mod testing;

pub use config::{AppConfig, CONFIG};
pub use state::{AppServices, AppState};

/// Installs the log sink. In the browser that is the console, plus the
/// panic hook; native hosts bring their own `log` backend and only the max
/// level is applied.
pub fn init_logging(config: &AppConfig) {
    let level = if config.is_logging_enabled() {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };

    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if let Some(level) = level.to_level() {
            wasm_logger::init(wasm_logger::Config::new(level));
        }
    }

    log::set_max_level(level);
    log::info!("🚀 MedPal client core - {} environment", config.environment);
}
