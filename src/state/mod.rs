// ============================================================================
// STATE MODULE - session, appointments and their wiring
// ============================================================================

pub mod reactivity;
pub mod navigation;
pub mod session_manager;
pub mod appointments_store;
pub mod route_guard;
pub mod app_state;

pub use reactivity::*;
pub use navigation::*;
pub use session_manager::*;
pub use appointments_store::*;
pub use route_guard::*;
pub use app_state::*;
