use crate::state::session_manager::{SessionManager, SessionPhase};

/// What a protected view should do with the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    /// Session not settled yet, show a spinner.
    Pending,
    Granted,
    RedirectToLogin,
}

pub fn guard(session: &SessionManager) -> RouteAccess {
    if session.is_logged_in() {
        return RouteAccess::Granted;
    }
    match session.phase() {
        SessionPhase::Unknown | SessionPhase::Authenticating => RouteAccess::Pending,
        SessionPhase::Authenticated | SessionPhase::Anonymous => RouteAccess::RedirectToLogin,
    }
}
