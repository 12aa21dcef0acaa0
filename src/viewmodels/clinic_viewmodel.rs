// ============================================================================
// CLINIC VIEWMODEL - clinic search, nearby lookup and type-ahead
// ============================================================================

use crate::models::Clinic;
use crate::services::{ApiClient, ApiError};
use crate::state::reactivity::BusyGuard;
use crate::utils::constants::MAX_CLINIC_SUGGESTIONS;
use std::cell::{Cell, RefCell};

pub const MSG_SEARCH_FAILED: &str = "Could not search clinics";
pub const MSG_NEARBY_FAILED: &str = "Could not find nearby clinics";

pub struct ClinicViewModel {
    api: ApiClient,
    results: RefCell<Vec<Clinic>>,
    suggestions: RefCell<Vec<Clinic>>,
    error: RefCell<Option<String>>,
    searching: Cell<usize>,
}

impl ClinicViewModel {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            results: RefCell::new(Vec::new()),
            suggestions: RefCell::new(Vec::new()),
            error: RefCell::new(None),
            searching: Cell::new(0),
        }
    }

    pub fn results(&self) -> Vec<Clinic> {
        self.results.borrow().clone()
    }

    pub fn suggestions(&self) -> Vec<Clinic> {
        self.suggestions.borrow().clone()
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub fn is_searching(&self) -> bool {
        self.searching.get() > 0
    }

    /// Type-ahead. Failures just leave the suggestion list empty.
    pub async fn suggest(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.suggestions.borrow_mut().clear();
            return;
        }
        let suggestions = match self.api.search_clinics(query).await {
            Ok(mut clinics) => {
                clinics.truncate(MAX_CLINIC_SUGGESTIONS);
                clinics
            }
            Err(e) => {
                log::debug!("[CLINICS] Suggestions for '{}' failed: {}", query, e);
                Vec::new()
            }
        };
        *self.suggestions.borrow_mut() = suggestions;
    }

    pub async fn search(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.results.borrow_mut().clear();
            *self.error.borrow_mut() = None;
            return;
        }
        let result = {
            let _searching = BusyGuard::enter(&self.searching);
            self.api.search_clinics(query).await
        };
        self.apply(result, MSG_SEARCH_FAILED);
    }

    pub async fn nearby(&self, latitude: f64, longitude: f64) {
        let result = {
            let _searching = BusyGuard::enter(&self.searching);
            self.api.nearby_clinics(latitude, longitude).await
        };
        self.apply(result, MSG_NEARBY_FAILED);
    }

    fn apply(&self, result: Result<Vec<Clinic>, ApiError>, failure: &str) {
        match result {
            Ok(clinics) => {
                log::info!("🏥 [CLINICS] {} clinics found", clinics.len());
                *self.results.borrow_mut() = clinics;
                *self.error.borrow_mut() = None;
            }
            Err(e) => {
                log::warn!("❌ [CLINICS] {}: {}", failure, e);
                self.results.borrow_mut().clear();
                *self.error.borrow_mut() = Some(failure.to_string());
            }
        }
    }
}
