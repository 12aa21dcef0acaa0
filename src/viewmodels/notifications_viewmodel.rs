// ============================================================================
// NOTIFICATIONS VIEWMODEL
// ============================================================================
// Marking as read patches the local entry once the backend accepted it; the
// list is not re-fetched.
// ============================================================================

use crate::models::Notification;
use crate::services::{ApiClient, ApiError};
use crate::state::session_manager::SessionHandle;
use std::cell::RefCell;
use std::rc::Rc;

pub const MSG_LOAD_NOTIFICATIONS_FAILED: &str = "Failed to load notifications";

pub struct NotificationsViewModel {
    api: ApiClient,
    session: Rc<dyn SessionHandle>,
    notifications: RefCell<Vec<Notification>>,
    error: RefCell<Option<String>>,
}

impl NotificationsViewModel {
    pub fn new(api: ApiClient, session: Rc<dyn SessionHandle>) -> Self {
        Self {
            api,
            session,
            notifications: RefCell::new(Vec::new()),
            error: RefCell::new(None),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.borrow().iter().filter(|n| !n.read).count()
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub async fn load(&self) {
        *self.error.borrow_mut() = None;
        let Some(credential) = self.session.credential() else {
            self.notifications.borrow_mut().clear();
            return;
        };

        match self.api.list_notifications(&credential).await {
            Ok(list) => {
                log::info!("🔔 [NOTIFICATIONS] {} notifications", list.len());
                *self.notifications.borrow_mut() = list;
            }
            Err(e) => {
                log::warn!("❌ [NOTIFICATIONS] Load failed: {}", e);
                self.notifications.borrow_mut().clear();
                *self.error.borrow_mut() = Some(MSG_LOAD_NOTIFICATIONS_FAILED.to_string());
            }
        }
    }

    pub async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        let credential = self.session.credential().ok_or(ApiError::NotSignedIn)?;
        self.api.mark_notification_read(&credential, id).await?;

        if let Some(entry) = self.notifications.borrow_mut().iter_mut().find(|n| n.id == id) {
            entry.read = true;
        }
        Ok(())
    }
}
