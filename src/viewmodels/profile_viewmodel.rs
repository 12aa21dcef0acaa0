// ============================================================================
// PROFILE VIEWMODEL - profile edits and avatar upload
// ============================================================================
// Writes go to the backend; the user record itself is only ever replaced by
// the session manager re-fetching it afterwards.
// ============================================================================

use crate::models::{Credential, ProfileUpdate, User};
use crate::services::{ApiClient, ApiError};
use crate::state::reactivity::BusyGuard;
use crate::state::session_manager::SessionManager;
use std::cell::Cell;
use std::rc::Rc;

pub struct ProfileViewModel {
    api: ApiClient,
    session: Rc<SessionManager>,
    saving: Cell<usize>,
}

impl ProfileViewModel {
    pub fn new(api: ApiClient, session: Rc<SessionManager>) -> Self {
        Self {
            api,
            session,
            saving: Cell::new(0),
        }
    }

    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.get() > 0
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.session.profile_image_url()
    }

    pub async fn load(&self) -> Result<(), ApiError> {
        self.session.refresh_user().await
    }

    pub async fn save(&self, name: &str, phone: &str) -> Result<(), ApiError> {
        let _saving = BusyGuard::enter(&self.saving);
        let credential = self.credential()?;
        let update = ProfileUpdate {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
        };

        log::info!("👤 [PROFILE] Saving profile");
        self.api.update_profile(&credential, &update).await?;
        self.session.refresh_user().await
    }

    /// Uploads a new picture and returns the avatar URL to show from now on.
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let _saving = BusyGuard::enter(&self.saving);
        let credential = self.credential()?;

        log::info!("🖼️ [PROFILE] Uploading avatar {} ({} bytes)", file_name, bytes.len());
        self.api.upload_profile_image(&credential, file_name, mime, bytes).await?;
        self.session.refresh_user().await?;
        self.session.touch_profile_image();
        self.avatar_url().ok_or(ApiError::NotSignedIn)
    }

    fn credential(&self) -> Result<Credential, ApiError> {
        self.session.credential().ok_or(ApiError::NotSignedIn)
    }
}
