// ============================================================================
// API CLIENT - HTTP communication only (stateless)
// ============================================================================
// No business logic here: build the request, send it, map the response.
// State lives in `crate::state`.
// ============================================================================

use crate::config::AppConfig;
use crate::models::{
    Appointment, AppointmentPatch, AppointmentsResponse, ChatReply, ChatRequest, Clinic, Credential,
    LoginRequest, Notification, NewAppointment, ProfileUpdate, RegisterRequest, TokenResponse, User,
};
use crate::services::transport::{
    FilePart, HttpRequest, HttpResponse, HttpTransport, Method, TransportError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

/// Multipart field name the backend expects for avatar uploads.
pub const PROFILE_PIC_FIELD: &str = "profilePic";

/// Error categories surfaced to state containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response at all (connection failure or timeout).
    Network,
    /// Credential rejected or missing.
    Authentication,
    /// Backend answered with a non-2xx status.
    Server,
    /// Request or response body could not be (de)serialized.
    Protocol,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("not signed in")]
    NotSignedIn,
    #[error("not authorized (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("could not encode request: {0}")]
    Encode(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport(_) | ApiError::Timeout(_) => ErrorKind::Network,
            ApiError::NotSignedIn | ApiError::Unauthorized { .. } => ErrorKind::Authentication,
            ApiError::Status { .. } => ErrorKind::Server,
            ApiError::Decode(_) | ApiError::Encode(_) => ErrorKind::Protocol,
        }
    }

    /// The request never reached the backend, so no remote state can have
    /// changed. Timeouts don't qualify: the backend may have applied the call.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network(msg) => ApiError::Transport(msg),
            TransportError::Timeout(after) => ApiError::Timeout(after),
            TransportError::InvalidRequest(msg) => ApiError::Encode(msg),
        }
    }
}

/// Pulls `message` / `error` out of a JSON error body, falling back to raw text.
fn error_message(response: &HttpResponse) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&response.body) {
        for key in ["message", "error", "msg"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let text = response.text();
    if text.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        text
    }
}

fn to_json<T: Serialize>(body: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}

/// Client for the MedPal backend.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Rc<dyn HttpTransport>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, transport: Rc<dyn HttpTransport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, transport }
    }

    pub fn from_config(config: &AppConfig, transport: Rc<dyn HttpTransport>) -> Self {
        Self::new(config.backend_url(), transport)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let url = request.url.clone();
        let response = self.transport.send(request).await.map_err(|e| {
            log::warn!("📴 [API] {} {} failed: {}", method.as_str(), url, e);
            ApiError::from(e)
        })?;

        if response.is_success() {
            return Ok(response);
        }

        log::warn!("❌ [API] {} {} -> HTTP {}", method.as_str(), url, response.status);
        match response.status {
            401 | 403 => Err(ApiError::Unauthorized { status: response.status }),
            status => Err(ApiError::Status { status, message: error_message(&response) }),
        }
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, ApiError> {
        let body = to_json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let request = HttpRequest::new(Method::Post, self.url("/api/auth/login")).json(body);
        self.token_from(request).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Credential, ApiError> {
        let body = to_json(&RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let request = HttpRequest::new(Method::Post, self.url("/api/auth/register")).json(body);
        self.token_from(request).await
    }

    async fn token_from(&self, request: HttpRequest) -> Result<Credential, ApiError> {
        let response: TokenResponse = self.execute_json(request).await?;
        let credential = Credential::new(response.token);
        if credential.is_empty() {
            return Err(ApiError::Decode("empty token in auth response".to_string()));
        }
        Ok(credential)
    }

    // ------------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------------

    pub async fn get_profile(&self, credential: &Credential) -> Result<User, ApiError> {
        let request = HttpRequest::new(Method::Get, self.url("/api/profile")).bearer(credential);
        self.execute_json(request).await
    }

    pub async fn update_profile(
        &self,
        credential: &Credential,
        update: &ProfileUpdate,
    ) -> Result<(), ApiError> {
        let request = HttpRequest::new(Method::Put, self.url("/api/profile"))
            .bearer(credential)
            .json(to_json(update)?);
        self.execute(request).await.map(|_| ())
    }

    pub async fn upload_profile_image(
        &self,
        credential: &Credential,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let request = HttpRequest::new(Method::Post, self.url("/api/profile/upload"))
            .bearer(credential)
            .multipart(FilePart {
                field: PROFILE_PIC_FIELD.to_string(),
                file_name: file_name.to_string(),
                mime: mime.to_string(),
                bytes,
            });
        self.execute(request).await.map(|_| ())
    }

    /// Public avatar URL; `cache_bust` forces browsers to drop a cached copy.
    pub fn profile_image_url(&self, user_id: &str, cache_bust: i64) -> String {
        self.url(&format!(
            "/api/profile/image/{}?ts={}",
            urlencoding::encode(user_id),
            cache_bust
        ))
    }

    // ------------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------------

    pub async fn list_appointments(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Appointment>, ApiError> {
        let request =
            HttpRequest::new(Method::Get, self.url("/api/appointments")).bearer(credential);
        let response: AppointmentsResponse = self.execute_json(request).await?;
        Ok(response.into_vec())
    }

    pub async fn create_appointment(
        &self,
        credential: &Credential,
        data: &NewAppointment,
    ) -> Result<(), ApiError> {
        let request = HttpRequest::new(Method::Post, self.url("/api/appointments"))
            .bearer(credential)
            .json(to_json(data)?);
        self.execute(request).await.map(|_| ())
    }

    pub async fn update_appointment(
        &self,
        credential: &Credential,
        id: &str,
        patch: &AppointmentPatch,
    ) -> Result<(), ApiError> {
        let path = format!("/api/appointments/{}", urlencoding::encode(id));
        let request = HttpRequest::new(Method::Put, self.url(&path))
            .bearer(credential)
            .json(to_json(patch)?);
        self.execute(request).await.map(|_| ())
    }

    pub async fn delete_appointment(
        &self,
        credential: &Credential,
        id: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/api/appointments/{}", urlencoding::encode(id));
        let request = HttpRequest::new(Method::Delete, self.url(&path)).bearer(credential);
        self.execute(request).await.map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    pub async fn list_notifications(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Notification>, ApiError> {
        let request =
            HttpRequest::new(Method::Get, self.url("/api/notifications")).bearer(credential);
        self.execute_json(request).await
    }

    pub async fn mark_notification_read(
        &self,
        credential: &Credential,
        id: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/api/notifications/{}/read", urlencoding::encode(id));
        let request = HttpRequest::new(Method::Put, self.url(&path))
            .bearer(credential)
            .json(serde_json::json!({}));
        self.execute(request).await.map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Clinics (public)
    // ------------------------------------------------------------------------

    pub async fn search_clinics(&self, query: &str) -> Result<Vec<Clinic>, ApiError> {
        let path = format!("/api/clinics/search?q={}", urlencoding::encode(query));
        self.clinic_list(HttpRequest::new(Method::Get, self.url(&path))).await
    }

    pub async fn nearby_clinics(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<Clinic>, ApiError> {
        let path = format!("/api/clinics/nearby?lat={}&lng={}", latitude, longitude);
        self.clinic_list(HttpRequest::new(Method::Get, self.url(&path))).await
    }

    /// Anything other than a JSON array counts as "no clinics".
    async fn clinic_list(&self, request: HttpRequest) -> Result<Vec<Clinic>, ApiError> {
        let value: serde_json::Value = self.execute_json(request).await?;
        if !value.is_array() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ------------------------------------------------------------------------
    // Symptom chat (public)
    // ------------------------------------------------------------------------

    pub async fn send_chat_message(&self, message: &str) -> Result<Option<String>, ApiError> {
        let request = HttpRequest::new(Method::Post, self.url("/api/chatbot"))
            .json(to_json(&ChatRequest { message })?);
        let reply: ChatReply = self.execute_json(request).await?;
        Ok(reply.reply.filter(|r| !r.trim().is_empty()))
    }
}
