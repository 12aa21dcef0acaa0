use serde::{Deserialize, Serialize};

/// Profile of the signed-in user as returned by `GET /api/profile`.
///
/// The backend may send more fields than these; they are dropped on decode, so
/// a `User` is already the sanitized projection that gets persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body for `PUT /api/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: String,
}
