pub mod auth;
pub mod user;
pub mod appointment;
pub mod clinic;
pub mod notification;
pub mod chat;

pub use auth::{Credential, LoginRequest, RegisterRequest, TokenResponse};
pub use user::{ProfileUpdate, User};
pub use appointment::{Appointment, AppointmentPatch, AppointmentsResponse, NewAppointment};
pub use clinic::Clinic;
pub use notification::Notification;
pub use chat::{ChatMessage, ChatReply, ChatRequest, Sender};
