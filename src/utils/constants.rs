/// localStorage key holding the bearer credential.
pub const STORAGE_KEY_TOKEN: &str = "medpal_token";

/// localStorage key holding the sanitized user projection (JSON).
pub const STORAGE_KEY_USER: &str = "medpal_user";

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Number of clinic suggestions offered while typing.
pub const MAX_CLINIC_SUGGESTIONS: usize = 5;

/// Entries shown in the dashboard "recent activity" panel.
pub const RECENT_ACTIVITY_LIMIT: usize = 3;

// Appointments store messages
pub const MSG_LOAD_APPOINTMENTS_FAILED: &str = "Failed to load appointments";
pub const MSG_ADD_APPOINTMENT_FAILED: &str = "Failed to add appointment";
pub const MSG_EDIT_APPOINTMENT_FAILED: &str = "Failed to edit appointment";
pub const MSG_DELETE_APPOINTMENT_FAILED: &str = "Failed to delete appointment";
pub const MSG_NOT_SIGNED_IN: &str = "You are not signed in";
