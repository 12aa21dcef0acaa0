pub mod dashboard_viewmodel;
pub mod profile_viewmodel;
pub mod notifications_viewmodel;
pub mod clinic_viewmodel;
pub mod chat_viewmodel;

pub use dashboard_viewmodel::DashboardViewModel;
pub use profile_viewmodel::ProfileViewModel;
pub use notifications_viewmodel::NotificationsViewModel;
pub use clinic_viewmodel::ClinicViewModel;
pub use chat_viewmodel::ChatViewModel;
