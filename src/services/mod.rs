// All service modules
pub mod invitation_service;
pub mod listing_service;
pub mod rate_limiter;

// Re-export for convenience
pub use invitation_service::InvitationService;
pub use listing_service::{list_page, LegacyLinks};
pub use rate_limiter::SystemClock;
