pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::fees::FeeConfigService;
pub use services::rating::FeedbackService;
pub use services::settlement::SettlementService;
