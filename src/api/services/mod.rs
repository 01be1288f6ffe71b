mod health;
mod helpers;
mod referral;

pub use health::{AppStartTime, HealthService};
pub use helpers::error_response;
pub use referral::{AttributeRequest, ReferralApi};
