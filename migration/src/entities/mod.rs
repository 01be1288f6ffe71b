pub mod profile;
pub mod referral_chain;

pub use profile::Entity as ProfileEntity;
pub use referral_chain::Entity as ReferralChainEntity;
