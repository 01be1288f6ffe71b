use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStore;
pub use models::{
    AttributionType, NewReferralChain, Profile, ReferralChain, ReferrerStatsUpdate,
};

/// Persistence operations needed by the referral attribution flow.
///
/// The service only talks to storage through this trait, so tests can
/// substitute an in-memory store and inject faults.
#[async_trait]
pub trait ReferralStore: Send + Sync {
    async fn find_profile(&self, profile_id: &str) -> Result<Option<Profile>>;

    /// Look up a profile by its (already normalized) referral code.
    async fn find_profile_by_code(&self, code: &str) -> Result<Option<Profile>>;

    async fn find_chain_by_referred(&self, profile_id: &str) -> Result<Option<ReferralChain>>;

    /// Insert a new chain row. A uniqueness violation on
    /// referred_profile_id surfaces as `AlreadyReferred`; any other failure
    /// as `Persistence`.
    async fn insert_chain(&self, chain: NewReferralChain) -> Result<ReferralChain>;

    async fn update_referrer_stats(
        &self,
        profile_id: &str,
        update: ReferrerStatsUpdate,
    ) -> Result<()>;

    async fn delete_chain(&self, chain_id: &str) -> Result<()>;

    /// Assign a referral code to a profile that has none yet.
    /// Returns false if the profile already had a code (nothing written).
    async fn set_referral_code(&self, profile_id: &str, code: &str) -> Result<bool>;

    /// Liveness probe for health checks.
    async fn ping(&self) -> Result<()>;
}

pub struct StoreFactory;

impl StoreFactory {
    pub async fn create() -> Result<Arc<SeaOrmStore>> {
        let config = crate::config::get_config();
        let database_url = &config.database.database_url;

        let backend_type = backend::infer_backend_from_url(database_url)?;

        let store = backend::SeaOrmStore::new(database_url, &backend_type).await?;
        Ok(Arc::new(store))
    }
}
