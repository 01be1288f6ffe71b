//! Read-only database operations for SeaOrmStore.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::SeaOrmStore;
use super::converters::{model_to_chain, model_to_profile};
use crate::errors::{FairwayError, Result};
use crate::storage::models::{Profile, ReferralChain};

use migration::entities::{profile, referral_chain};

impl SeaOrmStore {
    pub(super) async fn query_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let model = profile::Entity::find_by_id(profile_id)
            .one(&self.db)
            .await
            .map_err(|e| {
                FairwayError::persistence(format!("Failed to load profile {}: {}", profile_id, e))
            })?;

        Ok(model.map(model_to_profile))
    }

    pub(super) async fn query_profile_by_code(&self, code: &str) -> Result<Option<Profile>> {
        let model = profile::Entity::find()
            .filter(profile::Column::ReferralCode.eq(code))
            .one(&self.db)
            .await
            .map_err(|e| {
                FairwayError::persistence(format!(
                    "Failed to look up referral code {}: {}",
                    code, e
                ))
            })?;

        Ok(model.map(model_to_profile))
    }

    pub(super) async fn query_chain_by_referred(
        &self,
        profile_id: &str,
    ) -> Result<Option<ReferralChain>> {
        let model = referral_chain::Entity::find()
            .filter(referral_chain::Column::ReferredProfileId.eq(profile_id))
            .one(&self.db)
            .await
            .map_err(|e| {
                FairwayError::persistence(format!(
                    "Failed to look up referral chain for {}: {}",
                    profile_id, e
                ))
            })?;

        Ok(model.map(model_to_chain))
    }
}
