//! Write operations for SeaOrmStore.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, SqlErr, sea_query::Expr,
};
use sea_orm::ActiveValue::Set;
use tracing::info;

use super::SeaOrmStore;
use super::converters::{model_to_chain, new_chain_to_active_model};
use crate::errors::{FairwayError, Result};
use crate::storage::models::{NewReferralChain, ReferralChain, ReferrerStatsUpdate};

use migration::entities::{profile, referral_chain};

impl SeaOrmStore {
    pub(super) async fn insert_chain_row(&self, chain: NewReferralChain) -> Result<ReferralChain> {
        let active = new_chain_to_active_model(&chain);

        let model = active.insert(&self.db).await.map_err(|e| {
            // referred_profile_id carries a uniqueness constraint; a
            // violation means a concurrent request already attributed
            // this profile.
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                FairwayError::already_referred(format!(
                    "Profile {} already has a referral chain",
                    chain.referred_profile_id
                ))
            } else {
                FairwayError::persistence(format!("Failed to insert referral chain: {}", e))
            }
        })?;

        info!(
            "Referral chain created: {} -> {} (code {})",
            model.referrer_profile_id, model.referred_profile_id, model.referral_code
        );
        Ok(model_to_chain(model))
    }

    pub(super) async fn update_profile_stats(
        &self,
        profile_id: &str,
        update: ReferrerStatsUpdate,
    ) -> Result<()> {
        let mut active = profile::ActiveModel {
            id: Set(profile_id.to_string()),
            referrals_count: Set(update.referrals_count),
            invites_used: Set(update.invites_used),
            ..Default::default()
        };
        if let Some(quota) = update.invite_quota {
            active.invite_quota = Set(quota);
        }

        active.update(&self.db).await.map_err(|e| {
            FairwayError::persistence(format!(
                "Failed to update stats for profile {}: {}",
                profile_id, e
            ))
        })?;

        Ok(())
    }

    pub(super) async fn delete_chain_row(&self, chain_id: &str) -> Result<()> {
        let result = referral_chain::Entity::delete_by_id(chain_id)
            .exec(&self.db)
            .await
            .map_err(|e| {
                FairwayError::persistence(format!(
                    "Failed to delete referral chain {}: {}",
                    chain_id, e
                ))
            })?;

        if result.rows_affected == 0 {
            return Err(FairwayError::persistence(format!(
                "Referral chain not found: {}",
                chain_id
            )));
        }

        info!("Referral chain deleted: {}", chain_id);
        Ok(())
    }

    pub(super) async fn assign_referral_code(&self, profile_id: &str, code: &str) -> Result<bool> {
        // Conditional on the code still being unset, so a concurrent
        // assignment cannot be overwritten.
        let result = profile::Entity::update_many()
            .col_expr(profile::Column::ReferralCode, Expr::value(code))
            .filter(profile::Column::Id.eq(profile_id))
            .filter(profile::Column::ReferralCode.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| {
                FairwayError::persistence(format!(
                    "Failed to assign referral code to profile {}: {}",
                    profile_id, e
                ))
            })?;

        Ok(result.rows_affected > 0)
    }
}
