//! Referral attribution flow.
//!
//! Links a newly authenticated member to the profile whose referral code
//! they supplied, updates the referrer's counters, and grants a bonus
//! invite on every third successful referral. The flow is a linear
//! pipeline: validate, insert the chain row, update the referrer; if the
//! update fails the chain row is deleted again so no half-attributed state
//! is left behind.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::{FairwayError, Result};
use crate::storage::{
    AttributionType, NewReferralChain, Profile, ReferralStore, ReferrerStatsUpdate,
};
use crate::utils::generate_referral_code;

/// A bonus invite is granted on every Nth successful referral, counted
/// against the post-increment total.
const BONUS_REFERRAL_INTERVAL: i32 = 3;

const REFERRAL_CODE_LENGTH: usize = 8;

/// Referrer fields exposed to the referred user on success.
#[derive(Debug, Clone, Serialize)]
pub struct ReferrerSummary {
    pub id: String,
    pub display_name: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributionOutcome {
    pub referrer: ReferrerSummary,
    pub bonus_granted: bool,
}

/// The caller's own referral standing, for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReferralStats {
    pub referral_code: String,
    pub referrals_count: i32,
    pub invite_quota: i32,
    pub invites_used: i32,
    pub invites_remaining: i32,
}

#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn ReferralStore>,
}

impl ReferralService {
    pub fn new(store: Arc<dyn ReferralStore>) -> Self {
        Self { store }
    }

    /// Attribute the requesting user to the owner of `referral_code`.
    ///
    /// Validation short-circuits in a fixed order; each failure maps to a
    /// distinct error kind. Once validation passes, the chain row is
    /// inserted first and the referrer's counters updated second; a failed
    /// update triggers a best-effort compensating delete of the chain row.
    pub async fn attribute(
        &self,
        requesting_user_id: Option<&str>,
        referral_code: &str,
    ) -> Result<AttributionOutcome> {
        let user_id = match requesting_user_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                return Err(FairwayError::unauthenticated(
                    "Attribution requested without a resolved user identity",
                ));
            }
        };

        let code = referral_code.trim().to_uppercase();
        if code.is_empty() {
            return Err(FairwayError::invalid_input(
                "Referral code missing or empty after trim",
            ));
        }

        // Pre-check lookups are not part of the two-write sequence; their
        // failures are unanticipated rather than persistence outcomes.
        let existing = self
            .store
            .find_chain_by_referred(user_id)
            .await
            .map_err(|e| FairwayError::unexpected(e.to_string()))?;
        if existing.is_some() {
            return Err(FairwayError::already_referred(format!(
                "Profile {} was already attributed",
                user_id
            )));
        }

        let referrer = match self
            .store
            .find_profile_by_code(&code)
            .await
            .map_err(|e| FairwayError::unexpected(e.to_string()))?
        {
            Some(profile) => profile,
            None => {
                info!("Attribution rejected: no profile owns code {}", code);
                return Err(FairwayError::invalid_code(format!(
                    "No profile matches referral code {}",
                    code
                )));
            }
        };

        if referrer.id == user_id {
            info!("Attribution rejected: {} used their own code", user_id);
            return Err(FairwayError::self_referral(format!(
                "Code {} belongs to the requesting profile",
                code
            )));
        }

        let chain = self
            .store
            .insert_chain(NewReferralChain {
                referrer_profile_id: referrer.id.clone(),
                referred_profile_id: user_id.to_string(),
                referral_code: code.clone(),
                attribution_type: AttributionType::Signup,
            })
            .await?;

        let new_referrals_count = referrer.referrals_count + 1;
        let bonus_granted = new_referrals_count % BONUS_REFERRAL_INTERVAL == 0;

        // invites_used never exceeds the quota as read at update time
        let invites_used = (referrer.invites_used + 1).min(referrer.invite_quota);

        let update = ReferrerStatsUpdate {
            referrals_count: new_referrals_count,
            invites_used,
            invite_quota: bonus_granted.then(|| referrer.invite_quota + 1),
        };

        if let Err(update_err) = self.store.update_referrer_stats(&referrer.id, update).await {
            error!(
                "Referrer stats update failed for {}, compensating: {}",
                referrer.id, update_err
            );
            // Best-effort compensation; its own failure changes nothing for
            // the caller but is logged distinctly so operators can reconcile
            // the orphaned chain row.
            if let Err(comp_err) = self.store.delete_chain(&chain.id).await {
                error!(
                    "Compensating delete of chain {} failed, orphaned row remains: {}",
                    chain.id, comp_err
                );
            }
            return Err(FairwayError::persistence(format!(
                "Referrer stats update failed: {}",
                update_err
            )));
        }

        info!(
            "Attribution complete: {} referred by {} (bonus: {})",
            user_id, referrer.id, bonus_granted
        );

        Ok(AttributionOutcome {
            referrer: ReferrerSummary {
                id: referrer.id,
                display_name: referrer.display_name,
                username: referrer.username,
            },
            bonus_granted,
        })
    }

    /// The caller's referral stats, assigning a referral code on first use.
    pub async fn my_stats(&self, requesting_user_id: &str) -> Result<ReferralStats> {
        let profile = self
            .store
            .find_profile(requesting_user_id)
            .await
            .map_err(|e| FairwayError::unexpected(e.to_string()))?
            .ok_or_else(|| {
                FairwayError::unauthenticated(format!(
                    "No profile for authenticated user {}",
                    requesting_user_id
                ))
            })?;

        let referral_code = match profile.referral_code {
            Some(code) => code,
            None => self.ensure_referral_code(&profile).await?,
        };

        Ok(ReferralStats {
            referral_code,
            referrals_count: profile.referrals_count,
            invite_quota: profile.invite_quota,
            invites_used: profile.invites_used,
            invites_remaining: (profile.invite_quota - profile.invites_used).max(0),
        })
    }

    async fn ensure_referral_code(&self, profile: &Profile) -> Result<String> {
        let code = generate_referral_code(REFERRAL_CODE_LENGTH);

        if self.store.set_referral_code(&profile.id, &code).await? {
            info!("Assigned referral code {} to profile {}", code, profile.id);
            return Ok(code);
        }

        // A concurrent request assigned one first; read it back.
        warn!(
            "Referral code for {} was assigned concurrently, re-reading",
            profile.id
        );
        self.store
            .find_profile(&profile.id)
            .await
            .map_err(|e| FairwayError::unexpected(e.to_string()))?
            .and_then(|p| p.referral_code)
            .ok_or_else(|| {
                FairwayError::unexpected(format!(
                    "Referral code for profile {} vanished after assignment",
                    profile.id
                ))
            })
    }
}
