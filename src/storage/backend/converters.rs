//! Conversions between SeaORM entity models and domain types.

use chrono::Utc;
use sea_orm::ActiveValue::Set;

use crate::storage::models::{AttributionType, NewReferralChain, Profile, ReferralChain};

use migration::entities::{profile, referral_chain};

pub fn model_to_profile(model: profile::Model) -> Profile {
    Profile {
        id: model.id,
        username: model.username,
        display_name: model.display_name,
        referral_code: model.referral_code,
        referrals_count: model.referrals_count,
        invite_quota: model.invite_quota,
        invites_used: model.invites_used,
        created_at: model.created_at,
    }
}

pub fn model_to_chain(model: referral_chain::Model) -> ReferralChain {
    ReferralChain {
        id: model.id,
        referrer_profile_id: model.referrer_profile_id,
        referred_profile_id: model.referred_profile_id,
        referral_code: model.referral_code,
        // Rows are only ever written through NewReferralChain, so the stored
        // string always parses; fall back to Signup for safety.
        attribution_type: model
            .attribution_type
            .parse()
            .unwrap_or(AttributionType::Signup),
        created_at: model.created_at,
    }
}

/// Build the active model for a fresh chain row, generating id and timestamp.
pub fn new_chain_to_active_model(chain: &NewReferralChain) -> referral_chain::ActiveModel {
    referral_chain::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        referrer_profile_id: Set(chain.referrer_profile_id.clone()),
        referred_profile_id: Set(chain.referred_profile_id.clone()),
        referral_code: Set(chain.referral_code.clone()),
        attribution_type: Set(chain.attribution_type.as_str().to_string()),
        created_at: Set(Utc::now()),
    }
}
