use serde::{Deserialize, Serialize};

/// Identity record for a community member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    /// Short shareable code; None until the member first requests one.
    pub referral_code: Option<String>,
    pub referrals_count: i32,
    pub invite_quota: i32,
    pub invites_used: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One successful referrer -> referred attribution.
///
/// Created exactly once at attribution time, deleted only as a compensating
/// action, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralChain {
    pub id: String,
    pub referrer_profile_id: String,
    pub referred_profile_id: String,
    pub referral_code: String,
    pub attribution_type: AttributionType,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReferralChain {
    pub referrer_profile_id: String,
    pub referred_profile_id: String,
    pub referral_code: String,
    pub attribution_type: AttributionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionType {
    Signup,
}

impl AttributionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionType::Signup => "signup",
        }
    }
}

impl std::fmt::Display for AttributionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AttributionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(AttributionType::Signup),
            other => Err(format!("Unknown attribution type: '{}'", other)),
        }
    }
}

/// New counter values for a referrer profile, applied as a single update.
///
/// Carries the values computed by the attribution flow; `invite_quota` is
/// only touched when a bonus invite is granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerStatsUpdate {
    pub referrals_count: i32,
    pub invites_used: i32,
    pub invite_quota: Option<i32>,
}
