use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::ActiveModelTrait;
use tempfile::TempDir;

use fairway::errors::FairwayError;
use fairway::storage::{
    AttributionType, NewReferralChain, ReferralStore, ReferrerStatsUpdate, SeaOrmStore,
};

use migration::entities::profile;

async fn sqlite_store() -> (TempDir, SeaOrmStore) {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("fairway_test.db");
    let url = format!("sqlite://{}", db_path.display());

    let store = SeaOrmStore::new(&url, "sqlite").await.expect("store init");
    (dir, store)
}

async fn seed_profile(store: &SeaOrmStore, id: &str, code: Option<&str>) {
    let active = profile::ActiveModel {
        id: Set(id.to_string()),
        username: Set(format!("user_{}", id)),
        display_name: Set(Some(format!("Player {}", id))),
        referral_code: Set(code.map(|c| c.to_string())),
        referrals_count: Set(0),
        invite_quota: Set(3),
        invites_used: Set(0),
        created_at: Set(Utc::now()),
    };
    active.insert(store.get_db()).await.expect("seed profile");
}

fn chain_for(referrer: &str, referred: &str) -> NewReferralChain {
    NewReferralChain {
        referrer_profile_id: referrer.to_string(),
        referred_profile_id: referred.to_string(),
        referral_code: "ABC123".to_string(),
        attribution_type: AttributionType::Signup,
    }
}

#[tokio::test]
async fn test_profile_lookup_by_code() {
    let (_dir, store) = sqlite_store().await;
    seed_profile(&store, "p1", Some("ABC123")).await;

    let found = store.find_profile_by_code("ABC123").await.unwrap();
    assert_eq!(found.unwrap().id, "p1");

    let missing = store.find_profile_by_code("NOPE99").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_chain_insert_and_lookup() {
    let (_dir, store) = sqlite_store().await;
    seed_profile(&store, "p1", Some("ABC123")).await;

    let chain = store.insert_chain(chain_for("p1", "u1")).await.unwrap();
    assert_eq!(chain.referrer_profile_id, "p1");
    assert_eq!(chain.attribution_type, AttributionType::Signup);

    let found = store.find_chain_by_referred("u1").await.unwrap().unwrap();
    assert_eq!(found.id, chain.id);
    assert!(store.find_chain_by_referred("u2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_referred_maps_to_already_referred() {
    let (_dir, store) = sqlite_store().await;
    seed_profile(&store, "p1", Some("ABC123")).await;
    seed_profile(&store, "p2", Some("XYZ789")).await;

    store.insert_chain(chain_for("p1", "u1")).await.unwrap();

    // Same referred profile through a different referrer still violates
    // the uniqueness constraint
    let err = store.insert_chain(chain_for("p2", "u1")).await.unwrap_err();
    assert!(matches!(err, FairwayError::AlreadyReferred(_)));
}

#[tokio::test]
async fn test_stats_update_persists() {
    let (_dir, store) = sqlite_store().await;
    seed_profile(&store, "p1", Some("ABC123")).await;

    store
        .update_referrer_stats(
            "p1",
            ReferrerStatsUpdate {
                referrals_count: 3,
                invites_used: 3,
                invite_quota: Some(4),
            },
        )
        .await
        .unwrap();

    let p1 = store.find_profile("p1").await.unwrap().unwrap();
    assert_eq!(p1.referrals_count, 3);
    assert_eq!(p1.invites_used, 3);
    assert_eq!(p1.invite_quota, 4);
}

#[tokio::test]
async fn test_stats_update_without_bonus_leaves_quota() {
    let (_dir, store) = sqlite_store().await;
    seed_profile(&store, "p1", Some("ABC123")).await;

    store
        .update_referrer_stats(
            "p1",
            ReferrerStatsUpdate {
                referrals_count: 1,
                invites_used: 1,
                invite_quota: None,
            },
        )
        .await
        .unwrap();

    let p1 = store.find_profile("p1").await.unwrap().unwrap();
    assert_eq!(p1.referrals_count, 1);
    assert_eq!(p1.invite_quota, 3);
}

#[tokio::test]
async fn test_chain_delete_compensation_path() {
    let (_dir, store) = sqlite_store().await;
    seed_profile(&store, "p1", Some("ABC123")).await;

    let chain = store.insert_chain(chain_for("p1", "u1")).await.unwrap();
    store.delete_chain(&chain.id).await.unwrap();

    assert!(store.find_chain_by_referred("u1").await.unwrap().is_none());

    // Deleting an already-deleted row is a reportable failure
    let err = store.delete_chain(&chain.id).await.unwrap_err();
    assert!(matches!(err, FairwayError::Persistence(_)));
}

#[tokio::test]
async fn test_referral_code_assignment_is_conditional() {
    let (_dir, store) = sqlite_store().await;
    seed_profile(&store, "p1", None).await;

    assert!(store.set_referral_code("p1", "NEWCODE1").await.unwrap());
    // A second assignment is a no-op once a code exists
    assert!(!store.set_referral_code("p1", "OTHER234").await.unwrap());

    let p1 = store.find_profile("p1").await.unwrap().unwrap();
    assert_eq!(p1.referral_code.as_deref(), Some("NEWCODE1"));
}

#[tokio::test]
async fn test_ping() {
    let (_dir, store) = sqlite_store().await;
    store.ping().await.unwrap();
}
