use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_web::{App, test, web};
use async_trait::async_trait;
use serde_json::{Value, json};

use fairway::api::jwt::get_jwt_service;
use fairway::api::services::{AppStartTime, HealthService, ReferralApi};
use fairway::config::init_config;
use fairway::errors::{FairwayError, Result};
use fairway::services::ReferralService;
use fairway::storage::{
    NewReferralChain, Profile, ReferralChain, ReferralStore, ReferrerStatsUpdate,
};

#[derive(Default)]
struct MockStore {
    profiles: Mutex<HashMap<String, Profile>>,
    chains: Mutex<Vec<ReferralChain>>,
    chain_seq: Mutex<u64>,
    fail_update: Mutex<bool>,
    fail_ping: Mutex<bool>,
}

impl MockStore {
    fn add_profile(&self, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ReferralStore for MockStore {
    async fn find_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.lock().unwrap().get(profile_id).cloned())
    }

    async fn find_profile_by_code(&self, code: &str) -> Result<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .find(|p| p.referral_code.as_deref() == Some(code))
            .cloned())
    }

    async fn find_chain_by_referred(&self, profile_id: &str) -> Result<Option<ReferralChain>> {
        Ok(self
            .chains
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.referred_profile_id == profile_id)
            .cloned())
    }

    async fn insert_chain(&self, chain: NewReferralChain) -> Result<ReferralChain> {
        let mut chains = self.chains.lock().unwrap();
        if chains
            .iter()
            .any(|c| c.referred_profile_id == chain.referred_profile_id)
        {
            return Err(FairwayError::already_referred("duplicate referred profile"));
        }
        let mut seq = self.chain_seq.lock().unwrap();
        *seq += 1;
        let row = ReferralChain {
            id: format!("chain-{}", *seq),
            referrer_profile_id: chain.referrer_profile_id,
            referred_profile_id: chain.referred_profile_id,
            referral_code: chain.referral_code,
            attribution_type: chain.attribution_type,
            created_at: chrono::Utc::now(),
        };
        chains.push(row.clone());
        Ok(row)
    }

    async fn update_referrer_stats(
        &self,
        profile_id: &str,
        update: ReferrerStatsUpdate,
    ) -> Result<()> {
        if *self.fail_update.lock().unwrap() {
            return Err(FairwayError::persistence("mock update failure"));
        }
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(profile_id)
            .ok_or_else(|| FairwayError::persistence("profile not found"))?;
        profile.referrals_count = update.referrals_count;
        profile.invites_used = update.invites_used;
        if let Some(quota) = update.invite_quota {
            profile.invite_quota = quota;
        }
        Ok(())
    }

    async fn delete_chain(&self, chain_id: &str) -> Result<()> {
        self.chains.lock().unwrap().retain(|c| c.id != chain_id);
        Ok(())
    }

    async fn set_referral_code(&self, profile_id: &str, code: &str) -> Result<bool> {
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(profile_id) {
            Some(p) if p.referral_code.is_none() => {
                p.referral_code = Some(code.to_string());
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(FairwayError::persistence("profile not found")),
        }
    }

    async fn ping(&self) -> Result<()> {
        if *self.fail_ping.lock().unwrap() {
            return Err(FairwayError::database_connection("mock ping failure"));
        }
        Ok(())
    }
}

fn make_profile(id: &str, code: Option<&str>, count: i32, quota: i32, used: i32) -> Profile {
    Profile {
        id: id.to_string(),
        username: format!("user_{}", id),
        display_name: Some(format!("Player {}", id)),
        referral_code: code.map(|c| c.to_string()),
        referrals_count: count,
        invite_quota: quota,
        invites_used: used,
        created_at: chrono::Utc::now(),
    }
}

fn bearer_for(profile_id: &str) -> (&'static str, String) {
    init_config();
    let token = get_jwt_service()
        .generate_access_token(profile_id)
        .expect("token generation");
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! test_app {
    ($store:expr) => {{
        // The JWT service reads the global config on first use
        init_config();
        let store: Arc<dyn ReferralStore> = $store.clone();
        let service = ReferralService::new(store.clone());
        test::init_service(
            App::new()
                .app_data(web::Data::new(store))
                .app_data(web::Data::new(service))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                    FairwayError::invalid_input(err.to_string()).into()
                }))
                .service(
                    web::scope("/api/referral")
                        .service(
                            web::resource("/attribute")
                                .route(web::post().to(ReferralApi::attribute))
                                .default_service(
                                    web::route().to(ReferralApi::method_not_allowed),
                                ),
                        )
                        .service(
                            web::resource("/me")
                                .route(web::get().to(ReferralApi::my_stats))
                                .default_service(
                                    web::route().to(ReferralApi::method_not_allowed),
                                ),
                        ),
                )
                .route("/health", web::get().to(HealthService::health_check)),
        )
        .await
    }};
}

mod attribute_endpoint_tests {
    use super::*;

    #[actix_web::test]
    async fn test_successful_attribution() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 0, 3, 0));
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("u1"))
            .set_json(json!({ "referral_code": "ABC123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["bonus_granted"], json!(false));
        assert_eq!(body["referrer"]["id"], json!("p1"));
        assert_eq!(body["referrer"]["username"], json!("user_p1"));
        assert_eq!(body["message"], json!("You were referred by Player p1!"));
    }

    #[actix_web::test]
    async fn test_bonus_granted_in_response() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 2, 3, 3));
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("u1"))
            .set_json(json!({ "referral_code": "ABC123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["bonus_granted"], json!(true));
    }

    #[actix_web::test]
    async fn test_wrong_method_is_405_before_auth() {
        let store = Arc::new(MockStore::default());
        let app = test_app!(store);

        // No Authorization header on purpose
        let req = test::TestRequest::get()
            .uri("/api/referral/attribute")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 405);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], json!("Method not allowed"));
    }

    #[actix_web::test]
    async fn test_missing_auth_is_401() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 0, 3, 0));
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .set_json(json!({ "referral_code": "ABC123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("Authentication required"));
    }

    #[actix_web::test]
    async fn test_garbage_token_is_401() {
        let store = Arc::new(MockStore::default());
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .set_json(json!({ "referral_code": "ABC123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_empty_code_is_400() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 0, 3, 0));
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("u1"))
            .set_json(json!({ "referral_code": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], json!("Missing referral code"));
    }

    #[actix_web::test]
    async fn test_absent_code_field_is_400() {
        let store = Arc::new(MockStore::default());
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("u1"))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], json!("Missing referral code"));
    }

    #[actix_web::test]
    async fn test_unknown_code_is_400() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 0, 3, 0));
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("u1"))
            .set_json(json!({ "referral_code": "WRONG1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], json!("Invalid referral code"));
    }

    #[actix_web::test]
    async fn test_self_referral_is_400() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 0, 3, 0));
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("p1"))
            .set_json(json!({ "referral_code": "ABC123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], json!("You cannot refer yourself"));
    }

    #[actix_web::test]
    async fn test_repeat_attribution_is_400() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 0, 3, 0));
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("u1"))
            .set_json(json!({ "referral_code": "ABC123" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("u1"))
            .set_json(json!({ "referral_code": "ABC123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["message"],
            json!("You have already been referred by someone")
        );
    }

    #[actix_web::test]
    async fn test_update_failure_is_500() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 0, 3, 0));
        *store.fail_update.lock().unwrap() = true;
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/referral/attribute")
            .insert_header(bearer_for("u1"))
            .set_json(json!({ "referral_code": "ABC123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 500);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["message"],
            json!("Failed to complete referral attribution")
        );

        // Compensation removed the chain row
        assert_eq!(store.chains.lock().unwrap().len(), 0);
    }
}

mod stats_endpoint_tests {
    use super::*;

    #[actix_web::test]
    async fn test_stats_for_authenticated_profile() {
        let store = Arc::new(MockStore::default());
        store.add_profile(make_profile("p1", Some("ABC123"), 4, 5, 2));
        let app = test_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/referral/me")
            .insert_header(bearer_for("p1"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["referral_code"], json!("ABC123"));
        assert_eq!(body["referrals_count"], json!(4));
        assert_eq!(body["invite_quota"], json!(5));
        assert_eq!(body["invites_used"], json!(2));
        assert_eq!(body["invites_remaining"], json!(3));
    }

    #[actix_web::test]
    async fn test_stats_requires_auth() {
        let store = Arc::new(MockStore::default());
        let app = test_app!(store);

        let req = test::TestRequest::get().uri("/api/referral/me").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_stats_wrong_method_is_405() {
        let store = Arc::new(MockStore::default());
        let app = test_app!(store);

        let req = test::TestRequest::delete()
            .uri("/api/referral/me")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 405);
    }
}

mod health_endpoint_tests {
    use super::*;

    #[actix_web::test]
    async fn test_health_ok() {
        let store = Arc::new(MockStore::default());
        let app = test_app!(store);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], json!("healthy"));
        assert_eq!(body["checks"]["storage"]["status"], json!("healthy"));
    }

    #[actix_web::test]
    async fn test_health_unhealthy_storage() {
        let store = Arc::new(MockStore::default());
        *store.fail_ping.lock().unwrap() = true;
        let app = test_app!(store);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 503);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], json!("unhealthy"));
    }
}
