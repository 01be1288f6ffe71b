//! Referral API handlers.

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, trace};

use crate::api::auth::AuthenticatedProfile;
use crate::api::services::helpers::error_response;
use crate::services::{ReferralService, ReferrerSummary};

#[derive(Debug, Deserialize)]
pub struct AttributeRequest {
    pub referral_code: Option<String>,
}

#[derive(Serialize)]
struct AttributeResponse {
    success: bool,
    referrer: ReferrerSummary,
    message: String,
    bonus_granted: bool,
}

pub struct ReferralApi;

impl ReferralApi {
    /// POST /api/referral/attribute
    pub async fn attribute(
        user: AuthenticatedProfile,
        body: web::Json<AttributeRequest>,
        service: web::Data<ReferralService>,
    ) -> impl Responder {
        trace!(
            "Attribution request from profile {}",
            user.profile_id
        );

        let referral_code = body.referral_code.as_deref().unwrap_or_default();

        match service
            .attribute(Some(user.profile_id.as_str()), referral_code)
            .await
        {
            Ok(outcome) => {
                let referred_by = outcome
                    .referrer
                    .display_name
                    .clone()
                    .unwrap_or_else(|| outcome.referrer.username.clone());

                HttpResponse::Ok()
                    .append_header(("Content-Type", "application/json; charset=utf-8"))
                    .json(AttributeResponse {
                        success: true,
                        message: format!("You were referred by {}!", referred_by),
                        referrer: outcome.referrer,
                        bonus_granted: outcome.bonus_granted,
                    })
            }
            Err(e) => {
                if e.http_status().is_server_error() {
                    error!("Attribution failed for {}: {}", user.profile_id, e);
                } else {
                    info!("Attribution rejected for {}: {}", user.profile_id, e);
                }
                error_response(&e)
            }
        }
    }

    /// GET /api/referral/me
    pub async fn my_stats(
        user: AuthenticatedProfile,
        service: web::Data<ReferralService>,
    ) -> impl Responder {
        match service.my_stats(&user.profile_id).await {
            Ok(stats) => HttpResponse::Ok()
                .append_header(("Content-Type", "application/json; charset=utf-8"))
                .json(stats),
            Err(e) => {
                error!("Stats lookup failed for {}: {}", user.profile_id, e);
                error_response(&e)
            }
        }
    }

    /// Catch-all for unsupported methods on the referral routes.
    pub async fn method_not_allowed() -> impl Responder {
        HttpResponse::MethodNotAllowed()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(serde_json::json!({ "error": "Method not allowed" }))
    }
}
