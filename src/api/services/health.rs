use std::sync::Arc;
use std::time::Duration;

use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use tracing::{error, trace};

use crate::storage::ReferralStore;

#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct HealthStorageCheck {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthChecks {
    storage: HealthStorageCheck,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u32,
    checks: HealthChecks,
}

/// Health Service
///
/// Calls the store directly instead of going through ReferralService;
/// probes need a fast, dependency-free answer.
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        store: web::Data<Arc<dyn ReferralStore>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let storage = match tokio::time::timeout(Duration::from_secs(5), store.ping()).await {
            Ok(Ok(())) => HealthStorageCheck {
                status: "healthy",
                error: None,
            },
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                HealthStorageCheck {
                    status: "unhealthy",
                    error: Some(format!("database error: {}", e)),
                }
            }
            Err(_) => {
                error!("Storage health check timeout");
                HealthStorageCheck {
                    status: "unhealthy",
                    error: Some("timeout".to_string()),
                }
            }
        };

        let uptime_seconds = (chrono::Utc::now() - app_start_time.start_datetime)
            .num_seconds()
            .max(0) as u32;

        let is_healthy = storage.status == "healthy";
        let response = HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" },
            uptime_seconds,
            checks: HealthChecks { storage },
        };

        if is_healthy {
            HttpResponse::Ok().json(response)
        } else {
            HttpResponse::ServiceUnavailable().json(response)
        }
    }
}
