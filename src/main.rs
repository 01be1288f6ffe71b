use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use tracing::info;

use fairway::api::services::{AppStartTime, HealthService, ReferralApi};
use fairway::config::{get_config, init_config};
use fairway::errors::FairwayError;
use fairway::services::ReferralService;
use fairway::storage::{ReferralStore, StoreFactory};
use fairway::system::init_logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    dotenv().ok();
    init_config();
    let config = get_config();

    // Guard must outlive the server so buffered logs are flushed
    let _log_guard = init_logging(&config.logging);

    let store: Arc<dyn ReferralStore> = match StoreFactory::create().await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };
    let referral_service = ReferralService::new(store.clone());

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(referral_service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                // A missing or unreadable body means no referral code
                FairwayError::invalid_input(err.to_string()).into()
            }))
            .service(
                web::scope("/api/referral")
                    .service(
                        web::resource("/attribute")
                            .route(web::post().to(ReferralApi::attribute))
                            .default_service(web::route().to(ReferralApi::method_not_allowed)),
                    )
                    .service(
                        web::resource("/me")
                            .route(web::get().to(ReferralApi::my_stats))
                            .default_service(web::route().to(ReferralApi::method_not_allowed)),
                    ),
            )
            .route("/health", web::get().to(HealthService::health_check))
    })
    .bind(bind_address)?
    .run()
    .await
}
