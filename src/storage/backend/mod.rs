//! SeaORM storage backend
//!
//! Database persistence for profiles and referral chains, supporting
//! SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod converters;
mod mutations;
mod query;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::errors::{FairwayError, Result};
use crate::storage::models::{NewReferralChain, Profile, ReferralChain, ReferrerStatsUpdate};
use crate::storage::ReferralStore;

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// Infer the database backend from the connection URL.
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(FairwayError::database_config(format!(
            "Cannot infer database backend from URL: {}. Supported URL schemes: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

pub fn normalize_backend_name(backend: &str) -> String {
    match backend {
        "mariadb" => "mysql".to_string(),
        other => other.to_string(),
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStore {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(FairwayError::database_config(
                "DATABASE_URL is not set".to_string(),
            ));
        }

        let backend_name = normalize_backend_name(backend_name);
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, &backend_name).await?
        };

        let store = SeaOrmStore { db, backend_name };

        run_migrations(&store.db).await?;

        warn!("{} store initialized.", store.backend_name.to_uppercase());
        Ok(store)
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl ReferralStore for SeaOrmStore {
    async fn find_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        self.query_profile(profile_id).await
    }

    async fn find_profile_by_code(&self, code: &str) -> Result<Option<Profile>> {
        self.query_profile_by_code(code).await
    }

    async fn find_chain_by_referred(&self, profile_id: &str) -> Result<Option<ReferralChain>> {
        self.query_chain_by_referred(profile_id).await
    }

    async fn insert_chain(&self, chain: NewReferralChain) -> Result<ReferralChain> {
        self.insert_chain_row(chain).await
    }

    async fn update_referrer_stats(
        &self,
        profile_id: &str,
        update: ReferrerStatsUpdate,
    ) -> Result<()> {
        self.update_profile_stats(profile_id, update).await
    }

    async fn delete_chain(&self, chain_id: &str) -> Result<()> {
        self.delete_chain_row(chain_id).await
    }

    async fn set_referral_code(&self, profile_id: &str, code: &str) -> Result<bool> {
        self.assign_referral_code(profile_id, code).await
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| FairwayError::database_connection(format!("Database ping failed: {}", e)))
    }
}
