use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum FairwayError {
    Unauthenticated(String),
    InvalidInput(String),
    AlreadyReferred(String),
    InvalidCode(String),
    SelfReferral(String),
    Persistence(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    Unexpected(String),
}

impl FairwayError {
    pub fn code(&self) -> &'static str {
        match self {
            FairwayError::Unauthenticated(_) => "E001",
            FairwayError::InvalidInput(_) => "E002",
            FairwayError::AlreadyReferred(_) => "E003",
            FairwayError::InvalidCode(_) => "E004",
            FairwayError::SelfReferral(_) => "E005",
            FairwayError::Persistence(_) => "E006",
            FairwayError::DatabaseConfig(_) => "E007",
            FairwayError::DatabaseConnection(_) => "E008",
            FairwayError::Unexpected(_) => "E009",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            FairwayError::Unauthenticated(_) => "Authentication Error",
            FairwayError::InvalidInput(_) => "Invalid Input",
            FairwayError::AlreadyReferred(_) => "Already Referred",
            FairwayError::InvalidCode(_) => "Invalid Referral Code",
            FairwayError::SelfReferral(_) => "Self Referral",
            FairwayError::Persistence(_) => "Persistence Error",
            FairwayError::DatabaseConfig(_) => "Database Configuration Error",
            FairwayError::DatabaseConnection(_) => "Database Connection Error",
            FairwayError::Unexpected(_) => "Unexpected Error",
        }
    }

    /// Internal detail, for logs only. Never sent to clients.
    pub fn message(&self) -> &str {
        match self {
            FairwayError::Unauthenticated(msg)
            | FairwayError::InvalidInput(msg)
            | FairwayError::AlreadyReferred(msg)
            | FairwayError::InvalidCode(msg)
            | FairwayError::SelfReferral(msg)
            | FairwayError::Persistence(msg)
            | FairwayError::DatabaseConfig(msg)
            | FairwayError::DatabaseConnection(msg)
            | FairwayError::Unexpected(msg) => msg,
        }
    }

    /// The human-readable string clients see in the response body.
    pub fn user_message(&self) -> &'static str {
        match self {
            FairwayError::Unauthenticated(_) => "Authentication required",
            FairwayError::InvalidInput(_) => "Missing referral code",
            FairwayError::AlreadyReferred(_) => "You have already been referred by someone",
            FairwayError::InvalidCode(_) => "Invalid referral code",
            FairwayError::SelfReferral(_) => "You cannot refer yourself",
            FairwayError::Persistence(_) => "Failed to complete referral attribution",
            FairwayError::DatabaseConfig(_)
            | FairwayError::DatabaseConnection(_)
            | FairwayError::Unexpected(_) => "An unexpected error occurred",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            FairwayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            FairwayError::InvalidInput(_)
            | FairwayError::AlreadyReferred(_)
            | FairwayError::InvalidCode(_)
            | FairwayError::SelfReferral(_) => StatusCode::BAD_REQUEST,
            FairwayError::Persistence(_)
            | FairwayError::DatabaseConfig(_)
            | FairwayError::DatabaseConnection(_)
            | FairwayError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Colored output for server startup errors.
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for FairwayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for FairwayError {}

// Lets extractor rejections and `?` in handlers surface the wire-format
// error body directly.
impl actix_web::ResponseError for FairwayError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.http_status())
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(serde_json::json!({
                "success": false,
                "message": self.user_message(),
            }))
    }
}

// Convenience constructors
impl FairwayError {
    pub fn unauthenticated<T: Into<String>>(msg: T) -> Self {
        FairwayError::Unauthenticated(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        FairwayError::InvalidInput(msg.into())
    }

    pub fn already_referred<T: Into<String>>(msg: T) -> Self {
        FairwayError::AlreadyReferred(msg.into())
    }

    pub fn invalid_code<T: Into<String>>(msg: T) -> Self {
        FairwayError::InvalidCode(msg.into())
    }

    pub fn self_referral<T: Into<String>>(msg: T) -> Self {
        FairwayError::SelfReferral(msg.into())
    }

    pub fn persistence<T: Into<String>>(msg: T) -> Self {
        FairwayError::Persistence(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        FairwayError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        FairwayError::DatabaseConnection(msg.into())
    }

    pub fn unexpected<T: Into<String>>(msg: T) -> Self {
        FairwayError::Unexpected(msg.into())
    }
}

impl From<sea_orm::DbErr> for FairwayError {
    fn from(err: sea_orm::DbErr) -> Self {
        FairwayError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for FairwayError {
    fn from(err: std::io::Error) -> Self {
        FairwayError::Unexpected(err.to_string())
    }
}

impl From<serde_json::Error> for FairwayError {
    fn from(err: serde_json::Error) -> Self {
        FairwayError::Unexpected(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FairwayError>;
