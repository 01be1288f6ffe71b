//! Response helpers shared by the API handlers.

use actix_web::HttpResponse;
use serde::Serialize;

use crate::errors::FairwayError;

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: &'static str,
}

/// Build the wire-format failure response for an error.
///
/// The body only ever carries the user-facing message; internal detail
/// stays in the logs.
pub fn error_response(err: &FairwayError) -> HttpResponse {
    HttpResponse::build(err.http_status())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ErrorBody {
            success: false,
            message: err.user_message(),
        })
}
