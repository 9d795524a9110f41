use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::api::error::ErrorKind;
use crate::media::service::MediaError;

pub type ApiObject<T> = (StatusCode, Json<T>);

#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    error_kind: ErrorKind,
    error_code: String,
}

pub fn error_response(
    status: StatusCode,
    kind: ErrorKind,
    code: impl Into<String>,
    message: impl Into<String>,
) -> ApiObject<Value> {
    (
        status,
        into_json(ErrorResponse {
            success: false,
            error: message.into(),
            error_kind: kind,
            error_code: code.into(),
        }),
    )
}

pub fn validation_error(message: impl Into<String>) -> ApiObject<Value> {
    error_response(
        StatusCode::BAD_REQUEST,
        ErrorKind::Validation,
        "validation_error",
        message,
    )
}

pub fn not_found(message: impl Into<String>) -> ApiObject<Value> {
    error_response(
        StatusCode::NOT_FOUND,
        ErrorKind::Validation,
        "not_found",
        message,
    )
}

pub fn internal_error(message: impl Into<String>) -> ApiObject<Value> {
    let detail = message.into();
    error!(detail = %detail, "internal api error");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Infra,
        "internal_error",
        "Internal server error",
    )
}

/// Tool failures carry the tool's stderr verbatim; local I/O failures are
/// sanitized and logged.
pub fn map_media_error(error: MediaError) -> ApiObject<Value> {
    match error {
        MediaError::Tool {
            program,
            status_code,
            stderr,
        } => {
            error!(%program, status_code, "media tool failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Tool,
                "tool_failed",
                format!("ffmpeg error: {stderr}"),
            )
        }
        MediaError::Io(source) => internal_error(format!("media io failure: {source}")),
    }
}

pub fn into_json(payload: impl Serialize) -> Json<Value> {
    Json(serde_json::to_value(payload).expect("api payload should serialize"))
}
