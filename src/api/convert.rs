use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::api::handler_utils::{
    internal_error, into_json, map_media_error, validation_error, ApiObject,
};
use crate::api::multipart::{
    collect_single_video_form, parse_optional_window, validate_single_video,
};
use crate::api::server::AppState;
use crate::media::service::GrayscaleRequest;

#[derive(Debug, Clone, Serialize)]
struct ConvertResponse {
    success: bool,
    file_id: String,
    message: &'static str,
}

/// `POST /upload`: grayscale the uploaded video, optionally restricted to a
/// `startTime`/`endTime` window.
pub async fn convert_video_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiObject<Value> {
    let form = match collect_single_video_form(multipart).await {
        Ok(form) => form,
        Err(message) => return validation_error(message),
    };
    let video = match validate_single_video(form.video) {
        Ok(video) => video,
        Err(message) => return validation_error(message),
    };
    let window = match parse_optional_window(form.start_time.as_deref(), form.end_time.as_deref())
    {
        Ok(window) => window,
        Err(message) => return validation_error(message),
    };

    let service = state.processing.clone();
    let request = GrayscaleRequest {
        extension: video.extension,
        bytes: video.bytes,
        window,
    };
    let result = tokio::task::spawn_blocking(move || service.convert_grayscale(request)).await;

    match result {
        Ok(Ok(artifact)) => (
            StatusCode::OK,
            into_json(ConvertResponse {
                success: true,
                file_id: artifact.file_id.to_string(),
                message: "Video converted successfully",
            }),
        ),
        Ok(Err(error)) => map_media_error(error),
        Err(join_error) => internal_error(format!("grayscale task failed: {join_error}")),
    }
}
