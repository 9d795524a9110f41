use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::api::handler_utils::{
    internal_error, into_json, map_media_error, validation_error, ApiObject,
};
use crate::api::multipart::{
    collect_single_video_form, parse_required_window, validate_single_video,
};
use crate::api::server::AppState;
use crate::media::service::TrimRequest;

#[derive(Debug, Clone, Serialize)]
struct TrimResponse {
    success: bool,
    file_id: String,
    message: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// `POST /trim`: stream-copy the `startTime`..`endTime` window. Bounds are
/// mandatory here, unlike `/upload`.
pub async fn trim_video_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiObject<Value> {
    let form = match collect_single_video_form(multipart).await {
        Ok(form) => form,
        Err(message) => return validation_error(message),
    };
    if form.video.is_none() {
        return validation_error("No video file provided");
    }
    let window = match parse_required_window(form.start_time.as_deref(), form.end_time.as_deref())
    {
        Ok(window) => window,
        Err(message) => return validation_error(message),
    };
    let video = match validate_single_video(form.video) {
        Ok(video) => video,
        Err(message) => return validation_error(message),
    };

    let service = state.processing.clone();
    let request = TrimRequest {
        extension: video.extension,
        bytes: video.bytes,
        window,
    };
    let result = tokio::task::spawn_blocking(move || service.trim(request)).await;

    match result {
        Ok(Ok(artifact)) => (
            StatusCode::OK,
            into_json(TrimResponse {
                success: true,
                file_id: artifact.file_id.to_string(),
                message: "Video trimmed successfully",
                kind: "trimmed",
            }),
        ),
        Ok(Err(error)) => map_media_error(error),
        Err(join_error) => internal_error(format!("trim task failed: {join_error}")),
    }
}
