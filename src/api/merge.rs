use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::api::handler_utils::{
    internal_error, into_json, map_media_error, validation_error, ApiObject,
};
use crate::api::multipart::{collect_merge_form, parse_video_count, validate_merge_inputs};
use crate::api::server::AppState;
use crate::media::service::MergeRequest;

#[derive(Debug, Clone, Serialize)]
struct MergeResponse {
    success: bool,
    file_id: String,
    message: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// `POST /merge`: concatenate `videoCount` uploads (`video0..videoN-1`) into
/// one mp4, stream-copy first, re-encode as the fallback tier.
pub async fn merge_videos_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiObject<Value> {
    let form = match collect_merge_form(multipart).await {
        Ok(form) => form,
        Err(message) => return validation_error(message),
    };
    let count = match parse_video_count(form.video_count.as_deref()) {
        Ok(count) => count,
        Err(message) => return validation_error(message),
    };
    let inputs = match validate_merge_inputs(count, form.files) {
        Ok(inputs) => inputs,
        Err(message) => return validation_error(message),
    };

    let service = state.processing.clone();
    let result = tokio::task::spawn_blocking(move || service.merge(MergeRequest { inputs })).await;

    match result {
        Ok(Ok(artifact)) => (
            StatusCode::OK,
            into_json(MergeResponse {
                success: true,
                file_id: artifact.file_id.to_string(),
                message: format!("Successfully merged {count} videos"),
                kind: "merged",
            }),
        ),
        Ok(Err(error)) => map_media_error(error),
        Err(join_error) => internal_error(format!("merge task failed: {join_error}")),
    }
}
