use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::api::handler_utils::{internal_error, not_found, validation_error};
use crate::api::server::AppState;
use crate::media::artifacts::{content_type_for_extension, ArtifactRecord};

/// `GET /download/{id}`: serve the canonical artifact for an identifier as
/// an attachment. Ids are always minted as UUIDs, so anything else is
/// rejected before touching the filesystem.
pub async fn download_video_handler(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Response {
    let Ok(file_id) = Uuid::parse_str(file_id.trim()) else {
        return validation_error("Invalid file id").into_response();
    };

    let artifacts = state.artifacts.clone();
    let resolved = tokio::task::spawn_blocking(move || {
        artifacts
            .resolve(file_id)
            .map(|record| std::fs::read(record.path.as_path()).map(|bytes| (record, bytes)))
    })
    .await;

    match resolved {
        Ok(None) => not_found("File not found").into_response(),
        Ok(Some(Ok((record, bytes)))) => attachment_response(&record, bytes),
        Ok(Some(Err(error))) => {
            internal_error(format!("artifact read failed: {error}")).into_response()
        }
        Err(join_error) => {
            internal_error(format!("download task failed: {join_error}")).into_response()
        }
    }
}

fn attachment_response(record: &ArtifactRecord, bytes: Vec<u8>) -> Response {
    let file_name = record
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| record.file_id.to_string());
    let extension = record
        .path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();

    (
        [
            (
                header::CONTENT_TYPE,
                String::from(content_type_for_extension(extension.as_str())),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
