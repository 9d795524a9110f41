use std::collections::HashMap;

use axum::extract::Multipart;

use crate::media::ffmpeg::TrimWindow;
use crate::media::is_allowed_extension;
use crate::media::service::MergeInput;

const MALFORMED_BODY: &str = "Malformed multipart body";

/// A file field as the client sent it, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A validated upload: allow-listed extension, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingVideo {
    pub extension: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleVideoForm {
    pub video: Option<RawUpload>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeForm {
    pub video_count: Option<String>,
    pub files: HashMap<String, RawUpload>,
}

pub async fn collect_single_video_form(mut multipart: Multipart) -> Result<SingleVideoForm, String> {
    let mut form = SingleVideoForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| String::from(MALFORMED_BODY))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| String::from(MALFORMED_BODY))?
                    .to_vec();
                form.video = Some(RawUpload { file_name, bytes });
            }
            "startTime" => {
                form.start_time = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| String::from(MALFORMED_BODY))?,
                );
            }
            "endTime" => {
                form.end_time = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| String::from(MALFORMED_BODY))?,
                );
            }
            _ => {
                // Unknown fields are drained and ignored.
                let _ = field
                    .bytes()
                    .await
                    .map_err(|_| String::from(MALFORMED_BODY))?;
            }
        }
    }
    Ok(form)
}

pub async fn collect_merge_form(mut multipart: Multipart) -> Result<MergeForm, String> {
    let mut form = MergeForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| String::from(MALFORMED_BODY))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "videoCount" {
            form.video_count = Some(
                field
                    .text()
                    .await
                    .map_err(|_| String::from(MALFORMED_BODY))?,
            );
        } else if field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| String::from(MALFORMED_BODY))?
                .to_vec();
            form.files.insert(name, RawUpload { file_name, bytes });
        } else {
            let _ = field
                .bytes()
                .await
                .map_err(|_| String::from(MALFORMED_BODY))?;
        }
    }
    Ok(form)
}

pub fn validate_single_video(upload: Option<RawUpload>) -> Result<IncomingVideo, String> {
    let Some(upload) = upload else {
        return Err(String::from("No video file provided"));
    };
    let file_name = sanitized_file_name(upload.file_name.as_str());
    if file_name.is_empty() {
        return Err(String::from("No file selected"));
    }
    let Some(extension) = extension_of(file_name).filter(|ext| is_allowed_extension(ext)) else {
        return Err(String::from("Invalid file type"));
    };
    Ok(IncomingVideo {
        extension,
        bytes: upload.bytes,
    })
}

pub fn parse_video_count(raw: Option<&str>) -> Result<usize, String> {
    let raw = non_empty(raw).ok_or_else(|| String::from("Video count not provided"))?;
    let count = raw
        .parse::<usize>()
        .map_err(|_| String::from("Invalid video count"))?;
    if count < 2 {
        return Err(String::from("At least 2 videos are required for merging"));
    }
    Ok(count)
}

/// Every declared slot `video0..video{count-1}` must be present and
/// individually valid before anything is staged.
pub fn validate_merge_inputs(
    count: usize,
    mut files: HashMap<String, RawUpload>,
) -> Result<Vec<MergeInput>, String> {
    let mut inputs = Vec::with_capacity(count);
    for index in 0..count {
        let key = format!("video{index}");
        let Some(upload) = files.remove(key.as_str()) else {
            return Err(format!("Video {} not provided", index + 1));
        };
        let video = validate_single_video(Some(upload))
            .map_err(|_| format!("Invalid video file {}", index + 1))?;
        inputs.push(MergeInput {
            extension: video.extension,
            bytes: video.bytes,
        });
    }
    Ok(inputs)
}

/// Bounds are optional but must come as a pair.
pub fn parse_optional_window(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<TrimWindow>, String> {
    match (non_empty(start), non_empty(end)) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => parse_window(start, end).map(Some),
        _ => Err(String::from(
            "Fields 'startTime' and 'endTime' must be provided together",
        )),
    }
}

pub fn parse_required_window(start: Option<&str>, end: Option<&str>) -> Result<TrimWindow, String> {
    match (non_empty(start), non_empty(end)) {
        (Some(start), Some(end)) => parse_window(start, end),
        _ => Err(String::from("Start time and end time are required")),
    }
}

fn parse_window(start: &str, end: &str) -> Result<TrimWindow, String> {
    let start = parse_seconds(start, "startTime")?;
    let end = parse_seconds(end, "endTime")?;
    if start < 0.0 {
        return Err(String::from("Field 'startTime' must not be negative"));
    }
    if end <= start {
        return Err(String::from(
            "Field 'endTime' must be greater than 'startTime'",
        ));
    }
    Ok(TrimWindow { start, end })
}

fn parse_seconds(raw: &str, field: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("Field '{field}' must be a number"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Clients control the filename; only its final path component is trusted,
/// and only for the extension.
fn sanitized_file_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
