use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use clipforge_backend::api::server::build_router_with_config_and_runner;
use clipforge_backend::config::ServiceConfig;
use clipforge_backend::media::command::{CommandOutput, CommandSpec, MediaCommandRunner};

#[tokio::test]
async fn upload_without_bounds_converts_and_reports_file_id() {
    let config = test_config();
    let runner = Arc::new(FakeRunner::default());
    let app = build_router_with_config_and_runner(config.clone(), runner.clone());

    let body = MultipartBody::new()
        .file_field("video", "clip.mp4", b"fake video bytes")
        .finish();
    let response = send_multipart(app, "/upload", body, StatusCode::OK).await;

    assert_eq!(response["success"], json!(true));
    assert_eq!(response["message"], json!("Video converted successfully"));
    let file_id = response["file_id"].as_str().expect("file_id should be a string");
    Uuid::parse_str(file_id).expect("file_id should be a uuid");

    let seen = runner.take_seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].program, "ffmpeg");
    assert!(seen[0].args.contains(&String::from("hue=s=0")));
    assert!(!seen[0].args.contains(&String::from("-ss")));
    let output_arg = seen[0].args.last().expect("output path should be last");
    assert!(output_arg.ends_with(&format!("{file_id}_bw.mp4")));

    assert!(upload_dir_is_empty(&config), "staged input should be removed");
}

#[tokio::test]
async fn upload_with_bounds_passes_offset_and_duration() {
    let config = test_config();
    let runner = Arc::new(FakeRunner::default());
    let app = build_router_with_config_and_runner(config.clone(), runner.clone());

    let body = MultipartBody::new()
        .file_field("video", "clip.mp4", b"fake video bytes")
        .text_field("startTime", "2.0")
        .text_field("endTime", "5.0")
        .finish();
    let response = send_multipart(app, "/upload", body, StatusCode::OK).await;

    assert_eq!(response["success"], json!(true));
    assert_eq!(response["message"], json!("Video converted successfully"));

    let seen = runner.take_seen();
    assert_eq!(seen.len(), 1);
    let args = &seen[0].args;
    let ss = args.iter().position(|a| a == "-ss").expect("-ss should be present");
    assert_eq!(args[ss + 1], "2");
    let t = args.iter().position(|a| a == "-t").expect("-t should be present");
    assert_eq!(args[t + 1], "3");
    assert!(args.contains(&String::from("hue=s=0")));
}

#[tokio::test]
async fn upload_rejects_disallowed_extension_before_staging() {
    let config = test_config();
    let runner = Arc::new(FakeRunner::default());
    let app = build_router_with_config_and_runner(config.clone(), runner.clone());

    let body = MultipartBody::new()
        .file_field("video", "notes.txt", b"not a video")
        .finish();
    let response = send_multipart(app, "/upload", body, StatusCode::BAD_REQUEST).await;

    assert_eq!(response["success"], json!(false));
    assert_eq!(response["error"], json!("Invalid file type"));
    assert_eq!(response["error_kind"], json!("validation"));
    assert_eq!(response["error_code"], json!("validation_error"));
    assert!(runner.take_seen().is_empty(), "tool must not run");
    assert!(upload_dir_is_empty(&config), "nothing may be staged");
}

#[tokio::test]
async fn upload_requires_the_video_field() {
    let config = test_config();
    let runner = Arc::new(FakeRunner::default());
    let app = build_router_with_config_and_runner(config, runner.clone());

    let body = MultipartBody::new().text_field("startTime", "1").finish();
    let response = send_multipart(app, "/upload", body, StatusCode::BAD_REQUEST).await;

    assert_eq!(response["error"], json!("No video file provided"));
    assert!(runner.take_seen().is_empty());
}

#[tokio::test]
async fn upload_rejects_partial_bounds() {
    let config = test_config();
    let runner = Arc::new(FakeRunner::default());
    let app = build_router_with_config_and_runner(config, runner.clone());

    let body = MultipartBody::new()
        .file_field("video", "clip.mp4", b"fake video bytes")
        .text_field("startTime", "2.0")
        .finish();
    let response = send_multipart(app, "/upload", body, StatusCode::BAD_REQUEST).await;

    assert_eq!(
        response["error"],
        json!("Fields 'startTime' and 'endTime' must be provided together")
    );
    assert!(runner.take_seen().is_empty());
}

#[tokio::test]
async fn upload_rejects_inverted_bounds() {
    let config = test_config();
    let runner = Arc::new(FakeRunner::default());
    let app = build_router_with_config_and_runner(config, runner.clone());

    let body = MultipartBody::new()
        .file_field("video", "clip.mp4", b"fake video bytes")
        .text_field("startTime", "5.0")
        .text_field("endTime", "2.0")
        .finish();
    let response = send_multipart(app, "/upload", body, StatusCode::BAD_REQUEST).await;

    assert_eq!(
        response["error"],
        json!("Field 'endTime' must be greater than 'startTime'")
    );
    assert!(runner.take_seen().is_empty());
}

#[tokio::test]
async fn upload_surfaces_tool_stderr_on_failure() {
    let config = test_config();
    let runner = Arc::new(FakeRunner::scripted(vec![Ok(CommandOutput {
        status_code: 1,
        stdout: String::new(),
        stderr: String::from("Invalid data found when processing input"),
    })]));
    let app = build_router_with_config_and_runner(config.clone(), runner.clone());

    let body = MultipartBody::new()
        .file_field("video", "clip.mp4", b"fake video bytes")
        .finish();
    let response = send_multipart(app, "/upload", body, StatusCode::INTERNAL_SERVER_ERROR).await;

    assert_eq!(response["success"], json!(false));
    assert_eq!(
        response["error"],
        json!("ffmpeg error: Invalid data found when processing input")
    );
    assert_eq!(response["error_kind"], json!("tool"));
    assert_eq!(response["error_code"], json!("tool_failed"));
    assert!(upload_dir_is_empty(&config), "staged input should be removed on failure");
}

const BOUNDARY: &str = "clipforge-test-boundary";

struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn text_field(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    fn file_field(mut self, name: &str, file_name: &str, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(payload);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}

async fn send_multipart(
    app: axum::Router,
    uri: &str,
    body: Vec<u8>,
    expected_status: StatusCode,
) -> Value {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request should build");

    let response = app
        .oneshot(request)
        .await
        .expect("router should return response");
    assert_eq!(response.status(), expected_status);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(body.as_ref()).expect("response should be valid JSON")
}

fn test_config() -> ServiceConfig {
    let root = std::env::temp_dir().join(format!("clipforge_convert_test_{}", Uuid::new_v4()));
    ServiceConfig::for_root(root)
}

fn upload_dir_is_empty(config: &ServiceConfig) -> bool {
    std::fs::read_dir(config.upload_dir.as_path())
        .expect("upload dir readable")
        .next()
        .is_none()
}

#[derive(Default)]
struct FakeRunner {
    seen: Mutex<Vec<CommandSpec>>,
    script: Mutex<Vec<std::io::Result<CommandOutput>>>,
}

impl FakeRunner {
    fn scripted(outcomes: Vec<std::io::Result<CommandOutput>>) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            script: Mutex::new(outcomes),
        }
    }

    fn take_seen(&self) -> Vec<CommandSpec> {
        std::mem::take(&mut *self.seen.lock().expect("fake runner mutex poisoned"))
    }
}

impl MediaCommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        self.seen
            .lock()
            .expect("fake runner mutex poisoned")
            .push(spec.clone());
        let mut script = self.script.lock().expect("fake runner mutex poisoned");
        if script.is_empty() {
            return Ok(CommandOutput {
                status_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            });
        }
        script.remove(0)
    }
}
