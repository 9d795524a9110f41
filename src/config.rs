use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Filesystem and tool settings for the service, resolved once at startup
/// and injected through `AppState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ffmpeg_program: String,
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    pub fn for_root(data_root: impl AsRef<Path>) -> Self {
        let data_root = data_root.as_ref();
        Self {
            upload_dir: data_root.join("uploads"),
            output_dir: data_root.join("outputs"),
            ffmpeg_program: String::from("ffmpeg"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.upload_dir.as_path())?;
        std::fs::create_dir_all(self.output_dir.as_path())
    }
}

pub fn resolve_service_config(data_root: &Path) -> ServiceConfig {
    let upload_dir = std::env::var("CLIPFORGE_UPLOAD_DIR").ok();
    let output_dir = std::env::var("CLIPFORGE_OUTPUT_DIR").ok();
    let ffmpeg_program = std::env::var("CLIPFORGE_FFMPEG").ok();
    let max_upload_bytes = std::env::var("CLIPFORGE_MAX_UPLOAD_BYTES").ok();
    select_service_config(
        upload_dir.as_deref(),
        output_dir.as_deref(),
        ffmpeg_program.as_deref(),
        max_upload_bytes.as_deref(),
        data_root,
    )
}

fn select_service_config(
    upload_dir: Option<&str>,
    output_dir: Option<&str>,
    ffmpeg_program: Option<&str>,
    max_upload_bytes: Option<&str>,
    data_root: &Path,
) -> ServiceConfig {
    let defaults = ServiceConfig::for_root(data_root);

    let upload_dir = non_empty(upload_dir)
        .map(|raw| anchor(raw, data_root))
        .unwrap_or(defaults.upload_dir);
    let output_dir = non_empty(output_dir)
        .map(|raw| anchor(raw, data_root))
        .unwrap_or(defaults.output_dir);
    let ffmpeg_program = non_empty(ffmpeg_program)
        .map(str::to_string)
        .unwrap_or(defaults.ffmpeg_program);
    let max_upload_bytes = non_empty(max_upload_bytes)
        .map(|raw| match raw.parse::<usize>() {
            Ok(value) if value > 0 => value,
            _ => {
                tracing::warn!(
                    raw = %raw,
                    "CLIPFORGE_MAX_UPLOAD_BYTES is not a positive integer, using default"
                );
                DEFAULT_MAX_UPLOAD_BYTES
            }
        })
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

    ServiceConfig {
        upload_dir,
        output_dir,
        ffmpeg_program,
        max_upload_bytes,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn anchor(raw: &str, data_root: &Path) -> PathBuf {
    let candidate = PathBuf::from(raw);
    if candidate.is_absolute() {
        candidate
    } else {
        data_root.join(candidate)
    }
}
