use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::media::artifacts::{ArtifactKind, ArtifactStore, MERGED_EXTENSION};
use crate::media::command::{CommandSpec, MediaCommandRunner};
use crate::media::ffmpeg::{concat_args, grayscale_args, trim_args, TrimWindow, MERGE_ATTEMPTS};
use crate::media::staging::{self, StagedFile};

#[derive(Debug, Error)]
pub enum MediaError {
    /// The external tool ran and exited nonzero. The stderr text travels to
    /// the API response unchanged.
    #[error("{program} exited with status {status_code}: {stderr}")]
    Tool {
        program: String,
        status_code: i32,
        stderr: String,
    },
    /// Staging, manifest, or spawn failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrayscaleRequest {
    pub extension: String,
    pub bytes: Vec<u8>,
    pub window: Option<TrimWindow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrimRequest {
    pub extension: String,
    pub bytes: Vec<u8>,
    pub window: TrimWindow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInput {
    pub extension: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub inputs: Vec<MergeInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedArtifact {
    pub file_id: Uuid,
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// Synchronous orchestration of one media operation: stage the upload, run
/// the tool, remove staged files unconditionally, register the artifact.
/// Handlers call this on the blocking pool.
#[derive(Clone)]
pub struct ProcessingService {
    config: Arc<ServiceConfig>,
    runner: Arc<dyn MediaCommandRunner>,
    artifacts: Arc<ArtifactStore>,
}

impl ProcessingService {
    pub fn new(
        config: Arc<ServiceConfig>,
        runner: Arc<dyn MediaCommandRunner>,
        artifacts: Arc<ArtifactStore>,
    ) -> Self {
        Self {
            config,
            runner,
            artifacts,
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        self.artifacts.as_ref()
    }

    pub fn convert_grayscale(
        &self,
        request: GrayscaleRequest,
    ) -> Result<ProcessedArtifact, MediaError> {
        let file_id = Uuid::new_v4();
        let window = request.window;
        let path = self.run_single(
            file_id,
            request.extension.as_str(),
            request.bytes.as_slice(),
            ArtifactKind::Grayscale,
            |input, output| grayscale_args(input, output, window.as_ref()),
        )?;
        info!(%file_id, windowed = window.is_some(), "converted video to grayscale");
        Ok(self.finish(file_id, ArtifactKind::Grayscale, path))
    }

    pub fn trim(&self, request: TrimRequest) -> Result<ProcessedArtifact, MediaError> {
        let file_id = Uuid::new_v4();
        let window = request.window;
        let path = self.run_single(
            file_id,
            request.extension.as_str(),
            request.bytes.as_slice(),
            ArtifactKind::Trimmed,
            |input, output| trim_args(input, output, &window),
        )?;
        info!(%file_id, duration = window.duration(), "trimmed video");
        Ok(self.finish(file_id, ArtifactKind::Trimmed, path))
    }

    pub fn merge(&self, request: MergeRequest) -> Result<ProcessedArtifact, MediaError> {
        let file_id = Uuid::new_v4();
        let input_count = request.inputs.len();

        let mut staged: Vec<StagedFile> = Vec::with_capacity(input_count);
        let mut stage_error = None;
        for (index, input) in request.inputs.iter().enumerate() {
            let name = staging::staged_merge_input_name(file_id, index, input.extension.as_str());
            match staging::stage_bytes(
                self.config.upload_dir.as_path(),
                name.as_str(),
                input.bytes.as_slice(),
            ) {
                Ok(file) => staged.push(file),
                Err(error) => {
                    stage_error = Some(error);
                    break;
                }
            }
        }

        let result = match stage_error {
            Some(error) => Err(MediaError::Io(error)),
            None => self.run_concat(file_id, staged.as_slice()),
        };

        for input in staged.iter() {
            input.remove_best_effort();
        }

        let path = result?;
        info!(%file_id, inputs = input_count, "merged videos");
        Ok(self.finish(file_id, ArtifactKind::Merged, path))
    }

    fn run_single(
        &self,
        file_id: Uuid,
        extension: &str,
        bytes: &[u8],
        kind: ArtifactKind,
        build_args: impl FnOnce(&Path, &Path) -> Vec<String>,
    ) -> Result<PathBuf, MediaError> {
        let name = staging::staged_input_name(file_id, extension);
        let staged = staging::stage_bytes(self.config.upload_dir.as_path(), name.as_str(), bytes)?;
        let output_path = self.artifacts.output_path(file_id, kind, extension);

        let spec = CommandSpec {
            program: self.config.ffmpeg_program.clone(),
            args: build_args(staged.path(), output_path.as_path()),
        };
        let result = self.invoke(spec);
        staged.remove_best_effort();
        result.map(|()| output_path)
    }

    fn run_concat(&self, file_id: Uuid, staged: &[StagedFile]) -> Result<PathBuf, MediaError> {
        let manifest =
            staging::write_concat_manifest(self.config.upload_dir.as_path(), file_id, staged)?;
        let output_path = self
            .artifacts
            .output_path(file_id, ArtifactKind::Merged, MERGED_EXTENSION);

        let result = self.run_merge_attempts(manifest.path(), output_path.as_path());
        manifest.remove_best_effort();
        result.map(|()| output_path)
    }

    /// Walks the codec tiers in order. A `Tool` failure falls through to
    /// the next tier; an `Io` failure aborts, since retrying cannot help.
    fn run_merge_attempts(&self, manifest: &Path, output: &Path) -> Result<(), MediaError> {
        let mut last_tool_error = None;
        for policy in MERGE_ATTEMPTS {
            let spec = CommandSpec {
                program: self.config.ffmpeg_program.clone(),
                args: concat_args(manifest, output, policy),
            };
            match self.invoke(spec) {
                Ok(()) => return Ok(()),
                Err(error @ MediaError::Tool { .. }) => {
                    warn!(tier = policy.label(), %error, "concat attempt failed");
                    last_tool_error = Some(error);
                }
                Err(other) => return Err(other),
            }
        }
        Err(last_tool_error.expect("merge attempt tiers are non-empty"))
    }

    fn invoke(&self, spec: CommandSpec) -> Result<(), MediaError> {
        debug!(program = %spec.program, args = ?spec.args, "invoking media tool");
        let output = self.runner.run(&spec)?;
        if output.status_code != 0 {
            return Err(MediaError::Tool {
                program: spec.program,
                status_code: output.status_code,
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    fn finish(&self, file_id: Uuid, kind: ArtifactKind, path: PathBuf) -> ProcessedArtifact {
        self.artifacts.record(file_id, kind, path.clone());
        ProcessedArtifact {
            file_id,
            kind,
            path,
        }
    }
}
