use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

use crate::media::ALLOWED_EXTENSIONS;

/// The merged container is fixed regardless of what went in.
pub const MERGED_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Grayscale,
    Trimmed,
    Merged,
}

impl ArtifactKind {
    /// The tag embedded in output filenames: `<id>_<tag>.<ext>`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Grayscale => "bw",
            Self::Trimmed => "trimmed",
            Self::Merged => "merged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub file_id: Uuid,
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// Canonical artifact bookkeeping: one record per identifier, registered at
/// operation success. The on-disk probe survives only as a fallback for
/// artifacts left behind by earlier process lifetimes.
#[derive(Debug)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    index: Mutex<HashMap<Uuid, ArtifactRecord>>,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            index: Mutex::new(HashMap::new()),
        }
    }

    pub fn output_path(&self, file_id: Uuid, kind: ArtifactKind, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{file_id}_{}.{extension}", kind.tag()))
    }

    /// Registers the canonical artifact for an id. A later operation under
    /// the same id replaces the record.
    pub fn record(&self, file_id: Uuid, kind: ArtifactKind, path: PathBuf) {
        let record = ArtifactRecord {
            file_id,
            kind,
            path,
        };
        self.index
            .lock()
            .expect("artifact index mutex poisoned")
            .insert(file_id, record);
    }

    /// Index lookup first; records whose file has been purged from disk are
    /// ignored. Otherwise probes the output directory in one deterministic
    /// pass: merged, then bw, then trimmed, each across the allowed
    /// extensions in their fixed order.
    pub fn resolve(&self, file_id: Uuid) -> Option<ArtifactRecord> {
        let indexed = self
            .index
            .lock()
            .expect("artifact index mutex poisoned")
            .get(&file_id)
            .cloned();
        if let Some(record) = indexed {
            if record.path.exists() {
                return Some(record);
            }
        }
        self.probe_disk(file_id)
    }

    fn probe_disk(&self, file_id: Uuid) -> Option<ArtifactRecord> {
        let merged = self.output_path(file_id, ArtifactKind::Merged, MERGED_EXTENSION);
        if merged.exists() {
            return Some(ArtifactRecord {
                file_id,
                kind: ArtifactKind::Merged,
                path: merged,
            });
        }

        for kind in [ArtifactKind::Grayscale, ArtifactKind::Trimmed] {
            for extension in ALLOWED_EXTENSIONS {
                let candidate = self.output_path(file_id, kind, extension);
                if candidate.exists() {
                    return Some(ArtifactRecord {
                        file_id,
                        kind,
                        path: candidate,
                    });
                }
            }
        }
        None
    }
}

pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}
