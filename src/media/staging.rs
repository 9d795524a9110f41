use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

/// A file this request wrote under the upload directory. Removal is
/// best-effort and unconditional: processing outcomes never depend on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn remove_best_effort(&self) {
        if let Err(error) = std::fs::remove_file(self.path.as_path()) {
            warn!(path = %self.path.display(), %error, "failed to remove staged file");
        }
    }
}

pub fn staged_input_name(file_id: Uuid, extension: &str) -> String {
    format!("{file_id}.{extension}")
}

pub fn staged_merge_input_name(file_id: Uuid, index: usize, extension: &str) -> String {
    format!("{file_id}_input_{index}.{extension}")
}

pub fn concat_manifest_name(file_id: Uuid) -> String {
    format!("{file_id}_concat.txt")
}

pub fn stage_bytes(upload_dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<StagedFile> {
    let path = upload_dir.join(name);
    std::fs::write(path.as_path(), bytes)?;
    Ok(StagedFile { path })
}

/// Writes the concat demuxer manifest: one `file '<path>'` line per input,
/// absolute paths, forward slashes, embedded quotes escaped.
pub fn write_concat_manifest(
    upload_dir: &Path,
    file_id: Uuid,
    inputs: &[StagedFile],
) -> std::io::Result<StagedFile> {
    let path = upload_dir.join(concat_manifest_name(file_id));
    let mut manifest = std::fs::File::create(path.as_path())?;
    for input in inputs {
        let absolute = std::fs::canonicalize(input.path())?;
        writeln!(manifest, "file '{}'", escape_concat_path(absolute.as_path()))?;
    }
    Ok(StagedFile { path })
}

fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clipforge_staging_{tag}_{}", Uuid::new_v4()));
        std::fs::create_dir_all(dir.as_path()).expect("temp dir must be creatable");
        dir
    }

    #[test]
    fn staged_names_follow_the_id_conventions() {
        let id = Uuid::nil();
        assert_eq!(
            staged_input_name(id, "mp4"),
            "00000000-0000-0000-0000-000000000000.mp4"
        );
        assert_eq!(
            staged_merge_input_name(id, 3, "mkv"),
            "00000000-0000-0000-0000-000000000000_input_3.mkv"
        );
        assert_eq!(
            concat_manifest_name(id),
            "00000000-0000-0000-0000-000000000000_concat.txt"
        );
    }

    #[test]
    fn stage_bytes_writes_and_remove_deletes() {
        let dir = temp_dir("roundtrip");
        let staged = stage_bytes(dir.as_path(), "a.mp4", b"payload").expect("staging should work");
        assert_eq!(std::fs::read(staged.path()).expect("staged file readable"), b"payload");

        staged.remove_best_effort();
        assert!(!staged.path().exists());
        // A second removal only logs.
        staged.remove_best_effort();
    }

    #[test]
    fn manifest_lists_absolute_paths_in_input_order() {
        let dir = temp_dir("manifest");
        let id = Uuid::new_v4();
        let inputs = [
            stage_bytes(dir.as_path(), "first.mp4", b"a").expect("staging should work"),
            stage_bytes(dir.as_path(), "second.mp4", b"b").expect("staging should work"),
        ];

        let manifest = write_concat_manifest(dir.as_path(), id, &inputs)
            .expect("manifest should be written");
        let body = std::fs::read_to_string(manifest.path()).expect("manifest readable");

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("file '"));
        assert!(lines[0].contains("first.mp4"));
        assert!(lines[1].contains("second.mp4"));
        for line in lines {
            let quoted = line.trim_start_matches("file '").trim_end_matches('\'');
            assert!(Path::new(quoted).is_absolute(), "path should be absolute: {quoted}");
        }
    }

    #[test]
    fn concat_paths_escape_quotes_and_backslashes() {
        assert_eq!(
            escape_concat_path(Path::new("/tmp/it's here/clip.mp4")),
            r"/tmp/it'\''s here/clip.mp4"
        );
    }
}
