use std::path::Path;

/// `hue=s=0` drops saturation while leaving luma untouched, which is the
/// cheapest grayscale ffmpeg offers.
pub const GRAYSCALE_FILTER: &str = "hue=s=0";

/// A validated sub-range of the input, in seconds. Construction happens at
/// the request boundary; by the time a window reaches a builder it already
/// satisfies `start >= 0` and `end > start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimWindow {
    pub start: f64,
    pub end: f64,
}

impl TrimWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Codec tiers for concatenation, tried in `MERGE_ATTEMPTS` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeCodecPolicy {
    /// Reuse the encoded streams as-is. Fast, but fails when the inputs
    /// disagree on codec parameters.
    StreamCopy,
    /// Re-encode everything to H.264 + AAC.
    Reencode,
}

pub const MERGE_ATTEMPTS: [MergeCodecPolicy; 2] =
    [MergeCodecPolicy::StreamCopy, MergeCodecPolicy::Reencode];

impl MergeCodecPolicy {
    pub fn codec_args(&self) -> &'static [&'static str] {
        match self {
            Self::StreamCopy => &["-c", "copy"],
            Self::Reencode => &["-c:v", "libx264", "-c:a", "aac"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StreamCopy => "stream_copy",
            Self::Reencode => "reencode",
        }
    }
}

pub fn grayscale_args(input: &Path, output: &Path, window: Option<&TrimWindow>) -> Vec<String> {
    let mut args = vec![
        String::from("-y"),
        String::from("-i"),
        path_arg(input),
    ];
    if let Some(window) = window {
        args.extend(window_args(window));
    }
    args.extend([
        String::from("-vf"),
        String::from(GRAYSCALE_FILTER),
        String::from("-c:a"),
        String::from("copy"),
        path_arg(output),
    ]);
    args
}

pub fn trim_args(input: &Path, output: &Path, window: &TrimWindow) -> Vec<String> {
    let mut args = vec![
        String::from("-y"),
        String::from("-i"),
        path_arg(input),
    ];
    args.extend(window_args(window));
    args.extend([
        String::from("-c"),
        String::from("copy"),
        path_arg(output),
    ]);
    args
}

pub fn concat_args(manifest: &Path, output: &Path, policy: MergeCodecPolicy) -> Vec<String> {
    let mut args = vec![
        String::from("-y"),
        String::from("-f"),
        String::from("concat"),
        String::from("-safe"),
        String::from("0"),
        String::from("-i"),
        path_arg(manifest),
    ];
    args.extend(policy.codec_args().iter().map(|arg| String::from(*arg)));
    args.push(path_arg(output));
    args
}

fn window_args(window: &TrimWindow) -> [String; 4] {
    [
        String::from("-ss"),
        format_seconds(window.start),
        String::from("-t"),
        format_seconds(window.duration()),
    ]
}

fn format_seconds(value: f64) -> String {
    format!("{value}")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
