//! Frame extraction and reassembly through an external transcoder.
//!
//! The video engine only needs three things from a transcoder: split a
//! video into numbered lossless PNG frames, join such frames back into a
//! video, and report basic stream metadata. [`FrameTranscoder`] captures
//! that contract; [`Ffmpeg`] implements it by running the `ffmpeg` and
//! `ffprobe` binaries as blocking subprocesses.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::str::FromStr;
use tracing::debug;

use crate::stego::error::StegoError;

/// Frame rate used for extraction and reassembly.
pub const DEFAULT_FPS: u32 = 30;

/// printf-style pattern handed to the transcoder for frame files.
pub const FRAME_PATTERN: &str = "frame_%06d.png";

/// File name of the 1-based frame `index`, matching [`FRAME_PATTERN`].
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:06}.png", index)
}

/// Path of frame `index` inside `dir`.
pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(frame_file_name(index))
}

/// Counts `frame_*.png` files in `dir`.
pub fn count_frames(dir: &Path) -> Result<usize, StegoError> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("frame_") && name.ends_with(".png") {
            count += 1;
        }
    }
    Ok(count)
}

/// Codec used when frames are joined back into a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReassemblyCodec {
    /// Lossless H.264 in RGB. Embedded bits survive.
    #[default]
    Lossless,
    /// H.264 with 4:2:0 chroma subsampling. Smaller files, but the embedded
    /// bits do not survive.
    LossyH264,
}

impl ReassemblyCodec {
    fn args(&self) -> &'static [&'static str] {
        match self {
            Self::Lossless => &["-c:v", "libx264rgb", "-qp", "0", "-pix_fmt", "rgb24"],
            Self::LossyH264 => &["-c:v", "libx264", "-pix_fmt", "yuv420p"],
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Lossless)
    }
}

impl fmt::Display for ReassemblyCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lossless => write!(f, "lossless"),
            Self::LossyH264 => write!(f, "lossy-h264"),
        }
    }
}

impl FromStr for ReassemblyCodec {
    type Err = StegoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lossless" => Ok(Self::Lossless),
            "lossy-h264" | "lossy" | "h264" => Ok(Self::LossyH264),
            other => Err(StegoError::UnsupportedFormat(format!(
                "unknown reassembly codec '{}', expected lossless or lossy-h264",
                other
            ))),
        }
    }
}

/// Transcoder binaries and frame settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderSettings {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub fps: u32,
    pub codec: ReassemblyCodec,
}

impl Default for TranscoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            fps: DEFAULT_FPS,
            codec: ReassemblyCodec::default(),
        }
    }
}

/// Basic metadata of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
    /// Frames `extract_frames` will produce.
    pub frames: usize,
}

/// Splits videos into frames and joins frames into videos.
///
/// Implementations are blocking and all-or-nothing: a call either completes
/// or returns an error, and is never retried.
pub trait FrameTranscoder {
    /// Checks that the transcoder can run at all.
    fn check(&self) -> Result<(), StegoError> {
        Ok(())
    }

    /// Writes `frame_000001.png`, `frame_000002.png`, ... into `frames_dir`
    /// and returns how many frames were written.
    fn extract_frames(&self, video: &Path, frames_dir: &Path) -> Result<usize, StegoError>;

    /// Joins the frames in `frames_dir` into `output`.
    fn reassemble(&self, frames_dir: &Path, output: &Path) -> Result<(), StegoError>;

    /// Reads stream metadata without extracting frames. `frames` must be
    /// counted at the rate frames are extracted.
    fn probe(&self, video: &Path) -> Result<VideoInfo, StegoError>;

    /// Whether `reassemble` preserves pixel values exactly.
    fn is_lossless(&self) -> bool {
        true
    }
}

/// [`FrameTranscoder`] backed by the `ffmpeg` / `ffprobe` command-line tools.
#[derive(Debug, Clone, Default)]
pub struct Ffmpeg {
    settings: TranscoderSettings,
}

impl Ffmpeg {
    pub fn new(settings: TranscoderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TranscoderSettings {
        &self.settings
    }

    fn run(&self, program: &Path, args: &[OsString]) -> Result<Output, StegoError> {
        let tool = program.display().to_string();
        debug!(tool = %tool, ?args, "running transcoder");

        let output = Command::new(program).args(args).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StegoError::TranscoderUnavailable(format!("{} is not installed or not on PATH", tool))
            } else {
                StegoError::TranscoderUnavailable(format!("failed to start {}: {}", tool, e))
            }
        })?;

        if !output.status.success() {
            return Err(StegoError::TranscoderFailed {
                tool,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

impl FrameTranscoder for Ffmpeg {
    fn check(&self) -> Result<(), StegoError> {
        self.run(&self.settings.ffmpeg, &[OsString::from("-version")])?;
        Ok(())
    }

    fn extract_frames(&self, video: &Path, frames_dir: &Path) -> Result<usize, StegoError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-i".into(),
            video.into(),
            "-vf".into(),
            format!("fps={}", self.settings.fps).into(),
            frames_dir.join(FRAME_PATTERN).into(),
        ];
        self.run(&self.settings.ffmpeg, &args)?;
        count_frames(frames_dir)
    }

    fn reassemble(&self, frames_dir: &Path, output: &Path) -> Result<(), StegoError> {
        let mut args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-y".into(),
            "-framerate".into(),
            self.settings.fps.to_string().into(),
            "-i".into(),
            frames_dir.join(FRAME_PATTERN).into(),
        ];
        args.extend(self.settings.codec.args().iter().map(|arg| OsString::from(*arg)));
        args.push(output.into());

        self.run(&self.settings.ffmpeg, &args)?;
        Ok(())
    }

    fn probe(&self, video: &Path) -> Result<VideoInfo, StegoError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-select_streams".into(),
            "v:0".into(),
            "-show_entries".into(),
            "stream=width,height,duration,nb_frames".into(),
            "-of".into(),
            "default=noprint_wrappers=1".into(),
            video.into(),
        ];
        let output = self.run(&self.settings.ffprobe, &args)?;
        let mut info = parse_probe_output(&String::from_utf8_lossy(&output.stdout));
        info.frames = extracted_frame_count(&info, self.settings.fps);
        Ok(info)
    }

    fn is_lossless(&self) -> bool {
        self.settings.codec.is_lossless()
    }
}

/// Number of frames `extract_frames` yields at `fps`.
///
/// ffprobe's `nb_frames` counts at the source's native rate, while frames
/// are re-sampled to `fps` on extraction, so the duration is used when
/// known. `nb_frames` is the fallback for streams without a duration.
pub fn extracted_frame_count(info: &VideoInfo, fps: u32) -> usize {
    if info.duration_secs > 0.0 {
        (info.duration_secs * fps as f64).round() as usize
    } else {
        info.frames
    }
}

/// Parses `key=value` lines printed by ffprobe. Unknown keys and `N/A`
/// values are ignored.
pub fn parse_probe_output(stdout: &str) -> VideoInfo {
    let mut info = VideoInfo::default();

    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => info.width = value.parse().unwrap_or(0),
            "height" => info.height = value.parse().unwrap_or(0),
            "duration" => info.duration_secs = value.parse().unwrap_or(0.0),
            "nb_frames" => info.frames = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    info
}
