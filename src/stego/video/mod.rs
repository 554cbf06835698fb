//! Frame-based LSB steganography for video.
//!
//! The video is split into lossless PNG frames by a [`FrameTranscoder`],
//! the framed payload is spread over the frames in index order using the
//! image engine's per-frame walk, and the frames are joined back into a
//! video. Frames are only rewritten until the payload is exhausted; the
//! rest pass through untouched.
//!
//! The embedded bits only survive if reassembly is lossless. With
//! [`ReassemblyCodec::LossyH264`] encoding still succeeds but the payload
//! will generally not be recoverable.

pub mod transcoder;

use image::{DynamicImage, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::capacity::{video_capacity, Capacity};
use super::error::StegoError;
use super::framing::{self, Unframer};
use super::image::{embed_rgb, extract_rgb, LsbConfig};
use super::{EncodeReport, Medium};

pub use transcoder::{
    frame_path, Ffmpeg, FrameTranscoder, ReassemblyCodec, TranscoderSettings, VideoInfo,
    DEFAULT_FPS, FRAME_PATTERN,
};

/// Default number of frames used for embedding.
pub const DEFAULT_MAX_FRAMES: usize = 30;

const RGB_STRIDE: usize = 3;

/// Scratch directory holding extracted frames and the reassembled video
/// until it is moved into place. Removed when dropped, on success and error
/// paths alike.
struct FrameWorkspace {
    root: TempDir,
    frames_dir: PathBuf,
}

impl FrameWorkspace {
    fn create() -> Result<Self, StegoError> {
        let root = tempfile::Builder::new().prefix("coverstego-").tempdir()?;
        let frames_dir = root.path().join("frames");
        fs::create_dir(&frames_dir)?;
        Ok(Self { root, frames_dir })
    }

    fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    /// Where the transcoder writes the video before it replaces `output`.
    /// Keeps the extension so the container format is unchanged.
    fn staged_output(&self, output: &Path) -> PathBuf {
        match output.extension() {
            Some(ext) => self
                .root
                .path()
                .join("reassembled")
                .with_extension(ext),
            None => self.root.path().join("reassembled"),
        }
    }
}

/// Moves a finished video from the workspace to `output`.
fn persist(staged: &Path, output: &Path) -> Result<(), StegoError> {
    if fs::rename(staged, output).is_ok() {
        return Ok(());
    }
    // Workspace and output on different filesystems.
    fs::copy(staged, output)?;
    Ok(())
}

fn load_frame(path: &Path) -> Result<image::RgbImage, StegoError> {
    let frame = image::open(path).map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
    Ok(frame.to_rgb8())
}

/// Video steganography handler, generic over the transcoder.
pub struct VideoStego<T: FrameTranscoder> {
    transcoder: T,
    config: LsbConfig,
}

impl VideoStego<Ffmpeg> {
    /// Video engine using ffmpeg with the given settings.
    pub fn ffmpeg(settings: TranscoderSettings) -> Self {
        Self::new(Ffmpeg::new(settings))
    }
}

impl<T: FrameTranscoder> VideoStego<T> {
    /// Creates a video engine with one bit per channel and the text sentinel.
    pub fn new(transcoder: T) -> Self {
        Self {
            transcoder,
            config: LsbConfig::basic(),
        }
    }

    /// Overrides the per-frame bit layout.
    pub fn with_config(mut self, config: LsbConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// Probes the video and estimates its capacity over `max_frames` frames.
    ///
    /// The frame count is the one the transcoder reports for its extraction
    /// rate, so it matches what `encode` will see.
    pub fn capacity(&self, cover: &Path, max_frames: usize) -> Result<Capacity, StegoError> {
        let info = self.transcoder.probe(cover)?;
        Ok(video_capacity(
            info.width,
            info.height,
            info.frames,
            max_frames,
            &self.config,
        ))
    }

    /// Reads stream metadata.
    pub fn info(&self, cover: &Path) -> Result<VideoInfo, StegoError> {
        self.transcoder.probe(cover)
    }

    /// Hides `payload` in the first frames of `cover` and writes the result
    /// to `output`.
    ///
    /// Fails with `CapacityExceeded` if the payload does not fit in
    /// `max_frames` frames; in that case no frame is modified and `output`
    /// is not written. The video is reassembled inside the workspace and
    /// only moved to `output` once the transcoder succeeds, so a failed
    /// reassembly leaves `output` as it was.
    pub fn encode(
        &self,
        cover: &Path,
        payload: &[u8],
        output: &Path,
        max_frames: usize,
    ) -> Result<EncodeReport, StegoError> {
        self.transcoder.check()?;

        let workspace = FrameWorkspace::create()?;
        let frames_dir = workspace.frames_dir();

        let total_frames = self.transcoder.extract_frames(cover, frames_dir)?;
        let usable = total_frames.min(max_frames);
        debug!(total_frames, usable, "extracted frames");

        let stream = framing::frame(payload, self.config.sentinel());

        let mut units = 0usize;
        for index in 1..=usable {
            let (width, height) = image::image_dimensions(frame_path(frames_dir, index))
                .map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
            units += width as usize * height as usize * RGB_STRIDE;
        }
        let capacity = Capacity::new(
            units,
            self.config.bits_per_channel(),
            self.config.sentinel().len(),
        );
        if !capacity.fits(stream.len()) {
            return Err(StegoError::CapacityExceeded {
                required: payload.len(),
                available: capacity.max_bytes,
            });
        }

        let mut bits = stream.bits();
        let mut frames_used = 0;
        for index in 1..=usable {
            if bits.len() == 0 {
                break;
            }

            let path = frame_path(frames_dir, index);
            let mut frame = load_frame(&path)?;
            embed_rgb(&mut frame, RGB_STRIDE, &mut bits, &self.config);
            DynamicImage::ImageRgb8(frame)
                .save_with_format(&path, ImageFormat::Png)
                .map_err(|e| StegoError::ImageSaveError(e.to_string()))?;

            frames_used += 1;
            debug!(frame = index, remaining_bits = bits.len(), "embedded frame");
        }

        if !self.transcoder.is_lossless() {
            warn!("reassembling with a lossy codec, the payload will likely not survive");
        }
        let staged = workspace.staged_output(output);
        self.transcoder.reassemble(frames_dir, &staged)?;
        persist(&staged, output)?;

        info!(
            payload_bytes = payload.len(),
            frames_used,
            total_frames,
            output = %output.display(),
            "payload embedded in video"
        );

        Ok(EncodeReport {
            medium: Medium::Video,
            message_size: payload.len(),
            compressed: false,
            output_path: output.to_path_buf(),
            bits_per_channel: Some(self.config.bits_per_channel()),
            frames_used: Some(frames_used),
            total_frames: Some(total_frames),
            duration_secs: None,
        })
    }

    /// Extracts the payload from the first `max_frames` frames of `stego`.
    pub fn decode(&self, stego: &Path, max_frames: usize) -> Result<Vec<u8>, StegoError> {
        self.transcoder.check()?;

        let workspace = FrameWorkspace::create()?;
        let frames_dir = workspace.frames_dir();

        let total_frames = self.transcoder.extract_frames(stego, frames_dir)?;
        let usable = total_frames.min(max_frames);

        let mut unframer = Unframer::new(self.config.sentinel());
        let mut scanned = 0;
        for index in 1..=usable {
            let path = frame_path(frames_dir, index);
            if !path.exists() {
                break;
            }

            let frame = load_frame(&path)?;
            scanned += 1;
            if extract_rgb(&frame, RGB_STRIDE, &self.config, &mut unframer) {
                break;
            }
        }

        unframer.finish().map(|(payload, _)| payload).ok_or_else(|| {
            StegoError::sentinel_not_found(format!(
                "scanned {} of {} frames; no payload, lossy reassembly, or max_frames lower than at encode time",
                scanned, total_frames
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::cell::RefCell;

    /// Treats a directory of PNG frames as a "video".
    struct DirTranscoder;

    fn copy_frames(from: &Path, to: &Path) -> Result<usize, StegoError> {
        fs::create_dir_all(to)?;
        let count = transcoder::count_frames(from)?;
        for index in 1..=count {
            fs::copy(frame_path(from, index), frame_path(to, index))?;
        }
        Ok(count)
    }

    impl FrameTranscoder for DirTranscoder {
        fn extract_frames(&self, video: &Path, frames_dir: &Path) -> Result<usize, StegoError> {
            copy_frames(video, frames_dir)
        }

        fn reassemble(&self, frames_dir: &Path, output: &Path) -> Result<(), StegoError> {
            copy_frames(frames_dir, output).map(|_| ())
        }

        fn probe(&self, video: &Path) -> Result<VideoInfo, StegoError> {
            let frames = transcoder::count_frames(video)?;
            let (width, height) = image::image_dimensions(frame_path(video, 1))
                .map_err(|e| StegoError::ImageLoadError(e.to_string()))?;
            Ok(VideoInfo {
                width,
                height,
                duration_secs: frames as f64 / DEFAULT_FPS as f64,
                frames,
            })
        }
    }

    /// Extracts like `DirTranscoder` but always fails to reassemble, and
    /// remembers where it was asked to work.
    struct BrokenTranscoder {
        seen_dir: RefCell<Option<PathBuf>>,
    }

    impl FrameTranscoder for BrokenTranscoder {
        fn extract_frames(&self, video: &Path, frames_dir: &Path) -> Result<usize, StegoError> {
            *self.seen_dir.borrow_mut() = Some(frames_dir.to_path_buf());
            copy_frames(video, frames_dir)
        }

        fn reassemble(&self, _frames_dir: &Path, _output: &Path) -> Result<(), StegoError> {
            Err(StegoError::TranscoderUnavailable("broken".to_string()))
        }

        fn probe(&self, _video: &Path) -> Result<VideoInfo, StegoError> {
            Ok(VideoInfo::default())
        }
    }

    /// Writes part of a container to the path it is given, then fails.
    struct TruncatingTranscoder;

    impl FrameTranscoder for TruncatingTranscoder {
        fn extract_frames(&self, video: &Path, frames_dir: &Path) -> Result<usize, StegoError> {
            copy_frames(video, frames_dir)
        }

        fn reassemble(&self, _frames_dir: &Path, output: &Path) -> Result<(), StegoError> {
            fs::write(output, b"half a container")?;
            Err(StegoError::TranscoderUnavailable("killed".to_string()))
        }

        fn probe(&self, _video: &Path) -> Result<VideoInfo, StegoError> {
            Ok(VideoInfo::default())
        }
    }

    fn write_video(dir: &Path, frames: usize, width: u32, height: u32) {
        fs::create_dir_all(dir).unwrap();
        for index in 1..=frames {
            let img = ImageBuffer::from_fn(width, height, |x, y| {
                Rgb([
                    ((x * 7 + index as u32) % 256) as u8,
                    ((y * 11) % 256) as u8,
                    ((x + y) % 256) as u8,
                ])
            });
            img.save(frame_path(dir, index)).unwrap();
        }
    }

    #[test]
    fn test_encode_and_decode_across_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        let output = tmp.path().join("stego");
        // 8x8 frame = 192 bits = 24 bytes per frame
        write_video(&cover, 10, 8, 8);

        let stego = VideoStego::new(DirTranscoder);
        let payload = b"spread over several frames";
        let report = stego.encode(&cover, payload, &output, 10).unwrap();

        // 26 + 20 sentinel bytes = 368 bits -> 2 frames
        assert_eq!(report.frames_used, Some(2));
        assert_eq!(report.total_frames, Some(10));
        assert_eq!(stego.decode(&output, 10).unwrap(), payload);
    }

    #[test]
    fn test_untouched_frames_pass_through() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        let output = tmp.path().join("stego");
        write_video(&cover, 4, 16, 16);

        VideoStego::new(DirTranscoder)
            .encode(&cover, b"hi", &output, 4)
            .unwrap();

        for index in 2..=4 {
            let a = load_frame(&frame_path(&cover, index)).unwrap();
            let b = load_frame(&frame_path(&output, index)).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_capacity_exceeded_within_frame_budget() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        let output = tmp.path().join("stego");
        write_video(&cover, 10, 8, 8);

        let stego = VideoStego::new(DirTranscoder);
        let payload = vec![b'v'; 40];

        // Two frames hold 48 raw bytes, 28 after the sentinel.
        let result = stego.encode(&cover, &payload, &output, 2);
        assert!(matches!(
            result,
            Err(StegoError::CapacityExceeded {
                required: 40,
                available: 28
            })
        ));
        assert!(!output.exists());

        // The same payload fits once more frames are allowed.
        stego.encode(&cover, &payload, &output, 10).unwrap();
        assert_eq!(stego.decode(&output, 10).unwrap(), payload);
    }

    #[test]
    fn test_decode_with_too_few_frames_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        let output = tmp.path().join("stego");
        write_video(&cover, 5, 8, 8);

        let stego = VideoStego::new(DirTranscoder);
        stego.encode(&cover, &[b'z'; 30], &output, 5).unwrap();

        assert!(matches!(
            stego.decode(&output, 1),
            Err(StegoError::SentinelNotFound { .. })
        ));
    }

    #[test]
    fn test_workspace_removed_on_transcoder_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        write_video(&cover, 3, 8, 8);

        let stego = VideoStego::new(BrokenTranscoder {
            seen_dir: RefCell::new(None),
        });
        let result = stego.encode(&cover, b"lost", &tmp.path().join("out"), 3);
        assert!(matches!(result, Err(StegoError::TranscoderUnavailable(_))));

        let seen = stego.transcoder().seen_dir.borrow().clone().unwrap();
        assert!(!seen.exists());
        assert!(!seen.parent().unwrap().exists());
    }

    #[test]
    fn test_failed_reassembly_leaves_no_output() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        let output = tmp.path().join("out.mp4");
        write_video(&cover, 2, 8, 8);

        let result = VideoStego::new(TruncatingTranscoder).encode(&cover, b"x", &output, 2);
        assert!(matches!(result, Err(StegoError::TranscoderUnavailable(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_failed_reassembly_keeps_existing_output() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        let output = tmp.path().join("out.mp4");
        write_video(&cover, 2, 8, 8);
        fs::write(&output, b"previous video").unwrap();

        let result = VideoStego::new(TruncatingTranscoder).encode(&cover, b"x", &output, 2);
        assert!(result.is_err());
        assert_eq!(fs::read(&output).unwrap(), b"previous video");
    }

    #[test]
    fn test_staged_output_keeps_extension() {
        let workspace = FrameWorkspace::create().unwrap();
        let staged = workspace.staged_output(Path::new("/videos/out.mkv"));
        assert_eq!(staged.extension().unwrap(), "mkv");
        assert!(staged.starts_with(workspace.root.path()));
    }

    #[test]
    fn test_workspace_removed_on_capacity_error() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        write_video(&cover, 1, 4, 4);

        let stego = VideoStego::new(BrokenTranscoder {
            seen_dir: RefCell::new(None),
        });
        let result = stego.encode(&cover, &[0u8; 100], &tmp.path().join("out"), 1);
        assert!(matches!(result, Err(StegoError::CapacityExceeded { .. })));

        let seen = stego.transcoder().seen_dir.borrow().clone().unwrap();
        assert!(!seen.exists());
    }

    #[test]
    fn test_capacity_from_probe() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover");
        write_video(&cover, 50, 10, 10);

        let capacity = VideoStego::new(DirTranscoder).capacity(&cover, 30).unwrap();
        assert_eq!(capacity.unit_count, 10 * 10 * 3 * 30);
        assert_eq!(capacity.max_bytes, 10 * 10 * 3 * 30 / 8 - 20);
    }
}
