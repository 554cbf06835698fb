//! LSB steganography for audio files.
//!
//! Hides a framed payload in the least significant bit of each sample.
//! Only uncompressed 16-bit integer PCM WAV is supported; anything else is
//! rejected before any sample is read.
//!
//! Samples are addressed in stored (interleaved) order, one bit per sample
//! across all channels.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

use super::capacity::{audio_capacity, Capacity};
use super::error::StegoError;
use super::framing::{self, Sentinel, Unframer};
use super::{EncodeReport, Medium};

/// Result of validating a candidate cover file.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub frames: u32,
    pub duration_secs: f64,
}

/// Audio steganography handler.
pub struct AudioStego {
    /// Audio specification (sample rate, channels, etc.)
    spec: WavSpec,
    /// Audio samples (16-bit signed integers, interleaved)
    samples: Vec<i16>,
    sentinel: Sentinel,
}

/// Maps a failure to open a WAV stream. Files that are not RIFF/WAVE, or
/// use an encoding hound cannot read, are unsupported covers.
pub(crate) fn open_error(e: hound::Error) -> StegoError {
    match e {
        hound::Error::IoError(io) => StegoError::IoError(io),
        unsupported @ (hound::Error::FormatError(_) | hound::Error::Unsupported) => {
            StegoError::UnsupportedFormat(format!("not a 16-bit PCM WAV file: {}", unsupported))
        }
        other => StegoError::AudioLoadError(other.to_string()),
    }
}

/// Rejects anything but 16-bit integer PCM.
pub(crate) fn check_spec(spec: &WavSpec) -> Result<(), StegoError> {
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(StegoError::UnsupportedFormat(format!(
            "Only 16-bit PCM WAV is supported, got {} bits {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    Ok(())
}

/// Rejects output paths that would not be written as WAV.
fn check_wav_target(path: &Path) -> Result<(), StegoError> {
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);

    if !is_wav {
        return Err(StegoError::UnsupportedFormat(format!(
            "expected a .wav file, got {}",
            path.display()
        )));
    }
    Ok(())
}

impl AudioStego {
    /// Creates a new AudioStego from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StegoError> {
        let reader = WavReader::open(path).map_err(open_error)?;

        Self::from_reader(reader)
    }

    /// Creates a new AudioStego from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StegoError> {
        let cursor = Cursor::new(bytes);
        let reader = WavReader::new(cursor).map_err(open_error)?;

        Self::from_reader(reader)
    }

    /// Creates AudioStego from a WavReader.
    fn from_reader<R: Read + Seek>(reader: WavReader<R>) -> Result<Self, StegoError> {
        let spec = reader.spec();
        check_spec(&spec)?;

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StegoError::AudioLoadError(e.to_string()))?;

        Ok(Self {
            spec,
            samples,
            sentinel: Sentinel::TEXT,
        })
    }

    /// Creates an AudioStego from raw interleaved samples.
    pub fn from_samples(spec: WavSpec, samples: Vec<i16>) -> Result<Self, StegoError> {
        check_spec(&spec)?;
        Ok(Self {
            spec,
            samples,
            sentinel: Sentinel::TEXT,
        })
    }

    /// Replaces the end-of-message sentinel.
    pub fn with_sentinel(mut self, sentinel: Sentinel) -> Self {
        self.sentinel = sentinel;
        self
    }

    /// Checks that a file is a usable cover without loading its samples.
    pub fn validate<P: AsRef<Path>>(path: P) -> Result<AudioInfo, StegoError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StegoError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        check_wav_target(path)?;

        let reader = WavReader::open(path).map_err(open_error)?;
        let spec = reader.spec();
        check_spec(&spec)?;

        let frames = reader.duration();
        Ok(AudioInfo {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            frames,
            duration_secs: frames as f64 / spec.sample_rate as f64,
        })
    }

    /// Returns the capacity of this audio.
    pub fn capacity(&self) -> Capacity {
        let frames = self.samples.len() / self.spec.channels.max(1) as usize;
        audio_capacity(frames as u32, self.spec.channels, self.sentinel.len())
    }

    /// Returns the duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        let total_samples = self.samples.len() / self.spec.channels.max(1) as usize;
        total_samples as f64 / self.spec.sample_rate as f64
    }

    /// Hides data in the audio using LSB steganography.
    ///
    /// Fails with `CapacityExceeded` without modifying anything if the
    /// framed payload needs more bits than there are samples.
    pub fn encode(&self, data: &[u8]) -> Result<Self, StegoError> {
        let stream = framing::frame(data, self.sentinel);
        if stream.len() > self.samples.len() {
            return Err(StegoError::CapacityExceeded {
                required: data.len(),
                available: (self.samples.len() / 8).saturating_sub(self.sentinel.len()),
            });
        }

        debug!(
            payload_bytes = data.len(),
            stream_bits = stream.len(),
            samples = self.samples.len(),
            "embedding payload in audio"
        );

        let mut new_samples = self.samples.clone();
        for (sample, bit) in new_samples.iter_mut().zip(stream.bits()) {
            // Clear LSB and set new bit
            *sample = (*sample & !1) | bit as i16;
        }

        Ok(Self {
            spec: self.spec,
            samples: new_samples,
            sentinel: self.sentinel,
        })
    }

    /// Extracts hidden data from the audio.
    pub fn decode(&self) -> Result<Vec<u8>, StegoError> {
        let mut unframer = Unframer::new(self.sentinel);
        for sample in &self.samples {
            if unframer.push_bit((*sample & 1) as u8) {
                break;
            }
        }

        unframer.finish().map(|(payload, _)| payload).ok_or_else(|| {
            StegoError::sentinel_not_found("no payload, or the audio was re-encoded")
        })
    }

    /// Saves the audio to a WAV file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StegoError> {
        check_wav_target(path.as_ref())?;

        let mut writer = WavWriter::create(path, self.spec)
            .map_err(|e| StegoError::AudioSaveError(e.to_string()))?;

        for sample in &self.samples {
            writer
                .write_sample(*sample)
                .map_err(|e| StegoError::AudioSaveError(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| StegoError::AudioSaveError(e.to_string()))?;

        Ok(())
    }

    /// Returns the audio as WAV bytes.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, StegoError> {
        let mut bytes = Vec::new();
        {
            let cursor = Cursor::new(&mut bytes);
            let mut writer = WavWriter::new(cursor, self.spec)
                .map_err(|e| StegoError::AudioSaveError(e.to_string()))?;

            for sample in &self.samples {
                writer
                    .write_sample(*sample)
                    .map_err(|e| StegoError::AudioSaveError(e.to_string()))?;
            }

            writer
                .finalize()
                .map_err(|e| StegoError::AudioSaveError(e.to_string()))?;
        }
        Ok(bytes)
    }

    /// Returns the audio specification.
    pub fn spec(&self) -> &WavSpec {
        &self.spec
    }

    /// Returns the number of samples (all channels).
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Returns the interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }
}

/// Loads `cover`, hides `payload` and writes the stego WAV to `output`.
pub fn encode_file(cover: &Path, payload: &[u8], output: &Path) -> Result<EncodeReport, StegoError> {
    check_wav_target(output)?;

    let audio = AudioStego::from_file(cover)?;
    let encoded = audio.encode(payload)?;
    encoded.save(output)?;

    Ok(EncodeReport {
        medium: Medium::Audio,
        message_size: payload.len(),
        compressed: false,
        output_path: output.to_path_buf(),
        bits_per_channel: None,
        frames_used: None,
        total_frames: None,
        duration_secs: Some(audio.duration_secs()),
    })
}

/// Loads a stego WAV and extracts its payload.
pub fn decode_file(stego: &Path) -> Result<Vec<u8>, StegoError> {
    AudioStego::from_file(stego)?.decode()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a simple test WAV audio.
    fn create_test_audio(sample_count: usize) -> AudioStego {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        // Generate a simple sine wave
        let samples: Vec<i16> = (0..sample_count)
            .map(|i| {
                let t = i as f64 / 44100.0;
                let freq = 440.0; // A4 note
                (f64::sin(2.0 * std::f64::consts::PI * freq * t) * 16000.0) as i16
            })
            .collect();

        AudioStego::from_samples(spec, samples).unwrap()
    }

    #[test]
    fn test_capacity() {
        let audio = create_test_audio(10000);
        // 10000 samples / 8 bits per byte - 20 bytes sentinel = 1230 bytes
        assert_eq!(audio.capacity().max_bytes, 1230);
    }

    #[test]
    fn test_encode_and_decode_small() {
        let audio = create_test_audio(10000);
        let data = b"Hello, audio steganography!";

        let hidden = audio.encode(data).unwrap();
        let extracted = hidden.decode().unwrap();

        assert_eq!(extracted, data);
    }

    #[test]
    fn test_encode_and_decode_larger() {
        let audio = create_test_audio(100000);
        let data: Vec<u8> = (0..5000).map(|i| (i % 256) as u8).collect();

        let hidden = audio.encode(&data).unwrap();
        let extracted = hidden.decode().unwrap();

        assert_eq!(extracted, data);
    }

    #[test]
    fn test_audio_too_short() {
        let audio = create_test_audio(100);
        let data = vec![0u8; 1000];

        let result = audio.encode(&data);
        assert!(matches!(result, Err(StegoError::CapacityExceeded { .. })));
    }

    #[test]
    fn test_exact_capacity() {
        let audio = create_test_audio(8000);
        let max = audio.capacity().max_bytes;
        assert_eq!(max, 980);

        let data = vec![b'a'; max];
        assert_eq!(audio.encode(&data).unwrap().decode().unwrap(), data);

        let over = vec![b'a'; max + 1];
        assert!(matches!(
            audio.encode(&over),
            Err(StegoError::CapacityExceeded {
                required: 981,
                available: 980
            })
        ));
    }

    #[test]
    fn test_empty_data() {
        let audio = create_test_audio(10000);

        let hidden = audio.encode(&[]).unwrap();
        let extracted = hidden.decode().unwrap();

        assert!(extracted.is_empty());
    }

    #[test]
    fn test_only_lsb_changes() {
        let audio = create_test_audio(4000);
        let hidden = audio.encode(b"lsb").unwrap();

        for (a, b) in audio.samples().iter().zip(hidden.samples()) {
            assert_eq!(a & !1, b & !1);
        }
    }

    #[test]
    fn test_no_payload() {
        let audio = create_test_audio(1000);
        assert!(matches!(
            audio.decode(),
            Err(StegoError::SentinelNotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_8_bit() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        assert!(matches!(
            AudioStego::from_samples(spec, vec![0; 16]),
            Err(StegoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_non_wav_bytes() {
        let mp3ish = b"ID3\x04\x00\x00\x00\x00\x00\x00\xff\xfb\x90\x64 frame data";
        assert!(matches!(
            AudioStego::from_bytes(mp3ish),
            Err(StegoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AudioStego::from_file(dir.path().join("absent.wav")),
            Err(StegoError::IoError(_))
        ));
    }

    #[test]
    fn test_wav_roundtrip() {
        let audio = create_test_audio(10000);
        let data = b"Test WAV roundtrip";

        let hidden = audio.encode(data).unwrap();

        // Convert to WAV bytes and back
        let wav_bytes = hidden.to_wav_bytes().unwrap();
        let loaded = AudioStego::from_bytes(&wav_bytes).unwrap();
        let extracted = loaded.decode().unwrap();

        assert_eq!(extracted, data);
        assert_eq!(loaded.spec(), audio.spec());
    }

    #[test]
    fn test_alternate_sentinel() {
        let audio = create_test_audio(2000).with_sentinel(Sentinel::ONES);
        assert_eq!(audio.capacity().sentinel_len, 2);

        let hidden = audio.encode(b"short marker").unwrap();
        assert_eq!(hidden.decode().unwrap(), b"short marker");
    }
}
