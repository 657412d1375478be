//! Background ambience loading
//!
//! The ambience bed is an arbitrary user-supplied file (WAV, MP3, FLAC, OGG,
//! ...). It is decoded up front with symphonia and mixed down to mono so the
//! mixer can loop it sample-accurately underneath the narration.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use thiserror::Error;

/// Fixed level of the background bed relative to full scale
pub const BACKGROUND_LEVEL: f32 = 0.2;

/// Errors that can occur while loading a background file
#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error("Failed to open file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to probe audio format: {0}")]
    ProbeError(String),

    #[error("No audio tracks found")]
    NoTracks,

    #[error("Decoder error: {0}")]
    DecoderError(String),

    #[error("File contains no audio samples")]
    Empty,
}

/// A fully decoded, mono-downmixed looping background source
#[derive(Clone, Debug)]
pub struct BackgroundTrack {
    pub path: PathBuf,
    pub filename: String,
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl BackgroundTrack {
    /// Build a track from already-decoded mono samples
    pub fn from_samples(
        path: impl Into<PathBuf>,
        samples: impl Into<Arc<[f32]>>,
        sample_rate: u32,
    ) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Unknown")
            .to_string();

        Self {
            path,
            filename,
            samples: samples.into(),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Decode an audio file into a background track
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BackgroundError> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| BackgroundError::ProbeError(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(BackgroundError::NoTracks)?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| BackgroundError::DecoderError(e.to_string()))?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(BackgroundError::DecoderError(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    sample_rate = decoded.spec().rate;
                    push_mono(&decoded, &mut samples);
                }
                // Corrupt packets are skipped, not fatal
                Err(SymphoniaError::DecodeError(e)) => {
                    log::debug!("Skipping undecodable packet: {}", e);
                }
                Err(e) => return Err(BackgroundError::DecoderError(e.to_string())),
            }
        }

        if samples.is_empty() {
            return Err(BackgroundError::Empty);
        }

        let track = Self::from_samples(path, samples, sample_rate);
        log::info!(
            "Loaded background {} ({:.1}s @ {} Hz)",
            track.filename,
            track.duration().as_secs_f64(),
            track.sample_rate
        );
        Ok(track)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn shared_samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Append a decoded packet to `out`, averaging all channels to mono
fn push_mono(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => downmix(&**buf, out),
        AudioBufferRef::U16(buf) => downmix(&**buf, out),
        AudioBufferRef::U24(buf) => downmix(&**buf, out),
        AudioBufferRef::U32(buf) => downmix(&**buf, out),
        AudioBufferRef::S8(buf) => downmix(&**buf, out),
        AudioBufferRef::S16(buf) => downmix(&**buf, out),
        AudioBufferRef::S24(buf) => downmix(&**buf, out),
        AudioBufferRef::S32(buf) => downmix(&**buf, out),
        AudioBufferRef::F32(buf) => downmix(&**buf, out),
        AudioBufferRef::F64(buf) => downmix(&**buf, out),
    }
}

fn downmix<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample + IntoSample<f32>,
{
    let channels = buf.spec().channels.count();
    if channels == 0 {
        return;
    }

    let frames = buf.frames();
    out.reserve(frames);
    for frame in 0..frames {
        let sum: f32 = (0..channels)
            .map(|c| -> f32 { buf.chan(c)[frame].into_sample() })
            .sum();
        out.push(sum / channels as f32);
    }
}
