//! Narration batches
//!
//! Turns a list of script lines into one composite track. Every line is
//! synthesized concurrently; the batch is all-or-nothing, so a single failed
//! or undecodable line aborts it and no partial composite is ever produced.
//! [`Studio`] holds the current composite and only replaces it on success.

use async_trait::async_trait;
use futures::future::try_join_all;
use thiserror::Error;

use crate::audio::{
    decode, merge_segments, DecodeError, SampleBuffer, Segment, DEFAULT_SAMPLE_RATE,
};

/// Errors reported by a speech synthesis backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Synthesis request failed: {0}")]
    Transport(String),

    #[error("No audio data received")]
    EmptyAudio,
}

/// Why a batch produced no composite
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrationError {
    #[error("Nothing to narrate")]
    NoLines,

    #[error("Line {line}: {source}")]
    Synthesis {
        line: usize,
        #[source]
        source: SynthesisError,
    },

    #[error("Line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: DecodeError,
    },
}

/// Text-to-speech capability consumed by the pipeline
///
/// Implementations return raw 16-bit little-endian mono PCM at
/// [`DEFAULT_SAMPLE_RATE`].
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// One line of the script, already attributed to a speaker and voice
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptLine {
    pub speaker: String,
    pub voice_id: String,
    pub text: String,
}

impl ScriptLine {
    pub fn new(
        speaker: impl Into<String>,
        voice_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            speaker: speaker.into(),
            voice_id: voice_id.into(),
            text: text.into(),
        }
    }
}

/// Raw synthesized audio for one line, before decoding
#[derive(Clone, Debug)]
pub struct RawClip {
    pub speaker: String,
    pub pcm: Vec<u8>,
}

/// Decode every clip and merge them with `gap_seconds` of silence after each
pub fn compose(clips: &[RawClip], gap_seconds: f64) -> Result<SampleBuffer, NarrationError> {
    if clips.is_empty() {
        return Err(NarrationError::NoLines);
    }

    let segments = clips
        .iter()
        .enumerate()
        .map(|(line, clip)| {
            decode(&clip.pcm, DEFAULT_SAMPLE_RATE)
                .map(|buffer| Segment::new(clip.speaker.clone(), buffer))
                .map_err(|source| NarrationError::Decode { line, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(merge_segments(&segments, gap_seconds))
}

/// Synthesize all lines concurrently, then [`compose`] them
///
/// The first failure cancels the outstanding requests.
pub async fn generate<S>(
    synthesizer: &S,
    lines: &[ScriptLine],
    gap_seconds: f64,
) -> Result<SampleBuffer, NarrationError>
where
    S: Synthesizer + ?Sized,
{
    if lines.is_empty() {
        return Err(NarrationError::NoLines);
    }

    log::info!("Synthesizing {} lines", lines.len());

    let requests = lines.iter().enumerate().map(|(line, script_line)| async move {
        let pcm = synthesizer
            .synthesize(&script_line.text, &script_line.voice_id)
            .await
            .map_err(|source| NarrationError::Synthesis { line, source })?;

        if pcm.is_empty() {
            return Err(NarrationError::Synthesis {
                line,
                source: SynthesisError::EmptyAudio,
            });
        }

        Ok(RawClip {
            speaker: script_line.speaker.clone(),
            pcm,
        })
    });

    let clips = try_join_all(requests).await?;
    compose(&clips, gap_seconds)
}

/// Progress of the latest batch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Completed,
    Failed(String),
}

/// Owner of the current composite track
///
/// A new batch either replaces the track completely or leaves the previous
/// one in place; there is no partial update.
#[derive(Debug, Default)]
pub struct Studio {
    track: Option<SampleBuffer>,
    status: GenerationStatus,
}

impl Studio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self) -> Option<&SampleBuffer> {
        self.track.as_ref()
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn is_generating(&self) -> bool {
        self.status == GenerationStatus::Generating
    }

    /// Mark a batch as in flight
    pub fn begin(&mut self) {
        self.status = GenerationStatus::Generating;
    }

    /// Apply a batch result; returns the new track on success
    pub fn finish(
        &mut self,
        result: Result<SampleBuffer, NarrationError>,
    ) -> Result<&SampleBuffer, NarrationError> {
        match result {
            Ok(track) => {
                log::info!(
                    "Composite ready: {} samples ({:.2}s)",
                    track.len(),
                    track.duration_secs()
                );
                self.status = GenerationStatus::Completed;
                Ok(&*self.track.insert(track))
            }
            Err(e) => {
                log::error!("Generation failed: {}", e);
                self.status = GenerationStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Run a full batch against `synthesizer`
    pub async fn generate<S>(
        &mut self,
        synthesizer: &S,
        lines: &[ScriptLine],
        gap_seconds: f64,
    ) -> Result<&SampleBuffer, NarrationError>
    where
        S: Synthesizer + ?Sized,
    {
        self.begin();
        let result = generate(synthesizer, lines, gap_seconds).await;
        self.finish(result)
    }
}
