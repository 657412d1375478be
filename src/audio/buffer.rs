//! Immutable mono sample buffer
//!
//! Every stage of the pipeline hands audio around as a [`SampleBuffer`]:
//! decode produces one per line, the timeline merges them into the composite
//! track, and playback, waveform rendering and export only ever read it.
//!
//! The samples live behind an `Arc<[f32]>` so the composite can be shared
//! with the audio thread and the renderer without copying. Nothing hands out
//! mutable access; a transform always builds a new buffer.

use std::sync::Arc;
use std::time::Duration;

/// Sample rate of the upstream speech synthesis format (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// A mono buffer of normalized `f32` samples at a fixed sample rate
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap already-normalized samples
    ///
    /// A zero sample rate is bumped to [`DEFAULT_SAMPLE_RATE`] so duration
    /// math never divides by zero.
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Self {
        let sample_rate = if sample_rate == 0 {
            log::warn!("Sample rate of 0 Hz replaced with {}", DEFAULT_SAMPLE_RATE);
            DEFAULT_SAMPLE_RATE
        } else {
            sample_rate
        };

        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    /// Zero-length buffer at `sample_rate`
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle to the sample storage (no copy)
    pub fn shared_samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Always 1: the pipeline is mono end to end
    pub fn channels(&self) -> u16 {
        1
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Nominal duration in seconds (`len / sample_rate`)
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs())
    }

    /// Sample index for a time offset, clamped to the buffer length
    pub fn frame_at(&self, seconds: f64) -> usize {
        if seconds <= 0.0 {
            return 0;
        }
        ((seconds * self.sample_rate as f64).round() as usize).min(self.samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 36_000], DEFAULT_SAMPLE_RATE);
        assert_eq!(buffer.len(), 36_000);
        assert!((buffer.duration_secs() - 1.5).abs() < 1e-9);
        assert_eq!(buffer.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_zero_rate_falls_back() {
        let buffer = SampleBuffer::new(vec![0.5; 10], 0);
        assert_eq!(buffer.sample_rate(), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_clones_share_storage() {
        let buffer = SampleBuffer::new(vec![0.1, 0.2, 0.3], 8_000);
        let copy = buffer.clone();
        assert!(Arc::ptr_eq(&buffer.shared_samples(), &copy.shared_samples()));
        assert_eq!(copy.samples(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_frame_at_clamps() {
        let buffer = SampleBuffer::new(vec![0.0; 100], 100);
        assert_eq!(buffer.frame_at(-1.0), 0);
        assert_eq!(buffer.frame_at(0.5), 50);
        assert_eq!(buffer.frame_at(3.0), 100);
    }
}
