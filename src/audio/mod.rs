//! Audio module - sample data, compositing and output
//!
//! This module provides:
//! - Immutable mono sample buffers
//! - Raw PCM decoding and WAVE encoding
//! - Timeline compositing of per-line clips
//! - Background ambience loading
//! - The real-time mixer and output engine

mod background;
mod buffer;
mod codec;
mod engine;
mod mixer;
mod timeline;

pub use background::{BackgroundError, BackgroundTrack, BACKGROUND_LEVEL};
pub use buffer::{SampleBuffer, DEFAULT_SAMPLE_RATE};
pub use codec::{decode, encode, quantize, DecodeError, WAV_HEADER_LEN};
pub use engine::{AudioEngine, AudioSink, EngineError};
pub use mixer::{Mixer, MixerCommand};
pub use timeline::{gap_len, merge, merge_segments, Layout, Segment, DEFAULT_GAP_SECONDS};
