//! narrate - compose synthesized narration lines into one playable,
//! exportable track
//!
//! - [`audio`]: sample buffers, PCM/WAVE codec, timeline merge, output engine
//! - [`playback`]: clock-driven player state machine
//! - [`render`]: waveform overview geometry and the seek bar widget
//! - [`narration`]: concurrent all-or-nothing generation batches
//! - [`export`]: WAVE files on disk

pub mod audio;
pub mod export;
pub mod narration;
pub mod playback;
pub mod render;
