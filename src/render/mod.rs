//! Render module - waveform overview geometry and its UI widget

mod seek_bar;
mod waveform;

pub use seek_bar::{SeekBar, SeekBarStyle};
pub use waveform::{
    peaks, render, DrawCommand, Fill, Peak, WaveformFrame, WaveformRenderer, CURSOR_WIDTH,
    DEFAULT_COLUMNS, DEFAULT_HEIGHT, PLACEHOLDER_TEXT,
};
