//! Audio output engine
//!
//! The single output stage of the application: one cpal stream whose
//! callback owns a [`Mixer`], fed by a lock-free command queue, with the
//! master gain shared through an atomic.
//!
//! The engine is an ordinary owned value. The device is opened lazily on the
//! first call that needs sound, and released by [`AudioEngine::shutdown`] or
//! when the engine is dropped. Without an output device every call degrades
//! to a logged no-op so the rest of the pipeline keeps working.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use thiserror::Error;

use super::background::BackgroundTrack;
use super::buffer::SampleBuffer;
use super::mixer::{Mixer, MixerCommand};

const COMMAND_QUEUE_LEN: usize = 64;

/// Errors that can occur while opening the output device
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("No output device available")]
    NoDevice,

    #[error("Failed to get output config: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build output stream: {0}")]
    StreamBuild(String),

    #[error("Failed to start output stream: {0}")]
    StreamPlay(String),
}

/// Where the player sends sound
///
/// Implemented by [`AudioEngine`] for real output; tests substitute a
/// recording sink.
pub trait AudioSink {
    /// Begin emitting `track` from `offset_secs`, replacing any current emission
    fn start_narration(&mut self, track: &SampleBuffer, offset_secs: f64);

    /// Halt narration. Must tolerate emission that already ended on its own.
    fn stop_narration(&mut self);

    fn set_background(&mut self, track: Option<&BackgroundTrack>);

    fn resume_background(&mut self);

    fn pause_background(&mut self);

    /// Master gain for the narration only, already clamped to [0, 1]
    fn set_master_gain(&mut self, gain: f32);
}

/// Live output stream plus the producer side of its command queue
struct Output {
    _stream: cpal::Stream,
    commands: HeapProd<MixerCommand>,
    /// Sample data the callback no longer needs, released here
    retired: HeapCons<Arc<[f32]>>,
    device_name: String,
    sample_rate: u32,
}

/// cpal-backed output stage
pub struct AudioEngine {
    output: Option<Output>,
    /// Shared master gain for the audio thread (f32 bits)
    master_gain: Arc<AtomicU32>,
    /// Current background, replayed into a freshly opened stream
    background: Option<(Arc<[f32]>, u32)>,
    last_error: Option<EngineError>,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    /// Create an engine without touching the audio device
    pub fn new() -> Self {
        Self {
            output: None,
            master_gain: Arc::new(AtomicU32::new(1.0_f32.to_bits())),
            background: None,
            last_error: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.output.is_some()
    }

    /// Name and sample rate of the open device
    pub fn device(&self) -> Option<(&str, u32)> {
        self.output
            .as_ref()
            .map(|o| (o.device_name.as_str(), o.sample_rate))
    }

    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    pub fn master_gain(&self) -> f32 {
        f32::from_bits(self.master_gain.load(Ordering::Relaxed))
    }

    /// Open the default output device if it isn't open yet
    pub fn open(&mut self) -> Result<(), EngineError> {
        if self.output.is_some() {
            return Ok(());
        }

        match self.open_output() {
            Ok(output) => {
                log::info!(
                    "Audio output opened: {} @ {} Hz",
                    output.device_name,
                    output.sample_rate
                );
                self.output = Some(output);
                self.last_error = None;

                if let Some(source) = self.background.clone() {
                    self.send(MixerCommand::SetBackground {
                        source: Some(source),
                    });
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("Audio output unavailable: {}", e);
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Close the output stream; the next sound request reopens it
    pub fn shutdown(&mut self) {
        if self.output.take().is_some() {
            log::info!("Audio output closed");
        }
    }

    fn open_output(&self) -> Result<Output, EngineError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(EngineError::NoDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_output_config()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;

        let rb = HeapRb::<MixerCommand>::new(COMMAND_QUEUE_LEN);
        let (commands, consumer) = rb.split();
        let (retire_tx, retired) = HeapRb::<Arc<[f32]>>::new(COMMAND_QUEUE_LEN).split();
        let mixer = Mixer::new(sample_rate).with_retire_queue(retire_tx);
        let gain = Arc::clone(&self.master_gain);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer, mixer, gain),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer, mixer, gain),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer, mixer, gain),
            format => Err(EngineError::UnsupportedFormat(format!("{:?}", format))),
        }?;

        stream
            .play()
            .map_err(|e| EngineError::StreamPlay(e.to_string()))?;

        Ok(Output {
            _stream: stream,
            commands,
            retired,
            device_name,
            sample_rate,
        })
    }

    /// Queue a command, opening the device on first use
    fn send(&mut self, command: MixerCommand) {
        if self.output.is_none() && self.open().is_err() {
            return;
        }
        if let Some(output) = self.output.as_mut() {
            while output.retired.try_pop().is_some() {}
            if output.commands.try_push(command).is_err() {
                log::warn!("Mixer command queue full, command dropped");
            }
        }
    }
}

impl AudioSink for AudioEngine {
    fn start_narration(&mut self, track: &SampleBuffer, offset_secs: f64) {
        self.send(MixerCommand::Play {
            samples: track.shared_samples(),
            sample_rate: track.sample_rate(),
            start_frame: track.frame_at(offset_secs),
        });
    }

    fn stop_narration(&mut self) {
        // Nothing can be sounding on a closed stream.
        if self.output.is_some() {
            self.send(MixerCommand::Stop);
        }
    }

    fn set_background(&mut self, track: Option<&BackgroundTrack>) {
        self.background = track.map(|t| (t.shared_samples(), t.sample_rate()));
        if self.output.is_some() {
            let source = self.background.clone();
            self.send(MixerCommand::SetBackground { source });
        }
    }

    fn resume_background(&mut self) {
        if self.background.is_some() {
            self.send(MixerCommand::ResumeBackground);
        }
    }

    fn pause_background(&mut self) {
        if self.output.is_some() {
            self.send(MixerCommand::PauseBackground);
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain
            .store(gain.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut commands: HeapCons<MixerCommand>,
    mut mixer: Mixer,
    gain: Arc<AtomicU32>,
) -> Result<cpal::Stream, EngineError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                while let Some(command) = commands.try_pop() {
                    mixer.apply(command);
                }

                let gain = f32::from_bits(gain.load(Ordering::Relaxed));
                mixer.render(data, channels, gain);
            },
            |err| log::error!("Audio output error: {}", err),
            None,
        )
        .map_err(|e| EngineError::StreamBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_engine_is_closed() {
        let engine = AudioEngine::new();
        assert!(!engine.is_open());
        assert!(engine.device().is_none());
        assert_eq!(engine.master_gain(), 1.0);
    }

    #[test]
    fn test_master_gain_is_clamped() {
        let mut engine = AudioEngine::new();
        engine.set_master_gain(0.4);
        assert_eq!(engine.master_gain(), 0.4);
        engine.set_master_gain(3.0);
        assert_eq!(engine.master_gain(), 1.0);
        engine.set_master_gain(-1.0);
        assert_eq!(engine.master_gain(), 0.0);
    }

    #[test]
    fn test_stop_and_pause_do_not_open_device() {
        let mut engine = AudioEngine::new();
        engine.stop_narration();
        engine.pause_background();
        engine.resume_background(); // no background set
        engine.set_background(None);
        assert!(!engine.is_open());
    }
}
