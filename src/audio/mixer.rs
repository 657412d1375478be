//! Output mixer
//!
//! Runs inside the audio callback. The control side never touches the
//! mixer directly; it sends [`MixerCommand`]s over a lock-free queue and the
//! callback applies them between buffers. Rendering never allocates, and
//! sample data of replaced voices is handed back over a retire queue so the
//! last reference is released on the control side, not in the callback.
//!
//! Output = narration × master gain + looping background × [`BACKGROUND_LEVEL`].
//! Both sources are linearly resampled to the device rate.

use std::sync::Arc;

use cpal::{FromSample, SizedSample};
use ringbuf::{traits::Producer, HeapProd};

use super::background::BACKGROUND_LEVEL;

/// Control messages for the mixer
#[derive(Debug)]
pub enum MixerCommand {
    /// Start emitting the narration from `start_frame`, replacing any
    /// emission in progress
    Play {
        samples: Arc<[f32]>,
        sample_rate: u32,
        start_frame: usize,
    },
    /// Halt narration; harmless when it already ran out
    Stop,
    /// Replace (or remove) the background loop
    SetBackground {
        source: Option<(Arc<[f32]>, u32)>,
    },
    ResumeBackground,
    PauseBackground,
}

/// A resampling read head over a shared sample slice
#[derive(Debug)]
struct Voice {
    samples: Arc<[f32]>,
    step: f64,
    cursor: f64,
}

impl Voice {
    fn new(samples: Arc<[f32]>, source_rate: u32, device_rate: u32, start_frame: usize) -> Self {
        Self {
            samples,
            step: source_rate as f64 / device_rate.max(1) as f64,
            cursor: start_frame as f64,
        }
    }

    fn is_finished(&self) -> bool {
        self.cursor >= self.samples.len() as f64
    }

    /// Interpolated sample at the cursor; 0.0 past the end
    fn sample(&self) -> f32 {
        let len = self.samples.len();
        let index = self.cursor as usize;
        if index >= len {
            return 0.0;
        }
        let frac = (self.cursor - index as f64) as f32;
        let current = self.samples[index];
        let next = if index + 1 < len {
            self.samples[index + 1]
        } else {
            current
        };
        current + (next - current) * frac
    }

    fn next_once(&mut self) -> f32 {
        let s = self.sample();
        self.cursor += self.step;
        s
    }

    fn next_looping(&mut self) -> f32 {
        let len = self.samples.len() as f64;
        if len == 0.0 {
            return 0.0;
        }
        let s = self.sample();
        self.cursor += self.step;
        if self.cursor >= len {
            self.cursor %= len;
        }
        s
    }
}

/// Sample generator owned by the audio callback
pub struct Mixer {
    device_rate: u32,
    narration: Option<Voice>,
    background: Option<Voice>,
    background_running: bool,
    retired: Option<HeapProd<Arc<[f32]>>>,
}

impl Mixer {
    pub fn new(device_rate: u32) -> Self {
        Self {
            device_rate: device_rate.max(1),
            narration: None,
            background: None,
            background_running: false,
            retired: None,
        }
    }

    /// Send sample data of replaced or finished voices to `queue`
    pub fn with_retire_queue(mut self, queue: HeapProd<Arc<[f32]>>) -> Self {
        self.retired = Some(queue);
        self
    }

    /// Hand a voice's samples back to the control side.
    /// Dropped here only when the queue is full.
    fn retire(&mut self, voice: Option<Voice>) {
        if let (Some(voice), Some(queue)) = (voice, self.retired.as_mut()) {
            let _ = queue.try_push(voice.samples);
        }
    }

    pub fn device_rate(&self) -> u32 {
        self.device_rate
    }

    pub fn apply(&mut self, command: MixerCommand) {
        match command {
            MixerCommand::Play {
                samples,
                sample_rate,
                start_frame,
            } => {
                let voice = Voice::new(samples, sample_rate, self.device_rate, start_frame);
                let old = self.narration.replace(voice);
                self.retire(old);
            }
            MixerCommand::Stop => {
                let old = self.narration.take();
                self.retire(old);
            }
            MixerCommand::SetBackground { source } => {
                let voice = source.map(|(samples, rate)| {
                    Voice::new(samples, rate, self.device_rate, 0)
                });
                let old = std::mem::replace(&mut self.background, voice);
                self.retire(old);
            }
            MixerCommand::ResumeBackground => self.background_running = true,
            MixerCommand::PauseBackground => self.background_running = false,
        }
    }

    /// Whether narration is still being emitted
    pub fn is_narrating(&self) -> bool {
        self.narration.is_some()
    }

    pub fn is_background_running(&self) -> bool {
        self.background_running && self.background.is_some()
    }

    /// Produce the next mono output sample
    #[inline]
    pub fn next_sample(&mut self, master_gain: f32) -> f32 {
        let mut out = 0.0;

        if let Some(voice) = self.narration.as_mut() {
            out += voice.next_once() * master_gain;
            if voice.is_finished() {
                let old = self.narration.take();
                self.retire(old);
            }
        }

        if self.background_running {
            if let Some(voice) = self.background.as_mut() {
                out += voice.next_looping() * BACKGROUND_LEVEL;
            }
        }

        out.clamp(-1.0, 1.0)
    }

    /// Fill an interleaved buffer, duplicating the mono mix across channels
    pub fn render<T>(&mut self, out: &mut [T], channels: usize, master_gain: f32)
    where
        T: SizedSample + FromSample<f32>,
    {
        for frame in out.chunks_mut(channels.max(1)) {
            let value = T::from_sample(self.next_sample(master_gain));
            frame.fill(value);
        }
    }
}
