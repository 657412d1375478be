//! Composite track player
//!
//! A small state machine over Stopped / Playing / Paused. Every control call
//! returns the resulting [`PlaybackState`]; nothing reacts to ambient state.
//!
//! While playing, the position is `now - start_reference` on a monotonic
//! clock. The host drives a periodic tick with the [`TickToken`] handed out
//! by `play`; leaving the Playing state cancels that token, so a tick from an
//! earlier session can never write state into a newer one.

use crate::audio::{AudioSink, BackgroundTrack, SampleBuffer};

use super::clock::Clock;
use super::transport::Transport;

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Snapshot of the player after a control call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub master_gain: f32,
}

/// Identifies one Playing session's position-update tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

/// What a tick observed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Position(f64),
    /// The end of the track was reached and playback stopped itself
    Finished,
}

pub struct Player<C: Clock, S: AudioSink> {
    clock: C,
    sink: S,
    track: Option<SampleBuffer>,
    has_background: bool,
    status: PlaybackStatus,
    narration: Transport,
    background: Transport,
    /// Position shown while not playing
    displayed: f64,
    master_gain: f32,
    tick: Option<TickToken>,
    next_tick_id: u64,
}

impl<C: Clock, S: AudioSink> Player<C, S> {
    pub fn new(clock: C, sink: S) -> Self {
        Self {
            clock,
            sink,
            track: None,
            has_background: false,
            status: PlaybackStatus::Stopped,
            narration: Transport::new(),
            background: Transport::new(),
            displayed: 0.0,
            master_gain: 1.0,
            tick: None,
            next_tick_id: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn track(&self) -> Option<&SampleBuffer> {
        self.track.as_ref()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn duration(&self) -> f64 {
        self.track.as_ref().map_or(0.0, SampleBuffer::duration_secs)
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Current position in seconds, within `[0, duration]`
    pub fn position(&self) -> f64 {
        match self.status {
            PlaybackStatus::Playing => self
                .narration
                .position(self.clock.now())
                .min(self.duration()),
            _ => self.displayed,
        }
    }

    /// Position as a fraction of the duration (0.0 - 1.0)
    pub fn position_fraction(&self) -> f32 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        (self.position() / duration) as f32
    }

    /// Elapsed time on the background's own clock, if one is loaded
    pub fn background_elapsed(&self) -> Option<f64> {
        self.has_background
            .then(|| self.background.position(self.clock.now()))
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            status: self.status,
            position_secs: self.position(),
            duration_secs: self.duration(),
            master_gain: self.master_gain,
        }
    }

    /// Token of the live tick, if playing
    pub fn tick_token(&self) -> Option<TickToken> {
        self.tick
    }

    /// Replace the composite track, rewinding to a stopped state
    pub fn load(&mut self, track: Option<SampleBuffer>) -> PlaybackState {
        if self.status == PlaybackStatus::Playing {
            self.halt_outputs();
        }
        self.tick = None;
        self.narration.reset();
        self.displayed = 0.0;
        self.status = PlaybackStatus::Stopped;

        match &track {
            Some(t) => log::info!("Loaded composite track ({:.2}s)", t.duration_secs()),
            None => log::info!("Composite track cleared"),
        }
        self.track = track;
        self.state()
    }

    /// Swap the background loop; it joins in immediately if playing
    pub fn set_background(&mut self, track: Option<BackgroundTrack>) {
        let now = self.clock.now();
        if self.status == PlaybackStatus::Playing && self.has_background {
            self.sink.pause_background();
        }

        self.sink.set_background(track.as_ref());
        self.has_background = track.is_some();
        self.background.reset();

        if self.status == PlaybackStatus::Playing && self.has_background {
            self.background.start(now);
            self.sink.resume_background();
        }
    }

    /// Start or resume; a no-op without a track or when already playing
    pub fn play(&mut self) -> PlaybackState {
        let Some(track) = self.track.as_ref() else {
            log::debug!("play() ignored: no composite track");
            return self.state();
        };
        if self.status == PlaybackStatus::Playing {
            return self.state();
        }

        let offset = self.narration.offset();
        self.sink.start_narration(track, offset);

        // The sink may have just opened the device; start counting from here
        let now = self.clock.now();
        self.narration.start(now);

        if self.has_background {
            self.background.start(now);
            self.sink.resume_background();
        }

        self.status = PlaybackStatus::Playing;
        self.displayed = offset;

        let token = TickToken(self.next_tick_id);
        self.next_tick_id += 1;
        self.tick = Some(token);

        log::debug!("Playing from {:.3}s", offset);
        self.state()
    }

    /// Pause, retaining the position; a no-op unless playing
    pub fn pause(&mut self) -> PlaybackState {
        if self.status != PlaybackStatus::Playing {
            return self.state();
        }

        let now = self.clock.now();
        let offset = self.narration.stop(now).min(self.duration());
        self.narration.seek(now, offset);
        self.halt_outputs();

        self.tick = None;
        self.status = PlaybackStatus::Paused;
        self.displayed = offset;

        log::debug!("Paused at {:.3}s", offset);
        self.state()
    }

    /// Stop and rewind to the start
    pub fn stop(&mut self) -> PlaybackState {
        if self.status == PlaybackStatus::Playing {
            self.halt_outputs();
        }
        self.tick = None;
        self.narration.reset();
        self.displayed = 0.0;
        self.status = PlaybackStatus::Stopped;
        self.state()
    }

    pub fn toggle(&mut self) -> PlaybackState {
        match self.status {
            PlaybackStatus::Playing => self.pause(),
            PlaybackStatus::Stopped | PlaybackStatus::Paused => self.play(),
        }
    }

    /// Move to `seconds`, clamped to `[0, duration]`
    ///
    /// While playing, the running emission is stopped and a new one started
    /// at the target; otherwise only the retained position changes.
    pub fn seek(&mut self, seconds: f64) -> PlaybackState {
        let Some(track) = self.track.as_ref() else {
            return self.state();
        };

        let target = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, track.duration_secs())
        };
        if self.status == PlaybackStatus::Playing {
            self.sink.stop_narration();
            self.sink.start_narration(track, target);
        }
        self.narration.seek(self.clock.now(), target);
        self.displayed = target;

        self.state()
    }

    /// Seek to a fraction (0.0 - 1.0) of the duration
    pub fn seek_fraction(&mut self, fraction: f32) -> PlaybackState {
        let fraction = fraction.clamp(0.0, 1.0) as f64;
        self.seek(fraction * self.duration())
    }

    /// Set the narration gain, clamped to [0, 1]; background level is fixed
    pub fn set_master_gain(&mut self, gain: f32) -> PlaybackState {
        if gain.is_finite() {
            self.master_gain = gain.clamp(0.0, 1.0);
            self.sink.set_master_gain(self.master_gain);
        }
        self.state()
    }

    /// Periodic position update for the session identified by `token`
    ///
    /// Returns `None` for a stale or cancelled token. Reaching the end stops
    /// playback and reports [`PlaybackEvent::Finished`] once.
    pub fn tick(&mut self, token: TickToken) -> Option<PlaybackEvent> {
        if self.tick != Some(token) {
            return None;
        }

        let duration = self.duration();
        let elapsed = self.narration.position(self.clock.now());

        if elapsed >= duration {
            self.halt_outputs();
            self.tick = None;
            self.narration.reset();
            self.displayed = duration;
            self.status = PlaybackStatus::Stopped;
            log::debug!("Reached end of track ({:.3}s)", duration);
            return Some(PlaybackEvent::Finished);
        }

        self.displayed = elapsed;
        Some(PlaybackEvent::Position(elapsed))
    }

    /// [`Player::tick`] with the live token, if any
    pub fn poll(&mut self) -> Option<PlaybackEvent> {
        let token = self.tick?;
        self.tick(token)
    }

    fn halt_outputs(&mut self) {
        let now = self.clock.now();
        self.sink.stop_narration();
        if self.has_background {
            self.background.stop(now);
            self.sink.pause_background();
        }
    }
}
