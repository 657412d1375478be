//! Transport - start reference plus retained offset
//!
//! Narration and background each get their own transport. The engine starts
//! and stops them together but they never read each other's time.

/// Clock bookkeeping for one independently timed stream
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transport {
    /// `now - offset` at the moment the stream (re)started
    start_reference: Option<f64>,
    /// Position retained while not running
    offset: f64,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.start_reference.is_some()
    }

    pub fn start_reference(&self) -> Option<f64> {
        self.start_reference
    }

    /// The offset playback resumes from
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Start running from the retained offset
    pub fn start(&mut self, now: f64) {
        self.start_reference = Some(now - self.offset);
    }

    /// Stop running and retain `now - start_reference`
    pub fn stop(&mut self, now: f64) -> f64 {
        if let Some(start) = self.start_reference.take() {
            self.offset = (now - start).max(0.0);
        }
        self.offset
    }

    /// Elapsed position: live while running, retained otherwise
    pub fn position(&self, now: f64) -> f64 {
        match self.start_reference {
            Some(start) => (now - start).max(0.0),
            None => self.offset,
        }
    }

    /// Jump to `offset`, keeping the running/stopped state
    pub fn seek(&mut self, now: f64, offset: f64) {
        self.offset = offset.max(0.0);
        if self.start_reference.is_some() {
            self.start_reference = Some(now - self.offset);
        }
    }

    /// Stop and rewind to zero
    pub fn reset(&mut self) {
        self.start_reference = None;
        self.offset = 0.0;
    }
}
