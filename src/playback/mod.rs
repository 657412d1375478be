//! Playback module - seekable narration playback with a background loop

mod clock;
mod player;
mod transport;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use player::{PlaybackEvent, PlaybackState, PlaybackStatus, Player, TickToken};
pub use transport::Transport;
