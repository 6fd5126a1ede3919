use thiserror::Error;

use crate::schedule::BufferHandle;

/// Failure emitting one clap through a playback sink.
///
/// These never abort a beat: the scheduler logs the failure and moves on to
/// the remaining events, so one bad buffer cannot silence the crowd.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no buffer registered for handle {0:?}")]
    UnknownBuffer(BufferHandle),
    #[error("playback backend unavailable: {0}")]
    Backend(String),
}
