use std::path::PathBuf;

use crate::triggers::TriggerId;

/// Startup-fatal problems with the segment list, trigger lines or media files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("No segment durations were supplied")]
    EmptyDurations,

    #[error("Segment {index} has a non-positive duration ({duration})")]
    NonPositiveDuration { index: usize, duration: f64 },

    #[error("Invalid value for {name}: {value}")]
    InvalidConstant { name: &'static str, value: String },

    #[error("{segments} segments need {needed} trigger lines but only {available} are available")]
    TooManySegments {
        segments: usize,
        needed: usize,
        available: usize,
    },

    #[error("Trigger line {0} is configured more than once")]
    DuplicateTrigger(TriggerId),

    #[error("Failed to read durations file at {}: {source}", .path.display())]
    DurationFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed duration on line {line} of {}: {value:?}", .path.display())]
    MalformedDuration {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Media file not found at {}", .0.display())]
    MissingMedia(PathBuf),

    #[error("Invalid hotkey: {0}")]
    InvalidHotkey(String),
}

/// A trigger id that was never bound to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Trigger {0} is not bound to any segment")]
pub struct UnknownTriggerError(pub TriggerId);

/// Failures reported by a [`crate::playback::PlaybackPort`].
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Player is not running")]
    NotRunning,

    #[error("Player IPC failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Player IPC message could not be encoded or decoded: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Player rejected command: {0}")]
    Rejected(String),

    #[error("Player did not answer within {0} ms")]
    Timeout(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    #[error("Segment {index} does not exist ({count} segments configured)")]
    UnknownSegment { index: usize, count: usize },

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
