//! Wire-frame decoding for remote status snapshots.
//!
//! The remote source sends one text frame per update: eight
//! comma-separated fields, positional, all numeric. A frame is either
//! decoded in full or rejected; the state machine never sees a
//! partially populated snapshot.

use std::fmt::{Display, Formatter};

/// Number of positional fields in a wire frame.
pub const FIELD_COUNT: usize = 8;

/// Field delimiter used by the remote source.
pub const FIELD_DELIMITER: char = ',';

/// Playback state reported by the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Error,
    Stopped,
    Playing,
    Paused,
    Queued,
    ReloadRequired,
    /// Any state code outside the recognized set.
    Unknown(i64),
}

impl RemoteState {
    /// Map a raw state code onto the recognized set.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Error,
            1 => Self::Stopped,
            2 => Self::Playing,
            3 => Self::Paused,
            4 => Self::Queued,
            255 => Self::ReloadRequired,
            other => Self::Unknown(other),
        }
    }
}

/// One fully decoded remote status update.
///
/// Field order matches the wire frame:
/// `state,cueNumber,currentMS,currentDurationMS,currentOffsetMS,currentFPS,currentVolume,currentFade`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: RemoteState,
    pub cue_number: i64,
    /// Elapsed milliseconds of the active cue as last known remotely.
    pub current_ms: i64,
    /// Total duration of the active cue in milliseconds.
    pub duration_ms: i64,
    /// Fixed offset applied to `current_ms`; may be negative.
    pub offset_ms: i64,
    /// Frame rate governing timecode decomposition; finite and > 0.
    pub fps: f64,
    /// Passthrough field, unused by clock logic.
    pub volume: i64,
    /// Passthrough field, unused by clock logic.
    pub fade: i64,
}

/// Error type for wire-frame decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MalformedFrame(String),
    InvalidState(String),
    InvalidFrameRate(String),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedFrame(err) => write!(f, "malformed frame: {}", err),
            Self::InvalidState(err) => write!(f, "invalid state field: {}", err),
            Self::InvalidFrameRate(err) => write!(f, "invalid frame rate: {}", err),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode one wire frame into a [`Snapshot`].
///
/// # Errors
/// Returns an error when the field count is not exactly eight, when the
/// state field is not an integer, when the frame rate is not a finite
/// positive number, or when any other integer field fails to parse.
/// The offset field is the one permissive exception: absent or
/// unparsable, it defaults to `0`.
pub fn decode(raw: &str) -> Result<Snapshot, DecodeError> {
    let fields: Vec<&str> = raw.trim_end_matches(['\r', '\n']).split(FIELD_DELIMITER).collect();

    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::MalformedFrame(format!(
            "expected {} fields, got {}",
            FIELD_COUNT,
            fields.len()
        )));
    }

    let state_code = fields[0]
        .trim()
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidState(format!("{:?} is not an integer", fields[0])))?;

    let fps = fields[5]
        .trim()
        .parse::<f64>()
        .map_err(|_| DecodeError::InvalidFrameRate(format!("{:?} is not a number", fields[5])))?;
    if !fps.is_finite() || fps <= 0.0 {
        return Err(DecodeError::InvalidFrameRate(format!(
            "{} is not a positive finite rate",
            fps
        )));
    }

    // Unparsable offset is a defined default, not a failure.
    let offset_ms = fields[4].trim().parse::<i64>().unwrap_or(0);

    Ok(Snapshot {
        state: RemoteState::from_code(state_code),
        cue_number: int_field(fields[1], "cueNumber")?,
        current_ms: int_field(fields[2], "currentMS")?,
        duration_ms: int_field(fields[3], "currentDurationMS")?,
        offset_ms,
        fps,
        volume: int_field(fields[6], "currentVolume")?,
        fade: int_field(fields[7], "currentFade")?,
    })
}

fn int_field(raw: &str, name: &str) -> Result<i64, DecodeError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| DecodeError::MalformedFrame(format!("{} field {:?} is not an integer", name, raw)))
}
