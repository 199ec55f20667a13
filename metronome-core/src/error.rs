use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::Range;

/// Configuration rejected before the heartbeat starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid range: min {min} is greater than max {max}")]
    InvertedRange { min: i64, max: i64 },

    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Tagged failure of the remote integer source.
///
/// None of these ever reach the caller of
/// [`FallbackSelector`](crate::selector::FallbackSelector); they are logged
/// and replaced by a local draw.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service responded with status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("service error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("response id {received} does not match request id {expected}")]
    IdMismatch { expected: u64, received: String },

    #[error("response carried no integer")]
    MissingValue,

    #[error("service returned {value}, outside {range}")]
    OutOfRange { value: i64, range: Range },

    #[error("range {0} is not supported by the service")]
    UnsupportedRange(Range),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err)
    }
}

/// The output stream could not be written.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write value to output")]
    Write(#[source] std::io::Error),

    #[error("failed to flush output")]
    Flush(#[source] std::io::Error),
}

/// Abnormal termination of the heartbeat.
#[derive(Debug, Error)]
pub enum HeartbeatError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("heartbeat already stopped after an output failure")]
    Halted,
}
