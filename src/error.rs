//! Errors produced by the bridge.
//!
//! Only device-level failures are meant to end the process. Remote failures are returned to the
//! poll tasks and the command relay, which log and drop them.

use thiserror::Error;

/// The error type used throughout the bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// No serial device matched, or the device could not be opened.
    #[error("Serial device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The serial device failed while the bridge was running.
    #[error("Serial device failed: {0}")]
    SerialReadFatal(String),

    /// The serial I/O server is no longer accepting data to write.
    #[error("Serial I/O server is closed")]
    SerialClosed,

    /// The HTTP request could not be completed (connection refused, DNS, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service answered with a non-success status.
    #[error("Remote service returned status {status}")]
    Remote {
        status: u16,
    },

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The configuration cannot be used.
    #[error("Configuration error: {0}")]
    Config(String),
}
