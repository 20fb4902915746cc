//! Link error types.

use thiserror::Error;

/// Errors surfaced by the link engines.
///
/// Each of these means "no connection" or "session over" to the caller,
/// which degrades to single-player or returns to the menu. None of them
/// abort; unrecognized lines and receive-buffer overflow are absorbed
/// below this layer and never reach it.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A deadline elapsed while awaiting a response.
    #[error("timed out waiting for {operation}")]
    Timeout {
        /// What was being awaited.
        operation: &'static str,
    },

    /// The module reported carrier loss.
    #[error("carrier lost")]
    CarrierLost,

    /// The serial transport failed.
    #[error("serial port: {0}")]
    Port(#[from] std::io::Error),
}
