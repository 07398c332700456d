//! Error type shared by the calibration, dispatch and persistence modules.
//! Every variant is recoverable: the HTTP gateway and the local UI turn it into
//! a user-visible message and the process keeps running.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClickerError {
    #[error("Board is not calibrated. Run calibration first")]
    NotCalibrated,

    #[error("Invalid column {0}. Must be an integer between 0 and 6")]
    InvalidColumn(String),

    #[error("Invalid board geometry: {0}")]
    InvalidGeometry(String),

    #[error("Failed to inject click: {0}")]
    InjectionFailed(String),

    #[error("Pointer listener unavailable: {0}")]
    ListenerUnavailable(String),

    // ---------------------------
    // Calibration file
    // ---------------------------
    #[error("Calibration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse calibration file {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type ClickerResult<T> = Result<T, ClickerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(
            ClickerError::InvalidColumn("7".into()).to_string(),
            "Invalid column 7. Must be an integer between 0 and 6"
        );
        assert_eq!(
            ClickerError::InvalidGeometry("3 columns (expected 7)".into()).to_string(),
            "Invalid board geometry: 3 columns (expected 7)"
        );
        let err = ClickerError::NotFound(PathBuf::from("board.json"));
        assert_eq!(err.to_string(), "Calibration file not found: board.json");
    }
}
