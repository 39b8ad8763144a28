use thiserror::Error;

/// Failure kinds of a sync run.
///
/// `Configuration` and `Dataset` are fatal for the run or batch. The remaining
/// kinds are per-row and get folded into a [`RowOutcome`](crate::model::outcome::RowOutcome).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("network error: {0}")]
    Transport(String),

    #[error("rejected with HTTP {status}: {body}")]
    RemoteRejection { status: u16, body: String },

    #[error("row {row}: {reason}")]
    RowValidation { row: usize, reason: String },
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}
