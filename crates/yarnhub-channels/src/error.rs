use thiserror::Error;

/// Errors an adapter can see when asking the gateway for a reply.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The webhook could not be reached (connect failure, timeout, ...).
    #[error("webhook unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The webhook answered with a non-success status.
    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A success response that is not the expected JSON.
    #[error("invalid webhook response: {0}")]
    Decode(String),

    /// A success response whose body carried no `reply`.
    #[error("webhook response has no reply")]
    MissingReply,
}
