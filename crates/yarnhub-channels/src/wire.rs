use serde::{Deserialize, Serialize};

/// Error text for a request without a usable `message`.
pub const NO_MESSAGE_PROVIDED: &str = "No message provided";
/// Error text for every backend failure; details stay in the server log.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookReply {
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookError {
    pub error: String,
}

impl WebhookError {
    pub fn no_message() -> Self {
        Self {
            error: NO_MESSAGE_PROVIDED.to_string(),
        }
    }

    pub fn internal() -> Self {
        Self {
            error: INTERNAL_SERVER_ERROR.to_string(),
        }
    }
}
