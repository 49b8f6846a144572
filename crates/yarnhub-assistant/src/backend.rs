use async_trait::async_trait;

use crate::types::{Role, Run, RunId, RunStatus, ThreadId, ThreadMessage};

/// The operations the completion waiter needs from a hosted assistant.
///
/// Implemented over HTTP by [`OpenAiAssistants`](crate::openai::OpenAiAssistants)
/// and in process by [`InMemoryBackend`](crate::memory::InMemoryBackend).
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    async fn create_thread(&self) -> Result<ThreadId, BackendError>;

    async fn add_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<(), BackendError>;

    async fn create_run(&self, thread_id: &ThreadId, assistant_id: &str)
        -> Result<Run, BackendError>;

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, BackendError>;

    /// Messages in the thread, most recent first.
    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("run {run_id} ended with status {status}")]
    RunFailed { run_id: RunId, status: RunStatus },

    #[error("run {run_id} still active after {waited_ms}ms")]
    Timeout { run_id: RunId, waited_ms: u64 },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}
