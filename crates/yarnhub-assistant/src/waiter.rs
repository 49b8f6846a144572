use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use yarnhub_core::config::{AssistantConfig, DEFAULT_FALLBACK_REPLY, DEFAULT_POLL_INTERVAL_MS};

use crate::backend::{AssistantBackend, BackendError};
use crate::normalize::normalize;
use crate::types::{first_assistant_text, Role, Run, RunStatus, ThreadId};

/// How the waiter polls an active run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks.
    pub interval: Duration,
    /// Deadline for the whole wait. `None` polls for as long as the
    /// backend reports the run as active.
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_wait: None,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_wait: config.max_wait_secs.map(Duration::from_secs),
        }
    }
}

/// Runs one request/response cycle against an [`AssistantBackend`].
///
/// Every call opens its own thread, so concurrent calls share nothing but
/// the backend client.
pub struct CompletionWaiter {
    backend: Arc<dyn AssistantBackend>,
    assistant_id: String,
    policy: PollPolicy,
    fallback: String,
}

impl CompletionWaiter {
    pub fn new(backend: Arc<dyn AssistantBackend>, assistant_id: impl Into<String>) -> Self {
        Self {
            backend,
            assistant_id: assistant_id.into(),
            policy: PollPolicy::default(),
            fallback: DEFAULT_FALLBACK_REPLY.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Text returned when the finished thread holds no assistant text.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Send `user_message` to the assistant and return its cleaned reply.
    ///
    /// Blocks (asynchronously) until the run leaves `queued`/`in_progress`.
    /// A finished thread without assistant text yields the fallback reply,
    /// not an error.
    pub async fn get_reply(&self, user_message: &str) -> Result<String, BackendError> {
        let thread_id = self.backend.create_thread().await?;
        debug!(backend = self.backend.name(), thread = %thread_id, "thread created");

        self.backend
            .add_message(&thread_id, Role::User, user_message)
            .await?;

        let run = self
            .backend
            .create_run(&thread_id, &self.assistant_id)
            .await?;
        debug!(thread = %thread_id, run = %run.id, status = %run.status, "run started");

        let run = self.wait_for_run(&thread_id, run).await?;
        if run.status != RunStatus::Completed {
            warn!(thread = %thread_id, run = %run.id, status = %run.status, "run did not complete");
            return Err(BackendError::RunFailed {
                run_id: run.id,
                status: run.status,
            });
        }

        let messages = self.backend.list_messages(&thread_id).await?;
        let Some(raw) = first_assistant_text(&messages) else {
            info!(thread = %thread_id, "no assistant text in thread, using fallback reply");
            return Ok(self.fallback.clone());
        };

        let cleaned = normalize(raw);
        debug!(raw = %raw, cleaned = %cleaned, "assistant reply");
        Ok(cleaned)
    }

    async fn wait_for_run(&self, thread_id: &ThreadId, mut run: Run) -> Result<Run, BackendError> {
        let started = Instant::now();

        while run.status.is_active() {
            if let Some(max_wait) = self.policy.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    warn!(thread = %thread_id, run = %run.id, "run still active at deadline");
                    return Err(BackendError::Timeout {
                        run_id: run.id,
                        waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                    });
                }
            }

            tokio::time::sleep(self.policy.interval).await;
            run = self.backend.get_run(thread_id, &run.id).await?;
        }

        Ok(run)
    }
}
