//! `yarnhub-assistant` — drives a hosted assistant to a finished reply.
//!
//! A request opens a fresh conversation thread, appends the user's text,
//! starts a run and polls it until the backend reports a terminal status.
//! The newest assistant text block is then passed through [`normalize`]
//! before it is handed back to the caller.

pub mod backend;
pub mod memory;
pub mod normalize;
pub mod openai;
pub mod types;
pub mod waiter;

pub use backend::{AssistantBackend, BackendError};
pub use memory::{FailAt, InMemoryBackend};
pub use normalize::normalize;
pub use openai::OpenAiAssistants;
pub use types::{ContentBlock, Role, Run, RunId, RunStatus, ThreadId, ThreadMessage};
pub use waiter::{CompletionWaiter, PollPolicy};
