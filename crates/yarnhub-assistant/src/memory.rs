//! In-process assistant backend.
//!
//! Runs follow a scripted list of statuses: each `get_run` reports the next
//! entry, and the last entry repeats forever. When a run first reports
//! `completed`, the configured reply (if any) is appended to its thread.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::backend::{AssistantBackend, BackendError};
use crate::types::{ContentBlock, Role, Run, RunId, RunStatus, ThreadId, ThreadMessage};

/// Backend operation that an [`InMemoryBackend`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    CreateThread,
    AddMessage,
    CreateRun,
    GetRun,
    ListMessages,
}

pub struct InMemoryBackend {
    statuses: Vec<RunStatus>,
    reply: Option<String>,
    fail_at: Option<FailAt>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    /// Messages per thread, oldest first.
    threads: HashMap<ThreadId, Vec<ThreadMessage>>,
    runs: HashMap<RunId, RunState>,
    status_checks: usize,
}

struct RunState {
    thread_id: ThreadId,
    checks: usize,
    replied: bool,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Runs complete on the first status check and reply with a short greeting.
    pub fn new() -> Self {
        Self {
            statuses: vec![RunStatus::Completed],
            reply: Some("Hello from the assistant.".to_string()),
            fail_at: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Statuses reported by successive status checks of a run.
    pub fn with_statuses(mut self, statuses: Vec<RunStatus>) -> Self {
        if !statuses.is_empty() {
            self.statuses = statuses;
        }
        self
    }

    pub fn with_reply(mut self, reply: String) -> Self {
        self.reply = Some(reply);
        self
    }

    /// Completed runs leave the thread without an assistant message.
    pub fn without_reply(mut self) -> Self {
        self.reply = None;
        self
    }

    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn threads_created(&self) -> usize {
        self.state().threads.len()
    }

    /// Total `get_run` calls across all runs.
    pub fn status_checks(&self) -> usize {
        self.state().status_checks
    }

    /// Text of every user message received, in arrival order per thread.
    pub fn user_messages(&self) -> Vec<String> {
        let state = self.state();
        let mut ids: Vec<&ThreadId> = state.threads.keys().collect();
        ids.sort_by_key(|id| id.0.clone());
        ids.into_iter()
            .flat_map(|id| state.threads[id].iter())
            .filter(|m| m.role == Role::User)
            .filter_map(|m| m.first_text().map(str::to_string))
            .collect()
    }

    /// A panic elsewhere while holding the lock leaves the maps consistent
    /// (every mutation is a single insert or push), so poisoning is ignored.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, step: FailAt) -> Result<(), BackendError> {
        if self.fail_at == Some(step) {
            return Err(BackendError::Unavailable(format!("injected failure at {step:?}")));
        }
        Ok(())
    }
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{:04}", self.next_id)
    }
}

fn not_found(what: &str, id: &str) -> BackendError {
    BackendError::Api {
        status: 404,
        message: format!("no {what} with id {id}"),
    }
}

#[async_trait]
impl AssistantBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn create_thread(&self) -> Result<ThreadId, BackendError> {
        self.check(FailAt::CreateThread)?;
        let mut state = self.state();
        let id = ThreadId(state.next_id("thread"));
        state.threads.insert(id.clone(), Vec::new());
        Ok(id)
    }

    async fn add_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<(), BackendError> {
        self.check(FailAt::AddMessage)?;
        let mut state = self.state();
        let thread = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| not_found("thread", &thread_id.0))?;
        thread.push(ThreadMessage::new(role, vec![ContentBlock::text(content)]));
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        _assistant_id: &str,
    ) -> Result<Run, BackendError> {
        self.check(FailAt::CreateRun)?;
        let mut state = self.state();
        if !state.threads.contains_key(thread_id) {
            return Err(not_found("thread", &thread_id.0));
        }
        let id = RunId(state.next_id("run"));
        state.runs.insert(
            id.clone(),
            RunState {
                thread_id: thread_id.clone(),
                checks: 0,
                replied: false,
            },
        );
        Ok(Run {
            id,
            thread_id: thread_id.clone(),
            status: RunStatus::Queued,
        })
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, BackendError> {
        self.check(FailAt::GetRun)?;
        let mut state = self.state();
        state.status_checks += 1;

        let run = state
            .runs
            .get_mut(run_id)
            .filter(|r| &r.thread_id == thread_id)
            .ok_or_else(|| not_found("run", &run_id.0))?;
        let idx = run.checks.min(self.statuses.len() - 1);
        let status = self.statuses[idx];
        run.checks += 1;

        let post_reply = status == RunStatus::Completed && !run.replied;
        if post_reply {
            run.replied = true;
        }

        if let (true, Some(reply)) = (post_reply, &self.reply) {
            if let Some(thread) = state.threads.get_mut(thread_id) {
                thread.push(ThreadMessage::new(
                    Role::Assistant,
                    vec![ContentBlock::text(reply.clone())],
                ));
            }
        }

        Ok(Run {
            id: run_id.clone(),
            thread_id: thread_id.clone(),
            status,
        })
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, BackendError> {
        self.check(FailAt::ListMessages)?;
        let state = self.state();
        let thread = state
            .threads
            .get(thread_id)
            .ok_or_else(|| not_found("thread", &thread_id.0))?;
        Ok(thread.iter().rev().cloned().collect())
    }
}
