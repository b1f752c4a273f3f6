//! A single unit of work and its completion channel.

use std::fmt;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use strum::Display;

use crate::dispatch::{ActionRequest, JobResponse};

use super::errors::JobError;

/// Monotonic per-pipeline job number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw counter value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Lifecycle of a job.
///
/// `QUEUED -> PROCESSING -> {COMPLETE | ERROR}`; both terminal states wake
/// the waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Waiting for a frame.
    Queued,
    /// Running on the tree-owning thread.
    Processing,
    /// Finished with a result.
    Complete,
    /// Finished with an error payload.
    Error,
}

impl JobState {
    /// True for `COMPLETE` and `ERROR`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// What the waiter receives once the job reaches a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Job that finished.
    pub id: JobId,
    /// Terminal state reached.
    pub state: JobState,
    /// Payload for the client.
    pub response: JobResponse,
}

/// Summary of a finished job for observers.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    /// Job that finished.
    pub id: JobId,
    /// Wire name of the action.
    pub action: &'static str,
    /// Terminal state reached.
    pub state: JobState,
    /// Error kind when the job ended in `ERROR`.
    pub failure: Option<String>,
}

pub(crate) struct Job {
    pub(crate) id: JobId,
    pub(crate) request: ActionRequest,
    pub(crate) state: JobState,
    completion: SyncSender<Completion>,
}

impl Job {
    pub(crate) fn new(id: JobId, request: ActionRequest) -> (Self, JobTicket) {
        // Capacity one: the pump's single send never blocks.
        let (completion, receiver) = sync_channel(1);
        let job = Self {
            id,
            request,
            state: JobState::Queued,
            completion,
        };
        (job, JobTicket { id, receiver })
    }

    /// Consumes the job and wakes its waiter.
    ///
    /// Returns `false` when the waiter has gone away.
    pub(crate) fn complete(self, response: JobResponse) -> bool {
        self.completion
            .send(Completion {
                id: self.id,
                state: self.state,
                response,
            })
            .is_ok()
    }
}

/// Waiter side of a submitted job.
#[derive(Debug)]
pub struct JobTicket {
    id: JobId,
    receiver: Receiver<Completion>,
}

impl JobTicket {
    /// Id of the job this ticket waits on.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Blocks until the job finishes.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Abandoned`] when the pipeline was torn down before
    /// the job ran.
    pub fn wait(self) -> Result<Completion, JobError> {
        self.receiver
            .recv()
            .map_err(|_| JobError::Abandoned { id: self.id })
    }

    /// Returns the completion if it has already arrived.
    pub fn try_completion(&self) -> Option<Completion> {
        self.receiver.try_recv().ok()
    }
}
