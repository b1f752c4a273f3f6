//! The job pipeline between listener threads and the tree-owning thread.
//!
//! Each request becomes a [`JobTicket`] on the listener side and a queued job
//! on the frame-loop side. The frame loop runs one job per tick through
//! [`JobPump::tick`]; the ticket's one-shot channel carries the result back.

mod errors;
mod job;
mod queue;

pub use errors::JobError;
pub use job::{Completion, JobId, JobReport, JobState, JobTicket};
pub use queue::{JobPump, JobSender, job_queue};

pub(crate) const JOBS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::jobs");
