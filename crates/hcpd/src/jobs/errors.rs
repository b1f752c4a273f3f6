use thiserror::Error;

use super::job::JobId;

/// Errors seen by a job's submitter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The pump was dropped before the job completed.
    #[error("{id} was abandoned before it completed")]
    Abandoned { id: JobId },
}
