//! Action decoding, routing and execution.
//!
//! The listener decodes an [`ActionEnvelope`] and asks the [`DispatchTable`]
//! for a typed [`ActionRequest`]. The request crosses to the tree-owning
//! thread inside a job and runs there against an [`ExecutionContext`].

mod context;
mod envelope;
mod errors;
mod request;
mod response;
mod table;

pub use context::ExecutionContext;
pub use envelope::{ACTION_COMMAND, ActionEnvelope};
pub use errors::{ActionError, DecodeError};
pub use request::{ActionRequest, FindRequest};
pub use response::{ELEMENT_KEY, JobResponse};
pub use table::{DispatchTable, RequestFactory};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
