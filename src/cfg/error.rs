//! Compilation-time errors from the CFG builder, induction engine, top-down
//! checker builder, and optimizer (SPEC_FULL §7, §10).
//!
//! Per the error-handling design, these are the only conditions this layer
//! reports as `Result::Err`; everything else (tuple-state branches, checker
//! booleans, safe-reader bounds flags) is an ordinary three-way/boolean
//! value inspected by the generated control flow, not a `Result`.

use datalog_ir::ViewId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("view {view} has no resolvable binding for column {column}")]
    UnresolvedColumn { view: ViewId, column: u32 },

    #[error("view {view} has no data model but one is required to materialize its table")]
    MissingDataModel { view: ViewId },

    #[error("view {view} requires a backing table that was never created")]
    MissingTable { view: ViewId },

    #[error("functor signature mismatch on view {view}: expected {expected} outputs, found {found}")]
    FunctorSignatureMismatch { view: ViewId, expected: usize, found: usize },

    #[error("link invariant violated at view {view}: {detail}")]
    LinkInvariantViolated { view: ViewId, detail: String },

    #[error("{0}")]
    Other(String),
}

pub type BuildResult<T> = Result<T, BuildError>;
