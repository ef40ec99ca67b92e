use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("no trace is open")]
    NoTraceOpen,

    #[error("no node is selected")]
    NoSelection,

    #[error("invalid configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace error: {0}")]
    Trace(#[from] tracedit_trace::TraceError),

    #[error("cannot index trace: {0}")]
    Parse(#[from] tracedit_tree::ParseError),

    #[error(transparent)]
    Tree(#[from] tracedit_tree::TreeError),

    #[error("store error: {0}")]
    Store(#[from] tracedit_store::StoreError),

    #[error(transparent)]
    Resolution(#[from] tracedit_engine::ResolutionError),

    #[error(transparent)]
    Edit(#[from] tracedit_engine::EditError),

    #[error("session error: {0}")]
    Session(#[from] tracedit_session::SessionError),
}

pub type SdkResult<T> = Result<T, SdkError>;
