use thiserror::Error;

/// Errors a job handler can surface to the engine. Both variants are treated
/// as transient: the candidate's dedup key stays unset and the next minute
/// tick retries.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("store error: {0}")]
    Store(#[from] mentor_store::StoreError),

    #[error("sink error: {0}")]
    Sink(#[from] mentor_core::SinkError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
