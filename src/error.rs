use thiserror::Error;

/// Errors produced by the indexing engine, the grading layer, and the
/// browser session underneath them.
#[derive(Debug, Error)]
pub enum GraderError {
    /// Failed to launch a browser instance
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Failed to connect to an existing browser instance
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// A tab-level operation failed
    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    /// Navigation failed or timed out
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// In-page script evaluation failed
    #[error("Script evaluation failed: {0}")]
    EvaluateFailed(String),

    /// The DOM snapshot could not be parsed
    #[error("Failed to parse DOM snapshot: {0}")]
    SnapshotParseFailed(String),

    /// A selector, tag, or anchor had no match
    #[error("Not found: {0}")]
    NotFound(String),

    /// A lookup stayed empty even after the one permitted index rebuild
    #[error("Index is stale: {0}")]
    StaleIndex(String),

    /// A requested problem or step ordinal exceeds what the page has
    #[error("Requested ordinal {requested} exceeds available count {available}")]
    RangeExceeded { requested: usize, available: usize },

    /// A step has no grade input control
    #[error("No grade input found for step: {0}")]
    MissingControl(String),

    /// An input held a value that does not parse as a grade
    #[error("Could not parse input value as a grade: {0:?}")]
    ValueParseFailed(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, GraderError>;
