/// Result alias that carries the custom [`TimelineError`] type.
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// Free-form failure reported by an external collaborator such as a
    /// scene planner or media generator.
    #[error("{0}")]
    Message(String),
    /// The caller handed in data the engine cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The audio payload could not be decoded. Analysis never produces a
    /// partial result in this case.
    #[error("audio decode failed: {0}")]
    Decode(#[from] hound::Error),
    /// JSON configuration or planner output could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The blocking analysis task panicked or was aborted.
    #[error("analysis task failed: {0}")]
    Task(String),
}

impl TimelineError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<String> for TimelineError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<tokio::task::JoinError> for TimelineError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value.to_string())
    }
}
