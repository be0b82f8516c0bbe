pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("edge references unknown node `{id}`")]
    UnknownNode { id: String },

    #[error("node id `{id}` appears more than once")]
    DuplicateNode { id: String },

    #[error("invalid layout description (line {line}): {message}")]
    Description { line: usize, message: String },

    #[error("layout engine failed: {message}")]
    Engine { message: String },

    #[error("layout engine returned no position for token `{token}`")]
    MissingPosition { token: String },

    #[error("layout worker is no longer running")]
    WorkerClosed,
}
