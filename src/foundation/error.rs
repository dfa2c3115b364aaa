/// Convenience result type used across avmix.
pub type AvmixResult<T> = Result<T, AvmixError>;

/// Top-level error taxonomy used by mixer APIs.
///
/// Configuration and resource errors are always scoped to a single playlist object; callers
/// log them and carry on with the rest of the graph.
#[derive(thiserror::Error, Debug)]
pub enum AvmixError {
    /// Malformed playlist data: bad JSON, unknown root type, unit reference cycles.
    #[error("config error: {0}")]
    Config(String),

    /// A collaborator failed: missing transition module, source that cannot be opened.
    #[error("resource error: {0}")]
    Resource(String),

    /// An expression hook failed to compile or evaluate.
    #[error("hook error: {0}")]
    Hook(String),

    /// An incremental update could not be applied.
    #[error("update error: {0}")]
    Update(String),

    /// Errors while producing a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AvmixError {
    /// Build an [`AvmixError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build an [`AvmixError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build an [`AvmixError::Hook`] value.
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    /// Build an [`AvmixError::Update`] value.
    pub fn update(msg: impl Into<String>) -> Self {
        Self::Update(msg.into())
    }

    /// Build an [`AvmixError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build an [`AvmixError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for AvmixError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
