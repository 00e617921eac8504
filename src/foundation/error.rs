/// Convenience result type used across the crate.
pub type SubstrateResult<T> = Result<T, SubstrateError>;

/// Top-level error taxonomy used by engine, replica and orchestration APIs.
#[derive(thiserror::Error, Debug)]
pub enum SubstrateError {
    /// Invalid user-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal simulation invariant violated.
    #[error("simulation error: {0}")]
    Simulation(String),

    /// A replica failed to start, crashed, or stopped answering.
    #[error("replica error: {0}")]
    Replica(String),

    /// Errors while reading or writing stored preferences.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SubstrateError {
    /// Build a [`SubstrateError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SubstrateError::Simulation`] value.
    pub fn simulation(msg: impl Into<String>) -> Self {
        Self::Simulation(msg.into())
    }

    /// Build a [`SubstrateError::Replica`] value.
    pub fn replica(msg: impl Into<String>) -> Self {
        Self::Replica(msg.into())
    }

    /// Build a [`SubstrateError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`SubstrateError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
