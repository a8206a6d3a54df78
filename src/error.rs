//! Error types for driver operations.

use std::fmt;

use thiserror::Error;

use crate::container::ContainerId;

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failure of a single driver operation, tagged with the step that failed.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `has_image` or `status` failed; the runtime state is unknown.
    #[error("failed to query {what}: {source}")]
    Query {
        what: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("failed to pull image {image}: {source}")]
    Pull {
        image: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to create container {name}: {source}")]
    Provision {
        name: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to {action} container {id}: {source}")]
    Transition {
        action: Transition,
        id: ContainerId,
        #[source]
        source: EngineError,
    },
}

impl RuntimeError {
    pub fn query(what: &'static str, source: EngineError) -> Self {
        Self::Query { what, source }
    }

    pub fn pull(image: impl Into<String>, source: EngineError) -> Self {
        Self::Pull {
            image: image.into(),
            source,
        }
    }

    pub fn provision(name: impl Into<String>, source: EngineError) -> Self {
        Self::Provision {
            name: name.into(),
            source,
        }
    }

    pub fn transition(action: Transition, id: &ContainerId, source: EngineError) -> Self {
        Self::Transition {
            action,
            id: id.clone(),
            source,
        }
    }

    /// The engine-level cause.
    pub fn engine(&self) -> &EngineError {
        match self {
            Self::Query { source, .. }
            | Self::Pull { source, .. }
            | Self::Provision { source, .. }
            | Self::Transition { source, .. } => source,
        }
    }

    /// Returns true if the operation was aborted through a cancel token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.engine(), EngineError::Cancelled)
    }
}

/// Direction of a container state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Stop,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

/// Underlying transport or engine failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to invoke engine: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("engine exited with {}: {stderr}", describe_exit(.code))]
    Exit { code: Option<i32>, stderr: String },

    #[error("cancelled")]
    Cancelled,

    #[error("timed out")]
    TimedOut,

    #[error("malformed engine output: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl EngineError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
