//! Error types for the dkr command-line client.

use thiserror::Error;

/// Exit code for input and validation failures.
pub const EXIT_INPUT: i32 = 1;

/// Exit code for failures reported by the container engine.
pub const EXIT_ENGINE: i32 = 2;

/// Failure classification. Ordered so that the worst of several failures is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Input,
    Engine,
}

impl Severity {
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Input => EXIT_INPUT,
            Severity::Engine => EXIT_ENGINE,
        }
    }
}

/// Errors surfaced by an engine client implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Client { status: u16, message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Classify an engine response status. 404 is kept distinct so removals can treat it as done.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into().trim().to_string();
        match status {
            404 => EngineError::NotFound { message },
            s if s < 500 => EngineError::Client { status: s, message },
            s => EngineError::Server { status: s, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }

    pub fn severity(&self) -> Severity {
        match self {
            EngineError::NotFound { .. } | EngineError::Client { .. } => Severity::Input,
            EngineError::Server { .. } | EngineError::Unavailable(_) => Severity::Engine,
        }
    }
}

/// Top-level error for command execution.
#[derive(Debug, Error)]
pub enum DkrError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("State error: {0}")]
    State(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command module error: {0}")]
    Plugin(String),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(String),

    #[error("{failures} of the requested operations failed")]
    Batch { severity: Severity, failures: usize },
}

impl DkrError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        DkrError::InvalidInput(message.into())
    }

    pub fn severity(&self) -> Severity {
        match self {
            DkrError::InvalidInput(_)
            | DkrError::Usage(_)
            | DkrError::State(_)
            | DkrError::Config(_)
            | DkrError::Io(_)
            | DkrError::Output(_) => Severity::Input,
            DkrError::Engine(e) => e.severity(),
            DkrError::Plugin(_) => Severity::Engine,
            DkrError::Batch { severity, .. } => *severity,
        }
    }
}

impl From<config::ConfigError> for DkrError {
    fn from(err: config::ConfigError) -> Self {
        DkrError::Config(err.to_string())
    }
}
