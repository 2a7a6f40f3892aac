//! CLI-specific error types and exit code mapping

use stackcheck_core::error::StackcheckError;
use stackcheck_harness::HarnessError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// At least one run of the matrix failed.
    #[error("{failed} of {total} run(s) failed")]
    RunFailed { failed: usize, total: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from stackcheck-core.
    #[error("{0}")]
    Core(#[from] StackcheckError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                 |
    /// |------|-----------------------------------------|
    /// | 0    | Success                                 |
    /// | 1    | A run failed, or a command error        |
    /// | 2    | Configuration or descriptor error       |
    /// | 10   | IO error                                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::Core(StackcheckError::Config(_) | StackcheckError::Descriptor(_)) => 2,
            Self::Core(StackcheckError::Io(_)) => 10,
            Self::Core(StackcheckError::Run(_))
            | Self::RunFailed { .. }
            | Self::JsonSerialize(_)
            | Self::Command(_) => 1,
        }
    }
}

impl From<HarnessError> for CliError {
    fn from(e: HarnessError) -> Self {
        Self::Core(e.into())
    }
}
