//! CLI-specific error types and exit code mapping

use shelfguard_core::error::ShelfguardError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Camera / capture session failure.
    #[error("capture error: {0}")]
    Capture(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from shelfguard-core.
    #[error("{0}")]
    Core(#[from] ShelfguardError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                 |
    /// |------|-------------------------|
    /// | 0    | Success                 |
    /// | 1    | General / command error |
    /// | 2    | Configuration error     |
    /// | 3    | Capture failure         |
    /// | 10   | IO error                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Capture(_) => 3,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<shelfguard_session::ScanOrchestratorError> for CliError {
    fn from(e: shelfguard_session::ScanOrchestratorError) -> Self {
        match e {
            shelfguard_session::ScanOrchestratorError::Capture(capture) => {
                // Use the core message, which carries the recovery hint.
                let core: ShelfguardError =
                    shelfguard_session::ScanOrchestratorError::Capture(capture).into();
                Self::Capture(core.to_string())
            }
            other => Self::Core(other.into()),
        }
    }
}

impl From<shelfguard_resolver::DirectoryError> for CliError {
    fn from(e: shelfguard_resolver::DirectoryError) -> Self {
        Self::Command(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_capture_error() {
        let err = CliError::Capture("camera gone".to_owned());
        assert_eq!(
            err.exit_code(),
            3,
            "capture error should return exit code 3"
        );
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(
            err.exit_code(),
            1,
            "command error should return exit code 1"
        );
    }

    #[test]
    fn test_error_display_command() {
        let err = CliError::Command("execution failed".to_owned());
        assert_eq!(format!("{}", err), "execution failed");
    }

    #[test]
    fn test_from_orchestrator_capture_error() {
        use shelfguard_capture::CaptureSessionError;
        let err: CliError =
            shelfguard_session::ScanOrchestratorError::Capture(CaptureSessionError::PermissionDenied)
                .into();
        match err {
            CliError::Capture(msg) => {
                assert!(msg.contains("grant camera access"), "should carry the hint");
            }
            _ => panic!("expected Capture error variant"),
        }
    }

    #[test]
    fn test_from_core_error() {
        use shelfguard_core::error::ConfigError;
        let core_err = ShelfguardError::Config(ConfigError::FileNotFound {
            path: "test.toml".to_owned(),
        });
        let cli_err: CliError = core_err.into();
        match cli_err {
            CliError::Core(_) => {}
            _ => panic!("expected Core error variant"),
        }
    }
}
