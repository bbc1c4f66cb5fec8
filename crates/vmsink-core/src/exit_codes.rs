//! Exit codes for the vmsink CLI.
//!
//! Only fatal errors change the exit code; recoverable failures (a dropped
//! partition, a failed ingestion request) are logged and the run still
//! exits cleanly.

/// Exit codes for vmsink operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed
    Clean = 0,

    /// Configuration error
    ConfigError = 10,

    /// A partition directory path is occupied by a non-directory
    FilesystemConflict = 11,

    /// Tick stream unreadable or malformed
    SourceError = 12,

    /// I/O error
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&vmsink_common::Error> for ExitCode {
    fn from(err: &vmsink_common::Error) -> Self {
        use vmsink_common::Error;
        match err {
            e if e.is_config() => ExitCode::ConfigError,
            Error::NotADirectory { .. } => ExitCode::FilesystemConflict,
            Error::TickSource(_) => ExitCode::SourceError,
            Error::Io(_) => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}
