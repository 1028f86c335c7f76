//! Error types for tickler
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown task, invalid config)
//! - 4: Operation failed (IO, serialization, lock contention)
//!
//! Calendar and recurrence evaluation never produce these errors: malformed
//! dates and rules degrade to "absent" or "no occurrence" instead. Declined
//! pause/resume/stop transitions are not errors either; see [`crate::pause`].

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tickler CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Another process kept the task file lock past the timeout.
    #[error("Task file is locked: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::TaskNotFound(_)
        )
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_user_error() {
            exit_codes::USER_ERROR
        } else {
            exit_codes::OPERATION_FAILED
        }
    }

    /// Machine-readable class used in the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        if self.is_user_error() {
            "user_error"
        } else {
            "operation_failed"
        }
    }

    /// A command the user can run (or an action to take) to recover.
    pub fn hint(&self) -> Option<String> {
        match self {
            Error::TaskNotFound(_) => Some("tickler list --all".to_string()),
            Error::InvalidConfig(_) => Some("fix .tickler.toml then retry".to_string()),
            Error::LockFailed(path) => Some(format!(
                "another tickler process holds {}; retry when it exits",
                path.display()
            )),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_map_to_exit_two() {
        let missing = Error::TaskNotFound("t-1".to_string());
        assert_eq!(missing.exit_code(), exit_codes::USER_ERROR);
        assert_eq!(missing.kind(), "user_error");
        assert_eq!(missing.hint().as_deref(), Some("tickler list --all"));

        let config = Error::InvalidConfig("bad".to_string());
        assert_eq!(config.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn io_errors_map_to_exit_four() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
        assert_eq!(err.kind(), "operation_failed");
        assert!(err.hint().is_none());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn lock_hint_names_the_lock_file() {
        let err = Error::LockFailed(PathBuf::from("/tmp/tasks.json.lock"));
        assert!(err.hint().is_some_and(|hint| hint.contains("tasks.json.lock")));
    }
}
