//! Error taxonomy shared by the tokenizer, expander, parser, executor and built-ins.

use std::io;
use std::path::PathBuf;

/// Status reported for a program that could not be found.
pub const STATUS_NOT_FOUND: i32 = 127;
/// Status reported for a program that was found but could not be executed.
pub const STATUS_NOT_EXECUTABLE: i32 = 126;
/// Status reported for malformed input.
pub const STATUS_SYNTAX: i32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Malformed line: bad quoting, misplaced operator, missing redirection target.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A directory change target that does not exist or is not a directory.
    #[error("{builtin}: {}: {reason}", path.display())]
    Path {
        builtin: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// A redirection target that could not be opened.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The kernel refused to create a pipe.
    #[error("pipe: {0}")]
    Pipe(#[source] io::Error),

    /// A program that could not be started.
    #[error("{name}: {reason}")]
    Spawn { name: String, reason: String, status: i32 },
}

impl ShellError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        ShellError::Syntax(msg.into())
    }

    /// The `$?` value a line failing with this error leaves behind.
    pub fn status(&self) -> i32 {
        match self {
            ShellError::Syntax(_) => STATUS_SYNTAX,
            ShellError::Path { .. } | ShellError::Io { .. } | ShellError::Pipe(_) => 1,
            ShellError::Spawn { status, .. } => *status,
        }
    }
}

/// Log a failed write or flush on one of the shell's own streams. The line
/// being run is not failed for it.
pub(crate) fn warn_on_write(result: io::Result<()>) {
    if let Err(e) = result {
        log::warn!("shell output failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ShellError::syntax("x").status(), 2);
        let io = ShellError::Io {
            path: "f".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(io.status(), 1);
        let spawn = ShellError::Spawn {
            name: "nope".into(),
            reason: "command not found".into(),
            status: STATUS_NOT_FOUND,
        };
        assert_eq!(spawn.status(), 127);
        assert_eq!(spawn.to_string(), "nope: command not found");
    }
}
