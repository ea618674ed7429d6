//! tsh: a small interactive shell.
//!
//! Each input line is tokenized (quotes, escapes, operators), expanded
//! (variables, `~`, globs), parsed into a [`parse::Pipeline`] and executed:
//! built-ins in process, everything else as concurrently running child
//! processes connected by pipes. The exit status of the line feeds `$?`
//! on the next one.
//!
//! # Architecture
//!
//! - **[`parse`]**: tokenizer, pipeline parser, token and pipeline types.
//! - **[`expand`]**: variable, tilde and glob expansion.
//! - **[`exec`]**: redirections, pipes, process spawning, exit statuses.
//! - **[`builtins`]**: `cd`, `pwd`, `export`, `unset`, `exit` and friends.
//! - **[`state`]**: working directory, variables, history; [`jobs`]: background and stopped jobs.
//! - **[`signals`]**: process groups, forwarded SIGINT/SIGTSTP, terminal handoff.
//! - **[`shell`]**: the read-evaluate loop.
//! - **[`config`]**: embedded defaults + user overlay merge.
//! - **[`logging`]**: session log at `~/.local/share/tsh/tsh.log`.

/// Built-in commands run inside the shell process.
pub mod builtins;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error type and exit status constants.
pub mod error;
/// Pipeline execution.
pub mod exec;
/// Word expansion: variables, tilde, globs.
pub mod expand;
/// Job table and `waitpid`-based job status.
pub mod jobs;
/// File-based session logging.
pub mod logging;
/// Tokenizer, parser and pipeline types.
pub mod parse;
/// The read-evaluate loop.
pub mod shell;
/// Signal dispositions and terminal ownership.
pub mod signals;
/// Shell-wide mutable state.
pub mod state;

pub use error::ShellError;
pub use shell::Shell;

