//! Commands that run inside the shell process.
//!
//! These exist because they change shell state (`cd`, `export`, `unset`,
//! `exit`) or read it (`pwd`, `history`, `jobs`, `fg`, `bg`), which a child process
//! could not do. The parser resolves a command name to a [`Builtin`] once;
//! the executor calls [`Builtin::run`] with a [`BuiltinContext`].

/// `cd [dir | -]`: change the working directory.
pub mod cd;
/// `exit [code]`: leave the shell.
pub mod exit;
/// `export [NAME[=VALUE]...]` and `unset NAME...`.
pub mod export;
/// `help` and `history`.
pub mod info;
/// `jobs`, `fg` and `bg`: job control.
pub mod jobs;
/// `pwd`: print the working directory.
pub mod pwd;

use std::io::{self, Write};

use crate::error::{ShellError, warn_on_write};
use crate::state::ShellState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Pwd,
    Export,
    Unset,
    Exit,
    Help,
    History,
    Jobs,
    Fg,
    Bg,
}

/// Every built-in with a one-line summary, in `help` order.
pub const ALL: &[(Builtin, &str)] = &[
    (Builtin::Cd, "cd [dir]      - change directory (HOME if omitted, - for previous)"),
    (Builtin::Pwd, "pwd           - print working directory"),
    (Builtin::Export, "export N=V    - set and export a variable (no args: list)"),
    (Builtin::Unset, "unset N       - remove a variable"),
    (Builtin::Exit, "exit [code]   - exit the shell"),
    (Builtin::Help, "help          - show this help"),
    (Builtin::History, "history       - show command history"),
    (Builtin::Jobs, "jobs          - list background and stopped jobs"),
    (Builtin::Fg, "fg [%jid]     - continue a job in the foreground"),
    (Builtin::Bg, "bg [%jid]     - continue a stopped job in the background"),
];

impl Builtin {
    /// Resolve a command name to a built-in.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "cd" => Builtin::Cd,
            "pwd" => Builtin::Pwd,
            "export" => Builtin::Export,
            "unset" => Builtin::Unset,
            "exit" => Builtin::Exit,
            "help" => Builtin::Help,
            "history" => Builtin::History,
            "jobs" => Builtin::Jobs,
            "fg" => Builtin::Fg,
            "bg" => Builtin::Bg,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Pwd => "pwd",
            Builtin::Export => "export",
            Builtin::Unset => "unset",
            Builtin::Exit => "exit",
            Builtin::Help => "help",
            Builtin::History => "history",
            Builtin::Jobs => "jobs",
            Builtin::Fg => "fg",
            Builtin::Bg => "bg",
        }
    }

    /// Run the built-in against the shell state.
    pub fn run(self, ctx: &mut BuiltinContext) -> Result<Flow, ShellError> {
        match self {
            Builtin::Cd => cd::run(ctx),
            Builtin::Pwd => Ok(pwd::run(ctx)),
            Builtin::Export => Ok(export::export(ctx)),
            Builtin::Unset => Ok(export::unset(ctx)),
            Builtin::Exit => Ok(exit::run(ctx)),
            Builtin::Help => Ok(info::help(ctx)),
            Builtin::History => Ok(info::history(ctx)),
            Builtin::Jobs => Ok(jobs::jobs(ctx)),
            Builtin::Fg => Ok(jobs::fg(ctx)),
            Builtin::Bg => Ok(jobs::bg(ctx)),
        }
    }
}

/// What the shell does after a command finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line; `$?` becomes the status.
    Continue(i32),
    /// Leave the shell with this status.
    Exit(i32),
}

impl Flow {
    pub fn status(self) -> i32 {
        match self {
            Flow::Continue(s) | Flow::Exit(s) => s,
        }
    }
}

/// Everything a built-in may read or change.
pub struct BuiltinContext<'a> {
    pub state: &'a mut ShellState,
    /// Arguments after the command name.
    pub args: &'a [String],
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

impl BuiltinContext<'_> {
    /// Write a diagnostic prefixed with the built-in's name.
    pub fn complain(&mut self, builtin: Builtin, msg: impl std::fmt::Display) {
        warn_on_write(writeln!(self.stderr, "{}: {msg}", builtin.name()));
    }
}

/// Map the result of writing a built-in's output to a status.
pub(crate) fn output_status(result: io::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::warn!("builtin output failed: {e}");
            1
        }
    }
}

/// Whether `name` is a valid variable name.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
