use std::path::{Path, PathBuf};

use super::{Builtin, BuiltinContext, Flow};
use crate::error::ShellError;

fn path_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> ShellError {
    ShellError::Path {
        builtin: "cd",
        path: path.into(),
        reason: reason.into(),
    }
}

/// Change directory. On failure the working directory is left unchanged.
pub fn run(ctx: &mut BuiltinContext) -> Result<Flow, ShellError> {
    if ctx.args.len() > 1 {
        ctx.complain(Builtin::Cd, "too many arguments");
        return Ok(Flow::Continue(1));
    }

    let mut announce = false;
    let target = match ctx.args.first().map(String::as_str) {
        None => match ctx.state.var("HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => return Err(path_error("~", "HOME not set")),
        },
        Some("-") => match ctx.state.var("OLDPWD") {
            Some(old) if !old.is_empty() => {
                announce = true;
                PathBuf::from(old)
            }
            _ => return Err(path_error("-", "OLDPWD not set")),
        },
        Some(dir) => ctx.state.resolve(Path::new(dir)),
    };

    let canonical = std::fs::canonicalize(&target).map_err(|e| {
        let reason = match e.kind() {
            std::io::ErrorKind::NotFound => "No such file or directory".to_string(),
            std::io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
            _ => e.to_string(),
        };
        path_error(&target, reason)
    })?;
    if !canonical.is_dir() {
        return Err(path_error(&target, "Not a directory"));
    }

    let old = ctx.state.cwd().to_string_lossy().into_owned();
    log::debug!("cd {old} -> {}", canonical.display());
    ctx.state.export("OLDPWD", old);
    ctx.state.export("PWD", canonical.to_string_lossy().into_owned());
    ctx.state.set_cwd(canonical);

    if announce {
        let written = writeln!(ctx.stdout, "{}", ctx.state.cwd().display());
        return Ok(Flow::Continue(super::output_status(written)));
    }
    Ok(Flow::Continue(0))
}
