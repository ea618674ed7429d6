
use super::{Builtin, BuiltinContext, Flow, is_valid_name, output_status};

/// `export NAME=VALUE...` sets and exports; `export NAME` exports the current
/// value; no arguments lists the exported table.
pub fn export(ctx: &mut BuiltinContext) -> Flow {
    let args = ctx.args;
    if args.is_empty() {
        return list(ctx);
    }

    let mut status = 0;
    for arg in args {
        let (name, value) = match arg.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (arg.as_str(), None),
        };
        if !is_valid_name(name) {
            ctx.complain(Builtin::Export, format!("`{arg}': not a valid identifier"));
            status = 1;
            continue;
        }
        let value = match value {
            Some(v) => v.to_string(),
            None => ctx.state.var(name).unwrap_or_default(),
        };
        log::debug!("export {name}");
        ctx.state.export(name, value);
    }
    Flow::Continue(status)
}

fn list(ctx: &mut BuiltinContext) -> Flow {
    let mut text = String::new();
    for (name, value) in ctx.state.exported() {
        let quoted = shlex::try_quote(value)
            .map(|q| q.into_owned())
            .unwrap_or_else(|_| value.escape_default().to_string());
        text.push_str(&format!("export {name}={quoted}\n"));
    }
    Flow::Continue(output_status(ctx.stdout.write_all(text.as_bytes())))
}

/// `unset NAME...` removes variables from the shell and from children.
pub fn unset(ctx: &mut BuiltinContext) -> Flow {
    let args = ctx.args;
    let mut status = 0;
    for name in args {
        if !is_valid_name(name) {
            ctx.complain(Builtin::Unset, format!("`{name}': not a valid identifier"));
            status = 1;
            continue;
        }
        ctx.state.unset(name);
    }
    Flow::Continue(status)
}
