use super::{Builtin, BuiltinContext, Flow};

/// Leave the shell with the given code, or with `$?` when none is given.
pub fn run(ctx: &mut BuiltinContext) -> Flow {
    let args = ctx.args;
    match args {
        [] => Flow::Exit(ctx.state.last_status()),
        [code] => match code.parse::<i64>() {
            Ok(n) => Flow::Exit(n.rem_euclid(256) as i32),
            Err(_) => {
                ctx.complain(Builtin::Exit, format!("{code}: numeric argument required"));
                Flow::Exit(2)
            }
        },
        _ => {
            ctx.complain(Builtin::Exit, "too many arguments");
            Flow::Continue(1)
        }
    }
}
