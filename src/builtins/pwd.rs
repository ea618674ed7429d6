
use super::{BuiltinContext, Flow, output_status};

pub fn run(ctx: &mut BuiltinContext) -> Flow {
    let written = writeln!(ctx.stdout, "{}", ctx.state.cwd().display());
    Flow::Continue(output_status(written))
}

#[cfg(test)]
mod tests {
    use super::super::Builtin;
    use super::super::testing::run;
    use super::*;
    use crate::state::ShellState;

    #[test]
    fn prints_cwd() {
        let mut state = ShellState::new("/usr/share");
        let r = run(Builtin::Pwd, &mut state, &[]);
        assert_eq!(r.flow.unwrap(), Flow::Continue(0));
        assert_eq!(r.stdout, "/usr/share\n");
    }
}
