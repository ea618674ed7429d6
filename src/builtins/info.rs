
use super::{ALL, BuiltinContext, Flow, output_status};

pub fn help(ctx: &mut BuiltinContext) -> Flow {
    let mut text = String::from("tsh - tiny shell\nBuilt-in commands:\n");
    for (_, summary) in ALL {
        text.push_str("  ");
        text.push_str(summary);
        text.push('\n');
    }
    text.push_str("Features: quotes, pipes, <, >, >>, background (&), $VAR, globs\n");
    Flow::Continue(output_status(ctx.stdout.write_all(text.as_bytes())))
}

/// Numbered history, oldest first.
pub fn history(ctx: &mut BuiltinContext) -> Flow {
    let mut text = String::new();
    for (i, line) in ctx.state.history().iter().enumerate() {
        text.push_str(&format!("{:4}  {line}\n", i + 1));
    }
    Flow::Continue(output_status(ctx.stdout.write_all(text.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::super::Builtin;
    use super::super::testing::run;
    use super::*;
    use crate::state::ShellState;

    #[test]
    fn help_lists_builtins() {
        let mut state = ShellState::new("/");
        let r = run(Builtin::Help, &mut state, &[]);
        for name in ["cd", "pwd", "export", "unset", "exit", "history", "jobs", "fg", "bg"] {
            assert!(r.stdout.contains(&format!("  {name} ")), "missing {name}");
        }
    }

    #[test]
    fn history_numbered() {
        let mut state = ShellState::new("/");
        state.history_mut().add("echo one");
        state.history_mut().add("ls");
        let r = run(Builtin::History, &mut state, &[]);
        assert_eq!(r.stdout, "   1  echo one\n   2  ls\n");
    }
}
