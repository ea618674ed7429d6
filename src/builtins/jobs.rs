
use super::{Builtin, BuiltinContext, Flow, output_status};
use crate::error::warn_on_write;
use crate::exec::wait_foreground;
use crate::jobs::JobState;

/// List jobs and their state.
pub fn jobs(ctx: &mut BuiltinContext) -> Flow {
    let mut text = String::new();
    for (id, state, command) in ctx.state.jobs.refresh() {
        text.push_str(&format!("[{id}]  {:<8}  {command}\n", state.to_string()));
    }
    Flow::Continue(output_status(ctx.stdout.write_all(text.as_bytes())))
}

/// Pick the job named by `%N` or `N`, or `default` without an argument.
fn select(ctx: &mut BuiltinContext, builtin: Builtin, default: Option<usize>) -> Result<usize, Flow> {
    let args = ctx.args;
    let id = match args {
        [] => default,
        [arg] => arg.trim_start_matches('%').parse::<usize>().ok(),
        _ => {
            ctx.complain(builtin, "too many arguments");
            return Err(Flow::Continue(1));
        }
    };
    match id.filter(|id| ctx.state.jobs.get(*id).is_some()) {
        Some(id) => Ok(id),
        None => {
            let which = args.first().map_or("current", String::as_str);
            ctx.complain(builtin, format!("{which}: no such job"));
            Err(Flow::Continue(1))
        }
    }
}

/// Continue a job (`%N`, `N`, or the most recent) and wait for it in the
/// foreground.
pub fn fg(ctx: &mut BuiltinContext) -> Flow {
    let current = ctx.state.jobs.current();
    let id = match select(ctx, Builtin::Fg, current) {
        Ok(id) => id,
        Err(flow) => return flow,
    };
    let Some(mut job) = ctx.state.jobs.remove(id) else {
        return Flow::Continue(1);
    };

    warn_on_write(writeln!(ctx.stdout, "{}", job.command).and_then(|_| ctx.stdout.flush()));
    if let Err(e) = job.resume() {
        ctx.complain(Builtin::Fg, format!("%{id}: {e}"));
    }
    Flow::Continue(wait_foreground(ctx.state, job, ctx.stdout))
}

/// Continue a stopped job (`%N`, `N`, or the most recently stopped) in the
/// background.
pub fn bg(ctx: &mut BuiltinContext) -> Flow {
    let current = ctx.state.jobs.current_stopped();
    let id = match select(ctx, Builtin::Bg, current) {
        Ok(id) => id,
        Err(flow) => return flow,
    };

    let resumed = match ctx.state.jobs.get_mut(id) {
        Some(job) => match job.poll() {
            JobState::Stopped(_) => Some(job.resume().map(|()| job.command.clone())),
            _ => None,
        },
        None => None,
    };
    match resumed {
        Some(Ok(command)) => {
            Flow::Continue(output_status(writeln!(ctx.stdout, "[{id}]+ {command} &")))
        }
        Some(Err(e)) => {
            ctx.complain(Builtin::Bg, format!("%{id}: {e}"));
            Flow::Continue(1)
        }
        None => {
            ctx.complain(Builtin::Bg, format!("job {id} already in background"));
            Flow::Continue(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::run;
    use super::*;
    use crate::jobs::Job;
    use crate::state::ShellState;
    use nix::sys::signal::{self, Signal};
    use std::os::unix::process::CommandExt;
    use std::process::{Child, Command};

    fn spawn(program: &str, args: &[&str]) -> Child {
        Command::new(program).args(args).process_group(0).spawn().unwrap()
    }

    fn add(state: &mut ShellState, command: &str, child: Child) -> usize {
        state.jobs.add(Job::new(command.into(), vec![Ok(child)]))
    }

    #[test]
    fn fg_waits_and_reports_status() {
        let mut state = ShellState::new("/");
        add(&mut state, "sh -c 'exit 4'", spawn("sh", &["-c", "exit 4"]));
        let r = run(Builtin::Fg, &mut state, &["%1"]);
        assert_eq!(r.flow.unwrap(), Flow::Continue(4));
        assert_eq!(r.stdout, "sh -c 'exit 4'\n");
        assert!(state.jobs.is_empty());
    }

    #[test]
    fn fg_defaults_to_current() {
        let mut state = ShellState::new("/");
        add(&mut state, "true", spawn("true", &[]));
        assert_eq!(run(Builtin::Fg, &mut state, &[]).flow.unwrap(), Flow::Continue(0));
    }

    #[test]
    fn fg_unknown_job() {
        let mut state = ShellState::new("/");
        let r = run(Builtin::Fg, &mut state, &["%9"]);
        assert_eq!(r.flow.unwrap(), Flow::Continue(1));
        assert!(r.stderr.contains("no such job"));
    }

    #[test]
    fn fg_continues_stopped_job() {
        let mut state = ShellState::new("/");
        let child = spawn("sh", &["-c", "kill -STOP $$; exit 6"]);
        let mut job = Job::new("sh".into(), vec![Ok(child)]);
        assert_eq!(job.wait(), JobState::Stopped(147));
        let id = state.jobs.add(job);
        let r = run(Builtin::Fg, &mut state, &[&format!("%{id}")]);
        assert_eq!(r.flow.unwrap(), Flow::Continue(6));
        assert!(state.jobs.is_empty());
    }

    #[test]
    fn bg_continues_stopped_job() {
        let mut state = ShellState::new("/");
        let child = spawn("sh", &["-c", "kill -STOP $$; exit 6"]);
        let mut job = Job::new("sh -c stopper".into(), vec![Ok(child)]);
        assert_eq!(job.wait(), JobState::Stopped(147));
        let id = state.jobs.add(job);

        let r = run(Builtin::Bg, &mut state, &[]);
        assert_eq!(r.flow.unwrap(), Flow::Continue(0));
        assert_eq!(r.stdout, format!("[{id}]+ sh -c stopper &\n"));

        let job = state.jobs.remove(id).unwrap();
        assert_eq!(wait_foreground(&mut state, job, &mut Vec::new()), 6);
    }

    #[test]
    fn bg_running_job_is_noop() {
        let mut state = ShellState::new("/");
        let id = add(&mut state, "sleep 5", spawn("sleep", &["5"]));
        let r = run(Builtin::Bg, &mut state, &["1"]);
        assert_eq!(r.flow.unwrap(), Flow::Continue(0));
        assert!(r.stderr.contains("already in background"), "{}", r.stderr);

        let mut job = state.jobs.remove(id).unwrap();
        signal::killpg(job.pgid().unwrap(), Signal::SIGKILL).unwrap();
        job.wait();
    }

    #[test]
    fn bg_without_stopped_job() {
        let mut state = ShellState::new("/");
        let r = run(Builtin::Bg, &mut state, &[]);
        assert_eq!(r.flow.unwrap(), Flow::Continue(1));
        assert!(r.stderr.contains("current: no such job"), "{}", r.stderr);
    }

    #[test]
    fn jobs_lists_entries() {
        let mut state = ShellState::new("/");
        let id = add(&mut state, "sleep 5", spawn("sleep", &["5"]));
        let r = run(Builtin::Jobs, &mut state, &[]);
        assert_eq!(r.stdout, "[1]  Running   sleep 5\n");

        let pgid = state.jobs.get(id).and_then(|j| j.pgid()).unwrap();
        signal::killpg(pgid, Signal::SIGSTOP).unwrap();
        let mut listed = String::new();
        for _ in 0..300 {
            listed = run(Builtin::Jobs, &mut state, &[]).stdout;
            if listed.contains("Stopped") {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(listed, "[1]  Stopped   sleep 5\n");

        let mut job = state.jobs.remove(id).unwrap();
        signal::killpg(pgid, Signal::SIGKILL).unwrap();
        job.wait();
    }
}
