//! Pipeline execution: redirection files, pipes, process spawning and
//! status collection.
//!
//! A single-stage built-in runs in the shell process. Everything else is
//! spawned, one process per stage, all stages running concurrently and
//! connected by pipes. The stages share a process group led by the first
//! one, so signals and the terminal go to the whole pipeline. Every pipe end and redirection file is an owned value
//! moved into the spawn request of the stage that uses it, so the shell
//! holds no descriptor once the stage has been launched and a reader is
//! never kept alive by a stray write end.

pub mod redirect;
pub mod status;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::builtins::{Builtin, BuiltinContext, Flow};
use crate::error::{STATUS_NOT_EXECUTABLE, STATUS_NOT_FOUND, ShellError, warn_on_write};
use crate::jobs::{Job, JobState};
use crate::parse::{Pipeline, Program, Stage};
use crate::signals;
use crate::state::ShellState;
use redirect::StageFiles;

/// A stage that was launched, or the status of one that could not be.
pub type Launched = Result<Child, i32>;

/// Runs pipelines against a shell state.
///
/// `stdout`/`stderr` receive built-in output and the executor's own
/// diagnostics; spawned programs inherit the process's real streams.
pub struct Executor<'a> {
    state: &'a mut ShellState,
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
}

impl<'a> Executor<'a> {
    pub fn new(
        state: &'a mut ShellState,
        stdout: &'a mut dyn Write,
        stderr: &'a mut dyn Write,
    ) -> Self {
        Self {
            state,
            stdout,
            stderr,
        }
    }

    /// Run a pipeline to completion (or hand it to the job table when it
    /// runs in the background) and report what the shell does next.
    ///
    /// Redirection failures abort before any process starts. A stage that
    /// cannot be launched gets status 127 (126 if found but not executable)
    /// while its siblings still run.
    pub fn run(&mut self, pipeline: &Pipeline) -> Result<Flow, ShellError> {
        let mut files = redirect::open_all(self.state, pipeline)?;

        if let [stage] = pipeline.stages.as_slice()
            && let Program::Builtin(builtin) = stage.program
        {
            let stage_files = files.pop().unwrap_or_default();
            return self.run_builtin(builtin, stage, stage_files);
        }

        // Anything the shell printed must land before the children's output.
        warn_on_write(self.stdout.flush());
        warn_on_write(self.stderr.flush());

        let job = Job::new(pipeline.display(), self.spawn_all(pipeline, files)?);

        if pipeline.background {
            let leader = job.pgid();
            let id = self.state.jobs.add(job);
            if let Some(pid) = leader {
                warn_on_write(writeln!(self.stdout, "[{id}] {pid}"));
            }
            return Ok(Flow::Continue(0));
        }

        Ok(Flow::Continue(wait_foreground(self.state, job, self.stdout)))
    }

    fn run_builtin(
        &mut self,
        builtin: Builtin,
        stage: &Stage,
        files: StageFiles,
    ) -> Result<Flow, ShellError> {
        log::debug!("builtin {}", builtin.name());
        // Built-ins never read stdin; the input file was opened only to
        // report a missing one.
        drop(files.stdin);
        let mut redirected = files.stdout;
        let stdout: &mut dyn Write = match redirected.as_mut() {
            Some(file) => file,
            None => &mut *self.stdout,
        };
        let mut ctx = BuiltinContext {
            state: &mut *self.state,
            args: stage.args(),
            stdout,
            stderr: &mut *self.stderr,
        };
        let flow = builtin.run(&mut ctx);
        warn_on_write(ctx.stdout.flush());
        flow
    }

    /// Create the N-1 pipes up front, then launch each stage with its ends.
    fn spawn_all(
        &mut self,
        pipeline: &Pipeline,
        files: Vec<StageFiles>,
    ) -> Result<Vec<Launched>, ShellError> {
        let count = pipeline.stages.len();
        let mut readers = Vec::with_capacity(count.saturating_sub(1));
        let mut writers = Vec::with_capacity(count.saturating_sub(1));
        for _ in 1..count {
            let (reader, writer) = os_pipe::pipe().map_err(ShellError::Pipe)?;
            readers.push(Some(reader));
            writers.push(Some(writer));
        }

        let env = ChildEnv::from_state(self.state);
        let mut launched = Vec::with_capacity(count);
        let mut leader = None;

        for (i, (stage, stage_files)) in pipeline.stages.iter().zip(files).enumerate() {
            let stdin = if i > 0 {
                readers[i - 1].take().map(Stdio::from)
            } else {
                stage_files.stdin.map(Stdio::from)
            };
            let stdout = if i + 1 < count {
                writers[i].take().map(Stdio::from)
            } else {
                stage_files.stdout.map(Stdio::from)
            };
            log::debug!(
                "stage {i}: {} (stdin: {}, stdout: {})",
                stage.name(),
                if i > 0 { "pipe" } else if stdin.is_some() { "file" } else { "inherit" },
                if i + 1 < count { "pipe" } else if stdout.is_some() { "file" } else { "inherit" },
            );
            let stage = self.spawn_stage(
                stage,
                stdin.unwrap_or_else(Stdio::inherit),
                stdout.unwrap_or_else(Stdio::inherit),
                &env,
                leader,
            );
            if leader.is_none()
                && let Ok(child) = &stage
            {
                leader = Some(child.id());
            }
            launched.push(stage);
        }

        Ok(launched)
    }

    /// Launch one stage into the process group of `leader`, or a new group
    /// of its own. The `Command` owns the stage's pipe ends and files and
    /// drops them on return, spawned or not.
    fn spawn_stage(
        &mut self,
        stage: &Stage,
        stdin: Stdio,
        stdout: Stdio,
        env: &ChildEnv,
        leader: Option<u32>,
    ) -> Launched {
        let program = match resolve_program(stage.name(), env.path.as_deref(), &env.cwd) {
            Ok(program) => program,
            Err(e) => {
                log::warn!("{e}");
                warn_on_write(writeln!(self.stderr, "tsh: {e}"));
                return Err(e.status());
            }
        };

        let mut command = Command::new(&program);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command
                .arg0(stage.name())
                .process_group(leader.map_or(0, |pid| pid as i32));
            // SAFETY: the hook only makes sigaction(2) calls, which are
            // async-signal-safe.
            unsafe {
                command.pre_exec(signals::reset_for_child);
            }
        }
        command
            .args(stage.args())
            .current_dir(&env.cwd)
            .stdin(stdin)
            .stdout(stdout)
            .envs(env.set.iter().map(|(k, v)| (k, v)));
        for name in &env.removed {
            command.env_remove(name);
        }

        match command.spawn() {
            Ok(child) => {
                log::debug!("spawned {} as pid {}", program.display(), child.id());
                Ok(child)
            }
            Err(e) => {
                let status = match e.kind() {
                    std::io::ErrorKind::NotFound => STATUS_NOT_FOUND,
                    _ => STATUS_NOT_EXECUTABLE,
                };
                log::warn!("spawn {} failed: {e}", program.display());
                warn_on_write(writeln!(self.stderr, "tsh: {}: {e}", stage.name()));
                Err(status)
            }
        }
    }
}

/// Environment snapshot handed to every child of one pipeline.
struct ChildEnv {
    cwd: PathBuf,
    path: Option<String>,
    set: Vec<(String, String)>,
    removed: Vec<String>,
}

impl ChildEnv {
    fn from_state(state: &ShellState) -> Self {
        let (set, removed) = state.child_env();
        Self {
            cwd: state.cwd().to_path_buf(),
            path: state.var("PATH"),
            set,
            removed,
        }
    }
}

/// Find the program for `name` on `path`, relative to `cwd` when `name`
/// contains a slash.
pub fn resolve_program(name: &str, path: Option<&str>, cwd: &Path) -> Result<PathBuf, ShellError> {
    match which::which_in(name, path, cwd) {
        Ok(program) => Ok(program),
        Err(_) if name.contains('/') && cwd.join(name).exists() => {
            let reason = if cwd.join(name).is_dir() {
                "Is a directory"
            } else {
                "Permission denied"
            };
            Err(ShellError::Spawn {
                name: name.to_string(),
                reason: reason.into(),
                status: STATUS_NOT_EXECUTABLE,
            })
        }
        Err(_) => Err(ShellError::Spawn {
            name: name.to_string(),
            reason: "command not found".into(),
            status: STATUS_NOT_FOUND,
        }),
    }
}

/// Wait for `job` with forwarded signals and the terminal pointed at it.
///
/// Returns the last stage's status. A job that stops goes back into the
/// job table, is announced on `out`, and yields `128 + signal`.
pub fn wait_foreground(state: &mut ShellState, mut job: Job, out: &mut dyn Write) -> i32 {
    let outcome = {
        let _foreground = signals::Foreground::enter(job.pgid(), state.terminal());
        job.wait()
    };
    match outcome {
        JobState::Done(code) => code,
        JobState::Stopped(code) => {
            let command = job.command.clone();
            job.mark_stop_reported();
            let id = state.jobs.add(job);
            log::info!("job [{id}] stopped: {command}");
            warn_on_write(writeln!(out, "[{id}]+ Stopped  {command}"));
            code
        }
        JobState::Running => 0,
    }
}
