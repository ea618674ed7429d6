//! The read-evaluate loop: one line at a time through tokenize, expand,
//! parse and execute, with `$?` carried from each line to the next.

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::builtins::Flow;
use crate::config::Config;
use crate::error::{ShellError, warn_on_write};
use crate::exec::Executor;
use crate::expand::expand;
use crate::parse::{parse, tokenize};
use crate::state::ShellState;

pub struct Shell {
    state: ShellState,
    config: Config,
}

impl Shell {
    /// A shell over `state`, with the configured history size and startup
    /// exports applied.
    pub fn new(mut state: ShellState, config: Config) -> Self {
        state
            .history_mut()
            .set_capacity(config.settings.history_size);
        for (name, value) in config.exports() {
            state.export(name, value);
        }
        Self { state, config }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    /// `NAME:CWD> `, with the home directory shown as `~`.
    pub fn prompt(&self) -> String {
        let cwd = self.state.cwd();
        let shown = match self.state.var("HOME").filter(|h| !h.is_empty()) {
            Some(home) => match cwd.strip_prefix(Path::new(&home)) {
                Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
                Ok(rest) => format!("~/{}", rest.display()),
                Err(_) => cwd.display().to_string(),
            },
            None => cwd.display().to_string(),
        };
        format!("{}:{shown}> ", self.config.settings.name)
    }

    /// Run one line and record its status.
    ///
    /// Errors are reported on `err` as `tsh: ...` and become the status.
    /// Blank and comment-only lines leave the status as it was.
    pub fn run_line(&mut self, line: &str, out: &mut dyn Write, err: &mut dyn Write) -> Flow {
        self.state.history_mut().add(line);

        let flow = match self.eval(line, out, err) {
            Ok(Some(flow)) => flow,
            Ok(None) => return Flow::Continue(self.state.last_status()),
            Err(e) => {
                warn_on_write(writeln!(err, "tsh: {e}"));
                Flow::Continue(e.status())
            }
        };
        warn_on_write(out.flush());
        warn_on_write(err.flush());

        log::info!("{line:?} -> {}", flow.status());
        self.state.set_last_status(flow.status());
        flow
    }

    fn eval(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Option<Flow>, ShellError> {
        let tokens = tokenize(line)?;
        let expanded = expand(tokens, &self.state)?;
        let Some(pipeline) = parse(expanded)? else {
            return Ok(None);
        };
        Executor::new(&mut self.state, out, err).run(&pipeline).map(Some)
    }

    /// Report jobs that finished or stopped since the last call.
    pub fn report_jobs(&mut self, out: &mut dyn Write) {
        for (id, state, command) in self.state.jobs.reap() {
            warn_on_write(writeln!(out, "[{id}]+ {state}  {command}"));
        }
    }

    /// Read lines from `input` until `exit` or end of input, writing to the
    /// process's stdout and stderr. Returns the shell's exit status.
    pub fn run<R: BufRead>(&mut self, input: R, interactive: bool) -> i32 {
        let mut out = io::stdout();
        let mut err = io::stderr();
        self.run_with(input, &mut out, &mut err, interactive)
    }

    /// [`Shell::run`] with explicit output streams.
    pub fn run_with<R: BufRead>(
        &mut self,
        mut input: R,
        out: &mut dyn Write,
        err: &mut dyn Write,
        interactive: bool,
    ) -> i32 {
        let mut buf = Vec::new();
        loop {
            self.report_jobs(out);
            if interactive {
                warn_on_write(write!(out, "{}", self.prompt()).and_then(|_| out.flush()));
            }

            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("read failed: {e}");
                    warn_on_write(writeln!(err, "tsh: {e}"));
                    break;
                }
            }

            // Bytes that are not UTF-8 become U+FFFD; the session goes on.
            let line = String::from_utf8_lossy(&buf);
            let text = line.trim_end_matches(['\n', '\r']);
            if let Flow::Exit(code) = self.run_line(text, out, err) {
                log::info!("exit {code}");
                return code;
            }
        }

        if interactive {
            warn_on_write(writeln!(out));
        }
        if !self.state.jobs.is_empty() {
            log::debug!("end of input with background jobs still running");
        }
        self.state.last_status()
    }
}
