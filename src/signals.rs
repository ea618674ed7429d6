//! Signal dispositions and terminal ownership for job control.
//!
//! Every pipeline runs in its own process group led by its first stage. The
//! shell forwards SIGINT and SIGTSTP to the foreground group, so Ctrl-C and
//! Ctrl-Z reach the running job and never the shell or background jobs.
//! When stdin is a terminal the foreground group also owns the terminal
//! while it runs.

use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicI32, Ordering};

use nix::libc::c_int;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::{self, Pid};

/// Process group of the job currently waited for in the foreground, or 0.
static FOREGROUND: AtomicI32 = AtomicI32::new(0);

/// Signals whose disposition the shell changes; children get the defaults back.
const JOB_SIGNALS: [Signal; 4] = [
    Signal::SIGINT,
    Signal::SIGTSTP,
    Signal::SIGQUIT,
    Signal::SIGTTOU,
];

extern "C" fn forward(sig: c_int) {
    let pgid = FOREGROUND.load(Ordering::SeqCst);
    if pgid > 0
        && let Ok(sig) = Signal::try_from(sig)
    {
        let _ = signal::killpg(Pid::from_raw(pgid), sig);
    }
}

/// Install the shell's dispositions: SIGINT and SIGTSTP go to the foreground
/// job, SIGQUIT and SIGTTOU are ignored.
pub fn install() -> nix::Result<()> {
    let forwarding = SigAction::new(
        SigHandler::Handler(forward),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    // SAFETY: `forward` only touches an atomic and calls killpg(2), both
    // async-signal-safe.
    unsafe {
        signal::sigaction(Signal::SIGINT, &forwarding)?;
        signal::sigaction(Signal::SIGTSTP, &forwarding)?;
        signal::sigaction(Signal::SIGQUIT, &ignore)?;
        signal::sigaction(Signal::SIGTTOU, &ignore)?;
    }
    log::debug!("job control signals installed");
    Ok(())
}

/// Restore default dispositions. Runs in the child between fork and exec,
/// so it only makes sigaction(2) calls.
pub fn reset_for_child() -> io::Result<()> {
    for sig in JOB_SIGNALS {
        // SAFETY: installing SIG_DFL registers no handler code.
        unsafe { signal::signal(sig, SigHandler::SigDfl) }.map_err(io::Error::from)?;
    }
    Ok(())
}

/// The controlling terminal on stdin and the shell's own process group.
#[derive(Debug)]
pub struct Terminal {
    shell_pgid: Pid,
}

impl Terminal {
    /// `Some` when stdin is a terminal.
    pub fn from_stdin() -> Option<Self> {
        io::stdin().is_terminal().then(|| Self {
            shell_pgid: unistd::getpgrp(),
        })
    }

    pub fn give_to(&self, pgid: Pid) -> nix::Result<()> {
        unistd::tcsetpgrp(io::stdin(), pgid)
    }

    pub fn reclaim(&self) -> nix::Result<()> {
        unistd::tcsetpgrp(io::stdin(), self.shell_pgid)
    }
}

/// A job's process group marked as foreground for as long as the guard lives.
pub struct Foreground<'a> {
    terminal: Option<&'a Terminal>,
}

impl<'a> Foreground<'a> {
    pub fn enter(pgid: Option<Pid>, terminal: Option<&'a Terminal>) -> Self {
        let Some(pgid) = pgid else {
            return Self { terminal: None };
        };
        FOREGROUND.store(pgid.as_raw(), Ordering::SeqCst);
        if let Some(t) = terminal
            && let Err(e) = t.give_to(pgid)
        {
            log::warn!("cannot hand terminal to {pgid}: {e}");
        }
        Self { terminal }
    }
}

impl Drop for Foreground<'_> {
    fn drop(&mut self) {
        FOREGROUND.store(0, Ordering::SeqCst);
        if let Some(t) = self.terminal
            && let Err(e) = t.reclaim()
        {
            log::warn!("cannot reclaim terminal: {e}");
        }
    }
}
