use nix::sys::wait::WaitStatus;

/// What a `waitpid` report means for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildEvent {
    /// Finished with this shell status: the exit code, or `128 + N` when
    /// killed by signal `N`.
    Exited(i32),
    /// Stopped by a signal; carries `128 + N` for `$?`.
    Stopped(i32),
    Continued,
}

/// Translate a wait status. `None` for "still running" and ptrace reports.
pub fn event(status: WaitStatus) -> Option<ChildEvent> {
    match status {
        WaitStatus::Exited(_, code) => Some(ChildEvent::Exited(code)),
        WaitStatus::Signaled(_, sig, _) => Some(ChildEvent::Exited(128 + sig as i32)),
        WaitStatus::Stopped(_, sig) => Some(ChildEvent::Stopped(128 + sig as i32)),
        WaitStatus::Continued(_) => Some(ChildEvent::Continued),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;
    use nix::unistd::Pid;

    fn pid() -> Pid {
        Pid::from_raw(42)
    }

    #[test]
    fn exited() {
        assert_eq!(event(WaitStatus::Exited(pid(), 0)), Some(ChildEvent::Exited(0)));
        assert_eq!(event(WaitStatus::Exited(pid(), 3)), Some(ChildEvent::Exited(3)));
    }

    #[test]
    fn signaled() {
        let status = WaitStatus::Signaled(pid(), Signal::SIGKILL, false);
        assert_eq!(event(status), Some(ChildEvent::Exited(137)));
    }

    #[test]
    fn stopped_and_continued() {
        let status = WaitStatus::Stopped(pid(), Signal::SIGTSTP);
        assert_eq!(event(status), Some(ChildEvent::Stopped(148)));
        assert_eq!(event(WaitStatus::Continued(pid())), Some(ChildEvent::Continued));
    }

    #[test]
    fn still_alive() {
        assert_eq!(event(WaitStatus::StillAlive), None);
    }
}
