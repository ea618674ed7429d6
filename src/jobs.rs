//! Job bookkeeping: pipelines started with `&` and foreground pipelines
//! that were stopped.
//!
//! A job keeps only the pids of its stages. Every wait goes through
//! `waitpid`, so stops and continues are observed as well as exits.

use std::fmt;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{WaitPidFlag, waitpid};
use nix::unistd::Pid;

use crate::exec::Launched;
use crate::exec::status::{self, ChildEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    /// Some stage is stopped; carries `128 + signal`.
    Stopped(i32),
    Done(i32),
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => f.write_str("Running"),
            JobState::Stopped(_) => f.write_str("Stopped"),
            JobState::Done(0) => f.write_str("Done"),
            JobState::Done(code) => write!(f, "Exit {code}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageStatus {
    Running(Pid),
    Stopped(Pid, i32),
    Exited(i32),
}

impl StageStatus {
    fn pid(self) -> Option<Pid> {
        match self {
            StageStatus::Running(pid) | StageStatus::Stopped(pid, _) => Some(pid),
            StageStatus::Exited(_) => None,
        }
    }

    /// Apply one `waitpid` report for this stage.
    fn collect(&mut self, flags: WaitPidFlag) {
        let Some(pid) = self.pid() else { return };
        loop {
            match waitpid(pid, Some(flags)) {
                Ok(reported) => {
                    if let Some(event) = status::event(reported) {
                        *self = match event {
                            ChildEvent::Exited(code) => StageStatus::Exited(code),
                            ChildEvent::Stopped(code) => StageStatus::Stopped(pid, code),
                            ChildEvent::Continued => StageStatus::Running(pid),
                        };
                    }
                    return;
                }
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    log::warn!("wait for pid {pid} failed: {e}");
                    *self = StageStatus::Exited(1);
                    return;
                }
            }
        }
    }
}

/// One pipeline. The first started stage leads the process group.
#[derive(Debug)]
pub struct Job {
    pub id: usize,
    pub command: String,
    pgid: Option<Pid>,
    stages: Vec<StageStatus>,
    stop_reported: bool,
}

impl Job {
    /// `launched` holds a child per started stage and `Err(status)` for a
    /// stage that failed to spawn. The job takes over reaping the children.
    pub fn new(command: String, launched: Vec<Launched>) -> Self {
        let stages: Vec<StageStatus> = launched
            .into_iter()
            .map(|stage| match stage {
                Ok(child) => StageStatus::Running(Pid::from_raw(child.id() as i32)),
                Err(status) => StageStatus::Exited(status),
            })
            .collect();
        let pgid = stages.iter().find_map(|s| s.pid());
        Self {
            id: 0,
            command,
            pgid,
            stages,
            stop_reported: false,
        }
    }

    /// Process group of the job, if any stage started.
    pub fn pgid(&self) -> Option<Pid> {
        self.pgid
    }

    /// Collect exits, stops and continues without blocking.
    pub fn poll(&mut self) -> JobState {
        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
        for stage in &mut self.stages {
            stage.collect(flags);
        }
        self.state()
    }

    /// Block until every stage has exited or one of them stops.
    pub fn wait(&mut self) -> JobState {
        for i in 0..self.stages.len() {
            if let StageStatus::Running(_) = self.stages[i] {
                self.stages[i].collect(WaitPidFlag::WUNTRACED);
            }
            if let StageStatus::Stopped(..) = self.stages[i] {
                // Pick up siblings that stopped with it.
                return self.poll();
            }
        }
        self.state()
    }

    /// Send SIGCONT to a stopped job.
    pub fn resume(&mut self) -> nix::Result<()> {
        if !matches!(self.state(), JobState::Stopped(_)) {
            return Ok(());
        }
        if let Some(pgid) = self.pgid {
            signal::killpg(pgid, Signal::SIGCONT)?;
        }
        for stage in &mut self.stages {
            if let StageStatus::Stopped(pid, _) = *stage {
                *stage = StageStatus::Running(pid);
            }
        }
        self.stop_reported = false;
        log::debug!("job [{}] continued", self.id);
        Ok(())
    }

    /// Record that the user has been told this job stopped.
    pub fn mark_stop_reported(&mut self) {
        self.stop_reported = true;
    }

    /// `Stopped` if any stage is stopped, `Done` with the last stage's
    /// status once every stage has exited.
    pub fn state(&self) -> JobState {
        if let Some(code) = self.stages.iter().find_map(|s| match s {
            StageStatus::Stopped(_, code) => Some(*code),
            _ => None,
        }) {
            return JobState::Stopped(code);
        }
        let mut last = 0;
        for stage in &self.stages {
            match stage {
                StageStatus::Exited(code) => last = *code,
                _ => return JobState::Running,
            }
        }
        JobState::Done(last)
    }
}

/// Jobs ordered by id. Ids count up from 1 and start over once the table
/// has emptied.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
    next_id: usize,
}

impl JobTable {
    /// Register a job and return its id. A job that already has an id (one
    /// stopped after `fg`) keeps it.
    pub fn add(&mut self, mut job: Job) -> usize {
        if job.id == 0 {
            if self.jobs.is_empty() {
                self.next_id = 1;
            }
            job.id = self.next_id.max(1);
            log::debug!("job [{}] started: {}", job.id, job.command);
        }
        self.next_id = self.next_id.max(job.id + 1);
        let id = job.id;
        let pos = self.jobs.partition_point(|j| j.id < id);
        self.jobs.insert(pos, job);
        id
    }

    pub fn get(&self, id: usize) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Take a job out of the table, e.g. to wait for it in the foreground.
    pub fn remove(&mut self, id: usize) -> Option<Job> {
        let pos = self.jobs.iter().position(|j| j.id == id)?;
        Some(self.jobs.remove(pos))
    }

    /// Id of the most recently started job.
    pub fn current(&self) -> Option<usize> {
        self.jobs.last().map(|j| j.id)
    }

    /// Id of the most recent job that is stopped.
    pub fn current_stopped(&mut self) -> Option<usize> {
        self.jobs
            .iter_mut()
            .rev()
            .find_map(|j| matches!(j.poll(), JobState::Stopped(_)).then_some(j.id))
    }

    /// Poll every job and list them with their state.
    pub fn refresh(&mut self) -> Vec<(usize, JobState, &str)> {
        self.jobs
            .iter_mut()
            .map(|j| {
                let state = j.poll();
                (j.id, state, j.command.as_str())
            })
            .collect()
    }

    /// Changes to announce before the next prompt, as `(id, state, command)`:
    /// finished jobs, which leave the table, and jobs newly seen stopped.
    pub fn reap(&mut self) -> Vec<(usize, JobState, String)> {
        let mut notices = Vec::new();
        let mut i = 0;
        while i < self.jobs.len() {
            let job = &mut self.jobs[i];
            match job.poll() {
                JobState::Done(code) => {
                    let job = self.jobs.remove(i);
                    log::debug!("job [{}] finished with status {code}", job.id);
                    notices.push((job.id, JobState::Done(code), job.command));
                    continue;
                }
                stopped @ JobState::Stopped(_) if !job.stop_reported => {
                    job.stop_reported = true;
                    log::debug!("job [{}] stopped", job.id);
                    notices.push((job.id, stopped, job.command.clone()));
                }
                _ => {}
            }
            i += 1;
        }
        notices
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
