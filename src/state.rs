//! Shell-wide mutable state: working directory, exported variables, `$?`,
//! history, jobs and the controlling terminal.
//!
//! The state is an explicit value owned by the [`Shell`](crate::shell::Shell)
//! and lent to the expander, executor and built-ins. Nothing here touches the
//! process-global cwd or environment; children get a copy assembled by
//! [`ShellState::child_env`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::jobs::JobTable;
use crate::signals::Terminal;

/// Default number of history entries kept.
pub const DEFAULT_HISTORY_SIZE: usize = 200;

#[derive(Debug)]
pub struct ShellState {
    cwd: PathBuf,
    /// Variables set with `export`; take precedence over the inherited environment.
    exported: HashMap<String, String>,
    /// Inherited names removed with `unset`.
    unset: HashSet<String>,
    last_status: i32,
    history: History,
    pub jobs: JobTable,
    /// Set when stdin is a terminal that foreground jobs are handed.
    terminal: Option<Terminal>,
}

impl ShellState {
    /// Fresh state rooted at `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            exported: HashMap::new(),
            unset: HashSet::new(),
            last_status: 0,
            history: History::new(DEFAULT_HISTORY_SIZE),
            jobs: JobTable::default(),
            terminal: None,
        }
    }

    /// State rooted at the process's current directory.
    pub fn from_process() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Replace the working directory. Callers validate the target first.
    pub fn set_cwd(&mut self, cwd: PathBuf) {
        self.cwd = cwd;
    }

    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Look up a variable: exported table first, then the inherited
    /// environment unless the name was unset in this session.
    pub fn var(&self, name: &str) -> Option<String> {
        if let Some(v) = self.exported.get(name) {
            return Some(v.clone());
        }
        if self.unset.contains(name) {
            return None;
        }
        std::env::var(name).ok()
    }

    /// Insert or overwrite an exported variable.
    pub fn export(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.unset.remove(&name);
        self.exported.insert(name, value.into());
    }

    /// Remove a variable from the exported table and hide any inherited value.
    pub fn unset(&mut self, name: &str) {
        self.exported.remove(name);
        self.unset.insert(name.to_string());
    }

    /// Exported variables, sorted by name.
    pub fn exported(&self) -> Vec<(&str, &str)> {
        let mut vars: Vec<_> = self
            .exported
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        vars.sort();
        vars
    }

    /// Environment changes a child process needs on top of the inherited
    /// environment: variables to set and names to remove.
    pub fn child_env(&self) -> (Vec<(String, String)>, Vec<String>) {
        let mut set: Vec<(String, String)> = self
            .exported
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        set.push(("PWD".into(), self.cwd.to_string_lossy().into_owned()));
        let removed = self.unset.iter().cloned().collect();
        (set, removed)
    }

    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    pub fn set_last_status(&mut self, status: i32) {
        self.last_status = status;
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn terminal(&self) -> Option<&Terminal> {
        self.terminal.as_ref()
    }

    pub fn set_terminal(&mut self, terminal: Option<Terminal>) {
        self.terminal = terminal;
    }
}

/// Bounded list of previously entered lines, oldest first.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Record a line, dropping the oldest entry when full. Blank lines are ignored.
    pub fn add(&mut self, line: &str) {
        if line.trim().is_empty() || self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
