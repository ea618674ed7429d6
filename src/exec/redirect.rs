use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::ShellError;
use crate::parse::{OutputMode, OutputRedirect, Pipeline};
use crate::state::ShellState;

/// Files opened for one stage's redirections.
#[derive(Debug, Default)]
pub struct StageFiles {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

/// Open every redirection of the pipeline, in stage order.
///
/// Runs before anything is spawned, so a missing input file or an
/// unwritable output path aborts the whole line. Files already opened are
/// closed when the error drops them.
pub fn open_all(state: &ShellState, pipeline: &Pipeline) -> Result<Vec<StageFiles>, ShellError> {
    pipeline
        .stages
        .iter()
        .map(|stage| {
            Ok(StageFiles {
                stdin: stage
                    .input
                    .as_deref()
                    .map(|p| open_input(state, p))
                    .transpose()?,
                stdout: stage
                    .output
                    .as_ref()
                    .map(|r| open_output(state, r))
                    .transpose()?,
            })
        })
        .collect()
}

pub fn open_input(state: &ShellState, path: &Path) -> Result<File, ShellError> {
    File::open(state.resolve(path)).map_err(|source| ShellError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Open an output target: created if missing, truncated or appended to.
pub fn open_output(state: &ShellState, redirect: &OutputRedirect) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    match redirect.mode {
        OutputMode::Truncate => options.truncate(true),
        OutputMode::Append => options.append(true),
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options
        .open(state.resolve(&redirect.path))
        .map_err(|source| ShellError::Io {
            path: redirect.path.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand;
    use crate::parse::{parse, tokenize};
    use std::fs;
    use std::io::Write;

    fn pipeline(line: &str, state: &ShellState) -> Pipeline {
        parse(expand(tokenize(line).unwrap(), state).unwrap())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn truncate_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let state = ShellState::new(dir.path());
        let target = OutputRedirect {
            path: "out.txt".into(),
            mode: OutputMode::Truncate,
        };
        open_output(&state, &target).unwrap().write_all(b"first\n").unwrap();
        open_output(&state, &target).unwrap().write_all(b"second\n").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "second\n");

        let append = OutputRedirect {
            mode: OutputMode::Append,
            ..target
        };
        open_output(&state, &append).unwrap().write_all(b"third\n").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("out.txt")).unwrap(),
            "second\nthird\n"
        );
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = ShellState::new(dir.path());
        let p = pipeline("cat < missing.txt | wc -l > count.txt", &state);
        let err = open_all(&state, &p).unwrap_err();
        assert!(matches!(err, ShellError::Io { .. }));
        assert!(err.to_string().starts_with("missing.txt: "));
    }

    #[test]
    fn output_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let state = ShellState::new(dir.path());
        let p = pipeline("echo hi > nodir/out.txt", &state);
        assert!(matches!(open_all(&state, &p), Err(ShellError::Io { .. })));
    }

    #[test]
    fn files_line_up_with_stages() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in.txt"), "x").unwrap();
        let state = ShellState::new(dir.path());
        let p = pipeline("sort < in.txt | uniq | wc >> out.txt", &state);
        let files = open_all(&state, &p).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[0].stdin.is_some() && files[0].stdout.is_none());
        assert!(files[1].stdin.is_none() && files[1].stdout.is_none());
        assert!(files[2].stdin.is_none() && files[2].stdout.is_some());
    }
}
