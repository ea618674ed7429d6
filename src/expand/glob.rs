use std::path::Path;

use ::glob::{MatchOptions, Pattern};

/// Characters that make an unquoted word a glob pattern.
pub const GLOB_CHARS: &[char] = &['*', '?', '['];

pub fn has_glob_chars(text: &str) -> bool {
    text.contains(GLOB_CHARS)
}

/// Expand `pattern` against the filesystem, relative to `cwd`.
///
/// Matches are returned sorted. A relative pattern yields paths relative to
/// `cwd`, spelled the way the pattern spells them (`./*` gives `./a`). An invalid pattern or a pattern without matches yields an empty
/// list; the caller decides what to pass through.
pub fn expand(pattern: &str, cwd: &Path) -> Vec<String> {
    let absolute = Path::new(pattern).is_absolute();
    let cwd = cwd.to_string_lossy();
    let base = cwd.trim_end_matches('/');
    let prefix = format!("{base}/");
    let full = if absolute {
        pattern.to_string()
    } else {
        format!("{}/{pattern}", Pattern::escape(base))
    };

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let paths = match ::glob::glob_with(&full, options) {
        Ok(paths) => paths,
        Err(e) => {
            log::debug!("invalid glob pattern {pattern:?}: {e}");
            return Vec::new();
        }
    };

    let mut matches: Vec<String> = paths
        .filter_map(Result::ok)
        .map(|p| {
            let p = p.to_string_lossy();
            if absolute {
                return p.into_owned();
            }
            p.strip_prefix(prefix.as_str()).unwrap_or(p.as_ref()).to_string()
        })
        .collect();
    matches.sort();
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            let path = dir.path().join(f);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, "x").unwrap();
        }
        dir
    }

    #[test]
    fn detects_glob_chars() {
        assert!(has_glob_chars("*.rs"));
        assert!(has_glob_chars("file?"));
        assert!(has_glob_chars("[ab]"));
        assert!(!has_glob_chars("plain.txt"));
    }

    #[test]
    fn star_sorted() {
        let dir = scratch(&["glob_b.txt", "glob_a.txt", "other.txt"]);
        assert_eq!(expand("glob_*.txt", dir.path()), vec!["glob_a.txt", "glob_b.txt"]);
    }

    #[test]
    fn question_and_class() {
        let dir = scratch(&["a1", "a2", "a3", "b1"]);
        assert_eq!(expand("a?", dir.path()), vec!["a1", "a2", "a3"]);
        assert_eq!(expand("[ab]1", dir.path()), vec!["a1", "b1"]);
        assert_eq!(expand("a[!1]", dir.path()), vec!["a2", "a3"]);
    }

    #[test]
    fn subdirectory_patterns_stay_relative() {
        let dir = scratch(&["src/main.rs", "src/lib.rs"]);
        assert_eq!(expand("src/*.rs", dir.path()), vec!["src/lib.rs", "src/main.rs"]);
    }

    #[test]
    fn dot_slash_prefix_kept() {
        let dir = scratch(&["a.txt", "b.txt", "sub/c.txt"]);
        assert_eq!(expand("./*.txt", dir.path()), vec!["./a.txt", "./b.txt"]);
        assert_eq!(expand("./sub/*.txt", dir.path()), vec!["./sub/c.txt"]);
        let sub = dir.path().join("sub");
        assert_eq!(expand("../*.txt", &sub), vec!["../a.txt", "../b.txt"]);
    }

    #[test]
    fn absolute_pattern() {
        let dir = scratch(&["x.log"]);
        let pattern = format!("{}/*.log", dir.path().display());
        assert_eq!(
            expand(&pattern, Path::new("/")),
            vec![dir.path().join("x.log").to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn hidden_files_need_literal_dot() {
        let dir = scratch(&[".hidden", "shown"]);
        assert_eq!(expand("*", dir.path()), vec!["shown"]);
        assert_eq!(expand(".h*", dir.path()), vec![".hidden"]);
    }

    #[test]
    fn no_match_is_empty() {
        let dir = scratch(&["a"]);
        assert!(expand("*.none", dir.path()).is_empty());
    }

    #[test]
    fn invalid_pattern_is_empty() {
        let dir = scratch(&["a"]);
        assert!(expand("[", dir.path()).is_empty());
    }

    #[test]
    fn cwd_with_metachars() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("we[ir]d*dir");
        fs::create_dir(&odd).unwrap();
        fs::write(odd.join("f.txt"), "").unwrap();
        assert_eq!(expand("*.txt", &odd), vec!["f.txt"]);
    }
}
