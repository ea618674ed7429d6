//! Word expansion: tilde, variables, then filename globbing.
//!
//! Each source word becomes zero or more argument words. Quoting decides what
//! applies: single-quoted and escaped text is literal, double-quoted text gets
//! `$` substitution only, unquoted text gets everything. Variable values land
//! in unquoted position as-is, so a value containing `*` is globbed.

pub mod glob;
pub mod vars;

use ::glob::Pattern;

use crate::error::ShellError;
use crate::parse::{Expanded, Quoting, Token, Word};
use crate::state::ShellState;

/// Expand every word token; operators pass through.
pub fn expand(tokens: Vec<Token>, state: &ShellState) -> Result<Vec<Expanded>, ShellError> {
    tokens
        .into_iter()
        .map(|token| match token {
            Token::Word(word) => expand_word(&word, state).map(Expanded::Words),
            Token::Op(op) => Ok(Expanded::Op(op)),
        })
        .collect()
}

/// Expand one word into argument words.
///
/// A glob with no matches passes through as the literal word. A purely
/// unquoted word that expands to nothing is dropped.
pub fn expand_word(word: &Word, state: &ShellState) -> Result<Vec<String>, ShellError> {
    let mut literal = String::new();
    let mut pattern = String::new();
    let mut globbable = false;

    for (idx, part) in word.parts.iter().enumerate() {
        let mut text = part.text.as_str();

        if idx == 0 && part.quoting == Quoting::Unquoted && (text == "~" || text.starts_with("~/"))
        {
            let split = text.find('/').unwrap_or(text.len());
            let home = shellexpand::tilde_with_context(&text[..split], || state.var("HOME"));
            literal.push_str(&home);
            pattern.push_str(&Pattern::escape(&home));
            text = &text[split..];
        }

        let value = if part.quoting.expands_variables() {
            vars::substitute(text, state)?
        } else {
            text.to_string()
        };

        literal.push_str(&value);
        if part.quoting == Quoting::Unquoted {
            globbable |= glob::has_glob_chars(&value);
            pattern.push_str(&value);
        } else {
            pattern.push_str(&Pattern::escape(&value));
        }
    }

    if globbable {
        let matches = glob::expand(&pattern, state.cwd());
        if !matches.is_empty() {
            return Ok(matches);
        }
    }

    if literal.is_empty() && !word.is_quoted() {
        return Ok(Vec::new());
    }
    Ok(vec![literal])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{Operator, tokenize};
    use std::fs;

    fn words(line: &str, state: &ShellState) -> Vec<String> {
        expand(tokenize(line).unwrap(), state)
            .unwrap()
            .into_iter()
            .flat_map(|e| match e {
                Expanded::Words(w) => w,
                Expanded::Op(op) => vec![op.as_str().to_string()],
            })
            .collect()
    }

    fn scratch_state(files: &[&str]) -> (tempfile::TempDir, ShellState) {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            fs::write(dir.path().join(f), "").unwrap();
        }
        let state = ShellState::new(dir.path());
        (dir, state)
    }

    #[test]
    fn variable_round_trip() {
        let mut state = ShellState::new("/");
        state.export("MYTEST", "awesome");
        assert_eq!(words("echo $MYTEST", &state), vec!["echo", "awesome"]);
    }

    #[test]
    fn single_quotes_suppress_variables() {
        let mut state = ShellState::new("/");
        state.export("X", "1");
        assert_eq!(words("echo '$X' \"$X\"", &state), vec!["echo", "$X", "1"]);
    }

    #[test]
    fn unset_variable_word_dropped() {
        let state = ShellState::new("/");
        assert_eq!(
            words("echo $TSH_TEST_SURELY_UNDEFINED_VAR end", &state),
            vec!["echo", "end"]
        );
    }

    #[test]
    fn quoted_empty_variable_kept() {
        let state = ShellState::new("/");
        assert_eq!(
            words("echo \"$TSH_TEST_SURELY_UNDEFINED_VAR\"", &state),
            vec!["echo", ""]
        );
    }

    #[test]
    fn variable_value_is_not_split() {
        let mut state = ShellState::new("/");
        state.export("V", "a b");
        assert_eq!(words("echo $V", &state), vec!["echo", "a b"]);
    }

    #[test]
    fn glob_expands_sorted() {
        let (_dir, state) = scratch_state(&["glob_b.txt", "glob_a.txt"]);
        assert_eq!(
            words("echo glob_*.txt", &state),
            vec!["echo", "glob_a.txt", "glob_b.txt"]
        );
    }

    #[test]
    fn dot_slash_glob_keeps_prefix() {
        let (_dir, state) = scratch_state(&["a.txt"]);
        assert_eq!(words("ls ./*.txt", &state), vec!["ls", "./a.txt"]);
    }

    #[test]
    fn glob_no_match_passes_through() {
        let (_dir, state) = scratch_state(&["a.txt"]);
        assert_eq!(words("ls *.none", &state), vec!["ls", "*.none"]);
    }

    #[test]
    fn quoted_glob_is_literal() {
        let (_dir, state) = scratch_state(&["a.txt"]);
        assert_eq!(words("echo '*.txt' \\*.txt", &state), vec!["echo", "*.txt", "*.txt"]);
    }

    #[test]
    fn mixed_quoting_escapes_quoted_part() {
        let (_dir, state) = scratch_state(&["a*b.txt", "axb.txt"]);
        assert_eq!(words("echo a'*'b.*", &state), vec!["echo", "a*b.txt"]);
    }

    #[test]
    fn variable_before_glob() {
        let (_dir, mut state) = scratch_state(&["one.log", "two.log"]);
        state.export("PAT", "*.log");
        assert_eq!(words("echo $PAT", &state), vec!["echo", "one.log", "two.log"]);
        // Quoted expansion stays literal.
        assert_eq!(words("echo \"$PAT\"", &state), vec!["echo", "*.log"]);
    }

    #[test]
    fn tilde_uses_home() {
        let mut state = ShellState::new("/");
        state.export("HOME", "/home/tester");
        assert_eq!(
            words("ls ~ ~/src '~' a~", &state),
            vec!["ls", "/home/tester", "/home/tester/src", "~", "a~"]
        );
    }

    #[test]
    fn status_variable() {
        let mut state = ShellState::new("/");
        state.set_last_status(2);
        assert_eq!(words("echo $?", &state), vec!["echo", "2"]);
    }

    #[test]
    fn operators_pass_through() {
        let state = ShellState::new("/");
        let out = expand(tokenize("a | b").unwrap(), &state).unwrap();
        assert_eq!(out[1], Expanded::Op(Operator::Pipe));
    }

    #[test]
    fn redirect_target_glob_can_be_ambiguous() {
        let (_dir, state) = scratch_state(&["x1", "x2"]);
        let out = expand(tokenize("echo > x*").unwrap(), &state).unwrap();
        assert_eq!(out[2], Expanded::Words(vec!["x1".into(), "x2".into()]));
    }
}
