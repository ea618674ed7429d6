use super::types::{Operator, Quoting, Token, Word};
use crate::error::ShellError;

/// Characters a backslash escapes inside double quotes.
const DQ_ESCAPABLE: &[char] = &['$', '`', '"', '\\'];

/// Split a command line into words and operators,
/// respecting single/double quotes and backslash escapes.
///
/// `|`, `<`, `>`, `>>` and `&` are operators even without surrounding
/// whitespace, so `a>b` yields `a`, `>`, `b`. A `#` at the start of a word
/// comments out the rest of the line.
pub fn tokenize(line: &str) -> Result<Vec<Token>, ShellError> {
    let mut tokens = Vec::new();
    let mut word: Option<Word> = None;

    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let c = chars[i];

        if c.is_whitespace() {
            if let Some(w) = word.take() {
                tokens.push(Token::Word(w));
            }
            i += 1;
            continue;
        }

        if c == '#' && word.is_none() {
            break;
        }

        if c == '\\' {
            let Some(&next) = chars.get(i + 1) else {
                return Err(ShellError::syntax("unexpected end of line after '\\'"));
            };
            word.get_or_insert_with(Word::default)
                .push(next, Quoting::Escaped);
            i += 2;
            continue;
        }

        if c == '\'' {
            let w = word.get_or_insert_with(Word::default);
            let start = i;
            i += 1;
            let mut empty = true;
            while i < len && chars[i] != '\'' {
                w.push(chars[i], Quoting::Single);
                empty = false;
                i += 1;
            }
            if i == len {
                return Err(unterminated('\'', start));
            }
            if empty {
                w.push_empty(Quoting::Single);
            }
            i += 1; // closing '
            continue;
        }

        if c == '"' {
            let w = word.get_or_insert_with(Word::default);
            let start = i;
            i += 1;
            let mut empty = true;
            while i < len && chars[i] != '"' {
                let mut dc = chars[i];
                if dc == '\\' && i + 1 < len && DQ_ESCAPABLE.contains(&chars[i + 1]) {
                    i += 1;
                    dc = chars[i];
                    // An escaped `$` must not start an expansion later.
                    if dc == '$' {
                        w.push(dc, Quoting::Escaped);
                        empty = false;
                        i += 1;
                        continue;
                    }
                }
                w.push(dc, Quoting::Double);
                empty = false;
                i += 1;
            }
            if i == len {
                return Err(unterminated('"', start));
            }
            if empty {
                w.push_empty(Quoting::Double);
            }
            i += 1; // closing "
            continue;
        }

        let op = match c {
            '>' if chars.get(i + 1) == Some(&'>') => Some((Operator::Append, 2)),
            '>' => Some((Operator::Output, 1)),
            '<' => Some((Operator::Input, 1)),
            '|' => Some((Operator::Pipe, 1)),
            '&' => Some((Operator::Background, 1)),
            _ => None,
        };
        if let Some((op, width)) = op {
            if let Some(w) = word.take() {
                tokens.push(Token::Word(w));
            }
            tokens.push(Token::Op(op));
            i += width;
            continue;
        }

        word.get_or_insert_with(Word::default)
            .push(c, Quoting::Unquoted);
        i += 1;
    }

    if let Some(w) = word.take() {
        tokens.push(Token::Word(w));
    }

    Ok(tokens)
}

fn unterminated(quote: char, at: usize) -> ShellError {
    ShellError::syntax(format!("unterminated {quote} quote starting at column {}", at + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::WordPart;

    /// Tokens rendered as plain strings; operators keep their syntax.
    fn flat(line: &str) -> Vec<String> {
        tokenize(line)
            .unwrap()
            .into_iter()
            .map(|t| match t {
                Token::Word(w) => w.literal(),
                Token::Op(op) => op.as_str().to_string(),
            })
            .collect()
    }

    #[test]
    fn tokenize_simple() {
        assert_eq!(flat("ls -la /tmp"), vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn tokenize_blank() {
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn tokenize_quoted() {
        assert_eq!(flat("echo 'hello world'"), vec!["echo", "hello world"]);
    }

    #[test]
    fn tokenize_double_quoted() {
        assert_eq!(flat("echo \"hello world\""), vec!["echo", "hello world"]);
    }

    #[test]
    fn tokenize_adjacent_spans_form_one_word() {
        assert_eq!(flat("a\"b c\"'d'"), vec!["ab cd"]);
    }

    #[test]
    fn tokenize_operators_without_spaces() {
        assert_eq!(flat("a>b"), vec!["a", ">", "b"]);
        assert_eq!(flat("cat<in|wc>>out&"), vec!["cat", "<", "in", "|", "wc", ">>", "out", "&"]);
    }

    #[test]
    fn tokenize_quoted_operator_is_literal() {
        assert_eq!(flat("echo 'a | b' \"c > d\""), vec!["echo", "a | b", "c > d"]);
    }

    #[test]
    fn tokenize_backslash_escapes() {
        assert_eq!(flat("echo a\\ b"), vec!["echo", "a b"]);
        assert_eq!(flat("echo \\|"), vec!["echo", "|"]);
    }

    #[test]
    fn tokenize_double_quote_keeps_unknown_escapes() {
        assert_eq!(flat(r#"echo -e "apple\nbanana""#), vec!["echo", "-e", r"apple\nbanana"]);
        assert_eq!(flat(r#"echo "say \"hi\"""#), vec!["echo", "say \"hi\""]);
    }

    #[test]
    fn tokenize_records_quoting() {
        let tokens = tokenize("'$A'\"$B\"$C").unwrap();
        let Token::Word(w) = &tokens[0] else {
            panic!("expected word");
        };
        assert_eq!(
            w.parts,
            vec![
                WordPart { text: "$A".into(), quoting: Quoting::Single },
                WordPart { text: "$B".into(), quoting: Quoting::Double },
                WordPart { text: "$C".into(), quoting: Quoting::Unquoted },
            ]
        );
    }

    #[test]
    fn tokenize_escaped_dollar_in_double_quotes() {
        let tokens = tokenize(r#""\$HOME""#).unwrap();
        let Token::Word(w) = &tokens[0] else {
            panic!("expected word");
        };
        assert_eq!(w.parts[0].quoting, Quoting::Escaped);
        assert_eq!(w.literal(), "$HOME");
    }

    #[test]
    fn tokenize_empty_quotes_make_a_word() {
        let tokens = tokenize("echo ''").unwrap();
        assert_eq!(tokens.len(), 2);
        let Token::Word(w) = &tokens[1] else {
            panic!("expected word");
        };
        assert!(w.is_quoted());
        assert_eq!(w.literal(), "");
    }

    #[test]
    fn tokenize_comment() {
        assert_eq!(flat("echo hi # ignored | x"), vec!["echo", "hi"]);
        assert_eq!(flat("echo a#b"), vec!["echo", "a#b"]);
        assert!(tokenize("# whole line").unwrap().is_empty());
    }

    #[test]
    fn tokenize_unterminated_single() {
        assert!(matches!(tokenize("echo 'oops"), Err(ShellError::Syntax(_))));
    }

    #[test]
    fn tokenize_unterminated_double() {
        assert!(matches!(tokenize("echo \"oops"), Err(ShellError::Syntax(_))));
    }

    #[test]
    fn tokenize_trailing_backslash() {
        assert!(matches!(tokenize("echo \\"), Err(ShellError::Syntax(_))));
    }
}
