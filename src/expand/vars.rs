use crate::error::ShellError;
use crate::state::ShellState;

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace `$NAME`, `${NAME}`, `$?` and `$$` in `text`.
///
/// Undefined names expand to the empty string. A `$` that does not start a
/// reference is kept as-is.
pub fn substitute(text: &str, state: &ShellState) -> Result<String, ShellError> {
    if !text.contains('$') {
        return Ok(text.to_string());
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < len {
        let c = chars[i];
        if c != '$' || i + 1 == len {
            out.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        match next {
            '?' => {
                out.push_str(&state.last_status().to_string());
                i += 2;
            }
            '$' => {
                out.push_str(&std::process::id().to_string());
                i += 2;
            }
            '{' => {
                let start = i + 2;
                let Some(close) = chars[start..].iter().position(|&c| c == '}') else {
                    return Err(ShellError::syntax("missing '}' in ${...}"));
                };
                let name: String = chars[start..start + close].iter().collect();
                if name == "?" {
                    out.push_str(&state.last_status().to_string());
                } else if !name.starts_with(is_name_start) || !name.chars().all(is_name_char) {
                    return Err(ShellError::syntax(format!("${{{name}}}: bad substitution")));
                } else {
                    out.push_str(&state.var(&name).unwrap_or_default());
                }
                i = start + close + 1;
            }
            c if is_name_start(c) => {
                let start = i + 1;
                let mut end = start;
                while end < len && is_name_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                out.push_str(&state.var(&name).unwrap_or_default());
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}
