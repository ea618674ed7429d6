use std::path::PathBuf;

use super::types::{Expanded, Operator, OutputMode, OutputRedirect, Pipeline, Program, Stage};
use crate::builtins::Builtin;
use crate::error::ShellError;

/// A stage under construction.
#[derive(Default)]
struct StageBuilder {
    argv: Vec<String>,
    input: Option<PathBuf>,
    output: Option<OutputRedirect>,
}

/// Group expanded tokens into a pipeline.
///
/// Splits at `|`, pulls `<`, `>` and `>>` with their targets out of each
/// stage's argv, and accepts a single trailing `&`. Returns `Ok(None)` when
/// the line holds no tokens at all.
pub fn parse(tokens: Vec<Expanded>) -> Result<Option<Pipeline>, ShellError> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut builders = Vec::new();
    let mut current = StageBuilder::default();
    let mut background = false;
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        if background {
            return Err(ShellError::syntax("unexpected token after '&'"));
        }
        match token {
            Expanded::Words(words) => current.argv.extend(words),
            Expanded::Op(Operator::Pipe) => {
                if current.argv.is_empty() {
                    return Err(ShellError::syntax("unexpected '|'"));
                }
                builders.push(std::mem::take(&mut current));
            }
            Expanded::Op(Operator::Background) => {
                if current.argv.is_empty() {
                    return Err(ShellError::syntax("unexpected '&'"));
                }
                background = true;
            }
            Expanded::Op(op @ (Operator::Input | Operator::Output | Operator::Append)) => {
                let target = redirection_target(op, iter.next())?;
                match op {
                    Operator::Input => current.input = Some(target),
                    Operator::Append => {
                        current.output = Some(OutputRedirect {
                            path: target,
                            mode: OutputMode::Append,
                        })
                    }
                    _ => {
                        current.output = Some(OutputRedirect {
                            path: target,
                            mode: OutputMode::Truncate,
                        })
                    }
                }
            }
        }
    }
    builders.push(current);

    let count = builders.len();
    let mut stages = Vec::with_capacity(count);
    for (i, builder) in builders.into_iter().enumerate() {
        if builder.argv.is_empty() {
            return Err(ShellError::syntax(if i + 1 == count && count > 1 {
                "unexpected end of line after '|'"
            } else {
                "missing command"
            }));
        }
        if builder.input.is_some() && i > 0 {
            return Err(ShellError::syntax(
                "input redirection is only allowed on the first command of a pipeline",
            ));
        }
        if builder.output.is_some() && i + 1 < count {
            return Err(ShellError::syntax(
                "output redirection is only allowed on the last command of a pipeline",
            ));
        }

        // Built-ins mutate shell state, so they only run in-process when alone.
        let program = match Builtin::from_name(&builder.argv[0]) {
            Some(builtin) if count == 1 => Program::Builtin(builtin),
            _ => Program::External(builder.argv[0].clone()),
        };

        stages.push(Stage {
            program,
            argv: builder.argv,
            input: builder.input,
            output: builder.output,
        });
    }

    Ok(Some(Pipeline { stages, background }))
}

/// The single word following a redirection operator.
fn redirection_target(op: Operator, next: Option<Expanded>) -> Result<PathBuf, ShellError> {
    match next {
        Some(Expanded::Words(mut words)) if words.len() == 1 => {
            Ok(PathBuf::from(words.remove(0)))
        }
        Some(Expanded::Words(_)) => Err(ShellError::syntax(format!(
            "ambiguous redirect after '{}'",
            op.as_str()
        ))),
        Some(Expanded::Op(found)) => Err(ShellError::syntax(format!(
            "expected filename after '{}', found '{}'",
            op.as_str(),
            found.as_str()
        ))),
        None => Err(ShellError::syntax(format!(
            "expected filename after '{}'",
            op.as_str()
        ))),
    }
}
