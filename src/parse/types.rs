//! Types produced by the tokenizer and parser and consumed by the executor.

use std::path::PathBuf;

use crate::builtins::Builtin;

/// Shell operator recognized by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `|`: pipe stdout into the next stage
    Pipe,
    /// `<`: read stdin from a file
    Input,
    /// `>`: write stdout to a file, truncating it
    Output,
    /// `>>`: append stdout to a file
    Append,
    /// `&`: run the pipeline in the background
    Background,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Pipe => "|",
            Operator::Input => "<",
            Operator::Output => ">",
            Operator::Append => ">>",
            Operator::Background => "&",
        }
    }
}

/// How a span of a word was quoted in the source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    Unquoted,
    /// `'...'`: fully literal.
    Single,
    /// `"..."`: literal except for `$` expansion.
    Double,
    /// A single character preceded by a backslash outside quotes.
    Escaped,
}

impl Quoting {
    /// Whether `$` substitution applies to text with this quoting.
    pub fn expands_variables(self) -> bool {
        matches!(self, Quoting::Unquoted | Quoting::Double)
    }
}

/// A run of characters within a word that share the same quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPart {
    pub text: String,
    pub quoting: Quoting,
}

/// A whitespace-delimited word, possibly stitched from differently quoted spans.
///
/// `a"b c"'d'` is one word of three parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Word {
    pub parts: Vec<WordPart>,
}

impl Word {
    /// Append text, merging with the previous part when the quoting matches.
    pub fn push(&mut self, c: char, quoting: Quoting) {
        match self.parts.last_mut() {
            Some(last) if last.quoting == quoting => last.text.push(c),
            _ => self.parts.push(WordPart {
                text: c.to_string(),
                quoting,
            }),
        }
    }

    /// Record an empty quoted span (`""` or `''`) so the word survives expansion.
    pub fn push_empty(&mut self, quoting: Quoting) {
        self.parts.push(WordPart {
            text: String::new(),
            quoting,
        });
    }

    /// Whether any span of the word was quoted or escaped.
    pub fn is_quoted(&self) -> bool {
        self.parts.iter().any(|p| p.quoting != Quoting::Unquoted)
    }

    /// The word's text with quoting removed and nothing expanded.
    pub fn literal(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// A lexical unit of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Word),
    Op(Operator),
}

/// A token after variable, tilde and glob expansion.
///
/// One source word may expand to zero words (an empty unquoted variable),
/// one word, or many (a glob).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expanded {
    Words(Vec<String>),
    Op(Operator),
}

/// What a stage runs, decided once by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// Runs inside the shell process.
    Builtin(Builtin),
    /// Looked up on `PATH` and spawned.
    External(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Truncate,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub path: PathBuf,
    pub mode: OutputMode,
}

/// A single command within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub program: Program,
    /// Argument vector; `argv[0]` is the command name.
    pub argv: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<OutputRedirect>,
}

impl Stage {
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// One or more stages, each stage's stdout feeding the next stage's stdin.
///
/// Only the first stage carries an input redirection and only the last
/// carries an output redirection; the parser rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    pub background: bool,
}

impl Pipeline {
    /// Render the pipeline back into a single display line (for `jobs` and logs).
    pub fn display(&self) -> String {
        let mut out = Vec::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                out.push(Operator::Pipe.as_str().to_string());
            }
            let words = stage.argv.iter().map(String::as_str);
            out.push(shlex::try_join(words).unwrap_or_else(|_| stage.argv.join(" ")));
            if let Some(input) = &stage.input {
                out.push(format!("< {}", input.display()));
            }
            if let Some(output) = &stage.output {
                let op = match output.mode {
                    OutputMode::Truncate => Operator::Output,
                    OutputMode::Append => Operator::Append,
                };
                out.push(format!("{} {}", op.as_str(), output.path.display()));
            }
        }
        if self.background {
            out.push(Operator::Background.as_str().to_string());
        }
        out.join(" ")
    }
}
