pub mod pipeline;
pub mod tokenize;
pub mod types;

pub use pipeline::parse;
pub use tokenize::tokenize;
pub use types::{
    Expanded, Operator, OutputMode, OutputRedirect, Pipeline, Program, Quoting, Stage, Token,
    Word, WordPart,
};
