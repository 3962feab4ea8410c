//! The interface concrete language parsers implement. Parsers are the
//! sole producers of source files with fresh ids; the engine itself only
//! consumes them.

use camino::{Utf8Path, Utf8PathBuf};

use crate::context::ExecutionContext;
use crate::tree::SharedFile;

/// Raw input handed to a parser.
#[derive(Clone, Debug)]
pub struct Input {
    pub path: Utf8PathBuf,
    pub text: String,
}

impl Input {
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Turns raw inputs into source files.
pub trait Parser: Send + Sync {
    /// Parses each input into a source file, with paths relativized
    /// against `relative_to` when given. An input that fails to parse is
    /// reported through `ctx.on_error` and omitted from the result.
    fn parse_inputs(
        &self,
        inputs: &[Input],
        relative_to: Option<&Utf8Path>,
        ctx: &ExecutionContext,
    ) -> Vec<SharedFile>;

    /// Whether this parser handles the file at `path`.
    fn accept(&self, path: &Utf8Path) -> bool;
}
