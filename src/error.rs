use std::time::Duration;

use camino::Utf8PathBuf;
pub use anyhow::Error as RuntimeError;
use thiserror::Error;

/// Recoverable errors raised while a recipe runs. These never abort the
/// run; they are delivered to the execution context's error sink and the
/// affected files pass through unchanged.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("recipe '{recipe}' exceeded its visit deadline of {deadline:?}")]
    Timeout { recipe: String, deadline: Duration },
}

/// Raised by a parser for an input it could not turn into a source file.
/// The parser reports it through the error sink and omits the file from
/// the batch.
#[derive(Debug, Error)]
#[error("failed to parse '{path}': {message}")]
pub struct ParseError {
    pub path: Utf8PathBuf,
    pub message: String,
}

/// The only failures that propagate out of a run. Everything else is
/// contained and reported through the execution context.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A file came out of the run with an observably different form, yet
    /// carries no record of which recipe changed it.
    #[error("source file '{path}' changed but no recipe reported making a change")]
    MissingAttribution { path: Utf8PathBuf },

    /// The recipe composition reaches one of its own ancestors through
    /// `children()`, so a depth-first application would never terminate.
    #[error("recipe composition under '{recipe}' contains a cycle")]
    CyclicComposition { recipe: String },
}
