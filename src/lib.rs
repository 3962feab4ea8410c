#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod context;
mod error;
mod executor;
mod hash;
mod marker;
mod metrics;
mod parser;
mod print;
mod recipe;
mod results;
mod scheduler;
mod text;
mod tree;
pub mod validate;
pub mod visitor;

pub use crate::context::{Dynamic, ExecutionContext, PANIC};
pub use crate::error::{ParseError, RecipeError, RuntimeError, SchedulerError};
pub use crate::executor::{Executor, Job, RayonExecutor, SequentialExecutor};
pub use crate::marker::{Generated, Marker, Markers, RecipeStack, RecipesThatMadeChanges};
pub use crate::metrics::{MetricsSink, NoopMetrics, TracingMetrics, VisitOutcome};
pub use crate::parser::{Input, Parser};
pub use crate::print::{PrintOutput, Printer, print_all};
pub use crate::recipe::{Recipe, SharedRecipe};
pub use crate::results::Change;
pub use crate::scheduler::RecipeScheduler;
pub use crate::text::{PlainText, PlainTextParser};
pub use crate::tree::{FileId, SharedFile, SourceFile};
pub use crate::validate::{Invalid, Validated};
pub use crate::visitor::{FileVisitor, SharedVisitor, VisitResult};
