//! The unit of transformation. A recipe bundles a per-file visitor with
//! optional applicability probes, a whole-batch step, and child recipes,
//! forming a composition tree the scheduler walks depth-first.

use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::tree::SharedFile;
use crate::validate::Validated;
use crate::visitor::{Noop, SharedVisitor};

pub type SharedRecipe = Arc<dyn Recipe>;

/// A composable transformation over source files.
///
/// Only `display_name` is required; every hook defaults to "do nothing".
/// Attribution and cycle detection identify recipes by instance, so
/// `children` must hand out the same child instances on every call.
pub trait Recipe: Send + Sync + 'static {
    /// Human-readable name used in reports, metrics, and errors.
    fn display_name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Checked once per visit. An invalid recipe is not an error: its
    /// per-file step is skipped for the run, but its children still run.
    fn validate(&self, _ctx: &ExecutionContext) -> Validated {
        Validated::valid()
    }

    /// Whole-batch applicability probe. When present, the recipe and its
    /// children run only if this visitor edits at least one input file.
    fn applicable_test(&self) -> Option<SharedVisitor> {
        None
    }

    /// Per-file applicability probe. When present, a file whose probe
    /// returns it unchanged is skipped by this recipe's per-file step.
    fn single_source_applicable_test(&self) -> Option<SharedVisitor> {
        None
    }

    /// The edit applied to each file.
    fn visitor(&self) -> SharedVisitor {
        Arc::new(Noop)
    }

    /// Whole-batch step, able to add, replace, or remove files. `None`
    /// means the batch is unchanged; `Some` is the replacement batch,
    /// which may contain files of a language not present in the input.
    fn visit(&self, _files: &[SharedFile], _ctx: &ExecutionContext) -> Option<Vec<SharedFile>> {
        None
    }

    /// Sub-recipes, applied after this recipe in declared order.
    fn children(&self) -> Vec<SharedRecipe> {
        Vec::new()
    }

    /// Whether a change made by this composition can require the whole
    /// composition to run again over the batch.
    fn causes_another_cycle(&self) -> bool {
        false
    }
}
