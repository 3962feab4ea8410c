//! Per-file traversal contract. A visitor either returns the handle it
//! received (no edit), a new handle (an edit), `None` (delete the file),
//! or an error, which the scheduler contains.

use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::tree::SharedFile;

/// Outcome of one visit: `Some` with the same handle means unchanged,
/// `Some` with a new handle means edited, `None` means deleted.
pub type VisitResult = anyhow::Result<Option<SharedFile>>;

pub type SharedVisitor = Arc<dyn FileVisitor>;

/// A traversal over one source file.
///
/// Visitors are stateless with respect to the current traversal except
/// through the context, and must keep the file id stable: an edited file
/// carries the id of its input.
pub trait FileVisitor: Send + Sync {
    fn visit(&self, file: &SharedFile, ctx: &ExecutionContext) -> VisitResult;
}

/// Visitor that never edits anything.
pub struct Noop;

impl FileVisitor for Noop {
    fn visit(&self, file: &SharedFile, _ctx: &ExecutionContext) -> VisitResult {
        Ok(Some(file.clone()))
    }
}

/// Wraps a closure as a visitor.
pub fn from_fn<F>(f: F) -> SharedVisitor
where
    F: Fn(&SharedFile, &ExecutionContext) -> VisitResult + Send + Sync + 'static,
{
    struct FnVisitor<F>(F);

    impl<F> FileVisitor for FnVisitor<F>
    where
        F: Fn(&SharedFile, &ExecutionContext) -> VisitResult + Send + Sync,
    {
        fn visit(&self, file: &SharedFile, ctx: &ExecutionContext) -> VisitResult {
            (self.0)(file, ctx)
        }
    }

    Arc::new(FnVisitor(f))
}
