//! Drives a recipe composition over a batch of files: cycles until a
//! fixed point, fans per-file visits out on the executor, composes child
//! recipes through an explicit recipe stack, and keeps the bookkeeping
//! needed to attribute every change, generation, and deletion.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::context::{Dynamic, ExecutionContext, MessageWatch};
use crate::error::{RecipeError, RuntimeError, SchedulerError};
use crate::executor::{Executor, Job, RayonExecutor};
use crate::marker::{RecipeStack, RecipesThatMadeChanges};
use crate::metrics::{MetricsSink, TracingMetrics, VisitOutcome};
use crate::recipe::{Recipe, SharedRecipe};
use crate::results::{self, Change};
use crate::tree::{FileId, SharedFile, SourceFile};
use crate::validate;
use crate::visitor::FileVisitor;

/// Recipe stacks recorded against file ids: who deleted a file, and who
/// generated a file that did not exist before. Written concurrently from
/// per-file visits; collisions across visits resolve last-writer-wins.
type DeletionMap = DashMap<FileId, RecipeStack>;

/// Applies recipe compositions to file batches.
pub struct RecipeScheduler {
    executor: Arc<dyn Executor>,
    metrics: Arc<dyn MetricsSink>,
}

impl Default for RecipeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeScheduler {
    pub fn new() -> Self {
        Self {
            executor: Arc::new(RayonExecutor),
            metrics: Arc::new(TracingMetrics),
        }
    }

    /// Replaces the executor, e.g. with a sequential one in tests.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Runs `recipe` over `before` for up to `max_cycles` passes and
    /// reports every observable difference between the input batch and
    /// the final batch.
    ///
    /// A pass beyond the first happens only while the previous pass
    /// produced a new file reference or wrote a context message, and the
    /// recipe declares it may cause another cycle; `min_cycles` forces
    /// passes regardless.
    pub fn run(
        &self,
        recipe: &SharedRecipe,
        before: &[SharedFile],
        ctx: &ExecutionContext,
        max_cycles: usize,
        min_cycles: usize,
    ) -> Result<Vec<Change>, SchedulerError> {
        if !validate::acyclic(recipe).is_valid() {
            return Err(SchedulerError::CyclicComposition {
                recipe: recipe.display_name().to_string(),
            });
        }

        self.metrics.recipe_run(recipe.display_name(), before.len());

        let deleted_by = DeletionMap::new();
        let mut acc: Vec<SharedFile> = before.to_vec();
        let mut after = acc.clone();
        let mut watch = MessageWatch::new(ctx);
        let mut cycles = 0;

        for i in 0..max_cycles {
            let stack = RecipeStack::root(recipe.clone());
            after = self.visit(&stack, acc.clone(), ctx, &deleted_by);
            cycles = i + 1;

            if i + 1 >= min_cycles
                && ((same_files(&after, &acc) && !watch.has_new_messages(ctx))
                    || !recipe.causes_another_cycle())
            {
                break;
            }

            acc = after.clone();
            watch.reset(ctx);
        }

        tracing::info!(
            recipe = recipe.display_name(),
            files = before.len(),
            cycles,
            "recipe run complete"
        );

        if same_files(&after, before) {
            return Ok(Vec::new());
        }

        results::build(before, &after, &deleted_by)
    }

    /// Order-preserving parallel map: every element is computed as an
    /// independent job on the executor and results are assembled
    /// positionally.
    pub fn map_async<T, U, F>(&self, input: &[T], map_fn: F) -> Vec<U>
    where
        T: Clone + Send + Sync,
        U: Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync,
    {
        let map_fn = &map_fn;
        let jobs: Vec<Job> = input
            .iter()
            .map(|item| {
                let item = item.clone();
                Box::new(move || -> Dynamic { Arc::new(map_fn(item)) }) as Job
            })
            .collect();

        self.executor
            .run_all(jobs)
            .into_iter()
            .map(|result| {
                // Each result slot holds exactly the value its job built;
                // a mismatch is a defect in the executor implementation.
                let result = result
                    .downcast::<U>()
                    .expect("executor returned a result of the wrong type");
                Arc::try_unwrap(result)
                    .ok()
                    .expect("executor kept a reference to a job result")
            })
            .collect()
    }

    /// Applies the recipe on top of `stack` to the batch, then recurses
    /// into its children, threading the accumulated batch through.
    fn visit(
        &self,
        stack: &RecipeStack,
        before: Vec<SharedFile>,
        ctx: &ExecutionContext,
        deleted_by: &DeletionMap,
    ) -> Vec<SharedFile> {
        let started = Instant::now();
        let timeout_reported = AtomicBool::new(false);
        let recipe = stack.top().clone();

        let span = tracing::debug_span!("recipe_visit", recipe = recipe.display_name());
        let _enter = span.enter();

        if let Some(test) = recipe.applicable_test() {
            let applicable = before.iter().any(|s| probe_edits(&*test, s, ctx));
            if !applicable {
                return before;
            }
        }

        let after: Vec<SharedFile> = if !recipe.validate(ctx).is_valid() {
            before
        } else {
            let deadline = ctx.run_timeout(before.len());
            let applied: Vec<Option<SharedFile>> = self.map_async(&before, |s| {
                self.apply_one(
                    &recipe,
                    stack,
                    s,
                    ctx,
                    started,
                    deadline,
                    &timeout_reported,
                    deleted_by,
                )
            });
            applied.into_iter().flatten().collect()
        };

        // Whole-batch step. The batch may be widened here with files of a
        // language that was not in the input set at all.
        let widened = match recipe.visit(&after, ctx) {
            None => after,
            Some(widened) => {
                let mut original_by_id: HashMap<FileId, SharedFile> =
                    HashMap::with_capacity(after.len());
                for file in &after {
                    original_by_id.insert(file.id(), file.clone());
                }

                let widened: Vec<SharedFile> = widened
                    .into_iter()
                    .map(|file| match original_by_id.get(&file.id()) {
                        None => {
                            // Freshly generated; the deletion map doubles
                            // as the generation-attribution map.
                            deleted_by.insert(file.id(), stack.clone());
                            file
                        }
                        Some(original) if !Arc::ptr_eq(original, &file) => {
                            let markers = file
                                .markers()
                                .compute(RecipesThatMadeChanges::new(stack.clone()));
                            file.with_markers(markers)
                        }
                        Some(_) => file,
                    })
                    .collect();

                for maybe_deleted in &after {
                    if !widened.iter().any(|w| Arc::ptr_eq(w, maybe_deleted)) {
                        deleted_by.insert(maybe_deleted.id(), stack.clone());
                    }
                }

                widened
            }
        };

        let mut files = widened;
        for child in recipe.children() {
            if ctx.is_panicked() {
                return files;
            }
            files = self.visit(&stack.push(child), files, ctx, deleted_by);
        }
        files
    }

    /// One concurrent per-file application. `None` removes the file from
    /// the batch.
    #[allow(clippy::too_many_arguments)]
    fn apply_one(
        &self,
        recipe: &SharedRecipe,
        stack: &RecipeStack,
        source: SharedFile,
        ctx: &ExecutionContext,
        started: Instant,
        deadline: Duration,
        timeout_reported: &AtomicBool,
        deleted_by: &DeletionMap,
    ) -> Option<SharedFile> {
        let name = recipe.display_name();
        let visit_started = Instant::now();

        if let Some(test) = recipe.single_source_applicable_test() {
            match test.visit(&source, ctx) {
                Ok(Some(out)) if Arc::ptr_eq(&out, &source) => {
                    self.metrics
                        .recipe_visit(name, VisitOutcome::Skipped, visit_started.elapsed());
                    return Some(source);
                }
                Err(err) => {
                    ctx.on_error(&err);
                    self.metrics
                        .recipe_visit(name, VisitOutcome::Skipped, visit_started.elapsed());
                    return Some(source);
                }
                _ => {}
            }
        }

        // The deadline covers the whole visit, not one file. The first
        // task past it reports, every later task short-circuits quietly.
        if started.elapsed() > deadline {
            if timeout_reported
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                let err = RuntimeError::new(RecipeError::Timeout {
                    recipe: name.to_string(),
                    deadline,
                });
                ctx.on_error(&err);
                ctx.on_timeout(&err);
            }
            self.metrics
                .recipe_visit(name, VisitOutcome::Timeout, visit_started.elapsed());
            return Some(source);
        }

        if ctx.is_panicked() {
            return Some(source);
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| recipe.visitor().visit(&source, ctx)));

        match outcome {
            Ok(Ok(Some(after))) if Arc::ptr_eq(&after, &source) => {
                self.metrics
                    .recipe_visit(name, VisitOutcome::Unchanged, visit_started.elapsed());
                Some(after)
            }
            Ok(Ok(Some(after))) => {
                debug_assert_eq!(
                    after.id(),
                    source.id(),
                    "a visit must carry the file id forward"
                );
                let markers = after
                    .markers()
                    .compute(RecipesThatMadeChanges::new(stack.clone()));
                self.metrics
                    .recipe_visit(name, VisitOutcome::Changed, visit_started.elapsed());
                Some(after.with_markers(markers))
            }
            Ok(Ok(None)) => {
                deleted_by.insert(source.id(), stack.clone());
                self.metrics
                    .recipe_visit(name, VisitOutcome::Deleted, visit_started.elapsed());
                None
            }
            Ok(Err(err)) => {
                ctx.on_error(&err);
                self.metrics
                    .recipe_visit(name, VisitOutcome::Error, visit_started.elapsed());
                Some(source)
            }
            Err(payload) => {
                ctx.on_error(&panic_error(payload));
                self.metrics
                    .recipe_visit(name, VisitOutcome::Error, visit_started.elapsed());
                Some(source)
            }
        }
    }
}

/// Whether two batches hold the same file handles in the same order.
fn same_files(a: &[SharedFile], b: &[SharedFile]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
}

/// Whether an applicability probe edits `file`. Probe failures are
/// contained like any visitor error and read as "no edit".
fn probe_edits(test: &dyn FileVisitor, file: &SharedFile, ctx: &ExecutionContext) -> bool {
    match test.visit(file, ctx) {
        Ok(Some(out)) => !Arc::ptr_eq(&out, file),
        Ok(None) => true,
        Err(err) => {
            ctx.on_error(&err);
            false
        }
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> RuntimeError {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        format!("visitor panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("visitor panicked: {s}")
    } else {
        String::from("visitor panicked with unknown payload")
    };

    anyhow::anyhow!(msg)
}
