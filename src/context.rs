//! Per-run scratchpad shared by every visit: a type-erased message map
//! recipes use to talk across cycles, the error and timeout sinks, the
//! deadline policy, and the cooperative stop flag.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

use crate::error::RuntimeError;

/// A type-erased, thread-safe value stored in the message map.
pub type Dynamic = Arc<dyn Any + Send + Sync>;

/// Message key of the cooperative stop flag. Any code observing it
/// returns promptly with its current input.
pub const PANIC: &str = "kanna.panic";

const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

type ErrorSink = Box<dyn Fn(&RuntimeError) + Send + Sync>;
type TimeoutSink = Box<dyn Fn(&RuntimeError, &ExecutionContext) + Send + Sync>;
type TimeoutPolicy = Box<dyn Fn(usize) -> Duration + Send + Sync>;

/// State shared by all visits of a single run.
///
/// Contexts are cheap to configure and live exactly as long as one run.
/// All methods take `&self`; message writes are visible across the worker
/// threads of the run.
pub struct ExecutionContext {
    messages: DashMap<String, Dynamic>,
    epoch: AtomicU64,
    error_sink: ErrorSink,
    timeout_sink: TimeoutSink,
    timeout_policy: TimeoutPolicy,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            messages: DashMap::new(),
            epoch: AtomicU64::new(0),
            error_sink: Box::new(|err: &RuntimeError| {
                tracing::error!(error = %err, "recipe execution error");
            }),
            timeout_sink: Box::new(|_, _| {}),
            timeout_policy: Box::new(|_| DEFAULT_RUN_TIMEOUT),
        }
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the error sink invoked for every contained error.
    pub fn with_on_error(
        mut self,
        sink: impl Fn(&RuntimeError) + Send + Sync + 'static,
    ) -> Self {
        self.error_sink = Box::new(sink);
        self
    }

    /// Replaces the sink invoked once per timed-out recipe visit, after
    /// the error sink.
    pub fn with_on_timeout(
        mut self,
        sink: impl Fn(&RuntimeError, &ExecutionContext) + Send + Sync + 'static,
    ) -> Self {
        self.timeout_sink = Box::new(sink);
        self
    }

    /// Replaces the deadline policy. The policy receives the batch size
    /// and returns the wall-clock budget of one recipe visit.
    pub fn with_run_timeout(
        mut self,
        policy: impl Fn(usize) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.timeout_policy = Box::new(policy);
        self
    }

    /// Stores a message under `key`, replacing any previous value.
    pub fn put_message<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.messages.insert(key.into(), Arc::new(value));
        self.epoch.fetch_add(1, Ordering::Release);
    }

    /// Typed read of a message. `None` when the key is absent or holds a
    /// value of a different type.
    pub fn message<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.messages.get(key)?.value().clone();
        value.downcast::<T>().ok()
    }

    pub fn has_message(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Raises the cooperative stop flag for the rest of the run.
    pub fn set_panic(&self) {
        self.put_message(PANIC, true);
    }

    pub fn is_panicked(&self) -> bool {
        self.messages.contains_key(PANIC)
    }

    pub fn on_error(&self, err: &RuntimeError) {
        (self.error_sink)(err);
    }

    pub fn on_timeout(&self, err: &RuntimeError) {
        (self.timeout_sink)(err, self);
    }

    /// Wall-clock budget for one recipe visit over `n_files` files.
    pub fn run_timeout(&self, n_files: usize) -> Duration {
        (self.timeout_policy)(n_files)
    }

    pub(crate) fn message_epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}

/// Observes whether any message was written since the last reset. The
/// cycle loop uses this to detect a recipe asking for another pass
/// without producing a new file reference.
pub(crate) struct MessageWatch {
    seen: u64,
}

impl MessageWatch {
    pub(crate) fn new(ctx: &ExecutionContext) -> Self {
        Self {
            seen: ctx.message_epoch(),
        }
    }

    pub(crate) fn has_new_messages(&self, ctx: &ExecutionContext) -> bool {
        ctx.message_epoch() != self.seen
    }

    pub(crate) fn reset(&mut self, ctx: &ExecutionContext) {
        self.seen = ctx.message_epoch();
    }
}
