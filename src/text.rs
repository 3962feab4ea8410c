//! Plain text as a source format: the whole file is one node holding the
//! raw bytes. Enough to drive the engine end to end without a grammar.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};

use crate::context::ExecutionContext;
use crate::marker::Markers;
use crate::metrics::{MetricsSink, NoopMetrics};
use crate::parser::{Input, Parser};
use crate::print::PrintOutput;
use crate::tree::{FileId, SharedFile, SourceFile};

/// A source file whose tree is a single text node.
#[derive(Clone, Debug)]
pub struct PlainText {
    id: FileId,
    source_path: Utf8PathBuf,
    markers: Markers,
    text: String,
}

impl PlainText {
    pub fn new(source_path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        Self {
            id: FileId::random(),
            source_path: source_path.into(),
            markers: Markers::new(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// A copy with replacement text and the same id.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    /// A copy with a replacement path and the same id.
    pub fn with_source_path(&self, source_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            ..self.clone()
        }
    }
}

impl SourceFile for PlainText {
    fn id(&self) -> FileId {
        self.id
    }

    fn source_path(&self) -> &Utf8Path {
        &self.source_path
    }

    fn markers(&self) -> &Markers {
        &self.markers
    }

    fn with_markers(&self, markers: Markers) -> SharedFile {
        Arc::new(Self {
            markers,
            ..self.clone()
        })
    }

    fn print(&self, out: &mut dyn PrintOutput) {
        out.markers(&self.markers);
        out.raw(&self.text);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Parser that accepts any path and wraps the input text verbatim.
pub struct PlainTextParser {
    metrics: Arc<dyn MetricsSink>,
}

impl Default for PlainTextParser {
    fn default() -> Self {
        Self {
            metrics: Arc::new(NoopMetrics),
        }
    }
}

impl PlainTextParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Parser for PlainTextParser {
    fn parse_inputs(
        &self,
        inputs: &[Input],
        relative_to: Option<&Utf8Path>,
        _ctx: &ExecutionContext,
    ) -> Vec<SharedFile> {
        inputs
            .iter()
            .map(|input| {
                let started = Instant::now();
                let path = match relative_to {
                    Some(base) => input
                        .path
                        .strip_prefix(base)
                        .map(Utf8Path::to_path_buf)
                        .unwrap_or_else(|_| input.path.clone()),
                    None => input.path.clone(),
                };

                let file = Arc::new(PlainText::new(path, input.text.clone())) as SharedFile;
                self.metrics.parse("text", true, started.elapsed());
                file
            })
            .collect()
    }

    fn accept(&self, _path: &Utf8Path) -> bool {
        true
    }
}
