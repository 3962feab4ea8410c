//! The file model the engine schedules over. Concrete source formats live
//! behind the [`SourceFile`] trait; the engine itself never looks inside a
//! tree, it only moves whole files through visits and compares handles.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use camino::Utf8Path;
use uuid::Uuid;

use crate::marker::Markers;
use crate::print::PrintOutput;

/// Stable identity of a source file.
///
/// Every transformation of a file carries its id forward, so the id is
/// what connects a file's before-state to its after-state across any
/// number of cycles. Only parsers mint fresh ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FileId(Uuid);

impl FileId {
    pub fn random() -> Self {
        FileId(Uuid::new_v4())
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared handle to an immutable source file.
///
/// Pointer equality of two handles is the engine's "nothing changed"
/// signal: a visit that makes no edit returns the handle it received.
pub type SharedFile = Arc<dyn SourceFile>;

/// A parsed source file rooted in a lossless syntax tree.
///
/// Values are immutable; every `with_*` operation on a concrete file type
/// must produce a new value that keeps the original [`FileId`].
pub trait SourceFile: Send + Sync + Debug + 'static {
    fn id(&self) -> FileId;

    /// Logical path of the file, relative to the batch root.
    fn source_path(&self) -> &Utf8Path;

    fn markers(&self) -> &Markers;

    /// A copy of this file with a replacement marker set and the same id.
    fn with_markers(&self, markers: Markers) -> SharedFile;

    /// Prints the file losslessly into `out`. At every node that carries
    /// markers, implementations report the marker set through
    /// [`PrintOutput::markers`] before emitting that node's text.
    fn print(&self, out: &mut dyn PrintOutput);

    fn as_any(&self) -> &dyn Any;
}
