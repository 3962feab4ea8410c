//! Printing seam between the engine and concrete source formats. A file
//! prints itself through a [`PrintOutput`]; the plain printer reproduces
//! the original bytes, while the canonical printer folds observable
//! marker fingerprints into the text so that marker edits are comparable
//! the same way text edits are.

use crate::marker::{Marker, Markers, RecipesThatMadeChanges};
use crate::tree::SourceFile;

/// Sink for a printing traversal.
pub trait PrintOutput {
    /// Emits a run of source text.
    fn raw(&mut self, text: &str);

    /// Reports the marker set of the node about to be printed. The plain
    /// printer ignores this; decorators may fold it into the output.
    fn markers(&mut self, _markers: &Markers) {}
}

/// Lossless printer: reproduces exactly the text the file holds.
#[derive(Default)]
pub struct Printer {
    out: String,
}

impl Printer {
    pub fn finish(self) -> String {
        self.out
    }
}

impl PrintOutput for Printer {
    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }
}

/// Prints a file to a plain string.
pub fn print_all(file: &dyn SourceFile) -> String {
    let mut printer = Printer::default();
    file.print(&mut printer);
    printer.finish()
}

/// Printer decorator used to decide whether a file changed. At every node
/// carrying markers it emits `markers[h1,h2,...]->` built from the
/// fingerprints of all observable markers, attribution excluded, so that
/// attribution-only edits compare equal and any other marker edit does
/// not.
#[derive(Default)]
pub(crate) struct CanonicalPrinter {
    out: String,
}

impl CanonicalPrinter {
    pub(crate) fn finish(self) -> String {
        self.out
    }
}

impl PrintOutput for CanonicalPrinter {
    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn markers(&mut self, markers: &Markers) {
        let ids: Vec<String> = markers
            .iter()
            .filter(|m| m.as_any().downcast_ref::<RecipesThatMadeChanges>().is_none())
            .filter_map(|m| m.fingerprint())
            .map(|h| h.to_string())
            .collect();

        if !ids.is_empty() {
            self.out.push_str("markers[");
            self.out.push_str(&ids.join(","));
            self.out.push_str("]->");
        }
    }
}

/// Canonical form of a file for change detection.
pub(crate) fn canonical_print(file: &dyn SourceFile) -> String {
    let mut printer = CanonicalPrinter::default();
    file.print(&mut printer);
    printer.finish()
}
