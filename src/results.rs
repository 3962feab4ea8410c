//! Builds the report of a finished run: the before-set diffed against
//! the after-set by stable file identity, with every difference carrying
//! the recipe stacks responsible for it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::SchedulerError;
use crate::marker::{Generated, RecipeStack, RecipesThatMadeChanges};
use crate::print::canonical_print;
use crate::tree::{FileId, SharedFile, SourceFile};

/// One observable difference produced by a run: a file that was added
/// (`before` is `None`), removed (`after` is `None`), or changed.
#[derive(Clone, Debug)]
pub struct Change {
    pub before: Option<SharedFile>,
    pub after: Option<SharedFile>,
    /// Every recipe stack that contributed to this difference.
    pub recipes_that_made_changes: Vec<RecipeStack>,
}

/// Diffs the batches. `deleted_by` holds the stacks recorded during the
/// run for deleted file ids and for generated file ids.
pub(crate) fn build(
    before: &[SharedFile],
    after: &[SharedFile],
    deleted_by: &DashMap<FileId, RecipeStack>,
) -> Result<Vec<Change>, SchedulerError> {
    let attribution = |id: FileId| -> Vec<RecipeStack> {
        deleted_by
            .get(&id)
            .map(|entry| vec![entry.value().clone()])
            .unwrap_or_default()
    };

    let before_by_id: HashMap<FileId, SharedFile> =
        before.iter().map(|file| (file.id(), file.clone())).collect();

    let mut changes = Vec::new();

    // Added or changed files.
    for file in after {
        match before_by_id.get(&file.id()) {
            None => {
                changes.push(Change {
                    before: None,
                    after: Some(file.clone()),
                    recipes_that_made_changes: attribution(file.id()),
                });
            }
            Some(original) if Arc::ptr_eq(original, file) => {}
            Some(original) => {
                if original.markers().find::<Generated>().is_some() {
                    continue;
                }

                let changed = original.source_path() != file.source_path()
                    || canonical_print(&**original) != canonical_print(&**file);

                if changed {
                    let marker = file
                        .markers()
                        .find::<RecipesThatMadeChanges>()
                        .ok_or_else(|| SchedulerError::MissingAttribution {
                            path: file.source_path().to_owned(),
                        })?;

                    changes.push(Change {
                        before: Some(original.clone()),
                        after: Some(file.clone()),
                        recipes_that_made_changes: marker.recipes().to_vec(),
                    });
                }
            }
        }
    }

    // Removed files.
    let after_ids: HashSet<FileId> = after.iter().map(|file| file.id()).collect();
    for file in before {
        if !after_ids.contains(&file.id()) && file.markers().find::<Generated>().is_none() {
            changes.push(Change {
                before: Some(file.clone()),
                after: None,
                recipes_that_made_changes: attribution(file.id()),
            });
        }
    }

    Ok(changes)
}
