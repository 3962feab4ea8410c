//! Markers are out-of-band facts attached to tree nodes: at most one
//! value per marker kind, with a kind-level merge function resolving
//! collisions. The engine understands two kinds, [`Generated`] and
//! [`RecipesThatMadeChanges`]; everything else is opaque to it.

use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::sync::Arc;

use crate::hash::fingerprint64;
use crate::recipe::{Recipe, SharedRecipe};

/// A single out-of-band fact attached to a tree node.
pub trait Marker: Send + Sync + Debug + 'static {
    fn as_any(&self) -> &dyn Any;

    /// Content hash of this marker as it contributes to a file's
    /// observable form. `None` makes the marker zero-width: its presence
    /// or absence never counts as a change to the file.
    fn fingerprint(&self) -> Option<u64>;

    /// Resolves a collision between this value and an incoming value of
    /// the same kind. Returning `None` lets the incoming value replace
    /// this one.
    fn merge(&self, _incoming: &dyn Marker) -> Option<Arc<dyn Marker>> {
        None
    }
}

/// The marker set of a tree node, keyed by marker kind.
#[derive(Clone, Default, Debug)]
pub struct Markers {
    entries: Vec<Arc<dyn Marker>>,
}

impl Markers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find<M: Marker>(&self) -> Option<&M> {
        self.entries
            .iter()
            .find_map(|entry| entry.as_any().downcast_ref::<M>())
    }

    /// Inserts `incoming`, or merges it into the existing value of the
    /// same kind via the kind's merge function.
    pub fn compute<M: Marker>(&self, incoming: M) -> Markers {
        let mut entries = self.entries.clone();

        match entries
            .iter_mut()
            .find(|entry| entry.as_any().type_id() == TypeId::of::<M>())
        {
            Some(slot) => {
                *slot = match slot.merge(&incoming) {
                    Some(merged) => merged,
                    None => Arc::new(incoming),
                };
            }
            None => entries.push(Arc::new(incoming)),
        }

        Markers { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Marker>> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Marks a file as machine-generated. Generated files are carried through
/// the run but excluded from change reporting.
#[derive(Clone, Copy, Debug, Default)]
pub struct Generated;

impl Marker for Generated {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fingerprint(&self) -> Option<u64> {
        Some(fingerprint64("generated"))
    }
}

/// Path from the root of a recipe composition down to the recipe being
/// applied. This is the unit of change attribution: two stacks are equal
/// when they hold the same recipe instances in the same order.
#[derive(Clone)]
pub struct RecipeStack {
    path: Vec<SharedRecipe>,
}

impl RecipeStack {
    pub fn root(recipe: SharedRecipe) -> Self {
        Self { path: vec![recipe] }
    }

    /// This stack extended by one child recipe.
    pub fn push(&self, recipe: SharedRecipe) -> Self {
        let mut path = self.path.clone();
        path.push(recipe);
        Self { path }
    }

    /// The recipe currently being applied.
    pub fn top(&self) -> &SharedRecipe {
        self.path.last().expect("recipe stack is never empty")
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedRecipe> {
        self.path.iter()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Display names along the path, root first.
    pub fn names(&self) -> Vec<&str> {
        self.path.iter().map(|recipe| recipe.display_name()).collect()
    }
}

impl PartialEq for RecipeStack {
    fn eq(&self, other: &Self) -> bool {
        self.path.len() == other.path.len()
            && self
                .path
                .iter()
                .zip(&other.path)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl Eq for RecipeStack {}

impl Debug for RecipeStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RecipeStack").field(&self.names()).finish()
    }
}

impl std::fmt::Display for RecipeStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.names().join(" > "))
    }
}

/// Records which recipe stacks contributed changes to a file. Collisions
/// merge by set-union over stack equality, so a file touched by several
/// recipes accumulates every responsible path.
#[derive(Clone, Debug)]
pub struct RecipesThatMadeChanges {
    recipes: Vec<RecipeStack>,
}

impl RecipesThatMadeChanges {
    pub fn new(stack: RecipeStack) -> Self {
        Self {
            recipes: vec![stack],
        }
    }

    pub fn recipes(&self) -> &[RecipeStack] {
        &self.recipes
    }
}

impl Marker for RecipesThatMadeChanges {
    fn as_any(&self) -> &dyn Any {
        self
    }

    /// Attribution must never read as a change to the file itself.
    fn fingerprint(&self) -> Option<u64> {
        None
    }

    fn merge(&self, incoming: &dyn Marker) -> Option<Arc<dyn Marker>> {
        let incoming = incoming.as_any().downcast_ref::<Self>()?;
        let mut recipes = self.recipes.clone();

        for stack in &incoming.recipes {
            if !recipes.contains(stack) {
                recipes.push(stack.clone());
            }
        }

        Some(Arc::new(Self { recipes }))
    }
}
