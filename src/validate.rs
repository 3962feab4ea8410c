//! Composable validation outcomes, plus the structural check that a
//! recipe composition is actually a tree.

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::recipe::{Recipe, SharedRecipe};

/// A single validation failure.
#[derive(Clone, Debug)]
pub struct Invalid {
    /// The property that failed, e.g. `"children"`.
    pub property: String,
    pub message: String,
}

/// Outcome of validating a recipe. Outcomes compose with [`and`];
/// the composition is valid only when every part is.
///
/// [`and`]: Validated::and
#[derive(Clone, Debug, Default)]
pub struct Validated {
    failures: Vec<Invalid>,
}

impl Validated {
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn invalid(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failures: vec![Invalid {
                property: property.into(),
                message: message.into(),
            }],
        }
    }

    pub fn and(mut self, other: Validated) -> Validated {
        self.failures.extend(other.failures);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[Invalid] {
        &self.failures
    }
}

/// Checks that no recipe reaches one of its own ancestors through
/// `children()`. Recipes are identified by instance, which is also how
/// attribution identifies them.
pub fn acyclic(root: &SharedRecipe) -> Validated {
    fn key(recipe: &SharedRecipe) -> usize {
        Arc::as_ptr(recipe) as *const () as usize
    }

    let mut graph: DiGraph<(), ()> = DiGraph::new();
    let mut index_of: HashMap<usize, NodeIndex> = HashMap::new();

    index_of.insert(key(root), graph.add_node(()));
    let mut pending = vec![root.clone()];

    while let Some(recipe) = pending.pop() {
        let from = index_of[&key(&recipe)];

        for child in recipe.children() {
            let to = match index_of.get(&key(&child)) {
                Some(index) => *index,
                None => {
                    let index = graph.add_node(());
                    index_of.insert(key(&child), index);
                    pending.push(child.clone());
                    index
                }
            };
            graph.add_edge(from, to, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_) => Validated::valid(),
        Err(_) => Validated::invalid(
            "children",
            format!(
                "recipe composition under '{}' contains a cycle",
                root.display_name()
            ),
        ),
    }
}
