//! Materialized tag hierarchy.
//!
//! # Responsibility
//! - Build a navigable forest from the flat tag registry.
//! - Answer descendant-set queries for hierarchical query expansion.
//! - Bubble task notes up to their first visible ancestor.
//!
//! # Invariants
//! - The forest is a pure index over a tag snapshot; it is rebuilt wholesale
//!   after any tag mutation and never edited in place.
//! - Dangling parent links demote the child to a root instead of erroring.
//! - All traversals carry a visited guard so a cyclic snapshot (which the
//!   mutation boundary should have rejected) cannot hang the process.
//!
//! # See also
//! - [`crate::store`] for where tag snapshots come from.
//! - [`crate::query`] for descendant-expanded resolution.

use crate::model::note::{Note, NoteId};
use crate::model::tag::Tag;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// One tag with its attached children, keyed into [`TagForest::nodes`].
#[derive(Debug, Clone)]
pub struct ForestNode {
    pub tag: Tag,
    /// Child tag names in registry order.
    pub children: Vec<String>,
}

/// Index over one tag snapshot.
#[derive(Debug, Clone, Default)]
pub struct TagForest {
    nodes: BTreeMap<String, ForestNode>,
    roots: Vec<String>,
}

/// Task notes grouped under the visible tag they surface beneath.
#[derive(Debug, Clone, Default)]
pub struct TaskBubbling {
    /// Task note ids per visible ancestor tag, in note order.
    pub by_tag: BTreeMap<String, Vec<NoteId>>,
    /// Tasks whose tags are all unknown or fully hidden.
    pub unplaced: Vec<NoteId>,
}

impl TagForest {
    /// Builds the forest from a flat registry snapshot.
    ///
    /// A tag naming itself or an unknown tag as parent becomes a root.
    pub fn build(tags: &[Tag]) -> Self {
        let mut nodes: BTreeMap<String, ForestNode> = tags
            .iter()
            .map(|tag| {
                (
                    tag.name.clone(),
                    ForestNode {
                        tag: tag.clone(),
                        children: Vec::new(),
                    },
                )
            })
            .collect();

        let mut roots = Vec::new();
        for tag in tags {
            let attached = match tag.parent.as_deref() {
                Some(parent) if parent != tag.name && nodes.contains_key(parent) => {
                    if let Some(node) = nodes.get_mut(parent) {
                        node.children.push(tag.name.clone());
                    }
                    true
                }
                _ => false,
            };
            if !attached {
                roots.push(tag.name.clone());
            }
        }

        Self { nodes, roots }
    }

    /// Root tag names in registry order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Looks up one node by full tag name.
    pub fn get(&self, name: &str) -> Option<&ForestNode> {
        self.nodes.get(name)
    }

    /// Returns whether the snapshot contains this tag.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Number of tags in the snapshot.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All strict descendants of `name`, sorted.
    pub fn descendants_of(&self, name: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<&str> = match self.nodes.get(name) {
            Some(node) => node.children.iter().map(String::as_str).collect(),
            None => return found,
        };

        while let Some(current) = stack.pop() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            found.insert(current.to_string());
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().map(String::as_str));
            }
        }
        found
    }

    /// Walks the parent chain up from `name` to the nearest treed tag.
    ///
    /// A treed tag is its own first visible ancestor. Returns `None` when the
    /// chain leaves the snapshot or no ancestor is treed.
    pub fn first_visible_ancestor(&self, name: &str) -> Option<String> {
        let mut visited = HashSet::new();
        let mut current = self.nodes.get(name)?;
        while !current.tag.treed {
            if !visited.insert(current.tag.name.clone()) {
                return None;
            }
            let parent = current.tag.parent.as_deref()?;
            current = self.nodes.get(parent)?;
        }
        Some(current.tag.name.clone())
    }

    /// Groups task notes under the visible tag each of their tags bubbles to.
    ///
    /// A task appears once per distinct visible ancestor; tasks with no
    /// placeable tag land in `unplaced`.
    pub fn bubble_tasks(&self, notes: &[Note]) -> TaskBubbling {
        let mut bubbling = TaskBubbling::default();
        for note in notes.iter().filter(|note| note.is_task()) {
            let mut placed_under = BTreeSet::new();
            for token in &note.tags {
                if let Some(anchor) = self.first_visible_ancestor(token) {
                    placed_under.insert(anchor);
                }
            }
            if placed_under.is_empty() {
                bubbling.unplaced.push(note.id);
            }
            for anchor in placed_under {
                bubbling.by_tag.entry(anchor).or_default().push(note.id);
            }
        }
        bubbling
    }
}

#[cfg(test)]
mod tests {
    use super::TagForest;
    use crate::model::tag::Tag;

    fn tag(name: &str, parent: Option<&str>, treed: bool) -> Tag {
        Tag {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            treed,
            content: None,
        }
    }

    #[test]
    fn dangling_parent_demotes_child_to_root() {
        let forest = TagForest::build(&[tag("#a", Some("#missing"), true)]);
        assert_eq!(forest.roots(), ["#a".to_string()]);
    }

    #[test]
    fn self_parent_becomes_root() {
        let forest = TagForest::build(&[tag("#a", Some("#a"), true)]);
        assert_eq!(forest.roots(), ["#a".to_string()]);
        assert!(forest.descendants_of("#a").is_empty());
    }

    #[test]
    fn descendants_cover_the_whole_subtree() {
        let forest = TagForest::build(&[
            tag("#root", None, true),
            tag("#mid", Some("#root"), false),
            tag("#leaf", Some("#mid"), false),
            tag("#other", None, true),
        ]);
        let found = forest.descendants_of("#root");
        assert!(found.contains("#mid"));
        assert!(found.contains("#leaf"));
        assert!(!found.contains("#other"));
        assert!(!found.contains("#root"));
    }

    #[test]
    fn treed_tag_is_its_own_visible_ancestor() {
        let forest = TagForest::build(&[tag("#a", None, true)]);
        assert_eq!(forest.first_visible_ancestor("#a"), Some("#a".to_string()));
    }

    #[test]
    fn hidden_tag_bubbles_to_nearest_treed_ancestor() {
        let forest = TagForest::build(&[
            tag("#top", None, true),
            tag("#mid", Some("#top"), false),
            tag("#leaf", Some("#mid"), false),
        ]);
        assert_eq!(
            forest.first_visible_ancestor("#leaf"),
            Some("#top".to_string())
        );
    }

    #[test]
    fn fully_hidden_chain_has_no_visible_ancestor() {
        let forest = TagForest::build(&[tag("#a", None, false), tag("#b", Some("#a"), false)]);
        assert_eq!(forest.first_visible_ancestor("#b"), None);
    }
}
