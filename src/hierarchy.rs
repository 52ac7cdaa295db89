//! Canonical hierarchical dataset and its mutation operations.
//!
//! The chart owns one [`HierarchyNode`] tree for the whole session. Everything
//! derived from it (relationship tags, the mounted tree view) is recomputed
//! when the tree changes; the tree itself is only modified through
//! [`remove_node`] and [`add_child`], which is what makes the
//! rollback-on-failure contract of reparenting enforceable in one place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a node in the hierarchy. Unique across the whole tree.
pub type NodeId = i32;

/// A single entity in the organization hierarchy.
///
/// `children` order is sibling display order. Display fields beyond `name`
/// and `title` survive serialization round-trips via the flattened `extra`
/// map, so applications can attach whatever they need to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Create a leaf node with empty display fields.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: String::new(),
            title: String::new(),
            extra: serde_json::Map::new(),
            children: Vec::new(),
        }
    }

    /// Create a node with display fields set.
    pub fn with_labels(id: NodeId, name: &str, title: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            title: title.to_owned(),
            extra: serde_json::Map::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style child append, for assembling datasets in tests and demos.
    pub fn with_child(mut self, child: HierarchyNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first search for `id` in this subtree, including `self`.
    pub fn locate(&self, id: NodeId) -> Option<&HierarchyNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.locate(id))
    }

    /// Whether `id` occurs anywhere in this subtree, including `self`.
    ///
    /// This is the membership test behind drop-allowed: a dragged node may
    /// not land on any member of its own subtree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.locate(id).is_some()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::count).sum::<usize>()
    }
}

/// Failures of the tree mutation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("node {0} not found in hierarchy")]
    NotFound(NodeId),
    #[error("node {0} is the root and cannot be removed")]
    RootRemoval(NodeId),
}

/// Remove the node with `id` from the tree and return it with its subtree.
///
/// The root cannot be removed; a missing id is an error. The tree is left
/// untouched on failure.
pub fn remove_node(root: &mut HierarchyNode, id: NodeId) -> Result<HierarchyNode, HierarchyError> {
    if root.id == id {
        return Err(HierarchyError::RootRemoval(id));
    }
    fn remove_in(node: &mut HierarchyNode, id: NodeId) -> Option<HierarchyNode> {
        if let Some(pos) = node.children.iter().position(|c| c.id == id) {
            return Some(node.children.remove(pos));
        }
        node.children.iter_mut().find_map(|c| remove_in(c, id))
    }
    remove_in(root, id).ok_or(HierarchyError::NotFound(id))
}

/// Append `child` to the child list of the node with `parent_id`.
pub fn add_child(
    root: &mut HierarchyNode,
    parent_id: NodeId,
    child: HierarchyNode,
) -> Result<(), HierarchyError> {
    fn locate_mut(node: &mut HierarchyNode, id: NodeId) -> Option<&mut HierarchyNode> {
        if node.id == id {
            return Some(node);
        }
        node.children.iter_mut().find_map(|c| locate_mut(c, id))
    }
    match locate_mut(root, parent_id) {
        Some(parent) => {
            parent.children.push(child);
            Ok(())
        }
        None => Err(HierarchyError::NotFound(parent_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 ── 2
    ///   └─ 3 ── 4
    fn sample_tree() -> HierarchyNode {
        HierarchyNode::with_labels(1, "CEO", "Chief Executive")
            .with_child(HierarchyNode::with_labels(2, "CTO", "Engineering"))
            .with_child(
                HierarchyNode::with_labels(3, "COO", "Operations")
                    .with_child(HierarchyNode::with_labels(4, "Manager", "Logistics")),
            )
    }

    // ========================================================================
    // locate() / contains()
    // ========================================================================

    #[test]
    fn test_locate_finds_root_and_descendants() {
        let tree = sample_tree();
        assert_eq!(tree.locate(1).map(|n| n.id), Some(1));
        assert_eq!(tree.locate(4).map(|n| &n.name[..]), Some("Manager"));
    }

    #[test]
    fn test_locate_missing_id_is_none() {
        let tree = sample_tree();
        assert!(tree.locate(99).is_none());
    }

    #[test]
    fn test_contains_includes_self() {
        let tree = sample_tree();
        let subtree = tree.locate(3).unwrap();
        assert!(subtree.contains(3));
        assert!(subtree.contains(4));
        assert!(!subtree.contains(2));
    }

    #[test]
    fn test_count_counts_whole_subtree() {
        let tree = sample_tree();
        assert_eq!(tree.count(), 4);
        assert_eq!(tree.locate(3).unwrap().count(), 2);
    }

    // ========================================================================
    // remove_node()
    // ========================================================================

    #[test]
    fn test_remove_returns_node_with_subtree() {
        let mut tree = sample_tree();
        let removed = remove_node(&mut tree, 3).unwrap();
        assert_eq!(removed.id, 3);
        assert_eq!(removed.children.len(), 1);
        assert!(!tree.contains(3));
        assert!(!tree.contains(4));
    }

    #[test]
    fn test_remove_missing_id_fails() {
        let mut tree = sample_tree();
        assert_eq!(remove_node(&mut tree, 99), Err(HierarchyError::NotFound(99)));
        assert_eq!(tree.count(), 4);
    }

    #[test]
    fn test_remove_root_fails() {
        let mut tree = sample_tree();
        assert_eq!(remove_node(&mut tree, 1), Err(HierarchyError::RootRemoval(1)));
    }

    #[test]
    fn test_second_removal_of_same_id_fails() {
        let mut tree = sample_tree();
        remove_node(&mut tree, 2).unwrap();
        assert_eq!(remove_node(&mut tree, 2), Err(HierarchyError::NotFound(2)));
    }

    // ========================================================================
    // add_child()
    // ========================================================================

    #[test]
    fn test_add_child_appends_in_order() {
        let mut tree = sample_tree();
        add_child(&mut tree, 2, HierarchyNode::new(5)).unwrap();
        add_child(&mut tree, 2, HierarchyNode::new(6)).unwrap();
        let ids: Vec<NodeId> = tree.locate(2).unwrap().children.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn test_add_child_missing_parent_fails() {
        let mut tree = sample_tree();
        let err = add_child(&mut tree, 42, HierarchyNode::new(5)).unwrap_err();
        assert_eq!(err, HierarchyError::NotFound(42));
        assert_eq!(tree.count(), 4);
    }

    #[test]
    fn test_remove_then_add_reparents() {
        let mut tree = sample_tree();
        let moved = remove_node(&mut tree, 4).unwrap();
        add_child(&mut tree, 2, moved).unwrap();
        assert!(tree.locate(2).unwrap().contains(4));
        assert!(tree.locate(3).unwrap().children.is_empty());
    }

    // ========================================================================
    // serde round-trip with extra fields
    // ========================================================================

    #[test]
    fn test_extra_fields_survive_roundtrip() {
        let json = r#"{"id":7,"name":"Lead","title":"Design","office":"Berlin","children":[{"id":8}]}"#;
        let node: HierarchyNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.extra.get("office").and_then(|v| v.as_str()), Some("Berlin"));
        assert_eq!(node.children[0].id, 8);

        let back = serde_json::to_string(&node).unwrap();
        let reparsed: HierarchyNode = serde_json::from_str(&back).unwrap();
        assert_eq!(reparsed, node);
    }

    #[test]
    fn test_leaf_serialization_omits_children() {
        let leaf = HierarchyNode::new(9);
        let json = serde_json::to_string(&leaf).unwrap();
        assert!(!json.contains("children"));
    }
}
