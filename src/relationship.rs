//! Derived relationship tags.
//!
//! Every node gets a 3-character code describing where it sits in the tree:
//! digit 1 is the depth rank (`0` marks the root), digit 2 flags multiple
//! siblings, digit 3 flags children. The codes only exist to drive which
//! interaction edges render on a node, so they live in a map parallel to the
//! dataset and are recomputed from scratch whenever the dataset changes.
//! Stale tags produce wrong edge arrows; callers must recompute before any
//! render-facing query.

use crate::hierarchy::{HierarchyNode, NodeId};
use std::collections::HashMap;

/// Derived placement facts for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipTag {
    /// Distance from the root; the root itself is 0.
    pub depth: u32,
    /// The node shares its parent with at least one other child.
    pub has_siblings: bool,
    /// The node has at least one child.
    pub has_children: bool,
}

impl RelationshipTag {
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// The 3-character code form. Depth ranks past 9 clamp to `9`, which is
    /// enough for the non-root test the edge rendering performs.
    pub fn code(&self) -> String {
        format!(
            "{}{}{}",
            self.depth.min(9),
            u8::from(self.has_siblings),
            u8::from(self.has_children)
        )
    }
}

/// Map from node id to its derived tag.
pub type TagMap = HashMap<NodeId, RelationshipTag>;

/// Compute tags for every node in one top-down traversal.
pub fn compute_tags(root: &HierarchyNode) -> TagMap {
    fn walk(node: &HierarchyNode, depth: u32, has_siblings: bool, tags: &mut TagMap) {
        tags.insert(
            node.id,
            RelationshipTag {
                depth,
                has_siblings,
                has_children: !node.children.is_empty(),
            },
        );
        let multiple = node.children.len() > 1;
        for child in &node.children {
            walk(child, depth + 1, multiple, tags);
        }
    }
    let mut tags = TagMap::new();
    walk(root, 0, false, &mut tags);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyNode;

    /// The dataset from the reparenting scenarios:
    /// `{id:1, children:[{id:2}, {id:3, children:[{id:4}]}]}`
    fn scenario_tree() -> HierarchyNode {
        HierarchyNode::new(1)
            .with_child(HierarchyNode::new(2))
            .with_child(HierarchyNode::new(3).with_child(HierarchyNode::new(4)))
    }

    #[test]
    fn test_root_tag_is_distinguished() {
        let tags = compute_tags(&scenario_tree());
        let root = tags[&1];
        assert!(root.is_root());
        assert_eq!(root.code().chars().next(), Some('0'));
    }

    #[test]
    fn test_has_children_digit() {
        let tags = compute_tags(&scenario_tree());
        assert_eq!(tags[&1].code().chars().nth(2), Some('1'));
        assert_eq!(tags[&3].code().chars().nth(2), Some('1'));
        assert_eq!(tags[&2].code().chars().nth(2), Some('0'));
        assert_eq!(tags[&4].code().chars().nth(2), Some('0'));
    }

    #[test]
    fn test_sibling_digit_set_only_with_multiple_children() {
        let tags = compute_tags(&scenario_tree());
        // 2 and 3 share a parent with two children; 4 is an only child.
        assert!(tags[&2].has_siblings);
        assert!(tags[&3].has_siblings);
        assert!(!tags[&4].has_siblings);
        assert!(!tags[&1].has_siblings);
    }

    #[test]
    fn test_depth_ranks() {
        let tags = compute_tags(&scenario_tree());
        assert_eq!(tags[&1].depth, 0);
        assert_eq!(tags[&2].depth, 1);
        assert_eq!(tags[&3].depth, 1);
        assert_eq!(tags[&4].depth, 2);
    }

    #[test]
    fn test_code_format() {
        let tags = compute_tags(&scenario_tree());
        assert_eq!(tags[&1].code(), "001");
        assert_eq!(tags[&2].code(), "110");
        assert_eq!(tags[&3].code(), "111");
        assert_eq!(tags[&4].code(), "200");
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let tree = scenario_tree();
        assert_eq!(compute_tags(&tree), compute_tags(&tree));
    }

    #[test]
    fn test_deep_chain_clamps_code_digit() {
        let mut tree = HierarchyNode::new(0);
        let mut cursor = &mut tree;
        for id in 1..=12 {
            cursor.children.push(HierarchyNode::new(id));
            cursor = &mut cursor.children[0];
        }
        let tags = compute_tags(&tree);
        assert_eq!(tags[&12].depth, 12);
        assert_eq!(tags[&12].code().chars().next(), Some('9'));
    }

    #[test]
    fn test_tags_cover_every_node() {
        let tree = scenario_tree();
        let tags = compute_tags(&tree);
        assert_eq!(tags.len(), tree.count());
    }
}
