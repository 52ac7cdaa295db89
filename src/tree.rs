//! Mounted tree view: per-node UI state and the collapse/expand machinery.
//!
//! The [`ChartView`] is rebuilt from the canonical dataset on every dataset
//! change. Each node gets one [`NodeUiState`] cell plus two broadcast
//! subscriptions (drag and selection) that live exactly as long as the node
//! is mounted; rebuilding drops the previous generation and with it every
//! stale subscription.
//!
//! Three independent collapse directions exist per node, matching the three
//! edge controls:
//!
//! - **ancestors** — hides the parent's card one level up; collapsing
//!   cascades to the topmost visible ancestor in one step, expanding
//!   reveals one level per step.
//! - **siblings** — hides or reveals every sibling branch around the acted
//!   node.
//! - **children** — flips the node's own collapsed flag and toggles the
//!   node through its parent's detached lane.
//!
//! A fourth mechanism, the detached lane, is orthogonal to hiding: a
//! detached child renders in a separate lane next to the parent's normal
//! subtree while remaining a canonical child.

use crate::broadcast::{Channel, Subscription};
use crate::hierarchy::{HierarchyNode, NodeId};
use crate::relationship::{RelationshipTag, TagMap};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Ephemeral per-node UI state. Created when the node mounts, destroyed when
/// it unmounts; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUiState {
    /// Bottom-edge state: the node's own subtree wrapper is hidden.
    pub children_collapsed: bool,
    pub selected: bool,
    pub drop_allowed: bool,
    /// Hover arrow indicators; unset until the pointer enters the card.
    pub top_edge: Option<bool>,
    pub right_edge: Option<bool>,
    pub bottom_edge: Option<bool>,
    pub left_edge: Option<bool>,
    /// Markers left on the acted node by the ancestors/siblings toggles.
    pub ancestors_collapsed: bool,
    pub siblings_collapsed: bool,
    /// The node's own card is hidden (ancestors direction, set on the parent).
    pub card_hidden: bool,
    /// The node's whole branch is hidden (siblings direction).
    pub branch_hidden: bool,
    /// Children still rendered in the normal nested subtree, in order.
    pub resident_children: Vec<NodeId>,
    /// Children promoted into the separate "expanded" lane, in order.
    pub detached_children: Vec<NodeId>,
}

/// Which render-contract pieces a node shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDecor {
    /// Crown/leader icon; only with the default template.
    pub leader_icon: bool,
    /// Top "ancestors" toggle edge.
    pub top_edge: bool,
    /// Left/right "siblings" toggle edges.
    pub horizontal_edges: bool,
    /// Bottom "children" toggle control.
    pub bottom_control: bool,
}

struct Entry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One mounted node: its state cell plus the channel subscriptions keeping
/// the cell in sync. Dropping this is the unmount.
struct MountedNode {
    state: Rc<RefCell<NodeUiState>>,
    _drag_sub: Subscription<NodeId>,
    _select_sub: Subscription<NodeId>,
}

/// The mounted tree: structure index plus UI state for every node of the
/// current dataset generation.
pub struct ChartView {
    root: NodeId,
    entries: HashMap<NodeId, Entry>,
    order: Vec<NodeId>,
    mounted: HashMap<NodeId, MountedNode>,
}

impl ChartView {
    /// Mount a view of the current dataset.
    ///
    /// Nodes at depth rank 1 start with their children collapsed; detached
    /// lanes start empty. Each node subscribes to the drag channel (keeping
    /// `drop_allowed` equal to "the dragged subtree does not contain me")
    /// and to the selection channel.
    pub fn build(
        dataset: &Rc<RefCell<HierarchyNode>>,
        tags: &TagMap,
        drag: &Channel<NodeId>,
        select: &Channel<NodeId>,
        multiple_select: bool,
    ) -> Self {
        let mut entries = HashMap::new();
        let mut order = Vec::new();
        {
            let root = dataset.borrow();
            fn index(
                node: &HierarchyNode,
                parent: Option<NodeId>,
                entries: &mut HashMap<NodeId, Entry>,
                order: &mut Vec<NodeId>,
            ) {
                entries.insert(
                    node.id,
                    Entry {
                        parent,
                        children: node.children.iter().map(|c| c.id).collect(),
                    },
                );
                order.push(node.id);
                for child in &node.children {
                    index(child, Some(node.id), entries, order);
                }
            }
            index(&root, None, &mut entries, &mut order);
        }

        let mut mounted = HashMap::new();
        for &id in &order {
            let state = Rc::new(RefCell::new(NodeUiState {
                children_collapsed: tags.get(&id).is_some_and(|t| t.depth == 1),
                resident_children: entries[&id].children.clone(),
                ..NodeUiState::default()
            }));

            let drag_sub = {
                let state = state.clone();
                let dataset = dataset.clone();
                drag.subscribe(move |dragged| {
                    let allowed = match dragged {
                        Some(&dragged) => {
                            let root = dataset.borrow();
                            root.locate(dragged).is_some_and(|sub| !sub.contains(id))
                        }
                        None => false,
                    };
                    state.borrow_mut().drop_allowed = allowed;
                })
            };

            let select_sub = {
                let state = state.clone();
                select.subscribe(move |selected| {
                    let mut state = state.borrow_mut();
                    match selected {
                        Some(&sel) => {
                            if multiple_select {
                                if sel == id {
                                    state.selected = true;
                                }
                            } else {
                                state.selected = sel == id;
                            }
                        }
                        None => state.selected = false,
                    }
                })
            };

            mounted.insert(
                id,
                MountedNode {
                    state,
                    _drag_sub: drag_sub,
                    _select_sub: select_sub,
                },
            );
        }

        let root = dataset.borrow().id;
        Self {
            root,
            entries,
            order,
            mounted,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids in top-down traversal order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(&id).and_then(|e| e.parent)
    }

    /// Canonical child order of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entries.get(&id).map_or(&[], |e| &e.children)
    }

    /// Shared handle to a node's UI state cell.
    pub fn state(&self, id: NodeId) -> Option<Rc<RefCell<NodeUiState>>> {
        self.mounted.get(&id).map(|m| m.state.clone())
    }

    fn with_state<R>(&self, id: NodeId, f: impl FnOnce(&mut NodeUiState) -> R) -> Option<R> {
        self.mounted.get(&id).map(|m| f(&mut m.state.borrow_mut()))
    }

    fn read_state<R>(&self, id: NodeId, f: impl FnOnce(&NodeUiState) -> R) -> Option<R> {
        self.mounted.get(&id).map(|m| f(&m.state.borrow()))
    }

    /// Whether any branch under `id`'s parent (the acted node included) is
    /// hidden. This is the "siblings collapsed" probe both toggles share.
    fn any_sibling_branch_hidden(&self, id: NodeId) -> bool {
        match self.parent(id) {
            Some(parent) => self
                .children(parent)
                .iter()
                .any(|&c| self.read_state(c, |s| s.branch_hidden).unwrap_or(false)),
            None => false,
        }
    }

    // === Collapse directions ===

    /// Top-edge click: toggle visibility of the parent's card one level up.
    ///
    /// Expanding reveals exactly one level. Collapsing first collapses the
    /// siblings if they are still visible, marks the acted node, hides the
    /// parent card and cascades upward while a grandparent card is still
    /// visible.
    pub fn toggle_ancestors(&self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let parent_card_hidden = self.read_state(parent, |s| s.card_hidden).unwrap_or(false);
        if parent_card_hidden {
            self.with_state(id, |s| s.ancestors_collapsed = false);
            self.with_state(parent, |s| s.card_hidden = false);
        } else {
            let siblings_hidden = self.any_sibling_branch_hidden(id);
            if !siblings_hidden {
                self.toggle_siblings(id);
            }
            self.with_state(id, |s| {
                s.ancestors_collapsed = true;
                if !siblings_hidden {
                    s.siblings_collapsed = true;
                }
            });
            self.with_state(parent, |s| s.card_hidden = true);
            if let Some(grandparent) = self.parent(parent) {
                let grandparent_visible = self
                    .read_state(grandparent, |s| !s.card_hidden)
                    .unwrap_or(false);
                if grandparent_visible {
                    self.toggle_ancestors(parent);
                }
            }
        }
    }

    /// Horizontal-edge click: hide or reveal every sibling branch before and
    /// after the acted node. Expanding also reveals the parent level when it
    /// is currently hidden.
    pub fn toggle_siblings(&self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let siblings_hidden = self.any_sibling_branch_hidden(id);
        self.with_state(id, |s| s.siblings_collapsed = !siblings_hidden);

        let siblings: Vec<NodeId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|&c| c != id)
            .collect();
        for sibling in siblings {
            self.with_state(sibling, |s| s.branch_hidden = !siblings_hidden);
        }

        let parent_card_hidden = self.read_state(parent, |s| s.card_hidden).unwrap_or(false);
        if parent_card_hidden {
            self.toggle_ancestors(id);
        }
    }

    /// Bottom-edge click: flip the node's own collapsed flag and toggle the
    /// node through its parent's detached lane. Returns `true` when the node
    /// exists (the caller then notifies the embedder). The root has no
    /// parent lane; its lane step is skipped.
    pub fn toggle_children(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.with_state(id, |s| {
            s.children_collapsed = !s.children_collapsed;
            s.bottom_edge = Some(!s.bottom_edge.unwrap_or(false));
        });
        if let Some(parent) = self.parent(id) {
            self.toggle_detached(parent, id);
        }
        true
    }

    /// Move `child_id` between its parent's resident and detached lanes.
    /// The two lanes always partition the canonical child set.
    pub fn toggle_detached(&self, parent_id: NodeId, child_id: NodeId) {
        self.with_state(parent_id, |s| {
            if let Some(pos) = s.detached_children.iter().position(|&c| c == child_id) {
                s.detached_children.remove(pos);
                s.resident_children.push(child_id);
            } else if let Some(pos) = s.resident_children.iter().position(|&c| c == child_id) {
                s.resident_children.remove(pos);
                s.detached_children.push(child_id);
            }
        });
    }

    /// Bulk visual reset: clears hidden cards and branches, both collapse
    /// markers and every node's own collapsed flag in one pass.
    pub fn expand_all(&self) {
        for &id in &self.order {
            self.with_state(id, |s| {
                s.card_hidden = false;
                s.branch_hidden = false;
                s.ancestors_collapsed = false;
                s.siblings_collapsed = false;
                s.children_collapsed = false;
            });
        }
        tracing::debug!(nodes = self.order.len(), "expanded all nodes");
    }

    // === Hover arrows ===

    /// Pointer entered the card: derive the four edge indicators from the
    /// current collapse state around the node.
    pub fn add_arrows(&self, id: NodeId) {
        let ancestors_hidden = self
            .parent(id)
            .and_then(|p| self.read_state(p, |s| s.card_hidden))
            .unwrap_or(false);
        let siblings_hidden = self.any_sibling_branch_hidden(id);
        self.with_state(id, |s| {
            s.top_edge = Some(!ancestors_hidden);
            s.right_edge = Some(!siblings_hidden);
            s.left_edge = Some(!siblings_hidden);
            s.bottom_edge = Some(!s.children_collapsed);
        });
    }

    /// Pointer left the card: all four indicators back to unset.
    pub fn remove_arrows(&self, id: NodeId) {
        self.with_state(id, |s| {
            s.top_edge = None;
            s.right_edge = None;
            s.bottom_edge = None;
            s.left_edge = None;
        });
    }

    // === Render contract ===

    /// Which decorations and edge controls the node renders, from its
    /// relationship tag and the chart configuration.
    pub fn decor(
        &self,
        id: NodeId,
        tags: &TagMap,
        collapsible: bool,
        has_template: bool,
    ) -> Option<NodeDecor> {
        let tag: &RelationshipTag = tags.get(&id)?;
        Some(NodeDecor {
            leader_icon: tag.has_children && !has_template,
            top_edge: collapsible && !tag.is_root(),
            horizontal_edges: collapsible && tag.has_siblings,
            bottom_control: collapsible && tag.has_children,
        })
    }

    /// Whether the node's card is currently on screen: its own card and
    /// branch are not hidden, no ancestor branch is hidden, and no ancestor
    /// keeps it inside a collapsed resident lane. A detached child stays
    /// visible through its parent's collapse.
    pub fn card_visible(&self, id: NodeId) -> bool {
        let own_visible = self
            .read_state(id, |s| !s.card_hidden && !s.branch_hidden)
            .unwrap_or(false);
        if !own_visible {
            return false;
        }
        let mut child = id;
        while let Some(parent) = self.parent(child) {
            let blocked = self
                .read_state(parent, |s| {
                    s.branch_hidden
                        || (s.children_collapsed && s.resident_children.contains(&child))
                })
                .unwrap_or(true);
            if blocked {
                return false;
            }
            child = parent;
        }
        true
    }

    /// Partition check used by tests and debug assertions: resident plus
    /// detached equals the canonical child set, with no id in both lanes.
    pub fn lanes_partition_children(&self, id: NodeId) -> bool {
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        self.read_state(id, |s| {
            let mut combined: Vec<NodeId> = s
                .resident_children
                .iter()
                .chain(s.detached_children.iter())
                .copied()
                .collect();
            let disjoint = !s
                .resident_children
                .iter()
                .any(|c| s.detached_children.contains(c));
            combined.sort_unstable();
            let mut canonical = entry.children.clone();
            canonical.sort_unstable();
            disjoint && combined == canonical
        })
        .unwrap_or(false)
    }
}
