//! # Slint Org Chart Library
//!
//! A Slint component library for interactive organization charts: a
//! hierarchical dataset rendered as a pannable, zoomable tree of node cards
//! with collapse/expand controls in three directions, drag-and-drop
//! re-parenting and image/PDF export.
//!
//! ## Features
//!
//! - **Canonical Dataset** - One nested [`HierarchyNode`] tree as the single
//!   source of structural truth; all UI state is derived and ephemeral
//! - **Relationship Tags** - Compact per-node codes describing depth,
//!   siblings and children, driving which edge controls render
//! - **Broadcast Channels** - Latest-value drag and selection channels;
//!   every mounted node stays in sync without central bookkeeping
//! - **Matrix-String Viewport** - Pan and zoom as CSS-style `matrix(...)`
//!   strings with exclusive zoom bounds
//! - **Pluggable Export** - PNG and single-page PDF through embedder-supplied
//!   capture and download traits
//!
//! ## Core Types
//!
//! - [`OrgChartController`] - Wires everything together; clone it into your
//!   window callbacks
//! - [`HierarchyNode`] - The dataset tree, serde-round-trippable with
//!   arbitrary extra fields preserved
//! - [`ChartView`] - The mounted per-node UI state and collapse machinery
//! - [`Channel`] - Latest-value broadcast used for drag and selection
//!
//! ## Quick Start
//!
//! ```ignore
//! use slint_org_chart::{ChartOptions, HierarchyNode, OrgChartController};
//!
//! let dataset = HierarchyNode::with_labels(1, "Ada", "CEO")
//!     .with_child(HierarchyNode::with_labels(2, "Grace", "CTO"));
//! let ctrl = OrgChartController::new(dataset, ChartOptions::default());
//! ```

pub mod broadcast;
pub mod controller;
pub mod export;
pub mod hierarchy;
pub mod relationship;
pub mod selection;
pub mod transform;
pub mod tree;

pub use broadcast::{Channel, Subscription};
pub use controller::{ChartOptions, CursorStyle, OrgChartController};
pub use export::{
    CaptureOptions, DownloadSink, ExportError, ExportFormat, FileSink, Rasterizer, Snapshot,
};
pub use hierarchy::{add_child, remove_node, HierarchyError, HierarchyNode, NodeId};
pub use relationship::{compute_tags, RelationshipTag, TagMap};
pub use selection::SelectionManager;
pub use transform::{
    apply_pan, apply_zoom, pan_baseline, recenter, recenter_and_rescale, rescale, scale_of,
    translate_of, Matrix,
};
pub use tree::{ChartView, NodeDecor, NodeUiState};
