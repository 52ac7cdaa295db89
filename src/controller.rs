//! High-level controller for organization chart applications.
//!
//! The [`OrgChartController`] ties the pieces together: the canonical
//! dataset, relationship tags, the mounted [`ChartView`], the viewport
//! transform, selection and drag broadcasting, and export. Embedders wire
//! its callback factories into their window and keep the rest of the crate
//! out of sight.
//!
//! # Example
//!
//! ```ignore
//! use slint_org_chart::{ChartOptions, HierarchyNode, OrgChartController};
//!
//! slint::include_modules!();
//!
//! fn main() {
//!     let window = MainWindow::new().unwrap();
//!     let dataset = load_team_dataset();
//!     let ctrl = OrgChartController::new(dataset, ChartOptions {
//!         pan: true,
//!         zoom: true,
//!         draggable: true,
//!         ..ChartOptions::default()
//!     });
//!     let w = window.as_weak();
//!
//!     window.on_pan_start(ctrl.pan_start_callback());
//!     window.on_pan_end(ctrl.pan_end_callback());
//!     window.on_wheel(ctrl.wheel_callback());
//!
//!     window.on_pan_move({
//!         let ctrl = ctrl.clone();
//!         let w = w.clone();
//!         move |x, y, touches| {
//!             ctrl.pan_move(x, y, touches as u32);
//!             if let Some(w) = w.upgrade() {
//!                 w.set_chart_transform(ctrl.transform());
//!             }
//!         }
//!     });
//!
//!     window.on_node_clicked(ctrl.click_node_callback());
//!     window.on_chart_clicked(ctrl.click_chart_callback());
//!
//!     window.run().unwrap();
//! }
//! ```

use crate::broadcast::Channel;
use crate::export::{
    deliver, CaptureOptions, DownloadSink, ExportError, ExportFormat, Rasterizer,
};
use crate::hierarchy::{add_child, remove_node, HierarchyError, HierarchyNode, NodeId};
use crate::relationship::{compute_tags, TagMap};
use crate::selection::SelectionManager;
use crate::transform;
use crate::tree::ChartView;
use slint::SharedString;
use std::cell::RefCell;
use std::rc::Rc;

/// Wheel zoom step per tick.
const ZOOM_IN_FACTOR: f32 = 1.2;
const ZOOM_OUT_FACTOR: f32 = 1.0 / 1.2;

/// Chart behavior switches. Interaction features are opt-in; collapsing is
/// on by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub pan: bool,
    pub zoom: bool,
    /// Exclusive lower bound for the zoom scale.
    pub zoomout_limit: f32,
    /// Exclusive upper bound for the zoom scale.
    pub zoomin_limit: f32,
    pub draggable: bool,
    pub collapsible: bool,
    pub multiple_select: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            pan: false,
            zoom: false,
            zoomout_limit: 0.5,
            zoomin_limit: 7.0,
            draggable: false,
            collapsible: true,
            multiple_select: false,
        }
    }
}

/// Pointer cursor the chart surface should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Move,
}

impl CursorStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Move => "move",
        }
    }
}

type NodeCallback = Rc<RefCell<Option<Box<dyn Fn(NodeId)>>>>;

/// Controller that manages chart state and provides callback implementations.
///
/// Holds the canonical dataset, the derived relationship tags, the mounted
/// view with per-node UI state, the viewport transform and the drag and
/// selection broadcast channels.
///
/// Clone this controller to share it across callbacks.
#[derive(Clone)]
pub struct OrgChartController {
    options: Rc<ChartOptions>,
    dataset: Rc<RefCell<HierarchyNode>>,
    tags: Rc<RefCell<TagMap>>,
    view: Rc<RefCell<ChartView>>,
    transform: Rc<RefCell<String>>,
    panning: Rc<RefCell<bool>>,
    pan_origin: Rc<RefCell<(f32, f32)>>,
    cursor: Rc<RefCell<CursorStyle>>,
    exporting: Rc<RefCell<bool>>,
    scroll: Rc<RefCell<(f32, f32)>>,
    drag: Channel<NodeId>,
    select: Channel<NodeId>,
    selection: Rc<RefCell<SelectionManager>>,
    on_click_node: NodeCallback,
    on_click_chart: Rc<RefCell<Option<Box<dyn Fn()>>>>,
    on_collapse_children: NodeCallback,
    on_set_scroll: Rc<RefCell<Option<Box<dyn Fn(f32, f32)>>>>,
}

impl OrgChartController {
    /// Create a controller over a dataset. Tags are computed and the view
    /// mounted immediately.
    pub fn new(dataset: HierarchyNode, options: ChartOptions) -> Self {
        let tags = compute_tags(&dataset);
        let dataset = Rc::new(RefCell::new(dataset));
        let drag = Channel::new();
        let select = Channel::new();
        let view = ChartView::build(&dataset, &tags, &drag, &select, options.multiple_select);
        Self {
            options: Rc::new(options),
            dataset,
            tags: Rc::new(RefCell::new(tags)),
            view: Rc::new(RefCell::new(view)),
            transform: Rc::new(RefCell::new(String::new())),
            panning: Rc::new(RefCell::new(false)),
            pan_origin: Rc::new(RefCell::new((0.0, 0.0))),
            cursor: Rc::new(RefCell::new(CursorStyle::Default)),
            exporting: Rc::new(RefCell::new(false)),
            scroll: Rc::new(RefCell::new((0.0, 0.0))),
            drag,
            select,
            selection: Rc::new(RefCell::new(SelectionManager::new())),
            on_click_node: Rc::new(RefCell::new(None)),
            on_click_chart: Rc::new(RefCell::new(None)),
            on_collapse_children: Rc::new(RefCell::new(None)),
            on_set_scroll: Rc::new(RefCell::new(None)),
        }
    }

    pub fn options(&self) -> ChartOptions {
        *self.options
    }

    /// Shared handle to the canonical dataset.
    pub fn dataset(&self) -> Rc<RefCell<HierarchyNode>> {
        self.dataset.clone()
    }

    /// Shared handle to the mounted view.
    pub fn view(&self) -> Rc<RefCell<ChartView>> {
        self.view.clone()
    }

    /// Relationship tag code for a node ("110" style), empty when unknown.
    pub fn tag_code(&self, id: NodeId) -> SharedString {
        self.tags
            .borrow()
            .get(&id)
            .map(|t| t.code())
            .unwrap_or_default()
            .into()
    }

    pub fn selection(&self) -> Rc<RefCell<SelectionManager>> {
        self.selection.clone()
    }

    pub fn drag_channel(&self) -> &Channel<NodeId> {
        &self.drag
    }

    pub fn select_channel(&self) -> &Channel<NodeId> {
        &self.select
    }

    pub fn cursor(&self) -> CursorStyle {
        *self.cursor.borrow()
    }

    pub fn is_panning(&self) -> bool {
        *self.panning.borrow()
    }

    pub fn is_exporting(&self) -> bool {
        *self.exporting.borrow()
    }

    /// Current viewport transform as a matrix string; empty until the first
    /// pan or zoom.
    pub fn transform(&self) -> SharedString {
        self.transform.borrow().as_str().into()
    }

    /// Replace the dataset and remount everything derived from it.
    pub fn set_dataset(&self, dataset: HierarchyNode) {
        *self.dataset.borrow_mut() = dataset;
        self.refresh();
    }

    /// Recompute tags and remount the view after a dataset change. The old
    /// view generation unsubscribes from both channels as it drops.
    pub fn refresh(&self) {
        let tags = compute_tags(&self.dataset.borrow());
        let view = ChartView::build(
            &self.dataset,
            &tags,
            &self.drag,
            &self.select,
            self.options.multiple_select,
        );
        *self.tags.borrow_mut() = tags;
        *self.view.borrow_mut() = view;
    }

    // === Pan and zoom ===

    /// Gesture start. Ignored when panning is disabled, when the pointer is
    /// on a node card or for multi-touch (`touches > 1`; 0 means mouse).
    pub fn pan_start(&self, page_x: f32, page_y: f32, on_node: bool, touches: u32) {
        if on_node || !self.options.pan || touches > 1 {
            *self.panning.borrow_mut() = false;
            return;
        }
        *self.pan_origin.borrow_mut() =
            transform::pan_baseline(&self.transform.borrow(), page_x, page_y);
        *self.panning.borrow_mut() = true;
        *self.cursor.borrow_mut() = CursorStyle::Move;
    }

    /// Pointer moved during a pan: the new translate is the pointer position
    /// minus the gesture baseline. Multi-touch moves are ignored, like the
    /// gesture start.
    pub fn pan_move(&self, page_x: f32, page_y: f32, touches: u32) {
        if !self.options.pan || !*self.panning.borrow() || touches > 1 {
            return;
        }
        let (ox, oy) = *self.pan_origin.borrow();
        let next = transform::apply_pan(&self.transform.borrow(), page_x - ox, page_y - oy);
        *self.transform.borrow_mut() = next;
    }

    pub fn pan_end(&self) {
        *self.panning.borrow_mut() = false;
        *self.cursor.borrow_mut() = CursorStyle::Default;
    }

    /// Wheel zoom: one step in for upward ticks, one step out for downward.
    pub fn wheel(&self, delta_y: f32) {
        if !self.options.zoom {
            return;
        }
        let factor = if delta_y < 0.0 {
            ZOOM_IN_FACTOR
        } else {
            ZOOM_OUT_FACTOR
        };
        self.zoom_by(factor);
    }

    /// Multiply the current scale by `factor`, bounded by the configured
    /// exclusive zoom limits.
    pub fn zoom_by(&self, factor: f32) {
        let mut transform = self.transform.borrow_mut();
        let next = transform::apply_zoom(
            &transform,
            factor,
            self.options.zoomout_limit,
            self.options.zoomin_limit,
        );
        if next == *transform && !transform.is_empty() {
            tracing::debug!(factor, "zoom rejected at scale limit");
        }
        *transform = next;
    }

    pub fn recenter(&self) {
        let next = transform::recenter(&self.transform.borrow());
        *self.transform.borrow_mut() = next;
    }

    pub fn rescale(&self) {
        let next = transform::rescale(&self.transform.borrow());
        *self.transform.borrow_mut() = next;
    }

    /// Reset translate and scale in one atomic step.
    pub fn recenter_and_rescale(&self) {
        let next = transform::recenter_and_rescale(&self.transform.borrow());
        *self.transform.borrow_mut() = next;
    }

    // === Selection ===

    /// Node card clicked: embedder callback first, then the selection
    /// broadcast.
    pub fn click_node(&self, id: NodeId) {
        if let Some(cb) = self.on_click_node.borrow().as_ref() {
            cb(id);
        }
        self.selection
            .borrow_mut()
            .apply(Some(id), self.options.multiple_select);
        self.select.publish(id);
    }

    /// Chart surface clicked. Only clicks outside any node card count; those
    /// notify the embedder and clear the selection.
    pub fn click_chart(&self, on_node: bool) {
        if on_node {
            return;
        }
        if let Some(cb) = self.on_click_chart.borrow().as_ref() {
            cb();
        }
        self.selection
            .borrow_mut()
            .apply(None, self.options.multiple_select);
        self.select.clear();
    }

    // === Collapse ===

    pub fn toggle_ancestors(&self, id: NodeId) {
        if self.options.collapsible {
            self.view.borrow().toggle_ancestors(id);
        }
    }

    pub fn toggle_siblings(&self, id: NodeId) {
        if self.options.collapsible {
            self.view.borrow().toggle_siblings(id);
        }
    }

    /// Bottom-edge click; notifies the embedder with the acted node after
    /// the view state has changed.
    pub fn toggle_children(&self, id: NodeId) {
        if !self.options.collapsible {
            return;
        }
        if self.view.borrow().toggle_children(id) {
            if let Some(cb) = self.on_collapse_children.borrow().as_ref() {
                cb(id);
            }
        }
    }

    pub fn expand_all_nodes(&self) {
        self.view.borrow().expand_all();
    }

    pub fn add_arrows(&self, id: NodeId) {
        self.view.borrow().add_arrows(id);
    }

    pub fn remove_arrows(&self, id: NodeId) {
        self.view.borrow().remove_arrows(id);
    }

    // === Drag and drop ===

    /// Drag began on a node. Broadcasts the dragged id (every mounted node
    /// updates its `drop_allowed`) and returns the dragged subtree serialized
    /// as the drag data. Inert when dragging is disabled.
    pub fn drag_start(&self, id: NodeId) -> Option<SharedString> {
        if !self.options.draggable || *self.exporting.borrow() {
            return None;
        }
        let payload = {
            let root = self.dataset.borrow();
            let subtree = root.locate(id)?;
            serde_json::to_string(subtree).unwrap_or_default()
        };
        self.drag.publish(id);
        Some(payload.into())
    }

    /// Drag finished without a drop.
    pub fn drag_end(&self) {
        self.drag.clear();
    }

    /// Drop on `target`. The payload is the string from [`drag_start`]; only
    /// its id matters, the mutation moves the live subtree. Returns `true`
    /// when the hierarchy changed.
    ///
    /// [`drag_start`]: Self::drag_start
    pub fn drop_on(&self, target: NodeId, payload: &str) -> bool {
        let Ok(dropped) = serde_json::from_str::<HierarchyNode>(payload) else {
            return false;
        };
        let dragged = dropped.id;
        let allowed = self
            .view
            .borrow()
            .state(target)
            .is_some_and(|s| s.borrow().drop_allowed);
        // Clear before mutating so no subscriber runs against a half-moved
        // dataset.
        self.drag.clear();
        if !allowed {
            return false;
        }
        self.change_hierarchy(dragged, target).is_ok()
    }

    /// Reparent `dragged` under `target`: remove, then re-attach as the last
    /// child. The dataset is untouched when either step fails.
    pub fn change_hierarchy(&self, dragged: NodeId, target: NodeId) -> Result<(), HierarchyError> {
        {
            let mut root = self.dataset.borrow_mut();
            let snapshot = root.clone();
            let moved = match remove_node(&mut root, dragged) {
                Ok(moved) => moved,
                Err(e) => {
                    *root = snapshot;
                    tracing::warn!(dragged, target, error = %e, "reparent rolled back");
                    return Err(e);
                }
            };
            if let Err(e) = add_child(&mut root, target, moved) {
                *root = snapshot;
                tracing::warn!(dragged, target, error = %e, "reparent rolled back");
                return Err(e);
            }
        }
        tracing::debug!(dragged, target, "hierarchy changed");
        self.refresh();
        Ok(())
    }

    // === Export ===

    /// Record the embedder's current scroll offsets; restored after export.
    pub fn handle_scroll(&self, left: f32, top: f32) {
        *self.scroll.borrow_mut() = (left, top);
    }

    /// Export the chart content at the given extent. Non-reentrant: a second
    /// call while one runs fails with [`ExportError::AlreadyExporting`].
    /// The embedder is asked to scroll to the origin before capture so a
    /// scrolled viewport never clips the output; the recorded offsets are
    /// put back and the exporting flag cleared whether or not the capture
    /// succeeds. Returns the saved filename.
    pub fn export_to(
        &self,
        basename: Option<&str>,
        format: &str,
        width: u32,
        height: u32,
        rasterizer: &dyn Rasterizer,
        sink: &dyn DownloadSink,
    ) -> Result<String, ExportError> {
        {
            let mut exporting = self.exporting.borrow_mut();
            if *exporting {
                return Err(ExportError::AlreadyExporting);
            }
            *exporting = true;
        }
        let saved_scroll = *self.scroll.borrow();
        if let Some(cb) = self.on_set_scroll.borrow().as_ref() {
            cb(0.0, 0.0);
        }

        let format = ExportFormat::parse(format);
        let result = rasterizer
            .capture(&CaptureOptions::full_content(width, height))
            .and_then(|snapshot| deliver(&snapshot, basename, format, sink));

        if let Some(cb) = self.on_set_scroll.borrow().as_ref() {
            cb(saved_scroll.0, saved_scroll.1);
        }
        *self.exporting.borrow_mut() = false;

        match &result {
            Ok(filename) => tracing::info!(filename = %filename, %format, "chart exported"),
            Err(e) => tracing::warn!(error = %e, "chart export failed"),
        }
        result
    }

    // === Embedder callbacks ===

    pub fn set_on_click_node(&self, f: impl Fn(NodeId) + 'static) {
        *self.on_click_node.borrow_mut() = Some(Box::new(f));
    }

    pub fn set_on_click_chart(&self, f: impl Fn() + 'static) {
        *self.on_click_chart.borrow_mut() = Some(Box::new(f));
    }

    pub fn set_on_collapse_children(&self, f: impl Fn(NodeId) + 'static) {
        *self.on_collapse_children.borrow_mut() = Some(Box::new(f));
    }

    /// The embedder applies the given scroll offsets to the chart container.
    /// Used by export to scroll to the origin before capture and back after.
    pub fn set_on_set_scroll(&self, f: impl Fn(f32, f32) + 'static) {
        *self.on_set_scroll.borrow_mut() = Some(Box::new(f));
    }

    // === Callback factories ===

    /// Returns a callback for `pan-start(page-x, page-y, on-node, touches)`.
    pub fn pan_start_callback(&self) -> impl Fn(f32, f32, bool, i32) {
        let ctrl = self.clone();
        move |x, y, on_node, touches| ctrl.pan_start(x, y, on_node, touches.max(0) as u32)
    }

    /// Returns a callback for `pan-move(page-x, page-y, touches)`.
    pub fn pan_move_callback(&self) -> impl Fn(f32, f32, i32) {
        let ctrl = self.clone();
        move |x, y, touches| ctrl.pan_move(x, y, touches.max(0) as u32)
    }

    /// Returns a callback for `pan-end`.
    pub fn pan_end_callback(&self) -> impl Fn() {
        let ctrl = self.clone();
        move || ctrl.pan_end()
    }

    /// Returns a callback for `wheel(delta-y)`.
    pub fn wheel_callback(&self) -> impl Fn(f32) {
        let ctrl = self.clone();
        move |delta_y| ctrl.wheel(delta_y)
    }

    /// Returns a callback for `node-clicked(id)`.
    pub fn click_node_callback(&self) -> impl Fn(NodeId) {
        let ctrl = self.clone();
        move |id| ctrl.click_node(id)
    }

    /// Returns a callback for `chart-clicked(on-node)`.
    pub fn click_chart_callback(&self) -> impl Fn(bool) {
        let ctrl = self.clone();
        move |on_node| ctrl.click_chart(on_node)
    }

    /// Returns a callback for `node-drag-started(id)`.
    pub fn drag_start_callback(&self) -> impl Fn(NodeId) -> SharedString {
        let ctrl = self.clone();
        move |id| ctrl.drag_start(id).unwrap_or_default()
    }

    /// Returns a callback for `node-dropped(target, payload)`.
    pub fn drop_callback(&self) -> impl Fn(NodeId, SharedString) -> bool {
        let ctrl = self.clone();
        move |target, payload| ctrl.drop_on(target, payload.as_str())
    }
}
