//! Test harness wrapping an [`OrgChartController`] over a small fixed
//! dataset, with recording callbacks and export fakes.

use slint_org_chart::{
    CaptureOptions, ChartOptions, DownloadSink, ExportError, HierarchyNode, NodeId,
    OrgChartController, Rasterizer, Snapshot,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Install a subscriber once so traced paths show up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Standard test dataset:
///
/// 1 Ada (CEO)
/// ├── 2 Grace (CTO)
/// │   ├── 4 Edsger (Architect)
/// │   └── 5 Barbara (Engineer)
/// └── 3 Jean (CFO)
pub fn sample_dataset() -> HierarchyNode {
    HierarchyNode::with_labels(1, "Ada", "CEO")
        .with_child(
            HierarchyNode::with_labels(2, "Grace", "CTO")
                .with_child(HierarchyNode::with_labels(4, "Edsger", "Architect"))
                .with_child(HierarchyNode::with_labels(5, "Barbara", "Engineer")),
        )
        .with_child(HierarchyNode::with_labels(3, "Jean", "CFO"))
}

/// Records callback invocations for later assertion.
#[derive(Default, Clone)]
pub struct CallbackLog {
    pub clicked_nodes: Rc<RefCell<Vec<NodeId>>>,
    pub chart_clicks: Rc<RefCell<u32>>,
    pub collapsed_children: Rc<RefCell<Vec<NodeId>>>,
    /// Every scroll offset the controller asked the embedder to apply.
    pub applied_scrolls: Rc<RefCell<Vec<(f32, f32)>>>,
}

pub struct ChartHarness {
    pub ctrl: OrgChartController,
    pub log: CallbackLog,
}

impl ChartHarness {
    pub fn new(options: ChartOptions) -> Self {
        Self::with_dataset(sample_dataset(), options)
    }

    pub fn with_dataset(dataset: HierarchyNode, options: ChartOptions) -> Self {
        init_tracing();
        let ctrl = OrgChartController::new(dataset, options);
        let log = CallbackLog::default();

        ctrl.set_on_click_node({
            let clicked = log.clicked_nodes.clone();
            move |id| clicked.borrow_mut().push(id)
        });
        ctrl.set_on_click_chart({
            let clicks = log.chart_clicks.clone();
            move || *clicks.borrow_mut() += 1
        });
        ctrl.set_on_collapse_children({
            let collapsed = log.collapsed_children.clone();
            move |id| collapsed.borrow_mut().push(id)
        });
        ctrl.set_on_set_scroll({
            let applied = log.applied_scrolls.clone();
            move |l, t| applied.borrow_mut().push((l, t))
        });

        Self { ctrl, log }
    }

    /// Read a UI-state flag of a mounted node.
    pub fn flag(&self, id: NodeId, f: impl Fn(&slint_org_chart::NodeUiState) -> bool) -> bool {
        let view = self.ctrl.view();
        let view = view.borrow();
        let state = view.state(id).expect("node should be mounted");
        let state = state.borrow();
        f(&state)
    }
}

/// Rasterizer returning a solid light-grey capture of the requested size.
pub struct SolidRasterizer;

impl Rasterizer for SolidRasterizer {
    fn capture(&self, options: &CaptureOptions) -> Result<Snapshot, ExportError> {
        let mut rgba = Vec::with_capacity((options.width * options.height * 4) as usize);
        for _ in 0..options.width * options.height {
            rgba.extend_from_slice(&[250, 250, 250, 255]);
        }
        Ok(Snapshot::new(options.width, options.height, rgba))
    }
}

/// Rasterizer that always fails, for error-path tests.
pub struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn capture(&self, _options: &CaptureOptions) -> Result<Snapshot, ExportError> {
        Err(ExportError::Capture("no surface".into()))
    }
}

/// Sink recording saved files in memory.
#[derive(Default)]
pub struct MemorySink {
    pub saved: RefCell<Vec<(String, Vec<u8>)>>,
}

impl DownloadSink for MemorySink {
    fn supports_blob(&self) -> bool {
        true
    }

    fn save_blob(&self, filename: &str, bytes: &[u8]) -> Result<(), ExportError> {
        self.saved
            .borrow_mut()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}
