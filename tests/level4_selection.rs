//! Level 4: Selection Tests
//!
//! Click handling, the selection broadcast and multi-select accumulation.

mod common;

use common::harness::ChartHarness;
use slint_org_chart::ChartOptions;

fn multi_select_options() -> ChartOptions {
    ChartOptions {
        multiple_select: true,
        ..ChartOptions::default()
    }
}

#[test]
fn test_click_node_selects_and_notifies() {
    let harness = ChartHarness::new(ChartOptions::default());

    harness.ctrl.click_node(2);
    assert_eq!(*harness.log.clicked_nodes.borrow(), vec![2]);
    assert!(harness.flag(2, |s| s.selected));
    assert!(harness.ctrl.selection().borrow().contains(2));
    assert_eq!(harness.ctrl.select_channel().current(), Some(2));
}

#[test]
fn test_single_select_replaces_previous() {
    let harness = ChartHarness::new(ChartOptions::default());

    harness.ctrl.click_node(2);
    harness.ctrl.click_node(3);

    assert!(!harness.flag(2, |s| s.selected));
    assert!(harness.flag(3, |s| s.selected));
    let selection = harness.ctrl.selection();
    assert_eq!(selection.borrow().len(), 1);
    assert!(selection.borrow().contains(3));
}

#[test]
fn test_multi_select_accumulates() {
    let harness = ChartHarness::new(multi_select_options());

    harness.ctrl.click_node(2);
    harness.ctrl.click_node(3);

    assert!(harness.flag(2, |s| s.selected));
    assert!(harness.flag(3, |s| s.selected));
    let selection = harness.ctrl.selection();
    assert_eq!(selection.borrow().len(), 2);
}

#[test]
fn test_chart_click_outside_clears_selection() {
    let harness = ChartHarness::new(multi_select_options());

    harness.ctrl.click_node(2);
    harness.ctrl.click_node(3);
    harness.ctrl.click_chart(false);

    assert_eq!(*harness.log.chart_clicks.borrow(), 1);
    assert!(harness.ctrl.selection().borrow().is_empty());
    assert!(!harness.flag(2, |s| s.selected));
    assert!(!harness.flag(3, |s| s.selected));
    assert_eq!(harness.ctrl.select_channel().current(), None);
}

#[test]
fn test_chart_click_on_node_is_ignored() {
    let harness = ChartHarness::new(ChartOptions::default());

    harness.ctrl.click_node(2);
    harness.ctrl.click_chart(true);

    assert_eq!(*harness.log.chart_clicks.borrow(), 0);
    assert!(harness.flag(2, |s| s.selected));
}

#[test]
fn test_callback_fires_before_selection_updates() {
    let harness = ChartHarness::new(ChartOptions::default());
    let ctrl = harness.ctrl.clone();

    // The click callback observes the state before the broadcast lands.
    let seen = std::rc::Rc::new(std::cell::RefCell::new(None));
    harness.ctrl.set_on_click_node({
        let seen = seen.clone();
        let ctrl = ctrl.clone();
        move |_| *seen.borrow_mut() = ctrl.select_channel().current()
    });

    harness.ctrl.click_node(2);
    assert_eq!(*seen.borrow(), None);

    harness.ctrl.click_node(3);
    assert_eq!(*seen.borrow(), Some(2));
}

#[test]
fn test_selection_survives_across_view_refresh_in_channel_only() {
    let harness = ChartHarness::new(ChartOptions::default());

    harness.ctrl.click_node(2);
    harness.ctrl.refresh();

    // The freshly mounted node picks the current broadcast value back up.
    assert!(harness.flag(2, |s| s.selected));
}
