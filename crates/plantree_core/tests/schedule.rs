use plantree_core::projection::schedule::aggregate;
use plantree_core::{Node, NodePatch, PlanConfig, PlanViews, TreeStore, ROOT_ID};

fn leaf(progress: f64) -> NodePatch {
    NodePatch::progress(progress)
}

fn dated(start: &str, duration: u32) -> NodePatch {
    NodePatch {
        start_date: Some(start.to_string()),
        duration: Some(duration),
        ..NodePatch::default()
    }
}

#[test]
fn progress_is_mean_of_children_at_every_level() {
    let mut store = TreeStore::new(Node::root("Programme"));
    store.add_child_with_id(ROOT_ID, "c1", NodePatch::default()).unwrap();
    store.add_child_with_id(ROOT_ID, "c2", NodePatch::default()).unwrap();
    store.add_child("c1", leaf(0.6)).unwrap();
    store.add_child("c1", leaf(1.0)).unwrap();
    store.add_child("c2", leaf(50.0)).unwrap();

    let schedule = aggregate(store.tree());

    assert!((schedule.progress_of("c1") - 0.8).abs() < 1e-9);
    assert!((schedule.progress_of("c2") - 0.5).abs() < 1e-9);
    assert!((schedule.progress_of(ROOT_ID) - 0.65).abs() < 1e-9);
}

#[test]
fn parent_dates_span_children_and_inherit_required_date() {
    let mut store = TreeStore::new(Node::root("Programme"));
    store.add_child_with_id(ROOT_ID, "coal", NodePatch::default()).unwrap();
    store.add_child_with_id("coal", "trial", dated("01-09-2025", 4)).unwrap();

    let views = PlanViews::derive(&store, &PlanConfig::default());
    let coal = views.schedule.entry("coal");
    assert_eq!(coal.start_text().as_deref(), Some("01-09-2025"));
    assert_eq!(coal.end_text().as_deref(), Some("05-09-2025"));
    assert_eq!(coal.duration, Some(4));

    let row = views.rows.iter().find(|row| row.id == "coal").unwrap();
    assert_eq!(row.date_required.as_deref(), Some("05-09-2025"));
}

#[test]
fn parent_range_covers_earliest_start_and_latest_end() {
    let mut store = TreeStore::new(Node::root("Programme"));
    store.add_child_with_id(ROOT_ID, "coal", NodePatch::default()).unwrap();
    store.add_child("coal", dated("2025-09-10", 2)).unwrap();
    store.add_child("coal", dated("03-09-2025", 3)).unwrap();
    store
        .add_child(
            "coal",
            NodePatch {
                date_required: Some("not a date".to_string()),
                ..NodePatch::default()
            },
        )
        .unwrap();

    let entry = aggregate(store.tree()).entry("coal");
    assert_eq!(entry.start_text().as_deref(), Some("03-09-2025"));
    assert_eq!(entry.end_text().as_deref(), Some("12-09-2025"));
    assert_eq!(entry.duration, Some(9));
}

#[test]
fn undated_tree_has_no_range() {
    let mut store = TreeStore::new(Node::root("Programme"));
    store.add_child(ROOT_ID, NodePatch::default()).unwrap();

    let schedule = aggregate(store.tree());
    let root = schedule.entry(ROOT_ID);
    assert_eq!(root.start, None);
    assert_eq!(root.end, None);
    assert_eq!(schedule.progress_of(ROOT_ID), 0.0);
}
