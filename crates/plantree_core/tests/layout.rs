use plantree_core::projection::layout::layout;
use plantree_core::seed::energy_programme;
use plantree_core::{CostLegend, LayoutMetrics, ROOT_ID};

#[test]
fn layout_is_deterministic_across_calls() {
    let store = energy_programme(CostLegend::default());
    let metrics = LayoutMetrics::default();

    let first = layout(store.tree(), store.collapsed(), &metrics);
    let second = layout(store.tree(), store.collapsed(), &metrics);

    assert_eq!(first, second);
    assert_eq!(first.nodes.len(), 28);
    assert_eq!(first.edges.len(), 27);
}

#[test]
fn collapsed_category_hides_its_initiatives_only() {
    let mut store = energy_programme(CostLegend::default());
    store.set_collapsed("coal", true);

    let diagram = layout(store.tree(), store.collapsed(), &LayoutMetrics::default());

    assert_eq!(diagram.nodes.len(), 28 - 7);
    assert!(diagram.node("biomass").is_none());
    let coal = diagram.node("coal").unwrap();
    assert!(coal.collapsible);
    assert!(coal.collapsed);
    assert!(diagram.edges.iter().all(|edge| edge.source != "coal"));
}

#[test]
fn boxes_on_one_level_do_not_overlap() {
    let store = energy_programme(CostLegend::default());
    let metrics = LayoutMetrics::default();
    let diagram = layout(store.tree(), store.collapsed(), &metrics);

    let mut leaves: Vec<(f64, f64)> = diagram
        .nodes
        .values()
        .filter(|node| store.node(&node.id).and_then(|n| n.parent.as_deref()) != Some(ROOT_ID))
        .filter(|node| node.id != ROOT_ID)
        .map(|node| (node.x, node.y))
        .collect();
    leaves.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in leaves.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= metrics.node_width);
    }

    for node in diagram.nodes.values() {
        assert!(node.x >= 0.0 && node.x + node.width <= diagram.width);
        assert!(node.y + node.height <= diagram.height);
    }
}

#[test]
fn edges_start_at_parent_bottom_and_end_at_child_top() {
    let store = energy_programme(CostLegend::default());
    let diagram = layout(store.tree(), store.collapsed(), &LayoutMetrics::default());

    for edge in &diagram.edges {
        let parent = diagram.node(&edge.source).unwrap();
        let child = diagram.node(&edge.target).unwrap();
        let [start, _, _, end] = edge.points;
        assert_eq!(start.x, parent.x + parent.width / 2.0);
        assert_eq!(start.y, parent.y + parent.height);
        assert_eq!(end.x, child.x + child.width / 2.0);
        assert_eq!(end.y, child.y);
    }
}
