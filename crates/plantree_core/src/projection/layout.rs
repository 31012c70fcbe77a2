//! Top-down node-link diagram layout.
//!
//! # Responsibility
//! - Place every visible node as a fixed-size box.
//! - Route one elbow edge per visible parent/child pair.
//!
//! # Invariants
//! - Pure: the tree and collapsed set are only read.
//! - Identical inputs produce bit-identical coordinates.
//! - Subtree extents are memoized by node id and rebuilt on every call.
//! - A node is placed at most once, even if the index contains a cycle.

use crate::config::LayoutMetrics;
use crate::model::node::{NodeId, ROOT_ID};
use crate::model::tree::{CollapsedSet, PlanTree};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Placed node rectangle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBox {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Node has children in the index, so it can be collapsed or expanded.
    pub collapsible: bool,
    pub collapsed: bool,
}

/// Elbow polyline: parent bottom-centre, down to the half gap, across,
/// down into the child's top-centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub points: [Point; 4],
}

/// Complete diagram in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub nodes: BTreeMap<NodeId, NodeBox>,
    /// Child subtree edges come before the edge into that child.
    pub edges: Vec<Edge>,
    pub width: f64,
    pub height: f64,
}

impl Diagram {
    fn empty(metrics: &LayoutMetrics) -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            width: metrics.min_canvas_width,
            height: metrics.min_canvas_height,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeBox> {
        self.nodes.get(id)
    }
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    width: f64,
    height: f64,
    /// Offset of the node box from the left edge of its subtree.
    root_x: f64,
    /// Offset of the first child subtree from the left edge.
    children_x: f64,
}

/// Lays out the visible tree below the root.
///
/// A missing root yields an empty diagram at the minimum canvas size.
pub fn layout(tree: &PlanTree, collapsed: &CollapsedSet, metrics: &LayoutMetrics) -> Diagram {
    if tree.root().is_none() {
        return Diagram::empty(metrics);
    }

    let visible = visible_forest(tree, collapsed);
    let mut pass = LayoutPass {
        tree,
        collapsed,
        metrics,
        visible: &visible,
        extents: HashMap::new(),
        nodes: BTreeMap::new(),
        edges: Vec::new(),
    };

    let root = pass.measure(ROOT_ID);
    let content_width = root.width + 2.0 * metrics.margin;
    let content_height = root.height + 2.0 * metrics.margin;
    let width = content_width.max(metrics.min_canvas_width);
    let height = content_height.max(metrics.min_canvas_height);

    let offset_x = (width - content_width) / 2.0;
    let offset_y = metrics.margin;
    pass.place(
        ROOT_ID,
        metrics.margin + offset_x,
        metrics.margin + offset_y,
    );

    debug!(
        "event=layout_pass module=layout status=ok nodes={} edges={} width={} height={}",
        pass.nodes.len(),
        pass.edges.len(),
        width,
        height
    );

    Diagram {
        nodes: pass.nodes,
        edges: pass.edges,
        width,
        height,
    }
}

/// Resolves each reachable node's visible children once, dropping ids
/// that are missing from the map or were already reached.
fn visible_forest<'a>(
    tree: &'a PlanTree,
    collapsed: &CollapsedSet,
) -> HashMap<&'a str, Vec<&'a str>> {
    let mut forest = HashMap::new();
    let mut seen = HashSet::from([ROOT_ID]);
    let mut stack = vec![ROOT_ID];
    while let Some(id) = stack.pop() {
        let Some((key, _)) = tree.nodes.get_key_value(id) else {
            continue;
        };
        let kids: Vec<&str> = tree
            .visible_children(id, collapsed)
            .into_iter()
            .filter(|kid| seen.insert(*kid))
            .collect();
        stack.extend(kids.iter().rev().copied());
        forest.insert(key.as_str(), kids);
    }
    forest
}

struct LayoutPass<'a> {
    tree: &'a PlanTree,
    collapsed: &'a CollapsedSet,
    metrics: &'a LayoutMetrics,
    visible: &'a HashMap<&'a str, Vec<&'a str>>,
    extents: HashMap<&'a str, Extent>,
    nodes: BTreeMap<NodeId, NodeBox>,
    edges: Vec<Edge>,
}

impl<'a> LayoutPass<'a> {
    fn children(&self, id: &str) -> &'a [&'a str] {
        let visible: &'a HashMap<&'a str, Vec<&'a str>> = self.visible;
        visible.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn measure(&mut self, id: &'a str) -> Extent {
        if let Some(extent) = self.extents.get(id) {
            return *extent;
        }
        let metrics = self.metrics;
        let kids = self.children(id);

        let mut children_width = 0.0;
        let mut max_child_height: f64 = 0.0;
        for &kid in kids {
            let child = self.measure(kid);
            children_width += child.width;
            max_child_height = max_child_height.max(child.height);
        }
        if !kids.is_empty() {
            children_width += metrics.h_gap * (kids.len() - 1) as f64;
        }

        let width = metrics.node_width.max(children_width);
        let height = if kids.is_empty() {
            metrics.node_height
        } else {
            metrics.node_height + metrics.v_gap + max_child_height
        };
        let extent = Extent {
            width,
            height,
            root_x: (width - metrics.node_width) / 2.0,
            children_x: (width - children_width) / 2.0,
        };
        self.extents.insert(id, extent);
        extent
    }

    /// Places the subtree of `id` with its bounding box at (`left`, `top`).
    fn place(&mut self, id: &'a str, left: f64, top: f64) {
        let metrics = self.metrics;
        let extent = self.measure(id);
        let node_x = left + extent.root_x;
        self.nodes.insert(
            id.to_string(),
            NodeBox {
                id: id.to_string(),
                x: node_x,
                y: top,
                width: metrics.node_width,
                height: metrics.node_height,
                collapsible: !self.tree.present_children(id).is_empty(),
                collapsed: self.collapsed.contains(id),
            },
        );

        let parent_cx = node_x + metrics.node_width / 2.0;
        let parent_bottom = top + metrics.node_height;
        let child_top = parent_bottom + metrics.v_gap;
        let elbow_y = child_top - metrics.v_gap / 2.0;

        let mut cursor = left + extent.children_x;
        for &kid in self.children(id) {
            let child = self.measure(kid);
            self.place(kid, cursor, child_top);

            let child_cx = cursor + child.root_x + metrics.node_width / 2.0;
            self.edges.push(Edge {
                source: id.to_string(),
                target: kid.to_string(),
                points: [
                    Point::new(parent_cx, parent_bottom),
                    Point::new(parent_cx, elbow_y),
                    Point::new(child_cx, elbow_y),
                    Point::new(child_cx, child_top),
                ],
            });
            cursor += child.width + metrics.h_gap;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::layout;
    use crate::config::LayoutMetrics;
    use crate::model::node::{Node, ROOT_ID};
    use crate::model::tree::{CollapsedSet, PlanTree};

    fn tree_with(edges: &[(&str, &str)]) -> PlanTree {
        let mut tree = PlanTree::seeded(Node::root("Programme"));
        for (parent, id) in edges {
            tree.nodes
                .insert(id.to_string(), Node::new(*id, *id, Some(parent.to_string())));
            tree.children
                .entry(parent.to_string())
                .or_default()
                .push(id.to_string());
            tree.children.entry(id.to_string()).or_default();
        }
        tree
    }

    #[test]
    fn lone_root_is_centred_in_minimum_canvas() {
        let tree = PlanTree::seeded(Node::root("Programme"));
        let diagram = layout(&tree, &CollapsedSet::new(), &LayoutMetrics::default());

        assert_eq!(diagram.width, 1920.0);
        assert_eq!(diagram.height, 1080.0);
        let root = diagram.node(ROOT_ID).unwrap();
        // content width 260 + 2*24 = 308, offset (1920 - 308) / 2 = 806
        assert_eq!(root.x, 24.0 + 806.0);
        assert_eq!(root.y, 48.0);
        assert!(!root.collapsible);
        assert!(diagram.edges.is_empty());
    }

    #[test]
    fn parent_is_centred_over_children_with_elbow_edges() {
        let tree = tree_with(&[(ROOT_ID, "a"), (ROOT_ID, "b")]);
        let diagram = layout(&tree, &CollapsedSet::new(), &LayoutMetrics::default());

        let root = diagram.node(ROOT_ID).unwrap();
        let a = diagram.node("a").unwrap();
        let b = diagram.node("b").unwrap();
        assert_eq!(b.x - a.x, 300.0);
        assert_eq!(root.x - a.x, 150.0);
        assert_eq!(a.y - root.y, 168.0);

        let edge = &diagram.edges[0];
        assert_eq!((edge.source.as_str(), edge.target.as_str()), (ROOT_ID, "a"));
        let [start, down, across, end] = edge.points;
        assert_eq!(start.x, root.x + 130.0);
        assert_eq!(start.y, root.y + 88.0);
        assert_eq!(down.x, start.x);
        assert_eq!(down.y, a.y - 40.0);
        assert_eq!(across.y, down.y);
        assert_eq!(across.x, a.x + 130.0);
        assert_eq!(end, super::Point::new(a.x + 130.0, a.y));
    }

    #[test]
    fn collapsed_children_are_hidden_but_node_stays_collapsible() {
        let tree = tree_with(&[(ROOT_ID, "a"), ("a", "a1")]);
        let mut collapsed = CollapsedSet::new();
        collapsed.insert("a".to_string());

        let diagram = layout(&tree, &collapsed, &LayoutMetrics::default());

        assert!(diagram.node("a1").is_none());
        let a = diagram.node("a").unwrap();
        assert!(a.collapsible);
        assert!(a.collapsed);
        assert_eq!(diagram.edges.len(), 1);
    }

    #[test]
    fn drifted_index_entries_are_ignored() {
        let mut tree = tree_with(&[(ROOT_ID, "a")]);
        tree.children
            .get_mut(ROOT_ID)
            .unwrap()
            .push("ghost".to_string());

        let diagram = layout(&tree, &CollapsedSet::new(), &LayoutMetrics::default());

        assert_eq!(diagram.nodes.len(), 2);
        assert_eq!(diagram.edges.len(), 1);
    }

    #[test]
    fn cyclic_index_does_not_loop() {
        let mut tree = tree_with(&[(ROOT_ID, "a"), ("a", "b")]);
        tree.children.get_mut("b").unwrap().push("a".to_string());

        let diagram = layout(&tree, &CollapsedSet::new(), &LayoutMetrics::default());

        assert_eq!(diagram.nodes.len(), 3);
        assert_eq!(diagram.edges.len(), 2);
    }

    #[test]
    fn wide_tree_grows_canvas() {
        let edges: Vec<(String, String)> = (0..10)
            .map(|i| (ROOT_ID.to_string(), format!("n{i}")))
            .collect();
        let refs: Vec<(&str, &str)> = edges
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_str()))
            .collect();
        let tree = tree_with(&refs);

        let diagram = layout(&tree, &CollapsedSet::new(), &LayoutMetrics::default());

        // 10 * 260 + 9 * 40 + 2 * 24
        assert_eq!(diagram.width, 3008.0);
        assert_eq!(diagram.node("n0").unwrap().x, 24.0);
    }
}
