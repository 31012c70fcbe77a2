//! Review queue over projected rows.

use crate::projection::rows::Row;
use std::cmp::Reverse;

/// Rows flagged for prioritized review, highest savings first, then lowest
/// effort, then table order.
///
/// Rows without a savings level sort after every rated row; a missing
/// effort level sorts after every rated effort.
pub fn review_queue(rows: &[Row]) -> Vec<&Row> {
    let mut queue: Vec<&Row> = rows.iter().filter(|row| row.priority_review).collect();
    queue.sort_by_key(|row| {
        (
            Reverse(row.savings.map(|level| level.weight())),
            row.effort.map_or(u8::MAX, |level| level.weight()),
        )
    });
    queue
}

#[cfg(test)]
mod tests {
    use super::review_queue;
    use crate::model::node::{Level, Node, ROOT_ID};
    use crate::model::tree::{CollapsedSet, PlanTree};
    use crate::projection::rows::project_rows;
    use crate::projection::schedule::aggregate;

    fn flagged(id: &str, savings: Option<Level>, effort: Option<Level>, review: bool) -> Node {
        let mut node = Node::new(id, id, Some(ROOT_ID.to_string()));
        node.savings = savings;
        node.effort = effort;
        node.priority_review = review;
        node
    }

    #[test]
    fn orders_by_savings_then_effort_then_path() {
        let mut tree = PlanTree::seeded(Node::root("Programme"));
        let nodes = [
            flagged("medium-low", Some(Level::Medium), Some(Level::Low), true),
            flagged("high-high", Some(Level::High), Some(Level::High), true),
            flagged("unrated", None, None, true),
            flagged("high-low", Some(Level::High), Some(Level::Low), true),
            flagged("ignored", Some(Level::High), Some(Level::Low), false),
            flagged("high-low-later", Some(Level::High), Some(Level::Low), true),
        ];
        for node in nodes {
            tree.children
                .entry(ROOT_ID.to_string())
                .or_default()
                .push(node.id.clone());
            tree.children.entry(node.id.clone()).or_default();
            tree.nodes.insert(node.id.clone(), node);
        }
        let rows = project_rows(&tree, &CollapsedSet::new(), &aggregate(&tree));

        let order: Vec<&str> = review_queue(&rows)
            .into_iter()
            .map(|row| row.id.as_str())
            .collect();

        assert_eq!(
            order,
            vec!["high-low", "high-low-later", "high-high", "medium-low", "unrated"]
        );
    }
}
