//! Demo programme used by the CLI when no snapshot is given.

use crate::model::node::Level::{self, High, Low, Medium};
use crate::model::node::{Node, ROOT_ID};
use crate::model::snapshot::{CostLegend, Snapshot};
use crate::model::tree::{ChildrenIndex, CollapsedSet, NodeMap};
use crate::store::tree_store::TreeStore;

const TEXT_COLOUR: &str = "#0F172A";

const CATEGORIES: [(&str, &str, &str); 4] = [
    ("coal", "Coal", "Coal"),
    ("electricity", "Electricity (Steam & Turbines)", "Electricity"),
    ("recovery", "Recovery", "Recovery"),
    ("efficiency", "Energy Efficiency", "Energy Efficiency"),
];

const INITIATIVES: [(&str, &str, &str, Level, Level); 23] = [
    ("coal", "biomass", "Biomass Co-Firing", High, High),
    ("coal", "aircontrol", "Optimise Combustion & O2 Trim", Medium, Low),
    ("coal", "economiser", "Flue Gas Heat Recovery (Economiser/Air Preheater)", Medium, Medium),
    ("coal", "blowdown", "Boiler Blowdown Heat Recovery", Medium, Low),
    ("coal", "deaerator", "Feedwater & Deaerator Optimisation", Medium, Low),
    ("coal", "loadmgmt", "Boiler Load Management & Scheduling", Medium, Low),
    ("coal", "hotwell", "Hot-Well Recovery & Water Reuse", Low, Low),
    ("electricity", "pressureopt", "Steam Pressure Optimisation & Turbine Load", High, Medium),
    ("electricity", "tgeff", "Turbine Efficiency Improvement", High, High),
    ("electricity", "steamleaks", "Minimise Steam Leaks & Losses", Medium, Low),
    ("electricity", "condrec-steam", "Condensate Recovery (Steam System)", Medium, Medium),
    ("electricity", "insulation", "Steam System Insulation & Lagging", Medium, Low),
    ("recovery", "blsolids", "Maximise Black Liquor Solids & RB Usage", High, High),
    ("recovery", "mgo", "Closed-Loop Chemical Recovery (MgO)", High, High),
    ("recovery", "molten-s", "Use Molten Sulphur in Acid Plant", Medium, Medium),
    ("recovery", "hx-upgrades", "Process Heat Exchanger Upgrades", Medium, Medium),
    ("recovery", "condrec-proc", "Condensate & Hot Water Recovery (Process)", Medium, Medium),
    ("efficiency", "heatpumps", "Replace Electric Heaters with Heat Pumps", Low, Low),
    ("efficiency", "vsd", "Variable Speed Drives (VSDs) on Motors", High, Medium),
    ("efficiency", "turbovac", "Efficient Vacuum System (Turbovac)", Medium, Medium),
    ("efficiency", "lighting", "Lighting & HVAC Efficiency", Low, Low),
    ("efficiency", "compressedair", "Compressed Air System Optimisation", Medium, Low),
    ("efficiency", "training", "Process Optimisation & Training", Medium, Low),
];

fn category_colour(category: &str) -> &'static str {
    match category {
        "Coal" => "#FEF3C7",
        "Electricity" => "#E0F2FE",
        "Recovery" => "#D1FAE5",
        _ => "#FAE8FF",
    }
}

fn styled(mut node: Node, category: &str) -> Node {
    node.category = category.to_string();
    node.background = Some(category_colour(category).to_string());
    node.foreground = Some(TEXT_COLOUR.to_string());
    node
}

/// Energy optimisation programme: root, four categories, 23 initiatives.
pub fn energy_programme(legend: CostLegend) -> TreeStore {
    let mut nodes = NodeMap::new();
    let mut children = ChildrenIndex::new();

    nodes.insert(
        ROOT_ID.to_string(),
        styled(
            Node::root("Saiccor Energy Optimisation Program"),
            "Energy Efficiency",
        ),
    );
    children.insert(ROOT_ID.to_string(), Vec::new());

    for (id, label, category) in CATEGORIES {
        let node = styled(Node::new(id, label, Some(ROOT_ID.to_string())), category);
        nodes.insert(id.to_string(), node);
        children
            .entry(ROOT_ID.to_string())
            .or_default()
            .push(id.to_string());
        children.insert(id.to_string(), Vec::new());
    }

    for (parent, id, label, savings, effort) in INITIATIVES {
        let category = nodes
            .get(parent)
            .map(|node| node.category.clone())
            .unwrap_or_default();
        let mut node = styled(Node::new(id, label, Some(parent.to_string())), &category);
        node.savings = Some(savings);
        node.effort = Some(effort);
        nodes.insert(id.to_string(), node);
        children
            .entry(parent.to_string())
            .or_default()
            .push(id.to_string());
        children.insert(id.to_string(), Vec::new());
    }

    TreeStore::from_snapshot(Snapshot {
        data_map: nodes,
        children_map: children,
        collapsed: CollapsedSet::new(),
        cost_legend: legend,
    })
}
