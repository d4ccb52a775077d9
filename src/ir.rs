use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::data::AgeCategory;

static NAMESPACE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*?: ").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCell {
    pub genre: String,
    pub age: AgeCategory,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapData {
    /// Cells of the displayed genres, in discovery order.
    pub cells: Vec<HeatCell>,
    /// Every (genre, age) group, including genres withheld from display.
    pub all_cells: Vec<HeatCell>,
    /// Displayed genres, in discovery order.
    pub categories: Vec<String>,
    /// Colour domain over `all_cells`.
    pub rating_extent: Option<(f64, f64)>,
}

impl HeatmapData {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Node-id namespace, one per flow stage of the book pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FlowNamespace {
    Genre,
    Age,
    Adapted,
}

impl FlowNamespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Genre => "Genre",
            Self::Age => "Age",
            Self::Adapted => "Adapted",
        }
    }

    pub fn node_id(self, label: &str) -> String {
        format!("{}: {}", self.prefix(), label)
    }

    pub fn of_id(id: &str) -> Option<(Self, &str)> {
        let (prefix, label) = id.split_once(": ")?;
        let namespace = match prefix {
            "Genre" => Self::Genre,
            "Age" => Self::Age,
            "Adapted" => Self::Adapted,
            _ => return None,
        };
        Some((namespace, label))
    }
}

/// Topological role of a flow node, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FlowStage {
    Source,
    Middle,
    Sink,
}

impl FlowStage {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            Self::Source => 0,
            Self::Middle => 1,
            Self::Sink => 2,
        }
    }

    pub(crate) fn from_degree(has_incoming: bool, has_outgoing: bool) -> Self {
        match (has_incoming, has_outgoing) {
            (true, true) => Self::Middle,
            (true, false) => Self::Sink,
            _ => Self::Source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub stage: FlowStage,
    /// First-seen position during edge traversal.
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    /// Builds the node set in two passes: collect distinct ids in first-seen
    /// order, then assign stages from in/out degree. Zero-weight edges and
    /// self loops never make it into the graph.
    pub fn from_edges(edges: Vec<FlowEdge>) -> Self {
        let edges: Vec<FlowEdge> = edges
            .into_iter()
            .filter(|edge| edge.weight > 0 && edge.source != edge.target)
            .collect();

        let mut ids: Vec<&str> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for edge in &edges {
            for id in [edge.source.as_str(), edge.target.as_str()] {
                if !index.contains_key(id) {
                    index.insert(id, ids.len());
                    ids.push(id);
                }
            }
        }

        let mut has_incoming = vec![false; ids.len()];
        let mut has_outgoing = vec![false; ids.len()];
        for edge in &edges {
            has_outgoing[index[edge.source.as_str()]] = true;
            has_incoming[index[edge.target.as_str()]] = true;
        }

        let nodes = ids
            .iter()
            .enumerate()
            .map(|(order, id)| FlowNode {
                id: id.to_string(),
                label: display_label(id),
                stage: FlowStage::from_degree(has_incoming[order], has_outgoing[order]),
                order,
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// Human-facing label for a namespaced node id.
pub fn display_label(id: &str) -> String {
    match id {
        "Adapted: True" => "Movie Adaptation".to_string(),
        "Adapted: False" => "No Movie Adaptation".to_string(),
        _ => NAMESPACE_PREFIX_RE.replace(id, "").into_owned(),
    }
}
