use std::collections::HashMap;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::ir::{FlowGraph, FlowStage};
use crate::theme::Theme;

use super::{
    Baseline, FlowLayout, FlowLinkLayout, FlowNodeLayout, Rect, Size, TextAnchor, TextLayout,
};

/// Node rectangle produced by [`layout_flow`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePlacement {
    pub id: String,
    pub label: String,
    pub stage: FlowStage,
    /// `max(in-flow, out-flow)`.
    pub value: u64,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Link bands produced by [`layout_flow`]: `source_y*` on the source's right
/// edge, `target_y*` on the target's left edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkPlacement {
    pub source: String,
    pub target: String,
    pub weight: u64,
    pub x0: f32,
    pub x1: f32,
    pub source_y0: f32,
    pub source_y1: f32,
    pub target_y0: f32,
    pub target_y1: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowPlacement {
    pub nodes: Vec<NodePlacement>,
    pub links: Vec<LinkPlacement>,
}

struct EdgeData {
    from_idx: usize,
    to_idx: usize,
    weight: u64,
}

/// Places the nodes and link bands of `graph` inside `extent`.
///
/// Stages are recomputed from the edges that survive validation, so an edge
/// pointing at a node outside the node set is dropped without leaving a
/// phantom middle stage behind. Every occupied stage fills the extent height
/// exactly. Nodes keep their first-seen order within a stage.
pub fn layout_flow(
    graph: &FlowGraph,
    extent: Rect,
    node_width: f32,
    node_padding: f32,
) -> FlowPlacement {
    let mut node_idx: Vec<usize> = (0..graph.nodes.len()).collect();
    node_idx.sort_by_key(|idx| graph.nodes[*idx].order);
    let id_to_idx: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), idx))
        .collect();
    let node_count = graph.nodes.len();

    let mut edges_data: Vec<EdgeData> = Vec::with_capacity(graph.edges.len());
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_total = vec![0u64; node_count];
    let mut out_total = vec![0u64; node_count];

    for edge in &graph.edges {
        let (Some(&from_idx), Some(&to_idx)) = (
            id_to_idx.get(edge.source.as_str()),
            id_to_idx.get(edge.target.as_str()),
        ) else {
            tracing::warn!(
                source = %edge.source,
                target = %edge.target,
                "dropping flow edge with an unknown endpoint"
            );
            continue;
        };
        if edge.weight == 0 || from_idx == to_idx {
            continue;
        }
        let edge_idx = edges_data.len();
        edges_data.push(EdgeData {
            from_idx,
            to_idx,
            weight: edge.weight,
        });
        outgoing[from_idx].push(edge_idx);
        incoming[to_idx].push(edge_idx);
        out_total[from_idx] += edge.weight;
        in_total[to_idx] += edge.weight;
    }

    let stages: Vec<FlowStage> = (0..node_count)
        .map(|idx| FlowStage::from_degree(!incoming[idx].is_empty(), !outgoing[idx].is_empty()))
        .collect();
    let mut stage_nodes: Vec<Vec<usize>> = vec![Vec::new(); FlowStage::COUNT];
    for &idx in &node_idx {
        if incoming[idx].is_empty() && outgoing[idx].is_empty() {
            continue;
        }
        stage_nodes[stages[idx].index()].push(idx);
    }
    let columns: Vec<&Vec<usize>> = stage_nodes.iter().filter(|nodes| !nodes.is_empty()).collect();
    if columns.is_empty() {
        return FlowPlacement::default();
    }

    let node_width = node_width.min(extent.width).max(0.0);
    let column_gap = if columns.len() > 1 {
        (extent.width - node_width) / (columns.len() - 1) as f32
    } else {
        0.0
    };

    let value: Vec<u64> = (0..node_count).map(|idx| in_total[idx].max(out_total[idx])).collect();
    let mut node_x = vec![0.0f32; node_count];
    let mut node_y0 = vec![0.0f32; node_count];
    let mut node_y1 = vec![0.0f32; node_count];

    for (column, nodes) in columns.iter().enumerate() {
        let gaps = nodes.len().saturating_sub(1) as f32;
        let padding = if gaps > 0.0 {
            node_padding.min(extent.height * 0.5 / gaps)
        } else {
            0.0
        };
        let total: u64 = nodes.iter().map(|idx| value[*idx]).sum();
        let ky = (extent.height - gaps * padding) / total.max(1) as f32;
        let x = extent.x + column as f32 * column_gap;
        let mut y = extent.y;
        for &idx in nodes.iter() {
            node_x[idx] = x;
            node_y0[idx] = y;
            y += value[idx] as f32 * ky;
            node_y1[idx] = y;
            y += padding;
        }
    }

    let node_height = |idx: usize| node_y1[idx] - node_y0[idx];
    let mut source_band = vec![(0.0f32, 0.0f32); edges_data.len()];
    let mut target_band = vec![(0.0f32, 0.0f32); edges_data.len()];

    for idx in 0..node_count {
        let mut out_edges = outgoing[idx].clone();
        out_edges.sort_by(|a, b| {
            let ta = edges_data[*a].to_idx;
            let tb = edges_data[*b].to_idx;
            node_y0[ta].total_cmp(&node_y0[tb]).then(a.cmp(b))
        });
        let mut y = node_y0[idx];
        for edge_idx in out_edges {
            let width = edges_data[edge_idx].weight as f32 / out_total[idx] as f32 * node_height(idx);
            source_band[edge_idx] = (y, y + width);
            y += width;
        }

        let mut in_edges = incoming[idx].clone();
        in_edges.sort_by(|a, b| {
            let sa = edges_data[*a].from_idx;
            let sb = edges_data[*b].from_idx;
            node_y0[sa].total_cmp(&node_y0[sb]).then(a.cmp(b))
        });
        let mut y = node_y0[idx];
        for edge_idx in in_edges {
            let width = edges_data[edge_idx].weight as f32 / in_total[idx] as f32 * node_height(idx);
            target_band[edge_idx] = (y, y + width);
            y += width;
        }
    }

    let nodes = columns
        .iter()
        .flat_map(|&nodes| nodes)
        .map(|&idx| {
            let node = &graph.nodes[idx];
            NodePlacement {
                id: node.id.clone(),
                label: node.label.clone(),
                stage: stages[idx],
                value: value[idx],
                x0: node_x[idx],
                y0: node_y0[idx],
                x1: node_x[idx] + node_width,
                y1: node_y1[idx],
            }
        })
        .collect();

    let links = edges_data
        .iter()
        .enumerate()
        .map(|(edge_idx, edge)| LinkPlacement {
            source: graph.nodes[edge.from_idx].id.clone(),
            target: graph.nodes[edge.to_idx].id.clone(),
            weight: edge.weight,
            x0: node_x[edge.from_idx] + node_width,
            x1: node_x[edge.to_idx],
            source_y0: source_band[edge_idx].0,
            source_y1: source_band[edge_idx].1,
            target_y0: target_band[edge_idx].0,
            target_y1: target_band[edge_idx].1,
        })
        .collect();

    FlowPlacement { nodes, links }
}

pub(super) fn compute_flow_layout(
    graph: &FlowGraph,
    size: Size,
    theme: &Theme,
    config: &LayoutConfig,
) -> Option<FlowLayout> {
    let flow_config = &config.flow;
    let width = size.width;
    let height = flow_config
        .min_height
        .max(size.height.min(width * flow_config.height_ratio));
    let inset = flow_config.extent_inset;
    let extent = Rect {
        x: inset,
        y: inset,
        width: width - inset * 2.0,
        height: height - inset * 2.0,
    };
    if extent.width <= 0.0 || extent.height <= 0.0 {
        return None;
    }

    let node_width = flow_config
        .node_width_min
        .max(width * flow_config.node_width_ratio);
    let node_padding = flow_config
        .node_padding_min
        .max(height * flow_config.node_padding_ratio);
    let placement = layout_flow(graph, extent, node_width, node_padding);

    let colors: HashMap<&str, &str> = placement
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), theme.palette.flow_node(&node.id)))
        .collect();

    let nodes: Vec<FlowNodeLayout> = placement
        .nodes
        .iter()
        .map(|node| {
            let mid_y = (node.y0 + node.y1) / 2.0;
            let label = if node.x0 < width / 2.0 {
                TextLayout::new(
                    node.x1 + flow_config.label_gap,
                    mid_y,
                    node.label.clone(),
                    flow_config.label_font_size,
                    &theme.text_color,
                )
                .anchor(TextAnchor::Start)
            } else {
                TextLayout::new(
                    node.x0 - flow_config.label_gap,
                    mid_y,
                    node.label.clone(),
                    flow_config.label_font_size,
                    &theme.text_color,
                )
                .anchor(TextAnchor::End)
            };
            FlowNodeLayout {
                id: node.id.clone(),
                stage: node.stage,
                value: node.value,
                x0: node.x0,
                y0: node.y0,
                x1: node.x1,
                y1: node.y1,
                color: colors[node.id.as_str()].to_string(),
                label: label.baseline(Baseline::Middle),
            }
        })
        .collect();

    let links: Vec<FlowLinkLayout> = placement
        .links
        .into_iter()
        .map(|link| FlowLinkLayout {
            color: colors
                .get(link.source.as_str())
                .copied()
                .unwrap_or(theme.palette.fallback.as_str())
                .to_string(),
            source: link.source,
            target: link.target,
            weight: link.weight,
            x0: link.x0,
            x1: link.x1,
            source_y0: link.source_y0,
            source_y1: link.source_y1,
            target_y0: link.target_y0,
            target_y1: link.target_y1,
        })
        .collect();

    let title = TextLayout::new(
        flow_config.title_x,
        flow_config.title_y,
        flow_config.title.clone(),
        flow_config.title_font_size,
        &theme.title_color,
    )
    .weight(700);

    tracing::debug!(
        nodes = nodes.len(),
        links = links.len(),
        height,
        "flow layout"
    );

    Some(FlowLayout {
        size: Size::new(width, height),
        extent,
        node_width,
        node_padding,
        nodes,
        links,
        title,
        link_opacity: flow_config.link_opacity,
    })
}
