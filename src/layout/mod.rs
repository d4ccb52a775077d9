mod bar;
mod flow;
mod heatmap;
mod text;
mod types;

pub use flow::{layout_flow, FlowPlacement, LinkPlacement, NodePlacement};
pub use types::*;

use serde::Serialize;

use crate::aggregate::{flow_graph, grouped_average, top_categories};
use crate::config::LayoutConfig;
use crate::data::Record;
use crate::ir::{CategoryCount, FlowGraph, HeatmapData};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartKind {
    Bar,
    Heatmap,
    Flow,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [Self::Bar, Self::Heatmap, Self::Flow];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Heatmap => "heatmap",
            Self::Flow => "flow",
        }
    }
}

/// Aggregated, chart-ready data for one chart kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartData {
    Bar(Vec<CategoryCount>),
    Heatmap(HeatmapData),
    Flow(FlowGraph),
}

impl ChartData {
    pub fn aggregate(kind: ChartKind, records: &[Record], config: &LayoutConfig) -> Self {
        match kind {
            ChartKind::Bar => Self::Bar(top_categories(records, config.bar.top_k)),
            ChartKind::Heatmap => {
                Self::Heatmap(grouped_average(records, config.heatmap.max_categories))
            }
            ChartKind::Flow => Self::Flow(flow_graph(records, config.flow.top_k)),
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Bar(_) => ChartKind::Bar,
            Self::Heatmap(_) => ChartKind::Heatmap,
            Self::Flow(_) => ChartKind::Flow,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bar(bars) => bars.is_empty(),
            Self::Heatmap(heat) => heat.is_empty() || heat.rating_extent.is_none(),
            Self::Flow(graph) => graph.is_empty(),
        }
    }
}

/// Geometry for `data` inside a container of `size`.
///
/// `None` means the pass should be skipped: the container has no area or is
/// too small for the chart's margins. Empty data still yields a layout, one
/// that paints only the background.
pub fn compute_layout(
    data: &ChartData,
    size: Size,
    theme: &Theme,
    config: &LayoutConfig,
) -> Option<ChartLayout> {
    if size.is_empty() {
        return None;
    }
    if data.is_empty() {
        return Some(ChartLayout::Background { size });
    }
    match data {
        ChartData::Bar(bars) => bar::compute_bar_layout(bars, size, theme, config).map(ChartLayout::Bar),
        ChartData::Heatmap(heat) => {
            heatmap::compute_heatmap_layout(heat, size, theme, config).map(ChartLayout::Heatmap)
        }
        ChartData::Flow(graph) => {
            flow::compute_flow_layout(graph, size, theme, config).map(ChartLayout::Flow)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_area_skips_layout() {
        let data = ChartData::Bar(vec![CategoryCount {
            category: "Fantasy".into(),
            value: 3,
        }]);
        let theme = Theme::classic();
        let config = LayoutConfig::default();
        assert!(compute_layout(&data, Size::new(0.0, 400.0), &theme, &config).is_none());
        assert!(compute_layout(&data, Size::new(400.0, 0.0), &theme, &config).is_none());
    }

    #[test]
    fn empty_data_is_background_only() {
        let theme = Theme::classic();
        let config = LayoutConfig::default();
        let size = Size::new(640.0, 480.0);
        for kind in ChartKind::ALL {
            let data = ChartData::aggregate(kind, &[], &config);
            assert!(data.is_empty());
            assert_eq!(
                compute_layout(&data, size, &theme, &config),
                Some(ChartLayout::Background { size })
            );
        }
    }
}
