use serde::Serialize;

use crate::ir::FlowStage;
use crate::scale::Margin;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero-area, negative or non-finite sizes cannot be laid out.
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Baseline {
    Alphabetic,
    Middle,
    Hanging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayout {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub anchor: TextAnchor,
    pub baseline: Baseline,
    /// Degrees, around `(x, y)`.
    pub rotate: f32,
    pub fill: String,
}

impl TextLayout {
    pub fn new(x: f32, y: f32, text: impl Into<String>, font_size: f32, fill: &str) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            font_size,
            font_weight: 400,
            anchor: TextAnchor::Start,
            baseline: Baseline::Alphabetic,
            rotate: 0.0,
            fill: fill.to_string(),
        }
    }

    pub fn weight(mut self, weight: u16) -> Self {
        self.font_weight = weight;
        self
    }

    pub fn anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn rotate(mut self, degrees: f32) -> Self {
        self.rotate = degrees;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickLayout {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub label: TextLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub line: ((f32, f32), (f32, f32)),
    pub ticks: Vec<TickLayout>,
    pub stroke: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarLayout {
    pub category: String,
    pub value: u64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChartLayout {
    pub size: Size,
    pub margin: Margin,
    pub plot: Rect,
    pub bars: Vec<BarLayout>,
    pub x_axis: AxisLayout,
    pub y_axis: AxisLayout,
    pub labels: Vec<TextLayout>,
    pub bar_opacity: f32,
    pub corner_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCellLayout {
    pub genre: String,
    pub age: String,
    pub value: f64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    /// Fraction along the gradient, 0 at the bottom of the legend.
    pub offset: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendLayout {
    pub rect: Rect,
    pub gradient_id: String,
    pub stops: Vec<GradientStop>,
    pub axis: AxisLayout,
    pub title: TextLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapLayout {
    pub size: Size,
    pub margin: Margin,
    pub plot: Rect,
    pub cells: Vec<HeatCellLayout>,
    pub x_axis: AxisLayout,
    pub y_axis: AxisLayout,
    pub labels: Vec<TextLayout>,
    pub legend: LegendLayout,
    pub corner_radius: f32,
    pub cell_stroke: String,
    pub cell_stroke_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNodeLayout {
    pub id: String,
    pub stage: FlowStage,
    pub value: u64,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub color: String,
    pub label: TextLayout,
}

impl FlowNodeLayout {
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A link ribbon: a band on the source's right edge joined to a band on the
/// target's left edge by two horizontal S-curves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowLinkLayout {
    pub source: String,
    pub target: String,
    pub weight: u64,
    pub x0: f32,
    pub x1: f32,
    pub source_y0: f32,
    pub source_y1: f32,
    pub target_y0: f32,
    pub target_y1: f32,
    pub color: String,
}

impl FlowLinkLayout {
    pub fn source_width(&self) -> f32 {
        self.source_y1 - self.source_y0
    }

    pub fn target_width(&self) -> f32 {
        self.target_y1 - self.target_y0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowLayout {
    pub size: Size,
    pub extent: Rect,
    pub node_width: f32,
    pub node_padding: f32,
    pub nodes: Vec<FlowNodeLayout>,
    pub links: Vec<FlowLinkLayout>,
    pub title: TextLayout,
    pub link_opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartLayout {
    /// Loaded but nothing to show: only the panel is painted.
    Background { size: Size },
    Bar(BarChartLayout),
    Heatmap(HeatmapLayout),
    Flow(FlowLayout),
}

impl ChartLayout {
    pub fn size(&self) -> Size {
        match self {
            Self::Background { size } => *size,
            Self::Bar(layout) => layout.size,
            Self::Heatmap(layout) => layout.size,
            Self::Flow(layout) => layout.size,
        }
    }
}
