use crate::config::RenderConfig;
use crate::layout::{
    AxisLayout, Baseline, BarChartLayout, ChartLayout, FlowLayout, FlowLinkLayout, GradientStop,
    HeatmapLayout, Rect, Size, TextAnchor, TextLayout,
};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Fill, stroke and corner rounding of a painted shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: Option<String>,
    pub opacity: f32,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub radius: f32,
}

impl Style {
    pub fn fill(color: impl Into<String>) -> Self {
        Self {
            fill: Some(color.into()),
            opacity: 1.0,
            stroke: None,
            stroke_width: 0.0,
            radius: 0.0,
        }
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn stroke(mut self, color: impl Into<String>, width: f32) -> Self {
        self.stroke = Some(color.into());
        self.stroke_width = width;
        self
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

/// A drawing target. Each paint pass starts with `clear`, so painting the
/// same layout twice leaves the surface in the same state.
pub trait Surface {
    fn clear(&mut self, size: Size);
    fn rect(&mut self, rect: Rect, style: &Style);
    fn line(&mut self, from: (f32, f32), to: (f32, f32), stroke: &str, width: f32);
    fn path(&mut self, d: String, style: &Style);
    fn text(&mut self, text: &TextLayout);
    /// Vertical gradient, offset 0 at the bottom.
    fn gradient(&mut self, id: &str, stops: &[GradientStop]);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect { rect: Rect, style: Style },
    Line { from: (f32, f32), to: (f32, f32), stroke: String, width: f32 },
    Path { d: String, style: Style },
    Text(TextLayout),
    Gradient { id: String, stops: Vec<GradientStop> },
}

/// Retained surface: the primitives of the last paint pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub size: Size,
    pub primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl Surface for Scene {
    fn clear(&mut self, size: Size) {
        self.size = size;
        self.primitives.clear();
    }

    fn rect(&mut self, rect: Rect, style: &Style) {
        self.primitives.push(Primitive::Rect {
            rect,
            style: style.clone(),
        });
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), stroke: &str, width: f32) {
        self.primitives.push(Primitive::Line {
            from,
            to,
            stroke: stroke.to_string(),
            width,
        });
    }

    fn path(&mut self, d: String, style: &Style) {
        self.primitives.push(Primitive::Path {
            d,
            style: style.clone(),
        });
    }

    fn text(&mut self, text: &TextLayout) {
        self.primitives.push(Primitive::Text(text.clone()));
    }

    fn gradient(&mut self, id: &str, stops: &[GradientStop]) {
        self.primitives.push(Primitive::Gradient {
            id: id.to_string(),
            stops: stops.to_vec(),
        });
    }
}

/// Full repaint: clear, rounded panel, then the chart's shapes.
pub fn paint_chart(layout: &ChartLayout, surface: &mut dyn Surface, theme: &Theme) {
    let size = layout.size();
    surface.clear(size);
    surface.rect(
        Rect {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        },
        &Style::fill(theme.panel_background.as_str()).radius(theme.panel_radius),
    );
    match layout {
        ChartLayout::Background { .. } => {}
        ChartLayout::Bar(bar) => paint_bar(bar, surface),
        ChartLayout::Heatmap(heatmap) => paint_heatmap(heatmap, surface),
        ChartLayout::Flow(flow) => paint_flow(flow, surface, theme),
    }
}

fn paint_axis(axis: &AxisLayout, surface: &mut dyn Surface) {
    surface.line(axis.line.0, axis.line.1, &axis.stroke, 1.0);
    for tick in &axis.ticks {
        surface.line(tick.from, tick.to, &axis.stroke, 1.0);
        surface.text(&tick.label);
    }
}

fn paint_bar(layout: &BarChartLayout, surface: &mut dyn Surface) {
    for bar in &layout.bars {
        surface.rect(
            Rect {
                x: bar.x,
                y: bar.y,
                width: bar.width,
                height: bar.height,
            },
            &Style::fill(bar.color.as_str())
                .opacity(layout.bar_opacity)
                .radius(layout.corner_radius),
        );
    }
    paint_axis(&layout.x_axis, surface);
    paint_axis(&layout.y_axis, surface);
    for label in &layout.labels {
        surface.text(label);
    }
}

fn paint_heatmap(layout: &HeatmapLayout, surface: &mut dyn Surface) {
    for cell in &layout.cells {
        surface.rect(
            Rect {
                x: cell.x,
                y: cell.y,
                width: cell.width,
                height: cell.height,
            },
            &Style::fill(cell.color.as_str())
                .radius(layout.corner_radius)
                .stroke(layout.cell_stroke.as_str(), layout.cell_stroke_width),
        );
    }
    paint_axis(&layout.x_axis, surface);
    paint_axis(&layout.y_axis, surface);
    for label in &layout.labels {
        surface.text(label);
    }

    let legend = &layout.legend;
    surface.gradient(&legend.gradient_id, &legend.stops);
    surface.rect(
        legend.rect,
        &Style::fill(format!("url(#{})", legend.gradient_id)),
    );
    paint_axis(&legend.axis, surface);
    surface.text(&legend.title);
}

fn paint_flow(layout: &FlowLayout, surface: &mut dyn Surface, theme: &Theme) {
    for link in &layout.links {
        surface.path(
            ribbon_path(link),
            &Style::fill(link.color.as_str()).opacity(layout.link_opacity),
        );
    }
    for node in &layout.nodes {
        surface.rect(
            Rect {
                x: node.x0,
                y: node.y0,
                width: node.x1 - node.x0,
                height: node.height(),
            },
            &Style::fill(node.color.as_str()).stroke(theme.node_stroke.as_str(), 1.0),
        );
    }
    for node in &layout.nodes {
        surface.text(&node.label);
    }
    surface.text(&layout.title);
}

/// Filled ribbon bounded by two horizontal cubic S-curves, one per band edge.
pub fn ribbon_path(link: &FlowLinkLayout) -> String {
    let mid_x = (link.x0 + link.x1) / 2.0;
    format!(
        "M {x0:.2} {sy0:.2} C {mx:.2} {sy0:.2}, {mx:.2} {ty0:.2}, {x1:.2} {ty0:.2} \
         L {x1:.2} {ty1:.2} C {mx:.2} {ty1:.2}, {mx:.2} {sy1:.2}, {x0:.2} {sy1:.2} Z",
        x0 = link.x0,
        x1 = link.x1,
        mx = mid_x,
        sy0 = link.source_y0,
        sy1 = link.source_y1,
        ty0 = link.target_y0,
        ty1 = link.target_y1,
    )
}

pub fn render_svg(scene: &Scene, theme: &Theme) -> String {
    let width = scene.size.width;
    let height = scene.size.height;
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" font-family=\"{}\">",
        escape_xml(&theme.font_family)
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    push_primitives(&mut svg, scene);
    svg.push_str("</svg>");
    svg
}

/// One page holding several chart scenes, each translated into its slot.
pub fn render_dashboard_svg(
    page: Size,
    title: &TextLayout,
    panels: &[(Rect, &Scene)],
    theme: &Theme,
) -> String {
    let width = page.width;
    let height = page.height;
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" font-family=\"{}\">",
        escape_xml(&theme.font_family)
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    push_text(&mut svg, title);
    for (slot, scene) in panels {
        if scene.is_blank() {
            continue;
        }
        svg.push_str(&format!(
            "<g transform=\"translate({:.2} {:.2})\">",
            slot.x, slot.y
        ));
        push_primitives(&mut svg, scene);
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

fn push_primitives(svg: &mut String, scene: &Scene) {
    for primitive in &scene.primitives {
        match primitive {
            Primitive::Rect { rect, style } => {
                svg.push_str(&format!(
                    "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"{}/>",
                    rect.x,
                    rect.y,
                    rect.width.max(0.0),
                    rect.height.max(0.0),
                    style_attrs(style)
                ));
            }
            Primitive::Line {
                from,
                to,
                stroke,
                width,
            } => {
                svg.push_str(&format!(
                    "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\"/>",
                    from.0, from.1, to.0, to.1, stroke, width
                ));
            }
            Primitive::Path { d, style } => {
                svg.push_str(&format!("<path d=\"{}\"{}/>", d, style_attrs(style)));
            }
            Primitive::Text(text) => push_text(svg, text),
            Primitive::Gradient { id, stops } => {
                svg.push_str(&format!(
                    "<defs><linearGradient id=\"{}\" x1=\"0\" y1=\"1\" x2=\"0\" y2=\"0\">",
                    escape_xml(id)
                ));
                for stop in stops {
                    svg.push_str(&format!(
                        "<stop offset=\"{:.2}%\" stop-color=\"{}\"/>",
                        stop.offset * 100.0,
                        stop.color
                    ));
                }
                svg.push_str("</linearGradient></defs>");
            }
        }
    }
}

fn style_attrs(style: &Style) -> String {
    let mut attrs = String::new();
    match &style.fill {
        Some(fill) => attrs.push_str(&format!(" fill=\"{fill}\"")),
        None => attrs.push_str(" fill=\"none\""),
    }
    if style.opacity < 1.0 {
        attrs.push_str(&format!(" fill-opacity=\"{}\"", style.opacity));
    }
    if let Some(stroke) = &style.stroke {
        attrs.push_str(&format!(
            " stroke=\"{stroke}\" stroke-width=\"{}\"",
            style.stroke_width
        ));
    }
    if style.radius > 0.0 {
        attrs.push_str(&format!(" rx=\"{0}\" ry=\"{0}\"", style.radius));
    }
    attrs
}

fn push_text(svg: &mut String, text: &TextLayout) {
    let anchor = match text.anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    };
    let baseline = match text.baseline {
        Baseline::Alphabetic => "",
        Baseline::Middle => " dominant-baseline=\"central\"",
        Baseline::Hanging => " dominant-baseline=\"hanging\"",
    };
    let weight = if text.font_weight != 400 {
        format!(" font-weight=\"{}\"", text.font_weight)
    } else {
        String::new()
    };
    let transform = if text.rotate != 0.0 {
        format!(
            " transform=\"rotate({} {:.2} {:.2})\"",
            text.rotate, text.x, text.y
        )
    } else {
        String::new()
    };
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.1}\" fill=\"{}\" text-anchor=\"{}\"{}{}{}>{}</text>",
        text.x,
        text.y,
        text.font_size,
        text.fill,
        anchor,
        baseline,
        weight,
        transform,
        escape_xml(&text.text)
    ));
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(1200.0, 800.0))
        .ok_or_else(|| anyhow::anyhow!("invalid output size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::CategoryCount;
    use crate::layout::{compute_layout, ChartData};

    fn bar_layout() -> ChartLayout {
        let data = ChartData::Bar(vec![
            CategoryCount {
                category: "Fantasy".into(),
                value: 4,
            },
            CategoryCount {
                category: "Sci-Fi & <Space>".into(),
                value: 2,
            },
        ]);
        let config = LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        };
        compute_layout(&data, Size::new(900.0, 600.0), &Theme::classic(), &config).unwrap()
    }

    #[test]
    fn repaint_is_idempotent() {
        let theme = Theme::classic();
        let layout = bar_layout();
        let mut scene = Scene::new();
        paint_chart(&layout, &mut scene, &theme);
        let first = scene.clone();
        paint_chart(&layout, &mut scene, &theme);
        assert_eq!(scene, first);
        assert_eq!(render_svg(&scene, &theme), render_svg(&first, &theme));
    }

    #[test]
    fn background_layout_paints_only_the_panel() {
        let theme = Theme::classic();
        let mut scene = Scene::new();
        paint_chart(
            &ChartLayout::Background {
                size: Size::new(300.0, 200.0),
            },
            &mut scene,
            &theme,
        );
        assert_eq!(scene.primitives.len(), 1);
        assert!(matches!(
            &scene.primitives[0],
            Primitive::Rect { style, .. } if style.fill.as_deref() == Some(theme.panel_background.as_str())
        ));
    }

    #[test]
    fn svg_escapes_labels() {
        let theme = Theme::classic();
        let mut scene = Scene::new();
        paint_chart(&bar_layout(), &mut scene, &theme);
        let svg = render_svg(&scene, &theme);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Sci-Fi &amp; &lt;Space&gt;"));
        assert!(svg.contains("Top 5 Book Genres by Count"));
        assert!(svg.contains("fill-opacity=\"0.45\""));
    }

    #[test]
    fn ribbon_has_two_curves() {
        let link = FlowLinkLayout {
            source: "a".into(),
            target: "b".into(),
            weight: 1,
            x0: 10.0,
            x1: 110.0,
            source_y0: 0.0,
            source_y1: 20.0,
            target_y0: 50.0,
            target_y1: 60.0,
            color: "#000000".into(),
        };
        let d = ribbon_path(&link);
        assert!(d.starts_with("M 10.00 0.00 C 60.00 0.00, 60.00 50.00, 110.00 50.00"));
        assert!(d.contains("L 110.00 60.00 C 60.00 60.00, 60.00 20.00, 10.00 20.00 Z"));
    }

    #[test]
    fn dashboard_skips_blank_panels() {
        let theme = Theme::classic();
        let mut chart = Scene::new();
        paint_chart(&bar_layout(), &mut chart, &theme);
        let blank = Scene::new();
        let title = TextLayout::new(10.0, 20.0, "Books", 24.0, "#000000");
        let slot = Rect {
            x: 5.0,
            y: 40.0,
            width: 900.0,
            height: 600.0,
        };
        let svg = render_dashboard_svg(
            Size::new(1000.0, 700.0),
            &title,
            &[(slot, &chart), (slot, &blank)],
            &theme,
        );
        assert_eq!(svg.matches("<g transform").count(), 1);
        assert!(svg.contains(">Books</text>"));
    }
}
