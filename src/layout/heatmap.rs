use crate::config::LayoutConfig;
use crate::data::AgeCategory;
use crate::ir::HeatmapData;
use crate::scale::{
    scaled_font, BandScale, Interpolator, LinearScale, Margin, SequentialColorScale,
};
use crate::theme::Theme;

use super::text::labels_fit;
use super::{
    AxisLayout, Baseline, GradientStop, HeatCellLayout, HeatmapLayout, LegendLayout, Rect, Size,
    TextAnchor, TextLayout, TickLayout,
};

const TICK_SIZE: f32 = 6.0;
const TICK_LABEL_OFFSET: f32 = 9.0;
const GRADIENT_ID: &str = "rating-gradient";

pub(super) fn compute_heatmap_layout(
    heat: &HeatmapData,
    size: Size,
    theme: &Theme,
    config: &LayoutConfig,
) -> Option<HeatmapLayout> {
    let heat_config = &config.heatmap;
    let (min, max) = heat.rating_extent?;
    let margin = Margin::from_size(size, &config.margin);
    let inner = margin.inner(size)?;
    let plot = Rect {
        x: margin.left,
        y: margin.top,
        width: inner.width,
        height: inner.height,
    };

    let base = inner.width.min(inner.height);
    let axis_font = scaled_font(base, 0.045, 10.0);
    let label_font = scaled_font(base, 0.055, 14.0);
    let sublabel_font = scaled_font(base, 0.055, 12.0);
    let title_font = scaled_font(base, 0.075, 18.0);
    let legend_font = scaled_font(base, 0.045, 12.0);

    let x = BandScale::new(heat.categories.clone(), (0.0, plot.width))
        .padding(heat_config.band_padding);
    let y = BandScale::new(
        AgeCategory::ALL
            .iter()
            .map(|age| age.label().to_string())
            .collect(),
        (plot.height, 0.0),
    )
    .padding(heat_config.band_padding);
    let color = SequentialColorScale::new((min, max), Interpolator::YlOrBr).inverted();

    let cells: Vec<HeatCellLayout> = heat
        .cells
        .iter()
        .filter_map(|cell| {
            let cx = x.position(&cell.genre)?;
            let cy = y.position(cell.age.label())?;
            Some(HeatCellLayout {
                genre: cell.genre.clone(),
                age: cell.age.label().to_string(),
                value: cell.value,
                x: plot.x + cx,
                y: plot.y + cy,
                width: x.bandwidth(),
                height: y.bandwidth(),
                color: color.color(cell.value).to_string(),
            })
        })
        .collect();

    let rotate = !labels_fit(
        heat.categories.iter().map(String::as_str),
        x.step(),
        axis_font,
        &theme.font_family,
        config,
    );
    let x_ticks = heat
        .categories
        .iter()
        .filter_map(|genre| {
            let cx = plot.x + x.center(genre)?;
            let label = TextLayout::new(
                cx,
                plot.bottom() + TICK_LABEL_OFFSET,
                genre.clone(),
                axis_font,
                &theme.axis_text_color,
            );
            let label = if rotate {
                label
                    .anchor(TextAnchor::End)
                    .baseline(Baseline::Middle)
                    .rotate(heat_config.label_rotation)
            } else {
                label.anchor(TextAnchor::Middle).baseline(Baseline::Hanging)
            };
            Some(TickLayout {
                from: (cx, plot.bottom()),
                to: (cx, plot.bottom() + TICK_SIZE),
                label,
            })
        })
        .collect();
    let x_axis = AxisLayout {
        line: ((plot.x, plot.bottom()), (plot.right(), plot.bottom())),
        ticks: x_ticks,
        stroke: theme.axis_line_color.clone(),
    };

    let y_ticks = AgeCategory::ALL
        .iter()
        .filter_map(|age| {
            let cy = plot.y + y.center(age.label())?;
            Some(TickLayout {
                from: (plot.x - TICK_SIZE, cy),
                to: (plot.x, cy),
                label: TextLayout::new(
                    plot.x - TICK_LABEL_OFFSET,
                    cy,
                    age.label(),
                    axis_font,
                    &theme.axis_text_color,
                )
                .anchor(TextAnchor::End)
                .baseline(Baseline::Middle),
            })
        })
        .collect();
    let y_axis = AxisLayout {
        line: ((plot.x, plot.y), (plot.x, plot.bottom())),
        ticks: y_ticks,
        stroke: theme.axis_line_color.clone(),
    };

    let labels = vec![
        TextLayout::new(
            plot.x + plot.width / 2.0,
            plot.bottom() + label_font * 3.0,
            heat_config.x_label.clone(),
            label_font,
            &theme.text_color,
        )
        .anchor(TextAnchor::Middle),
        TextLayout::new(
            plot.x + plot.width / 2.0,
            plot.bottom() + label_font * 4.5,
            heat_config.footnote.clone(),
            sublabel_font,
            &theme.axis_text_color,
        )
        .anchor(TextAnchor::Middle),
        TextLayout::new(
            plot.x - label_font * 6.0,
            plot.y + plot.height / 2.0,
            heat_config.y_label.clone(),
            label_font,
            &theme.text_color,
        )
        .anchor(TextAnchor::Middle)
        .rotate(-90.0),
        TextLayout::new(
            plot.x,
            plot.y - title_font * 0.8,
            heat_config.title.clone(),
            title_font,
            &theme.title_color,
        )
        .weight(700),
    ];

    let legend = legend_layout(plot, (min, max), color, legend_font, theme, config);

    tracing::debug!(
        cells = cells.len(),
        genres = heat.categories.len(),
        min,
        max,
        "heatmap layout"
    );

    Some(HeatmapLayout {
        size,
        margin,
        plot,
        cells,
        x_axis,
        y_axis,
        labels,
        legend,
        corner_radius: heat_config.corner_radius,
        cell_stroke: theme.cell_stroke.clone(),
        cell_stroke_width: heat_config.cell_stroke_width,
    })
}

/// Vertical colour legend right of the plot. The gradient and its axis both
/// put the minimum at the bottom.
fn legend_layout(
    plot: Rect,
    (min, max): (f64, f64),
    color: SequentialColorScale,
    font_size: f32,
    theme: &Theme,
    config: &LayoutConfig,
) -> LegendLayout {
    let heat_config = &config.heatmap;
    let rect = Rect {
        x: plot.right() + heat_config.legend_gap,
        y: plot.y + heat_config.legend_top_offset,
        width: heat_config.legend_width,
        height: plot.height * heat_config.legend_height_ratio,
    };

    let stop_count = heat_config.gradient_stops.max(2);
    let stops = (0..stop_count)
        .map(|i| {
            let t = i as f64 / (stop_count - 1) as f64;
            GradientStop {
                offset: t as f32,
                color: color.color(min + t * (max - min)).to_string(),
            }
        })
        .collect();

    let scale = LinearScale::new((min, max), (rect.bottom(), rect.y));
    let mut values = vec![min, (min + max) / 2.0, max];
    values.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);
    let ticks = values
        .into_iter()
        .map(|value| {
            let ty = scale.map(value);
            TickLayout {
                from: (rect.right(), ty),
                to: (rect.right() + TICK_SIZE, ty),
                label: TextLayout::new(
                    rect.right() + TICK_LABEL_OFFSET,
                    ty,
                    format!("{value:.1}"),
                    font_size,
                    &theme.axis_text_color,
                )
                .baseline(Baseline::Middle),
            }
        })
        .collect();

    LegendLayout {
        rect,
        gradient_id: GRADIENT_ID.to_string(),
        stops,
        axis: AxisLayout {
            line: ((rect.right(), rect.y), (rect.right(), rect.bottom())),
            ticks,
            stroke: theme.axis_line_color.clone(),
        },
        title: TextLayout::new(
            rect.x - 35.0,
            rect.y - font_size,
            heat_config.legend_title.clone(),
            font_size,
            &theme.text_color,
        ),
    }
}
