use crate::config::LayoutConfig;
use crate::ir::CategoryCount;
use crate::scale::{scaled_font, BandScale, LinearScale, Margin};
use crate::theme::Theme;

use super::text::{format_tick, labels_fit};
use super::{
    AxisLayout, BarChartLayout, BarLayout, Baseline, Rect, Size, TextAnchor, TextLayout,
    TickLayout,
};

const TICK_SIZE: f32 = 6.0;
const TICK_LABEL_OFFSET: f32 = 9.0;

pub(super) fn compute_bar_layout(
    bars: &[CategoryCount],
    size: Size,
    theme: &Theme,
    config: &LayoutConfig,
) -> Option<BarChartLayout> {
    let bar_config = &config.bar;
    let margin = Margin::from_size(size, &config.margin);
    let inner = margin.inner(size)?;
    let plot = Rect {
        x: margin.left,
        y: margin.top,
        width: inner.width,
        height: inner.height,
    };

    let base = inner.width.min(inner.height);
    let axis_font = scaled_font(base, 0.045, 12.0);
    let label_font = scaled_font(base, 0.055, 14.0);
    let title_font = scaled_font(base, 0.075, 18.0);

    let x = BandScale::new(
        bars.iter().map(|bar| bar.category.clone()).collect(),
        (0.0, plot.width),
    )
    .padding(bar_config.band_padding);
    let max = bars.iter().map(|bar| bar.value).max().unwrap_or(0) as f64;
    let y = LinearScale::new((0.0, max), (plot.height, 0.0)).nice(bar_config.tick_count);

    let bar_layouts: Vec<BarLayout> = bars
        .iter()
        .filter_map(|bar| {
            let left = x.position(&bar.category)?;
            let top = y.map(bar.value as f64);
            Some(BarLayout {
                category: bar.category.clone(),
                value: bar.value,
                x: plot.x + left,
                y: plot.y + top,
                width: x.bandwidth(),
                height: (plot.height - top).max(0.0),
                color: theme.palette.genre(&bar.category).to_string(),
            })
        })
        .collect();

    let rotate = !labels_fit(
        bars.iter().map(|bar| bar.category.as_str()),
        x.step(),
        axis_font,
        &theme.font_family,
        config,
    );
    let x_ticks = bars
        .iter()
        .filter_map(|bar| {
            let cx = plot.x + x.center(&bar.category)?;
            let label = TextLayout::new(
                cx,
                plot.bottom() + TICK_LABEL_OFFSET,
                bar.category.clone(),
                axis_font,
                &theme.axis_text_color,
            );
            let label = if rotate {
                label
                    .anchor(TextAnchor::End)
                    .baseline(Baseline::Middle)
                    .rotate(bar_config.label_rotation)
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

    let y_ticks = y
        .ticks(bar_config.tick_count)
        .into_iter()
        .map(|value| {
            let ty = plot.y + y.map(value);
            TickLayout {
                from: (plot.x - TICK_SIZE, ty),
                to: (plot.x, ty),
                label: TextLayout::new(
                    plot.x - TICK_LABEL_OFFSET,
                    ty,
                    format_tick(value),
                    axis_font,
                    &theme.axis_text_color,
                )
                .anchor(TextAnchor::End)
                .baseline(Baseline::Middle),
            }
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
            plot.bottom() + label_font * 2.5,
            bar_config.x_label.clone(),
            label_font,
            &theme.text_color,
        )
        .anchor(TextAnchor::Middle),
        TextLayout::new(
            plot.x - label_font * 2.5,
            plot.y + plot.height / 2.0,
            bar_config.y_label.clone(),
            label_font,
            &theme.text_color,
        )
        .anchor(TextAnchor::Middle)
        .rotate(-90.0),
        TextLayout::new(
            plot.x,
            plot.y - title_font * 0.6,
            bar_config.title.clone(),
            title_font,
            &theme.title_color,
        )
        .weight(700),
    ];

    tracing::debug!(bars = bar_layouts.len(), max, rotate, "bar layout");

    Some(BarChartLayout {
        size,
        margin,
        plot,
        bars: bar_layouts,
        x_axis,
        y_axis,
        labels,
        bar_opacity: bar_config.bar_opacity,
        corner_radius: bar_config.corner_radius,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(items: &[(&str, u64)]) -> Vec<CategoryCount> {
        items
            .iter()
            .map(|(category, value)| CategoryCount {
                category: category.to_string(),
                value: *value,
            })
            .collect()
    }

    fn fast_config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn bars_are_proportional_and_inside_plot() {
        let bars = counts(&[("Fantasy", 10), ("Fiction", 5), ("Thriller", 2)]);
        let layout = compute_bar_layout(
            &bars,
            Size::new(900.0, 600.0),
            &Theme::classic(),
            &fast_config(),
        )
        .unwrap();
        assert_eq!(layout.bars.len(), 3);
        let tallest = &layout.bars[0];
        let half = &layout.bars[1];
        assert!((tallest.height - half.height * 2.0).abs() < 1e-3);
        for bar in &layout.bars {
            assert!(bar.x >= layout.plot.x && bar.x + bar.width <= layout.plot.right() + 1e-3);
            assert!((bar.y + bar.height - layout.plot.bottom()).abs() < 1e-3);
        }
        assert!(layout.bars.windows(2).all(|pair| pair[0].x < pair[1].x));
    }

    #[test]
    fn y_ticks_are_round_numbers() {
        let bars = counts(&[("Fantasy", 187)]);
        let layout = compute_bar_layout(
            &bars,
            Size::new(800.0, 600.0),
            &Theme::classic(),
            &fast_config(),
        )
        .unwrap();
        let labels: Vec<&str> = layout
            .y_axis
            .ticks
            .iter()
            .map(|tick| tick.label.text.as_str())
            .collect();
        assert_eq!(labels.first(), Some(&"0"));
        assert_eq!(labels.last(), Some(&"200"));
        // The single bar does not reach the top of the nice domain.
        assert!(layout.bars[0].y > layout.plot.y);
    }

    #[test]
    fn bar_colors_follow_palette() {
        let theme = Theme::classic();
        let bars = counts(&[("Fantasy", 3), ("Memoir", 1)]);
        let layout =
            compute_bar_layout(&bars, Size::new(800.0, 600.0), &theme, &fast_config()).unwrap();
        assert_eq!(layout.bars[0].color, theme.palette.genre("Fantasy"));
        assert_eq!(layout.bars[1].color, theme.palette.fallback);
    }

    #[test]
    fn long_labels_rotate_in_narrow_plots() {
        let bars = counts(&[
            ("Historical Fiction", 4),
            ("Science Fiction Fantasy", 3),
            ("Literary Fiction", 2),
            ("Contemporary Romance", 2),
            ("Mystery Thriller", 1),
        ]);
        let config = fast_config();
        let narrow =
            compute_bar_layout(&bars, Size::new(420.0, 400.0), &Theme::classic(), &config)
                .unwrap();
        assert!(narrow.x_axis.ticks.iter().all(|tick| tick.label.rotate == -35.0));

        let short = counts(&[("A", 1), ("B", 2)]);
        let wide =
            compute_bar_layout(&short, Size::new(1200.0, 600.0), &Theme::classic(), &config)
                .unwrap();
        assert!(wide.x_axis.ticks.iter().all(|tick| tick.label.rotate == 0.0));
    }

    #[test]
    fn fonts_scale_with_the_plot() {
        let bars = counts(&[("Fantasy", 3), ("Fiction", 2)]);
        let layout = compute_bar_layout(
            &bars,
            Size::new(900.0, 600.0),
            &Theme::classic(),
            &fast_config(),
        )
        .unwrap();
        assert!((layout.plot.width - 480.0).abs() < 1e-2);
        assert!((layout.plot.height - 348.0).abs() < 1e-2);
        let axis_font = layout.y_axis.ticks[0].label.font_size;
        assert!((axis_font - 15.66).abs() < 1e-2, "axis font {axis_font}");
        assert!(layout.x_axis.ticks.iter().all(|tick| tick.label.rotate == 0.0));

        let small = compute_bar_layout(
            &bars,
            Size::new(400.0, 400.0),
            &Theme::classic(),
            &fast_config(),
        )
        .unwrap();
        assert_eq!(small.y_axis.ticks[0].label.font_size, 12.0);
    }

    #[test]
    fn too_small_container_is_skipped() {
        let bars = counts(&[("Fantasy", 3)]);
        assert!(compute_bar_layout(
            &bars,
            Size::new(120.0, 120.0),
            &Theme::classic(),
            &fast_config()
        )
        .is_none());
    }
}
