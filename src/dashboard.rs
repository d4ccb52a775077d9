//! The three-chart page: a centred title, a top row with the bar chart and the
//! heatmap side by side, and a bottom row with the flow diagram centred on a
//! 12-column grid.

use std::time::{Duration, Instant};

use crate::config::{Config, DashboardConfig};
use crate::coordinator::ChartInstance;
use crate::data::{DataError, Dataset};
use crate::layout::{ChartKind, Rect, Size, TextAnchor, TextLayout};
use crate::render::{render_dashboard_svg, Scene};
use crate::theme::Theme;

const GRID_COLUMNS: f32 = 12.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardGrid {
    pub page: Size,
    pub title: TextLayout,
    pub bar: Rect,
    pub heatmap: Rect,
    pub flow: Rect,
}

impl DashboardGrid {
    pub fn slot(&self, kind: ChartKind) -> Rect {
        match kind {
            ChartKind::Bar => self.bar,
            ChartKind::Heatmap => self.heatmap,
            ChartKind::Flow => self.flow,
        }
    }
}

/// Splits `page` into the three chart containers. `None` when the page is too
/// small to hold any chart area.
pub fn dashboard_grid(page: Size, theme: &Theme, config: &DashboardConfig) -> Option<DashboardGrid> {
    if page.is_empty() {
        return None;
    }
    let content_x = config.padding_x;
    let content_width = page.width - config.padding_x * 2.0;
    let title_y = config.padding_top + config.title_font_size;
    let rows_top = title_y + config.title_font_size * 0.3 + config.stack_spacing;
    let rows_height = page.height - rows_top - config.stack_spacing - config.grid_spacing;
    if content_width <= config.grid_spacing || rows_height <= 0.0 {
        return None;
    }

    let top_height = rows_height * config.top_row_ratio;
    let bottom_height = rows_height - top_height;
    let half_width = (content_width - config.grid_spacing) / 2.0;
    let bar = Rect {
        x: content_x,
        y: rows_top,
        width: half_width,
        height: top_height,
    };
    let heatmap = Rect {
        x: content_x + half_width + config.grid_spacing,
        ..bar
    };

    let flow_width = content_width * (config.bottom_columns / GRID_COLUMNS).clamp(0.0, 1.0);
    let flow = Rect {
        x: content_x + (content_width - flow_width) / 2.0,
        y: rows_top + top_height + config.grid_spacing,
        width: flow_width,
        height: bottom_height,
    };

    let title = TextLayout::new(
        page.width / 2.0,
        title_y,
        config.title.clone(),
        config.title_font_size,
        &theme.title_color,
    )
    .anchor(TextAnchor::Middle)
    .weight(700);

    Some(DashboardGrid {
        page,
        title,
        bar,
        heatmap,
        flow,
    })
}

/// Three independent chart instances laid out on one page. Each instance keeps
/// its own data and surface; only the page size is shared.
pub struct Dashboard {
    theme: Theme,
    config: Config,
    page: Size,
    charts: Vec<ChartInstance<Scene>>,
}

impl Dashboard {
    pub fn new(page: Size, config: Config) -> Self {
        let grid = dashboard_grid(page, &config.theme, &config.layout.dashboard);
        let debounce = Duration::from_millis(config.render.debounce_ms);
        let charts = ChartKind::ALL
            .iter()
            .map(|&kind| {
                let size = grid
                    .as_ref()
                    .map(|grid| {
                        let slot = grid.slot(kind);
                        Size::new(slot.width, slot.height)
                    })
                    .unwrap_or_default();
                ChartInstance::new(
                    kind,
                    Scene::new(),
                    size,
                    config.theme.clone(),
                    config.layout.clone(),
                    debounce,
                )
            })
            .collect();
        Self {
            theme: config.theme.clone(),
            config,
            page,
            charts,
        }
    }

    pub fn charts(&self) -> &[ChartInstance<Scene>] {
        &self.charts
    }

    /// Starts one load per chart and applies `load`'s result to each. Every
    /// chart parses its own copy of the source.
    pub fn load_with(&mut self, mut load: impl FnMut() -> Result<Dataset, DataError>) {
        for chart in &mut self.charts {
            let ticket = chart.begin_load();
            chart.complete_load(ticket, load());
        }
    }

    pub fn notify_resize(&mut self, page: Size, now: Instant) {
        self.page = page;
        let grid = dashboard_grid(page, &self.theme, &self.config.layout.dashboard);
        for chart in &mut self.charts {
            let size = grid
                .as_ref()
                .map(|grid| {
                    let slot = grid.slot(chart.kind());
                    Size::new(slot.width, slot.height)
                })
                .unwrap_or_default();
            chart.notify_resize(size, now);
        }
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        self.charts
            .iter_mut()
            .fold(false, |painted, chart| chart.poll(now) | painted)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.charts.iter().filter_map(ChartInstance::next_deadline).min()
    }

    pub fn teardown(&mut self) {
        for chart in &mut self.charts {
            chart.teardown();
        }
    }

    pub fn render_svg(&self) -> String {
        let Some(grid) = dashboard_grid(self.page, &self.theme, &self.config.layout.dashboard)
        else {
            return render_dashboard_svg(
                self.page,
                &TextLayout::new(0.0, 0.0, "", 0.0, &self.theme.title_color),
                &[],
                &self.theme,
            );
        };
        let panels: Vec<(Rect, &Scene)> = self
            .charts
            .iter()
            .map(|chart| (grid.slot(chart.kind()), chart.surface()))
            .collect();
        render_dashboard_svg(self.page, &grid.title, &panels, &self.theme)
    }
}
