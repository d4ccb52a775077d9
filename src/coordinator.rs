//! Per-chart render orchestration.
//!
//! A [`ChartInstance`] owns its data, its surface and its size. The host event
//! loop feeds it load results and resize notifications and calls
//! [`ChartInstance::poll`] with the current time; every repaint is a full
//! clear-then-draw.

use std::time::{Duration, Instant};

use crate::config::LayoutConfig;
use crate::data::{DataError, Dataset};
use crate::layout::{compute_layout, ChartData, ChartKind, ChartLayout, Size};
use crate::render::{paint_chart, Surface};
use crate::theme::Theme;

/// Coalesces bursts of updates: each `push` replaces the pending value and
/// restarts the delay, `poll` yields the latest value once the delay elapsed
/// with no newer update.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataState {
    /// Load in flight; nothing is drawn.
    Pending,
    Ready(ChartData),
    /// The source was unavailable; nothing is drawn.
    Failed(String),
}

/// Identifies one load request. Only the latest ticket of a live instance
/// may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

pub struct ChartInstance<S: Surface> {
    kind: ChartKind,
    surface: S,
    theme: Theme,
    config: LayoutConfig,
    state: DataState,
    size: Size,
    resize: Debouncer<Size>,
    generation: u64,
    torn_down: bool,
    dirty: bool,
    layout: Option<ChartLayout>,
}

impl<S: Surface> ChartInstance<S> {
    pub fn new(
        kind: ChartKind,
        surface: S,
        size: Size,
        theme: Theme,
        config: LayoutConfig,
        debounce: Duration,
    ) -> Self {
        Self {
            kind,
            surface,
            theme,
            config,
            state: DataState::Pending,
            size,
            resize: Debouncer::new(debounce),
            generation: 0,
            torn_down: false,
            dirty: false,
            layout: None,
        }
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn state(&self) -> &DataState {
        &self.state
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Layout of the last completed paint pass.
    pub fn layout(&self) -> Option<&ChartLayout> {
        self.layout.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// When the host should next call [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.resize.deadline()
    }

    /// Starts a (re)load. The surface is wiped so a pending instance never
    /// shows shapes from earlier data.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = DataState::Pending;
        if !self.torn_down {
            self.surface.clear(self.size);
            self.layout = None;
        }
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Applies a finished load. Results for a superseded ticket or a torn-down
    /// instance are discarded; returns whether the result was applied.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Dataset, DataError>,
    ) -> bool {
        if self.torn_down || ticket.generation != self.generation {
            tracing::debug!(
                chart = self.kind.name(),
                torn_down = self.torn_down,
                "discarding stale load result"
            );
            return false;
        }
        self.state = match result {
            Ok(dataset) => {
                DataState::Ready(ChartData::aggregate(self.kind, &dataset.records, &self.config))
            }
            Err(err) => {
                tracing::warn!(chart = self.kind.name(), error = %err, "chart data unavailable");
                DataState::Failed(err.to_string())
            }
        };
        self.dirty = true;
        self.repaint();
        true
    }

    pub fn notify_resize(&mut self, size: Size, now: Instant) {
        if !self.torn_down {
            self.resize.push(size, now);
        }
    }

    /// Flushes a settled resize and repaints if anything changed. Returns
    /// whether a paint pass ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.torn_down {
            return false;
        }
        if let Some(size) = self.resize.poll(now) {
            if size != self.size {
                self.size = size;
                self.dirty = true;
            }
        }
        self.dirty && self.repaint()
    }

    /// Full clear-then-draw from the current data and size. Returns whether
    /// the surface was painted.
    pub fn repaint(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.dirty = false;
        let DataState::Ready(data) = &self.state else {
            return false;
        };
        let Some(layout) = compute_layout(data, self.size, &self.theme, &self.config) else {
            tracing::debug!(
                chart = self.kind.name(),
                width = self.size.width,
                height = self.size.height,
                "skipping paint for degenerate container"
            );
            return false;
        };
        paint_chart(&layout, &mut self.surface, &self.theme);
        self.layout = Some(layout);
        true
    }

    /// Stops all further work; any load still in flight is discarded.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.resize.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_dataset;
    use crate::render::{Primitive, Scene};
    use std::path::PathBuf;

    const CSV: &str = "genre,age_category,rating_average,adapted_to_movie\n\
        Fantasy,Adult,4.0,TRUE\n\
        \"Fantasy, Sci-Fi\",Children,4.0,FALSE\n";

    fn instance(kind: ChartKind) -> ChartInstance<Scene> {
        ChartInstance::new(
            kind,
            Scene::new(),
            Size::new(900.0, 600.0),
            Theme::classic(),
            LayoutConfig {
                fast_text_metrics: true,
                ..LayoutConfig::default()
            },
            Duration::from_millis(200),
        )
    }

    fn dataset() -> Dataset {
        parse_dataset(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn debouncer_coalesces_bursts() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        debouncer.push(1, start);
        debouncer.push(2, start + Duration::from_millis(100));
        debouncer.push(3, start + Duration::from_millis(150));
        assert_eq!(debouncer.poll(start + Duration::from_millis(300)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(350)), Some(3));
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn pending_draws_nothing() {
        let mut chart = instance(ChartKind::Bar);
        chart.begin_load();
        assert!(!chart.repaint());
        assert!(chart.surface().is_blank());
    }

    #[test]
    fn load_paints_once_ready() {
        let mut chart = instance(ChartKind::Flow);
        let ticket = chart.begin_load();
        assert!(chart.complete_load(ticket, Ok(dataset())));
        assert!(matches!(chart.state(), DataState::Ready(_)));
        assert!(!chart.surface().is_blank());
        assert!(matches!(chart.layout(), Some(ChartLayout::Flow(_))));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut chart = instance(ChartKind::Bar);
        let first = chart.begin_load();
        let second = chart.begin_load();
        assert!(!chart.complete_load(first, Ok(dataset())));
        assert_eq!(chart.state(), &DataState::Pending);
        assert!(chart.complete_load(second, Ok(dataset())));
    }

    #[test]
    fn teardown_discards_in_flight_load() {
        let mut chart = instance(ChartKind::Heatmap);
        let ticket = chart.begin_load();
        chart.teardown();
        assert!(!chart.complete_load(ticket, Ok(dataset())));
        assert_eq!(chart.state(), &DataState::Pending);
        assert!(chart.surface().is_blank());
        assert!(!chart.poll(Instant::now()));
    }

    #[test]
    fn failed_load_draws_nothing() {
        let mut chart = instance(ChartKind::Bar);
        let ticket = chart.begin_load();
        let err = DataError::Unavailable {
            path: PathBuf::from("missing.csv"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(chart.complete_load(ticket, Err(err)));
        assert!(matches!(chart.state(), DataState::Failed(_)));
        assert!(chart.surface().is_blank());
    }

    #[test]
    fn reload_failure_leaves_no_stale_shapes() {
        let mut chart = instance(ChartKind::Bar);
        let first = chart.begin_load();
        chart.complete_load(first, Ok(dataset()));
        assert!(!chart.surface().is_blank());

        let second = chart.begin_load();
        assert!(chart.surface().is_blank());
        assert!(chart.layout().is_none());
        let err = DataError::Unavailable {
            path: PathBuf::from("gone.csv"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(chart.complete_load(second, Err(err)));
        assert!(chart.surface().is_blank());
    }

    #[test]
    fn empty_dataset_paints_background_only() {
        for kind in ChartKind::ALL {
            let mut chart = instance(kind);
            let ticket = chart.begin_load();
            chart.complete_load(ticket, Ok(Dataset::default()));
            assert_eq!(chart.surface().primitives.len(), 1, "{}", kind.name());
            assert!(matches!(chart.surface().primitives[0], Primitive::Rect { .. }));
        }
    }

    #[test]
    fn resize_burst_yields_one_repaint() {
        let start = Instant::now();
        let mut chart = instance(ChartKind::Bar);
        let ticket = chart.begin_load();
        chart.complete_load(ticket, Ok(dataset()));
        for step in 0..5u64 {
            let size = Size::new(600.0 + step as f32 * 10.0, 500.0);
            chart.notify_resize(size, start + Duration::from_millis(step * 50));
        }
        assert!(!chart.poll(start + Duration::from_millis(300)));
        assert!(chart.poll(start + Duration::from_millis(400)));
        assert_eq!(chart.size(), Size::new(640.0, 500.0));
        assert_eq!(chart.surface().size, Size::new(640.0, 500.0));
        assert!(!chart.poll(start + Duration::from_millis(1000)));
    }

    #[test]
    fn zero_area_resize_keeps_previous_paint() {
        let start = Instant::now();
        let mut chart = instance(ChartKind::Bar);
        let ticket = chart.begin_load();
        chart.complete_load(ticket, Ok(dataset()));
        let before = chart.surface().clone();
        chart.notify_resize(Size::new(0.0, 0.0), start);
        assert!(!chart.poll(start + Duration::from_millis(250)));
        assert_eq!(chart.surface(), &before);
    }

    #[test]
    fn repaint_with_same_inputs_is_identical() {
        let mut chart = instance(ChartKind::Heatmap);
        let ticket = chart.begin_load();
        chart.complete_load(ticket, Ok(dataset()));
        let first = chart.surface().clone();
        chart.repaint();
        assert_eq!(chart.surface(), &first);
    }
}
