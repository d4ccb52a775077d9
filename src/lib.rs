pub mod aggregate;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod dashboard;
pub mod data;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod scale;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{load_config, Config};
pub use coordinator::{ChartInstance, DataState, Debouncer, LoadTicket};
pub use dashboard::{dashboard_grid, Dashboard, DashboardGrid};
pub use data::{load_dataset, parse_dataset, AgeCategory, DataError, Dataset, Record};
pub use layout::{compute_layout, ChartData, ChartKind, ChartLayout, Size};
pub use render::{paint_chart, render_svg, Scene, Surface};
pub use theme::Theme;
