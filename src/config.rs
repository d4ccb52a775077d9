use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Margin sides are `max(floor, base * ratio)` where `base = min(width, height)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarginConfig {
    pub top_floor: f32,
    pub top_ratio: f32,
    pub right_floor: f32,
    pub right_ratio: f32,
    pub bottom_floor: f32,
    pub bottom_ratio: f32,
    pub left_floor: f32,
    pub left_ratio: f32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            top_floor: 50.0,
            top_ratio: 0.12,
            right_floor: 60.0,
            right_ratio: 0.35,
            bottom_floor: 80.0,
            bottom_ratio: 0.30,
            left_floor: 80.0,
            left_ratio: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarConfig {
    pub top_k: usize,
    pub band_padding: f32,
    pub bar_opacity: f32,
    pub corner_radius: f32,
    pub tick_count: usize,
    pub label_rotation: f32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            band_padding: 0.15,
            bar_opacity: 0.45,
            corner_radius: 5.0,
            tick_count: 10,
            label_rotation: -35.0,
            title: "Top 5 Book Genres by Count".to_string(),
            x_label: "Genre".to_string(),
            y_label: "Number of Books".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    pub max_categories: usize,
    pub band_padding: f32,
    pub corner_radius: f32,
    pub cell_stroke_width: f32,
    pub label_rotation: f32,
    pub legend_width: f32,
    pub legend_height_ratio: f32,
    pub legend_gap: f32,
    pub legend_top_offset: f32,
    pub gradient_stops: usize,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub footnote: String,
    pub legend_title: String,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            max_categories: 6,
            band_padding: 0.06,
            corner_radius: 6.0,
            cell_stroke_width: 2.0,
            label_rotation: -35.0,
            legend_width: 20.0,
            legend_height_ratio: 0.9,
            legend_gap: 40.0,
            legend_top_offset: 20.0,
            gradient_stops: 101,
            title: "Average Book Rating by Genre and Age Group".to_string(),
            x_label: "Genre".to_string(),
            y_label: "Age Group".to_string(),
            footnote: "*Only including Genres with data spaning all 3 age groups*".to_string(),
            legend_title: "Avg Rating".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub top_k: usize,
    pub extent_inset: f32,
    pub node_width_ratio: f32,
    pub node_width_min: f32,
    pub node_padding_ratio: f32,
    pub node_padding_min: f32,
    pub min_height: f32,
    pub height_ratio: f32,
    pub link_opacity: f32,
    pub label_gap: f32,
    pub label_font_size: f32,
    pub title_font_size: f32,
    pub title_x: f32,
    pub title_y: f32,
    pub title: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            extent_inset: 40.0,
            node_width_ratio: 0.02,
            node_width_min: 14.0,
            node_padding_ratio: 0.035,
            node_padding_min: 12.0,
            min_height: 320.0,
            height_ratio: 0.37,
            link_opacity: 0.45,
            label_gap: 6.0,
            label_font_size: 13.0,
            title_font_size: 22.0,
            title_x: 20.0,
            title_y: 30.0,
            title: "Flow from Genre to Age Group to Movie Adaptation".to_string(),
        }
    }
}

/// Page grid for the three-chart dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub title: String,
    pub title_font_size: f32,
    pub padding_top: f32,
    pub padding_x: f32,
    pub stack_spacing: f32,
    pub grid_spacing: f32,
    pub top_row_ratio: f32,
    pub bottom_columns: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Patterns in Genre Popularity, Ratings, and Film Adaptations".to_string(),
            title_font_size: 34.0,
            padding_top: 32.0,
            padding_x: 32.0,
            stack_spacing: 8.0,
            grid_spacing: 16.0,
            top_row_ratio: 0.4,
            bottom_columns: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub margin: MarginConfig,
    pub bar: BarConfig,
    pub heatmap: HeatmapConfig,
    pub flow: FlowConfig,
    pub dashboard: DashboardConfig,
    pub fast_text_metrics: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: MarginConfig::default(),
            bar: BarConfig::default(),
            heatmap: HeatmapConfig::default(),
            flow: FlowConfig::default(),
            dashboard: DashboardConfig::default(),
            fast_text_metrics: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub debounce_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            debounce_ms: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    background: Option<String>,
    panel_background: Option<String>,
    panel_radius: Option<f32>,
    text_color: Option<String>,
    axis_text_color: Option<String>,
    axis_line_color: Option<String>,
    title_color: Option<String>,
    node_stroke: Option<String>,
    cell_stroke: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PaletteFile {
    genres: Option<BTreeMap<String, String>>,
    children: Option<String>,
    young_adult: Option<String>,
    adult: Option<String>,
    adapted: Option<String>,
    not_adapted: Option<String>,
    fallback: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BarConfigFile {
    top_k: Option<usize>,
    band_padding: Option<f32>,
    bar_opacity: Option<f32>,
    corner_radius: Option<f32>,
    tick_count: Option<usize>,
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct HeatmapConfigFile {
    max_categories: Option<usize>,
    band_padding: Option<f32>,
    corner_radius: Option<f32>,
    legend_width: Option<f32>,
    gradient_stops: Option<usize>,
    title: Option<String>,
    footnote: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FlowConfigFile {
    top_k: Option<usize>,
    extent_inset: Option<f32>,
    node_width_ratio: Option<f32>,
    node_width_min: Option<f32>,
    node_padding_ratio: Option<f32>,
    node_padding_min: Option<f32>,
    min_height: Option<f32>,
    link_opacity: Option<f32>,
    title: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    palette: Option<PaletteFile>,
    bar: Option<BarConfigFile>,
    heatmap: Option<HeatmapConfigFile>,
    flow: Option<FlowConfigFile>,
    margin: Option<MarginConfig>,
    width: Option<f32>,
    height: Option<f32>,
    debounce_ms: Option<u64>,
    fast_text_metrics: Option<bool>,
}

macro_rules! apply {
    ($target:expr, $source:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $source.$field {
                $target.$field = value;
            }
        )+
    };
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    // Strict JSON first, JSON5 for hand-edited files with comments.
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents).map_err(|_| json_err)?,
    };
    let mut config = Config::default();

    if let Some(name) = parsed.theme.as_deref() {
        config.theme =
            Theme::by_name(name).ok_or_else(|| anyhow::anyhow!("unknown theme `{name}`"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        apply!(
            config.theme,
            vars,
            font_family,
            background,
            panel_background,
            panel_radius,
            text_color,
            axis_text_color,
            axis_line_color,
            title_color,
            node_stroke,
            cell_stroke,
        );
    }

    if let Some(palette) = parsed.palette {
        let target = &mut config.theme.palette;
        if let Some(genres) = palette.genres {
            target.genres.extend(genres);
        }
        for (age, color) in [
            (crate::data::AgeCategory::Children, palette.children),
            (crate::data::AgeCategory::YoungAdult, palette.young_adult),
            (crate::data::AgeCategory::Adult, palette.adult),
        ] {
            if let Some(color) = color {
                target.ages.insert(age, color);
            }
        }
        apply!(target, palette, adapted, not_adapted, fallback);
    }

    if let Some(bar) = parsed.bar {
        apply!(
            config.layout.bar,
            bar,
            top_k,
            band_padding,
            bar_opacity,
            corner_radius,
            tick_count,
            title,
            x_label,
            y_label,
        );
    }

    if let Some(heatmap) = parsed.heatmap {
        apply!(
            config.layout.heatmap,
            heatmap,
            max_categories,
            band_padding,
            corner_radius,
            legend_width,
            gradient_stops,
            title,
            footnote,
        );
    }

    if let Some(flow) = parsed.flow {
        apply!(
            config.layout.flow,
            flow,
            top_k,
            extent_inset,
            node_width_ratio,
            node_width_min,
            node_padding_ratio,
            node_padding_min,
            min_height,
            link_opacity,
            title,
        );
    }

    if let Some(margin) = parsed.margin {
        config.layout.margin = margin;
    }
    apply!(config.render, parsed, width, height, debounce_ms);
    apply!(config.layout, parsed, fast_text_metrics);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.bar.top_k, 5);
        assert_eq!(config.layout.heatmap.max_categories, 6);
        assert_eq!(config.render.debounce_ms, 200);
    }

    #[test]
    fn overrides_are_partial() {
        let config = parse_config(
            r##"{
                "theme": "modern",
                "themeVariables": { "panelBackground": "#ffffff" },
                "palette": { "genres": { "Horror": "#000000" }, "adult": "#123456" },
                "bar": { "topK": 3 },
                "flow": { "nodeWidthMin": 20 },
                "debounceMs": 50
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.panel_background, "#ffffff");
        assert_eq!(config.theme.palette.genre("Horror"), "#000000");
        assert_eq!(config.theme.palette.genre("Fantasy"), "#22c4c9");
        assert_eq!(
            config.theme.palette.age(crate::data::AgeCategory::Adult),
            "#123456"
        );
        assert_eq!(config.layout.bar.top_k, 3);
        assert_eq!(config.layout.bar.band_padding, 0.15);
        assert_eq!(config.layout.flow.node_width_min, 20.0);
        assert_eq!(config.render.debounce_ms, 50);
    }

    #[test]
    fn accepts_json5_comments() {
        let config = parse_config("{ // tighter heatmap\n heatmap: { maxCategories: 4 }, }").unwrap();
        assert_eq!(config.layout.heatmap.max_categories, 4);
    }

    #[test]
    fn rejects_unknown_theme() {
        assert!(parse_config(r#"{ "theme": "neon" }"#).is_err());
    }
}
