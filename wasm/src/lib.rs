use book_charts::config::Config;
use book_charts::{
    compute_layout, paint_chart, parse_dataset, render_svg, ChartData, ChartKind, Dashboard, Scene,
    Size, Surface, Theme,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    fast_text: Option<bool>,
}

fn build_config(options: ChartRenderOptions) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(name) = options.theme.as_deref() {
        config.theme = Theme::by_name(name).ok_or_else(|| format!("unknown theme `{name}`"))?;
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    // Browsers rarely expose system fonts to wasm; measure with the built-in table.
    config.layout.fast_text_metrics = options.fast_text.unwrap_or(true);
    Ok(config)
}

fn parse_options(options_json: Option<String>) -> Result<Config, String> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<ChartRenderOptions>(&raw).map_err(|e| e.to_string())?,
        None => ChartRenderOptions::default(),
    };
    build_config(options)
}

fn chart_kind(name: &str) -> Result<ChartKind, String> {
    ChartKind::ALL
        .into_iter()
        .find(|kind| kind.name() == name)
        .ok_or_else(|| format!("unknown chart `{name}`"))
}

fn chart_svg(csv: &str, chart: &str, width: f32, height: f32, config: &Config) -> Result<String, String> {
    let kind = chart_kind(chart)?;
    let dataset = parse_dataset(csv.as_bytes()).map_err(|e| e.to_string())?;
    let data = ChartData::aggregate(kind, &dataset.records, &config.layout);
    let size = Size::new(width, height);
    let mut scene = Scene::new();
    match compute_layout(&data, size, &config.theme, &config.layout) {
        Some(layout) => paint_chart(&layout, &mut scene, &config.theme),
        None => scene.clear(size),
    }
    Ok(render_svg(&scene, &config.theme))
}

fn page_svg(csv: &str, width: f32, height: f32, config: Config) -> Result<String, String> {
    let dataset = parse_dataset(csv.as_bytes()).map_err(|e| e.to_string())?;
    let mut dashboard = Dashboard::new(Size::new(width, height), config);
    dashboard.load_with(|| Ok(dataset.clone()));
    Ok(dashboard.render_svg())
}

/// Renders one chart (`bar`, `heatmap` or `flow`) from CSV text.
#[wasm_bindgen]
pub fn render_chart_svg(
    csv: &str,
    chart: &str,
    width: f32,
    height: f32,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let config = parse_options(options_json).map_err(|e| JsValue::from_str(&e))?;
    chart_svg(csv, chart, width, height, &config).map_err(|e| JsValue::from_str(&e))
}

/// Renders the three-chart page from CSV text.
#[wasm_bindgen]
pub fn render_dashboard_svg(
    csv: &str,
    width: f32,
    height: f32,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let config = parse_options(options_json).map_err(|e| JsValue::from_str(&e))?;
    page_svg(csv, width, height, config).map_err(|e| JsValue::from_str(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "genre,age_category,rating_average,adapted_to_movie\n\
        Fantasy,Adult,4.2,TRUE\n\
        Fantasy,Children,3.9,FALSE\n\
        Fantasy,Young Adult,4.0,FALSE\n\
        Thriller,Adult,3.7,TRUE\n";

    #[test]
    fn renders_each_chart() {
        let config = build_config(ChartRenderOptions::default()).unwrap();
        for chart in ["bar", "heatmap", "flow"] {
            let svg = chart_svg(CSV, chart, 800.0, 500.0, &config).unwrap();
            assert!(svg.starts_with("<svg"), "{chart}");
        }
        assert!(chart_svg(CSV, "pie", 800.0, 500.0, &config).is_err());
    }

    #[test]
    fn renders_page() {
        let config = build_config(ChartRenderOptions {
            theme: Some("modern".into()),
            ..Default::default()
        })
        .unwrap();
        let svg = page_svg(CSV, 1400.0, 900.0, config).unwrap();
        assert!(svg.contains("Movie Adaptation"));
    }

    #[test]
    fn rejects_unknown_theme() {
        assert!(parse_options(Some(r#"{"theme":"neon"}"#.into())).is_err());
    }
}
