use crate::config::LayoutConfig;
use crate::text_metrics;

/// Approximate advance of `ch` in em units for a generic sans-serif face.
pub(super) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '\'' | '(' | ')' | '[' | ']' => 0.321,
        'i' | 'j' | 'l' | 'I' => 0.24,
        'f' | 't' | 'r' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '-' => 0.39,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.56,
        '0'..='9' => 0.6,
        _ => 0.568,
    }
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

pub(super) fn text_width(text: &str, font_size: f32, font_family: &str, config: &LayoutConfig) -> f32 {
    if config.fast_text_metrics && text.is_ascii() {
        return fallback_text_width(text, font_size);
    }
    text_metrics::measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| fallback_text_width(text, font_size))
}

/// Whether every label fits inside a slot of `slot_width` pixels.
pub(super) fn labels_fit<'a>(
    labels: impl IntoIterator<Item = &'a str>,
    slot_width: f32,
    font_size: f32,
    font_family: &str,
    config: &LayoutConfig,
) -> bool {
    labels
        .into_iter()
        .all(|label| text_width(label, font_size, font_family, config) <= slot_width)
}

/// Tick label text: integers without a fractional part.
pub(super) fn format_tick(value: f64) -> String {
    // Adding zero folds -0.0 into 0.0.
    let rounded = (value * 1e6).round() / 1e6 + 0.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        let text = format!("{:.6}", rounded);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_width_factor_returns_positive_values() {
        for ch in ['a', 'Z', ' ', '0', '@', '\u{4e2d}'] {
            assert!(char_width_factor(ch) > 0.0, "char {:?} has zero width", ch);
        }
    }

    #[test]
    fn fallback_text_width_scales_with_font_size() {
        let w16 = fallback_text_width("Fantasy", 16.0);
        let w32 = fallback_text_width("Fantasy", 32.0);
        assert!((w32 - w16 * 2.0).abs() < 0.01);
    }

    #[test]
    fn fit_check_uses_fast_metrics() {
        let config = LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        };
        assert!(labels_fit(["Fantasy", "Sci-Fi"], 200.0, 12.0, "sans-serif", &config));
        assert!(!labels_fit(["Historical Fiction"], 30.0, 12.0, "sans-serif", &config));
    }

    #[test]
    fn formats_ticks() {
        assert_eq!(format_tick(40.0), "40");
        assert_eq!(format_tick(-0.0), "0");
        assert_eq!(format_tick(-1e-9), "0");
        assert_eq!(format_tick(-2.0), "-2");
        assert_eq!(format_tick(3.5), "3.5");
        assert_eq!(format_tick(0.1 + 0.2), "0.3");
    }
}
