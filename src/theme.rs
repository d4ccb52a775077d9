use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::AgeCategory;
use crate::ir::FlowNamespace;

/// Semantic colour table shared by every chart, so a genre keeps its colour
/// between the bar chart and the flow diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub genres: BTreeMap<String, String>,
    pub ages: BTreeMap<AgeCategory, String>,
    pub adapted: String,
    pub not_adapted: String,
    pub fallback: String,
}

impl Palette {
    pub fn genre(&self, genre: &str) -> &str {
        self.genres
            .get(genre)
            .map(String::as_str)
            .unwrap_or(self.fallback.as_str())
    }

    pub fn age(&self, age: AgeCategory) -> &str {
        self.ages
            .get(&age)
            .map(String::as_str)
            .unwrap_or(self.fallback.as_str())
    }

    pub fn adaptation(&self, adapted: bool) -> &str {
        if adapted {
            &self.adapted
        } else {
            &self.not_adapted
        }
    }

    /// Colour of a namespaced flow node id such as `Genre: Fantasy`.
    pub fn flow_node(&self, id: &str) -> &str {
        match FlowNamespace::of_id(id) {
            Some((FlowNamespace::Genre, label)) => self.genre(label),
            Some((FlowNamespace::Age, label)) => AgeCategory::parse(label)
                .map(|age| self.age(age))
                .unwrap_or(self.fallback.as_str()),
            Some((FlowNamespace::Adapted, "True")) => self.adaptation(true),
            Some((FlowNamespace::Adapted, "False")) => self.adaptation(false),
            _ => self.fallback.as_str(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        let genres = [
            ("Fantasy", "#22c4c9"),
            ("Sci-Fi", "#22c938"),
            ("Historical Fiction", "#e69d2c"),
            ("Fiction", "#c122c9"),
            ("Thriller", "#c92225"),
        ]
        .into_iter()
        .map(|(genre, color)| (genre.to_string(), color.to_string()))
        .collect();
        let ages = [
            (AgeCategory::Adult, "#f70094"),
            (AgeCategory::YoungAdult, "#3f756c"),
            (AgeCategory::Children, "#753434"),
        ]
        .into_iter()
        .map(|(age, color)| (age, color.to_string()))
        .collect();
        Self {
            genres,
            ages,
            adapted: "#36ad5e".to_string(),
            not_adapted: "#e62929".to_string(),
            fallback: "#999999".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    pub panel_background: String,
    pub panel_radius: f32,
    pub text_color: String,
    pub axis_text_color: String,
    pub axis_line_color: String,
    pub title_color: String,
    pub node_stroke: String,
    pub cell_stroke: String,
    pub palette: Palette,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            background: "#FFFFFF".to_string(),
            panel_background: "#e4e3e3".to_string(),
            panel_radius: 8.0,
            text_color: "#111111".to_string(),
            axis_text_color: "#333333".to_string(),
            axis_line_color: "#000000".to_string(),
            title_color: "#000000".to_string(),
            node_stroke: "#333333".to_string(),
            cell_stroke: "#ffffff".to_string(),
            palette: Palette::default(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            background: "#FFFFFF".to_string(),
            panel_background: "#F3F5F9".to_string(),
            panel_radius: 10.0,
            text_color: "#1C2430".to_string(),
            axis_text_color: "#3A4556".to_string(),
            axis_line_color: "#7A8AA6".to_string(),
            title_color: "#1C2430".to_string(),
            node_stroke: "#1C2430".to_string(),
            cell_stroke: "#FFFFFF".to_string(),
            palette: Palette::default(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "classic" | "default" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }
}
