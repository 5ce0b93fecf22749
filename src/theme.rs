use serde::{Deserialize, Serialize};

/// Fill and stroke of one visual state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateColors {
    pub fill: String,
    pub stroke: String,
}

impl StateColors {
    fn new(fill: &str, stroke: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub font_family: String,
    pub consistent: StateColors,
    pub invalidated: StateColors,
    pub computing: StateColors,
    pub cache_hit: StateColors,
    pub database: StateColors,
    pub database_flash: StateColors,
    pub background_stops: Vec<String>,
    pub panel_top: String,
    pub panel_bottom: String,
    pub box_fill: String,
    pub box_stroke: String,
    pub header_fill: String,
    pub divider_color: String,
    pub partition_color: String,
    pub edge_color: String,
    pub cross_edge_color: String,
    pub heading_text: String,
    pub label_text: String,
    pub db_label_text: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::fusion()
    }
}

impl Theme {
    /// Soft blue documentation palette with green/bleach/blue value states.
    pub fn fusion() -> Self {
        Self {
            font_family: "Inter,-apple-system,BlinkMacSystemFont,\"Segoe UI\",sans-serif"
                .to_string(),
            consistent: StateColors::new("#c8e8d0", "#78b490"),
            invalidated: StateColors::new("#ede8e3", "#c4bab2"),
            computing: StateColors::new("#c8ddf8", "#6b9ad4"),
            cache_hit: StateColors::new("#b0dcc0", "#58a078"),
            database: StateColors::new("#e4ddd6", "#b0a498"),
            database_flash: StateColors::new("#f0c8a0", "#d09050"),
            background_stops: vec![
                "#f4f8fd".to_string(),
                "#eaf1fb".to_string(),
                "#e2ebf7".to_string(),
            ],
            panel_top: "#ffffff".to_string(),
            panel_bottom: "#d0daea".to_string(),
            box_fill: "#f0f4fa".to_string(),
            box_stroke: "#c0c8d4".to_string(),
            header_fill: "#e4e9f2".to_string(),
            divider_color: "#c8d0dc".to_string(),
            partition_color: "#b8b0a4".to_string(),
            edge_color: "#b8c0cc".to_string(),
            cross_edge_color: "#8b90a8".to_string(),
            heading_text: "#8b90a8".to_string(),
            label_text: "#5c6b82".to_string(),
            db_label_text: "#a09488".to_string(),
        }
    }
}
