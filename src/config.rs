use crate::scene::Scene;
use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canvas and box geometry, in pixels unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub width: i32,
    pub height: i32,
    pub corner_radius: i32,
    pub column_width: i32,
    /// Gap kept between a column panel and the next column's divider line.
    pub panel_gutter: i32,
    pub panel_top: i32,
    pub panel_height: i32,
    pub heading_y: i32,
    pub box_width: i32,
    pub box_radius: i32,
    pub header_height: i32,
    pub padding: i32,
    pub node_radius: i32,
    /// Fraction of the box width where the database partition line sits.
    pub db_partition: f64,
    pub caption_y: i32,
    pub legend_width: i32,
    pub legend_bottom: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 870,
            height: 600,
            corner_radius: 10,
            column_width: 280,
            panel_gutter: 5,
            panel_top: 34,
            panel_height: 470,
            heading_y: 26,
            box_width: 200,
            box_radius: 6,
            header_height: 18,
            padding: 10,
            node_radius: 5,
            db_partition: 0.62,
            caption_y: 530,
            legend_width: 600,
            legend_bottom: 20,
        }
    }
}

/// Cycle-wide timing knobs; per-element phases live in [`crate::scene::Timing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationConfig {
    pub cycle_secs: u32,
    /// Percent of the cycle an invalidated node takes to fade out.
    pub fade_len: u32,
    pub drift_px: u32,
    /// Percent between consecutive invalidations inside one host.
    pub stagger: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            cycle_secs: 48,
            fade_len: 8,
            drift_px: 12,
            stagger: 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub animation: AnimationConfig,
    pub scene: Scene,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<Theme>,
    layout: Option<LayoutConfig>,
    animation: Option<AnimationConfig>,
    scene: Option<Scene>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config file {}", path.display()))
}

/// Parses a JSON5 config; every section is optional and falls back to the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();
    if let Some(theme) = parsed.theme {
        config.theme = theme;
    }
    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }
    if let Some(animation) = parsed.animation {
        config.animation = animation;
    }
    if let Some(scene) = parsed.scene {
        config.scene = scene;
    }
    Ok(config)
}
