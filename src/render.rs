use crate::config::{Config, LayoutConfig};
use crate::error::SceneError;
use crate::layout::{EdgeKind, Layout, NodeLayout, NodeRole, compute_layout, round_px};
use crate::scene::Scene;
use crate::theme::{StateColors, Theme};
use crate::timeline::{Timeline, build_timeline};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Everything one generator run produces.
#[derive(Debug, Clone)]
pub struct Generated {
    pub layout: Layout,
    pub timeline: Timeline,
    pub svg: String,
}

/// Validates the scene, resolves geometry and timing, and emits the document.
pub fn generate(config: &Config) -> Result<Generated, SceneError> {
    config.scene.validate(&config.animation)?;
    let layout = compute_layout(&config.scene, &config.layout);
    tracing::debug!(
        boxes = layout.boxes.len(),
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        "resolved layout"
    );
    let timeline = build_timeline(&config.scene, &config.theme, &config.animation);
    tracing::debug!(keyframes = timeline.keyframe_count(), "built timeline");
    let svg = render_svg(&layout, &timeline, &config.scene, &config.theme, &config.layout);
    Ok(Generated {
        layout,
        timeline,
        svg,
    })
}

pub fn render_svg(
    layout: &Layout,
    timeline: &Timeline,
    scene: &Scene,
    theme: &Theme,
    config: &LayoutConfig,
) -> String {
    let (w, h) = (layout.width, layout.height);
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" width=\"100%\" height=\"100%\">"
    ));
    parts.push(defs_svg(theme));
    parts.push(style_classes(theme));
    parts.push(timeline.to_css());
    parts.push("    </style>\n  </defs>".to_string());

    parts.push(format!(
        "  <rect width=\"{w}\" height=\"{h}\" rx=\"{}\" fill=\"url(#bg)\"/>",
        config.corner_radius
    ));

    let mut section = String::from("\n  <!-- Section panels -->");
    for column in &layout.columns {
        let _ = write!(
            section,
            "\n  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"8\" fill=\"url(#sbg)\"/>",
            column.x, config.panel_top, column.panel_width, config.panel_height
        );
    }
    parts.push(section);

    let mut dividers = String::new();
    for x in layout.columns.iter().filter_map(|c| c.divider_x) {
        let _ = write!(
            dividers,
            "\n  <line x1=\"{x}\" y1=\"{top}\" x2=\"{x}\" y2=\"{bottom}\" stroke=\"{}\" stroke-width=\"1\" stroke-dasharray=\"4,3\" opacity=\"0.5\"/>",
            theme.divider_color,
            top = config.panel_top,
            bottom = config.panel_top + config.panel_height,
        );
    }
    parts.push(dividers);

    let mut headings = String::new();
    for column in &layout.columns {
        let _ = write!(
            headings,
            "\n  <text x=\"{}\" y=\"{}\" class=\"sh\" text-anchor=\"middle\">{}</text>",
            column.center_x,
            config.heading_y,
            escape_xml(&column.title)
        );
    }
    parts.push(headings);

    parts.push("\n  <!-- Window-style boxes -->".to_string());
    let hdr = config.header_height;
    let r = config.box_radius;
    for bx in &layout.boxes {
        let id_attr = bx
            .element_id()
            .map(|id| format!("id=\"{id}\" "))
            .unwrap_or_default();
        parts.push(format!(
            "  <rect {id_attr}x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"/>",
            bx.x, bx.y, bx.width, bx.height, theme.box_fill, theme.box_stroke
        ));
        parts.push(format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{hdr}\" rx=\"{r}\" fill=\"{}\"/>",
            bx.x, bx.y, bx.width, theme.header_fill
        ));
        // Square off the bottom corners of the header bar.
        parts.push(format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{r}\" fill=\"{}\"/>",
            bx.x,
            bx.y + hdr - r,
            bx.width,
            theme.header_fill
        ));
        parts.push(format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            bx.x,
            bx.y + hdr,
            bx.x + bx.width,
            bx.y + hdr,
            theme.box_stroke
        ));
        parts.push(format!(
            "  <text x=\"{}\" y=\"{}\" class=\"wh\" text-anchor=\"middle\">{}</text>",
            round_px(f64::from(bx.x) + f64::from(bx.width) / 2.0),
            bx.y + hdr - 5,
            escape_xml(&bx.label)
        ));
    }

    parts.push("\n  <!-- DB partition lines -->".to_string());
    for part in &layout.partitions {
        parts.push(format!(
            "  <line x1=\"{x}\" y1=\"{}\" x2=\"{x}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"1\" stroke-dasharray=\"3,2\" opacity=\"0.5\"/>",
            part.y1,
            part.y2,
            theme.partition_color,
            x = part.x
        ));
        parts.push(format!(
            "  <text x=\"{}\" y=\"{}\" class=\"dbl\" text-anchor=\"middle\">DBs</text>",
            part.label_x, part.label_y
        ));
    }

    let sections = [
        (EdgeKind::Static, "Static internal edges"),
        (EdgeKind::Animated, "Animated internal edges"),
        (EdgeKind::Safe, "Permanent cross-box edges (safe path)"),
        (EdgeKind::Volatile, "Volatile cross-box edges (affected path)"),
    ];
    for (kind, comment) in sections {
        parts.push(format!("\n  <!-- {comment} -->"));
        for edge in layout.edges_of(kind) {
            let id_attr = edge
                .element_id()
                .map(|id| format!("id=\"{id}\" "))
                .unwrap_or_default();
            let s = edge.segment;
            let style = match kind {
                EdgeKind::Static | EdgeKind::Animated => format!(
                    "stroke=\"{}\" stroke-width=\"1\" stroke-linecap=\"round\" marker-end=\"url(#ah)\"",
                    theme.edge_color
                ),
                EdgeKind::Safe => format!(
                    "stroke=\"{}\" stroke-width=\"1.5\" stroke-linecap=\"round\" stroke-dasharray=\"5,3\" opacity=\"0.35\"",
                    theme.cross_edge_color
                ),
                EdgeKind::Volatile => format!(
                    "stroke=\"{}\" stroke-width=\"1.5\" stroke-linecap=\"round\" stroke-dasharray=\"5,3\" opacity=\"0.5\"",
                    theme.cross_edge_color
                ),
            };
            parts.push(format!(
                "  <line {id_attr}x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" {style}/>",
                s.x1, s.y1, s.x2, s.y2
            ));
        }
    }

    let nr = config.node_radius;
    parts.push("\n  <!-- Static nodes -->".to_string());
    for node in layout.nodes_of(NodeRole::Normal) {
        parts.push(node_circle(node, nr, "", Some(&theme.consistent)));
    }

    parts.push("\n  <!-- DB nodes -->".to_string());
    // Database nodes are drawn host by host in index order.
    for host in &scene.hosts {
        for &index in &host.db {
            let Some(node) = layout
                .nodes
                .iter()
                .find(|n| n.node.host == host.id && n.node.index == index)
            else {
                continue;
            };
            let id_attr = if node.flashes {
                format!("id=\"db-{}\" ", node.node)
            } else {
                String::new()
            };
            parts.push(node_circle(node, nr, &id_attr, Some(&theme.database)));
        }
    }

    parts.push("\n  <!-- Old nodes (fade + drift down during invalidation) -->".to_string());
    for node in layout.invalidated.iter().filter_map(|n| layout.node(n)) {
        parts.push(format!(
            "  <g id=\"old-{}\">{}</g>",
            node.node,
            node_circle(node, nr, "", None).trim_start()
        ));
    }

    parts.push("\n  <!-- New nodes (appear during recomputation: blue \u{2192} green) -->".to_string());
    for node in layout.recomputed.iter().filter_map(|n| layout.node(n)) {
        parts.push(format!(
            "  <g id=\"new-{}\">{}</g>",
            node.node,
            node_circle(node, nr, "", None).trim_start()
        ));
    }

    parts.push("\n  <!-- Description text -->".to_string());
    for (i, caption) in scene.timing.captions.iter().enumerate() {
        parts.push(format!(
            "  <text id=\"desc-{i}\" x=\"{}\" y=\"{}\" class=\"desc\" opacity=\"0\">{}</text>",
            w / 2,
            config.caption_y,
            escape_xml(&caption.text)
        ));
    }

    parts.push(legend_svg(theme, config));
    parts.push("</svg>".to_string());
    parts.join("\n")
}

/// A node circle; state-driven nodes leave fill and stroke to their animation group.
fn node_circle(node: &NodeLayout, radius: i32, id_attr: &str, colors: Option<&StateColors>) -> String {
    let paint = colors
        .map(|c| {
            format!(
                " fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"",
                c.fill, c.stroke
            )
        })
        .unwrap_or_default();
    format!(
        "  <circle {id_attr}cx=\"{}\" cy=\"{}\" r=\"{radius}\" data-node=\"{}\"{paint}/>",
        node.center.x, node.center.y, node.node
    )
}

fn defs_svg(theme: &Theme) -> String {
    let mut defs = String::from(
        "  <defs>\n    <linearGradient id=\"bg\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\">",
    );
    let last = theme.background_stops.len().saturating_sub(1).max(1);
    for (i, color) in theme.background_stops.iter().enumerate() {
        let _ = write!(
            defs,
            "\n      <stop offset=\"{}%\" stop-color=\"{color}\"/>",
            i * 100 / last
        );
    }
    let _ = write!(
        defs,
        "\n    </linearGradient>\
         \n    <linearGradient id=\"sbg\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\" gradientUnits=\"objectBoundingBox\">\
         \n      <stop offset=\"0%\" stop-color=\"{}\" stop-opacity=\"0.4\"/>\
         \n      <stop offset=\"100%\" stop-color=\"{}\" stop-opacity=\"0.12\"/>\
         \n    </linearGradient>\
         \n    <marker id=\"ah\" viewBox=\"0 0 10 10\" refX=\"8.5\" refY=\"5\"\
         \n            markerWidth=\"5\" markerHeight=\"5\" orient=\"auto\">\
         \n      <path d=\"M 0 1.5 L 8.5 5 L 0 8.5 z\" fill=\"{}\"/>\
         \n    </marker>\
         \n    <style>",
        theme.panel_top, theme.panel_bottom, theme.edge_color
    );
    defs
}

fn style_classes(theme: &Theme) -> String {
    let font = &theme.font_family;
    let classes = [
        (
            "sh",
            format!(
                "font-size: 11px; fill: {}; font-weight: 600; letter-spacing: 0.5px; text-transform: uppercase",
                theme.heading_text
            ),
        ),
        (
            "bl",
            format!("font-size: 9px; fill: {}; font-weight: 500", theme.label_text),
        ),
        (
            "wh",
            format!("font-size: 9px; fill: {}; font-weight: 600", theme.label_text),
        ),
        (
            "dbl",
            format!(
                "font-size: 8px; fill: {}; font-weight: 500; font-style: italic",
                theme.db_label_text
            ),
        ),
        (
            "lg",
            format!(
                "font-size: 10px; fill: {}; font-style: italic; stroke: none",
                theme.heading_text
            ),
        ),
        (
            "desc",
            format!(
                "font-size: 11px; fill: {}; font-weight: 500; text-anchor: middle",
                theme.label_text
            ),
        ),
    ];
    let lines: Vec<String> = classes
        .iter()
        .map(|(name, rules)| format!("      .{name} {{ font-family: {font}; {rules} }}"))
        .collect();
    lines.join("\n")
}

fn legend_svg(theme: &Theme, config: &LayoutConfig) -> String {
    let swatches = [
        (0, &theme.consistent, "consistent"),
        (90, &theme.invalidated, "invalidated"),
        (195, &theme.computing, "computing"),
        (295, &theme.cache_hit, "cache hit"),
    ];
    let mut out = format!(
        "\n  <!-- Legend -->\n  <g transform=\"translate({}, {})\">",
        (config.width - config.legend_width) / 2,
        config.height - config.legend_bottom
    );
    for (x, colors, label) in swatches {
        let _ = write!(
            out,
            "\n    <circle cx=\"{x}\" cy=\"-2\" r=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"/>\
             \n    <text x=\"{}\" y=\"2\" class=\"lg\">{label}</text>",
            colors.fill,
            colors.stroke,
            x + 8
        );
    }
    let _ = write!(
        out,
        "\n    <line x1=\"375\" y1=\"-2\" x2=\"405\" y2=\"-2\" stroke=\"{}\" stroke-width=\"1.5\" stroke-dasharray=\"5,3\" stroke-linecap=\"round\"/>\
         \n    <text x=\"413\" y=\"2\" class=\"lg\">network hop</text>\
         \n    <circle cx=\"500\" cy=\"-2\" r=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"/>\
         \n    <text x=\"508\" y=\"2\" class=\"lg\">DB (ground truth)</text>\
         \n  </g>",
        theme.cross_edge_color, theme.database.fill, theme.database.stroke
    );
    out
}

/// Writes the document to `output`, or to stdout when `output` is `None`.
pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, svg)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_svg() -> String {
        generate(&Config::default()).unwrap().svg
    }

    #[test]
    fn render_svg_basic() {
        let svg = default_svg();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 870 600\""));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">API Server 1</text>"));
        assert!(svg.contains(">Backend Servers</text>"));
    }

    #[test]
    fn only_animated_boxes_get_ids() {
        let svg = default_svg();
        assert!(svg.contains("<rect id=\"bx-C1\" x=\"50\" y=\"42\" width=\"200\" height=\"70\""));
        assert!(!svg.contains("id=\"bx-C3\""));
        assert!(!svg.contains("id=\"bx-B1\""));
    }

    #[test]
    fn flash_node_is_the_only_tagged_db_node() {
        let svg = default_svg();
        assert_eq!(svg.matches("id=\"db-").count(), 1);
        assert!(svg.contains("<circle id=\"db-B2-3\""));
    }

    #[test]
    fn every_node_circle_names_its_node() {
        let svg = default_svg();
        // 24 drawn once, 16 affected drawn as old and new renditions.
        assert_eq!(svg.matches(" data-node=\"").count(), 40 + 16);
        assert!(svg.contains("<g id=\"old-C1-0\"><circle cx=\"92\" cy=\"81\" r=\"5\" data-node=\"C1-0\"/></g>"));
    }

    #[test]
    fn captions_are_escaped() {
        let mut config = Config::default();
        config.scene.timing.captions[0].text = "a < b & c".to_string();
        let svg = generate(&config).unwrap().svg;
        assert!(svg.contains(">a &lt; b &amp; c</text>"));
    }

    #[test]
    fn invalid_scene_emits_nothing() {
        let mut config = Config::default();
        config.scene.cross_edges[0].to.index = 42;
        assert!(matches!(
            generate(&config),
            Err(SceneError::UnknownNode { index: 42, .. })
        ));
    }

    #[test]
    fn escape_xml_covers_markup_characters() {
        assert_eq!(escape_xml("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
    }
}
