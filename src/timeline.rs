//! Keyframe tables for every element that changes over the animation cycle.
//!
//! Percentages are whole numbers of the cycle. Tables are built from the
//! scene's phase tables and rendered into CSS `@keyframes` blocks plus the
//! `#id{animation:...}` rules that bind them to elements.

use crate::config::AnimationConfig;
use crate::scene::{CrossLink, NodeRef, Recompute, Scene};
use crate::theme::{StateColors, Theme};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyframe {
    /// One or more percentages sharing the same style, e.g. `0%,14%`.
    pub offsets: Vec<u32>,
    pub style: String,
}

impl Keyframe {
    fn new(offsets: &[u32], style: impl Into<String>) -> Self {
        Self {
            offsets: offsets.to_vec(),
            style: style.into(),
        }
    }

    fn selector(&self) -> String {
        let parts: Vec<String> = self.offsets.iter().map(|pct| format!("{pct}%")).collect();
        parts.join(",")
    }
}

/// Builder for tables whose stops may collide: the last write for a
/// percentage wins and stops come out sorted.
#[derive(Debug, Clone, Default)]
pub struct StopTable {
    stops: BTreeMap<u32, String>,
}

impl StopTable {
    pub fn set(&mut self, pct: u32, style: impl Into<String>) {
        self.stops.insert(pct, style.into());
    }

    pub fn into_frames(self) -> Vec<Keyframe> {
        self.stops
            .into_iter()
            .map(|(pct, style)| Keyframe {
                offsets: vec![pct],
                style,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLayout {
    /// One keyframe per line.
    Stacked,
    /// All keyframes on a single line.
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframeTable {
    pub name: String,
    /// Id of the element the table is bound to.
    pub target: String,
    pub frames: Vec<Keyframe>,
    pub layout: FrameLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    OldNodes,
    NewNodes,
    DbFlash,
    InternalEdges,
    CrossEdges,
    Boxes,
    Captions,
}

impl Family {
    fn comment(self) -> &'static str {
        match self {
            Family::OldNodes => "Old nodes: bleach \u{2192} fade + drift down (staggered by x-position)",
            Family::NewNodes => {
                "New nodes: appear computing \u{2192} green (with optional cache-hit flashes)"
            }
            Family::DbFlash => "DB node flash",
            Family::InternalEdges => "Animated internal edges",
            Family::CrossEdges => "Volatile cross-box edges",
            Family::Boxes => "Box stroke animations",
            Family::Captions => "Description text phases",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub cycle_secs: u32,
    pub families: Vec<(Family, Vec<KeyframeTable>)>,
}

impl Timeline {
    pub fn tables(&self) -> impl Iterator<Item = &KeyframeTable> {
        self.families.iter().flat_map(|(_, tables)| tables.iter())
    }

    pub fn keyframe_count(&self) -> usize {
        self.tables().count()
    }

    pub fn family(&self, family: Family) -> &[KeyframeTable] {
        self.families
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, tables)| tables.as_slice())
            .unwrap_or(&[])
    }

    /// CSS for the `<style>` element: keyframe blocks followed by the bindings.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        let _ = write!(
            css,
            "\n      /* {}s cycle. Invalidation R\u{2192}L with fade+drift, recomputation L\u{2192}R with cache hits. */",
            self.cycle_secs
        );
        for (family, tables) in &self.families {
            let _ = write!(css, "\n\n      /* {} */", family.comment());
            for table in tables {
                css.push('\n');
                css.push_str(&render_table(table));
            }
        }

        css.push_str("\n\n      /* Apply animations */");
        for (_, tables) in &self.families {
            if tables.is_empty() {
                continue;
            }
            let rules: Vec<String> = tables
                .iter()
                .map(|table| {
                    format!(
                        "#{}{{animation:{} {}s ease infinite}}",
                        table.target, table.name, self.cycle_secs
                    )
                })
                .collect();
            let _ = write!(css, "\n      {}", rules.join(" "));
        }
        css
    }
}

fn render_table(table: &KeyframeTable) -> String {
    let frames: Vec<String> = table
        .frames
        .iter()
        .map(|frame| format!("{} {{{}}}", frame.selector(), frame.style))
        .collect();
    match table.layout {
        FrameLayout::Stacked => {
            let mut out = format!("      @keyframes {} {{", table.name);
            for frame in frames {
                let _ = write!(out, "\n        {frame}");
            }
            out.push_str("\n      }");
            out
        }
        FrameLayout::Inline => format!(
            "      @keyframes {} {{\n        {}\n      }}",
            table.name,
            frames.join(" ")
        ),
    }
}

/// Invalidation start of one affected node.
///
/// Nodes of a host are ranked by x, rightmost first (ties keep index order);
/// rank `r` starts `r * stagger` after the host's base offset. Returns `None`
/// for nodes that are not affected or not declared, and when the start does
/// not fit in a `u32`.
pub fn node_invalidation_pct(scene: &Scene, stagger: u32, node: &NodeRef) -> Option<u32> {
    let host = scene.host(&node.host)?;
    let base = scene.invalidation_start(&node.host)?;
    let mut ranked: Vec<(usize, f64)> = host
        .affected
        .iter()
        .map(|&idx| host.nodes.get(idx).map(|&(x, _)| (idx, x)))
        .collect::<Option<_>>()?;
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let rank = ranked.iter().position(|&(idx, _)| idx == node.index)?;
    u32::try_from(rank)
        .ok()?
        .checked_mul(stagger)?
        .checked_add(base)
}

fn node_style(colors: &StateColors, width: &str, opacity: &str) -> String {
    format!(
        "fill:{};stroke:{};stroke-width:{width};opacity:{opacity}",
        colors.fill, colors.stroke
    )
}

fn old_node_table(node: &NodeRef, inv: u32, theme: &Theme, anim: &AnimationConfig) -> KeyframeTable {
    let gone = inv + anim.fade_len;
    let drift = anim.drift_px;
    let name = format!("old-{node}");
    KeyframeTable {
        target: name.clone(),
        name,
        frames: vec![
            Keyframe::new(
                &[0, inv],
                format!("{};transform:translateY(0)", node_style(&theme.consistent, "1.5", "1")),
            ),
            Keyframe::new(
                &[inv + 1],
                format!(
                    "{};transform:translateY(2px)",
                    node_style(&theme.invalidated, "1.5", "0.85")
                ),
            ),
            Keyframe::new(
                &[gone],
                format!(
                    "{};transform:translateY({drift}px)",
                    node_style(&theme.invalidated, "1.5", "0")
                ),
            ),
            Keyframe::new(&[100], format!("opacity:0;transform:translateY({drift}px)")),
        ],
        layout: FrameLayout::Stacked,
    }
}

fn new_node_table(node: &NodeRef, phase: &Recompute, theme: &Theme) -> KeyframeTable {
    let hidden = node_style(&theme.computing, "1.5", "0");
    let computing = node_style(&theme.computing, "1.5", "1");
    let green = node_style(&theme.consistent, "1.5", "1");
    let hit = node_style(&theme.cache_hit, "2.5", "1");

    let mut stops = StopTable::default();
    stops.set(0, hidden.clone());
    stops.set(phase.appear - 1, hidden);
    stops.set(phase.appear + 1, computing.clone());
    stops.set(phase.green - 1, computing);
    stops.set(phase.green, green.clone());
    for &at in &phase.cache_hits {
        stops.set(at, hit.clone());
        stops.set(at + 2, hit.clone());
        stops.set(at + 4, green.clone());
    }
    stops.set(100, green);

    let name = format!("new-{node}");
    KeyframeTable {
        target: name.clone(),
        name,
        frames: stops.into_frames(),
        layout: FrameLayout::Stacked,
    }
}

/// Visible until `off`, hidden, visible again from `on`.
fn blink_frames(off: u32, on: u32, opacity: &str) -> Vec<Keyframe> {
    vec![
        Keyframe::new(&[0, off], format!("opacity:{opacity}")),
        Keyframe::new(&[off + 1], "opacity:0"),
        Keyframe::new(&[on - 1], "opacity:0"),
        Keyframe::new(&[on, 100], format!("opacity:{opacity}")),
    ]
}

/// Builds every keyframe family of a validated scene.
///
/// Percentages are used as given, so callers should run [`Scene::validate`]
/// first.
pub fn build_timeline(scene: &Scene, theme: &Theme, anim: &AnimationConfig) -> Timeline {
    let mut old_nodes = Vec::new();
    for node in scene.invalidated_nodes() {
        if let Some(inv) = node_invalidation_pct(scene, anim.stagger, &node) {
            old_nodes.push(old_node_table(&node, inv, theme, anim));
        }
    }

    let mut new_nodes = Vec::new();
    for node in scene.recomputed_nodes() {
        if let Some(phase) = scene.node_recompute(&node) {
            new_nodes.push(new_node_table(&node, phase, theme));
        }
    }

    let mut db_flash = Vec::new();
    if let Some(flash) = &scene.timing.db_flash {
        let db = &theme.database;
        let lit = &theme.database_flash;
        db_flash.push(KeyframeTable {
            name: "db-flash".to_string(),
            target: format!("db-{}", flash.node),
            frames: vec![
                Keyframe::new(
                    &[0, flash.start - 1],
                    format!("fill:{};stroke:{};stroke-width:1.5", db.fill, db.stroke),
                ),
                Keyframe::new(
                    &[flash.start, flash.end],
                    format!("fill:{};stroke:{};stroke-width:2.5", lit.fill, lit.stroke),
                ),
                Keyframe::new(
                    &[flash.end + 2, 100],
                    format!("fill:{};stroke:{};stroke-width:1.5", db.fill, db.stroke),
                ),
            ],
            layout: FrameLayout::Stacked,
        });
    }

    let mut internal_edges = Vec::new();
    for (src, dst) in scene.animated_edges() {
        let inv = node_invalidation_pct(scene, anim.stagger, &src);
        let recompute = scene.node_recompute(&src);
        if let (Some(inv), Some(recompute)) = (inv, recompute) {
            let name = format!("ie-{src}-{dst}");
            internal_edges.push(KeyframeTable {
                target: name.clone(),
                name,
                frames: blink_frames(inv, recompute.appear, "1"),
                layout: FrameLayout::Inline,
            });
        }
    }

    let mut cross_edges = Vec::new();
    for edge in &scene.cross_edges {
        if let CrossLink::Volatile {
            disconnect,
            reconnect,
        } = edge.link
        {
            let name = format!("xe-{}-{}", edge.from, edge.to);
            cross_edges.push(KeyframeTable {
                target: name.clone(),
                name,
                frames: blink_frames(disconnect, reconnect, "0.5"),
                layout: FrameLayout::Inline,
            });
        }
    }

    let mut boxes = Vec::new();
    for phase in &scene.timing.invalidation {
        if let Some(table) = box_table(scene, &phase.host, theme, anim) {
            boxes.push(table);
        }
    }

    let captions = scene
        .timing
        .captions
        .iter()
        .enumerate()
        .map(|(i, caption)| {
            let name = format!("desc-{i}");
            KeyframeTable {
                target: name.clone(),
                name,
                frames: vec![
                    Keyframe::new(&[0, caption.start.saturating_sub(1)], "opacity:0"),
                    Keyframe::new(&[caption.start, caption.end], "opacity:1"),
                    Keyframe::new(&[(caption.end + 1).min(100), 100], "opacity:0"),
                ],
                layout: FrameLayout::Inline,
            }
        })
        .collect();

    Timeline {
        cycle_secs: anim.cycle_secs,
        families: vec![
            (Family::OldNodes, old_nodes),
            (Family::NewNodes, new_nodes),
            (Family::DbFlash, db_flash),
            (Family::InternalEdges, internal_edges),
            (Family::CrossEdges, cross_edges),
            (Family::Boxes, boxes),
            (Family::Captions, captions),
        ],
    }
}

/// Box stroke: bleached from the first node invalidation, blue from the first
/// reappearance, neutral again once the last node is green.
fn box_table(scene: &Scene, host_id: &str, theme: &Theme, anim: &AnimationConfig) -> Option<KeyframeTable> {
    if !scene.is_animated_host(host_id) {
        return None;
    }
    let host = scene.host(host_id)?;
    let nodes: Vec<NodeRef> = host
        .affected
        .iter()
        .map(|&idx| NodeRef::new(host_id, idx))
        .collect();
    let earliest_inv = nodes
        .iter()
        .filter_map(|n| node_invalidation_pct(scene, anim.stagger, n))
        .min()?;
    let phases: Vec<&Recompute> = nodes.iter().filter_map(|n| scene.node_recompute(n)).collect();
    let first_appear = phases.iter().map(|p| p.appear).min()?;
    let latest_green = phases.iter().map(|p| p.green).max()?;
    let neutral = &theme.box_stroke;

    Some(KeyframeTable {
        name: format!("bx-{host_id}"),
        target: format!("bx-{host_id}"),
        frames: vec![
            Keyframe::new(&[0, earliest_inv - 1], format!("stroke:{neutral}")),
            Keyframe::new(
                &[earliest_inv, first_appear - 1],
                format!("stroke:{}", theme.invalidated.stroke),
            ),
            Keyframe::new(
                &[first_appear, latest_green - 1],
                format!("stroke:{}", theme.computing.stroke),
            ),
            Keyframe::new(&[latest_green, 100], format!("stroke:{neutral}")),
        ],
        layout: FrameLayout::Stacked,
    })
}
