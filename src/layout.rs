use crate::config::LayoutConfig;
use crate::scene::{CrossLink, Host, NodeRef, Scene};

/// Distance below which two centers are treated as coincident.
const MIN_EDGE_LEN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub title: String,
    pub x: i32,
    pub center_x: i32,
    pub panel_width: i32,
    /// Dashed separator drawn left of every column but the first.
    pub divider_x: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxLayout {
    pub host: String,
    pub label: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub animated: bool,
}

impl BoxLayout {
    pub fn element_id(&self) -> Option<String> {
        self.animated.then(|| format!("bx-{}", self.host))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Normal,
    Affected,
    Database,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub node: NodeRef,
    pub role: NodeRole,
    pub center: Point,
    /// Set on the single database node that flashes when the change lands.
    pub flashes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Internal edge whose source never changes.
    Static,
    /// Internal edge that disappears with its invalidated source.
    Animated,
    /// Cross-host edge that stays connected.
    Safe,
    /// Cross-host edge that disconnects and later reconnects.
    Volatile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub from: NodeRef,
    pub to: NodeRef,
    pub kind: EdgeKind,
    pub segment: Segment,
}

impl EdgeLayout {
    pub fn element_id(&self) -> Option<String> {
        match self.kind {
            EdgeKind::Animated => Some(format!("ie-{}-{}", self.from, self.to)),
            EdgeKind::Volatile => Some(format!("xe-{}-{}", self.from, self.to)),
            EdgeKind::Static | EdgeKind::Safe => None,
        }
    }
}

/// Dashed line splitting a backend box into compute and storage halves.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionLayout {
    pub host: String,
    pub x: i32,
    pub y1: i32,
    pub y2: i32,
    pub label_x: i32,
    pub label_y: i32,
}

/// Fully resolved geometry, with every list already in drawing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    pub columns: Vec<ColumnLayout>,
    pub boxes: Vec<BoxLayout>,
    pub partitions: Vec<PartitionLayout>,
    pub edges: Vec<EdgeLayout>,
    pub nodes: Vec<NodeLayout>,
    pub invalidated: Vec<NodeRef>,
    pub recomputed: Vec<NodeRef>,
}

impl Layout {
    pub fn node(&self, node: &NodeRef) -> Option<&NodeLayout> {
        self.nodes.iter().find(|layout| &layout.node == node)
    }

    pub fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &EdgeLayout> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    pub fn nodes_of(&self, role: NodeRole) -> impl Iterator<Item = &NodeLayout> {
        self.nodes.iter().filter(move |node| node.role == role)
    }
}

/// Pixel rounding used for every emitted coordinate (round half to even).
pub fn round_px(value: f64) -> i32 {
    value.round_ties_even() as i32
}

pub fn box_x(column_x: i32, config: &LayoutConfig) -> i32 {
    column_x + (config.column_width - config.box_width) / 2
}

/// Absolute center of a node inside the body area below its host's header bar.
pub fn node_position(host: &Host, column_x: i32, index: usize, config: &LayoutConfig) -> Point {
    let (fx, fy) = host.nodes[index];
    let bx = box_x(column_x, config);
    let body_top = host.y + config.header_height;
    let body_h = host.height - config.header_height;
    let inner_w = f64::from(config.box_width - 2 * config.padding);
    let inner_h = f64::from(body_h - 2 * config.padding);
    Point {
        x: round_px(f64::from(bx + config.padding) + fx * inner_w),
        y: round_px(f64::from(body_top + config.padding) + fy * inner_h),
    }
}

/// Line between two centers, pulled in by `radius` at both ends so it meets the circle rims.
pub fn edge_endpoints(a: Point, b: Point, radius: f64) -> Segment {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    let d = (dx * dx + dy * dy).sqrt();
    if d < MIN_EDGE_LEN {
        return Segment {
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
        };
    }
    let (ux, uy) = (radius * dx / d, radius * dy / d);
    Segment {
        x1: round_px(f64::from(a.x) + ux),
        y1: round_px(f64::from(a.y) + uy),
        x2: round_px(f64::from(b.x) - ux),
        y2: round_px(f64::from(b.y) - uy),
    }
}

/// Resolves every shape of a validated scene.
///
/// References that do not resolve are skipped, so callers should run
/// [`Scene::validate`] first.
pub fn compute_layout(scene: &Scene, config: &LayoutConfig) -> Layout {
    let columns = scene
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| ColumnLayout {
            title: column.title.clone(),
            x: column.x,
            center_x: column.x + config.column_width / 2,
            panel_width: config.column_width - config.panel_gutter,
            divider_x: (idx > 0).then_some(column.x - config.panel_gutter),
        })
        .collect();

    let resolve = |node: &NodeRef| -> Option<Point> {
        let host = scene.host(&node.host)?;
        let column = scene.columns.get(host.column)?;
        (node.index < host.nodes.len())
            .then(|| node_position(host, column.x, node.index, config))
    };

    let mut boxes = Vec::new();
    let mut partitions = Vec::new();
    let mut nodes = Vec::new();
    let flash = scene.timing.db_flash.as_ref().map(|flash| &flash.node);

    for host in &scene.hosts {
        let Some(column) = scene.columns.get(host.column) else {
            continue;
        };
        let x = box_x(column.x, config);
        boxes.push(BoxLayout {
            host: host.id.clone(),
            label: host.label.clone(),
            x,
            y: host.y,
            width: config.box_width,
            height: host.height,
            animated: scene.is_animated_host(&host.id),
        });

        if !host.db.is_empty() {
            let width = f64::from(config.box_width);
            let part_x = round_px(f64::from(x) + config.db_partition * width);
            partitions.push(PartitionLayout {
                host: host.id.clone(),
                x: part_x,
                y1: host.y + config.header_height + 4,
                y2: host.y + host.height - 8,
                label_x: round_px(f64::from(part_x) + (width - config.db_partition * width) / 2.0),
                label_y: host.y + host.height - 6,
            });
        }

        for index in 0..host.nodes.len() {
            let node = NodeRef::new(&host.id, index);
            let role = if host.is_affected(index) {
                NodeRole::Affected
            } else if host.is_db(index) {
                NodeRole::Database
            } else {
                NodeRole::Normal
            };
            nodes.push(NodeLayout {
                flashes: role == NodeRole::Database && flash == Some(&node),
                center: node_position(host, column.x, index, config),
                node,
                role,
            });
        }
    }

    let radius = f64::from(config.node_radius);
    let mut edges = Vec::new();
    let mut push_edge = |from: NodeRef, to: NodeRef, kind: EdgeKind| {
        if let (Some(a), Some(b)) = (resolve(&from), resolve(&to)) {
            edges.push(EdgeLayout {
                segment: edge_endpoints(a, b, radius),
                from,
                to,
                kind,
            });
        }
    };

    for host in &scene.hosts {
        for &(src, dst) in &host.edges {
            if !host.is_affected(src) {
                push_edge(
                    NodeRef::new(&host.id, src),
                    NodeRef::new(&host.id, dst),
                    EdgeKind::Static,
                );
            }
        }
    }
    for (from, to) in scene.animated_edges() {
        push_edge(from, to, EdgeKind::Animated);
    }
    for edge in &scene.cross_edges {
        if edge.link == CrossLink::Safe {
            push_edge(edge.from.clone(), edge.to.clone(), EdgeKind::Safe);
        }
    }
    for edge in &scene.cross_edges {
        if matches!(edge.link, CrossLink::Volatile { .. }) {
            push_edge(edge.from.clone(), edge.to.clone(), EdgeKind::Volatile);
        }
    }

    Layout {
        width: config.width,
        height: config.height,
        columns,
        boxes,
        partitions,
        edges,
        nodes,
        invalidated: scene.invalidated_nodes(),
        recomputed: scene.recomputed_nodes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_layout() -> Layout {
        compute_layout(&Scene::distributed_scaling(), &LayoutConfig::default())
    }

    #[test]
    fn boxes_are_centered_in_their_columns() {
        let layout = default_layout();
        let xs: Vec<i32> = ["C1", "A1", "B1"]
            .iter()
            .map(|id| layout.boxes.iter().find(|b| b.host == *id).unwrap().x)
            .collect();
        assert_eq!(xs, vec![50, 335, 620]);
        let dividers: Vec<Option<i32>> = layout.columns.iter().map(|c| c.divider_x).collect();
        assert_eq!(dividers, vec![None, Some(290), Some(575)]);
    }

    #[test]
    fn node_positions_live_below_the_header() {
        let layout = default_layout();
        // C1 box: (50, 42, 200, 70), body starts at y = 60.
        let c1_0 = layout.node(&NodeRef::new("C1", 0)).unwrap();
        assert_eq!(c1_0.center, Point { x: 92, y: 81 });
        let c1_2 = layout.node(&NodeRef::new("C1", 2)).unwrap();
        assert_eq!(c1_2.center, Point { x: 213, y: 82 });
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_px(2.5), 2);
        assert_eq!(round_px(3.5), 4);
        assert_eq!(round_px(-0.4), 0);
    }

    #[test]
    fn edge_endpoints_are_trimmed_by_radius() {
        let seg = edge_endpoints(Point { x: 0, y: 0 }, Point { x: 30, y: 40 }, 5.0);
        assert_eq!(
            seg,
            Segment {
                x1: 3,
                y1: 4,
                x2: 27,
                y2: 36,
            }
        );
    }

    #[test]
    fn coincident_endpoints_are_left_alone() {
        let p = Point { x: 12, y: 9 };
        assert_eq!(
            edge_endpoints(p, p, 5.0),
            Segment {
                x1: 12,
                y1: 9,
                x2: 12,
                y2: 9,
            }
        );
    }

    #[test]
    fn edges_are_classified_by_source_and_link() {
        let layout = default_layout();
        assert_eq!(layout.edges_of(EdgeKind::Safe).count(), 5);
        assert_eq!(layout.edges_of(EdgeKind::Volatile).count(), 5);
        // C1: 2, C2: 3, C4: 2, A1: 3, A2: 3, B2: 3
        assert_eq!(layout.edges_of(EdgeKind::Animated).count(), 16);
        let internal: usize = Scene::distributed_scaling()
            .hosts
            .iter()
            .map(|h| h.edges.len())
            .sum();
        assert_eq!(
            layout.edges_of(EdgeKind::Static).count() + layout.edges_of(EdgeKind::Animated).count(),
            internal
        );
        let first_animated = layout.edges_of(EdgeKind::Animated).next().unwrap();
        assert_eq!(first_animated.element_id().as_deref(), Some("ie-B2-0-B2-2"));
    }

    #[test]
    fn only_the_flash_node_is_marked() {
        let layout = default_layout();
        let flashing: Vec<String> = layout
            .nodes
            .iter()
            .filter(|n| n.flashes)
            .map(|n| n.node.to_string())
            .collect();
        assert_eq!(flashing, vec!["B2-3".to_string()]);
        assert_eq!(layout.nodes_of(NodeRole::Database).count(), 5);
        assert_eq!(layout.partitions.len(), 3);
    }
}
