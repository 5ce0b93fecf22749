use crate::layout::{EdgeKind, Layout, NodeRole};
use crate::scene::Scene;
use crate::timeline::node_invalidation_pct;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: i32,
    pub height: i32,
    pub boxes: Vec<BoxDump>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct BoxDump {
    pub host: String,
    pub label: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub animated: bool,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub role: String,
    pub x: i32,
    pub y: i32,
    pub invalidate_at: Option<u32>,
    pub appear_at: Option<u32>,
    pub green_at: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub kind: String,
    pub element_id: Option<String>,
    pub points: [[i32; 2]; 2],
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, scene: &Scene, stagger: u32) -> Self {
        let boxes = layout
            .boxes
            .iter()
            .map(|b| BoxDump {
                host: b.host.clone(),
                label: b.label.clone(),
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
                animated: b.animated,
            })
            .collect();

        let nodes = layout
            .nodes
            .iter()
            .map(|node| {
                let affected = node.role == NodeRole::Affected;
                let recompute = affected
                    .then(|| scene.node_recompute(&node.node))
                    .flatten();
                NodeDump {
                    id: node.node.to_string(),
                    role: format!("{:?}", node.role),
                    x: node.center.x,
                    y: node.center.y,
                    invalidate_at: affected
                        .then(|| node_invalidation_pct(scene, stagger, &node.node))
                        .flatten(),
                    appear_at: recompute.map(|r| r.appear),
                    green_at: recompute.map(|r| r.green),
                }
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.to_string(),
                to: edge.to.to_string(),
                kind: match edge.kind {
                    EdgeKind::Static => "static",
                    EdgeKind::Animated => "animated",
                    EdgeKind::Safe => "safe",
                    EdgeKind::Volatile => "volatile",
                }
                .to_string(),
                element_id: edge.element_id(),
                points: [
                    [edge.segment.x1, edge.segment.y1],
                    [edge.segment.x2, edge.segment.y2],
                ],
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            boxes,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout, scene: &Scene, stagger: u32) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, scene, stagger);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
