use crate::config::AnimationConfig;
use crate::error::SceneError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// A titled vertical panel; hosts are centered horizontally inside their column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub title: String,
    pub x: i32,
}

/// One window-style box in the diagram holding a small DAG of computed values.
///
/// Node coordinates are fractions of the padded body area below the header bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: String,
    pub label: String,
    pub column: usize,
    pub y: i32,
    pub height: i32,
    pub nodes: Vec<(f64, f64)>,
    #[serde(default)]
    pub edges: Vec<(usize, usize)>,
    #[serde(default)]
    pub affected: BTreeSet<usize>,
    #[serde(default)]
    pub db: BTreeSet<usize>,
}

impl Host {
    pub fn is_affected(&self, index: usize) -> bool {
        self.affected.contains(&index)
    }

    pub fn is_db(&self, index: usize) -> bool {
        self.db.contains(&index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub host: String,
    pub index: usize,
}

impl NodeRef {
    pub fn new(host: &str, index: usize) -> Self {
        Self {
            host: host.to_string(),
            index,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.host, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CrossLink {
    /// Never disrupted by the invalidation.
    #[default]
    Safe,
    /// Disconnects at `disconnect`% and comes back at `reconnect`%.
    Volatile { disconnect: u32, reconnect: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossEdge {
    pub from: NodeRef,
    pub to: NodeRef,
    #[serde(default)]
    pub link: CrossLink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInvalidation {
    pub host: String,
    pub start: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recompute {
    pub appear: u32,
    pub green: u32,
    #[serde(default)]
    pub cache_hits: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecompute {
    pub host: String,
    #[serde(flatten)]
    pub phase: Recompute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecompute {
    pub node: NodeRef,
    #[serde(flatten)]
    pub phase: Recompute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbFlash {
    pub node: NodeRef,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub start: u32,
    pub end: u32,
    pub text: String,
}

/// Percentage-based phase tables for one animation cycle.
///
/// Table order is significant: it drives the order of the emitted keyframes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timing {
    pub invalidation: Vec<HostInvalidation>,
    pub recompute: Vec<HostRecompute>,
    pub node_overrides: Vec<NodeRecompute>,
    pub db_flash: Option<DbFlash>,
    pub captions: Vec<Caption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub columns: Vec<Column>,
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub cross_edges: Vec<CrossEdge>,
    #[serde(default)]
    pub timing: Timing,
}

impl Default for Scene {
    fn default() -> Self {
        Self::distributed_scaling()
    }
}

impl Scene {
    pub fn host(&self, id: &str) -> Option<&Host> {
        self.hosts.iter().find(|host| host.id == id)
    }

    pub fn is_affected(&self, node: &NodeRef) -> bool {
        self.host(&node.host)
            .is_some_and(|host| host.is_affected(node.index))
    }

    pub fn invalidation_start(&self, host: &str) -> Option<u32> {
        self.timing
            .invalidation
            .iter()
            .find(|phase| phase.host == host)
            .map(|phase| phase.start)
    }

    pub fn host_recompute(&self, host: &str) -> Option<&Recompute> {
        self.timing
            .recompute
            .iter()
            .find(|phase| phase.host == host)
            .map(|phase| &phase.phase)
    }

    /// Recomputation phase of one node: a per-node override if present, else its host's.
    pub fn node_recompute(&self, node: &NodeRef) -> Option<&Recompute> {
        self.timing
            .node_overrides
            .iter()
            .find(|o| &o.node == node)
            .map(|o| &o.phase)
            .or_else(|| self.host_recompute(&node.host))
    }

    /// A host animates its box, edges and nodes only when it has both phases.
    pub fn is_animated_host(&self, host: &str) -> bool {
        self.invalidation_start(host).is_some() && self.host_recompute(host).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.hosts.iter().map(|host| host.nodes.len()).sum()
    }

    /// Affected nodes of the hosts named by the invalidation table, in table order.
    pub fn invalidated_nodes(&self) -> Vec<NodeRef> {
        self.affected_in(self.timing.invalidation.iter().map(|p| p.host.as_str()))
    }

    /// Affected nodes of the hosts named by the recomputation table, in table order.
    pub fn recomputed_nodes(&self) -> Vec<NodeRef> {
        self.affected_in(self.timing.recompute.iter().map(|p| p.host.as_str()))
    }

    fn affected_in<'a>(&self, hosts: impl Iterator<Item = &'a str>) -> Vec<NodeRef> {
        hosts
            .filter_map(|id| self.host(id))
            .flat_map(|host| host.affected.iter().map(move |&idx| NodeRef::new(&host.id, idx)))
            .collect()
    }

    /// Internal edges whose source node is affected, for hosts that animate.
    pub fn animated_edges(&self) -> Vec<(NodeRef, NodeRef)> {
        let mut edges = Vec::new();
        for phase in &self.timing.invalidation {
            if !self.is_animated_host(&phase.host) {
                continue;
            }
            let Some(host) = self.host(&phase.host) else {
                continue;
            };
            for &(src, dst) in &host.edges {
                if host.is_affected(src) {
                    edges.push((NodeRef::new(&host.id, src), NodeRef::new(&host.id, dst)));
                }
            }
        }
        edges
    }

    pub fn validate(&self, animation: &AnimationConfig) -> Result<(), SceneError> {
        let mut seen = HashSet::new();
        for host in &self.hosts {
            if !seen.insert(host.id.as_str()) {
                return Err(SceneError::DuplicateHost(host.id.clone()));
            }
            if host.column >= self.columns.len() {
                return Err(SceneError::UnknownColumn {
                    host: host.id.clone(),
                    column: host.column,
                    count: self.columns.len(),
                });
            }
            let indices = host
                .edges
                .iter()
                .flat_map(|&(src, dst)| [src, dst])
                .chain(host.affected.iter().copied())
                .chain(host.db.iter().copied());
            for index in indices {
                self.check_node(&NodeRef::new(&host.id, index))?;
            }
            let mut internal = HashSet::new();
            for &(src, dst) in &host.edges {
                if !internal.insert((src, dst)) {
                    return Err(SceneError::DuplicateEdge(format!(
                        "{} -> {}",
                        NodeRef::new(&host.id, src),
                        NodeRef::new(&host.id, dst)
                    )));
                }
            }
            if let Some(&both) = host.affected.intersection(&host.db).next() {
                return Err(SceneError::ConflictingRoles(
                    NodeRef::new(&host.id, both).to_string(),
                ));
            }
            let affected = !host.affected.is_empty();
            let invalidated = self.invalidation_start(&host.id).is_some();
            let recomputed = self.host_recompute(&host.id).is_some();
            if affected && !invalidated {
                return Err(SceneError::MissingInvalidation(host.id.clone()));
            }
            if affected && !recomputed {
                return Err(SceneError::MissingRecompute(host.id.clone()));
            }
            if !affected && (invalidated || recomputed) {
                return Err(SceneError::NoAffectedNodes(host.id.clone()));
            }
        }

        let mut links = HashSet::new();
        for edge in &self.cross_edges {
            self.check_node(&edge.from)?;
            self.check_node(&edge.to)?;
            if !links.insert((&edge.from, &edge.to)) {
                return Err(SceneError::DuplicateEdge(format!("{} -> {}", edge.from, edge.to)));
            }
            if let CrossLink::Volatile {
                disconnect,
                reconnect,
            } = edge.link
            {
                let what = format!("cross edge {} -> {}", edge.from, edge.to);
                check_window(&what, disconnect, reconnect, 1, 0)?;
            }
        }

        let mut invalidated = HashSet::new();
        for phase in &self.timing.invalidation {
            let host = self
                .host(&phase.host)
                .ok_or_else(|| SceneError::UnknownHost(phase.host.clone()))?;
            let what = format!("invalidation of {}", phase.host);
            if !invalidated.insert(phase.host.as_str()) {
                return Err(SceneError::DuplicatePhase(what));
            }
            check_percent(&what, phase.start)?;
            if phase.start == 0 {
                return Err(SceneError::out_of_range(what, phase.start));
            }
            let what = format!("fade-out of {}", phase.host);
            let stagger = u32::try_from(host.affected.len().saturating_sub(1))
                .ok()
                .and_then(|rank| rank.checked_mul(animation.stagger))
                .ok_or_else(|| SceneError::out_of_range(&what, u32::MAX))?;
            check_sum(&what, &[phase.start, stagger, animation.fade_len])?;
        }

        let mut recomputed = HashSet::new();
        for phase in &self.timing.recompute {
            if self.host(&phase.host).is_none() {
                return Err(SceneError::UnknownHost(phase.host.clone()));
            }
            if !recomputed.insert(phase.host.as_str()) {
                return Err(SceneError::DuplicatePhase(format!(
                    "recomputation of {}",
                    phase.host
                )));
            }
            check_recompute(&format!("recomputation of {}", phase.host), &phase.phase)?;
        }

        let mut overridden = HashSet::new();
        for o in &self.timing.node_overrides {
            self.check_node(&o.node)?;
            if !overridden.insert(&o.node) {
                return Err(SceneError::DuplicatePhase(format!("recomputation of {}", o.node)));
            }
            if !self.is_affected(&o.node) {
                return Err(SceneError::OverrideNotAffected(o.node.to_string()));
            }
            check_recompute(&format!("recomputation of {}", o.node), &o.phase)?;
        }

        if let Some(flash) = &self.timing.db_flash {
            self.check_node(&flash.node)?;
            let what = format!("database flash of {}", flash.node);
            check_window(&what, flash.start, flash.end, 1, 2)?;
        }

        for (i, caption) in self.timing.captions.iter().enumerate() {
            let what = format!("caption {i}");
            check_percent(&what, caption.start)?;
            check_percent(&what, caption.end)?;
            if caption.start > caption.end {
                return Err(SceneError::inverted(what, caption.start, caption.end));
            }
        }

        Ok(())
    }

    fn check_node(&self, node: &NodeRef) -> Result<(), SceneError> {
        let host = self
            .host(&node.host)
            .ok_or_else(|| SceneError::UnknownHost(node.host.clone()))?;
        if node.index >= host.nodes.len() {
            return Err(SceneError::UnknownNode {
                host: node.host.clone(),
                index: node.index,
                count: host.nodes.len(),
            });
        }
        Ok(())
    }

    /// The scene drawn in the documentation: five clients, two API servers and
    /// three backends, with a database change in Backend 2 invalidating its way
    /// out to Clients 1, 2 and 4.
    pub fn distributed_scaling() -> Self {
        let columns = vec![
            Column {
                title: "Clients".to_string(),
                x: 10,
            },
            Column {
                title: "API Servers".to_string(),
                x: 295,
            },
            Column {
                title: "Backend Servers".to_string(),
                x: 580,
            },
        ];

        let hosts = vec![
            host("C1", "Client 1", 0, 42, 70)
                .nodes(&[(0.18, 0.35), (0.52, 0.68), (0.85, 0.38)])
                .edges(&[(0, 1), (1, 2)])
                .affected(&[0, 1, 2]),
            host("C2", "Client 2", 0, 120, 82)
                .nodes(&[(0.15, 0.50), (0.50, 0.18), (0.50, 0.82), (0.85, 0.50)])
                .edges(&[(0, 1), (0, 2), (1, 3), (2, 3)])
                .affected(&[0, 1]),
            host("C3", "Client 3", 0, 210, 96)
                .nodes(&[
                    (0.10, 0.50),
                    (0.38, 0.20),
                    (0.38, 0.80),
                    (0.68, 0.50),
                    (0.92, 0.30),
                ])
                .edges(&[(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)]),
            host("C4", "Client 4", 0, 330, 70)
                .nodes(&[(0.18, 0.50), (0.82, 0.22), (0.82, 0.78)])
                .edges(&[(0, 1), (0, 2)])
                .affected(&[0, 1]),
            host("C5", "Client 5", 0, 408, 82)
                .nodes(&[(0.15, 0.32), (0.52, 0.25), (0.52, 0.78), (0.85, 0.58)])
                .edges(&[(0, 1), (0, 2), (1, 3)]),
            host("A1", "API Server 1", 1, 42, 248)
                .nodes(&[(0.12, 0.20), (0.48, 0.16), (0.85, 0.18), (0.85, 0.62)])
                .edges(&[(0, 1), (1, 2), (0, 3)])
                .affected(&[0, 1, 2]),
            host("A2", "API Server 2", 1, 318, 172)
                .nodes(&[
                    (0.12, 0.22),
                    (0.42, 0.16),
                    (0.42, 0.75),
                    (0.80, 0.18),
                    (0.80, 0.80),
                ])
                .edges(&[(0, 1), (0, 2), (1, 3), (2, 4)])
                .affected(&[0, 1, 3]),
            host("B1", "Backend 1", 2, 42, 96)
                .nodes(&[(0.18, 0.28), (0.18, 0.72), (0.78, 0.28), (0.78, 0.72)])
                .edges(&[(0, 2), (1, 3)])
                .db(&[2, 3]),
            host("B2", "Backend 2", 2, 174, 108)
                .nodes(&[(0.14, 0.22), (0.14, 0.78), (0.42, 0.50), (0.82, 0.50)])
                .edges(&[(0, 2), (1, 2), (2, 3)])
                .affected(&[0, 1, 2])
                .db(&[3]),
            host("B3", "Backend 3", 2, 318, 96)
                .nodes(&[(0.20, 0.28), (0.20, 0.72), (0.78, 0.28), (0.78, 0.72)])
                .edges(&[(0, 2), (1, 3)])
                .db(&[2, 3]),
        ];

        let cross_edges = vec![
            safe(("C3", 4), ("A1", 3)),
            safe(("C4", 2), ("A2", 2)),
            safe(("C5", 3), ("A2", 2)),
            safe(("A1", 3), ("B1", 0)),
            safe(("A2", 4), ("B3", 0)),
            volatile(("C1", 2), ("A1", 0), 14, 30),
            volatile(("C2", 1), ("A1", 0), 15, 50),
            volatile(("C4", 1), ("A2", 0), 18, 62),
            volatile(("A1", 2), ("B2", 0), 11, 32),
            volatile(("A2", 3), ("B2", 1), 11, 64),
        ];

        let invalidation = [
            ("B2", 8),
            ("A1", 11),
            ("A2", 11),
            ("C1", 14),
            ("C2", 15),
            ("C4", 18),
        ]
        .into_iter()
        .map(|(host, start)| HostInvalidation {
            host: host.to_string(),
            start,
        })
        .collect();

        let recompute = [
            ("C1", 30, 44, vec![]),
            ("A1", 32, 40, vec![52]),
            ("B2", 34, 38, vec![66]),
            ("C2", 50, 56, vec![]),
            ("C4", 62, 72, vec![]),
            ("A2", 64, 70, vec![]),
        ]
        .into_iter()
        .map(|(host, appear, green, cache_hits)| HostRecompute {
            host: host.to_string(),
            phase: Recompute {
                appear,
                green,
                cache_hits,
            },
        })
        .collect();

        // B2-1 is only recomputed once API Server 2 asks for it.
        let node_overrides = vec![NodeRecompute {
            node: NodeRef::new("B2", 1),
            phase: Recompute {
                appear: 66,
                green: 70,
                cache_hits: Vec::new(),
            },
        }];

        let captions = [
            (0, 6, "All computed values are consistent"),
            (7, 10, "A database change in Backend 2 triggers invalidation"),
            (
                11,
                22,
                "Invalidation cascades through both API servers to Clients 1, 2, and 4",
            ),
            (
                30,
                44,
                "Client 1 recomputes \u{2014} full chain through API Server 1 to Backend 2",
            ),
            (
                50,
                56,
                "Client 2 recomputes \u{2014} API Server 1 is already computed (cache hit)",
            ),
            (
                62,
                72,
                "Client 4 recomputes via API Server 2 \u{2014} Backend 2 is already consistent (cache hit)",
            ),
            (78, 100, "All computed values are consistent again"),
        ]
        .into_iter()
        .map(|(start, end, text)| Caption {
            start,
            end,
            text: text.to_string(),
        })
        .collect();

        Self {
            columns,
            hosts,
            cross_edges,
            timing: Timing {
                invalidation,
                recompute,
                node_overrides,
                db_flash: Some(DbFlash {
                    node: NodeRef::new("B2", 3),
                    start: 8,
                    end: 10,
                }),
                captions,
            },
        }
    }
}

fn check_percent(what: &str, value: u32) -> Result<(), SceneError> {
    if value > 100 {
        return Err(SceneError::out_of_range(what, value));
    }
    Ok(())
}

/// Like [`check_percent`] on the sum of `terms`; an overflowing sum is out of range.
fn check_sum(what: &str, terms: &[u32]) -> Result<(), SceneError> {
    let total = terms
        .iter()
        .try_fold(0u32, |acc, &term| acc.checked_add(term))
        .ok_or_else(|| SceneError::out_of_range(what, u32::MAX))?;
    check_percent(what, total)
}

/// `start` must leave `lead` percent before it and `end + tail` must stay in range.
fn check_window(what: &str, start: u32, end: u32, lead: u32, tail: u32) -> Result<(), SceneError> {
    if start < lead {
        return Err(SceneError::out_of_range(what, start));
    }
    check_sum(what, &[start, 1])?;
    check_sum(what, &[end, tail])?;
    if start >= end {
        return Err(SceneError::inverted(what, start, end));
    }
    Ok(())
}

fn check_recompute(what: &str, phase: &Recompute) -> Result<(), SceneError> {
    check_window(what, phase.appear, phase.green, 1, 0)?;
    for &hit in &phase.cache_hits {
        check_sum(&format!("{what} cache hit"), &[hit, 4])?;
    }
    Ok(())
}

fn host(id: &str, label: &str, column: usize, y: i32, height: i32) -> Host {
    Host {
        id: id.to_string(),
        label: label.to_string(),
        column,
        y,
        height,
        nodes: Vec::new(),
        edges: Vec::new(),
        affected: BTreeSet::new(),
        db: BTreeSet::new(),
    }
}

impl Host {
    fn nodes(mut self, nodes: &[(f64, f64)]) -> Self {
        self.nodes = nodes.to_vec();
        self
    }

    fn edges(mut self, edges: &[(usize, usize)]) -> Self {
        self.edges = edges.to_vec();
        self
    }

    fn affected(mut self, indices: &[usize]) -> Self {
        self.affected = indices.iter().copied().collect();
        self
    }

    fn db(mut self, indices: &[usize]) -> Self {
        self.db = indices.iter().copied().collect();
        self
    }
}

fn safe(from: (&str, usize), to: (&str, usize)) -> CrossEdge {
    CrossEdge {
        from: NodeRef::new(from.0, from.1),
        to: NodeRef::new(to.0, to.1),
        link: CrossLink::Safe,
    }
}

fn volatile(from: (&str, usize), to: (&str, usize), disconnect: u32, reconnect: u32) -> CrossEdge {
    CrossEdge {
        from: NodeRef::new(from.0, from.1),
        to: NodeRef::new(to.0, to.1),
        link: CrossLink::Volatile {
            disconnect,
            reconnect,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animation() -> AnimationConfig {
        AnimationConfig::default()
    }

    #[test]
    fn default_scene_is_valid() {
        let scene = Scene::distributed_scaling();
        assert_eq!(scene.validate(&animation()), Ok(()));
        assert_eq!(scene.hosts.len(), 10);
        assert_eq!(scene.node_count(), 40);
    }

    #[test]
    fn every_edge_references_existing_nodes() {
        let scene = Scene::distributed_scaling();
        for host in &scene.hosts {
            for &(src, dst) in &host.edges {
                assert!(src < host.nodes.len(), "{}-{src}", host.id);
                assert!(dst < host.nodes.len(), "{}-{dst}", host.id);
            }
        }
        for edge in &scene.cross_edges {
            for node in [&edge.from, &edge.to] {
                let host = scene.host(&node.host).unwrap();
                assert!(node.index < host.nodes.len(), "{node}");
            }
        }
    }

    #[test]
    fn node_override_wins_over_host_phase() {
        let scene = Scene::distributed_scaling();
        let b2_0 = scene.node_recompute(&NodeRef::new("B2", 0)).unwrap();
        let b2_1 = scene.node_recompute(&NodeRef::new("B2", 1)).unwrap();
        assert_eq!((b2_0.appear, b2_0.green, b2_0.cache_hits.as_slice()), (34, 38, &[66][..]));
        assert_eq!((b2_1.appear, b2_1.green), (66, 70));
        assert!(b2_1.cache_hits.is_empty());
    }

    #[test]
    fn rejects_edge_to_missing_node() {
        let mut scene = Scene::distributed_scaling();
        scene.hosts[0].edges.push((0, 9));
        assert_eq!(
            scene.validate(&animation()),
            Err(SceneError::UnknownNode {
                host: "C1".to_string(),
                index: 9,
                count: 3,
            })
        );
    }

    #[test]
    fn rejects_cross_edge_to_unknown_host() {
        let mut scene = Scene::distributed_scaling();
        scene.cross_edges.push(safe(("C1", 0), ("Z9", 0)));
        assert_eq!(
            scene.validate(&animation()),
            Err(SceneError::UnknownHost("Z9".to_string()))
        );
    }

    #[test]
    fn rejects_percent_past_cycle_end() {
        let mut scene = Scene::distributed_scaling();
        scene.timing.captions[0].end = 120;
        assert!(matches!(
            scene.validate(&animation()),
            Err(SceneError::PercentOutOfRange { value: 120, .. })
        ));

        let mut scene = Scene::distributed_scaling();
        scene.timing.recompute[1].phase.cache_hits = vec![98];
        assert!(matches!(
            scene.validate(&animation()),
            Err(SceneError::PercentOutOfRange { value: 102, .. })
        ));
    }

    #[test]
    fn rejects_affected_host_without_phases() {
        let mut scene = Scene::distributed_scaling();
        scene.hosts[2].affected.insert(0);
        assert_eq!(
            scene.validate(&animation()),
            Err(SceneError::MissingInvalidation("C3".to_string()))
        );
    }

    #[test]
    fn rejects_inverted_recompute() {
        let mut scene = Scene::distributed_scaling();
        scene.timing.recompute[0].phase.green = 20;
        assert!(matches!(
            scene.validate(&animation()),
            Err(SceneError::InvertedWindow { start: 30, end: 20, .. })
        ));
    }

    #[test]
    fn overflowing_percentages_are_out_of_range() {
        let scene = Scene::distributed_scaling();
        let anim = AnimationConfig {
            stagger: u32::MAX,
            ..animation()
        };
        assert!(matches!(
            scene.validate(&anim),
            Err(SceneError::PercentOutOfRange { value: u32::MAX, .. })
        ));

        let mut scene = Scene::distributed_scaling();
        scene.timing.recompute[0].phase.cache_hits = vec![u32::MAX];
        assert!(matches!(
            scene.validate(&animation()),
            Err(SceneError::PercentOutOfRange { value: u32::MAX, .. })
        ));

        let mut scene = Scene::distributed_scaling();
        scene.timing.captions[0].start = u32::MAX;
        assert!(matches!(
            scene.validate(&animation()),
            Err(SceneError::PercentOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_repeated_phases() {
        let mut scene = Scene::distributed_scaling();
        scene.timing.invalidation.push(HostInvalidation {
            host: "C1".to_string(),
            start: 20,
        });
        assert_eq!(
            scene.validate(&animation()),
            Err(SceneError::DuplicatePhase("invalidation of C1".to_string()))
        );

        let mut scene = Scene::distributed_scaling();
        let again = scene.timing.recompute[0].clone();
        scene.timing.recompute.push(again);
        assert!(matches!(
            scene.validate(&animation()),
            Err(SceneError::DuplicatePhase(_))
        ));
    }

    #[test]
    fn rejects_repeated_edges() {
        let mut scene = Scene::distributed_scaling();
        let again = scene.cross_edges[0].clone();
        let expected = format!("{} -> {}", again.from, again.to);
        scene.cross_edges.push(again);
        assert_eq!(
            scene.validate(&animation()),
            Err(SceneError::DuplicateEdge(expected))
        );

        let mut scene = Scene::distributed_scaling();
        let (src, dst) = scene.hosts[0].edges[0];
        scene.hosts[0].edges.push((src, dst));
        assert_eq!(
            scene.validate(&animation()),
            Err(SceneError::DuplicateEdge(format!("C1-{src} -> C1-{dst}")))
        );
    }

    #[test]
    fn scene_round_trips_through_json() {
        let scene = Scene::distributed_scaling();
        let text = serde_json::to_string(&scene).unwrap();
        let back: Scene = serde_json::from_str(&text).unwrap();
        assert_eq!(back, scene);
    }
}
