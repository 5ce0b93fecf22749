//! Post-generation self-check: re-parse the emitted document and compare its
//! structure with what the scene says should be there.

use crate::error::VerifyError;
use crate::scene::{CrossLink, Scene};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

static KEYFRAMES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@keyframes\s+([\w-]+)").unwrap());
static BINDING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\w-]+)\{animation:([\w-]+)\s").unwrap());

/// Counts derived from the scene alone, independent of the emitted markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectations {
    pub declared_nodes: usize,
    pub node_circles: usize,
    pub old_groups: usize,
    pub new_groups: usize,
    pub keyframes: usize,
}

impl Expectations {
    pub fn from_scene(scene: &Scene) -> Self {
        let declared_nodes = scene.node_count();
        let affected: usize = scene.hosts.iter().map(|h| h.affected.len()).sum();
        let old_groups = scene.invalidated_nodes().len();
        let new_groups = scene.recomputed_nodes().len();
        let volatile = scene
            .cross_edges
            .iter()
            .filter(|e| matches!(e.link, CrossLink::Volatile { .. }))
            .count();
        let boxes = scene
            .hosts
            .iter()
            .filter(|h| scene.is_animated_host(&h.id))
            .count();
        let keyframes = old_groups
            + new_groups
            + scene.animated_edges().len()
            + volatile
            + boxes
            + scene.timing.captions.len()
            + usize::from(scene.timing.db_flash.is_some());
        Self {
            declared_nodes,
            // Affected nodes are drawn only as their old and new renditions.
            node_circles: declared_nodes - affected + old_groups + new_groups,
            old_groups,
            new_groups,
            keyframes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub bytes: usize,
    pub lines: usize,
    pub circles: usize,
    pub node_circles: usize,
    pub distinct_nodes: usize,
    pub ids: usize,
    pub duplicate_ids: BTreeMap<String, usize>,
    pub keyframes: Vec<String>,
    /// Keyframe names not bound to any element present in the document.
    pub unbound_keyframes: Vec<String>,
    pub old_groups: usize,
    pub new_groups: usize,
    pub expected: Expectations,
}

impl VerifyReport {
    pub fn mismatches(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.duplicate_ids.is_empty() {
            let dupes: Vec<String> = self
                .duplicate_ids
                .iter()
                .map(|(id, n)| format!("{id} x{n}"))
                .collect();
            out.push(format!("duplicate ids: {}", dupes.join(", ")));
        }
        let checks = [
            ("distinct nodes", self.distinct_nodes, self.expected.declared_nodes),
            ("node circles", self.node_circles, self.expected.node_circles),
            ("keyframes", self.keyframes.len(), self.expected.keyframes),
            ("old node groups", self.old_groups, self.expected.old_groups),
            ("new node groups", self.new_groups, self.expected.new_groups),
        ];
        for (what, found, expected) in checks {
            if found != expected {
                out.push(format!("{what}: found {found}, expected {expected}"));
            }
        }
        if !self.unbound_keyframes.is_empty() {
            out.push(format!(
                "keyframes without a target element: {}",
                self.unbound_keyframes.join(", ")
            ));
        }
        out
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches().is_empty()
    }

    /// Turns any mismatch into an error; used by `--strict`.
    pub fn into_result(self) -> Result<Self, VerifyError> {
        let mismatches = self.mismatches();
        if mismatches.is_empty() {
            Ok(self)
        } else {
            Err(VerifyError::Mismatch(mismatches))
        }
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size: {} bytes, {} lines", self.bytes, self.lines)?;
        writeln!(f, "Circles: {}", self.circles)?;
        if self.duplicate_ids.is_empty() {
            writeln!(f, "All {} IDs unique", self.ids)?;
        } else {
            writeln!(f, "DUPLICATE IDs: {:?}", self.duplicate_ids)?;
        }
        writeln!(f, "Keyframes: {}", self.keyframes.len())?;
        writeln!(f, "Old node groups: {}", self.old_groups)?;
        write!(f, "New node groups: {}", self.new_groups)
    }
}

pub fn verify_svg(svg: &str, expected: Expectations) -> Result<VerifyReport, VerifyError> {
    let doc = roxmltree::Document::parse(svg)?;
    let elements: Vec<roxmltree::Node<'_, '_>> =
        doc.descendants().filter(|n| n.is_element()).collect();

    let circles: Vec<_> = elements
        .iter()
        .filter(|n| n.tag_name().name() == "circle")
        .collect();
    let node_refs: Vec<&str> = circles
        .iter()
        .filter_map(|n| n.attribute("data-node"))
        .collect();
    let distinct_nodes = node_refs.iter().collect::<HashSet<_>>().len();

    let ids: Vec<&str> = elements.iter().filter_map(|n| n.attribute("id")).collect();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for id in &ids {
        *counts.entry((*id).to_string()).or_default() += 1;
    }
    let duplicate_ids: BTreeMap<String, usize> =
        counts.into_iter().filter(|(_, n)| *n > 1).collect();

    let style = elements
        .iter()
        .find(|n| n.tag_name().name() == "style")
        .and_then(|n| n.text())
        .ok_or(VerifyError::MissingStyle)?;
    let keyframes: Vec<String> = KEYFRAMES_RE
        .captures_iter(style)
        .map(|caps| caps[1].to_string())
        .collect();

    let id_set: HashSet<&str> = ids.iter().copied().collect();
    let bound: BTreeSet<&str> = BINDING_RE
        .captures_iter(style)
        .filter(|caps| id_set.contains(&caps[1]))
        .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
        .collect();
    let unbound_keyframes = keyframes
        .iter()
        .filter(|name| !bound.contains(name.as_str()))
        .cloned()
        .collect();

    let group_count = |prefix: &str| {
        elements
            .iter()
            .filter(|n| n.tag_name().name() == "g")
            .filter(|n| n.attribute("id").is_some_and(|id| id.starts_with(prefix)))
            .count()
    };

    let report = VerifyReport {
        bytes: svg.len(),
        lines: svg.matches('\n').count() + 1,
        circles: circles.len(),
        node_circles: node_refs.len(),
        distinct_nodes,
        ids: ids.len(),
        duplicate_ids,
        keyframes,
        unbound_keyframes,
        old_groups: group_count("old-"),
        new_groups: group_count("new-"),
        expected,
    };
    for mismatch in report.mismatches() {
        tracing::warn!("{mismatch}");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect(declared_nodes: usize, node_circles: usize, keyframes: usize) -> Expectations {
        Expectations {
            declared_nodes,
            node_circles,
            old_groups: 0,
            new_groups: 0,
            keyframes,
        }
    }

    const SMALL: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <defs><style>
      @keyframes pulse { 0% {opacity:0} 100% {opacity:1} }
      #a{animation:pulse 4s ease infinite}
  </style></defs>
  <circle id="a" cx="1" cy="1" r="5" data-node="H-0"/>
  <circle cx="9" cy="1" r="5" data-node="H-1"/>
  <circle cx="0" cy="0" r="4"/>
</svg>"#;

    #[test]
    fn clean_document_passes() {
        let report = verify_svg(SMALL, expect(2, 2, 1)).unwrap();
        assert_eq!(report.circles, 3);
        assert_eq!(report.node_circles, 2);
        assert_eq!(report.keyframes, vec!["pulse".to_string()]);
        assert!(report.is_clean(), "{:?}", report.mismatches());
        assert!(report.to_string().contains("All 1 IDs unique"));
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let svg = SMALL.replace("<circle cx=\"9\"", "<circle id=\"a\" cx=\"9\"");
        let report = verify_svg(&svg, expect(2, 2, 1)).unwrap();
        assert_eq!(report.duplicate_ids.get("a"), Some(&2));
        assert!(!report.is_clean());
        assert!(report.to_string().contains("DUPLICATE IDs"));
    }

    #[test]
    fn unbound_keyframes_are_reported() {
        let svg = SMALL.replace("<circle id=\"a\"", "<circle");
        let report = verify_svg(&svg, expect(2, 2, 1)).unwrap();
        assert_eq!(report.unbound_keyframes, vec!["pulse".to_string()]);
    }

    #[test]
    fn count_mismatch_becomes_error_in_strict_mode() {
        let report = verify_svg(SMALL, expect(3, 2, 1)).unwrap();
        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("distinct nodes: found 2, expected 3"));
    }

    #[test]
    fn malformed_markup_is_a_parse_error() {
        assert!(matches!(
            verify_svg("<svg><circle></svg>", expect(0, 0, 0)),
            Err(VerifyError::Parse(_))
        ));
    }

    #[test]
    fn missing_style_is_reported() {
        assert!(matches!(
            verify_svg("<svg xmlns=\"http://www.w3.org/2000/svg\"/>", expect(0, 0, 0)),
            Err(VerifyError::MissingStyle)
        ));
    }

    #[test]
    fn default_scene_expectations() {
        let expected = Expectations::from_scene(&Scene::distributed_scaling());
        assert_eq!(
            expected,
            Expectations {
                declared_nodes: 40,
                node_circles: 56,
                old_groups: 16,
                new_groups: 16,
                keyframes: 67,
            }
        );
    }
}
