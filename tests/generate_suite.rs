use std::collections::BTreeSet;

use distributed_scaling_svg::config::parse_config;
use distributed_scaling_svg::scene::{
    Column, Host, HostInvalidation, HostRecompute, NodeRef, Recompute, Timing,
};
use distributed_scaling_svg::timeline::node_invalidation_pct;
use distributed_scaling_svg::{Config, Expectations, Scene, SceneError, generate, verify_svg};

fn assert_valid_svg(svg: &str) {
    assert!(svg.contains("<svg"), "missing <svg tag");
    assert!(svg.contains("</svg>"), "missing </svg tag");
}

#[test]
fn default_diagram_passes_self_check() {
    let config = Config::default();
    let generated = generate(&config).expect("default scene must be valid");
    assert_valid_svg(&generated.svg);

    let report = verify_svg(&generated.svg, Expectations::from_scene(&config.scene))
        .expect("generated svg must parse");
    assert!(report.is_clean(), "{:?}", report.mismatches());
    assert!(report.duplicate_ids.is_empty());
    assert_eq!(report.distinct_nodes, 40);
    assert_eq!(report.node_circles, 56);
    // Five legend swatches on top of the node circles.
    assert_eq!(report.circles, 61);
    assert_eq!(report.keyframes.len(), 67);
    assert_eq!((report.old_groups, report.new_groups), (16, 16));
}

#[test]
fn output_is_byte_identical_across_runs() {
    let first = generate(&Config::default()).unwrap().svg;
    let second = generate(&Config::default()).unwrap().svg;
    assert_eq!(first, second);
}

#[test]
fn three_node_host_staggers_from_its_base() {
    let scene = Scene {
        columns: vec![Column {
            title: "Clients".to_string(),
            x: 10,
        }],
        hosts: vec![Host {
            id: "H".to_string(),
            label: "Host".to_string(),
            column: 0,
            y: 42,
            height: 70,
            nodes: vec![(0.85, 0.38), (0.18, 0.35), (0.52, 0.68)],
            edges: vec![(1, 2), (2, 0)],
            affected: BTreeSet::from([0, 1, 2]),
            db: BTreeSet::new(),
        }],
        cross_edges: Vec::new(),
        timing: Timing {
            invalidation: vec![HostInvalidation {
                host: "H".to_string(),
                start: 14,
            }],
            recompute: vec![HostRecompute {
                host: "H".to_string(),
                phase: Recompute {
                    appear: 30,
                    green: 44,
                    cache_hits: Vec::new(),
                },
            }],
            ..Timing::default()
        },
    };

    let mut starts: Vec<(f64, u32)> = (0..3)
        .map(|i| {
            let x = scene.hosts[0].nodes[i].0;
            (x, node_invalidation_pct(&scene, 2, &NodeRef::new("H", i)).unwrap())
        })
        .collect();
    starts.sort_by(|a, b| b.0.total_cmp(&a.0));
    let ordered: Vec<u32> = starts.iter().map(|(_, pct)| *pct).collect();
    assert_eq!(ordered, vec![14, 16, 18]);

    let config = Config {
        scene,
        ..Config::default()
    };
    let generated = generate(&config).unwrap();
    let report = verify_svg(&generated.svg, Expectations::from_scene(&config.scene)).unwrap();
    assert!(report.is_clean(), "{:?}", report.mismatches());
    // old + new per node, two edges, one box, no captions or flash.
    assert_eq!(report.keyframes.len(), 3 + 3 + 2 + 1);
}

#[test]
fn config_file_scene_is_validated_before_emitting() {
    let config = parse_config(
        r#"{
            scene: {
                columns: [{ title: "Solo", x: 10 }],
                hosts: [{
                    id: "H", label: "Host", column: 0, y: 42, height: 70,
                    nodes: [[0.2, 0.5]],
                    edges: [[0, 3]],
                }],
            },
        }"#,
    )
    .unwrap();
    assert_eq!(
        generate(&config).unwrap_err(),
        SceneError::UnknownNode {
            host: "H".to_string(),
            index: 3,
            count: 1,
        }
    );
}

#[test]
fn slower_cycle_changes_only_durations() {
    let config = parse_config("{ animation: { cycleSecs: 60 } }").unwrap();
    let svg = generate(&config).unwrap().svg;
    assert!(svg.contains("/* 60s cycle."));
    assert!(svg.contains("#desc-6{animation:desc-6 60s ease infinite}"));
    assert!(!svg.contains(" 48s ease"));
}

#[test]
fn repeated_invalidation_is_rejected_instead_of_emitting_twice() {
    let mut config = Config::default();
    config.scene.timing.invalidation.push(HostInvalidation {
        host: "C1".to_string(),
        start: 20,
    });
    assert_eq!(
        generate(&config).unwrap_err(),
        SceneError::DuplicatePhase("invalidation of C1".to_string())
    );
}

#[test]
fn oversized_stagger_from_config_is_an_error() {
    let config = parse_config("{ animation: { stagger: 4294967295 } }").unwrap();
    assert!(matches!(
        generate(&config),
        Err(SceneError::PercentOutOfRange { value: u32::MAX, .. })
    ));
}
