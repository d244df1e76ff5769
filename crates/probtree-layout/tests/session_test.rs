use probtree_core::{LayoutKind, Settings};
use probtree_layout::frame::FrameCoalescer;
use probtree_layout::geometry::BoundingBox;
use probtree_layout::viewport::{RecordingCanvas, ScrollRect, Transform};
use probtree_layout::{Error, LayoutSession};
use serde_json::json;

fn sample() -> String {
    json!({
        "token": "Once",
        "position": -1,
        "prompt": "[[Once upon a time]]",
        "emp_children": {"there": 3, "a": 1},
        "children": [
            {
                "token": "there",
                "emp_freq_here": 0.75,
                "theoretical_edges": [{"token": "was", "avg_prob": 0.6}],
                "children": [{"token": "lived", "emp_freq_here": 1.0}]
            },
            {"token": "a", "emp_freq_here": 0.25}
        ]
    })
    .to_string()
}

fn session(kind: LayoutKind) -> LayoutSession {
    let settings = Settings {
        layout: kind,
        ..Settings::default()
    };
    let mut s = LayoutSession::new(settings);
    s.load_str(&sample()).unwrap();
    s
}

#[test]
fn coalescer_keeps_only_the_latest_request() {
    let mut frames = FrameCoalescer::new();
    assert!(frames.request(1));
    assert!(!frames.request(2));
    assert!(!frames.request(3));
    assert!(frames.is_pending());

    assert_eq!(frames.take_frame(), Some(3));
    assert_eq!(frames.take_frame(), None);
    assert_eq!(frames.requested(), 3);
    assert_eq!(frames.delivered(), 1);

    assert!(frames.request(4));
}

#[test]
fn layout_without_data_is_an_error() {
    let mut s = LayoutSession::default();
    assert!(matches!(s.layout(), Err(Error::NoData)));
    assert!(s.placed_nodes().is_empty());
    assert_eq!(s.bounding_box(), BoundingBox::empty());
}

#[test]
fn malformed_input_is_rejected_and_keeps_the_old_graph() {
    let mut s = session(LayoutKind::Branched);
    assert!(s.load_str("[1, 2, 3]").is_err());
    assert!(s.load_str("{not json").is_err());
    assert_eq!(s.graph().map(|g| g.nodes().len()), Some(4));
}

#[test]
fn every_strategy_places_the_same_tree() {
    for kind in [LayoutKind::Branched, LayoutKind::Linear, LayoutKind::Ranked] {
        let mut s = session(kind);
        let bbox = s.layout().unwrap();
        // Four observed nodes plus the predicted "was" under "there".
        assert_eq!(s.placed_nodes().len(), 5, "{kind:?}");
        assert_eq!(s.placed_links().len(), 4, "{kind:?}");
        assert!(bbox.width > 0.0 && bbox.height > 0.0);
        assert_eq!(s.placed_nodes().iter().filter(|n| n.node.is_ghost).count(), 1);
    }
}

#[test]
fn prompt_node_and_main_path() {
    let mut s = session(LayoutKind::Linear);
    s.layout().unwrap();
    let prompt = s.prompt_node().unwrap();
    assert_eq!(prompt.node.token, "Once");

    let path = s.main_path();
    assert_eq!(path.len(), 3);
    assert_eq!(path[0], s.placed_node(0).unwrap().key);
    assert!(path[2].ends_with("lived"));
}

#[test]
fn toggling_predicted_paths_takes_effect_on_relayout() {
    let mut s = session(LayoutKind::Branched);
    s.layout().unwrap();
    assert_eq!(s.placed_nodes().len(), 5);

    s.merge_settings(&json!({"SHOW_PREDICTED_PATHS": false}))
        .unwrap();
    s.layout().unwrap();
    assert_eq!(s.placed_nodes().len(), 4);
    assert!(s.placed_links().iter().all(|l| !l.is_ghost));
}

#[test]
fn invalid_settings_leave_the_current_ones() {
    let mut s = session(LayoutKind::Branched);
    assert!(s.merge_settings(&json!({"GAP_X": -1})).is_err());
    assert!(s.merge_settings(&json!(3)).is_err());
    assert_eq!(s.settings().gap_x, Settings::default().gap_x);

    let mut bad = Settings::default();
    bad.node_h = f64::NAN;
    assert!(s.set_settings(bad).is_err());
    assert_eq!(s.settings().node_h, Settings::default().node_h);
}

#[test]
fn search_survives_relayout() {
    let mut s = session(LayoutKind::Branched);
    s.layout().unwrap();
    assert_eq!(s.search("THERE"), 1);
    let idx = s.search_matches()[0];
    assert_eq!(s.placed_node(idx).unwrap().node.token, "there");

    s.layout().unwrap();
    assert_eq!(s.search_matches().len(), 1);
    assert_eq!(s.search("   "), 0);
    assert_eq!(s.search("zzz"), 0);
}

#[test]
fn view_changes_render_once_per_frame() {
    let mut s = session(LayoutKind::Branched);
    s.layout().unwrap();

    let mut canvas = RecordingCanvas::default();
    assert!(s.on_frame(&mut canvas).is_some());
    assert!(s.on_frame(&mut canvas).is_none());
    assert_eq!(canvas.frames, 1);

    let scroll = ScrollRect {
        left: 0.0,
        top: 0.0,
        width: 4000.0,
        height: 4000.0,
    };
    assert!(s.set_scroll(scroll));
    for k in [0.5, 0.75, 1.0] {
        assert!(!s.set_transform(Transform {
            k,
            x: 0.0,
            y: 1000.0,
        }));
    }
    let stats = s.on_frame(&mut canvas).unwrap();
    assert_eq!(canvas.frames, 2);
    assert_eq!(stats.nodes, 5);
    assert_eq!(s.view().transform.k, 1.0);
    assert!(!s.frame_pending());

    let now = s.render_now(&mut canvas);
    assert_eq!(now, stats);
}

#[test]
fn loading_an_empty_graph_clears_the_placement() {
    let mut s = session(LayoutKind::Branched);
    s.layout().unwrap();
    assert!(!s.placed_nodes().is_empty());

    s.load_str(&json!({"nodes": [], "edges": []}).to_string())
        .unwrap();
    assert!(s.placed_nodes().is_empty());
    assert_eq!(s.layout().unwrap(), BoundingBox::empty());
    assert!(s.prompt_node().is_none());
    assert!(s.main_path().is_empty());
}

#[test]
fn main_path_uses_the_placed_keys_of_every_strategy() {
    let text = json!({
        "nodes": [
            {"id": "r", "token": "The", "path": ["The"], "position": 0},
            {"id": "x1", "token": "cat", "position": 1, "emp_freq_here": 0.1},
            {"id": "x2", "token": "cat", "position": 1, "emp_freq_here": 0.9}
        ],
        "edges": [
            {"source": "r", "target": "x1"},
            {"source": "r", "target": "x2"}
        ]
    })
    .to_string();

    for kind in [LayoutKind::Branched, LayoutKind::Linear, LayoutKind::Ranked] {
        let mut s = LayoutSession::new(Settings {
            layout: kind,
            ..Settings::default()
        });
        s.load_str(&text).unwrap();
        assert!(s.main_path().is_empty(), "{kind:?}: nothing placed yet");

        s.layout().unwrap();
        let path = s.main_path();
        let key_of = |id: &str| {
            s.placed_nodes()
                .iter()
                .find(|n| n.node.id == id)
                .map(|n| n.key.clone())
                .unwrap()
        };
        assert_eq!(path, vec![key_of("r"), key_of("x2")], "{kind:?}");
    }
}
