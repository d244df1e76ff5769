use probtree_core::{Node, Settings, TokenTree};
use probtree_layout::branched::{COLUMN_MARGIN, layout_branched, tidy_offsets};
use probtree_layout::constraint::AngleConstraint;
use probtree_layout::geometry::Placement;
use probtree_layout::sizing::{LabelSizer, Size};
use probtree_layout::text::DeterministicTextMeasurer;
use proptest::prelude::*;

fn node(token: &str) -> Node {
    Node {
        id: token.to_string(),
        token: token.to_string(),
        ..Default::default()
    }
}

/// Node `i + 1` hangs under `parents[i]`, which must be at most `i`.
fn tree_from_parents(parents: &[usize], tokens: &[String]) -> TokenTree {
    let mut tree = TokenTree::with_root(node("root"));
    for (i, &p) in parents.iter().enumerate() {
        let token = &tokens[i % tokens.len()];
        let mut n = node(token);
        n.id = format!("n{}", i + 1);
        tree.add_child(p, n);
    }
    tree
}

fn arb_tree() -> impl Strategy<Value = TokenTree> {
    (1usize..40)
        .prop_flat_map(|n| {
            let parents = (0..n).map(|i| 0..=i).collect::<Vec<_>>();
            let tokens = prop::collection::vec("[a-z]{1,12}", 1..6);
            (parents, tokens)
        })
        .prop_map(|(parents, tokens)| tree_from_parents(&parents, &tokens))
}

fn layout(tree: &TokenTree, settings: &Settings) -> Placement {
    let measurer = DeterministicTextMeasurer::default();
    let sizer = LabelSizer::new(settings, &measurer);
    layout_branched(tree, &sizer, settings)
}

fn assert_angle_bound(tree: &TokenTree, placement: &Placement, deg: f64) {
    let c = AngleConstraint::from_degrees(deg).unwrap();
    for (i, t) in tree.iter() {
        let Some(p) = t.parent else { continue };
        let d = c.deficit(&placement.nodes[p], &placement.nodes[i]);
        assert!(d < 1e-6, "edge {p} -> {i} is {d} short at {deg} degrees");
    }
}

#[test]
fn single_node_sits_at_the_origin() {
    let tree = TokenTree::with_root(node("The"));
    let placement = layout(&tree, &Settings::default());
    assert_eq!(placement.nodes.len(), 1);
    assert!(placement.links.is_empty());

    let n = &placement.nodes[0];
    assert_eq!((n.x, n.y), (0.0, 0.0));

    let bbox = placement.bounding_box();
    assert_eq!(bbox.min_x, -35.0);
    assert_eq!(bbox.max_x, 35.0);
    assert_eq!(bbox.min_y, 0.0);
    assert!((bbox.width - (n.w + 80.0)).abs() < 1e-9);
    assert!((bbox.height - 150.0).abs() < 1e-9);
}

#[test]
fn tidy_offsets_center_parents_over_their_children() {
    let mut tree = TokenTree::with_root(node("r"));
    for tok in ["a", "b", "c"] {
        tree.add_child(TokenTree::ROOT, node(tok));
    }
    assert_eq!(tidy_offsets(&tree), vec![0.0, -1.0, 0.0, 1.0]);
}

#[test]
fn cousins_are_two_slots_apart() {
    let mut tree = TokenTree::with_root(node("r"));
    let a = tree.add_child(TokenTree::ROOT, node("a"));
    let b = tree.add_child(TokenTree::ROOT, node("b"));
    let a1 = tree.add_child(a, node("a1"));
    let b1 = tree.add_child(b, node("b1"));
    let x = tidy_offsets(&tree);
    assert_eq!(x[b] - x[a], 2.0);
    assert_eq!(x[b1] - x[a1], 2.0);
    assert_eq!(x[TokenTree::ROOT], 0.0);
}

#[test]
fn siblings_follow_tree_order_one_slot_apart() {
    let mut tree = TokenTree::with_root(node("r"));
    for tok in ["a", "b", "c"] {
        tree.add_child(TokenTree::ROOT, node(tok));
    }
    let mut settings = Settings::default();
    settings.ang_max_deg = 0.0;
    let placement = layout(&tree, &settings);

    let slot = settings.alt_gap + settings.token_fpx + settings.pad_t + settings.pad_b;
    let xs: Vec<f64> = placement.nodes[1..].iter().map(|n| n.x).collect();
    assert_eq!(xs, vec![-slot, 0.0, slot]);
    assert_eq!(placement.links.len(), 3);
    for link in &placement.links {
        assert_eq!(link.source_key, placement.nodes[0].key);
        assert_eq!(link.sx, placement.nodes[0].y + placement.nodes[0].w);
    }
}

#[test]
fn column_gap_covers_the_widest_box() {
    let mut tree = TokenTree::with_root(node("r"));
    tree.add_child(TokenTree::ROOT, node(&"w".repeat(60)));
    let mut settings = Settings::default();
    settings.ang_max_deg = 0.0;
    let placement = layout(&tree, &settings);
    let widest = placement.nodes.iter().map(|n| n.w).fold(0.0, f64::max);
    assert_eq!(placement.nodes[1].y, widest + COLUMN_MARGIN);
}

#[test]
fn ninety_degrees_means_no_enforcement() {
    let parents = [0, 0, 0, 0, 0, 0, 1, 1, 2];
    let tokens = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];
    let tree = tree_from_parents(&parents, &tokens);

    let mut disabled = Settings::default();
    disabled.ang_max_deg = 0.0;
    let reference = layout(&tree, &disabled);

    for deg in [90.0, 120.0, -5.0, f64::NAN, f64::INFINITY] {
        let mut settings = Settings::default();
        settings.ang_max_deg = deg;
        assert_eq!(layout(&tree, &settings), reference, "angle {deg}");
    }
}

#[test]
fn steep_fans_are_repaired_beyond_the_gap_cap() {
    let parents = vec![0; 12];
    let tokens = vec!["t".to_string()];
    let tree = tree_from_parents(&parents, &tokens);
    let mut settings = Settings::default();
    settings.ang_max_deg = 20.0;
    settings.branched_gap_max = 0.0;
    let placement = layout(&tree, &settings);
    assert_angle_bound(&tree, &placement, 20.0);

    // Only the outer children needed extra run.
    let ys: Vec<f64> = placement.nodes[1..].iter().map(|n| n.y).collect();
    assert!(ys[0] > ys[5]);
}

#[test]
fn custom_sizers_are_clamped() {
    let parents = [0, 0, 1];
    let tree = tree_from_parents(&parents, &["x".to_string()]);
    let sizer = |n: &Node| {
        if n.id == "n1" {
            Size { w: 0.0, h: -1.0 }
        } else {
            Size { w: 2.0, h: 2.0 }
        }
    };
    let placement = layout_branched(&tree, &sizer, &Settings::default());
    for n in &placement.nodes {
        assert!(n.w >= 8.0 && n.h >= 8.0, "{} is {}x{}", n.key, n.w, n.h);
    }
}

proptest! {
    #[test]
    fn every_edge_respects_the_angle_bound(tree in arb_tree(), deg in 5.0f64..85.0) {
        let mut settings = Settings::default();
        settings.ang_max_deg = deg;
        let placement = layout(&tree, &settings);
        prop_assert_eq!(placement.nodes.len(), tree.len());
        prop_assert_eq!(placement.links.len(), tree.len() - 1);
        assert_angle_bound(&tree, &placement, deg);
    }

    #[test]
    fn children_never_start_before_their_parent_ends(tree in arb_tree()) {
        let placement = layout(&tree, &Settings::default());
        for (i, t) in tree.iter() {
            if let Some(p) = t.parent {
                let parent = &placement.nodes[p];
                prop_assert!(placement.nodes[i].y >= parent.y + parent.w);
            }
        }
    }

    #[test]
    fn placement_keys_are_unique(tree in arb_tree()) {
        let placement = layout(&tree, &Settings::default());
        prop_assert_eq!(placement.key_index().len(), placement.nodes.len());
    }
}
