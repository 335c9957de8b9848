//! Drives the four layout algorithms over a small graph, printing the
//! resulting positions.
//!
//! Run with: cargo run --example simple_layout -p vibe-graph-layout

use vibe_graph_layout::engine::{Engine, LayoutConfig};
use vibe_graph_layout::{LayoutEdge, LayoutNode};

fn node(id: &str) -> LayoutNode {
    LayoutNode {
        id: id.to_string(),
        x: 0.0,
        y: 0.0,
        width: Some(80.0),
        height: Some(40.0),
        radius: None,
        mass: None,
        node_type: None,
        priority: None,
    }
}

fn edge(source: &str, target: &str) -> LayoutEdge {
    LayoutEdge {
        source: source.to_string(),
        target: target.to_string(),
        weight: None,
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let nodes: Vec<LayoutNode> = ["root", "a", "b", "c", "d", "e"].iter().map(|id| node(id)).collect();
    let edges = vec![
        edge("root", "a"),
        edge("root", "b"),
        edge("a", "c"),
        edge("b", "d"),
        edge("b", "e"),
    ];

    let mut engine = Engine::default();

    for algorithm in ["force", "hierarchical", "circular", "grid"] {
        let config = LayoutConfig {
            algorithm: algorithm.to_string(),
            ..LayoutConfig::default()
        };
        let positions = engine
            .compute_layout(&nodes, &edges, &config)
            .expect("well-formed demo graph");

        println!("\n{algorithm}:");
        let mut ids: Vec<&String> = positions.keys().collect();
        ids.sort();
        for id in ids {
            let p = positions[id];
            println!("  {id:>5} -> ({:.1}, {:.1})", p.x, p.y);
        }
    }
}
