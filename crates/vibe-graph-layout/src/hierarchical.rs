//! Hierarchical (layered) layout: longest-path layering, barycenter
//! crossing reduction, and four-orientation coordinate assignment.

use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Orientation of the layer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Layers run top to bottom.
    TB,
    /// Layers run bottom to top.
    BT,
    /// Layers run left to right.
    LR,
    /// Layers run right to left.
    RL,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchicalConfig {
    pub direction: Direction,
    pub level_separation: f64,
    pub node_separation: f64,
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            direction: Direction::TB,
            level_separation: 150.0,
            node_separation: 50.0,
        }
    }
}

/// A node's dimensions, as seen by the coordinate-assignment pass.
#[derive(Debug, Clone, Copy)]
pub struct NodeExtent {
    pub width: f64,
    pub height: f64,
}

/// Per-node structural decision exposed for tests and diagnostics (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerAssignment<Id> {
    pub node_id: Id,
    pub layer: usize,
}

/// Build the §6 `LayerAssignment` introspection list from a layer map.
pub fn layer_assignments<Id: Copy + Eq + std::hash::Hash>(
    layers: &HashMap<Id, usize>,
) -> Vec<LayerAssignment<Id>> {
    layers
        .iter()
        .map(|(&node_id, &layer)| LayerAssignment { node_id, layer })
        .collect()
}

/// Assign each node in `ids` the length of the longest directed path
/// (counted in edges) ending at it, per §4.6. Cyclic subgraphs are broken
/// by repeatedly selecting the minimum-in-degree node among the
/// as-yet-unassigned set (ties broken by lowest id) as if it were a fresh
/// root.
pub fn assign_layers<Id: Copy + Eq + std::hash::Hash + Ord>(
    ids: &[Id],
    edges: &[(Id, Id)],
) -> HashMap<Id, usize> {
    let mut indegree: HashMap<Id, usize> = ids.iter().map(|&id| (id, 0)).collect();
    let mut successors: HashMap<Id, Vec<Id>> = ids.iter().map(|&id| (id, Vec::new())).collect();
    let mut predecessors: HashMap<Id, Vec<Id>> = ids.iter().map(|&id| (id, Vec::new())).collect();

    for &(s, t) in edges {
        if let Some(c) = indegree.get_mut(&t) {
            *c += 1;
        }
        successors.entry(s).or_default().push(t);
        predecessors.entry(t).or_default().push(s);
    }

    let mut remaining: HashSet<Id> = ids.iter().copied().collect();
    let mut layer: HashMap<Id, usize> = HashMap::new();
    let mut queue: VecDeque<Id> = VecDeque::new();

    let mut ready: Vec<Id> = remaining
        .iter()
        .copied()
        .filter(|id| indegree[id] == 0)
        .collect();
    ready.sort();
    queue.extend(ready);

    while !remaining.is_empty() {
        if queue.is_empty() {
            // Cyclic subgraph: pick the minimum in-degree node among what's
            // left, lowest id breaks ties.
            let mut candidates: Vec<Id> = remaining.iter().copied().collect();
            candidates.sort();
            let root = *candidates
                .iter()
                .min_by_key(|id| indegree[id])
                .expect("remaining is non-empty");
            queue.push_back(root);
        }

        let u = queue.pop_front().unwrap();
        if !remaining.remove(&u) {
            continue;
        }

        let layer_u = predecessors[&u]
            .iter()
            .filter_map(|v| layer.get(v))
            .map(|l| l + 1)
            .max()
            .unwrap_or(0);
        layer.insert(u, layer_u);

        let mut newly_ready: Vec<Id> = Vec::new();
        for &w in &successors[&u] {
            if remaining.contains(&w) {
                let c = indegree.get_mut(&w).unwrap();
                *c = c.saturating_sub(1);
                if *c == 0 {
                    newly_ready.push(w);
                }
            }
        }
        newly_ready.sort();
        for w in newly_ready {
            queue.push_back(w);
        }
    }

    layer
}

/// Order nodes within each layer by the barycenter of their previous-layer
/// neighbours' positions (§4.6 crossing reduction). Returns, per layer, the
/// ids in their chosen order.
pub fn reduce_crossings<Id: Copy + Eq + std::hash::Hash>(
    ids: &[Id],
    edges: &[(Id, Id)],
    layers: &HashMap<Id, usize>,
) -> Vec<Vec<Id>> {
    let max_layer = layers.values().copied().max().unwrap_or(0);

    let mut neighbours: HashMap<Id, Vec<Id>> = ids.iter().map(|&id| (id, Vec::new())).collect();
    for &(s, t) in edges {
        neighbours.entry(s).or_default().push(t);
        neighbours.entry(t).or_default().push(s);
    }

    let mut by_layer: Vec<Vec<Id>> = vec![Vec::new(); max_layer + 1];
    for &id in ids {
        if let Some(&l) = layers.get(&id) {
            by_layer[l].push(id);
        }
    }

    let mut position_in_layer: HashMap<Id, usize> = HashMap::new();
    for (i, &id) in by_layer[0].iter().enumerate() {
        position_in_layer.insert(id, i);
    }

    for l in 1..=max_layer {
        let prev_layer_set: HashSet<Id> = by_layer[l - 1].iter().copied().collect();
        let mut entries: Vec<(Id, Option<f64>)> = by_layer[l]
            .iter()
            .map(|&id| {
                let positions: Vec<f64> = neighbours[&id]
                    .iter()
                    .filter(|n| prev_layer_set.contains(n))
                    .filter_map(|n| position_in_layer.get(n).copied())
                    .map(|p| p as f64)
                    .collect();
                let barycenter = if positions.is_empty() {
                    None
                } else {
                    Some(positions.iter().sum::<f64>() / positions.len() as f64)
                };
                (id, barycenter)
            })
            .collect();

        // Stable sort: nodes with a barycenter come first, ordered by it;
        // nodes without one keep their original (insertion) relative order
        // at the end.
        let original_index: HashMap<Id, usize> =
            by_layer[l].iter().enumerate().map(|(i, &id)| (id, i)).collect();
        entries.sort_by(|(a_id, a), (b_id, b)| match (a, b) {
            (Some(x), Some(y)) => x.partial_cmp(y).unwrap(),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => original_index[a_id].cmp(&original_index[b_id]),
        });

        by_layer[l] = entries.into_iter().map(|(id, _)| id).collect();
        for (i, &id) in by_layer[l].iter().enumerate() {
            position_in_layer.insert(id, i);
        }
    }

    by_layer
}

/// Assign final `(x, y)` coordinates given layer order and node extents, per
/// the §4.6 coordinate-assignment rules.
pub fn assign_coordinates<Id: Copy + Eq + std::hash::Hash>(
    ordered_layers: &[Vec<Id>],
    extents: &HashMap<Id, NodeExtent>,
    config: &HierarchicalConfig,
) -> HashMap<Id, Vec2> {
    let mut out = HashMap::new();

    for (layer_idx, layer_nodes) in ordered_layers.iter().enumerate() {
        if layer_nodes.is_empty() {
            continue;
        }

        let level_coord = layer_idx as f64 * config.level_separation;
        let level_coord = match config.direction {
            Direction::TB | Direction::LR => level_coord,
            Direction::BT | Direction::RL => -level_coord,
        };

        let cross_sizes: Vec<f64> = layer_nodes
            .iter()
            .map(|id| {
                let e = extents.get(id).copied().unwrap_or(NodeExtent {
                    width: 1.0,
                    height: 1.0,
                });
                match config.direction {
                    Direction::TB | Direction::BT => e.width,
                    Direction::LR | Direction::RL => e.height,
                }
            })
            .collect();

        // Lay out left-to-right first, then re-center so the layer is
        // symmetric around 0.
        let mut positions = vec![0.0_f64; layer_nodes.len()];
        for i in 1..layer_nodes.len() {
            let gap = (cross_sizes[i - 1] + cross_sizes[i]) / 2.0 + config.node_separation;
            positions[i] = positions[i - 1] + gap;
        }
        let total = positions.last().copied().unwrap_or(0.0);
        let offset = total / 2.0;

        for (i, &id) in layer_nodes.iter().enumerate() {
            let cross = positions[i] - offset;
            let pos = match config.direction {
                Direction::TB | Direction::BT => Vec2::new(cross, level_coord),
                Direction::LR | Direction::RL => Vec2::new(level_coord, cross),
            };
            out.insert(id, pos);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_hierarchical_tb_scenario() {
        let ids = ["A", "B", "C"];
        let edges = [("A", "B"), ("A", "C")];
        let layers = assign_layers(&ids, &edges);
        assert_eq!(layers[&"A"], 0);
        assert_eq!(layers[&"B"], 1);
        assert_eq!(layers[&"C"], 1);

        let ordered = reduce_crossings(&ids, &edges, &layers);
        let extents: HashMap<&str, NodeExtent> = ids
            .iter()
            .map(|&id| (id, NodeExtent { width: 40.0, height: 20.0 }))
            .collect();
        let config = HierarchicalConfig {
            direction: Direction::TB,
            level_separation: 100.0,
            ..HierarchicalConfig::default()
        };
        let coords = assign_coordinates(&ordered, &extents, &config);

        assert_eq!(coords[&"A"].y, 0.0);
        assert_eq!(coords[&"B"].y, 100.0);
        assert_eq!(coords[&"C"].y, 100.0);
        assert_ne!(coords[&"B"].x, coords[&"C"].x);
    }

    #[test]
    fn layer_assignments_mirror_the_layer_map() {
        let ids = ["A", "B"];
        let edges = [("A", "B")];
        let layers = assign_layers(&ids, &edges);
        let assignments = layer_assignments(&layers);
        assert_eq!(assignments.len(), 2);
        let of = |id| assignments.iter().find(|a| a.node_id == id).unwrap().layer;
        assert_eq!(of("A"), 0);
        assert_eq!(of("B"), 1);
    }

    #[test]
    fn isolated_nodes_get_layer_zero() {
        let ids = ["x", "y"];
        let layers = assign_layers(&ids, &[]);
        assert_eq!(layers[&"x"], 0);
        assert_eq!(layers[&"y"], 0);
    }

    #[test]
    fn cycle_still_assigns_every_node_a_layer() {
        let ids = ["a", "b", "c"];
        let edges = [("a", "b"), ("b", "c"), ("c", "a")];
        let layers = assign_layers(&ids, &edges);
        assert_eq!(layers.len(), 3);
        for id in ids {
            assert!(layers.contains_key(&id));
        }
    }

    #[test]
    fn same_layer_coplanarity_holds_for_lr() {
        let ids = ["A", "B", "C"];
        let edges = [("A", "B"), ("A", "C")];
        let layers = assign_layers(&ids, &edges);
        let ordered = reduce_crossings(&ids, &edges, &layers);
        let extents: HashMap<&str, NodeExtent> = ids
            .iter()
            .map(|&id| (id, NodeExtent { width: 40.0, height: 20.0 }))
            .collect();
        let config = HierarchicalConfig {
            direction: Direction::LR,
            level_separation: 100.0,
            ..HierarchicalConfig::default()
        };
        let coords = assign_coordinates(&ordered, &extents, &config);
        assert_eq!(coords[&"B"].x, coords[&"C"].x);
    }
}
