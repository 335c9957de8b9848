//! Circular (radial) layout: degree-based center selection, BFS ring
//! assignment, and angular barycenter ordering within each ring.

use crate::geometry::Vec2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircularConfig {
    pub ring_separation: f64,
    /// Angle, in radians, of the first node on each ring (§4.7).
    pub start_angle: f64,
    /// Angle, in radians, one past the last node on each ring. The full
    /// `[start_angle, end_angle)` sweep is divided evenly among a ring's
    /// nodes.
    pub end_angle: f64,
}

impl Default for CircularConfig {
    fn default() -> Self {
        Self {
            ring_separation: 120.0,
            start_angle: 0.0,
            end_angle: std::f64::consts::TAU,
        }
    }
}

/// Which ring a node was assigned to and its distance from the center,
/// exposed for tests and diagnostics (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleAssignment<Id> {
    pub node_id: Id,
    pub circle: usize,
    pub distance: f64,
}

/// Build the §6 `CircleAssignment` introspection list from a ring map and
/// the `ring_separation` used to place nodes (`distance = ring *
/// ring_separation`).
pub fn circle_assignments<Id: Copy + Eq + std::hash::Hash>(
    rings: &HashMap<Id, usize>,
    ring_separation: f64,
) -> Vec<CircleAssignment<Id>> {
    rings
        .iter()
        .map(|(&node_id, &circle)| CircleAssignment {
            node_id,
            circle,
            distance: circle as f64 * ring_separation,
        })
        .collect()
}

fn undirected_adjacency<Id: Copy + Eq + std::hash::Hash>(
    ids: &[Id],
    edges: &[(Id, Id)],
) -> HashMap<Id, Vec<Id>> {
    let mut adj: HashMap<Id, Vec<Id>> = ids.iter().map(|&id| (id, Vec::new())).collect();
    for &(a, b) in edges {
        adj.entry(a).or_default().push(b);
        adj.entry(b).or_default().push(a);
    }
    adj
}

/// Pick the node with highest total degree as the ring center; ties are
/// broken by input order, per the §4.7 degree sort (descending degree,
/// input order among ties) — the highest-degree node is whichever earns
/// that degree first in `ids`.
pub fn select_center<Id: Copy + Eq + std::hash::Hash>(
    ids: &[Id],
    edges: &[(Id, Id)],
) -> Option<Id> {
    if ids.is_empty() {
        return None;
    }
    let adj = undirected_adjacency(ids, edges);
    let mut best: Option<(Id, usize)> = None;
    for &id in ids {
        let degree = adj.get(&id).map(Vec::len).unwrap_or(0);
        let is_new_best = match best {
            Some((_, best_degree)) => degree > best_degree,
            None => true,
        };
        if is_new_best {
            best = Some((id, degree));
        }
    }
    best.map(|(id, _)| id)
}

/// Assign every node a ring number via BFS distance from `center`. Nodes
/// unreachable from `center` (disconnected components) are placed in one
/// ring beyond the farthest reached ring, ordered by id.
pub fn assign_rings<Id: Copy + Eq + std::hash::Hash + Ord>(
    ids: &[Id],
    edges: &[(Id, Id)],
    center: Id,
) -> HashMap<Id, usize> {
    let adj = undirected_adjacency(ids, edges);
    let mut rings: HashMap<Id, usize> = HashMap::new();
    let mut visited: HashSet<Id> = HashSet::new();
    let mut queue = VecDeque::new();

    rings.insert(center, 0);
    visited.insert(center);
    queue.push_back(center);

    let mut max_ring = 0;
    while let Some(u) = queue.pop_front() {
        let ring_u = rings[&u];
        let mut neighbours: Vec<Id> = adj.get(&u).cloned().unwrap_or_default();
        neighbours.sort();
        for v in neighbours {
            if visited.insert(v) {
                rings.insert(v, ring_u + 1);
                max_ring = max_ring.max(ring_u + 1);
                queue.push_back(v);
            }
        }
    }

    let mut unreached: Vec<Id> = ids
        .iter()
        .copied()
        .filter(|id| !rings.contains_key(id))
        .collect();
    if !unreached.is_empty() {
        unreached.sort();
        let outer = max_ring + 1;
        for id in unreached {
            rings.insert(id, outer);
        }
    }

    rings
}

/// Order nodes within each ring by the circular-mean angle of their
/// previous-ring neighbours, reducing edge crossings (§4.7). Returns, per
/// ring, the ids in their chosen order. Ring 0 always holds just the
/// center.
pub fn order_rings<Id: Copy + Eq + std::hash::Hash>(
    ids: &[Id],
    edges: &[(Id, Id)],
    rings: &HashMap<Id, usize>,
    center: Id,
) -> Vec<Vec<Id>> {
    let max_ring = rings.values().copied().max().unwrap_or(0);
    let adj = undirected_adjacency(ids, edges);

    let mut by_ring: Vec<Vec<Id>> = vec![Vec::new(); max_ring + 1];
    for &id in ids {
        if let Some(&r) = rings.get(&id) {
            by_ring[r].push(id);
        }
    }
    by_ring[0] = vec![center];

    let mut angle_of: HashMap<Id, f64> = HashMap::new();
    angle_of.insert(center, 0.0);

    for r in 1..=max_ring {
        let prev_ring_set: HashSet<Id> = by_ring[r - 1].iter().copied().collect();
        let original_index: HashMap<Id, usize> =
            by_ring[r].iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut entries: Vec<(Id, Option<f64>)> = by_ring[r]
            .iter()
            .map(|&id| {
                let unit_sum = adj
                    .get(&id)
                    .into_iter()
                    .flatten()
                    .filter(|n| prev_ring_set.contains(n))
                    .filter_map(|n| angle_of.get(n).copied())
                    .fold((0.0_f64, 0.0_f64, 0usize), |(sx, sy, c), a| {
                        (sx + a.cos(), sy + a.sin(), c + 1)
                    });
                let mean_angle = if unit_sum.2 == 0 {
                    None
                } else {
                    Some(unit_sum.1.atan2(unit_sum.0))
                };
                (id, mean_angle)
            })
            .collect();

        entries.sort_by(|(a_id, a), (b_id, b)| match (a, b) {
            (Some(x), Some(y)) => OrderedFloat(*x).cmp(&OrderedFloat(*y)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => original_index[a_id].cmp(&original_index[b_id]),
        });

        by_ring[r] = entries.into_iter().map(|(id, _)| id).collect();
        let count = by_ring[r].len();
        for (i, &id) in by_ring[r].iter().enumerate() {
            let angle = std::f64::consts::TAU * i as f64 / count as f64;
            angle_of.insert(id, angle);
        }
    }

    by_ring
}

/// Assign final Cartesian coordinates: the center at the origin, every
/// other ring evenly spaced around its circumference at radius `ring *
/// ring_separation`, with a ring-`k` node at sorted position `i` of `m`
/// placed at angle `start_angle + i * (end_angle - start_angle) / m`
/// (§4.7).
pub fn assign_coordinates<Id: Copy + Eq + std::hash::Hash>(
    ordered_rings: &[Vec<Id>],
    config: &CircularConfig,
) -> HashMap<Id, Vec2> {
    let sweep = config.end_angle - config.start_angle;
    let mut out = HashMap::new();
    for (ring, nodes) in ordered_rings.iter().enumerate() {
        if ring == 0 {
            for &id in nodes {
                out.insert(id, Vec2::ZERO);
            }
            continue;
        }
        let radius = ring as f64 * config.ring_separation;
        let count = nodes.len();
        for (i, &id) in nodes.iter().enumerate() {
            let angle = config.start_angle + sweep * i as f64 / count as f64;
            out.insert(id, Vec2::from_polar(radius, angle));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_highest_degree_node() {
        let ids = ["a", "b", "c", "d"];
        // b has degree 3, everyone else degree 1.
        let edges = [("b", "a"), ("b", "c"), ("b", "d")];
        assert_eq!(select_center(&ids, &edges), Some("b"));
    }

    #[test]
    fn degree_tie_breaks_on_input_order() {
        let ids = ["z", "a"];
        let edges: [(&str, &str); 0] = [];
        assert_eq!(select_center(&ids, &edges), Some("z"));
    }

    #[test]
    fn s3_circular_star_scenario() {
        let ids = ["center", "a", "b", "c"];
        let edges = [("center", "a"), ("center", "b"), ("center", "c")];
        let center = select_center(&ids, &edges).unwrap();
        assert_eq!(center, "center");

        let rings = assign_rings(&ids, &edges, center);
        assert_eq!(rings[&"center"], 0);
        assert_eq!(rings[&"a"], 1);
        assert_eq!(rings[&"b"], 1);
        assert_eq!(rings[&"c"], 1);

        let ordered = order_rings(&ids, &edges, &rings, center);
        let config = CircularConfig {
            ring_separation: 100.0,
            ..CircularConfig::default()
        };
        let coords = assign_coordinates(&ordered, &config);

        assert_eq!(coords[&"center"], Vec2::ZERO);
        for id in ["a", "b", "c"] {
            assert!((coords[&id].length() - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn disconnected_nodes_land_in_outer_ring() {
        let ids = ["center", "a", "island"];
        let edges = [("center", "a")];
        let center = select_center(&ids, &edges).unwrap();
        let rings = assign_rings(&ids, &edges, center);
        assert_eq!(rings[&"island"], 2);
    }

    #[test]
    fn circle_assignments_report_ring_and_distance() {
        let ids = ["center", "a"];
        let edges = [("center", "a")];
        let center = select_center(&ids, &edges).unwrap();
        let rings = assign_rings(&ids, &edges, center);

        let assignments = circle_assignments(&rings, 50.0);
        let of = |id| assignments.iter().find(|a| a.node_id == id).unwrap();
        assert_eq!(of("center").circle, 0);
        assert_eq!(of("center").distance, 0.0);
        assert_eq!(of("a").circle, 1);
        assert_eq!(of("a").distance, 50.0);
    }
}
