//! Pairwise minimum-distance collision detection and iterative resolution.

use crate::geometry::{Rect, Vec2};
use crate::quadtree::{Quadtree, DEFAULT_CAPACITY};
use rand::Rng;
use std::collections::HashMap;

/// Below this distance between two node centers, direction is picked
/// randomly to break the degeneracy rather than dividing by (near) zero.
pub const MIN_DISTANCE: f64 = 0.01;

/// A node as seen by the collision detector/resolver: identity, position,
/// and collision radius.
#[derive(Debug, Clone, Copy)]
pub struct Body<Id> {
    pub id: Id,
    pub position: Vec2,
    pub radius: f64,
}

/// A detected overlap between two bodies. `overlap > 0` means they are
/// colliding; `a`/`b` are each emitted at most once per unordered pair.
#[derive(Debug, Clone, Copy)]
pub struct Collision<Id> {
    pub a: Id,
    pub b: Id,
    pub overlap: f64,
}

/// Find every colliding pair among `bodies`, using a quadtree to limit the
/// candidate set to nodes within `max(width, height) + min_spacing` of one
/// another (approximated here as twice the largest radius plus spacing).
pub fn detect_collisions<Id: Copy + PartialEq>(
    bodies: &[Body<Id>],
    min_spacing: f64,
) -> Vec<Collision<Id>> {
    if bodies.len() < 2 {
        return Vec::new();
    }

    let boundary = Rect::bounding(bodies.iter().map(|b| b.position), min_spacing.max(1.0) + 10.0);
    let mut tree = Quadtree::new(boundary, DEFAULT_CAPACITY);
    for (i, b) in bodies.iter().enumerate() {
        tree.insert(b.position, i);
    }

    let max_radius = bodies.iter().fold(0.0_f64, |m, b| m.max(b.radius));
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (i, body) in bodies.iter().enumerate() {
        let search_radius = body.radius + max_radius + min_spacing;
        for (_, j) in tree.query_radius(body.position, search_radius) {
            if j <= i {
                continue;
            }
            let key = (i, j);
            if !seen.insert(key) {
                continue;
            }
            let other = &bodies[j];
            let dist = body.position.distance(other.position);
            let min_dist = body.radius + other.radius + min_spacing;
            let overlap = min_dist - dist;
            if overlap > 0.0 {
                out.push(Collision {
                    a: body.id,
                    b: other.id,
                    overlap,
                });
            }
        }
    }

    out
}

/// Computes and applies repulsion displacement for one resolution pass.
/// Returns the updated position map.
fn apply_collision_forces<Id: Copy + Eq + std::hash::Hash>(
    bodies: &[Body<Id>],
    collisions: &[Collision<Id>],
    strength: f64,
    alpha: f64,
    rng: &mut impl Rng,
) -> HashMap<Id, Vec2> {
    let mut deltas: HashMap<Id, Vec2> = HashMap::new();
    let position_of: HashMap<Id, Vec2> = bodies.iter().map(|b| (b.id, b.position)).collect();

    for c in collisions {
        let pa = position_of[&c.a];
        let pb = position_of[&c.b];
        let diff = pb - pa;
        let dist = diff.length();
        let direction = if dist < MIN_DISTANCE {
            let angle = rng.random_range(0.0..std::f64::consts::TAU);
            Vec2::from_polar(1.0, angle)
        } else {
            diff * (1.0 / dist)
        };

        let magnitude = strength * c.overlap * alpha;
        let push = direction * (magnitude / 2.0);
        *deltas.entry(c.a).or_insert(Vec2::ZERO) -= push;
        *deltas.entry(c.b).or_insert(Vec2::ZERO) += push;
    }

    let mut positions = position_of;
    for (id, delta) in deltas {
        if let Some(p) = positions.get_mut(&id) {
            *p += delta;
        }
    }
    positions
}

/// Default collision-resolver strength (§8 testable property 2).
pub const DEFAULT_STRENGTH: f64 = 0.7;
/// Default minimum spacing (§8 testable property 2).
pub const DEFAULT_MIN_SPACING: f64 = 20.0;

/// Outcome of [`resolve_collisions`].
#[derive(Debug, Clone, Copy)]
pub struct CollisionReport {
    /// Number of resolution passes performed.
    pub iterations: u32,
    /// `true` iff no overlaps remained when the loop exited (i.e. it did
    /// not exhaust `max_iters`).
    pub stabilized: bool,
}

/// Iteratively resolve collisions among `bodies` (radii fixed, positions
/// taken from `positions`), writing resolved positions back into
/// `positions`. At each pass: rebuild bounds from `positions`, detect
/// collisions, exit if none remain; otherwise apply forces scaled by
/// `alpha`, multiply `alpha` by 0.9, and repeat.
pub fn resolve_collisions<Id: Copy + Eq + std::hash::Hash>(
    ids: &[Id],
    radii: &HashMap<Id, f64>,
    positions: &mut HashMap<Id, Vec2>,
    min_spacing: f64,
    strength: f64,
    max_iters: u32,
    mut alpha: f64,
    rng: &mut impl Rng,
) -> CollisionReport {
    let mut iterations = 0;
    let mut stabilized = false;

    for _ in 0..max_iters {
        let bodies: Vec<Body<Id>> = ids
            .iter()
            .filter_map(|&id| {
                Some(Body {
                    id,
                    position: *positions.get(&id)?,
                    radius: *radii.get(&id)?,
                })
            })
            .collect();

        let collisions = detect_collisions(&bodies, min_spacing);
        iterations += 1;

        if collisions.is_empty() {
            stabilized = true;
            break;
        }

        let resolved = apply_collision_forces(&bodies, &collisions, strength, alpha, rng);
        for (id, pos) in resolved {
            positions.insert(id, pos);
        }
        alpha *= 0.9;
    }

    CollisionReport {
        iterations,
        stabilized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn no_collisions_among_far_apart_nodes() {
        let bodies = vec![
            Body {
                id: "a",
                position: Vec2::new(0.0, 0.0),
                radius: 10.0,
            },
            Body {
                id: "b",
                position: Vec2::new(1000.0, 0.0),
                radius: 10.0,
            },
        ];
        assert!(detect_collisions(&bodies, 20.0).is_empty());
    }

    #[test]
    fn overlap_magnitude_matches_spec_formula() {
        let bodies = vec![
            Body {
                id: "a",
                position: Vec2::new(0.0, 0.0),
                radius: 50.0,
            },
            Body {
                id: "b",
                position: Vec2::new(60.0, 0.0),
                radius: 50.0,
            },
        ];
        let collisions = detect_collisions(&bodies, 20.0);
        assert_eq!(collisions.len(), 1);
        // radius(A) + radius(B) + min_spacing - dist = 50+50+20-60 = 60
        assert!((collisions[0].overlap - 60.0).abs() < 1e-9);
    }

    #[test]
    fn s4_collision_resolution_scenario() {
        let ids = ["a", "b"];
        let mut radii = HashMap::new();
        radii.insert("a", 50.0);
        radii.insert("b", 50.0);
        let mut positions = HashMap::new();
        positions.insert("a", Vec2::new(0.0, 0.0));
        positions.insert("b", Vec2::new(60.0, 0.0));

        let mut rng = StdRng::seed_from_u64(7);
        let report = resolve_collisions(
            &ids,
            &radii,
            &mut positions,
            DEFAULT_MIN_SPACING,
            DEFAULT_STRENGTH,
            300,
            1.0,
            &mut rng,
        );

        assert!(report.stabilized);
        let dist = positions[&"a"].distance(positions[&"b"]);
        assert!(dist >= 119.9, "dist was {dist}");
    }

    #[test]
    fn node_count_invariant() {
        let ids = ["a", "b", "c"];
        let mut radii = HashMap::new();
        let mut positions = HashMap::new();
        for (i, id) in ids.iter().enumerate() {
            radii.insert(*id, 30.0);
            positions.insert(*id, Vec2::new(i as f64 * 10.0, 0.0));
        }
        let mut rng = StdRng::seed_from_u64(1);
        resolve_collisions(
            &ids,
            &radii,
            &mut positions,
            DEFAULT_MIN_SPACING,
            DEFAULT_STRENGTH,
            50,
            1.0,
            &mut rng,
        );
        assert_eq!(positions.len(), 3);
    }

    #[test]
    fn coincident_points_resolved_via_random_jitter() {
        let ids = ["a", "b"];
        let mut radii = HashMap::new();
        radii.insert("a", 20.0);
        radii.insert("b", 20.0);
        let mut positions = HashMap::new();
        positions.insert("a", Vec2::new(0.0, 0.0));
        positions.insert("b", Vec2::new(0.0, 0.0));

        let mut rng = StdRng::seed_from_u64(42);
        let report = resolve_collisions(
            &ids, &radii, &mut positions, 10.0, 0.7, 500, 1.0, &mut rng,
        );
        assert!(report.stabilized);
        assert!(positions[&"a"].distance(positions[&"b"]) > 0.0);
    }
}
