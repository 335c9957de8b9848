//! Barnes-Hut tree: a quadtree augmented with center-of-mass and total mass
//! per quadrant, for O(n log n) repulsion approximation.
//!
//! Rebuilt from scratch every force-simulation tick that uses Barnes-Hut
//! (see [`crate::force::ForceSimulation`]); nodes are never mutated in
//! place across ticks.

use crate::geometry::{Rect, Vec2};

/// Below this distance a quadrant's contribution to a body is skipped
/// entirely (self-interaction / near-singular).
pub const MIN_DISTANCE: f64 = 0.01;

/// Default Barnes-Hut opening-angle criterion.
pub const DEFAULT_THETA: f64 = 0.5;

/// Padding added to the bounding box of all bodies when building the tree.
pub const BOUNDARY_PADDING: f64 = 100.0;

/// A single body fed into the tree: position and mass.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub position: Vec2,
    pub mass: f64,
}

enum Cell {
    Empty,
    Leaf(Body),
    Internal {
        children: Box<[BhNode; 4]>,
        total_mass: f64,
        center_of_mass: Vec2,
    },
}

struct BhNode {
    boundary: Rect,
    cell: Cell,
}

impl BhNode {
    fn new(boundary: Rect) -> Self {
        Self {
            boundary,
            cell: Cell::Empty,
        }
    }

    fn insert(&mut self, body: Body) {
        match &mut self.cell {
            Cell::Empty => {
                self.cell = Cell::Leaf(body);
            }
            Cell::Leaf(existing) => {
                let existing = *existing;
                let quads = self.boundary.subdivide();
                let mut children: [BhNode; 4] = [
                    BhNode::new(quads[0]),
                    BhNode::new(quads[1]),
                    BhNode::new(quads[2]),
                    BhNode::new(quads[3]),
                ];
                Self::insert_into(&mut children, existing);
                Self::insert_into(&mut children, body);
                let (total_mass, center_of_mass) = Self::weighted_center(&children);
                self.cell = Cell::Internal {
                    children: Box::new(children),
                    total_mass,
                    center_of_mass,
                };
            }
            Cell::Internal {
                children,
                total_mass,
                center_of_mass,
            } => {
                Self::insert_into(children, body);
                let (mass, com) = Self::weighted_center(children);
                *total_mass = mass;
                *center_of_mass = com;
            }
        }
    }

    fn insert_into(children: &mut [BhNode; 4], body: Body) {
        for child in children.iter_mut() {
            if child.boundary.contains(body.position) {
                child.insert(body);
                return;
            }
        }
        // Degenerate: exactly on a shared boundary line. Put it in the
        // first child whose boundary it's closest to rather than drop it.
        children[0].insert(body);
    }

    fn weighted_center(children: &[BhNode; 4]) -> (f64, Vec2) {
        let mut mass = 0.0;
        let mut weighted = Vec2::ZERO;
        for child in children.iter() {
            let (m, c) = child.mass_and_center();
            mass += m;
            weighted += c * m;
        }
        if mass > 0.0 {
            (mass, weighted * (1.0 / mass))
        } else {
            (0.0, Vec2::ZERO)
        }
    }

    fn mass_and_center(&self) -> (f64, Vec2) {
        match &self.cell {
            Cell::Empty => (0.0, Vec2::ZERO),
            Cell::Leaf(b) => (b.mass, b.position),
            Cell::Internal {
                total_mass,
                center_of_mass,
                ..
            } => (*total_mass, *center_of_mass),
        }
    }

    /// Accumulate the repulsion contribution of this quadrant on `target`
    /// into `force`, recursing per the θ-criterion.
    fn accumulate_repulsion(&self, target: Vec2, strength: f64, theta: f64, force: &mut Vec2) {
        match &self.cell {
            Cell::Empty => {}
            Cell::Leaf(b) => {
                Self::add_point_force(target, b.position, b.mass, strength, force);
            }
            Cell::Internal {
                children,
                total_mass,
                center_of_mass,
            } => {
                let d = target.distance(*center_of_mass);
                if d < MIN_DISTANCE {
                    return;
                }
                let side = self.boundary.half_size * 2.0;
                if side / d < theta {
                    Self::add_point_force(target, *center_of_mass, *total_mass, strength, force);
                } else {
                    for child in children.iter() {
                        child.accumulate_repulsion(target, strength, theta, force);
                    }
                }
            }
        }
    }

    fn add_point_force(target: Vec2, source: Vec2, mass: f64, strength: f64, force: &mut Vec2) {
        let delta = target - source;
        let d = delta.length();
        if d < MIN_DISTANCE {
            return;
        }
        let magnitude = strength * mass / (d * d);
        *force += delta.normalized_or(Vec2::ZERO) * magnitude;
    }
}

/// A Barnes-Hut quadtree built fresh from a set of bodies.
pub struct BarnesHutTree {
    root: BhNode,
}

impl BarnesHutTree {
    /// Build a tree whose boundary is the bounding box of `bodies`, padded
    /// by [`BOUNDARY_PADDING`] on every side.
    pub fn build(bodies: &[Body]) -> Self {
        let boundary = Rect::bounding(bodies.iter().map(|b| b.position), BOUNDARY_PADDING);
        let mut root = BhNode::new(boundary);
        for &body in bodies {
            root.insert(body);
        }
        Self { root }
    }

    /// The Coulomb-style repulsion force exerted on a body at `position`
    /// with the given `strength` (`k`) and opening angle `theta`.
    pub fn repulsion_at(&self, position: Vec2, strength: f64, theta: f64) -> Vec2 {
        let mut force = Vec2::ZERO;
        self.root
            .accumulate_repulsion(position, strength, theta, &mut force);
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_body_no_self_force() {
        let bodies = [Body {
            position: Vec2::new(0.0, 0.0),
            mass: 1.0,
        }];
        let tree = BarnesHutTree::build(&bodies);
        let f = tree.repulsion_at(Vec2::new(0.0, 0.0), 1.0, DEFAULT_THETA);
        assert_eq!(f.length(), 0.0);
    }

    #[test]
    fn repulsion_pushes_away_from_mass() {
        let bodies = [Body {
            position: Vec2::new(10.0, 0.0),
            mass: 1.0,
        }];
        let tree = BarnesHutTree::build(&bodies);
        let f = tree.repulsion_at(Vec2::new(0.0, 0.0), 100.0, DEFAULT_THETA);
        // Repulsion pushes the origin away from the mass at (10, 0): force
        // should point in the -x direction.
        assert!(f.x < 0.0);
        assert!(f.y.abs() < 1e-9);
    }

    #[test]
    fn large_theta_approximates_cluster_as_one_body() {
        let mut bodies = Vec::new();
        for i in 0..40 {
            bodies.push(Body {
                position: Vec2::new(1000.0 + i as f64 * 0.01, 1000.0),
                mass: 1.0,
            });
        }
        let tree = BarnesHutTree::build(&bodies);
        let f = tree.repulsion_at(Vec2::new(0.0, 0.0), 1.0, 10.0);
        assert!(f.length() > 0.0);
    }
}
