//! Velocity-Verlet-like force simulation: repulsion (direct or Barnes-Hut),
//! spring attraction, central gravity, collision forces, damping and
//! adaptive cooling.

use crate::barnes_hut::{BarnesHutTree, Body as BhBody, DEFAULT_THETA};
use crate::collision::{self, Body as CollisionBody};
use crate::geometry::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node count above which Barnes-Hut activates (if enabled).
pub const BARNES_HUT_THRESHOLD: usize = 50;

/// Below this alpha the simulation is considered settled.
pub const DEFAULT_ALPHA_MIN: f64 = 0.001;

/// Displacement-per-tick bands for adaptive cooling.
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 0.5;

/// The bound beyond which a position is clamped and reported as diverged.
pub const DIVERGENCE_BOUND: f64 = 1e8;

/// Configuration for one [`ForceSimulation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceConfig {
    pub repulsion_strength: f64,
    pub attraction_strength: f64,
    pub ideal_edge_length: f64,
    pub center_gravity: f64,
    pub damping: f64,
    pub use_barnes_hut: bool,
    pub barnes_hut_theta: f64,
    pub min_spacing: f64,
    pub collision_strength: f64,
    pub alpha_decay: f64,
    pub alpha_min: f64,
    pub movement_threshold: f64,
    /// Enable the adaptive cooling schedule (§4.5); when `false`, alpha
    /// decays at a fixed rate of `alpha_decay` every tick.
    pub adaptive_cooling: bool,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: 1000.0,
            attraction_strength: 0.1,
            ideal_edge_length: 100.0,
            center_gravity: 0.05,
            damping: 0.9,
            use_barnes_hut: true,
            barnes_hut_theta: DEFAULT_THETA,
            min_spacing: collision::DEFAULT_MIN_SPACING,
            collision_strength: collision::DEFAULT_STRENGTH,
            alpha_decay: 0.005,
            alpha_min: DEFAULT_ALPHA_MIN,
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
            adaptive_cooling: true,
        }
    }
}

/// A node as tracked internally by the force simulation.
#[derive(Debug, Clone)]
struct SimNode {
    pos: Vec2,
    vel: Vec2,
    pin: Option<Vec2>,
    mass: f64,
    radius: f64,
}

/// An undirected (for force purposes) edge between two node ids.
#[derive(Debug, Clone, Copy)]
pub struct SimEdge<Id> {
    pub source: Id,
    pub target: Id,
}

/// Outcome of one [`ForceSimulation::tick`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickReport {
    /// Whether the simulation is still running after this tick (mirrors
    /// the spec's `tick() -> bool`).
    pub running: bool,
    pub alpha: f64,
    /// How many node positions were clamped for exceeding
    /// [`DIVERGENCE_BOUND`] this tick.
    pub diverged: usize,
}

/// Velocity-Verlet-like force simulation over a fixed set of nodes and
/// edges.
pub struct ForceSimulation<Id: Copy + Eq + std::hash::Hash> {
    config: ForceConfig,
    nodes: HashMap<Id, SimNode>,
    order: Vec<Id>,
    edges: Vec<SimEdge<Id>>,
    alpha: f64,
    running: bool,
}

impl<Id: Copy + Eq + std::hash::Hash> ForceSimulation<Id> {
    /// Create a new simulation from node ids with initial `(position,
    /// mass, radius)` and an edge list. Starts at `alpha = 1.0`.
    pub fn new(
        nodes: impl IntoIterator<Item = (Id, Vec2, f64, f64)>,
        edges: Vec<SimEdge<Id>>,
        config: ForceConfig,
    ) -> Self {
        let mut order = Vec::new();
        let mut map = HashMap::new();
        for (id, pos, mass, radius) in nodes {
            order.push(id);
            map.insert(
                id,
                SimNode {
                    pos,
                    vel: Vec2::ZERO,
                    pin: None,
                    mass,
                    radius,
                },
            );
        }
        Self {
            config,
            nodes: map,
            order,
            edges,
            alpha: 1.0,
            running: true,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ForceConfig) {
        self.config = config;
    }

    /// `true` iff Barnes-Hut is active this tick: `use_barnes_hut` is
    /// enabled in the config and the node count exceeds
    /// [`BARNES_HUT_THRESHOLD`].
    pub fn is_barnes_hut_active(&self) -> bool {
        self.config.use_barnes_hut && self.order.len() > BARNES_HUT_THRESHOLD
    }

    pub fn positions(&self) -> HashMap<Id, Vec2> {
        self.order.iter().map(|id| (*id, self.nodes[id].pos)).collect()
    }

    pub fn position(&self, id: &Id) -> Option<Vec2> {
        self.nodes.get(id).map(|n| n.pos)
    }

    /// Pin `id` at `(x, y)` and reheat alpha: `alpha = min(1, max(alpha,
    /// alpha + 0.3))`.
    pub fn on_drag_start(&mut self, id: Id, pos: Vec2) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.pin = Some(pos);
            node.vel = Vec2::ZERO;
        }
        self.reheat_to_at_least(self.alpha + 0.3);
        self.running = true;
    }

    /// Update the pin for an in-progress drag. Reheats by 0.1 if alpha has
    /// cooled below 0.3.
    pub fn on_drag(&mut self, id: Id, pos: Vec2) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.pin = Some(pos);
        }
        if self.alpha < 0.3 {
            self.reheat_to_at_least(self.alpha + 0.1);
        }
        self.running = true;
    }

    /// Unpin `id` and reheat by 0.5 so neighbours can rearrange.
    pub fn on_drag_end(&mut self, id: Id) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.pin = None;
        }
        self.reheat_to_at_least(self.alpha + 0.5);
        self.running = true;
    }

    fn reheat_to_at_least(&mut self, target: f64) {
        self.alpha = self.alpha.max(target).min(1.0);
    }

    /// Run one tick. Returns `false` (via [`TickReport::running`]) without
    /// doing any work once alpha has cooled below `alpha_min`.
    pub fn tick(&mut self, rng: &mut impl Rng) -> TickReport {
        if self.alpha < self.config.alpha_min {
            self.running = false;
            return TickReport {
                running: false,
                alpha: self.alpha,
                diverged: 0,
            };
        }

        let previous: HashMap<Id, Vec2> = if self.config.adaptive_cooling {
            self.order.iter().map(|id| (*id, self.nodes[id].pos)).collect()
        } else {
            HashMap::new()
        };

        self.apply_repulsion();
        self.apply_springs();
        self.apply_gravity();
        self.apply_collisions(rng);

        let diverged = self.integrate();
        self.cool(&previous);

        TickReport {
            running: true,
            alpha: self.alpha,
            diverged,
        }
    }

    fn apply_repulsion(&mut self) {
        let k = self.config.repulsion_strength * self.alpha;
        if k == 0.0 {
            return;
        }

        if self.is_barnes_hut_active() {
            let bodies: Vec<BhBody> = self
                .order
                .iter()
                .map(|id| {
                    let n = &self.nodes[id];
                    BhBody {
                        position: n.pos,
                        mass: n.mass,
                    }
                })
                .collect();
            let tree = BarnesHutTree::build(&bodies);
            for id in &self.order {
                let pos = self.nodes[id].pos;
                let force = tree.repulsion_at(pos, k, self.config.barnes_hut_theta);
                let node = self.nodes.get_mut(id).unwrap();
                node.vel += force * (1.0 / node.mass);
            }
        } else {
            let ids = self.order.clone();
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    let (pi, mi) = {
                        let n = &self.nodes[&ids[i]];
                        (n.pos, n.mass)
                    };
                    let (pj, mj) = {
                        let n = &self.nodes[&ids[j]];
                        (n.pos, n.mass)
                    };
                    let delta = pi - pj;
                    let d = delta.length().max(crate::barnes_hut::MIN_DISTANCE);
                    let magnitude = k * mi * mj / (d * d);
                    let dir = delta.normalized_or(Vec2::new(1.0, 0.0));
                    let force = dir * magnitude;
                    self.nodes.get_mut(&ids[i]).unwrap().vel += force * (1.0 / mi);
                    self.nodes.get_mut(&ids[j]).unwrap().vel -= force * (1.0 / mj);
                }
            }
        }
    }

    fn apply_springs(&mut self) {
        let k = self.config.attraction_strength * self.alpha;
        let ideal = self.config.ideal_edge_length;
        for edge in self.edges.clone() {
            let (Some(&SimNode { pos: pa, mass: ma, .. }), Some(&SimNode { pos: pb, mass: mb, .. })) =
                (self.nodes.get(&edge.source), self.nodes.get(&edge.target))
            else {
                continue;
            };
            let delta = pb - pa;
            let d = delta.length().max(1e-6);
            let magnitude = k * (d - ideal);
            let dir = delta.normalized_or(Vec2::new(1.0, 0.0));
            let force = dir * magnitude;
            if let Some(n) = self.nodes.get_mut(&edge.source) {
                n.vel += force * (0.5 / ma);
            }
            if let Some(n) = self.nodes.get_mut(&edge.target) {
                n.vel -= force * (0.5 / mb);
            }
        }
    }

    // Central gravity is mass-normalized like repulsion and springs above,
    // so a heavier node accelerates toward the origin more slowly than a
    // light one at the same distance: `gravity_scenario_pulls_light_nodes_harder`
    // pins this.
    fn apply_gravity(&mut self) {
        let g = self.config.center_gravity * self.alpha;
        for node in self.nodes.values_mut() {
            node.vel += node.pos * (-g / node.mass);
        }
    }

    fn apply_collisions(&mut self, rng: &mut impl Rng) {
        if self.config.collision_strength == 0.0 {
            return;
        }
        let bodies: Vec<CollisionBody<Id>> = self
            .order
            .iter()
            .map(|id| {
                let n = &self.nodes[id];
                CollisionBody {
                    id: *id,
                    position: n.pos,
                    radius: n.radius,
                }
            })
            .collect();
        let collisions = collision::detect_collisions(&bodies, self.config.min_spacing);
        for c in collisions {
            let pa = self.nodes[&c.a].pos;
            let pb = self.nodes[&c.b].pos;
            let diff = pb - pa;
            let dist = diff.length();
            let dir = if dist < collision::MIN_DISTANCE {
                let angle = rng.random_range(0.0..std::f64::consts::TAU);
                Vec2::from_polar(1.0, angle)
            } else {
                diff * (1.0 / dist)
            };
            let magnitude = self.config.collision_strength * c.overlap * self.alpha;
            let push = dir * (magnitude / 2.0);
            if let Some(n) = self.nodes.get_mut(&c.a) {
                n.vel -= push * (1.0 / n.mass);
            }
            if let Some(n) = self.nodes.get_mut(&c.b) {
                n.vel += push * (1.0 / n.mass);
            }
        }
    }

    /// Damp, pin-snap, and advance every node. Returns the number of nodes
    /// clamped for exceeding [`DIVERGENCE_BOUND`].
    fn integrate(&mut self) -> usize {
        let damping = self.config.damping;
        let mut diverged = 0;
        for node in self.nodes.values_mut() {
            if let Some(pin) = node.pin {
                node.pos = pin;
                node.vel = Vec2::ZERO;
                continue;
            }
            node.vel = node.vel * damping;
            node.pos += node.vel;

            if node.pos.length() > DIVERGENCE_BOUND || !node.pos.is_finite() {
                let clamped = node
                    .pos
                    .normalized_or(Vec2::new(1.0, 0.0))
                    * DIVERGENCE_BOUND;
                node.pos = clamped;
                node.vel = Vec2::ZERO;
                diverged += 1;
            }
        }
        if diverged > 0 {
            tracing::warn!(count = diverged, "simulation diverged, clamped positions");
        }
        diverged
    }

    fn cool(&mut self, previous: &HashMap<Id, Vec2>) {
        let decay = if self.config.adaptive_cooling {
            let mut total = 0.0;
            let mut count = 0;
            for id in &self.order {
                if let Some(&prev) = previous.get(id) {
                    total += self.nodes[id].pos.distance(prev);
                    count += 1;
                }
            }
            let avg = if count > 0 { total / count as f64 } else { 0.0 };
            if avg < self.config.movement_threshold {
                2.0 * self.config.alpha_decay
            } else if avg > 5.0 * self.config.movement_threshold {
                0.5 * self.config.alpha_decay
            } else {
                self.config.alpha_decay
            }
        } else {
            self.config.alpha_decay
        };

        self.alpha = (self.alpha * (1.0 - decay)).max(0.0);
        tracing::trace!(alpha = self.alpha, "force tick cooled");
    }
}
