//! Unified facade: algorithm dispatch, distance-parameter mapping,
//! transition orchestration and selection preservation (§4.10).

use crate::animator::{Animator, Easing, Frame};
use crate::circular::{self, CircleAssignment, CircularConfig};
use crate::force::{ForceConfig, ForceSimulation, SimEdge, TickReport};
use crate::geometry::Vec2;
use crate::grid::{self, GridConfig, GridNodeKey};
use crate::hierarchical::{self, HierarchicalConfig, LayerAssignment, NodeExtent};
use crate::{validate_graph, LayoutEdge, LayoutNode, Positions, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// The four recognised layout strategies (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Force,
    Hierarchical,
    Circular,
    Grid,
}

impl Algorithm {
    fn parse(tag: &str) -> Option<Algorithm> {
        match tag {
            "force" => Some(Algorithm::Force),
            "hierarchical" => Some(Algorithm::Hierarchical),
            "circular" => Some(Algorithm::Circular),
            "grid" => Some(Algorithm::Grid),
            _ => None,
        }
    }
}

/// Per-call layout configuration (§6). `distance`, if present, overrides
/// the algorithm-specific knobs listed in §4.10's mapping table before the
/// chosen config is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub algorithm: String,
    pub distance: Option<u32>,
    pub force: Option<ForceConfig>,
    pub hierarchical: Option<HierarchicalConfig>,
    pub circular: Option<CircularConfig>,
    pub grid: Option<GridConfig>,
}

/// Engine-wide settings independent of any one layout call (§6).
///
/// `rng_seed` is `None` by default, which seeds the force simulation's
/// jitter source (used only for the collision resolver's degenerate
/// coincident-point case) from OS entropy on every `force` run. Set it to
/// `Some(seed)` for reproducible output across runs, e.g. in property
/// tests or recorded demos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub animation_duration_ms: u64,
    pub preserve_selection: bool,
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            animation_duration_ms: crate::animator::DEFAULT_DURATION_MS,
            preserve_selection: true,
            rng_seed: None,
        }
    }
}

/// A force-simulation tick's diagnostics, surfaced to callers who want to
/// observe divergence without an error (§7).
pub type StepReport = TickReport;

/// Opaque node identity for the internal spatial/force algorithms, which
/// are generic over a `Copy` id. Stable only for the lifetime of one
/// [`Engine::compute_layout`]/retained-simulation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct NodeId(u32);

struct IdMap {
    index_of: HashMap<String, NodeId>,
    id_of: Vec<String>,
}

impl IdMap {
    fn build(nodes: &[LayoutNode]) -> Self {
        let mut index_of = HashMap::with_capacity(nodes.len());
        let mut id_of = Vec::with_capacity(nodes.len());
        for (i, n) in nodes.iter().enumerate() {
            index_of.insert(n.id.clone(), NodeId(i as u32));
            id_of.push(n.id.clone());
        }
        Self { index_of, id_of }
    }

    fn edges(&self, edges: &[LayoutEdge]) -> Vec<(NodeId, NodeId)> {
        edges
            .iter()
            .filter_map(|e| Some((*self.index_of.get(&e.source)?, *self.index_of.get(&e.target)?)))
            .collect()
    }

    fn external(&self, internal: HashMap<NodeId, Vec2>) -> Positions {
        internal
            .into_iter()
            .map(|(id, pos)| (self.id_of[id.0 as usize].clone(), pos))
            .collect()
    }
}

struct RetainedForce {
    sim: ForceSimulation<NodeId>,
    ids: IdMap,
    rng: StdRng,
}

/// Applies the §4.10 distance mapping to a per-algorithm config.
fn apply_distance(config: &mut LayoutConfig) {
    let Some(d) = config.distance else { return };
    let d = d as f64;
    match Algorithm::parse(&config.algorithm) {
        Some(Algorithm::Force) => {
            let mut f = config.force.take().unwrap_or_default();
            f.ideal_edge_length = d;
            f.min_spacing = 0.2 * d;
            f.repulsion_strength = 10.0 * d;
            config.force = Some(f);
        }
        Some(Algorithm::Hierarchical) => {
            let mut h = config.hierarchical.take().unwrap_or_default();
            h.level_separation = d;
            h.node_separation = 0.5 * d;
            config.hierarchical = Some(h);
        }
        Some(Algorithm::Circular) => {
            let mut c = config.circular.take().unwrap_or_default();
            c.ring_separation = 2.0 * d;
            config.circular = Some(c);
        }
        Some(Algorithm::Grid) => {
            let mut g = config.grid.take().unwrap_or_default();
            g.cell_width = d;
            g.cell_height = d;
            config.grid = Some(g);
        }
        None => {}
    }
}

const MAX_FORCE_ITERATIONS: u32 = 1000;

/// Unified configuration, algorithm dispatch and transition orchestration
/// over one engine instance.
pub struct Engine {
    config: EngineConfig,
    animator: Animator<NodeId>,
    animator_ids: Option<IdMap>,
    selected: HashSet<String>,
    current_algorithm: Option<Algorithm>,
    retained_force: Option<RetainedForce>,
    last_layer_assignments: Option<Vec<LayerAssignment<String>>>,
    last_circle_assignments: Option<Vec<CircleAssignment<String>>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            animator: Animator::new(),
            animator_ids: None,
            selected: HashSet::new(),
            current_algorithm: None,
            retained_force: None,
            last_layer_assignments: None,
            last_circle_assignments: None,
        }
    }

    /// Compute positions for `nodes`/`edges` under `config`, dispatching to
    /// the requested algorithm. Fails fast on an ill-formed graph or an
    /// unrecognised algorithm tag; no engine state changes in that case.
    pub fn compute_layout(
        &mut self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
        config: &LayoutConfig,
    ) -> Result<Positions> {
        validate_graph(nodes, edges)?;
        let algorithm = Algorithm::parse(&config.algorithm)
            .ok_or_else(|| crate::LayoutError::UnknownAlgorithm(config.algorithm.clone()))?;

        let mut config = config.clone();
        apply_distance(&mut config);

        let ids = IdMap::build(nodes);
        self.last_layer_assignments = None;
        self.last_circle_assignments = None;
        let positions = match algorithm {
            Algorithm::Force => self.run_force(nodes, edges, &ids, config.force.unwrap_or_default()),
            Algorithm::Hierarchical => {
                let (positions, layers) =
                    run_hierarchical(nodes, edges, config.hierarchical.unwrap_or_default());
                self.last_layer_assignments = Some(layers);
                positions
            }
            Algorithm::Circular => {
                let (positions, circles) =
                    run_circular(nodes, edges, config.circular.unwrap_or_default());
                self.last_circle_assignments = Some(circles);
                positions
            }
            Algorithm::Grid => run_grid(nodes, config.grid.unwrap_or_default()),
        };

        self.current_algorithm = Some(algorithm);
        Ok(positions)
    }

    /// Per-node layer decisions from the most recent `hierarchical`
    /// layout call (§6 `LayerAssignment`), or `None` if the engine has
    /// not run `hierarchical` most recently.
    pub fn layer_assignments(&self) -> Option<&[LayerAssignment<String>]> {
        self.last_layer_assignments.as_deref()
    }

    /// Per-node ring/distance decisions from the most recent `circular`
    /// layout call (§6 `CircleAssignment`), or `None` if the engine has
    /// not run `circular` most recently.
    pub fn circle_assignments(&self) -> Option<&[CircleAssignment<String>]> {
        self.last_circle_assignments.as_deref()
    }

    fn run_force(
        &mut self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
        ids: &IdMap,
        force_config: ForceConfig,
    ) -> Positions {
        let sim_nodes: Vec<(NodeId, Vec2, f64, f64)> = nodes
            .iter()
            .map(|n| {
                let id = ids.index_of[&n.id];
                (id, Vec2::new(n.x, n.y), n.effective_mass(), n.effective_radius())
            })
            .collect();
        let sim_edges: Vec<SimEdge<NodeId>> = ids
            .edges(edges)
            .into_iter()
            .map(|(source, target)| SimEdge { source, target })
            .collect();

        let mut sim = ForceSimulation::new(sim_nodes, sim_edges, force_config);
        let mut rng = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        for _ in 0..MAX_FORCE_ITERATIONS {
            if !sim.tick(&mut rng).running {
                break;
            }
        }
        let internal = sim.positions();

        self.retained_force = Some(RetainedForce {
            sim,
            ids: IdMap {
                index_of: ids.index_of.clone(),
                id_of: ids.id_of.clone(),
            },
            rng,
        });

        ids.external(internal)
    }

    /// Advance the retained force simulation by one tick, if the engine is
    /// currently set to the `force` algorithm (§1 "single simulation
    /// step"). Returns `None` if there is no retained simulation.
    pub fn tick(&mut self) -> Option<StepReport> {
        let retained = self.retained_force.as_mut()?;
        Some(retained.sim.tick(&mut retained.rng))
    }

    /// Current positions of the retained force simulation, if any.
    pub fn force_positions(&self) -> Option<Positions> {
        let retained = self.retained_force.as_ref()?;
        Some(retained.ids.external(retained.sim.positions()))
    }

    /// Current temperature of the retained force simulation (§1
    /// introspection), or `None` if the engine has not run `force` yet.
    pub fn alpha(&self) -> Option<f64> {
        self.retained_force.as_ref().map(|r| r.sim.alpha())
    }

    /// Whether Barnes-Hut is active in the retained force simulation (§1
    /// introspection), or `None` if the engine has not run `force` yet.
    pub fn is_barnes_hut_active(&self) -> Option<bool> {
        self.retained_force
            .as_ref()
            .map(|r| r.sim.is_barnes_hut_active())
    }

    pub fn on_drag_start(&mut self, node_id: &str, pos: Vec2) {
        if let Some(retained) = self.retained_force.as_mut() {
            if let Some(&id) = retained.ids.index_of.get(node_id) {
                retained.sim.on_drag_start(id, pos);
            }
        }
    }

    pub fn on_drag(&mut self, node_id: &str, pos: Vec2) {
        if let Some(retained) = self.retained_force.as_mut() {
            if let Some(&id) = retained.ids.index_of.get(node_id) {
                retained.sim.on_drag(id, pos);
            }
        }
    }

    pub fn on_drag_end(&mut self, node_id: &str) {
        if let Some(retained) = self.retained_force.as_mut() {
            if let Some(&id) = retained.ids.index_of.get(node_id) {
                retained.sim.on_drag_end(id);
            }
        }
    }

    /// Compute target positions for `config` and start an animated
    /// transition from `from_positions`. Cancels any in-flight animation
    /// first, without calling its completion.
    pub fn transition_to(
        &mut self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
        from_positions: &Positions,
        config: &LayoutConfig,
        now: Instant,
    ) -> Result<()> {
        let target = self.compute_layout(nodes, edges, config)?;
        let ids = IdMap::build(nodes);

        if !self.config.preserve_selection {
            self.selected.clear();
        }

        let from_internal: HashMap<NodeId, Vec2> = nodes
            .iter()
            .filter_map(|n| {
                let id = ids.index_of[&n.id];
                from_positions.get(&n.id).map(|&p| (id, p))
            })
            .collect();
        let to_internal: HashMap<NodeId, Vec2> = nodes
            .iter()
            .map(|n| (ids.index_of[&n.id], target[&n.id]))
            .collect();

        self.animator.animate(
            from_internal,
            to_internal,
            Duration::from_millis(self.config.animation_duration_ms),
            Easing::default(),
            now,
        );
        self.animator_ids = Some(ids);
        Ok(())
    }

    /// Advance the in-flight transition to `now`. Returns `None` if
    /// nothing is animating.
    pub fn tick_animation(&mut self, now: Instant) -> Option<(Positions, bool)> {
        let ids = self.animator_ids.as_ref()?;
        let Frame { positions, done } = self.animator.tick(now)?;
        let external = ids.external(positions);
        if done {
            self.animator_ids = None;
        }
        Some((external, done))
    }

    pub fn stop_animation(&mut self) {
        self.animator.stop();
        self.animator_ids = None;
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_running()
    }

    pub fn current_algorithm(&self) -> Option<Algorithm> {
        self.current_algorithm
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.config.animation_duration_ms)
    }

    pub fn set_animation_duration(&mut self, duration: Duration) {
        self.config.animation_duration_ms = duration.as_millis() as u64;
    }

    /// Replace the opaque selected-id set. Whether this selection survives
    /// a subsequent [`Engine::transition_to`] is governed by
    /// [`EngineConfig::preserve_selection`]; `set_selected` itself always
    /// takes effect immediately.
    pub fn set_selected(&mut self, ids: impl IntoIterator<Item = String>) {
        self.selected = ids.into_iter().collect();
    }

    pub fn get_selected(&self) -> &HashSet<String> {
        &self.selected
    }
}

fn run_hierarchical(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    config: HierarchicalConfig,
) -> (Positions, Vec<LayerAssignment<String>>) {
    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edge_pairs: Vec<(&str, &str)> = edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();

    let layers = hierarchical::assign_layers(&ids, &edge_pairs);
    let ordered = hierarchical::reduce_crossings(&ids, &edge_pairs, &layers);
    let extents: HashMap<&str, NodeExtent> = nodes
        .iter()
        .map(|n| {
            (
                n.id.as_str(),
                NodeExtent {
                    width: n.width.unwrap_or(1.0),
                    height: n.height.unwrap_or(1.0),
                },
            )
        })
        .collect();
    let coords = hierarchical::assign_coordinates(&ordered, &extents, &config);

    let positions = coords.into_iter().map(|(id, pos)| (id.to_string(), pos)).collect();
    let assignments = hierarchical::layer_assignments(&layers)
        .into_iter()
        .map(|a| LayerAssignment {
            node_id: a.node_id.to_string(),
            layer: a.layer,
        })
        .collect();
    (positions, assignments)
}

fn run_circular(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    config: CircularConfig,
) -> (Positions, Vec<CircleAssignment<String>>) {
    if nodes.is_empty() {
        return (Positions::new(), Vec::new());
    }
    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edge_pairs: Vec<(&str, &str)> = edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();

    let center = circular::select_center(&ids, &edge_pairs).expect("nodes non-empty");
    let rings = circular::assign_rings(&ids, &edge_pairs, center);
    let ordered = circular::order_rings(&ids, &edge_pairs, &rings, center);
    let coords = circular::assign_coordinates(&ordered, &config);

    let positions = coords.into_iter().map(|(id, pos)| (id.to_string(), pos)).collect();
    let assignments = circular::circle_assignments(&rings, config.ring_separation)
        .into_iter()
        .map(|a| CircleAssignment {
            node_id: a.node_id.to_string(),
            circle: a.circle,
            distance: a.distance,
        })
        .collect();
    (positions, assignments)
}

fn run_grid(nodes: &[LayoutNode], config: GridConfig) -> Positions {
    let keys: Vec<GridNodeKey<'_, &str>> = nodes
        .iter()
        .map(|n| GridNodeKey {
            id: n.id.as_str(),
            node_type: n.node_type.as_deref().unwrap_or(""),
            priority: n.priority.unwrap_or(0),
        })
        .collect();
    let ordered = grid::order_nodes(&keys, config.sort);
    let coords = grid::assign_coordinates(&ordered, &config);
    coords.into_iter().map(|(id, pos)| (id.to_string(), pos)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            x: 0.0,
            y: 0.0,
            width: Some(100.0),
            height: Some(100.0),
            radius: None,
            mass: None,
            node_type: None,
            priority: None,
        }
    }

    #[test]
    fn s1_grid_scenario_via_engine() {
        let nodes: Vec<LayoutNode> = (0..5).map(|i| node(&format!("n{i}"))).collect();
        let mut engine = Engine::default();
        let config = LayoutConfig {
            algorithm: "grid".into(),
            grid: Some(GridConfig {
                columns: None,
                cell_width: 150.0,
                cell_height: 100.0,
                sort: grid::GridSort::None,
            }),
            ..LayoutConfig::default()
        };
        let positions = engine.compute_layout(&nodes, &[], &config).unwrap();
        assert_eq!(positions.len(), 5);
        assert_eq!(engine.current_algorithm(), Some(Algorithm::Grid));
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let nodes = vec![node("a")];
        let mut engine = Engine::default();
        let config = LayoutConfig {
            algorithm: "radial-tree".into(),
            ..LayoutConfig::default()
        };
        assert!(engine.compute_layout(&nodes, &[], &config).is_err());
    }

    #[test]
    fn invalid_graph_is_rejected_before_state_changes() {
        let nodes = vec![node("a"), node("a")];
        let mut engine = Engine::default();
        let config = LayoutConfig {
            algorithm: "grid".into(),
            ..LayoutConfig::default()
        };
        assert!(engine.compute_layout(&nodes, &[], &config).is_err());
        assert!(engine.current_algorithm().is_none());
    }

    #[test]
    fn distance_mapping_drives_force_knobs() {
        let mut config = LayoutConfig {
            algorithm: "force".into(),
            distance: Some(200),
            ..LayoutConfig::default()
        };
        apply_distance(&mut config);
        let f = config.force.unwrap();
        assert_eq!(f.ideal_edge_length, 200.0);
        assert_eq!(f.min_spacing, 40.0);
        assert_eq!(f.repulsion_strength, 2000.0);
    }

    #[test]
    fn selection_is_preserved_when_configured() {
        let mut engine = Engine::default();
        engine.set_selected(["a".to_string(), "b".to_string()]);
        assert_eq!(engine.get_selected().len(), 2);
    }

    #[test]
    fn seeded_engine_config_is_reproducible() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let config = LayoutConfig {
            algorithm: "force".into(),
            force: Some(ForceConfig::default()),
            ..LayoutConfig::default()
        };

        let mut e1 = Engine::new(EngineConfig {
            rng_seed: Some(42),
            ..EngineConfig::default()
        });
        let p1 = e1.compute_layout(&nodes, &[], &config).unwrap();

        let mut e2 = Engine::new(EngineConfig {
            rng_seed: Some(42),
            ..EngineConfig::default()
        });
        let p2 = e2.compute_layout(&nodes, &[], &config).unwrap();

        for id in ["a", "b", "c"] {
            assert_eq!(p1[id], p2[id]);
        }
    }

    #[test]
    fn hierarchical_exposes_layer_assignments() {
        let nodes = vec![node("A"), node("B"), node("C")];
        let edges = vec![
            LayoutEdge {
                source: "A".into(),
                target: "B".into(),
                weight: None,
            },
            LayoutEdge {
                source: "A".into(),
                target: "C".into(),
                weight: None,
            },
        ];
        let mut engine = Engine::default();
        let config = LayoutConfig {
            algorithm: "hierarchical".into(),
            ..LayoutConfig::default()
        };
        engine.compute_layout(&nodes, &edges, &config).unwrap();

        let assignments = engine.layer_assignments().unwrap();
        assert_eq!(assignments.len(), 3);
        let layer_of = |id: &str| {
            assignments
                .iter()
                .find(|a| a.node_id == id)
                .unwrap()
                .layer
        };
        assert_eq!(layer_of("A"), 0);
        assert_eq!(layer_of("B"), 1);
        assert_eq!(layer_of("C"), 1);

        // Switching to a different algorithm clears the stale assignments.
        let grid_config = LayoutConfig {
            algorithm: "grid".into(),
            ..LayoutConfig::default()
        };
        engine.compute_layout(&nodes, &[], &grid_config).unwrap();
        assert!(engine.layer_assignments().is_none());
    }

    #[test]
    fn circular_exposes_circle_assignments() {
        let nodes = vec![node("H"), node("s1"), node("s2")];
        let edges = vec![
            LayoutEdge {
                source: "H".into(),
                target: "s1".into(),
                weight: None,
            },
            LayoutEdge {
                source: "H".into(),
                target: "s2".into(),
                weight: None,
            },
        ];
        let mut engine = Engine::default();
        let config = LayoutConfig {
            algorithm: "circular".into(),
            circular: Some(CircularConfig {
                ring_separation: 100.0,
                ..CircularConfig::default()
            }),
            ..LayoutConfig::default()
        };
        engine.compute_layout(&nodes, &edges, &config).unwrap();

        let assignments = engine.circle_assignments().unwrap();
        assert_eq!(assignments.len(), 3);
        let of = |id: &str| assignments.iter().find(|a| a.node_id == id).unwrap().clone();
        assert_eq!(of("H").circle, 0);
        assert_eq!(of("H").distance, 0.0);
        assert_eq!(of("s1").circle, 1);
        assert_eq!(of("s1").distance, 100.0);
    }

    #[test]
    fn s6_transition_via_engine() {
        let nodes = vec![node("A")];
        let mut from = Positions::new();
        from.insert("A".into(), Vec2::new(0.0, 0.0));

        let mut engine = Engine::default();
        let config = LayoutConfig {
            algorithm: "grid".into(),
            grid: Some(GridConfig {
                columns: Some(1),
                cell_width: 100.0,
                cell_height: 100.0,
                sort: grid::GridSort::None,
            }),
            ..LayoutConfig::default()
        };

        let start = Instant::now();
        engine
            .transition_to(&nodes, &[], &from, &config, start)
            .unwrap();
        assert!(engine.is_animating());

        let (_, done) = engine.tick_animation(start + Duration::from_millis(250)).unwrap();
        assert!(!done);
        let (_, done) = engine.tick_animation(start + Duration::from_millis(600)).unwrap();
        assert!(done);
        assert!(!engine.is_animating());
    }
}
