//! CPU graph layout engine: force-directed, hierarchical, circular and
//! grid layouts over a quadtree/Barnes-Hut spatial index, with animated
//! transitions between them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────────────┐
//! │  Quadtree   │──▶│  Barnes-Hut  │──▶│   Force simulation    │
//! │ (range/radius)│ │ (repulsion) │   │ (springs, gravity,     │
//! └─────────────┘   └──────────────┘   │  collisions, cooling)  │
//!                                      └───────────┬───────────┘
//!                                                  │
//! ┌──────────────┐  ┌─────────────┐  ┌─────────────┴──────────┐
//! │ Hierarchical │  │  Circular   │  │          Grid          │
//! │  (layered)   │  │ (concentric)│  │     (tessellation)     │
//! └──────┬───────┘  └──────┬──────┘  └────────────┬───────────┘
//!        │                 │                      │
//!        └────────────┬────┴──────────────────────┘
//!                      ▼
//!               ┌─────────────┐        ┌───────────┐
//!               │   Engine    │───────▶│  Animator │
//!               │  (facade)   │        │ (eased    │
//!               └─────────────┘        │  transitions)
//!                                      └───────────┘
//! ```
//!
//! The Engine is the only public entry point most callers need; the
//! individual modules are public for direct use and testing.

pub mod animator;
pub mod barnes_hut;
pub mod circular;
pub mod collision;
pub mod engine;
pub mod error;
pub mod force;
pub mod geometry;
pub mod grid;
pub mod hierarchical;
pub mod quadtree;

pub use error::{LayoutError, Result};
pub use geometry::Vec2;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node as the engine receives it from a caller (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub radius: Option<f64>,
    pub mass: Option<f64>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub priority: Option<i64>,
}

impl LayoutNode {
    /// The collision/rendering radius: `radius` if set, else
    /// `max(width, height) / 2`.
    pub fn effective_radius(&self) -> f64 {
        self.radius.unwrap_or_else(|| {
            let w = self.width.unwrap_or(1.0);
            let h = self.height.unwrap_or(1.0);
            w.max(h) / 2.0
        })
    }

    pub fn effective_mass(&self) -> f64 {
        self.mass.unwrap_or(1.0)
    }
}

/// A directed edge as the engine receives it (§3). Direction only matters
/// to hierarchical layering; every other layout treats edges as
/// undirected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
    pub weight: Option<f64>,
}

/// One entry per input node; produced fresh per layout call.
pub type Positions = HashMap<String, Vec2>;

/// Validate a node/edge set against §3's invariants. Returns
/// [`LayoutError::InvalidGraph`] with a human-readable reason on the first
/// violation found.
pub fn validate_graph(nodes: &[LayoutNode], edges: &[LayoutEdge]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(LayoutError::InvalidGraph(format!(
                "duplicate node id: {}",
                node.id
            )));
        }
        if !node.x.is_finite() || !node.y.is_finite() {
            return Err(LayoutError::InvalidGraph(format!(
                "non-finite coordinate for node {}",
                node.id
            )));
        }
        if let Some(w) = node.width {
            if w <= 0.0 {
                return Err(LayoutError::InvalidGraph(format!(
                    "non-positive width for node {}",
                    node.id
                )));
            }
        }
        if let Some(h) = node.height {
            if h <= 0.0 {
                return Err(LayoutError::InvalidGraph(format!(
                    "non-positive height for node {}",
                    node.id
                )));
            }
        }
    }

    for edge in edges {
        if !seen.contains(edge.source.as_str()) {
            return Err(LayoutError::InvalidGraph(format!(
                "edge source not in node set: {}",
                edge.source
            )));
        }
        if !seen.contains(edge.target.as_str()) {
            return Err(LayoutError::InvalidGraph(format!(
                "edge target not in node set: {}",
                edge.target
            )));
        }
    }

    Ok(())
}
