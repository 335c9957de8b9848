//! Generic 2-D point index supporting range and radius queries.
//!
//! Insertion recursively subdivides a leaf once it exceeds `capacity`
//! points, except when every point already in the leaf sits within
//! [`COINCIDENT_EPS`] of the incoming point — in that case the leaf keeps
//! accepting rather than subdividing forever.

use crate::geometry::{Rect, Vec2};

/// Points closer than this are treated as coincident and exempted from
/// leaf-splitting, to avoid infinite recursion.
pub const COINCIDENT_EPS: f64 = 1e-3;

/// Default leaf capacity before subdivision.
pub const DEFAULT_CAPACITY: usize = 4;

struct Entry<T> {
    point: Vec2,
    payload: T,
}

enum NodeKind<T> {
    Leaf(Vec<Entry<T>>),
    Internal {
        children: Box<[QuadNode<T>; 4]>,
        /// Points every child rejected (corner/boundary degeneracy).
        overflow: Vec<Entry<T>>,
    },
}

struct QuadNode<T> {
    boundary: Rect,
    kind: NodeKind<T>,
}

impl<T: Clone> QuadNode<T> {
    fn new(boundary: Rect) -> Self {
        Self {
            boundary,
            kind: NodeKind::Leaf(Vec::new()),
        }
    }

    fn insert(&mut self, point: Vec2, payload: T, capacity: usize) -> bool {
        if !self.boundary.contains(point) {
            return false;
        }

        match &mut self.kind {
            NodeKind::Leaf(entries) => {
                let all_coincident = !entries.is_empty()
                    && entries
                        .iter()
                        .all(|e| e.point.distance(point) < COINCIDENT_EPS);

                if entries.len() < capacity || all_coincident {
                    entries.push(Entry { point, payload });
                    return true;
                }

                self.subdivide_and_reinsert(capacity);
                self.insert(point, payload, capacity)
            }
            NodeKind::Internal { children, overflow } => {
                for child in children.iter_mut() {
                    if child.insert(point, payload.clone(), capacity) {
                        return true;
                    }
                }
                // No child accepted it: a corner/boundary degeneracy. Keep
                // it on this node instead of dropping it.
                overflow.push(Entry { point, payload });
                true
            }
        }
    }

    fn subdivide_and_reinsert(&mut self, capacity: usize) {
        let quads = self.boundary.subdivide();
        let mut children: [QuadNode<T>; 4] = [
            QuadNode::new(quads[0]),
            QuadNode::new(quads[1]),
            QuadNode::new(quads[2]),
            QuadNode::new(quads[3]),
        ];

        let mut overflow = Vec::new();
        let old = std::mem::replace(&mut self.kind, NodeKind::Leaf(Vec::new()));
        if let NodeKind::Leaf(entries) = old {
            for entry in entries {
                let mut accepted = false;
                for child in children.iter_mut() {
                    if child.insert(entry.point, entry.payload.clone(), capacity) {
                        accepted = true;
                        break;
                    }
                }
                if !accepted {
                    overflow.push(entry);
                }
            }
        }

        self.kind = NodeKind::Internal {
            children: Box::new(children),
            overflow,
        };
    }

    fn query(&self, range: &Rect, out: &mut Vec<(Vec2, T)>) {
        if !self.boundary.intersects(range) {
            return;
        }
        match &self.kind {
            NodeKind::Leaf(entries) => {
                for e in entries {
                    if range.contains(e.point) {
                        out.push((e.point, e.payload.clone()));
                    }
                }
            }
            NodeKind::Internal { children, overflow } => {
                for child in children.iter() {
                    child.query(range, out);
                }
                for e in overflow {
                    if range.contains(e.point) {
                        out.push((e.point, e.payload.clone()));
                    }
                }
            }
        }
    }

    fn clear(&mut self) {
        self.kind = NodeKind::Leaf(Vec::new());
    }
}

/// A Barnes-Hut-capable quadtree over 2-D points with arbitrary payloads.
pub struct Quadtree<T> {
    root: QuadNode<T>,
    capacity: usize,
}

impl<T: Clone> Quadtree<T> {
    /// Create a new quadtree over `boundary` with the given leaf-splitting
    /// `capacity`.
    pub fn new(boundary: Rect, capacity: usize) -> Self {
        Self {
            root: QuadNode::new(boundary),
            capacity: capacity.max(1),
        }
    }

    /// Insert `point` with an associated `payload`. Returns `false` iff
    /// `point` lies outside the tree's boundary.
    pub fn insert(&mut self, point: Vec2, payload: T) -> bool {
        self.root.insert(point, payload, self.capacity)
    }

    /// All points (with payload) inside the axis-aligned `range`.
    pub fn query(&self, range: Rect) -> Vec<(Vec2, T)> {
        let mut out = Vec::new();
        self.root.query(&range, &mut out);
        out
    }

    /// All points within Euclidean distance `radius` of `center`.
    pub fn query_radius(&self, center: Vec2, radius: f64) -> Vec<(Vec2, T)> {
        let bounding = Rect::new(center, radius);
        let r2 = radius * radius;
        self.query(bounding)
            .into_iter()
            .filter(|(p, _)| p.distance_squared(center) <= r2)
            .collect()
    }

    /// Remove every point, keeping the root boundary and capacity.
    pub fn clear(&mut self) {
        self.root.clear();
    }

    pub fn boundary(&self) -> Rect {
        self.root.boundary
    }
}
