//! Grid layout: simple row-major tessellation, with an optional pre-sort
//! pass.

use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to order nodes before placing them row-major, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridSort {
    /// Preserve input order.
    None,
    /// Group by node type, then by priority within each type.
    TypeThenPriority,
    /// Order by priority first, ignoring type.
    PriorityOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub columns: Option<usize>,
    pub cell_width: f64,
    pub cell_height: f64,
    pub sort: GridSort,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: None,
            cell_width: 150.0,
            cell_height: 100.0,
            sort: GridSort::None,
        }
    }
}

/// Sort key fed into [`order_nodes`]: a node's type tag and priority, used
/// only when `config.sort` requests it.
#[derive(Debug, Clone, Copy)]
pub struct GridNodeKey<'a, Id> {
    pub id: Id,
    pub node_type: &'a str,
    pub priority: i64,
}

/// Order `nodes` per `sort`, stable with respect to input order for equal
/// keys.
///
/// `TypeThenPriority` groups by type ascending, priority descending within a
/// type; `PriorityOnly` orders by priority descending, type ascending as a
/// tie-break (§4.8).
pub fn order_nodes<Id: Copy>(nodes: &[GridNodeKey<'_, Id>], sort: GridSort) -> Vec<Id> {
    let mut indexed: Vec<(usize, &GridNodeKey<'_, Id>)> = nodes.iter().enumerate().collect();
    match sort {
        GridSort::None => {}
        GridSort::TypeThenPriority => {
            indexed.sort_by(|(ia, a), (ib, b)| {
                a.node_type
                    .cmp(b.node_type)
                    .then(b.priority.cmp(&a.priority))
                    .then(ia.cmp(ib))
            });
        }
        GridSort::PriorityOnly => {
            indexed.sort_by(|(ia, a), (ib, b)| {
                b.priority
                    .cmp(&a.priority)
                    .then(a.node_type.cmp(b.node_type))
                    .then(ia.cmp(ib))
            });
        }
    }
    indexed.into_iter().map(|(_, k)| k.id).collect()
}

/// The number of columns to use for `count` nodes: `config.columns` if
/// set, otherwise `ceil(sqrt(count))` (§4.8).
pub fn resolve_columns(count: usize, config: &GridConfig) -> usize {
    if let Some(c) = config.columns {
        return c.max(1);
    }
    if count == 0 {
        return 1;
    }
    (count as f64).sqrt().ceil() as usize
}

/// Place `ordered_ids` row-major into a grid: node `i` goes to
/// `(col = i % columns, row = i / columns)` at `(col * cell_width, row *
/// cell_height)` (§4.8) — every position an exact multiple of the cell
/// size, with `(0, 0)` for the first node.
pub fn assign_coordinates<Id: Copy + Eq + std::hash::Hash>(
    ordered_ids: &[Id],
    config: &GridConfig,
) -> HashMap<Id, Vec2> {
    let columns = resolve_columns(ordered_ids.len(), config);

    let mut out = HashMap::new();
    for (i, &id) in ordered_ids.iter().enumerate() {
        let col = i % columns;
        let row = i / columns;
        let x = col as f64 * config.cell_width;
        let y = row as f64 * config.cell_height;
        out.insert(id, Vec2::new(x, y));
    }
    out
}
