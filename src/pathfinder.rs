//! A* search over the grid.
//!
//! Occupied cells block traversal with one exception: the destination
//! itself may be occupied, so a search can terminate on an enemy without
//! planning to walk through anyone.

use std::collections::HashMap;

use log::trace;

use crate::{
    grid::Grid,
    map::{distance_hex, Hex},
    MoveRange,
};

/// A min-queue over f32 priorities. A linear scan is plenty for fields
/// of this size. Ties resolve to the earliest-pushed entry, which keeps
/// the search deterministic.
#[derive(Clone, Debug)]
pub struct PriorityQueue<T> {
    items: Vec<(T, f32)>,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: T, priority: f32) {
        self.items.push((item, priority));
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let mut best = 0;
        for (i, (_, priority)) in self.items.iter().enumerate().skip(1) {
            if *priority < self.items[best].1 {
                best = i;
            }
        }
        Some(self.items.remove(best).0)
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A walkable route: the start cell followed by every cell entered.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    tiles: Vec<Hex>,
}

impl Path {
    pub fn new(tiles: Vec<Hex>) -> Self {
        assert!(!tiles.is_empty());
        Self { tiles }
    }

    pub fn tiles(&self) -> &[Hex] {
        &self.tiles
    }

    pub fn from(&self) -> Hex {
        self.tiles[0]
    }

    pub fn to(&self) -> Hex {
        *self.tiles.last().unwrap()
    }

    /// Cuts the route down to what a mover with the given budget can
    /// walk this turn: the start plus at most `range` more cells.
    pub fn clip(&self, range: MoveRange) -> Path {
        let keep = (range.0 + 1).max(1) as usize;
        let keep = keep.min(self.tiles.len());
        Path::new(self.tiles[..keep].to_vec())
    }
}

/// Searches a route between two cells. Returns `None` when the
/// destination does not exist or no route survives the occupancy
/// constraints.
pub fn find_path(grid: &Grid, from: Hex, to: Hex) -> Option<Path> {
    grid.cell(to)?;
    if from == to {
        return Some(Path::new(vec![from]));
    }
    let mut frontier = PriorityQueue::new();
    let mut came_from: HashMap<Hex, Hex> = HashMap::new();
    let mut cost_so_far: HashMap<Hex, f32> = HashMap::new();
    frontier.push(from, 0.0);
    cost_so_far.insert(from, 0.0);
    while let Some(current) = frontier.pop() {
        if current == to {
            break;
        }
        for next in &current.neighbours() {
            let next = *next;
            let cell = match grid.cell(next) {
                Some(cell) => cell,
                None => continue,
            };
            if cell.is_occupied() && next != to {
                continue;
            }
            let new_cost = cost_so_far[&current] + cell.cost();
            let seen = cost_so_far.get(&next);
            if seen.map_or(true, |&old| new_cost < old) {
                cost_so_far.insert(next, new_cost);
                let priority = new_cost + distance_hex(next, to).0 as f32;
                frontier.push(next, priority);
                came_from.insert(next, current);
            }
        }
    }
    if !came_from.contains_key(&to) {
        trace!("pathfinder: no route from {:?} to {:?}", from, to);
        return None;
    }
    let mut tiles = vec![to];
    let mut current = to;
    while current != from {
        current = came_from[&current];
        tiles.push(current);
    }
    tiles.reverse();
    Some(Path::new(tiles))
}
