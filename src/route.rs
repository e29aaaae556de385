//! Tide-aware route search.
//!
//! A* over the infinite 4-connected grid of world columns, ordered by
//! estimated arrival time rather than path length. A move between two
//! neighbouring columns is only possible while both are under water: the
//! ship must be afloat when it departs and the destination must still be
//! covered when it arrives one `required_time` later. When that does not
//! hold, departure is delayed in small steps until it does, or the move is
//! dropped.
//!
//! Failing to find a route is an ordinary outcome and yields an empty list.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::VoyageConfig;
use crate::heightfield::HeightSource;
use crate::stage::{TiledStage, WorldCell};
use crate::tide::Tide;

/// Height lookups needed by the search. Lookups may materialise terrain,
/// hence `&mut self`.
pub trait Terrain {
    fn height_at(&mut self, x: i32, z: i32) -> i32;
}

impl<S: HeightSource> Terrain for TiledStage<S> {
    fn height_at(&mut self, x: i32, z: i32) -> i32 {
        TiledStage::height_at(self, x, z)
    }
}

/// One leg of a route: the cell reached and the absolute time of arrival.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: WorldCell,
    pub duration: f64,
}

impl Waypoint {
    pub fn new(position: WorldCell, duration: f64) -> Self {
        Self { position, duration }
    }
}

/// Search tunables, resolved from the voyage configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchParams {
    /// Seconds to cross one cell
    pub required_time: f64,
    pub prune_multiplier: f64,
    pub wait_step_fraction: f64,
    pub wait_step_limit: u32,
}

impl SearchParams {
    pub fn from_config(config: &VoyageConfig) -> Self {
        Self {
            required_time: config.ship.required_time(),
            prune_multiplier: config.route.prune_multiplier,
            wait_step_fraction: config.route.wait_step_fraction,
            wait_step_limit: config.route.wait_step_limit,
        }
    }

    fn wait_step(&self) -> f64 {
        self.required_time * self.wait_step_fraction
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            required_time: 0.5,
            prune_multiplier: 1.5,
            wait_step_fraction: 0.25,
            wait_step_limit: 4096,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct RouteNode {
    pos: WorldCell,
    prev_pos: WorldCell,
    arrived: f64,
    score: f64,
}

/// Open-set entry. Lowest score first; equal scores pop in insertion order.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    score: f64,
    seq: u64,
    column: (i32, i32),
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Lower bound on the time left to reach `end`: one `required_time` per
/// remaining Manhattan step, never counting tide waits.
fn heuristic(pos: &WorldCell, end: &WorldCell, required_time: f64) -> f64 {
    pos.manhattan_xz(end) as f64 * required_time
}

/// Arrival time of a move from a column of height `from_height` to one of
/// height `to_height`, departing no earlier than `departure`.
///
/// Departure is pushed back by `wait_step` until the origin is submerged at
/// departure and the destination is submerged on arrival. Returns `None`
/// when either column can never be covered or `wait_step_limit` delays were
/// not enough.
pub fn calc_cost(from_height: i32, to_height: i32, departure: f64, tide: &Tide, params: &SearchParams) -> Option<f64> {
    if !tide.can_submerge(from_height) || !tide.can_submerge(to_height) {
        return None;
    }

    let step = params.wait_step();
    let mut t = departure;
    for _ in 0..=params.wait_step_limit {
        let arrival = t + params.required_time;
        if tide.is_submerged(from_height, t) && tide.is_submerged(to_height, arrival) {
            return Some(arrival);
        }
        t += step;
    }
    None
}

/// Fastest route from `start` to `end`, leaving at `start_duration`.
///
/// The `y` of both endpoints is replaced by the terrain height of their
/// column. The result runs start to end with non-decreasing arrival times;
/// it is empty when no route exists inside the prune radius.
pub fn search<T: Terrain + ?Sized>(
    start: WorldCell,
    end: WorldCell,
    start_duration: f64,
    terrain: &mut T,
    tide: &Tide,
    params: &SearchParams,
) -> Vec<Waypoint> {
    let start = start.with_y(terrain.height_at(start.x, start.z));
    let end = end.with_y(terrain.height_at(end.x, end.z));

    if start.same_column(&end) {
        return vec![Waypoint::new(start, start_duration)];
    }

    let prune_distance = params.prune_multiplier * start.distance_xz(&end);

    let mut opened: HashMap<(i32, i32), RouteNode> = HashMap::new();
    let mut queue: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut seq: u64 = 0;

    let estimate = heuristic(&start, &end, params.required_time);
    opened.insert(
        start.column(),
        RouteNode {
            pos: start,
            prev_pos: start,
            arrived: start_duration,
            score: start_duration + estimate,
        },
    );
    queue.push(OpenEntry {
        score: start_duration + estimate,
        seq,
        column: start.column(),
    });

    let mut expanded = 0usize;
    while let Some(entry) = queue.pop() {
        let Some(node) = opened.get(&entry.column).copied() else {
            continue;
        };

        if node.pos.same_column(&end) {
            let route = reconstruct(&opened, start, end);
            tracing::info!(
                start = %start,
                end = %end,
                steps = route.len(),
                expanded,
                arrival = node.arrived,
                "route.found"
            );
            return route;
        }
        expanded += 1;

        for (dx, dz) in DIRECTIONS {
            let column = (node.pos.x + dx, node.pos.z + dz);
            // Cells are never reopened once discovered.
            if opened.contains_key(&column) {
                continue;
            }

            let candidate = WorldCell::new(column.0, 0, column.1);
            if candidate.manhattan_xz(&start) as f64 > prune_distance {
                continue;
            }

            let height = terrain.height_at(column.0, column.1);
            let Some(arrived) = calc_cost(node.pos.y, height, node.arrived, tide, params) else {
                continue;
            };

            let pos = candidate.with_y(height);
            let estimate = heuristic(&pos, &end, params.required_time);
            let next = RouteNode {
                pos,
                prev_pos: node.pos,
                arrived,
                score: arrived + estimate,
            };
            opened.insert(column, next);
            seq += 1;
            queue.push(OpenEntry {
                score: next.score,
                seq,
                column,
            });
        }
    }

    tracing::warn!(start = %start, end = %end, expanded, "route.not_found");
    Vec::new()
}

/// Follow predecessor links from `end` back to `start`.
fn reconstruct(opened: &HashMap<(i32, i32), RouteNode>, start: WorldCell, end: WorldCell) -> Vec<Waypoint> {
    let mut route = Vec::new();
    let mut column = end.column();
    while let Some(node) = opened.get(&column) {
        route.push(Waypoint::new(node.pos, node.arrived));
        if node.pos.same_column(&start) {
            break;
        }
        column = node.prev_pos.column();
    }
    route.reverse();
    route
}

/// Arrival time of the last waypoint, if any.
pub fn arrival_time(route: &[Waypoint]) -> Option<f64> {
    route.last().map(|w| w.duration)
}
