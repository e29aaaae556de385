//! ASCII charts of the archipelago.
//!
//! Renders a square window of the stage around a centre column, as seen at
//! one instant of the tide. Rows run north to south (increasing `z`).

use std::collections::{HashMap, HashSet};

use crate::heightfield::HeightSource;
use crate::route::Waypoint;
use crate::stage::{BlockCoord, TiledStage, WorldCell};
use crate::tide::Tide;

/// What the chart shows in each cell, from most to least important.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartCell {
    Ship,
    Route,
    Relic { searched: bool },
    Sea,
    Land { height: i32 },
}

/// Character for land standing `above` cells over the current sea level.
pub fn land_char(above: f64) -> char {
    // Shore to summit, 0 to 15 cells above the water
    const CHARS: &[char] = &['.', ':', '-', '=', '+', '#', '^', 'A'];
    let normalized = (above / 15.0).clamp(0.0, 1.0);
    let idx = (normalized * (CHARS.len() - 1) as f64) as usize;
    CHARS[idx.min(CHARS.len() - 1)]
}

pub fn cell_char(cell: ChartCell, sea_level: f64) -> char {
    match cell {
        ChartCell::Ship => '@',
        ChartCell::Route => '*',
        ChartCell::Relic { searched: false } => '?',
        ChartCell::Relic { searched: true } => 'x',
        ChartCell::Sea => '~',
        ChartCell::Land { height } => land_char(height as f64 - sea_level),
    }
}

/// Relics in the window, keyed by world column. `true` when searched.
fn relics_in_window<S: HeightSource>(
    stage: &mut TiledStage<S>,
    center: WorldCell,
    radius: i32,
) -> HashMap<(i32, i32), bool> {
    let size = stage.block_size();
    let lo = BlockCoord::containing(center.x - radius, center.z - radius, size);
    let hi = BlockCoord::containing(center.x + radius, center.z + radius, size);

    let mut relics = HashMap::new();
    for bz in lo.z..=hi.z {
        for bx in lo.x..=hi.x {
            let coord = BlockCoord::new(bx, bz);
            let (ox, oz) = coord.origin(size);
            for relic in stage.block(coord).relics() {
                relics.insert((ox + relic.position.x, oz + relic.position.z), relic.searched);
            }
        }
    }
    relics
}

/// Classify every cell of the `(2 * radius + 1)` square window around
/// `center`. Rows are `z`, columns are `x`.
pub fn chart_cells<S: HeightSource>(
    stage: &mut TiledStage<S>,
    center: WorldCell,
    radius: i32,
    sea_level: f64,
    ship: Option<WorldCell>,
    route: &[Waypoint],
) -> Vec<Vec<ChartCell>> {
    let relics = relics_in_window(stage, center, radius);
    let route_cells: HashSet<(i32, i32)> = route.iter().map(|w| w.position.column()).collect();

    let mut rows = Vec::with_capacity((2 * radius + 1) as usize);
    for z in (center.z - radius)..=(center.z + radius) {
        let mut row = Vec::with_capacity((2 * radius + 1) as usize);
        for x in (center.x - radius)..=(center.x + radius) {
            let cell = if ship.map_or(false, |s| s.column() == (x, z)) {
                ChartCell::Ship
            } else if route_cells.contains(&(x, z)) {
                ChartCell::Route
            } else if let Some(&searched) = relics.get(&(x, z)) {
                ChartCell::Relic { searched }
            } else {
                let height = stage.height_at(x, z);
                if (height as f64) < sea_level {
                    ChartCell::Sea
                } else {
                    ChartCell::Land { height }
                }
            };
            row.push(cell);
        }
        rows.push(row);
    }
    rows
}

/// Render the window around `center` at game time `duration`.
pub fn render_chart<S: HeightSource>(
    stage: &mut TiledStage<S>,
    tide: &Tide,
    center: WorldCell,
    radius: i32,
    duration: f64,
    ship: Option<WorldCell>,
    route: &[Waypoint],
) -> String {
    let sea_level = tide.level(duration);
    let rows = chart_cells(stage, center, radius, sea_level, ship, route);

    let width = (2 * radius + 1) as usize;
    let mut result = String::with_capacity((width + 1) * rows.len());
    for row in rows {
        for cell in row {
            result.push(cell_char(cell, sea_level));
        }
        result.push('\n');
    }
    result
}

/// Legend for [`render_chart`].
pub fn chart_legend() -> String {
    "=== CHART LEGEND ===\n\
     @ Ship   * Route   ? Relic   x Searched relic   ~ Sea\n\
     Land, shore to summit:\n\
     . : - = + # ^ A\n"
        .to_string()
}
