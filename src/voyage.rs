//! A voyage: one ship on one archipelago.
//!
//! Ties the stage, tide, route search and navigator together the way a host
//! game loop uses them. All times passed in are game durations, in seconds
//! since the voyage began.

use crate::config::VoyageConfig;
use crate::heightfield::{HeightGenerator, HeightSource};
use crate::record::{ShipRecord, VoyageRecord, RECORD_VERSION};
use crate::relic::{find_near_relic, RelicHandle};
use crate::route::{self, SearchParams};
use crate::ship::{NavEvent, Navigator};
use crate::stage::{BlockCoord, TiledStage, WorldCell};
use crate::tide::Tide;

/// Columns around the ship in which exposed relics are spotted.
pub const SIGHT_RADIUS: i32 = 6;

#[derive(Clone, Debug, PartialEq)]
pub enum VoyageEvent {
    Arrived { position: WorldCell, at: f64 },
    RelicSearched { handle: RelicHandle, kind: String, rare: f32 },
}

pub struct Voyage<S: HeightSource = HeightGenerator> {
    config: VoyageConfig,
    stage: TiledStage<S>,
    tide: Tide,
    navigator: Navigator,
    params: SearchParams,
    start_time: f64,
}

impl Voyage<HeightGenerator> {
    /// Fresh voyage on the noise archipelago described by `config`.
    /// `start_time` is the wall-clock time the voyage began.
    pub fn new(config: VoyageConfig, start_time: f64) -> Self {
        let stage = TiledStage::from_config(&config);
        Self::with_stage(config, stage, start_time)
    }

    /// Rebuild a saved voyage. Terrain is regenerated from `config`.
    pub fn restore(config: VoyageConfig, record: VoyageRecord) -> Self {
        let stage = TiledStage::from_config(&config);
        Self::restore_with_stage(config, stage, record)
    }
}

impl<S: HeightSource> Voyage<S> {
    pub fn with_stage(config: VoyageConfig, stage: TiledStage<S>, start_time: f64) -> Self {
        let tide = Tide::from_params(&config.tide);
        let params = SearchParams::from_config(&config);
        let navigator = Navigator::new(WorldCell::from(config.ship.position), params.required_time);
        Self {
            config,
            stage,
            tide,
            navigator,
            params,
            start_time,
        }
    }

    pub fn restore_with_stage(config: VoyageConfig, mut stage: TiledStage<S>, record: VoyageRecord) -> Self {
        stage.restore_relics(record.relics);
        let mut voyage = Self::with_stage(config, stage, record.start_time);
        voyage.navigator = Navigator::new(record.ship.position, voyage.params.required_time);
        if record.has_route {
            voyage.navigator.resume(record.route);
        }
        tracing::info!(
            ship = %voyage.navigator.cell(),
            navigating = voyage.navigator.is_navigating(),
            "voyage.restored"
        );
        voyage
    }

    pub fn config(&self) -> &VoyageConfig {
        &self.config
    }

    pub fn stage(&self) -> &TiledStage<S> {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut TiledStage<S> {
        &mut self.stage
    }

    pub fn tide(&self) -> &Tide {
        &self.tide
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn search_params(&self) -> &SearchParams {
        &self.params
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn ship_cell(&self) -> WorldCell {
        self.navigator.cell()
    }

    pub fn sea_level(&self, duration: f64) -> f64 {
        self.tide.level(duration)
    }

    /// Search a route from the ship to column `(x, z)` leaving at `duration`
    /// and start sailing it. Returns `false`, leaving the ship as it was, when
    /// there is no route.
    pub fn plan_route(&mut self, x: i32, z: i32, duration: f64) -> bool {
        let start = self.navigator.cell();
        let route = route::search(
            start,
            WorldCell::new(x, 0, z),
            duration,
            &mut self.stage,
            &self.tide,
            &self.params,
        );
        self.navigator.begin(route)
    }

    /// Advance the ship to `duration` and look around. On arrival the stage
    /// is swept around the ship's new block.
    pub fn update(&mut self, duration: f64) -> Option<VoyageEvent> {
        let event = self.navigator.update(duration);
        let level = self.tide.level(duration);
        let sighted = self.stage.sight_relics(self.navigator.cell(), SIGHT_RADIUS, level);
        if sighted > 0 {
            tracing::debug!(sighted, level, "voyage.relics_sighted");
        }

        match event {
            Some(NavEvent::Arrived { position, at }) => {
                self.sweep();
                Some(VoyageEvent::Arrived { position, at })
            }
            None => None,
        }
    }

    /// Evict blocks outside the retention window around the ship.
    pub fn sweep(&mut self) -> usize {
        let cell = self.navigator.cell();
        let focus = BlockCoord::containing(cell.x, cell.z, self.stage.block_size());
        self.stage.garbage_collect(focus, self.config.stage.retention)
    }

    /// Spend `dt` seconds searching the nearest unsearched relic. Only
    /// possible while the ship is at rest.
    pub fn search_relics(&mut self, dt: f64) -> Option<VoyageEvent> {
        if self.navigator.is_navigating() {
            return None;
        }
        let handle = find_near_relic(&mut self.stage, self.navigator.cell())?;
        let relic = self.stage.relic_mut(handle)?;
        if !relic.advance_search(dt) {
            return None;
        }
        tracing::info!(kind = %relic.kind, rare = relic.rare, block = %handle.block, "voyage.relic_searched");
        Some(VoyageEvent::RelicSearched {
            handle,
            kind: relic.kind.clone(),
            rare: relic.rare,
        })
    }

    /// Snapshot for saving.
    pub fn record(&self) -> VoyageRecord {
        let route = self.navigator.route().to_vec();
        VoyageRecord {
            version: RECORD_VERSION,
            start_time: self.start_time,
            ship: ShipRecord {
                position: self.navigator.cell(),
            },
            has_route: self.navigator.is_navigating(),
            route_start_time: self.navigator.route_start_time().unwrap_or(0.0),
            route_end_time: self.navigator.route_end_time().unwrap_or(0.0),
            route,
            relics: self.stage.relic_records(),
        }
    }
}
