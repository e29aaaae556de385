//! Voyage configuration.
//!
//! Loaded from `voyage_params.json`. The builtin copy is embedded at compile
//! time; a file on disk can replace it wholesale or in part, since every
//! section falls back to its defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BUILTIN_VOYAGE_CONFIG: &str = include_str!("data/voyage_params.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Root configuration consumed by the stage, tide, route search and ship.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoyageConfig {
    pub stage: StageParams,
    pub tide: TideParams,
    pub ship: ShipParams,
    pub route: RouteParams,
    pub relic: RelicParams,
}

/// Terrain generation and block store parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageParams {
    /// Seed for the Perlin permutation table
    pub seed: u32,
    /// Number of fBm octaves
    pub octaves: u32,
    /// Horizontal sampling scale (world cells to noise space)
    pub random_scale: f64,
    /// Vertical scale applied to the normalised noise
    pub height_scale: f64,
    pub min_height: i32,
    pub max_height: i32,
    /// Edge length of a square block, in cells
    pub block_size: i32,
    /// Half-extent, in blocks, of the window kept alive around the ship
    pub retention: i32,
}

impl Default for StageParams {
    fn default() -> Self {
        Self {
            seed: 1,
            octaves: 4,
            random_scale: 0.02,
            height_scale: 30.0,
            min_height: -15,
            max_height: 15,
            block_size: crate::stage::DEFAULT_BLOCK_SIZE,
            retention: 2,
        }
    }
}

/// Two superposed oscillations remapped into `[level[0], level[1]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TideParams {
    /// Angular speeds (radians per second)
    pub speed: [f64; 2],
    /// Lowest and highest sea level
    pub level: [f64; 2],
}

impl Default for TideParams {
    fn default() -> Self {
        Self {
            speed: [0.05, 0.0123],
            level: [-1.0, 3.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipParams {
    /// Cells travelled per second
    pub speed: f64,
    /// Initial cell of the ship
    pub position: [i32; 3],
}

impl ShipParams {
    /// Seconds needed to cross one cell.
    pub fn required_time(&self) -> f64 {
        1.0 / self.speed
    }
}

impl Default for ShipParams {
    fn default() -> Self {
        Self {
            speed: 2.0,
            position: [0, 0, 0],
        }
    }
}

/// Tunables of the tide-aware route search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteParams {
    /// Cells farther (Manhattan) from the start than this multiple of the
    /// start-end distance are never expanded
    pub prune_multiplier: f64,
    /// Departure delay step, as a fraction of the per-cell travel time
    pub wait_step_fraction: f64,
    /// Maximum number of departure delays tried for one move
    pub wait_step_limit: u32,
}

impl Default for RouteParams {
    fn default() -> Self {
        Self {
            prune_multiplier: 1.5,
            wait_step_fraction: 0.25,
            wait_step_limit: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelicParams {
    /// Chance that an interior cell of a fresh block holds a relic
    pub probability: f64,
    pub kinds: Vec<RelicKind>,
}

impl Default for RelicParams {
    fn default() -> Self {
        Self {
            probability: 0.002,
            kinds: vec![
                RelicKind {
                    name: "amphora".to_string(),
                    weight: 6.0,
                    height: [-15, -1],
                    search_time: [5.0, 20.0],
                    rare: [0.0, 0.4],
                },
                RelicKind {
                    name: "idol".to_string(),
                    weight: 1.0,
                    height: [0, 15],
                    search_time: [30.0, 90.0],
                    rare: [0.5, 0.9],
                },
            ],
        }
    }
}

/// One entry of the relic table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelicKind {
    pub name: String,
    /// Relative weight among kinds allowed at a given height
    pub weight: f64,
    /// Inclusive terrain height range where this kind can appear
    pub height: [i32; 2],
    /// Inclusive range of seconds needed to search it
    pub search_time: [f64; 2],
    /// Inclusive rarity range (1.0 is the rarest)
    pub rare: [f32; 2],
}

impl RelicKind {
    pub fn allows_height(&self, height: i32) -> bool {
        height >= self.height[0] && height <= self.height[1]
    }
}

impl VoyageConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        let config = Self::from_json_str(BUILTIN_VOYAGE_CONFIG)?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: VoyageConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!(path = %path.display(), "voyage_config.loaded=file");
        Ok(config)
    }

    /// Reject values the stage, tide or search cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.stage.block_size <= 0 {
            return invalid(format!("stage.block_size must be positive, got {}", self.stage.block_size));
        }
        if self.stage.retention < 0 {
            return invalid(format!("stage.retention must not be negative, got {}", self.stage.retention));
        }
        if self.stage.min_height > self.stage.max_height {
            return invalid(format!(
                "stage.min_height {} is above stage.max_height {}",
                self.stage.min_height, self.stage.max_height
            ));
        }
        if self.tide.level[0] > self.tide.level[1] {
            return invalid(format!(
                "tide.level minimum {} is above maximum {}",
                self.tide.level[0], self.tide.level[1]
            ));
        }
        if !(self.ship.speed > 0.0) {
            return invalid(format!("ship.speed must be positive, got {}", self.ship.speed));
        }
        if !(self.route.wait_step_fraction > 0.0) {
            return invalid(format!(
                "route.wait_step_fraction must be positive, got {}",
                self.route.wait_step_fraction
            ));
        }
        if !(self.route.prune_multiplier > 0.0) {
            return invalid(format!(
                "route.prune_multiplier must be positive, got {}",
                self.route.prune_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.relic.probability) {
            return invalid(format!("relic.probability must be in [0, 1], got {}", self.relic.probability));
        }
        for kind in &self.relic.kinds {
            if kind.weight < 0.0
                || kind.height[0] > kind.height[1]
                || kind.search_time[0] > kind.search_time[1]
                || kind.rare[0] > kind.rare[1]
            {
                return invalid(format!("relic kind '{}' has an inverted range or negative weight", kind.name));
            }
        }
        Ok(())
    }
}
