//! Save records.
//!
//! A record holds only what cannot be regenerated: the ship, its route and
//! the relic state of every block ever visited. Terrain is rebuilt from the
//! configuration seed on load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::relic::BlockRelics;
use crate::route::Waypoint;
use crate::stage::WorldCell;

/// Format version written by this build
pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to access record {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record version {found} is newer than supported version {supported}")]
    Version { found: u32, supported: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShipRecord {
    pub position: WorldCell,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoyageRecord {
    pub version: u32,
    /// Wall-clock seconds at which the voyage began
    pub start_time: f64,
    pub ship: ShipRecord,
    pub has_route: bool,
    #[serde(default)]
    pub route: Vec<Waypoint>,
    #[serde(default)]
    pub route_start_time: f64,
    #[serde(default)]
    pub route_end_time: f64,
    #[serde(default)]
    pub relics: Vec<BlockRelics>,
}

impl VoyageRecord {
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let record: VoyageRecord = serde_json::from_str(json)?;
        if record.version > RECORD_VERSION {
            tracing::warn!(found = record.version, supported = RECORD_VERSION, "record.version_unsupported");
            return Err(RecordError::Version {
                found: record.version,
                supported: RECORD_VERSION,
            });
        }
        Ok(record)
    }
}

/// Write `record` to `path` as pretty JSON.
pub fn save_record(record: &VoyageRecord, path: &Path) -> Result<(), RecordError> {
    let json = record.to_json()?;
    fs::write(path, json).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        has_route = record.has_route,
        blocks = record.relics.len(),
        "record.saved"
    );
    Ok(())
}

pub fn load_record(path: &Path) -> Result<VoyageRecord, RecordError> {
    let json = fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record = VoyageRecord::from_json_str(&json)?;
    tracing::info!(
        path = %path.display(),
        has_route = record.has_route,
        blocks = record.relics.len(),
        "record.loaded"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relic::Relic;
    use crate::stage::BlockCoord;

    fn sample() -> VoyageRecord {
        let mut relic = Relic::new(WorldCell::new(4, -6, 9), "anchor", 8.0, 0.25);
        relic.advance_search(3.0);
        VoyageRecord {
            version: RECORD_VERSION,
            start_time: 1_700_000_000.0,
            ship: ShipRecord {
                position: WorldCell::new(-3, -2, 5),
            },
            has_route: true,
            route: vec![
                Waypoint::new(WorldCell::new(-3, -2, 5), 40.0),
                Waypoint::new(WorldCell::new(-2, -1, 5), 40.5),
            ],
            route_start_time: 40.0,
            route_end_time: 40.5,
            relics: vec![BlockRelics {
                block: BlockCoord::new(-1, 0),
                relics: vec![relic],
            }],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voyage.json");
        let record = sample();
        save_record(&record, &path).unwrap();
        let loaded = load_record(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_field_names() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["ship"]["position"], serde_json::json!([-3, -2, 5]));
        assert_eq!(json["has_route"], true);
        assert_eq!(json["route"][1]["duration"], 40.5);
        assert_eq!(json["relics"][0]["block"], serde_json::json!([-1, 0]));
        assert_eq!(json["relics"][0]["relics"][0]["searched_time"], 3.0);
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut record = sample();
        record.version = RECORD_VERSION + 1;
        let json = serde_json::to_string(&record).unwrap();
        let result = VoyageRecord::from_json_str(&json);
        assert!(matches!(result, Err(RecordError::Version { found, .. }) if found == RECORD_VERSION + 1));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_record(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(RecordError::Io { .. })));
    }

    #[test]
    fn test_idle_record_without_route_fields() {
        let json = r#"{ "version": 1, "start_time": 5.0, "ship": { "position": [1, 0, 1] }, "has_route": false }"#;
        let record = VoyageRecord::from_json_str(json).unwrap();
        assert!(!record.has_route);
        assert!(record.route.is_empty());
        assert!(record.relics.is_empty());
    }
}
