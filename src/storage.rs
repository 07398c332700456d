//! Calibration file I/O.
//! Stores the coordinate set as JSON:
//! `{"column_positions": [..7 ints..], "board_top": int, "board_bottom": int}`.
//! Writes overwrite the previous file (last writer wins).

use crate::board::CoordinateSet;
use crate::error::{ClickerError, ClickerResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
struct CalibrationRecord {
    column_positions: Vec<i32>,
    board_top: i32,
    board_bottom: i32,
}

impl From<&CoordinateSet> for CalibrationRecord {
    fn from(set: &CoordinateSet) -> Self {
        Self {
            column_positions: set.columns().to_vec(),
            board_top: set.board_top(),
            board_bottom: set.board_bottom(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CalibrationFile {
    path: PathBuf,
}

impl CalibrationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, set: &CoordinateSet) -> ClickerResult<()> {
        let json = serde_json::to_string_pretty(&CalibrationRecord::from(set)).map_err(|e| {
            ClickerError::Io {
                path: self.path.clone(),
                source: e.into(),
            }
        })?;
        fs::write(&self.path, json).map_err(|source| ClickerError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "Calibration saved");
        Ok(())
    }

    pub fn load(&self) -> ClickerResult<CoordinateSet> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ClickerError::NotFound(self.path.clone())
            } else {
                ClickerError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        let record: CalibrationRecord =
            serde_json::from_str(&content).map_err(|e| self.parse_error(e.to_string()))?;
        let set = CoordinateSet::new(&record.column_positions, record.board_top, record.board_bottom)
            .map_err(|e| self.parse_error(e.to_string()))?;

        info!(path = %self.path.display(), "Calibration loaded");
        Ok(set)
    }

    fn parse_error(&self, reason: String) -> ClickerError {
        ClickerError::Parse {
            path: self.path.clone(),
            reason,
        }
    }
}
