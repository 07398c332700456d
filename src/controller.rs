//! Controller shared by the HTTP bridge, the local menu and the pointer
//! listener. Cloning is cheap; every clone drives the same board state.

use crate::board::{CoordinateSet, CoordinateStore, ScreenPoint};
use crate::calibrate::{Calibrator, Phase, PointerEvent, Progress};
use crate::config::Settings;
use crate::dispatch::{ClickDispatcher, ClickInjector};
use crate::error::{ClickerError, ClickerResult};
use crate::input::{FailureHook, PointerSink, PointerSource};
use crate::storage::CalibrationFile;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug)]
struct BoardState {
    store: CoordinateStore,
    calibrator: Calibrator,
}

/// Snapshot reported to the UI and to `GET /api/status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub running: bool,
    pub calibrated: bool,
    pub calibrating: bool,
    pub collected: usize,
}

#[derive(Clone)]
pub struct Clicker {
    board: Arc<Mutex<BoardState>>,
    dispatcher: ClickDispatcher,
    storage: CalibrationFile,
    pointer_source: Arc<dyn PointerSource>,
}

impl Clicker {
    pub fn new(
        settings: &Settings,
        injector: Arc<dyn ClickInjector>,
        pointer_source: Arc<dyn PointerSource>,
    ) -> Self {
        Self {
            board: Arc::new(Mutex::new(BoardState {
                store: CoordinateStore::default(),
                calibrator: Calibrator::new(settings.offsets.top),
            })),
            dispatcher: ClickDispatcher::new(injector, settings.offsets.click),
            storage: CalibrationFile::new(settings.calibration_file.clone()),
            pointer_source,
        }
    }

    /// Starts (or restarts) calibration. The listener must be running first;
    /// if it cannot start, the current calibration is left untouched.
    pub fn start_calibration(&self) -> ClickerResult<u64> {
        self.pointer_source
            .ensure_listening(self.pointer_sink(), self.listener_failure())?;

        let mut board = self.board.lock();
        let BoardState { store, calibrator } = &mut *board;
        Ok(calibrator.start(store))
    }

    pub fn cancel_calibration(&self) -> bool {
        self.board.lock().calibrator.abort()
    }

    pub fn handle_pointer(&self, event: PointerEvent) -> Progress {
        let mut board = self.board.lock();
        let BoardState { store, calibrator } = &mut *board;
        calibrator.on_pointer(event, store)
    }

    /// Clicks a column (0-based). The board lock is released before the
    /// pointer moves.
    pub fn click_column(&self, index: i64) -> ClickerResult<ScreenPoint> {
        let set = self.board.lock().store.get().cloned();
        self.dispatcher.click_column(set.as_ref(), index)
    }

    pub fn save(&self) -> ClickerResult<&Path> {
        let set = self
            .board
            .lock()
            .store
            .get()
            .cloned()
            .ok_or(ClickerError::NotCalibrated)?;
        self.storage.save(&set)?;
        Ok(self.storage.path())
    }

    /// Loads the saved calibration. A calibration run in progress is dropped.
    /// A file whose bottom row cannot be clicked is rejected as unparseable.
    pub fn load(&self) -> ClickerResult<CoordinateSet> {
        let set = self.storage.load()?;
        self.dispatcher
            .target(Some(&set), 0)
            .map_err(|e| ClickerError::Parse {
                path: self.storage.path().to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut board = self.board.lock();
        board.calibrator.abort();
        board.store.set(set.clone());
        Ok(set)
    }

    pub fn phase(&self) -> Phase {
        let board = self.board.lock();
        board.calibrator.phase(&board.store)
    }

    pub fn coordinates(&self) -> Option<CoordinateSet> {
        self.board.lock().store.get().cloned()
    }

    pub fn status(&self) -> Status {
        let phase = self.phase();
        Status {
            running: true,
            calibrated: phase == Phase::Calibrated,
            calibrating: matches!(phase, Phase::Collecting(_)),
            collected: match phase {
                Phase::Collecting(k) => k,
                _ => 0,
            },
        }
    }

    fn pointer_sink(&self) -> PointerSink {
        let clicker = self.clone();
        Arc::new(move |event| {
            if let Progress::Complete(set) = clicker.handle_pointer(event) {
                info!(columns = ?set.columns(), "Board calibrated; column clicks are live");
            }
        })
    }

    fn listener_failure(&self) -> FailureHook {
        let clicker = self.clone();
        Arc::new(move |reason| {
            if clicker.cancel_calibration() {
                error!(%reason, "Pointer listener died; calibration cancelled");
            }
        })
    }
}
