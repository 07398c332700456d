//! Calibration module.
//! The user clicks the bottom cell of every column, left to right. Each primary
//! press becomes one reference point; the first point's y is the board bottom
//! and the board top sits a fixed offset above it.
//! State flow: Idle -> Collecting(k) -> Calibrated.
//! Pointer events arrive from the global listener in `input.rs`; this module
//! only consumes them, so it can be driven directly in tests.

use crate::board::{CoordinateSet, CoordinateStore, ScreenPoint};
use crate::config::COLUMN_COUNT;
use crate::error::ClickerError;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
    Press,
    Release,
}

/// A pointer button event at an absolute screen position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub button: PointerButton,
    pub position: ScreenPoint,
}

impl PointerEvent {
    #[cfg(test)]
    pub fn primary_press(x: i32, y: i32) -> Self {
        Self {
            action: PointerAction::Press,
            button: PointerButton::Primary,
            position: ScreenPoint { x, y },
        }
    }
}

/// Points collected by one calibration run.
#[derive(Debug)]
pub struct CalibrationSession {
    id: u64,
    points: Vec<ScreenPoint>,
}

impl CalibrationSession {
    fn new(id: u64) -> Self {
        Self {
            id,
            points: Vec::with_capacity(COLUMN_COUNT),
        }
    }

    pub fn collected(&self) -> usize {
        self.points.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Collecting(usize),
    Calibrated,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "Not calibrated"),
            Phase::Collecting(k) => write!(
                f,
                "Calibrating: click bottom cell of column {} ({}/{} recorded)",
                k + 1,
                k,
                COLUMN_COUNT
            ),
            Phase::Calibrated => write!(f, "Calibrated"),
        }
    }
}

/// Outcome of feeding one pointer event to the calibrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Not collecting, or not a primary press
    Ignored,
    Collected { collected: usize, remaining: usize },
    Complete(CoordinateSet),
}

#[derive(Debug)]
pub struct Calibrator {
    top_offset: i32,
    session: Option<CalibrationSession>,
    next_id: u64,
}

impl Calibrator {
    pub fn new(top_offset: i32) -> Self {
        Self {
            top_offset,
            session: None,
            next_id: 1,
        }
    }

    /// Begins a fresh session and clears the stored coordinates.
    /// A session already in progress is discarded, never merged.
    pub fn start(&mut self, store: &mut CoordinateStore) -> u64 {
        if let Some(old) = self.session.take() {
            info!(
                session = old.id,
                collected = old.collected(),
                "Replacing unfinished calibration session"
            );
        }
        store.clear();

        let id = self.next_id;
        self.next_id += 1;
        self.session = Some(CalibrationSession::new(id));
        info!(session = id, "Calibration started: click bottom cell of column 1");
        id
    }

    /// Drops the running session. Returns false when nothing was running.
    pub fn abort(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                info!(session = session.id, "Calibration cancelled");
                true
            }
            None => false,
        }
    }

    pub fn phase(&self, store: &CoordinateStore) -> Phase {
        match &self.session {
            Some(session) => Phase::Collecting(session.collected()),
            None if store.is_calibrated() => Phase::Calibrated,
            None => Phase::Idle,
        }
    }

    pub fn on_pointer(&mut self, event: PointerEvent, store: &mut CoordinateStore) -> Progress {
        if event.action != PointerAction::Press || event.button != PointerButton::Primary {
            return Progress::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return Progress::Ignored;
        };

        session.points.push(event.position);
        let collected = session.collected();
        debug!(session = session.id, point = %event.position, collected, "Calibration point recorded");

        if collected < COLUMN_COUNT {
            info!(
                "Recorded column {collected}/{COLUMN_COUNT}; click bottom cell of column {}",
                collected + 1
            );
            return Progress::Collected {
                collected,
                remaining: COLUMN_COUNT - collected,
            };
        }

        let Some(session) = self.session.take() else {
            return Progress::Ignored;
        };
        let columns: Vec<i32> = session.points.iter().map(|p| p.x).collect();
        let board_bottom = session.points[0].y;
        let geometry = board_bottom
            .checked_sub(self.top_offset)
            .ok_or_else(|| {
                ClickerError::InvalidGeometry(format!(
                    "board bottom {board_bottom} minus top offset {}",
                    self.top_offset
                ))
            })
            .and_then(|board_top| CoordinateSet::new(&columns, board_top, board_bottom));

        match geometry {
            Ok(set) => {
                info!(
                    session = session.id,
                    ?columns,
                    board_top = set.board_top(),
                    board_bottom,
                    "Calibration complete"
                );
                store.set(set.clone());
                Progress::Complete(set)
            }
            Err(e) => {
                warn!(session = session.id, error = %e, "Discarding calibration");
                Progress::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(x: i32, y: i32) -> PointerEvent {
        PointerEvent {
            action: PointerAction::Release,
            ..PointerEvent::primary_press(x, y)
        }
    }

    fn secondary(x: i32, y: i32) -> PointerEvent {
        PointerEvent {
            button: PointerButton::Secondary,
            ..PointerEvent::primary_press(x, y)
        }
    }

    #[test]
    fn test_seven_clicks_calibrate_board() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(300);
        calibrator.start(&mut store);

        let mut last = Progress::Ignored;
        for i in 1..=7 {
            last = calibrator.on_pointer(PointerEvent::primary_press(i * 100, 500), &mut store);
        }

        let set = store.get().expect("store should be calibrated");
        assert_eq!(set.columns(), &[100, 200, 300, 400, 500, 600, 700]);
        assert_eq!(set.board_bottom(), 500);
        assert_eq!(set.board_top(), 200);
        assert_eq!(last, Progress::Complete(set.clone()));
        assert_eq!(calibrator.phase(&store), Phase::Calibrated);
    }

    #[test]
    fn test_fewer_than_seven_points_leave_uncalibrated() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(300);
        calibrator.start(&mut store);

        for i in 1..=6 {
            let progress = calibrator.on_pointer(PointerEvent::primary_press(i * 10, 400), &mut store);
            assert_eq!(
                progress,
                Progress::Collected {
                    collected: i as usize,
                    remaining: 7 - i as usize
                }
            );
        }
        assert!(!store.is_calibrated());
        assert_eq!(calibrator.phase(&store), Phase::Collecting(6));
    }

    #[test]
    fn test_board_top_follows_first_point_only() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(300);
        calibrator.start(&mut store);

        let ys = [640, 610, 700, 590, 655, 620, 801];
        for (i, y) in ys.iter().enumerate() {
            calibrator.on_pointer(PointerEvent::primary_press(i as i32 * 50, *y), &mut store);
        }

        let set = store.get().unwrap();
        assert_eq!(set.board_bottom(), 640);
        assert_eq!(set.board_top(), 340);
    }

    #[test]
    fn test_top_offset_is_configurable() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(250);
        calibrator.start(&mut store);
        for i in 0..7 {
            calibrator.on_pointer(PointerEvent::primary_press(i, 260), &mut store);
        }
        assert_eq!(store.get().unwrap().board_top(), 10);
    }

    #[test]
    fn test_overflowing_top_offset_discards_session() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(i32::MAX);
        calibrator.start(&mut store);
        for i in 0..6 {
            calibrator.on_pointer(PointerEvent::primary_press(i, i32::MIN + 1), &mut store);
        }
        let last = calibrator.on_pointer(PointerEvent::primary_press(6, 0), &mut store);

        assert_eq!(last, Progress::Ignored);
        assert!(!store.is_calibrated());
        assert_eq!(calibrator.phase(&store), Phase::Idle);
    }

    #[test]
    fn test_releases_and_other_buttons_are_ignored() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(300);
        calibrator.start(&mut store);

        assert_eq!(calibrator.on_pointer(release(1, 1), &mut store), Progress::Ignored);
        assert_eq!(calibrator.on_pointer(secondary(1, 1), &mut store), Progress::Ignored);
        let middle = PointerEvent {
            button: PointerButton::Middle,
            ..PointerEvent::primary_press(1, 1)
        };
        assert_eq!(calibrator.on_pointer(middle, &mut store), Progress::Ignored);
        assert_eq!(calibrator.phase(&store), Phase::Collecting(0));
    }

    #[test]
    fn test_events_outside_session_are_ignored() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(300);
        assert_eq!(
            calibrator.on_pointer(PointerEvent::primary_press(5, 5), &mut store),
            Progress::Ignored
        );
        assert_eq!(calibrator.phase(&store), Phase::Idle);
    }

    #[test]
    fn test_restart_discards_previous_points() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(300);
        let first = calibrator.start(&mut store);
        for i in 0..4 {
            calibrator.on_pointer(PointerEvent::primary_press(9000 + i, 900), &mut store);
        }

        let second = calibrator.start(&mut store);
        assert!(second > first);
        assert_eq!(calibrator.phase(&store), Phase::Collecting(0));

        for i in 1..=7 {
            calibrator.on_pointer(PointerEvent::primary_press(i * 100, 500), &mut store);
        }
        let set = store.get().unwrap();
        assert_eq!(set.columns(), &[100, 200, 300, 400, 500, 600, 700]);
        assert_eq!(set.board_bottom(), 500);
    }

    #[test]
    fn test_start_clears_previous_calibration() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(300);
        calibrator.start(&mut store);
        for i in 0..7 {
            calibrator.on_pointer(PointerEvent::primary_press(i, 400), &mut store);
        }
        assert!(store.is_calibrated());

        calibrator.start(&mut store);
        assert!(!store.is_calibrated());
    }

    #[test]
    fn test_abort_returns_to_idle() {
        let mut store = CoordinateStore::default();
        let mut calibrator = Calibrator::new(300);
        assert!(!calibrator.abort());

        calibrator.start(&mut store);
        calibrator.on_pointer(PointerEvent::primary_press(10, 10), &mut store);
        assert!(calibrator.abort());
        assert_eq!(calibrator.phase(&store), Phase::Idle);
        assert_eq!(
            calibrator.on_pointer(PointerEvent::primary_press(10, 10), &mut store),
            Progress::Ignored
        );
    }

    #[test]
    fn test_phase_display_names_next_column() {
        assert_eq!(
            Phase::Collecting(2).to_string(),
            "Calibrating: click bottom cell of column 3 (2/7 recorded)"
        );
        assert_eq!(Phase::Idle.to_string(), "Not calibrated");
    }
}
