//! Click dispatch module.
//! Maps a column index onto the calibrated board and fires one synthetic
//! primary click there. Uses `enigo` for input injection.
//! The pointer is left where the click happened.

use crate::board::{CoordinateSet, ScreenPoint};
use crate::config::COLUMN_COUNT;
use crate::error::{ClickerError, ClickerResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Issues synthetic pointer clicks at absolute screen positions.
pub trait ClickInjector: Send + Sync {
    fn click(&self, target: ScreenPoint) -> ClickerResult<()>;
}

/// Production injector. Opens a fresh enigo connection per click; clicks are
/// rare and the connection type is not `Send` on every platform.
#[derive(Debug, Default)]
pub struct EnigoInjector;

impl ClickInjector for EnigoInjector {
    fn click(&self, target: ScreenPoint) -> ClickerResult<()> {
        use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};

        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| ClickerError::InjectionFailed(e.to_string()))?;
        enigo
            .move_mouse(target.x, target.y, Coordinate::Abs)
            .map_err(|e| ClickerError::InjectionFailed(e.to_string()))?;
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| ClickerError::InjectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ClickDispatcher {
    injector: Arc<dyn ClickInjector>,
    click_offset: i32,
}

impl ClickDispatcher {
    pub fn new(injector: Arc<dyn ClickInjector>, click_offset: i32) -> Self {
        Self {
            injector,
            click_offset,
        }
    }

    /// Screen position for a column: its x, slightly above the bottom row.
    /// Checks calibration before the index.
    pub fn target(&self, set: Option<&CoordinateSet>, index: i64) -> ClickerResult<ScreenPoint> {
        let set = set.ok_or(ClickerError::NotCalibrated)?;
        let x = usize::try_from(index)
            .ok()
            .filter(|i| *i < COLUMN_COUNT)
            .and_then(|i| set.column_x(i))
            .ok_or_else(|| ClickerError::InvalidColumn(index.to_string()))?;

        let y = set
            .board_bottom()
            .checked_sub(self.click_offset)
            .filter(|y| *y >= 0)
            .ok_or_else(|| {
                ClickerError::InvalidGeometry(format!(
                    "board bottom {} minus click offset {} is off screen",
                    set.board_bottom(),
                    self.click_offset
                ))
            })?;

        Ok(ScreenPoint { x, y })
    }

    /// Validates, then clicks. Blocks until the injection returns.
    pub fn click_column(&self, set: Option<&CoordinateSet>, index: i64) -> ClickerResult<ScreenPoint> {
        let target = self.target(set, index)?;
        debug!(column = index, %target, "Injecting click");
        self.injector.click(target)?;
        info!("Clicked column {} at {}", index + 1, target);
        Ok(target)
    }
}
