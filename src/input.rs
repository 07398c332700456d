//! Input module.
//! Global pointer listener that feeds calibration. Uses `rdev` for OS-wide
//! mouse events (cross-platform).
//! rdev reports button presses without a position, so the listener tracks the
//! last `MouseMove` and stamps each press/release with it.
//! `rdev::listen` never returns once running, so the thread is spawned once
//! per process and stays up; sessions that are not collecting simply ignore
//! the events it delivers.
//! Permissions note: on macOS the terminal needs Accessibility permission
//! (System Settings > Privacy & Security > Accessibility).

use crate::board::ScreenPoint;
use crate::calibrate::{PointerAction, PointerButton, PointerEvent};
use crate::error::{ClickerError, ClickerResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{error, info, warn};

/// Receives every pointer button event from a source.
pub type PointerSink = Arc<dyn Fn(PointerEvent) + Send + Sync>;

/// Told when a running source dies, with the reason.
pub type FailureHook = Arc<dyn Fn(String) + Send + Sync>;

/// Anything that can deliver pointer events to the controller.
pub trait PointerSource: Send + Sync {
    /// Makes sure events flow into `sink`. Called on every calibration start;
    /// implementations that are already running may ignore the call.
    /// `on_failure` fires if the source stops after this returned `Ok`.
    fn ensure_listening(&self, sink: PointerSink, on_failure: FailureHook) -> ClickerResult<()>;
}

/// Converts raw rdev events into `PointerEvent`s.
#[derive(Debug, Default)]
pub struct PointerTracker {
    last: Option<(f64, f64)>,
}

impl PointerTracker {
    pub fn translate(&mut self, event: &rdev::EventType) -> Option<PointerEvent> {
        let (action, button) = match event {
            rdev::EventType::MouseMove { x, y } => {
                self.last = Some((*x, *y));
                return None;
            }
            rdev::EventType::ButtonPress(button) => (PointerAction::Press, *button),
            rdev::EventType::ButtonRelease(button) => (PointerAction::Release, *button),
            _ => return None,
        };

        // A press before any movement has no known position.
        let (x, y) = self.last?;
        let (Some(px), Some(py)) = (to_pixel(x), to_pixel(y)) else {
            warn!(x, y, "Ignoring pointer event outside the primary screen space");
            return None;
        };
        Some(PointerEvent {
            action,
            button: map_button(button),
            position: ScreenPoint { x: px, y: py },
        })
    }
}

fn map_button(button: rdev::Button) -> PointerButton {
    match button {
        rdev::Button::Left => PointerButton::Primary,
        rdev::Button::Right => PointerButton::Secondary,
        rdev::Button::Middle => PointerButton::Middle,
        rdev::Button::Unknown(_) => PointerButton::Other,
    }
}

/// Rounds to a whole pixel. `None` for positions left of or above the
/// primary display, or not representable at all.
fn to_pixel(value: f64) -> Option<i32> {
    let rounded = value.round();
    if rounded.is_nan() || rounded < 0.0 || rounded > i32::MAX as f64 {
        return None;
    }
    Some(rounded as i32)
}

/// Production pointer source backed by `rdev::listen`.
#[derive(Debug, Default)]
pub struct RdevPointerSource {
    started: Arc<AtomicBool>,
}

impl RdevPointerSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointerSource for RdevPointerSource {
    fn ensure_listening(&self, sink: PointerSink, on_failure: FailureHook) -> ClickerResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let started = Arc::clone(&self.started);
        let spawned = thread::Builder::new()
            .name("pointer-listener".into())
            .spawn(move || {
                info!("Pointer listener started");
                let mut tracker = PointerTracker::default();
                let result = rdev::listen(move |event| {
                    if let Some(pointer) = tracker.translate(&event.event_type) {
                        sink(pointer);
                    }
                });
                if let Err(e) = result {
                    // Let the next calibration start try again.
                    error!(error = ?e, "Pointer listener stopped. On macOS, grant Accessibility permission to the terminal");
                    started.store(false, Ordering::SeqCst);
                    on_failure(format!("{e:?}"));
                }
            });

        if let Err(e) = spawned {
            self.started.store(false, Ordering::SeqCst);
            return Err(ClickerError::ListenerUnavailable(e.to_string()));
        }
        Ok(())
    }
}
