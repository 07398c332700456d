//! Coordinate store.
//! Holds the calibrated screen geometry of the board: one x-coordinate per
//! column (left to right) plus the y-coordinates of the board's top and bottom.
//! The store is calibrated exactly when it holds a `CoordinateSet`.

use crate::config::COLUMN_COUNT;
use crate::error::{ClickerError, ClickerResult};

/// Absolute screen position in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl std::fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinateSet {
    columns: [i32; COLUMN_COUNT],
    board_top: i32,
    board_bottom: i32,
}

impl CoordinateSet {
    /// Builds a set from raw values. Fails unless there are exactly
    /// `COLUMN_COUNT` columns, none of them negative, and the board bottom
    /// is on screen.
    pub fn new(columns: &[i32], board_top: i32, board_bottom: i32) -> ClickerResult<Self> {
        let columns: [i32; COLUMN_COUNT] = columns.try_into().map_err(|_| {
            ClickerError::InvalidGeometry(format!(
                "{} columns (expected {})",
                columns.len(),
                COLUMN_COUNT
            ))
        })?;
        if let Some(x) = columns.iter().find(|x| **x < 0) {
            return Err(ClickerError::InvalidGeometry(format!("negative column x {x}")));
        }
        if board_bottom < 0 {
            return Err(ClickerError::InvalidGeometry(format!(
                "negative board bottom {board_bottom}"
            )));
        }
        Ok(Self {
            columns,
            board_top,
            board_bottom,
        })
    }

    pub fn columns(&self) -> &[i32; COLUMN_COUNT] {
        &self.columns
    }

    pub fn board_top(&self) -> i32 {
        self.board_top
    }

    pub fn board_bottom(&self) -> i32 {
        self.board_bottom
    }

    /// X-coordinate of a column, if the index is on the board.
    pub fn column_x(&self, index: usize) -> Option<i32> {
        self.columns.get(index).copied()
    }
}

#[derive(Debug, Default)]
pub struct CoordinateStore {
    current: Option<CoordinateSet>,
}

impl CoordinateStore {
    pub fn is_calibrated(&self) -> bool {
        self.current.is_some()
    }

    pub fn get(&self) -> Option<&CoordinateSet> {
        self.current.as_ref()
    }

    pub fn set(&mut self, set: CoordinateSet) {
        self.current = Some(set);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_seven_columns() {
        assert!(CoordinateSet::new(&[1, 2, 3], 0, 10).is_err());
        assert!(CoordinateSet::new(&[1, 2, 3, 4, 5, 6, 7, 8], 0, 10).is_err());
        let set = CoordinateSet::new(&[1, 2, 3, 4, 5, 6, 7], -20, 10).unwrap();
        assert_eq!(set.columns(), &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(set.board_top(), -20);
        assert_eq!(set.board_bottom(), 10);
    }

    #[test]
    fn test_new_rejects_negative_columns() {
        let err = CoordinateSet::new(&[1, 2, -3, 4, 5, 6, 7], 0, 10).unwrap_err();
        assert!(matches!(err, ClickerError::InvalidGeometry(_)));
        assert_eq!(err.to_string(), "Invalid board geometry: negative column x -3");
    }

    #[test]
    fn test_new_rejects_negative_board_bottom() {
        let err = CoordinateSet::new(&[1, 2, 3, 4, 5, 6, 7], 0, i32::MIN).unwrap_err();
        assert!(matches!(err, ClickerError::InvalidGeometry(_)));
    }

    #[test]
    fn test_column_x_bounds() {
        let set = CoordinateSet::new(&[10, 20, 30, 40, 50, 60, 70], 0, 300).unwrap();
        assert_eq!(set.column_x(0), Some(10));
        assert_eq!(set.column_x(6), Some(70));
        assert_eq!(set.column_x(7), None);
    }

    #[test]
    fn test_store_calibrated_iff_set_present() {
        let mut store = CoordinateStore::default();
        assert!(!store.is_calibrated());
        store.set(CoordinateSet::new(&[0; 7], 0, 0).unwrap());
        assert!(store.is_calibrated());
        store.clear();
        assert!(store.get().is_none());
    }
}
