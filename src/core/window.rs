//! Auto-growing rectangular storage for one layer.
//!
//! Slots are kept as `rows[y - origin_y][x - origin_x]`. The window starts
//! empty and grows one row or column at a time until it covers a requested
//! coordinate, so it always matches the bounding box of everything ever
//! stored in it. It never shrinks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::CellId;

/// Inclusive bounds of a non-empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn width(&self) -> usize {
        (self.max_x - self.min_x + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.max_y - self.min_y + 1) as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Window {
    origin_x: i32,
    origin_y: i32,
    width: usize,
    height: usize,
    rows: Vec<Vec<Option<CellId>>>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn bounds(&self) -> Option<Bounds> {
        if self.is_empty() {
            return None;
        }
        Some(Bounds {
            min_x: self.origin_x,
            min_y: self.origin_y,
            max_x: self.origin_x + self.width as i32 - 1,
            max_y: self.origin_y + self.height as i32 - 1,
        })
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty()
            && x >= self.origin_x
            && y >= self.origin_y
            && ((x - self.origin_x) as usize) < self.width
            && ((y - self.origin_y) as usize) < self.height
    }

    fn slot(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        if !self.contains(x, y) {
            return None;
        }
        Some(((y - self.origin_y) as usize, (x - self.origin_x) as usize))
    }

    /// Stored id at `(x, y)`; `None` when out of bounds or unobserved.
    pub fn get(&self, x: i32, y: i32) -> Option<CellId> {
        let (row, col) = self.slot(x, y)?;
        self.rows[row][col]
    }

    /// Store `id` at `(x, y)`, growing as needed. Returns the previous occupant.
    pub fn put(&mut self, x: i32, y: i32, id: CellId) -> Option<CellId> {
        self.grow_to(x, y);
        let (row, col) = match self.slot(x, y) {
            Some(slot) => slot,
            None => return None,
        };
        self.rows[row][col].replace(id)
    }

    /// Grow until `(x, y)` is covered. Returns whether anything changed.
    pub fn grow_to(&mut self, x: i32, y: i32) -> bool {
        if self.is_empty() {
            self.origin_x = x;
            self.origin_y = y;
            self.width = 1;
            self.height = 1;
            self.rows = vec![vec![None]];
            return true;
        }

        let mut grown = false;

        // Left: prepend a column to every row.
        while x < self.origin_x {
            for row in &mut self.rows {
                row.insert(0, None);
            }
            self.width += 1;
            self.origin_x -= 1;
            grown = true;
        }

        // Right.
        while x >= self.origin_x + self.width as i32 {
            for row in &mut self.rows {
                row.push(None);
            }
            self.width += 1;
            grown = true;
        }

        // Above.
        while y < self.origin_y {
            self.rows.insert(0, vec![None; self.width]);
            self.height += 1;
            self.origin_y -= 1;
            grown = true;
        }

        // Below.
        while y >= self.origin_y + self.height as i32 {
            self.rows.push(vec![None; self.width]);
            self.height += 1;
            grown = true;
        }

        grown
    }

    /// Occupied slots in row-major order as `(x, y, id)`.
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32, CellId)> + '_ {
        self.rows.iter().enumerate().flat_map(move |(r, row)| {
            row.iter().enumerate().filter_map(move |(c, slot)| {
                slot.map(|id| (self.origin_x + c as i32, self.origin_y + r as i32, id))
            })
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.rows.iter().flatten().filter(|s| s.is_some()).count()
    }
}
