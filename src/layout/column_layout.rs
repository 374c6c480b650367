//! Pre-computed horizontal geometry for the visible columns.
//!
//! Built from the allocated widths so x-offsets can be mapped back to
//! columns with a binary search, and resize handles can be hit-tested.

use std::cmp::Ordering;

/// Cumulative x positions of the visible columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    /// `positions[i]` = x of column i's left edge; one extra trailing edge
    pub positions: Vec<f64>,
    /// Widths in display order
    pub widths: Vec<f64>,
}

impl ColumnLayout {
    pub fn new(widths: &[f64]) -> Self {
        let mut positions = Vec::with_capacity(widths.len() + 1);
        let mut x = 0.0;
        for w in widths {
            positions.push(x);
            x += w.max(0.0);
        }
        positions.push(x); // Final edge
        Self {
            positions,
            widths: widths.to_vec(),
        }
    }

    /// Total width of all columns
    pub fn total_width(&self) -> f64 {
        self.positions.last().copied().unwrap_or(0.0)
    }

    pub fn left(&self, position: usize) -> Option<f64> {
        if position < self.widths.len() {
            self.positions.get(position).copied()
        } else {
            None
        }
    }

    pub fn right(&self, position: usize) -> Option<f64> {
        if position < self.widths.len() {
            self.positions.get(position + 1).copied()
        } else {
            None
        }
    }

    /// Find the column at x (binary search). `None` outside the columns.
    pub fn column_at_x(&self, x: f64) -> Option<usize> {
        if self.widths.is_empty() || x < 0.0 || x >= self.total_width() {
            return None;
        }
        let idx = match self
            .positions
            .binary_search_by(|pos| pos.partial_cmp(&x).unwrap_or(Ordering::Equal))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        Some(idx.min(self.widths.len() - 1))
    }

    /// Column whose right border lies within `hit_width / 2` of x.
    ///
    /// Near a column's left border this resolves to the previous column,
    /// since that border is the previous column's right edge.
    pub fn resize_target(&self, x: f64, hit_width: f64) -> Option<usize> {
        let half = (hit_width / 2.0).max(0.0);
        let col = self.column_at_x(x).or_else(|| {
            // Just past the last border still grabs the last column
            (x >= self.total_width() && x <= self.total_width() + half)
                .then(|| self.widths.len().checked_sub(1))
                .flatten()
        })?;

        let left = self.left(col)?;
        let right = self.right(col)?;
        if (right - x).abs() <= half {
            Some(col)
        } else if col > 0 && (x - left).abs() <= half {
            Some(col - 1)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn layout() -> ColumnLayout {
        ColumnLayout::new(&[100.0, 50.0, 80.0])
    }

    #[test]
    fn test_positions() {
        let l = layout();
        assert_eq!(l.positions, vec![0.0, 100.0, 150.0, 230.0]);
        assert_eq!(l.total_width(), 230.0);
        assert_eq!(l.left(1), Some(100.0));
        assert_eq!(l.right(2), Some(230.0));
        assert_eq!(l.right(3), None);
    }

    #[test]
    fn test_column_at_x() {
        let l = layout();
        assert_eq!(l.column_at_x(0.0), Some(0));
        assert_eq!(l.column_at_x(99.9), Some(0));
        assert_eq!(l.column_at_x(100.0), Some(1));
        assert_eq!(l.column_at_x(229.0), Some(2));
        assert_eq!(l.column_at_x(230.0), None);
        assert_eq!(l.column_at_x(-1.0), None);
    }

    #[test]
    fn test_resize_target() {
        let l = layout();
        assert_eq!(l.resize_target(97.0, 8.0), Some(0));
        assert_eq!(l.resize_target(103.0, 8.0), Some(0));
        assert_eq!(l.resize_target(125.0, 8.0), None);
        assert_eq!(l.resize_target(148.0, 8.0), Some(1));
        assert_eq!(l.resize_target(2.0, 8.0), None);
        assert_eq!(l.resize_target(232.0, 8.0), Some(2));
        assert_eq!(l.resize_target(300.0, 8.0), None);
    }
}
