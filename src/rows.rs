//! Row store: the physical, unfiltered row sequence.
//!
//! Positions in this store are *physical indices*. Sorting reorders the
//! store in place, so physical indices always follow the sorted order.

use std::cmp::Ordering;

use crate::types::Row;

/// Ordered row data owned by the grid controller.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Vec<Row>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all rows.
    pub fn reset(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    /// Splice `rows` in at physical index `at` (append when `None`).
    ///
    /// `at` is clamped to `0..=len`. Returns the physical index of the first
    /// inserted row.
    pub fn add(&mut self, rows: Vec<Row>, at: Option<usize>) -> usize {
        let at = at.map_or(self.rows.len(), |i| i.min(self.rows.len()));
        self.rows.splice(at..at, rows);
        at
    }

    /// Remove `count` rows starting at `physical`.
    ///
    /// The range is clamped to the store; the removed rows are returned
    /// (empty when `physical` is out of range).
    pub fn remove(&mut self, physical: usize, count: usize) -> Vec<Row> {
        if physical >= self.rows.len() {
            return Vec::new();
        }
        let end = physical.saturating_add(count).min(self.rows.len());
        self.rows.drain(physical..end).collect()
    }

    /// Physical index of the first row equal to `row`.
    pub fn index_of(&self, row: &Row) -> Option<usize> {
        self.rows.iter().position(|r| r == row)
    }

    pub fn get(&self, physical: usize) -> Option<&Row> {
        self.rows.get(physical)
    }

    pub fn get_mut(&mut self, physical: usize) -> Option<&mut Row> {
        self.rows.get_mut(physical)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[Row] {
        &self.rows
    }

    /// Stable in-place sort.
    ///
    /// Returns the permutation applied: `permutation[new] = old`, so callers
    /// holding old physical indices can remap them.
    pub fn sort_by<F>(&mut self, mut compare: F) -> Vec<usize>
    where
        F: FnMut(&Row, &Row) -> Ordering,
    {
        let mut tagged: Vec<(usize, Row)> = std::mem::take(&mut self.rows)
            .into_iter()
            .enumerate()
            .collect();
        tagged.sort_by(|(_, a), (_, b)| compare(a, b));

        let mut permutation = Vec::with_capacity(tagged.len());
        self.rows = tagged
            .into_iter()
            .map(|(old, row)| {
                permutation.push(old);
                row
            })
            .collect();
        permutation
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
    use serde_json::json;

    fn store(n: i64) -> RowStore {
        let mut s = RowStore::new();
        s.reset((0..n).map(|i| json!({ "id": i })).collect());
        s
    }

    #[test]
    fn test_add_clamps_index() {
        let mut s = store(3);
        assert_eq!(s.add(vec![json!({"id": 9})], Some(10)), 3);
        assert_eq!(s.get(3), Some(&json!({"id": 9})));
        assert_eq!(s.add(vec![json!({"id": 7})], Some(0)), 0);
        assert_eq!(s.get(0), Some(&json!({"id": 7})));
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn test_remove_range() {
        let mut s = store(5);
        let removed = s.remove(1, 2);
        assert_eq!(removed, vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(1), Some(&json!({"id": 3})));

        assert!(s.remove(10, 1).is_empty());
        assert_eq!(s.remove(2, 100).len(), 1);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_index_of() {
        let s = store(4);
        assert_eq!(s.index_of(&json!({"id": 2})), Some(2));
        assert_eq!(s.index_of(&json!({"id": 99})), None);
    }

    #[test]
    fn test_sort_returns_permutation() {
        let mut s = RowStore::new();
        s.reset(vec![json!(3), json!(1), json!(2), json!(1)]);
        let perm = s.sort_by(|a, b| a.as_i64().cmp(&b.as_i64()));
        assert_eq!(s.as_slice(), &[json!(1), json!(1), json!(2), json!(3)]);
        // stable: the first 1 (old index 1) stays ahead of the second (old 3)
        assert_eq!(perm, vec![1, 3, 2, 0]);
    }
}
