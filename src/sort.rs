//! Sort engine: the multi-key sort stack and comparator composition.
//!
//! The stack is evaluated in order: entry 0 is the primary key and later
//! entries break ties. Toggling appends the toggled column at the end.

use std::cmp::Ordering;
use std::rc::Rc;

use serde_json::Value;

use crate::types::{value_at_path, Column, DataPath, Row, SortColumn, SortExport};

/// `(a, b) -> ordering` over whole rows.
pub type Comparator = Rc<dyn Fn(&Row, &Row) -> Ordering>;

/// `(column name, descending) -> comparator`. Returning `None` falls back
/// to the natural-order comparator for that column.
pub type ComparatorProvider = Rc<dyn Fn(&str, bool) -> Option<Comparator>>;

/// Rank used to order values of different JSON types.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Natural ordering of two JSON values.
///
/// Missing values sort with null, first. Numbers compare numerically,
/// strings lexically; mixed types order null < bool < number < string <
/// array < object.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (ex, ey) in x.iter().zip(y) {
                let ord = compare_values(Some(ex), Some(ey));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Comparator over `path` using [`compare_values`].
pub fn default_comparator(path: DataPath, descending: bool) -> Comparator {
    Rc::new(move |a: &Row, b: &Row| {
        let ord = compare_values(value_at_path(a, &path), value_at_path(b, &path));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    })
}

#[derive(Clone)]
pub struct SortEngine {
    stack: Vec<SortColumn>,
    max_depth: usize,
    provider: Option<ComparatorProvider>,
}

impl Default for SortEngine {
    fn default() -> Self {
        Self::new(1)
    }
}

impl std::fmt::Debug for SortEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortEngine")
            .field("stack", &self.stack)
            .field("max_depth", &self.max_depth)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

impl SortEngine {
    /// `max_depth` below 1 is raised to 1.
    pub fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth: max_depth.max(1),
            provider: None,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Change the depth bound, trimming the oldest entries if the stack is
    /// now too deep.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        if self.stack.len() > self.max_depth {
            let excess = self.stack.len() - self.max_depth;
            self.stack.drain(..excess);
        }
    }

    pub fn set_comparator_provider(&mut self, provider: Option<ComparatorProvider>) {
        self.provider = provider;
    }

    pub fn stack(&self) -> &[SortColumn] {
        &self.stack
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn is_sorted_by(&self, column: &str) -> bool {
        self.stack.iter().any(|s| s.column == column)
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Apply a sort request for `column`.
    ///
    /// `descending = None` toggles direction when `column` is the most
    /// recent key, otherwise sorts ascending. With `add`, the most recent
    /// key is popped when it is `column`; an older key restarts the stack
    /// with `column` alone. A new column is appended, clearing the stack
    /// first when the depth bound or `visible_count` would be exceeded.
    pub fn toggle(
        &mut self,
        column: &Column,
        descending: Option<bool>,
        add: bool,
        visible_count: usize,
    ) {
        let descending = match (descending, self.stack.last()) {
            (Some(d), _) => d,
            (None, Some(last)) if last.column == column.name => !last.descending,
            (None, _) => false,
        };

        if add {
            if let Some(pos) = self.stack.iter().position(|s| s.column == column.name) {
                if pos + 1 == self.stack.len() {
                    self.stack.pop();
                    return;
                }
                self.stack.clear();
            } else if self.stack.len() >= self.max_depth || self.stack.len() >= visible_count {
                self.stack.clear();
            }
        } else {
            self.stack.clear();
        }

        self.stack.push(SortColumn {
            column: column.name.clone(),
            compare_path: column.compare_path.clone(),
            descending,
        });
    }

    /// Push an entry without toggle semantics (initial sort option).
    /// Entries beyond the depth bound are ignored.
    pub fn push(&mut self, column: &Column, descending: bool) {
        if self.stack.len() >= self.max_depth || self.is_sorted_by(&column.name) {
            return;
        }
        self.stack.push(SortColumn {
            column: column.name.clone(),
            compare_path: column.compare_path.clone(),
            descending,
        });
    }

    /// Drop entries whose column no longer exists. Returns how many were
    /// dropped.
    pub fn retain_existing<F>(&mut self, exists: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.stack.len();
        self.stack.retain(|s| exists(&s.column));
        before - self.stack.len()
    }

    /// Composite comparator for the current stack, `None` when unsorted.
    pub fn comparator(&self) -> Option<Comparator> {
        if self.stack.is_empty() {
            return None;
        }
        let keys: Vec<Comparator> = self
            .stack
            .iter()
            .map(|entry| {
                self.provider
                    .as_ref()
                    .and_then(|provider| provider(&entry.column, entry.descending))
                    .unwrap_or_else(|| {
                        default_comparator(entry.compare_path.clone(), entry.descending)
                    })
            })
            .collect();

        Some(Rc::new(move |a: &Row, b: &Row| {
            for key in &keys {
                let ord = key(a, b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        }))
    }

    pub fn export(&self) -> Vec<SortExport> {
        self.stack
            .iter()
            .map(|s| SortExport {
                column: s.column.clone(),
                descending: s.descending,
            })
            .collect()
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
    use crate::types::ColumnDef;
    use serde_json::json;

    fn col(name: &str) -> Column {
        Column::from_def(&ColumnDef::new(name), 35.0)
    }

    fn names(engine: &SortEngine) -> Vec<(String, bool)> {
        engine
            .stack()
            .iter()
            .map(|s| (s.column.clone(), s.descending))
            .collect()
    }

    #[test]
    fn test_replace_toggles_direction() {
        let mut engine = SortEngine::new(1);
        engine.toggle(&col("a"), None, false, 3);
        assert_eq!(names(&engine), vec![("a".into(), false)]);
        engine.toggle(&col("a"), None, false, 3);
        assert_eq!(names(&engine), vec![("a".into(), true)]);
        engine.toggle(&col("b"), None, false, 3);
        assert_eq!(names(&engine), vec![("b".into(), false)]);
    }

    #[test]
    fn test_augment_present_most_recent_pops() {
        let mut engine = SortEngine::new(3);
        engine.toggle(&col("a"), None, true, 3);
        engine.toggle(&col("a"), None, true, 3);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_augment_present_older_restarts_with_it() {
        let mut engine = SortEngine::new(3);
        engine.toggle(&col("a"), None, true, 3);
        engine.toggle(&col("b"), Some(true), true, 3);
        engine.toggle(&col("a"), None, true, 3);
        assert_eq!(names(&engine), vec![("a".into(), false)]);
    }

    #[test]
    fn test_augment_respects_bounds() {
        let mut engine = SortEngine::new(2);
        engine.toggle(&col("a"), None, true, 5);
        engine.toggle(&col("b"), Some(true), true, 5);
        assert_eq!(
            names(&engine),
            vec![("a".into(), false), ("b".into(), true)]
        );
        engine.toggle(&col("c"), None, true, 5);
        assert_eq!(names(&engine), vec![("c".into(), false)]);

        // visible column count also bounds the stack
        let mut engine = SortEngine::new(5);
        engine.toggle(&col("a"), None, true, 1);
        engine.toggle(&col("b"), None, true, 1);
        assert_eq!(names(&engine), vec![("b".into(), false)]);
    }

    #[test]
    fn test_composite_comparator_primary_first() {
        let mut engine = SortEngine::new(2);
        engine.toggle(&col("g"), None, true, 2);
        engine.toggle(&col("n"), Some(true), true, 2);
        let cmp = engine.comparator().unwrap();

        let mut rows = vec![
            json!({"g": 2, "n": 1}),
            json!({"g": 1, "n": 1}),
            json!({"g": 1, "n": 5}),
        ];
        rows.sort_by(|a, b| cmp(a, b));
        assert_eq!(
            rows,
            vec![
                json!({"g": 1, "n": 5}),
                json!({"g": 1, "n": 1}),
                json!({"g": 2, "n": 1}),
            ]
        );
    }

    #[test]
    fn test_provider_overrides_default() {
        let mut engine = SortEngine::new(1);
        engine.set_comparator_provider(Some(Rc::new(|column: &str, _desc: bool| {
            if column == "len" {
                let cmp: Comparator = Rc::new(|a: &Row, b: &Row| {
                    let l = |r: &Row| r["len"].as_str().map_or(0, str::len);
                    l(a).cmp(&l(b))
                });
                Some(cmp)
            } else {
                None
            }
        })));
        engine.toggle(&col("len"), None, false, 1);
        let cmp = engine.comparator().unwrap();
        assert_eq!(
            cmp(&json!({"len": "zz"}), &json!({"len": "aaa"})),
            Ordering::Less
        );
    }

    #[test]
    fn test_retain_existing() {
        let mut engine = SortEngine::new(3);
        engine.toggle(&col("a"), None, true, 3);
        engine.toggle(&col("b"), None, true, 3);
        assert_eq!(engine.retain_existing(|c| c != "a"), 1);
        assert_eq!(names(&engine), vec![("b".into(), false)]);
    }

    #[test]
    fn test_mixed_types_order() {
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!(10)), Some(&json!(9.5))),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!(3))),
            Ordering::Greater
        );
    }
}
