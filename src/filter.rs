//! Filter view: the filtered, ordered subsequence of the row store.
//!
//! Each display index maps to exactly one physical index. The view is
//! rebuilt from scratch whenever rows change or the filter arguments
//! change; after a sort it is remapped and re-sorted, never re-derived.

use std::cmp::Ordering;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rows::RowStore;
use crate::types::{parse_path, value_at_path, value_to_text, Row};

/// Arguments handed to the filter predicate, opaque to the grid.
pub type FilterArgs = Value;

/// `(row, args) -> keep`
pub type FilterPredicate = Rc<dyn Fn(&Row, &FilterArgs) -> bool>;

/// One or more column paths.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum FilterColumns {
    One(String),
    Many(Vec<String>),
}

/// Arguments understood by the default by-column predicate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnFilter {
    pub column: Option<FilterColumns>,
    pub keyword: Option<Value>,
    pub case_sensitive: bool,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            column: Some(FilterColumns::One(column.into())),
            keyword: Some(Value::String(keyword.into())),
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    pub fn to_args(&self) -> FilterArgs {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Substring match of the keyword against any listed column.
    ///
    /// An empty keyword or missing column matches every row; a missing or
    /// null value never matches.
    pub fn matches(&self, row: &Row) -> bool {
        let keyword = self
            .keyword
            .as_ref()
            .and_then(value_to_text)
            .unwrap_or_default();
        let columns: Vec<&str> = match &self.column {
            None => Vec::new(),
            Some(FilterColumns::One(c)) => vec![c.as_str()],
            Some(FilterColumns::Many(cs)) => cs.iter().map(String::as_str).collect(),
        };
        if keyword.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return true;
        }

        let keyword = if self.case_sensitive {
            keyword
        } else {
            keyword.to_lowercase()
        };

        columns.iter().any(|column| {
            value_at_path(row, &parse_path(column))
                .and_then(value_to_text)
                .is_some_and(|text| {
                    if self.case_sensitive {
                        text.contains(&keyword)
                    } else {
                        text.to_lowercase().contains(&keyword)
                    }
                })
        })
    }
}

/// The default predicate: decodes [`ColumnFilter`] from the args.
///
/// Args that don't decode match every row.
pub fn by_column_filter() -> FilterPredicate {
    Rc::new(|row: &Row, args: &FilterArgs| {
        match serde_json::from_value::<ColumnFilter>(args.clone()) {
            Ok(filter) => filter.matches(row),
            Err(_) => true,
        }
    })
}

/// Filtered display sequence: `entries[display] = physical`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterView {
    entries: Vec<usize>,
}

impl FilterView {
    /// Evaluate `predicate` against every row, in physical order.
    pub fn apply(
        store: &RowStore,
        predicate: &dyn Fn(&Row, &FilterArgs) -> bool,
        args: &FilterArgs,
    ) -> Self {
        let entries = store
            .iter()
            .enumerate()
            .filter(|(_, row)| predicate(row, args))
            .map(|(i, _)| i)
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn physical_index(&self, display: usize) -> Option<usize> {
        self.entries.get(display).copied()
    }

    pub fn display_index_of(&self, physical: usize) -> Option<usize> {
        self.entries.iter().position(|&p| p == physical)
    }

    pub fn physical_indices(&self) -> &[usize] {
        &self.entries
    }

    /// Follow an in-place store sort described by `permutation`
    /// (`permutation[new] = old`), then re-sort the view with `compare`.
    pub fn resort<F>(&mut self, store: &RowStore, permutation: &[usize], mut compare: F)
    where
        F: FnMut(&Row, &Row) -> Ordering,
    {
        let mut new_of_old = vec![0usize; permutation.len()];
        for (new, &old) in permutation.iter().enumerate() {
            if let Some(slot) = new_of_old.get_mut(old) {
                *slot = new;
            }
        }
        for entry in &mut self.entries {
            if let Some(&new) = new_of_old.get(*entry) {
                *entry = new;
            }
        }
        self.entries.sort_by(|&a, &b| match (store.get(a), store.get(b)) {
            (Some(ra), Some(rb)) => compare(ra, rb),
            _ => Ordering::Equal,
        });
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

    fn people() -> RowStore {
        let mut store = RowStore::new();
        store.reset(vec![
            json!({"name": "Alice", "city": "Paris"}),
            json!({"name": "bob", "city": "Berlin"}),
            json!({"name": "Carol", "city": null}),
            json!({"name": "ALINA", "city": "Prague"}),
        ]);
        store
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let store = people();
        let args = ColumnFilter::new("name", "al").to_args();
        let view = FilterView::apply(&store, &*by_column_filter(), &args);
        assert_eq!(view.physical_indices(), &[0, 3]);
    }

    #[test]
    fn test_case_sensitive() {
        let store = people();
        let args = ColumnFilter::new("name", "AL").case_sensitive().to_args();
        let view = FilterView::apply(&store, &*by_column_filter(), &args);
        assert_eq!(view.physical_indices(), &[3]);
    }

    #[test]
    fn test_any_of_several_columns() {
        let store = people();
        let args = json!({"column": ["name", "city"], "keyword": "b"});
        let view = FilterView::apply(&store, &*by_column_filter(), &args);
        // bob (name) and Berlin share the same row
        assert_eq!(view.physical_indices(), &[1]);
    }

    #[test]
    fn test_null_never_matches_and_empty_keyword_matches_all() {
        let store = people();
        let args = json!({"column": "city", "keyword": "a"});
        let view = FilterView::apply(&store, &*by_column_filter(), &args);
        assert!(!view.physical_indices().contains(&2));

        let all = FilterView::apply(&store, &*by_column_filter(), &json!({"column": "city"}));
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_display_physical_mapping() {
        let store = people();
        let args = ColumnFilter::new("name", "a").to_args();
        let view = FilterView::apply(&store, &*by_column_filter(), &args);
        for display in 0..view.len() {
            let physical = view.physical_index(display).unwrap();
            assert_eq!(view.display_index_of(physical), Some(display));
        }
        assert_eq!(view.physical_index(view.len()), None);
    }

    #[test]
    fn test_resort_follows_store_permutation() {
        let mut store = people();
        let args = ColumnFilter::new("name", "a").to_args();
        let mut view = FilterView::apply(&store, &*by_column_filter(), &args);
        let before: Vec<Row> = view
            .physical_indices()
            .iter()
            .map(|&p| store.get(p).unwrap().clone())
            .collect();

        let cmp = |a: &Row, b: &Row| {
            let key = |r: &Row| r["name"].as_str().unwrap_or("").to_lowercase();
            key(b).cmp(&key(a))
        };
        let perm = store.sort_by(cmp);
        view.resort(&store, &perm, cmp);

        let after: Vec<Row> = view
            .physical_indices()
            .iter()
            .map(|&p| store.get(p).unwrap().clone())
            .collect();
        assert_eq!(after.len(), before.len());
        let names: Vec<&str> = after.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Carol", "ALINA", "Alice"]);
    }
}
