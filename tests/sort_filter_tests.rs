//! Sorting and filtering through the grid
//!
//! Multi-key toggles, the depth bound, custom comparators and predicates,
//! and the interplay of an in-place sort with an active filter.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cmp::Ordering;
use std::rc::Rc;

use common::{display_column, full_grid};
use datagrid::filter::{ColumnFilter, FilterArgs, FilterPredicate};
use datagrid::sort::{Comparator, ComparatorProvider};
use datagrid::{ColumnDef, Grid, GridOptions, HeadlessPresenter, Row, SortExport};
use serde_json::{json, Value};

fn export(column: &str, descending: bool) -> SortExport {
    SortExport {
        column: column.to_string(),
        descending,
    }
}

fn multi_sort_grid(rows: usize, depth: usize) -> Grid<HeadlessPresenter> {
    let options = GridOptions {
        virtual_table: false,
        sortable_columns: depth,
        columns: common::people_columns(),
        rows: common::people(rows),
        ..GridOptions::default()
    };
    Grid::new(options, HeadlessPresenter::new(800.0))
}

fn as_u64(values: &[Value]) -> Vec<u64> {
    values.iter().map(|v| v.as_u64().unwrap()).collect()
}

#[test]
fn test_sort_is_stable_on_ties() {
    let mut grid = full_grid(200);
    grid.render();
    grid.sort(Some("score"), None, false);

    let scores = as_u64(&display_column(&grid, "score"));
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    // Rows i and i+100 share a score; the earlier one stays first
    let ids = as_u64(&display_column(&grid, "id"));
    assert_eq!(&ids[..2], &[0, 100]);
}

#[test]
fn test_sort_toggles_direction() {
    let mut grid = full_grid(20);
    grid.render();

    grid.sort(Some("name"), None, false);
    assert_eq!(grid.get_sorted_columns(), vec![export("name", false)]);
    grid.sort(Some("name"), None, false);
    assert_eq!(grid.get_sorted_columns(), vec![export("name", true)]);
    assert_eq!(display_column(&grid, "name")[0], json!("person 0019"));

    grid.sort(Some("name"), Some(true), false);
    assert_eq!(grid.get_sorted_columns(), vec![export("name", true)]);
}

#[test]
fn test_header_marks_sorted_column() {
    let mut grid = full_grid(5);
    grid.render();
    grid.sort(Some("city"), Some(true), false);

    let header = &grid.presenter().header;
    assert_eq!(header[2].column, "city");
    assert_eq!(header[2].sorted, Some(true));
    assert_eq!(header[0].sorted, None);
}

#[test]
fn test_augmenting_the_only_key_clears_the_sort() {
    let mut grid = multi_sort_grid(20, 3);
    grid.render();

    grid.sort(Some("city"), None, false);
    grid.sort(Some("city"), None, true);
    assert!(grid.get_sorted_columns().is_empty());
}

#[test]
fn test_augment_builds_composite_key() {
    let mut grid = multi_sort_grid(40, 2);
    grid.render();

    grid.sort(Some("city"), None, false);
    grid.sort(Some("score"), Some(true), true);
    assert_eq!(
        grid.get_sorted_columns(),
        vec![export("city", false), export("score", true)]
    );

    let rows: Vec<Row> = (0..grid.filtered_row_count())
        .map(|d| grid.data_for_filtered_row(d).unwrap().clone())
        .collect();
    for pair in rows.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let city = a["city"].as_str().cmp(&b["city"].as_str());
        assert_ne!(city, Ordering::Greater);
        if city == Ordering::Equal {
            assert!(a["score"].as_u64() >= b["score"].as_u64());
        }
    }
}

#[test]
fn test_depth_bound_restarts_the_stack() {
    let mut grid = multi_sort_grid(20, 2);
    grid.render();

    grid.sort(Some("city"), None, false);
    grid.sort(Some("name"), None, true);
    grid.sort(Some("score"), None, true);
    assert_eq!(grid.get_sorted_columns(), vec![export("score", false)]);
}

#[test]
fn test_augmenting_an_older_key_restarts_with_it() {
    let mut grid = multi_sort_grid(20, 3);
    grid.render();

    grid.sort(Some("city"), None, true);
    grid.sort(Some("score"), None, true);
    grid.sort(Some("city"), None, true);
    assert_eq!(grid.get_sorted_columns(), vec![export("city", false)]);
    let cities = display_column(&grid, "city");
    assert!(cities.windows(2).all(|w| w[0].as_str() <= w[1].as_str()));
}

#[test]
fn test_lowering_sortable_columns_trims_oldest() {
    let mut grid = multi_sort_grid(20, 3);
    grid.render();
    grid.sort(Some("city"), None, false);
    grid.sort(Some("name"), Some(true), true);

    grid.set_sortable_columns(1);
    assert_eq!(grid.get_sorted_columns(), vec![export("name", true)]);
    assert_eq!(display_column(&grid, "name")[0], json!("person 0019"));
}

#[test]
fn test_unknown_column_clears_sort() {
    let mut grid = full_grid(10);
    grid.render();
    grid.sort(Some("name"), None, false);
    grid.sort(Some("nope"), None, false);
    assert!(grid.get_sorted_columns().is_empty());
}

#[test]
fn test_removing_sorted_column_drops_key() {
    let mut grid = multi_sort_grid(10, 2);
    grid.render();
    grid.sort(Some("city"), None, false);
    grid.sort(Some("score"), None, true);

    assert!(grid.remove_column("city"));
    assert_eq!(grid.get_sorted_columns(), vec![export("score", false)]);
}

#[test]
fn test_initial_sort_from_options() {
    let json = r#"{
        "virtualTable": false,
        "sortableColumns": 2,
        "columns": [{"name": "city"}, {"name": "score"}],
        "sortColumn": [{"column": "city", "descending": true}, "score"],
        "rows": [
            {"city": "Lima", "score": 3},
            {"city": "Oslo", "score": 9},
            {"city": "Oslo", "score": 1}
        ]
    }"#;
    let grid = Grid::new(
        GridOptions::from_json(json).unwrap(),
        HeadlessPresenter::default(),
    );

    assert_eq!(
        grid.get_sorted_columns(),
        vec![export("city", true), export("score", false)]
    );
    assert_eq!(grid.data_for_row(0), Some(&json!({"city": "Oslo", "score": 1})));
    assert_eq!(grid.data_for_row(2), Some(&json!({"city": "Lima", "score": 3})));
}

#[test]
fn test_compare_path_differs_from_data_path() {
    let options = GridOptions {
        virtual_table: false,
        columns: vec![ColumnDef::new("who").data_path("name").compare_path("score")],
        rows: vec![
            json!({"name": "a", "score": 3}),
            json!({"name": "b", "score": 1}),
            json!({"name": "c", "score": 2}),
        ],
        ..GridOptions::default()
    };
    let mut grid = Grid::new(options, HeadlessPresenter::default());
    grid.sort(Some("who"), None, false);

    let shown: Vec<String> = (0..3).map(|p| grid.cell_content(p, "who").unwrap()).collect();
    assert_eq!(shown, vec!["b", "c", "a"]);
}

#[test]
fn test_comparator_provider_overrides_default() {
    let mut grid = full_grid(10);
    grid.render();
    let provider: ComparatorProvider = Rc::new(|column: &str, descending: bool| {
        (column == "name").then(|| {
            // Names order by id, highest first
            let by_id: Comparator = Rc::new(move |a: &Row, b: &Row| {
                let ord = b["id"].as_u64().cmp(&a["id"].as_u64());
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
            by_id
        })
    });
    grid.set_comparator_provider(Some(provider));
    grid.sort(Some("name"), None, false);

    assert_eq!(as_u64(&display_column(&grid, "id"))[0], 9);
}

#[test]
fn test_filter_then_clear_restores_store_order() {
    let mut grid = full_grid(40);
    grid.render();
    grid.sort(Some("name"), Some(true), false);
    grid.filter(Some(ColumnFilter::new("city", "Paris").to_args()));

    assert_eq!(grid.filtered_row_count(), 10);
    let names = display_column(&grid, "name");
    assert!(names
        .windows(2)
        .all(|w| w[0].as_str() > w[1].as_str()));
    assert!(display_column(&grid, "city").iter().all(|c| c == "Paris"));

    grid.filter(None);
    assert_eq!(grid.filtered_row_count(), grid.row_count());
    for display in 0..grid.row_count() {
        assert_eq!(grid.data_for_filtered_row(display), grid.data_for_row(display));
        assert_eq!(grid.physical_index(display), Some(display));
    }
}

#[test]
fn test_sort_while_filtered_reorders_view() {
    let mut grid = full_grid(40);
    grid.render();
    grid.filter(Some(ColumnFilter::new("city", "oslo").to_args()));
    let before = grid.filtered_row_count();

    grid.sort(Some("score"), None, false);
    assert_eq!(grid.filtered_row_count(), before);
    let scores = as_u64(&display_column(&grid, "score"));
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    assert!(display_column(&grid, "city").iter().all(|c| c == "Oslo"));

    let row = grid.data_for_filtered_row(0).unwrap().clone();
    let physical = grid.index_for_row(&row).unwrap();
    assert_eq!(grid.physical_index(0), Some(physical));
    assert_eq!(grid.index_for_filtered_row(&row), Some(0));
}

#[test]
fn test_filtered_out_row_has_no_display_index() {
    let mut grid = full_grid(8);
    grid.render();
    grid.filter(Some(ColumnFilter::new("city", "Lima").to_args()));

    let oslo = grid.data_for_row(1).unwrap().clone();
    assert_eq!(grid.index_for_filtered_row(&oslo), None);
    assert_eq!(grid.index_for_row(&oslo), Some(1));
}

#[test]
fn test_null_args_remove_filter() {
    let mut grid = full_grid(8);
    grid.render();
    grid.filter(Some(ColumnFilter::new("city", "Lima").to_args()));
    grid.filter(Some(Value::Null));
    assert_eq!(grid.filter_args(), None);
    assert_eq!(grid.filtered_row_count(), 8);
}

#[test]
fn test_custom_predicate() {
    let mut grid = full_grid(100);
    grid.render();
    let predicate: FilterPredicate = Rc::new(|row: &Row, args: &FilterArgs| {
        row["score"].as_u64() >= args["min"].as_u64()
    });
    grid.set_filter(Some(predicate));
    grid.filter(Some(json!({"min": 90})));

    assert_eq!(grid.filtered_row_count(), 10);
    assert!(as_u64(&display_column(&grid, "score")).iter().all(|&s| s >= 90));

    // Back to the by-column predicate; these args name no column
    grid.set_filter(None);
    assert_eq!(grid.filtered_row_count(), 100);
}

#[test]
fn test_rows_added_while_filtered_are_filtered() {
    let mut grid = full_grid(8);
    grid.render();
    grid.filter(Some(ColumnFilter::new("city", "Lima").to_args()));
    assert_eq!(grid.filtered_row_count(), 2);

    grid.add_rows(
        vec![json!({"id": 100, "city": "Lima"}), json!({"id": 101, "city": "Oslo"})],
        Some(0),
        false,
    );
    assert_eq!(grid.row_count(), 10);
    assert_eq!(grid.filtered_row_count(), 3);
    assert_eq!(display_column(&grid, "id")[0], json!(100));
}

#[test]
fn test_set_rows_with_resort_keeps_sort() {
    let mut grid = full_grid(10);
    grid.render();
    grid.sort(Some("id"), Some(true), false);

    grid.set_rows(common::people(5), true);
    assert_eq!(as_u64(&display_column(&grid, "id")), vec![4, 3, 2, 1, 0]);

    grid.set_rows(common::people(3), false);
    assert_eq!(as_u64(&display_column(&grid, "id")), vec![0, 1, 2]);
    assert_eq!(grid.get_sorted_columns(), vec![export("id", true)]);
}
