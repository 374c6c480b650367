//! Common test utilities: grid builders, row fixtures and event capture.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss
)]

use std::cell::RefCell;
use std::rc::Rc;

use datagrid::layout::RowMetrics;
use datagrid::{ColumnDef, Grid, GridEvent, GridOptions, HeadlessPresenter, Row};
use serde_json::json;

/// Row metrics used throughout: 30px first row, 24px after that.
pub fn metrics() -> RowMetrics {
    RowMetrics::new(30.0, 24.0, 24.0)
}

/// `count` rows of `{id, name, city, score}` with a few repeating values.
pub fn people(count: usize) -> Vec<Row> {
    const CITIES: [&str; 4] = ["Paris", "Oslo", "Lima", "Porto"];
    (0..count)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("person {i:04}"),
                "city": CITIES[i % CITIES.len()],
                "score": (i * 37) % 100,
            })
        })
        .collect()
}

pub fn people_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id"),
        ColumnDef::new("name").label("Name"),
        ColumnDef::new("city"),
        ColumnDef::new("score"),
    ]
}

/// Virtual grid with a 240px viewport over `rows` people.
pub fn virtual_grid(rows: usize) -> Grid<HeadlessPresenter> {
    let options = GridOptions {
        columns: people_columns(),
        rows: people(rows),
        height: Some(240.0),
        ..GridOptions::default()
    };
    Grid::new(options, HeadlessPresenter::new(800.0).with_metrics(metrics()))
}

/// Grid that renders every row.
pub fn full_grid(rows: usize) -> Grid<HeadlessPresenter> {
    let options = GridOptions {
        virtual_table: false,
        columns: people_columns(),
        rows: people(rows),
        ..GridOptions::default()
    };
    Grid::new(options, HeadlessPresenter::new(800.0).with_metrics(metrics()))
}

/// Capture every event the grid emits from now on.
pub fn record_events(grid: &Grid<HeadlessPresenter>) -> Rc<RefCell<Vec<GridEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    grid.events().on_any(move |e| sink.borrow_mut().push(e.clone()));
    seen
}

/// Values of `column` for the rows in display order.
pub fn display_column(grid: &Grid<HeadlessPresenter>, column: &str) -> Vec<serde_json::Value> {
    (0..grid.filtered_row_count())
        .map(|d| grid.data_for_filtered_row(d).unwrap()[column].clone())
        .collect()
}

/// Assert the presenter holds exactly the rows `first..=last` and never
/// saw a duplicate render or a stray removal.
pub fn assert_rendered(grid: &Grid<HeadlessPresenter>, first: usize, last: usize) {
    let expected: Vec<usize> = (first..=last).collect();
    assert_eq!(grid.presenter().rendered_indices(), expected);
    assert_eq!(grid.presenter().duplicate_renders, 0, "row rendered twice");
    assert_eq!(grid.presenter().stray_removals, 0, "removed a row that was not rendered");
}
