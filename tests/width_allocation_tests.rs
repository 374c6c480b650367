//! Column width allocation tests
//!
//! Covers the allocator directly and through the grid: hidden columns,
//! relative growth, minimum widths, auto-fill and resize hit testing.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use datagrid::layout::{allocate_column_widths, WidthPolicy, WidthRequest, AUTO_COLUMN_PADDING};
use datagrid::{ColumnDef, ColumnWidthMode, Grid, GridOptions, HeadlessPresenter, WidthSpec};
use test_case::test_case;

fn full_render_options(columns: Vec<ColumnDef>) -> GridOptions {
    GridOptions {
        virtual_table: false,
        columns,
        ..GridOptions::default()
    }
}

fn widths(grid: &Grid<HeadlessPresenter>) -> Vec<f64> {
    grid.columns().visible().map(|c| c.actual_width).collect()
}

/// Five columns, three hidden: a 50% column and a 100px column share 500px.
fn mixed_hidden_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("a").width("50%"),
        ColumnDef::new("h1").hidden(),
        ColumnDef::new("b").width(100.0),
        ColumnDef::new("h2").width("25%").hidden(),
        ColumnDef::new("h3").width(300.0).hidden(),
    ]
}

#[test]
fn test_hidden_columns_take_no_space_without_growth() {
    let mut options = full_render_options(mixed_hidden_columns());
    options.relative_width_grows_to_fill_width = false;
    let mut grid = Grid::new(options, HeadlessPresenter::new(500.0));
    assert!(grid.render());

    assert_eq!(widths(&grid), vec![200.0, 100.0]);
    assert_eq!(grid.presenter().column_widths.get(&0), Some(&200.0));
    assert_eq!(grid.presenter().column_widths.get(&1), Some(&100.0));
    assert_eq!(grid.presenter().header.len(), 2);
}

#[test]
fn test_hidden_columns_take_no_space_with_growth() {
    let mut grid = Grid::new(
        full_render_options(mixed_hidden_columns()),
        HeadlessPresenter::new(500.0),
    );
    grid.render();
    // 0.5 alone normalizes to the whole 400px left over
    assert_eq!(widths(&grid), vec![400.0, 100.0]);
}

#[test]
fn test_showing_a_column_reallocates() {
    let mut options = full_render_options(mixed_hidden_columns());
    options.relative_width_grows_to_fill_width = false;
    let mut grid = Grid::new(options, HeadlessPresenter::new(500.0));
    grid.render();

    assert!(grid.set_column_visible("h2", true));
    // Visible order is a, b, h2; relative space is 400px
    assert_eq!(widths(&grid), vec![200.0, 100.0, 100.0]);
}

#[test]
fn test_auto_column_fits_label() {
    let columns = vec![
        ColumnDef::new("id").label("Identifier"),
        ColumnDef::new("rest").width("100%"),
    ];
    let mut grid = Grid::new(full_render_options(columns), HeadlessPresenter::new(600.0));
    grid.render();

    let auto = 10.0 * 7.0 + AUTO_COLUMN_PADDING;
    assert_eq!(widths(&grid), vec![auto, 600.0 - auto]);
}

#[test]
fn test_absolute_width_raised_to_minimum() {
    let columns = vec![
        ColumnDef::new("narrow").width(10.0),
        ColumnDef::new("exempt").width(10.0).ignore_min(),
    ];
    let mut grid = Grid::new(full_render_options(columns), HeadlessPresenter::new(600.0));
    grid.render();
    assert_eq!(widths(&grid), vec![35.0, 10.0]);

    grid.set_min_column_width(50.0);
    assert_eq!(widths(&grid), vec![50.0, 10.0]);
}

#[test]
fn test_set_column_width_changes_mode() {
    let mut grid = Grid::new(
        full_render_options(vec![ColumnDef::new("a"), ColumnDef::new("b").width(120.0)]),
        HeadlessPresenter::new(600.0),
    );
    grid.render();

    assert!(grid.set_column_width("a", "25%"));
    let a = grid.columns().get("a").unwrap();
    assert_eq!(a.width_mode, ColumnWidthMode::Relative);
    assert_eq!(grid.get_column_width("a"), Some(WidthSpec::Text("25%".to_string())));

    assert!(grid.set_column_width("b", "auto"));
    assert_eq!(grid.get_column_width("b"), Some(WidthSpec::Text("auto".to_string())));
    assert!(!grid.set_column_width("missing", 100.0));
}

#[test]
fn test_auto_fill_uses_all_available_width() {
    let columns = vec![
        ColumnDef::new("a").width(100.0),
        ColumnDef::new("b").width(100.0),
        ColumnDef::new("fixed").width(100.0).fixed(),
    ];
    let mut options = full_render_options(columns);
    options.auto_fill_table_width = true;
    let mut grid = Grid::new(options, HeadlessPresenter::new(901.0));
    grid.render();

    let w = widths(&grid);
    assert_eq!(w[2], 100.0, "non-resizable absolute column keeps its width");
    assert_eq!(w.iter().sum::<f64>(), 901.0);
}

#[test]
fn test_scrollbar_narrows_last_column_on_screen() {
    let options = GridOptions {
        columns: vec![ColumnDef::new("a").width("50%"), ColumnDef::new("b").width("50%")],
        rows: common::people(100),
        height: Some(240.0),
        ..GridOptions::default()
    };
    let presenter = HeadlessPresenter::new(400.0)
        .with_metrics(common::metrics())
        .with_scrollbar(15.0);
    let mut grid = Grid::new(options, presenter);
    grid.render();

    let b = grid.columns().get("b").unwrap();
    assert_eq!(b.actual_width, 200.0);
    assert_eq!(b.on_screen_width(), 185.0);
    assert_eq!(grid.columns().get("a").unwrap().on_screen_width(), 200.0);
}

#[test]
fn test_resize_target_hits_right_border() {
    let columns = vec![ColumnDef::new("a").width(100.0), ColumnDef::new("b").width(100.0)];
    let mut grid = Grid::new(full_render_options(columns), HeadlessPresenter::new(400.0));
    grid.render();

    assert_eq!(grid.resize_target(99.0).as_deref(), Some("a"));
    assert_eq!(grid.resize_target(101.0).as_deref(), Some("a"));
    assert_eq!(grid.resize_target(50.0), None);

    grid.set_resizable_columns(false);
    assert_eq!(grid.resize_target(99.0), None);
}

fn thirds<'a>() -> Vec<WidthRequest<'a>> {
    vec![
        WidthRequest::new("fixed", ColumnWidthMode::Absolute, 100.0),
        WidthRequest::new("one", ColumnWidthMode::Relative, 1.0 / 3.0),
        WidthRequest::new("two", ColumnWidthMode::Relative, 1.0 / 3.0),
        WidthRequest::new("three", ColumnWidthMode::Relative, 1.0 / 3.0),
    ]
}

#[test_case(400.0 ; "divisible")]
#[test_case(401.0 ; "one pixel residue")]
#[test_case(1000.0 ; "wide")]
#[test_case(1237.0 ; "odd")]
fn test_relative_fractions_summing_to_one_fill_exactly(available: f64) {
    let allocation = allocate_column_widths(
        available,
        &thirds(),
        &WidthPolicy::default(),
        0.0,
        |label| label.len() as f64,
    );
    assert_eq!(allocation.total(), available);
    for w in &allocation.widths {
        assert_eq!(w.fract(), 0.0, "widths stay whole pixels: {w}");
    }
}

#[test_case(120.0 ; "cramped")]
#[test_case(250.0 ; "tight")]
#[test_case(800.0 ; "roomy")]
fn test_minimum_width_floor(available: f64) {
    let requests = vec![
        WidthRequest::new("a", ColumnWidthMode::Relative, 0.02),
        WidthRequest::new("b", ColumnWidthMode::Relative, 0.98),
        WidthRequest::new("c", ColumnWidthMode::Absolute, 5.0),
    ];
    let allocation = allocate_column_widths(
        available,
        &requests,
        &WidthPolicy::default(),
        0.0,
        |_| 0.0,
    );
    for w in &allocation.widths {
        assert!(*w >= 35.0, "{w} below the minimum at {available}px");
    }
}

#[test_case(333.0 ; "narrow")]
#[test_case(1024.0 ; "wide")]
fn test_allocation_is_idempotent(available: f64) {
    let policy = WidthPolicy {
        auto_fill: true,
        ..WidthPolicy::default()
    };
    let requests = vec![
        WidthRequest::new("Name", ColumnWidthMode::Auto, 0.0),
        WidthRequest::new("b", ColumnWidthMode::Absolute, 90.0),
        WidthRequest::new("c", ColumnWidthMode::Relative, 0.4),
    ];
    let measure = |label: &str| label.len() as f64 * 7.0;
    let first = allocate_column_widths(available, &requests, &policy, 0.0, measure);
    let second = allocate_column_widths(available, &requests, &policy, 0.0, measure);
    assert_eq!(first.widths, second.widths);
}

#[test]
fn test_grid_reallocation_is_stable() {
    let mut grid = Grid::new(
        full_render_options(common::people_columns()),
        HeadlessPresenter::new(777.0),
    );
    grid.render();
    let before = widths(&grid);

    grid.presenter_mut().clear_calls();
    grid.table_width_changed(false);
    assert_eq!(widths(&grid), before);
    assert!(
        !grid
            .presenter()
            .calls
            .iter()
            .any(|c| matches!(c, datagrid::render::PresenterCall::ColumnWidth(..))),
        "unchanged widths are not pushed again"
    );
}
