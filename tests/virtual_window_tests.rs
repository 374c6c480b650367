//! Virtual window tests
//!
//! Band selection and incremental reconciliation as seen by a presenter:
//! after every scroll the rendered set must equal the band, with no row
//! rendered twice and no removal of a row that was never rendered.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss
)]

mod common;

use common::{assert_rendered, metrics, virtual_grid};
use datagrid::filter::ColumnFilter;
use datagrid::layout::{visible_band, WindowState};
use datagrid::render::{Placement, PresenterCall};
use datagrid::{Grid, GridOptions, HeadlessPresenter};

fn expected_band(grid: &Grid<HeadlessPresenter>) -> (usize, usize) {
    let band = visible_band(
        grid.viewport().scroll_y,
        grid.viewport().height,
        &metrics(),
        grid.options().rows_buffer_size,
        grid.filtered_row_count(),
    )
    .unwrap();
    (band.first, band.last)
}

#[test]
fn test_initial_band_at_top() {
    let mut grid = virtual_grid(1000);
    assert!(grid.render());
    assert_eq!(grid.window_state(), WindowState::Windowed);
    assert_rendered(&grid, 0, 12);
    assert_eq!(grid.content_height(), 24.0 * 1000.0 + 6.0);
}

#[test]
fn test_band_after_scroll() {
    let mut grid = virtual_grid(1000);
    grid.render();
    grid.scroll_to(480.0);

    assert_rendered(&grid, 16, 32);
    let range = grid.rendered_range().unwrap();
    assert_eq!((range.first, range.last), (16, 32));
}

#[test]
fn test_rendered_rows_carry_offsets() {
    let mut grid = virtual_grid(1000);
    grid.render();
    grid.scroll_to(480.0);

    let row = grid.presenter().row(16).unwrap();
    assert_eq!(row.top, Some(30.0 + 15.0 * 24.0));
    assert_eq!(row.physical_index, 16);
    assert_eq!(row.cells.len(), 4);
    assert_eq!(row.cells[1].content, "person 0016");
    assert_eq!(grid.row_y_pos(16), Some(30.0 + 15.0 * 24.0));
    assert_eq!(grid.row_y_pos(0), Some(0.0));
    assert_eq!(grid.row_y_pos(1000), None);
}

#[test]
fn test_small_scrolls_reconcile_incrementally() {
    let mut grid = virtual_grid(1000);
    grid.render();

    for _ in 0..60 {
        grid.scroll_by(17.0);
        let (first, last) = expected_band(&grid);
        assert_rendered(&grid, first, last);
    }
    for _ in 0..60 {
        grid.scroll_by(-23.0);
        let (first, last) = expected_band(&grid);
        assert_rendered(&grid, first, last);
    }
    assert_eq!(grid.viewport().scroll_y, 0.0);
    assert_rendered(&grid, 0, 12);
}

#[test]
fn test_scrolling_down_only_appends() {
    let mut grid = virtual_grid(1000);
    grid.render();
    grid.presenter_mut().clear_calls();

    grid.scroll_by(24.0);
    let calls = &grid.presenter().calls;
    assert!(calls
        .iter()
        .all(|c| !matches!(c, PresenterCall::Render { placement: Placement::Prepend, .. })));
    assert!(calls
        .iter()
        .any(|c| matches!(c, PresenterCall::Render { placement: Placement::Append, .. })));
}

#[test]
fn test_band_is_monotonic_in_scroll() {
    let mut previous = (0, 0);
    for step in 0..400 {
        let band = visible_band(step as f64 * 11.0, 240.0, &metrics(), 3, 1000).unwrap();
        assert!(band.first >= previous.0);
        assert!(band.last >= previous.1);
        previous = (band.first, band.last);
    }
}

#[test]
fn test_jump_replaces_band() {
    let mut grid = virtual_grid(1000);
    grid.render();
    grid.scroll_to(12_000.0);
    let (first, last) = expected_band(&grid);
    assert!(first > 12);
    assert_rendered(&grid, first, last);

    grid.scroll_to(f64::MAX);
    assert_eq!(grid.viewport().scroll_y, grid.content_height() - 240.0);
    let (_, last) = expected_band(&grid);
    assert_eq!(last, 999);
}

#[test]
fn test_refused_batch_is_retried_on_tick() {
    let mut grid = virtual_grid(1000);
    grid.render();

    grid.presenter_mut().commit = false;
    grid.scroll_to(480.0);
    assert!(grid.needs_tick());
    // Head rows were removed before the refused append
    let rendered = grid.presenter().rendered_indices();
    assert!(rendered.iter().all(|&i| i >= 16));

    grid.presenter_mut().commit = true;
    assert!(grid.tick());
    assert!(!grid.needs_tick());
    assert_rendered(&grid, 16, 32);
}

#[test]
fn test_filtered_window_maps_physical_rows() {
    let mut grid = virtual_grid(1000);
    grid.render();
    grid.filter(Some(ColumnFilter::new("city", "paris").to_args()));

    assert_eq!(grid.filtered_row_count(), 250);
    assert_rendered(&grid, 0, 12);
    assert_eq!(grid.presenter().row(0).unwrap().physical_index, 0);
    assert_eq!(grid.presenter().row(1).unwrap().physical_index, 4);
    assert_eq!(grid.content_height(), 24.0 * 250.0 + 6.0);

    grid.scroll_to(480.0);
    assert_rendered(&grid, 16, 32);
    assert_eq!(grid.presenter().row(16).unwrap().physical_index, 64);
}

#[test]
fn test_height_change_rebuilds_band() {
    let mut grid = virtual_grid(1000);
    grid.render();
    grid.resize(800.0, 480.0);

    let (first, last) = expected_band(&grid);
    assert_eq!((first, last), (0, 22));
    assert_rendered(&grid, first, last);
}

#[test]
fn test_waits_for_viewport_height() {
    let options = GridOptions {
        columns: common::people_columns(),
        rows: common::people(100),
        ..GridOptions::default()
    };
    let mut grid = Grid::new(options, HeadlessPresenter::new(800.0).with_metrics(metrics()));

    assert!(!grid.render());
    assert_eq!(grid.window_state(), WindowState::Unmounted);
    assert!(grid.presenter().rendered_indices().is_empty());

    grid.resize(800.0, 240.0);
    assert_eq!(grid.window_state(), WindowState::Windowed);
    assert_rendered(&grid, 0, 12);
}

#[test]
fn test_refresh_row_rerenders_in_place() {
    let mut grid = virtual_grid(100);
    grid.render();
    grid.presenter_mut().clear_calls();

    assert!(grid.refresh_row(3));
    assert_eq!(
        grid.presenter().calls,
        vec![
            PresenterCall::Remove(3),
            PresenterCall::Render {
                first: 3,
                last: 3,
                placement: Placement::InPlace
            },
        ]
    );
    assert_rendered(&grid, 0, 12);
    // Not rendered: nothing to do
    assert!(!grid.refresh_row(80));
}

#[test]
fn test_refresh_all_virtual_rows() {
    let mut grid = virtual_grid(100);
    grid.render();
    grid.scroll_to(240.0);
    let (first, last) = expected_band(&grid);

    grid.refresh_all_virtual_rows();
    assert_rendered(&grid, first, last);
}

#[test]
fn test_full_render_ignores_scroll() {
    let mut grid = common::full_grid(50);
    grid.render();
    assert_eq!(grid.window_state(), WindowState::FullRender);
    assert_rendered(&grid, 0, 49);
    assert_eq!(grid.presenter().row(10).unwrap().top, None);

    grid.presenter_mut().clear_calls();
    grid.scroll_to(300.0);
    assert!(grid.presenter().calls.is_empty());
}
