//! Grid controller tests
//!
//! Event ordering, column operations, configuration export, deferred
//! rendering, detaching and push-update feeds.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::rc::Rc;
use std::sync::mpsc;
use std::thread;

use common::{
    assert_rendered, full_grid, metrics, people, people_columns, record_events, virtual_grid,
};
use datagrid::format::{CellFormatter, HeaderFormatter};
use datagrid::layout::WindowState;
use datagrid::render::{Placement, PresenterCall};
use datagrid::{
    ColumnDef, EventKind, Grid, GridError, GridEvent, GridOptions, HeadlessPresenter, Row,
    RowBatch, WidthSpec,
};
use serde_json::{json, Value};

fn kinds(events: &[GridEvent]) -> Vec<EventKind> {
    events.iter().map(GridEvent::kind).collect()
}

fn visible_names(grid: &Grid<HeadlessPresenter>) -> Vec<String> {
    grid.columns().visible().map(|c| c.name.clone()).collect()
}

fn header_contents(grid: &Grid<HeadlessPresenter>) -> Vec<String> {
    grid.presenter().header.iter().map(|h| h.content.clone()).collect()
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_set_rows_event_order() {
    let mut grid = virtual_grid(3);
    grid.render();
    let events = record_events(&grid);

    grid.set_rows(people(2), false);

    assert_eq!(
        *events.borrow(),
        vec![
            GridEvent::RowDestroyed { display_index: 0 },
            GridEvent::RowDestroyed { display_index: 1 },
            GridEvent::RowDestroyed { display_index: 2 },
            GridEvent::SkeletonBuilt,
            GridEvent::RowCreated {
                display_index: 0,
                physical_index: 0
            },
            GridEvent::RowCreated {
                display_index: 1,
                physical_index: 1
            },
            GridEvent::RenderCompleted,
            GridEvent::RowsAdded {
                count: 2,
                replaced: true
            },
        ]
    );
    assert_rendered(&grid, 0, 1);
}

#[test]
fn test_scroll_emits_row_lifecycle_only() {
    let mut grid = virtual_grid(1000);
    grid.render();
    let events = record_events(&grid);

    grid.scroll_by(24.0);
    assert_eq!(
        kinds(&events.borrow()),
        vec![EventKind::RowCreated],
        "one row appended, nothing removed"
    );
}

#[test]
fn test_sort_and_filter_events() {
    let mut grid = virtual_grid(20);
    grid.render();
    let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    grid.events().on(EventKind::SortChanged, move |e| sink.borrow_mut().push(e.clone()));
    let sink = Rc::clone(&seen);
    grid.events().on(EventKind::FilterChanged, move |e| sink.borrow_mut().push(e.clone()));

    grid.sort(Some("city"), None, false);
    let args = json!({"column": "city", "keyword": "lima"});
    grid.filter(Some(args.clone()));
    grid.filter(None);
    // Clearing an absent filter is silent
    grid.filter(None);

    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(
        seen.borrow()[1],
        GridEvent::FilterChanged { args: Some(args) }
    );
    assert_eq!(seen.borrow()[2], GridEvent::FilterChanged { args: None });
}

#[test]
fn test_remove_rows() {
    let mut grid = virtual_grid(20);
    grid.render();
    let events = record_events(&grid);

    assert_eq!(grid.remove_rows(2, 3), 3);
    assert_eq!(grid.row_count(), 17);
    assert_eq!(grid.data_for_row(2).unwrap()["id"], json!(5));
    assert_eq!(
        events.borrow().last(),
        Some(&GridEvent::RowsRemoved {
            physical_index: 2,
            count: 3
        })
    );

    events.borrow_mut().clear();
    assert_eq!(grid.remove_rows(50, 1), 0);
    assert!(events.borrow().is_empty());

    assert_eq!(grid.remove_rows(15, 10), 2);
    assert!(grid.remove_row(0));
    assert_eq!(grid.row_count(), 14);
    assert_rendered(&grid, 0, 12);
}

#[test]
fn test_add_rows_at_index() {
    let mut grid = virtual_grid(4);
    grid.render();
    grid.add_rows(vec![json!({"id": 99, "name": "new"})], Some(1), false);

    assert_eq!(grid.row_count(), 5);
    assert_eq!(grid.data_for_row(1).unwrap()["id"], json!(99));
    assert_eq!(grid.cell_content(1, "name").as_deref(), Some("new"));
    assert_eq!(grid.cell_content(1, "city").as_deref(), Some(""));
    assert_eq!(grid.cell_content(1, "nope"), None);
    assert_rendered(&grid, 0, 4);
}

fn count_calls(grid: &Grid<HeadlessPresenter>, pred: impl Fn(&PresenterCall) -> bool) -> usize {
    grid.presenter().calls.iter().filter(|c| pred(c)).count()
}

#[test]
fn test_full_render_add_rows_renders_only_new_rows() {
    let mut grid = full_grid(1000);
    grid.render();
    grid.presenter_mut().clear_calls();

    grid.add_rows(vec![json!({"id": 5000, "name": "new"})], Some(500), false);

    assert_eq!(count_calls(&grid, |c| matches!(c, PresenterCall::Remove(_))), 0);
    let renders: Vec<&PresenterCall> = grid
        .presenter()
        .calls
        .iter()
        .filter(|c| matches!(c, PresenterCall::Render { .. }))
        .collect();
    assert_eq!(
        renders,
        vec![&PresenterCall::Render {
            first: 500,
            last: 500,
            placement: Placement::Insert
        }]
    );
    assert_rendered(&grid, 0, 1000);
    assert_eq!(grid.presenter().row(500).unwrap().cells[1].content, "new");
    let shifted = grid.presenter().row(501).unwrap();
    assert_eq!(shifted.physical_index, 501);
    assert_eq!(shifted.cells[0].content, "500");
}

#[test]
fn test_full_render_remove_rows_drops_only_removed() {
    let mut grid = full_grid(1000);
    grid.render();
    grid.presenter_mut().clear_calls();
    let events = record_events(&grid);

    assert_eq!(grid.remove_rows(10, 2), 2);

    assert_eq!(
        grid.presenter().calls.first(),
        Some(&PresenterCall::Splice {
            at: 10,
            removed: 2,
            inserted: 0
        })
    );
    assert_eq!(count_calls(&grid, |c| matches!(c, PresenterCall::Render { .. })), 0);
    assert_rendered(&grid, 0, 997);
    assert_eq!(grid.presenter().row(10).unwrap().cells[0].content, "12");
    assert_eq!(
        kinds(&events.borrow()),
        vec![
            EventKind::RowDestroyed,
            EventKind::RowDestroyed,
            EventKind::RenderCompleted,
            EventKind::RowsRemoved
        ]
    );
}

#[test]
fn test_row_changes_rebuild_without_splice_support() {
    let options = GridOptions {
        virtual_table: false,
        columns: people_columns(),
        rows: people(20),
        ..GridOptions::default()
    };
    let mut grid = Grid::new(options, HeadlessPresenter::new(800.0).without_splice());
    grid.render();
    grid.presenter_mut().clear_calls();

    grid.add_rows(vec![json!({"id": 99})], Some(3), false);
    assert_eq!(count_calls(&grid, |c| matches!(c, PresenterCall::Remove(_))), 20);
    assert_rendered(&grid, 0, 20);
}

#[test]
fn test_filtered_row_changes_rebuild() {
    let mut grid = full_grid(8);
    grid.render();
    grid.filter(Some(json!({"column": "city", "keyword": "lima"})));
    grid.presenter_mut().clear_calls();

    grid.remove_row(2);
    assert_eq!(count_calls(&grid, |c| matches!(c, PresenterCall::Splice { .. })), 0);
    assert_eq!(grid.filtered_row_count(), 1);
    assert_rendered(&grid, 0, 0);
}

// ============================================================================
// Columns
// ============================================================================

#[test]
fn test_add_column_before_existing() {
    let mut grid = virtual_grid(5);
    grid.render();
    let events = record_events(&grid);

    assert!(grid.add_column(&ColumnDef::new("email"), Some("city".into())));
    assert_eq!(visible_names(&grid), vec!["id", "name", "email", "city", "score"]);
    assert_eq!(
        events.borrow().last(),
        Some(&GridEvent::ColumnAdded {
            name: "email".to_string()
        })
    );
    assert_eq!(grid.presenter().header.len(), 5);
    assert_eq!(grid.presenter().row(0).unwrap().cells.len(), 5);

    assert!(!grid.add_column(&ColumnDef::new("email"), None));
    assert!(grid.add_column(&ColumnDef::new("last"), None));
    assert_eq!(visible_names(&grid).last().map(String::as_str), Some("last"));
}

#[test]
fn test_move_column() {
    let mut grid = virtual_grid(5);
    grid.render();
    let events = record_events(&grid);

    assert!(grid.move_column("score", 0usize));
    assert_eq!(visible_names(&grid), vec!["score", "id", "name", "city"]);
    assert_eq!(
        events.borrow().last(),
        Some(&GridEvent::ColumnMoved {
            name: "score".to_string(),
            from: 3,
            to: 0
        })
    );

    assert!(grid.move_column(0usize, "city"));
    assert_eq!(visible_names(&grid), vec!["id", "name", "city", "score"]);
    assert!(!grid.move_column("id", "id"));
    assert!(!grid.move_column("missing", "id"));
}

#[test]
fn test_remove_column() {
    let mut grid = virtual_grid(5);
    grid.render();
    assert!(grid.remove_column("name"));
    assert!(!grid.remove_column("name"));
    assert_eq!(visible_names(&grid), vec!["id", "city", "score"]);
    assert_eq!(grid.get_column_config("score").unwrap().order, 2);
}

#[test]
fn test_hiding_every_column_keeps_the_first() {
    let options = GridOptions {
        virtual_table: false,
        columns: vec![ColumnDef::new("a"), ColumnDef::new("b")],
        ..GridOptions::default()
    };
    let mut grid = Grid::new(options, HeadlessPresenter::default());
    grid.render();
    let events = record_events(&grid);

    assert!(grid.set_column_visible("a", false));
    assert!(grid.set_column_visible("b", false));
    assert!(!grid.set_column_visible("b", false));

    let visibility: Vec<GridEvent> = events
        .borrow()
        .iter()
        .filter(|e| {
            matches!(
                e.kind(),
                EventKind::ColumnHidden | EventKind::ColumnShown
            )
        })
        .cloned()
        .collect();
    assert_eq!(
        visibility,
        vec![
            GridEvent::ColumnHidden { name: "a".into() },
            GridEvent::ColumnHidden { name: "b".into() },
            GridEvent::ColumnShown { name: "a".into() },
        ]
    );
    assert!(grid.is_column_visible("a"));
    assert!(!grid.is_column_visible("b"));
}

#[test]
fn test_hidden_column_has_no_cells() {
    let mut grid = virtual_grid(5);
    grid.render();
    grid.set_column_visible("name", false);

    let cells: Vec<&str> = grid
        .presenter()
        .row(0)
        .unwrap()
        .cells
        .iter()
        .map(|c| c.column.as_str())
        .collect();
    assert_eq!(cells, vec!["id", "city", "score"]);
}

#[test]
fn test_column_width_event_even_when_unchanged() {
    let mut grid = virtual_grid(5);
    grid.render();
    assert!(grid.set_column_width("id", 100.0));
    let events = record_events(&grid);

    assert!(grid.set_column_width("id", 100.0));
    assert_eq!(
        *events.borrow(),
        vec![GridEvent::ColumnWidthChanged {
            name: "id".to_string(),
            old: WidthSpec::Pixels(100.0),
            new: WidthSpec::Pixels(100.0),
        }]
    );
}

#[test]
fn test_columns_config_export() {
    let mut grid = virtual_grid(5);
    grid.render();
    grid.set_column_width("score", "20%");
    grid.set_column_visible("city", false);
    grid.set_column_label("id", Some("#"));

    let config = serde_json::to_value(grid.get_columns_config()).unwrap();
    assert_eq!(
        config,
        json!({
            "id": {"order": 0, "width": "auto", "visible": true, "label": "#"},
            "name": {"order": 1, "width": "auto", "visible": true, "label": "Name"},
            "city": {"order": 2, "width": "auto", "visible": false, "label": "city"},
            "score": {"order": 3, "width": "20%", "visible": true, "label": "score"},
        })
    );

    grid.set_column_label("id", None);
    assert_eq!(grid.get_column_config("id").unwrap().label, "id");
    assert!(grid.get_column_config("missing").is_none());
}

#[test]
fn test_set_columns_replaces_everything() {
    let mut grid = virtual_grid(5);
    grid.render();
    grid.sort(Some("city"), None, false);

    grid.set_columns(&[ColumnDef::new("id").order(1), ColumnDef::new("score").order(0)]);
    assert_eq!(visible_names(&grid), vec!["score", "id"]);
    assert!(grid.get_sorted_columns().is_empty());
    assert_eq!(grid.presenter().header.len(), 2);
}

#[test]
fn test_formatters() {
    let mut grid = virtual_grid(5);
    grid.render();

    let header: HeaderFormatter = Rc::new(|label: &str, _name: &str| label.to_uppercase());
    grid.set_header_formatter(Some(header));
    assert_eq!(header_contents(&grid), vec!["ID", "NAME", "CITY", "SCORE"]);

    let cell: CellFormatter = Rc::new(|value: Option<&Value>, column: &str, _row: &Row| {
        match column {
            "score" => value.and_then(Value::as_u64).map(|s| format!("{s} pts")),
            _ => value.map(ToString::to_string),
        }
    });
    grid.set_cell_formatter(Some(cell));
    let row = grid.presenter().row(1).unwrap();
    assert_eq!(row.cells[3].content, "37 pts");
    assert_eq!(grid.cell_content(1, "score").as_deref(), Some("37 pts"));

    grid.set_cell_formatter(None);
    assert_eq!(grid.cell_content(1, "score").as_deref(), Some("37"));
}

#[test]
fn test_capabilities() {
    let options = GridOptions {
        columns: vec![
            ColumnDef {
                movable: Some(false),
                sortable: Some(false),
                ..ColumnDef::new("pinned")
            },
            ColumnDef::new("free").fixed(),
        ],
        ..GridOptions::default()
    };
    let mut grid = Grid::new(options, HeadlessPresenter::default());

    assert!(!grid.can_move_column("pinned"));
    assert!(!grid.can_sort_column("pinned"));
    assert!(grid.can_resize_column("pinned"));
    assert!(grid.can_move_column("free"));
    assert!(!grid.can_resize_column("free"));

    grid.set_movable_columns(false);
    assert!(!grid.can_move_column("free"));
    assert!(!grid.can_sort_column("missing"));
}

#[test]
fn test_options_validation() {
    let err = GridOptions::from_json(r#"{"columns": [{"name": "a"}, {"name": "a"}]}"#).unwrap_err();
    assert!(matches!(err, GridError::InvalidOptions(_)));
    let err = GridOptions::from_json(r#"{"columns": [{"label": "x"}]}"#).unwrap_err();
    assert!(matches!(err, GridError::InvalidOptions(_)));
    assert!(matches!(
        GridOptions::from_json("{not json").unwrap_err(),
        GridError::Json(_)
    ));
}

// ============================================================================
// Deferred rendering and detach
// ============================================================================

fn detached_presenter_grid() -> Grid<HeadlessPresenter> {
    let options = GridOptions {
        columns: people_columns(),
        rows: people(100),
        height: Some(240.0),
        ..GridOptions::default()
    };
    let presenter = HeadlessPresenter::new(800.0).with_metrics(metrics()).detached();
    Grid::new(options, presenter)
}

#[test]
fn test_render_deferred_until_attached() {
    let mut grid = detached_presenter_grid();

    assert!(!grid.render());
    assert!(!grid.render());
    assert!(grid.needs_tick());
    assert!(!grid.tick(), "still no layout box");
    assert!(grid.presenter().calls.is_empty());

    grid.presenter_mut().attached = true;
    assert!(grid.tick());
    assert!(!grid.needs_tick());
    assert!(!grid.tick());
    assert_rendered(&grid, 0, 12);
}

#[test]
fn test_detach_cancels_deferred_render() {
    let mut grid = detached_presenter_grid();
    grid.render();
    grid.detach();

    assert!(!grid.needs_tick());
    grid.presenter_mut().attached = true;
    assert!(!grid.tick());
    assert!(!grid.render());
    assert!(grid.presenter().rendered_indices().is_empty());
}

#[test]
fn test_detach_destroys_rendered_rows() {
    let mut grid = virtual_grid(100);
    grid.render();
    let events = record_events(&grid);

    grid.detach();
    assert!(grid.is_detached());
    assert_eq!(grid.window_state(), WindowState::Unmounted);
    assert!(grid.presenter().rendered_indices().is_empty());
    assert_eq!(grid.presenter().stray_removals, 0);
    assert_eq!(
        events
            .borrow()
            .iter()
            .filter(|e| e.kind() == EventKind::RowDestroyed)
            .count(),
        13
    );

    grid.scroll_to(480.0);
    grid.detach();
    assert!(grid.presenter().rendered_indices().is_empty());
}

// ============================================================================
// Feeds
// ============================================================================

#[test]
fn test_feed_batches_apply_in_order() {
    let mut grid = virtual_grid(0);
    grid.render();
    let (tx, rx) = mpsc::channel();
    let id = grid.attach_feed(rx, false);

    let producer = thread::spawn(move || {
        tx.send(RowBatch::replace(people(5))).unwrap();
        tx.send(RowBatch::append(people(2))).unwrap();
    });
    producer.join().unwrap();

    assert_eq!(grid.pump_feeds(), 2);
    assert_eq!(grid.row_count(), 7);
    assert_eq!(grid.data_for_row(5).unwrap()["id"], json!(0));
    assert_rendered(&grid, 0, 6);

    // The sender hung up, so the feed is gone once drained
    assert_eq!(grid.feed_count(), 0);
    assert!(!grid.detach_feed(id));
}

#[test]
fn test_live_feed_stays_attached() {
    let mut grid = virtual_grid(0);
    grid.render();
    let (tx, rx) = mpsc::channel();
    let id = grid.attach_feed(rx, false);

    assert_eq!(grid.pump_feeds(), 0);
    tx.send(RowBatch::append(people(3))).unwrap();
    assert_eq!(grid.pump_feeds(), 1);
    assert_eq!(grid.feed_count(), 1);

    assert!(grid.detach_feed(id));
    tx.send(RowBatch::append(people(3))).unwrap_err();
    assert_eq!(grid.row_count(), 3);
}

#[test]
fn test_feed_with_resort_keeps_sort() {
    let mut grid = virtual_grid(4);
    grid.render();
    grid.sort(Some("id"), Some(true), false);
    let (tx, rx) = mpsc::channel();
    grid.attach_feed(rx, true);

    tx.send(RowBatch::append(vec![json!({"id": 10}), json!({"id": 2})]))
        .unwrap();
    grid.pump_feeds();

    let ids: Vec<Value> = (0..grid.row_count())
        .map(|p| grid.data_for_row(p).unwrap()["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(10), json!(3), json!(2), json!(2), json!(1), json!(0)]);
}

#[test]
fn test_feed_batch_decodes_from_json() {
    let batch: RowBatch = serde_json::from_str(r#"{"rows": [{"id": 1}], "append": true}"#).unwrap();
    assert_eq!(batch, RowBatch::append(vec![json!({"id": 1})]));
    let batch: RowBatch = serde_json::from_str(r#"{"rows": []}"#).unwrap();
    assert!(!batch.append);
}

#[test]
fn test_detach_drops_feeds() {
    let mut grid = virtual_grid(0);
    let (tx, rx) = mpsc::channel();
    grid.attach_feed(rx, false);
    grid.detach();

    assert_eq!(grid.feed_count(), 0);
    assert!(tx.send(RowBatch::append(people(1))).is_err());
    assert_eq!(grid.pump_feeds(), 0);
}
