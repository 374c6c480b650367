//! Grid controller - the primary entry point of the engine.
//!
//! This module provides the `Grid` struct that handles:
//! - Owning the row store, column model, filter view and sort engine
//! - Driving the width allocator and the virtual window
//! - Issuing render instructions to a [`Presenter`]
//! - Emitting events for every structural change
//!
//! Operations are split by concern: column operations and sorting in
//! `columns`, row operations and filtering in `rows`, the render flow in
//! `render`, push-update feeds in `feed`.

mod columns;
mod feed;
mod render;
mod rows;

pub use feed::{FeedId, RowBatch};

use log::debug;

use crate::columns::ColumnModel;
use crate::events::EventBus;
use crate::filter::{by_column_filter, FilterArgs, FilterPredicate, FilterView};
use crate::format::{default_cell_formatter, default_header_formatter, CellFormatter, HeaderFormatter};
use crate::layout::{ColumnLayout, DeferredRender, Viewport, VirtualWindow, WindowState};
use crate::render::Presenter;
use crate::rows::RowStore;
use crate::sort::SortEngine;
use crate::types::GridOptions;

use feed::Feed;

/// Active filter: the arguments plus the view they produced.
#[derive(Debug, Clone)]
struct ActiveFilter {
    args: FilterArgs,
    view: FilterView,
}

/// Data grid controller.
///
/// Generic over the presentation layer; the core itself never draws.
pub struct Grid<P: Presenter> {
    options: GridOptions,
    presenter: P,
    rows: RowStore,
    columns: ColumnModel,
    filter: Option<ActiveFilter>,
    predicate: FilterPredicate,
    sort: SortEngine,
    viewport: Viewport,
    window: VirtualWindow,
    deferred: DeferredRender,
    /// Set by structural changes; the next render rebuilds everything
    skeleton_dirty: bool,
    detached: bool,
    content_height: f64,
    layout: ColumnLayout,
    cell_formatter: CellFormatter,
    header_formatter: HeaderFormatter,
    events: EventBus,
    feeds: Vec<Feed>,
    next_feed_id: u64,
}

impl<P: Presenter> std::fmt::Debug for Grid<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("rows", &self.rows.len())
            .field("columns", &self.columns.len())
            .field("filtered", &self.filter.is_some())
            .field("sort", &self.sort)
            .field("window", &self.window)
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

impl<P: Presenter> Grid<P> {
    /// Build a grid from options. Nothing is rendered until [`Grid::render`].
    pub fn new(options: GridOptions, presenter: P) -> Self {
        let mut options = options.normalized();
        let defs = std::mem::take(&mut options.columns);
        let initial_rows = std::mem::take(&mut options.rows);
        let initial_sort = options.sort_column.take();

        let mut columns = ColumnModel::from_defs(&defs, options.min_column_width);
        columns.ensure_visible();

        let mut sort = SortEngine::new(options.sortable_columns);
        if let Some(initial_sort) = &initial_sort {
            for entry in initial_sort.entries() {
                if let Some(column) = columns.get(entry.column()) {
                    sort.push(column, entry.descending());
                }
            }
        }

        let mut viewport = Viewport::new();
        if let Some(height) = options.height {
            viewport.resize(0.0, height);
        }

        let mut grid = Self {
            window: VirtualWindow::new(options.rows_buffer_size),
            options,
            presenter,
            rows: RowStore::new(),
            columns,
            filter: None,
            predicate: by_column_filter(),
            sort,
            viewport,
            deferred: DeferredRender::default(),
            skeleton_dirty: true,
            detached: false,
            content_height: 0.0,
            layout: ColumnLayout::default(),
            cell_formatter: default_cell_formatter(),
            header_formatter: default_header_formatter(),
            events: EventBus::new(),
            feeds: Vec::new(),
            next_feed_id: 0,
        };
        grid.rows.reset(initial_rows);
        grid.apply_sort();

        debug!(
            "grid created: {} columns, {} rows, virtual={}",
            grid.columns.len(),
            grid.rows.len(),
            grid.options.virtual_table
        );
        grid
    }

    /// Event bus handle. Clones share the same listener list.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn columns(&self) -> &ColumnModel {
        &self.columns
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn window_state(&self) -> WindowState {
        self.window.state
    }

    /// Geometry of the visible columns from the last allocation.
    pub fn column_layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Number of rows in display order (filtered when a filter is active).
    fn display_len(&self) -> usize {
        self.filter
            .as_ref()
            .map_or(self.rows.len(), |f| f.view.len())
    }

    /// Physical index shown at display index `display`.
    fn physical_for_display(&self, display: usize) -> Option<usize> {
        match &self.filter {
            Some(filter) => filter.view.physical_index(display),
            None => (display < self.rows.len()).then_some(display),
        }
    }

    /// Display index of physical row `physical`, `None` when filtered out.
    fn display_for_physical(&self, physical: usize) -> Option<usize> {
        match &self.filter {
            Some(filter) => filter.view.display_index_of(physical),
            None => (physical < self.rows.len()).then_some(physical),
        }
    }
}
