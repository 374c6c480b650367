//! Presentation-layer contract.
//!
//! The grid never draws. It measures through a [`Presenter`] and hands it
//! render instructions: header cells, batches of rows with their display
//! and physical indices, row removals and column widths. Everything the
//! presenter needs to know about a row travels in the instruction record,
//! so it keeps no grid state of its own.

use serde::Serialize;

use crate::layout::{RowMetrics, RowRange};

/// Where a batch of rows goes relative to the rows already rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
    /// Before the current first rendered row
    Prepend,
    /// After the current last rendered row
    Append,
    /// Replaces a row that was just removed at the same display index
    InPlace,
    /// Fills the gap opened by [`Presenter::splice_rendered_rows`]
    Insert,
}

/// Data needed to render a single cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderCell {
    pub column: String,
    /// On-screen width in pixels
    pub width: f64,
    pub content: String,
}

/// Data needed to render a single row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRow {
    pub display_index: usize,
    pub physical_index: usize,
    /// Absolute top offset in windowed mode; `None` in full-render mode
    pub top: Option<f64>,
    pub cells: Vec<RenderCell>,
}

/// A contiguous run of rows to render, in ascending display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderBatch {
    pub range: RowRange,
    pub placement: Placement,
    pub rows: Vec<RenderRow>,
}

/// Header cell for one visible column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCell {
    pub position: usize,
    pub column: String,
    pub content: String,
    pub width: f64,
    /// `Some(descending)` while the column is part of the sort
    pub sorted: Option<bool>,
}

/// Trait for presentation layers
///
/// Implementations handle measuring and drawing. All calls are synchronous
/// and made on the thread that owns the grid.
pub trait Presenter {
    /// Rendered width of a header label, padding excluded.
    fn measure_label_width(&mut self, label: &str) -> f64;

    /// Width available to the columns, net of borders and scrollbar.
    fn measure_available_width(&mut self) -> f64;

    /// Render a batch of rows. Returns `false` when nothing was committed.
    fn render_row_range(&mut self, batch: &RenderBatch) -> bool;

    /// Drop the rendered row at `display_index`.
    fn remove_rendered_row(&mut self, display_index: usize);

    /// Resize the column at visible `position`.
    fn set_column_pixel_width(&mut self, position: usize, px: f64);

    /// Drop the rendered rows `at..at + removed` and renumber every later
    /// row by `inserted - removed`, leaving a gap of `inserted` rows at `at`
    /// for an [`Placement::Insert`] batch. Only issued in full-render mode
    /// without a filter, where display and physical indices coincide.
    ///
    /// Returns `false` when unsupported; nothing may have changed then, and
    /// the grid falls back to re-rendering every row.
    fn splice_rendered_rows(&mut self, _at: usize, _removed: usize, _inserted: usize) -> bool {
        false
    }

    /// Whether the host element has a layout box. Renders are deferred
    /// while this is false.
    fn is_attached(&self) -> bool {
        true
    }

    /// First/middle/last row heights. `None` keeps the defaults.
    fn measure_row_metrics(&mut self) -> Option<RowMetrics> {
        None
    }

    /// Width of a vertical scrollbar, 0 for overlay scrollbars.
    fn scrollbar_width(&self) -> f64 {
        0.0
    }

    /// Extra width a sort arrow needs in a header cell.
    fn sort_arrow_width(&mut self) -> f64 {
        0.0
    }

    /// Total scrollable body height changed.
    fn set_content_height(&mut self, _height: f64) {}

    /// Replace the header row.
    fn render_header(&mut self, _cells: &[HeaderCell]) {}
}
