//! Recording presenter for tests, benches and the CLI.
//!
//! Measures text with a fixed per-character width and keeps the rendered
//! rows in a map keyed by display index, so callers can inspect exactly
//! what the grid asked for.

use std::collections::BTreeMap;

use super::presenter::{HeaderCell, Placement, Presenter, RenderBatch, RenderRow};
use crate::layout::RowMetrics;

/// One presenter call, in the order received.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    Render {
        first: usize,
        last: usize,
        placement: Placement,
    },
    Remove(usize),
    Splice {
        at: usize,
        removed: usize,
        inserted: usize,
    },
    ColumnWidth(usize, f64),
    Header(usize),
    ContentHeight(f64),
}

#[derive(Debug, Clone)]
pub struct HeadlessPresenter {
    pub char_width: f64,
    pub available_width: f64,
    pub attached: bool,
    pub metrics: Option<RowMetrics>,
    pub scrollbar: f64,
    pub arrow_width: f64,
    /// When false, row batches are refused
    pub commit: bool,
    /// When false, row splices are reported as unsupported
    pub splice: bool,
    pub rows: BTreeMap<usize, RenderRow>,
    pub header: Vec<HeaderCell>,
    pub column_widths: BTreeMap<usize, f64>,
    pub content_height: f64,
    pub calls: Vec<PresenterCall>,
    /// Rows rendered while already present
    pub duplicate_renders: usize,
    /// Removals of rows that were not rendered
    pub stray_removals: usize,
}

impl Default for HeadlessPresenter {
    fn default() -> Self {
        Self::new(800.0)
    }
}

impl HeadlessPresenter {
    pub fn new(available_width: f64) -> Self {
        Self {
            char_width: 7.0,
            available_width,
            attached: true,
            metrics: None,
            scrollbar: 0.0,
            arrow_width: 0.0,
            commit: true,
            splice: true,
            rows: BTreeMap::new(),
            header: Vec::new(),
            column_widths: BTreeMap::new(),
            content_height: 0.0,
            calls: Vec::new(),
            duplicate_renders: 0,
            stray_removals: 0,
        }
    }

    pub fn with_metrics(mut self, metrics: RowMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_scrollbar(mut self, width: f64) -> Self {
        self.scrollbar = width;
        self
    }

    pub fn without_splice(mut self) -> Self {
        self.splice = false;
        self
    }

    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    /// Display indices currently rendered, ascending.
    pub fn rendered_indices(&self) -> Vec<usize> {
        self.rows.keys().copied().collect()
    }

    pub fn row(&self, display_index: usize) -> Option<&RenderRow> {
        self.rows.get(&display_index)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

#[allow(clippy::cast_precision_loss)]
impl Presenter for HeadlessPresenter {
    fn measure_label_width(&mut self, label: &str) -> f64 {
        label.chars().count() as f64 * self.char_width
    }

    fn measure_available_width(&mut self) -> f64 {
        self.available_width
    }

    fn render_row_range(&mut self, batch: &RenderBatch) -> bool {
        if !self.commit {
            return false;
        }
        self.calls.push(PresenterCall::Render {
            first: batch.range.first,
            last: batch.range.last,
            placement: batch.placement,
        });
        for row in &batch.rows {
            if self.rows.insert(row.display_index, row.clone()).is_some() {
                self.duplicate_renders += 1;
            }
        }
        true
    }

    fn remove_rendered_row(&mut self, display_index: usize) {
        self.calls.push(PresenterCall::Remove(display_index));
        if self.rows.remove(&display_index).is_none() {
            self.stray_removals += 1;
        }
    }

    fn splice_rendered_rows(&mut self, at: usize, removed: usize, inserted: usize) -> bool {
        if !self.splice {
            return false;
        }
        self.calls.push(PresenterCall::Splice {
            at,
            removed,
            inserted,
        });
        let tail = self.rows.split_off(&at);
        let end = at + removed;
        self.stray_removals += (at..end).filter(|i| !tail.contains_key(i)).count();
        for (index, mut row) in tail {
            if index < end {
                continue;
            }
            let moved = index - removed + inserted;
            row.display_index = moved;
            row.physical_index = moved;
            self.rows.insert(moved, row);
        }
        true
    }

    fn set_column_pixel_width(&mut self, position: usize, px: f64) {
        self.calls.push(PresenterCall::ColumnWidth(position, px));
        self.column_widths.insert(position, px);
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn measure_row_metrics(&mut self) -> Option<RowMetrics> {
        self.metrics
    }

    fn scrollbar_width(&self) -> f64 {
        self.scrollbar
    }

    fn sort_arrow_width(&mut self) -> f64 {
        self.arrow_width
    }

    fn set_content_height(&mut self, height: f64) {
        self.calls.push(PresenterCall::ContentHeight(height));
        self.content_height = height;
    }

    fn render_header(&mut self, cells: &[HeaderCell]) {
        self.calls.push(PresenterCall::Header(cells.len()));
        self.header = cells.to_vec();
    }
}
