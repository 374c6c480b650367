//! Row operations, filtering and row lookups.

use log::debug;

use super::{ActiveFilter, Grid};
use crate::events::GridEvent;
use crate::filter::{by_column_filter, FilterArgs, FilterPredicate, FilterView};
use crate::format::cell_content;
use crate::layout::{RowRange, WindowState};
use crate::render::{Placement, Presenter};
use crate::types::Row;

impl<P: Presenter> Grid<P> {
    /// Replace the whole data set. With `resort` the current sort is
    /// re-applied to the new rows.
    pub fn set_rows(&mut self, rows: Vec<Row>, resort: bool) {
        let count = rows.len();
        self.rows.reset(rows);
        self.refilter();
        if resort {
            self.resort();
        }
        debug!("rows set: {count}");
        self.clear_and_render();
        self.events.emit(&GridEvent::RowsAdded {
            count,
            replaced: true,
        });
    }

    /// Insert rows at physical index `at` (clamped; `None` appends).
    ///
    /// A fully rendered, unfiltered table only renders the new rows; other
    /// states rebuild.
    pub fn add_rows(&mut self, rows: Vec<Row>, at: Option<usize>, resort: bool) {
        if rows.is_empty() {
            return;
        }
        let count = rows.len();
        let splice = self.can_splice(self.rows.len()) && (!resort || self.sort.is_empty());
        let at = self.rows.add(rows, at);
        self.refilter();
        if resort {
            self.resort();
        }
        debug!("rows added: {count} at {at}");
        if !(splice && self.splice_rows(at, 0, count)) {
            self.clear_and_render();
        }
        self.events.emit(&GridEvent::RowsAdded {
            count,
            replaced: false,
        });
    }

    /// Remove up to `count` rows starting at physical index `physical`.
    /// Returns how many were removed.
    pub fn remove_rows(&mut self, physical: usize, count: usize) -> usize {
        if count == 0 || physical >= self.rows.len() {
            return 0;
        }
        let splice = self.can_splice(self.rows.len());
        let removed = self.rows.remove(physical, count).len();
        self.refilter();
        debug!("rows removed: {removed} at {physical}");
        if !(splice && self.splice_rows(physical, removed, 0)) {
            self.clear_and_render();
        }
        self.events.emit(&GridEvent::RowsRemoved {
            physical_index: physical,
            count: removed,
        });
        removed
    }

    pub fn remove_row(&mut self, physical: usize) -> bool {
        self.remove_rows(physical, 1) == 1
    }

    /// Re-render one row if it is currently rendered. Returns `true` when
    /// the row was re-rendered.
    pub fn refresh_row(&mut self, physical: usize) -> bool {
        if self.detached || self.skeleton_dirty {
            return false;
        }
        let Some(display) = self.display_for_physical(physical) else {
            return false;
        };
        if !self.window.rendered().is_some_and(|r| r.contains(display)) {
            return false;
        }

        self.presenter.remove_rendered_row(display);
        self.events.emit(&GridEvent::RowDestroyed {
            display_index: display,
        });
        let range = RowRange {
            first: display,
            last: display,
        };
        if self.render_batch(range, Placement::InPlace) {
            true
        } else {
            self.skeleton_dirty = true;
            self.deferred.request();
            false
        }
    }

    /// Re-render every row of the current window.
    pub fn refresh_all_virtual_rows(&mut self) {
        if self.detached || self.window.state != WindowState::Windowed {
            return;
        }
        let Some(range) = self.window.rendered() else {
            return;
        };
        self.destroy_rendered_rows();
        if self.render_batch(range, Placement::Append) {
            self.window.set_rendered(Some(range));
        } else {
            self.deferred.request();
        }
    }

    /// Apply a filter. `None` (or JSON null) removes it.
    ///
    /// Going from filtered to unfiltered, or applying new args, rebuilds the
    /// table and emits `FilterChanged`; clearing an absent filter does
    /// nothing.
    pub fn filter(&mut self, args: Option<FilterArgs>) {
        let had_filter = self.filter.take().is_some();
        self.filter = args
            .filter(|args| !args.is_null())
            .map(|args| ActiveFilter {
                view: FilterView::apply(&self.rows, &*self.predicate, &args),
                args,
            });

        if had_filter || self.filter.is_some() {
            debug!(
                "filter applied: {} of {} rows",
                self.display_len(),
                self.rows.len()
            );
            self.clear_and_render();
            self.events.emit(&GridEvent::FilterChanged {
                args: self.filter.as_ref().map(|f| f.args.clone()),
            });
        }
    }

    /// Install a custom predicate. `None` restores the by-column filter.
    /// An active filter is re-evaluated with the new predicate.
    pub fn set_filter(&mut self, predicate: Option<FilterPredicate>) {
        self.predicate = predicate.unwrap_or_else(by_column_filter);
        if self.filter.is_some() {
            self.refilter();
            self.clear_and_render();
        }
    }

    pub fn filter_args(&self) -> Option<&FilterArgs> {
        self.filter.as_ref().map(|f| &f.args)
    }

    /// Re-evaluate the active filter over the whole store.
    pub(super) fn refilter(&mut self) {
        if let Some(filter) = &mut self.filter {
            filter.view = FilterView::apply(&self.rows, &*self.predicate, &filter.args);
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows in display order; equals [`Grid::row_count`] when unfiltered.
    pub fn filtered_row_count(&self) -> usize {
        self.display_len()
    }

    pub fn data_for_row(&self, physical: usize) -> Option<&Row> {
        self.rows.get(physical)
    }

    pub fn data_for_filtered_row(&self, display: usize) -> Option<&Row> {
        self.physical_for_display(display)
            .and_then(|physical| self.rows.get(physical))
    }

    pub fn index_for_row(&self, row: &Row) -> Option<usize> {
        self.rows.index_of(row)
    }

    /// Display index of `row`, `None` when absent or filtered out.
    pub fn index_for_filtered_row(&self, row: &Row) -> Option<usize> {
        self.rows
            .index_of(row)
            .and_then(|physical| self.display_for_physical(physical))
    }

    /// Physical index of the row shown at `display`.
    pub fn physical_index(&self, display: usize) -> Option<usize> {
        self.physical_for_display(display)
    }

    /// Formatted content of `column` for physical row `physical`.
    pub fn cell_content(&self, physical: usize, column: &str) -> Option<String> {
        let row = self.rows.get(physical)?;
        let column = self.columns.get(column)?;
        Some(cell_content(&self.cell_formatter, column, row))
    }
}
