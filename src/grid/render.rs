//! Render flow: skeleton builds, windowed reconciliation, deferred renders.

use log::{debug, trace};

use super::Grid;
use crate::events::GridEvent;
use crate::format::cell_content;
use crate::layout::{row_offset, scroll_height, RowRange, WindowOp, WindowState};
use crate::render::{HeaderCell, Placement, Presenter, RenderBatch, RenderCell, RenderRow};

impl<P: Presenter> Grid<P> {
    /// Render whatever is out of date.
    ///
    /// Rebuilds the skeleton after a structural change, then brings the
    /// rendered rows in line with the viewport. Returns `false` when nothing
    /// could be rendered yet: the grid is detached, the presenter has no
    /// layout box (a deferred render is queued, see [`Grid::tick`]), or a
    /// virtual grid has no viewport height.
    pub fn render(&mut self) -> bool {
        if self.detached {
            return false;
        }
        if !self.presenter.is_attached() {
            if self.deferred.request() {
                debug!("presenter not attached, render deferred");
            }
            return false;
        }

        if self.window.state == WindowState::Unmounted {
            if self.options.virtual_table && !self.viewport.is_sized() {
                trace!("virtual grid has no viewport height yet");
                return false;
            }
            self.window.mount(self.options.virtual_table);
            self.skeleton_dirty = true;
        }

        if self.skeleton_dirty {
            self.build_skeleton();
        }
        if self.window.state == WindowState::Windowed {
            self.reconcile_window();
        }

        self.events.emit(&GridEvent::RenderCompleted);
        true
    }

    /// Mark everything stale and render from scratch.
    pub fn clear_and_render(&mut self) -> bool {
        self.skeleton_dirty = true;
        self.render()
    }

    /// Scroll to an absolute offset.
    pub fn scroll_to(&mut self, y: f64) {
        self.viewport.set_scroll(y, self.content_height);
        self.on_scroll();
    }

    pub fn scroll_by(&mut self, delta_y: f64) {
        self.viewport.scroll_by(delta_y, self.content_height);
        self.on_scroll();
    }

    fn on_scroll(&mut self) {
        if self.detached || self.skeleton_dirty || self.window.state != WindowState::Windowed {
            return;
        }
        if !self.presenter.is_attached() {
            self.deferred.request();
            return;
        }
        self.reconcile_window();
    }

    /// The host resized the viewport.
    pub fn resize(&mut self, width: f64, height: f64) {
        let delta = self.viewport.resize(width, height);
        if self.detached || !(delta.width || delta.height) {
            return;
        }
        debug!("viewport resized to {width}x{height}");

        if self.window.state == WindowState::Unmounted {
            self.render();
        } else if delta.height && self.options.virtual_table {
            self.clear_and_render();
        } else {
            self.table_width_changed(false);
        }
    }

    /// Re-run the width allocator. With `force` the whole table is
    /// re-rendered, otherwise only changed widths are pushed.
    pub fn table_width_changed(&mut self, force: bool) {
        if self.detached || self.window.state == WindowState::Unmounted {
            self.skeleton_dirty = true;
            return;
        }
        if force || self.skeleton_dirty {
            self.clear_and_render();
            return;
        }
        if !self.presenter.is_attached() {
            self.skeleton_dirty = true;
            self.deferred.request();
            return;
        }
        self.recalc_widths();
        self.render_header();
    }

    /// Run a deferred render if one is pending and the presenter now has a
    /// layout box. Returns `true` when a render ran.
    pub fn tick(&mut self) -> bool {
        if self.detached || !self.presenter.is_attached() {
            return false;
        }
        if !self.deferred.take() {
            return false;
        }
        debug!("running deferred render");
        self.render()
    }

    /// Whether a deferred render is waiting for [`Grid::tick`].
    pub fn needs_tick(&self) -> bool {
        !self.detached && self.deferred.is_pending()
    }

    /// Stop rendering for good: drops the pending deferred render and every
    /// rendered row. Later calls are no-ops.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        if self.deferred.is_pending() {
            debug!("deferred render cancelled");
        }
        self.deferred.cancel();
        self.destroy_rendered_rows();
        self.window.unmount();
        self.feeds.clear();
        self.detached = true;
    }

    /// Top offset of display row `display`.
    pub fn row_y_pos(&self, display: usize) -> Option<f64> {
        (display < self.display_len())
            .then(|| row_offset(display, &self.window.metrics.unwrap_or_default()))
    }

    /// Display indices currently rendered.
    pub fn rendered_range(&self) -> Option<RowRange> {
        self.window.rendered()
    }

    fn build_skeleton(&mut self) {
        self.destroy_rendered_rows();
        self.window.metrics = Some(self.presenter.measure_row_metrics().unwrap_or_default());
        self.skeleton_dirty = false;

        self.update_content_height();
        self.recalc_widths();
        self.render_header();
        debug!(
            "skeleton built: {} visible columns, {} display rows",
            self.columns.visible_count(),
            self.display_len()
        );
        self.events.emit(&GridEvent::SkeletonBuilt);

        if self.window.state == WindowState::FullRender {
            if let Some(range) = full_range(self.display_len()) {
                if self.render_batch(range, Placement::Append) {
                    self.window.set_rendered(Some(range));
                } else {
                    self.skeleton_dirty = true;
                    self.deferred.request();
                }
            }
        }
    }

    /// Move the rendered band to the viewport, incrementally.
    fn reconcile_window(&mut self) {
        let old = self.window.rendered();
        let ops = self
            .window
            .advance(self.viewport.scroll_y, self.viewport.height, self.display_len());
        trace!(
            "window {:?} -> {:?} at scroll {}: {} op(s)",
            old,
            self.window.rendered(),
            self.viewport.scroll_y,
            ops.len()
        );

        // What is really on screen, in case the presenter refuses a batch
        let mut actual = old;
        for op in ops {
            match op {
                WindowOp::RemoveRow(index) => {
                    self.presenter.remove_rendered_row(index);
                    self.events.emit(&GridEvent::RowDestroyed {
                        display_index: index,
                    });
                    actual = actual.and_then(|r| {
                        if index == r.first {
                            RowRange::new(r.first + 1, r.last)
                        } else {
                            r.last.checked_sub(1).and_then(|last| RowRange::new(r.first, last))
                        }
                    });
                }
                WindowOp::Prepend(range) | WindowOp::Append(range) => {
                    let placement = if matches!(op, WindowOp::Prepend(_)) {
                        Placement::Prepend
                    } else {
                        Placement::Append
                    };
                    if !self.render_batch(range, placement) {
                        debug!("presenter refused rows {}..={}, render deferred", range.first, range.last);
                        self.window.set_rendered(actual);
                        self.deferred.request();
                        return;
                    }
                    actual = Some(match actual {
                        None => range,
                        Some(r) => RowRange {
                            first: r.first.min(range.first),
                            last: r.last.max(range.last),
                        },
                    });
                }
            }
        }
    }

    /// Whether a row insertion or removal can be applied to the presenter
    /// in place: full-render mode, no filter, and every one of the
    /// `previous_len` rows rendered.
    pub(super) fn can_splice(&self, previous_len: usize) -> bool {
        !self.detached
            && !self.skeleton_dirty
            && self.window.state == WindowState::FullRender
            && self.filter.is_none()
            && self.presenter.is_attached()
            && self.window.rendered() == full_range(previous_len)
    }

    /// Splice the rendered rows after the store replaced `removed` rows at
    /// `at` with `inserted` new ones. Returns `false` when the presenter
    /// cannot splice and nothing was touched.
    pub(super) fn splice_rows(&mut self, at: usize, removed: usize, inserted: usize) -> bool {
        if !self.presenter.splice_rendered_rows(at, removed, inserted) {
            return false;
        }
        for index in at..at + removed {
            self.events.emit(&GridEvent::RowDestroyed {
                display_index: index,
            });
        }

        let len = self.display_len();
        if let Some(range) = inserted.checked_sub(1).and_then(|last| RowRange::new(at, at + last)) {
            if !self.render_batch(range, Placement::Insert) {
                debug!("presenter refused rows {}..={}, render deferred", range.first, range.last);
                self.presenter.splice_rendered_rows(at, inserted, 0);
                self.window.set_rendered(full_range(len.saturating_sub(inserted)));
                self.skeleton_dirty = true;
                self.deferred.request();
                return true;
            }
        }
        self.window.set_rendered(full_range(len));
        trace!("spliced rows at {at}: -{removed} +{inserted}");

        let had_scrollbar = self.has_vertical_scrollbar();
        self.update_content_height();
        if self.has_vertical_scrollbar() != had_scrollbar {
            self.recalc_widths();
            self.render_header();
        }
        self.events.emit(&GridEvent::RenderCompleted);
        true
    }

    /// Build and hand over a batch. Emits `RowCreated` per row when the
    /// presenter commits it.
    pub(super) fn render_batch(&mut self, range: RowRange, placement: Placement) -> bool {
        let windowed = self.window.state == WindowState::Windowed;
        let metrics = self.window.metrics.unwrap_or_default();
        let rows: Vec<RenderRow> = range
            .iter()
            .filter_map(|display| {
                let physical = self.physical_for_display(display)?;
                let row = self.rows.get(physical)?;
                let cells = self
                    .columns
                    .visible()
                    .map(|column| RenderCell {
                        column: column.name.clone(),
                        width: column.on_screen_width(),
                        content: cell_content(&self.cell_formatter, column, row),
                    })
                    .collect();
                Some(RenderRow {
                    display_index: display,
                    physical_index: physical,
                    top: windowed.then(|| row_offset(display, &metrics)),
                    cells,
                })
            })
            .collect();

        let batch = RenderBatch {
            range,
            placement,
            rows,
        };
        if !self.presenter.render_row_range(&batch) {
            return false;
        }
        for row in &batch.rows {
            self.events.emit(&GridEvent::RowCreated {
                display_index: row.display_index,
                physical_index: row.physical_index,
            });
        }
        true
    }

    /// Remove every rendered row, emitting `RowDestroyed` for each.
    pub(super) fn destroy_rendered_rows(&mut self) {
        let Some(range) = self.window.rendered() else {
            return;
        };
        for index in range.iter() {
            self.presenter.remove_rendered_row(index);
            self.events.emit(&GridEvent::RowDestroyed {
                display_index: index,
            });
        }
        self.window.clear();
    }

    pub(super) fn render_header(&mut self) {
        let sorted = self.sort.stack();
        let cells: Vec<HeaderCell> = self
            .columns
            .visible()
            .enumerate()
            .map(|(position, column)| HeaderCell {
                position,
                column: column.name.clone(),
                content: (self.header_formatter)(&column.label, &column.name),
                width: column.on_screen_width(),
                sorted: sorted
                    .iter()
                    .find(|s| s.column == column.name)
                    .map(|s| s.descending),
            })
            .collect();
        self.presenter.render_header(&cells);
    }

    /// Push the scrollable height for the current display rows and keep
    /// the scroll offset inside it.
    pub(super) fn update_content_height(&mut self) {
        let metrics = self.window.metrics.unwrap_or_default();
        self.content_height = scroll_height(&metrics, self.display_len());
        self.presenter.set_content_height(self.content_height);
        self.viewport.clamp_scroll(self.content_height);
    }

    pub(super) fn has_vertical_scrollbar(&self) -> bool {
        self.viewport.is_sized() && self.content_height > self.viewport.height
    }
}

/// `0..=len - 1`, or `None` for no rows.
fn full_range(len: usize) -> Option<RowRange> {
    len.checked_sub(1).and_then(|last| RowRange::new(0, last))
}
