//! Column operations, width settings and sorting.

use std::collections::BTreeMap;

use log::debug;

use super::Grid;
use crate::columns::{ColumnModel, ColumnRef};
use crate::events::GridEvent;
use crate::format::{default_cell_formatter, default_header_formatter, CellFormatter, HeaderFormatter};
use crate::layout::{allocate_column_widths, ColumnLayout, WidthPolicy, WidthRequest};
use crate::render::Presenter;
use crate::sort::ComparatorProvider;
use crate::types::{
    ColumnConfig, ColumnDef, ColumnWidthMode, ParsedWidth, SortExport, WidthSpec,
};

impl<P: Presenter> Grid<P> {
    /// Replace every column.
    pub fn set_columns(&mut self, defs: &[ColumnDef]) {
        self.columns = ColumnModel::from_defs(defs, self.options.min_column_width);
        self.columns.ensure_visible();
        debug!("columns set: {}", self.columns.len());
        self.resort();
        self.clear_and_render();
    }

    /// Insert a column before `before` (a name or an order value), or
    /// append it. Duplicate names are ignored.
    pub fn add_column(&mut self, def: &ColumnDef, before: Option<ColumnRef>) -> bool {
        if !self
            .columns
            .add(def, before.as_ref(), self.options.min_column_width)
        {
            return false;
        }
        self.ensure_visible_columns();
        self.clear_and_render();
        self.events.emit(&GridEvent::ColumnAdded {
            name: def.name.clone(),
        });
        true
    }

    pub fn remove_column(&mut self, name: &str) -> bool {
        if self.columns.remove(name).is_none() {
            return false;
        }
        self.ensure_visible_columns();
        if self.sort.is_sorted_by(name) {
            self.resort();
        }
        self.clear_and_render();
        self.events.emit(&GridEvent::ColumnRemoved {
            name: name.to_string(),
        });
        true
    }

    /// Move `src` into `dest`'s slot. Either side is a name or a visible
    /// position.
    pub fn move_column(&mut self, src: impl Into<ColumnRef>, dest: impl Into<ColumnRef>) -> bool {
        let Some(moved) = self.columns.move_column(&src.into(), &dest.into()) else {
            return false;
        };
        self.ensure_visible_columns();
        self.clear_and_render();
        self.events.emit(&GridEvent::ColumnMoved {
            name: moved.name,
            from: moved.from,
            to: moved.to,
        });
        true
    }

    pub fn set_column_visible(&mut self, name: &str, visible: bool) -> bool {
        if !self.columns.set_visible(name, visible) {
            return false;
        }
        let name = name.to_string();
        self.events.emit(&if visible {
            GridEvent::ColumnShown { name }
        } else {
            GridEvent::ColumnHidden { name }
        });
        self.ensure_visible_columns();
        self.clear_and_render();
        true
    }

    pub fn is_column_visible(&self, name: &str) -> bool {
        self.columns.get(name).is_some_and(|c| c.visible)
    }

    /// Promote the first column when none is visible.
    fn ensure_visible_columns(&mut self) {
        if let Some(name) = self.columns.ensure_visible() {
            self.events.emit(&GridEvent::ColumnShown { name });
        }
    }

    /// Set a column's declared width: pixels, a fraction, `"NN%"` or
    /// `"auto"`. Emits the change even when the serialized width is equal.
    pub fn set_column_width(&mut self, name: &str, width: impl Into<WidthSpec>) -> bool {
        let min_width = self.options.min_column_width;
        let Some(column) = self.columns.get_mut(name) else {
            return false;
        };
        let parsed = ParsedWidth::parse(
            Some(&width.into()),
            if column.ignore_min { 0.0 } else { min_width },
        );
        let old = column.serialized_width();
        column.width_mode = parsed.mode;
        column.width = parsed.width;
        let new = column.serialized_width();

        if old != new {
            self.table_width_changed(true);
        }
        self.events.emit(&GridEvent::ColumnWidthChanged {
            name: name.to_string(),
            old,
            new,
        });
        true
    }

    /// `None` resets the label to the column name.
    pub fn set_column_label(&mut self, name: &str, label: Option<&str>) -> bool {
        let Some(column) = self.columns.get_mut(name) else {
            return false;
        };
        column.label = label.map_or_else(|| column.name.clone(), str::to_string);
        let (visible, auto) = (column.visible, column.width_mode == ColumnWidthMode::Auto);
        if visible {
            if auto {
                self.table_width_changed(true);
            } else {
                self.render_header();
            }
        }
        true
    }

    pub fn get_column_width(&self, name: &str) -> Option<WidthSpec> {
        self.columns.get(name).map(|c| c.serialized_width())
    }

    pub fn get_column_config(&self, name: &str) -> Option<ColumnConfig> {
        self.columns.get(name).map(|c| ColumnConfig {
            order: c.order,
            width: c.serialized_width(),
            visible: c.visible,
            label: c.label.clone(),
        })
    }

    /// Configuration of every column, keyed by name.
    pub fn get_columns_config(&self) -> BTreeMap<String, ColumnConfig> {
        self.columns
            .iter()
            .filter_map(|c| Some((c.name.clone(), self.get_column_config(&c.name)?)))
            .collect()
    }

    /// Sort by `column`.
    ///
    /// `descending = None` flips the direction when `column` is the most
    /// recent key and sorts ascending otherwise. `add` augments the current
    /// stack instead of replacing it. An unknown column clears the sort.
    pub fn sort(&mut self, column: Option<&str>, descending: Option<bool>, add: bool) {
        let visible_count = self.columns.visible_count();
        match column.and_then(|name| self.columns.get(name)) {
            Some(col) => self.sort.toggle(col, descending, add, visible_count),
            None => self.sort.clear(),
        }
        debug!("sort stack: {:?}", self.sort.export());

        if self.options.adjust_column_width_for_sort_arrow {
            self.update_sort_arrow_widths();
        }
        self.apply_sort();
        self.events.emit(&GridEvent::SortChanged {
            columns: self.sort.export(),
        });
        self.clear_and_render();
    }

    /// Re-apply the current sort, dropping keys whose column is gone.
    pub fn resort(&mut self) {
        if self.sort.is_empty() {
            return;
        }
        let columns = &self.columns;
        let dropped = self.sort.retain_existing(|name| columns.get(name).is_some());
        if dropped > 0 {
            debug!("resort dropped {dropped} missing sort column(s)");
            if self.options.adjust_column_width_for_sort_arrow {
                self.update_sort_arrow_widths();
            }
        }
        self.apply_sort();
        self.events.emit(&GridEvent::SortChanged {
            columns: self.sort.export(),
        });
    }

    pub fn get_sorted_columns(&self) -> Vec<SortExport> {
        self.sort.export()
    }

    /// Sort the store in place and follow it with the filter view.
    /// Returns `false` when there is nothing to sort by.
    pub(super) fn apply_sort(&mut self) -> bool {
        let Some(compare) = self.sort.comparator() else {
            return false;
        };
        let permutation = self.rows.sort_by(|a, b| compare(a, b));
        if let Some(filter) = &mut self.filter {
            filter.view.resort(&self.rows, &permutation, |a, b| compare(a, b));
        }
        true
    }

    fn update_sort_arrow_widths(&mut self) {
        let arrow = self.presenter.sort_arrow_width().max(0.0);
        let sort = &self.sort;
        for column in self.columns.iter_mut() {
            column.arrow_proposed_width =
                if column.width_mode != ColumnWidthMode::Relative && sort.is_sorted_by(&column.name) {
                    arrow
                } else {
                    0.0
                };
        }
    }

    pub fn set_comparator_provider(&mut self, provider: Option<ComparatorProvider>) {
        self.sort.set_comparator_provider(provider);
    }

    /// `None` restores the plain-text formatter.
    pub fn set_cell_formatter(&mut self, formatter: Option<CellFormatter>) {
        self.cell_formatter = formatter.unwrap_or_else(default_cell_formatter);
        self.clear_and_render();
    }

    /// `None` restores the label-as-is formatter.
    pub fn set_header_formatter(&mut self, formatter: Option<HeaderFormatter>) {
        self.header_formatter = formatter.unwrap_or_else(default_header_formatter);
        self.render_header();
    }

    /// Change the global minimum width. Declared widths are re-parsed so
    /// absolute columns are raised to the new floor.
    pub fn set_min_column_width(&mut self, min_width: f64) {
        let min_width = if min_width.is_finite() { min_width.max(0.0) } else { 0.0 };
        if (min_width - self.options.min_column_width).abs() < f64::EPSILON {
            return;
        }
        self.options.min_column_width = min_width;
        for column in self.columns.iter_mut() {
            if column.width_mode == ColumnWidthMode::Absolute && !column.ignore_min {
                column.width = column.width.max(min_width);
            }
        }
        self.table_width_changed(true);
    }

    /// Maximum number of concurrently sorted columns (at least 1).
    pub fn set_sortable_columns(&mut self, count: usize) {
        let count = count.max(1);
        if count == self.options.sortable_columns {
            return;
        }
        self.options.sortable_columns = count;
        let before = self.sort.stack().len();
        self.sort.set_max_depth(count);
        if self.sort.stack().len() != before {
            self.resort();
            self.clear_and_render();
        }
    }

    pub fn set_movable_columns(&mut self, movable: bool) {
        self.options.movable_columns = movable;
    }

    pub fn set_resizable_columns(&mut self, resizable: bool) {
        self.options.resizable_columns = resizable;
    }

    pub fn set_relative_width_grows_to_fill_width(&mut self, grows: bool) {
        if self.options.relative_width_grows_to_fill_width != grows {
            self.options.relative_width_grows_to_fill_width = grows;
            self.table_width_changed(true);
        }
    }

    pub fn set_relative_width_shrinks_to_fill_width(&mut self, shrinks: bool) {
        if self.options.relative_width_shrinks_to_fill_width != shrinks {
            self.options.relative_width_shrinks_to_fill_width = shrinks;
            self.table_width_changed(true);
        }
    }

    pub fn set_auto_fill_table_width(&mut self, fill: bool) {
        if self.options.auto_fill_table_width != fill {
            self.options.auto_fill_table_width = fill;
            self.table_width_changed(true);
        }
    }

    /// Whether a user may drag `name` to a new slot.
    pub fn can_move_column(&self, name: &str) -> bool {
        self.options.movable_columns && self.columns.get(name).is_some_and(|c| c.movable)
    }

    /// Whether a user may resize `name`.
    pub fn can_resize_column(&self, name: &str) -> bool {
        self.options.resizable_columns && self.columns.get(name).is_some_and(|c| c.resizable)
    }

    /// Whether a user may sort by `name`.
    pub fn can_sort_column(&self, name: &str) -> bool {
        self.columns.get(name).is_some_and(|c| c.sortable)
    }

    /// Column whose resize handle lies under header x-offset `x`.
    pub fn resize_target(&self, x: f64) -> Option<String> {
        if !self.options.resizable_columns {
            return None;
        }
        let position = self.layout.resize_target(x, self.options.resize_area_width)?;
        self.columns
            .visible_at(position)
            .filter(|c| c.resizable)
            .map(|c| c.name.clone())
    }

    /// Run the width allocator over the visible columns and push changed
    /// widths to the presenter.
    pub(super) fn recalc_widths(&mut self) {
        let policy = WidthPolicy::from(&self.options);
        let available = self.presenter.measure_available_width();
        let scrollbar = if self.has_vertical_scrollbar() {
            self.presenter.scrollbar_width()
        } else {
            0.0
        };

        let presenter = &mut self.presenter;
        let requests: Vec<WidthRequest<'_>> = self
            .columns
            .visible()
            .map(|c| WidthRequest {
                label: &c.label,
                mode: c.width_mode,
                width: c.width,
                ignore_min: c.ignore_min,
                resizable: c.resizable,
                arrow_width: c.arrow_proposed_width,
                previous: c.actual_width,
            })
            .collect();
        let allocation = allocate_column_widths(available, &requests, &policy, scrollbar, |label| {
            presenter.measure_label_width(label)
        });

        for (position, fraction) in &allocation.converted {
            if let Some(column) = self.columns.visible_at_mut(*position) {
                column.width_mode = ColumnWidthMode::Relative;
                column.width = *fraction;
            }
        }

        let last_position = allocation.widths.len().checked_sub(1);
        let mut pushed = Vec::new();
        for (position, width) in allocation.widths.iter().enumerate() {
            let Some(column) = self.columns.visible_at_mut(position) else {
                continue;
            };
            let previous_screen = column.on_screen_width();
            column.actual_width = *width;
            column.last_column_adjusted_width = if Some(position) == last_position {
                allocation.last_column_width
            } else {
                None
            };
            if allocation.changed.contains(&position)
                || (column.on_screen_width() - previous_screen).abs() > f64::EPSILON
            {
                pushed.push((position, column.on_screen_width()));
            }
        }
        for (position, width) in pushed {
            self.presenter.set_column_pixel_width(position, width);
        }

        debug!(
            "column widths allocated: {:?} (available {available}, scrollbar {scrollbar})",
            allocation.widths
        );
        self.layout = ColumnLayout::new(&allocation.widths);
    }
}
