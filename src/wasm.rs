//! JavaScript facade for the grid (wasm32 only).
//!
//! `DataGrid` wraps a [`Grid`] driven by a JavaScript presenter object:
//! - Presenter methods are looked up by name on the object each call
//! - Host callbacks (formatters, comparator, filter) are plain JS functions
//! - Events are queued during an operation and delivered to JS listeners
//!   after the grid borrow is released, so listeners may call back in
//! - Deferred renders are scheduled with `setTimeout`
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { DataGrid } from 'datagrid';
//! await init();
//! const grid = new DataGrid({ columns: [{ name: 'id' }], rows }, presenter);
//! grid.on('render', () => console.log('rendered'));
//! grid.resize(800, 600);
//! ```

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Reflect};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::columns::ColumnRef;
use crate::error::GridError;
use crate::events::{EventKind, GridEvent};
use crate::filter::{FilterArgs, FilterPredicate};
use crate::format::{CellFormatter, HeaderFormatter};
use crate::grid::Grid;
use crate::layout::RowMetrics;
use crate::render::{HeaderCell, Presenter, RenderBatch};
use crate::sort::{Comparator, ComparatorProvider};
use crate::types::{ColumnDef, GridOptions, Row, WidthSpec};

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::UNDEFINED)
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn warn(message: &str, error: &JsValue) {
    web_sys::console::warn_2(&JsValue::from_str(message), error);
}

#[allow(clippy::cast_precision_loss)]
fn index_to_js(index: usize) -> JsValue {
    JsValue::from_f64(index as f64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn column_ref(value: &JsValue) -> Option<ColumnRef> {
    if let Some(n) = value.as_f64() {
        return (n >= 0.0).then(|| ColumnRef::Position(n as usize));
    }
    value.as_string().map(ColumnRef::Name)
}

/// Row heights as reported by `measureRowMetrics()`.
#[derive(Deserialize)]
struct MetricsRecord {
    first: f64,
    middle: f64,
    last: f64,
}

/// Presenter backed by a JavaScript object.
///
/// Missing methods fall back to the trait defaults; a method that throws
/// is logged and treated as returning nothing.
struct JsPresenter {
    target: JsValue,
}

impl JsPresenter {
    fn method(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .ok()?
            .dyn_into::<Function>()
            .ok()
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let method = self.method(name)?;
        let result = match args {
            [] => method.call0(&self.target),
            [a] => method.call1(&self.target, a),
            [a, b] => method.call2(&self.target, a, b),
            _ => method.apply(&self.target, &args.iter().collect::<Array>()),
        };
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                warn(&format!("presenter.{name} threw"), &error);
                None
            }
        }
    }

    fn call_f64(&self, name: &str, args: &[JsValue]) -> Option<f64> {
        self.call(name, args)?.as_f64().filter(|v| v.is_finite())
    }
}

impl Presenter for JsPresenter {
    fn measure_label_width(&mut self, label: &str) -> f64 {
        self.call_f64("measureLabelWidth", &[JsValue::from_str(label)])
            .unwrap_or(0.0)
    }

    fn measure_available_width(&mut self) -> f64 {
        self.call_f64("measureAvailableWidth", &[]).unwrap_or(0.0)
    }

    fn render_row_range(&mut self, batch: &RenderBatch) -> bool {
        match self.call("renderRowRange", &[to_js(batch)]) {
            // `undefined` counts as committed
            Some(value) => value.as_bool().unwrap_or(true),
            None => false,
        }
    }

    fn remove_rendered_row(&mut self, display_index: usize) {
        self.call("removeRenderedRow", &[index_to_js(display_index)]);
    }

    fn splice_rendered_rows(&mut self, at: usize, removed: usize, inserted: usize) -> bool {
        // Absent or throwing: report unsupported
        self.call(
            "spliceRenderedRows",
            &[index_to_js(at), index_to_js(removed), index_to_js(inserted)],
        )
        .is_some()
    }

    fn set_column_pixel_width(&mut self, position: usize, px: f64) {
        self.call(
            "setColumnPixelWidth",
            &[index_to_js(position), JsValue::from_f64(px)],
        );
    }

    fn is_attached(&self) -> bool {
        self.call("isAttached", &[])
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    fn measure_row_metrics(&mut self) -> Option<RowMetrics> {
        let value = self.call("measureRowMetrics", &[])?;
        let record: MetricsRecord = serde_wasm_bindgen::from_value(value).ok()?;
        Some(RowMetrics::new(record.first, record.middle, record.last))
    }

    fn scrollbar_width(&self) -> f64 {
        self.call_f64("scrollbarWidth", &[]).unwrap_or(0.0)
    }

    fn sort_arrow_width(&mut self) -> f64 {
        self.call_f64("sortArrowWidth", &[]).unwrap_or(0.0)
    }

    fn set_content_height(&mut self, height: f64) {
        self.call("setContentHeight", &[JsValue::from_f64(height)]);
    }

    fn render_header(&mut self, cells: &[HeaderCell]) {
        self.call("renderHeader", &[to_js(cells)]);
    }
}

/// State shared between the facade and its timer callback.
struct Inner {
    grid: RefCell<Grid<JsPresenter>>,
    queue: Rc<RefCell<Vec<GridEvent>>>,
    listeners: RefCell<Vec<(EventKind, Function)>>,
    timer: Cell<Option<i32>>,
    tick_closure: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn with_grid<R>(this: &Rc<Inner>, f: impl FnOnce(&mut Grid<JsPresenter>) -> R) -> R {
        let result = {
            let mut grid = this.grid.borrow_mut();
            f(&mut grid)
        };
        Self::after_operation(this);
        result
    }

    fn after_operation(this: &Rc<Inner>) {
        Self::flush_events(this);
        Self::schedule_tick(this);
    }

    /// Deliver queued events. Listeners run with the grid unborrowed.
    fn flush_events(this: &Rc<Inner>) {
        loop {
            let events = std::mem::take(&mut *this.queue.borrow_mut());
            if events.is_empty() {
                break;
            }
            for event in events {
                let kind = event.kind();
                let targets: Vec<Function> = this
                    .listeners
                    .borrow()
                    .iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, f)| f.clone())
                    .collect();
                if targets.is_empty() {
                    continue;
                }
                let payload = to_js(&event);
                for callback in targets {
                    if let Err(error) = callback.call1(&JsValue::NULL, &payload) {
                        warn(&format!("'{}' listener threw", kind.name()), &error);
                    }
                }
            }
        }
    }

    fn schedule_tick(this: &Rc<Inner>) {
        if this.timer.get().is_some() || !this.grid.borrow().needs_tick() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let mut closure = this.tick_closure.borrow_mut();
        if closure.is_none() {
            let weak: Weak<Inner> = Rc::downgrade(this);
            *closure = Some(Closure::wrap(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.timer.set(None);
                    Inner::with_grid(&inner, Grid::tick);
                }
            }) as Box<dyn FnMut()>));
        }
        let Some(callback) = closure.as_ref() else {
            return;
        };
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            0,
        ) {
            Ok(id) => this.timer.set(Some(id)),
            Err(error) => warn("could not schedule deferred render", &error),
        }
    }

    fn cancel_tick(&self) {
        if let (Some(id), Some(window)) = (self.timer.take(), web_sys::window()) {
            window.clear_timeout_with_handle(id);
        }
    }
}

/// Data grid driven from JavaScript.
#[wasm_bindgen]
pub struct DataGrid {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl DataGrid {
    /// Create a grid from an options object and a presenter object.
    ///
    /// # Errors
    /// Returns an error if the options don't decode or name the same column
    /// twice.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue, presenter: JsValue) -> Result<DataGrid, JsValue> {
        console_error_panic_hook::set_once();

        let options: GridOptions = if options.is_undefined() || options.is_null() {
            GridOptions::default()
        } else {
            from_js(options)?
        };
        options.validate()?;

        let grid = Grid::new(options, JsPresenter { target: presenter });
        let queue = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&queue);
        grid.events()
            .on_any(move |event| sink.borrow_mut().push(event.clone()));

        Ok(DataGrid {
            inner: Rc::new(Inner {
                grid: RefCell::new(grid),
                queue,
                listeners: RefCell::new(Vec::new()),
                timer: Cell::new(None),
                tick_closure: RefCell::new(None),
            }),
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut Grid<JsPresenter>) -> R) -> R {
        Inner::with_grid(&self.inner, f)
    }

    fn read<R>(&self, f: impl FnOnce(&Grid<JsPresenter>) -> R) -> R {
        f(&self.inner.grid.borrow())
    }

    /// Listen to an event by name (`"render"`, `"sort"`, `"rowcreate"`, ...).
    ///
    /// # Errors
    /// Returns an error for an unknown event name.
    pub fn on(&self, name: &str, callback: Function) -> Result<(), JsValue> {
        let kind = EventKind::from_name(name)
            .ok_or_else(|| GridError::Other(format!("unknown event '{name}'")))?;
        self.inner.listeners.borrow_mut().push((kind, callback));
        Ok(())
    }

    /// Remove one listener, or every listener for `name` when `callback` is
    /// omitted.
    pub fn off(&self, name: &str, callback: Option<Function>) {
        let Some(kind) = EventKind::from_name(name) else {
            return;
        };
        self.inner.listeners.borrow_mut().retain(|(k, f)| {
            *k != kind || callback.as_ref().is_some_and(|c| **c != **f)
        });
    }

    pub fn render(&self) -> bool {
        self.with(Grid::render)
    }

    #[wasm_bindgen(js_name = clearAndRender)]
    pub fn clear_and_render(&self) -> bool {
        self.with(Grid::clear_and_render)
    }

    #[wasm_bindgen(js_name = scrollTo)]
    pub fn scroll_to(&self, y: f64) {
        self.with(|g| g.scroll_to(y));
    }

    #[wasm_bindgen(js_name = scrollBy)]
    pub fn scroll_by(&self, delta_y: f64) {
        self.with(|g| g.scroll_by(delta_y));
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.with(|g| g.resize(width, height));
    }

    #[wasm_bindgen(js_name = tableWidthChanged)]
    pub fn table_width_changed(&self, force: bool) {
        self.with(|g| g.table_width_changed(force));
    }

    /// Stop rendering and drop every listener and pending timer.
    pub fn detach(&self) {
        self.inner.cancel_tick();
        self.with(Grid::detach);
        self.inner.listeners.borrow_mut().clear();
    }

    /// # Errors
    /// Returns an error if `rows` is not an array of objects.
    #[wasm_bindgen(js_name = setRows)]
    pub fn set_rows(&self, rows: JsValue, resort: Option<bool>) -> Result<(), JsValue> {
        let rows: Vec<Row> = from_js(rows)?;
        self.with(|g| g.set_rows(rows, resort.unwrap_or(false)));
        Ok(())
    }

    /// # Errors
    /// Returns an error if `rows` is not an array of objects.
    #[wasm_bindgen(js_name = addRows)]
    pub fn add_rows(&self, rows: JsValue, at: Option<u32>, resort: Option<bool>) -> Result<(), JsValue> {
        let rows: Vec<Row> = from_js(rows)?;
        self.with(|g| g.add_rows(rows, at.map(|a| a as usize), resort.unwrap_or(false)));
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    #[wasm_bindgen(js_name = removeRows)]
    pub fn remove_rows(&self, physical: u32, count: u32) -> u32 {
        self.with(|g| g.remove_rows(physical as usize, count as usize)) as u32
    }

    #[wasm_bindgen(js_name = removeRow)]
    pub fn remove_row(&self, physical: u32) -> bool {
        self.with(|g| g.remove_row(physical as usize))
    }

    #[wasm_bindgen(js_name = refreshRow)]
    pub fn refresh_row(&self, physical: u32) -> bool {
        self.with(|g| g.refresh_row(physical as usize))
    }

    #[wasm_bindgen(js_name = refreshAllVirtualRows)]
    pub fn refresh_all_virtual_rows(&self) {
        self.with(Grid::refresh_all_virtual_rows);
    }

    /// Apply filter arguments; `null`/`undefined` removes the filter.
    ///
    /// # Errors
    /// Returns an error if `args` can't be represented as JSON.
    pub fn filter(&self, args: JsValue) -> Result<(), JsValue> {
        let args: Option<FilterArgs> = if args.is_undefined() || args.is_null() {
            None
        } else {
            Some(from_js(args)?)
        };
        self.with(|g| g.filter(args));
        Ok(())
    }

    /// Install `(row, args) => boolean`, or restore the by-column filter.
    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(&self, predicate: Option<Function>) {
        let predicate = predicate.map(|f| -> FilterPredicate {
            Rc::new(move |row: &Row, args: &FilterArgs| {
                f.call2(&JsValue::NULL, &to_js(row), &to_js(args))
                    .map(|v| v.is_truthy())
                    .unwrap_or(false)
            })
        });
        self.with(|g| g.set_filter(predicate));
    }

    pub fn sort(&self, column: Option<String>, descending: Option<bool>, add: Option<bool>) {
        self.with(|g| g.sort(column.as_deref(), descending, add.unwrap_or(false)));
    }

    pub fn resort(&self) {
        self.with(Grid::resort);
    }

    #[wasm_bindgen(js_name = getSortedColumns)]
    pub fn get_sorted_columns(&self) -> JsValue {
        to_js(&self.read(Grid::get_sorted_columns))
    }

    /// Install `(columnName, descending) => (a, b) => number`.
    #[wasm_bindgen(js_name = setComparatorCallback)]
    pub fn set_comparator_callback(&self, callback: Option<Function>) {
        let provider = callback.map(|callback| -> ComparatorProvider {
            Rc::new(move |column: &str, descending: bool| -> Option<Comparator> {
                let compare = callback
                    .call2(
                        &JsValue::NULL,
                        &JsValue::from_str(column),
                        &JsValue::from_bool(descending),
                    )
                    .ok()?
                    .dyn_into::<Function>()
                    .ok()?;
                Some(Rc::new(move |a: &Row, b: &Row| {
                    compare
                        .call2(&JsValue::NULL, &to_js(a), &to_js(b))
                        .ok()
                        .and_then(|v| v.as_f64())
                        .and_then(|n| n.partial_cmp(&0.0))
                        .unwrap_or(Ordering::Equal)
                }))
            })
        });
        self.with(|g| g.set_comparator_provider(provider));
    }

    /// Install `(value, columnName, row) => string | null`.
    #[wasm_bindgen(js_name = setCellFormatter)]
    pub fn set_cell_formatter(&self, formatter: Option<Function>) {
        let formatter = formatter.map(|f| -> CellFormatter {
            Rc::new(move |value: Option<&Value>, column: &str, row: &Row| {
                let value = value.map_or(JsValue::UNDEFINED, to_js);
                f.call3(&JsValue::NULL, &value, &JsValue::from_str(column), &to_js(row))
                    .ok()?
                    .as_string()
            })
        });
        self.with(|g| g.set_cell_formatter(formatter));
    }

    /// Install `(label, columnName) => string`.
    #[wasm_bindgen(js_name = setHeaderFormatter)]
    pub fn set_header_formatter(&self, formatter: Option<Function>) {
        let formatter = formatter.map(|f| -> HeaderFormatter {
            Rc::new(move |label: &str, column: &str| {
                f.call2(&JsValue::NULL, &JsValue::from_str(label), &JsValue::from_str(column))
                    .ok()
                    .and_then(|v| v.as_string())
                    .unwrap_or_else(|| label.to_string())
            })
        });
        self.with(|g| g.set_header_formatter(formatter));
    }

    /// # Errors
    /// Returns an error if `columns` is not an array of column definitions.
    #[wasm_bindgen(js_name = setColumns)]
    pub fn set_columns(&self, columns: JsValue) -> Result<(), JsValue> {
        let defs: Vec<ColumnDef> = from_js(columns)?;
        self.with(|g| g.set_columns(&defs));
        Ok(())
    }

    /// # Errors
    /// Returns an error if `column` is not a column definition.
    #[wasm_bindgen(js_name = addColumn)]
    pub fn add_column(&self, column: JsValue, before: &JsValue) -> Result<bool, JsValue> {
        let def: ColumnDef = from_js(column)?;
        let before = column_ref(before);
        Ok(self.with(|g| g.add_column(&def, before)))
    }

    #[wasm_bindgen(js_name = removeColumn)]
    pub fn remove_column(&self, name: &str) -> bool {
        self.with(|g| g.remove_column(name))
    }

    /// Move `src` into `dest`'s slot; each is a name or a visible position.
    #[wasm_bindgen(js_name = moveColumn)]
    pub fn move_column(&self, src: &JsValue, dest: &JsValue) -> bool {
        match (column_ref(src), column_ref(dest)) {
            (Some(src), Some(dest)) => self.with(|g| g.move_column(src, dest)),
            _ => false,
        }
    }

    #[wasm_bindgen(js_name = setColumnVisible)]
    pub fn set_column_visible(&self, name: &str, visible: bool) -> bool {
        self.with(|g| g.set_column_visible(name, visible))
    }

    #[wasm_bindgen(js_name = isColumnVisible)]
    pub fn is_column_visible(&self, name: &str) -> bool {
        self.read(|g| g.is_column_visible(name))
    }

    /// # Errors
    /// Returns an error if `width` is neither a number nor a string.
    #[wasm_bindgen(js_name = setColumnWidth)]
    pub fn set_column_width(&self, name: &str, width: JsValue) -> Result<bool, JsValue> {
        let width: WidthSpec = from_js(width)?;
        Ok(self.with(|g| g.set_column_width(name, width)))
    }

    #[wasm_bindgen(js_name = getColumnWidth)]
    pub fn get_column_width(&self, name: &str) -> JsValue {
        self.read(|g| g.get_column_width(name))
            .map_or(JsValue::NULL, |w| to_js(&w))
    }

    #[wasm_bindgen(js_name = setColumnLabel)]
    pub fn set_column_label(&self, name: &str, label: Option<String>) -> bool {
        self.with(|g| g.set_column_label(name, label.as_deref()))
    }

    #[wasm_bindgen(js_name = getColumnConfig)]
    pub fn get_column_config(&self, name: &str) -> JsValue {
        self.read(|g| g.get_column_config(name))
            .map_or(JsValue::NULL, |c| to_js(&c))
    }

    #[wasm_bindgen(js_name = getColumnsConfig)]
    pub fn get_columns_config(&self) -> JsValue {
        to_js(&self.read(Grid::get_columns_config))
    }

    #[wasm_bindgen(js_name = setMinColumnWidth)]
    pub fn set_min_column_width(&self, width: f64) {
        self.with(|g| g.set_min_column_width(width));
    }

    #[wasm_bindgen(js_name = setSortableColumns)]
    pub fn set_sortable_columns(&self, count: u32) {
        self.with(|g| g.set_sortable_columns(count as usize));
    }

    #[wasm_bindgen(js_name = setMovableColumns)]
    pub fn set_movable_columns(&self, movable: bool) {
        self.with(|g| g.set_movable_columns(movable));
    }

    #[wasm_bindgen(js_name = setResizableColumns)]
    pub fn set_resizable_columns(&self, resizable: bool) {
        self.with(|g| g.set_resizable_columns(resizable));
    }

    #[wasm_bindgen(js_name = setAutoFillTableWidth)]
    pub fn set_auto_fill_table_width(&self, fill: bool) {
        self.with(|g| g.set_auto_fill_table_width(fill));
    }

    #[wasm_bindgen(js_name = setRelativeWidthGrowsToFillWidth)]
    pub fn set_relative_width_grows_to_fill_width(&self, grows: bool) {
        self.with(|g| g.set_relative_width_grows_to_fill_width(grows));
    }

    #[wasm_bindgen(js_name = setRelativeWidthShrinksToFillWidth)]
    pub fn set_relative_width_shrinks_to_fill_width(&self, shrinks: bool) {
        self.with(|g| g.set_relative_width_shrinks_to_fill_width(shrinks));
    }

    /// Name of the column whose resize handle is under header x-offset `x`.
    #[wasm_bindgen(js_name = resizeTarget)]
    pub fn resize_target(&self, x: f64) -> Option<String> {
        self.read(|g| g.resize_target(x))
    }

    #[allow(clippy::cast_possible_truncation)]
    #[wasm_bindgen(js_name = getRowCount)]
    pub fn get_row_count(&self) -> u32 {
        self.read(Grid::row_count) as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    #[wasm_bindgen(js_name = getFilteredRowCount)]
    pub fn get_filtered_row_count(&self) -> u32 {
        self.read(Grid::filtered_row_count) as u32
    }

    #[wasm_bindgen(js_name = getDataForRow)]
    pub fn get_data_for_row(&self, physical: u32) -> JsValue {
        self.read(|g| g.data_for_row(physical as usize).map(to_js))
            .unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = getDataForFilteredRow)]
    pub fn get_data_for_filtered_row(&self, display: u32) -> JsValue {
        self.read(|g| g.data_for_filtered_row(display as usize).map(to_js))
            .unwrap_or(JsValue::NULL)
    }

    /// Physical index of a row equal to `row`, or -1.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    #[wasm_bindgen(js_name = getIndexForRow)]
    pub fn get_index_for_row(&self, row: JsValue) -> i32 {
        let Ok(row) = from_js::<Row>(row) else {
            return -1;
        };
        self.read(|g| g.index_for_row(&row)).map_or(-1, |i| i as i32)
    }

    /// Display index of a row equal to `row`, or -1.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    #[wasm_bindgen(js_name = getIndexForFilteredRow)]
    pub fn get_index_for_filtered_row(&self, row: JsValue) -> i32 {
        let Ok(row) = from_js::<Row>(row) else {
            return -1;
        };
        self.read(|g| g.index_for_filtered_row(&row)).map_or(-1, |i| i as i32)
    }

    #[wasm_bindgen(js_name = getRowYPos)]
    pub fn get_row_y_pos(&self, display: u32) -> Option<f64> {
        self.read(|g| g.row_y_pos(display as usize))
    }

    #[wasm_bindgen(js_name = cellContent)]
    pub fn cell_content(&self, physical: u32, column: &str) -> Option<String> {
        self.read(|g| g.cell_content(physical as usize, column))
    }
}

impl Drop for DataGrid {
    fn drop(&mut self) {
        self.inner.cancel_tick();
    }
}
