//! datagrid - virtualized data grid engine
//!
//! The rendering-independent core of a data grid:
//! - Row store with in-place multi-key sorting and filtered views
//! - Column model with order/visibility bookkeeping
//! - Column width allocation (auto, absolute and relative widths)
//! - Virtual row windowing with incremental reconciliation
//! - An event bus reporting every structural change
//!
//! Drawing is delegated to a [`Presenter`]. On wasm32 the `DataGrid`
//! facade drives the engine from JavaScript.
//!
//! # Usage (Rust)
//!
//! ```
//! use datagrid::{Grid, GridOptions, HeadlessPresenter};
//!
//! let options = GridOptions::from_json(
//!     r#"{"columns": [{"name": "id"}, {"name": "name"}], "height": 240}"#,
//! )
//! .unwrap();
//! let mut grid = Grid::new(options, HeadlessPresenter::default());
//! grid.set_rows(vec![serde_json::json!({"id": 1, "name": "Ada"})], false);
//! assert_eq!(grid.presenter().rendered_indices(), vec![0]);
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { DataGrid } from 'datagrid';
//! await init();
//! const grid = new DataGrid(options, presenter);
//! grid.resize(800, 600);
//! ```

// Data and models
pub mod columns;
pub mod error;
pub mod filter;
pub mod rows;
pub mod sort;
pub mod types;

// Layout, rendering and control
pub mod events;
pub mod format;
pub mod grid;
pub mod layout;
pub mod render;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

use wasm_bindgen::prelude::*;

pub use error::{GridError, Result};
pub use events::{EventBus, EventKind, GridEvent, ListenerId};
pub use grid::{FeedId, Grid, RowBatch};
pub use render::{HeadlessPresenter, Presenter};
#[cfg(target_arch = "wasm32")]
pub use wasm::DataGrid;

pub use types::*;

/// Decode grid options from JSON and return them normalized, as JSON.
///
/// # Errors
/// Returns an error if the options don't decode or name a column twice.
#[wasm_bindgen]
pub fn normalize_options(json: &str) -> std::result::Result<String, JsValue> {
    let options = GridOptions::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&options)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
