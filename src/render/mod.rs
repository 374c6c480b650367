//! Rendering contract and the headless presenter.
//!
//! This module provides:
//! - The `Presenter` trait the grid drives
//! - Render-instruction records (rows, cells, header cells)
//! - A recording presenter for tests, benches and the CLI

pub mod headless;
pub mod presenter;

pub use headless::{HeadlessPresenter, PresenterCall};
pub use presenter::{HeaderCell, Placement, Presenter, RenderBatch, RenderCell, RenderRow};
