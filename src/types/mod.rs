//! Shared data types for the grid engine.
//!
//! These describe rows, columns, sort entries and options. They are plain
//! data; the stateful models live in [`crate::rows`], [`crate::columns`],
//! [`crate::sort`] and [`crate::filter`].

mod column;
mod config;
mod options;
mod row;
mod sort;

pub use column::*;
pub use config::*;
pub use options::*;
pub use row::*;
pub use sort::*;
