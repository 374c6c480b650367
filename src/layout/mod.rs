//! Layout engine for column widths, column geometry and row windowing.
//!
//! This module handles:
//! - Allocating pixel widths to AUTO/ABSOLUTE/RELATIVE columns
//! - Pre-computing column positions for hit testing
//! - Managing viewport state (scroll position, size)
//! - Selecting and reconciling the band of rendered rows

mod column_layout;
mod viewport;
pub mod widths;
pub mod window;

pub use column_layout::ColumnLayout;
pub use viewport::{ResizeDelta, Viewport};
pub use widths::{
    allocate_column_widths, ColumnAllocation, WidthPolicy, WidthRequest, AUTO_COLUMN_PADDING,
};
pub use window::{
    reconcile, row_offset, scroll_height, visible_band, DeferredRender, RowMetrics, RowRange,
    VirtualWindow, WindowOp, WindowState,
};
