//! Virtual row windowing.
//!
//! Only a band of rows around the viewport (plus a buffer above and below)
//! is kept rendered. When the viewport moves, the band is reconciled
//! incrementally: rows that left the band are removed from the head or
//! tail, and missing rows are prepended or appended. The band is never
//! rebuilt wholesale on a scroll.

use serde::Serialize;

/// Row heights. The first and last rows may differ from the rest because of
/// collapsed borders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub first: f64,
    pub middle: f64,
    pub last: f64,
}

impl RowMetrics {
    /// Heights are clamped: `middle` to at least 1, the others to at least 0.
    pub fn new(first: f64, middle: f64, last: f64) -> Self {
        let clean = |v: f64, min: f64| if v.is_finite() { v.max(min) } else { min };
        Self {
            first: clean(first, 0.0),
            middle: clean(middle, 1.0),
            last: clean(last, 0.0),
        }
    }

    pub fn uniform(height: f64) -> Self {
        Self::new(height, height, height)
    }
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self::uniform(24.0)
    }
}

/// Inclusive range of display indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowRange {
    pub first: usize,
    pub last: usize,
}

impl RowRange {
    /// `None` when `first > last`.
    pub fn new(first: usize, last: usize) -> Option<Self> {
        (first <= last).then_some(Self { first, last })
    }

    /// Number of rows in the range.
    pub fn count(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }

    fn intersect(&self, other: &RowRange) -> Option<RowRange> {
        RowRange::new(self.first.max(other.first), self.last.min(other.last))
    }
}

/// Compute the band of display indices to keep rendered.
///
/// `None` when there are no rows or the band is empty.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn visible_band(
    scroll_offset: f64,
    viewport_height: f64,
    metrics: &RowMetrics,
    buffer_rows: usize,
    row_count: usize,
) -> Option<RowRange> {
    if row_count == 0 {
        return None;
    }
    let buffer = buffer_rows as f64;
    let top = scroll_offset - metrics.first;

    let first = (top / metrics.middle).floor() + 1.0 - buffer;
    let last = ((top + viewport_height.max(0.0)) / metrics.middle).ceil() + buffer;
    if !first.is_finite() || !last.is_finite() || last < 0.0 {
        return None;
    }

    let max_index = row_count - 1;
    let first = if first <= 0.0 { 0 } else { first as usize };
    let last = (last as usize).min(max_index);
    RowRange::new(first, last)
}

/// Total scrollable height for `row_count` rows. Never below 1.
#[allow(clippy::cast_precision_loss)]
pub fn scroll_height(metrics: &RowMetrics, row_count: usize) -> f64 {
    let mut height = metrics.middle * row_count as f64;
    if row_count > 0 {
        height += (metrics.first - metrics.middle) + (metrics.last - metrics.middle);
    }
    height.max(1.0)
}

/// Top offset of display row `index`.
#[allow(clippy::cast_precision_loss)]
pub fn row_offset(index: usize, metrics: &RowMetrics) -> f64 {
    if index == 0 {
        0.0
    } else {
        metrics.first + (index - 1) as f64 * metrics.middle
    }
}

/// One incremental step that moves the rendered set to a new band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOp {
    /// Drop one rendered row
    RemoveRow(usize),
    /// Render rows ahead of the current head
    Prepend(RowRange),
    /// Render rows after the current tail
    Append(RowRange),
}

/// Steps that turn the rendered range `old` into `new`.
///
/// Head rows are removed oldest-first and tail rows newest-first, then the
/// missing prefix is prepended and the missing suffix appended. Rows in
/// both ranges are left alone.
pub fn reconcile(old: Option<RowRange>, new: Option<RowRange>) -> Vec<WindowOp> {
    let mut ops = Vec::new();
    let Some(old) = old else {
        if let Some(new) = new {
            ops.push(WindowOp::Append(new));
        }
        return ops;
    };
    let Some(new) = new else {
        ops.extend(old.iter().map(WindowOp::RemoveRow));
        return ops;
    };

    if new.first > old.first {
        let end = old.last.min(new.first - 1);
        ops.extend((old.first..=end).map(WindowOp::RemoveRow));
    }
    if new.last < old.last {
        let start = old.first.max(new.last + 1);
        ops.extend((start..=old.last).rev().map(WindowOp::RemoveRow));
    }

    match old.intersect(&new) {
        None => ops.push(WindowOp::Append(new)),
        Some(kept) => {
            if new.first < kept.first {
                if let Some(prefix) = RowRange::new(new.first, kept.first - 1) {
                    ops.push(WindowOp::Prepend(prefix));
                }
            }
            if new.last > kept.last {
                if let Some(suffix) = RowRange::new(kept.last + 1, new.last) {
                    ops.push(WindowOp::Append(suffix));
                }
            }
        }
    }
    ops
}

/// Lifecycle of the rendered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    /// No measurable viewport yet
    #[default]
    Unmounted,
    /// Every row rendered once
    FullRender,
    /// Only the band near the viewport is rendered
    Windowed,
}

/// Windowing state owned by the grid controller.
#[derive(Debug, Clone, Default)]
pub struct VirtualWindow {
    pub state: WindowState,
    pub buffer_rows: usize,
    /// Measured once per skeleton build
    pub metrics: Option<RowMetrics>,
    rendered: Option<RowRange>,
}

impl VirtualWindow {
    pub fn new(buffer_rows: usize) -> Self {
        Self {
            buffer_rows,
            ..Self::default()
        }
    }

    /// Enter the mode chosen at construction once the viewport has a height.
    pub fn mount(&mut self, virtual_table: bool) {
        self.state = if virtual_table {
            WindowState::Windowed
        } else {
            WindowState::FullRender
        };
    }

    pub fn unmount(&mut self) {
        self.state = WindowState::Unmounted;
        self.rendered = None;
        self.metrics = None;
    }

    pub fn rendered(&self) -> Option<RowRange> {
        self.rendered
    }

    /// Forget the rendered range (the caller destroyed every row).
    pub fn clear(&mut self) {
        self.rendered = None;
    }

    /// Record a range rendered outside reconciliation (full render).
    pub fn set_rendered(&mut self, range: Option<RowRange>) {
        self.rendered = range;
    }

    /// Band for the given viewport, using the measured metrics.
    pub fn band(&self, scroll_offset: f64, viewport_height: f64, row_count: usize) -> Option<RowRange> {
        let metrics = self.metrics.unwrap_or_default();
        visible_band(
            scroll_offset,
            viewport_height,
            &metrics,
            self.buffer_rows,
            row_count,
        )
    }

    /// Move the rendered range to the band for this viewport and return the
    /// steps to get there.
    pub fn advance(&mut self, scroll_offset: f64, viewport_height: f64, row_count: usize) -> Vec<WindowOp> {
        let band = self.band(scroll_offset, viewport_height, row_count);
        let ops = reconcile(self.rendered, band);
        self.rendered = band;
        ops
    }
}

/// Coalesces render requests made while the host element has no layout box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeferredRender {
    pending: bool,
}

impl DeferredRender {
    /// Returns `true` if this request needs a new tick scheduled; `false`
    /// when one is already pending.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// Consume the pending request, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn metrics() -> RowMetrics {
        RowMetrics::new(30.0, 24.0, 24.0)
    }

    #[test_case(0.0, 0, 12 ; "top")]
    #[test_case(480.0, 16, 32 ; "mid scroll")]
    #[test_case(23_700.0, 984, 999 ; "bottom clamps to last row")]
    fn test_band(scroll: f64, first: usize, last: usize) {
        let band = visible_band(scroll, 240.0, &metrics(), 3, 1000).unwrap();
        assert_eq!(band, RowRange { first, last });
    }

    #[test]
    fn test_band_empty_store() {
        assert_eq!(visible_band(0.0, 240.0, &metrics(), 3, 0), None);
    }

    #[test]
    fn test_scroll_height() {
        assert_eq!(scroll_height(&metrics(), 1000), 24_006.0);
        assert_eq!(scroll_height(&metrics(), 0), 1.0);
    }

    #[test]
    fn test_row_offset() {
        assert_eq!(row_offset(0, &metrics()), 0.0);
        assert_eq!(row_offset(1, &metrics()), 30.0);
        assert_eq!(row_offset(3, &metrics()), 78.0);
    }

    #[test]
    fn test_reconcile_small_scroll_down() {
        let old = RowRange::new(10, 20);
        let new = RowRange::new(12, 22);
        assert_eq!(
            reconcile(old, new),
            vec![
                WindowOp::RemoveRow(10),
                WindowOp::RemoveRow(11),
                WindowOp::Append(RowRange { first: 21, last: 22 }),
            ]
        );
    }

    #[test]
    fn test_reconcile_small_scroll_up() {
        let old = RowRange::new(10, 20);
        let new = RowRange::new(8, 18);
        assert_eq!(
            reconcile(old, new),
            vec![
                WindowOp::RemoveRow(20),
                WindowOp::RemoveRow(19),
                WindowOp::Prepend(RowRange { first: 8, last: 9 }),
            ]
        );
    }

    #[test]
    fn test_reconcile_shrink_both_ends() {
        let ops = reconcile(RowRange::new(0, 10), RowRange::new(2, 8));
        assert_eq!(
            ops,
            vec![
                WindowOp::RemoveRow(0),
                WindowOp::RemoveRow(1),
                WindowOp::RemoveRow(10),
                WindowOp::RemoveRow(9),
            ]
        );
    }

    #[test]
    fn test_reconcile_jump() {
        let ops = reconcile(RowRange::new(0, 2), RowRange::new(50, 52));
        assert_eq!(
            ops,
            vec![
                WindowOp::RemoveRow(0),
                WindowOp::RemoveRow(1),
                WindowOp::RemoveRow(2),
                WindowOp::Append(RowRange { first: 50, last: 52 }),
            ]
        );
    }

    #[test]
    fn test_deferred_render_coalesces() {
        let mut deferred = DeferredRender::default();
        assert!(deferred.request());
        assert!(!deferred.request());
        assert!(deferred.take());
        assert!(!deferred.take());
        assert!(deferred.request());
        deferred.cancel();
        assert!(!deferred.is_pending());
    }

    #[test]
    fn test_window_advance_tracks_rendered() {
        let mut window = VirtualWindow::new(3);
        window.metrics = Some(metrics());
        window.mount(true);
        let ops = window.advance(0.0, 240.0, 1000);
        assert_eq!(ops, vec![WindowOp::Append(RowRange { first: 0, last: 12 })]);
        window.advance(480.0, 240.0, 1000);
        assert_eq!(window.rendered(), RowRange::new(16, 32));
    }
}
