//! Column width allocation.
//!
//! Resolves AUTO (label-fit), ABSOLUTE (pixels) and RELATIVE (fraction of
//! the space left after fixed columns) widths into pixel widths for the
//! visible columns, honoring the minimum width and the fill policies.
//!
//! The allocator is a pure function of its inputs. Fractions adjusted along
//! the way (normalization, minimum raising, auto-fill scaling) are never fed
//! back into the column model, so re-running with the same inputs yields the
//! same widths.

use crate::types::{ColumnWidthMode, GridOptions};

/// Pixels added to a measured label for AUTO columns.
pub const AUTO_COLUMN_PADDING: f64 = 20.0;

const EPSILON: f64 = 1e-9;

/// Policy flags that shape allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthPolicy {
    pub min_column_width: f64,
    /// Scale RELATIVE fractions up when they sum below 1
    pub relative_grows_to_fill: bool,
    /// Scale RELATIVE fractions down when they sum above 1
    pub relative_shrinks_to_fill: bool,
    /// Reclassify AUTO columns as RELATIVE after measuring
    pub convert_auto_to_relative: bool,
    /// Stretch resizable columns over any unclaimed space
    pub auto_fill: bool,
}

impl Default for WidthPolicy {
    fn default() -> Self {
        Self::from(&GridOptions::default())
    }
}

impl From<&GridOptions> for WidthPolicy {
    fn from(options: &GridOptions) -> Self {
        Self {
            min_column_width: options.min_column_width.max(0.0),
            relative_grows_to_fill: options.relative_width_grows_to_fill_width,
            relative_shrinks_to_fill: options.relative_width_shrinks_to_fill_width,
            convert_auto_to_relative: options.convert_column_widths_to_relative,
            auto_fill: options.auto_fill_table_width,
        }
    }
}

/// One visible column, in display order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthRequest<'a> {
    pub label: &'a str,
    pub mode: ColumnWidthMode,
    /// Pixels (ABSOLUTE) or fraction (RELATIVE); ignored for AUTO
    pub width: f64,
    pub ignore_min: bool,
    pub resizable: bool,
    /// Sort-arrow allowance added to ABSOLUTE and AUTO columns
    pub arrow_width: f64,
    /// Width from the previous allocation, for change detection
    pub previous: f64,
}

impl<'a> WidthRequest<'a> {
    pub fn new(label: &'a str, mode: ColumnWidthMode, width: f64) -> Self {
        Self {
            label,
            mode,
            width,
            ignore_min: false,
            resizable: true,
            arrow_width: 0.0,
            previous: 0.0,
        }
    }
}

/// Allocation result, aligned with the request slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnAllocation {
    pub widths: Vec<f64>,
    /// On-screen width of the last column when a vertical scrollbar is shown
    pub last_column_width: Option<f64>,
    /// Positions whose width differs from `previous`
    pub changed: Vec<usize>,
    /// AUTO columns reclassified as RELATIVE, with their new fraction
    pub converted: Vec<(usize, f64)>,
}

impl ColumnAllocation {
    pub fn total(&self) -> f64 {
        self.widths.iter().sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    relative: bool,
    fraction: f64,
    px: f64,
    floor: f64,
    resizable: bool,
    fixed_absolute: bool,
}

/// Allocate pixel widths for `columns` within `available` pixels.
///
/// `measure` returns the rendered width of a header label.
pub fn allocate_column_widths<F>(
    available: f64,
    columns: &[WidthRequest<'_>],
    policy: &WidthPolicy,
    scrollbar_width: f64,
    mut measure: F,
) -> ColumnAllocation
where
    F: FnMut(&str) -> f64,
{
    let available = if available.is_finite() { available.max(0.0) } else { 0.0 };
    let min_width = policy.min_column_width.max(0.0);

    let mut size_left = available;
    let mut fixed_total = 0.0;
    let mut slots: Vec<Slot> = Vec::with_capacity(columns.len());

    // Fixed-size columns claim their space first
    for request in columns {
        let floor = if request.ignore_min { 0.0 } else { min_width };
        let mut slot = Slot {
            relative: false,
            fraction: 0.0,
            px: 0.0,
            floor,
            resizable: request.resizable,
            fixed_absolute: request.mode == ColumnWidthMode::Absolute && !request.resizable,
        };
        match request.mode {
            ColumnWidthMode::Absolute | ColumnWidthMode::Auto => {
                let base = if request.mode == ColumnWidthMode::Absolute {
                    request.width.max(0.0)
                } else {
                    measure(request.label).max(0.0) + AUTO_COLUMN_PADDING
                };
                slot.px = (base + request.arrow_width.max(0.0)).max(floor);
                size_left -= slot.px;
                fixed_total += slot.px;
            }
            ColumnWidthMode::Relative => {
                slot.relative = true;
                slot.fraction = request.width.max(0.0);
            }
        }
        slots.push(slot);
    }

    let mut converted = Vec::new();
    if policy.convert_auto_to_relative && fixed_total > 0.0 {
        for (i, (slot, request)) in slots.iter_mut().zip(columns).enumerate() {
            if request.mode == ColumnWidthMode::Auto {
                size_left += slot.px;
                slot.relative = true;
                slot.fraction = slot.px / fixed_total;
                converted.push((i, slot.fraction));
            }
        }
    }

    normalize_fractions(&mut slots, policy);

    let mut size_for_relative = size_left.max(0.0);
    if size_for_relative <= 0.0 {
        size_for_relative = available;
    }

    if size_for_relative > 0.0 && min_width > 0.0 {
        raise_to_min_fraction(&mut slots, min_width / size_for_relative);
    }

    let mut filled = false;
    if policy.auto_fill && size_left > 0.0 {
        filled = auto_fill(&mut slots, available, size_left, size_for_relative);
    }

    let fraction_total: f64 = slots.iter().filter(|s| s.relative).map(|s| s.fraction).sum();
    let has_relative = slots.iter().any(|s| s.relative);

    for slot in slots.iter_mut().filter(|s| s.relative) {
        let mut px = (size_for_relative * slot.fraction).round();
        if slot.floor > 0.0 && slot.fraction > 0.0 {
            px = px.max(slot.floor.ceil());
        }
        slot.px = px;
    }

    if filled {
        let total: f64 = slots.iter().map(|s| s.px).sum();
        distribute_residue(&mut slots, available - total, |s| s.resizable || s.relative);
    } else if has_relative && (fraction_total - 1.0).abs() < 1e-6 {
        let total: f64 = slots.iter().filter(|s| s.relative).map(|s| s.px).sum();
        distribute_residue(&mut slots, size_for_relative - total, |s| s.relative);
    }

    let widths: Vec<f64> = slots.iter().map(|s| s.px).collect();
    let changed = widths
        .iter()
        .zip(columns)
        .enumerate()
        .filter(|(_, (w, r))| (**w - r.previous).abs() > EPSILON)
        .map(|(i, _)| i)
        .collect();
    let last_column_width = if scrollbar_width > 0.0 {
        widths.last().map(|w| w - scrollbar_width)
    } else {
        None
    };

    ColumnAllocation {
        widths,
        last_column_width,
        changed,
        converted,
    }
}

fn normalize_fractions(slots: &mut [Slot], policy: &WidthPolicy) {
    let total: f64 = slots.iter().filter(|s| s.relative).map(|s| s.fraction).sum();
    if total <= 0.0 {
        return;
    }
    let rescale = (total < 1.0 && policy.relative_grows_to_fill)
        || (total > 1.0 && policy.relative_shrinks_to_fill);
    if rescale {
        for slot in slots.iter_mut().filter(|s| s.relative) {
            slot.fraction /= total;
        }
    }
}

/// Raise fractions below `min_fraction`, then take the shortfall back from
/// columns above it without pushing any below.
fn raise_to_min_fraction(slots: &mut [Slot], min_fraction: f64) {
    let mut extra = 0.0;
    for slot in slots.iter_mut().filter(|s| s.relative && s.floor > 0.0) {
        if slot.fraction < min_fraction {
            extra += min_fraction - slot.fraction;
            slot.fraction = min_fraction;
        }
    }
    for slot in slots.iter_mut().filter(|s| s.relative && s.floor > 0.0) {
        if extra <= 0.0 {
            break;
        }
        if slot.fraction > min_fraction {
            let delta = extra.min(slot.fraction - min_fraction);
            slot.fraction -= delta;
            extra -= delta;
        }
    }
}

/// Scale resizable columns so they cover the unclaimed space. Returns
/// `false` when nothing was scaled.
fn auto_fill(slots: &mut [Slot], available: f64, size_left: f64, size_for_relative: f64) -> bool {
    let non_resizable: f64 = slots.iter().filter(|s| s.fixed_absolute).map(|s| s.px).sum();
    let relative_px: f64 = slots
        .iter()
        .filter(|s| s.relative)
        .map(|s| (size_for_relative * s.fraction).round())
        .sum();
    let to_fill = size_left - relative_px;
    if to_fill <= 0.0 {
        return false;
    }

    let denominator = available - to_fill - non_resizable;
    if denominator <= 0.0 {
        return false;
    }
    let scale = (available - non_resizable) / denominator;
    if !scale.is_finite() || scale <= 0.0 {
        return false;
    }

    for slot in slots.iter_mut().filter(|s| !s.fixed_absolute) {
        if slot.relative {
            slot.fraction *= scale;
        } else {
            slot.px = (slot.px * scale).round();
        }
    }
    true
}

/// Spread a rounding residue over eligible columns, one pixel at a time
/// starting from the last, never going below a column's floor. A fractional
/// remainder lands on the last eligible column.
fn distribute_residue<E>(slots: &mut [Slot], residue: f64, eligible: E)
where
    E: Fn(&Slot) -> bool,
{
    if residue.abs() < EPSILON {
        return;
    }
    let mut whole = residue.trunc();
    let fraction = residue - whole;

    while whole.abs() >= 1.0 {
        let step = whole.signum();
        let mut moved = false;
        for slot in slots.iter_mut().rev().filter(|s| eligible(&**s)) {
            if whole.abs() < 1.0 {
                break;
            }
            if step < 0.0 && slot.px - 1.0 < slot.floor.ceil() {
                continue;
            }
            slot.px += step;
            whole -= step;
            moved = true;
        }
        if !moved {
            break;
        }
    }

    if fraction.abs() >= EPSILON {
        if let Some(slot) = slots.iter_mut().rev().find(|s| eligible(&**s)) {
            if slot.px + fraction >= slot.floor || fraction > 0.0 {
                slot.px += fraction;
            }
        }
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

    fn label_px(label: &str) -> f64 {
        8.0 * label.chars().count() as f64
    }

    fn policy() -> WidthPolicy {
        WidthPolicy {
            min_column_width: 35.0,
            ..WidthPolicy::default()
        }
    }

    #[test]
    fn test_absolute_and_auto() {
        let cols = [
            WidthRequest::new("id", ColumnWidthMode::Absolute, 80.0),
            WidthRequest::new("name", ColumnWidthMode::Auto, 0.0),
            WidthRequest::new("x", ColumnWidthMode::Absolute, 10.0),
        ];
        let alloc = allocate_column_widths(1000.0, &cols, &policy(), 0.0, label_px);
        assert_eq!(alloc.widths, vec![80.0, 52.0, 35.0]);
        assert_eq!(alloc.changed, vec![0, 1, 2]);
        assert_eq!(alloc.last_column_width, None);
    }

    #[test]
    fn test_relative_grows_to_fill() {
        let cols = [
            WidthRequest::new("a", ColumnWidthMode::Absolute, 100.0),
            WidthRequest::new("b", ColumnWidthMode::Relative, 0.2),
            WidthRequest::new("c", ColumnWidthMode::Relative, 0.2),
        ];
        let alloc = allocate_column_widths(501.0, &cols, &policy(), 0.0, label_px);
        assert_eq!(alloc.widths[0], 100.0);
        assert_eq!(alloc.widths[1] + alloc.widths[2], 401.0);
        assert!((alloc.widths[1] - alloc.widths[2]).abs() <= 1.0);
    }

    #[test]
    fn test_relative_growth_disabled() {
        let mut p = policy();
        p.relative_grows_to_fill = false;
        let cols = [
            WidthRequest::new("a", ColumnWidthMode::Absolute, 100.0),
            WidthRequest::new("b", ColumnWidthMode::Relative, 0.5),
        ];
        let alloc = allocate_column_widths(500.0, &cols, &p, 0.0, label_px);
        assert_eq!(alloc.widths, vec![100.0, 200.0]);
    }

    #[test]
    fn test_shrink_only_when_enabled() {
        let cols = [
            WidthRequest::new("a", ColumnWidthMode::Relative, 0.8),
            WidthRequest::new("b", ColumnWidthMode::Relative, 0.8),
        ];
        let alloc = allocate_column_widths(400.0, &cols, &policy(), 0.0, label_px);
        assert_eq!(alloc.widths, vec![320.0, 320.0]);

        let mut p = policy();
        p.relative_shrinks_to_fill = true;
        let alloc = allocate_column_widths(400.0, &cols, &p, 0.0, label_px);
        assert_eq!(alloc.widths, vec![200.0, 200.0]);
    }

    #[test]
    fn test_min_fraction_takes_from_wide_columns() {
        let cols = [
            WidthRequest::new("a", ColumnWidthMode::Relative, 0.02),
            WidthRequest::new("b", ColumnWidthMode::Relative, 0.98),
        ];
        let alloc = allocate_column_widths(500.0, &cols, &policy(), 0.0, label_px);
        assert_eq!(alloc.widths, vec![35.0, 465.0]);
    }

    #[test]
    fn test_ignore_min_exempts_column() {
        let mut narrow = WidthRequest::new("a", ColumnWidthMode::Relative, 0.02);
        narrow.ignore_min = true;
        let cols = [narrow, WidthRequest::new("b", ColumnWidthMode::Relative, 0.98)];
        let alloc = allocate_column_widths(500.0, &cols, &policy(), 0.0, label_px);
        assert_eq!(alloc.widths, vec![10.0, 490.0]);
    }

    #[test]
    fn test_convert_auto_to_relative() {
        let mut p = policy();
        p.convert_auto_to_relative = true;
        let cols = [
            WidthRequest::new("abcdefghij", ColumnWidthMode::Auto, 0.0),
            WidthRequest::new("abcdefghij", ColumnWidthMode::Auto, 0.0),
        ];
        let alloc = allocate_column_widths(600.0, &cols, &p, 0.0, label_px);
        assert_eq!(alloc.widths, vec![300.0, 300.0]);
        assert_eq!(alloc.converted, vec![(0, 0.5), (1, 0.5)]);
    }

    #[test]
    fn test_auto_fill_covers_available() {
        let mut p = policy();
        p.auto_fill = true;
        let mut fixed = WidthRequest::new("fixed", ColumnWidthMode::Absolute, 50.0);
        fixed.resizable = false;
        let cols = [
            fixed,
            WidthRequest::new("a", ColumnWidthMode::Absolute, 100.0),
            WidthRequest::new("b", ColumnWidthMode::Absolute, 150.0),
        ];
        let alloc = allocate_column_widths(777.0, &cols, &p, 0.0, label_px);
        assert_eq!(alloc.widths[0], 50.0);
        assert_eq!(alloc.total(), 777.0);
        assert!(alloc.widths[2] > alloc.widths[1]);
    }

    #[test]
    fn test_scrollbar_adjusts_last_column_only() {
        let cols = [
            WidthRequest::new("a", ColumnWidthMode::Absolute, 100.0),
            WidthRequest::new("b", ColumnWidthMode::Relative, 1.0),
        ];
        let alloc = allocate_column_widths(400.0, &cols, &policy(), 17.0, label_px);
        assert_eq!(alloc.widths, vec![100.0, 300.0]);
        assert_eq!(alloc.last_column_width, Some(283.0));
    }

    #[test]
    fn test_arrow_width_widens_fixed_columns() {
        let mut a = WidthRequest::new("a", ColumnWidthMode::Absolute, 100.0);
        a.arrow_width = 12.0;
        let alloc = allocate_column_widths(400.0, &[a], &policy(), 0.0, label_px);
        assert_eq!(alloc.widths, vec![112.0]);
    }

    #[test_case(300.0 ; "narrow")]
    #[test_case(997.0 ; "odd width")]
    #[test_case(1333.0 ; "wide")]
    fn test_idempotent(available: f64) {
        let mut cols = vec![
            WidthRequest::new("a", ColumnWidthMode::Relative, 0.33),
            WidthRequest::new("b", ColumnWidthMode::Relative, 0.33),
            WidthRequest::new("c", ColumnWidthMode::Relative, 0.34),
            WidthRequest::new("id", ColumnWidthMode::Auto, 0.0),
        ];
        let first = allocate_column_widths(available, &cols, &policy(), 0.0, label_px);
        for (req, w) in cols.iter_mut().zip(&first.widths) {
            req.previous = *w;
        }
        let second = allocate_column_widths(available, &cols, &policy(), 0.0, label_px);
        assert_eq!(first.widths, second.widths);
        assert!(second.changed.is_empty());
        assert_eq!(first.total(), available);
    }
}
