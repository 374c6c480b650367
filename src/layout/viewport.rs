//! Viewport state management for vertical scrolling and resizing.

/// Viewport state - represents the visible area of the grid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Vertical scroll position in content coordinates
    pub scroll_y: f64,
    /// Viewport width in pixels
    pub width: f64,
    /// Viewport height in pixels (body only, header excluded)
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

/// Which dimensions a [`Viewport::resize`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeDelta {
    pub width: bool,
    pub height: bool,
}

impl Viewport {
    /// Create an unsized viewport
    pub fn new() -> Self {
        Self {
            scroll_y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    /// True once the host has given the viewport a measurable height
    pub fn is_sized(&self) -> bool {
        self.height > 0.0
    }

    /// Largest scroll offset that still shows content.
    pub fn max_scroll(&self, content_height: f64) -> f64 {
        (content_height - self.height).max(0.0)
    }

    /// Clamp scroll position to valid range.
    pub fn clamp_scroll(&mut self, content_height: f64) {
        let max_y = self.max_scroll(content_height);
        self.scroll_y = if self.scroll_y.is_finite() {
            self.scroll_y.clamp(0.0, max_y)
        } else {
            0.0
        };
    }

    /// Scroll by a delta amount
    pub fn scroll_by(&mut self, delta_y: f64, content_height: f64) {
        self.scroll_y += delta_y;
        self.clamp_scroll(content_height);
    }

    /// Set absolute scroll position
    pub fn set_scroll(&mut self, y: f64, content_height: f64) {
        self.scroll_y = y;
        self.clamp_scroll(content_height);
    }

    /// Resize the viewport. Negative and non-finite sizes become 0.
    pub fn resize(&mut self, width: f64, height: f64) -> ResizeDelta {
        let clean = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let (width, height) = (clean(width), clean(height));
        let delta = ResizeDelta {
            width: (width - self.width).abs() > f64::EPSILON,
            height: (height - self.height).abs() > f64::EPSILON,
        };
        self.width = width;
        self.height = height;
        delta
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

    #[test]
    fn test_clamp_scroll() {
        let mut vp = Viewport::new();
        vp.resize(300.0, 200.0);
        vp.set_scroll(5000.0, 1000.0);
        assert_eq!(vp.scroll_y, 800.0);
        vp.scroll_by(-900.0, 1000.0);
        assert_eq!(vp.scroll_y, 0.0);
    }

    #[test]
    fn test_content_shorter_than_viewport() {
        let mut vp = Viewport::new();
        vp.resize(300.0, 200.0);
        vp.set_scroll(50.0, 100.0);
        assert_eq!(vp.scroll_y, 0.0);
    }

    #[test]
    fn test_resize_reports_changes() {
        let mut vp = Viewport::new();
        assert!(!vp.is_sized());
        let delta = vp.resize(300.0, 200.0);
        assert!(delta.width && delta.height);
        let delta = vp.resize(300.0, 250.0);
        assert!(!delta.width && delta.height);
        assert!(vp.is_sized());
    }
}
