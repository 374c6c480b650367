use serde::{Deserialize, Serialize};

use super::row::{parse_path, DataPath, PathSpec};

/// How a column's width is resolved.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColumnWidthMode {
    /// Fit to the measured header label
    #[default]
    Auto,
    /// Fixed pixels
    Absolute,
    /// Fraction of the width left over after fixed columns
    Relative,
}

/// A width as written in a column definition or exported configuration.
///
/// Numbers are pixels (or a fraction when below 1); strings may be numeric,
/// a percentage such as `"25%"`, or `"auto"`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum WidthSpec {
    Pixels(f64),
    Text(String),
}

impl WidthSpec {
    /// Serialized form of a resolved width: `"auto"`, `"NN%"` or pixels.
    pub fn from_mode(mode: ColumnWidthMode, width: f64) -> Self {
        match mode {
            ColumnWidthMode::Auto => WidthSpec::Text("auto".to_string()),
            ColumnWidthMode::Relative => WidthSpec::Text(format!("{}%", width * 100.0)),
            ColumnWidthMode::Absolute => WidthSpec::Pixels(width),
        }
    }
}

impl From<f64> for WidthSpec {
    fn from(px: f64) -> Self {
        WidthSpec::Pixels(px)
    }
}

impl From<&str> for WidthSpec {
    fn from(s: &str) -> Self {
        WidthSpec::Text(s.to_string())
    }
}

/// Parsed width: the mode plus pixels (absolute) or a fraction (relative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedWidth {
    pub mode: ColumnWidthMode,
    pub width: f64,
}

impl ParsedWidth {
    /// Parse a declared width.
    ///
    /// Zero, negative and unparsable values fall back to AUTO. Absolute
    /// widths are raised to `min_width`.
    pub fn parse(spec: Option<&WidthSpec>, min_width: f64) -> Self {
        let (size, percent) = match spec {
            None => return Self::auto(),
            Some(WidthSpec::Pixels(px)) => (*px, false),
            Some(WidthSpec::Text(text)) => {
                let text = text.trim();
                match text.strip_suffix('%') {
                    Some(number) => (leading_number(number.trim()), true),
                    None => (leading_number(text), false),
                }
            }
        };

        let size = if size.is_finite() { size.max(0.0) } else { 0.0 };
        if size <= 0.0 {
            return Self::auto();
        }

        if percent {
            Self {
                mode: ColumnWidthMode::Relative,
                width: size / 100.0,
            }
        } else if size < 1.0 {
            Self {
                mode: ColumnWidthMode::Relative,
                width: size,
            }
        } else {
            Self {
                mode: ColumnWidthMode::Absolute,
                width: size.max(min_width),
            }
        }
    }

    pub fn auto() -> Self {
        Self {
            mode: ColumnWidthMode::Auto,
            width: 0.0,
        }
    }
}

/// Parse the longest numeric prefix (`"120px"` → 120). Zero when none.
fn leading_number(text: &str) -> f64 {
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0)))
        .map_or(text.len(), |(i, _)| i);
    text.get(..end)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Column definition as supplied by the caller.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnDef {
    /// Unique key
    pub name: String,
    /// Header label (defaults to the name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Path to the displayed value (defaults to the name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathSpec>,
    /// Path to the sort key (defaults to the data path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_path: Option<PathSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<WidthSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    /// Exempt from the global minimum width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_min: Option<bool>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn width(mut self, width: impl Into<WidthSpec>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn data_path(mut self, path: impl Into<PathSpec>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn compare_path(mut self, path: impl Into<PathSpec>) -> Self {
        self.compare_path = Some(path.into());
        self
    }

    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = Some(false);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.resizable = Some(false);
        self
    }

    pub fn ignore_min(mut self) -> Self {
        self.ignore_min = Some(true);
        self
    }
}

/// Normalized column descriptor owned by the column model.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub label: String,
    pub data_path: DataPath,
    pub compare_path: DataPath,
    /// Dense zero-based display order (after normalization)
    pub order: usize,
    pub visible: bool,
    pub resizable: bool,
    pub movable: bool,
    pub sortable: bool,
    pub width_mode: ColumnWidthMode,
    /// Pixels when absolute, fraction when relative, unused when auto
    pub width: f64,
    pub ignore_min: bool,
    /// Allocated width in pixels
    pub actual_width: f64,
    /// On-screen width of the last visible column when a vertical
    /// scrollbar eats into it
    pub last_column_adjusted_width: Option<f64>,
    /// Extra pixels reserved for a sort arrow while sorted
    pub arrow_proposed_width: f64,
}

impl Column {
    /// Build a descriptor from a definition. `order` is left at the
    /// definition's value (or 0) and fixed up by the column model.
    pub fn from_def(def: &ColumnDef, min_width: f64) -> Self {
        let ignore_min = def.ignore_min.unwrap_or(false);
        let parsed = ParsedWidth::parse(def.width.as_ref(), if ignore_min { 0.0 } else { min_width });
        let data_path = def
            .data_path
            .as_ref()
            .map_or_else(|| parse_path(&def.name), PathSpec::to_path);
        let compare_path = def
            .compare_path
            .as_ref()
            .map_or_else(|| data_path.clone(), PathSpec::to_path);

        Self {
            name: def.name.clone(),
            label: def.label.clone().unwrap_or_else(|| def.name.clone()),
            data_path,
            compare_path,
            order: def.order.unwrap_or(0),
            visible: def.visible.unwrap_or(true),
            resizable: def.resizable.unwrap_or(true),
            movable: def.movable.unwrap_or(true),
            sortable: def.sortable.unwrap_or(true),
            width_mode: parsed.mode,
            width: parsed.width,
            ignore_min,
            actual_width: 0.0,
            last_column_adjusted_width: None,
            arrow_proposed_width: 0.0,
        }
    }

    /// Declared width in its serialized form.
    pub fn serialized_width(&self) -> WidthSpec {
        WidthSpec::from_mode(self.width_mode, self.width)
    }

    /// Width the presentation layer should draw.
    pub fn on_screen_width(&self) -> f64 {
        self.last_column_adjusted_width.unwrap_or(self.actual_width)
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

    #[test_case(WidthSpec::Pixels(120.0), ColumnWidthMode::Absolute, 120.0 ; "pixels")]
    #[test_case(WidthSpec::Pixels(10.0), ColumnWidthMode::Absolute, 35.0 ; "pixels below minimum")]
    #[test_case(WidthSpec::Pixels(0.25), ColumnWidthMode::Relative, 0.25 ; "fraction")]
    #[test_case("40%".into(), ColumnWidthMode::Relative, 0.4 ; "percentage")]
    #[test_case("150px".into(), ColumnWidthMode::Absolute, 150.0 ; "pixel string")]
    #[test_case("auto".into(), ColumnWidthMode::Auto, 0.0 ; "auto keyword")]
    #[test_case(WidthSpec::Pixels(-20.0), ColumnWidthMode::Auto, 0.0 ; "negative clamps to auto")]
    fn test_parse_width(spec: WidthSpec, mode: ColumnWidthMode, width: f64) {
        let parsed = ParsedWidth::parse(Some(&spec), 35.0);
        assert_eq!(parsed.mode, mode);
        assert!((parsed.width - width).abs() < 1e-9);
    }

    #[test]
    fn test_serialized_width_reparses() {
        let col = Column::from_def(&ColumnDef::new("a").width("25%"), 35.0);
        assert_eq!(col.serialized_width(), WidthSpec::Text("25%".to_string()));
        let again = ParsedWidth::parse(Some(&col.serialized_width()), 35.0);
        assert_eq!(again.mode, ColumnWidthMode::Relative);
        assert!((again.width - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_defaults_from_name() {
        let col = Column::from_def(&ColumnDef::new("address.city"), 35.0);
        assert_eq!(col.label, "address.city");
        assert_eq!(col.data_path, vec!["address", "city"]);
        assert_eq!(col.compare_path, col.data_path);
        assert!(col.visible && col.resizable && col.movable && col.sortable);
        assert_eq!(col.width_mode, ColumnWidthMode::Auto);
    }

    #[test]
    fn test_ignore_min_keeps_small_absolute() {
        let col = Column::from_def(&ColumnDef::new("a").width(10.0).ignore_min(), 35.0);
        assert_eq!(col.width_mode, ColumnWidthMode::Absolute);
        assert_eq!(col.width, 10.0);
    }
}
