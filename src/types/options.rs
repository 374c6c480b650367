use serde::{Deserialize, Serialize};

use super::column::ColumnDef;
use super::row::Row;
use super::sort::SortColumnOption;
use crate::error::{GridError, Result};

pub const DEFAULT_ROWS_BUFFER_SIZE: usize = 3;
pub const DEFAULT_MIN_COLUMN_WIDTH: f64 = 35.0;
pub const DEFAULT_RESIZE_AREA_WIDTH: f64 = 8.0;

/// Grid construction options.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GridOptions {
    /// Render only the rows near the viewport
    pub virtual_table: bool,
    /// Extra rows rendered above and below the visible band
    pub rows_buffer_size: usize,
    pub min_column_width: f64,
    /// Width of the resize grab area around a header border
    pub resize_area_width: f64,
    pub resizable_columns: bool,
    pub movable_columns: bool,
    /// Maximum number of concurrently active sort keys
    pub sortable_columns: usize,
    /// Widen sorted columns by the sort arrow's width
    pub adjust_column_width_for_sort_arrow: bool,
    /// Reclassify AUTO widths as RELATIVE after measuring
    pub convert_column_widths_to_relative: bool,
    /// Stretch every resizable column to use all available width
    pub auto_fill_table_width: bool,
    pub relative_width_grows_to_fill_width: bool,
    pub relative_width_shrinks_to_fill_width: bool,
    pub columns: Vec<ColumnDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_column: Option<SortColumnOption>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Row>,
    /// Viewport height, when known up front
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            virtual_table: true,
            rows_buffer_size: DEFAULT_ROWS_BUFFER_SIZE,
            min_column_width: DEFAULT_MIN_COLUMN_WIDTH,
            resize_area_width: DEFAULT_RESIZE_AREA_WIDTH,
            resizable_columns: true,
            movable_columns: true,
            sortable_columns: 1,
            adjust_column_width_for_sort_arrow: true,
            convert_column_widths_to_relative: false,
            auto_fill_table_width: false,
            relative_width_grows_to_fill_width: true,
            relative_width_shrinks_to_fill_width: false,
            columns: Vec::new(),
            sort_column: None,
            rows: Vec::new(),
            height: None,
        }
    }
}

impl GridOptions {
    /// Decode options from JSON and clamp them into range.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: GridOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options.normalized())
    }

    /// Reject column definitions that can't be told apart.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for def in &self.columns {
            if def.name.is_empty() {
                return Err(GridError::InvalidOptions(
                    "column definition without a name".to_string(),
                ));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(GridError::InvalidOptions(format!(
                    "duplicate column name '{}'",
                    def.name
                )));
            }
        }
        Ok(())
    }

    /// Clamp out-of-range values to the nearest valid setting.
    pub fn normalized(mut self) -> Self {
        if !self.min_column_width.is_finite() || self.min_column_width < 0.0 {
            self.min_column_width = 0.0;
        }
        if self.rows_buffer_size == 0 {
            self.rows_buffer_size = DEFAULT_ROWS_BUFFER_SIZE;
        }
        if self.sortable_columns == 0 {
            self.sortable_columns = 1;
        }
        if !self.resize_area_width.is_finite() || self.resize_area_width <= 0.0 {
            self.resize_area_width = DEFAULT_RESIZE_AREA_WIDTH;
        }
        if let Some(height) = self.height {
            if !height.is_finite() || height < 0.0 {
                self.height = None;
            }
        }
        self
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
    use crate::types::SortSpecDef;

    #[test]
    fn test_empty_object_uses_defaults() {
        let options = GridOptions::from_json("{}").unwrap();
        assert_eq!(options, GridOptions::default());
        assert!(options.virtual_table);
        assert_eq!(options.rows_buffer_size, 3);
        assert_eq!(options.min_column_width, 35.0);
        assert_eq!(options.sortable_columns, 1);
    }

    #[test]
    fn test_clamps_invalid_values() {
        let options = GridOptions::from_json(
            r#"{"minColumnWidth": -4, "sortableColumns": 0, "rowsBufferSize": 0, "resizeAreaWidth": 0}"#,
        )
        .unwrap();
        assert_eq!(options.min_column_width, 0.0);
        assert_eq!(options.sortable_columns, 1);
        assert_eq!(options.rows_buffer_size, 3);
        assert_eq!(options.resize_area_width, 8.0);
    }

    #[test]
    fn test_zero_min_width_means_no_minimum() {
        let options = GridOptions::from_json(r#"{"minColumnWidth": 0}"#).unwrap();
        assert_eq!(options.min_column_width, 0.0);
    }

    #[test]
    fn test_sort_column_forms() {
        let options = GridOptions::from_json(r#"{"sortColumn": "name"}"#).unwrap();
        assert_eq!(
            options.sort_column.unwrap().entries(),
            vec![SortSpecDef::Name("name".into())]
        );

        let options = GridOptions::from_json(
            r#"{"sortColumn": ["a", {"column": "b", "descending": true}]}"#,
        )
        .unwrap();
        let entries = options.sort_column.unwrap().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].column(), "b");
        assert!(entries[1].descending());
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        let err = GridOptions::from_json(r#"{"columns": [{"name": "a"}, {"name": "a"}]}"#);
        assert!(matches!(err, Err(GridError::InvalidOptions(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GridOptions::from_json("{"),
            Err(GridError::Json(_))
        ));
    }
}
