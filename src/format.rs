//! Cell and header content formatting.
//!
//! Formatters are host callbacks. A cell formatter returning `None` renders
//! as empty content.

use std::rc::Rc;

use serde_json::Value;

use crate::types::{value_at_path, value_to_text, Column, Row};

/// `(value, column name, row) -> content`
pub type CellFormatter = Rc<dyn Fn(Option<&Value>, &str, &Row) -> Option<String>>;

/// `(label, column name) -> content`
pub type HeaderFormatter = Rc<dyn Fn(&str, &str) -> String>;

/// Plain text of the value; null and missing values are empty.
pub fn default_cell_formatter() -> CellFormatter {
    Rc::new(|value: Option<&Value>, _column: &str, _row: &Row| value.and_then(value_to_text))
}

/// The label as-is.
pub fn default_header_formatter() -> HeaderFormatter {
    Rc::new(|label: &str, _column: &str| label.to_string())
}

/// Formatted content of `column` for `row`.
pub fn cell_content(formatter: &CellFormatter, column: &Column, row: &Row) -> String {
    let value = value_at_path(row, &column.data_path);
    formatter(value, &column.name, row).unwrap_or_default()
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
    use crate::types::ColumnDef;
    use serde_json::json;

    #[test]
    fn test_default_cell_content() {
        let col = Column::from_def(&ColumnDef::new("a.b"), 35.0);
        let f = default_cell_formatter();
        assert_eq!(cell_content(&f, &col, &json!({"a": {"b": 4}})), "4");
        assert_eq!(cell_content(&f, &col, &json!({"a": {"b": null}})), "");
        assert_eq!(cell_content(&f, &col, &json!({})), "");
    }

    #[test]
    fn test_custom_formatter_none_is_empty() {
        let col = Column::from_def(&ColumnDef::new("n"), 35.0);
        let f: CellFormatter = Rc::new(|v: Option<&Value>, name: &str, _row: &Row| {
            let n = v?.as_f64()?;
            Some(format!("{name}={n:.1}"))
        });
        assert_eq!(cell_content(&f, &col, &json!({"n": 2})), "n=2.0");
        assert_eq!(cell_content(&f, &col, &json!({"n": "x"})), "");
    }
}
