use serde::{Deserialize, Serialize};

use super::column::WidthSpec;

/// Exported per-column configuration, suitable for persisting by the host.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub order: usize,
    pub width: WidthSpec,
    pub visible: bool,
    pub label: String,
}
