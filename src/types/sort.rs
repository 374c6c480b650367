use serde::{Deserialize, Serialize};

use super::row::DataPath;

/// One active key in the sort stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortColumn {
    pub column: String,
    pub compare_path: DataPath,
    pub descending: bool,
}

/// Exported sort entry: `{column, descending}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SortExport {
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

/// A single entry in the initial `sortColumn` option.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SortSpecDef {
    Name(String),
    Entry(SortExport),
}

impl SortSpecDef {
    pub fn column(&self) -> &str {
        match self {
            SortSpecDef::Name(name) => name,
            SortSpecDef::Entry(entry) => &entry.column,
        }
    }

    pub fn descending(&self) -> bool {
        match self {
            SortSpecDef::Name(_) => false,
            SortSpecDef::Entry(entry) => entry.descending,
        }
    }
}

/// `sortColumn` option: a single column name, or a list of names/entries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SortColumnOption {
    One(String),
    Many(Vec<SortSpecDef>),
}

impl SortColumnOption {
    /// Flatten into the list of entries in stack order.
    pub fn entries(&self) -> Vec<SortSpecDef> {
        match self {
            SortColumnOption::One(name) => vec![SortSpecDef::Name(name.clone())],
            SortColumnOption::Many(list) => list.clone(),
        }
    }
}
