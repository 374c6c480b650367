//! Column model: column descriptors plus order and visibility bookkeeping.
//!
//! Columns are stored in definition order. Display order is the `order`
//! field, kept dense (`0..n`) by [`ColumnModel::normalize_order`] after
//! every structural edit. The visible list is cached, sorted by order.

use crate::types::{Column, ColumnDef};

/// Reference to a column by unique name or by numeric position.
///
/// What a position means depends on the operation: an order value for
/// [`ColumnModel::add`], a visible position for [`ColumnModel::move_column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Name(String),
    Position(usize),
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl From<usize> for ColumnRef {
    fn from(position: usize) -> Self {
        ColumnRef::Position(position)
    }
}

/// Result of a successful [`ColumnModel::move_column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMove {
    pub name: String,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnModel {
    columns: Vec<Column>,
    /// Indices into `columns` of the visible columns, sorted by order
    visible: Vec<usize>,
}

impl ColumnModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from definitions.
    ///
    /// Columns without an explicit order follow the highest order seen so
    /// far. Definitions with a duplicate name are skipped.
    pub fn from_defs(defs: &[ColumnDef], min_width: f64) -> Self {
        let mut columns: Vec<Column> = Vec::with_capacity(defs.len());
        let mut next_order = 0usize;
        for def in defs {
            if columns.iter().any(|c| c.name == def.name) {
                continue;
            }
            let mut column = Column::from_def(def, min_width);
            match def.order {
                Some(order) => {
                    if order >= next_order {
                        next_order = order + 1;
                    }
                    column.order = order;
                }
                None => {
                    column.order = next_order;
                    next_order += 1;
                }
            }
            columns.push(column);
        }

        let mut model = Self {
            columns,
            visible: Vec::new(),
        };
        model.normalize_order();
        model
    }

    /// Reassign orders to `0..n`, keeping the relative order (ties resolve
    /// by definition position), and rebuild the visible cache.
    pub fn normalize_order(&mut self) {
        let mut by_order: Vec<usize> = (0..self.columns.len()).collect();
        by_order.sort_by_key(|&i| self.columns.get(i).map_or(usize::MAX, |c| c.order));
        for (order, idx) in by_order.into_iter().enumerate() {
            if let Some(column) = self.columns.get_mut(idx) {
                column.order = order;
            }
        }
        self.refresh_visible();
    }

    fn refresh_visible(&mut self) {
        let mut visible: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.visible)
            .map(|(i, _)| i)
            .collect();
        visible.sort_by_key(|&i| self.columns.get(i).map_or(usize::MAX, |c| c.order));
        self.visible = visible;
    }

    /// Make the first defined column visible if none are.
    ///
    /// Returns the promoted column's name.
    pub fn ensure_visible(&mut self) -> Option<String> {
        if !self.visible.is_empty() {
            return None;
        }
        let first = self.columns.first_mut()?;
        first.visible = true;
        let name = first.name.clone();
        self.refresh_visible();
        Some(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn get_by_order(&self, order: usize) -> Option<&Column> {
        self.columns.iter().find(|c| c.order == order)
    }

    pub fn max_order(&self) -> Option<usize> {
        self.columns.iter().map(|c| c.order).max()
    }

    /// All columns in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.iter_mut()
    }

    /// Visible columns in display order.
    pub fn visible(&self) -> impl Iterator<Item = &Column> {
        self.visible.iter().filter_map(|&i| self.columns.get(i))
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Visible column at display position `position`.
    pub fn visible_at(&self, position: usize) -> Option<&Column> {
        self.visible
            .get(position)
            .and_then(|&i| self.columns.get(i))
    }

    pub fn visible_at_mut(&mut self, position: usize) -> Option<&mut Column> {
        let idx = *self.visible.get(position)?;
        self.columns.get_mut(idx)
    }

    /// Display position of a visible column.
    pub fn visible_position(&self, name: &str) -> Option<usize> {
        self.visible
            .iter()
            .position(|&i| self.columns.get(i).is_some_and(|c| c.name == name))
    }

    /// Insert a new column before `before` (a name or an order value), or
    /// append it. Returns `false` when the name already exists.
    pub fn add(&mut self, def: &ColumnDef, before: Option<&ColumnRef>, min_width: f64) -> bool {
        if self.get(&def.name).is_some() {
            return false;
        }
        let before_order = before.and_then(|r| match r {
            ColumnRef::Name(name) => self.get(name).map(|c| c.order),
            ColumnRef::Position(order) => self.get_by_order(*order).map(|c| c.order),
        });

        let mut column = Column::from_def(def, min_width);
        column.order = match before_order {
            Some(order) => {
                for existing in &mut self.columns {
                    if existing.order >= order {
                        existing.order += 1;
                    }
                }
                order
            }
            None => self.max_order().map_or(0, |max| max + 1),
        };
        self.columns.push(column);
        self.normalize_order();
        true
    }

    /// Remove a column by name, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.index_of(name)?;
        let column = self.columns.remove(idx);
        self.normalize_order();
        Some(column)
    }

    /// Move `src` into `dest`'s slot. Names resolve directly; positions are
    /// visible positions. Orders in between shift by one towards `src`'s
    /// old slot.
    pub fn move_column(&mut self, src: &ColumnRef, dest: &ColumnRef) -> Option<ColumnMove> {
        if src == dest {
            return None;
        }
        let src_idx = self.resolve_visible_ref(src)?;
        let dest_idx = self.resolve_visible_ref(dest)?;
        if src_idx == dest_idx {
            return None;
        }
        let from = self.columns.get(src_idx)?.order;
        let to = self.columns.get(dest_idx)?.order;

        for column in &mut self.columns {
            if from < to && column.order > from && column.order <= to {
                column.order -= 1;
            } else if from > to && column.order >= to && column.order < from {
                column.order += 1;
            }
        }
        let moved = self.columns.get_mut(src_idx)?;
        moved.order = to;
        let name = moved.name.clone();
        self.normalize_order();

        Some(ColumnMove { name, from, to })
    }

    fn resolve_visible_ref(&self, r: &ColumnRef) -> Option<usize> {
        match r {
            ColumnRef::Name(name) => self.index_of(name),
            ColumnRef::Position(pos) => self.visible.get(*pos).copied(),
        }
    }

    /// Change visibility. Returns `true` when the flag actually changed.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        match self.get_mut(name) {
            Some(column) if column.visible != visible => {
                column.visible = visible;
                self.refresh_visible();
                true
            }
            _ => false,
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

    fn model(names: &[&str]) -> ColumnModel {
        let defs: Vec<ColumnDef> = names.iter().map(|n| ColumnDef::new(*n)).collect();
        ColumnModel::from_defs(&defs, 35.0)
    }

    fn visible_names(m: &ColumnModel) -> Vec<String> {
        m.visible().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn test_orders_are_dense() {
        let defs = vec![
            ColumnDef::new("a").order(10),
            ColumnDef::new("b"),
            ColumnDef::new("c").order(2),
        ];
        let m = ColumnModel::from_defs(&defs, 35.0);
        // a=10, b=11, c=2 → c, a, b
        assert_eq!(visible_names(&m), vec!["c", "a", "b"]);
        let mut orders: Vec<usize> = m.iter().map(|c| c.order).collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_explicit_order_advances_counter() {
        let defs = vec![
            ColumnDef::new("q").order(0),
            ColumnDef::new("r"),
            ColumnDef::new("s").order(0),
        ];
        let m = ColumnModel::from_defs(&defs, 35.0);
        // r follows q instead of sharing its order
        assert_eq!(visible_names(&m), vec!["q", "s", "r"]);
    }

    #[test]
    fn test_duplicate_names_skipped() {
        let m = model(&["a", "a", "b"]);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_add_before_name_and_order() {
        let mut m = model(&["a", "b", "c"]);
        assert!(m.add(&ColumnDef::new("x"), Some(&"b".into()), 35.0));
        assert_eq!(visible_names(&m), vec!["a", "x", "b", "c"]);

        assert!(m.add(&ColumnDef::new("y"), Some(&ColumnRef::Position(0)), 35.0));
        assert_eq!(visible_names(&m), vec!["y", "a", "x", "b", "c"]);

        assert!(m.add(&ColumnDef::new("z"), None, 35.0));
        assert_eq!(visible_names(&m).last().unwrap(), "z");

        assert!(!m.add(&ColumnDef::new("a"), None, 35.0));
    }

    #[test]
    fn test_move_column_forward_and_back() {
        let mut m = model(&["a", "b", "c", "d"]);
        let moved = m.move_column(&"a".into(), &"c".into()).unwrap();
        assert_eq!(moved, ColumnMove { name: "a".into(), from: 0, to: 2 });
        assert_eq!(visible_names(&m), vec!["b", "c", "a", "d"]);

        m.move_column(&ColumnRef::Position(3), &ColumnRef::Position(0))
            .unwrap();
        assert_eq!(visible_names(&m), vec!["d", "b", "c", "a"]);

        assert!(m.move_column(&"a".into(), &"a".into()).is_none());
        assert!(m.move_column(&"a".into(), &"nope".into()).is_none());
    }

    #[test]
    fn test_ensure_visible_promotes_first() {
        let mut m = model(&["a", "b"]);
        assert!(m.set_visible("a", false));
        assert!(m.set_visible("b", false));
        assert_eq!(m.visible_count(), 0);
        assert_eq!(m.ensure_visible(), Some("a".to_string()));
        assert_eq!(visible_names(&m), vec!["a"]);
        assert_eq!(m.ensure_visible(), None);
    }

    #[test]
    fn test_remove_normalizes() {
        let mut m = model(&["a", "b", "c"]);
        assert!(m.remove("b").is_some());
        assert!(m.remove("b").is_none());
        assert_eq!(m.get("c").unwrap().order, 1);
    }
}
