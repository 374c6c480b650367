//! Typed event bus.
//!
//! Listeners subscribe per event kind (or to everything) and are called
//! synchronously, in subscription order. Dispatch iterates a snapshot of
//! the listener list, so a listener may subscribe or unsubscribe while an
//! event is being delivered; the change applies from the next emit.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;

use crate::filter::FilterArgs;
use crate::types::{SortExport, WidthSpec};

/// Everything the grid reports to its observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GridEvent {
    #[serde(rename_all = "camelCase")]
    RowCreated {
        display_index: usize,
        physical_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    RowDestroyed { display_index: usize },
    /// `replaced` is true when the whole data set was swapped
    RowsAdded { count: usize, replaced: bool },
    #[serde(rename_all = "camelCase")]
    RowsRemoved { physical_index: usize, count: usize },
    ColumnAdded { name: String },
    ColumnRemoved { name: String },
    ColumnShown { name: String },
    ColumnHidden { name: String },
    ColumnMoved { name: String, from: usize, to: usize },
    ColumnWidthChanged {
        name: String,
        old: WidthSpec,
        new: WidthSpec,
    },
    SortChanged { columns: Vec<SortExport> },
    FilterChanged { args: Option<FilterArgs> },
    SkeletonBuilt,
    RenderCompleted,
}

/// Discriminant of [`GridEvent`], used to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RowCreated,
    RowDestroyed,
    RowsAdded,
    RowsRemoved,
    ColumnAdded,
    ColumnRemoved,
    ColumnShown,
    ColumnHidden,
    ColumnMoved,
    ColumnWidthChanged,
    SortChanged,
    FilterChanged,
    SkeletonBuilt,
    RenderCompleted,
}

const KIND_NAMES: &[(EventKind, &str)] = &[
    (EventKind::RowCreated, "rowcreate"),
    (EventKind::RowDestroyed, "rowdestroy"),
    (EventKind::RowsAdded, "addrows"),
    (EventKind::RowsRemoved, "removerows"),
    (EventKind::ColumnAdded, "addcolumn"),
    (EventKind::ColumnRemoved, "removecolumn"),
    (EventKind::ColumnShown, "showcolumn"),
    (EventKind::ColumnHidden, "hidecolumn"),
    (EventKind::ColumnMoved, "movecolumn"),
    (EventKind::ColumnWidthChanged, "columnwidth"),
    (EventKind::SortChanged, "sort"),
    (EventKind::FilterChanged, "filter"),
    (EventKind::SkeletonBuilt, "renderskeleton"),
    (EventKind::RenderCompleted, "render"),
];

impl EventKind {
    /// Short event name used by hosts (`"sort"`, `"addrows"`, ...).
    pub fn name(self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|(k, _)| *k == self)
            .map_or("", |(_, n)| n)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        KIND_NAMES.iter().find(|(_, n)| *n == name).map(|(k, _)| *k)
    }
}

impl GridEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GridEvent::RowCreated { .. } => EventKind::RowCreated,
            GridEvent::RowDestroyed { .. } => EventKind::RowDestroyed,
            GridEvent::RowsAdded { .. } => EventKind::RowsAdded,
            GridEvent::RowsRemoved { .. } => EventKind::RowsRemoved,
            GridEvent::ColumnAdded { .. } => EventKind::ColumnAdded,
            GridEvent::ColumnRemoved { .. } => EventKind::ColumnRemoved,
            GridEvent::ColumnShown { .. } => EventKind::ColumnShown,
            GridEvent::ColumnHidden { .. } => EventKind::ColumnHidden,
            GridEvent::ColumnMoved { .. } => EventKind::ColumnMoved,
            GridEvent::ColumnWidthChanged { .. } => EventKind::ColumnWidthChanged,
            GridEvent::SortChanged { .. } => EventKind::SortChanged,
            GridEvent::FilterChanged { .. } => EventKind::FilterChanged,
            GridEvent::SkeletonBuilt => EventKind::SkeletonBuilt,
            GridEvent::RenderCompleted => EventKind::RenderCompleted,
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type EventCallback = Rc<dyn Fn(&GridEvent)>;

struct Listener {
    id: ListenerId,
    /// `None` listens to every kind
    kind: Option<EventKind>,
    once: bool,
    callback: EventCallback,
}

/// Cloneable handle to a shared listener list.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Vec<Listener>>>,
    next_id: Rc<Cell<u64>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(&self, kind: Option<EventKind>, once: bool, callback: EventCallback) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            kind,
            once,
            callback,
        });
        id
    }

    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&GridEvent) + 'static,
    {
        self.subscribe(Some(kind), false, Rc::new(callback))
    }

    /// Listen to a single delivery of `kind`.
    pub fn once<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&GridEvent) + 'static,
    {
        self.subscribe(Some(kind), true, Rc::new(callback))
    }

    /// Listen to every event.
    pub fn on_any<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&GridEvent) + 'static,
    {
        self.subscribe(None, false, Rc::new(callback))
    }

    /// Returns `true` when a listener was removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Remove every listener for `kind`.
    pub fn off_kind(&self, kind: EventKind) {
        self.listeners
            .borrow_mut()
            .retain(|l| l.kind != Some(kind));
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn emit(&self, event: &GridEvent) {
        let kind = event.kind();
        let snapshot: Vec<EventCallback> = {
            let mut listeners = self.listeners.borrow_mut();
            let matching: Vec<EventCallback> = listeners
                .iter()
                .filter(|l| l.kind.map_or(true, |k| k == kind))
                .map(|l| Rc::clone(&l.callback))
                .collect();
            listeners.retain(|l| !(l.once && l.kind.map_or(true, |k| k == kind)));
            matching
        };
        for callback in snapshot {
            callback(event);
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

    #[test]
    fn test_on_and_off() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = bus.on(EventKind::SortChanged, move |e| sink.borrow_mut().push(e.clone()));

        bus.emit(&GridEvent::SortChanged { columns: vec![] });
        bus.emit(&GridEvent::RenderCompleted);
        assert_eq!(seen.borrow().len(), 1);

        assert!(bus.off(id));
        bus.emit(&GridEvent::SortChanged { columns: vec![] });
        assert_eq!(seen.borrow().len(), 1);
        assert!(!bus.off(id));
    }

    #[test]
    fn test_once_fires_once() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        bus.once(EventKind::RenderCompleted, move |_| c.set(c.get() + 1));
        bus.emit(&GridEvent::RenderCompleted);
        bus.emit(&GridEvent::RenderCompleted);
        assert_eq!(count.get(), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_uses_snapshot() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let id_slot = Rc::new(Cell::new(None));

        let bus2 = bus.clone();
        let slot = Rc::clone(&id_slot);
        bus.on(EventKind::RenderCompleted, move |_| {
            if let Some(id) = slot.get() {
                bus2.off(id);
            }
        });
        let c = Rc::clone(&count);
        let second = bus.on(EventKind::RenderCompleted, move |_| c.set(c.get() + 1));
        id_slot.set(Some(second));

        // The second listener is removed by the first but still sees this event
        bus.emit(&GridEvent::RenderCompleted);
        assert_eq!(count.get(), 1);
        bus.emit(&GridEvent::RenderCompleted);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_names_round_trip() {
        for (kind, name) in KIND_NAMES {
            assert_eq!(kind.name(), *name);
            assert_eq!(EventKind::from_name(name), Some(*kind));
        }
        assert_eq!(EventKind::from_name("nope"), None);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(GridEvent::RowsAdded {
            count: 3,
            replaced: true,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "rowsAdded", "count": 3, "replaced": true})
        );
    }
}
