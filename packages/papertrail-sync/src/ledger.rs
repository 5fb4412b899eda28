use serde::Serialize;
use std::fmt;

/// Kind of thing an [`Item`] reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemKind {
    System,
    Group,
    Search,
    EventsSearch,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::System => "System",
            Self::Group => "Group",
            Self::Search => "Search",
            Self::EventsSearch => "EventsSearch",
        };
        f.write_str(name)
    }
}

/// Result of reconciling one resource.
///
/// At most one of `created`/`deleted` is set. Events-search items set neither
/// and carry a summary in `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: i64,
    pub kind: ItemKind,
    pub name: String,
    pub created: bool,
    pub deleted: bool,
}

impl Item {
    /// A resource that already existed and was left alone.
    pub fn existing(kind: ItemKind, id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            created: false,
            deleted: false,
        }
    }

    pub fn created(kind: ItemKind, id: i64, name: impl Into<String>) -> Self {
        Self {
            created: true,
            ..Self::existing(kind, id, name)
        }
    }

    pub fn deleted(kind: ItemKind, id: i64, name: impl Into<String>) -> Self {
        Self {
            deleted: true,
            ..Self::existing(kind, id, name)
        }
    }

    pub fn events_search(summary: impl Into<String>) -> Self {
        Self::existing(ItemKind::EventsSearch, 0, summary)
    }

    /// Whether the item belongs in a run report.
    pub fn is_reportable(&self) -> bool {
        self.created || self.deleted || self.kind == ItemKind::EventsSearch
    }
}

/// Ordered record of what a run actually changed or retrieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    items: Vec<Item>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `item` only if it was created, deleted, or is an events search.
    pub fn record(&mut self, item: Item) {
        if item.is_reportable() {
            self.items.push(item);
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}
