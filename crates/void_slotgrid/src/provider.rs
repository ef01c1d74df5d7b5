//! Backing stores that own the items of a grid
//!
//! A provider is pure bookkeeping: it owns the items, applies admission,
//! removal and drop policy, and knows nothing about coordinates. All spatial
//! checks live in [`Grid`](crate::grid::Grid).

use crate::item::{Item, ItemCategory, ItemId};
use serde::{Deserialize, Serialize};

/// How a grid lays out its items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// One logical slot (equipment socket), coordinates are ignored
    Single,
    /// Full 2D placement
    #[default]
    Grid,
}

/// Authoritative item list of one grid
pub trait GridProvider: Send {
    /// Layout mode of the grid backed by this provider
    fn render_mode(&self) -> RenderMode;

    /// Number of stored items
    fn item_count(&self) -> usize;

    /// True when no more items may be added
    fn is_full(&self) -> bool;

    /// Item at `index` in iteration order
    fn item(&self, index: usize) -> Option<&Item>;

    /// Mutable item at `index`
    fn item_mut(&mut self, index: usize) -> Option<&mut Item>;

    /// Index of the item with the given ID
    fn position_of(&self, id: ItemId) -> Option<usize> {
        (0..self.item_count()).find(|&i| self.item(i).map(|item| item.id()) == Some(id))
    }

    /// Find a stored item by ID
    fn find(&self, id: ItemId) -> Option<&Item> {
        self.position_of(id).and_then(|i| self.item(i))
    }

    /// Admission filter (type allow-list)
    fn can_admit(&self, _item: &Item) -> bool {
        true
    }

    /// Removal policy
    fn can_remove(&self, _item: &Item) -> bool {
        true
    }

    /// Ground-drop policy
    fn can_drop(&self, _item: &Item) -> bool {
        true
    }

    /// Store an item. Hands it back if it is already present.
    fn add(&mut self, item: Item) -> Result<(), Item>;

    /// Take an item out of the store
    fn remove(&mut self, id: ItemId) -> Option<Item>;

    /// Take an item out of the store to place it on the ground
    fn drop_item(&mut self, id: ItemId) -> Option<Item> {
        self.remove(id)
    }
}

/// Standard list-backed provider with a capacity ceiling and type filter
#[derive(Debug, Default)]
pub struct ItemStore {
    items: Vec<Item>,
    render_mode: RenderMode,
    /// Maximum item count (`None` = unbounded)
    capacity: Option<usize>,
    /// Allowed category (`None` = any)
    allowed: Option<ItemCategory>,
}

impl ItemStore {
    /// Create an unbounded store
    pub fn new(render_mode: RenderMode) -> Self {
        Self {
            items: Vec::new(),
            render_mode,
            capacity: None,
            allowed: None,
        }
    }

    /// Create a one-item equipment slot
    pub fn single() -> Self {
        Self::new(RenderMode::Single).with_capacity(1)
    }

    /// Set maximum item count
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Only admit items of the given category
    pub fn with_allowed(mut self, category: ItemCategory) -> Self {
        self.allowed = Some(category);
        self
    }

    /// Maximum item count
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Allowed category
    pub fn allowed(&self) -> Option<ItemCategory> {
        self.allowed
    }

    /// Iterate stored items
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}

impl GridProvider for ItemStore {
    fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn is_full(&self) -> bool {
        match self.capacity {
            Some(capacity) => self.items.len() >= capacity,
            None => false,
        }
    }

    fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.items.get_mut(index)
    }

    fn position_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn can_admit(&self, item: &Item) -> bool {
        match self.allowed {
            None => true,
            Some(allowed) => item.category() == Some(allowed),
        }
    }

    fn add(&mut self, item: Item) -> Result<(), Item> {
        if self.position_of(item.id()).is_some() {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.position_of(id)?;
        Some(self.items.remove(index))
    }
}
