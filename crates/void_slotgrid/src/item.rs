//! Item definitions and placed item instances

use crate::shape::{Point, Shape};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Item classification used by admission filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    /// Weapons (swords, guns, etc.)
    Weapon,
    /// Armor pieces
    Armor,
    /// Consumables (potions, food, etc.)
    Consumable,
    /// Materials for crafting
    Material,
    /// Quest items
    Quest,
    /// Key items
    Key,
    /// Ammunition
    Ammo,
    /// Production units
    Unit,
    /// Misc items
    Misc,
    /// Custom category
    Custom(u32),
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
            Self::Consumable => write!(f, "consumable"),
            Self::Material => write!(f, "material"),
            Self::Quest => write!(f, "quest"),
            Self::Key => write!(f, "key"),
            Self::Ammo => write!(f, "ammo"),
            Self::Unit => write!(f, "unit"),
            Self::Misc => write!(f, "misc"),
            Self::Custom(id) => write!(f, "custom({})", id),
        }
    }
}

/// Unique identifier of an item instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared, read-only description of an item kind
#[derive(Debug, Clone)]
pub struct ItemDefinition {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Classification, `None` for untyped items
    pub category: Option<ItemCategory>,
    /// Footprint shared by every instance
    pub shape: Arc<Shape>,
    /// Initial drop permission of new instances
    pub droppable: bool,
}

impl ItemDefinition {
    /// Create a new item definition
    pub fn new(id: impl Into<String>, name: impl Into<String>, shape: impl Into<Arc<Shape>>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: None,
            shape: shape.into(),
            droppable: true,
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set category
    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Make non-droppable
    pub fn non_droppable(mut self) -> Self {
        self.droppable = false;
        self
    }

    /// Create a fresh instance at the origin
    pub fn instantiate(self: &Arc<Self>) -> Item {
        Item::new(Arc::clone(self))
    }
}

/// A placeable item instance.
///
/// Items are moved by value between stores and drag sessions, so an instance
/// is never held by two owners at once.
#[derive(Debug)]
pub struct Item {
    id: ItemId,
    definition: Arc<ItemDefinition>,
    position: Point,
    can_drop: bool,
}

impl Item {
    /// Create an item from a definition
    pub fn new(definition: Arc<ItemDefinition>) -> Self {
        Self {
            id: ItemId::next(),
            can_drop: definition.droppable,
            definition,
            position: Point::ZERO,
        }
    }

    /// Unique instance ID
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Shared definition
    pub fn definition(&self) -> &Arc<ItemDefinition> {
        &self.definition
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Classification tag
    pub fn category(&self) -> Option<ItemCategory> {
        self.definition.category
    }

    /// Footprint
    pub fn shape(&self) -> &Shape {
        &self.definition.shape
    }

    /// Footprint width
    pub fn width(&self) -> u32 {
        self.definition.shape.width()
    }

    /// Footprint height
    pub fn height(&self) -> u32 {
        self.definition.shape.height()
    }

    /// Top-left grid coordinate
    pub fn position(&self) -> Point {
        self.position
    }

    /// Move the item (grid-space)
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Whether the item may be dropped on the ground or picked up
    pub fn can_drop(&self) -> bool {
        self.can_drop
    }

    /// Set drop permission
    pub fn set_can_drop(&mut self, can_drop: bool) {
        self.can_drop = can_drop;
    }

    /// True if the grid point is covered by an occupied cell
    pub fn contains(&self, point: Point) -> bool {
        self.shape().contains(point - self.position)
    }

    /// True if this item, placed at `at`, would overlap `other` where it is now
    pub fn overlaps_at(&self, at: Point, other: &Item) -> bool {
        self.shape().overlaps(other.shape(), other.position - at)
    }

    /// True if the two items overlap at their current positions
    pub fn overlaps(&self, other: &Item) -> bool {
        self.overlaps_at(self.position, other)
    }

    /// Lightweight reference for notifications
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            id: self.id,
            definition: Arc::clone(&self.definition),
            position: self.position,
        }
    }
}

/// Snapshot of an item carried by notifications
#[derive(Debug, Clone)]
pub struct ItemRef {
    /// Instance ID
    pub id: ItemId,
    /// Shared definition
    pub definition: Arc<ItemDefinition>,
    /// Position when the notification fired
    pub position: Point,
}

impl ItemRef {
    /// Display name
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}
