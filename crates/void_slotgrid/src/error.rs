//! Error types

use crate::item::Item;
use thiserror::Error;

/// Invalid shape construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Width or height is zero
    #[error("Shape extent must be positive, got {width}x{height}")]
    ZeroExtent { width: u32, height: u32 },
    /// Mask does not cover the bounding box exactly
    #[error("Shape mask has {found} cells, expected {expected}")]
    MaskLength { expected: usize, found: usize },
    /// Text rows of different lengths
    #[error("Shape row {row} has {found} cells, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },
    /// Unknown character in a text row
    #[error("Invalid shape cell '{0}'")]
    InvalidCell(char),
    /// No cell is occupied
    #[error("Shape has no occupied cells")]
    Unoccupied,
}

/// Why an item could not be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceError {
    /// The store's admission filter refused the item
    #[error("Item is not allowed in this grid")]
    NotAdmitted,
    /// The store is at capacity
    #[error("Grid is full")]
    Full,
    /// The footprint leaves the grid extent
    #[error("Item does not fit inside the grid")]
    OutOfBounds,
    /// The footprint overlaps another item
    #[error("Item overlaps another item")]
    Overlap,
    /// The item is wider or taller than the grid
    #[error("Item is larger than the grid")]
    TooLarge,
    /// First-fit search found no free position
    #[error("No free position for item")]
    NoSpace,
    /// The item is already stored in this grid
    #[error("Item is already in this grid")]
    AlreadyPresent,
}

/// A rejected placement, handing the item back to the caller
#[derive(Debug, Error)]
#[error("Cannot place item {}: {reason}", .item.id())]
pub struct Rejected {
    /// The item that was not placed, at its previous position
    pub item: Item,
    /// Why it was refused
    pub reason: PlaceError,
}

impl Rejected {
    /// Create a rejection
    pub fn new(item: Item, reason: PlaceError) -> Self {
        Self { item, reason }
    }

    /// Take the item back
    pub fn into_item(self) -> Item {
        self.item
    }
}

/// Removal failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RemoveError {
    /// The item is not in this grid
    #[error("Item not found in grid")]
    NotFound,
    /// The store's removal policy refused
    #[error("Item removal refused by store")]
    Refused,
}

/// Ground-drop failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DropError {
    /// The item is not in this grid
    #[error("Item not found in grid")]
    NotFound,
    /// The store's drop policy refused
    #[error("Item drop refused by store")]
    Refused,
    /// The item itself cannot be dropped
    #[error("Item cannot be dropped")]
    NotDroppable,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML syntax or schema error
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Bad shape in an item definition
    #[error("Item '{id}': {source}")]
    Shape {
        id: String,
        #[source]
        source: ShapeError,
    },
    /// Semantically invalid value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
