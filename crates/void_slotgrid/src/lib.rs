//! Void Slotgrid - Spatial Item Grids
//!
//! This crate provides shape-aware item grids with cross-grid drag and drop.
//!
//! # Features
//!
//! - Arbitrary footprints, including shapes with holes
//! - Collision-free placement with first-fit search
//! - Pluggable backing stores with capacity and category filters
//! - Single-slot grids for equipment sockets, with swapping
//! - One in-flight drag session shared by every grid
//! - Synchronous lifecycle notifications
//! - TOML grid and item configuration
//!
//! # Example
//!
//! ```ignore
//! use void_slotgrid::prelude::*;
//!
//! // Define an L-shaped item
//! let pipe = Arc::new(ItemDefinition::new("pipe", "Pipe", Shape::from_rows(&["#.", "##"])?));
//!
//! // Create a backpack and store an instance
//! let mut backpack = Grid::new(ItemStore::new(RenderMode::Grid), 8, 4);
//! let id = backpack.place(pipe.instantiate())?;
//!
//! // Drag it one cell to the right
//! let mut drag = DragSlot::new();
//! drag.pick_up(&mut backpack, id, Point::new(0, 0));
//! drag.update_position(Point::new(1, 0));
//! drag.release(&mut backpack);
//! ```

pub mod config;
pub mod drag;
pub mod error;
pub mod events;
pub mod grid;
pub mod item;
pub mod provider;
pub mod shape;

pub mod prelude {
    pub use crate::config::{GridConfig, ItemDefinitionConfig, SandboxConfig};
    pub use crate::drag::{DragOutcome, DragResolution, DragSession, DragSlot, GridLookup, GridSet};
    pub use crate::error::{ConfigError, DropError, PlaceError, Rejected, RemoveError, ShapeError};
    pub use crate::events::{DragEvent, GridEvent, SubscriberId};
    pub use crate::grid::{Grid, GridId};
    pub use crate::item::{Item, ItemCategory, ItemDefinition, ItemId, ItemRef};
    pub use crate::provider::{GridProvider, ItemStore, RenderMode};
    pub use crate::shape::{Point, Shape};
    pub use std::sync::Arc;
}

pub use prelude::*;
