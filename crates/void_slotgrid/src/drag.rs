//! Cross-grid drag and drop
//!
//! A [`DragSlot`] is the one handle through which items leave a grid under
//! the pointer. It holds at most one [`DragSession`], so only one item can be
//! in flight no matter how many grids share the slot. The orchestrating
//! context owns the slot and passes it to whatever handles pointer input.
//!
//! Exclusivity is per slot. A host must create one slot and route every
//! grid's gestures through it; two slots can each carry an item at once.
//!
//! Gesture order is always: pick-up, any number of boundary crossings and
//! position updates, then exactly one [`DragSlot::release`], which resolves
//! into one [`DragOutcome`].

use crate::events::{DragEvent, Listeners, SubscriberId};
use crate::grid::{Grid, GridId};
use crate::item::{Item, ItemId, ItemRef};
use crate::provider::RenderMode;
use crate::shape::Point;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Access to grids by ID during resolution
pub trait GridLookup {
    /// Shared access
    fn grid(&self, id: GridId) -> Option<&Grid>;

    /// Exclusive access
    fn grid_mut(&mut self, id: GridId) -> Option<&mut Grid>;
}

impl GridLookup for Grid {
    fn grid(&self, id: GridId) -> Option<&Grid> {
        (self.id() == id).then_some(self)
    }

    fn grid_mut(&mut self, id: GridId) -> Option<&mut Grid> {
        if self.id() == id {
            Some(self)
        } else {
            None
        }
    }
}

/// Grids owned together by one host, keyed by ID
#[derive(Debug, Default)]
pub struct GridSet {
    grids: BTreeMap<GridId, Grid>,
}

impl GridSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grid, returning its ID
    pub fn insert(&mut self, grid: Grid) -> GridId {
        let id = grid.id();
        self.grids.insert(id, grid);
        id
    }

    /// Take a grid out of the set
    pub fn remove(&mut self, id: GridId) -> Option<Grid> {
        self.grids.remove(&id)
    }

    /// Get a grid
    pub fn get(&self, id: GridId) -> Option<&Grid> {
        self.grids.get(&id)
    }

    /// Get a mutable grid
    pub fn get_mut(&mut self, id: GridId) -> Option<&mut Grid> {
        self.grids.get_mut(&id)
    }

    /// Grid currently storing the item
    pub fn grid_of(&self, item: ItemId) -> Option<GridId> {
        self.grids
            .values()
            .find(|grid| grid.contains(item))
            .map(|grid| grid.id())
    }

    /// Iterate grids in ID order
    pub fn iter(&self) -> impl Iterator<Item = &Grid> {
        self.grids.values()
    }

    /// Number of grids
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// True if the set is empty
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl GridLookup for GridSet {
    fn grid(&self, id: GridId) -> Option<&Grid> {
        self.grids.get(&id)
    }

    fn grid_mut(&mut self, id: GridId) -> Option<&mut Grid> {
        self.grids.get_mut(&id)
    }
}

/// The item in flight
#[derive(Debug)]
pub struct DragSession {
    item: Item,
    source: GridId,
    /// Position in the source grid at pick-up
    origin: Point,
    /// Item origin minus pointer cell at pick-up
    anchor: Point,
    /// Latest pointer cell, in the current grid's space
    pointer: Point,
    current: Option<GridId>,
}

impl DragSession {
    /// Carried item
    pub fn item(&self) -> &Item {
        &self.item
    }

    /// Grid the item was lifted from
    pub fn source(&self) -> GridId {
        self.source
    }

    /// Where the item sat in its source grid
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Pointer-to-item offset captured at pick-up
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Latest pointer cell
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// Grid under the pointer, if any
    pub fn current_grid(&self) -> Option<GridId> {
        self.current
    }

    /// Top-left cell the item would occupy if released now
    pub fn target_position(&self) -> Point {
        self.pointer + self.anchor
    }
}

/// How a drag gesture ended
#[derive(Debug)]
pub enum DragOutcome {
    /// Placed into the grid under the pointer
    Added { grid: GridId, position: Point },
    /// Released where it was picked up, nothing moved
    Selected { grid: GridId },
    /// Replaced the occupant of a single slot; the occupant is handed back
    Swapped { grid: GridId, evicted: Item },
    /// Put back into its source grid
    Returned { grid: GridId, position: Point },
    /// Left every grid and went to the ground
    Dropped { item: Item },
}

impl DragOutcome {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Selected { .. } => "selected",
            Self::Swapped { .. } => "swapped",
            Self::Returned { .. } => "returned",
            Self::Dropped { .. } => "dropped",
        }
    }
}

/// Result of [`DragSlot::release`]
#[derive(Debug)]
pub struct DragResolution {
    /// The carried item as it ended up
    pub item: ItemRef,
    /// What happened to it
    pub outcome: DragOutcome,
}

/// Item pressed but not yet dragged
#[derive(Debug, Clone, Copy)]
struct PendingPick {
    grid: GridId,
    item: ItemId,
}

/// Exclusive in-flight item handle shared by every grid of a host
///
/// Only one item is in flight per slot, so a host keeps exactly one slot
/// for all of its grids. Separate slots do not see each other's sessions.
#[derive(Debug, Default)]
pub struct DragSlot {
    session: Option<DragSession>,
    pending: Option<PendingPick>,
    hovered: Option<ItemId>,
    listeners: Listeners<DragEvent>,
}

impl DragSlot {
    /// Create an idle slot
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an item is in flight
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The active session
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Register a drag listener
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&DragEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(handler)
    }

    /// Remove a drag listener
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn emit(&self, event: DragEvent) {
        self.listeners.emit(&event);
    }

    // ========== Hover ==========

    /// Track the item under an idle pointer, firing `Hovered` on change
    pub fn hover(&mut self, grid: &Grid, point: Point) {
        if self.session.is_some() {
            return;
        }
        let item = grid.item_at_point(point);
        let id = item.map(Item::id);
        if id == self.hovered {
            return;
        }
        self.hovered = id;
        self.emit(DragEvent::Hovered(item.map(Item::item_ref)));
    }

    /// Pointer left every grid
    pub fn clear_hover(&mut self) {
        if self.hovered.take().is_some() {
            self.emit(DragEvent::Hovered(None));
        }
    }

    // ========== Pick-up ==========

    /// Pointer pressed over `point`. Records the item there as the drag
    /// candidate and fires `Picked`. Ignored while a session is active.
    pub fn press(&mut self, grid: &Grid, point: Point) -> Option<ItemId> {
        if self.session.is_some() {
            return None;
        }
        self.pending = None;

        let item = grid.item_at_point(point)?;
        self.pending = Some(PendingPick {
            grid: grid.id(),
            item: item.id(),
        });
        self.emit(DragEvent::Picked(item.item_ref()));
        Some(item.id())
    }

    /// Start dragging the pressed candidate with the pointer at `pointer`
    pub fn begin_drag(&mut self, grid: &mut Grid, pointer: Point) -> Option<&DragSession> {
        let pending = self.pending.take()?;
        if pending.grid != grid.id() {
            return None;
        }
        self.pick_up(grid, pending.item, pointer)
    }

    /// Lift `item` out of `grid` and start carrying it.
    ///
    /// Does nothing (returns `None`) if another item is already in flight,
    /// the item is not in the grid, its `can_drop` flag is false, or the
    /// store refuses to let it go.
    pub fn pick_up(&mut self, grid: &mut Grid, item: ItemId, pointer: Point) -> Option<&DragSession> {
        if self.session.is_some() {
            log::debug!("Pick-up of {} ignored, another item is in flight", item);
            return None;
        }

        let candidate = grid.item(item)?;
        if !candidate.can_drop() {
            return None;
        }
        let origin = candidate.position();
        let item = grid.remove(item).ok()?;

        log::debug!("Picked up {} '{}' from {} at {}", item.id(), item.name(), grid.id(), origin);
        self.emit(DragEvent::PickedUp(item.item_ref()));
        self.pending = None;
        self.hovered = None;
        self.session = Some(DragSession {
            item,
            source: grid.id(),
            origin,
            anchor: origin - pointer,
            pointer,
            current: Some(grid.id()),
        });
        self.session.as_ref()
    }

    // ========== Carrying ==========

    /// Pointer entered a grid
    pub fn enter(&mut self, grid: GridId) {
        if let Some(session) = self.session.as_mut() {
            session.current = Some(grid);
        }
    }

    /// Pointer left a grid. Only clears the current grid if it is this one.
    pub fn exit(&mut self, grid: GridId) {
        match self.session.as_mut() {
            Some(session) => {
                if session.current == Some(grid) {
                    session.current = None;
                }
            }
            None => self.clear_hover(),
        }
    }

    /// Pointer moved, in the current grid's cell space
    pub fn update_position(&mut self, pointer: Point) {
        if let Some(session) = self.session.as_mut() {
            session.pointer = pointer;
        }
    }

    // ========== Resolution ==========

    /// Pointer released: resolve the gesture against the current grid.
    ///
    /// Returns `None` if nothing is in flight. Host-aborted gestures are
    /// released the same way.
    ///
    /// # Panics
    ///
    /// Panics if the item cannot be put back into its source grid. The source
    /// held this exact configuration at pick-up, so that only happens when
    /// the grid was changed behind the gesture's back.
    pub fn release<L>(&mut self, grids: &mut L) -> Option<DragResolution>
    where
        L: GridLookup + ?Sized,
    {
        let session = self.session.take()?;
        let resolution = Self::resolve(session, grids);

        log::debug!("Drag of {} '{}' {}", resolution.item.id, resolution.item.name(), resolution.outcome.name());
        let item = resolution.item.clone();
        let event = match &resolution.outcome {
            DragOutcome::Added { .. } => DragEvent::Added(item),
            DragOutcome::Selected { .. } => DragEvent::Picked(item),
            DragOutcome::Swapped { .. } => DragEvent::Swapped(item),
            DragOutcome::Returned { .. } => DragEvent::Returned(item),
            DragOutcome::Dropped { .. } => DragEvent::Dropped(item),
        };
        self.emit(event);
        Some(resolution)
    }

    fn resolve<L>(session: DragSession, grids: &mut L) -> DragResolution
    where
        L: GridLookup + ?Sized,
    {
        let target = session.target_position();
        let DragSession {
            mut item,
            source,
            origin,
            current,
            ..
        } = session;
        let id = item.id();
        item.set_can_drop(true);

        let Some(current) = current else {
            let grounded = grids
                .grid(source)
                .map(|grid| grid.force_drop(&item))
                .unwrap_or(true);
            if grounded {
                return Self::grounded(item);
            }
            return Self::return_to_source(item, source, origin, grids);
        };

        if let Some(grid) = grids.grid_mut(current) {
            // Released where it started
            if current == source && target == origin {
                let definition = Arc::clone(item.definition());
                match grid.reinstate(item, origin) {
                    Ok(()) => {
                        let item = stored_ref(grid, id).unwrap_or(ItemRef {
                            id,
                            definition,
                            position: origin,
                        });
                        return DragResolution {
                            item,
                            outcome: DragOutcome::Selected { grid: current },
                        };
                    }
                    Err(back) => item = back,
                }
            }

            if let Some(occupant) = swap_candidate(grid, &item) {
                match grid.remove(occupant) {
                    Ok(evicted) => {
                        let evicted_at = evicted.position();
                        let definition = Arc::clone(item.definition());
                        match grid.place_at(item, target) {
                            Ok(_) => {
                                let item = stored_ref(grid, id).unwrap_or(ItemRef {
                                    id,
                                    definition,
                                    position: target,
                                });
                                return DragResolution {
                                    item,
                                    outcome: DragOutcome::Swapped {
                                        grid: current,
                                        evicted,
                                    },
                                };
                            }
                            Err(rejected) => {
                                item = rejected.into_item();
                                if let Err(occupant) = grid.reinstate(evicted, evicted_at) {
                                    log::error!("Lost single-slot occupant {} of {}", occupant.id(), current);
                                    panic!("failed to restore occupant {} of {}", occupant.id(), current);
                                }
                            }
                        }
                    }
                    Err(error) => log::debug!("Swap in {} refused: {}", current, error),
                }
            }

            if grid.can_place_at(&item, target) {
                let definition = Arc::clone(item.definition());
                match grid.place_at(item, target) {
                    Ok(_) => {
                        let item = stored_ref(grid, id).unwrap_or(ItemRef {
                            id,
                            definition,
                            position: target,
                        });
                        let position = item.position;
                        return DragResolution {
                            item,
                            outcome: DragOutcome::Added {
                                grid: current,
                                position,
                            },
                        };
                    }
                    Err(rejected) => item = rejected.into_item(),
                }
            }
        } else {
            log::debug!("Release over unknown {}", current);
        }

        Self::return_to_source(item, source, origin, grids)
    }

    fn grounded(mut item: Item) -> DragResolution {
        item.set_can_drop(false);
        DragResolution {
            item: item.item_ref(),
            outcome: DragOutcome::Dropped { item },
        }
    }

    fn return_to_source<L>(item: Item, source: GridId, origin: Point, grids: &mut L) -> DragResolution
    where
        L: GridLookup + ?Sized,
    {
        let Some(grid) = grids.grid_mut(source) else {
            log::error!("Source {} of {} is gone, dropping it", source, item.id());
            return Self::grounded(item);
        };

        let id = item.id();
        let definition = Arc::clone(item.definition());
        match grid.place_at(item, origin) {
            Ok(_) => {
                let item = stored_ref(grid, id).unwrap_or(ItemRef {
                    id,
                    definition,
                    position: origin,
                });
                let position = item.position;
                DragResolution {
                    item,
                    outcome: DragOutcome::Returned {
                        grid: source,
                        position,
                    },
                }
            }
            Err(rejected) => {
                log::error!("Cannot return {} to {}: {}", rejected.item.id(), source, rejected.reason);
                panic!("failed to return {} to {}: {}", rejected.item.id(), source, rejected.reason);
            }
        }
    }
}

/// Occupant a single-slot grid would give up for `item`
fn swap_candidate(grid: &Grid, item: &Item) -> Option<ItemId> {
    if grid.render_mode() != RenderMode::Single || !grid.can_swap(item) {
        return None;
    }
    grid.items().map(Item::id).find(|&id| id != item.id())
}

/// Notification snapshot of a stored item
fn stored_ref(grid: &Grid, id: ItemId) -> Option<ItemRef> {
    grid.item(id).map(Item::item_ref)
}
