//! Placement engine
//!
//! A [`Grid`] wraps one [`GridProvider`] with a width x height extent and
//! owns every spatial decision. Between operations it guarantees:
//!
//! - every item's bounding box lies inside `[0, width) x [0, height)`
//! - a single-slot occupant is centered and admitted without a fit check,
//!   but a resize evicts it like any other item that no longer fits
//! - no two items share an occupied cell
//! - a single-slot grid holds at most one item
//!
//! Every mutating call fires exactly one [`GridEvent`] per affected item.

use crate::error::{DropError, PlaceError, Rejected, RemoveError};
use crate::events::{GridEvent, Listeners, SubscriberId};
use crate::item::{Item, ItemId};
use crate::provider::{GridProvider, RenderMode};
use crate::shape::{Point, Shape};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier of a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(u64);

impl GridId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}

/// Cached placement of one stored item
#[derive(Debug, Clone)]
struct Footprint {
    id: ItemId,
    position: Point,
    shape: Arc<Shape>,
}

impl Footprint {
    fn of(item: &Item) -> Self {
        Self {
            id: item.id(),
            position: item.position(),
            shape: Arc::clone(&item.definition().shape),
        }
    }

    fn contains(&self, point: Point) -> bool {
        self.shape.contains(point - self.position)
    }
}

/// Spatial inventory grid
pub struct Grid {
    id: GridId,
    width: u32,
    height: u32,
    provider: Box<dyn GridProvider>,
    /// Item footprints in store order, re-read by `rebuild`
    snapshot: Vec<Footprint>,
    listeners: Listeners<GridEvent>,
}

impl Grid {
    /// Create a grid over a provider.
    ///
    /// Items already in the provider that fall outside the extent are evicted.
    pub fn new(provider: impl GridProvider + 'static, width: u32, height: u32) -> Self {
        let mut grid = Self {
            id: GridId::next(),
            width,
            height,
            provider: Box::new(provider),
            snapshot: Vec::new(),
            listeners: Listeners::new(),
        };
        grid.rebuild_snapshot(true);
        grid.resize(width, height);
        grid
    }

    /// Grid ID
    pub fn id(&self) -> GridId {
        self.id
    }

    /// Width in cells
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Layout mode of the backing store
    pub fn render_mode(&self) -> RenderMode {
        self.provider.render_mode()
    }

    /// Backing store
    pub fn provider(&self) -> &dyn GridProvider {
        self.provider.as_ref()
    }

    /// Mutable backing store. Call [`Grid::rebuild`] after changing it directly.
    pub fn provider_mut(&mut self) -> &mut dyn GridProvider {
        self.provider.as_mut()
    }

    /// Tear the grid down and hand the store back
    pub fn into_provider(self) -> Box<dyn GridProvider> {
        self.provider
    }

    // ========== Listeners ==========

    /// Register a lifecycle listener
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&GridEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(handler)
    }

    /// Remove a lifecycle listener
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn emit(&self, event: GridEvent) {
        self.listeners.emit(&event);
    }

    // ========== Queries ==========

    /// Number of items
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// True if the grid holds no items
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// True if the item is stored in this grid
    pub fn contains(&self, id: ItemId) -> bool {
        self.snapshot.iter().any(|f| f.id == id)
    }

    /// Look up a stored item
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        if !self.contains(id) {
            return None;
        }
        self.provider.find(id)
    }

    /// All stored items in store order
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.snapshot.iter().filter_map(|f| self.provider.find(f.id))
    }

    /// Item covering the given grid point
    pub fn item_at_point(&self, point: Point) -> Option<&Item> {
        self.id_at_point(point).and_then(|id| self.provider.find(id))
    }

    fn id_at_point(&self, point: Point) -> Option<ItemId> {
        // A filled single slot answers for every coordinate
        if self.render_mode() == RenderMode::Single && self.is_store_full() {
            return self.snapshot.first().map(|f| f.id);
        }
        self.snapshot.iter().find(|f| f.contains(point)).map(|f| f.id)
    }

    /// Distinct items covering any cell of the rectangle
    pub fn items_in_rect(&self, origin: Point, width: u32, height: u32) -> Vec<&Item> {
        let mut ids: Vec<ItemId> = Vec::new();
        for x in 0..width as i32 {
            for y in 0..height as i32 {
                if let Some(id) = self.id_at_point(origin + Point::new(x, y)) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids.into_iter().filter_map(|id| self.provider.find(id)).collect()
    }

    fn is_store_full(&self) -> bool {
        self.provider.is_full()
            || (self.render_mode() == RenderMode::Single && self.provider.item_count() >= 1)
    }

    /// True if nothing more can be added: the store is full, or (grid mode)
    /// every cell is covered.
    pub fn is_full(&self) -> bool {
        if self.is_store_full() {
            return true;
        }
        if self.render_mode() == RenderMode::Single {
            return false;
        }

        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                if self.id_at_point(Point::new(x, y)).is_none() {
                    return false;
                }
            }
        }
        true
    }

    fn within_bounds(&self, shape: &Shape, at: Point) -> bool {
        at.x >= 0
            && at.y >= 0
            && at.x as i64 + shape.width() as i64 <= self.width as i64
            && at.y as i64 + shape.height() as i64 <= self.height as i64
    }

    /// True if the item is no larger than the grid
    fn fits_extent(&self, item: &Item) -> bool {
        item.width() <= self.width && item.height() <= self.height
    }

    fn center_position(&self, item: &Item) -> Point {
        Point::new(
            (self.width as i32 - item.width() as i32) / 2,
            (self.height as i32 - item.height() as i32) / 2,
        )
    }

    // ========== Placement ==========

    /// Explain why `item` could not go to `point`.
    ///
    /// The item is evaluated at the hypothetical position, it is never moved.
    pub fn check_place_at(&self, item: &Item, point: Point) -> Result<(), PlaceError> {
        if !self.provider.can_admit(item) {
            return Err(PlaceError::NotAdmitted);
        }
        if self.is_store_full() {
            return Err(PlaceError::Full);
        }
        if self.render_mode() == RenderMode::Single {
            return Ok(());
        }
        if !self.within_bounds(item.shape(), point) {
            return Err(PlaceError::OutOfBounds);
        }

        let shape = item.shape();
        let overlaps = self
            .snapshot
            .iter()
            .filter(|f| f.id != item.id())
            .any(|f| shape.overlaps(&f.shape, f.position - point));
        if overlaps {
            return Err(PlaceError::Overlap);
        }
        Ok(())
    }

    /// True if `item` could be placed with its top-left at `point`
    pub fn can_place_at(&self, item: &Item, point: Point) -> bool {
        self.check_place_at(item, point).is_ok()
    }

    /// Place `item` at `point` (centered in single mode).
    ///
    /// On failure the item is handed back unchanged inside [`Rejected`] and
    /// an `ItemAddFailed` notification fires.
    pub fn place_at(&mut self, mut item: Item, point: Point) -> Result<ItemId, Rejected> {
        if let Err(reason) = self.check_place_at(&item, point) {
            return Err(self.reject(item, reason));
        }

        let previous = item.position();
        let target = match self.render_mode() {
            RenderMode::Single => self.center_position(&item),
            RenderMode::Grid => point,
        };
        item.set_position(target);
        let item_ref = item.item_ref();

        if let Err(mut item) = self.provider.add(item) {
            item.set_position(previous);
            return Err(self.reject(item, PlaceError::AlreadyPresent));
        }

        self.rebuild_snapshot(true);
        log::debug!(
            "Placed {} '{}' at {} in {}",
            item_ref.id,
            item_ref.name(),
            target,
            self.id
        );
        let id = item_ref.id;
        self.emit(GridEvent::ItemAdded(item_ref));
        Ok(id)
    }

    fn reject(&self, item: Item, reason: PlaceError) -> Rejected {
        log::debug!("Cannot place {} '{}' in {}: {}", item.id(), item.name(), self.id, reason);
        self.emit(GridEvent::ItemAddFailed(item.item_ref()));
        Rejected::new(item, reason)
    }

    /// First free point for `item`, scanning x-major then y
    fn first_fit(&self, item: &Item) -> Result<Point, PlaceError> {
        if !self.fits_extent(item) {
            return Err(PlaceError::TooLarge);
        }
        if !self.provider.can_admit(item) {
            return Err(PlaceError::NotAdmitted);
        }
        if self.is_store_full() {
            return Err(PlaceError::Full);
        }

        let max_x = (self.width - item.width()) as i32;
        let max_y = (self.height - item.height()) as i32;
        for x in 0..=max_x {
            for y in 0..=max_y {
                let point = Point::new(x, y);
                if self.can_place_at(item, point) {
                    return Ok(point);
                }
            }
        }
        Err(PlaceError::NoSpace)
    }

    /// True if `item` is not stored here and a free point exists for it
    pub fn can_place(&self, item: &Item) -> bool {
        !self.contains(item.id()) && self.first_fit(item).is_ok()
    }

    /// Place `item` at the first free point
    pub fn place(&mut self, item: Item) -> Result<ItemId, Rejected> {
        if self.contains(item.id()) {
            return Err(self.reject(item, PlaceError::AlreadyPresent));
        }
        match self.first_fit(&item) {
            Ok(point) => self.place_at(item, point),
            Err(reason) => Err(self.reject(item, reason)),
        }
    }

    /// True if `item` could replace the occupant of this single slot
    pub fn can_swap(&self, item: &Item) -> bool {
        self.render_mode() == RenderMode::Single
            && self.fits_extent(item)
            && self.provider.can_admit(item)
    }

    /// Put an item back where it was. Listeners only see a `Rebuilt`
    pub(crate) fn reinstate(&mut self, mut item: Item, at: Point) -> Result<(), Item> {
        if !self.can_place_at(&item, at) {
            return Err(item);
        }
        let previous = item.position();
        if self.render_mode() == RenderMode::Grid {
            item.set_position(at);
        }
        if let Err(mut item) = self.provider.add(item) {
            item.set_position(previous);
            return Err(item);
        }
        self.rebuild_snapshot(false);
        Ok(())
    }

    // ========== Removal ==========

    /// True if the item is stored here and the store allows removing it
    pub fn can_remove(&self, id: ItemId) -> bool {
        self.item(id)
            .map(|item| self.provider.can_remove(item))
            .unwrap_or(false)
    }

    /// Take an item out of the grid
    pub fn remove(&mut self, id: ItemId) -> Result<Item, RemoveError> {
        let item = self.item(id).ok_or(RemoveError::NotFound)?;
        if !self.provider.can_remove(item) {
            log::debug!("Removal of {} refused by store of {}", id, self.id);
            return Err(RemoveError::Refused);
        }

        let item = self.provider.remove(id).ok_or(RemoveError::NotFound)?;
        self.rebuild_snapshot(true);
        self.emit(GridEvent::ItemRemoved(item.item_ref()));
        Ok(item)
    }

    /// Remove every item the store allows removing, discarding them.
    /// Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let ids: Vec<ItemId> = self.snapshot.iter().map(|f| f.id).collect();
        ids.into_iter().filter(|&id| self.remove(id).is_ok()).count()
    }

    // ========== Ground drops ==========

    /// True if the item is stored here and may be dropped on the ground
    pub fn can_drop(&self, id: ItemId) -> bool {
        self.item(id)
            .map(|item| item.can_drop() && self.provider.can_drop(item))
            .unwrap_or(false)
    }

    /// Take an item out of the grid to place it on the ground
    pub fn drop_item(&mut self, id: ItemId) -> Result<Item, DropError> {
        let item = self.item(id).ok_or(DropError::NotFound)?;
        let refusal = if !item.can_drop() {
            Some(DropError::NotDroppable)
        } else if !self.provider.can_drop(item) {
            Some(DropError::Refused)
        } else {
            None
        };

        if let Some(error) = refusal {
            log::warn!("Cannot drop {} '{}' from {}: {}", id, item.name(), self.id, error);
            self.emit(GridEvent::ItemDropFailed(item.item_ref()));
            return Err(error);
        }

        let item = self.provider.drop_item(id).ok_or(DropError::NotFound)?;
        self.rebuild_snapshot(true);
        log::debug!("Dropped {} '{}' from {}", id, item.name(), self.id);
        self.emit(GridEvent::ItemDropped(item.item_ref()));
        Ok(item)
    }

    /// Notify a ground drop for an item that already left the grid.
    ///
    /// Fails (with `ItemDropFailed`) if the item may not be dropped.
    pub fn force_drop(&self, item: &Item) -> bool {
        if !item.can_drop() || !self.provider.can_drop(item) {
            self.emit(GridEvent::ItemDropFailed(item.item_ref()));
            return false;
        }
        self.emit(GridEvent::ItemDropped(item.item_ref()));
        true
    }

    /// Drop every item, each under its own policy. Returns the dropped items.
    pub fn drop_all(&mut self) -> Vec<Item> {
        let ids: Vec<ItemId> = self.snapshot.iter().map(|f| f.id).collect();
        ids.into_iter().filter_map(|id| self.drop_item(id).ok()).collect()
    }

    /// Set an item's drop permission. Returns false if the item is not here.
    pub fn set_can_drop(&mut self, id: ItemId, can_drop: bool) -> bool {
        if !self.contains(id) {
            return false;
        }
        match self.provider.position_of(id).and_then(|i| self.provider.item_mut(i)) {
            Some(item) => {
                item.set_can_drop(can_drop);
                true
            }
            None => false,
        }
    }

    // ========== Extent ==========

    /// Change the extent, evicting every item that no longer fits.
    ///
    /// Evicted items are dropped; an item whose drop is refused is removed
    /// anyway. Single-slot occupants are re-centered first, so they stay
    /// only if they still fit the new extent.
    pub fn resize(&mut self, width: u32, height: u32) -> Vec<Item> {
        self.width = width;
        self.height = height;

        if self.render_mode() == RenderMode::Single {
            for index in 0..self.provider.item_count() {
                if let Some(item) = self.provider.item_mut(index) {
                    let centered = Point::new(
                        (width as i32 - item.width() as i32) / 2,
                        (height as i32 - item.height() as i32) / 2,
                    );
                    item.set_position(centered);
                }
            }
            self.rebuild_snapshot(true);
        }

        let offending: Vec<ItemId> = self
            .snapshot
            .iter()
            .filter(|f| !self.within_bounds(&f.shape, f.position))
            .map(|f| f.id)
            .collect();

        let mut evicted = Vec::new();
        for id in offending {
            match self.drop_item(id) {
                Ok(item) => evicted.push(item),
                Err(DropError::NotFound) => {}
                Err(_) => {
                    if let Some(item) = self.provider.remove(id) {
                        self.rebuild_snapshot(true);
                        log::warn!("Evicted undroppable {} '{}' from {}", id, item.name(), self.id);
                        self.emit(GridEvent::ItemRemoved(item.item_ref()));
                        evicted.push(item);
                    }
                }
            }
        }

        log::debug!("Resized {} to {}x{}, evicted {}", self.id, width, height, evicted.len());
        self.emit(GridEvent::Resized { width, height });
        evicted
    }

    /// Re-read the item snapshot from the store and notify listeners
    pub fn rebuild(&mut self) {
        self.rebuild_snapshot(false);
    }

    fn rebuild_snapshot(&mut self, silent: bool) {
        self.snapshot = (0..self.provider.item_count())
            .filter_map(|i| self.provider.item(i))
            .map(Footprint::of)
            .collect();
        if !silent {
            self.emit(GridEvent::Rebuilt);
        }
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("render_mode", &self.render_mode())
            .field("items", &self.snapshot.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemCategory, ItemDefinition};
    use crate::provider::ItemStore;
    use parking_lot::Mutex;

    fn def(w: u32, h: u32) -> Arc<ItemDefinition> {
        Arc::new(ItemDefinition::new("box", "Box", Shape::rect(w, h).unwrap()))
    }

    fn shaped(rows: &[&str]) -> Arc<ItemDefinition> {
        Arc::new(ItemDefinition::new("piece", "Piece", Shape::from_rows(rows).unwrap()))
    }

    fn grid(w: u32, h: u32) -> Grid {
        Grid::new(ItemStore::new(RenderMode::Grid), w, h)
    }

    fn record(grid: &mut Grid) -> Arc<Mutex<Vec<GridEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        grid.subscribe(move |e| sink.lock().push(e.clone()));
        events
    }

    #[test]
    fn test_first_fit_is_x_major() {
        let mut g = grid(4, 4);
        let d = def(2, 2);

        let a = g.place(d.instantiate()).unwrap();
        let b = g.place(d.instantiate()).unwrap();
        let c = g.place(d.instantiate()).unwrap();

        assert_eq!(g.item(a).unwrap().position(), Point::new(0, 0));
        assert_eq!(g.item(b).unwrap().position(), Point::new(0, 2));
        assert_eq!(g.item(c).unwrap().position(), Point::new(2, 0));
    }

    #[test]
    fn test_place_at_commits_position() {
        let mut g = grid(4, 4);
        let id = g.place_at(def(1, 2).instantiate(), Point::new(3, 2)).unwrap();

        assert_eq!(g.item(id).unwrap().position(), Point::new(3, 2));
        assert_eq!(g.item_at_point(Point::new(3, 3)).map(|i| i.id()), Some(id));
        assert!(g.item_at_point(Point::new(2, 3)).is_none());
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut g = grid(4, 4);
        let item = def(2, 2).instantiate();

        assert_eq!(g.check_place_at(&item, Point::new(3, 0)), Err(PlaceError::OutOfBounds));
        assert_eq!(g.check_place_at(&item, Point::new(-1, 0)), Err(PlaceError::OutOfBounds));

        let rejected = g.place_at(item, Point::new(0, 3)).unwrap_err();
        assert_eq!(rejected.reason, PlaceError::OutOfBounds);
        assert_eq!(rejected.item.position(), Point::ZERO);
        assert!(g.is_empty());
    }

    #[test]
    fn test_overlap_rejected() {
        let mut g = grid(4, 4);
        g.place_at(def(2, 2).instantiate(), Point::new(1, 1)).unwrap();

        let item = def(2, 2).instantiate();
        assert_eq!(g.check_place_at(&item, Point::new(2, 2)), Err(PlaceError::Overlap));
        assert!(!g.can_place_at(&item, Point::new(3, 3)));
        assert!(g.can_place_at(&def(1, 1).instantiate(), Point::new(3, 3)));
    }

    #[test]
    fn test_check_does_not_move_item() {
        let g = grid(4, 4);
        let mut item = def(1, 1).instantiate();
        item.set_position(Point::new(7, 7));

        assert!(g.can_place_at(&item, Point::new(0, 0)));
        assert!(!g.can_place_at(&item, Point::new(9, 9)));
        assert_eq!(item.position(), Point::new(7, 7));
    }

    #[test]
    fn test_irregular_shapes_interlock() {
        let mut g = grid(2, 2);
        let l = g.place_at(shaped(&["#.", "##"]).instantiate(), Point::new(0, 0)).unwrap();
        let dot = g.place(shaped(&["#"]).instantiate()).unwrap();

        assert_eq!(g.item(dot).unwrap().position(), Point::new(1, 0));
        assert_eq!(g.item_at_point(Point::new(1, 1)).map(|i| i.id()), Some(l));
        assert!(g.is_full());
    }

    #[test]
    fn test_place_rejects_too_large() {
        let mut g = grid(2, 2);
        let rejected = g.place(def(3, 1).instantiate()).unwrap_err();

        assert_eq!(rejected.reason, PlaceError::TooLarge);
        assert!(!g.can_place(&rejected.item));
    }

    #[test]
    fn test_place_no_space() {
        let mut g = grid(2, 2);
        g.place(def(2, 2).instantiate()).unwrap();

        let rejected = g.place(def(1, 1).instantiate()).unwrap_err();
        assert_eq!(rejected.reason, PlaceError::NoSpace);
    }

    #[test]
    fn test_capacity_and_filter() {
        let store = ItemStore::new(RenderMode::Grid)
            .with_capacity(1)
            .with_allowed(ItemCategory::Weapon);
        let mut g = Grid::new(store, 4, 4);
        let sword = Arc::new(
            ItemDefinition::new("sword", "Sword", Shape::rect(1, 2).unwrap())
                .with_category(ItemCategory::Weapon),
        );

        let rejected = g.place(def(1, 1).instantiate()).unwrap_err();
        assert_eq!(rejected.reason, PlaceError::NotAdmitted);

        g.place(sword.instantiate()).unwrap();
        let rejected = g.place(sword.instantiate()).unwrap_err();
        assert_eq!(rejected.reason, PlaceError::Full);
        assert!(g.is_full());
    }

    #[test]
    fn test_single_mode_centers_and_fills() {
        let mut g = Grid::new(ItemStore::single(), 3, 3);
        let id = g.place_at(def(1, 1).instantiate(), Point::new(0, 0)).unwrap();

        assert_eq!(g.item(id).unwrap().position(), Point::new(1, 1));
        // Any coordinate resolves to the occupant
        assert_eq!(g.item_at_point(Point::new(-5, 40)).map(|i| i.id()), Some(id));
        assert!(g.is_full());

        let rejected = g.place_at(def(1, 1).instantiate(), Point::new(1, 1)).unwrap_err();
        assert_eq!(rejected.reason, PlaceError::Full);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_single_mode_without_capacity_holds_one() {
        let mut g = Grid::new(ItemStore::new(RenderMode::Single), 2, 2);
        g.place(def(1, 1).instantiate()).unwrap();

        assert!(g.place(def(1, 1).instantiate()).is_err());
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_can_swap() {
        let slot = Grid::new(ItemStore::single(), 2, 2);
        let bag = grid(4, 4);

        assert!(slot.can_swap(&def(2, 2).instantiate()));
        assert!(!slot.can_swap(&def(3, 1).instantiate()));
        assert!(!bag.can_swap(&def(1, 1).instantiate()));
    }

    #[test]
    fn test_remove() {
        let mut g = grid(4, 4);
        let events = record(&mut g);
        let id = g.place(def(1, 1).instantiate()).unwrap();

        let item = g.remove(id).unwrap();
        assert_eq!(item.id(), id);
        assert!(g.is_empty());
        assert_eq!(g.remove(id).unwrap_err(), RemoveError::NotFound);

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GridEvent::ItemAdded(_)));
        assert!(matches!(events[1], GridEvent::ItemRemoved(_)));
    }

    #[test]
    fn test_drop_respects_item_flag() {
        let mut g = grid(4, 4);
        let events = record(&mut g);
        let id = g.place(def(1, 1).instantiate()).unwrap();
        assert!(g.set_can_drop(id, false));

        assert!(!g.can_drop(id));
        assert_eq!(g.drop_item(id).unwrap_err(), DropError::NotDroppable);
        assert!(g.contains(id));
        assert!(matches!(events.lock().last(), Some(GridEvent::ItemDropFailed(_))));

        g.set_can_drop(id, true);
        assert_eq!(g.drop_item(id).unwrap().id(), id);
        assert!(matches!(events.lock().last(), Some(GridEvent::ItemDropped(_))));
    }

    #[test]
    fn test_resize_evicts_all_offenders() {
        let mut g = grid(4, 4);
        let events = record(&mut g);
        let d = def(1, 1);
        let keep = g.place_at(d.instantiate(), Point::new(0, 0)).unwrap();
        let a = g.place_at(d.instantiate(), Point::new(3, 0)).unwrap();
        let b = g.place_at(d.instantiate(), Point::new(0, 3)).unwrap();

        let evicted = g.resize(3, 3);

        let mut ids: Vec<_> = evicted.iter().map(|i| i.id()).collect();
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
        assert!(g.contains(keep));
        assert_eq!(g.len(), 1);
        assert!(matches!(
            events.lock().last(),
            Some(GridEvent::Resized { width: 3, height: 3 })
        ));
    }

    #[test]
    fn test_resize_evicts_undroppable() {
        let mut g = grid(4, 4);
        let id = g.place_at(def(1, 1).instantiate(), Point::new(3, 3)).unwrap();
        g.set_can_drop(id, false);

        let evicted = g.resize(2, 2);
        assert_eq!(evicted.len(), 1);
        assert!(g.is_empty());
    }

    #[test]
    fn test_resize_evicts_oversized_single_occupant() {
        let mut g = Grid::new(ItemStore::single(), 2, 3);
        let id = g.place(def(2, 3).instantiate()).unwrap();
        let events = record(&mut g);

        let evicted = g.resize(1, 1);

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id(), id);
        assert!(g.is_empty());
        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GridEvent::ItemDropped(ref r) if r.id == id));
        assert!(matches!(events[1], GridEvent::Resized { width: 1, height: 1 }));
    }

    #[test]
    fn test_resize_recenters_single_occupant_that_fits() {
        let mut g = Grid::new(ItemStore::single(), 4, 4);
        let id = g.place(def(2, 2).instantiate()).unwrap();
        assert_eq!(g.item(id).unwrap().position(), Point::new(1, 1));

        let evicted = g.resize(2, 3);

        assert!(evicted.is_empty());
        assert_eq!(g.item(id).unwrap().position(), Point::new(0, 0));
        assert_eq!(g.item_at_point(Point::new(7, 7)).map(|i| i.id()), Some(id));
    }

    #[test]
    fn test_reinstate_notifies_rebuilt() {
        let mut g = grid(3, 3);
        let id = g.place_at(def(1, 1).instantiate(), Point::new(1, 1)).unwrap();
        let item = g.remove(id).unwrap();
        let events = record(&mut g);

        assert!(g.reinstate(item, Point::new(1, 1)).is_ok());

        assert_eq!(g.item(id).unwrap().position(), Point::new(1, 1));
        assert!(matches!(events.lock().as_slice(), [GridEvent::Rebuilt]));
    }

    #[test]
    fn test_new_evicts_preloaded_out_of_bounds() {
        let mut store = ItemStore::new(RenderMode::Grid);
        let mut item = def(2, 2).instantiate();
        item.set_position(Point::new(5, 5));
        store.add(item).unwrap();

        let g = Grid::new(store, 4, 4);
        assert!(g.is_empty());
    }

    #[test]
    fn test_items_in_rect() {
        let mut g = grid(4, 4);
        let a = g.place_at(def(2, 2).instantiate(), Point::new(0, 0)).unwrap();
        let b = g.place_at(def(1, 1).instantiate(), Point::new(3, 3)).unwrap();

        let hits: Vec<_> = g.items_in_rect(Point::new(1, 1), 2, 2).iter().map(|i| i.id()).collect();
        assert_eq!(hits, vec![a]);

        let hits: Vec<_> = g.items_in_rect(Point::new(0, 0), 4, 4).iter().map(|i| i.id()).collect();
        assert_eq!(hits, vec![a, b]);
    }

    #[test]
    fn test_is_full_by_coverage() {
        let mut g = grid(2, 1);
        g.place(def(1, 1).instantiate()).unwrap();
        assert!(!g.is_full());
        g.place(def(1, 1).instantiate()).unwrap();
        assert!(g.is_full());
    }

    #[test]
    fn test_clear_and_drop_all() {
        let mut g = grid(4, 4);
        let d = def(1, 1);
        g.place(d.instantiate()).unwrap();
        g.place(d.instantiate()).unwrap();
        assert_eq!(g.clear(), 2);
        assert!(g.is_empty());

        g.place(d.instantiate()).unwrap();
        let stuck = g.place(d.instantiate()).unwrap();
        g.set_can_drop(stuck, false);

        let dropped = g.drop_all();
        assert_eq!(dropped.len(), 1);
        assert!(g.contains(stuck));
    }

    #[test]
    fn test_rebuild_notifies() {
        let mut g = grid(2, 2);
        let events = record(&mut g);

        g.rebuild();
        assert!(matches!(events.lock().as_slice(), [GridEvent::Rebuilt]));
    }

    #[test]
    fn test_force_drop() {
        let mut g = grid(2, 2);
        let events = record(&mut g);
        let mut item = def(1, 1).instantiate();

        assert!(g.force_drop(&item));
        item.set_can_drop(false);
        assert!(!g.force_drop(&item));

        let events = events.lock();
        assert!(matches!(events[0], GridEvent::ItemDropped(_)));
        assert!(matches!(events[1], GridEvent::ItemDropFailed(_)));
    }

    #[test]
    fn test_into_provider() {
        let mut g = grid(2, 2);
        g.place(def(1, 1).instantiate()).unwrap();

        let provider = g.into_provider();
        assert_eq!(provider.item_count(), 1);
    }
}
