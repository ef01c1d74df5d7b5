//! Grid coordinates and item footprints

use crate::error::ShapeError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Integer grid coordinate (x grows right, y grows down)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Origin of every grid
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Immutable occupancy mask of an item.
///
/// Cells are addressed in local space `[0, width) x [0, height)` and packed
/// row-major into 64-bit words. Shapes are shared between item instances
/// through `Arc<Shape>` and never change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    width: u32,
    height: u32,
    bits: Vec<u64>,
}

impl Shape {
    const BITS_PER_WORD: usize = 64;

    /// Fully occupied rectangle
    pub fn rect(width: u32, height: u32) -> Result<Self, ShapeError> {
        let mut shape = Self::empty(width, height)?;
        for index in 0..shape.cell_count() {
            shape.set(index);
        }
        Ok(shape)
    }

    /// Build from a row-major occupancy mask
    pub fn from_mask(width: u32, height: u32, mask: &[bool]) -> Result<Self, ShapeError> {
        let mut shape = Self::empty(width, height)?;
        if mask.len() != shape.cell_count() {
            return Err(ShapeError::MaskLength {
                expected: shape.cell_count(),
                found: mask.len(),
            });
        }
        for (index, _) in mask.iter().enumerate().filter(|(_, occupied)| **occupied) {
            shape.set(index);
        }
        shape.ensure_occupied()?;
        Ok(shape)
    }

    /// Build from text rows, `#` or `X` marking occupied cells and `.` empty ones.
    ///
    /// ```
    /// use void_slotgrid::Shape;
    ///
    /// let corner = Shape::from_rows(&["##", "#."]).unwrap();
    /// assert_eq!(corner.occupied_count(), 3);
    /// ```
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, ShapeError> {
        let width = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        let mut mask = Vec::with_capacity(width * rows.len());

        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(ShapeError::RaggedRow {
                    row: row_index,
                    expected: width,
                    found,
                });
            }
            for cell in row.chars() {
                match cell {
                    '#' | 'X' | 'x' => mask.push(true),
                    '.' | ' ' => mask.push(false),
                    other => return Err(ShapeError::InvalidCell(other)),
                }
            }
        }

        Self::from_mask(width as u32, rows.len() as u32, &mask)
    }

    fn empty(width: u32, height: u32) -> Result<Self, ShapeError> {
        if width == 0 || height == 0 {
            return Err(ShapeError::ZeroExtent { width, height });
        }
        let cells = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            bits: vec![0; (cells + Self::BITS_PER_WORD - 1) / Self::BITS_PER_WORD],
        })
    }

    fn ensure_occupied(&self) -> Result<(), ShapeError> {
        if self.bits.iter().all(|&w| w == 0) {
            return Err(ShapeError::Unoccupied);
        }
        Ok(())
    }

    #[inline]
    fn set(&mut self, index: usize) {
        self.bits[index / Self::BITS_PER_WORD] |= 1u64 << (index % Self::BITS_PER_WORD);
    }

    #[inline]
    fn get(&self, index: usize) -> bool {
        self.bits[index / Self::BITS_PER_WORD] & (1u64 << (index % Self::BITS_PER_WORD)) != 0
    }

    fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width in cells
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True if every cell of the bounding box is occupied
    pub fn is_rect(&self) -> bool {
        self.occupied_count() == self.cell_count()
    }

    /// True if `local` lies inside the bounding box and is occupied
    pub fn contains(&self, local: Point) -> bool {
        if local.x < 0 || local.y < 0 {
            return false;
        }
        let (x, y) = (local.x as u32, local.y as u32);
        if x >= self.width || y >= self.height {
            return false;
        }
        self.get(y as usize * self.width as usize + x as usize)
    }

    /// Iterate occupied cells in local space, row-major
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        let width = self.width as usize;
        (0..self.cell_count())
            .filter(move |&index| self.get(index))
            .map(move |index| Point::new((index % width) as i32, (index / width) as i32))
    }

    /// True if any occupied cell of `self` coincides with an occupied cell of
    /// `other` when `other`'s origin sits at `offset` in `self`'s local space.
    pub fn overlaps(&self, other: &Shape, offset: Point) -> bool {
        let x0 = offset.x.max(0);
        let y0 = offset.y.max(0);
        let x1 = (offset.x + other.width as i32).min(self.width as i32);
        let y1 = (offset.y + other.height as i32).min(self.height as i32);

        // Bounding boxes do not intersect
        if x0 >= x1 || y0 >= y1 {
            return false;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                let local = Point::new(x, y);
                if self.contains(local) && other.contains(local - offset) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let shape = Shape::rect(2, 3).unwrap();

        assert!(shape.is_rect());
        assert_eq!(shape.occupied_count(), 6);
        assert!(shape.contains(Point::new(1, 2)));
        assert!(!shape.contains(Point::new(2, 0)));
        assert!(!shape.contains(Point::new(0, -1)));
    }

    #[test]
    fn test_zero_extent_rejected() {
        assert_eq!(
            Shape::rect(0, 2),
            Err(ShapeError::ZeroExtent { width: 0, height: 2 })
        );
    }

    #[test]
    fn test_from_rows() {
        let shape = Shape::from_rows(&["##.", ".##"]).unwrap();

        assert_eq!(shape.width(), 3);
        assert_eq!(shape.height(), 2);
        assert!(!shape.is_rect());
        assert!(shape.contains(Point::new(0, 0)));
        assert!(!shape.contains(Point::new(2, 0)));
        assert!(!shape.contains(Point::new(0, 1)));
        assert!(shape.contains(Point::new(2, 1)));
    }

    #[test]
    fn test_from_rows_errors() {
        assert_eq!(
            Shape::from_rows(&["##", "#"]),
            Err(ShapeError::RaggedRow { row: 1, expected: 2, found: 1 })
        );
        assert_eq!(Shape::from_rows(&["#?"]), Err(ShapeError::InvalidCell('?')));
        assert_eq!(Shape::from_rows(&["..", ".."]), Err(ShapeError::Unoccupied));
        assert!(Shape::from_rows::<&str>(&[]).is_err());
    }

    #[test]
    fn test_mask_length_checked() {
        assert_eq!(
            Shape::from_mask(2, 2, &[true, false, true]),
            Err(ShapeError::MaskLength { expected: 4, found: 3 })
        );
    }

    #[test]
    fn test_cells_iteration() {
        let shape = Shape::from_rows(&["#.", "##"]).unwrap();
        let cells: Vec<_> = shape.cells().collect();

        assert_eq!(cells, vec![Point::new(0, 0), Point::new(0, 1), Point::new(1, 1)]);
    }

    #[test]
    fn test_rect_overlap() {
        let a = Shape::rect(2, 2).unwrap();
        let b = Shape::rect(2, 2).unwrap();

        assert!(a.overlaps(&b, Point::new(1, 1)));
        assert!(a.overlaps(&b, Point::new(-1, 0)));
        assert!(!a.overlaps(&b, Point::new(2, 0)));
        assert!(!a.overlaps(&b, Point::new(0, -2)));
    }

    #[test]
    fn test_irregular_shapes_interlock() {
        // An L and its complement share a bounding box but no cells
        let l = Shape::from_rows(&["#.", "##"]).unwrap();
        let dot = Shape::from_rows(&["#"]).unwrap();

        assert!(!l.overlaps(&dot, Point::new(1, 0)));
        assert!(l.overlaps(&dot, Point::new(1, 1)));
        // Symmetric when viewed from the other side
        assert!(!dot.overlaps(&l, Point::new(-1, 0)));
    }

    #[test]
    fn test_large_shape_spans_words() {
        let shape = Shape::rect(10, 10).unwrap();

        assert_eq!(shape.occupied_count(), 100);
        assert!(shape.contains(Point::new(9, 9)));
    }

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(3, 4);
        let b = Point::from((1, 5));

        assert_eq!(a + b, Point::new(4, 9));
        assert_eq!(a - b, Point::new(2, -1));
        assert_eq!(a.to_string(), "(3, 4)");
    }
}
