use std::collections::HashSet;
use std::fmt;
use std::slice;

use errors::*;

/// `CellId` is the stable identifier of a grid cell.
///
/// Grid files may carry either string or integer ids; both are normalised to their string form.
/// Ordering is lexical on that string form.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CellId(String);

impl CellId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        CellId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> From<&'a str> for CellId {
    fn from(id: &'a str) -> Self {
        CellId::new(id)
    }
}

/// A `Point` in the canonical (x, y) = (longitude, latitude) order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// A `Cell` is an axis-aligned rectangle. Both bounds are inclusive on each axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Cell {
    pub fn new<I: Into<CellId>>(id: I, xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Cell {
            id: id.into(),
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.xmin && point.x <= self.xmax && point.y >= self.ymin &&
            point.y <= self.ymax
    }
}

/// `CellIndex` holds the grid in the order it was loaded and answers point lookups.
///
/// When boxes overlap or share an edge, the cell loaded first wins. The index is never mutated
/// after construction.
#[derive(Clone, Debug)]
pub struct CellIndex {
    cells: Vec<Cell>,
}

impl CellIndex {
    /// Builds an index from an ordered, non-empty list of cells with distinct ids.
    pub fn new(cells: Vec<Cell>) -> Result<Self> {
        if cells.is_empty() {
            return Err(ErrorKind::InvalidGrid("no cells defined".to_owned()).into());
        }

        let mut seen = HashSet::new();
        for cell in &cells {
            if !seen.insert(cell.id.clone()) {
                return Err(
                    ErrorKind::InvalidGrid(format!("duplicate cell id {}", cell.id)).into(),
                );
            }
        }

        Ok(CellIndex { cells })
    }

    /// Returns the id of the first cell containing `point`, if any.
    pub fn locate(&self, point: &Point) -> Option<&CellId> {
        self.cells
            .iter()
            .find(|cell| cell.contains(point))
            .map(|cell| &cell.id)
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Cell ids in load order.
    pub fn cell_ids(&self) -> Vec<CellId> {
        self.cells.iter().map(|cell| cell.id.clone()).collect()
    }

    pub fn iter(&self) -> slice::Iter<Cell> {
        self.cells.iter()
    }
}
