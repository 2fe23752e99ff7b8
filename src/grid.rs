// The play area: a row-major buffer of packed cells plus the list of cell indices
// that changed since the last render flush.
//
// Every coordinate access is bounds-checked. Reads outside the board return
// Cell::OUT_OF_BOUNDS, writes outside the board do nothing.

use log::warn;

use crate::types::{Cell, Coord};

#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    background: Cell,
    dirty: Vec<usize>,
}

impl Grid {
    /// Creates a fully cleared grid. Flags on `background` are discarded.
    pub fn new(width: u32, height: u32, background: Cell) -> Self {
        let width = width.min(i32::MAX as u32) as i32;
        let height = height.min(i32::MAX as u32) as i32;
        let background = background.without_flags();

        Grid {
            width,
            height,
            cells: vec![background; width as usize * height as usize],
            background,
            dirty: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn background(&self) -> Cell {
        self.background
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Row-major index of (x, y), or None outside the board
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn coord_of(&self, index: usize) -> Option<Coord> {
        if index >= self.cells.len() {
            return None;
        }
        let width = self.width as usize;
        Some(Coord::new((index % width) as i32, (index / width) as i32))
    }

    fn mark_changed(&mut self, index: usize) {
        self.dirty.push(index);
    }

    /// Writes `cell` at (x, y) without recording it as dirty.
    /// Returns the index written, if any.
    pub fn set_untracked(&mut self, x: i32, y: i32, cell: Cell) -> Option<usize> {
        if cell.is_out_of_bounds() {
            warn!("Refusing to store the out-of-bounds sentinel at ({}, {})", x, y);
            return None;
        }
        let index = self.index_of(x, y)?;
        self.cells[index] = cell;
        Some(index)
    }

    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(index) = self.set_untracked(x, y, cell) {
            self.mark_changed(index);
        }
    }

    /// Resets (x, y) to the background colour with no flags, without marking it dirty
    pub fn clear_untracked(&mut self, x: i32, y: i32) -> Option<usize> {
        let index = self.index_of(x, y)?;
        self.cells[index] = self.background;
        Some(index)
    }

    pub fn clear(&mut self, x: i32, y: i32) {
        if let Some(index) = self.clear_untracked(x, y) {
            self.mark_changed(index);
        }
    }

    /// Zeroes the flags at (x, y) and keeps its colour, without marking it dirty
    pub fn clear_flags_only_untracked(&mut self, x: i32, y: i32) -> Option<usize> {
        let index = self.index_of(x, y)?;
        self.cells[index] = self.cells[index].without_flags();
        Some(index)
    }

    pub fn clear_flags_only(&mut self, x: i32, y: i32) {
        if let Some(index) = self.clear_flags_only_untracked(x, y) {
            self.mark_changed(index);
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Cell {
        match self.index_of(x, y) {
            Some(index) => self.cells[index],
            None => Cell::OUT_OF_BOUNDS,
        }
    }

    pub fn get_flags(&self, x: i32, y: i32) -> Cell {
        match self.index_of(x, y) {
            Some(index) => self.cells[index].flags_only(),
            None => Cell::OUT_OF_BOUNDS,
        }
    }

    pub fn get_color(&self, x: i32, y: i32) -> Cell {
        match self.index_of(x, y) {
            Some(index) => self.cells[index].without_flags(),
            None => Cell::OUT_OF_BOUNDS,
        }
    }

    pub fn get_at(&self, coord: Coord) -> Cell {
        self.get(coord.x, coord.y)
    }

    /// True when (x, y) holds a trail or lies outside the board
    pub fn is_blocked(&self, coord: Coord) -> bool {
        self.get_flags(coord.x, coord.y).is_occupied()
    }

    /// Empties every cell. Nothing is marked dirty: the caller is expected to
    /// follow up with a full redraw.
    pub fn clear_all(&mut self, preserve_color: bool) {
        let background = self.background;
        for cell in self.cells.iter_mut() {
            *cell = if preserve_color {
                cell.without_flags()
            } else {
                background
            };
        }
    }

    /// Indices changed since the last flush, in write order (duplicates kept)
    pub fn dirty(&self) -> &[usize] {
        &self.dirty
    }

    pub fn drain_dirty(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.dirty)
    }

    /// Number of occupied cells; used by snapshots and tests
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }
}
