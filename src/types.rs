// Core value types shared by the grid, players and engine
//
// A Cell packs occupancy flags and a 24-bit colour into one u32. Coordinates use
// screen orientation: (0, 0) is the top-left corner and "up" decreases y.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CELL_FLAGS_MASK: u32 = 0xff00_0000;
pub const CELL_RED_MASK: u32 = 0x00ff_0000;
pub const CELL_GREEN_MASK: u32 = 0x0000_ff00;
pub const CELL_BLUE_MASK: u32 = 0x0000_00ff;

/// One grid unit: 8 bits of flags followed by 8 bits each of red, green and blue
///
/// Non-zero flags mean the cell is occupied. An empty cell still carries a colour,
/// which is what gets painted for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub flags: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Cell {
    /// Returned by grid reads outside the board. Grids refuse to store it.
    pub const OUT_OF_BOUNDS: Cell = Cell {
        flags: 0xff,
        red: 0xff,
        green: 0xff,
        blue: 0xff,
    };

    pub const fn new(flags: u8, red: u8, green: u8, blue: u8) -> Self {
        Cell {
            flags,
            red,
            green,
            blue,
        }
    }

    /// An unoccupied cell of the given colour
    pub const fn with_color(red: u8, green: u8, blue: u8) -> Self {
        Cell::new(0, red, green, blue)
    }

    pub const fn pack(self) -> u32 {
        ((self.flags as u32) << 24)
            | ((self.red as u32) << 16)
            | ((self.green as u32) << 8)
            | (self.blue as u32)
    }

    pub const fn unpack(value: u32) -> Self {
        Cell {
            flags: ((value & CELL_FLAGS_MASK) >> 24) as u8,
            red: ((value & CELL_RED_MASK) >> 16) as u8,
            green: ((value & CELL_GREEN_MASK) >> 8) as u8,
            blue: (value & CELL_BLUE_MASK) as u8,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.flags != 0
    }

    pub fn is_out_of_bounds(&self) -> bool {
        *self == Cell::OUT_OF_BOUNDS
    }

    /// Same colour, flags zeroed
    pub fn without_flags(self) -> Self {
        Cell { flags: 0, ..self }
    }

    /// Same flags, colour zeroed
    pub fn flags_only(self) -> Self {
        Cell::new(self.flags, 0, 0, 0)
    }

    /// Colour channels scaled into [0, 1) the way the cairo-style renderers expect
    pub fn rgb_f32(&self) -> (f32, f32, f32) {
        (
            self.red as f32 / 256.0,
            self.green as f32 / 256.0,
            self.blue as f32 / 256.0,
        )
    }

    /// Colour as `#RRGGBB`
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::unpack(value)
    }
}

impl From<Cell> for u32 {
    fn from(cell: Cell) -> Self {
        cell.pack()
    }
}

/// 2D coordinate on the grid
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Coord {
        Coord {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four headings a player can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Result<Direction, String> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }

    /// Bit used for this direction inside a `DirectionMask`
    pub const fn bit(&self) -> u8 {
        match self {
            Direction::Up => DirectionMask::UP,
            Direction::Down => DirectionMask::DOWN,
            Direction::Left => DirectionMask::LEFT,
            Direction::Right => DirectionMask::RIGHT,
        }
    }

    /// Inverse of `bit`; anything but a single cardinal bit yields None
    pub fn from_bit(bit: u8) -> Option<Direction> {
        match bit {
            DirectionMask::UP => Some(Direction::Up),
            DirectionMask::DOWN => Some(Direction::Down),
            DirectionMask::LEFT => Some(Direction::Left),
            DirectionMask::RIGHT => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// The two headings at right angles, positive offset first:
    /// (Right, Left) for vertical travel, (Down, Up) for horizontal travel
    pub fn perpendiculars(&self) -> (Direction, Direction) {
        if self.is_vertical() {
            (Direction::Right, Direction::Left)
        } else {
            (Direction::Down, Direction::Up)
        }
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        match self {
            Direction::Up => coord.offset(0, -1),
            Direction::Down => coord.offset(0, 1),
            Direction::Left => coord.offset(-1, 0),
            Direction::Right => coord.offset(1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bit-encoded set of candidate headings
///
/// Only the four cardinal bits are kept; combinations such as `UP | LEFT` are
/// representable for a future diagonal mode but nothing produces them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirectionMask(u8);

impl DirectionMask {
    pub const NONE: u8 = 0;
    pub const UP: u8 = 1;
    pub const DOWN: u8 = 2;
    pub const LEFT: u8 = 4;
    pub const RIGHT: u8 = 8;
    const CARDINALS: u8 = Self::UP | Self::DOWN | Self::LEFT | Self::RIGHT;

    pub const fn new(bits: u8) -> Self {
        DirectionMask(bits & Self::CARDINALS)
    }

    pub const fn empty() -> Self {
        DirectionMask(Self::NONE)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn with(self, direction: Direction) -> Self {
        DirectionMask(self.0 | direction.bit())
    }
}

impl From<Direction> for DirectionMask {
    fn from(direction: Direction) -> Self {
        DirectionMask(direction.bit())
    }
}
