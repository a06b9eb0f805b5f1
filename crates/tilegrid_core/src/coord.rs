//! Grid coordinates and cardinal directions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::GridError;

/// A cell position on the unbounded grid.
///
/// Screen convention: +x is east, +y is south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring coordinate one step in `direction`, or `None` past
    /// the edge of the `i32` range.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.offset();
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// The cardinal neighbours in N, E, S, W order. Neighbours outside the
    /// `i32` range are absent.
    pub fn neighbors(self) -> impl Iterator<Item = Coord> {
        Direction::ALL.into_iter().filter_map(move |d| self.step(d))
    }

    /// This coordinate followed by its cardinal neighbours
    pub fn with_neighbors(self) -> impl Iterator<Item = Coord> {
        std::iter::once(self).chain(self.neighbors())
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Formats as the snapshot key `"x-y"`, e.g. `"3--4"` for `(3, -4)`
impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.x, self.y)
    }
}

impl FromStr for Coord {
    type Err = GridError;

    /// Parse the `"x-y"` snapshot key.
    ///
    /// The separator is the first `-` that follows a digit, so negative
    /// components on either side are unambiguous. Only the canonical form
    /// written by `Display` is accepted: `"+1-2"`, `"01-2"` and `"-0-0"` are
    /// rejected, so distinct keys never name the same coordinate.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GridError::InvalidCoordinateKey(s.to_string());
        let bytes = s.as_bytes();

        let split = (1..bytes.len())
            .find(|&i| bytes[i] == b'-' && bytes[i - 1].is_ascii_digit())
            .ok_or_else(invalid)?;

        let x = s[..split].parse::<i32>().map_err(|_| invalid())?;
        let y = s[split + 1..].parse::<i32>().map_err(|_| invalid())?;
        let coord = Self { x, y };
        if coord.to_string() != s {
            return Err(invalid());
        }
        Ok(coord)
    }
}

/// A cardinal direction. Diagonals never take part in autotiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    N,
    E,
    S,
    W,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::N, Direction::E, Direction::S, Direction::W];

    /// Bit for this direction in a neighbour mask: N=1, E=2, S=4, W=8
    pub const fn bit(self) -> u8 {
        match self {
            Direction::N => 0b0001,
            Direction::E => 0b0010,
            Direction::S => 0b0100,
            Direction::W => 0b1000,
        }
    }

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::N => (0, -1),
            Direction::E => (1, 0),
            Direction::S => (0, 1),
            Direction::W => (-1, 0),
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Direction::N => 'N',
            Direction::E => 'E',
            Direction::S => 'S',
            Direction::W => 'W',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'N' => Some(Direction::N),
            'E' => Some(Direction::E),
            'S' => Some(Direction::S),
            'W' => Some(Direction::W),
            _ => None,
        }
    }
}
