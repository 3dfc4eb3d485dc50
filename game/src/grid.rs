use std::ops::Add;

use serde::{Deserialize, Serialize};

/// An integer tile coordinate. `x` grows to the right, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        self + dir.delta()
    }

    pub fn distance_to(self, other: GridPos) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add for GridPos {
    type Output = GridPos;

    fn add(self, rhs: GridPos) -> Self::Output {
        GridPos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    /// Enumeration order used wherever candidates are scanned; ties go to the earliest.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    pub const fn delta(self) -> GridPos {
        match self {
            Direction::Right => GridPos::new(1, 0),
            Direction::Down => GridPos::new(0, 1),
            Direction::Left => GridPos::new(-1, 0),
            Direction::Up => GridPos::new(0, -1),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
        }
    }

    /// The direction for a unit cardinal delta. Anything else (zero, diagonal, longer
    /// vectors) has no direction.
    pub const fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (1, 0) => Some(Direction::Right),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (0, -1) => Some(Direction::Up),
            _ => None,
        }
    }
}
