use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub type LayerId = u32;

/// Position in an agent's own frame: `(x, y)` on an independent plane `layer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub layer: LayerId,
}

impl Position {
    pub const fn new(x: i32, y: i32, layer: LayerId) -> Self {
        Self { x, y, layer }
    }

    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            layer: self.layer,
        }
    }

    /// The neighbouring coordinate in a cardinal direction; `U` has no
    /// planar neighbour and yields `self`.
    #[must_use]
    pub fn step(self, dir: Direction) -> Self {
        match dir.vector() {
            Some((dx, dy)) => self.offset(dx, dy),
            None => self,
        }
    }

    /// Euclidean distance over all three components.
    pub fn distance(self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        let dl = f64::from(self.layer) - f64::from(other.layer);
        (dx * dx + dy * dy + dl * dl).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, L{})", self.x, self.y, self.layer)
    }
}

/// Move token. `U` is "use": teleport on a transporter, pick up a goal,
/// leave through an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    N,
    E,
    S,
    W,
    U,
}

impl Direction {
    /// Cardinal directions in relation order.
    pub const CARDINALS: [Direction; 4] = [Direction::N, Direction::S, Direction::E, Direction::W];

    pub fn vector(self) -> Option<(i32, i32)> {
        match self {
            Direction::N => Some((0, -1)),
            Direction::S => Some((0, 1)),
            Direction::W => Some((-1, 0)),
            Direction::E => Some((1, 0)),
            Direction::U => None,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::N => Direction::S,
            Direction::S => Direction::N,
            Direction::E => Direction::W,
            Direction::W => Direction::E,
            Direction::U => Direction::U,
        }
    }

    pub fn is_cardinal(self) -> bool {
        self != Direction::U
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::N => 'N',
            Direction::E => 'E',
            Direction::S => 'S',
            Direction::W => 'W',
            Direction::U => 'U',
        }
    }

    fn slot(self) -> Option<usize> {
        match self {
            Direction::N => Some(0),
            Direction::S => Some(1),
            Direction::E => Some(2),
            Direction::W => Some(3),
            Direction::U => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Direction::N),
            "E" => Ok(Direction::E),
            "S" => Ok(Direction::S),
            "W" => Ok(Direction::W),
            "U" => Ok(Direction::U),
            other => Err(Error::UnknownMove(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Category {
    Empty,
    Wall,
    Exit,
    Transporter,
    Goal,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Empty => "EMPTY",
            Category::Wall => "WALL",
            Category::Exit => "EXIT",
            Category::Transporter => "TRANSPORTER",
            Category::Goal => "GOAL",
        }
    }

    /// Landmarks are tracked by code for merge detection.
    pub fn is_landmark(self) -> bool {
        matches!(
            self,
            Category::Exit | Category::Transporter | Category::Goal
        )
    }
}

fn classify(c: char) -> Option<Category> {
    match c {
        'g' => Some(Category::Empty),
        'w' => Some(Category::Wall),
        'r' => Some(Category::Exit),
        'b' | 'o' | 'y' | 'p' => Some(Category::Transporter),
        '0'..='9' => Some(Category::Goal),
        _ => None,
    }
}

/// A validated cell type code.
///
/// The only way to build one from an arbitrary character is `TryFrom<char>`,
/// which rejects anything outside the fixed alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "char", into = "char")
)]
pub struct TypeCode(char);

impl TypeCode {
    pub const EMPTY: TypeCode = TypeCode('g');
    pub const WALL: TypeCode = TypeCode('w');
    pub const EXIT: TypeCode = TypeCode('r');

    pub fn as_char(self) -> char {
        self.0
    }

    pub fn category(self) -> Category {
        // Construction guarantees membership in the alphabet.
        classify(self.0).unwrap_or(Category::Goal)
    }

    /// Paired transporter code (`b<->o`, `y<->p`).
    pub fn partner(self) -> Option<TypeCode> {
        match self.0 {
            'b' => Some(TypeCode('o')),
            'o' => Some(TypeCode('b')),
            'y' => Some(TypeCode('p')),
            'p' => Some(TypeCode('y')),
            _ => None,
        }
    }
}

impl TryFrom<char> for TypeCode {
    type Error = Error;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        classify(c)
            .map(|_| TypeCode(c))
            .ok_or(Error::UnknownTypeCode(c))
    }
}

impl From<TypeCode> for char {
    fn from(code: TypeCode) -> char {
        code.0
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable index of a cell inside a `SpatialMemory` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellId(pub(crate) u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A discovered grid location.
///
/// Cardinal relations are `None` while unobserved. A relation pointing at a
/// wall cell is a *known* wall, which is not the same as unknown.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    position: Position,
    code: TypeCode,
    category: Category,
    links: [Option<CellId>; 4],
    jump: Option<CellId>,
}

impl Cell {
    pub fn new(position: Position, code: TypeCode) -> Self {
        Self {
            position,
            code,
            category: code.category(),
            links: [None; 4],
            jump: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn code(&self) -> TypeCode {
        self.code
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_wall(&self) -> bool {
        self.category == Category::Wall
    }

    /// `U` is a relation only on transporters.
    pub fn has_relation(&self, dir: Direction) -> bool {
        dir.is_cardinal() || self.category == Category::Transporter
    }

    pub fn relation(&self, dir: Direction) -> Option<CellId> {
        match dir.slot() {
            Some(i) => self.links[i],
            None => self.jump,
        }
    }

    /// Every relation key this cell carries, in N, S, E, W, U order.
    pub fn relations(&self) -> impl Iterator<Item = (Direction, Option<CellId>)> + '_ {
        Direction::CARDINALS
            .into_iter()
            .chain(Some(Direction::U))
            .filter(|d| self.has_relation(*d))
            .map(|d| (d, self.relation(d)))
    }

    pub fn has_unknowns(&self) -> bool {
        !self.is_wall() && self.links.iter().any(Option::is_none)
    }

    pub fn unknown_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_none()).count()
    }

    pub(crate) fn set_relation(&mut self, dir: Direction, target: Option<CellId>) {
        match dir.slot() {
            Some(i) => self.links[i] = target,
            None => self.jump = target,
        }
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Collected goals become plain floor.
    pub(crate) fn clear_to_empty(&mut self) {
        self.code = TypeCode::EMPTY;
        self.category = Category::Empty;
        self.jump = None;
    }
}
