use std::str::FromStr;

use derive_more::Display;
use nonmax::NonMaxU32;
use thiserror::Error;

use crate::problem::Problem;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Heuristic;
use crate::space::Neighbours;
use crate::space::Space;
use crate::space::State;

const MAX_ELEMENTS_DISPLAYED: usize = 40;
const RANDOM_STATE_MAX_TRIES: usize = 10_000;

pub(crate) type CoordIntrinsic = u32;
pub type Coord = NonMaxU32;

/// A position in the grid, `x` is the column and `y` the row.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("({x},{y})")]
pub struct Cell {
    pub(crate) x: Coord,
    pub(crate) y: Coord,
}

impl Cell {
    pub fn new(x: CoordIntrinsic, y: CoordIntrinsic) -> Option<Cell> {
        Some(Cell {
            x: Coord::new(x)?,
            y: Coord::new(y)?,
        })
    }
    /// Builds a Cell from coordinates that may be negative or too large.
    pub fn new_from_i64(x: i64, y: i64) -> Option<Cell> {
        let x = CoordIntrinsic::try_from(x).ok()?;
        let y = CoordIntrinsic::try_from(y).ok()?;
        Cell::new(x, y)
    }
    pub fn new_from_usize(x: usize, y: usize) -> Option<Cell> {
        let x = CoordIntrinsic::try_from(x).ok()?;
        let y = CoordIntrinsic::try_from(y).ok()?;
        Cell::new(x, y)
    }

    #[inline(always)]
    pub fn x(&self) -> CoordIntrinsic {
        self.x.get()
    }
    #[inline(always)]
    pub fn y(&self) -> CoordIntrinsic {
        self.y.get()
    }

    #[inline(always)]
    pub fn manhattan_distance(&self, other: &Cell) -> CoordIntrinsic {
        self.x().abs_diff(other.x()) + self.y().abs_diff(other.y())
    }

    /// Whether `other` is one orthogonal step away.
    #[inline(always)]
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.manhattan_distance(other) == 1
    }
}
impl State for Cell {}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CellParseError {
    #[error("Expected 'x,y' but found '{0}'")]
    Format(String),
    #[error("Invalid coordinate '{0}'")]
    Coordinate(String),
}

impl FromStr for Cell {
    type Err = CellParseError;

    /// Parses `x,y`, optionally wrapped in parentheses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let (x, y) = trimmed
            .split_once(',')
            .ok_or_else(|| CellParseError::Format(s.to_string()))?;
        let coordinate = |v: &str| {
            v.trim()
                .parse::<CoordIntrinsic>()
                .ok()
                .and_then(Coord::new)
                .ok_or_else(|| CellParseError::Coordinate(v.trim().to_string()))
        };

        Ok(Cell {
            x: coordinate(x)?,
            y: coordinate(y)?,
        })
    }
}

/// Movement between orthogonally adjacent cells.
///
/// The declaration order is the expansion order.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, PartialOrd)]
pub enum Grid2DAction {
    #[display("↑")]
    Up = 0, // y--
    #[display("→")]
    Right = 1, // x++
    #[display("↓")]
    Down = 2, // y++
    #[display("←")]
    Left = 3, // x--
}
impl Action for Grid2DAction {}

impl Grid2DAction {
    pub const ALL: [Grid2DAction; 4] = [
        Grid2DAction::Up,
        Grid2DAction::Right,
        Grid2DAction::Down,
        Grid2DAction::Left,
    ];
}

pub type Grid2DCost = CoordIntrinsic;
impl Cost for Grid2DCost {}

const ORTHOGONAL_COST: Grid2DCost = 1u32;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Grid2DTile {
    #[display(".")]
    Free,
    #[display("#")]
    Blocked,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Grid2DTileParseError {
    #[error("Invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("Invalid occupancy flag {0}")]
    InvalidFlag(u8),
}

impl std::convert::TryFrom<char> for Grid2DTile {
    type Error = Grid2DTileParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            '.' | ' ' | '0' => Ok(Grid2DTile::Free),
            '#' | '█' | '1' => Ok(Grid2DTile::Blocked),
            ch => Err(Grid2DTileParseError::InvalidCharacter(ch)),
        }
    }
}

impl std::convert::TryFrom<u8> for Grid2DTile {
    type Error = Grid2DTileParseError;

    fn try_from(flag: u8) -> Result<Self, Self::Error> {
        match flag {
            0 => Ok(Grid2DTile::Free),
            1 => Ok(Grid2DTile::Blocked),
            flag => Err(Grid2DTileParseError::InvalidFlag(flag)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Grid2DSpaceError {
    #[error("Empty grid")]
    Empty,
    #[error("Row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid tile found at ({x},{y}): {e}")]
    InvalidTile {
        e: Grid2DTileParseError,
        x: usize,
        y: usize,
    },
    #[error("A {width}x{height} grid exceeds the coordinate range")]
    TooLarge { width: usize, height: usize },
}

/// An immutable, rectangular occupancy grid.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid2DSpace {
    map: Vec<Vec<Grid2DTile>>,
}

impl Grid2DSpace {
    /// Validates that `map` is non-empty, rectangular and addressable.
    pub fn new_from_map(map: Vec<Vec<Grid2DTile>>) -> Result<Self, Grid2DSpaceError> {
        let expected = map.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(Grid2DSpaceError::Empty);
        }
        if let Some((row, line)) = map
            .iter()
            .enumerate()
            .find(|(_, line)| line.len() != expected)
        {
            return Err(Grid2DSpaceError::Ragged {
                row,
                expected,
                found: line.len(),
            });
        }
        Self::check_dimensions(expected, map.len())?;

        Ok(Self { map })
    }

    pub fn new_empty_with_dimensions(
        width: usize,
        height: usize,
    ) -> Result<Self, Grid2DSpaceError> {
        Self::check_dimensions(width, height)?;
        Ok(Self {
            map: vec![vec![Grid2DTile::Free; width]; height],
        })
    }

    /// Builds a grid where every cell is blocked with `wall_probability`.
    pub fn random<R: rand::Rng>(
        r: &mut R,
        width: usize,
        height: usize,
        wall_probability: f64,
    ) -> Result<Self, Grid2DSpaceError> {
        Self::check_dimensions(width, height)?;

        let p = if wall_probability.is_nan() {
            0.0
        } else {
            wall_probability.clamp(0.0, 1.0)
        };
        let map = (0..height)
            .map(|_| {
                (0..width)
                    .map(|_| {
                        if r.random_bool(p) {
                            Grid2DTile::Blocked
                        } else {
                            Grid2DTile::Free
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(Self { map })
    }

    fn check_dimensions(width: usize, height: usize) -> Result<(), Grid2DSpaceError> {
        if width == 0 || height == 0 {
            Err(Grid2DSpaceError::Empty)
        } else if width < CoordIntrinsic::MAX as usize && height < CoordIntrinsic::MAX as usize {
            Ok(())
        } else {
            Err(Grid2DSpaceError::TooLarge { width, height })
        }
    }

    /// `(width, height)`
    pub fn dimensions(&self) -> (usize, usize) {
        match self.map.first() {
            Some(row) => (row.len(), self.map.len()),
            None => (0, 0),
        }
    }

    pub fn map(&self) -> &[Vec<Grid2DTile>] {
        &self.map
    }

    /// Bounds-checked Cell lookup from raw, possibly negative, coordinates.
    pub fn cell(&self, x: i64, y: i64) -> Option<Cell> {
        Cell::new_from_i64(x, y).filter(|c| self.valid(c))
    }

    pub fn tile(&self, cell: &Cell) -> Option<Grid2DTile> {
        self.map
            .get(cell.y() as usize)
            .and_then(|row| row.get(cell.x() as usize))
            .copied()
    }

    #[inline(always)]
    pub fn is_free(&self, cell: &Cell) -> bool {
        self.tile(cell) == Some(Grid2DTile::Free)
    }

    pub fn cells(&self) -> impl Iterator<Item = (Cell, Grid2DTile)> + '_ {
        self.map.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(x, tile)| Some((Cell::new_from_usize(x, y)?, *tile)))
        })
    }

    pub fn random_free_cell<R: rand::Rng>(&self, r: &mut R) -> Option<Cell> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        for _tries in 0..RANDOM_STATE_MAX_TRIES {
            let x = r.random_range(0..width);
            let y = r.random_range(0..height);
            if self.map[y][x] == Grid2DTile::Free {
                return Cell::new_from_usize(x, y);
            }
        }

        None
    }
}

impl std::convert::TryFrom<&[Vec<u8>]> for Grid2DSpace {
    type Error = Grid2DSpaceError;

    /// Reads occupancy flags, `0` is free and `1` is blocked.
    fn try_from(rows: &[Vec<u8>]) -> Result<Self, Self::Error> {
        let map = rows
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, flag)| {
                        Grid2DTile::try_from(*flag)
                            .map_err(|e| Grid2DSpaceError::InvalidTile { e, x, y })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new_from_map(map)
    }
}

impl std::convert::TryFrom<&str> for Grid2DSpace {
    type Error = Grid2DSpaceError;

    /// Reads one row per line, skipping blank lines.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let map = s
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(y, line)| {
                line.chars()
                    .enumerate()
                    .map(|(x, ch)| {
                        Grid2DTile::try_from(ch)
                            .map_err(|e| Grid2DSpaceError::InvalidTile { e, x, y })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new_from_map(map)
    }
}

impl Space<Cell, Grid2DAction, Grid2DCost> for Grid2DSpace {
    #[inline(always)]
    fn apply(&self, state: &Cell, action: &Grid2DAction) -> Option<Cell> {
        let x = state.x.get();
        let y = state.y.get();

        #[rustfmt::skip]
        let (x, y) = match action {
            Grid2DAction::Up    => (x,                 y.checked_sub(1)?),
            Grid2DAction::Right => (x.checked_add(1)?, y                ),
            Grid2DAction::Down  => (x,                 y.checked_add(1)?),
            Grid2DAction::Left  => (x.checked_sub(1)?, y                ),
        };

        let s = Cell::new(x, y)?;
        self.is_free(&s).then_some(s)
    }

    #[inline(always)]
    fn valid(&self, state: &Cell) -> bool {
        let (max_x, max_y) = self.dimensions();
        (state.x() as usize) < max_x && (state.y() as usize) < max_y
    }

    #[inline(always)]
    fn cost(&self, _s: &Cell, _a: &Grid2DAction) -> Grid2DCost {
        ORTHOGONAL_COST
    }

    /// Gets the free neighbours of a given position in expansion order.
    fn neighbours(&self, state: &Cell) -> Neighbours<Cell, Grid2DAction> {
        Grid2DAction::ALL
            .iter()
            .filter_map(|a| self.apply(state, a).map(|s| (s, *a)))
            .collect()
    }

    fn size(&self) -> Option<usize> {
        let (x, y) = self.dimensions();
        Some(x * y)
    }
}

impl std::fmt::Display for Grid2DSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let d = self.dimensions();
        writeln!(f, "Grid2D({}x{}):", d.0, d.1)?;
        for line in self.map.iter().take(MAX_ELEMENTS_DISPLAYED) {
            for tile in line.iter().take(MAX_ELEMENTS_DISPLAYED) {
                write!(f, "{tile}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Grid2DSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Grid2D{:?}", self.dimensions())
    }
}

/// A Grid2DSpace together with the endpoints to connect.
///
/// Borrows the grid so many problems can share one.
#[derive(Copy, Clone, Debug)]
pub struct Grid2DProblem<'s> {
    space: &'s Grid2DSpace,
    start: Cell,
    goal: Cell,
}

impl<'s> Grid2DProblem<'s> {
    pub fn new(space: &'s Grid2DSpace, start: Cell, goal: Cell) -> Self {
        Self { space, start, goal }
    }
}

impl Problem<Grid2DSpace, Cell, Grid2DAction, Grid2DCost> for Grid2DProblem<'_> {
    fn space(&self) -> &Grid2DSpace {
        self.space
    }
    fn start(&self) -> Cell {
        self.start
    }
    fn goal(&self) -> Cell {
        self.goal
    }

    fn randomize<R: rand::Rng>(&self, r: &mut R) -> Option<Self> {
        let start = self.space.random_free_cell(r)?;
        let goal = self.space.random_free_cell(r)?;
        Some(Self::new(self.space, start, goal))
    }
}

impl std::fmt::Display for Grid2DProblem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let d = self.space.dimensions();
        writeln!(
            f,
            "Grid2DProblem({}x{}) (s:{}, g:{}):",
            d.0, d.1, self.start, self.goal
        )?;
        for (y, line) in self.space.map.iter().enumerate().take(MAX_ELEMENTS_DISPLAYED) {
            for (x, tile) in line.iter().enumerate().take(MAX_ELEMENTS_DISPLAYED) {
                let s = Cell::new_from_usize(x, y);

                match (s == Some(self.start), s == Some(self.goal)) {
                    (true, true) => write!(f, "!")?,
                    (true, false) => write!(f, "S")?,
                    (false, true) => write!(f, "G")?,
                    (false, false) => write!(f, "{tile}")?,
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Grid2DProblemCell {
    Tile(Grid2DTile),
    Start,
    Goal,
}

impl std::convert::TryFrom<char> for Grid2DProblemCell {
    type Error = Grid2DTileParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            'S' => Ok(Grid2DProblemCell::Start),
            'G' => Ok(Grid2DProblemCell::Goal),
            ch => Ok(Grid2DProblemCell::Tile(Grid2DTile::try_from(ch)?)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Grid2DProblemParseError {
    #[error("Invalid grid: {0}")]
    Space(#[from] Grid2DSpaceError),
    #[error("Expected exactly one '{marker}' but found {found}")]
    Endpoints { marker: char, found: usize },
}

/// Splits a drawing with `S` and `G` markers into a grid and its endpoints.
///
/// Both markers stand on free cells.
pub fn parse_problem(s: &str) -> Result<(Grid2DSpace, Cell, Cell), Grid2DProblemParseError> {
    let mut starts = vec![];
    let mut goals = vec![];

    let map = s
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(y, line)| {
            line.chars()
                .enumerate()
                .map(|(x, ch)| -> Result<Grid2DTile, Grid2DSpaceError> {
                    let cell = Grid2DProblemCell::try_from(ch)
                        .map_err(|e| Grid2DSpaceError::InvalidTile { e, x, y })?;
                    Ok(match cell {
                        Grid2DProblemCell::Start => {
                            starts.push((x, y));
                            Grid2DTile::Free
                        }
                        Grid2DProblemCell::Goal => {
                            goals.push((x, y));
                            Grid2DTile::Free
                        }
                        Grid2DProblemCell::Tile(t) => t,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, Grid2DSpaceError>>()?;
    let space = Grid2DSpace::new_from_map(map)?;

    let endpoint = |marker: char, found: &[(usize, usize)]| match found {
        [(x, y)] => space
            .cell(*x as i64, *y as i64)
            .ok_or(Grid2DProblemParseError::Endpoints { marker, found: 0 }),
        _ => Err(Grid2DProblemParseError::Endpoints {
            marker,
            found: found.len(),
        }),
    };
    let start = endpoint('S', &starts)?;
    let goal = endpoint('G', &goals)?;

    Ok((space, start, goal))
}

#[derive(Debug)]
pub struct Grid2DHeuristicManhattanDistance;

impl Heuristic<Grid2DSpace, Cell, Grid2DAction, Grid2DCost> for Grid2DHeuristicManhattanDistance {
    /// The distance of following straight lines
    #[inline(always)]
    fn h(a: &Cell, b: &Cell) -> Grid2DCost {
        a.manhattan_distance(b) * ORTHOGONAL_COST
    }
}
