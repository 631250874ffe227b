use derive_more::Display;
use rustc_hash::FxHashMap;

use crate::problems::grid_2d::Cell;
use crate::problems::grid_2d::Grid2DSpace;
use crate::problems::grid_2d::Grid2DTile;

/// What a cell shows once a path is drawn over the grid.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Marker {
    #[display("S")]
    Start,
    #[display("G")]
    Goal,
    #[display("*")]
    Path,
    #[display("#")]
    Wall,
    #[display(".")]
    Open,
}

/// A path drawn over its grid, one row per line with cells separated by a
/// space.
///
/// ```text
/// S * * * * * * *
/// . . . # . . . *
/// ```
#[derive(Debug)]
pub struct PathOverlay<'a> {
    space: &'a Grid2DSpace,
    markers: FxHashMap<Cell, Marker>,
}

impl<'a> PathOverlay<'a> {
    pub fn new(space: &'a Grid2DSpace, path: &[Cell]) -> Self {
        let mut markers = FxHashMap::default();
        if let Some((last, intermediate)) = path.split_last() {
            for cell in intermediate.iter().skip(1) {
                markers.insert(*cell, Marker::Path);
            }
            markers.insert(*last, Marker::Goal);
        }
        // The start wins on single-cell paths.
        if let Some(first) = path.first() {
            markers.insert(*first, Marker::Start);
        }

        Self { space, markers }
    }

    pub fn marker(&self, cell: &Cell) -> Marker {
        match self.markers.get(cell) {
            Some(m) => *m,
            None => match self.space.tile(cell) {
                Some(Grid2DTile::Blocked) => Marker::Wall,
                _ => Marker::Open,
            },
        }
    }

    /// The markers of every row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Marker>> + '_ {
        let (width, height) = self.space.dimensions();
        (0..height).map(move |y| {
            (0..width)
                .filter_map(|x| Cell::new_from_usize(x, y))
                .map(|cell| self.marker(&cell))
                .collect()
        })
    }
}

impl std::fmt::Display for PathOverlay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in self.rows() {
            for (i, marker) in row.iter().enumerate() {
                if i != 0 {
                    write!(f, " ")?;
                }
                write!(f, "{marker}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;

    fn c(x: u32, y: u32) -> Cell {
        Cell::new(x, y).unwrap()
    }

    #[test]
    fn overlay_marks_the_path() {
        let space = Grid2DSpace::try_from(indoc! {"
            ....
            .##.
            ....
        "})
        .unwrap();
        let path = [c(0, 0), c(1, 0), c(2, 0), c(3, 0), c(3, 1), c(3, 2)];

        let overlay = PathOverlay::new(&space, &path);
        assert_eq!(
            overlay.to_string(),
            indoc! {"
                S * * *
                . # # *
                . . . G
            "}
        );
        assert_eq!(overlay.marker(&c(1, 1)), Marker::Wall);
        assert_eq!(overlay.marker(&c(0, 2)), Marker::Open);
    }

    #[test]
    fn overlay_of_a_single_cell() {
        let space = Grid2DSpace::new_empty_with_dimensions(2, 1).unwrap();
        let overlay = PathOverlay::new(&space, &[c(1, 0)]);
        assert_eq!(overlay.to_string(), ". S\n");
    }

    #[test]
    fn overlay_without_path() {
        let space = Grid2DSpace::try_from("#.").unwrap();
        let overlay = PathOverlay::new(&space, &[]);
        assert_eq!(overlay.to_string(), "# .\n");
        assert_eq!(
            overlay.rows().collect::<Vec<_>>(),
            vec![vec![Marker::Wall, Marker::Open]]
        );
    }
}
