//! Per-cell state tracked by the maze carver.

/// Cardinal direction of a passage between two neighbouring cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// Headings in the order neighbours are examined.
    pub(crate) const ALL: [Heading; 4] = [Self::North, Self::West, Self::East, Self::South];

    /// Heading that leads back from the neighbour to the origin cell.
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Bit recorded in [`Cell::passages`] for this heading.
    pub(crate) const fn mask(self) -> u8 {
        match self {
            Self::North => 0b0001,
            Self::East => 0b0010,
            Self::South => 0b0100,
            Self::West => 0b1000,
        }
    }
}

/// Packed flags for a single maze cell.
///
/// Bit 0 marks a carvable (bright) cell, bit 1 marks a cell already reached
/// by the carver and bits 2..=5 record passages to neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub(crate) struct Cell(u8);

impl Cell {
    const OPEN: u8 = 1 << 0;
    const VISITED: u8 = 1 << 1;
    const PASSAGE_SHIFT: u32 = 2;

    /// Wall cell that is never carved.
    pub(crate) const fn closed() -> Self {
        Self(0)
    }

    /// Carvable cell that has not been reached yet.
    pub(crate) const fn open() -> Self {
        Self(Self::OPEN)
    }

    pub(crate) const fn is_open(self) -> bool {
        self.0 & Self::OPEN != 0
    }

    pub(crate) const fn is_visited(self) -> bool {
        self.0 & Self::VISITED != 0
    }

    /// Reports whether the carver may still enter this cell.
    pub(crate) const fn is_frontier(self) -> bool {
        self.is_open() && !self.is_visited()
    }

    pub(crate) fn mark_visited(&mut self) {
        self.0 |= Self::VISITED;
    }

    pub(crate) fn link(&mut self, heading: Heading) {
        self.0 |= heading.mask() << Self::PASSAGE_SHIFT;
    }

    /// Passage mask using the [`Heading::mask`] bit layout.
    pub(crate) const fn passages(self) -> u8 {
        (self.0 >> Self::PASSAGE_SHIFT) & 0b1111
    }

    /// Forgets carving progress while keeping the cell's open or closed state.
    pub(crate) fn reset(&mut self) {
        self.0 &= Self::OPEN;
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, Heading};

    #[test]
    fn linking_records_passages_per_heading() {
        let mut cell = Cell::open();
        cell.link(Heading::North);
        cell.link(Heading::West);

        assert_eq!(cell.passages(), Heading::North.mask() | Heading::West.mask());
        assert!(cell.is_open());
        assert!(!cell.is_visited());
    }

    #[test]
    fn reset_keeps_open_state_only() {
        let mut cell = Cell::open();
        cell.mark_visited();
        cell.link(Heading::South);
        cell.reset();

        assert_eq!(cell, Cell::open());
        assert!(cell.is_frontier());
    }

    #[test]
    fn closed_cells_are_never_frontier() {
        assert!(!Cell::closed().is_frontier());
    }

    #[test]
    fn opposite_heading_round_trips() {
        for heading in Heading::ALL {
            assert_eq!(heading.opposite().opposite(), heading);
            assert_ne!(heading.opposite(), heading);
        }
    }
}
