//! Text glyphs used to draw maze cells.

use crate::cell::Cell;

/// Glyph drawn for wall cells derived from dark samples.
pub const CLOSED_GLYPH: char = '░';
/// Glyph drawn for carvable cells the carver has not reached.
pub const UNCARVED_GLYPH: char = '·';
/// Glyph drawn for the cell the carver currently stands on.
pub const CURSOR_GLYPH: char = '@';

const ISOLATED_GLYPH: char = '•';

/// Box-drawing glyphs indexed by passage mask (N = 1, E = 2, S = 4, W = 8).
const PASSAGE_GLYPHS: [char; 16] = [
    ISOLATED_GLYPH,
    '╵',
    '╶',
    '└',
    '╷',
    '│',
    '┌',
    '├',
    '╴',
    '┘',
    '─',
    '┴',
    '┐',
    '┤',
    '┬',
    '┼',
];

pub(crate) fn glyph_for(cell: Cell, is_cursor: bool) -> char {
    if is_cursor {
        return CURSOR_GLYPH;
    }
    if !cell.is_open() {
        return CLOSED_GLYPH;
    }
    if !cell.is_visited() {
        return UNCARVED_GLYPH;
    }

    PASSAGE_GLYPHS[usize::from(cell.passages())]
}

#[cfg(test)]
mod tests {
    use super::{glyph_for, CLOSED_GLYPH, CURSOR_GLYPH, UNCARVED_GLYPH};
    use crate::cell::{Cell, Heading};

    fn carved(headings: &[Heading]) -> Cell {
        let mut cell = Cell::open();
        cell.mark_visited();
        for &heading in headings {
            cell.link(heading);
        }
        cell
    }

    #[test]
    fn straight_corridors_use_lines() {
        assert_eq!(glyph_for(carved(&[Heading::North, Heading::South]), false), '│');
        assert_eq!(glyph_for(carved(&[Heading::East, Heading::West]), false), '─');
    }

    #[test]
    fn corners_and_junctions_match_passages() {
        assert_eq!(glyph_for(carved(&[Heading::East, Heading::South]), false), '┌');
        assert_eq!(glyph_for(carved(&[Heading::North, Heading::West]), false), '┘');
        assert_eq!(
            glyph_for(
                carved(&[Heading::North, Heading::East, Heading::South, Heading::West]),
                false
            ),
            '┼'
        );
    }

    #[test]
    fn state_glyphs_take_precedence() {
        assert_eq!(glyph_for(Cell::closed(), false), CLOSED_GLYPH);
        assert_eq!(glyph_for(Cell::open(), false), UNCARVED_GLYPH);
        assert_eq!(glyph_for(carved(&[Heading::East]), true), CURSOR_GLYPH);
    }
}
