#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Maze-carving simulation engine for Mazm.
//!
//! Bright samples of the seed grid become carvable cells, dark samples become
//! walls. Every tick advances a randomized recursive backtracker by one step,
//! so the rendered frames show the maze growing through the image. The random
//! stream is derived from the seed grid itself, which keeps the whole
//! simulation a pure function of its input.

mod cell;
mod glyphs;

use log::debug;
use mazm_core::{ConstructionError, Engine, EngineFactory, Frame, PixelGrid, Ticks, TickOutcome};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use self::cell::{Cell, Heading};
pub use self::glyphs::{CLOSED_GLYPH, CURSOR_GLYPH, UNCARVED_GLYPH};

/// Brightness above which a sample becomes a carvable cell (half of 765).
pub const OPEN_THRESHOLD: u16 = 765 / 2;

/// Largest number of cells a single engine will address.
pub const MAX_CELLS: usize = 1 << 22;

const SEED_DOMAIN: &str = "mazm/backtracker";

/// Behaviour of the engine once every carvable cell has been reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum EngineMode {
    /// Report termination once the maze is complete.
    #[default]
    Finite,
    /// Wipe the finished maze and start carving again, forever.
    Perpetual,
}

/// Builds [`MazeEngine`] instances with a shared configuration.
#[derive(Clone, Debug)]
pub struct MazeEngineFactory {
    mode: EngineMode,
    threshold: u16,
}

impl Default for MazeEngineFactory {
    fn default() -> Self {
        Self::new(EngineMode::default())
    }
}

impl MazeEngineFactory {
    /// Creates a factory producing engines in the provided mode.
    #[must_use]
    pub const fn new(mode: EngineMode) -> Self {
        Self {
            mode,
            threshold: OPEN_THRESHOLD,
        }
    }

    /// Overrides the brightness threshold separating walls from open cells.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: u16) -> Self {
        self.threshold = threshold;
        self
    }

    /// Mode assigned to constructed engines.
    #[must_use]
    pub const fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Brightness threshold applied to seed samples.
    #[must_use]
    pub const fn threshold(&self) -> u16 {
        self.threshold
    }
}

impl EngineFactory for MazeEngineFactory {
    type Engine = MazeEngine;

    fn construct(&mut self, grid: PixelGrid) -> Result<MazeEngine, ConstructionError> {
        MazeEngine::seeded(grid, self.mode, self.threshold)
    }
}

/// Maze carved through the bright regions of a seed image.
#[derive(Debug)]
pub struct MazeEngine {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    carvable: usize,
    stack: Vec<usize>,
    scan: usize,
    rng: ChaCha8Rng,
    mode: EngineMode,
    time: Ticks,
    terminated: bool,
    completed_mazes: u64,
}

impl MazeEngine {
    /// Seeds a new engine from the provided grid.
    ///
    /// Samples brighter than `threshold` become carvable cells. The carver
    /// starts from a randomly chosen carvable cell; a grid without any is
    /// still valid and simply has nothing to carve.
    pub fn seeded(
        grid: PixelGrid,
        mode: EngineMode,
        threshold: u16,
    ) -> Result<Self, ConstructionError> {
        let width = grid.width();
        let height = grid.height();
        if grid.len() > MAX_CELLS {
            return Err(ConstructionError::TooLarge { width, height });
        }

        let cells: Vec<Cell> = grid
            .samples()
            .map(|sample| {
                if sample.brightness() > threshold {
                    Cell::open()
                } else {
                    Cell::closed()
                }
            })
            .collect();
        let carvable = cells.iter().filter(|cell| cell.is_open()).count();

        let rng = ChaCha8Rng::seed_from_u64(derive_seed(&grid));
        let mut engine = Self {
            width,
            height,
            cells,
            carvable,
            stack: Vec::new(),
            scan: 0,
            rng,
            mode,
            time: Ticks::ZERO,
            terminated: false,
            completed_mazes: 0,
        };
        engine.plant_root();

        debug!(
            "maze engine seeded: {width}x{height}, {} carvable cells, mode {:?}",
            engine.carvable_cells(),
            mode
        );
        Ok(engine)
    }

    /// Number of cell columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cell rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Mode the engine was constructed with.
    #[must_use]
    pub const fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Number of cells brighter than the construction threshold.
    #[must_use]
    pub const fn carvable_cells(&self) -> usize {
        self.carvable
    }

    /// Number of carvable cells the carver has reached in the current maze.
    #[must_use]
    pub fn carved_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_visited()).count()
    }

    /// Number of mazes finished and wiped in [`EngineMode::Perpetual`].
    #[must_use]
    pub const fn completed_mazes(&self) -> u64 {
        self.completed_mazes
    }

    /// Reports whether the engine reached its terminal state.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn plant_root(&mut self) {
        let frontier: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_frontier())
            .map(|(index, _)| index)
            .collect();
        if frontier.is_empty() {
            return;
        }

        let root = frontier[self.rng.gen_range(0..frontier.len())];
        self.visit(root);
    }

    fn visit(&mut self, index: usize) {
        self.cells[index].mark_visited();
        self.stack.push(index);
    }

    fn neighbour(&self, index: usize, heading: Heading) -> Option<usize> {
        let width = self.width as usize;
        let height = self.height as usize;
        let row = index / width;
        let column = index % width;

        match heading {
            Heading::North if row > 0 => Some(index - width),
            Heading::South if row + 1 < height => Some(index + width),
            Heading::West if column > 0 => Some(index - 1),
            Heading::East if column + 1 < width => Some(index + 1),
            _ => None,
        }
    }

    /// Performs one carving step, returning `false` once nothing is left.
    fn carve_step(&mut self) -> bool {
        if let Some(&current) = self.stack.last() {
            let mut candidates = [(Heading::North, 0_usize); 4];
            let mut count = 0;
            for heading in Heading::ALL {
                if let Some(next) = self.neighbour(current, heading) {
                    if self.cells[next].is_frontier() {
                        candidates[count] = (heading, next);
                        count += 1;
                    }
                }
            }

            if count == 0 {
                let _ = self.stack.pop();
            } else {
                let (heading, next) = candidates[self.rng.gen_range(0..count)];
                self.cells[current].link(heading);
                self.cells[next].link(heading.opposite());
                self.visit(next);
            }
            return true;
        }

        while self.scan < self.cells.len() {
            let index = self.scan;
            self.scan += 1;
            if self.cells[index].is_frontier() {
                self.visit(index);
                return true;
            }
        }

        false
    }

    fn restart(&mut self) {
        for cell in &mut self.cells {
            cell.reset();
        }
        self.stack.clear();
        self.scan = 0;
        self.completed_mazes = self.completed_mazes.saturating_add(1);
        self.plant_root();
    }
}

impl Engine for MazeEngine {
    fn tick(&mut self, steps: u32) -> TickOutcome {
        for _ in 0..steps {
            if self.terminated {
                break;
            }
            if self.carve_step() {
                continue;
            }

            match self.mode {
                EngineMode::Finite => self.terminated = true,
                // Nothing to carve, so there is no maze to start over.
                EngineMode::Perpetual if self.carvable == 0 => break,
                EngineMode::Perpetual => self.restart(),
            }
        }

        self.time = self.time.advanced_by(steps);
        if self.terminated {
            TickOutcome::Terminated
        } else {
            TickOutcome::Continue
        }
    }

    fn render(&self) -> Frame {
        let cursor = self.stack.last().copied();
        let width = self.width as usize;
        let mut text = String::with_capacity(self.cells.len() * 3 + self.height as usize);

        for (row, line) in self.cells.chunks(width).enumerate() {
            for (column, &cell) in line.iter().enumerate() {
                let is_cursor = cursor == Some(row * width + column);
                text.push(glyphs::glyph_for(cell, is_cursor));
            }
            text.push('\n');
        }

        Frame::new(text)
    }

    fn time_passed(&self) -> Ticks {
        self.time
    }

    fn release(self) {
        debug!(
            "maze engine released after {} ticks ({} mazes completed)",
            self.time, self.completed_mazes
        );
    }
}

fn derive_seed(grid: &PixelGrid) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(SEED_DOMAIN.as_bytes());
    hasher.update(grid.width().to_le_bytes());
    hasher.update(grid.height().to_le_bytes());
    hasher.update(grid.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}
