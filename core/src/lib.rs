#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Mazm animation stack.
//!
//! This crate defines the data that flows between the image sampler, the
//! simulation engine and the animation driver, together with the message
//! surface that connects adapters to the driver. Adapters submit [`Command`]
//! values describing desired lifecycle changes, the driver executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing what happened. Engines implement [`Engine`] and are built by an
//! [`EngineFactory`] from exactly one [`PixelGrid`].

use std::{fmt, num::NonZeroU32};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bytes that encode a single RGBA sample.
pub const CHANNELS: usize = 4;

/// A single RGBA sample taken from the source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl Rgba {
    /// Creates a new sample from byte RGBA components.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Red component of the sample.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the sample.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the sample.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Alpha component of the sample.
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Sum of the colour channels, ranging from 0 (black) to 765 (white).
    ///
    /// Alpha does not contribute.
    #[must_use]
    pub const fn brightness(&self) -> u16 {
        self.red as u16 + self.green as u16 + self.blue as u16
    }
}

/// Row-major RGBA samples covering a `width × height` grid.
///
/// The grid is produced once per image selection and consumed by engine
/// construction. Dimensions come from the sampler's configuration, never from
/// the native resolution of the decoded image.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl PixelGrid {
    /// Wraps raw RGBA bytes, validating them against the declared dimensions.
    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, PixelGridError> {
        if width == 0 || height == 0 {
            return Err(PixelGridError::ZeroDimension { width, height });
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|cells| cells.checked_mul(CHANNELS))
            .ok_or(PixelGridError::TooLarge { width, height })?;
        if bytes.len() != expected {
            return Err(PixelGridError::LengthMismatch {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bytes,
        })
    }

    /// Wraps raw RGBA bytes describing a square grid of `size × size` samples.
    pub fn square(size: u32, bytes: Vec<u8>) -> Result<Self, PixelGridError> {
        Self::new(size, size, bytes)
    }

    /// Builds a grid where every sample carries the same colour.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Result<Self, PixelGridError> {
        let cells = (width as usize).saturating_mul(height as usize);
        let pixel = [color.red, color.green, color.blue, color.alpha];
        let bytes = pixel
            .iter()
            .copied()
            .cycle()
            .take(cells.saturating_mul(CHANNELS))
            .collect();
        Self::new(width, height, bytes)
    }

    /// Number of sample columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of sample rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of samples in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len() / CHANNELS
    }

    /// Reports whether the grid holds no samples. Always `false` for a
    /// validated grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the sample at the provided column and row, if in bounds.
    #[must_use]
    pub fn sample(&self, column: u32, row: u32) -> Option<Rgba> {
        if column >= self.width || row >= self.height {
            return None;
        }

        let index = (row as usize * self.width as usize + column as usize) * CHANNELS;
        self.bytes
            .get(index..index + CHANNELS)
            .map(|pixel| Rgba::new(pixel[0], pixel[1], pixel[2], pixel[3]))
    }

    /// Iterates over every sample in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = Rgba> + '_ {
        self.bytes
            .chunks_exact(CHANNELS)
            .map(|pixel| Rgba::new(pixel[0], pixel[1], pixel[2], pixel[3]))
    }

    /// Raw RGBA bytes in row-major order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for PixelGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelGrid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Reasons a pixel grid is rejected before it can seed an engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PixelGridError {
    /// Either dimension was zero.
    #[error("pixel grid dimensions {width}x{height} must both be positive")]
    ZeroDimension {
        /// Declared number of columns.
        width: u32,
        /// Declared number of rows.
        height: u32,
    },
    /// The byte size implied by the dimensions does not fit in `usize`.
    #[error("pixel grid dimensions {width}x{height} are too large to address")]
    TooLarge {
        /// Declared number of columns.
        width: u32,
        /// Declared number of rows.
        height: u32,
    },
    /// The byte buffer does not hold exactly `width × height × 4` bytes.
    #[error("pixel grid {width}x{height} expects {expected} bytes but received {actual}")]
    LengthMismatch {
        /// Declared number of columns.
        width: u32,
        /// Declared number of rows.
        height: u32,
        /// Byte count implied by the dimensions.
        expected: usize,
        /// Byte count actually supplied.
        actual: usize,
    },
}

/// Textual rendering of an engine's state at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Frame(String);

impl Frame {
    /// Wraps rendered text into a frame.
    #[must_use]
    pub fn new(text: String) -> Self {
        Self(text)
    }

    /// Borrows the frame's text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the frame, yielding its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Reports whether the frame contains no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of simulation ticks applied per rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StepCount(NonZeroU32);

impl StepCount {
    /// The default step count of one tick per frame.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Creates a step count, rejecting zero.
    #[must_use]
    pub const fn new(steps: u32) -> Option<Self> {
        match NonZeroU32::new(steps) {
            Some(steps) => Some(Self(steps)),
            None => None,
        }
    }

    /// Retrieves the number of ticks per frame.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for StepCount {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for StepCount {
    type Error = InvalidStepCount;

    fn try_from(steps: u32) -> Result<Self, Self::Error> {
        Self::new(steps).ok_or(InvalidStepCount)
    }
}

impl From<StepCount> for u32 {
    fn from(steps: StepCount) -> Self {
        steps.get()
    }
}

impl fmt::Display for StepCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejection raised when a zero step count is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("step count must be a positive integer")]
pub struct InvalidStepCount;

/// Total simulation ticks elapsed since an engine was constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Ticks(u64);

impl Ticks {
    /// No ticks elapsed.
    pub const ZERO: Self = Self(0);

    /// Creates a tick counter with the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric tick count.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the counter advanced by `steps`, saturating at the maximum.
    #[must_use]
    pub const fn advanced_by(self, steps: u32) -> Self {
        Self(self.0.saturating_add(steps as u64))
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signal returned by [`Engine::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickOutcome {
    /// The simulation may be ticked again.
    Continue,
    /// The simulation reached a terminal state and must not be ticked again.
    Terminated,
}

impl TickOutcome {
    /// Reports whether the outcome is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// Stateful simulation seeded from a [`PixelGrid`].
///
/// Implementations must be deterministic: identical seeds and identical
/// sequences of [`Engine::tick`] calls render identical frames.
pub trait Engine {
    /// Advances the simulation by exactly `steps` ticks.
    ///
    /// Elapsed ticks grow by `steps` regardless of the outcome. Callers must
    /// not tick again after observing [`TickOutcome::Terminated`].
    fn tick(&mut self, steps: u32) -> TickOutcome;

    /// Renders the current state. Must not mutate the engine.
    fn render(&self) -> Frame;

    /// Total ticks applied since construction.
    fn time_passed(&self) -> Ticks;

    /// Releases the instance and every resource it holds.
    ///
    /// Consuming `self` makes further use of a released instance, and a
    /// second release, impossible to express.
    fn release(self)
    where
        Self: Sized;
}

/// Builds engine instances from sampled pixel data.
pub trait EngineFactory {
    /// Engine type produced by the factory.
    type Engine: Engine;

    /// Constructs a new instance seeded from `grid`. The grid is consumed.
    fn construct(&mut self, grid: PixelGrid) -> Result<Self::Engine, ConstructionError>;
}

/// Reasons an engine factory refuses to build an instance.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// The grid exceeds what the engine can address.
    #[error("grid of {width}x{height} samples exceeds the engine capacity")]
    TooLarge {
        /// Columns in the rejected grid.
        width: u32,
        /// Rows in the rejected grid.
        height: u32,
    },
    /// The engine rejected the seed for an implementation-specific reason.
    #[error("engine rejected seed: {0}")]
    Rejected(String),
}

/// Sequence number assigned to each constructed engine instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineGeneration(u32);

impl EngineGeneration {
    /// Creates a generation with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric generation.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the generation that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Identifier of a scheduled driver iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameTicket(u64);

impl FrameTicket {
    /// Creates a ticket with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the ticket.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Commands that express every permissible driver mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replaces the live engine with one seeded from the provided grid.
    SelectImage {
        /// Fully sampled pixel data for the newly selected image.
        grid: PixelGrid,
    },
    /// Changes how many ticks elapse per rendered frame.
    SetSpeed {
        /// Requested ticks per frame; zero is rejected.
        steps: u32,
    },
    /// Runs the scheduled iteration identified by the ticket.
    Frame {
        /// Ticket handed out by the scheduler when the iteration was queued.
        ticket: FrameTicket,
    },
    /// Cancels pending work and releases the live engine.
    Shutdown,
}

/// Events reported by the driver after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A new engine instance became live.
    EngineConstructed {
        /// Generation assigned to the instance.
        generation: EngineGeneration,
        /// Columns of the seed grid.
        width: u32,
        /// Rows of the seed grid.
        height: u32,
    },
    /// The factory refused to build an instance; nothing is live.
    ConstructionRejected {
        /// Reason reported by the factory.
        reason: ConstructionError,
    },
    /// A live instance was released.
    EngineReleased {
        /// Generation of the released instance.
        generation: EngineGeneration,
        /// Ticks the instance had accumulated when it was released.
        elapsed: Ticks,
    },
    /// A frame was rendered and handed to the display surface.
    FramePublished {
        /// Generation of the instance that produced the frame.
        generation: EngineGeneration,
        /// Ticks elapsed at the moment the frame was rendered.
        elapsed: Ticks,
    },
    /// The live instance was advanced.
    Advanced {
        /// Generation of the advanced instance.
        generation: EngineGeneration,
        /// Number of ticks applied.
        steps: StepCount,
        /// Ticks elapsed after the advance.
        elapsed: Ticks,
    },
    /// The live instance reported termination and scheduling stopped.
    SimulationTerminated {
        /// Generation of the terminated instance.
        generation: EngineGeneration,
        /// Total ticks elapsed when termination was observed.
        elapsed: Ticks,
    },
    /// The step count changed.
    SpeedChanged {
        /// Step count applied from the next iteration onwards.
        speed: StepCount,
    },
    /// A zero step count was requested and ignored.
    SpeedRejected {
        /// Step count that was requested.
        requested: u32,
    },
    /// A ticket fired that no longer matches any pending iteration.
    StaleFrameIgnored {
        /// Ticket that was ignored.
        ticket: FrameTicket,
    },
}
