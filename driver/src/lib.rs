#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Animation driver that owns the single live Mazm engine.
//!
//! The driver mediates every construction, replacement and disposal of the
//! engine and runs the render-then-tick loop one scheduled iteration at a
//! time. Adapters either call the driver's operations directly or submit
//! [`Command`] values through [`apply`]; both paths report [`Event`] values
//! describing the lifecycle changes that took place.

mod handle;
mod schedule;

use log::{debug, info, trace, warn};
use mazm_core::{
    Command, ConstructionError, Engine, EngineFactory, EngineGeneration, Event, Frame,
    FrameTicket, PixelGrid, StepCount, Ticks,
};
use thiserror::Error;

pub use self::handle::EngineHandle;
pub use self::schedule::{FrameQueue, Scheduler};

/// Display surface that receives every rendered frame.
pub trait FrameSink {
    /// Replaces the surface content with `frame`.
    fn publish(&mut self, frame: &Frame);
}

impl FrameSink for Vec<Frame> {
    fn publish(&mut self, frame: &Frame) {
        self.push(frame.clone());
    }
}

/// How the driver reacts to an engine reporting termination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TerminationPolicy {
    /// Stop scheduling once the engine reports termination.
    #[default]
    Honor,
    /// Keep iterating forever regardless of the engine's signal.
    Ignore,
}

/// Source of the tick count applied on each iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StepSource {
    /// Use the step count configured through [`Driver::set_speed`].
    #[default]
    Speed,
    /// Always apply the provided step count.
    Fixed(StepCount),
}

impl StepSource {
    /// Resolves the tick count for an iteration given the current speed.
    #[must_use]
    pub const fn resolve(self, speed: StepCount) -> StepCount {
        match self {
            Self::Speed => speed,
            Self::Fixed(steps) => steps,
        }
    }
}

/// Static configuration of a [`Driver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DriverConfig {
    /// Reaction to the engine's termination signal.
    pub termination: TerminationPolicy,
    /// Where each iteration's tick count comes from.
    pub steps: StepSource,
}

/// Failures reported by driver operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DriverError {
    /// A zero step count was requested; the previous value is kept.
    #[error("step count must be a positive integer (received {requested})")]
    InvalidSpeed {
        /// Step count that was requested.
        requested: u32,
    },
    /// The engine factory refused the seed; no engine is live.
    #[error("failed to construct engine")]
    Construction(#[from] ConstructionError),
}

/// Result of running a scheduled iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Iteration {
    /// The ticket did not match the pending iteration; nothing happened.
    Stale,
    /// A frame was published and the next iteration was scheduled.
    Continued,
    /// A frame was published and the engine reported termination.
    Terminated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Running { pending: FrameTicket },
    Terminated,
}

#[derive(Debug)]
struct LiveEngine<E: Engine> {
    handle: EngineHandle<E>,
    generation: EngineGeneration,
    state: RunState,
}

/// Owner of at most one live engine and of its scheduling loop.
pub struct Driver<F: EngineFactory, S: Scheduler, D: FrameSink> {
    factory: F,
    scheduler: S,
    surface: D,
    config: DriverConfig,
    speed: StepCount,
    live: Option<LiveEngine<F::Engine>>,
    last_generation: Option<EngineGeneration>,
    frames_published: u64,
}

impl<F: EngineFactory, S: Scheduler, D: FrameSink> Driver<F, S, D> {
    /// Creates an idle driver. No engine is live until an image is selected.
    #[must_use]
    pub fn new(factory: F, scheduler: S, surface: D, config: DriverConfig) -> Self {
        Self {
            factory,
            scheduler,
            surface,
            config,
            speed: StepCount::default(),
            live: None,
            last_generation: None,
            frames_published: 0,
        }
    }

    /// Replaces the live engine with one seeded from `grid`.
    ///
    /// Pending work for the current engine is cancelled and the engine is
    /// released before the factory runs, so two instances are never live at
    /// once. When construction fails the driver is left idle.
    pub fn select_image(
        &mut self,
        grid: PixelGrid,
        out_events: &mut Vec<Event>,
    ) -> Result<EngineGeneration, DriverError> {
        let _ = self.retire(out_events);

        let width = grid.width();
        let height = grid.height();
        let engine = match self.factory.construct(grid) {
            Ok(engine) => engine,
            Err(reason) => {
                warn!("engine construction rejected: {reason}");
                out_events.push(Event::ConstructionRejected {
                    reason: reason.clone(),
                });
                return Err(DriverError::Construction(reason));
            }
        };

        let generation = self
            .last_generation
            .map_or(EngineGeneration::new(1), EngineGeneration::next);
        self.last_generation = Some(generation);

        let pending = self.scheduler.schedule();
        self.live = Some(LiveEngine {
            handle: EngineHandle::new(engine),
            generation,
            state: RunState::Running { pending },
        });

        debug!(
            "engine {} constructed from {width}x{height} grid",
            generation.get()
        );
        out_events.push(Event::EngineConstructed {
            generation,
            width,
            height,
        });
        Ok(generation)
    }

    /// Sets the number of ticks applied per iteration from the next one on.
    pub fn set_speed(
        &mut self,
        requested: u32,
        out_events: &mut Vec<Event>,
    ) -> Result<StepCount, DriverError> {
        let Some(speed) = StepCount::new(requested) else {
            warn!("ignoring speed {requested}; keeping {}", self.speed);
            out_events.push(Event::SpeedRejected { requested });
            return Err(DriverError::InvalidSpeed { requested });
        };

        self.speed = speed;
        out_events.push(Event::SpeedChanged { speed });
        Ok(speed)
    }

    /// Runs the iteration identified by `ticket`.
    ///
    /// The current state is rendered and published before the engine is
    /// ticked, so the published frame shows the state preceding the tick that
    /// may terminate the simulation. Tickets that were cancelled, or that
    /// belong to a released engine, are ignored.
    pub fn on_frame(&mut self, ticket: FrameTicket, out_events: &mut Vec<Event>) -> Iteration {
        let Some(live) = self.live.as_mut() else {
            trace!("ignoring frame {} with no live engine", ticket.get());
            out_events.push(Event::StaleFrameIgnored { ticket });
            return Iteration::Stale;
        };
        if live.state != (RunState::Running { pending: ticket }) {
            trace!("ignoring stale frame {}", ticket.get());
            out_events.push(Event::StaleFrameIgnored { ticket });
            return Iteration::Stale;
        }

        let generation = live.generation;
        let engine = live.handle.engine_mut();

        let frame = engine.render();
        let rendered_at = engine.time_passed();
        self.surface.publish(&frame);
        self.frames_published = self.frames_published.saturating_add(1);
        out_events.push(Event::FramePublished {
            generation,
            elapsed: rendered_at,
        });

        let steps = self.config.steps.resolve(self.speed);
        let outcome = engine.tick(steps.get());
        let elapsed = engine.time_passed();
        out_events.push(Event::Advanced {
            generation,
            steps,
            elapsed,
        });

        if outcome.is_terminal() && self.config.termination == TerminationPolicy::Honor {
            live.state = RunState::Terminated;
            info!(
                "simulation {} terminated after {elapsed} ticks",
                generation.get()
            );
            out_events.push(Event::SimulationTerminated {
                generation,
                elapsed,
            });
            return Iteration::Terminated;
        }

        live.state = RunState::Running {
            pending: self.scheduler.schedule(),
        };
        Iteration::Continued
    }

    /// Cancels pending work and releases the live engine, if any.
    pub fn shutdown(&mut self, out_events: &mut Vec<Event>) {
        if self.retire(out_events).is_none() {
            trace!("shutdown with no live engine");
        }
    }

    fn retire(&mut self, out_events: &mut Vec<Event>) -> Option<Ticks> {
        let LiveEngine {
            handle,
            generation,
            state,
        } = self.live.take()?;

        if let RunState::Running { pending } = state {
            self.scheduler.cancel(pending);
        }
        let elapsed = handle.release();

        debug!(
            "engine {} released after {elapsed} ticks",
            generation.get()
        );
        out_events.push(Event::EngineReleased {
            generation,
            elapsed,
        });
        Some(elapsed)
    }

    /// Step count applied when [`StepSource::Speed`] is configured.
    #[must_use]
    pub const fn speed(&self) -> StepCount {
        self.speed
    }

    /// Configuration the driver was created with.
    #[must_use]
    pub const fn config(&self) -> DriverConfig {
        self.config
    }

    /// Reports whether an engine is live, running or terminated.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Reports whether an iteration is currently scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(
            self.live.as_ref().map(|live| live.state),
            Some(RunState::Running { .. })
        )
    }

    /// Ticket of the iteration currently scheduled, if any.
    #[must_use]
    pub fn pending_ticket(&self) -> Option<FrameTicket> {
        match self.live.as_ref()?.state {
            RunState::Running { pending } => Some(pending),
            RunState::Terminated => None,
        }
    }

    /// Generation of the live engine.
    #[must_use]
    pub fn generation(&self) -> Option<EngineGeneration> {
        self.live.as_ref().map(|live| live.generation)
    }

    /// Ticks accumulated by the live engine.
    #[must_use]
    pub fn time_passed(&self) -> Option<Ticks> {
        self.live
            .as_ref()
            .map(|live| live.handle.engine().time_passed())
    }

    /// Renders the live engine without advancing it.
    #[must_use]
    pub fn current_frame(&self) -> Option<Frame> {
        self.live.as_ref().map(|live| live.handle.engine().render())
    }

    /// Number of frames handed to the surface since the driver was created.
    #[must_use]
    pub const fn frames_published(&self) -> u64 {
        self.frames_published
    }

    /// Borrows the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutably borrows the scheduler so hosts can fire due tickets.
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Borrows the display surface.
    #[must_use]
    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// Borrows the engine factory.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

/// Applies the provided command to the driver.
///
/// Failures are reported through `out_events` rather than returned.
pub fn apply<F, S, D>(driver: &mut Driver<F, S, D>, command: Command, out_events: &mut Vec<Event>)
where
    F: EngineFactory,
    S: Scheduler,
    D: FrameSink,
{
    match command {
        Command::SelectImage { grid } => {
            let _ = driver.select_image(grid, out_events);
        }
        Command::SetSpeed { steps } => {
            let _ = driver.set_speed(steps, out_events);
        }
        Command::Frame { ticket } => {
            let _ = driver.on_frame(ticket, out_events);
        }
        Command::Shutdown => driver.shutdown(out_events),
    }
}
