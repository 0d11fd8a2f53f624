//! Scoped ownership of a live engine instance.

use log::warn;
use mazm_core::{Engine, Ticks};

/// Exclusive owner of a live engine that releases it exactly once.
///
/// Calling [`EngineHandle::release`] consumes the handle. A handle dropped
/// without an explicit release still releases its engine, so every exit path
/// (replacement, shutdown, unwinding) disposes the instance.
#[derive(Debug)]
pub struct EngineHandle<E: Engine> {
    engine: Option<E>,
}

impl<E: Engine> EngineHandle<E> {
    /// Takes ownership of a freshly constructed engine.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Borrows the owned engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        self.engine
            .as_ref()
            .expect("engine handle is populated until released")
    }

    /// Mutably borrows the owned engine.
    pub fn engine_mut(&mut self) -> &mut E {
        self.engine
            .as_mut()
            .expect("engine handle is populated until released")
    }

    /// Releases the engine, returning the ticks it accumulated.
    pub fn release(mut self) -> Ticks {
        match self.engine.take() {
            Some(engine) => {
                let elapsed = engine.time_passed();
                engine.release();
                elapsed
            }
            None => Ticks::ZERO,
        }
    }
}

impl<E: Engine> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            warn!(
                "engine dropped without explicit release after {} ticks",
                engine.time_passed()
            );
            engine.release();
        }
    }
}
