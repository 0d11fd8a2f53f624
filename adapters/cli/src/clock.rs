//! Fixed-cadence frame clock standing in for a display refresh signal.

use std::{
    thread,
    time::{Duration, Instant},
};

use mazm_core::FrameTicket;
use mazm_driver::{FrameQueue, Scheduler};

/// Scheduler that releases queued tickets no faster than one per interval.
#[derive(Debug)]
pub(crate) struct FrameClock {
    queue: FrameQueue,
    interval: Duration,
    last_fire: Option<Instant>,
}

impl FrameClock {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            queue: FrameQueue::new(),
            interval,
            last_fire: None,
        }
    }

    /// Sleeps until the oldest queued ticket is due and returns it.
    ///
    /// Returns `None` immediately when nothing is queued.
    pub(crate) fn wait_next(&mut self) -> Option<FrameTicket> {
        if self.queue.is_empty() {
            return None;
        }

        if let Some(last) = self.last_fire {
            let due = last + self.interval;
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.last_fire = Some(Instant::now());
        self.queue.fire()
    }
}

impl Scheduler for FrameClock {
    fn schedule(&mut self) -> FrameTicket {
        self.queue.schedule()
    }

    fn cancel(&mut self, ticket: FrameTicket) {
        self.queue.cancel(ticket);
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::FrameClock;
    use mazm_driver::Scheduler;

    #[test]
    fn empty_clock_does_not_block() {
        let mut clock = FrameClock::new(Duration::from_secs(60));
        assert_eq!(clock.wait_next(), None);
    }

    #[test]
    fn cancelled_tickets_are_skipped() {
        let mut clock = FrameClock::new(Duration::ZERO);
        let first = clock.schedule();
        let second = clock.schedule();
        clock.cancel(first);

        assert_eq!(clock.wait_next(), Some(second));
        assert_eq!(clock.wait_next(), None);
    }

    #[test]
    fn consecutive_tickets_respect_the_interval() {
        let interval = Duration::from_millis(20);
        let mut clock = FrameClock::new(interval);
        let _ = clock.schedule();
        let _ = clock.schedule();

        let start = Instant::now();
        assert!(clock.wait_next().is_some());
        assert!(clock.wait_next().is_some());
        assert!(start.elapsed() >= interval);
    }
}
