//! Scheduling of driver iterations against a host frame clock.

use std::collections::VecDeque;

use mazm_core::FrameTicket;

/// Queues driver iterations on behalf of the host display clock.
///
/// The driver schedules at most one iteration at a time. Hosts fire the
/// returned tickets back into the driver when the next frame is due.
pub trait Scheduler {
    /// Queues the next iteration and returns its ticket.
    fn schedule(&mut self) -> FrameTicket;

    /// Withdraws a previously queued iteration. Unknown tickets are ignored.
    fn cancel(&mut self, ticket: FrameTicket);
}

/// First-in first-out ticket queue advanced manually by its owner.
#[derive(Clone, Debug, Default)]
pub struct FrameQueue {
    next_ticket: u64,
    pending: VecDeque<FrameTicket>,
    cancelled: u64,
}

impl FrameQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the oldest queued ticket.
    pub fn fire(&mut self) -> Option<FrameTicket> {
        self.pending.pop_front()
    }

    /// Tickets currently queued, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = FrameTicket> + '_ {
        self.pending.iter().copied()
    }

    /// Number of queued tickets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no ticket is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of tickets withdrawn through [`Scheduler::cancel`].
    #[must_use]
    pub const fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for FrameQueue {
    fn schedule(&mut self) -> FrameTicket {
        let ticket = FrameTicket::new(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.pending.push_back(ticket);
        ticket
    }

    fn cancel(&mut self, ticket: FrameTicket) {
        let before = self.pending.len();
        self.pending.retain(|queued| *queued != ticket);
        if self.pending.len() != before {
            self.cancelled = self.cancelled.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameQueue, Scheduler};

    #[test]
    fn tickets_fire_in_scheduling_order() {
        let mut queue = FrameQueue::new();
        let first = queue.schedule();
        let second = queue.schedule();

        assert_ne!(first, second);
        assert_eq!(queue.fire(), Some(first));
        assert_eq!(queue.fire(), Some(second));
        assert_eq!(queue.fire(), None);
    }

    #[test]
    fn cancelled_tickets_never_fire() {
        let mut queue = FrameQueue::new();
        let first = queue.schedule();
        let second = queue.schedule();
        queue.cancel(first);
        queue.cancel(first);

        assert_eq!(queue.cancelled(), 1);
        assert_eq!(queue.pending().collect::<Vec<_>>(), vec![second]);
        assert_eq!(queue.fire(), Some(second));
        assert!(queue.is_empty());
    }
}
