//! Waiting on the opposite side of a ring.
//!
//! Every ring operation returns at once. `insert` on a full ring hands the
//! element back, `remove` on an empty ring returns `None`, and the bulk
//! copies report `0` when there is no room or nothing to read. A caller that
//! must wait for the other side polls again, and [`Backoff`] paces those
//! polls: short `PAUSE` bursts first, so a consumer that is about to drain a
//! slot is picked up within a few hundred cycles, then OS yields (with
//! `std`), then a signal to stop waiting.
//!
//! Nothing inside [`RingBuffer`](crate::RingBuffer) uses it. An interrupt
//! handler never waits on the main loop, and `SameCore` rings have nobody
//! else to yield to, so the wait policy stays with the caller.

use core::hint;

/// Paces a caller that polls a [`Producer`](crate::Producer) or
/// [`Consumer`](crate::Consumer) which made no progress.
///
/// Call [`snooze`](Self::snooze) after each poll that moved nothing and
/// [`reset`](Self::reset) after each poll that moved something. Once
/// [`is_completed`](Self::is_completed) reports `true`, the other side has
/// been idle for the whole spin and yield schedule and the caller should
/// park or report the stall. [`retry`](Self::retry) wraps that loop for
/// single-element operations.
///
/// ```
/// use ringspsc_rs::{Backoff, RingBuffer};
///
/// let mut ring: RingBuffer<u32, 8> = RingBuffer::new();
/// let (mut tx, mut rx) = ring.split();
/// let mut backoff = Backoff::new();
///
/// assert_eq!(backoff.retry(|| rx.remove()), None);
/// assert!(backoff.is_completed());
///
/// backoff.reset();
/// tx.insert(7).unwrap();
/// assert_eq!(backoff.retry(|| rx.remove()), Some(7));
/// ```
#[derive(Debug)]
pub struct Backoff {
    idle_polls: u32,
}

impl Backoff {
    /// Idle polls answered by spinning; the burst doubles each time up to
    /// `2^SPIN_ROUNDS` hints.
    const SPIN_ROUNDS: u32 = 6;
    /// Idle polls after which the wait is over.
    const GIVE_UP_AFTER: u32 = 10;

    #[inline]
    pub const fn new() -> Self {
        Self { idle_polls: 0 }
    }

    /// Busy-waits for a burst that doubles with each idle poll.
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..Self::burst(self.idle_polls) {
            hint::spin_loop();
        }
        if self.idle_polls <= Self::SPIN_ROUNDS {
            self.idle_polls += 1;
        }
    }

    /// Waits after a poll that moved nothing: spins while the other side is
    /// likely just behind, then yields the thread.
    ///
    /// Without `std` there is no scheduler to yield to, so the longest burst
    /// repeats instead.
    #[inline]
    pub fn snooze(&mut self) {
        if self.idle_polls <= Self::SPIN_ROUNDS {
            self.spin();
            return;
        }

        #[cfg(feature = "std")]
        std::thread::yield_now();
        #[cfg(not(feature = "std"))]
        for _ in 0..Self::burst(Self::SPIN_ROUNDS) {
            hint::spin_loop();
        }

        if self.idle_polls <= Self::GIVE_UP_AFTER {
            self.idle_polls += 1;
        }
    }

    /// `true` once the other side has stayed idle through every round.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.idle_polls > Self::GIVE_UP_AFTER
    }

    /// Starts the schedule over, after the ring made progress.
    #[inline]
    pub fn reset(&mut self) {
        self.idle_polls = 0;
    }

    /// Polls `attempt` until it returns `Some`, snoozing in between.
    ///
    /// Returns `None` once the schedule runs out. A success resets the
    /// schedule, so one instance can serve a whole transfer.
    pub fn retry<R, F>(&mut self, mut attempt: F) -> Option<R>
    where
        F: FnMut() -> Option<R>,
    {
        loop {
            if let Some(value) = attempt() {
                self.reset();
                return Some(value);
            }
            if self.is_completed() {
                return None;
            }
            self.snooze();
        }
    }

    #[inline]
    const fn burst(round: u32) -> u32 {
        let round = if round < Self::SPIN_ROUNDS { round } else { Self::SPIN_ROUNDS };
        1 << round
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
