//! Producer handle: the only context allowed to advance `head`.

use crate::config::{CacheLine, CrossCore, MemoryModel, Padding};
use crate::counter::Counter;
use crate::error::{InsertError, RingError};
use crate::RingBuffer;
use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::ptr;

/// Write side of a [`RingBuffer`].
///
/// Obtained from [`RingBuffer::split`] or [`RingBuffer::try_split`]. There is
/// exactly one per buffer and every mutating method takes `&mut self`, so two
/// producer operations can never overlap. The handle is `Send` (for
/// `T: Send`) and can be moved into the producing thread or interrupt
/// context, but it is not `Sync`:
///
/// ```compile_fail
/// use ringspsc_rs::RingBuffer;
///
/// fn assert_sync<S: Sync>(_: &S) {}
///
/// let mut ring: RingBuffer<u32, 4> = RingBuffer::new();
/// let (producer, _consumer) = ring.split();
/// assert_sync(&producer);
/// ```
///
/// Nothing here blocks or retries: when the buffer is full an operation
/// reports that it made no (or partial) progress and the caller decides what
/// to do.
pub struct Producer<
    'a,
    T,
    const N: usize,
    M: MemoryModel = CrossCore,
    I: Counter = usize,
    P: Padding = CacheLine,
> {
    ring: &'a RingBuffer<T, N, M, I, P>,
    /// `Send` but not `Sync`: one context at a time owns this side.
    _not_sync: PhantomData<Cell<()>>,
}

impl<'a, T, const N: usize, M: MemoryModel, I: Counter, P: Padding> Producer<'a, T, N, M, I, P> {
    pub(crate) fn new(ring: &'a RingBuffer<T, N, M, I, P>) -> Self {
        Self {
            ring,
            _not_sync: PhantomData,
        }
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Returns the capacity `N`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Elements still waiting for the consumer.
    ///
    /// Only ever an overestimate while the consumer runs: it can drain more
    /// right after this snapshot, never less.
    #[inline]
    pub fn read_available(&self) -> usize {
        N - self.write_available()
    }

    /// Free slots. Only ever an underestimate while the consumer runs, so it
    /// is safe as a loop bound for inserts.
    #[inline]
    pub fn write_available(&self) -> usize {
        self.ring.free_slots(self.ring.load_head())
    }

    /// Free slots before the end of the backing array, i.e. how many elements
    /// a single contiguous copy could take right now.
    #[inline]
    pub fn write_available_contiguous(&self) -> usize {
        let head = self.ring.load_head();
        let free = self.ring.free_slots(head);
        RingBuffer::<T, N, M, I, P>::runs(head, free).1
    }

    /// Returns true if no slot is free.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.write_available() == 0
    }

    /// Returns true if the consumer has drained everything.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.write_available() == N
    }

    // =========================================================================
    // SINGLE ELEMENT
    // =========================================================================

    /// Inserts one element.
    ///
    /// Returns the element back inside [`InsertError`] when the buffer is
    /// full; nothing is written in that case.
    #[inline]
    pub fn insert(&mut self, value: T) -> Result<(), InsertError<T>> {
        let head = self.ring.load_head();
        if self.ring.free_slots(head) == 0 {
            return Err(InsertError(value));
        }

        // SAFETY: the slot at `head` is free (observed via `tail`) and only
        // the producer writes free slots.
        unsafe { ptr::write(self.ring.slot(head), value) };
        self.ring.publish_head(head.advance(1));
        Ok(())
    }

    /// Inserts the element returned by `acquire`, calling it only if a slot
    /// is free.
    ///
    /// Useful when obtaining the element has side effects that must not
    /// happen unless it can be stored, such as reading a peripheral data
    /// register that clears its status flag.
    #[inline]
    pub fn insert_with<F>(&mut self, acquire: F) -> Result<(), RingError>
    where
        F: FnOnce() -> T,
    {
        let head = self.ring.load_head();
        if self.ring.free_slots(head) == 0 {
            return Err(RingError::Full);
        }

        let value = acquire();
        // SAFETY: as in `insert`.
        unsafe { ptr::write(self.ring.slot(head), value) };
        self.ring.publish_head(head.advance(1));
        Ok(())
    }

    // =========================================================================
    // BULK TRANSFER
    // =========================================================================

    /// Copies as much of `src` as fits, in one pass.
    ///
    /// Availability is computed once, at most two contiguous copies are made
    /// (before and after the wrap point) and `head` is published once.
    /// Returns the number of elements written, which may be less than
    /// `src.len()`.
    pub fn write_buff(&mut self, src: &[T]) -> usize
    where
        T: Copy,
    {
        let head = self.ring.load_head();
        let count = src.len().min(self.ring.free_slots(head));
        if count == 0 {
            return 0;
        }

        // SAFETY: `count` slots past `head` are free.
        unsafe { self.ring.copy_in(head, &src[..count]) };
        self.ring.publish_head(head.advance(count));
        count
    }

    /// Streams `src` into the buffer across as many passes as the consumer's
    /// progress allows.
    ///
    /// - The first pass moves at most `count_to_callback` elements when that
    ///   is nonzero and smaller than `src.len()`, so the peer can be told
    ///   early that a first chunk is ready.
    /// - Every pass reloads the consumer's counter, copies what fits,
    ///   publishes `head`, then invokes `callback` if part of `src` is still
    ///   pending.
    /// - Stops once `src` is fully written or a pass finds no free slot.
    ///
    /// Returns the number of elements written. A short count means the
    /// consumer stalled; it is not an error.
    ///
    /// `callback` runs inline on the caller's context, after `head` has been
    /// published. It may notify the consumer's context but must not act as
    /// the consumer of this buffer itself: the consumer side belongs to one
    /// other context.
    pub fn write_buff_with<F>(&mut self, src: &[T], count_to_callback: usize, mut callback: F) -> usize
    where
        T: Copy,
        F: FnMut(),
    {
        let mut head = self.ring.load_head();
        let mut written = 0;
        let mut pass = if count_to_callback != 0 && count_to_callback < src.len() {
            count_to_callback
        } else {
            src.len()
        };

        while written < src.len() {
            let available = self.ring.free_slots(head);
            if available == 0 {
                break;
            }

            let count = pass.min(available);
            // SAFETY: `count` slots past `head` are free.
            unsafe { self.ring.copy_in(head, &src[written..written + count]) };
            head = head.advance(count);
            self.ring.publish_head(head);
            written += count;

            if written < src.len() {
                callback();
            }
            pass = src.len() - written;
        }

        written
    }

    // =========================================================================
    // CLEAR
    // =========================================================================

    /// Discards every element not yet read by rewinding `head` onto `tail`.
    /// Returns the number of elements dropped.
    ///
    /// # Safety
    ///
    /// The consumer must not be active while this runs, nor may it still hold
    /// references obtained before it: a consumer reading concurrently could
    /// observe slots that are being dropped and then overwritten. There is no
    /// compare-and-swap handshake that would make this safe; use
    /// [`Consumer::clear`](crate::Consumer::clear) where possible.
    pub unsafe fn clear(&mut self) -> usize {
        let head = self.ring.load_head();
        let tail = self.ring.observe_tail();
        let count = head.distance(tail);

        self.ring.drop_range(tail, count);
        self.ring.publish_head(tail);
        count
    }
}

impl<T, const N: usize, M: MemoryModel, I: Counter, P: Padding> fmt::Debug
    for Producer<'_, T, N, M, I, P>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("head", &self.ring.load_head())
            .field("write_available", &self.write_available())
            .finish()
    }
}
