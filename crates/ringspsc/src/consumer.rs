//! Consumer handle: the only context allowed to advance `tail`.

use crate::config::{CacheLine, CrossCore, MemoryModel, Padding};
use crate::counter::Counter;
use crate::error::RingError;
use crate::invariants::{debug_assert_published, debug_assert_within};
use crate::RingBuffer;
use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use core::{ptr, slice};

/// Read side of a [`RingBuffer`].
///
/// Besides removing elements, the consumer may look at and modify any
/// element it has not yet removed: the producer cannot touch a slot again
/// until `tail` has moved past it, so these accessors need no lock.
///
/// The handle is `Send` (for `T: Send`) but not `Sync`. Shared references
/// handed out by [`at`](Self::at), [`peek`](Self::peek) or
/// [`as_slices`](Self::as_slices) therefore stay on one context, even for
/// element types such as `Cell` that must not be shared between threads:
///
/// ```compile_fail
/// use ringspsc_rs::RingBuffer;
/// use std::cell::Cell;
///
/// fn assert_sync<S: Sync>(_: &S) {}
///
/// let mut ring: RingBuffer<Cell<u64>, 4> = RingBuffer::new();
/// let (_producer, consumer) = ring.split();
/// assert_sync(&consumer);
/// ```
pub struct Consumer<
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

impl<'a, T, const N: usize, M: MemoryModel, I: Counter, P: Padding> Consumer<'a, T, N, M, I, P> {
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

    /// Elements published and not yet removed.
    ///
    /// A lower bound while the producer runs, and the bound that makes
    /// [`get_unchecked`](Self::get_unchecked) sound for every index below it.
    #[inline]
    pub fn read_available(&self) -> usize {
        self.ring.filled_slots(self.ring.load_tail())
    }

    /// Free slots as seen from the consumer.
    #[inline]
    pub fn write_available(&self) -> usize {
        N - self.read_available()
    }

    /// Unread elements before the end of the backing array.
    #[inline]
    pub fn read_available_contiguous(&self) -> usize {
        let tail = self.ring.load_tail();
        let filled = self.ring.filled_slots(tail);
        RingBuffer::<T, N, M, I, P>::runs(tail, filled).1
    }

    /// Returns true if nothing has been published.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read_available() == 0
    }

    /// Returns true if every slot holds an unread element.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.read_available() == N
    }

    // =========================================================================
    // SINGLE ELEMENT
    // =========================================================================

    /// Removes the oldest element, or returns `None` if the buffer is empty.
    #[inline]
    pub fn remove(&mut self) -> Option<T> {
        let tail = self.ring.load_tail();
        if self.ring.filled_slots(tail) == 0 {
            return None;
        }

        // SAFETY: the slot at `tail` was published by the producer; moving
        // `tail` past it afterwards hands the slot back uninitialized.
        let value = unsafe { ptr::read(self.ring.slot(tail)) };
        self.ring.publish_tail(tail.advance(1));
        Some(value)
    }

    /// The oldest unread element, without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.at(0).ok()
    }

    /// Mutable access to the oldest unread element.
    #[inline]
    pub fn peek_mut(&mut self) -> Option<&mut T> {
        self.at_mut(0).ok()
    }

    // =========================================================================
    // RANDOM ACCESS
    // =========================================================================

    /// The `index`-th unread element, 0 being the oldest.
    ///
    /// Fails with [`RingError::OutOfRange`] if `index >= read_available()`.
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T, RingError> {
        let available = self.read_available();
        if index >= available {
            return Err(RingError::OutOfRange { index, available });
        }
        // SAFETY: just bounded by a fresh `read_available`.
        Ok(unsafe { self.get_unchecked(index) })
    }

    /// Mutable counterpart of [`at`](Self::at).
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, RingError> {
        let available = self.read_available();
        if index >= available {
            return Err(RingError::OutOfRange { index, available });
        }
        // SAFETY: just bounded by a fresh `read_available`.
        Ok(unsafe { self.get_unchecked_mut(index) })
    }

    /// The `index`-th unread element without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be below a value returned by an earlier
    /// [`read_available`](Self::read_available) on this consumer, with no
    /// removal in between. That call's acquire is what makes the slot
    /// contents visible here.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert_published!(index, self.ring.filled_slots(self.ring.load_tail()));
        &*self.ring.slot(self.ring.load_tail().advance(index))
    }

    /// Mutable counterpart of [`get_unchecked`](Self::get_unchecked).
    ///
    /// # Safety
    ///
    /// Same requirement as [`get_unchecked`](Self::get_unchecked).
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert_published!(index, self.ring.filled_slots(self.ring.load_tail()));
        &mut *self.ring.slot(self.ring.load_tail().advance(index))
    }

    /// The unread region as two slices: the run up to the end of the backing
    /// array and the wrapped-around remainder (empty if nothing wraps).
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let tail = self.ring.load_tail();
        let filled = self.ring.filled_slots(tail);
        let (_, first, second) = RingBuffer::<T, N, M, I, P>::runs(tail, filled);

        // SAFETY: both runs lie inside the published region, which the
        // producer leaves alone until `tail` moves, and `&self` keeps any
        // removal from happening while the slices are alive.
        unsafe {
            (
                slice::from_raw_parts(self.ring.slot(tail), first),
                slice::from_raw_parts(self.ring.slot(tail.advance(first)), second),
            )
        }
    }

    // =========================================================================
    // BULK TRANSFER
    // =========================================================================

    /// Copies up to `dst.len()` elements out, in one pass.
    ///
    /// Availability is computed once, at most two contiguous copies are made
    /// and `tail` is published once. Returns the number of elements read.
    pub fn read_buff(&mut self, dst: &mut [T]) -> usize
    where
        T: Copy,
    {
        let tail = self.ring.load_tail();
        let count = dst.len().min(self.ring.filled_slots(tail));
        if count == 0 {
            return 0;
        }

        // SAFETY: `count` elements past `tail` are published.
        unsafe { self.ring.copy_out(tail, &mut dst[..count]) };
        self.ring.publish_tail(tail.advance(count));
        count
    }

    /// Drains into `dst` across as many passes as the producer's progress
    /// allows.
    ///
    /// Mirrors [`Producer::write_buff_with`](crate::Producer::write_buff_with):
    /// the first pass is capped at `count_to_callback` when that is nonzero
    /// and smaller than `dst.len()`, every pass reloads the producer's
    /// counter and publishes `tail`, and `callback` runs after each pass that
    /// leaves `dst` not yet full. Stops when `dst` is full or a pass finds
    /// nothing to read.
    ///
    /// As on the producer side, `callback` must not act as the producer of
    /// this buffer.
    pub fn read_buff_with<F>(&mut self, dst: &mut [T], count_to_callback: usize, mut callback: F) -> usize
    where
        T: Copy,
        F: FnMut(),
    {
        let mut tail = self.ring.load_tail();
        let mut read = 0;
        let mut pass = if count_to_callback != 0 && count_to_callback < dst.len() {
            count_to_callback
        } else {
            dst.len()
        };

        while read < dst.len() {
            let available = self.ring.filled_slots(tail);
            if available == 0 {
                break;
            }

            let count = pass.min(available);
            // SAFETY: `count` elements past `tail` are published.
            unsafe { self.ring.copy_out(tail, &mut dst[read..read + count]) };
            tail = tail.advance(count);
            self.ring.publish_tail(tail);
            read += count;

            if read < dst.len() {
                callback();
            }
            pass = dst.len() - read;
        }

        read
    }

    /// Drops the `count` oldest elements and hands their slots back.
    pub(crate) fn release(&mut self, count: usize) {
        let tail = self.ring.load_tail();
        debug_assert_within!(count, self.ring.filled_slots(tail));
        // SAFETY: the caller read `count` out of the published region.
        unsafe { self.ring.drop_range(tail, count) };
        self.ring.publish_tail(tail.advance(count));
    }

    // =========================================================================
    // CLEAR
    // =========================================================================

    /// Drops every element published so far by moving `tail` onto the
    /// observed `head`. Returns the number of elements dropped.
    ///
    /// Elements the producer publishes while this runs simply stay in the
    /// buffer. Racing this against [`Producer::clear`](crate::Producer::clear)
    /// is the caller's responsibility to avoid.
    pub fn clear(&mut self) -> usize {
        let count = self.read_available();
        self.release(count);
        count
    }
}

impl<T, const N: usize, M: MemoryModel, I: Counter, P: Padding> Index<usize>
    for Consumer<'_, T, N, M, I, P>
{
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index >= read_available()`.
    fn index(&self, index: usize) -> &T {
        match self.at(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, const N: usize, M: MemoryModel, I: Counter, P: Padding> IndexMut<usize>
    for Consumer<'_, T, N, M, I, P>
{
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.at_mut(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, const N: usize, M: MemoryModel, I: Counter, P: Padding> fmt::Debug
    for Consumer<'_, T, N, M, I, P>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("tail", &self.ring.load_tail())
            .field("read_available", &self.read_available())
            .finish()
    }
}
