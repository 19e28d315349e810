use crate::config::{CacheLine, CrossCore, MemoryModel, Padding, SameCore};
use crate::counter::Counter;
use crate::invariants::{debug_assert_bounded_count, debug_assert_within};
use crate::{Consumer, Producer};
#[cfg(target_has_atomic = "8")]
use crate::RingError;
use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ops::{Deref, DerefMut};
use core::ptr;
use core::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// ## Free-running counters
//
// `head` counts every element ever inserted, `tail` every element ever
// removed. Neither is ever masked; a slot is `counter & (N - 1)`. The occupied
// count is the wrapping difference `head - tail`, which always lies in
// `[0, N]`. Because the counter type has at least one bit more than slot
// indexing needs, `head == tail` unambiguously means empty and `N` resident
// elements unambiguously means full. No slot is sacrificed.
//
// ## Protocol
//
// **Producer (insert / write_buff):**
// 1. Load `head` with Relaxed (only the producer writes it)
// 2. Load `tail` through `M::load_opposing` (acquire, or relaxed + compiler fence)
// 3. Write into the free slots `[head, head + n)`
// 4. Publish `head + n` through `M::publish` (release, or compiler fence + relaxed)
//
// **Consumer (remove / read_buff):**
// 1. Load `tail` with Relaxed (only the consumer writes it)
// 2. Load `head` through `M::load_opposing`
// 3. Read or mutate the published slots `[tail, tail + n)`
// 4. Publish `tail + n` through `M::publish`
//
// A slot is therefore touched by exactly one side at a time: the producer
// until it publishes `head` past it, the consumer until it publishes `tail`
// past it. Nothing else guards the slots.
//
// An availability snapshot stays valid while the peer keeps running: the
// peer can only move its own counter forward, which only ever grows the
// space (or data) seen by this side.
//
// =============================================================================

/// Field wrapper that aligns `value` to the padding marker `P`.
///
/// With [`CacheLine`] each wrapped field starts on its own cache line and is
/// padded to a whole line; with [`Packed`](crate::Packed) the wrapper is
/// transparent.
#[repr(C)]
struct Aligned<A, P> {
    _align: [P; 0],
    value: A,
}

impl<A, P> Aligned<A, P> {
    const fn new(value: A) -> Self {
        Self { _align: [], value }
    }
}

impl<A, P> Deref for Aligned<A, P> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.value
    }
}

impl<A, P> DerefMut for Aligned<A, P> {
    fn deref_mut(&mut self) -> &mut A {
        &mut self.value
    }
}

/// Lock-free single-producer single-consumer ring buffer with `N` slots.
///
/// # Type Parameters
///
/// - `T`: element type
/// - `N`: capacity, a power of two, at least 2; every slot is usable
/// - `M`: [`MemoryModel`], [`CrossCore`] or [`SameCore`]
/// - `I`: [`Counter`] type for `head`/`tail`; must satisfy `N <= 2^(BITS-1)`
/// - `P`: [`Padding`], [`CacheLine`] or [`Packed`](crate::Packed)
///
/// Configuration errors (bad capacity, too narrow a counter) are rejected at
/// compile time when the constructor is instantiated.
///
/// # Memory Layout
///
/// ```text
/// ┌──────────────────────────────────────────────┐
/// │ head: I::Atomic   ← producer writes          │ aligned to P
/// ├──────────────────────────────────────────────┤
/// │ tail: I::Atomic   ← consumer writes          │ aligned to P
/// ├──────────────────────────────────────────────┤
/// │ split: AtomicBool (cold)                     │
/// ├──────────────────────────────────────────────┤
/// │ [UnsafeCell<MaybeUninit<T>>; N]              │ aligned to P
/// └──────────────────────────────────────────────┘
/// ```
///
/// # Rejected configurations
///
/// A capacity that is not a power of two:
///
/// ```compile_fail
/// use ringspsc_rs::RingBuffer;
///
/// let _ring: RingBuffer<u8, 3> = RingBuffer::new();
/// ```
///
/// A capacity below 2:
///
/// ```compile_fail
/// use ringspsc_rs::RingBuffer;
///
/// let _ring: RingBuffer<u8, 1> = RingBuffer::new();
/// ```
///
/// A counter too narrow for the capacity (`u8` allows at most 128 slots):
///
/// ```compile_fail
/// use ringspsc_rs::{CrossCore, Packed, RingBuffer};
///
/// let _ring: RingBuffer<u8, 256, CrossCore, u8, Packed> = RingBuffer::new();
/// ```
///
/// The same counter with 128 slots is fine:
///
/// ```
/// use ringspsc_rs::{CrossCore, Packed, RingBuffer};
///
/// let ring: RingBuffer<u8, 128, CrossCore, u8, Packed> = RingBuffer::new();
/// assert_eq!(ring.capacity(), 128);
/// ```
///
/// # Example
///
/// ```
/// use ringspsc_rs::RingBuffer;
///
/// let mut ring: RingBuffer<u32, 8> = RingBuffer::new();
/// let (mut producer, mut consumer) = ring.split();
///
/// producer.insert(7).unwrap();
/// assert_eq!(producer.write_buff(&[8, 9]), 2);
///
/// assert_eq!(consumer.remove(), Some(7));
/// let mut out = [0; 4];
/// assert_eq!(consumer.read_buff(&mut out), 2);
/// assert_eq!(&out[..2], &[8, 9]);
/// ```
#[repr(C)]
pub struct RingBuffer<
    T,
    const N: usize,
    M: MemoryModel = CrossCore,
    I: Counter = usize,
    P: Padding = CacheLine,
> {
    /// Elements ever inserted (written by producer, read by consumer)
    head: Aligned<I::Atomic, P>,
    /// Elements ever removed (written by consumer, read by producer)
    tail: Aligned<I::Atomic, P>,
    /// Set once the producer/consumer pair has been handed out
    split: AtomicBool,
    buffer: Aligned<[UnsafeCell<MaybeUninit<T>>; N], P>,
    _model: PhantomData<M>,
}

// Safety: slots are only touched by the side that currently owns them under
// the counter protocol, and elements cross from one context to the other,
// hence `T: Send`.
unsafe impl<T: Send, const N: usize, M: MemoryModel, I: Counter, P: Padding> Sync
    for RingBuffer<T, N, M, I, P>
{
}

impl<T, const N: usize, M: MemoryModel, I: Counter, P: Padding> RingBuffer<T, N, M, I, P> {
    /// Slot mask; evaluating it checks the configuration at compile time.
    const MASK: usize = {
        assert!(N >= 2, "ring buffer capacity must be at least 2");
        assert!(N.is_power_of_two(), "ring buffer capacity must be a power of 2");
        assert!(
            (N as u128) <= (1u128 << (I::BITS - 1)),
            "capacity too large for the counter type (at most 2^(BITS-1) slots)"
        );
        N - 1
    };

    const fn with_counters(head: I::Atomic, tail: I::Atomic) -> Self {
        let _ = Self::MASK;

        Self {
            head: Aligned::new(head),
            tail: Aligned::new(tail),
            split: AtomicBool::new(false),
            buffer: Aligned::new([const { UnsafeCell::new(MaybeUninit::uninit()) }; N]),
            _model: PhantomData,
        }
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Returns the capacity `N`. All `N` slots can hold an element.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of unread elements.
    ///
    /// From outside a handle both counters may be moving, so the result is a
    /// snapshot clamped to `N`. The handles offer the exact per-side view.
    #[inline]
    pub fn read_available(&self) -> usize {
        let tail: I = M::load_opposing::<I>(&self.tail);
        let head: I = M::load_opposing::<I>(&self.head);
        head.distance(tail).min(N)
    }

    /// Returns the number of free slots, `N - read_available()`.
    #[inline]
    pub fn write_available(&self) -> usize {
        N - self.read_available()
    }

    /// Returns true if nothing is waiting to be read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read_available() == 0
    }

    /// Returns true if every slot is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.read_available() == N
    }

    // =========================================================================
    // SPLITTING
    // =========================================================================

    /// Splits the buffer into its producer and consumer handles.
    ///
    /// The exclusive borrow guarantees no other handle pair is alive.
    pub fn split(&mut self) -> (Producer<'_, T, N, M, I, P>, Consumer<'_, T, N, M, I, P>) {
        *self.split.get_mut() = true;
        let ring: &Self = self;
        (Producer::new(ring), Consumer::new(ring))
    }

    /// Splits a shared buffer, e.g. one living in a `static`.
    ///
    /// Succeeds exactly once per buffer; later calls (and calls after
    /// [`split`](Self::split)) return [`RingError::AlreadySplit`].
    #[cfg(target_has_atomic = "8")]
    pub fn try_split(
        &self,
    ) -> Result<(Producer<'_, T, N, M, I, P>, Consumer<'_, T, N, M, I, P>), RingError> {
        if self.split.swap(true, Ordering::AcqRel) {
            return Err(RingError::AlreadySplit);
        }
        Ok((Producer::new(self), Consumer::new(self)))
    }

    // =========================================================================
    // COUNTER ACCESS (crate-internal, used by the handles)
    // =========================================================================

    /// Producer's own counter.
    #[inline]
    pub(crate) fn load_head(&self) -> I {
        I::load(&self.head, Ordering::Relaxed)
    }

    /// Consumer's own counter.
    #[inline]
    pub(crate) fn load_tail(&self) -> I {
        I::load(&self.tail, Ordering::Relaxed)
    }

    /// Consumer's counter as seen by the producer.
    #[inline]
    pub(crate) fn observe_tail(&self) -> I {
        M::load_opposing::<I>(&self.tail)
    }

    /// Producer's counter as seen by the consumer.
    #[inline]
    pub(crate) fn observe_head(&self) -> I {
        M::load_opposing::<I>(&self.head)
    }

    /// Free slots as seen by the producer at `head`, with a fresh load of `tail`.
    #[inline]
    pub(crate) fn free_slots(&self, head: I) -> usize {
        let tail = self.observe_tail();
        let used = head.distance(tail);
        debug_assert_bounded_count!(used, N);
        N - used
    }

    /// Published elements as seen by the consumer at `tail`, with a fresh load
    /// of `head`.
    #[inline]
    pub(crate) fn filled_slots(&self, tail: I) -> usize {
        let head = self.observe_head();
        let used = head.distance(tail);
        debug_assert_bounded_count!(used, N);
        used
    }

    #[inline]
    pub(crate) fn publish_head(&self, head: I) {
        debug_assert_bounded_count!(head.distance(self.load_tail()), N);
        M::publish::<I>(&self.head, head);
    }

    #[inline]
    pub(crate) fn publish_tail(&self, tail: I) {
        debug_assert_bounded_count!(I::load(&self.head, Ordering::Relaxed).distance(tail), N);
        M::publish::<I>(&self.tail, tail);
    }

    // =========================================================================
    // SLOT ACCESS (crate-internal)
    // =========================================================================

    /// Raw pointer to the slot at array index `idx` (`idx <= N`).
    ///
    /// Derived from the whole array so that contiguous runs may be copied
    /// through it.
    #[inline]
    fn slot_ptr(&self, idx: usize) -> *mut T {
        debug_assert!(idx <= N);
        UnsafeCell::raw_get(self.buffer.as_ptr().wrapping_add(idx)).cast::<T>()
    }

    /// Pointer to the slot holding the element at `counter`.
    #[inline]
    pub(crate) fn slot(&self, counter: I) -> *mut T {
        self.slot_ptr(counter.slot(Self::MASK))
    }

    /// Splits `len` slots starting at `counter` into the run before the wrap
    /// point and the run after it.
    #[inline]
    pub(crate) fn runs(counter: I, len: usize) -> (usize, usize, usize) {
        let idx = counter.slot(Self::MASK);
        let first = len.min(N - idx);
        (idx, first, len - first)
    }

    /// Copies `src` into the slots starting at `head`, wrapping once if needed.
    ///
    /// # Safety
    ///
    /// Producer side only; `src.len()` must not exceed the free slots observed
    /// for `head`.
    pub(crate) unsafe fn copy_in(&self, head: I, src: &[T])
    where
        T: Copy,
    {
        debug_assert_within!(src.len(), N);
        let (idx, first, second) = Self::runs(head, src.len());
        ptr::copy_nonoverlapping(src.as_ptr(), self.slot_ptr(idx), first);
        ptr::copy_nonoverlapping(src.as_ptr().add(first), self.slot_ptr(0), second);
    }

    /// Copies the elements starting at `tail` into `dst`, wrapping once if needed.
    ///
    /// # Safety
    ///
    /// Consumer side only; `dst.len()` must not exceed the published elements
    /// observed for `tail`.
    pub(crate) unsafe fn copy_out(&self, tail: I, dst: &mut [T])
    where
        T: Copy,
    {
        debug_assert_within!(dst.len(), N);
        let (idx, first, second) = Self::runs(tail, dst.len());
        ptr::copy_nonoverlapping(self.slot_ptr(idx), dst.as_mut_ptr(), first);
        ptr::copy_nonoverlapping(self.slot_ptr(0), dst.as_mut_ptr().add(first), second);
    }

    /// Drops `count` initialized elements starting at `from`.
    ///
    /// # Safety
    ///
    /// The slots must hold initialized elements that nobody else will read;
    /// the caller then moves its counter past them.
    pub(crate) unsafe fn drop_range(&self, from: I, count: usize) {
        if !mem::needs_drop::<T>() {
            return;
        }
        let mut pos = from;
        for _ in 0..count {
            ptr::drop_in_place(self.slot(pos));
            pos = pos.advance(1);
        }
    }
}

impl<T, const N: usize, I: Counter, P: Padding> RingBuffer<T, N, CrossCore, I, P> {
    /// Creates an empty buffer with both counters at zero.
    ///
    /// `const`, so a buffer can live in a `static` and be split with
    /// [`try_split`](Self::try_split).
    ///
    /// # Example
    ///
    /// ```
    /// use ringspsc_rs::{Packed, RingBuffer, CrossCore};
    ///
    /// static UART_RX: RingBuffer<u8, 64, CrossCore, u16, Packed> = RingBuffer::new();
    ///
    /// let (mut tx, mut rx) = UART_RX.try_split().unwrap();
    /// tx.insert(b'A').unwrap();
    /// assert_eq!(rx.remove(), Some(b'A'));
    /// assert!(UART_RX.try_split().is_err());
    /// ```
    pub const fn new() -> Self {
        Self::with_counters(I::ATOMIC_ZERO, I::ATOMIC_ZERO)
    }

    /// Creates an empty buffer whose counters both start at `start`.
    pub fn starting_at(start: I) -> Self {
        Self::with_counters(I::new_atomic(start), I::new_atomic(start))
    }
}

impl<T, const N: usize, I: Counter, P: Padding> RingBuffer<T, N, SameCore, I, P> {
    /// Creates an empty buffer using compiler-only fences.
    ///
    /// # Safety
    ///
    /// The producer and the consumer must execute on the same core (for
    /// example an interrupt handler and the code it interrupts). Using the
    /// handles from threads that may run on different cores is a data race.
    pub const unsafe fn new_same_core() -> Self {
        Self::with_counters(I::ATOMIC_ZERO, I::ATOMIC_ZERO)
    }

    /// Like [`new_same_core`](Self::new_same_core), with both counters at `start`.
    ///
    /// # Safety
    ///
    /// Same requirement as [`new_same_core`](Self::new_same_core).
    pub unsafe fn same_core_starting_at(start: I) -> Self {
        Self::with_counters(I::new_atomic(start), I::new_atomic(start))
    }
}

impl<T, const N: usize, I: Counter, P: Padding> Default for RingBuffer<T, N, CrossCore, I, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize, M: MemoryModel, I: Counter, P: Padding> fmt::Debug
    for RingBuffer<T, N, M, I, P>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &N)
            .field("model", &M::NAME)
            .field("head", &I::load(&self.head, Ordering::Relaxed))
            .field("tail", &I::load(&self.tail, Ordering::Relaxed))
            .finish()
    }
}

impl<T, const N: usize, M: MemoryModel, I: Counter, P: Padding> Drop for RingBuffer<T, N, M, I, P> {
    fn drop(&mut self) {
        let head = *I::get_mut(&mut self.head);
        let tail = *I::get_mut(&mut self.tail);
        // SAFETY: `&mut self` means no handle is alive; [tail, head) holds
        // exactly the elements that were inserted and never removed.
        unsafe { self.drop_range(tail, head.distance(tail)) };
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Packed;
    use core::mem::{align_of, size_of};

    #[test]
    fn test_capacity_and_fresh_state() {
        let ring: RingBuffer<u64, 16> = RingBuffer::new();
        assert_eq!(ring.capacity(), 16);
        assert_eq!(ring.read_available(), 0);
        assert_eq!(ring.write_available(), 16);
        assert!(ring.is_empty());
        assert!(!ring.is_full());
    }

    #[test]
    fn test_padding_controls_layout() {
        type Padded = RingBuffer<u8, 4, CrossCore, u8, CacheLine>;
        type Tight = RingBuffer<u8, 4, CrossCore, u8, Packed>;

        assert!(align_of::<Padded>() >= align_of::<CacheLine>());
        assert!(size_of::<Padded>() >= 3 * align_of::<CacheLine>());
        // two u8 counters + flag + 4 slots
        assert_eq!(size_of::<Tight>(), 7);
    }

    #[test]
    fn test_runs_split_at_wrap_point() {
        type R = RingBuffer<u8, 16>;
        assert_eq!(R::runs(0usize, 16), (0, 16, 0));
        assert_eq!(R::runs(10usize, 10), (10, 6, 4));
        assert_eq!(R::runs(31usize, 1), (15, 1, 0));
        assert_eq!(R::runs(5usize, 0), (5, 0, 0));
    }

    #[test]
    fn test_split_only_once_when_shared() {
        let ring: RingBuffer<u32, 4> = RingBuffer::new();
        {
            let (_p, _c) = ring.try_split().expect("first split");
        }
        assert_eq!(ring.try_split().err(), Some(RingError::AlreadySplit));
    }

    #[test]
    fn test_exclusive_split_repeatable() {
        let mut ring: RingBuffer<u32, 4> = RingBuffer::new();
        {
            let (mut p, _c) = ring.split();
            p.insert(1).unwrap();
        }
        let (_p, mut c) = ring.split();
        assert_eq!(c.remove(), Some(1));
    }

    #[test]
    fn test_starting_at_matching_counters() {
        let ring: RingBuffer<u8, 8, CrossCore, u8> = RingBuffer::starting_at(252);
        assert!(ring.is_empty());
        assert_eq!(ring.write_available(), 8);
    }

    #[test]
    fn test_debug_output() {
        let ring: RingBuffer<u8, 8> = RingBuffer::new();
        let text = format!("{:?}", ring);
        assert!(text.contains("capacity: 8"));
        assert!(text.contains("cross-core"));
    }

    #[test]
    fn test_drop_resident_elements() {
        use std::sync::atomic::AtomicUsize;

        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;

        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        {
            let mut ring: RingBuffer<Tracked, 8> = RingBuffer::new();
            let (mut p, mut c) = ring.split();
            for _ in 0..5 {
                assert!(p.insert(Tracked).is_ok());
            }
            drop(c.remove());
            drop(c.remove());
            assert_eq!(DROPS.load(Ordering::SeqCst), 2);
        }
        assert_eq!(DROPS.load(Ordering::SeqCst), 5);
    }
}
