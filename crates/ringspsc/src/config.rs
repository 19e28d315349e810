//! Compile-time configuration: memory model, padding and common presets.
//!
//! Everything here is a zero-sized type parameter of [`RingBuffer`], so the
//! choice costs nothing at runtime and no operation branches on it.

use crate::counter::Counter;
use crate::RingBuffer;
use core::sync::atomic::{compiler_fence, Ordering};
use crossbeam_utils::CachePadded;

mod sealed {
    pub trait Sealed {}
}

// =============================================================================
// MEMORY MODEL
// =============================================================================

/// How the two contexts sharing a ring observe each other's counters.
///
/// A model only decides the ordering of accesses to the *opposing* counter
/// and of the *publish* of the own counter. A side always reads its own
/// counter with `Relaxed`, since nobody else writes it.
pub trait MemoryModel: sealed::Sealed + Send + Sync + 'static {
    /// Short name used by `Debug` output.
    const NAME: &'static str;

    /// Loads the counter owned by the other side. Every slot write the other
    /// side made before publishing this value is visible afterwards.
    fn load_opposing<I: Counter>(counter: &I::Atomic) -> I;

    /// Publishes a new value of the own counter. Every slot access made
    /// before this call is ordered before the store.
    fn publish<I: Counter>(counter: &I::Atomic, value: I);
}

/// Producer and consumer on different cores with independently reordering
/// memory: acquire loads and release stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossCore;

/// Producer and consumer on the same core, e.g. an interrupt handler and the
/// foreground loop. Only compiler reordering has to be prevented, so the
/// counters use relaxed accesses bracketed by compiler fences and no hardware
/// barrier is emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SameCore;

impl sealed::Sealed for CrossCore {}
impl sealed::Sealed for SameCore {}

impl MemoryModel for CrossCore {
    const NAME: &'static str = "cross-core";

    #[inline]
    fn load_opposing<I: Counter>(counter: &I::Atomic) -> I {
        I::load(counter, Ordering::Acquire)
    }

    #[inline]
    fn publish<I: Counter>(counter: &I::Atomic, value: I) {
        I::store(counter, value, Ordering::Release);
    }
}

impl MemoryModel for SameCore {
    const NAME: &'static str = "same-core";

    #[inline]
    fn load_opposing<I: Counter>(counter: &I::Atomic) -> I {
        let value = I::load(counter, Ordering::Relaxed);
        compiler_fence(Ordering::Acquire);
        value
    }

    #[inline]
    fn publish<I: Counter>(counter: &I::Atomic, value: I) {
        compiler_fence(Ordering::Release);
        I::store(counter, value, Ordering::Relaxed);
    }
}

// =============================================================================
// PADDING
// =============================================================================

/// Alignment applied to each counter and to the slot array.
///
/// The marker is stored as a zero-length array, so it contributes alignment
/// (and therefore padding) but never data.
pub trait Padding: sealed::Sealed + Send + Sync + 'static {}

/// Align both counters and the slot array to the target's cache line
/// (as chosen by [`crossbeam_utils::CachePadded`]) to avoid false sharing
/// between cores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine(CachePadded<()>);

/// No padding. Smallest footprint, for single-core targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Packed;

impl sealed::Sealed for CacheLine {}
impl sealed::Sealed for Packed {}
impl Padding for CacheLine {}
impl Padding for Packed {}

// =============================================================================
// PRESETS
// =============================================================================

/// Interrupt handler ↔ foreground loop on one core: compiler fences only,
/// `u16` counters (capacity up to 32768), no padding.
pub type IsrRing<T, const N: usize> = RingBuffer<T, N, SameCore, u16, Packed>;

/// Producer and consumer on separate cores: hardware acquire/release,
/// `usize` counters, cache-line padding.
pub type SmpRing<T, const N: usize> = RingBuffer<T, N, CrossCore, usize, CacheLine>;

/// 256 slots, cross-core.
pub type Ring256<T> = SmpRing<T, 256>;

/// 4K slots, cross-core (~32KB for `u64`, fits in L1 on most cores).
pub type Ring4K<T> = SmpRing<T, 4096>;
