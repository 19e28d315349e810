//! Free-running counter types for `head` and `tail`.
//!
//! Both counters only ever move forward and are interpreted solely through
//! their wrapping difference, so overflow of the counter itself is harmless
//! as long as the capacity leaves one spare bit (`N <= 2^(BITS-1)`). That
//! spare bit is what lets `head == tail` mean "empty" while all `N` slots stay
//! usable.

use core::fmt::Debug;
use core::sync::atomic::{AtomicU16, AtomicU32, AtomicU8, AtomicUsize, Ordering};

#[cfg(target_has_atomic = "64")]
use core::sync::atomic::AtomicU64;

mod sealed {
    pub trait Sealed {}
}

/// An unsigned integer usable as a ring buffer counter.
///
/// Implemented for `u8`, `u16`, `u32`, `usize` and, where 64-bit atomics
/// exist, `u64`. Signed integers deliberately have no implementation, so a
/// signed counter type fails to compile.
pub trait Counter: Copy + Eq + Debug + Send + Sync + 'static + sealed::Sealed {
    /// Atomic cell holding a counter of this width.
    type Atomic: Send + Sync;

    /// Bit width of the counter.
    const BITS: u32;

    /// A zeroed atomic, usable from `const fn` constructors.
    #[allow(clippy::declare_interior_mutable_const)]
    const ATOMIC_ZERO: Self::Atomic;

    fn new_atomic(value: Self) -> Self::Atomic;

    fn load(atomic: &Self::Atomic, order: Ordering) -> Self;

    fn store(atomic: &Self::Atomic, value: Self, order: Ordering);

    fn get_mut(atomic: &mut Self::Atomic) -> &mut Self;

    /// Advances the counter by `n`, wrapping at the counter width.
    fn advance(self, n: usize) -> Self;

    /// Wrapping distance `self - earlier`, widened to `usize`.
    fn distance(self, earlier: Self) -> usize;

    /// Projects the counter onto a slot index.
    fn slot(self, mask: usize) -> usize;
}

macro_rules! impl_counter {
    ($($int:ty => $atomic:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $int {}

            impl Counter for $int {
                type Atomic = $atomic;

                const BITS: u32 = <$int>::BITS;

                #[allow(clippy::declare_interior_mutable_const)]
                const ATOMIC_ZERO: $atomic = <$atomic>::new(0);

                #[inline]
                fn new_atomic(value: Self) -> $atomic {
                    <$atomic>::new(value)
                }

                #[inline]
                fn load(atomic: &$atomic, order: Ordering) -> Self {
                    atomic.load(order)
                }

                #[inline]
                fn store(atomic: &$atomic, value: Self, order: Ordering) {
                    atomic.store(value, order);
                }

                #[inline]
                fn get_mut(atomic: &mut $atomic) -> &mut Self {
                    atomic.get_mut()
                }

                #[inline]
                fn advance(self, n: usize) -> Self {
                    <$int>::wrapping_add(self, n as $int)
                }

                #[inline]
                fn distance(self, earlier: Self) -> usize {
                    <$int>::wrapping_sub(self, earlier) as usize
                }

                #[inline]
                fn slot(self, mask: usize) -> usize {
                    (self as usize) & mask
                }
            }
        )*
    };
}

impl_counter!(
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    usize => AtomicUsize,
);

#[cfg(target_has_atomic = "64")]
impl_counter!(u64 => AtomicU64);
