//! Debug assertion macros for ring buffer invariants.
//!
//! Only active in debug builds (`debug_assert!`), so release builds pay
//! nothing for them.

// =============================================================================
// Bounded occupancy
// =============================================================================

/// Assert that the occupied count never exceeds capacity.
///
/// **Invariant**: `0 ≤ (head - tail) ≤ N` under wrapping arithmetic. A
/// wrapped-around difference shows up here as a huge count.
///
/// Used in: availability computations and before publishing either counter.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "occupied count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

// =============================================================================
// Transfers stay inside the observed window
// =============================================================================

/// Assert that a transfer moves no more elements than were available.
///
/// Used in: bulk copies and consumer-side releases.
macro_rules! debug_assert_within {
    ($requested:expr, $available:expr) => {
        debug_assert!(
            $requested <= $available,
            "transfer of {} elements exceeds the {} available",
            $requested,
            $available
        )
    };
}

// =============================================================================
// Unchecked reads stay inside the published region
// =============================================================================

/// Assert that an unchecked index falls inside `[tail, head)`.
///
/// Used in: `Consumer::get_unchecked` / `get_unchecked_mut`.
macro_rules! debug_assert_published {
    ($index:expr, $available:expr) => {
        debug_assert!(
            $index < $available,
            "unchecked access to unread element {} with only {} published",
            $index,
            $available
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_published;
pub(crate) use debug_assert_within;
