//! RingSPSC - Lock-Free Single-Producer Single-Consumer Ring Buffer
//!
//! A fixed-capacity FIFO shared between exactly one producer and one
//! consumer, usable from threads on different cores or between an interrupt
//! handler and the main loop on a single core. No locks, no allocation, no
//! waiting: every operation either makes progress or says it could not.
//!
//! # Key Features
//!
//! - Free-running `head`/`tail` counters: all `N` slots are usable
//! - Selectable memory model ([`CrossCore`] or [`SameCore`]) and counter width
//! - Optional cache-line separation of the counters ([`CacheLine`] / [`Packed`])
//! - Bulk copies that publish once per pass, with progress callbacks
//! - Random access to unread elements from the consumer side
//! - `no_std` (disable the default `std` feature)
//!
//! # Example
//!
//! ```
//! use ringspsc_rs::RingBuffer;
//!
//! let mut ring: RingBuffer<u32, 16> = RingBuffer::new();
//! let (mut producer, mut consumer) = ring.split();
//!
//! producer.insert(1).unwrap();
//! assert_eq!(producer.write_buff(&[2, 3, 4]), 3);
//!
//! assert_eq!(consumer.peek(), Some(&1));
//! assert_eq!(consumer[2], 3);
//!
//! let mut out = [0; 8];
//! assert_eq!(consumer.read_buff(&mut out), 4);
//! assert_eq!(&out[..4], &[1, 2, 3, 4]);
//! ```
//!
//! Across threads the handles are moved into scoped threads:
//!
//! ```
//! use ringspsc_rs::{Backoff, RingBuffer};
//!
//! let mut ring: RingBuffer<u64, 64> = RingBuffer::new();
//! let (mut producer, mut consumer) = ring.split();
//!
//! std::thread::scope(|s| {
//!     s.spawn(move || {
//!         for i in 0..1_000u64 {
//!             let mut backoff = Backoff::new();
//!             while producer.insert(i).is_err() {
//!                 backoff.snooze();
//!             }
//!         }
//!     });
//!
//!     let mut expected = 0;
//!     while expected < 1_000 {
//!         if let Some(v) = consumer.remove() {
//!             assert_eq!(v, expected);
//!             expected += 1;
//!         }
//!     }
//! });
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod invariants;

mod backoff;
mod config;
mod consumer;
mod counter;
mod error;
#[cfg(feature = "std")]
mod io;
mod producer;
mod ring;

pub use backoff::Backoff;
pub use config::{
    CacheLine, CrossCore, IsrRing, MemoryModel, Packed, Padding, Ring256, Ring4K, SameCore,
    SmpRing,
};
pub use consumer::Consumer;
pub use counter::Counter;
pub use error::{InsertError, RingError};
pub use producer::Producer;
pub use ring::RingBuffer;
