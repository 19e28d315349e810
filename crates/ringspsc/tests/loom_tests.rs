//! Loom-based concurrency tests for ringspsc-rs.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores all possible thread interleavings to find
//! concurrency bugs that might only occur under specific scheduling.

#![cfg(feature = "loom")]

use loom::cell::UnsafeCell;
use loom::sync::atomic::{AtomicU8, Ordering};
use loom::sync::Arc;
use loom::thread;

/// Model of the publish protocol in isolation.
///
/// Same free-running `u8` counters, acquire/release pairing and slot
/// ownership rules as the real ring, with a capacity of 2 to keep loom's
/// state space small. Slots are loom cells, so any access that is not
/// ordered by the counters is reported as a data race.
struct LoomRing {
    /// Elements ever inserted (written by producer)
    head: AtomicU8,
    /// Elements ever removed (written by consumer)
    tail: AtomicU8,
    slots: [UnsafeCell<u32>; 2],
}

const CAP: usize = 2;

impl LoomRing {
    fn starting_at(start: u8) -> Self {
        Self {
            head: AtomicU8::new(start),
            tail: AtomicU8::new(start),
            slots: [UnsafeCell::new(0), UnsafeCell::new(0)],
        }
    }

    fn slot(&self, counter: u8) -> &UnsafeCell<u32> {
        &self.slots[counter as usize & (CAP - 1)]
    }

    /// Producer: copy as much of `src` as fits, publish once.
    fn write(&self, src: &[u32]) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let used = head.wrapping_sub(tail) as usize;
        assert!(used <= CAP, "occupied count {} exceeds capacity", used);

        let n = src.len().min(CAP - used);
        for (i, v) in src[..n].iter().enumerate() {
            self.slot(head.wrapping_add(i as u8)).with_mut(|p| unsafe { *p = *v });
        }
        self.head.store(head.wrapping_add(n as u8), Ordering::Release);
        n
    }

    /// Consumer: copy out as much as is published, publish once.
    fn read(&self, dst: &mut [u32]) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let used = head.wrapping_sub(tail) as usize;
        assert!(used <= CAP, "occupied count {} exceeds capacity", used);

        let n = dst.len().min(used);
        for (i, d) in dst[..n].iter_mut().enumerate() {
            *d = self.slot(tail.wrapping_add(i as u8)).with(|p| unsafe { *p });
        }
        self.tail.store(tail.wrapping_add(n as u8), Ordering::Release);
        n
    }
}

unsafe impl Send for LoomRing {}
unsafe impl Sync for LoomRing {}

/// Single elements through a ring whose counters wrap mid-test.
#[test]
fn loom_single_elements_across_counter_wrap() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::starting_at(255));
        let ring2 = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            let mut sent = 0;
            for v in [1, 2, 3] {
                if ring2.write(&[v]) == 1 {
                    sent += 1;
                } else {
                    break;
                }
            }
            sent
        });

        let mut received = Vec::new();
        for _ in 0..2 {
            let mut one = [0];
            if ring.read(&mut one) == 1 {
                received.push(one[0]);
            }
            thread::yield_now();
        }

        let sent = producer.join().unwrap();
        let mut rest = [0; CAP];
        let n = ring.read(&mut rest);
        received.extend_from_slice(&rest[..n]);

        assert_eq!(received.len(), sent);
        assert_eq!(received, [1u32, 2, 3][..sent]);
    });
}

/// Multi-pass write: publish after every pass, reload `tail` before the next.
#[test]
fn loom_multi_pass_write() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::starting_at(0));
        let ring2 = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            let src = [10, 20, 30];
            let mut written = 0;
            // first pass capped at one element, then up to two more passes
            let mut pass = 1;
            for _ in 0..3 {
                if written == src.len() {
                    break;
                }
                let end = (written + pass).min(src.len());
                let n = ring2.write(&src[written..end]);
                if n == 0 {
                    break;
                }
                written += n;
                pass = src.len() - written;
                thread::yield_now();
            }
            written
        });

        let mut received = Vec::new();
        for _ in 0..2 {
            let mut buf = [0; CAP];
            let n = ring.read(&mut buf);
            received.extend_from_slice(&buf[..n]);
        }

        let written = producer.join().unwrap();
        let mut buf = [0; CAP];
        let n = ring.read(&mut buf);
        received.extend_from_slice(&buf[..n]);

        assert!(written >= 1);
        assert_eq!(received.len(), written);
        assert_eq!(received, [10u32, 20, 30][..written]);
    });
}

/// A full ring frees exactly one slot per removal.
#[test]
fn loom_full_ring_frees_slot() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::starting_at(254));
        assert_eq!(ring.write(&[1, 2, 3]), 2);
        assert_eq!(ring.write(&[3]), 0);

        let ring2 = Arc::clone(&ring);
        let consumer = thread::spawn(move || {
            let mut one = [0];
            ring2.read(&mut one);
            one[0]
        });

        let first = consumer.join().unwrap();
        assert_eq!(first, 1);
        assert_eq!(ring.write(&[3]), 1);

        let mut rest = [0; CAP];
        assert_eq!(ring.read(&mut rest), 2);
        assert_eq!(rest, [2, 3]);
    });
}
