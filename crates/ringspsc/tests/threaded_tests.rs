//! Producer and consumer on separate threads.

use ringspsc_rs::{Backoff, CrossCore, Packed, Ring4K, RingBuffer, SmpRing};
use std::thread;

#[test]
fn test_single_element_stress_fifo() {
    const MSGS: u64 = 200_000;
    let mut ring: SmpRing<u64, 64> = RingBuffer::new();
    let (mut p, mut c) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            for i in 0..MSGS {
                let mut backoff = Backoff::new();
                let mut value = i;
                loop {
                    match p.insert(value) {
                        Ok(()) => break,
                        Err(rejected) => {
                            value = rejected.into_inner();
                            backoff.snooze();
                        }
                    }
                }
            }
        });

        let mut expected = 0;
        let mut backoff = Backoff::new();
        while expected < MSGS {
            match c.remove() {
                Some(v) => {
                    assert_eq!(v, expected);
                    expected += 1;
                    backoff.reset();
                }
                None => backoff.snooze(),
            }
        }
        assert!(c.is_empty());
    });
}

#[test]
fn test_bulk_stress_with_narrow_counter() {
    // u16 counters wrap many times over the run
    const TOTAL: usize = 300_000;
    let mut ring: RingBuffer<u32, 256, CrossCore, u16, Packed> = RingBuffer::new();
    let (mut p, mut c) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            let src: Vec<u32> = (0..TOTAL as u32).collect();
            let mut sent = 0;
            while sent < TOTAL {
                let end = (sent + 100).min(TOTAL);
                let n = p.write_buff(&src[sent..end]);
                if n == 0 {
                    thread::yield_now();
                }
                sent += n;
            }
        });

        let mut buf = [0u32; 77];
        let mut next = 0u32;
        while (next as usize) < TOTAL {
            let n = c.read_buff(&mut buf);
            assert!(n <= 256);
            for &v in &buf[..n] {
                assert_eq!(v, next);
                next += 1;
            }
            if n == 0 {
                thread::yield_now();
            }
        }
    });
}

#[test]
fn test_multi_pass_callbacks_across_threads() {
    const TOTAL: usize = 50_000;
    let mut ring: Ring4K<u8> = RingBuffer::new();
    let (mut p, mut c) = ring.split();

    thread::scope(|s| {
        let producer = s.spawn(move || {
            let src: Vec<u8> = (0..TOTAL).map(|i| (i % 251) as u8).collect();
            let mut sent = 0;
            let mut callbacks = 0;
            while sent < TOTAL {
                sent += p.write_buff_with(&src[sent..], 512, || callbacks += 1);
                if sent < TOTAL {
                    thread::yield_now();
                }
            }
            callbacks
        });

        let mut received = Vec::with_capacity(TOTAL);
        let mut chunk = vec![0u8; 1000];
        while received.len() < TOTAL {
            let want = chunk.len().min(TOTAL - received.len());
            let n = c.read_buff_with(&mut chunk[..want], 100, thread::yield_now);
            received.extend_from_slice(&chunk[..n]);
        }

        let callbacks = producer.join().unwrap();
        assert!(callbacks >= 1);
        assert!(received.iter().enumerate().all(|(i, &b)| b == (i % 251) as u8));
    });
}

#[test]
fn test_static_ring_shared_by_reference() {
    static RING: RingBuffer<usize, 32> = RingBuffer::new();
    const MSGS: usize = 10_000;

    let (mut p, mut c) = RING.try_split().unwrap();
    let producer = thread::spawn(move || {
        let mut backoff = Backoff::new();
        for i in 0..MSGS {
            while p.insert(i).is_err() {
                backoff.snooze();
            }
            backoff.reset();
        }
    });

    let mut sum = 0;
    let mut seen = 0;
    let mut backoff = Backoff::new();
    while seen < MSGS {
        match backoff.retry(|| c.remove()) {
            Some(v) => {
                sum += v;
                seen += 1;
            }
            None => backoff.reset(),
        }
    }
    producer.join().unwrap();
    assert_eq!(sum, MSGS * (MSGS - 1) / 2);
}

#[test]
fn test_consumer_peeks_while_producer_runs() {
    let mut ring: RingBuffer<u64, 128> = RingBuffer::new();
    let (mut p, mut c) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            for i in 0..5_000u64 {
                while p.insert(i).is_err() {
                    std::hint::spin_loop();
                }
            }
        });

        let mut expected = 0;
        while expected < 5_000 {
            let available = c.read_available();
            // everything below the snapshot stays readable and in order
            for i in 0..available {
                assert_eq!(c[i], expected + i as u64);
            }
            if available > 0 {
                assert_eq!(c.peek(), Some(&expected));
                let mut out = vec![0; available];
                assert_eq!(c.read_buff(&mut out), available);
                expected += available as u64;
            }
        }
    });
}
