//! Streams a byte source through a small ring from one thread to another
//! using multi-pass bulk transfers, and reports progress per chunk.
//!
//! Usage: `cargo run --release --bin stream_pump [TOTAL_BYTES] [CHUNK]`

use ringspsc_rs::{Backoff, RingBuffer};
use std::env;
use std::thread;
use std::time::Instant;

const DEFAULT_TOTAL: usize = 1 << 20;
const DEFAULT_CHUNK: usize = 4096;
/// First-pass size, so the consumer sees data early in each chunk.
const FIRST_PASS: usize = 16;

fn arg_or(index: usize, default: usize) -> usize {
    env::args()
        .nth(index)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn main() {
    let total = arg_or(1, DEFAULT_TOTAL);
    let chunk = arg_or(2, DEFAULT_CHUNK).max(1);

    println!("╔════════════════════════════════════════════════════╗");
    println!("║ stream_pump: {:>10} bytes via RingBuffer<u8, 64> ║", total);
    println!("╚════════════════════════════════════════════════════╝");

    let source: Vec<u8> = (0..total).map(|i| (i % 251) as u8).collect();
    let mut ring: RingBuffer<u8, 64> = RingBuffer::new();
    let (mut producer, mut consumer) = ring.split();
    let start = Instant::now();

    let (sent_passes, received) = thread::scope(|s| {
        let source = &source;
        let pump = s.spawn(move || {
            let mut sent = 0;
            let mut passes = 0u64;
            let mut backoff = Backoff::new();

            for (n, piece) in source.chunks(chunk).enumerate() {
                let mut done = 0;
                while done < piece.len() {
                    let written = producer.write_buff_with(&piece[done..], FIRST_PASS, || {
                        passes += 1;
                    });
                    if written == 0 {
                        backoff.snooze();
                    } else {
                        backoff.reset();
                    }
                    done += written;
                }
                sent += piece.len();
                if n % 64 == 0 {
                    println!("  chunk {:>5}: {:>10} bytes sent", n, sent);
                }
            }
            passes
        });

        let mut received = Vec::with_capacity(total);
        let mut buf = vec![0u8; chunk];
        let mut idle = Backoff::new();
        while received.len() < total {
            let want = buf.len().min(total - received.len());
            let n = consumer.read_buff_with(&mut buf[..want], 0, thread::yield_now);
            if n == 0 {
                idle.snooze();
            } else {
                idle.reset();
            }
            received.extend_from_slice(&buf[..n]);
        }

        match pump.join() {
            Ok(passes) => (passes, received),
            Err(_) => {
                eprintln!("producer thread panicked");
                std::process::exit(1);
            }
        }
    });

    let elapsed = start.elapsed();
    let intact = received == source;
    let mb_per_s = total as f64 / elapsed.as_secs_f64() / 1e6;

    println!();
    println!("  bytes:          {}", received.len());
    println!("  partial passes: {}", sent_passes);
    println!("  elapsed:        {:.2?}", elapsed);
    println!("  throughput:     {:.1} MB/s", mb_per_s);
    println!("  intact:         {}", if intact { "yes" } else { "NO" });

    if !intact {
        std::process::exit(1);
    }
}
