//! `std::io` adapters for byte rings.
//!
//! A full (or empty) ring surfaces as [`io::ErrorKind::WouldBlock`], the same
//! way a non-blocking socket reports it.

use crate::config::{MemoryModel, Padding};
use crate::counter::Counter;
use crate::error::RingError;
use crate::{Consumer, Producer};
use std::io;

impl<const N: usize, M: MemoryModel, I: Counter, P: Padding> io::Write
    for Producer<'_, u8, N, M, I, P>
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.write_buff(buf) {
            0 => Err(RingError::Full.into()),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<const N: usize, M: MemoryModel, I: Counter, P: Padding> io::Read
    for Consumer<'_, u8, N, M, I, P>
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.read_buff(buf) {
            0 => Err(RingError::Empty.into()),
            n => Ok(n),
        }
    }
}

impl<const N: usize, M: MemoryModel, I: Counter, P: Padding> Consumer<'_, u8, N, M, I, P> {
    /// Drains unread bytes into `writer` straight from the backing array,
    /// with at most two `write` calls (one per side of the wrap point).
    ///
    /// Only the bytes `writer` accepted are removed. Returns how many that
    /// was; errors from `writer` are passed through once nothing was
    /// accepted.
    pub fn write_to<W>(&mut self, writer: &mut W) -> io::Result<usize>
    where
        W: io::Write + ?Sized,
    {
        let (first, second) = self.as_slices();
        let mut done = 0;

        for chunk in [first, second] {
            if chunk.is_empty() {
                break;
            }
            match writer.write(chunk) {
                Ok(n) => {
                    done += n;
                    if n < chunk.len() {
                        break;
                    }
                }
                Err(err) if done == 0 => return Err(err),
                Err(_) => break,
            }
        }

        self.release(done);
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use crate::RingBuffer;
    use std::io::{ErrorKind, Read, Write};

    #[test]
    fn test_write_then_read_bytes() {
        let mut ring: RingBuffer<u8, 8> = RingBuffer::new();
        let (mut p, mut c) = ring.split();

        assert_eq!(p.write(b"hello world").unwrap(), 8);
        assert_eq!(p.write(b"!").unwrap_err().kind(), ErrorKind::WouldBlock);

        let mut out = [0u8; 16];
        assert_eq!(c.read(&mut out).unwrap(), 8);
        assert_eq!(&out[..8], b"hello wo");
        assert_eq!(c.read(&mut out).unwrap_err().kind(), ErrorKind::WouldBlock);
    }

    #[test]
    fn test_write_to_across_wrap() {
        let mut ring: RingBuffer<u8, 8> = RingBuffer::new();
        let (mut p, mut c) = ring.split();

        p.write_all(b"abcdef").unwrap();
        let mut skip = [0u8; 5];
        c.read_exact(&mut skip).unwrap();
        p.write_all(b"ghijk").unwrap();

        let mut sink = Vec::new();
        assert_eq!(c.write_to(&mut sink).unwrap(), 6);
        assert_eq!(sink, b"fghijk");
        assert!(c.is_empty());
    }

    #[test]
    fn test_write_to_partial_writer() {
        let mut ring: RingBuffer<u8, 8> = RingBuffer::new();
        let (mut p, mut c) = ring.split();
        p.write_all(b"12345").unwrap();

        let mut small = [0u8; 3];
        let mut cursor = std::io::Cursor::new(&mut small[..]);
        assert_eq!(c.write_to(&mut cursor).unwrap(), 3);
        assert_eq!(&small, b"123");
        assert_eq!(c.read_available(), 2);
        assert_eq!(c.remove(), Some(b'4'));
    }
}
