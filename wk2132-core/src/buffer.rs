//! Bounded byte buffers
//!
//! Software side of a channel: bytes waiting to be pushed into the chip's
//! transmit FIFO, and bytes pulled out of its receive FIFO waiting for the
//! application. Both are fixed-capacity FIFOs; what happens when they fill
//! up is decided by the caller through [`ByteRing::push_bounded`] (reject
//! the excess) or [`ByteRing::push_evicting`] (drop the oldest).

use heapless::Deque;

/// Capacity of each channel buffer
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Fixed-capacity byte FIFO
pub struct ByteRing<const N: usize> {
    inner: Deque<u8, N>,
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteRing<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            inner: Deque::new(),
        }
    }

    /// Number of bytes buffered
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Check if the buffer is full
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Total capacity in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Free space in bytes
    pub fn free(&self) -> usize {
        N - self.inner.len()
    }

    /// Oldest byte, without removing it
    pub fn peek(&self) -> Option<u8> {
        self.inner.front().copied()
    }

    /// Append as many bytes as fit
    ///
    /// Returns the number of bytes accepted; the rest of `data` is left to
    /// the caller.
    pub fn push_bounded(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.free());
        for &byte in &data[..accepted] {
            // cannot fail: bounded by free()
            let _ = self.inner.push_back(byte);
        }
        accepted
    }

    /// Append all bytes, dropping the oldest ones to make room
    ///
    /// Returns the number of bytes evicted. When `data` alone is larger
    /// than the capacity, only its newest `N` bytes are kept.
    pub fn push_evicting(&mut self, data: &[u8]) -> usize {
        let mut evicted = 0;
        for &byte in data {
            if self.inner.is_full() {
                self.inner.pop_front();
                evicted += 1;
            }
            let _ = self.inner.push_back(byte);
        }
        evicted
    }

    /// Remove up to `buf.len()` bytes, oldest first
    pub fn pop_into(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.inner.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// Copy up to `buf.len()` bytes, oldest first, without removing them
    pub fn copy_front(&self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        for (slot, &byte) in buf.iter_mut().zip(self.inner.iter()) {
            *slot = byte;
            count += 1;
        }
        count
    }

    /// Drop up to `count` bytes from the front
    pub fn discard(&mut self, count: usize) -> usize {
        let mut dropped = 0;
        while dropped < count && self.inner.pop_front().is_some() {
            dropped += 1;
        }
        dropped
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
