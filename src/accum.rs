//! Growable byte accumulator with independent read and write cursors.
//!
//! A decoder fed from a socket receives data in arbitrary-sized chunks.
//! The accumulator lets it buffer those chunks without reallocating on
//! every partial read: the store is reused by shunting the unread region
//! back to the front whenever that frees enough space, and only grows when
//! shunting cannot satisfy a reservation.

use crate::error::BserError;

const DEFAULT_CAPACITY: usize = 8192;

/// A byte store with a read cursor and a write cursor.
///
/// Invariant: `0 <= read_offset <= write_offset <= capacity`. The readable
/// region is `[read_offset, write_offset)`; the writable region is
/// `[write_offset, capacity)`. No operation ever discards unread bytes.
///
/// `peek_*` returns a slice borrowing the store directly; the borrow
/// checker prevents holding it across a subsequent `append`/`reserve`,
/// which may shunt or reallocate the store.
#[derive(Debug)]
pub struct Accumulator {
    store: Vec<u8>,
    read_offset: usize,
    write_offset: usize,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Accumulator {
    /// Creates an accumulator with the given initial capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            store: vec![0u8; capacity],
            read_offset: 0,
            write_offset: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.store.len()
    }

    /// Number of readable bytes.
    pub fn read_avail(&self) -> usize {
        self.write_offset - self.read_offset
    }

    /// Number of writable bytes before the store must shunt or grow.
    pub fn write_avail(&self) -> usize {
        self.store.len() - self.write_offset
    }

    /// Appends bytes, reserving space first.
    pub fn append(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.store[self.write_offset..self.write_offset + bytes.len()].copy_from_slice(bytes);
        self.write_offset += bytes.len();
    }

    /// Guarantees `write_avail() >= n`.
    ///
    /// Shunting is preferred over growth whenever the total free space
    /// (including the consumed prefix) suffices; this bounds memory growth
    /// for a decoder whose consumed prefix can be reclaimed.
    pub fn reserve(&mut self, n: usize) {
        if self.write_avail() >= n {
            return;
        }
        let avail = self.read_avail();
        if self.store.len() - avail >= n {
            // Shunt the unread region to the front of the store.
            self.store.copy_within(self.read_offset..self.write_offset, 0);
        } else {
            let mut new_cap = self.store.len().max(1);
            while new_cap < avail + n {
                new_cap *= 2;
            }
            let mut new_store = vec![0u8; new_cap];
            new_store[..avail].copy_from_slice(&self.store[self.read_offset..self.write_offset]);
            self.store = new_store;
        }
        self.read_offset = 0;
        self.write_offset = avail;
    }

    /// Returns the next `n` readable bytes without advancing the cursor.
    pub fn peek_bytes(&self, n: usize) -> Result<&[u8], BserError> {
        if n > self.read_avail() {
            return Err(BserError::Underflow {
                requested: n,
                avail: self.read_avail(),
            });
        }
        Ok(&self.store[self.read_offset..self.read_offset + n])
    }

    /// Returns the next `n` readable bytes and advances the read cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], BserError> {
        if n > self.read_avail() {
            return Err(BserError::Underflow {
                requested: n,
                avail: self.read_avail(),
            });
        }
        let start = self.read_offset;
        self.read_offset += n;
        Ok(&self.store[start..start + n])
    }

    /// `peek_bytes`, interpreted as UTF-8.
    pub fn peek_str(&self, n: usize) -> Result<&str, BserError> {
        let bytes = self.peek_bytes(n)?;
        std::str::from_utf8(bytes)
            .map_err(|e| BserError::Protocol(format!("invalid UTF-8 in peeked bytes: {e}")))
    }

    /// `read_bytes`, interpreted as UTF-8.
    pub fn read_str(&mut self, n: usize) -> Result<&str, BserError> {
        let bytes = self.read_bytes(n)?;
        std::str::from_utf8(bytes)
            .map_err(|e| BserError::Protocol(format!("invalid UTF-8 in read bytes: {e}")))
    }

    /// Moves both cursors back to the start, discarding any readable bytes.
    /// Used between independent PDUs on a long-lived connection.
    pub fn reset(&mut self) {
        self.read_offset = 0;
        self.write_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read() {
        let mut acc = Accumulator::new(8);
        acc.append(b"hello");
        assert_eq!(acc.read_avail(), 5);
        assert_eq!(acc.write_avail(), 3);
        assert_eq!(acc.read_str(3).unwrap(), "hel");
        assert_eq!(acc.read_avail(), 2);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut acc = Accumulator::new(8);
        acc.append(b"abc");
        assert_eq!(acc.peek_bytes(2).unwrap(), b"ab");
        assert_eq!(acc.peek_bytes(2).unwrap(), b"ab");
        assert_eq!(acc.read_bytes(3).unwrap(), b"abc");
    }

    #[test]
    fn underflow_is_an_error() {
        let mut acc = Accumulator::new(8);
        acc.append(b"ab");
        assert!(matches!(
            acc.peek_bytes(3),
            Err(BserError::Underflow {
                requested: 3,
                avail: 2
            })
        ));
        assert!(matches!(acc.read_bytes(3), Err(BserError::Underflow { .. })));
        // The failed read consumed nothing.
        assert_eq!(acc.read_avail(), 2);
    }

    #[test]
    fn reserve_shunts_instead_of_growing() {
        let mut acc = Accumulator::new(8);
        acc.append(b"hello");
        assert_eq!(acc.read_str(3).unwrap(), "hel");
        assert_eq!(acc.read_avail(), 2);
        assert_eq!(acc.write_avail(), 3);

        // capacity - read_avail = 6 >= 5, so this must shunt, not grow.
        acc.reserve(5);
        assert_eq!(acc.capacity(), 8);
        assert_eq!(acc.read_avail(), 2);
        assert_eq!(acc.write_avail(), 6);
        assert_eq!(acc.peek_str(2).unwrap(), "lo");
    }

    #[test]
    fn reserve_grows_when_shunting_is_not_enough() {
        let mut acc = Accumulator::new(4);
        acc.append(b"abcd");
        acc.reserve(8);
        assert!(acc.capacity() >= 12);
        assert_eq!(acc.read_avail(), 4);
        assert!(acc.write_avail() >= 8);
        assert_eq!(acc.peek_bytes(4).unwrap(), b"abcd");
    }

    #[test]
    fn append_beyond_capacity_grows() {
        let mut acc = Accumulator::new(2);
        acc.append(b"abcdefgh");
        assert_eq!(acc.read_bytes(8).unwrap(), b"abcdefgh");
    }

    #[test]
    fn reset_reclaims_everything() {
        let mut acc = Accumulator::new(8);
        acc.append(b"abc");
        acc.read_bytes(2).unwrap();
        acc.reset();
        assert_eq!(acc.read_avail(), 0);
        assert_eq!(acc.write_avail(), 8);
    }
}
