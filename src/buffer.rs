//! Fixed-capacity buffer with independent read and write cursors.
//!
//! [`IoBuffer`] is the "scoped buffer" the protocol exchanges with the
//! external engine: a flat, natively-ordered byte region whose read and
//! write cursors delimit the bytes currently carrying data. The invariant
//! `read cursor <= write cursor <= capacity` always holds; cursor misuse is
//! a programming error and panics, mirroring slice indexing. Fallible
//! conditions reachable through the public descriptor API are reported as
//! [`DescError`](crate::error::DescError) by the call sites that own them.

/// A flat byte buffer with a fixed capacity and read/write cursors.
///
/// All multi-byte accessors use native byte order; the buffer crosses a
/// same-host boundary, never the network.
#[derive(Debug)]
pub struct IoBuffer {
    data: Box<[u8]>,
    reader: usize,
    writer: usize,
}

impl IoBuffer {
    /// Allocate a zero-filled buffer of the given capacity.
    pub fn zeroed(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            reader: 0,
            writer: 0,
        }
    }

    /// Total capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current read cursor.
    #[inline]
    pub fn reader_index(&self) -> usize {
        self.reader
    }

    /// Current write cursor.
    #[inline]
    pub fn writer_index(&self) -> usize {
        self.writer
    }

    /// Move the read cursor. Panics if `index` is past the write cursor.
    #[inline]
    pub fn set_reader_index(&mut self, index: usize) {
        assert!(
            index <= self.writer,
            "read cursor {index} past write cursor {}",
            self.writer
        );
        self.reader = index;
    }

    /// Move the write cursor. Panics if `index` is before the read cursor or
    /// past the capacity.
    #[inline]
    pub fn set_writer_index(&mut self, index: usize) {
        assert!(
            index >= self.reader && index <= self.data.len(),
            "write cursor {index} outside [{}, {}]",
            self.reader,
            self.data.len()
        );
        self.writer = index;
    }

    /// Reset both cursors to the start. Content is left as-is.
    #[inline]
    pub fn clear(&mut self) {
        self.reader = 0;
        self.writer = 0;
    }

    /// Bytes between the read and write cursors.
    #[inline]
    pub fn readable_bytes(&self) -> usize {
        self.writer - self.reader
    }

    /// Bytes between the write cursor and the capacity.
    #[inline]
    pub fn writable_bytes(&self) -> usize {
        self.data.len() - self.writer
    }

    /// View of the bytes currently readable.
    #[inline]
    pub fn readable(&self) -> &[u8] {
        &self.data[self.reader..self.writer]
    }

    /// Full-capacity view, ignoring cursors.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Full-capacity mutable view, ignoring cursors. Used by the boundary
    /// layer, which addresses the buffer as a raw region.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Write a `u16` in native order and advance the write cursor.
    #[inline]
    pub fn put_u16(&mut self, value: u16) {
        self.put_bytes(&value.to_ne_bytes());
    }

    /// Write a `u32` in native order and advance the write cursor.
    #[inline]
    pub fn put_u32(&mut self, value: u32) {
        self.put_bytes(&value.to_ne_bytes());
    }

    /// Write a `u64` in native order and advance the write cursor.
    #[inline]
    pub fn put_u64(&mut self, value: u64) {
        self.put_bytes(&value.to_ne_bytes());
    }

    /// Copy `src` at the write cursor and advance it.
    #[inline]
    pub fn put_slice(&mut self, src: &[u8]) {
        self.put_bytes(src);
    }

    /// Read a `u16` in native order and advance the read cursor.
    #[inline]
    pub fn read_u16(&mut self) -> u16 {
        u16::from_ne_bytes(self.read_bytes::<2>())
    }

    /// Read a `u32` in native order and advance the read cursor.
    #[inline]
    pub fn read_u32(&mut self) -> u32 {
        u32::from_ne_bytes(self.read_bytes::<4>())
    }

    /// Read a `u64` in native order and advance the read cursor.
    #[inline]
    pub fn read_u64(&mut self) -> u64 {
        u64::from_ne_bytes(self.read_bytes::<8>())
    }

    /// Absolute `u64` accessor, independent of the cursors. Panics if the
    /// eight bytes at `index` are out of bounds.
    #[inline]
    pub fn get_u64(&self, index: usize) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[index..index + 8]);
        u64::from_ne_bytes(bytes)
    }

    #[inline]
    fn put_bytes(&mut self, src: &[u8]) {
        let end = self.writer + src.len();
        assert!(
            end <= self.data.len(),
            "write of {} bytes at {} past capacity {}",
            src.len(),
            self.writer,
            self.data.len()
        );
        self.data[self.writer..end].copy_from_slice(src);
        self.writer = end;
    }

    #[inline]
    fn read_bytes<const N: usize>(&mut self) -> [u8; N] {
        let end = self.reader + N;
        assert!(
            end <= self.writer,
            "read of {N} bytes at {} past write cursor {}",
            self.reader,
            self.writer
        );
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.reader..end]);
        self.reader = end;
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursors_start_at_zero() {
        let buf = IoBuffer::zeroed(64);
        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.reader_index(), 0);
        assert_eq!(buf.writer_index(), 0);
        assert_eq!(buf.readable_bytes(), 0);
        assert_eq!(buf.writable_bytes(), 64);
    }

    #[test]
    fn write_then_read_round_trip() {
        let mut buf = IoBuffer::zeroed(32);
        buf.put_u64(0xDEAD_BEEF_CAFE_F00D);
        buf.put_u16(0x1234);
        buf.put_u32(42);
        assert_eq!(buf.readable_bytes(), 14);
        assert_eq!(buf.read_u64(), 0xDEAD_BEEF_CAFE_F00D);
        assert_eq!(buf.read_u16(), 0x1234);
        assert_eq!(buf.read_u32(), 42);
        assert_eq!(buf.readable_bytes(), 0);
    }

    #[test]
    fn writer_can_skip_forward_over_zeroed_slots() {
        let mut buf = IoBuffer::zeroed(16);
        buf.put_u16(7);
        buf.set_writer_index(10);
        buf.put_u16(9);
        assert_eq!(buf.writer_index(), 12);
        // The skipped slot stays zero-filled.
        assert_eq!(&buf.as_slice()[2..10], &[0u8; 8]);
    }

    #[test]
    fn absolute_get_ignores_cursors() {
        let mut buf = IoBuffer::zeroed(16);
        buf.put_u64(0xAB);
        buf.clear();
        assert_eq!(buf.get_u64(0), 0xAB);
    }

    #[test]
    #[should_panic(expected = "past capacity")]
    fn write_past_capacity_panics() {
        let mut buf = IoBuffer::zeroed(4);
        buf.put_u64(1);
    }

    #[test]
    #[should_panic(expected = "past write cursor")]
    fn read_past_writer_panics() {
        let mut buf = IoBuffer::zeroed(8);
        buf.put_u16(1);
        buf.read_u32();
    }
}
