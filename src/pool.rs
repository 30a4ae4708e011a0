//! Reuse pool for fixed-capacity I/O buffers.
//!
//! Descriptors that live for many call cycles keep their buffers for their
//! whole lifetime, but callers that churn short-lived descriptors can avoid
//! repeated allocation by drawing buffers from a pool. Buffers check out as
//! [`PooledIoBuffer`] and return to the pool on drop.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::buffer::IoBuffer;

/// A buffer checked out from an [`IoBufferPool`].
///
/// Returns to its pool on drop. Checked-out buffers always start with both
/// cursors at zero.
pub struct PooledIoBuffer {
    buffer: Option<IoBuffer>,
    pool: Option<Weak<PoolInner>>,
}

impl PooledIoBuffer {
    /// Create a standalone buffer not backed by any pool.
    pub fn standalone(capacity: usize) -> Self {
        Self {
            buffer: Some(IoBuffer::zeroed(capacity)),
            pool: None,
        }
    }

    /// Access the underlying buffer.
    pub fn buffer(&self) -> &IoBuffer {
        self.buffer
            .as_ref()
            .unwrap_or_else(|| unreachable!("buffer only absent after drop"))
    }

    /// Mutable access to the underlying buffer.
    pub fn buffer_mut(&mut self) -> &mut IoBuffer {
        self.buffer
            .as_mut()
            .unwrap_or_else(|| unreachable!("buffer only absent after drop"))
    }

    /// Detach the buffer from the pool, keeping it alive independently.
    pub fn into_inner(mut self) -> IoBuffer {
        self.pool = None;
        self.buffer
            .take()
            .unwrap_or_else(|| unreachable!("buffer only absent after drop"))
    }
}

impl Drop for PooledIoBuffer {
    fn drop(&mut self) {
        if let Some(weak) = self.pool.take() {
            if let Some(pool) = weak.upgrade() {
                if let Some(buffer) = self.buffer.take() {
                    pool.return_buffer(buffer);
                }
            }
        }
    }
}

struct PoolInner {
    free: Mutex<Vec<IoBuffer>>,
    buffer_capacity: usize,
    max_pooled: usize,
}

impl PoolInner {
    fn return_buffer(&self, buffer: IoBuffer) {
        let mut free = self.free.lock();
        if free.len() < self.max_pooled {
            free.push(buffer);
        }
        // Otherwise just drop it.
    }
}

/// Pool of equally-sized [`IoBuffer`]s.
///
/// Pre-allocates `initial_count` buffers and keeps at most `max_pooled`
/// returned buffers around; checkouts beyond the free list allocate fresh.
pub struct IoBufferPool {
    inner: Arc<PoolInner>,
}

impl IoBufferPool {
    /// Create a pool of buffers with the given per-buffer capacity.
    pub fn new(buffer_capacity: usize, initial_count: usize, max_pooled: usize) -> Self {
        let free = (0..initial_count)
            .map(|_| IoBuffer::zeroed(buffer_capacity))
            .collect();
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(free),
                buffer_capacity,
                max_pooled,
            }),
        }
    }

    /// Check out a buffer, allocating a fresh one if the free list is empty.
    pub fn get(&self) -> PooledIoBuffer {
        let buffer = self.inner.free.lock().pop();
        let mut buffer =
            buffer.unwrap_or_else(|| IoBuffer::zeroed(self.inner.buffer_capacity));
        buffer.clear();
        PooledIoBuffer {
            buffer: Some(buffer),
            pool: Some(Arc::downgrade(&self.inner)),
        }
    }

    /// Number of buffers currently on the free list.
    pub fn available(&self) -> usize {
        self.inner.free.lock().len()
    }

    /// Per-buffer capacity this pool hands out.
    pub fn buffer_capacity(&self) -> usize {
        self.inner.buffer_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_returns_on_drop() {
        let pool = IoBufferPool::new(64, 2, 4);
        assert_eq!(pool.available(), 2);
        {
            let a = pool.get();
            let b = pool.get();
            assert_eq!(pool.available(), 0);
            assert_eq!(a.buffer().capacity(), 64);
            assert_eq!(b.buffer().capacity(), 64);
        }
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn empty_pool_allocates_fresh() {
        let pool = IoBufferPool::new(16, 0, 1);
        let mut buf = pool.get();
        buf.buffer_mut().put_u32(7);
        drop(buf);
        assert_eq!(pool.available(), 1);
        // Reused buffers come back with cleared cursors.
        assert_eq!(pool.get().buffer().readable_bytes(), 0);
    }

    #[test]
    fn max_pooled_caps_the_free_list() {
        let pool = IoBufferPool::new(8, 0, 1);
        let a = pool.get();
        let b = pool.get();
        drop(a);
        drop(b);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn into_inner_detaches_from_pool() {
        let pool = IoBufferPool::new(8, 1, 1);
        let buf = pool.get().into_inner();
        drop(buf);
        assert_eq!(pool.available(), 0);
    }
}
