//! Host-side state buffers.
//!
//! [`PingPong`] holds the two phase buffers. One slot is "current" (fully
//! written, visible to readers); the other is the write target of the next
//! phase pass. [`PingPong::swap`] publishes the freshly written slot as a
//! whole, so a reader holding a [`SnapshotReader`] only ever sees complete
//! snapshots.

use std::sync::{Arc, RwLock};

use crate::error::{Result, SimError};

/// Zero-initialized buffer of `len` elements.
///
/// Fails with [`SimError::ResourceExhausted`] instead of aborting when the
/// allocator cannot satisfy the request.
pub fn allocate_zeroed(len: usize, what: &'static str) -> Result<Vec<f32>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| SimError::ResourceExhausted {
            what,
            requested: len,
        })?;
    buffer.resize(len, 0.0);
    Ok(buffer)
}

type Published = Arc<RwLock<Arc<Vec<f32>>>>;

/// Double-buffered phase storage.
pub struct PingPong {
    slots: [Arc<Vec<f32>>; 2],
    current: usize,
    published: Published,
}

impl PingPong {
    pub fn allocate(len: usize) -> Result<Self> {
        let a = Arc::new(allocate_zeroed(len, "phase buffer (read)")?);
        let b = Arc::new(allocate_zeroed(len, "phase buffer (write)")?);
        let published = Arc::new(RwLock::new(Arc::clone(&a)));
        Ok(Self {
            slots: [a, b],
            current: 0,
            published,
        })
    }

    pub fn len(&self) -> usize {
        self.slots[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index (0 or 1) of the slot that is currently visible.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The fully written snapshot from the last completed swap.
    pub fn current(&self) -> &[f32] {
        &self.slots[self.current]
    }

    pub fn current_arc(&self) -> Arc<Vec<f32>> {
        Arc::clone(&self.slots[self.current])
    }

    /// Overwrite both slots with `values` and publish them.
    pub fn initialize(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.len() {
            return Err(SimError::mismatch("phase initialize", self.len(), values.len()));
        }
        for slot in self.slots.iter_mut() {
            Arc::make_mut(slot).copy_from_slice(values);
        }
        self.publish();
        Ok(())
    }

    /// Run `pass` with the current slot as input and the other slot as output.
    ///
    /// Nothing becomes visible until [`swap`](Self::swap) is called.
    pub fn write_with<F>(&mut self, pass: F)
    where
        F: FnOnce(&[f32], &mut [f32]),
    {
        let [a, b] = &mut self.slots;
        let (read, write) = if self.current == 0 { (a, b) } else { (b, a) };
        // Clones only when a reader still holds the old snapshot
        let write = Arc::make_mut(write);
        pass(read.as_slice(), write.as_mut_slice());
    }

    /// Promote the write slot to current and publish it.
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
        self.publish();
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            published: Arc::clone(&self.published),
        }
    }

    fn publish(&self) {
        let snapshot = Arc::clone(&self.slots[self.current]);
        let mut guard = self
            .published
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = snapshot;
    }
}

/// Cloneable handle for observing the current phase buffer from any thread.
#[derive(Clone)]
pub struct SnapshotReader {
    published: Published,
}

impl SnapshotReader {
    pub fn snapshot(&self) -> Arc<Vec<f32>> {
        let guard = self
            .published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }
}
