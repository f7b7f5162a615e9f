use std::collections::VecDeque;

use crate::{AtaError, Result};

/// Number of block images a drive cache holds at once.
pub const CACHE_SIZE: usize = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct CacheSlot {
    offset: u64,
    data: Vec<u8>,
}

/// Fixed-capacity FIFO cache mapping block offset to block image.
///
/// Eviction is strictly in insertion order: a lookup hit does not promote the
/// entry, so the victim at capacity is always the oldest insertion no matter
/// how recently it was read. This is deliberately not an LRU; the policy keeps
/// the hot path allocation-free by re-keying the evicted slot's storage
/// in place.
pub struct BlockCache {
    slots: VecDeque<CacheSlot>,
    capacity: usize,
    block_size: usize,
    stats: BlockCacheStats,
}

impl BlockCache {
    /// Cache with the standard drive capacity of [`CACHE_SIZE`] blocks.
    pub fn new(block_size: usize) -> Self {
        Self {
            slots: VecDeque::new(),
            capacity: CACHE_SIZE,
            block_size,
            stats: BlockCacheStats::default(),
        }
    }

    pub fn with_capacity(block_size: usize, capacity: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(AtaError::InvalidConfig("block_size must be > 0"));
        }
        if capacity == 0 {
            return Err(AtaError::InvalidConfig("capacity must be > 0"));
        }
        Ok(Self {
            slots: VecDeque::new(),
            capacity,
            block_size,
            stats: BlockCacheStats::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn stats(&self) -> BlockCacheStats {
        self.stats
    }

    /// Returns the cached image for `offset`, if present.
    ///
    /// A hit leaves the FIFO order untouched.
    pub fn lookup(&mut self, offset: u64) -> Option<&[u8]> {
        match self.slots.iter().position(|slot| slot.offset == offset) {
            Some(idx) => {
                self.stats.hits += 1;
                Some(self.slots[idx].data.as_slice())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Claims a writable block image for `offset` at the back of the FIFO.
    ///
    /// At capacity the oldest entry is evicted and its storage re-keyed, so
    /// insertion only allocates while the cache is still filling. The returned
    /// slice may hold stale bytes from the evicted block; callers overwrite it
    /// in full.
    pub fn insert(&mut self, offset: u64) -> Result<&mut [u8]> {
        debug_assert!(
            self.slots.iter().all(|slot| slot.offset != offset),
            "duplicate cache key {offset}"
        );
        if self.slots.len() >= self.capacity {
            if let Some(mut victim) = self.slots.pop_front() {
                victim.offset = offset;
                self.slots.push_back(victim);
                self.stats.evictions += 1;
            }
        } else {
            let mut data = Vec::new();
            data.try_reserve_exact(self.block_size)
                .map_err(|_| AtaError::AllocationFailed)?;
            data.resize(self.block_size, 0);
            self.slots.push_back(CacheSlot { offset, data });
        }
        let Some(slot) = self.slots.back_mut() else {
            return Err(AtaError::AllocationFailed);
        };
        Ok(slot.data.as_mut_slice())
    }

    /// Drops the entry for `offset`, preserving the order of the rest.
    pub fn invalidate(&mut self, offset: u64) -> bool {
        match self.slots.iter().position(|slot| slot.offset == offset) {
            Some(idx) => {
                self.slots.remove(idx);
                true
            }
            None => false,
        }
    }
}
