//! Boot-sector partition table parsing and the partition block device.

use std::sync::Arc;

use crate::device::BlockDevice;
use crate::util::{blocks_in, checked_range};
use crate::{AtaError, Result, SECTOR_SIZE};

/// Trailing signature bytes of a valid boot sector.
pub const MBR_SIGNATURE: [u8; 2] = [0x55, 0xAA];

const PARTITION_TABLE_OFFSET: usize = 0x1BE;
const PARTITION_ENTRY_LEN: usize = 16;
const PARTITION_TABLE_ENTRIES: usize = 4;

/// One raw 16-byte slot of the partition table.
///
/// The CHS address triplets are obsolete and skipped; only the LBA fields are
/// carried. A `kind` of zero marks the slot unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionEntry {
    pub status: u8,
    pub kind: u8,
    pub first_lba: u32,
    pub sector_count: u32,
}

impl PartitionEntry {
    pub fn is_active(&self) -> bool {
        self.kind != 0
    }
}

pub fn has_boot_signature(sector: &[u8; SECTOR_SIZE]) -> bool {
    sector[SECTOR_SIZE - 2] == MBR_SIGNATURE[0] && sector[SECTOR_SIZE - 1] == MBR_SIGNATURE[1]
}

/// Decodes all four table slots; callers filter on [`PartitionEntry::is_active`].
pub fn parse_partition_table(sector: &[u8; SECTOR_SIZE]) -> [PartitionEntry; 4] {
    std::array::from_fn(|idx| {
        let base = PARTITION_TABLE_OFFSET + idx * PARTITION_ENTRY_LEN;
        let entry = &sector[base..base + PARTITION_ENTRY_LEN];
        PartitionEntry {
            status: entry[0],
            kind: entry[4],
            first_lba: u32::from_le_bytes([entry[8], entry[9], entry[10], entry[11]]),
            sector_count: u32::from_le_bytes([entry[12], entry[13], entry[14], entry[15]]),
        }
    })
}

/// Offset-rebased view over a contiguous range of a parent block device.
///
/// Satisfies the same [`BlockDevice`] contract as the parent; all addresses
/// are shifted by the partition's first LBA and bounded by its length.
pub struct Partition {
    parent: Arc<dyn BlockDevice>,
    table_index: usize,
    first_lba: u64,
    blocks: u64,
}

impl Partition {
    pub fn new(parent: Arc<dyn BlockDevice>, table_index: usize, first_lba: u64, blocks: u64) -> Self {
        Self {
            parent,
            table_index,
            first_lba,
            blocks,
        }
    }

    /// Slot this partition occupied in the parent's table.
    pub fn table_index(&self) -> usize {
        self.table_index
    }

    pub fn first_lba(&self) -> u64 {
        self.first_lba
    }

    fn rebase(&self, start: u64, len: usize) -> Result<u64> {
        let blocks = blocks_in(len, self.parent.block_size())?;
        checked_range(start, blocks, self.blocks)?;
        self.first_lba
            .checked_add(start)
            .ok_or(AtaError::OffsetOverflow)
    }
}

impl BlockDevice for Partition {
    fn device_class(&self) -> &'static str {
        "part"
    }

    fn block_size(&self) -> usize {
        self.parent.block_size()
    }

    fn block_count(&self) -> u64 {
        self.blocks
    }

    fn read_blocks(&self, start: u64, buf: &mut [u8]) -> Result<()> {
        let base = self.rebase(start, buf.len())?;
        self.parent.read_blocks(base, buf)
    }

    fn write_blocks(&self, start: u64, buf: &[u8]) -> Result<()> {
        let base = self.rebase(start, buf.len())?;
        self.parent.write_blocks(base, buf)
    }
}
