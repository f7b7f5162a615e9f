use crate::{AtaError, Result};

/// Converts a byte buffer length into a whole number of blocks.
pub fn blocks_in(len: usize, block_size: usize) -> Result<u64> {
    if block_size == 0 || len % block_size != 0 {
        return Err(AtaError::UnalignedLength {
            len,
            alignment: block_size,
        });
    }
    Ok((len / block_size) as u64)
}

pub fn checked_range(start: u64, blocks: u64, capacity: u64) -> Result<()> {
    let end = start.checked_add(blocks).ok_or(AtaError::OffsetOverflow)?;
    if end > capacity {
        return Err(AtaError::OutOfBounds {
            start,
            blocks,
            capacity,
        });
    }
    Ok(())
}
