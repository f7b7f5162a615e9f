//! Drive-level block API: identification, cached reads, writes, partitions.

use std::sync::{Arc, Mutex};

use crate::cache::{BlockCache, BlockCacheStats};
use crate::controller::AtaController;
use crate::identify::IdentifyData;
use crate::mbr::{self, Partition};
use crate::regs::{
    ChannelId, DriveSelect, ATA_CMD_READ_PIO_EXT, ATA_CMD_WRITE_PIO_EXT, ATA_DEVICE_LBA,
    ATA_REG_DATA, ATA_REG_DEVICE, ATA_REG_LBA0, ATA_REG_LBA1, ATA_REG_LBA2, ATA_REG_LBA3,
    ATA_REG_LBA4, ATA_REG_LBA5, ATA_REG_SECCOUNT0, ATA_REG_SECCOUNT1, ATA_REG_STATUS_COMMAND,
};
use crate::util::{blocks_in, checked_range};
use crate::{AtaError, Result, SECTOR_SIZE};

/// Block-granular storage contract consumed by filesystems and higher layers.
///
/// All addresses are in blocks of [`BlockDevice::block_size`] bytes; buffer
/// lengths must be whole multiples of the block size.
pub trait BlockDevice: Send + Sync {
    /// Short class tag the registry uses to mint device names ("ata", "part").
    fn device_class(&self) -> &'static str;

    fn block_size(&self) -> usize;

    fn block_count(&self) -> u64;

    fn read_blocks(&self, start: u64, buf: &mut [u8]) -> Result<()>;

    fn write_blocks(&self, start: u64, buf: &[u8]) -> Result<()>;
}

/// Host-side device registration collaborator.
pub trait DeviceRegistry {
    /// Registers a device and returns the name the registry assigned it.
    fn register(&mut self, device: Arc<dyn BlockDevice>) -> Result<String>;

    /// Binds an additional name to an already registered device.
    fn add_alias(&mut self, alias: &str, device: Arc<dyn BlockDevice>) -> Result<()>;
}

/// Direction selector for the shared transfer primitive, carrying the
/// matching buffer view.
enum Transfer<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

/// One identified drive in a (channel, device-select) slot.
///
/// Reads go through a per-drive FIFO block cache; writes go straight to the
/// hardware. Construction happens via the controller's probe path, which
/// leaves identify data waiting in the channel's data register.
pub struct AtaDrive {
    controller: Arc<AtaController>,
    channel: ChannelId,
    drive: DriveSelect,
    identity: IdentifyData,
    invalidate_on_write: bool,
    cache: Mutex<BlockCache>,
}

impl std::fmt::Debug for AtaDrive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtaDrive")
            .field("channel", &self.channel)
            .field("drive", &self.drive)
            .field("identity", &self.identity)
            .field("invalidate_on_write", &self.invalidate_on_write)
            .finish_non_exhaustive()
    }
}

impl AtaDrive {
    /// Decodes the pending identify data and builds the drive on success.
    pub(crate) fn identify(
        controller: &Arc<AtaController>,
        channel: ChannelId,
        drive: DriveSelect,
    ) -> Result<Self> {
        let mut sector = try_alloc_sector()?;
        controller.read_buffer(channel, ATA_REG_DATA, &mut sector[..]);
        let identity = IdentifyData::parse(&sector);
        tracing::debug!(
            ?channel,
            ?drive,
            signature = identity.signature,
            capabilities = identity.capabilities,
            command_sets = identity.command_sets,
            "decoded identify data"
        );

        if !identity.supports_lba() {
            tracing::warn!(?channel, ?drive, model = %identity.model, "drive lacks LBA support");
            return Err(AtaError::UnsupportedDrive);
        }

        Ok(Self {
            controller: Arc::clone(controller),
            channel,
            drive,
            invalidate_on_write: controller.config().write_invalidates_cache,
            identity,
            cache: Mutex::new(BlockCache::new(SECTOR_SIZE)),
        })
    }

    pub fn identity(&self) -> &IdentifyData {
        &self.identity
    }

    pub fn model(&self) -> &str {
        &self.identity.model
    }

    pub fn serial(&self) -> &str {
        &self.identity.serial
    }

    pub fn cache_stats(&self) -> BlockCacheStats {
        self.cache.lock().unwrap().stats()
    }

    /// Reads block 0 and decodes the partition table, if one is present.
    ///
    /// Inactive table slots are skipped; each active slot becomes an
    /// offset-rebased [`Partition`] backed by this drive.
    pub fn scan_partitions(self: &Arc<Self>) -> Result<Vec<Arc<Partition>>> {
        let mut sector = try_alloc_sector()?;
        self.read_blocks(0, &mut sector[..])?;
        if !mbr::has_boot_signature(&sector) {
            tracing::debug!(model = %self.identity.model, "no partition table signature");
            return Ok(Vec::new());
        }

        let mut partitions = Vec::new();
        for (idx, entry) in mbr::parse_partition_table(&sector).iter().enumerate() {
            if !entry.is_active() {
                continue;
            }
            tracing::debug!(
                index = idx,
                kind = entry.kind,
                first_lba = entry.first_lba,
                sectors = entry.sector_count,
                "found partition"
            );
            let parent: Arc<dyn BlockDevice> = self.clone();
            partitions.push(Arc::new(Partition::new(
                parent,
                idx,
                entry.first_lba as u64,
                entry.sector_count as u64,
            )));
        }
        Ok(partitions)
    }

    /// Programs and runs one PIO command with the channel lock held.
    ///
    /// Register order matters: the high halves of the sector count and LBA go
    /// out through the extended aliases before the low halves, then the
    /// command byte starts the transfer. Data moves one polled block at a
    /// time; the first poll failure aborts the remainder.
    fn transfer(&self, lba: u64, xfer: Transfer<'_>) -> Result<()> {
        let (command, len) = match &xfer {
            Transfer::Read(buf) => (ATA_CMD_READ_PIO_EXT, buf.len()),
            Transfer::Write(buf) => (ATA_CMD_WRITE_PIO_EXT, buf.len()),
        };
        let blocks = (len / SECTOR_SIZE) as u16;

        let ctrl = &self.controller;
        let _lock = ctrl.lock_channel(self.channel);
        ctrl.wait_idle(self.channel)?;

        ctrl.write_register(
            self.channel,
            ATA_REG_DEVICE,
            ATA_DEVICE_LBA | self.drive.device_bits(),
        );
        ctrl.write_register(self.channel, ATA_REG_SECCOUNT1, (blocks >> 8) as u8);
        ctrl.write_register(self.channel, ATA_REG_LBA3, (lba >> 24) as u8);
        ctrl.write_register(self.channel, ATA_REG_LBA4, (lba >> 32) as u8);
        ctrl.write_register(self.channel, ATA_REG_LBA5, (lba >> 40) as u8);
        ctrl.write_register(self.channel, ATA_REG_SECCOUNT0, blocks as u8);
        ctrl.write_register(self.channel, ATA_REG_LBA0, lba as u8);
        ctrl.write_register(self.channel, ATA_REG_LBA1, (lba >> 8) as u8);
        ctrl.write_register(self.channel, ATA_REG_LBA2, (lba >> 16) as u8);
        ctrl.write_register(self.channel, ATA_REG_STATUS_COMMAND, command);

        match xfer {
            Transfer::Read(buf) => {
                for chunk in buf.chunks_exact_mut(SECTOR_SIZE) {
                    ctrl.poll(self.channel, true)?;
                    ctrl.read_data(self.channel, chunk);
                }
            }
            Transfer::Write(buf) => {
                for chunk in buf.chunks_exact(SECTOR_SIZE) {
                    ctrl.poll(self.channel, true)?;
                    ctrl.write_data(self.channel, chunk);
                }
            }
        }
        Ok(())
    }
}

impl BlockDevice for AtaDrive {
    fn device_class(&self) -> &'static str {
        "ata"
    }

    fn block_size(&self) -> usize {
        SECTOR_SIZE
    }

    fn block_count(&self) -> u64 {
        self.identity.block_count()
    }

    /// Cached read: each block is served from the cache when present,
    /// otherwise fetched with a single-block transfer and inserted.
    ///
    /// A transfer failure returns immediately; blocks already copied out stay
    /// in the caller's buffer.
    fn read_blocks(&self, start: u64, buf: &mut [u8]) -> Result<()> {
        let blocks = blocks_in(buf.len(), SECTOR_SIZE)?;
        if blocks == 0 {
            return Ok(());
        }
        checked_range(start, blocks, self.block_count())?;

        let mut cache = self.cache.lock().unwrap();
        for (idx, chunk) in buf.chunks_exact_mut(SECTOR_SIZE).enumerate() {
            let lba = start + idx as u64;
            if let Some(cached) = cache.lookup(lba) {
                chunk.copy_from_slice(cached);
                continue;
            }
            self.transfer(lba, Transfer::Read(chunk))?;
            match cache.insert(lba) {
                Ok(slot) => slot.copy_from_slice(chunk),
                Err(err) => {
                    tracing::warn!(lba, error = %err, "block left uncached");
                }
            }
        }
        Ok(())
    }

    /// Uncached write of the whole range as one multi-block command.
    ///
    /// By default the read cache is left alone, so a cached block overwritten
    /// here keeps serving its old image until evicted. Constructing the
    /// controller with `write_invalidates_cache` drops the covered entries
    /// instead, whether or not the transfer succeeded.
    fn write_blocks(&self, start: u64, buf: &[u8]) -> Result<()> {
        let blocks = blocks_in(buf.len(), SECTOR_SIZE)?;
        if blocks == 0 {
            return Ok(());
        }
        checked_range(start, blocks, self.block_count())?;
        if blocks > u16::MAX as u64 {
            return Err(AtaError::TransferTooLarge { blocks });
        }

        let result = self.transfer(start, Transfer::Write(buf));
        if self.invalidate_on_write {
            let mut cache = self.cache.lock().unwrap();
            for idx in 0..blocks {
                cache.invalidate(start + idx);
            }
        }
        result
    }
}

/// Fallibly allocates one zeroed sector-sized work buffer.
fn try_alloc_sector() -> Result<Box<[u8; SECTOR_SIZE]>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(SECTOR_SIZE)
        .map_err(|_| AtaError::AllocationFailed)?;
    bytes.resize(SECTOR_SIZE, 0);
    bytes
        .into_boxed_slice()
        .try_into()
        .map_err(|_| AtaError::AllocationFailed)
}
