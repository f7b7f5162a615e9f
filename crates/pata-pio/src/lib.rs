//! Legacy PATA/IDE disk driver speaking the register protocol over
//! programmed I/O.
//!
//! The controller owns two channels of up to two drives each, probes and
//! identifies them at bring-up, and serializes transfers per channel. Each
//! identified drive exposes the [`BlockDevice`] contract with a fixed-capacity
//! FIFO block cache in front of reads, plus offset-rebased [`Partition`]
//! views discovered from its boot sector.
//!
//! The hardware seams are injected: raw port access ([`PortIo`]), settling
//! delays ([`Delay`]) and device registration ([`DeviceRegistry`]) are traits,
//! so the whole driver runs unmodified against a device model in tests.

mod cache;
mod controller;
mod device;
mod error;
mod identify;
mod io;
mod mbr;
pub mod regs;
mod util;

#[cfg(all(test, not(target_arch = "wasm32")))]
mod proptests;

pub use cache::{BlockCache, BlockCacheStats, CACHE_SIZE};
pub use controller::{AtaController, ControllerConfig};
pub use device::{AtaDrive, BlockDevice, DeviceRegistry};
pub use error::{AtaError, Result};
pub use identify::IdentifyData;
pub use io::{Delay, PortIo, SpinDelay};
pub use mbr::{has_boot_signature, parse_partition_table, Partition, PartitionEntry, MBR_SIGNATURE};
pub use regs::{ChannelId, ChannelPorts, DriveSelect};

/// Fixed block granularity of the ATA transfer protocol.
pub const SECTOR_SIZE: usize = 512;
