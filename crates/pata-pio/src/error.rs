use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtaError>;

/// Unified error type for ATA controller and block-device operations.
///
/// Probe-time absence of a drive is not an error (slots report `Ok(None)`);
/// this enum covers genuine protocol failures, capability mismatches and the
/// argument validation performed by the block-device API.
#[derive(Debug, Error)]
pub enum AtaError {
    /// The drive raised the ERR status bit. The error register contents are
    /// emitted on the log stream at the point of failure.
    #[error("drive reported an error status")]
    DeviceError,

    #[error("drive signalled a device fault")]
    DriveFault,

    /// Polling completed without the drive ever asserting DRQ.
    #[error("drive never became ready for data transfer")]
    NotReady,

    /// Only raised when a spin budget is configured; the default busy-wait
    /// spins forever like the hardware expects.
    #[error("drive stayed busy past the configured spin budget")]
    Timeout,

    #[error("drive does not support LBA addressing")]
    UnsupportedDrive,

    #[error("failed to allocate a block buffer")]
    AllocationFailed,

    #[error("unaligned buffer length {len} (expected multiple of {alignment})")]
    UnalignedLength { len: usize, alignment: usize },

    #[error("out of bounds: start={start} blocks={blocks} capacity={capacity}")]
    OutOfBounds {
        start: u64,
        blocks: u64,
        capacity: u64,
    },

    #[error("integer overflow while computing block offsets")]
    OffsetOverflow,

    #[error("transfer of {blocks} blocks exceeds the per-command sector count limit")]
    TransferTooLarge { blocks: u64 },

    #[error("device registration failed: {0}")]
    Registration(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
