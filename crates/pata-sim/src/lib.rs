//! Software model of a two-channel PATA controller for exercising `pata-pio`.
//!
//! [`SimBus`] implements [`pata_pio::PortIo`] and decodes the same legacy
//! port layout the driver programs, down to the taskfile high-byte shadow
//! registers and the PIO data phase. Tests attach [`SimDrive`]s, run the
//! real driver against the bus, then inspect the recorded I/O event log,
//! per-channel command counters and drive contents.
//!
//! The model is deliberately strict: data-port traffic outside a DRQ phase
//! is discarded, unknown commands are aborted and a selected slot with no
//! drive reads as zeros.

mod bus;
mod delay;
mod registry;

pub use bus::{
    IoEvent, SimBus, SimCounters, SimDrive, SimFault, SimPortMap, PRIMARY_PORTS, SECONDARY_PORTS,
};
pub use delay::{NoopDelay, RecordingDelay};
pub use registry::MemRegistry;
