use std::time::{Duration, Instant};

/// Raw x86 port I/O, the hardware seam underneath the controller.
///
/// On a real machine this is `in`/`out` instructions; in tests it is a device
/// model. Implementations take `&self` because port accesses are externally
/// serialized by the controller's per-channel locks and implementations are
/// expected to manage any interior state themselves.
pub trait PortIo: Send + Sync {
    fn read_u8(&self, port: u16) -> u8;
    fn write_u8(&self, port: u16, value: u8);
    fn read_u16(&self, port: u16) -> u16;
    fn write_u16(&self, port: u16, value: u16);
    fn read_u32(&self, port: u16) -> u32;
    fn write_u32(&self, port: u16, value: u32);
}

/// Busy-wait timing source used for hardware settling delays.
pub trait Delay: Send + Sync {
    /// Spin for at least `duration` of wall time.
    fn spin_delay(&self, duration: Duration);
}

/// [`Delay`] implementation that burns host CPU until the deadline passes.
#[derive(Debug, Default)]
pub struct SpinDelay;

impl Delay for SpinDelay {
    fn spin_delay(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}
