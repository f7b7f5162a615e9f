//! Two-channel ATA controller: register access, probing and busy-wait polling.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::device::{AtaDrive, BlockDevice, DeviceRegistry};
use crate::io::{Delay, PortIo};
use crate::regs::{
    ChannelId, ChannelPorts, DriveSelect, ATA_CMD_IDENTIFY, ATA_CTRL_HOB, ATA_DEVICE_PROBE,
    ATA_REG_ALTSTATUS_CONTROL, ATA_REG_DEVICE, ATA_REG_ERROR_FEATURES, ATA_REG_STATUS_COMMAND,
    ATA_STATUS_BSY, ATA_STATUS_DF, ATA_STATUS_DRQ, ATA_STATUS_ERR,
};
use crate::{AtaError, Result};

/// Construction-time controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// PCI base address registers; zeros select the legacy ISA ports. Masked
    /// and range-checked when the controller is built.
    pub bars: [u32; 5],
    /// Drop cached blocks covered by a write instead of leaving them stale.
    ///
    /// Off by default: the read cache historically ignores writes, and some
    /// callers rely on re-reading the stale image. See
    /// [`AtaDrive::write_blocks`](crate::AtaDrive).
    pub write_invalidates_cache: bool,
    /// Upper bound on busy-wait iterations per wait, `None` to spin forever.
    ///
    /// Real hardware is expected to clear BSY eventually, so the hardware
    /// default is unbounded. Tests and callers that cannot afford a hang set
    /// a budget and receive [`AtaError::Timeout`] past it.
    pub spin_budget: Option<u32>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bars: [0; 5],
            write_invalidates_cache: false,
            spin_budget: None,
        }
    }
}

/// Owns both channels of one PATA controller.
///
/// Register access and polling take `&self`; exclusive use of a channel
/// during a transfer is arranged through [`AtaController::lock_channel`],
/// which the block-device transfer path holds for the whole command.
pub struct AtaController {
    ports: Arc<dyn PortIo>,
    delay: Arc<dyn Delay>,
    channels: [ChannelPorts; 2],
    channel_locks: [Mutex<()>; 2],
    config: ControllerConfig,
}

/// RAII wrapper around the high-order latch needed by the extended LBA
/// registers.
///
/// Entering writes the HOB bit (plus the standing nIEN value) to the device
/// control register; dropping restores plain nIEN. The latch changes which
/// half of the 48-bit task file the aliased command-block ports address, so
/// no other access on the channel may be interleaved while a guard is live.
struct HighOrderGuard<'a> {
    ports: &'a dyn PortIo,
    control_port: u16,
    nien: u8,
    engaged: bool,
}

impl<'a> HighOrderGuard<'a> {
    fn enter(ports: &'a dyn PortIo, channel: &ChannelPorts, reg: u8) -> Self {
        let engaged = ChannelPorts::is_extended(reg);
        let control_port = channel.port_for(ATA_REG_ALTSTATUS_CONTROL);
        if engaged {
            ports.write_u8(control_port, ATA_CTRL_HOB | channel.nien);
        }
        Self {
            ports,
            control_port,
            nien: channel.nien,
            engaged,
        }
    }
}

impl Drop for HighOrderGuard<'_> {
    fn drop(&mut self) {
        if self.engaged {
            self.ports.write_u8(self.control_port, self.nien);
        }
    }
}

/// Busy-wait iteration allowance, decremented once per spin.
struct SpinBudget {
    remaining: Option<u32>,
}

impl SpinBudget {
    fn new(limit: Option<u32>) -> Self {
        Self { remaining: limit }
    }

    fn tick(&mut self) -> Result<()> {
        if let Some(left) = self.remaining.as_mut() {
            if *left == 0 {
                return Err(AtaError::Timeout);
            }
            *left -= 1;
        }
        std::hint::spin_loop();
        Ok(())
    }
}

impl std::fmt::Debug for AtaController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtaController")
            .field("channels", &self.channels)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AtaController {
    /// Builds the controller and both channel port maps.
    ///
    /// Fails with [`AtaError::InvalidConfig`] when a BAR would place part of
    /// its register block past the top of the I/O port space.
    pub fn new(
        config: ControllerConfig,
        ports: Arc<dyn PortIo>,
        delay: Arc<dyn Delay>,
    ) -> Result<Self> {
        let channels = [
            ChannelPorts::primary(&config.bars)?,
            ChannelPorts::secondary(&config.bars)?,
        ];
        Ok(Self {
            ports,
            delay,
            channels,
            channel_locks: [Mutex::new(()), Mutex::new(())],
            config,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn channel(&self, channel: ChannelId) -> &ChannelPorts {
        &self.channels[channel.index()]
    }

    /// Serializes transfers on one channel; the other channel is unaffected.
    pub(crate) fn lock_channel(&self, channel: ChannelId) -> MutexGuard<'_, ()> {
        self.channel_locks[channel.index()].lock().unwrap()
    }

    pub fn read_register(&self, channel: ChannelId, reg: u8) -> u8 {
        let ports = self.channel(channel);
        let _hob = HighOrderGuard::enter(self.ports.as_ref(), ports, reg);
        self.ports.read_u8(ports.port_for(reg))
    }

    pub fn write_register(&self, channel: ChannelId, reg: u8, value: u8) {
        let ports = self.channel(channel);
        let _hob = HighOrderGuard::enter(self.ports.as_ref(), ports, reg);
        self.ports.write_u8(ports.port_for(reg), value);
    }

    /// Reads `buf.len() / 4` doublewords from `reg` into `buf`.
    pub fn read_buffer(&self, channel: ChannelId, reg: u8, buf: &mut [u8]) {
        let ports = self.channel(channel);
        let _hob = HighOrderGuard::enter(self.ports.as_ref(), ports, reg);
        let port = ports.port_for(reg);
        for chunk in buf.chunks_exact_mut(4) {
            chunk.copy_from_slice(&self.ports.read_u32(port).to_le_bytes());
        }
    }

    /// Drains one block of PIO data, a 16-bit word at a time.
    pub(crate) fn read_data(&self, channel: ChannelId, buf: &mut [u8]) {
        let port = self.channel(channel).port_for(crate::regs::ATA_REG_DATA);
        for chunk in buf.chunks_exact_mut(2) {
            chunk.copy_from_slice(&self.ports.read_u16(port).to_le_bytes());
        }
    }

    /// Feeds one block of PIO data, a 16-bit word at a time.
    pub(crate) fn write_data(&self, channel: ChannelId, buf: &[u8]) {
        let port = self.channel(channel).port_for(crate::regs::ATA_REG_DATA);
        for chunk in buf.chunks_exact(2) {
            self.ports
                .write_u16(port, u16::from_le_bytes([chunk[0], chunk[1]]));
        }
    }

    /// Spins until the channel drops BSY.
    pub(crate) fn wait_idle(&self, channel: ChannelId) -> Result<()> {
        let mut budget = SpinBudget::new(self.config.spin_budget);
        while (self.read_register(channel, ATA_REG_STATUS_COMMAND) & ATA_STATUS_BSY) != 0 {
            budget.tick()?;
        }
        Ok(())
    }

    /// Waits out BSY and classifies the resulting status.
    ///
    /// With `check_errors` the status is re-read and mapped onto the transfer
    /// error taxonomy; without it the call only waits for idle.
    pub fn poll(&self, channel: ChannelId, check_errors: bool) -> Result<()> {
        // Settling time before status is meaningful.
        self.delay.spin_delay(Duration::from_nanos(400));
        self.wait_idle(channel)?;
        if !check_errors {
            return Ok(());
        }

        let status = self.read_register(channel, ATA_REG_STATUS_COMMAND);
        if (status & ATA_STATUS_ERR) != 0 {
            let error = self.read_register(channel, ATA_REG_ERROR_FEATURES);
            tracing::warn!(?channel, status, error, "drive reported an error");
            return Err(AtaError::DeviceError);
        }
        if (status & ATA_STATUS_DF) != 0 {
            tracing::warn!(?channel, status, "drive fault");
            return Err(AtaError::DriveFault);
        }
        if (status & ATA_STATUS_DRQ) == 0 {
            tracing::warn!(?channel, status, "data request never asserted");
            return Err(AtaError::NotReady);
        }
        Ok(())
    }

    /// Disables legacy interrupts and probes every slot in fixed order.
    ///
    /// Returns true only if every populated slot came up; empty slots do not
    /// count against the result.
    pub fn initialize(self: &Arc<Self>, registry: &mut dyn DeviceRegistry) -> bool {
        let status = self.read_register(ChannelId::Primary, ATA_REG_STATUS_COMMAND);
        tracing::info!(status, "initialising ATA controller");

        for channel in ChannelId::ALL {
            let nien = self.channel(channel).nien;
            self.write_register(channel, ATA_REG_ALTSTATUS_CONTROL, nien);
        }

        let mut success = true;
        for channel in ChannelId::ALL {
            for drive in DriveSelect::ALL {
                match self.probe_slot(channel, drive) {
                    Ok(None) => {}
                    Ok(Some(dev)) => success &= self.register_drive(registry, dev),
                    Err(err) => {
                        tracing::warn!(?channel, ?drive, error = %err, "slot probe failed");
                        success = false;
                    }
                }
            }
        }
        success
    }

    /// Probes one slot with the identify command.
    ///
    /// `Ok(None)` means the slot is empty; errors mean a device answered but
    /// did not complete identification.
    pub fn probe_slot(
        self: &Arc<Self>,
        channel: ChannelId,
        drive: DriveSelect,
    ) -> Result<Option<Arc<AtaDrive>>> {
        tracing::debug!(?channel, ?drive, "probing slot");
        self.write_register(channel, ATA_REG_DEVICE, ATA_DEVICE_PROBE | drive.device_bits());
        self.delay.spin_delay(Duration::from_millis(1));
        self.write_register(channel, ATA_REG_STATUS_COMMAND, ATA_CMD_IDENTIFY);
        self.delay.spin_delay(Duration::from_millis(1));

        if self.read_register(channel, ATA_REG_STATUS_COMMAND) == 0 {
            tracing::debug!(?channel, ?drive, "slot is empty");
            return Ok(None);
        }

        let mut budget = SpinBudget::new(self.config.spin_budget);
        loop {
            let status = self.read_register(channel, ATA_REG_STATUS_COMMAND);
            if (status & ATA_STATUS_ERR) != 0 {
                let error = self.read_register(channel, ATA_REG_ERROR_FEATURES);
                tracing::warn!(?channel, ?drive, status, error, "identify failed");
                return Err(AtaError::DeviceError);
            }
            if (status & ATA_STATUS_BSY) == 0 && (status & ATA_STATUS_DRQ) != 0 {
                break;
            }
            budget.tick()?;
        }

        let dev = AtaDrive::identify(self, channel, drive)?;
        tracing::info!(?channel, ?drive, model = dev.model(), "found ATA drive");
        Ok(Some(Arc::new(dev)))
    }

    fn register_drive(&self, registry: &mut dyn DeviceRegistry, dev: Arc<AtaDrive>) -> bool {
        // Scan before registering so a scan failure leaves nothing behind.
        let partitions = match dev.scan_partitions() {
            Ok(partitions) => partitions,
            Err(err) => {
                tracing::warn!(model = dev.model(), error = %err, "partition scan failed");
                return false;
            }
        };

        let device: Arc<dyn BlockDevice> = dev.clone();
        let name = match registry.register(device) {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(model = dev.model(), error = %err, "drive registration failed");
                return false;
            }
        };
        tracing::info!(
            name = %name,
            model = dev.model(),
            blocks = dev.block_count(),
            "registered drive"
        );

        for part in partitions {
            let alias = format!("{name}p{}", part.table_index());
            let device: Arc<dyn BlockDevice> = part.clone();
            match registry.register(device.clone()) {
                Ok(part_name) => {
                    tracing::info!(
                        name = %part_name,
                        alias = %alias,
                        first_lba = part.first_lba(),
                        blocks = part.block_count(),
                        "registered partition"
                    );
                    if let Err(err) = registry.add_alias(&alias, device) {
                        tracing::warn!(alias = %alias, error = %err, "partition alias failed");
                    }
                }
                Err(err) => {
                    tracing::warn!(alias = %alias, error = %err, "partition registration failed");
                }
            }
        }
        true
    }
}
