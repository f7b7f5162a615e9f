//! ATA register numbering and the per-channel port map.
//!
//! Logical register indices cover four contiguous bands which land on three
//! physical port groups: the command block at `cmd_base`, the control block at
//! `ctrl_base` and the bus-master block at `bus_master_base`. The extended LBA
//! registers (0x08..=0x0B) alias the low command-block ports; selecting them
//! requires the high-order latch toggle performed by the controller.

use crate::{AtaError, Result};

/// One of the two register port groups on a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelId {
    Primary = 0,
    Secondary = 1,
}

impl ChannelId {
    pub const ALL: [ChannelId; 2] = [ChannelId::Primary, ChannelId::Secondary];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Device position on a channel, encoded in bit 4 of the device register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveSelect {
    Master = 0,
    Slave = 1,
}

impl DriveSelect {
    pub const ALL: [DriveSelect; 2] = [DriveSelect::Master, DriveSelect::Slave];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Contribution of this drive to a device register value.
    pub fn device_bits(self) -> u8 {
        (self as u8) << 4
    }

    pub fn from_device_reg(value: u8) -> Self {
        if (value & 0x10) != 0 {
            DriveSelect::Slave
        } else {
            DriveSelect::Master
        }
    }
}

// Logical register indices. 0x00..=0x07 are the command block, 0x08..=0x0B the
// extended LBA aliases, 0x0C..=0x0D the control block, 0x0E..=0x15 bus master.
pub const ATA_REG_DATA: u8 = 0x00;
pub const ATA_REG_ERROR_FEATURES: u8 = 0x01;
pub const ATA_REG_SECCOUNT0: u8 = 0x02;
pub const ATA_REG_LBA0: u8 = 0x03;
pub const ATA_REG_LBA1: u8 = 0x04;
pub const ATA_REG_LBA2: u8 = 0x05;
pub const ATA_REG_DEVICE: u8 = 0x06;
pub const ATA_REG_STATUS_COMMAND: u8 = 0x07;
pub const ATA_REG_SECCOUNT1: u8 = 0x08;
pub const ATA_REG_LBA3: u8 = 0x09;
pub const ATA_REG_LBA4: u8 = 0x0A;
pub const ATA_REG_LBA5: u8 = 0x0B;
pub const ATA_REG_ALTSTATUS_CONTROL: u8 = 0x0C;
pub const ATA_REG_DRIVE_ADDRESS: u8 = 0x0D;

// Status register bits.
pub const ATA_STATUS_ERR: u8 = 0x01;
pub const ATA_STATUS_IDX: u8 = 0x02;
pub const ATA_STATUS_CORR: u8 = 0x04;
pub const ATA_STATUS_DRQ: u8 = 0x08;
pub const ATA_STATUS_DSC: u8 = 0x10;
pub const ATA_STATUS_DF: u8 = 0x20;
pub const ATA_STATUS_DRDY: u8 = 0x40;
pub const ATA_STATUS_BSY: u8 = 0x80;

// Device control register bits.
pub const ATA_CTRL_NIEN: u8 = 0x02;
pub const ATA_CTRL_SRST: u8 = 0x04;
pub const ATA_CTRL_HOB: u8 = 0x80;

// Command bytes issued by this driver.
pub const ATA_CMD_READ_PIO_EXT: u8 = 0x24;
pub const ATA_CMD_WRITE_PIO_EXT: u8 = 0x34;
pub const ATA_CMD_IDENTIFY: u8 = 0xEC;

/// Base device register value for probing (obsolete bits set, CHS addressing).
pub const ATA_DEVICE_PROBE: u8 = 0xA0;
/// Base device register value for LBA transfers.
pub const ATA_DEVICE_LBA: u8 = 0xE0;

/// Resolves one BAR to a port base, falling back to `default` when it is zero.
///
/// `last_offset` is the highest offset the driver addresses within the block;
/// a non-zero BAR whose masked base cannot reach it inside the 16-bit port
/// space is rejected rather than left to wrap.
fn checked_base(bar: u32, default: u16, last_offset: u16) -> Result<u16> {
    if bar == 0 {
        return Ok(default);
    }
    let Ok(base) = u16::try_from(bar & !3) else {
        return Err(AtaError::InvalidConfig("I/O BAR beyond the 16-bit port space"));
    };
    if base.checked_add(last_offset).is_none() {
        return Err(AtaError::InvalidConfig("I/O BAR leaves no room for its register block"));
    }
    Ok(base)
}

/// Physical port assignment for one channel.
///
/// Built from the five PCI base address registers, falling back to the legacy
/// ISA layout wherever a BAR is zero. Construction validates that every
/// register block fits below the top of the port space, so [`port_for`]
/// arithmetic cannot wrap. `nien` is the interrupt-disable value this driver
/// keeps programmed into the device control register; it never changes after
/// construction and is re-written verbatim when the high-order latch is
/// released.
///
/// [`port_for`]: ChannelPorts::port_for
#[derive(Debug, Clone, Copy)]
pub struct ChannelPorts {
    pub cmd_base: u16,
    pub ctrl_base: u16,
    pub bus_master_base: u16,
    pub nien: u8,
}

// Highest in-block offsets reachable through port_for. The bus-master block
// spans both channels, 8 ports each.
const CMD_BLOCK_LAST: u16 = 7;
const CTRL_BLOCK_LAST: u16 = 3;
const BUS_MASTER_LAST: u16 = 15;

impl ChannelPorts {
    pub fn primary(bars: &[u32; 5]) -> Result<Self> {
        Ok(Self {
            cmd_base: checked_base(bars[0], 0x1F0, CMD_BLOCK_LAST)?,
            ctrl_base: checked_base(bars[1], 0x3F6, CTRL_BLOCK_LAST)?,
            bus_master_base: checked_base(bars[4], 0, BUS_MASTER_LAST)?,
            nien: ATA_CTRL_NIEN,
        })
    }

    pub fn secondary(bars: &[u32; 5]) -> Result<Self> {
        Ok(Self {
            cmd_base: checked_base(bars[2], 0x170, CMD_BLOCK_LAST)?,
            ctrl_base: checked_base(bars[3], 0x376, CTRL_BLOCK_LAST)?,
            bus_master_base: checked_base(bars[4], 0, BUS_MASTER_LAST)? + 8,
            nien: ATA_CTRL_NIEN,
        })
    }

    /// True for the extended LBA registers that need the high-order latch.
    pub fn is_extended(reg: u8) -> bool {
        (ATA_REG_SECCOUNT1..=ATA_REG_LBA5).contains(&reg)
    }

    /// Maps a logical register index onto its physical port.
    pub fn port_for(&self, reg: u8) -> u16 {
        debug_assert!(reg <= 0x15, "register index {reg:#04x} out of range");
        let reg = reg as u16;
        match reg {
            0x00..=0x07 => self.cmd_base + reg,
            0x08..=0x0B => self.cmd_base + reg - 0x06,
            0x0C..=0x0D => self.ctrl_base + reg - 0x0A,
            _ => self.bus_master_base + reg - 0x0E,
        }
    }
}
