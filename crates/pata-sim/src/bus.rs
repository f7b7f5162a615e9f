//! Port-level model of a two-channel PATA controller with attached drives.

use std::collections::HashMap;
use std::sync::Mutex;

use pata_pio::regs::{
    ATA_CMD_IDENTIFY, ATA_CMD_READ_PIO_EXT, ATA_CMD_WRITE_PIO_EXT, ATA_CTRL_HOB, ATA_REG_DATA,
    ATA_REG_DEVICE, ATA_REG_ERROR_FEATURES, ATA_REG_LBA0, ATA_REG_LBA1, ATA_REG_LBA2,
    ATA_REG_SECCOUNT0, ATA_REG_STATUS_COMMAND, ATA_STATUS_BSY, ATA_STATUS_DF, ATA_STATUS_DRDY,
    ATA_STATUS_DRQ, ATA_STATUS_ERR,
};
use pata_pio::{ChannelId, DriveSelect, PortIo, SECTOR_SIZE};

/// ABRT bit in the error register.
const ERROR_ABORT: u8 = 0x04;

/// Physical port assignment the model decodes for one channel. The control
/// block follows the driver's layout: the device control register sits at
/// `ctrl_base + 2` and the drive address register at `ctrl_base + 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPortMap {
    pub cmd_base: u16,
    pub ctrl_base: u16,
}

pub const PRIMARY_PORTS: SimPortMap = SimPortMap {
    cmd_base: 0x1F0,
    ctrl_base: 0x3F6,
};

pub const SECONDARY_PORTS: SimPortMap = SimPortMap {
    cmd_base: 0x170,
    ctrl_base: 0x376,
};

/// One recorded port access, in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoEvent {
    pub port: u16,
    pub write: bool,
    pub size: u8,
    /// Value written, or value returned for reads.
    pub value: u32,
}

/// Commands serviced per channel since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimCounters {
    pub identify_commands: [u64; 2],
    pub read_commands: [u64; 2],
    pub write_commands: [u64; 2],
}

/// Failure the selected drive injects into subsequent commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimFault {
    #[default]
    None,
    /// Abort IDENTIFY DEVICE with ERR set.
    IdentifyAbort,
    /// Abort read and write commands with ERR set.
    CommandAbort,
    /// Fail read and write commands with the device fault status bit.
    DriveFault,
    /// Complete read and write commands without ever raising DRQ.
    NotReady,
    /// Hang the next command with BSY asserted forever.
    StuckBusy,
}

/// Simulated drive: sparse sector store plus the identity it reports.
#[derive(Debug, Clone)]
pub struct SimDrive {
    sectors: HashMap<u64, [u8; SECTOR_SIZE]>,
    capacity: u64,
    model: String,
    serial: String,
    lba_supported: bool,
    lba48: bool,
    fault: SimFault,
}

impl SimDrive {
    pub fn new(capacity: u64) -> Self {
        Self {
            sectors: HashMap::new(),
            capacity,
            model: "SIM HARDDISK".to_string(),
            serial: "SIM0001".to_string(),
            lba_supported: true,
            lba48: true,
            fault: SimFault::None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_serial(mut self, serial: &str) -> Self {
        self.serial = serial.to_string();
        self
    }

    /// Reports a 28-bit-only drive; the capacity then comes from the
    /// legacy sector count field of the identify data.
    pub fn without_lba48(mut self) -> Self {
        self.lba48 = false;
        self
    }

    /// Reports a drive with no LBA capability at all.
    pub fn without_lba(mut self) -> Self {
        self.lba_supported = false;
        self
    }

    pub fn with_fault(mut self, fault: SimFault) -> Self {
        self.fault = fault;
        self
    }

    /// Fills one sector with a repeated byte.
    pub fn fill_sector(&mut self, lba: u64, byte: u8) {
        self.sectors.insert(lba, [byte; SECTOR_SIZE]);
    }

    pub fn put_sector(&mut self, lba: u64, data: [u8; SECTOR_SIZE]) {
        self.sectors.insert(lba, data);
    }

    /// Current contents of one sector; unwritten sectors read as zeros.
    pub fn sector(&self, lba: u64) -> [u8; SECTOR_SIZE] {
        self.sectors.get(&lba).copied().unwrap_or([0; SECTOR_SIZE])
    }

    fn read_sectors(&self, lba: u64, sectors: u64) -> Option<Vec<u8>> {
        let end = lba.checked_add(sectors)?;
        if end > self.capacity {
            return None;
        }
        let mut buf = vec![0u8; sectors as usize * SECTOR_SIZE];
        for (i, chunk) in buf.chunks_exact_mut(SECTOR_SIZE).enumerate() {
            if let Some(sector) = self.sectors.get(&(lba + i as u64)) {
                chunk.copy_from_slice(sector);
            }
        }
        Some(buf)
    }

    fn write_sectors(&mut self, lba: u64, sectors: u64, data: &[u8]) -> bool {
        let Some(end) = lba.checked_add(sectors) else {
            return false;
        };
        if end > self.capacity || data.len() < sectors as usize * SECTOR_SIZE {
            return false;
        }
        for (i, chunk) in data.chunks_exact(SECTOR_SIZE).take(sectors as usize).enumerate() {
            let mut sector = [0u8; SECTOR_SIZE];
            sector.copy_from_slice(chunk);
            self.sectors.insert(lba + i as u64, sector);
        }
        true
    }

    /// Builds the 512-byte IDENTIFY DEVICE response.
    fn identify_sector(&self) -> [u8; SECTOR_SIZE] {
        let mut words = [0u16; SECTOR_SIZE / 2];
        // General configuration: ATA device, fixed media.
        words[0] = 0x0040;
        put_ata_string(&mut words[10..20], &self.serial);
        put_ata_string(&mut words[23..27], "1.0");
        put_ata_string(&mut words[27..47], &self.model);
        if self.lba_supported {
            words[49] = 1 << 9;
        }
        let lba28 = self.capacity.min(0x0FFF_FFFF) as u32;
        words[60] = lba28 as u16;
        words[61] = (lba28 >> 16) as u16;
        if self.lba48 {
            // Bit 26 of the command set dword at words 82..84.
            words[83] = 1 << 10;
            words[100] = self.capacity as u16;
            words[101] = (self.capacity >> 16) as u16;
            words[102] = (self.capacity >> 32) as u16;
        }
        let mut out = [0u8; SECTOR_SIZE];
        for (chunk, word) in out.chunks_exact_mut(2).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

/// Packs text into identify words: space padded, two bytes per word with the
/// first character in the high byte.
fn put_ata_string(words: &mut [u16], text: &str) {
    let mut bytes = vec![b' '; words.len() * 2];
    let src = text.as_bytes();
    let len = src.len().min(bytes.len());
    bytes[..len].copy_from_slice(&src[..len]);
    for (word, pair) in words.iter_mut().zip(bytes.chunks_exact(2)) {
        *word = u16::from_be_bytes([pair[0], pair[1]]);
    }
}

/// Shadow register file with the two-deep high/low byte queue used by
/// 48-bit commands. The first write to a shadowed register lands in the
/// high-order byte, the second in the low-order byte.
#[derive(Debug, Clone, Default)]
struct TaskFile {
    sector_count: u8,
    lba0: u8,
    lba1: u8,
    lba2: u8,
    device: u8,

    hob_sector_count: u8,
    hob_lba0: u8,
    hob_lba1: u8,
    hob_lba2: u8,

    pending_sector_count_high: bool,
    pending_lba0_high: bool,
    pending_lba1_high: bool,
    pending_lba2_high: bool,
}

impl TaskFile {
    fn write_reg(&mut self, reg: u8, value: u8) {
        match reg {
            ATA_REG_SECCOUNT0 => write_shadowed(
                &mut self.sector_count,
                &mut self.hob_sector_count,
                &mut self.pending_sector_count_high,
                value,
            ),
            ATA_REG_LBA0 => {
                write_shadowed(&mut self.lba0, &mut self.hob_lba0, &mut self.pending_lba0_high, value)
            }
            ATA_REG_LBA1 => {
                write_shadowed(&mut self.lba1, &mut self.hob_lba1, &mut self.pending_lba1_high, value)
            }
            ATA_REG_LBA2 => {
                write_shadowed(&mut self.lba2, &mut self.hob_lba2, &mut self.pending_lba2_high, value)
            }
            ATA_REG_DEVICE => self.device = value,
            _ => {}
        }
    }

    fn read_reg(&self, reg: u8, hob: bool) -> u8 {
        match reg {
            ATA_REG_SECCOUNT0 if hob => self.hob_sector_count,
            ATA_REG_SECCOUNT0 => self.sector_count,
            ATA_REG_LBA0 if hob => self.hob_lba0,
            ATA_REG_LBA0 => self.lba0,
            ATA_REG_LBA1 if hob => self.hob_lba1,
            ATA_REG_LBA1 => self.lba1,
            ATA_REG_LBA2 if hob => self.hob_lba2,
            ATA_REG_LBA2 => self.lba2,
            ATA_REG_DEVICE => self.device,
            _ => 0,
        }
    }

    /// Settles the queue when a command byte arrives. A 28-bit command that
    /// saw only one write per register takes that value as the low byte.
    fn normalize_for_command(&mut self, is_lba48: bool) {
        if !is_lba48 {
            if self.pending_sector_count_high {
                self.sector_count = self.hob_sector_count;
            }
            if self.pending_lba0_high {
                self.lba0 = self.hob_lba0;
            }
            if self.pending_lba1_high {
                self.lba1 = self.hob_lba1;
            }
            if self.pending_lba2_high {
                self.lba2 = self.hob_lba2;
            }
        }
        self.pending_sector_count_high = false;
        self.pending_lba0_high = false;
        self.pending_lba1_high = false;
        self.pending_lba2_high = false;
    }

    fn lba48(&self) -> u64 {
        (self.hob_lba2 as u64) << 40
            | (self.hob_lba1 as u64) << 32
            | (self.hob_lba0 as u64) << 24
            | (self.lba2 as u64) << 16
            | (self.lba1 as u64) << 8
            | self.lba0 as u64
    }

    /// Sector count for 48-bit commands; zero means 65536.
    fn sector_count48(&self) -> u32 {
        let count = (self.hob_sector_count as u32) << 8 | self.sector_count as u32;
        if count == 0 {
            65536
        } else {
            count
        }
    }
}

fn write_shadowed(low: &mut u8, high: &mut u8, pending: &mut bool, value: u8) {
    if *pending {
        *low = value;
        *pending = false;
    } else {
        *high = value;
        *pending = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataMode {
    None,
    PioIn,
    PioOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferKind {
    Identify,
    PioRead,
    PioWrite,
}

struct SimChannel {
    drives: [Option<SimDrive>; 2],
    tf: TaskFile,
    status: u8,
    error: u8,
    control: u8,
    data_mode: DataMode,
    transfer_kind: Option<TransferKind>,
    data: Vec<u8>,
    data_index: usize,
    /// LBA and sector count of an accepted write, committed when its data
    /// phase completes.
    pio_write: Option<(u64, u64)>,
    identify_commands: u64,
    read_commands: u64,
    write_commands: u64,
}

impl SimChannel {
    fn new() -> Self {
        Self {
            drives: [None, None],
            tf: TaskFile::default(),
            status: ATA_STATUS_DRDY,
            error: 0,
            control: 0,
            data_mode: DataMode::None,
            transfer_kind: None,
            data: Vec::new(),
            data_index: 0,
            pio_write: None,
            identify_commands: 0,
            read_commands: 0,
            write_commands: 0,
        }
    }

    fn selected_drive(&self) -> usize {
        DriveSelect::from_device_reg(self.tf.device).index()
    }

    fn abort_command(&mut self, error: u8) {
        self.data_mode = DataMode::None;
        self.transfer_kind = None;
        self.data.clear();
        self.data_index = 0;
        self.pio_write = None;
        self.error = error;
        self.status &= !(ATA_STATUS_BSY | ATA_STATUS_DRQ);
        self.status |= ATA_STATUS_DRDY | ATA_STATUS_ERR;
    }

    fn fault_command(&mut self) {
        self.data_mode = DataMode::None;
        self.transfer_kind = None;
        self.data.clear();
        self.data_index = 0;
        self.pio_write = None;
        self.status &= !(ATA_STATUS_BSY | ATA_STATUS_DRQ);
        self.status |= ATA_STATUS_DRDY | ATA_STATUS_DF;
    }

    fn complete_non_data_command(&mut self) {
        self.data_mode = DataMode::None;
        self.transfer_kind = None;
        self.data.clear();
        self.data_index = 0;
        self.status &= !(ATA_STATUS_BSY | ATA_STATUS_DRQ);
        self.status |= ATA_STATUS_DRDY;
    }

    fn begin_pio_in(&mut self, kind: TransferKind, data: Vec<u8>) {
        self.data = data;
        self.data_index = 0;
        self.data_mode = DataMode::PioIn;
        self.transfer_kind = Some(kind);
        self.status &= !ATA_STATUS_BSY;
        self.status |= ATA_STATUS_DRDY | ATA_STATUS_DRQ;
    }

    fn begin_pio_out(&mut self, kind: TransferKind, len: usize) {
        self.data = vec![0; len];
        self.data_index = 0;
        self.data_mode = DataMode::PioOut;
        self.transfer_kind = Some(kind);
        self.status &= !ATA_STATUS_BSY;
        self.status |= ATA_STATUS_DRDY | ATA_STATUS_DRQ;
    }

    fn finish_data_phase(&mut self) {
        match self.transfer_kind {
            Some(TransferKind::PioWrite) => {
                let Some((lba, sectors)) = self.pio_write.take() else {
                    self.abort_command(ERROR_ABORT);
                    return;
                };
                let data = std::mem::take(&mut self.data);
                let idx = self.selected_drive();
                let ok = match self.drives[idx].as_mut() {
                    Some(drive) => drive.write_sectors(lba, sectors, &data),
                    None => false,
                };
                if ok {
                    self.complete_non_data_command();
                } else {
                    self.abort_command(ERROR_ABORT);
                }
            }
            _ => {
                self.data_mode = DataMode::None;
                self.transfer_kind = None;
                self.data.clear();
                self.data_index = 0;
                self.status &= !ATA_STATUS_DRQ;
            }
        }
    }

    fn data_in_u16(&mut self) -> u16 {
        if self.data_mode != DataMode::PioIn || self.data_index + 2 > self.data.len() {
            return 0;
        }
        let value =
            u16::from_le_bytes([self.data[self.data_index], self.data[self.data_index + 1]]);
        self.data_index += 2;
        if self.data_index >= self.data.len() {
            self.finish_data_phase();
        }
        value
    }

    fn data_in_u32(&mut self) -> u32 {
        let lo = self.data_in_u16() as u32;
        let hi = self.data_in_u16() as u32;
        lo | hi << 16
    }

    fn data_out_u16(&mut self, value: u16) {
        if self.data_mode != DataMode::PioOut || self.data_index + 2 > self.data.len() {
            return;
        }
        self.data[self.data_index..self.data_index + 2].copy_from_slice(&value.to_le_bytes());
        self.data_index += 2;
        if self.data_index >= self.data.len() {
            self.finish_data_phase();
        }
    }

    /// Applies a transfer-class fault. Returns true when the command has
    /// been consumed by the fault.
    fn apply_transfer_fault(&mut self, fault: SimFault) -> bool {
        match fault {
            SimFault::CommandAbort => {
                self.abort_command(ERROR_ABORT);
                true
            }
            SimFault::DriveFault => {
                self.fault_command();
                true
            }
            SimFault::NotReady => {
                self.complete_non_data_command();
                true
            }
            // BSY was raised when the command byte landed; leave it.
            SimFault::StuckBusy => true,
            SimFault::None | SimFault::IdentifyAbort => false,
        }
    }

    fn exec_command(&mut self, cmd: u8) {
        tracing::trace!(cmd, "ata command issued");
        self.status |= ATA_STATUS_BSY;
        self.status &= !(ATA_STATUS_DRQ | ATA_STATUS_ERR | ATA_STATUS_DF);
        self.error = 0;

        let is_lba48 = matches!(cmd, ATA_CMD_READ_PIO_EXT | ATA_CMD_WRITE_PIO_EXT);
        self.tf.normalize_for_command(is_lba48);

        let idx = self.selected_drive();
        let fault = self.drives[idx].as_ref().map(|d| d.fault).unwrap_or_default();

        match cmd {
            ATA_CMD_IDENTIFY => {
                self.identify_commands += 1;
                match fault {
                    SimFault::IdentifyAbort => {
                        self.abort_command(ERROR_ABORT);
                        return;
                    }
                    SimFault::StuckBusy => return,
                    _ => {}
                }
                let data = match self.drives[idx].as_ref() {
                    Some(drive) => drive.identify_sector().to_vec(),
                    None => {
                        self.abort_command(ERROR_ABORT);
                        return;
                    }
                };
                self.begin_pio_in(TransferKind::Identify, data);
            }
            ATA_CMD_READ_PIO_EXT => {
                self.read_commands += 1;
                if self.apply_transfer_fault(fault) {
                    return;
                }
                let lba = self.tf.lba48();
                let sectors = self.tf.sector_count48() as u64;
                let data = self.drives[idx].as_ref().and_then(|d| d.read_sectors(lba, sectors));
                match data {
                    Some(buf) => self.begin_pio_in(TransferKind::PioRead, buf),
                    None => self.abort_command(ERROR_ABORT),
                }
            }
            ATA_CMD_WRITE_PIO_EXT => {
                self.write_commands += 1;
                if self.apply_transfer_fault(fault) {
                    return;
                }
                let lba = self.tf.lba48();
                let sectors = self.tf.sector_count48() as u64;
                let in_range = self.drives[idx].as_ref().is_some_and(|d| {
                    lba.checked_add(sectors).map_or(false, |end| end <= d.capacity)
                });
                if !in_range {
                    self.abort_command(ERROR_ABORT);
                    return;
                }
                self.pio_write = Some((lba, sectors));
                self.begin_pio_out(TransferKind::PioWrite, sectors as usize * SECTOR_SIZE);
            }
            _ => self.abort_command(ERROR_ABORT),
        }
    }

    fn read_cmd_reg(&mut self, reg: u8, size: u8) -> u32 {
        if self.drives[self.selected_drive()].is_none() {
            // No drive drives the bus: the host reads zeros.
            return 0;
        }
        match reg {
            ATA_REG_DATA => match size {
                2 => self.data_in_u16() as u32,
                4 => self.data_in_u32(),
                _ => 0,
            },
            ATA_REG_ERROR_FEATURES => self.error as u32,
            ATA_REG_SECCOUNT0 | ATA_REG_LBA0 | ATA_REG_LBA1 | ATA_REG_LBA2 | ATA_REG_DEVICE => {
                let hob = self.control & ATA_CTRL_HOB != 0;
                self.tf.read_reg(reg, hob) as u32
            }
            ATA_REG_STATUS_COMMAND => self.status as u32,
            _ => 0,
        }
    }

    fn write_cmd_reg(&mut self, reg: u8, size: u8, value: u32) {
        // Device selection always works; everything else needs a drive.
        if reg != ATA_REG_DEVICE && self.drives[self.selected_drive()].is_none() {
            return;
        }
        match reg {
            ATA_REG_DATA => match size {
                2 => self.data_out_u16(value as u16),
                4 => {
                    self.data_out_u16(value as u16);
                    self.data_out_u16((value >> 16) as u16);
                }
                _ => {}
            },
            ATA_REG_SECCOUNT0 | ATA_REG_LBA0 | ATA_REG_LBA1 | ATA_REG_LBA2 | ATA_REG_DEVICE => {
                self.tf.write_reg(reg, value as u8)
            }
            ATA_REG_STATUS_COMMAND => self.exec_command(value as u8),
            _ => {}
        }
    }

    fn read_ctrl_reg(&mut self, offset: u8) -> u8 {
        if self.drives[self.selected_drive()].is_none() {
            return 0;
        }
        match offset {
            // Alternate status: same value, no side effects.
            0 => self.status,
            1 => self.drive_address(),
            _ => 0,
        }
    }

    fn write_ctrl_reg(&mut self, offset: u8, value: u8) {
        if offset == 0 {
            self.control = value;
        }
    }

    /// Drive address register: inverted drive select bits, legacy encoding.
    fn drive_address(&self) -> u8 {
        !(1u8 << self.selected_drive()) & 0x03
    }
}

enum PortTarget {
    Command(u8),
    Control(u8),
}

struct SimState {
    channels: [SimChannel; 2],
    maps: [SimPortMap; 2],
    events: Vec<IoEvent>,
}

impl SimState {
    fn decode(&self, port: u16) -> Option<(usize, PortTarget)> {
        for (idx, map) in self.maps.iter().enumerate() {
            if (map.cmd_base..map.cmd_base + 8).contains(&port) {
                return Some((idx, PortTarget::Command((port - map.cmd_base) as u8)));
            }
            if port == map.ctrl_base + 2 || port == map.ctrl_base + 3 {
                return Some((idx, PortTarget::Control((port - map.ctrl_base - 2) as u8)));
            }
        }
        None
    }
}

/// The bus itself. Hand it to the driver as its [`PortIo`] collaborator and
/// every register access is decoded, serviced and logged.
pub struct SimBus {
    state: Mutex<SimState>,
}

impl SimBus {
    /// Bus with both channels at their legacy ISA ports.
    pub fn new() -> Self {
        Self::with_ports([PRIMARY_PORTS, SECONDARY_PORTS])
    }

    pub fn with_ports(maps: [SimPortMap; 2]) -> Self {
        Self {
            state: Mutex::new(SimState {
                channels: [SimChannel::new(), SimChannel::new()],
                maps,
                events: Vec::new(),
            }),
        }
    }

    pub fn attach(&self, channel: ChannelId, drive: DriveSelect, disk: SimDrive) {
        let mut state = self.state.lock().unwrap();
        state.channels[channel.index()].drives[drive.index()] = Some(disk);
    }

    pub fn set_fault(&self, channel: ChannelId, drive: DriveSelect, fault: SimFault) {
        let mut state = self.state.lock().unwrap();
        if let Some(disk) = state.channels[channel.index()].drives[drive.index()].as_mut() {
            disk.fault = fault;
        }
    }

    /// Contents of one sector of an attached drive.
    pub fn sector(
        &self,
        channel: ChannelId,
        drive: DriveSelect,
        lba: u64,
    ) -> Option<[u8; SECTOR_SIZE]> {
        let state = self.state.lock().unwrap();
        state.channels[channel.index()].drives[drive.index()]
            .as_ref()
            .map(|disk| disk.sector(lba))
    }

    pub fn events(&self) -> Vec<IoEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.lock().unwrap().events.clear();
    }

    pub fn counters(&self) -> SimCounters {
        let state = self.state.lock().unwrap();
        let mut counters = SimCounters::default();
        for (idx, channel) in state.channels.iter().enumerate() {
            counters.identify_commands[idx] = channel.identify_commands;
            counters.read_commands[idx] = channel.read_commands;
            counters.write_commands[idx] = channel.write_commands;
        }
        counters
    }

    fn io_read(&self, port: u16, size: u8) -> u32 {
        let mut state = self.state.lock().unwrap();
        let value = match state.decode(port) {
            Some((idx, PortTarget::Command(reg))) => state.channels[idx].read_cmd_reg(reg, size),
            Some((idx, PortTarget::Control(offset))) => {
                state.channels[idx].read_ctrl_reg(offset) as u32
            }
            // Open bus floats high.
            None => match size {
                1 => 0xFF,
                2 => 0xFFFF,
                _ => 0xFFFF_FFFF,
            },
        };
        state.events.push(IoEvent {
            port,
            write: false,
            size,
            value,
        });
        value
    }

    fn io_write(&self, port: u16, size: u8, value: u32) {
        let mut state = self.state.lock().unwrap();
        match state.decode(port) {
            Some((idx, PortTarget::Command(reg))) => {
                state.channels[idx].write_cmd_reg(reg, size, value)
            }
            Some((idx, PortTarget::Control(offset))) => {
                state.channels[idx].write_ctrl_reg(offset, value as u8)
            }
            None => {}
        }
        state.events.push(IoEvent {
            port,
            write: true,
            size,
            value,
        });
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PortIo for SimBus {
    fn read_u8(&self, port: u16) -> u8 {
        self.io_read(port, 1) as u8
    }

    fn write_u8(&self, port: u16, value: u8) {
        self.io_write(port, 1, value as u32);
    }

    fn read_u16(&self, port: u16) -> u16 {
        self.io_read(port, 2) as u16
    }

    fn write_u16(&self, port: u16, value: u16) {
        self.io_write(port, 2, value as u32);
    }

    fn read_u32(&self, port: u16) -> u32 {
        self.io_read(port, 4)
    }

    fn write_u32(&self, port: u16, value: u32) {
        self.io_write(port, 4, value);
    }
}
