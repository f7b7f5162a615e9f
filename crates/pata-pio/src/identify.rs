//! Decoding of the 512-byte identify data block.
//!
//! The layout is a fixed table of little-endian 16-bit words; strings are
//! stored with the two characters of each word swapped and padded with spaces.
//! Fields are pulled out of the raw buffer by explicit byte-offset reads
//! rather than an overlaid struct.

use crate::SECTOR_SIZE;

// Byte offsets of the fields this driver consumes.
pub(crate) const ATA_IDENT_DEVICETYPE: usize = 0;
pub(crate) const ATA_IDENT_SERIAL: usize = 20;
pub(crate) const ATA_IDENT_MODEL: usize = 54;
pub(crate) const ATA_IDENT_CAPABILITIES: usize = 98;
pub(crate) const ATA_IDENT_MAX_LBA: usize = 120;
pub(crate) const ATA_IDENT_COMMANDSETS: usize = 164;
pub(crate) const ATA_IDENT_MAX_LBA_EXT: usize = 200;

/// LBA addressing support, bit 9 of the capabilities word.
const CAP_LBA: u16 = 1 << 9;
/// 48-bit address feature set, bit 26 of the command-set doubleword.
const CMDSET_LBA48: u32 = 1 << 26;

/// Capability and size metadata decoded from an identify response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyData {
    pub signature: u16,
    pub capabilities: u16,
    pub command_sets: u32,
    /// Total addressable sectors per the legacy 28-bit field.
    pub sectors_28: u32,
    /// Total addressable sectors per the 48-bit field; meaningful only when
    /// [`IdentifyData::uses_lba48`] is true.
    pub sectors_48: u64,
    pub model: String,
    pub serial: String,
}

impl IdentifyData {
    pub fn parse(raw: &[u8; SECTOR_SIZE]) -> Self {
        Self {
            signature: word(raw, ATA_IDENT_DEVICETYPE),
            capabilities: word(raw, ATA_IDENT_CAPABILITIES),
            command_sets: dword(raw, ATA_IDENT_COMMANDSETS),
            sectors_28: dword(raw, ATA_IDENT_MAX_LBA),
            // Words 100..=103; the top 16 bits are reserved.
            sectors_48: qword(raw, ATA_IDENT_MAX_LBA_EXT) & 0xFFFF_FFFF_FFFF,
            model: ata_string(raw, ATA_IDENT_MODEL, 40),
            serial: ata_string(raw, ATA_IDENT_SERIAL, 20),
        }
    }

    pub fn supports_lba(&self) -> bool {
        (self.capabilities & CAP_LBA) != 0
    }

    pub fn uses_lba48(&self) -> bool {
        (self.command_sets & CMDSET_LBA48) != 0
    }

    /// Addressable sector count, picking the 48-bit field when the drive
    /// advertises the extended address feature set.
    pub fn block_count(&self) -> u64 {
        if self.uses_lba48() {
            self.sectors_48
        } else {
            self.sectors_28 as u64
        }
    }
}

fn word(raw: &[u8; SECTOR_SIZE], offset: usize) -> u16 {
    u16::from_le_bytes([raw[offset], raw[offset + 1]])
}

fn dword(raw: &[u8; SECTOR_SIZE], offset: usize) -> u32 {
    u32::from_le_bytes([
        raw[offset],
        raw[offset + 1],
        raw[offset + 2],
        raw[offset + 3],
    ])
}

fn qword(raw: &[u8; SECTOR_SIZE], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&raw[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

/// Unswaps an ATA string field and trims the trailing space padding.
fn ata_string(raw: &[u8; SECTOR_SIZE], offset: usize, byte_len: usize) -> String {
    let mut bytes = Vec::with_capacity(byte_len);
    for pair in raw[offset..offset + byte_len].chunks_exact(2) {
        bytes.push(pair[1]);
        bytes.push(pair[0]);
    }
    while bytes.last() == Some(&b' ') {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_word(raw: &mut [u8; SECTOR_SIZE], offset: usize, value: u16) {
        raw[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn put_string(raw: &mut [u8; SECTOR_SIZE], offset: usize, byte_len: usize, text: &str) {
        let mut padded = vec![b' '; byte_len];
        let src = text.as_bytes();
        padded[..src.len()].copy_from_slice(src);
        for (pair, out) in padded.chunks_exact(2).zip(raw[offset..].chunks_exact_mut(2)) {
            out[0] = pair[1];
            out[1] = pair[0];
        }
    }

    fn base_identify() -> [u8; SECTOR_SIZE] {
        let mut raw = [0u8; SECTOR_SIZE];
        put_word(&mut raw, ATA_IDENT_DEVICETYPE, 0x0040);
        put_word(&mut raw, ATA_IDENT_CAPABILITIES, CAP_LBA);
        put_string(&mut raw, ATA_IDENT_MODEL, 40, "SIMULATED DISK 9000");
        put_string(&mut raw, ATA_IDENT_SERIAL, 20, "SN-0042");
        raw
    }

    #[test]
    fn strings_are_unswapped_and_trimmed() {
        let id = IdentifyData::parse(&base_identify());
        assert_eq!(id.model, "SIMULATED DISK 9000");
        assert_eq!(id.serial, "SN-0042");
    }

    #[test]
    fn legacy_field_selected_without_lba48_bit() {
        let mut raw = base_identify();
        raw[ATA_IDENT_MAX_LBA..ATA_IDENT_MAX_LBA + 4]
            .copy_from_slice(&0x002F_0000u32.to_le_bytes());
        raw[ATA_IDENT_MAX_LBA_EXT..ATA_IDENT_MAX_LBA_EXT + 8]
            .copy_from_slice(&0xDEAD_BEEFu64.to_le_bytes());
        let id = IdentifyData::parse(&raw);
        assert!(!id.uses_lba48());
        assert_eq!(id.block_count(), 0x002F_0000);
    }

    #[test]
    fn extended_field_selected_with_lba48_bit() {
        let mut raw = base_identify();
        raw[ATA_IDENT_COMMANDSETS..ATA_IDENT_COMMANDSETS + 4]
            .copy_from_slice(&(1u32 << 26).to_le_bytes());
        raw[ATA_IDENT_MAX_LBA_EXT..ATA_IDENT_MAX_LBA_EXT + 8]
            .copy_from_slice(&0x0001_2345_6789u64.to_le_bytes());
        let id = IdentifyData::parse(&raw);
        assert!(id.uses_lba48());
        assert_eq!(id.block_count(), 0x0001_2345_6789);
    }

    #[test]
    fn extended_field_masks_reserved_high_word() {
        let mut raw = base_identify();
        raw[ATA_IDENT_COMMANDSETS..ATA_IDENT_COMMANDSETS + 4]
            .copy_from_slice(&(1u32 << 26).to_le_bytes());
        raw[ATA_IDENT_MAX_LBA_EXT..ATA_IDENT_MAX_LBA_EXT + 8]
            .copy_from_slice(&0xFFFF_0000_0000_1000u64.to_le_bytes());
        let id = IdentifyData::parse(&raw);
        assert_eq!(id.sectors_48, 0x1000);
    }

    #[test]
    fn lba_capability_bit_reported() {
        let mut raw = base_identify();
        assert!(IdentifyData::parse(&raw).supports_lba());
        put_word(&mut raw, ATA_IDENT_CAPABILITIES, 0);
        assert!(!IdentifyData::parse(&raw).supports_lba());
    }
}
