//! Whole-stack scenario: simulated bus, controller bring-up, registered
//! devices with partition aliases, cached reads and plain writes.

use std::sync::Arc;

use pata_pio::{
    AtaController, BlockDevice, ChannelId, ControllerConfig, DriveSelect, SECTOR_SIZE,
};
use pata_sim::{MemRegistry, NoopDelay, SimBus, SimDrive};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn boot_sector(index: usize, kind: u8, first_lba: u32, sector_count: u32) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    let base = 0x1BE + index * 16;
    sector[base] = 0x80;
    sector[base + 4] = kind;
    sector[base + 8..base + 12].copy_from_slice(&first_lba.to_le_bytes());
    sector[base + 12..base + 16].copy_from_slice(&sector_count.to_le_bytes());
    sector[SECTOR_SIZE - 2] = 0x55;
    sector[SECTOR_SIZE - 1] = 0xAA;
    sector
}

#[test]
fn bus_comes_up_and_serves_block_io() {
    init_tracing();

    let bus = Arc::new(SimBus::new());
    let mut system = SimDrive::new(8192).with_model("SIM SYSTEM DISK");
    system.put_sector(0, boot_sector(1, 0x83, 2048, 1024));
    for lba in 2048..2052 {
        system.fill_sector(lba, 0xEE);
    }
    bus.attach(ChannelId::Primary, DriveSelect::Master, system);
    bus.attach(
        ChannelId::Secondary,
        DriveSelect::Slave,
        SimDrive::new(4096).with_model("SIM SCRATCH DISK"),
    );

    let ctrl = Arc::new(
        AtaController::new(ControllerConfig::default(), bus.clone(), Arc::new(NoopDelay)).unwrap(),
    );
    let mut registry = MemRegistry::new();
    assert!(ctrl.initialize(&mut registry));

    assert_eq!(registry.device_names(), ["ata0", "part0", "ata1"]);
    assert_eq!(registry.alias_names(), ["ata0p1"]);
    assert_eq!(bus.counters().identify_commands, [2, 2]);

    // The root device and the partition view the same bytes at rebased
    // offsets.
    let root = registry.device("ata0").unwrap();
    let part = registry.device("ata0p1").unwrap();
    let mut from_root = [0u8; SECTOR_SIZE];
    root.read_blocks(2048, &mut from_root).unwrap();
    let mut from_part = [0u8; SECTOR_SIZE];
    part.read_blocks(0, &mut from_part).unwrap();
    assert_eq!(from_root, from_part);
    assert_eq!(from_root, [0xEE; SECTOR_SIZE]);

    // Re-reading the same block is served from the drive cache.
    let before = bus.counters().read_commands[0];
    part.read_blocks(0, &mut from_part).unwrap();
    assert_eq!(bus.counters().read_commands[0], before);

    // Writes land on the scratch disk and read back fresh.
    let scratch = registry.device("ata1").unwrap();
    let payload = [0x42u8; SECTOR_SIZE];
    scratch.write_blocks(77, &payload).unwrap();
    assert_eq!(
        bus.sector(ChannelId::Secondary, DriveSelect::Slave, 77),
        Some(payload)
    );
    let mut back = [0u8; SECTOR_SIZE];
    scratch.read_blocks(77, &mut back).unwrap();
    assert_eq!(back, payload);
}
