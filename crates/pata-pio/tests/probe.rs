//! Controller bring-up against the simulated bus: slot probing, registration
//! order and failure handling.

use std::sync::Arc;
use std::time::Duration;

use pata_pio::{
    AtaController, AtaError, BlockDevice, ChannelId, ControllerConfig, DriveSelect,
};
use pata_sim::{MemRegistry, NoopDelay, RecordingDelay, SimBus, SimDrive, SimFault};

fn controller(bus: &Arc<SimBus>, config: ControllerConfig) -> Arc<AtaController> {
    Arc::new(AtaController::new(config, bus.clone(), Arc::new(NoopDelay)).unwrap())
}

#[test]
fn empty_bus_reports_success_and_registers_nothing() {
    let bus = Arc::new(SimBus::new());
    let ctrl = controller(&bus, ControllerConfig::default());
    let mut registry = MemRegistry::new();

    assert!(ctrl.initialize(&mut registry));
    assert!(registry.is_empty());
    assert_eq!(bus.counters().identify_commands, [0, 0]);
}

#[test]
fn drives_register_in_slot_order() {
    let bus = Arc::new(SimBus::new());
    bus.attach(ChannelId::Primary, DriveSelect::Master, SimDrive::new(1000));
    bus.attach(ChannelId::Primary, DriveSelect::Slave, SimDrive::new(2000));
    bus.attach(ChannelId::Secondary, DriveSelect::Master, SimDrive::new(3000));
    bus.attach(ChannelId::Secondary, DriveSelect::Slave, SimDrive::new(4000));

    let ctrl = controller(&bus, ControllerConfig::default());
    let mut registry = MemRegistry::new();
    assert!(ctrl.initialize(&mut registry));

    assert_eq!(registry.device_names(), ["ata0", "ata1", "ata2", "ata3"]);
    for (name, blocks) in [("ata0", 1000u64), ("ata1", 2000), ("ata2", 3000), ("ata3", 4000)] {
        let device = registry.device(name).unwrap();
        assert_eq!(device.block_count(), blocks, "{name}");
        assert_eq!(device.device_class(), "ata");
    }
    assert_eq!(bus.counters().identify_commands, [2, 2]);
}

#[test]
fn identify_failure_fails_init_but_keeps_probing() {
    let bus = Arc::new(SimBus::new());
    bus.attach(ChannelId::Primary, DriveSelect::Master, SimDrive::new(1000));
    bus.attach(
        ChannelId::Primary,
        DriveSelect::Slave,
        SimDrive::new(2000).with_fault(SimFault::IdentifyAbort),
    );
    bus.attach(ChannelId::Secondary, DriveSelect::Master, SimDrive::new(3000));

    let ctrl = controller(&bus, ControllerConfig::default());
    let mut registry = MemRegistry::new();

    // One bad slot fails the whole bring-up, but the healthy drives after it
    // still come up.
    assert!(!ctrl.initialize(&mut registry));
    assert_eq!(registry.device_names(), ["ata0", "ata1"]);
    assert_eq!(registry.device("ata0").unwrap().block_count(), 1000);
    assert_eq!(registry.device("ata1").unwrap().block_count(), 3000);
}

#[test]
fn registration_failure_fails_init_and_keeps_probing() {
    let bus = Arc::new(SimBus::new());
    bus.attach(ChannelId::Primary, DriveSelect::Master, SimDrive::new(1000));
    bus.attach(ChannelId::Primary, DriveSelect::Slave, SimDrive::new(2000));
    bus.attach(ChannelId::Secondary, DriveSelect::Master, SimDrive::new(3000));
    bus.attach(ChannelId::Secondary, DriveSelect::Slave, SimDrive::new(4000));

    let ctrl = controller(&bus, ControllerConfig::default());
    let mut registry = MemRegistry::failing_after(1);

    assert!(!ctrl.initialize(&mut registry));
    assert_eq!(registry.device_names(), ["ata0"]);
    // Every slot was still probed.
    assert_eq!(bus.counters().identify_commands, [2, 2]);
}

#[test]
fn drive_without_lba_is_unsupported() {
    let bus = Arc::new(SimBus::new());
    bus.attach(
        ChannelId::Primary,
        DriveSelect::Master,
        SimDrive::new(1000).without_lba(),
    );

    let ctrl = controller(&bus, ControllerConfig::default());
    let err = ctrl
        .probe_slot(ChannelId::Primary, DriveSelect::Master)
        .unwrap_err();
    assert!(matches!(err, AtaError::UnsupportedDrive), "{err:?}");

    let mut registry = MemRegistry::new();
    assert!(!ctrl.initialize(&mut registry));
    assert!(registry.is_empty());
}

#[test]
fn probing_issues_the_settle_delays() {
    let bus = Arc::new(SimBus::new());
    bus.attach(ChannelId::Primary, DriveSelect::Master, SimDrive::new(64));
    bus.attach(ChannelId::Secondary, DriveSelect::Slave, SimDrive::new(64));

    let delay = Arc::new(RecordingDelay::new());
    let ctrl = Arc::new(
        AtaController::new(ControllerConfig::default(), bus.clone(), delay.clone()).unwrap(),
    );
    let mut registry = MemRegistry::new();
    assert!(ctrl.initialize(&mut registry));

    // Two settle delays per probed slot; the partition scan of each found
    // drive adds one poll delay.
    let ms = Duration::from_millis(1);
    let poll = Duration::from_nanos(400);
    assert_eq!(
        delay.recorded(),
        vec![ms, ms, poll, ms, ms, ms, ms, ms, ms, poll]
    );
}

#[test]
fn identity_fields_travel_end_to_end() {
    let bus = Arc::new(SimBus::new());
    bus.attach(
        ChannelId::Primary,
        DriveSelect::Master,
        SimDrive::new(0x1_0003_0000)
            .with_model("SIMDISK 2500 EXTREME")
            .with_serial("S3R14L-0042"),
    );

    let ctrl = controller(&bus, ControllerConfig::default());
    let dev = ctrl
        .probe_slot(ChannelId::Primary, DriveSelect::Master)
        .unwrap()
        .unwrap();

    assert_eq!(dev.model(), "SIMDISK 2500 EXTREME");
    assert_eq!(dev.serial(), "S3R14L-0042");
    assert_eq!(dev.block_count(), 0x1_0003_0000);
    assert!(dev.identity().supports_lba());
    assert!(dev.identity().uses_lba48());
}

#[test]
fn legacy_drive_size_comes_from_the_28_bit_field() {
    let bus = Arc::new(SimBus::new());
    bus.attach(
        ChannelId::Secondary,
        DriveSelect::Master,
        SimDrive::new(0x2000).without_lba48(),
    );

    let ctrl = controller(&bus, ControllerConfig::default());
    let dev = ctrl
        .probe_slot(ChannelId::Secondary, DriveSelect::Master)
        .unwrap()
        .unwrap();

    assert!(!dev.identity().uses_lba48());
    assert_eq!(dev.block_count(), 0x2000);
}
