use std::collections::VecDeque;

use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;

use crate::regs::ChannelPorts;
use crate::{parse_partition_table, BlockCache, IdentifyData, SECTOR_SIZE};

const BLOCK: usize = 16;
const MAX_CAPACITY: usize = 8;
const OFFSET_DOMAIN: u64 = 24;

/// One step of cache traffic: a block read (lookup, insert on miss) or an
/// invalidation.
#[derive(Debug, Clone, Copy)]
enum CacheOp {
    Read(u64),
    Invalidate(u64),
}

fn cache_op() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (0u64..OFFSET_DOMAIN).prop_map(CacheOp::Read),
        1 => (0u64..OFFSET_DOMAIN).prop_map(CacheOp::Invalidate),
    ]
}

/// Replays interleaved reads and invalidations against the cache and a
/// straightforward FIFO queue model, checking contents and eviction order
/// after every step. Invalidation removes the entry from both sides without
/// disturbing the order of the survivors, so any divergence shows up at the
/// next eviction.
fn check_against_fifo_model(capacity: usize, ops: Vec<CacheOp>) -> TestCaseResult {
    let mut cache = BlockCache::with_capacity(BLOCK, capacity).unwrap();
    let mut model: VecDeque<u64> = VecDeque::new();

    for op in ops {
        match op {
            CacheOp::Read(offset) => {
                let expect_hit = model.contains(&offset);
                let hit = cache.lookup(offset).map(<[u8]>::to_vec);
                match hit {
                    Some(image) => {
                        prop_assert!(expect_hit, "unexpected hit for {offset}");
                        let expected = vec![offset as u8; BLOCK];
                        prop_assert_eq!(image.as_slice(), expected.as_slice());
                    }
                    None => {
                        prop_assert!(!expect_hit, "unexpected miss for {offset}");
                        let slot = cache.insert(offset).unwrap();
                        slot.fill(offset as u8);
                        if model.len() == capacity {
                            model.pop_front();
                        }
                        model.push_back(offset);
                    }
                }
            }
            CacheOp::Invalidate(offset) => {
                let dropped = cache.invalidate(offset);
                prop_assert_eq!(
                    dropped,
                    model.contains(&offset),
                    "invalidate({}) disagreed with the model",
                    offset
                );
                model.retain(|live| *live != offset);
            }
        }
        prop_assert!(cache.len() <= capacity);
        prop_assert_eq!(cache.len(), model.len());
        for live in &model {
            prop_assert!(
                cache.lookup(*live).is_some(),
                "model entry {live} missing from cache"
            );
        }
    }
    Ok(())
}

fn encode_ata_string(raw: &mut [u8], offset: usize, byte_len: usize, text: &str) {
    let mut padded = vec![b' '; byte_len];
    let src = text.as_bytes();
    let copy = src.len().min(byte_len);
    padded[..copy].copy_from_slice(&src[..copy]);
    for (pair, out) in padded
        .chunks_exact(2)
        .zip(raw[offset..offset + byte_len].chunks_exact_mut(2))
    {
        out[0] = pair[1];
        out[1] = pair[0];
    }
}

proptest! {
    #[test]
    fn cache_tracks_fifo_model(
        capacity in 1usize..=MAX_CAPACITY,
        ops in prop::collection::vec(cache_op(), 1..200),
    ) {
        check_against_fifo_model(capacity, ops)?;
    }

    #[test]
    fn partition_table_decodes_what_was_encoded(
        entries in prop::collection::vec((any::<u8>(), any::<u8>(), any::<u32>(), any::<u32>()), 4),
    ) {
        let mut sector = [0u8; SECTOR_SIZE];
        for (idx, (status, kind, first_lba, count)) in entries.iter().enumerate() {
            let base = 0x1BE + idx * 16;
            sector[base] = *status;
            sector[base + 4] = *kind;
            sector[base + 8..base + 12].copy_from_slice(&first_lba.to_le_bytes());
            sector[base + 12..base + 16].copy_from_slice(&count.to_le_bytes());
        }

        let table = parse_partition_table(&sector);
        for (entry, (status, kind, first_lba, count)) in table.iter().zip(entries.iter()) {
            prop_assert_eq!(entry.status, *status);
            prop_assert_eq!(entry.kind, *kind);
            prop_assert_eq!(entry.first_lba, *first_lba);
            prop_assert_eq!(entry.sector_count, *count);
            prop_assert_eq!(entry.is_active(), *kind != 0);
        }
    }

    #[test]
    fn identify_model_string_round_trips(model in "[ -~]{0,20}") {
        let mut raw = [0u8; SECTOR_SIZE];
        encode_ata_string(&mut raw, 54, 40, &model);
        let decoded = IdentifyData::parse(&raw);
        prop_assert_eq!(decoded.model.as_str(), model.trim_end_matches(' '));
    }

    // BAR domains mirror the construction checks: command blocks reach
    // base + 7, control blocks base + 3, the shared bus-master block
    // base + 15, all inside the 16-bit port space.
    #[test]
    fn extended_registers_alias_low_ports_for_any_bars(
        primary_cmd in 0u32..=0xFFFB,
        primary_ctrl in 0u32..=0xFFFF,
        secondary_cmd in 0u32..=0xFFFB,
        secondary_ctrl in 0u32..=0xFFFF,
        bus_master in 0u32..=0xFFF3,
    ) {
        let bars = [primary_cmd, primary_ctrl, secondary_cmd, secondary_ctrl, bus_master];
        for ports in [
            ChannelPorts::primary(&bars).unwrap(),
            ChannelPorts::secondary(&bars).unwrap(),
        ] {
            for (ext, low) in [(0x08u8, 0x02u8), (0x09, 0x03), (0x0A, 0x04), (0x0B, 0x05)] {
                prop_assert_eq!(ports.port_for(ext), ports.port_for(low));
            }
        }
    }

    #[test]
    fn out_of_range_bars_are_rejected(
        cmd_bar in 0xFFFCu32..=0xFFFF,
        bus_bar in 0xFFF4u32..=0xFFFF,
        high_bar in 0x0001_0000u32..,
    ) {
        prop_assert!(ChannelPorts::primary(&[cmd_bar, 0, 0, 0, 0]).is_err());
        prop_assert!(ChannelPorts::secondary(&[0, 0, cmd_bar, 0, 0]).is_err());
        prop_assert!(ChannelPorts::primary(&[0, 0, 0, 0, bus_bar]).is_err());
        prop_assert!(ChannelPorts::secondary(&[0, 0, 0, 0, bus_bar]).is_err());
        prop_assert!(ChannelPorts::primary(&[0, high_bar, 0, 0, 0]).is_err());
    }
}
