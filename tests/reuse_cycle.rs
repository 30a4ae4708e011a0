//! Reuse-cycle tests: byte-identical re-encoding, key-slot skipping, and
//! per-call state reset without reallocation.

mod common;

use common::MemoryEngine;
use oxidesc::UpdateDescriptor;

fn configured(payloads: &[&[u8]]) -> UpdateDescriptor {
    let mut desc = UpdateDescriptor::new(4, payloads.len() as u16, 64).unwrap();
    desc.set_top_key("dk01").unwrap();
    for (i, payload) in payloads.iter().enumerate() {
        desc.entry_buffer(i).unwrap().put_slice(payload);
        desc.set_entry(i, Some(&format!("ak{i:02}")), 0).unwrap();
    }
    desc
}

#[test]
fn reuse_encode_is_byte_identical_for_unchanged_keys() {
    let mut desc = configured(&[b"alpha", b"beta!"]);
    desc.encode().unwrap();
    let first = desc.as_raw().desc_buffer().unwrap().as_slice().to_vec();

    desc.reuse().unwrap();
    for (i, payload) in [b"alpha", b"beta!"].iter().enumerate() {
        desc.entry_buffer(i).unwrap().put_slice(*payload);
        desc.set_entry(i, None, 0).unwrap();
    }
    desc.encode().unwrap();

    let second = desc.as_raw().desc_buffer().unwrap().as_slice().to_vec();
    assert_eq!(first, second);
}

#[test]
fn unchanged_key_slots_are_skipped_not_rewritten() {
    let mut desc = configured(&[b"alpha"]);
    desc.encode().unwrap();

    // Poison one byte inside entry 0's key slot, then reuse-encode with the
    // key unchanged: the poison must survive, proving the slot was skipped.
    let key_slot_byte = 22 + 2 + 1;
    desc.as_raw_mut().desc_buffer_mut().unwrap().as_mut_slice()[key_slot_byte] ^= 0xFF;

    desc.reuse().unwrap();
    desc.entry_buffer(0).unwrap().put_slice(b"alpha");
    desc.set_entry(0, None, 0).unwrap();
    desc.encode().unwrap();
    let poisoned = desc.as_raw().desc_buffer().unwrap().as_slice()[key_slot_byte];
    assert_eq!(poisoned & 0x80, 0x80, "skipped slot must keep the poison");

    // A changed key rewrites the slot and clears the poison.
    desc.reuse().unwrap();
    desc.entry_buffer(0).unwrap().put_slice(b"alpha");
    desc.set_entry(0, Some("ak00"), 0).unwrap();
    desc.encode().unwrap();
    let repaired = desc.as_raw().desc_buffer().unwrap().as_slice()[key_slot_byte];
    assert_eq!(repaired & 0x80, 0);
}

#[test]
fn changed_top_key_is_rewritten_on_reuse() {
    let mut engine = MemoryEngine::new();
    let mut desc = configured(&[b"alpha"]);
    desc.encode().unwrap();
    desc.execute(&mut engine).unwrap();

    desc.reuse().unwrap();
    desc.set_top_key("dk02").unwrap();
    desc.entry_buffer(0).unwrap().put_slice(b"alpha");
    desc.set_entry(0, None, 0).unwrap();
    desc.encode().unwrap();
    desc.execute(&mut engine).unwrap();

    assert_eq!(engine.get("dk01", "ak00"), Some(b"alpha".as_slice()));
    assert_eq!(engine.get("dk02", "ak00"), Some(b"alpha".as_slice()));
}

#[test]
fn reuse_clears_per_call_state_only() {
    let mut desc = configured(&[b"alpha", b"beta!"]);
    desc.encode().unwrap();
    let capacity = desc.as_raw().desc_buffer().unwrap().capacity();

    desc.reuse().unwrap();
    let raw = desc.as_raw();
    assert_eq!(raw.active_entry_count(), 0);
    assert_eq!(raw.total_request_size(), 0);
    assert!(!raw.is_succeeded());
    assert!(raw.entries().iter().all(|e| !e.is_active()));
    // Keys and buffers survive the reset.
    assert_eq!(raw.top_key(), Some("dk01"));
    assert_eq!(raw.entry(0).unwrap().key(), Some("ak00"));
    assert_eq!(raw.desc_buffer().unwrap().capacity(), capacity);
}

#[test]
fn active_count_shrinks_on_lighter_cycles() {
    let mut desc = configured(&[b"alpha", b"beta!"]);
    desc.encode().unwrap();
    let bytes = desc.as_raw().desc_buffer().unwrap().as_slice();
    assert_eq!(u16::from_ne_bytes([bytes[20], bytes[21]]), 2);

    desc.reuse().unwrap();
    desc.entry_buffer(0).unwrap().put_slice(b"only");
    desc.set_entry(0, None, 8).unwrap();
    desc.encode().unwrap();

    let raw = desc.as_raw();
    let bytes = raw.desc_buffer().unwrap().as_slice();
    assert_eq!(u16::from_ne_bytes([bytes[20], bytes[21]]), 1);
    assert_eq!(raw.total_request_size(), 4);
    // Entry 0's size field now reads 4, offset 8.
    assert_eq!(u32::from_ne_bytes(bytes[32..36].try_into().unwrap()), 8);
    assert_eq!(u32::from_ne_bytes(bytes[36..40].try_into().unwrap()), 4);
}

#[test]
fn encode_after_parse_requires_reuse() {
    let mut engine = MemoryEngine::new();
    engine.seed("dk01", "ak00", b"x");
    let mut desc = oxidesc::FetchDescriptor::new(4, 1, 64).unwrap();
    desc.set_top_key("dk01").unwrap();
    desc.set_entry(0, Some("ak00"), 0, 8).unwrap();
    desc.encode().unwrap();
    desc.execute(&mut engine).unwrap();
    desc.parse_result().unwrap();

    assert!(desc.encode().unwrap_err().is_invalid_state());
    desc.reuse().unwrap();
    desc.set_entry(0, None, 0, 8).unwrap();
    desc.encode().unwrap();
}
