#![no_main]

use libfuzzer_sys::fuzz_target;
use txsync_types::{BatchRange, RangePurpose};

// Range constructors must clamp instead of overflowing, for any input.
fuzz_target!(|data: &[u8]| {
    if data.len() < 17 {
        return;
    }
    let mut block = [0u8; 8];
    block.copy_from_slice(&data[0..8]);
    let block = i64::from_le_bytes(block);
    let mut size = [0u8; 8];
    size.copy_from_slice(&data[8..16]);
    let size = u64::from_le_bytes(size);
    let purpose = if data[16] & 1 == 0 {
        RangePurpose::Scan
    } else {
        RangePurpose::Watch
    };

    for range in [
        BatchRange::of_size(block, size, purpose),
        BatchRange::of_size_from_max(block, size, purpose),
    ] {
        assert!(range.min() >= 0);
        assert!(range.min() <= range.max());
        assert!(range.contains(range.min()) && range.contains(range.max()));
        assert_eq!(range.purpose(), purpose);
    }
});
