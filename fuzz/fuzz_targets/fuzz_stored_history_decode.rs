#![no_main]

use libfuzzer_sys::fuzz_target;
use txsync_store::StoredHistory;

// Decoding persisted history must never panic, and whatever decodes must
// survive an encode/decode cycle unchanged.
fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(stored) = StoredHistory::decode(Some(raw)) {
        let encoded = stored.encode().expect("decoded history must encode");
        let again = StoredHistory::decode(Some(&encoded)).expect("encoded history must decode");
        assert_eq!(again, stored);
    }
});
