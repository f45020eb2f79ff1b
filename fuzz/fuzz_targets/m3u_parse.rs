#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Some(entries) = aria::playlist::parse_m3u(&text) {
        // A successful parse never yields blank paths or stray whitespace.
        for entry in entries {
            assert!(!entry.path.is_empty());
            assert_eq!(entry.path, entry.path.trim());
        }
    }
});
