#![no_main]

use libfuzzer_sys::fuzz_target;
use troth_proto::DeviceAddress;

fuzz_target!(|data: &[u8]| {
    // Byte-slice parsing must never panic, whatever the length.
    let _ = DeviceAddress::from_bytes(data);

    // Neither must string parsing, and a successful parse must round-trip
    // through display.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(addr) = s.parse::<DeviceAddress>() {
            let reparsed: DeviceAddress = addr.to_string().parse().unwrap();
            assert_eq!(reparsed, addr);
        }
    }
});
