#![no_main]

use libfuzzer_sys::fuzz_target;
use troth_proto::{SecurityCommand, SecurityEvent};

fuzz_target!(|data: &[u8]| {
    // Decoding attacker-controlled CBOR must never panic, and anything
    // that decodes must survive a re-encode/decode cycle unchanged.
    if let Ok(cmd) = SecurityCommand::decode(data) {
        let bytes = cmd.encode().unwrap();
        assert_eq!(SecurityCommand::decode(&bytes).unwrap(), cmd);
    }

    if let Ok(event) = SecurityEvent::decode(data) {
        let bytes = event.encode().unwrap();
        assert_eq!(SecurityEvent::decode(&bytes).unwrap(), event);
    }
});
