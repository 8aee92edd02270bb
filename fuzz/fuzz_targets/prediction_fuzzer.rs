#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use troth_core::predict;
use troth_proto::{BondOutcome, IoCapability};

#[derive(Debug, Arbitrary)]
struct Pair {
    initiator: u8,
    responder: u8,
}

fn io_capability(raw: u8) -> IoCapability {
    match raw % 4 {
        0 => IoCapability::DisplayOnly,
        1 => IoCapability::DisplayYesNo,
        2 => IoCapability::KeyboardOnly,
        _ => IoCapability::NoInputNoOutput,
    }
}

fuzz_target!(|pair: Pair| {
    let initiator = io_capability(pair.initiator);
    let responder = io_capability(pair.responder);

    // Total, deterministic, and fixed bond outcomes over the whole domain.
    let first = predict(initiator, responder);
    let second = predict(initiator, responder);
    assert_eq!(first, second);
    assert_eq!(first.initiator_bond, BondOutcome::Bonded);
    assert_eq!(first.responder_bond, BondOutcome::None);
});
