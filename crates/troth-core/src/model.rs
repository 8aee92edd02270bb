//! Association-model decision table.
//!
//! Given both sides' declared IO capabilities, [`predict`] answers two
//! questions before a single packet moves: which user prompt (if any) each
//! side must raise, and how bonding must end. This table is the oracle the
//! whole harness verifies devices against, so it is written as a plain
//! exhaustive lookup rather than derived logic.
//!
//! The shape follows SSP numeric comparison: a side that can neither show
//! nor confirm anything is never prompted, a `DisplayYesNo` side shows the
//! comparison value whenever its peer can also confirm one, and
//! `DisplayOnly` can show but never confirm. `KeyboardOnly` rows predict
//! the passkey prompts the reference declares; the matrix driver does not
//! iterate them until passkey entry is implemented stack-side.

use troth_proto::{BondOutcome, IoCapability, UiPromptKind};

/// Predicted observable outcome of one pairing attempt.
///
/// Pure function of the two IO capabilities; authentication requirement and
/// OOB presence are configured on the peers but do not alter the prediction.
/// Consumed exactly once per scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    /// Prompt the initiator must raise (`None` = must not prompt).
    pub initiator_prompt: UiPromptKind,
    /// Prompt the responder must raise (`None` = must not prompt).
    pub responder_prompt: UiPromptKind,
    /// Bond result the initiator must report.
    pub initiator_bond: BondOutcome,
    /// Bond result required of the responder. The harness observes bonding
    /// from the initiating side only, so this is `None` by design, not a
    /// protocol guarantee.
    pub responder_bond: BondOutcome,
}

/// Predict the prompts and bond outcome for an (initiator, responder)
/// capability pair.
///
/// Total over the full enum domain and free of side effects: unimplemented
/// capabilities still map to a prediction, they are merely excluded from the
/// iterated matrix.
#[must_use]
pub fn predict(initiator: IoCapability, responder: IoCapability) -> Expectation {
    use IoCapability::{DisplayOnly, DisplayYesNo, KeyboardOnly, NoInputNoOutput};
    use UiPromptKind::{None, PasskeyDisplay, PasskeyEntry, YesNo, YesNoWithValue};

    let (initiator_prompt, responder_prompt) = match (initiator, responder) {
        (DisplayOnly, DisplayYesNo) => (None, YesNoWithValue),
        (DisplayOnly, KeyboardOnly) => (None, PasskeyEntry),
        (DisplayOnly, DisplayOnly | NoInputNoOutput) => (None, None),

        (DisplayYesNo, DisplayOnly) => (YesNoWithValue, None),
        (DisplayYesNo, DisplayYesNo) => (YesNoWithValue, YesNoWithValue),
        (DisplayYesNo, KeyboardOnly) => (PasskeyDisplay, PasskeyEntry),
        (DisplayYesNo, NoInputNoOutput) => (YesNo, None),

        (KeyboardOnly, DisplayOnly) => (PasskeyEntry, PasskeyDisplay),
        (KeyboardOnly, DisplayYesNo | KeyboardOnly) => (PasskeyEntry, PasskeyEntry),
        (KeyboardOnly, NoInputNoOutput) => (PasskeyEntry, None),

        (NoInputNoOutput, DisplayYesNo) => (None, YesNo),
        (NoInputNoOutput, DisplayOnly | KeyboardOnly | NoInputNoOutput) => (None, None),
    };

    Expectation {
        initiator_prompt,
        responder_prompt,
        initiator_bond: BondOutcome::Bonded,
        responder_bond: BondOutcome::None,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const ALL: [IoCapability; 4] = [
        IoCapability::DisplayOnly,
        IoCapability::DisplayYesNo,
        IoCapability::KeyboardOnly,
        IoCapability::NoInputNoOutput,
    ];

    fn io_capability() -> impl Strategy<Value = IoCapability> {
        proptest::sample::select(ALL.to_vec())
    }

    #[test]
    fn display_only_initiator_never_prompts() {
        for responder in ALL {
            let expectation = predict(IoCapability::DisplayOnly, responder);
            assert_eq!(expectation.initiator_prompt, UiPromptKind::None);
        }
    }

    #[test]
    fn display_only_vs_display_yes_no() {
        let expectation = predict(IoCapability::DisplayOnly, IoCapability::DisplayYesNo);
        assert_eq!(expectation.initiator_prompt, UiPromptKind::None);
        assert_eq!(expectation.responder_prompt, UiPromptKind::YesNoWithValue);
    }

    #[test]
    fn display_yes_no_vs_display_only() {
        let expectation = predict(IoCapability::DisplayYesNo, IoCapability::DisplayOnly);
        assert_eq!(expectation.initiator_prompt, UiPromptKind::YesNoWithValue);
        assert_eq!(expectation.responder_prompt, UiPromptKind::None);
    }

    #[test]
    fn display_yes_no_both_sides_compare_numerically() {
        let expectation = predict(IoCapability::DisplayYesNo, IoCapability::DisplayYesNo);
        assert_eq!(expectation.initiator_prompt, UiPromptKind::YesNoWithValue);
        assert_eq!(expectation.responder_prompt, UiPromptKind::YesNoWithValue);
    }

    #[test]
    fn display_yes_no_vs_no_io_confirms_without_value() {
        let expectation = predict(IoCapability::DisplayYesNo, IoCapability::NoInputNoOutput);
        assert_eq!(expectation.initiator_prompt, UiPromptKind::YesNo);
        assert_eq!(expectation.responder_prompt, UiPromptKind::None);
    }

    #[test]
    fn no_io_vs_display_yes_no_prompts_responder_without_value() {
        let expectation = predict(IoCapability::NoInputNoOutput, IoCapability::DisplayYesNo);
        assert_eq!(expectation.initiator_prompt, UiPromptKind::None);
        assert_eq!(expectation.responder_prompt, UiPromptKind::YesNo);
    }

    #[test]
    fn just_works_never_prompts() {
        let expectation = predict(IoCapability::NoInputNoOutput, IoCapability::NoInputNoOutput);
        assert_eq!(expectation.initiator_prompt, UiPromptKind::None);
        assert_eq!(expectation.responder_prompt, UiPromptKind::None);
        assert_eq!(expectation.initiator_bond, BondOutcome::Bonded);
    }

    #[test]
    fn keyboard_rows_predict_passkey_prompts() {
        let expectation = predict(IoCapability::DisplayYesNo, IoCapability::KeyboardOnly);
        assert_eq!(expectation.initiator_prompt, UiPromptKind::PasskeyDisplay);
        assert_eq!(expectation.responder_prompt, UiPromptKind::PasskeyEntry);

        let expectation = predict(IoCapability::KeyboardOnly, IoCapability::DisplayOnly);
        assert_eq!(expectation.initiator_prompt, UiPromptKind::PasskeyEntry);
        assert_eq!(expectation.responder_prompt, UiPromptKind::PasskeyDisplay);
    }

    #[test]
    fn prediction_table_snapshot() {
        let mut table = String::new();
        for initiator in ALL {
            for responder in ALL {
                let e = predict(initiator, responder);
                table.push_str(&format!(
                    "{initiator:?} + {responder:?} -> init {:?}, resp {:?}\n",
                    e.initiator_prompt, e.responder_prompt
                ));
            }
        }
        insta::assert_snapshot!(table, @r"
        DisplayOnly + DisplayOnly -> init None, resp None
        DisplayOnly + DisplayYesNo -> init None, resp YesNoWithValue
        DisplayOnly + KeyboardOnly -> init None, resp PasskeyEntry
        DisplayOnly + NoInputNoOutput -> init None, resp None
        DisplayYesNo + DisplayOnly -> init YesNoWithValue, resp None
        DisplayYesNo + DisplayYesNo -> init YesNoWithValue, resp YesNoWithValue
        DisplayYesNo + KeyboardOnly -> init PasskeyDisplay, resp PasskeyEntry
        DisplayYesNo + NoInputNoOutput -> init YesNo, resp None
        KeyboardOnly + DisplayOnly -> init PasskeyEntry, resp PasskeyDisplay
        KeyboardOnly + DisplayYesNo -> init PasskeyEntry, resp PasskeyEntry
        KeyboardOnly + KeyboardOnly -> init PasskeyEntry, resp PasskeyEntry
        KeyboardOnly + NoInputNoOutput -> init PasskeyEntry, resp None
        NoInputNoOutput + DisplayOnly -> init None, resp None
        NoInputNoOutput + DisplayYesNo -> init None, resp YesNo
        NoInputNoOutput + KeyboardOnly -> init None, resp None
        NoInputNoOutput + NoInputNoOutput -> init None, resp None
        ");
    }

    proptest! {
        #[test]
        fn prediction_is_deterministic(
            initiator in io_capability(),
            responder in io_capability(),
        ) {
            prop_assert_eq!(predict(initiator, responder), predict(initiator, responder));
        }

        #[test]
        fn bond_outcomes_are_fixed(
            initiator in io_capability(),
            responder in io_capability(),
        ) {
            let e = predict(initiator, responder);
            prop_assert_eq!(e.initiator_bond, BondOutcome::Bonded);
            prop_assert_eq!(e.responder_bond, BondOutcome::None);
        }

        #[test]
        fn no_io_side_is_never_shown_a_value(
            other in io_capability(),
        ) {
            let as_initiator = predict(IoCapability::NoInputNoOutput, other);
            prop_assert!(!as_initiator.initiator_prompt.carries_value());

            let as_responder = predict(other, IoCapability::NoInputNoOutput);
            prop_assert!(!as_responder.responder_prompt.carries_value());
        }
    }
}
