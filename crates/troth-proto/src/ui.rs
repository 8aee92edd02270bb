//! User-interaction and bonding outcome kinds.

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Kind of user prompt a pairing attempt raises.
///
/// `None` is a real expectation, not an absence of one: it asserts the stack
/// auto-accepts without surfacing anything to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum UiPromptKind {
    /// No prompt; the stack accepts on its own.
    None = 0x00,
    /// Yes/no confirmation without a value to compare.
    YesNo = 0x01,
    /// Yes/no confirmation showing the numeric comparison value.
    YesNoWithValue = 0x02,
    /// Display a passkey for the peer to type. Reserved.
    PasskeyDisplay = 0x03,
    /// Ask the user to type the peer's passkey. Reserved.
    PasskeyEntry = 0x04,
}

impl UiPromptKind {
    /// Whether this prompt carries a numeric comparison value.
    #[must_use]
    pub const fn carries_value(self) -> bool {
        matches!(self, Self::YesNoWithValue | Self::PasskeyDisplay)
    }
}

/// Terminal bonding state observed by one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum BondOutcome {
    /// No bond event is required to arrive.
    None = 0x00,
    /// The device reported a persisted bond.
    Bonded = 0x01,
}
