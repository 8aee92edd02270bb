//! Server-push events from the Security Peer Service.

use serde::{Deserialize, Serialize};

use crate::{BondOutcome, PeerIdentity, ProtoError, UiPromptKind};

/// An event pushed by one peer's security subsystem.
///
/// Every event names the remote peer it concerns, so a single stream can
/// carry events about several links without ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityEvent {
    /// The stack raised a user prompt.
    UiPrompt {
        /// What kind of prompt.
        kind: UiPromptKind,
        /// Numeric comparison value, present iff the kind carries one.
        numeric_value: Option<u32>,
        /// The peer the prompt concerns.
        peer: PeerIdentity,
    },

    /// Pairing reached a terminal state.
    BondResult {
        /// Bonded or not.
        outcome: BondOutcome,
        /// The peer the result concerns.
        peer: PeerIdentity,
    },

    /// Result of a security policy enforcement check.
    EnforcementResult {
        /// Whether the link satisfied the policy.
        allowed: bool,
        /// The peer whose link was checked.
        peer: PeerIdentity,
    },

    /// The ACL to a peer went down.
    LinkDown {
        /// The disconnected peer.
        peer: PeerIdentity,
    },
}

impl SecurityEvent {
    /// Encode as CBOR.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| ProtoError::Encode { reason: e.to_string() })?;
        Ok(buf)
    }

    /// Decode from CBOR.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Decode`] on malformed input.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtoError> {
        ciborium::de::from_reader(bytes).map_err(|e| ProtoError::Decode { reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use crate::DeviceAddress;

    use super::*;

    fn peer() -> PeerIdentity {
        PeerIdentity::public(DeviceAddress::new([0xcc, 0x05, 0x04, 0x03, 0x02, 0x01]))
    }

    #[test]
    fn ui_prompt_roundtrip() {
        let event = SecurityEvent::UiPrompt {
            kind: UiPromptKind::YesNoWithValue,
            numeric_value: Some(123_456),
            peer: peer(),
        };
        let bytes = event.encode().expect("encode");
        assert_eq!(SecurityEvent::decode(&bytes).expect("decode"), event);
    }

    #[test]
    fn bond_result_roundtrip() {
        let event = SecurityEvent::BondResult { outcome: BondOutcome::Bonded, peer: peer() };
        let bytes = event.encode().expect("encode");
        assert_eq!(SecurityEvent::decode(&bytes).expect("decode"), event);
    }
}
