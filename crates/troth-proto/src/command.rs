//! Request/response surface of the Security Peer Service.
//!
//! One command per facade operation the conformance core needs. Commands
//! and responses serialize as CBOR so any RPC carrier (or the in-process
//! simulation) can move them without caring about their shape.

use serde::{Deserialize, Serialize};

use crate::{
    AuthRequirement, IoCapability, OobPresence, PeerIdentity, ProtoError, SecurityPolicy,
};

/// A request to one peer's security subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityCommand {
    /// Declare the IO capability used for subsequent pairing attempts.
    SetIoCapability {
        /// Capability to declare.
        io: IoCapability,
    },

    /// Declare the authentication requirement.
    SetAuthenticationRequirements {
        /// Requirement to declare.
        auth_req: AuthRequirement,
    },

    /// Declare OOB data availability.
    SetOobPresence {
        /// OOB state to declare.
        oob: OobPresence,
    },

    /// Initiate pairing toward a peer.
    CreateBond {
        /// The peer to bond with.
        peer: PeerIdentity,
    },

    /// Arm an answer for an inbound pairing request from `peer`.
    RespondToPairing {
        /// The peer whose request to answer.
        peer: PeerIdentity,
        /// Accept or reject when prompted.
        accept: bool,
    },

    /// Supply the user's decision for a raised prompt.
    SupplyUserDecision {
        /// The peer the prompt concerns.
        peer: PeerIdentity,
        /// The user's yes/no answer.
        accept: bool,
    },

    /// Drop the bond with a peer and tear the link down.
    RemoveBond {
        /// The peer whose bond to remove.
        peer: PeerIdentity,
    },

    /// Check that a transport security policy is honored on the link.
    EnforcePolicy {
        /// The peer whose link to check.
        peer: PeerIdentity,
        /// Policy that must hold.
        policy: SecurityPolicy,
    },

    /// Ask for the device's own identity.
    FetchLocalIdentity,

    /// Make the device reachable for inbound paging.
    EnablePageScan {
        /// Enable or disable.
        enabled: bool,
    },

    /// Set the human-readable controller name.
    WriteLocalName {
        /// Name bytes (UTF-8).
        name: String,
    },

    /// Pin the LE initiator address to a static identity. Test setup only.
    SetLeInitiatorAddress {
        /// The static identity to use.
        identity: PeerIdentity,
    },
}

/// Reply to a [`SecurityCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityResponse {
    /// Command accepted; any outcome arrives on the event stream.
    Ack,
    /// Reply to [`SecurityCommand::FetchLocalIdentity`].
    LocalIdentity {
        /// The device's own identity.
        identity: PeerIdentity,
    },
    /// Command rejected.
    Error {
        /// Human-readable reason.
        reason: String,
    },
}

impl SecurityCommand {
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

impl SecurityResponse {
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
