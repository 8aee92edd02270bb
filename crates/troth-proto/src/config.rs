//! Pairing configuration enums.
//!
//! Wire values follow the HCI encoding so a Security Peer Service can pass
//! them straight to `IO_Capability_Request_Reply` and friends. The
//! `IMPLEMENTED` subsets are what the matrix driver iterates; the full enums
//! stay total so the prediction table never has a hole.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Declared IO capability of a device during SSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum IoCapability {
    /// Can show a value, cannot confirm one.
    DisplayOnly = 0x00,
    /// Can show a value and answer yes/no.
    DisplayYesNo = 0x01,
    /// Can enter a passkey, cannot display. Reserved: the classic pairing
    /// handler under test does not implement passkey entry yet.
    KeyboardOnly = 0x02,
    /// No way to show or confirm anything.
    NoInputNoOutput = 0x03,
}

impl IoCapability {
    /// The capabilities exercised by the matrix driver.
    ///
    /// `KeyboardOnly` is deliberately absent until passkey entry lands in
    /// the pairing handler under test.
    pub const IMPLEMENTED: [Self; 3] = [Self::DisplayOnly, Self::DisplayYesNo, Self::NoInputNoOutput];
}

/// Bonding mode extracted from an [`AuthRequirement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bonding {
    /// No bond is persisted.
    None,
    /// Pairing performed solely to create a bond.
    Dedicated,
    /// Bond persisted as a side effect of normal traffic.
    General,
}

/// Authentication requirement: bonding mode plus MITM protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AuthRequirement {
    /// No bonding, no MITM protection.
    NoBonding = 0x00,
    /// No bonding, MITM protection required.
    NoBondingMitm = 0x01,
    /// Dedicated bonding, no MITM protection.
    DedicatedBonding = 0x02,
    /// Dedicated bonding, MITM protection required.
    DedicatedBondingMitm = 0x03,
    /// General bonding, no MITM protection.
    GeneralBonding = 0x04,
    /// General bonding, MITM protection required.
    GeneralBondingMitm = 0x05,
}

impl AuthRequirement {
    /// Every authentication requirement; all six are exercised.
    pub const ALL: [Self; 6] = [
        Self::NoBonding,
        Self::NoBondingMitm,
        Self::DedicatedBonding,
        Self::DedicatedBondingMitm,
        Self::GeneralBonding,
        Self::GeneralBondingMitm,
    ];

    /// Whether this requirement demands man-in-the-middle protection.
    #[must_use]
    pub const fn requires_mitm(self) -> bool {
        matches!(self, Self::NoBondingMitm | Self::DedicatedBondingMitm | Self::GeneralBondingMitm)
    }

    /// The bonding mode component.
    #[must_use]
    pub const fn bonding(self) -> Bonding {
        match self {
            Self::NoBonding | Self::NoBondingMitm => Bonding::None,
            Self::DedicatedBonding | Self::DedicatedBondingMitm => Bonding::Dedicated,
            Self::GeneralBonding | Self::GeneralBondingMitm => Bonding::General,
        }
    }
}

/// Availability of out-of-band pairing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OobPresence {
    /// No OOB data exchanged.
    NotPresent = 0x00,
    /// P-192 OOB data available. Reserved: not implemented in the
    /// controller under test.
    P192Present = 0x01,
    /// P-256 OOB data available. Reserved.
    P256Present = 0x02,
    /// Both P-192 and P-256 OOB data available. Reserved.
    P192AndP256Present = 0x03,
}

impl OobPresence {
    /// The OOB states exercised by the matrix driver.
    pub const IMPLEMENTED: [Self; 1] = [Self::NotPresent];
}

/// Transport security policy for the post-bond enforcement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SecurityPolicy {
    /// Link must be encrypted.
    EncryptedTransport = 0x00,
    /// Link must be encrypted with an authenticated key.
    AuthenticatedEncryptedTransport = 0x01,
    /// Take whatever the link offers.
    BestEffort = 0x02,
}

/// One peer's pairing configuration for a scenario.
///
/// Fixed for the duration of a scenario; must be applied before bonding
/// starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Declared IO capability.
    pub io: IoCapability,
    /// Authentication requirement.
    pub auth_req: AuthRequirement,
    /// OOB data availability.
    pub oob: OobPresence,
}

impl PeerConfig {
    /// Configuration with the given IO capability and the defaults the
    /// reference tests use elsewhere.
    #[must_use]
    pub const fn with_io(io: IoCapability) -> Self {
        Self { io, auth_req: AuthRequirement::DedicatedBondingMitm, oob: OobPresence::NotPresent }
    }
}
