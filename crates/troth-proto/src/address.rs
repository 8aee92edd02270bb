//! Device addresses.
//!
//! A Bluetooth device is identified by a 48-bit address tagged with an
//! address kind (public or random). Both tags travel together everywhere in
//! the harness: a bond is a relationship between two `PeerIdentity` values,
//! never between bare addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// A 48-bit Bluetooth device address.
///
/// Stored in display order (`aa:bb:cc:dd:ee:ff` ⇒ `[0xaa, 0xbb, ...]`).
/// The wire form is the raw 6 bytes; [`DeviceAddress::from_bytes`] accepts
/// any 6-byte slice read off a controller interface.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    IntoBytes,
    FromBytes,
    Immutable,
    KnownLayout,
    Unaligned,
)]
#[repr(transparent)]
pub struct DeviceAddress(pub [u8; 6]);

impl DeviceAddress {
    /// Number of bytes in a device address.
    pub const LEN: usize = 6;

    /// Construct from raw bytes in display order.
    #[must_use]
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Parse from a 6-byte wire slice.
    ///
    /// # Errors
    ///
    /// Returns [`AddressParseError::WrongLength`] unless `bytes.len() == 6`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressParseError> {
        let arr: [u8; 6] =
            bytes.try_into().map_err(|_| AddressParseError::WrongLength { len: bytes.len() })?;
        Ok(Self(arr))
    }

    /// The raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in &mut bytes {
            let part = parts.next().ok_or(AddressParseError::Malformed)?;
            if part.len() != 2 {
                return Err(AddressParseError::Malformed);
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| AddressParseError::Malformed)?;
        }
        if parts.next().is_some() {
            return Err(AddressParseError::Malformed);
        }
        Ok(Self(bytes))
    }
}

/// Failure to parse a device address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// Input was not exactly 6 bytes.
    #[error("address must be 6 bytes, got {len}")]
    WrongLength {
        /// Length of the rejected input.
        len: usize,
    },

    /// Input was not `aa:bb:cc:dd:ee:ff` colon-hex.
    #[error("malformed address string")]
    Malformed,
}

/// Whether an address is fixed in the controller or generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    /// Public device address (IEEE-assigned).
    Public,
    /// Random device address (static or resolvable).
    Random,
}

/// A device address plus its kind.
///
/// This is the unit of identity for bonding: `create_bond` and `remove_bond`
/// both take the full identity, and the two roles of a scenario must resolve
/// to distinct identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerIdentity {
    /// The 48-bit device address.
    pub address: DeviceAddress,
    /// Public or random.
    pub kind: AddressKind,
}

impl PeerIdentity {
    /// A public-address identity.
    #[must_use]
    pub const fn public(address: DeviceAddress) -> Self {
        Self { address, kind: AddressKind::Public }
    }

    /// A random-address identity.
    #[must_use]
    pub const fn random(address: DeviceAddress) -> Self {
        Self { address, kind: AddressKind::Random }
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AddressKind::Public => write!(f, "{} (public)", self.address),
            AddressKind::Random => write!(f, "{} (random)", self.address),
        }
    }
}
