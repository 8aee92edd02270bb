//! Wire types for the Security Peer Service.
//!
//! This crate defines the data model shared between the conformance core and
//! any Security Peer Service implementation: device addresses, pairing
//! configuration enums, the command surface, and the server-push event
//! stream. Compound messages serialize as CBOR; single-value enums carry
//! their HCI wire values.
//!
//! No transport lives here. The core talks to a peer through the
//! `SecurityPeer` trait in `troth-core`; this crate only fixes the shapes
//! that cross that boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod address;
mod command;
mod config;
mod error;
mod event;
mod ui;

pub use address::{AddressKind, AddressParseError, DeviceAddress, PeerIdentity};
pub use command::{SecurityCommand, SecurityResponse};
pub use config::{AuthRequirement, Bonding, IoCapability, OobPresence, PeerConfig, SecurityPolicy};
pub use error::ProtoError;
pub use event::SecurityEvent;
pub use ui::{BondOutcome, UiPromptKind};
