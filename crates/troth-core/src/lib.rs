//! Pairing-conformance core.
//!
//! This crate encodes the protocol logic of the harness, independent of any
//! transport or device:
//!
//! ```text
//! troth-core
//!   ├─ model     (association-model decision table → Expectation)
//!   ├─ peer      (SecurityPeer trait + PeerHandle control surface)
//!   ├─ waiter    (EventWaiter: subscription + bounded timeout)
//!   ├─ scenario  (one bonding attempt, verified against an Expectation)
//!   ├─ matrix    (cartesian sweep with inter-scenario isolation)
//!   └─ env       (Environment abstraction for time and randomness)
//! ```
//!
//! The core never touches a radio: it drives two [`peer::SecurityPeer`]
//! implementations and verifies the prompts and bond results they report
//! against [`model::predict`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
mod error;
mod matrix;
mod model;
mod peer;
mod scenario;
mod waiter;

pub use env::Environment;
pub use error::{Mismatch, ScenarioError, Side};
pub use matrix::{MatrixConfig, MatrixDriver, MatrixPoint, MatrixReport, matrix_points};
pub use model::{Expectation, predict};
pub use peer::{EventStream, PeerHandle, SecurityPeer};
pub use scenario::{Scenario, ScenarioResult, UiResponses};
pub use waiter::{EventWaiter, WaitError};
