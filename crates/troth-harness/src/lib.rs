//! Simulated Security Peer Service for conformance testing.
//!
//! This crate provides everything needed to run the conformance core
//! without hardware:
//!
//! - [`SimPeer`]: an in-memory security subsystem pair joined by a
//!   simulated ACL, speaking the `SecurityPeer` interface and executing
//!   SSP numeric-comparison association selection
//! - [`SimEnv`]: a seeded, reproducible `Environment`
//! - [`SystemEnv`]: the real-time `Environment` for runs against hardware
//!
//! # Why a simulated peer?
//!
//! The matrix exercises 324 configuration points. Against real
//! controllers that run takes minutes and any radio flake poisons a
//! point; against the simulation it is deterministic from a seed and
//! completes in virtual time. The simulation is the default system under
//! test for the `troth-matrix` binary and the integration suite; the same
//! core drives real stacks through any other `SecurityPeer`
//! implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod sim_env;
mod sim_peer;
mod system_env;

pub use sim_env::SimEnv;
pub use sim_peer::{Misbehavior, SimPeer};
pub use system_env::SystemEnv;
