//! Scenario failure taxonomy.
//!
//! Three failures mean three different things: a `PredictionMismatch` is a
//! conformance defect in the device under test, a `Timeout` may be a hang
//! rather than wrong behavior, and a `Configuration` error is a harness bug
//! (illegal call ordering). They are never folded together.

use std::time::Duration;

use thiserror::Error;
use troth_proto::{BondOutcome, UiPromptKind};

/// Which role of a scenario an error concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The side that calls `create_bond`.
    Initiator,
    /// The side that answers the inbound pairing request.
    Responder,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiator => write!(f, "initiator"),
            Self::Responder => write!(f, "responder"),
        }
    }
}

/// A single observed-vs-predicted divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Mismatch {
    /// A side raised a different prompt than the table predicts.
    #[error("{side} prompt: predicted {expected:?}, observed {observed:?}")]
    Prompt {
        /// Side that diverged.
        side: Side,
        /// Predicted prompt kind.
        expected: UiPromptKind,
        /// Observed prompt kind.
        observed: UiPromptKind,
    },

    /// A side reported a different bond result than the table predicts.
    #[error("{side} bond: predicted {expected:?}, observed {observed:?}")]
    Bond {
        /// Side that diverged.
        side: Side,
        /// Predicted bond outcome.
        expected: BondOutcome,
        /// Observed bond outcome.
        observed: BondOutcome,
    },

    /// The enforcement check answered differently than expected.
    #[error("enforcement: expected allowed={expected}, observed allowed={observed}")]
    Enforcement {
        /// Expected enforcement verdict.
        expected: bool,
        /// Observed enforcement verdict.
        observed: bool,
    },
}

/// A failure of one pairing scenario.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    /// The device under test diverged from the association-model table.
    #[error("prediction mismatch: {0}")]
    PredictionMismatch(Mismatch),

    /// An expected event never arrived within the bounded window.
    #[error("{side} timed out after {window:?} waiting for {waiting_for}")]
    Timeout {
        /// Side whose wait elapsed.
        side: Side,
        /// Bound that elapsed.
        window: Duration,
        /// What the wait was for.
        waiting_for: String,
    },

    /// Illegal call ordering, e.g. configuring after bonding started.
    #[error("configuration error: {reason}")]
    Configuration {
        /// What was ordered wrongly.
        reason: String,
    },

    /// The Security Peer Service itself failed.
    #[error("peer service error: {reason}")]
    Peer {
        /// Service diagnostic.
        reason: String,
    },
}

impl ScenarioError {
    /// True for failures that indicate a hang rather than wrong behavior.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True for conformance defects in the device under test.
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        matches!(self, Self::PredictionMismatch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_display_names_both_kinds() {
        let err = ScenarioError::PredictionMismatch(Mismatch::Prompt {
            side: Side::Responder,
            expected: UiPromptKind::YesNoWithValue,
            observed: UiPromptKind::None,
        });
        assert_eq!(
            err.to_string(),
            "prediction mismatch: responder prompt: predicted YesNoWithValue, observed None"
        );
        assert!(err.is_mismatch());
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_is_distinct_from_mismatch() {
        let err = ScenarioError::Timeout {
            side: Side::Initiator,
            window: Duration::from_secs(5),
            waiting_for: "bond result".to_string(),
        };
        assert!(err.is_timeout());
        assert!(!err.is_mismatch());
    }
}
