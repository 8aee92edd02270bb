//! One pairing scenario, driven and verified.
//!
//! A scenario walks `Configured → Initiated → AwaitingPrompts →
//! AwaitingBondOutcome → Verified`. Prompt and bond waits on the two sides
//! resolve concurrently with each other, while each side's own stream is
//! consumed in order. Mismatches and timeouts are collected, not
//! short-circuited, so one report carries every failed expectation.

use troth_proto::{PeerConfig, UiPromptKind};

use crate::error::{Mismatch, ScenarioError, Side};
use crate::model::{Expectation, predict};
use crate::peer::PeerHandle;

/// The yes/no answers supplied when a side is prompted.
#[derive(Debug, Clone, Copy)]
pub struct UiResponses {
    /// Answer the initiator gives when prompted.
    pub initiator: bool,
    /// Answer the responder gives when prompted.
    pub responder: bool,
}

impl Default for UiResponses {
    fn default() -> Self {
        Self { initiator: true, responder: true }
    }
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioResult {
    /// Every expectation that failed to resolve cleanly.
    pub failures: Vec<ScenarioError>,
}

impl ScenarioResult {
    /// True when every resolution matched and nothing timed out.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// The subset of failures that are conformance mismatches.
    pub fn mismatches(&self) -> impl Iterator<Item = &ScenarioError> {
        self.failures.iter().filter(|f| f.is_mismatch())
    }

    /// The subset of failures that are timeouts.
    pub fn timeouts(&self) -> impl Iterator<Item = &ScenarioError> {
        self.failures.iter().filter(|f| f.is_timeout())
    }
}

/// One bonding attempt between two configured peers, verified against the
/// association-model prediction for their IO capabilities.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    initiator_config: PeerConfig,
    responder_config: PeerConfig,
    expectation: Expectation,
    responses: UiResponses,
}

impl Scenario {
    /// Build a scenario for a configuration pair. The expectation is
    /// computed once, here, and consumed by this scenario only.
    #[must_use]
    pub fn new(initiator_config: PeerConfig, responder_config: PeerConfig) -> Self {
        Self {
            initiator_config,
            responder_config,
            expectation: predict(initiator_config.io, responder_config.io),
            responses: UiResponses::default(),
        }
    }

    /// Override the default accept/accept UI answers.
    #[must_use]
    pub const fn with_responses(mut self, responses: UiResponses) -> Self {
        self.responses = responses;
        self
    }

    /// The prediction this scenario verifies against.
    #[must_use]
    pub const fn expectation(&self) -> Expectation {
        self.expectation
    }

    /// Configure both peers, trigger bonding, and verify prompts and
    /// outcomes.
    ///
    /// # Errors
    ///
    /// Hard failures only: illegal call ordering or a failing peer service.
    /// Conformance divergence and timeouts land in the returned
    /// [`ScenarioResult`].
    pub async fn run(
        &self,
        initiator: &mut PeerHandle,
        responder: &mut PeerHandle,
    ) -> Result<ScenarioResult, ScenarioError> {
        initiator.configure(self.initiator_config).await?;
        responder.configure(self.responder_config).await?;
        tracing::debug!(
            initiator = ?self.initiator_config.io,
            responder = ?self.responder_config.io,
            "scenario configured"
        );

        initiator.create_bond(responder.identity()).await?;
        self.verify(initiator, responder).await
    }

    /// Verify a pairing pass without re-initiating bonding.
    ///
    /// Used on its own when something other than `create_bond` re-triggers
    /// pairing over the existing ACL, e.g. a security policy enforcement
    /// after the first bond.
    ///
    /// # Errors
    ///
    /// Hard failures only, as for [`Scenario::run`].
    pub async fn verify(
        &self,
        initiator: &mut PeerHandle,
        responder: &mut PeerHandle,
    ) -> Result<ScenarioResult, ScenarioError> {
        let initiator_id = initiator.identity();
        let responder_id = responder.identity();
        if initiator_id == responder_id {
            return Err(ScenarioError::Configuration {
                reason: format!("both roles resolve to the same identity {initiator_id}"),
            });
        }

        responder.accept_pairing(initiator_id, self.responses.responder).await?;
        tracing::debug!("scenario initiated, awaiting prompts");

        let mut failures = Vec::new();

        let (init_prompt, resp_prompt) = tokio::join!(
            initiator.resolve_user_prompt(
                responder_id,
                self.responses.initiator,
                self.expectation.initiator_prompt,
            ),
            responder.resolve_user_prompt(
                initiator_id,
                self.responses.responder,
                self.expectation.responder_prompt,
            ),
        );
        collect(&mut failures, init_prompt)?;
        collect(&mut failures, resp_prompt)?;

        tracing::debug!("prompts resolved, awaiting bond outcome");
        let (init_bond, resp_bond) = tokio::join!(
            initiator.await_bond_outcome(self.expectation.initiator_bond),
            responder.await_bond_outcome(self.expectation.responder_bond),
        );
        collect(&mut failures, init_bond)?;
        collect(&mut failures, resp_bond)?;

        // A side predicted silent must actually have stayed silent.
        if self.expectation.initiator_prompt == UiPromptKind::None {
            if let Some(observed) = initiator.unexpected_prompt(responder_id) {
                failures.push(ScenarioError::PredictionMismatch(Mismatch::Prompt {
                    side: Side::Initiator,
                    expected: UiPromptKind::None,
                    observed,
                }));
            }
        }
        if self.expectation.responder_prompt == UiPromptKind::None {
            if let Some(observed) = responder.unexpected_prompt(initiator_id) {
                failures.push(ScenarioError::PredictionMismatch(Mismatch::Prompt {
                    side: Side::Responder,
                    expected: UiPromptKind::None,
                    observed,
                }));
            }
        }

        let result = ScenarioResult { failures };
        if result.passed() {
            tracing::debug!("scenario verified: pass");
        } else {
            tracing::warn!(failures = result.failures.len(), "scenario verified: fail");
        }
        Ok(result)
    }
}

/// Fold a resolution into the failure list, re-raising hard failures.
fn collect(
    failures: &mut Vec<ScenarioError>,
    result: Result<(), ScenarioError>,
) -> Result<(), ScenarioError> {
    match result {
        Ok(()) => Ok(()),
        Err(e @ (ScenarioError::PredictionMismatch(_) | ScenarioError::Timeout { .. })) => {
            failures.push(e);
            Ok(())
        },
        Err(hard) => Err(hard),
    }
}
