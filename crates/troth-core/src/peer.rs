//! Peer control surface.
//!
//! [`SecurityPeer`] is the interface of one remote device's security
//! subsystem: request/response operations plus a server-push event stream.
//! [`PeerHandle`] layers the harness semantics on top: session setup,
//! configuration ordering, prompt resolution, and outcome verification
//! through an [`EventWaiter`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use troth_proto::{
    AuthRequirement, BondOutcome, IoCapability, OobPresence, PeerConfig, PeerIdentity,
    SecurityEvent, SecurityPolicy, UiPromptKind,
};

use crate::error::{Mismatch, ScenarioError, Side};
use crate::waiter::{EventWaiter, WaitError};

/// Server-push event subscription handed out by [`SecurityPeer::subscribe`].
pub type EventStream = mpsc::UnboundedReceiver<SecurityEvent>;

/// One remote device's security subsystem.
///
/// Implementations carry the commands to the device (RPC, in-process
/// simulation, ...) and push observed events onto every live subscription.
/// All operations are fire-and-forget from the caller's perspective;
/// outcomes arrive on the event stream.
#[async_trait]
pub trait SecurityPeer: Send + Sync {
    /// Declare the IO capability for subsequent pairing attempts.
    async fn set_io_capability(&self, io: IoCapability) -> Result<(), ScenarioError>;

    /// Declare the authentication requirement.
    async fn set_authentication_requirements(
        &self,
        auth_req: AuthRequirement,
    ) -> Result<(), ScenarioError>;

    /// Declare OOB data availability.
    async fn set_oob_presence(&self, oob: OobPresence) -> Result<(), ScenarioError>;

    /// Initiate pairing toward `peer`.
    async fn create_bond(&self, peer: PeerIdentity) -> Result<(), ScenarioError>;

    /// Arm an accept/reject answer for an inbound pairing request from
    /// `peer`.
    async fn respond_to_pairing(&self, peer: PeerIdentity, accept: bool)
    -> Result<(), ScenarioError>;

    /// Supply the user's decision for a raised prompt concerning `peer`.
    async fn supply_user_decision(
        &self,
        peer: PeerIdentity,
        accept: bool,
    ) -> Result<(), ScenarioError>;

    /// Drop the bond with `peer` and tear the link down.
    async fn remove_bond(&self, peer: PeerIdentity) -> Result<(), ScenarioError>;

    /// Check that `policy` is honored on the link to `peer`.
    async fn enforce_policy(
        &self,
        peer: PeerIdentity,
        policy: SecurityPolicy,
    ) -> Result<(), ScenarioError>;

    /// The device's own identity.
    async fn local_identity(&self) -> Result<PeerIdentity, ScenarioError>;

    /// Make the device reachable for inbound paging.
    async fn enable_page_scan(&self, enabled: bool) -> Result<(), ScenarioError>;

    /// Set the human-readable controller name.
    async fn write_local_name(&self, name: &str) -> Result<(), ScenarioError>;

    /// Pin the LE initiator address to a static identity. Test setup only.
    async fn set_le_initiator_address(&self, identity: PeerIdentity) -> Result<(), ScenarioError>;

    /// Open a fresh event subscription.
    async fn subscribe(&self) -> Result<EventStream, ScenarioError>;
}

/// Static random address pinned as the initiator's LE identity during
/// session setup.
const LE_STATIC_ADDRESS: [u8; 6] = [0xdd, 0x05, 0x04, 0x03, 0x02, 0x01];

/// Typed control surface over one peer for the duration of scenarios.
///
/// Owns exactly one event subscription. Configuration is only legal before
/// bonding starts; [`PeerHandle::close`] consumes the handle, so release
/// happens exactly once on every exit path.
pub struct PeerHandle {
    service: Arc<dyn SecurityPeer>,
    waiter: EventWaiter,
    identity: PeerIdentity,
    side: Side,
    event_timeout: Duration,
    bonding_started: bool,
}

impl PeerHandle {
    /// Connect to a peer and perform session setup: enable page scan, write
    /// the local name, fetch the local identity, subscribe to events, and
    /// (initiator only) pin the LE initiator address policy to a static
    /// random address.
    ///
    /// # Errors
    ///
    /// Propagates any service failure during setup.
    pub async fn connect(
        service: Arc<dyn SecurityPeer>,
        side: Side,
        event_timeout: Duration,
    ) -> Result<Self, ScenarioError> {
        service.enable_page_scan(true).await?;
        let name = match side {
            Side::Initiator => "Initiator Device",
            Side::Responder => "Responder Device",
        };
        service.write_local_name(name).await?;
        let identity = service.local_identity().await?;

        if side == Side::Initiator {
            let le_identity = PeerIdentity::random(troth_proto::DeviceAddress::new(
                LE_STATIC_ADDRESS,
            ));
            service.set_le_initiator_address(le_identity).await?;
        }

        let rx = service.subscribe().await?;
        tracing::debug!(%identity, ?side, "peer session ready");

        Ok(Self {
            service,
            waiter: EventWaiter::new(rx),
            identity,
            side,
            event_timeout,
            bonding_started: false,
        })
    }

    /// The peer's own identity.
    #[must_use]
    pub const fn identity(&self) -> PeerIdentity {
        self.identity
    }

    /// Which scenario role this handle plays.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Apply the pairing configuration for the next scenario.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Configuration`] if bonding has already started;
    /// configuration is fixed for a scenario's duration.
    pub async fn configure(&mut self, config: PeerConfig) -> Result<(), ScenarioError> {
        if self.bonding_started {
            return Err(ScenarioError::Configuration {
                reason: format!("{} reconfigured after bonding started", self.side),
            });
        }
        self.service.set_io_capability(config.io).await?;
        self.service.set_authentication_requirements(config.auth_req).await?;
        self.service.set_oob_presence(config.oob).await?;
        Ok(())
    }

    /// Initiate pairing toward `target`. Completion is observed via events.
    ///
    /// # Errors
    ///
    /// Propagates service failures.
    pub async fn create_bond(&mut self, target: PeerIdentity) -> Result<(), ScenarioError> {
        self.bonding_started = true;
        tracing::debug!(peer = %target, "create_bond");
        self.service.create_bond(target).await
    }

    /// Arm this peer to answer an inbound pairing request from `target`.
    ///
    /// # Errors
    ///
    /// Propagates service failures.
    pub async fn accept_pairing(
        &mut self,
        target: PeerIdentity,
        accept: bool,
    ) -> Result<(), ScenarioError> {
        self.bonding_started = true;
        self.service.respond_to_pairing(target, accept).await
    }

    /// Resolve this side's user prompt against the prediction.
    ///
    /// For a predicted prompt, blocks until a prompt concerning `target`
    /// arrives, verifies its kind, and supplies `response`. For a predicted
    /// `None`, returns immediately; auto-accept is stack-side and
    /// [`PeerHandle::unexpected_prompt`] catches strays after the fact.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::PredictionMismatch`] for a wrong prompt kind or a
    /// value-carrying prompt without a value, [`ScenarioError::Timeout`] if
    /// no prompt arrives in time.
    pub async fn resolve_user_prompt(
        &mut self,
        target: PeerIdentity,
        response: bool,
        expected: UiPromptKind,
    ) -> Result<(), ScenarioError> {
        if expected == UiPromptKind::None {
            return Ok(());
        }

        let side = self.side;
        let wait = self
            .waiter
            .wait_for(self.event_timeout, |event| {
                matches!(event, SecurityEvent::UiPrompt { peer, .. } if *peer == target)
            })
            .await;
        let event = match wait {
            Ok(event) => event,
            Err(e) => return Err(self.map_wait_error(e, format!("ui prompt {expected:?}"))),
        };

        let SecurityEvent::UiPrompt { kind, numeric_value, .. } = event else {
            // wait_for only matches UiPrompt.
            return Err(ScenarioError::Peer { reason: "waiter returned wrong event".to_string() });
        };

        if kind != expected {
            return Err(ScenarioError::PredictionMismatch(Mismatch::Prompt {
                side,
                expected,
                observed: kind,
            }));
        }
        if kind.carries_value() && numeric_value.is_none() {
            return Err(ScenarioError::Peer {
                reason: format!("{side} prompt {kind:?} arrived without a comparison value"),
            });
        }

        tracing::debug!(?kind, value = ?numeric_value, %side, "prompt observed, answering");
        self.service.supply_user_decision(target, response).await
    }

    /// Block until this side's bonding result arrives and matches
    /// `expected`.
    ///
    /// An expected [`BondOutcome::None`] means no event is required to
    /// arrive; the call returns immediately.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::PredictionMismatch`] on a diverging outcome,
    /// [`ScenarioError::Timeout`] if no result arrives in time.
    pub async fn await_bond_outcome(&mut self, expected: BondOutcome) -> Result<(), ScenarioError> {
        if expected == BondOutcome::None {
            return Ok(());
        }

        let side = self.side;
        let wait = self
            .waiter
            .wait_for(self.event_timeout, |event| {
                matches!(event, SecurityEvent::BondResult { .. })
            })
            .await;
        let event = match wait {
            Ok(event) => event,
            Err(e) => return Err(self.map_wait_error(e, "bond result".to_string())),
        };

        let SecurityEvent::BondResult { outcome, .. } = event else {
            return Err(ScenarioError::Peer { reason: "waiter returned wrong event".to_string() });
        };

        if outcome == expected {
            Ok(())
        } else {
            Err(ScenarioError::PredictionMismatch(Mismatch::Bond {
                side,
                expected,
                observed: outcome,
            }))
        }
    }

    /// Take a prompt concerning `target` that arrived although `None` was
    /// predicted, if any.
    ///
    /// Non-blocking backlog sweep; the scenario runner calls this during
    /// verification so an unpredicted prompt is reported, never silently
    /// passed.
    pub fn unexpected_prompt(&mut self, target: PeerIdentity) -> Option<UiPromptKind> {
        let event = self.waiter.take_buffered(|event| {
            matches!(event, SecurityEvent::UiPrompt { peer, .. } if *peer == target)
        })?;
        match event {
            SecurityEvent::UiPrompt { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Request bond removal toward `target` and re-open configuration.
    ///
    /// Fire-and-forget; follow with [`PeerHandle::await_link_down`] before
    /// reusing the peer pair.
    ///
    /// # Errors
    ///
    /// Propagates service failures.
    pub async fn remove_bond(&mut self, target: PeerIdentity) -> Result<(), ScenarioError> {
        tracing::debug!(peer = %target, "remove_bond");
        self.service.remove_bond(target).await?;
        self.bonding_started = false;
        Ok(())
    }

    /// Wait up to `window` for the ACL to `target` to report down.
    ///
    /// Returns whether teardown was observed; elapsing the window is the
    /// bounded settle, not a failure.
    pub async fn await_link_down(&mut self, target: PeerIdentity, window: Duration) -> bool {
        self.waiter
            .wait_for(window, |event| {
                matches!(event, SecurityEvent::LinkDown { peer } if *peer == target)
            })
            .await
            .is_ok()
    }

    /// Ask the stack to verify `policy` on the link to `target`.
    ///
    /// # Errors
    ///
    /// Propagates service failures.
    pub async fn enforce_security_policy(
        &mut self,
        target: PeerIdentity,
        policy: SecurityPolicy,
    ) -> Result<(), ScenarioError> {
        self.service.enforce_policy(target, policy).await
    }

    /// Block until the enforcement result arrives and matches `expected`.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::PredictionMismatch`] on a diverging verdict,
    /// [`ScenarioError::Timeout`] if none arrives in time.
    pub async fn await_enforcement_outcome(&mut self, expected: bool) -> Result<(), ScenarioError> {
        let wait = self
            .waiter
            .wait_for(self.event_timeout, |event| {
                matches!(event, SecurityEvent::EnforcementResult { .. })
            })
            .await;
        let event = match wait {
            Ok(event) => event,
            Err(e) => return Err(self.map_wait_error(e, "enforcement result".to_string())),
        };

        let SecurityEvent::EnforcementResult { allowed, .. } = event else {
            return Err(ScenarioError::Peer { reason: "waiter returned wrong event".to_string() });
        };

        if allowed == expected {
            Ok(())
        } else {
            Err(ScenarioError::PredictionMismatch(Mismatch::Enforcement {
                expected,
                observed: allowed,
            }))
        }
    }

    /// Release the event subscription. Consumes the handle, so this runs
    /// exactly once per scenario on every exit path.
    pub fn close(mut self) {
        self.waiter.close();
    }

    fn map_wait_error(&self, error: WaitError, waiting_for: String) -> ScenarioError {
        match error {
            WaitError::Timeout { window } => {
                ScenarioError::Timeout { side: self.side, window, waiting_for }
            },
            WaitError::Closed => ScenarioError::Peer {
                reason: format!("{} event stream closed while waiting for {waiting_for}", self.side),
            },
        }
    }
}
