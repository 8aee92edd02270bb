//! In-memory Security Peer Service pair.
//!
//! Two [`SimPeer`]s share one simulated ACL. The initiator's `create_bond`
//! spawns a pairing procedure that selects the numeric-comparison dialogs
//! from both sides' IO capabilities, raises UI prompts on each peer's event
//! stream, waits for the armed pairing response and any supplied user
//! decisions, and finally reports the bond result to the initiating side
//! only (the responding stack persists the key without surfacing an event,
//! as the reference stack does).
//!
//! Passkey entry is unimplemented in the simulated pairing handler, matching
//! the gap in the stack under test: a `KeyboardOnly` peer behaves as a
//! no-IO device.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use troth_core::{Environment, EventStream, ScenarioError, SecurityPeer};
use troth_proto::{
    AuthRequirement, BondOutcome, DeviceAddress, IoCapability, OobPresence, PeerIdentity,
    SecurityEvent, SecurityPolicy, UiPromptKind,
};

/// Conformance fault injected into one peer for harness self-tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Misbehavior {
    /// Behave like the reference stack.
    #[default]
    Conforming,
    /// Raise this prompt kind instead of the stack-selected one, then
    /// proceed without waiting for a user decision.
    ForcePrompt(UiPromptKind),
    /// Emit no events at all; pairing hangs.
    Mute,
}

/// Key material bookkeeping for one bond.
#[derive(Debug, Clone, Copy)]
struct BondKeys {
    authenticated: bool,
}

/// Mutable per-peer stack state.
struct PeerState {
    io: IoCapability,
    auth_req: AuthRequirement,
    oob: OobPresence,
    page_scan: bool,
    name: String,
    le_identity: Option<PeerIdentity>,
    bonds: HashMap<PeerIdentity, BondKeys>,
}

impl PeerState {
    fn new() -> Self {
        Self {
            io: IoCapability::NoInputNoOutput,
            auth_req: AuthRequirement::NoBonding,
            oob: OobPresence::NotPresent,
            page_scan: false,
            name: String::new(),
            le_identity: None,
            bonds: HashMap::new(),
        }
    }
}

/// Shared ACL state between the two peers of a pair.
struct LinkState {
    up: bool,
}

/// One-slot mailbox for an armed response or a user decision.
#[derive(Default)]
struct DecisionSlot {
    value: Mutex<Option<bool>>,
    notify: Notify,
}

impl DecisionSlot {
    async fn put(&self, accept: bool) {
        *self.value.lock().await = Some(accept);
        self.notify.notify_one();
    }

    async fn take_or_wait(&self) -> bool {
        loop {
            if let Some(accept) = self.value.lock().await.take() {
                return accept;
            }
            self.notify.notified().await;
        }
    }

    async fn clear(&self) {
        *self.value.lock().await = None;
    }
}

/// Simulated security subsystem of one device.
///
/// Construct with [`SimPeer::linked_pair`]; a lone peer has no link and can
/// only fail pairing.
pub struct SimPeer<E: Environment> {
    identity: PeerIdentity,
    env: E,
    state: Mutex<PeerState>,
    armed: DecisionSlot,
    decision: DecisionSlot,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SecurityEvent>>>,
    misbehavior: Mutex<Misbehavior>,
    link: Arc<Mutex<LinkState>>,
    self_ref: OnceLock<Weak<Self>>,
    other: OnceLock<Weak<Self>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<E: Environment> SimPeer<E> {
    /// Build two peers joined by one simulated ACL.
    ///
    /// Returned as (initiator-side, responder-side) by convention, though
    /// either can initiate.
    pub fn linked_pair(env: E) -> (Arc<Self>, Arc<Self>) {
        let link = Arc::new(Mutex::new(LinkState { up: false }));
        let a = Arc::new(Self::new(
            env.clone(),
            PeerIdentity::public(DeviceAddress::new([0xd0, 0x05, 0x04, 0x03, 0x02, 0x01])),
            Arc::clone(&link),
        ));
        let b = Arc::new(Self::new(
            env,
            PeerIdentity::public(DeviceAddress::new([0xc0, 0x05, 0x04, 0x03, 0x02, 0x02])),
            link,
        ));
        let _ = a.self_ref.set(Arc::downgrade(&a));
        let _ = b.self_ref.set(Arc::downgrade(&b));
        let _ = a.other.set(Arc::downgrade(&b));
        let _ = b.other.set(Arc::downgrade(&a));
        (a, b)
    }

    fn new(env: E, identity: PeerIdentity, link: Arc<Mutex<LinkState>>) -> Self {
        Self {
            identity,
            env,
            state: Mutex::new(PeerState::new()),
            armed: DecisionSlot::default(),
            decision: DecisionSlot::default(),
            subscribers: Mutex::new(Vec::new()),
            misbehavior: Mutex::new(Misbehavior::Conforming),
            link,
            self_ref: OnceLock::new(),
            other: OnceLock::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Inject a conformance fault for harness self-tests.
    pub async fn set_misbehavior(&self, misbehavior: Misbehavior) {
        *self.misbehavior.lock().await = misbehavior;
    }

    /// The controller name last written to this peer.
    pub async fn local_name(&self) -> String {
        self.state.lock().await.name.clone()
    }

    /// The pinned LE initiator identity, if one was set.
    pub async fn le_initiator_identity(&self) -> Option<PeerIdentity> {
        self.state.lock().await.le_identity
    }

    /// Push an event to every live subscription.
    async fn emit(&self, event: SecurityEvent) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn counterpart(&self, target: PeerIdentity) -> Result<Arc<Self>, ScenarioError> {
        let other = self
            .other
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| ScenarioError::Peer { reason: "peer has no linked counterpart".into() })?;
        if other.identity != target {
            return Err(ScenarioError::Peer {
                reason: format!("unknown peer {target}, linked to {}", other.identity),
            });
        }
        Ok(other)
    }

    fn self_arc(&self) -> Result<Arc<Self>, ScenarioError> {
        self.self_ref
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| ScenarioError::Peer { reason: "peer already shut down".into() })
    }

    /// The prompt this stack raises for its own user during numeric
    /// comparison.
    ///
    /// Only a side that can both display and confirm raises a dialog; it
    /// shows the comparison value when the peer also has a display to match
    /// it against.
    fn stack_prompt(own: IoCapability, peer: IoCapability) -> UiPromptKind {
        match own {
            IoCapability::DisplayYesNo => {
                if matches!(peer, IoCapability::DisplayOnly | IoCapability::DisplayYesNo) {
                    UiPromptKind::YesNoWithValue
                } else {
                    UiPromptKind::YesNo
                }
            },
            _ => UiPromptKind::None,
        }
    }

    /// Raise this side's dialog (if any) and collect the user's answer.
    async fn side_flow(peer: &Arc<Self>, stack_kind: UiPromptKind, value: u32, about: PeerIdentity) -> bool {
        let misbehavior = *peer.misbehavior.lock().await;
        match misbehavior {
            Misbehavior::Mute => std::future::pending().await,
            Misbehavior::ForcePrompt(kind) => {
                if kind != UiPromptKind::None {
                    peer.emit(SecurityEvent::UiPrompt {
                        kind,
                        numeric_value: kind.carries_value().then_some(value),
                        peer: about,
                    })
                    .await;
                }
                // A rigged prompt is fire-and-forget; pairing proceeds.
                true
            },
            Misbehavior::Conforming => {
                if stack_kind == UiPromptKind::None {
                    return true;
                }
                peer.emit(SecurityEvent::UiPrompt {
                    kind: stack_kind,
                    numeric_value: stack_kind.carries_value().then_some(value),
                    peer: about,
                })
                .await;
                peer.decision.take_or_wait().await
            },
        }
    }

    /// One full pairing procedure between the two peers.
    ///
    /// With `force` unset, an existing bond short-circuits to an immediate
    /// bonded report; with it set (security enforcement re-authentication)
    /// the dialogs run again over the standing ACL.
    async fn pairing_pass(initiator: Arc<Self>, responder: Arc<Self>, force: bool) {
        if !responder.state.lock().await.page_scan {
            initiator
                .emit(SecurityEvent::BondResult {
                    outcome: BondOutcome::None,
                    peer: responder.identity,
                })
                .await;
            return;
        }

        if !force && initiator.state.lock().await.bonds.contains_key(&responder.identity) {
            initiator.link.lock().await.up = true;
            initiator
                .emit(SecurityEvent::BondResult {
                    outcome: BondOutcome::Bonded,
                    peer: responder.identity,
                })
                .await;
            return;
        }

        initiator.link.lock().await.up = true;

        let (init_io, init_auth, init_oob) = {
            let state = initiator.state.lock().await;
            (state.io, state.auth_req, state.oob)
        };
        let (resp_io, resp_auth, resp_oob) = {
            let state = responder.state.lock().await;
            (state.io, state.auth_req, state.oob)
        };

        // OOB association would take precedence over numeric comparison,
        // but the simulated handler does not implement it.
        if init_oob != OobPresence::NotPresent || resp_oob != OobPresence::NotPresent {
            tracing::warn!(?init_oob, ?resp_oob, "oob data declared, oob pairing unimplemented");
        }

        let value = initiator.env.random_u32() % 1_000_000;
        let init_kind = Self::stack_prompt(init_io, resp_io);
        let resp_kind = Self::stack_prompt(resp_io, init_io);
        tracing::debug!(
            ?init_io, ?resp_io, ?init_kind, ?resp_kind, value,
            "pairing pass selected dialogs"
        );

        let armed_accept = responder.armed.take_or_wait().await;

        let (init_accept, resp_accept) = tokio::join!(
            Self::side_flow(&initiator, init_kind, value, responder.identity),
            Self::side_flow(&responder, resp_kind, value, initiator.identity),
        );

        let accepted = armed_accept && init_accept && resp_accept;
        if accepted {
            // Numeric comparison authenticates the key only when both
            // sides confirmed a dialog and both asked for MITM protection.
            let authenticated = init_kind != UiPromptKind::None
                && resp_kind != UiPromptKind::None
                && init_auth.requires_mitm()
                && resp_auth.requires_mitm();
            let keys = BondKeys { authenticated };
            initiator.state.lock().await.bonds.insert(responder.identity, keys);
            responder.state.lock().await.bonds.insert(initiator.identity, keys);
            initiator
                .emit(SecurityEvent::BondResult {
                    outcome: BondOutcome::Bonded,
                    peer: responder.identity,
                })
                .await;
        } else {
            tracing::debug!(armed_accept, init_accept, resp_accept, "pairing rejected");
            initiator
                .emit(SecurityEvent::BondResult {
                    outcome: BondOutcome::None,
                    peer: responder.identity,
                })
                .await;
        }
    }
}

#[async_trait]
impl<E: Environment> SecurityPeer for SimPeer<E> {
    async fn set_io_capability(&self, io: IoCapability) -> Result<(), ScenarioError> {
        self.state.lock().await.io = io;
        Ok(())
    }

    async fn set_authentication_requirements(
        &self,
        auth_req: AuthRequirement,
    ) -> Result<(), ScenarioError> {
        self.state.lock().await.auth_req = auth_req;
        Ok(())
    }

    async fn set_oob_presence(&self, oob: OobPresence) -> Result<(), ScenarioError> {
        self.state.lock().await.oob = oob;
        Ok(())
    }

    async fn create_bond(&self, peer: PeerIdentity) -> Result<(), ScenarioError> {
        let initiator = self.self_arc()?;
        let responder = self.counterpart(peer)?;
        let handle = tokio::spawn(Self::pairing_pass(initiator, responder, false));
        self.tasks.lock().await.push(handle);
        Ok(())
    }

    async fn respond_to_pairing(
        &self,
        _peer: PeerIdentity,
        accept: bool,
    ) -> Result<(), ScenarioError> {
        self.armed.put(accept).await;
        Ok(())
    }

    async fn supply_user_decision(
        &self,
        _peer: PeerIdentity,
        accept: bool,
    ) -> Result<(), ScenarioError> {
        self.decision.put(accept).await;
        Ok(())
    }

    async fn remove_bond(&self, peer: PeerIdentity) -> Result<(), ScenarioError> {
        self.state.lock().await.bonds.remove(&peer);
        self.armed.clear().await;
        self.decision.clear().await;

        // An in-flight pairing cannot survive link teardown.
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }

        let mut link = self.link.lock().await;
        if link.up {
            link.up = false;
            drop(link);
            self.emit(SecurityEvent::LinkDown { peer }).await;
            if let Ok(other) = self.counterpart(peer) {
                other.emit(SecurityEvent::LinkDown { peer: self.identity }).await;
            }
        }
        Ok(())
    }

    async fn enforce_policy(
        &self,
        peer: PeerIdentity,
        policy: SecurityPolicy,
    ) -> Result<(), ScenarioError> {
        let initiator = self.self_arc()?;
        let responder = self.counterpart(peer)?;
        let handle = tokio::spawn(async move {
            // Enforcement re-authenticates over the standing ACL, which
            // replays the pairing dialogs, then reports the verdict.
            Self::pairing_pass(Arc::clone(&initiator), Arc::clone(&responder), true).await;
            let bond = initiator.state.lock().await.bonds.get(&responder.identity).copied();
            let allowed = match policy {
                SecurityPolicy::BestEffort => true,
                SecurityPolicy::EncryptedTransport => bond.is_some(),
                SecurityPolicy::AuthenticatedEncryptedTransport => {
                    bond.is_some_and(|keys| keys.authenticated)
                },
            };
            initiator
                .emit(SecurityEvent::EnforcementResult { allowed, peer: responder.identity })
                .await;
        });
        self.tasks.lock().await.push(handle);
        Ok(())
    }

    async fn local_identity(&self) -> Result<PeerIdentity, ScenarioError> {
        Ok(self.identity)
    }

    async fn enable_page_scan(&self, enabled: bool) -> Result<(), ScenarioError> {
        self.state.lock().await.page_scan = enabled;
        Ok(())
    }

    async fn write_local_name(&self, name: &str) -> Result<(), ScenarioError> {
        self.state.lock().await.name = name.to_string();
        Ok(())
    }

    async fn set_le_initiator_address(&self, identity: PeerIdentity) -> Result<(), ScenarioError> {
        self.state.lock().await.le_identity = Some(identity);
        Ok(())
    }

    async fn subscribe(&self) -> Result<EventStream, ScenarioError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().await.push(tx);
        Ok(rx)
    }
}
