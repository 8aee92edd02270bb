//! End-to-end pairing scenarios against the simulated peer pair.
//!
//! Each test drives a full bonding attempt through the scenario runner and
//! checks the observed prompts and bond outcome against the
//! association-model prediction. Faulty-device tests rig one simulated
//! peer and assert the divergence is reported, never silently passed.

use std::sync::Arc;
use std::time::Duration;

use troth_core::{
    Mismatch, PeerHandle, Scenario, ScenarioError, SecurityPeer, Side, UiResponses,
};
use troth_proto::{BondOutcome, IoCapability, PeerConfig, SecurityPolicy, UiPromptKind};
use troth_harness::{Misbehavior, SimEnv, SimPeer};

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Simulated pair plus connected handles for one scenario.
async fn setup(
    env: &SimEnv,
) -> (Arc<SimPeer<SimEnv>>, Arc<SimPeer<SimEnv>>, PeerHandle, PeerHandle) {
    let (init_sim, resp_sim) = SimPeer::linked_pair(env.clone());

    let init_service: Arc<dyn SecurityPeer> = init_sim.clone();
    let resp_service: Arc<dyn SecurityPeer> = resp_sim.clone();

    let initiator = PeerHandle::connect(init_service, Side::Initiator, EVENT_TIMEOUT)
        .await
        .expect("connect initiator");
    let responder = PeerHandle::connect(resp_service, Side::Responder, EVENT_TIMEOUT)
        .await
        .expect("connect responder");

    (init_sim, resp_sim, initiator, responder)
}

fn config(io: IoCapability) -> PeerConfig {
    PeerConfig::with_io(io)
}

async fn run_conforming(init_io: IoCapability, resp_io: IoCapability) {
    let env = SimEnv::with_seed(7);
    let (_, _, mut initiator, mut responder) = setup(&env).await;

    let scenario = Scenario::new(config(init_io), config(resp_io));
    let result = scenario.run(&mut initiator, &mut responder).await.expect("run");
    assert!(result.passed(), "unexpected failures: {:?}", result.failures);

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn connect_performs_session_setup() {
    // Connecting writes the controller name on both sides and pins the LE
    // initiator address on the initiating side only.
    let env = SimEnv::with_seed(3);
    let (init_sim, resp_sim, initiator, responder) = setup(&env).await;

    assert_eq!(init_sim.local_name().await, "Initiator Device");
    assert_eq!(resp_sim.local_name().await, "Responder Device");
    assert!(init_sim.le_initiator_identity().await.is_some());
    assert!(resp_sim.le_initiator_identity().await.is_none());
    assert_ne!(initiator.identity(), responder.identity());

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn display_only_vs_display_yes_no() {
    // Responder confirms the comparison value; initiator stays silent.
    run_conforming(IoCapability::DisplayOnly, IoCapability::DisplayYesNo).await;
}

#[tokio::test(start_paused = true)]
async fn display_yes_no_both_sides() {
    run_conforming(IoCapability::DisplayYesNo, IoCapability::DisplayYesNo).await;
}

#[tokio::test(start_paused = true)]
async fn just_works_no_prompts() {
    run_conforming(IoCapability::NoInputNoOutput, IoCapability::NoInputNoOutput).await;
}

#[tokio::test(start_paused = true)]
async fn display_yes_no_vs_no_io_confirms_without_value() {
    run_conforming(IoCapability::DisplayYesNo, IoCapability::NoInputNoOutput).await;
}

#[tokio::test(start_paused = true)]
async fn expectations_match_the_table() {
    // The four reference scenarios, expectation side.
    let cases = [
        (
            IoCapability::DisplayOnly,
            IoCapability::DisplayYesNo,
            UiPromptKind::None,
            UiPromptKind::YesNoWithValue,
        ),
        (
            IoCapability::DisplayYesNo,
            IoCapability::DisplayYesNo,
            UiPromptKind::YesNoWithValue,
            UiPromptKind::YesNoWithValue,
        ),
        (
            IoCapability::NoInputNoOutput,
            IoCapability::NoInputNoOutput,
            UiPromptKind::None,
            UiPromptKind::None,
        ),
        (
            IoCapability::DisplayYesNo,
            IoCapability::NoInputNoOutput,
            UiPromptKind::YesNo,
            UiPromptKind::None,
        ),
    ];
    for (init_io, resp_io, init_prompt, resp_prompt) in cases {
        let expectation = Scenario::new(config(init_io), config(resp_io)).expectation();
        assert_eq!(expectation.initiator_prompt, init_prompt);
        assert_eq!(expectation.responder_prompt, resp_prompt);
        assert_eq!(expectation.initiator_bond, BondOutcome::Bonded);
        assert_eq!(expectation.responder_bond, BondOutcome::None);
    }
}

#[tokio::test(start_paused = true)]
async fn pairing_twice_over_same_acl_with_enforcement() {
    // Just-works bond, then an authenticated-transport enforcement check:
    // the re-authentication replays the (empty) dialogs, and the verdict
    // is negative because just-works cannot authenticate the key.
    let env = SimEnv::with_seed(11);
    let (_, _, mut initiator, mut responder) = setup(&env).await;

    let scenario =
        Scenario::new(config(IoCapability::NoInputNoOutput), config(IoCapability::NoInputNoOutput));
    let result = scenario.run(&mut initiator, &mut responder).await.expect("first pass");
    assert!(result.passed(), "failures: {:?}", result.failures);

    initiator
        .enforce_security_policy(
            responder.identity(),
            SecurityPolicy::AuthenticatedEncryptedTransport,
        )
        .await
        .expect("enforce");

    let result = scenario.verify(&mut initiator, &mut responder).await.expect("second pass");
    assert!(result.passed(), "failures: {:?}", result.failures);

    initiator.await_enforcement_outcome(false).await.expect("enforcement verdict");

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn pairing_twice_with_remove_bond_between() {
    // Remove + settle, then a re-pair behaves exactly like a first-time
    // pairing between the same two addresses.
    let env = SimEnv::with_seed(13);
    let (_, _, mut initiator, mut responder) = setup(&env).await;

    let scenario =
        Scenario::new(config(IoCapability::NoInputNoOutput), config(IoCapability::NoInputNoOutput));

    let result = scenario.run(&mut initiator, &mut responder).await.expect("first pairing");
    assert!(result.passed(), "failures: {:?}", result.failures);

    let responder_id = responder.identity();
    let initiator_id = initiator.identity();
    initiator.remove_bond(responder_id).await.expect("remove on initiator");
    responder.remove_bond(initiator_id).await.expect("remove on responder");
    assert!(
        initiator.await_link_down(responder_id, SETTLE_TIMEOUT).await,
        "link should tear down after bond removal"
    );

    let result = scenario.run(&mut initiator, &mut responder).await.expect("second pairing");
    assert!(result.passed(), "failures: {:?}", result.failures);

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn existing_bond_short_circuits_repairing() {
    let env = SimEnv::with_seed(17);
    let (_, _, mut initiator, mut responder) = setup(&env).await;

    let scenario =
        Scenario::new(config(IoCapability::NoInputNoOutput), config(IoCapability::NoInputNoOutput));
    let result = scenario.run(&mut initiator, &mut responder).await.expect("first pairing");
    assert!(result.passed());

    // No removal: a second create_bond reports bonded without re-pairing.
    initiator.create_bond(responder.identity()).await.expect("re-bond");
    initiator.await_bond_outcome(BondOutcome::Bonded).await.expect("bonded again");

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn rogue_prompt_is_reported_as_mismatch() {
    // Just-works pair, but the responder raises a confirmation dialog
    // anyway. Exactly one prediction mismatch, no timeouts.
    let env = SimEnv::with_seed(19);
    let (_, resp_sim, mut initiator, mut responder) = setup(&env).await;

    resp_sim.set_misbehavior(Misbehavior::ForcePrompt(UiPromptKind::YesNo)).await;

    let scenario =
        Scenario::new(config(IoCapability::NoInputNoOutput), config(IoCapability::NoInputNoOutput));
    let result = scenario.run(&mut initiator, &mut responder).await.expect("run");

    assert!(!result.passed());
    assert_eq!(result.timeouts().count(), 0);
    let mismatches: Vec<_> = result.mismatches().collect();
    assert_eq!(mismatches.len(), 1);
    assert!(matches!(
        mismatches[0],
        ScenarioError::PredictionMismatch(Mismatch::Prompt {
            side: Side::Responder,
            expected: UiPromptKind::None,
            observed: UiPromptKind::YesNo,
        })
    ));

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn wrong_prompt_kind_is_reported_as_mismatch() {
    // Initiator should confirm without a value but shows one.
    let env = SimEnv::with_seed(23);
    let (init_sim, _, mut initiator, mut responder) = setup(&env).await;

    init_sim.set_misbehavior(Misbehavior::ForcePrompt(UiPromptKind::YesNoWithValue)).await;

    let scenario =
        Scenario::new(config(IoCapability::DisplayYesNo), config(IoCapability::NoInputNoOutput));
    let result = scenario.run(&mut initiator, &mut responder).await.expect("run");

    assert!(!result.passed());
    assert_eq!(result.timeouts().count(), 0);
    let mismatches: Vec<_> = result.mismatches().collect();
    assert_eq!(mismatches.len(), 1);
    assert!(matches!(
        mismatches[0],
        ScenarioError::PredictionMismatch(Mismatch::Prompt {
            side: Side::Initiator,
            expected: UiPromptKind::YesNo,
            observed: UiPromptKind::YesNoWithValue,
        })
    ));

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn mute_peer_is_reported_as_timeout() {
    // The responder's stack hangs: its predicted prompt never arrives and
    // bonding never completes. Timeouts, not mismatches.
    let env = SimEnv::with_seed(29);
    let (_, resp_sim, mut initiator, mut responder) = setup(&env).await;

    resp_sim.set_misbehavior(Misbehavior::Mute).await;

    let scenario =
        Scenario::new(config(IoCapability::DisplayOnly), config(IoCapability::DisplayYesNo));
    let result = scenario.run(&mut initiator, &mut responder).await.expect("run");

    assert!(!result.passed());
    assert_eq!(result.mismatches().count(), 0);
    assert_eq!(result.timeouts().count(), 2, "failures: {:?}", result.failures);

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn rejected_pairing_surfaces_as_bond_mismatch() {
    // The responder's user says no; the initiator's bond result diverges
    // from the predicted Bonded outcome.
    let env = SimEnv::with_seed(31);
    let (_, _, mut initiator, mut responder) = setup(&env).await;

    let scenario =
        Scenario::new(config(IoCapability::DisplayYesNo), config(IoCapability::DisplayYesNo))
            .with_responses(UiResponses { initiator: true, responder: false });
    let result = scenario.run(&mut initiator, &mut responder).await.expect("run");

    assert!(!result.passed());
    let mismatches: Vec<_> = result.mismatches().collect();
    assert_eq!(mismatches.len(), 1, "failures: {:?}", result.failures);
    assert!(matches!(
        mismatches[0],
        ScenarioError::PredictionMismatch(Mismatch::Bond {
            side: Side::Initiator,
            expected: BondOutcome::Bonded,
            observed: BondOutcome::None,
        })
    ));

    initiator.close();
    responder.close();
}

#[tokio::test(start_paused = true)]
async fn configure_after_bonding_started_fails_fast() {
    let env = SimEnv::with_seed(37);
    let (_, _, mut initiator, mut responder) = setup(&env).await;

    initiator.configure(config(IoCapability::NoInputNoOutput)).await.expect("configure");
    initiator.create_bond(responder.identity()).await.expect("create_bond");

    let err = initiator.configure(config(IoCapability::DisplayYesNo)).await.unwrap_err();
    assert!(matches!(err, ScenarioError::Configuration { .. }));

    initiator.close();
    responder.close();
}
