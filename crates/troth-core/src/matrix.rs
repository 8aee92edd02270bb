//! Combinatorial matrix driver.
//!
//! Enumerates the cartesian product of the implemented configuration axes
//! for both sides and runs one scenario per point, strictly sequentially:
//! both sides of a scenario mutate one shared bonding relationship, so no
//! two scenarios may overlap. Between points the driver removes the bond on
//! both sides and waits for link quiescence, so a failure in one
//! combination cannot contaminate the next.

use std::sync::Arc;
use std::time::Duration;

use troth_proto::{AuthRequirement, IoCapability, OobPresence, PeerConfig};

use crate::env::Environment;
use crate::error::{ScenarioError, Side};
use crate::peer::{PeerHandle, SecurityPeer};
use crate::scenario::{Scenario, ScenarioResult};

/// Timing knobs for a matrix run.
#[derive(Debug, Clone, Copy)]
pub struct MatrixConfig {
    /// Bound on every event wait inside a scenario.
    pub event_timeout: Duration,
    /// Bound on the post-removal link-teardown wait.
    pub settle_timeout: Duration,
    /// Fixed delay applied only when the service never reports link events.
    pub settle_fallback: Duration,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            event_timeout: Duration::from_secs(5),
            settle_timeout: Duration::from_secs(1),
            settle_fallback: Duration::from_millis(100),
        }
    }
}

/// One point of the configuration matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixPoint {
    /// Position in the deterministic enumeration order.
    pub index: usize,
    /// Initiator-side configuration.
    pub initiator: PeerConfig,
    /// Responder-side configuration.
    pub responder: PeerConfig,
}

/// Aggregated outcome of a matrix run.
#[derive(Debug, Clone)]
pub struct MatrixReport {
    /// Number of points executed.
    pub total: usize,
    /// Every failing point with its collected failures.
    pub failures: Vec<(MatrixPoint, ScenarioResult)>,
}

impl MatrixReport {
    /// True when every point passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total prediction mismatches across all failing points.
    #[must_use]
    pub fn mismatch_count(&self) -> usize {
        self.failures.iter().map(|(_, r)| r.mismatches().count()).sum()
    }

    /// Total timeouts across all failing points.
    #[must_use]
    pub fn timeout_count(&self) -> usize {
        self.failures.iter().map(|(_, r)| r.timeouts().count()).sum()
    }
}

/// The full iterated matrix, in its fixed enumeration order: initiator
/// io → auth → oob, then responder io → auth → oob. Only implemented
/// enumeration members participate, so the order is reproducible across
/// runs and failure reports can name a point by index.
#[must_use]
pub fn matrix_points() -> Vec<MatrixPoint> {
    let mut points = Vec::new();
    for init_io in IoCapability::IMPLEMENTED {
        for init_auth in AuthRequirement::ALL {
            for init_oob in OobPresence::IMPLEMENTED {
                for resp_io in IoCapability::IMPLEMENTED {
                    for resp_auth in AuthRequirement::ALL {
                        for resp_oob in OobPresence::IMPLEMENTED {
                            points.push(MatrixPoint {
                                index: points.len(),
                                initiator: PeerConfig {
                                    io: init_io,
                                    auth_req: init_auth,
                                    oob: init_oob,
                                },
                                responder: PeerConfig {
                                    io: resp_io,
                                    auth_req: resp_auth,
                                    oob: resp_oob,
                                },
                            });
                        }
                    }
                }
            }
        }
    }
    points
}

/// Sequences scenarios over the full implemented configuration matrix.
pub struct MatrixDriver<E: Environment> {
    env: E,
    config: MatrixConfig,
}

impl<E: Environment> MatrixDriver<E> {
    /// Create a driver with the given environment and timing knobs.
    pub fn new(env: E, config: MatrixConfig) -> Self {
        Self { env, config }
    }

    /// Run every matrix point against the given peer pair.
    ///
    /// Each point gets freshly-scoped handles (new subscriptions, no
    /// residual state) and is followed by unconditional bond removal on
    /// both sides plus a bounded quiescence wait. Scenario failures are
    /// collected; they never abort the remaining points.
    ///
    /// # Errors
    ///
    /// Hard failures only (service breakage, illegal ordering); these abort
    /// the run since later points could not be trusted.
    pub async fn run(
        &self,
        initiator_service: Arc<dyn SecurityPeer>,
        responder_service: Arc<dyn SecurityPeer>,
    ) -> Result<MatrixReport, ScenarioError> {
        let points = matrix_points();
        let total = points.len();
        tracing::info!(total, "matrix run starting");

        let mut failures = Vec::new();

        for point in points {
            tracing::info!(
                index = point.index,
                total,
                init_io = ?point.initiator.io,
                init_auth = ?point.initiator.auth_req,
                resp_io = ?point.responder.io,
                resp_auth = ?point.responder.auth_req,
                "running matrix point"
            );

            let mut initiator = PeerHandle::connect(
                Arc::clone(&initiator_service),
                Side::Initiator,
                self.config.event_timeout,
            )
            .await?;
            let mut responder = PeerHandle::connect(
                Arc::clone(&responder_service),
                Side::Responder,
                self.config.event_timeout,
            )
            .await?;

            let scenario = Scenario::new(point.initiator, point.responder);
            let outcome = scenario.run(&mut initiator, &mut responder).await;

            // Isolation runs regardless of the point's outcome.
            let isolation = self.isolate(&mut initiator, &mut responder).await;

            initiator.close();
            responder.close();

            let result = outcome?;
            isolation?;

            if !result.passed() {
                failures.push((point, result));
            }
        }

        let report = MatrixReport { total, failures };
        tracing::info!(
            total,
            failed = report.failures.len(),
            mismatches = report.mismatch_count(),
            timeouts = report.timeout_count(),
            "matrix run finished"
        );
        Ok(report)
    }

    /// Remove the bond on both sides and wait for the link to settle.
    async fn isolate(
        &self,
        initiator: &mut PeerHandle,
        responder: &mut PeerHandle,
    ) -> Result<(), ScenarioError> {
        let initiator_id = initiator.identity();
        let responder_id = responder.identity();

        initiator.remove_bond(responder_id).await?;
        responder.remove_bond(initiator_id).await?;

        if !initiator.await_link_down(responder_id, self.config.settle_timeout).await {
            tracing::debug!("no link-down event, using fixed settle delay");
            self.env.sleep(self.config.settle_fallback).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_has_324_points() {
        // 3 io × 6 auth × 1 oob per side, squared.
        assert_eq!(matrix_points().len(), 324);
    }

    #[test]
    fn enumeration_order_is_deterministic() {
        assert_eq!(matrix_points(), matrix_points());
    }

    #[test]
    fn indexes_are_sequential() {
        for (i, point) in matrix_points().iter().enumerate() {
            assert_eq!(point.index, i);
        }
    }

    #[test]
    fn keyboard_only_is_never_iterated() {
        for point in matrix_points() {
            assert_ne!(point.initiator.io, IoCapability::KeyboardOnly);
            assert_ne!(point.responder.io, IoCapability::KeyboardOnly);
        }
    }

    #[test]
    fn first_point_is_all_first_members() {
        let first = matrix_points().remove(0);
        assert_eq!(first.initiator.io, IoCapability::DisplayOnly);
        assert_eq!(first.initiator.auth_req, AuthRequirement::NoBonding);
        assert_eq!(first.initiator.oob, OobPresence::NotPresent);
        assert_eq!(first.initiator, first.responder);
    }
}
