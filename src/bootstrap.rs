//! DNS readiness gate for cluster bootstrap pipelines
//!
//! Cluster provisioning is a sequential flow; steps that depend on working
//! public DNS (ingress certificate issuance, external-dns) must not start
//! until the hosted zone demonstrably propagates records. [`DnsGate`] is
//! the blocking step that enforces this:
//!
//! 1. Run zone liveness verification against the configured zone
//! 2. On success, report how the zone proved live and let the pipeline
//!    continue
//! 3. On any fatal outcome, halt with the error plus remediation guidance
//!    for the operator
//!
//! # Example
//!
//! ```ignore
//! use zonegate::bootstrap::DnsGate;
//! use tokio_util::sync::CancellationToken;
//!
//! let gate = DnsGate::new("example.com", verifier);
//! let report = gate.run(&CancellationToken::new()).await?;
//! println!("zone {} live after {:?}", report.zone, report.elapsed);
//! ```

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::verifier::{Propagation, ZoneLivenessVerifier};
use crate::Result;

/// Report of a completed gate run, for pipeline logs
#[derive(Clone, Debug)]
pub struct GateReport {
    /// The zone that was verified
    pub zone: String,
    /// How the zone proved live
    pub outcome: Propagation,
    /// Wall-clock time spent in the gate
    pub elapsed: Duration,
}

/// The blocking DNS readiness step in a bootstrap pipeline
pub struct DnsGate {
    zone: String,
    verifier: ZoneLivenessVerifier,
}

impl DnsGate {
    /// Create a gate for the given zone
    pub fn new(zone: impl Into<String>, verifier: ZoneLivenessVerifier) -> Self {
        Self {
            zone: zone.into(),
            verifier,
        }
    }

    /// Run the gate with an overall deadline on top of the attempt bound
    ///
    /// The deadline bounds the gate independently of attempts × interval:
    /// when it expires the wait is cancelled and the gate reports
    /// [`Error::Cancelled`]. The caller's token still aborts the gate early
    /// in either case. With `None` this is identical to [`DnsGate::run`].
    pub async fn run_with_timeout(
        &self,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<GateReport> {
        let Some(limit) = timeout else {
            return self.run(cancel).await;
        };

        // Child token: expires on the deadline, still follows the parent
        let deadline = cancel.child_token();
        let guard = deadline.clone();
        let zone = self.zone.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            error!(zone = %zone, timeout_secs = limit.as_secs(), "DNS gate deadline expired");
            guard.cancel();
        });

        let result = self.run(&deadline).await;
        timer.abort();
        result
    }

    /// Block until the zone is verified live, the wait is exhausted, or the
    /// caller cancels
    ///
    /// Fatal errors are logged together with their remediation text before
    /// propagating, so the operator sees actionable guidance even when the
    /// calling pipeline only surfaces the error chain.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<GateReport> {
        let start = Instant::now();
        info!(zone = %self.zone, "Waiting for DNS zone to prove live");

        match self.verifier.verify(&self.zone, cancel).await {
            Ok(outcome) => {
                let elapsed = start.elapsed();
                match outcome {
                    Propagation::AlreadyLive => {
                        info!(zone = %self.zone, "Zone already live, gate passed");
                    }
                    Propagation::Propagated { attempts } => {
                        info!(
                            zone = %self.zone,
                            attempts,
                            elapsed_secs = elapsed.as_secs(),
                            "Zone propagation confirmed, gate passed"
                        );
                    }
                }
                Ok(GateReport {
                    zone: self.zone.clone(),
                    outcome,
                    elapsed,
                })
            }
            Err(e) => {
                match e.remediation() {
                    Some(guidance) => {
                        error!(zone = %self.zone, error = %e, guidance, "DNS gate failed");
                    }
                    None => {
                        error!(zone = %self.zone, error = %e, "DNS gate did not complete");
                    }
                }
                Err(e)
            }
        }
    }
}
