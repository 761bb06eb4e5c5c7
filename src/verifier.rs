//! Zone liveness verification - the DNS propagation gate core
//!
//! Confirms that a hosted zone is reachable for record creation and that
//! newly created records become resolvable via public DNS within a bounded
//! window. Dependent bootstrap steps (ingress certificate issuance,
//! external-dns) require working DNS, so provisioning blocks on this check.
//!
//! The verification flow:
//!
//! 1. Find the managed zone by exact name; missing zone fails immediately
//! 2. If the liveness record already exists, short-circuit to success
//! 3. Otherwise create a short-TTL TXT probe record
//! 4. Poll both resolution paths until the record resolves or the attempt
//!    bound is exhausted
//!
//! Propagation delay is unbounded in the wild (registrar TTLs, resolver
//! caches), so the verifier cannot guarantee success - it bounds the wait
//! and leaves "exhausted" to the caller to surface as registrar guidance.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::poll::{poll_until, PollError, PollPolicy};
use crate::provider::{DnsProvider, RecordType, ZoneRecord};
use crate::resolver::TxtResolver;
use crate::{Error, Result};

/// Name prefix for the liveness probe record
pub const LIVENESS_RECORD_PREFIX: &str = "kubefirst-liveness";

/// Value carried by the liveness probe record
pub const LIVENESS_RECORD_VALUE: &str = "domain record propagated";

/// TTL of the liveness probe record, in seconds
pub const LIVENESS_RECORD_TTL: u32 = 10;

/// Fully qualified liveness record name for a zone
pub fn liveness_record_name(zone: &str) -> String {
    format!("{LIVENESS_RECORD_PREFIX}.{}.", zone.trim_end_matches('.'))
}

/// Outcome of a successful zone verification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    /// The liveness record was already present in the zone
    AlreadyLive,
    /// The record was created and resolved after the given attempt count
    Propagated {
        /// Resolution attempts made before the record resolved
        attempts: u32,
    },
}

/// Verifies that records created in a hosted zone propagate to public DNS
///
/// All collaborators are injected: the DNS management API, the two
/// resolution paths, and the poll policy. Nothing is read from ambient
/// globals, so tests can substitute every dependency.
pub struct ZoneLivenessVerifier {
    provider: Arc<dyn DnsProvider>,
    primary: Arc<dyn TxtResolver>,
    fallback: Arc<dyn TxtResolver>,
    policy: PollPolicy,
}

impl ZoneLivenessVerifier {
    /// Create a verifier with the default propagation poll policy
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        primary: Arc<dyn TxtResolver>,
        fallback: Arc<dyn TxtResolver>,
    ) -> Self {
        Self {
            provider,
            primary,
            fallback,
            policy: PollPolicy::default(),
        }
    }

    /// Override the poll policy
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Verify that the given zone accepts records and that they propagate
    ///
    /// Blocks (cooperatively) until the liveness record resolves, the
    /// attempt bound is exhausted, or `cancel` fires. Zone-lookup and
    /// record-creation failures are fatal immediately; resolution failures
    /// are absorbed by the polling loop and only the aggregate timeout
    /// escalates.
    pub async fn verify(&self, zone_name: &str, cancel: &CancellationToken) -> Result<Propagation> {
        let zone_name = zone_name.trim_end_matches('.');
        let record_name = liveness_record_name(zone_name);

        let zone = self
            .provider
            .find_zone(zone_name)
            .await?
            .ok_or_else(|| Error::zone_not_found(zone_name))?;

        info!(zone = %zone.name, record = %record_name, "Checking for existing liveness record");

        let records = self.provider.list_records(&zone.id).await?;
        if records.iter().any(|r| r.name == record_name) {
            info!(record = %record_name, "Liveness record already present, skipping creation");
            return Ok(Propagation::AlreadyLive);
        }

        let record = ZoneRecord {
            name: record_name.clone(),
            record_type: RecordType::Txt,
            values: vec![LIVENESS_RECORD_VALUE.to_string()],
            ttl: LIVENESS_RECORD_TTL,
        };

        // A concurrent caller may have created the record between the list
        // and the create; AlreadyExists is the short-circuit path, not a
        // failure.
        match self.provider.create_record(&zone.id, &record).await {
            Ok(outcome) => {
                info!(record = %record_name, ?outcome, "Liveness record creation requested");
            }
            Err(e) => {
                return Err(Error::record_creation_failed(zone_name, e.to_string()));
            }
        }

        let outcome = poll_until(&self.policy, "resolve_liveness_record", cancel, || {
            self.resolve_once(&record_name)
        })
        .await;

        match outcome {
            Ok((values, attempts)) => {
                info!(
                    record = %record_name,
                    attempts,
                    values = ?values,
                    "Liveness record resolved"
                );
                Ok(Propagation::Propagated { attempts })
            }
            Err(PollError::Cancelled { .. }) => Err(Error::Cancelled),
            Err(PollError::Exhausted { attempts, .. }) => Err(Error::ResolutionTimedOut {
                record: record_name,
                attempts,
            }),
        }
    }

    /// One resolution attempt: primary path, then the fallback path
    async fn resolve_once(&self, record_name: &str) -> Result<Vec<String>> {
        match self.primary.lookup_txt(record_name).await {
            Ok(values) if !values.is_empty() => Ok(values),
            Ok(_) | Err(_) => {
                debug!(record = %record_name, "Primary resolver came up empty, trying fallback");
                let values = self.fallback.lookup_txt(record_name).await?;
                if values.is_empty() {
                    return Err(Error::resolver(format!("no TXT records for {record_name}")));
                }
                Ok(values)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CreateOutcome, ManagedZone, MockDnsProvider};
    use crate::resolver::MockTxtResolver;
    use mockall::predicate::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn zone() -> ManagedZone {
        ManagedZone {
            id: "zone-1".to_string(),
            name: "example.com".to_string(),
        }
    }

    fn liveness_record() -> ZoneRecord {
        ZoneRecord {
            name: "kubefirst-liveness.example.com.".to_string(),
            record_type: RecordType::Txt,
            values: vec![LIVENESS_RECORD_VALUE.to_string()],
            ttl: LIVENESS_RECORD_TTL,
        }
    }

    fn resolved_values() -> Vec<String> {
        vec![LIVENESS_RECORD_VALUE.to_string()]
    }

    fn verifier(
        provider: MockDnsProvider,
        primary: MockTxtResolver,
        fallback: MockTxtResolver,
    ) -> ZoneLivenessVerifier {
        ZoneLivenessVerifier::new(Arc::new(provider), Arc::new(primary), Arc::new(fallback))
            .with_policy(PollPolicy::zero_delay(5))
    }

    #[test]
    fn test_record_name_is_prefixed_and_fully_qualified() {
        assert_eq!(
            liveness_record_name("example.com"),
            "kubefirst-liveness.example.com."
        );
        // Trailing dot on the zone does not double up
        assert_eq!(
            liveness_record_name("example.com."),
            "kubefirst-liveness.example.com."
        );
    }

    // ==========================================================================
    // Story: Missing Zone
    //
    // A zone absent from the account is a configuration problem. The call
    // fails immediately with no record creation and no resolution attempts.
    // ==========================================================================

    #[tokio::test]
    async fn when_zone_is_missing_no_create_or_resolve_calls_are_made() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .with(eq("missing.example.com"))
            .times(1)
            .returning(|_| Ok(None));
        provider.expect_list_records().never();
        provider.expect_create_record().never();

        let mut primary = MockTxtResolver::new();
        primary.expect_lookup_txt().never();
        let mut fallback = MockTxtResolver::new();
        fallback.expect_lookup_txt().never();

        let v = verifier(provider, primary, fallback);
        let err = v
            .verify("missing.example.com", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ZoneNotFound { .. }));
    }

    // ==========================================================================
    // Story: Idempotent Short-Circuit
    //
    // If the liveness record already exists the call succeeds without
    // issuing a create request.
    // ==========================================================================

    #[tokio::test]
    async fn when_record_already_exists_creation_is_skipped() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .returning(|_| Ok(Some(zone())));
        provider
            .expect_list_records()
            .with(eq("zone-1"))
            .times(1)
            .returning(|_| Ok(vec![liveness_record()]));
        provider.expect_create_record().never();

        let v = verifier(provider, MockTxtResolver::new(), MockTxtResolver::new());
        let result = v
            .verify("example.com", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, Propagation::AlreadyLive);
    }

    // ==========================================================================
    // Story: Record Creation Parameters
    //
    // The probe record is always the exact same shape: prefixed name with
    // trailing dot, fixed value, TTL 10, type TXT.
    // ==========================================================================

    #[tokio::test]
    async fn when_creating_the_probe_record_parameters_are_exact() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .returning(|_| Ok(Some(zone())));
        provider.expect_list_records().returning(|_| Ok(vec![]));
        provider
            .expect_create_record()
            .with(eq("zone-1"), eq(liveness_record()))
            .times(1)
            .returning(|_, _| Ok(CreateOutcome::Created));

        let mut primary = MockTxtResolver::new();
        primary
            .expect_lookup_txt()
            .with(eq("kubefirst-liveness.example.com."))
            .times(1)
            .returning(|_| Ok(resolved_values()));

        let v = verifier(provider, primary, MockTxtResolver::new());
        let result = v
            .verify("example.com", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, Propagation::Propagated { attempts: 1 });
    }

    // ==========================================================================
    // Story: Concurrent Callers
    //
    // A duplicate create from a racing caller is benign - the record is
    // there, so polling proceeds normally.
    // ==========================================================================

    #[tokio::test]
    async fn when_a_racing_caller_created_the_record_first_verification_proceeds() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .returning(|_| Ok(Some(zone())));
        provider.expect_list_records().returning(|_| Ok(vec![]));
        provider
            .expect_create_record()
            .returning(|_, _| Ok(CreateOutcome::AlreadyExists));

        let mut primary = MockTxtResolver::new();
        primary
            .expect_lookup_txt()
            .returning(|_| Ok(resolved_values()));

        let v = verifier(provider, primary, MockTxtResolver::new());
        let result = v
            .verify("example.com", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, Propagation::Propagated { attempts: 1 });
    }

    // ==========================================================================
    // Story: Creation Failure
    //
    // A provider rejection (permissions, API outage) is fatal with no
    // resolution attempts - retrying a permission error wastes the budget.
    // ==========================================================================

    #[tokio::test]
    async fn when_creation_fails_the_error_is_fatal_and_no_polling_happens() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .returning(|_| Ok(Some(zone())));
        provider.expect_list_records().returning(|_| Ok(vec![]));
        provider
            .expect_create_record()
            .returning(|_, _| Err(Error::provider("403 forbidden")));

        let mut primary = MockTxtResolver::new();
        primary.expect_lookup_txt().never();
        let mut fallback = MockTxtResolver::new();
        fallback.expect_lookup_txt().never();

        let v = verifier(provider, primary, fallback);
        let err = v
            .verify("example.com", &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::RecordCreationFailed { zone, reason } => {
                assert_eq!(zone, "example.com");
                assert!(reason.contains("403 forbidden"));
            }
            other => panic!("expected RecordCreationFailed, got {other:?}"),
        }
    }

    // ==========================================================================
    // Story: Dual-Resolver Fallback
    //
    // The fallback path is queried on every attempt where the primary comes
    // up empty; success on the fallback ends the poll.
    // ==========================================================================

    #[tokio::test]
    async fn when_primary_fails_the_fallback_is_queried_each_attempt() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .returning(|_| Ok(Some(zone())));
        provider.expect_list_records().returning(|_| Ok(vec![]));
        provider
            .expect_create_record()
            .returning(|_, _| Ok(CreateOutcome::Created));

        let mut primary = MockTxtResolver::new();
        primary
            .expect_lookup_txt()
            .times(3)
            .returning(|_| Err(Error::resolver("primary cache cold")));

        let fallback_calls = Arc::new(AtomicU32::new(0));
        let calls = fallback_calls.clone();
        let mut fallback = MockTxtResolver::new();
        fallback.expect_lookup_txt().times(3).returning(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::resolver("fallback cache cold"))
            } else {
                Ok(resolved_values())
            }
        });

        let v = verifier(provider, primary, fallback);
        let result = v
            .verify("example.com", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, Propagation::Propagated { attempts: 3 });
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn when_primary_returns_empty_set_fallback_is_consulted() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .returning(|_| Ok(Some(zone())));
        provider.expect_list_records().returning(|_| Ok(vec![]));
        provider
            .expect_create_record()
            .returning(|_, _| Ok(CreateOutcome::Created));

        let mut primary = MockTxtResolver::new();
        primary.expect_lookup_txt().times(1).returning(|_| Ok(vec![]));

        let mut fallback = MockTxtResolver::new();
        fallback
            .expect_lookup_txt()
            .times(1)
            .returning(|_| Ok(resolved_values()));

        let v = verifier(provider, primary, fallback);
        let result = v
            .verify("example.com", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, Propagation::Propagated { attempts: 1 });
    }

    // ==========================================================================
    // Story: Bounded Exhaustion
    //
    // With both resolvers persistently failing, the poll makes exactly the
    // configured number of attempts then reports a timeout.
    // ==========================================================================

    #[tokio::test]
    async fn when_both_resolvers_always_fail_the_bound_terminates_the_poll() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .returning(|_| Ok(Some(zone())));
        provider.expect_list_records().returning(|_| Ok(vec![]));
        provider
            .expect_create_record()
            .returning(|_, _| Ok(CreateOutcome::Created));

        let mut primary = MockTxtResolver::new();
        primary
            .expect_lookup_txt()
            .times(5)
            .returning(|_| Err(Error::resolver("no answer")));
        let mut fallback = MockTxtResolver::new();
        fallback
            .expect_lookup_txt()
            .times(5)
            .returning(|_| Err(Error::resolver("no answer")));

        let v = verifier(provider, primary, fallback);
        let err = v
            .verify("example.com", &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::ResolutionTimedOut { record, attempts } => {
                assert_eq!(record, "kubefirst-liveness.example.com.");
                assert_eq!(attempts, 5);
            }
            other => panic!("expected ResolutionTimedOut, got {other:?}"),
        }
    }

    // ==========================================================================
    // Story: Cancellation
    //
    // The caller can abort the wait instead of sitting out the full bound.
    // ==========================================================================

    #[tokio::test]
    async fn when_the_caller_cancels_the_wait_aborts_promptly() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_find_zone()
            .returning(|_| Ok(Some(zone())));
        provider.expect_list_records().returning(|_| Ok(vec![]));
        provider
            .expect_create_record()
            .returning(|_, _| Ok(CreateOutcome::Created));

        let mut primary = MockTxtResolver::new();
        primary
            .expect_lookup_txt()
            .returning(|_| Err(Error::resolver("no answer")));
        let mut fallback = MockTxtResolver::new();
        fallback
            .expect_lookup_txt()
            .returning(|_| Err(Error::resolver("no answer")));

        let cancel = CancellationToken::new();
        cancel.cancel();

        // Long interval: only cancellation can end the wait in test time
        let v = ZoneLivenessVerifier::new(
            Arc::new(provider),
            Arc::new(primary),
            Arc::new(fallback),
        )
        .with_policy(PollPolicy::new(100, std::time::Duration::from_secs(3600)));

        let err = v.verify("example.com", &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
