//! Zonegate - DNS propagation gate for cluster bootstrap pipelines
//!
//! Zonegate verifies that a hosted DNS zone is reachable for record
//! creation and that freshly created records become resolvable via public
//! DNS within a bounded window. Provisioning pipelines use it as a blocking
//! readiness gate before steps that need working DNS (ingress certificate
//! issuance, external-dns integration).
//!
//! # How it works
//!
//! A short-TTL TXT probe record is created in the zone (or found already
//! present), then polled through two independent resolution paths - the
//! system resolver and a pinned public resolver - on a fixed interval up to
//! a bounded attempt count. Resolver failures are retried; zone-lookup and
//! record-creation failures are fatal immediately.
//!
//! # Modules
//!
//! - [`verifier`] - The zone liveness verification core
//! - [`provider`] - DNS management API abstraction (find zone, list/create records)
//! - [`resolver`] - TXT resolution capabilities (system + public fallback)
//! - [`poll`] - Bounded fixed-interval polling with cancellation
//! - [`bootstrap`] - The pipeline-facing readiness gate
//! - [`error`] - Error types with operator remediation guidance

#![deny(missing_docs)]

pub mod bootstrap;
pub mod error;
pub mod poll;
pub mod provider;
pub mod resolver;
pub mod verifier;

pub use error::Error;
pub use verifier::{Propagation, ZoneLivenessVerifier};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
