//! DNS provider abstraction layer
//!
//! This module provides a trait-based abstraction over DNS management APIs.
//! The verifier only needs three operations - find a zone, list its records,
//! create a record - so that is the whole surface. Each backend implements
//! the [`DnsProvider`] trait.
//!
//! # Supported Providers
//!
//! - [`MemoryProvider`] - in-memory provider for local development and tests
//!
//! Cloud backends (Cloudflare, Route 53, Cloud DNS) are selected through the
//! same factory but are wired up by adjacent modules that own the SDK
//! clients and credentials.

mod memory;

pub use memory::MemoryProvider;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// DNS record types the provider surface understands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name record
    Cname,
    /// Nameserver record
    Ns,
    /// Text record
    Txt,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Ns => "NS",
            RecordType::Txt => "TXT",
        };
        f.write_str(s)
    }
}

/// A hosted zone as reported by the managing provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedZone {
    /// Provider-assigned zone identifier
    pub id: String,
    /// Zone name without trailing dot (e.g., "example.com")
    pub name: String,
}

/// A record set within a hosted zone
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRecord {
    /// Fully qualified record name with trailing dot
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Record data values
    pub values: Vec<String>,
    /// Time-to-live in seconds
    pub ttl: u32,
}

/// Result of a create-record request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The record was created
    Created,
    /// A record with the same name and type already exists
    ///
    /// Callers racing on the same zone treat this as benign: the record
    /// they wanted is there.
    AlreadyExists,
}

/// DNS provider management API trait
///
/// This trait abstracts the managing provider (Cloudflare, Route 53, Cloud
/// DNS, ...) behind the three operations zone verification needs. The
/// caller is assumed to already be authenticated; credential handling
/// belongs to the module that constructs the concrete provider.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Find a hosted zone by exact name match
    ///
    /// Returns `Ok(None)` when no zone with that exact name is managed by
    /// the authenticated account. Matching is exact, not substring: a zone
    /// sharing a suffix with another must never be picked up by mistake.
    async fn find_zone(&self, name: &str) -> Result<Option<ManagedZone>>;

    /// List all record sets in the given zone
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ZoneRecord>>;

    /// Create a record set in the given zone
    ///
    /// Duplicate creation (same name and type) reports
    /// [`CreateOutcome::AlreadyExists`] rather than an error.
    async fn create_record(&self, zone_id: &str, record: &ZoneRecord) -> Result<CreateOutcome>;
}

/// The type of DNS provider backing a zone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// In-memory provider for local development and tests
    Memory,
    /// Cloudflare DNS
    Cloudflare,
    /// AWS Route 53
    Route53,
    /// Google Cloud DNS
    CloudDns,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderType::Memory => "memory",
            ProviderType::Cloudflare => "cloudflare",
            ProviderType::Route53 => "route53",
            ProviderType::CloudDns => "clouddns",
        };
        f.write_str(s)
    }
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "memory" => Ok(ProviderType::Memory),
            "cloudflare" => Ok(ProviderType::Cloudflare),
            "route53" => Ok(ProviderType::Route53),
            "clouddns" => Ok(ProviderType::CloudDns),
            other => Err(Error::provider(format!("unknown provider type: {other}"))),
        }
    }
}

/// Create a provider instance for the given provider type
///
/// # Returns
///
/// A shared provider instance, or an error if the provider type is not
/// supported by this build.
pub fn create_provider(provider_type: ProviderType) -> Result<Arc<dyn DnsProvider>> {
    match provider_type {
        ProviderType::Memory => Ok(Arc::new(MemoryProvider::new())),
        ProviderType::Cloudflare => Err(Error::provider(
            "cloudflare provider not yet implemented".to_string(),
        )),
        ProviderType::Route53 => Err(Error::provider(
            "route53 provider not yet implemented".to_string(),
        )),
        ProviderType::CloudDns => Err(Error::provider(
            "clouddns provider not yet implemented".to_string(),
        )),
    }
}
