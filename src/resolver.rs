//! TXT resolution capabilities for propagation checks
//!
//! Two independent resolution paths are used when polling for a freshly
//! created record: the system resolver (whatever the host is configured
//! with) and a pinned public resolver. The fallback hedges against the
//! primary's cache or network path being unable to see a record that a
//! different resolver already can.

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
#[cfg(test)]
use mockall::automock;

use crate::Error;

/// A TXT lookup capability
///
/// An empty result set is reported as an error: for propagation purposes a
/// name that resolves to nothing has not propagated.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// Look up the TXT values for a fully qualified record name
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, Error>;
}

async fn lookup_with(resolver: &TokioAsyncResolver, name: &str) -> Result<Vec<String>, Error> {
    let lookup = resolver
        .txt_lookup(name)
        .await
        .map_err(|e| Error::resolver(format!("TXT lookup for {name} failed: {e}")))?;

    let values: Vec<String> = lookup.iter().map(|txt| txt.to_string()).collect();
    if values.is_empty() {
        return Err(Error::resolver(format!("no TXT records for {name}")));
    }
    Ok(values)
}

/// Resolver using the host's system DNS configuration
pub struct SystemResolver {
    inner: TokioAsyncResolver,
}

impl SystemResolver {
    /// Create a resolver from /etc/resolv.conf (or platform equivalent)
    pub fn from_system_conf() -> Result<Self, Error> {
        let inner = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| Error::resolver(format!("failed to read system resolver config: {e}")))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl TxtResolver for SystemResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, Error> {
        lookup_with(&self.inner, name).await
    }
}

/// Resolver pinned to a fixed public DNS service
///
/// Used as the fallback path when the system resolver cannot see a record.
pub struct PublicResolver {
    inner: TokioAsyncResolver,
}

impl PublicResolver {
    /// Create a resolver pointed at Google Public DNS
    pub fn new() -> Self {
        let inner = TokioAsyncResolver::tokio(ResolverConfig::google(), ResolverOpts::default());
        Self { inner }
    }
}

impl Default for PublicResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TxtResolver for PublicResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, Error> {
        lookup_with(&self.inner, name).await
    }
}
