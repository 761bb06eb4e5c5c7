//! Error types for zone liveness verification

use thiserror::Error;

/// Main error type for zonegate operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The hosted zone does not exist under the authenticated account
    #[error("hosted zone not found: {zone}")]
    ZoneNotFound {
        /// The zone name that was requested
        zone: String,
    },

    /// The liveness record could not be created in the zone
    #[error("record creation failed in zone {zone}: {reason}")]
    RecordCreationFailed {
        /// The zone the record was to be created in
        zone: String,
        /// Why the provider rejected the creation
        reason: String,
    },

    /// The liveness record never became resolvable within the poll bound
    #[error("record {record} did not resolve after {attempts} attempts")]
    ResolutionTimedOut {
        /// Fully qualified record name that was polled
        record: String,
        /// Number of resolution attempts made before giving up
        attempts: u32,
    },

    /// DNS provider management API error
    #[error("provider error: {0}")]
    Provider(String),

    /// DNS resolution error
    #[error("resolver error: {0}")]
    Resolver(String),

    /// Verification was aborted by the caller
    #[error("verification cancelled")]
    Cancelled,
}

impl Error {
    /// Create a provider error with the given message
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a resolver error with the given message
    pub fn resolver(msg: impl Into<String>) -> Self {
        Self::Resolver(msg.into())
    }

    /// Create a zone-not-found error for the given zone
    pub fn zone_not_found(zone: impl Into<String>) -> Self {
        Self::ZoneNotFound { zone: zone.into() }
    }

    /// Create a record-creation error for the given zone
    pub fn record_creation_failed(zone: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RecordCreationFailed {
            zone: zone.into(),
            reason: reason.into(),
        }
    }

    /// Operator-facing remediation guidance for fatal outcomes
    ///
    /// The calling bootstrap pipeline halts on any fatal error and prints
    /// this text so the operator knows what to fix. Transient failures are
    /// absorbed inside the polling loop and never reach here.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::ZoneNotFound { .. } => Some(
                "verify the hosted zone exists in your DNS provider account \
                 and that your credentials can see it",
            ),
            Self::RecordCreationFailed { .. } => Some(
                "verify your DNS provider credentials have permission to \
                 create records in this zone",
            ),
            Self::ResolutionTimedOut { .. } => Some(
                "check the nameserver delegation for this domain at your \
                 registrar - the zone's NS records may not point at your \
                 DNS provider",
            ),
            _ => None,
        }
    }
}
