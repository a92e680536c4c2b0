// # DNS Provider Trait
//
// Defines the interface for reconciling DNS records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, RecordType, ReconciliationTarget};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let target = ReconciliationTarget::new(RecordType::A, "home.example.com", "203.0.113.7");
//     provider.reconcile(&target).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::RecordType;

/// The desired state of one DNS record
///
/// Constructed once per domain per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationTarget {
    /// A or AAAA
    pub record_type: RecordType,
    /// Fully qualified record name
    pub domain_name: String,
    /// Desired record content (the address)
    pub desired_content: String,
    /// Record TTL, 0 means provider default
    pub ttl: u32,
    /// Route traffic through the provider's edge
    pub proxied: bool,
}

impl ReconciliationTarget {
    /// Create a target with default TTL and no proxying
    pub fn new(
        record_type: RecordType,
        domain_name: impl Into<String>,
        desired_content: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            domain_name: domain_name.into(),
            desired_content: desired_content.into(),
            ttl: 0,
            proxied: false,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the proxied flag
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }
}

/// Result of a reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The record did not exist; it was created and then updated
    Created {
        /// Id of the new record
        record_id: String,
    },
    /// An existing record was updated
    Updated {
        /// Id of the updated record
        record_id: String,
    },
}

impl ReconcileOutcome {
    /// Id of the record that now holds the desired content
    pub fn record_id(&self) -> &str {
        match self {
            ReconcileOutcome::Created { record_id } | ReconcileOutcome::Updated { record_id } => {
                record_id
            }
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Contract
///
/// Given a [`ReconciliationTarget`], make sure a record with that name exists
/// in the matching zone and carries the desired content.
///
/// - The provider is the source of truth for existence. Zone and record ids
///   must not be cached between calls.
/// - No retries or backoff. Return the error; the engine logs it and moves
///   on to the next domain.
/// - Provider-reported failures map to [`crate::Error::Provider`], unexpected
///   response bodies to [`crate::Error::MalformedResponse`], a missing zone to
///   [`crate::Error::ZoneNotFound`].
///
/// Repeating a reconciliation with the same target converges to the same
/// provider-side state.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Ensure the record described by `target` exists with the desired content
    async fn reconcile(
        &self,
        target: &ReconciliationTarget,
    ) -> Result<ReconcileOutcome, crate::Error>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
