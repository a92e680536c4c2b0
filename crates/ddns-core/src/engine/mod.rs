//! Core DDNS engine
//!
//! The DdnsEngine performs one synchronization run:
//! - Resolving the current address of each enabled family via IpSource
//! - Consulting the change cache to decide whether anything changed
//! - Reconciling every configured domain via DnsProvider
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  IpSource   │────▶│  DdnsEngine  │────▶│ DnsProvider │
//! │ (resolve)   │     └──────────────┘     │ (reconcile) │
//! └─────────────┘             │            └─────────────┘
//!                             ▼
//!                     ┌──────────────┐
//!                     │  CacheStore  │
//!                     │ (skip/commit)│
//!                     └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. With a cache: load it, resolve every enabled family, stop with
//!    [`RunOutcome::NothingToDo`] when nothing changed, otherwise commit the
//!    fresh snapshot
//! 2. For each enabled family (IPv4 then IPv6), reconcile the configured
//!    domains in order
//!
//! Address resolution and cache I/O failures abort the run. A failed domain
//! is logged and the next one is attempted.
//!
//! Scheduling is external (timer, cron): the engine never loops, sleeps or
//! retries.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::cache::CacheState;
use crate::config::{AddressFamily, DdnsConfig};
use crate::error::Result;
use crate::traits::{
    AddressRecord, CacheStore, DnsProvider, IpSource, ReconcileOutcome, ReconciliationTarget,
};

/// What a run ended up doing
#[derive(Debug)]
pub enum RunOutcome {
    /// Cached snapshot matched, no provider call was made
    NothingToDo,

    /// Domains were reconciled, one report per domain in processing order
    Reconciled(Vec<DomainReport>),
}

impl RunOutcome {
    /// Per-domain reports (empty when nothing was done)
    pub fn reports(&self) -> &[DomainReport] {
        match self {
            RunOutcome::NothingToDo => &[],
            RunOutcome::Reconciled(reports) => reports,
        }
    }

    /// Number of domains whose reconciliation failed
    pub fn failures(&self) -> usize {
        self.reports().iter().filter(|r| r.result.is_err()).count()
    }
}

/// Result of reconciling one domain
#[derive(Debug)]
pub struct DomainReport {
    /// Family the domain was reconciled for
    pub family: AddressFamily,
    /// Domain name
    pub domain: String,
    /// Address pushed to the provider
    pub address: String,
    /// Provider outcome, or the error that was logged
    pub result: Result<ReconcileOutcome>,
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Call [`DdnsEngine::run_once()`]
/// 3. Drop
///
/// ## Threading
///
/// Everything is sequential: one family at a time, one domain at a time,
/// one provider call at a time.
pub struct DdnsEngine {
    /// IP source for resolving addresses
    ip_source: Box<dyn IpSource>,

    /// DNS provider for reconciling records
    provider: Box<dyn DnsProvider>,

    /// Change cache, `None` when caching is disabled
    cache: Option<Box<dyn CacheStore>>,

    /// Run configuration
    config: DdnsConfig,

    /// Config file modification time, `None` without a config file
    mod_time: Option<DateTime<Utc>>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `cache`: Change cache, or `None` to reconcile unconditionally
    /// - `config`: Run configuration
    /// - `mod_time`: Modification time of the config file, if one was used
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        cache: Option<Box<dyn CacheStore>>,
        config: DdnsConfig,
        mod_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            ip_source,
            provider,
            cache,
            config,
            mod_time,
        }
    }

    /// Perform one synchronization run
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome)`: The run completed; individual domains may still
    ///   have failed (see [`DomainReport::result`])
    /// - `Err(Error)`: Fatal error (address resolution or cache I/O)
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let families = self.config.enabled_families();
        let mut ipv4: Option<AddressRecord> = None;
        let mut ipv6: Option<AddressRecord> = None;

        if let Some(cache) = &self.cache {
            let cached = cache.load().await?;

            for family in &families {
                let address = self.resolve(*family).await?;
                match family {
                    AddressFamily::V4 => ipv4 = Some(address),
                    AddressFamily::V6 => ipv6 = Some(address),
                }
            }

            let candidate = CacheState::new(
                ipv4.as_ref().map(|a| a.value.as_str()).unwrap_or_default(),
                ipv6.as_ref().map(|a| a.value.as_str()).unwrap_or_default(),
                self.mod_time,
            );

            if !cached.needs_update(&candidate.ipv4, &candidate.ipv6, candidate.mod_time) {
                debug!("Cached snapshot is current, skipping provider calls");
                return Ok(RunOutcome::NothingToDo);
            }

            debug!("Change detected, committing new cache snapshot");
            cache.commit(&candidate).await?;
        }

        let mut reports = Vec::new();
        for family in families {
            let cached_address = match family {
                AddressFamily::V4 => ipv4.take(),
                AddressFamily::V6 => ipv6.take(),
            };
            let address = match cached_address {
                Some(address) => address,
                None => self.resolve(family).await?,
            };

            for domain in self.config.domains_for(family) {
                reports.push(self.reconcile_domain(&address, domain).await);
            }
        }

        Ok(RunOutcome::Reconciled(reports))
    }

    /// Resolve one family, logging the underlying cause on failure
    async fn resolve(&self, family: AddressFamily) -> Result<AddressRecord> {
        match self.ip_source.current(family).await {
            Ok(address) => {
                debug!(
                    "Resolved {} address via {}: {}",
                    family,
                    self.ip_source.source_name(),
                    address.value
                );
                Ok(address)
            }
            Err(e) => {
                match std::error::Error::source(&e) {
                    Some(cause) => error!(
                        "{} address resolution via {} failed: {}",
                        family,
                        self.ip_source.source_name(),
                        cause
                    ),
                    None => error!("{} address resolution failed: {}", family, e),
                }
                Err(e)
            }
        }
    }

    /// Reconcile a single domain, never failing the run
    async fn reconcile_domain(&self, address: &AddressRecord, domain: &str) -> DomainReport {
        info!("Updating {} to {}...", domain, address.value);

        let target =
            ReconciliationTarget::new(address.family.record_type(), domain, &address.value)
                .with_ttl(self.config.ttl)
                .with_proxied(self.config.proxied);

        let result = self.provider.reconcile(&target).await;
        match &result {
            Ok(outcome) => debug!(
                "Reconciled {} via {}: {:?}",
                domain,
                self.provider.provider_name(),
                outcome
            ),
            Err(e) => warn!("Failed to update {}: {}", domain, e),
        }

        DomainReport {
            family: address.family,
            domain: domain.to_string(),
            address: address.value.clone(),
            result,
        }
    }
}
