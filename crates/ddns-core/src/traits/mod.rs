//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Resolve the current address of a family
//! - [`DnsProvider`]: Reconcile DNS records via provider APIs
//! - [`CacheStore`]: Persist the last reconciled snapshot

pub mod cache_store;
pub mod dns_provider;
pub mod ip_source;

pub use cache_store::CacheStore;
pub use dns_provider::{DnsProvider, ReconcileOutcome, ReconciliationTarget};
pub use ip_source::{AddressRecord, IpSource};
