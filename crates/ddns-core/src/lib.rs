// # ddns-core
//
// Core library for the one-shot DDNS synchronizer.
//
// ## Architecture Overview
//
// This library provides the change-detection-and-reconciliation pipeline:
// - **IpSource**: Trait for resolving the current IPv4/IPv6 address
// - **CacheStore**: Trait for the last reconciled snapshot (change cache)
// - **DnsProvider**: Trait for reconciling DNS records via provider APIs
// - **DdnsEngine**: Runs one resolve → compare → reconcile pass
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Externally Scheduled**: One run per invocation, no loops or retries
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: Repeated runs converge to the same provider state

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod traits;

// Re-export core types for convenience
pub use cache::{CacheState, ChangeCache, MemoryCache};
pub use config::{AddressFamily, DdnsConfig, FileConfig, IpSourceKind, RecordType};
pub use engine::{DdnsEngine, DomainReport, RunOutcome};
pub use error::{Error, Result};
pub use traits::{
    AddressRecord, CacheStore, DnsProvider, IpSource, ReconcileOutcome, ReconciliationTarget,
};
