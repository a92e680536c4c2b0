//! Test doubles and common utilities for engine contract tests
//!
//! This module provides minimal test doubles that record how the engine
//! drives its collaborators.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::{
    AddressFamily, AddressRecord, CacheState, CacheStore, DdnsConfig, DnsProvider, IpSource,
    ReconcileOutcome, ReconciliationTarget,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An IpSource returning fixed addresses per family
#[derive(Clone)]
pub struct StaticIpSource {
    ipv4: Option<String>,
    ipv6: Option<String>,
    /// Call counter for current()
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    /// Create a source; `None` makes that family fail
    pub fn new(ipv4: Option<&str>, ipv6: Option<&str>) -> Self {
        Self {
            ipv4: ipv4.map(str::to_string),
            ipv6: ipv6.map(str::to_string),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self, family: AddressFamily) -> Result<AddressRecord> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let value = match family {
            AddressFamily::V4 => self.ipv4.clone(),
            AddressFamily::V6 => self.ipv6.clone(),
        };

        value
            .map(|v| AddressRecord::new(family, v))
            .ok_or_else(|| {
                Error::address(std::io::Error::new(
                    std::io::ErrorKind::NetworkUnreachable,
                    "network unreachable",
                ))
            })
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// A mock DnsProvider that records every target it receives
#[derive(Clone, Default)]
pub struct RecordingProvider {
    /// Targets in call order
    targets: Arc<Mutex<Vec<ReconciliationTarget>>>,
    /// Domains that fail with a provider error
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make reconciliation of `domain` fail
    pub fn fail_for(self, domain: &str) -> Self {
        self.failing.lock().unwrap().insert(domain.to_string());
        self
    }

    /// Get the recorded targets
    pub fn targets(&self) -> Vec<ReconciliationTarget> {
        self.targets.lock().unwrap().clone()
    }

    /// Get the recorded domain names
    pub fn domains(&self) -> Vec<String> {
        self.targets()
            .into_iter()
            .map(|t| t.domain_name)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.targets.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn reconcile(&self, target: &ReconciliationTarget) -> Result<ReconcileOutcome> {
        self.targets.lock().unwrap().push(target.clone());

        if self.failing.lock().unwrap().contains(&target.domain_name) {
            return Err(Error::provider("Authentication error"));
        }

        Ok(ReconcileOutcome::Updated {
            record_id: format!("rec-{}", target.domain_name),
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Which CacheStore operation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFault {
    Load,
    Commit,
}

/// A CacheStore whose load or commit fails with an I/O error
#[derive(Clone)]
pub struct FailingCache {
    fault: CacheFault,
    /// Number of successful commits
    commits: Arc<AtomicUsize>,
}

impl FailingCache {
    pub fn new(fault: CacheFault) -> Self {
        Self {
            fault,
            commits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn io_error() -> Error {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ))
    }
}

#[async_trait::async_trait]
impl CacheStore for FailingCache {
    async fn load(&self) -> Result<CacheState> {
        match self.fault {
            CacheFault::Load => Err(Self::io_error()),
            CacheFault::Commit => Ok(CacheState::default()),
        }
    }

    async fn commit(&self, _state: &CacheState) -> Result<()> {
        match self.fault {
            CacheFault::Commit => Err(Self::io_error()),
            CacheFault::Load => {
                self.commits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

/// Helper to create a dual-stack config for testing
pub fn dual_stack_config() -> DdnsConfig {
    DdnsConfig::new("test-token")
        .with_ipv4_domains(["a.example.com", "b.example.com"])
        .with_ipv6_domains(["v6.example.com"])
}
