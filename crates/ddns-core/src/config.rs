//! Configuration types for the DDNS system
//!
//! [`DdnsConfig`] is the resolved configuration of a single run. It is
//! assembled by the binary from command-line flags and, optionally, a JSON
//! file ([`FileConfig`]) whose keys override the flag values.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default location of the change cache
pub const DEFAULT_CACHE_PATH: &str = "/tmp/ddns-cache.json";

/// Resolved configuration of a run
#[derive(Clone)]
pub struct DdnsConfig {
    /// Provider bearer token
    pub token: String,

    /// Domains to keep in sync, per address family
    pub domains: Domains,

    /// Where addresses come from
    pub ip_source: IpSourceKind,

    /// Proxy URL for the remote address strategy
    pub proxy: Option<String>,

    /// Record TTL, 0 means provider default
    pub ttl: u32,

    /// Route record traffic through the provider's edge
    pub proxied: bool,

    /// Whether the change cache is consulted
    pub cache: bool,

    /// Location of the change cache file
    pub cache_path: PathBuf,
}

// The token must never be printed
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("token", &"<REDACTED>")
            .field("domains", &self.domains)
            .field("ip_source", &self.ip_source)
            .field("proxy", &self.proxy)
            .field("ttl", &self.ttl)
            .field("proxied", &self.proxied)
            .field("cache", &self.cache)
            .field("cache_path", &self.cache_path)
            .finish()
    }
}

impl DdnsConfig {
    /// Create a configuration with defaults and the given token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            domains: Domains::default(),
            ip_source: IpSourceKind::Wan,
            proxy: None,
            ttl: 0,
            proxied: false,
            cache: true,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
        }
    }

    /// Set the IPv4 domain list
    pub fn with_ipv4_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains.ipv4 = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Set the IPv6 domain list
    pub fn with_ipv6_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains.ipv6 = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the change cache
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Override every field the file sets
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(token) = file.token {
            self.token = token;
        }
        if let Some(domains) = file.domains {
            if let Some(ipv4) = domains.ipv4 {
                self.domains.ipv4 = ipv4;
            }
            if let Some(ipv6) = domains.ipv6 {
                self.domains.ipv6 = ipv6;
            }
        }
        if let Some(ip_source) = file.ip_source {
            self.ip_source = IpSourceKind::from(ip_source.as_str());
        }
        if let Some(proxy) = file.proxy {
            self.proxy = Some(proxy).filter(|p| !p.is_empty());
        }
        if let Some(ttl) = file.ttl {
            self.ttl = ttl;
        }
        if let Some(proxied) = file.proxied {
            self.proxied = proxied;
        }
        if let Some(cache) = file.cache {
            self.cache = cache;
        }
        if let Some(cache_path) = file.cache_path {
            self.cache_path = cache_path;
        }
    }

    /// Domains configured for a family
    pub fn domains_for(&self, family: AddressFamily) -> &[String] {
        match family {
            AddressFamily::V4 => &self.domains.ipv4,
            AddressFamily::V6 => &self.domains.ipv6,
        }
    }

    /// A family is enabled when at least one domain is configured for it
    pub fn is_enabled(&self, family: AddressFamily) -> bool {
        !self.domains_for(family).is_empty()
    }

    /// Enabled families in processing order (IPv4 first)
    pub fn enabled_families(&self) -> Vec<AddressFamily> {
        AddressFamily::ALL
            .into_iter()
            .filter(|family| self.is_enabled(*family))
            .collect()
    }
}

/// Domain lists per address family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Domains {
    /// Domains that receive A records
    pub ipv4: Vec<String>,
    /// Domains that receive AAAA records
    pub ipv6: Vec<String>,
}

/// Address resolution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpSourceKind {
    /// Address of the local interface used to reach the internet
    Lan,
    /// Address observed by a remote echo service
    Wan,
}

impl From<&str> for IpSourceKind {
    /// `"lan"` selects the local strategy, anything else the remote one
    fn from(value: &str) -> Self {
        if value == "lan" {
            IpSourceKind::Lan
        } else {
            IpSourceKind::Wan
        }
    }
}

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl AddressFamily {
    /// Both families in processing order
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    /// Record type used for this family
    pub fn record_type(self) -> RecordType {
        match self {
            AddressFamily::V4 => RecordType::A,
            AddressFamily::V6 => RecordType::Aaaa,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON config file format
///
/// Every key is optional; present keys override the command-line values.
///
/// ```json
/// {
///   "token": "...",
///   "domains": { "ipv4": ["home.example.com"], "ipv6": ["home.example.com"] },
///   "ipSource": "lan",
///   "proxy": "socks5://127.0.0.1:1080",
///   "ttl": 120,
///   "cache": true
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub token: Option<String>,
    pub domains: Option<FileDomains>,
    pub ip_source: Option<String>,
    pub proxy: Option<String>,
    pub ttl: Option<u32>,
    pub proxied: Option<bool>,
    pub cache: Option<bool>,
    pub cache_path: Option<PathBuf>,
}

/// Domain lists as they appear in the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDomains {
    pub ipv4: Option<Vec<String>>,
    pub ipv6: Option<Vec<String>>,
}

impl FileConfig {
    /// Read a config file and its last modification time
    pub fn load(path: &Path) -> Result<(Self, DateTime<Utc>)> {
        let content = std::fs::read_to_string(path)?;
        let modified = std::fs::metadata(path)?.modified()?;

        let file: FileConfig = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        Ok((file, DateTime::<Utc>::from(modified)))
    }
}
