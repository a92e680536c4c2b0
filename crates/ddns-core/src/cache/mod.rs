// # Change Cache
//
// Remembers what was last pushed to the DNS provider so that a run with
// nothing new can stop before touching the network.
//
// ## Staleness Rule
//
// An update is needed unless the cached IPv4 address, the cached IPv6
// address AND the cached config modification time all equal the candidate
// values. The modification time ties "config changed" to "address changed":
// editing the config file forces one reconciliation even when the addresses
// are the same.
//
// A disabled family takes part as the empty string on both sides.

pub mod file;
pub mod memory;

pub use file::ChangeCache;
pub use memory::MemoryCache;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last reconciled snapshot
///
/// ## File Format
///
/// ```json
/// {
///   "IPv4Address": "203.0.113.7",
///   "IPv6Address": "2001:db8::7",
///   "ModTime": "2025-01-09T12:00:00.123456789Z"
/// }
/// ```
///
/// Every field is optional when reading. `ModTime` is `null` when no config
/// file was in use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheState {
    /// Last IPv4 address, empty when the family was disabled
    #[serde(rename = "IPv4Address", default)]
    pub ipv4: String,

    /// Last IPv6 address, empty when the family was disabled
    #[serde(rename = "IPv6Address", default)]
    pub ipv6: String,

    /// Config file modification time at the last commit
    #[serde(rename = "ModTime", default)]
    pub mod_time: Option<DateTime<Utc>>,
}

impl CacheState {
    /// Create a snapshot
    pub fn new(
        ipv4: impl Into<String>,
        ipv6: impl Into<String>,
        mod_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            ipv4: ipv4.into(),
            ipv6: ipv6.into(),
            mod_time,
        }
    }

    /// Decide whether the candidate values differ from this snapshot
    pub fn needs_update(&self, ipv4: &str, ipv6: &str, mod_time: Option<DateTime<Utc>>) -> bool {
        !(self.ipv4 == ipv4 && self.ipv6 == ipv6 && self.mod_time == mod_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_identical_state_needs_no_update() {
        let cached = CacheState::new("1.2.3.4", "2001:db8::1", Some(ts(100)));
        assert!(!cached.needs_update("1.2.3.4", "2001:db8::1", Some(ts(100))));
    }

    #[test]
    fn test_any_single_difference_needs_update() {
        let cached = CacheState::new("1.2.3.4", "2001:db8::1", Some(ts(100)));

        assert!(cached.needs_update("1.2.3.5", "2001:db8::1", Some(ts(100))));
        assert!(cached.needs_update("1.2.3.4", "2001:db8::2", Some(ts(100))));
        assert!(cached.needs_update("1.2.3.4", "2001:db8::1", Some(ts(101))));
        assert!(cached.needs_update("1.2.3.4", "2001:db8::1", None));
    }

    #[test]
    fn test_absent_mod_time_on_both_sides_is_equal() {
        let cached = CacheState::new("1.2.3.4", "", None);
        assert!(!cached.needs_update("1.2.3.4", "", None));
    }

    #[test]
    fn test_disabled_family_does_not_force_update() {
        let cached = CacheState::new("1.2.3.4", "", None);
        assert!(!cached.needs_update("1.2.3.4", "", None));

        // Enabling IPv6 afterwards does
        assert!(cached.needs_update("1.2.3.4", "2001:db8::1", None));
    }

    #[test]
    fn test_same_instant_in_other_offset_is_equal() {
        let cached: CacheState = serde_json::from_str(
            r#"{"IPv4Address":"1.2.3.4","IPv6Address":"","ModTime":"2025-01-09T20:00:00+08:00"}"#,
        )
        .unwrap();
        let candidate = Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap();
        assert!(!cached.needs_update("1.2.3.4", "", Some(candidate)));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let state: CacheState = serde_json::from_str(r#"{"IPv4Address":"1.2.3.4"}"#).unwrap();
        assert_eq!(state, CacheState::new("1.2.3.4", "", None));

        let empty: CacheState = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, CacheState::default());
    }
}
