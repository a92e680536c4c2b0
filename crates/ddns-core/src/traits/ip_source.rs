// # IP Source Trait
//
// Defines the interface for resolving the host's current address.
//
// ## Implementations
//
// - Local interface (outbound UDP socket): `ddns-ip-local` crate
// - Remote echo service (optionally proxied): `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressFamily, IpSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let address = source.current(AddressFamily::V4).await?;
//     println!("{} address: {}", address.family, address.value);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::AddressFamily;

/// An address observed for one family
///
/// Produced fresh by every resolution and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Which family was resolved
    pub family: AddressFamily,
    /// Textual address, exactly as the source reported it
    pub value: String,
}

impl AddressRecord {
    /// Create a new address record
    pub fn new(family: AddressFamily, value: impl Into<String>) -> Self {
        Self {
            family,
            value: value.into(),
        }
    }
}

/// Trait for IP source implementations
///
/// # Error Contract
///
/// Every failure (socket, resolver, transport, proxy) must be reported as
/// [`crate::Error::Address`]. The top-level message stays generic while the
/// original cause is chained as its source so it can still be logged.
///
/// # Side Effects
///
/// None besides the network calls needed to learn the address. Calling
/// [`IpSource::current`] repeatedly is safe.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current address for a family
    ///
    /// # Returns
    ///
    /// - `Ok(AddressRecord)`: The current address
    /// - `Err(Error::Address)`: If the address could not be determined
    async fn current(&self, family: AddressFamily) -> Result<AddressRecord, crate::Error>;

    /// Short name used in logs
    fn source_name(&self) -> &'static str;
}
