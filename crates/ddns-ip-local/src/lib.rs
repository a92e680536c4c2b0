// # Local IP Source
//
// This crate provides the local address strategy for the DDNS system.
//
// ## How It Works
//
// A UDP socket is "connected" to a well-known, globally routable anchor
// address. Connecting a datagram socket sends nothing; it only makes the OS
// pick the route and the local interface address it would use to reach the
// public internet. That local address is the answer.
//
// The anchors (Cloudflare's public resolvers) are chosen only because they
// are always routable. No packet is ever sent to them.
//
// ## When to Use
//
// Hosts that own a public address directly (typical for IPv6, or servers
// without NAT). Behind NAT this yields the private address; use the remote
// HTTP source (`ddns-ip-http`) instead.

use ddns_core::{AddressFamily, AddressRecord, Error, IpSource, Result};

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;

/// IPv4 routing anchor
pub const IPV4_ANCHOR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), 53);

/// IPv6 routing anchor
pub const IPV6_ANCHOR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V6(Ipv6Addr::new(0x2606, 0x4700, 0x4700, 0, 0, 0, 0, 0x1111)),
    53,
);

/// Local-interface IP source
#[derive(Debug, Clone)]
pub struct LocalIpSource {
    ipv4_anchor: SocketAddr,
    ipv6_anchor: SocketAddr,
}

impl LocalIpSource {
    /// Create a source using the default anchors
    pub fn new() -> Self {
        Self::with_anchors(IPV4_ANCHOR, IPV6_ANCHOR)
    }

    /// Create a source using custom anchors
    pub fn with_anchors(ipv4_anchor: SocketAddr, ipv6_anchor: SocketAddr) -> Self {
        Self {
            ipv4_anchor,
            ipv6_anchor,
        }
    }

    /// Discover the local address the OS would use towards `anchor`
    async fn probe(family: AddressFamily, anchor: SocketAddr) -> std::io::Result<String> {
        let bind_addr: SocketAddr = match family {
            AddressFamily::V4 => (Ipv4Addr::UNSPECIFIED, 0).into(),
            AddressFamily::V6 => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(anchor).await?;
        let local = socket.local_addr()?;

        Ok(local.ip().to_string())
    }
}

impl Default for LocalIpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IpSource for LocalIpSource {
    async fn current(&self, family: AddressFamily) -> Result<AddressRecord> {
        let anchor = match family {
            AddressFamily::V4 => self.ipv4_anchor,
            AddressFamily::V6 => self.ipv6_anchor,
        };

        tracing::debug!("Probing local {} address via {}", family, anchor);

        let address = Self::probe(family, anchor).await.map_err(Error::address)?;
        Ok(AddressRecord::new(family, address))
    }

    fn source_name(&self) -> &'static str {
        "lan"
    }
}
