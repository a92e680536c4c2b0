// # HTTP IP Source
//
// This crate provides the remote address strategy for the DDNS system.
//
// ## Purpose
//
// Asks a plain-text "what is my IP" service which address it sees the
// request coming from. This is the public address even behind NAT.
//
// ## Proxy Support
//
// When a proxy URL is configured every request goes through it. The URL
// scheme picks the proxy kind: `socks5://`/`socks5h://` for SOCKS,
// `http://`/`https://` for an HTTP proxy.
//
// ## Response Handling
//
// The body is taken as text with a single trailing newline removed. It is
// not parsed or validated further.

use ddns_core::{AddressFamily, AddressRecord, Error, IpSource, Result};

use std::time::Duration;

/// IPv4 echo endpoint
pub const DEFAULT_IPV4_URL: &str = "http://api-ipv4.ip.sb/ip";

/// IPv6 echo endpoint
pub const DEFAULT_IPV6_URL: &str = "http://api-ipv6.ip.sb/ip";

/// Proxy schemes the client can connect through
const PROXY_SCHEMES: [&str; 4] = ["http", "https", "socks5", "socks5h"];

/// Default HTTP timeout for echo requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures inside the HTTP source
///
/// These never leave the crate directly: they become the chained cause of
/// the generic [`ddns_core::Error::Address`].
#[derive(Debug, thiserror::Error)]
pub enum HttpSourceError {
    /// The proxy URL could not be used
    #[error("Error creating proxy from {url}: {source}")]
    Proxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The proxy URL names a scheme no proxy connector handles
    #[error("Unsupported proxy scheme {scheme:?} in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    /// The HTTP client could not be built
    #[error("Error building HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// HTTP echo-service IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL queried for IPv4
    ipv4_url: String,

    /// URL queried for IPv6
    ipv6_url: String,

    /// HTTP client, proxied when configured
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source using the default endpoints
    ///
    /// # Parameters
    ///
    /// - `proxy`: Optional proxy URL (`socks5://...` or `http://...`)
    pub fn new(proxy: Option<&str>) -> Result<Self> {
        Self::with_endpoints(DEFAULT_IPV4_URL, DEFAULT_IPV6_URL, proxy)
    }

    /// Create a source using custom endpoints
    pub fn with_endpoints(
        ipv4_url: impl Into<String>,
        ipv6_url: impl Into<String>,
        proxy: Option<&str>,
    ) -> Result<Self> {
        let client = Self::build_client(proxy).map_err(Error::address)?;

        Ok(Self {
            ipv4_url: ipv4_url.into(),
            ipv6_url: ipv6_url.into(),
            client,
        })
    }

    fn build_client(proxy: Option<&str>) -> std::result::Result<reqwest::Client, HttpSourceError> {
        let mut builder = reqwest::Client::builder().timeout(DEFAULT_HTTP_TIMEOUT);

        if let Some(url) = proxy {
            tracing::debug!("Routing address lookups through proxy");
            check_proxy_scheme(url)?;
            let proxy = reqwest::Proxy::all(url).map_err(|source| HttpSourceError::Proxy {
                url: url.to_string(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(HttpSourceError::Client)
    }

    /// Fetch the address text from an endpoint
    async fn fetch(&self, url: &str) -> std::result::Result<String, HttpSourceError> {
        let request_error = |source| HttpSourceError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;

        if !response.status().is_success() {
            return Err(HttpSourceError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let body = response.text().await.map_err(request_error)?;
        Ok(strip_trailing_newline(body))
    }
}

/// Reject proxy URLs whose scheme has no connector
///
/// A URL without a scheme is taken as an HTTP proxy.
fn check_proxy_scheme(url: &str) -> std::result::Result<(), HttpSourceError> {
    let Some((scheme, _)) = url.split_once("://") else {
        return Ok(());
    };

    let scheme = scheme.to_ascii_lowercase();
    if PROXY_SCHEMES.contains(&scheme.as_str()) {
        Ok(())
    } else {
        Err(HttpSourceError::UnsupportedScheme {
            url: url.to_string(),
            scheme,
        })
    }
}

/// Remove exactly one trailing `\n`
fn strip_trailing_newline(mut body: String) -> String {
    if body.ends_with('\n') {
        body.pop();
    }
    body
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, family: AddressFamily) -> Result<AddressRecord> {
        let url = match family {
            AddressFamily::V4 => &self.ipv4_url,
            AddressFamily::V6 => &self.ipv6_url,
        };

        tracing::debug!("Fetching {} address from {}", family, url);

        let address = self.fetch(url).await.map_err(Error::address)?;
        Ok(AddressRecord::new(family, address))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn echo_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v6"))
            .respond_with(ResponseTemplate::new(200).set_body_string("2001:db8::7\n"))
            .mount(&server)
            .await;
        server
    }

    fn source_for(server: &MockServer, proxy: Option<&str>) -> HttpIpSource {
        HttpIpSource::with_endpoints(
            format!("{}/v4", server.uri()),
            format!("{}/v6", server.uri()),
            proxy,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetches_each_family_from_its_endpoint() {
        let server = echo_server().await;
        let source = source_for(&server, None);

        let v4 = source.current(AddressFamily::V4).await.unwrap();
        let v6 = source.current(AddressFamily::V6).await.unwrap();

        assert_eq!(v4, AddressRecord::new(AddressFamily::V4, "203.0.113.7"));
        assert_eq!(v6, AddressRecord::new(AddressFamily::V6, "2001:db8::7"));
    }

    #[tokio::test]
    async fn test_body_is_not_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(" not-an-ip\n\n"))
            .mount(&server)
            .await;

        let source = HttpIpSource::with_endpoints(server.uri(), server.uri(), None).unwrap();
        let address = source.current(AddressFamily::V4).await.unwrap();

        // Only one newline is stripped, nothing else is touched
        assert_eq!(address.value, " not-an-ip\n");
    }

    #[tokio::test]
    async fn test_requests_go_through_http_proxy() {
        // The mock server acts as the proxy: a proxied request for the
        // unreachable echo URL still lands on it
        let proxy = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.1\n"))
            .expect(1)
            .mount(&proxy)
            .await;

        let source = HttpIpSource::with_endpoints(
            "http://echo.invalid/ip",
            "http://echo.invalid/ip",
            Some(&proxy.uri()),
        )
        .unwrap();

        let address = source.current(AddressFamily::V4).await.unwrap();
        assert_eq!(address.value, "198.51.100.1");
    }

    #[tokio::test]
    async fn test_server_error_is_a_generic_address_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpIpSource::with_endpoints(server.uri(), server.uri(), None).unwrap();
        let err = source.current(AddressFamily::V6).await.unwrap_err();

        assert_eq!(err.to_string(), "Address error: Fail to get addresses.");
        let cause = err.source().expect("cause is chained");
        assert!(cause.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_address_error() {
        // Port 9 on loopback: nothing listens there
        let source =
            HttpIpSource::with_endpoints("http://127.0.0.1:9/ip", "http://127.0.0.1:9/ip", None)
                .unwrap();

        let err = source.current(AddressFamily::V4).await.unwrap_err();
        assert!(matches!(err, Error::Address { .. }));
    }

    #[test]
    fn test_unsupported_proxy_scheme_is_rejected() {
        let err = HttpIpSource::new(Some("ftp://proxy.example:21")).unwrap_err();
        assert!(matches!(err, Error::Address { .. }));

        let cause = std::error::Error::source(&err).expect("cause is chained");
        assert!(cause.to_string().contains("ftp"));
    }

    #[test]
    fn test_proxy_scheme_check() {
        assert!(check_proxy_scheme("http://127.0.0.1:8080").is_ok());
        assert!(check_proxy_scheme("HTTPS://proxy.example:443").is_ok());
        assert!(check_proxy_scheme("socks5h://127.0.0.1:1080").is_ok());
        assert!(check_proxy_scheme("127.0.0.1:8080").is_ok());
        assert!(matches!(
            check_proxy_scheme("ftp://proxy.example:21"),
            Err(HttpSourceError::UnsupportedScheme { ref scheme, .. }) if scheme == "ftp"
        ));
    }

    #[test]
    fn test_socks_proxy_is_accepted() {
        assert!(HttpIpSource::new(Some("socks5://127.0.0.1:1080")).is_ok());
    }

    #[test]
    fn test_strip_trailing_newline() {
        assert_eq!(strip_trailing_newline("1.2.3.4\n".to_string()), "1.2.3.4");
        assert_eq!(strip_trailing_newline("1.2.3.4".to_string()), "1.2.3.4");
        assert_eq!(strip_trailing_newline("1.2.3.4\n\n".to_string()), "1.2.3.4\n");
    }
}
