use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use reqwest::header::HeaderMap;
use schemars::JsonSchema;
use serde::Deserialize;
use url::Url;

use super::logging::Logging;
use crate::intercept::InterceptConfig;

/// Default upstream when none is configured
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:4000/graphql";

/// Configuration for the interception proxy
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// The upstream GraphQL endpoint requests are forwarded to
    #[schemars(schema_with = "Url::json_schema")]
    pub endpoint: Endpoint,

    /// List of hard-coded headers to include in all forwarded requests
    #[serde(deserialize_with = "parsers::map_from_str")]
    #[schemars(with = "HashMap<String, String>")]
    pub headers: HeaderMap,

    /// Interception filter options
    pub intercept: InterceptConfig,

    /// The address and port to accept connections on
    pub listen: ListenConfig,

    /// Logging configuration
    pub logging: Logging,
}

/// The upstream GraphQL endpoint.
///
/// Only http and https URLs are accepted; forwarding over anything else is
/// rejected at configuration time.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "Url")]
pub struct Endpoint(Url);

impl Endpoint {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unwrap the endpoint into its inner URL
    pub fn into_inner(self) -> Url {
        self.0
    }
}

impl TryFrom<Url> for Endpoint {
    type Error = String;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(format!("unsupported endpoint scheme: {other}")),
        }
    }
}

impl Default for Endpoint {
    #[allow(clippy::unwrap_used)]
    fn default() -> Self {
        // Parsing a constant; pinned by [test::default_endpoint_is_local_http]
        Self(Url::parse(DEFAULT_ENDPOINT).unwrap())
    }
}

/// The socket address to accept connections on
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct ListenConfig {
    /// The IP address to bind to
    pub address: IpAddr,

    /// The port to bind to
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
        }
    }
}

impl ListenConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

mod parsers {
    use std::str::FromStr;

    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use serde::Deserializer;

    pub(super) fn map_from_str<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapFromStrVisitor;
        impl<'de> serde::de::Visitor<'de> for MapFromStrVisitor {
            type Value = HeaderMap;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a map of header string keys and values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut parsed = HeaderMap::with_capacity(map.size_hint().unwrap_or(0));

                // While there are entries remaining in the input, add them
                // into our map.
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    let key = HeaderName::from_str(&key)
                        .map_err(|e| serde::de::Error::custom(e.to_string()))?;
                    let value = HeaderValue::from_str(&value)
                        .map_err(|e| serde::de::Error::custom(e.to_string()))?;

                    parsed.insert(key, value);
                }

                Ok(parsed)
            }
        }

        deserializer.deserialize_map(MapFromStrVisitor)
    }
}
