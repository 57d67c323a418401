//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Types describing transport connections.

use crate::transport::TransportError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global counter for generating unique transport IDs.
static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId(u64);

impl TransportId {
    /// Creates a new transport ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique transport ID.
    pub fn next() -> Self {
        Self(NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport({})", self.0)
    }
}

/// How a transport delimits the data it delivers.
///
/// Stream transports deliver arbitrary slices of a byte stream; message
/// transports deliver one already-delimited chunk per inbound message. In both
/// cases a chunk may hold zero, one or many frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Byte stream (TCP, in-memory pipes).
    Stream,
    /// Message oriented (WebSocket).
    Message,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stream => write!(f, "stream"),
            TransportKind::Message => write!(f, "message"),
        }
    }
}

/// Address family of a connect target.
///
/// # Examples
///
/// ```rust
/// use netchannel::transport::AddressFamily;
///
/// assert_eq!(AddressFamily::resolve("127.0.0.1:9000").unwrap(), AddressFamily::IPv4);
/// assert_eq!(AddressFamily::resolve("[::1]:9000").unwrap(), AddressFamily::IPv6);
/// assert_eq!(
///     AddressFamily::resolve("ws://game.example.com:8080/socket").unwrap(),
///     AddressFamily::Hostname,
/// );
/// assert!(AddressFamily::resolve("no port here").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// A literal IPv4 socket address.
    IPv4,
    /// A literal IPv6 socket address.
    IPv6,
    /// A host name, resolved by the transport when connecting.
    Hostname,
}

impl AddressFamily {
    /// Determines the address family of `address`.
    ///
    /// Accepts `host:port`, `ip:port`, `[ipv6]:port` and the same forms behind
    /// a `scheme://` prefix with an optional path, query or fragment. Behind
    /// a `ws`, `wss`, `http` or `https` scheme the port may be omitted.
    /// Anything else fails with [`TransportError::AddressFamilyUnsupported`].
    pub fn resolve(address: &str) -> Result<Self, TransportError> {
        let unsupported = || TransportError::AddressFamilyUnsupported {
            address: address.to_string(),
        };

        let (authority, implied_port) = match address.split_once("://") {
            Some((scheme, rest)) => {
                let end = rest
                    .find(|c| matches!(c, '/' | '?' | '#'))
                    .unwrap_or(rest.len());
                (&rest[..end], has_default_port(scheme))
            }
            None => (address, false),
        };

        if let Ok(socket) = authority.parse::<SocketAddr>() {
            return Ok(Self::of_ip(socket.ip()));
        }

        let host = match authority.rsplit_once(':') {
            Some((host, port)) if !authority.ends_with(']') => {
                if port.parse::<u16>().is_err() {
                    return Err(unsupported());
                }
                // Malformed IP literals are not host names.
                if looks_like_ip(host) {
                    return Err(unsupported());
                }
                host
            }
            _ if implied_port => {
                if let Some(literal) = authority
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                {
                    return literal
                        .parse::<Ipv6Addr>()
                        .map(|_| AddressFamily::IPv6)
                        .map_err(|_| unsupported());
                }
                if looks_like_ip(authority) {
                    return authority
                        .parse::<Ipv4Addr>()
                        .map(|_| AddressFamily::IPv4)
                        .map_err(|_| unsupported());
                }
                authority
            }
            _ => return Err(unsupported()),
        };

        let valid_host = !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');
        if valid_host {
            Ok(AddressFamily::Hostname)
        } else {
            Err(unsupported())
        }
    }

    fn of_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::IPv4,
            IpAddr::V6(_) => AddressFamily::IPv6,
        }
    }
}

/// Schemes whose URLs fall back to port 80 or 443.
fn has_default_port(scheme: &str) -> bool {
    matches!(
        scheme.to_ascii_lowercase().as_str(),
        "ws" | "wss" | "http" | "https"
    )
}

fn looks_like_ip(host: &str) -> bool {
    host.starts_with('[') || host.chars().all(|c| c.is_ascii_digit() || c == '.')
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::IPv4 => write!(f, "IPv4"),
            AddressFamily::IPv6 => write!(f, "IPv6"),
            AddressFamily::Hostname => write!(f, "Hostname"),
        }
    }
}

/// Metadata associated with a transport connection.
///
/// This provides information about the transport that can be used for
/// logging, metrics, and debugging.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Unique identifier for this transport
    pub id: TransportId,

    /// Local address of the connection, if available
    pub local_addr: Option<SocketAddr>,

    /// Remote peer address, if available
    pub peer_addr: Option<SocketAddr>,

    /// Transport type (e.g., "tcp", "memory", "websocket")
    pub transport_type: String,

    /// Whether the transport is stream or message oriented
    pub kind: TransportKind,

    /// When the transport was created
    pub created_at: Instant,
}

impl TransportMetadata {
    /// Creates new transport metadata with a freshly allocated ID.
    pub fn new(transport_type: impl Into<String>, kind: TransportKind) -> Self {
        Self {
            id: TransportId::next(),
            local_addr: None,
            peer_addr: None,
            transport_type: transport_type.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    /// Sets the local address.
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// Sets the peer address.
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Returns the age of this transport.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_ids_are_unique() {
        let a = TransportId::next();
        let b = TransportId::next();
        assert_ne!(a, b);
        assert_eq!(format!("{}", TransportId::new(7)), "Transport(7)");
    }

    #[test]
    fn test_resolve_literal_addresses() {
        assert_eq!(AddressFamily::resolve("10.1.2.3:80").unwrap(), AddressFamily::IPv4);
        assert_eq!(AddressFamily::resolve("[fe80::1]:443").unwrap(), AddressFamily::IPv6);
        assert_eq!(
            AddressFamily::resolve("ws://127.0.0.1:9001/ws").unwrap(),
            AddressFamily::IPv4
        );
    }

    #[test]
    fn test_resolve_hostnames() {
        assert_eq!(AddressFamily::resolve("localhost:9000").unwrap(), AddressFamily::Hostname);
        assert_eq!(
            AddressFamily::resolve("wss://edge-01.example.net:443").unwrap(),
            AddressFamily::Hostname
        );
    }

    #[test]
    fn test_resolve_urls_without_port() {
        assert_eq!(
            AddressFamily::resolve("wss://game.example.com/ws").unwrap(),
            AddressFamily::Hostname
        );
        assert_eq!(AddressFamily::resolve("ws://localhost/ws").unwrap(), AddressFamily::Hostname);
        assert_eq!(AddressFamily::resolve("ws://localhost").unwrap(), AddressFamily::Hostname);
        assert_eq!(AddressFamily::resolve("ws://10.0.0.5/ws").unwrap(), AddressFamily::IPv4);
        assert_eq!(AddressFamily::resolve("wss://[::1]/ws").unwrap(), AddressFamily::IPv6);
    }

    #[test]
    fn test_resolve_urls_with_query_and_fragment() {
        assert_eq!(
            AddressFamily::resolve("ws://127.0.0.1:9000?room=1").unwrap(),
            AddressFamily::IPv4
        );
        assert_eq!(
            AddressFamily::resolve("wss://game.example.com#lobby").unwrap(),
            AddressFamily::Hostname
        );
        assert_eq!(
            AddressFamily::resolve("ws://localhost:8080/ws?room=1#top").unwrap(),
            AddressFamily::Hostname
        );
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        for address in [
            "",
            "localhost",
            ":80",
            "host:notaport",
            "bad host:80",
            "999.1.1.1:80",
            "tcp://localhost",
            "ws://",
            "ws://999.1.1.1/ws",
            "ws://[not-ipv6]/ws",
        ] {
            let err = AddressFamily::resolve(address).unwrap_err();
            assert!(
                matches!(err, TransportError::AddressFamilyUnsupported { .. }),
                "{address} should be rejected"
            );
        }
    }

    #[test]
    fn test_metadata_builder() {
        let local: SocketAddr = "127.0.0.1:1000".parse().unwrap();
        let peer: SocketAddr = "127.0.0.1:2000".parse().unwrap();
        let meta = TransportMetadata::new("tcp", TransportKind::Stream)
            .with_local_addr(local)
            .with_peer_addr(peer);
        assert_eq!(meta.local_addr, Some(local));
        assert_eq!(meta.peer_addr, Some(peer));
        assert_eq!(meta.kind, TransportKind::Stream);
        assert!(meta.age() < Duration::from_secs(5));
    }
}
