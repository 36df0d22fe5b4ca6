//! TCP reachability probes, typically used as wait predicates for a node's
//! SSH port.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::trace;

/// Connect timeout used when the caller does not supply one.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors raised while resolving a probe target.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Raised when the host name cannot be resolved.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        /// Host as supplied.
        host: String,
        /// Port as supplied.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Raised when resolution succeeds without yielding an address.
    #[error("{host}:{port} resolved to no addresses")]
    NoAddress {
        /// Host as supplied.
        host: String,
        /// Port as supplied.
        port: u16,
    },
}

/// Resolves `host:port` to its first socket address.
///
/// # Errors
///
/// Returns [`ProbeError::Resolve`] when the lookup fails and
/// [`ProbeError::NoAddress`] when it yields nothing.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr, ProbeError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ProbeError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    addrs.next().ok_or_else(|| ProbeError::NoAddress {
        host: host.to_owned(),
        port,
    })
}

/// Returns `true` when a TCP connection to `addr` succeeds within
/// `connect_timeout`.
#[must_use]
pub fn tcp_ping(addr: SocketAddr, connect_timeout: Duration) -> bool {
    let result = TcpStream::connect_timeout(&addr, connect_timeout);
    trace!(%addr, reachable = result.is_ok(), "tcp probe");
    result.is_ok()
}

/// Async counterpart of [`tcp_ping`].
pub async fn tcp_ping_async(addr: SocketAddr, connect_timeout: Duration) -> bool {
    let result = timeout(connect_timeout, tokio::net::TcpStream::connect(addr)).await;
    let reachable = matches!(result, Ok(Ok(_)));
    trace!(%addr, reachable, "tcp probe");
    reachable
}
