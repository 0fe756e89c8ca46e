//! One-call upload: resolve, bind, handshake, stream.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::lookup_host;

use crate::config::{TransferConfig, DEFAULT_PORT};
use crate::error::PutError;
use crate::packet::TransferMode;
use crate::sender::Sender;
use crate::socket::Socket;
use crate::source::DataSource;
use crate::transfer::TransferSummary;

/// Upload everything `source` yields to `server` as `filename`.
///
/// `server` is `host` or `host:port`; the port defaults to 69.
pub async fn put<S>(
    server: &str,
    filename: &str,
    mode: TransferMode,
    source: &mut S,
    config: TransferConfig,
) -> Result<TransferSummary, PutError>
where
    S: DataSource,
{
    let server = resolve(server).await?;
    let socket = bind_for(server).await?;
    log::debug!("[put] bound {} for transfer to {server}", socket.local_addr);

    let mut session = Sender::new(socket, server, filename, mode, config)
        .connect()
        .await
        .inspect_err(|e| log::warn!("[put] error starting transmission: {e}"))?;

    session
        .send_stream(source)
        .await
        .inspect_err(|e| log::warn!("[put] transfer failed: {e}"))
}

/// Resolve `host[:port]` to the first matching socket address.
///
/// IPv6 literals may be bracketed (`[::1]:69`) or bare (`::1`).
pub async fn resolve(server: &str) -> Result<SocketAddr, PutError> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let bare = server.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    let resolve_err = |source| PutError::Resolve {
        host: server.to_string(),
        source,
    };
    let (host, port) = match server.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                resolve_err(io::Error::new(io::ErrorKind::InvalidInput, "invalid port"))
            })?;
            (host, port)
        }
        None => (server, DEFAULT_PORT),
    };

    lookup_host((host, port))
        .await
        .map_err(resolve_err)?
        .next()
        .ok_or_else(|| resolve_err(io::Error::new(io::ErrorKind::NotFound, "no addresses")))
}

/// Bind an ephemeral socket in the same address family as `server`.
async fn bind_for(server: SocketAddr) -> Result<Socket, PutError> {
    let local: SocketAddr = match server {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    Socket::bind(local).await.map_err(|e| match e {
        crate::socket::SocketError::Io(e) => PutError::Bind(e),
        other => other.into(),
    })
}
