//! UDP link to the remote injection service
//!
//! One connected socket per session. The status handshake is the only
//! request/response exchange; state updates are fire-and-forget and a lost
//! datagram is repaired by the next full-state frame.

use crate::protocol::{self, StatusReply, STATUS_REQUEST};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long the handshake waits for the status reply
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("No address found for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    #[error("Failed to open socket towards {endpoint}: {source}")]
    Bind {
        endpoint: SocketAddr,
        source: io::Error,
    },

    #[error("Failed to send frame: {0}")]
    Send(#[source] io::Error),

    #[error("Short send: {sent} of {len} bytes")]
    ShortSend { sent: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("No status reply within {0:?}")]
    Timeout(Duration),

    #[error("Remote rejected status probe with code {code:#04x}")]
    Rejected { code: u8 },

    #[error("Malformed status reply: {0}")]
    Malformed(#[from] protocol::ProtocolError),

    #[error("Socket error during handshake: {0}")]
    Io(#[from] io::Error),
}

#[derive(Clone, Debug)]
pub struct TransportSettings {
    pub host: String,
    pub port: u16,
    pub handshake_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            host: protocol::DEFAULT_HOST.to_string(),
            port: protocol::DEFAULT_PORT,
            handshake_timeout: HANDSHAKE_TIMEOUT,
        }
    }
}

/// Connected UDP socket; closed when dropped
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    endpoint: SocketAddr,
    handshake_timeout: Duration,
}

impl UdpTransport {
    /// Resolves the endpoint and connects an ephemeral socket to it
    pub async fn connect(settings: &TransportSettings) -> Result<Self, TransportError> {
        let host = settings.host.as_str();
        let port = settings.port;

        let endpoint = lookup_host((host, port))
            .await
            .map_err(|source| TransportError::Resolve {
                host: host.to_string(),
                port,
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::NoAddress {
                host: host.to_string(),
                port,
            })?;

        let local: SocketAddr = if endpoint.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let bind_error = |source: io::Error| TransportError::Bind { endpoint, source };
        let socket = UdpSocket::bind(local).await.map_err(bind_error)?;
        socket.connect(endpoint).await.map_err(bind_error)?;

        info!(
            "UDP transport ready: {} -> {}",
            socket.local_addr().map_err(bind_error)?,
            endpoint
        );

        Ok(Self {
            socket,
            endpoint,
            handshake_timeout: settings.handshake_timeout,
        })
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Sends the status probe and waits for an ok reply
    pub async fn handshake(&self) -> Result<(), HandshakeError> {
        debug!("Sending status probe to {}", self.endpoint);
        self.socket.send(&STATUS_REQUEST).await?;

        let mut reply = [0u8; 2];
        let received = match timeout(self.handshake_timeout, self.socket.recv(&mut reply)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("No status reply from {}", self.endpoint);
                return Err(HandshakeError::Timeout(self.handshake_timeout));
            }
        };

        let status = StatusReply::parse(&reply[..received])?;
        if !status.is_ok() {
            warn!("Invalid reply code: {}", status.code);
            return Err(HandshakeError::Rejected { code: status.code });
        }

        info!("Remote at {} is ready", self.endpoint);
        Ok(())
    }

    /// Fire-and-forget send; never waits for socket readiness
    pub fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        let sent = self.socket.try_send(frame).map_err(TransportError::Send)?;
        if sent != frame.len() {
            return Err(TransportError::ShortSend {
                sent,
                len: frame.len(),
            });
        }
        Ok(())
    }
}
