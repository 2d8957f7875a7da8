//! The UDP agent: socket ownership, dispatch loop, lifecycle.
//!
//! Requests are resolved inline on a single task. The registry sits
//! behind an async `RwLock`; the read guard is held for the whole
//! resolution of a request so every response reflects one consistent
//! registry snapshot, while updater tasks take the write guard to
//! apply changes between requests.

mod resolver;
mod updater;

pub use resolver::{MAX_REPETITIONS_CAP, MAX_VARBINDS, Resolver};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::access::CommunityTable;
use crate::error::Result;
use crate::oid::Oid;
use crate::pdu::Message;
use crate::registry::Registry;
use crate::util::bind_udp_socket;

/// Default agent port.
pub const DEFAULT_PORT: u16 = 7757;

/// Largest datagram the agent will receive.
const MAX_DATAGRAM: usize = 65535;

/// A running read-only SNMP agent.
///
/// Cheap to clone; all clones share the socket, registry, and
/// cancellation token.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<Inner>,
}

struct Inner {
    socket: UdpSocket,
    registry: RwLock<Registry>,
    communities: CommunityTable,
    cancel: CancellationToken,
}

impl Agent {
    /// Start configuring an agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// The address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.socket.local_addr()?)
    }

    /// Shared handle to the registry, for updaters and tests.
    pub fn registry(&self) -> &RwLock<Registry> {
        &self.inner.registry
    }

    /// Request shutdown; `run` and updater tasks return promptly.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// Serve requests until `shutdown` is called.
    ///
    /// Datagrams that fail to decode and requests naming an unknown
    /// community are dropped without a response.
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            tokio::select! {
                _ = self.inner.cancel.cancelled() => return Ok(()),
                recv = self.inner.socket.recv_from(&mut buf) => {
                    match recv {
                        Ok((len, peer)) => {
                            let data = Bytes::copy_from_slice(&buf[..len]);
                            self.handle_datagram(data, peer).await;
                        }
                        Err(error) => {
                            // Transient errors (e.g. ICMP port unreachable
                            // surfaced on some platforms) do not stop the loop
                            warn!(%error, "recv_from failed");
                        }
                    }
                }
            }
        }
    }

    async fn handle_datagram(&self, data: Bytes, peer: SocketAddr) {
        let message = match Message::decode(data) {
            Ok(message) => message,
            Err(error) => {
                debug!(%peer, %error, "dropping undecodable datagram");
                return;
            }
        };
        let Some(entry) = self.inner.communities.lookup(&message.community) else {
            debug!(%peer, "dropping request with unknown community");
            return;
        };
        trace!(
            %peer,
            security_name = %String::from_utf8_lossy(&entry.security_name),
            request_id = message.pdu.request_id,
            pdu_type = ?message.pdu.pdu_type,
            "handling request"
        );

        let response = {
            let registry = self.inner.registry.read().await;
            let resolver = Resolver::new(
                &registry,
                &self.inner.communities,
                &message.community,
                message.version,
            );
            resolver.resolve(&message.pdu)
        };
        let Some(pdu) = response else {
            return;
        };

        let reply = Message::new(message.version, message.community, pdu);
        if let Err(error) = self.inner.socket.send_to(&reply.encode(), peer).await {
            warn!(%peer, %error, "failed to send response");
        }
    }
}

/// Configures and binds an [`Agent`].
pub struct AgentBuilder {
    bind: SocketAddr,
    communities: CommunityTable,
    registry: Registry,
    recv_buffer_size: Option<usize>,
}

impl AgentBuilder {
    fn new() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            communities: CommunityTable::new(),
            registry: Registry::new(),
            recv_buffer_size: None,
        }
    }

    /// Bind address (default `0.0.0.0:7757`).
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind = addr;
        self
    }

    /// Add a community with read access to one subtree.
    pub fn community(
        mut self,
        community: impl Into<Bytes>,
        security_name: impl Into<Bytes>,
        read_subtree: Oid,
    ) -> Self {
        self.communities.add(community, security_name, read_subtree);
        self
    }

    /// Seed the initial registry.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Socket receive buffer size hint.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }

    /// Bind the socket and produce the agent.
    pub async fn build(self) -> Result<Agent> {
        let socket = bind_udp_socket(self.bind, self.recv_buffer_size).await?;
        Ok(Agent {
            inner: Arc::new(Inner {
                socket,
                registry: RwLock::new(self.registry),
                communities: self.communities,
                cancel: CancellationToken::new(),
            }),
        })
    }
}
