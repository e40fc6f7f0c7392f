use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::NetworkSection;
use crate::error::Result;

/// The swarm's multicast group, joined for receiving and used as the
/// destination for every send.
pub struct MulticastTransport {
    socket: UdpSocket,
    group: SocketAddrV4,
}

impl MulticastTransport {
    /// Bind the group port, join the group and set a receive timeout.
    pub fn join(net: &NetworkSection) -> Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, net.port))?;
        socket.join_multicast_v4(&net.group, &net.interface)?;
        socket.set_multicast_loop_v4(true)?;
        socket.set_multicast_ttl_v4(net.ttl)?;
        socket.set_read_timeout(Some(Duration::from_millis(net.recv_timeout_ms.max(1))))?;
        info!(group = %net.group, port = net.port, "joined multicast group");
        Ok(Self {
            socket,
            group: SocketAddrV4::new(net.group, net.port),
        })
    }

    /// Send-only socket on an ephemeral port, for controllers.
    pub fn sender(net: &NetworkSection) -> Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(net.interface, 0))?;
        socket.set_multicast_ttl_v4(net.ttl)?;
        socket.set_multicast_loop_v4(true)?;
        Ok(Self {
            socket,
            group: SocketAddrV4::new(net.group, net.port),
        })
    }

    pub fn group(&self) -> SocketAddrV4 {
        self.group
    }

    /// Wait up to the read timeout for one datagram. `Ok(None)` on timeout.
    pub fn recv(&self, buf: &mut [u8]) -> std::io::Result<Option<usize>> {
        match self.socket.recv(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fire-and-forget send to the group. Failures are logged, not returned.
    pub fn broadcast(&self, bytes: &[u8]) -> usize {
        match self.socket.send_to(bytes, self.group) {
            Ok(n) => {
                debug!(len = n, "broadcast");
                n
            }
            Err(err) => {
                warn!(%err, "broadcast failed");
                0
            }
        }
    }
}
