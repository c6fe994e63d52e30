use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use futures::StreamExt;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tokio_util::udp::UdpFramed;

use crate::core::{Error, Result, NTP_PORT};
use crate::protocol::{NtpCodec, NtpMessage};

/// Raw IPv4 socket that transmits datagrams with caller-built IP headers
pub struct RawSender {
    socket: Socket,
}

impl RawSender {
    /// Opens the raw socket. Needs root or CAP_NET_RAW.
    pub fn open() -> Result<Self> {
        // IPPROTO_RAW implies IP_HDRINCL
        let socket = Socket::new(
            Domain::IPV4,
            Type::RAW,
            Some(Protocol::from(libc::IPPROTO_RAW)),
        )
        .map_err(|e| Error::socket(format!("Failed to open raw socket: {}", e)))?;

        Ok(RawSender { socket })
    }

    /// Sends a complete IP datagram to `destination` on the NTP port
    pub fn send(&self, datagram: &[u8], destination: Ipv4Addr) -> Result<()> {
        let target = SockAddr::from(SocketAddrV4::new(destination, NTP_PORT));
        let sent = self
            .socket
            .send_to(datagram, &target)
            .map_err(|e| Error::socket(format!("Failed to send to {}: {}", destination, e)))?;

        if sent != datagram.len() {
            return Err(Error::socket(format!(
                "Short send: {} of {} bytes",
                sent,
                datagram.len()
            )));
        }

        tracing::debug!("Sent {} bytes to {}:{}", sent, destination, NTP_PORT);
        Ok(())
    }
}

/// UDP socket bound on the request's source port, waiting for the reply
pub struct ResponseListener {
    framed: UdpFramed<NtpCodec>,
}

impl ResponseListener {
    /// Binds the wildcard address on `port`. Port 0 picks an ephemeral port.
    pub fn bind(port: u16) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| Error::socket(format!("Failed to open UDP socket: {}", e)))?;

        let addr = SockAddr::from(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        socket
            .bind(&addr)
            .map_err(|e| Error::socket(format!("Failed to bind UDP port {}: {}", port, e)))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| Error::socket(format!("Failed to make UDP socket non-blocking: {}", e)))?;

        let socket = UdpSocket::from_std(socket.into())
            .map_err(|e| Error::socket(format!("Failed to register UDP socket: {}", e)))?;
        Ok(ResponseListener {
            framed: UdpFramed::new(socket, NtpCodec::new()),
        })
    }

    /// Returns the bound local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.framed
            .get_ref()
            .local_addr()
            .map_err(|e| Error::socket(format!("Failed to get local address: {}", e)))
    }

    /// Waits up to `timeout` for the next NTP message from anyone
    pub async fn recv(&mut self, timeout: Duration) -> Result<(NtpMessage, SocketAddr)> {
        match tokio::time::timeout(timeout, self.framed.next()).await {
            Err(_) => Err(Error::Timeout(timeout)),
            Ok(None) => Err(Error::socket("Receive socket closed")),
            Ok(Some(result)) => {
                let (message, from) = result?;
                Ok((message?, from))
            }
        }
    }

    /// Waits up to `timeout` for an NTP message sent by `server`.
    /// Datagrams from other hosts are logged and skipped, malformed or not.
    pub async fn recv_from(&mut self, server: Ipv4Addr, timeout: Duration) -> Result<NtpMessage> {
        let deadline = Instant::now() + timeout;
        loop {
            let next = tokio::time::timeout_at(deadline, self.framed.next()).await;
            let (frame, from) = match next {
                Err(_) => return Err(Error::Timeout(timeout)),
                Ok(None) => return Err(Error::socket("Receive socket closed")),
                Ok(Some(result)) => result?,
            };

            if from.ip() == server {
                tracing::debug!("Received reply from {}", from);
                return frame;
            }
            tracing::warn!("Ignoring datagram from unexpected sender {}", from);
        }
    }
}
