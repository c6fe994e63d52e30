//! One-shot query: resolve, assemble, send, receive, validate

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::core::{Config, Error, Result};
use crate::network::{interface_addr, resolve_host, RawSender, ResponseListener};
use crate::protocol::{assemble, Datagram, LeapIndicator, Mode, NtpMessage};
use crate::time::{self, TimeFormat};

/// A validated reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Address the reply came from
    pub server: Ipv4Addr,
    /// Decoded NTP header
    pub message: NtpMessage,
}

impl Response {
    /// Server transmit time in UTC
    pub fn transmit_time(&self) -> Result<DateTime<Utc>> {
        time::to_datetime(&self.message.transmit)
    }

    /// Server transmit time as one line of text
    pub fn render(&self, format: TimeFormat) -> Result<String> {
        time::render(&self.message.transmit, format)
    }
}

/// Raw-socket NTP client
pub struct Client {
    config: Config,
}

impl Client {
    /// Creates a client after validating `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Client { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves both addresses and builds the request datagram.
    /// Opens no transport socket.
    pub async fn prepare(&self) -> Result<Datagram> {
        let source = interface_addr(&self.config.interface)?;
        let destination = resolve_host(&self.config.server).await?;

        let request = NtpMessage::client_request(self.config.ntp_version);
        Ok(assemble(source, destination, &request, &self.config.packet_params()))
    }

    /// Sends one request and waits for the matching reply
    #[tracing::instrument(skip(self), fields(interface = %self.config.interface, server = %self.config.server))]
    pub async fn query(&self) -> Result<Response> {
        let datagram = self.prepare().await?;
        let server = datagram.ip.destination;

        // Listen before sending so a fast reply is not lost
        let mut listener = ResponseListener::bind(self.config.source_port)?;
        {
            let sender = RawSender::open()?;
            sender.send(datagram.as_bytes(), server)?;
        }
        info!(
            "Request sent from {}:{} to {}, waiting up to {:?}",
            datagram.ip.source, self.config.source_port, server, self.config.timeout
        );

        let message = listener.recv_from(server, self.config.timeout).await?;
        validate_reply(&message)?;
        debug!("Reply: {:?}", message);

        Ok(Response { server, message })
    }
}

/// Rejects replies that carry no usable time
pub fn validate_reply(message: &NtpMessage) -> Result<()> {
    match message.mode {
        Mode::Server | Mode::Broadcast => {}
        other => {
            return Err(Error::malformed(format!("unexpected mode {:?} in reply", other)));
        }
    }

    if message.transmit.is_zero() {
        return Err(Error::malformed("transmit timestamp is zero"));
    }

    if message.stratum == 0 {
        warn!(
            "Kiss-o'-death from server: {}",
            String::from_utf8_lossy(&message.reference_id)
        );
    }
    if message.leap == LeapIndicator::Unsynchronized {
        warn!("Server reports its clock as unsynchronized");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NtpTimestamp;

    fn reply() -> NtpMessage {
        let mut message = NtpMessage::client_request(3);
        message.mode = Mode::Server;
        message.stratum = 2;
        message.transmit = NtpTimestamp::new(3_913_056_000, 0);
        message
    }

    #[test]
    fn test_validate_reply() {
        assert!(validate_reply(&reply()).is_ok());

        let mut broadcast = reply();
        broadcast.mode = Mode::Broadcast;
        assert!(validate_reply(&broadcast).is_ok());

        // Kiss-o'-death and unsynchronized replies are only logged
        let mut kod = reply();
        kod.stratum = 0;
        kod.reference_id = *b"RATE";
        kod.leap = LeapIndicator::Unsynchronized;
        assert!(validate_reply(&kod).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_replies() {
        let mut echoed = reply();
        echoed.mode = Mode::Client;
        assert!(matches!(validate_reply(&echoed), Err(Error::MalformedResponse(_))));

        let mut empty = reply();
        empty.transmit = NtpTimestamp::ZERO;
        assert!(matches!(validate_reply(&empty), Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_response_time() {
        let response = Response {
            server: Ipv4Addr::new(192, 0, 2, 1),
            message: reply(),
        };
        assert_eq!(response.transmit_time().unwrap().timestamp(), 1_704_067_200);
        assert_eq!(response.render(TimeFormat::Unix).unwrap(), "1704067200.000000000");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            ntp_version: 7,
            ..Config::new("lo", "127.0.0.1")
        };
        assert!(matches!(Client::new(config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_unknown_interface_aborts_before_sockets() {
        let client = Client::new(Config::new("nosuchif0", "192.0.2.1")).unwrap();
        let result = client.query().await;
        assert!(matches!(result, Err(Error::Resolution(_))));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_prepare_on_loopback() {
        let client = Client::new(Config::new("lo", "127.0.0.1")).unwrap();
        let datagram = client.prepare().await.unwrap();

        assert_eq!(datagram.ip.source, Ipv4Addr::LOCALHOST);
        assert_eq!(datagram.ip.destination, Ipv4Addr::LOCALHOST);
        assert_eq!(datagram.udp.source_port, 32776);
        assert_eq!(datagram.len(), 76);
        assert!(crate::protocol::checksum::verify(datagram.as_bytes()));
    }
}
