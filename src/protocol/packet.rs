//! Assembly of the complete IP/UDP/NTP request datagram
//!
//! The UDP checksum is computed first, over pseudo header, UDP header and
//! payload. The IP checksum is computed last, over the whole datagram with
//! the final UDP checksum already in place.

use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::core::{
    PacketParams, DATAGRAM_LEN, IP_HEADER_LEN, NTP_MESSAGE_LEN, UDP_HEADER_LEN,
    UDP_PSEUDO_HEADER_LEN,
};
use super::checksum::checksum;
use super::header::{IpHeader, UdpHeader, UdpPseudoHeader};
use super::message::NtpMessage;

/// A finished request datagram together with the headers it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub ip: IpHeader,
    pub udp: UdpHeader,
    pub payload: NtpMessage,
    bytes: Bytes,
}

impl Datagram {
    /// The bytes to hand to the raw socket
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Computes the UDP checksum of `udp` (checksum field zero) and `payload`.
///
/// A zero result is returned as 0xFFFF, since zero on the wire means the
/// sender did not compute a checksum.
pub fn udp_checksum(pseudo: &UdpPseudoHeader, udp: &UdpHeader, payload: &[u8]) -> u16 {
    assert_eq!(
        pseudo.length, udp.length,
        "pseudo header length must match the UDP length field"
    );

    let mut buf = BytesMut::with_capacity(UDP_PSEUDO_HEADER_LEN + UDP_HEADER_LEN + payload.len());
    pseudo.encode(&mut buf);
    udp.encode(&mut buf);
    buf.put_slice(payload);

    match checksum(&buf) {
        0 => 0xFFFF,
        sum => sum,
    }
}

/// Builds the request datagram from `source` to `destination`
pub fn assemble(
    source: Ipv4Addr,
    destination: Ipv4Addr,
    request: &NtpMessage,
    params: &PacketParams,
) -> Datagram {
    let payload = request.to_bytes();
    let payload_len = NTP_MESSAGE_LEN as u16;

    let mut udp = UdpHeader::ntp_request(params.source_port, payload_len);
    let pseudo = UdpPseudoHeader::new(source, destination, payload_len);
    udp.checksum = udp_checksum(&pseudo, &udp, &payload);

    let mut ip = IpHeader::udp(source, destination, udp.length, params);
    let mut buf = BytesMut::with_capacity(DATAGRAM_LEN);
    ip.encode(&mut buf);
    udp.encode(&mut buf);
    buf.put_slice(&payload);

    ip.checksum = checksum(&buf);
    let offset = IpHeader::CHECKSUM_OFFSET;
    buf[offset..offset + 2].copy_from_slice(&ip.checksum.to_be_bytes());

    debug_assert_eq!(buf.len(), IP_HEADER_LEN + udp.length as usize);
    tracing::debug!(
        "Assembled {} byte datagram {} -> {}: udp checksum {:#06x}, ip checksum {:#06x}",
        buf.len(),
        source,
        destination,
        udp.checksum,
        ip.checksum
    );

    Datagram {
        ip,
        udp,
        payload: *request,
        bytes: buf.freeze(),
    }
}
