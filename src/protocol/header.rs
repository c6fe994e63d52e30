//! IPv4, UDP and UDP pseudo header layouts
//!
//! Every header is kept in host order and serialized field by field in
//! network order. Packed fields are assembled with shifts and masks.

use std::net::Ipv4Addr;

use bytes::BufMut;

use crate::core::{
    PacketParams, IPPROTO_UDP, IP_HEADER_LEN, NTP_PORT, UDP_HEADER_LEN, UDP_PSEUDO_HEADER_LEN,
};

/// IP version written into requests
pub const IP_VERSION: u8 = 4;

/// Packs the IP version and header length (in 32-bit words) into one byte
pub const fn pack_version_ihl(version: u8, ihl: u8) -> u8 {
    ((version & 0x0F) << 4) | (ihl & 0x0F)
}

/// IPv4 header without options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpHeader {
    pub version: u8,
    /// Header length in 32-bit words
    pub ihl: u8,
    pub tos: u8,
    /// Header plus payload, in bytes
    pub total_length: u16,
    pub identification: u16,
    /// Flags and fragment offset, zero means no fragmentation
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl IpHeader {
    /// Offset of the checksum field within the header
    pub const CHECKSUM_OFFSET: usize = 10;

    /// Creates a header for a UDP datagram carrying `udp_length` bytes.
    /// The checksum is left at zero.
    pub fn udp(source: Ipv4Addr, destination: Ipv4Addr, udp_length: u16, params: &PacketParams) -> Self {
        IpHeader {
            version: IP_VERSION,
            ihl: (IP_HEADER_LEN / 4) as u8,
            tos: 0,
            total_length: IP_HEADER_LEN as u16 + udp_length,
            identification: params.identification,
            flags_fragment: 0,
            ttl: params.ttl,
            protocol: IPPROTO_UDP,
            checksum: 0,
            source,
            destination,
        }
    }

    /// Writes the header in network byte order
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(pack_version_ihl(self.version, self.ihl));
        dst.put_u8(self.tos);
        dst.put_u16(self.total_length);
        dst.put_u16(self.identification);
        dst.put_u16(self.flags_fragment);
        dst.put_u8(self.ttl);
        dst.put_u8(self.protocol);
        dst.put_u16(self.checksum);
        dst.put_slice(&self.source.octets());
        dst.put_slice(&self.destination.octets());
    }

    /// Returns the serialized header
    pub fn to_bytes(&self) -> [u8; IP_HEADER_LEN] {
        let mut out = [0u8; IP_HEADER_LEN];
        self.encode(&mut &mut out[..]);
        out
    }
}

/// UDP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    /// Header plus payload, in bytes. Does not include the IP header.
    pub length: u16,
    pub checksum: u16,
}

impl UdpHeader {
    /// Offset of the checksum field within the header
    pub const CHECKSUM_OFFSET: usize = 6;

    /// Creates a header addressed to the NTP port with a zero checksum
    pub fn ntp_request(source_port: u16, payload_len: u16) -> Self {
        UdpHeader {
            source_port,
            destination_port: NTP_PORT,
            length: UDP_HEADER_LEN as u16 + payload_len,
            checksum: 0,
        }
    }

    /// Writes the header in network byte order
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u16(self.source_port);
        dst.put_u16(self.destination_port);
        dst.put_u16(self.length);
        dst.put_u16(self.checksum);
    }

    /// Returns the serialized header
    pub fn to_bytes(&self) -> [u8; UDP_HEADER_LEN] {
        let mut out = [0u8; UDP_HEADER_LEN];
        self.encode(&mut &mut out[..]);
        out
    }
}

/// Checksum-only header binding a UDP checksum to its IP addresses.
/// Never transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpPseudoHeader {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub protocol: u8,
    /// Must equal the UDP header's length field
    pub length: u16,
}

impl UdpPseudoHeader {
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, payload_len: u16) -> Self {
        UdpPseudoHeader {
            source,
            destination,
            protocol: IPPROTO_UDP,
            length: UDP_HEADER_LEN as u16 + payload_len,
        }
    }

    /// Writes the pseudo header in network byte order
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(&self.source.octets());
        dst.put_slice(&self.destination.octets());
        dst.put_u8(0);
        dst.put_u8(self.protocol);
        dst.put_u16(self.length);
    }

    /// Returns the serialized pseudo header
    pub fn to_bytes(&self) -> [u8; UDP_PSEUDO_HEADER_LEN] {
        let mut out = [0u8; UDP_PSEUDO_HEADER_LEN];
        self.encode(&mut &mut out[..]);
        out
    }
}
