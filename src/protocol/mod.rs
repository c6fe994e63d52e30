//! Wire formats of the request and the reply
//!
//! This module lays out the IPv4, UDP and NTP headers byte for byte,
//! computes their checksums and decodes the server's reply.

pub mod checksum;
pub mod codec;
pub mod header;
pub mod message;
pub mod packet;

pub use self::checksum::checksum;
pub use self::codec::NtpCodec;
pub use self::header::{IpHeader, UdpHeader, UdpPseudoHeader};
pub use self::message::{LeapIndicator, Mode, NtpMessage, NtpTimestamp};
pub use self::packet::{assemble, Datagram};
