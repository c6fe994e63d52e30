//! Core types shared by the rest of the crate
//!
//! Errors, configuration and the fixed wire constants of the request.

pub mod error;
pub mod types;
pub mod serde;

pub use self::error::{Error, Result};
pub use self::types::{Config, PacketParams};

/// Well-known NTP server port
pub const NTP_PORT: u16 = 123;

/// Fixed source port of the hand-built request; the reply is received here
pub const DEFAULT_SOURCE_PORT: u16 = 32776;

/// NTP version announced in requests
pub const DEFAULT_NTP_VERSION: u8 = 3;

/// Maximum TTL
pub const DEFAULT_TTL: u8 = 0xFF;

/// Placeholder IP identification value
pub const DEFAULT_IDENTIFICATION: u16 = 0x0F00;

/// Default receive deadline in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// IANA protocol number of UDP
pub const IPPROTO_UDP: u8 = 17;

/// Size of an IPv4 header without options
pub const IP_HEADER_LEN: usize = 20;

/// Size of a UDP header
pub const UDP_HEADER_LEN: usize = 8;

/// Size of the UDP pseudo header
pub const UDP_PSEUDO_HEADER_LEN: usize = 12;

/// Size of an NTP message without extension fields
pub const NTP_MESSAGE_LEN: usize = 48;

/// Size of the complete request datagram
pub const DATAGRAM_LEN: usize = IP_HEADER_LEN + UDP_HEADER_LEN + NTP_MESSAGE_LEN;
