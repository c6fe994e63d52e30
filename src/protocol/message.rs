use bytes::{Buf, BufMut};

use crate::core::{Error, Result, NTP_MESSAGE_LEN};

/// Leap second warning carried in the top two bits of the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeapIndicator {
    NoWarning,
    /// Last minute of the day has 61 seconds
    InsertSecond,
    /// Last minute of the day has 59 seconds
    DeleteSecond,
    /// Clock not synchronized
    Unsynchronized,
}

impl LeapIndicator {
    fn bits(self) -> u8 {
        match self {
            LeapIndicator::NoWarning => 0,
            LeapIndicator::InsertSecond => 1,
            LeapIndicator::DeleteSecond => 2,
            LeapIndicator::Unsynchronized => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => LeapIndicator::NoWarning,
            1 => LeapIndicator::InsertSecond,
            2 => LeapIndicator::DeleteSecond,
            _ => LeapIndicator::Unsynchronized,
        }
    }
}

/// Association mode in the low three bits of the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Reserved,
    SymmetricActive,
    SymmetricPassive,
    Client,
    Server,
    Broadcast,
    Control,
    Private,
}

impl Mode {
    fn bits(self) -> u8 {
        match self {
            Mode::Reserved => 0,
            Mode::SymmetricActive => 1,
            Mode::SymmetricPassive => 2,
            Mode::Client => 3,
            Mode::Server => 4,
            Mode::Broadcast => 5,
            Mode::Control => 6,
            Mode::Private => 7,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Mode::Reserved,
            1 => Mode::SymmetricActive,
            2 => Mode::SymmetricPassive,
            3 => Mode::Client,
            4 => Mode::Server,
            5 => Mode::Broadcast,
            6 => Mode::Control,
            _ => Mode::Private,
        }
    }
}

/// Packs leap indicator (bits 7-6), version (bits 5-3) and mode (bits 2-0)
pub fn pack_status(leap: LeapIndicator, version: u8, mode: Mode) -> u8 {
    (leap.bits() << 6) | ((version & 0b111) << 3) | mode.bits()
}

/// Splits a status byte into leap indicator, version and mode
pub fn unpack_status(status: u8) -> (LeapIndicator, u8, Mode) {
    (
        LeapIndicator::from_bits(status >> 6),
        (status >> 3) & 0b111,
        Mode::from_bits(status),
    )
}

/// 64-bit NTP fixed-point timestamp: seconds since 1900 plus a 32-bit fraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct NtpTimestamp {
    pub seconds: u32,
    pub fraction: u32,
}

impl NtpTimestamp {
    pub const ZERO: NtpTimestamp = NtpTimestamp { seconds: 0, fraction: 0 };

    pub fn new(seconds: u32, fraction: u32) -> Self {
        NtpTimestamp { seconds, fraction }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32(self.seconds);
        dst.put_u32(self.fraction);
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        NtpTimestamp {
            seconds: src.get_u32(),
            fraction: src.get_u32(),
        }
    }
}

/// NTP message header, 48 bytes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtpMessage {
    pub leap: LeapIndicator,
    pub version: u8,
    pub mode: Mode,
    pub stratum: u8,
    /// log2 of the poll interval in seconds
    pub poll: i8,
    /// log2 of the clock precision in seconds
    pub precision: i8,
    /// NTP short format (16.16)
    pub root_delay: u32,
    /// NTP short format (16.16)
    pub root_dispersion: u32,
    pub reference_id: [u8; 4],
    pub reference: NtpTimestamp,
    pub originate: NtpTimestamp,
    pub receive: NtpTimestamp,
    pub transmit: NtpTimestamp,
}

impl NtpMessage {
    /// Empty client request: everything zero except version and mode
    pub fn client_request(version: u8) -> Self {
        NtpMessage {
            leap: LeapIndicator::NoWarning,
            version,
            mode: Mode::Client,
            stratum: 0,
            poll: 0,
            precision: 0,
            root_delay: 0,
            root_dispersion: 0,
            reference_id: [0; 4],
            reference: NtpTimestamp::ZERO,
            originate: NtpTimestamp::ZERO,
            receive: NtpTimestamp::ZERO,
            transmit: NtpTimestamp::ZERO,
        }
    }

    /// The packed first byte of the message
    pub fn status(&self) -> u8 {
        pack_status(self.leap, self.version, self.mode)
    }

    /// Writes the 48-byte message in network byte order
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.status());
        dst.put_u8(self.stratum);
        dst.put_i8(self.poll);
        dst.put_i8(self.precision);
        dst.put_u32(self.root_delay);
        dst.put_u32(self.root_dispersion);
        dst.put_slice(&self.reference_id);
        self.reference.encode(dst);
        self.originate.encode(dst);
        self.receive.encode(dst);
        self.transmit.encode(dst);
    }

    /// Returns the serialized message
    pub fn to_bytes(&self) -> [u8; NTP_MESSAGE_LEN] {
        let mut out = [0u8; NTP_MESSAGE_LEN];
        self.encode(&mut &mut out[..]);
        out
    }

    /// Reads a message from the first 48 bytes of `src`.
    /// Anything past the header (extension fields, MAC) is left unread.
    pub fn decode<B: Buf>(src: &mut B) -> Result<Self> {
        if src.remaining() < NTP_MESSAGE_LEN {
            return Err(Error::malformed(format!(
                "expected {} bytes, got {}",
                NTP_MESSAGE_LEN,
                src.remaining()
            )));
        }

        let (leap, version, mode) = unpack_status(src.get_u8());
        let stratum = src.get_u8();
        let poll = src.get_i8();
        let precision = src.get_i8();
        let root_delay = src.get_u32();
        let root_dispersion = src.get_u32();
        let mut reference_id = [0u8; 4];
        src.copy_to_slice(&mut reference_id);

        Ok(NtpMessage {
            leap,
            version,
            mode,
            stratum,
            poll,
            precision,
            root_delay,
            root_dispersion,
            reference_id,
            reference: NtpTimestamp::decode(src),
            originate: NtpTimestamp::decode(src),
            receive: NtpTimestamp::decode(src),
            transmit: NtpTimestamp::decode(src),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_reply() -> NtpMessage {
        NtpMessage {
            leap: LeapIndicator::NoWarning,
            version: 3,
            mode: Mode::Server,
            stratum: 2,
            poll: 6,
            precision: -20,
            root_delay: 0x0000_0A3D,
            root_dispersion: 0x0000_1234,
            reference_id: [192, 0, 2, 10],
            reference: NtpTimestamp::new(3_913_055_000, 0),
            originate: NtpTimestamp::ZERO,
            receive: NtpTimestamp::new(3_913_055_999, 0x8000_0000),
            transmit: NtpTimestamp::new(3_913_056_000, 0x4000_0000),
        }
    }

    #[test]
    fn test_client_status_byte() {
        assert_eq!(pack_status(LeapIndicator::NoWarning, 3, Mode::Client), 0x1B);
        assert_eq!(pack_status(LeapIndicator::NoWarning, 4, Mode::Client), 0x23);
        assert_eq!(pack_status(LeapIndicator::Unsynchronized, 4, Mode::Server), 0xE4);
    }

    #[test]
    fn test_status_unpacking() {
        assert_eq!(unpack_status(0x1C), (LeapIndicator::NoWarning, 3, Mode::Server));
        assert_eq!(unpack_status(0xE3), (LeapIndicator::Unsynchronized, 4, Mode::Client));
        assert_eq!(unpack_status(0x65), (LeapIndicator::InsertSecond, 4, Mode::Broadcast));
    }

    #[test]
    fn test_client_request_bytes() {
        let bytes = NtpMessage::client_request(3).to_bytes();
        assert_eq!(bytes[0], 0x1B);
        assert!(bytes[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_message_field_offsets() {
        let bytes = server_reply().to_bytes();
        assert_eq!(bytes[0], 0x1C);
        assert_eq!(bytes[1], 2);
        assert_eq!(bytes[2], 6);
        assert_eq!(bytes[3], 0xEC);
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x0A, 0x3D]);
        assert_eq!(&bytes[12..16], &[192, 0, 2, 10]);
        // Transmit timestamp occupies the last eight bytes
        assert_eq!(&bytes[40..44], &3_913_056_000u32.to_be_bytes());
        assert_eq!(&bytes[44..48], &[0x40, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_server_reply() {
        let reply = server_reply();
        let bytes = reply.to_bytes();
        let decoded = NtpMessage::decode(&mut &bytes[..]).unwrap();
        assert_eq!(decoded, reply);
    }

    #[test]
    fn test_decode_ignores_extension_fields() {
        let mut bytes = server_reply().to_bytes().to_vec();
        bytes.extend_from_slice(&[0xAA; 20]);

        let mut src = &bytes[..];
        let decoded = NtpMessage::decode(&mut src).unwrap();
        assert_eq!(decoded.transmit.seconds, 3_913_056_000);
        assert_eq!(src.len(), 20);
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = server_reply().to_bytes();
        let result = NtpMessage::decode(&mut &bytes[..47]);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }
}
