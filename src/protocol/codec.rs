use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::core::{Error, Result, NTP_MESSAGE_LEN};
use super::message::NtpMessage;

/// Decodes one NTP message per received datagram
///
/// Meant for datagram framing: a short datagram is a malformed frame rather
/// than a reason to wait for more bytes, and trailing extension fields are
/// dropped. Malformed frames are yielded as items so the caller can still
/// see who sent them; only socket errors end the stream.
#[derive(Clone, Default)]
pub struct NtpCodec;

impl NtpCodec {
    /// Creates a new NTP codec
    pub fn new() -> Self {
        NtpCodec
    }
}

impl Decoder for NtpCodec {
    type Item = Result<NtpMessage>;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        if src.len() < NTP_MESSAGE_LEN {
            let len = src.len();
            src.clear();
            return Ok(Some(Err(Error::malformed(format!(
                "datagram of {} bytes is shorter than an NTP header",
                len
            )))));
        }

        let mut message_bytes = src.split_to(NTP_MESSAGE_LEN);
        if !src.is_empty() {
            tracing::debug!("Ignoring {} bytes of extension fields", src.len());
            src.clear();
        }

        Ok(Some(NtpMessage::decode(&mut message_bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{Mode, NtpTimestamp};

    fn reply_bytes() -> BytesMut {
        let mut reply = NtpMessage::client_request(3);
        reply.mode = Mode::Server;
        reply.stratum = 1;
        reply.transmit = NtpTimestamp::new(3_913_056_000, 0);
        BytesMut::from(&reply.to_bytes()[..])
    }

    #[test]
    fn test_codec_decodes_reply() {
        let mut codec = NtpCodec::new();
        let mut bytes = reply_bytes();

        let decoded = codec.decode(&mut bytes).unwrap().unwrap().unwrap();
        assert_eq!(decoded.mode, Mode::Server);
        assert_eq!(decoded.transmit.seconds, 3_913_056_000);
        assert!(bytes.is_empty());

        // Nothing left for a second frame
        assert!(codec.decode(&mut bytes).unwrap().is_none());
    }

    #[test]
    fn test_codec_drops_extensions() {
        let mut codec = NtpCodec::new();
        let mut bytes = reply_bytes();
        bytes.extend_from_slice(&[0u8; 24]);

        assert!(codec.decode(&mut bytes).unwrap().unwrap().is_ok());
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_codec_rejects_short_datagram() {
        let mut codec = NtpCodec::new();
        let mut bytes = BytesMut::from(&[0x1Cu8, 0x01, 0x00][..]);

        // The frame is malformed, the stream itself is not
        let frame = codec.decode(&mut bytes).unwrap().unwrap();
        assert!(matches!(frame, Err(Error::MalformedResponse(_))));
        assert!(bytes.is_empty());
    }
}
