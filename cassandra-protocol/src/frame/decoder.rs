//! Accumulates socket bytes into whole frames, one header+body at a time.
//!
//! The contract (§4.2 of the design): `consume` eats exactly the bytes belonging to the frame
//! it is currently assembling and tells the caller how many bytes it took. Bytes belonging to
//! the *next* frame, if any arrived in the same read, are left untouched for the following call.
//! A malformed frame (declared length absurd, or flag sub-decoders failing) is reported as an
//! error; the caller (the owning connection) is expected to treat that as fatal and defunct.

use crate::compression::Compression;
use crate::error;
use crate::frame::{strip_response_prefixes, Direction, Flags, Frame, FrameHeader, Opcode};

/// An upper bound on a single frame's declared body length, to avoid a malicious or corrupted
/// length prefix causing an unbounded allocation before the frame is known to be well-formed.
const MAX_FRAME_BODY_LEN: usize = 256 * 1024 * 1024;

enum Stage {
    AwaitingHeader,
    AwaitingBody { header: FrameHeader },
}

pub struct FrameDecoder {
    compression: Compression,
    stage: Stage,
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new(compression: Compression) -> Self {
        FrameDecoder {
            compression,
            stage: Stage::AwaitingHeader,
            buf: Vec::new(),
        }
    }

    pub fn set_compression(&mut self, compression: Compression) {
        self.compression = compression;
    }

    /// Feeds newly-read socket bytes in. Returns every whole frame that became available.
    pub fn feed(&mut self, bytes: &[u8]) -> error::Result<Vec<Frame>> {
        self.buf.extend_from_slice(bytes);

        let mut frames = Vec::new();
        loop {
            match self.try_decode_one()? {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }

        Ok(frames)
    }

    fn try_decode_one(&mut self) -> error::Result<Option<Frame>> {
        loop {
            match &self.stage {
                Stage::AwaitingHeader => {
                    // The header length depends on the version byte, which is always the
                    // first byte, so peek one byte before deciding how many we need.
                    if self.buf.is_empty() {
                        return Ok(None);
                    }

                    let version = crate::frame::Version::try_from(self.buf[0]);
                    let header_len = match version {
                        Ok(v) => v.header_len(),
                        // Pre-v1 / garbage version byte: still need a header-sized chunk to
                        // synthesize the invalid-protocol response below, assume the widest.
                        Err(_) => crate::frame::HEADER_LEN_V3_PLUS,
                    };

                    if self.buf.len() < header_len {
                        return Ok(None);
                    }

                    let header = match FrameHeader::parse(&self.buf[..header_len]) {
                        Ok(header) => header,
                        Err(_) => {
                            // Unknown/garbled version: synthesize the sentinel the startup
                            // state machine uses to trigger a version downgrade, consuming
                            // just the header so the connection can be torn down cleanly.
                            self.buf.drain(..header_len);
                            return Ok(Some(invalid_protocol_error_response()));
                        }
                    };

                    if header.body_len > MAX_FRAME_BODY_LEN {
                        return Err(error::Error::General(format!(
                            "frame body length {} exceeds maximum {}",
                            header.body_len, MAX_FRAME_BODY_LEN
                        )));
                    }

                    self.buf.drain(..header_len);
                    self.stage = Stage::AwaitingBody { header };
                }
                Stage::AwaitingBody { header } => {
                    if self.buf.len() < header.body_len {
                        return Ok(None);
                    }

                    let header = *header;
                    let raw_body: Vec<u8> = self.buf.drain(..header.body_len).collect();
                    self.stage = Stage::AwaitingHeader;

                    let body = if header.flags.contains(Flags::COMPRESSION) {
                        self.compression.decode(&raw_body)?
                    } else {
                        raw_body
                    };

                    let opcode = Opcode::try_from(header.opcode_byte)?;
                    let (tracing_id, warnings, prefix_len) =
                        strip_response_prefixes(header.flags, &body)?;

                    let frame = Frame {
                        version: header.version,
                        direction: Direction::Response,
                        flags: header.flags,
                        opcode,
                        stream_id: header.stream_id,
                        body: body[prefix_len..].to_vec(),
                        tracing_id,
                        warnings,
                    };

                    return Ok(Some(frame));
                }
            }
        }
    }
}

/// For protocol versions the server doesn't recognize (or pre-v1 garbage), the wire body is
/// never parsed; this stands in for a real ERROR(PROTOCOL_ERROR) frame so the startup state
/// machine's existing `INVALID_PROTOCOL` path handles it uniformly.
fn invalid_protocol_error_response() -> Frame {
    use crate::frame::frame_error::{ErrorBody, ErrorType};
    use crate::types::Serialize;

    let body = ErrorBody {
        error_code: ErrorType::Protocol as i32,
        message: "unsupported or invalid protocol version".to_string(),
        additional_info: crate::frame::frame_error::AdditionalErrorInfo::Server,
    };

    Frame::new(
        crate::frame::Version::V3,
        Direction::Response,
        Flags::empty(),
        Opcode::Error,
        body.serialize_to_vec(),
        None,
        vec![],
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::frame_ready::BodyResReady;
    use crate::types::Serialize;

    #[test]
    fn decodes_a_single_frame_split_across_two_reads() {
        let body = BodyResReady.serialize_to_vec();
        let frame = Frame::new(
            crate::frame::Version::V4,
            Direction::Response,
            Flags::empty(),
            Opcode::Ready,
            body,
            None,
            vec![],
        );
        let wire = frame.encode_with_stream_id(7, Compression::None);

        let mut decoder = FrameDecoder::new(Compression::None);
        let mid = wire.len() / 2;

        assert!(decoder.feed(&wire[..mid]).unwrap().is_empty());
        let frames = decoder.feed(&wire[mid..]).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].opcode, Opcode::Ready);
        assert_eq!(frames[0].stream_id, 7);
    }

    #[test]
    fn leaves_trailing_bytes_for_the_next_call() {
        let body = BodyResReady.serialize_to_vec();
        let frame = Frame::new(
            crate::frame::Version::V4,
            Direction::Response,
            Flags::empty(),
            Opcode::Ready,
            body,
            None,
            vec![],
        );
        let wire = frame.encode_with_stream_id(1, Compression::None);

        let mut two_frames = wire.clone();
        two_frames.extend_from_slice(&wire);

        let mut decoder = FrameDecoder::new(Compression::None);
        let frames = decoder.feed(&two_frames).unwrap();
        assert_eq!(frames.len(), 2);
    }
}
