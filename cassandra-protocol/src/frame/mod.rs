//! The CQL binary protocol envelope: header, flags, opcode dispatch, and the incremental
//! decoder that turns a byte stream into whole frames.

pub mod decoder;
pub mod events;
pub mod frame_auth_challenge;
pub mod frame_auth_response;
pub mod frame_auth_success;
pub mod frame_authenticate;
pub mod frame_batch;
pub mod frame_error;
pub mod frame_event;
pub mod frame_execute;
pub mod frame_options;
pub mod frame_prepare;
pub mod frame_query;
pub mod frame_ready;
pub mod frame_register;
pub mod frame_response;
pub mod frame_result;
pub mod frame_startup;
pub mod frame_supported;

use std::convert::TryFrom;
use std::io::Cursor;

use bitflags::bitflags;
use derive_more::Display;
use uuid::Uuid;

use crate::error;
use crate::frame::frame_response::ResponseBody;
use crate::types::{from_cursor_bytes, serialize_bytes, CInt, FromCursor, Serialize};

/// v3+ header is 9 bytes; v1/v2 is 8 (no length high byte... actually one fewer opcode byte is
/// not true, the difference is the stream id width: 1 byte in v1/v2, 2 bytes in v3+).
pub const HEADER_LEN_V1_V2: usize = 8;
pub const HEADER_LEN_V3_PLUS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum Version {
    #[display("v1")]
    V1,
    #[display("v2")]
    V2,
    #[display("v3")]
    V3,
    #[display("v4")]
    V4,
    #[display("v5")]
    V5,
}

impl Version {
    pub fn header_len(self) -> usize {
        if self >= Version::V3 {
            HEADER_LEN_V3_PLUS
        } else {
            HEADER_LEN_V1_V2
        }
    }

    /// Highest version this driver knows how to negotiate down from.
    pub const LATEST: Version = Version::V5;

    /// The minimum version at which every feature in this spec (paging, serial consistency,
    /// named values, protocol-level events) is available. Below this, STARTUP is attempted
    /// purely to discover the server's actual supported range via its ERROR response.
    pub const MIN_FULL_FEATURED: Version = Version::V3;

    pub fn next_lower(self) -> Option<Version> {
        match self {
            Version::V5 => Some(Version::V4),
            Version::V4 => Some(Version::V3),
            Version::V3 => Some(Version::V2),
            Version::V2 => Some(Version::V1),
            Version::V1 => None,
        }
    }

    fn as_request_byte(self) -> u8 {
        match self {
            Version::V1 => 0x01,
            Version::V2 => 0x02,
            Version::V3 => 0x03,
            Version::V4 => 0x04,
            Version::V5 => 0x05,
        }
    }

    fn as_response_byte(self) -> u8 {
        self.as_request_byte() | 0x80
    }
}

impl TryFrom<u8> for Version {
    type Error = error::Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte & 0x7F {
            0x01 => Version::V1,
            0x02 => Version::V2,
            0x03 => Version::V3,
            0x04 => Version::V4,
            0x05 => Version::V5,
            other => {
                return Err(error::Error::General(format!(
                    "unsupported protocol version byte 0x{other:02X}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

bitflags! {
    /// Frame header flags (byte 1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u8 {
        const COMPRESSION   = 0x01;
        const TRACING       = 0x02;
        const CUSTOM_PAYLOAD = 0x04;
        const WARNING       = 0x08;
        const BETA          = 0x10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Error = 0x00,
    Startup = 0x01,
    Ready = 0x02,
    Authenticate = 0x03,
    Options = 0x05,
    Supported = 0x06,
    Query = 0x07,
    Result = 0x08,
    Prepare = 0x09,
    Execute = 0x0A,
    Register = 0x0B,
    Event = 0x0C,
    Batch = 0x0D,
    AuthChallenge = 0x0E,
    AuthResponse = 0x0F,
    AuthSuccess = 0x10,
}

impl TryFrom<u8> for Opcode {
    type Error = error::Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x00 => Opcode::Error,
            0x01 => Opcode::Startup,
            0x02 => Opcode::Ready,
            0x03 => Opcode::Authenticate,
            0x05 => Opcode::Options,
            0x06 => Opcode::Supported,
            0x07 => Opcode::Query,
            0x08 => Opcode::Result,
            0x09 => Opcode::Prepare,
            0x0A => Opcode::Execute,
            0x0B => Opcode::Register,
            0x0C => Opcode::Event,
            0x0D => Opcode::Batch,
            0x0E => Opcode::AuthChallenge,
            0x0F => Opcode::AuthResponse,
            0x10 => Opcode::AuthSuccess,
            other => {
                return Err(error::Error::General(format!(
                    "unknown opcode 0x{other:02X}"
                )))
            }
        })
    }
}

/// A single CQL frame: header fields plus an already-decompressed body.
///
/// For a request, `body` is the pre-serialized opcode-specific payload and `stream_id` is a
/// placeholder until the owning connection assigns one at write time (see
/// `Frame::encode_with_stream_id`). For a response, `body` is the raw decoded bytes and
/// `.response_body()` parses it per `opcode`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub version: Version,
    pub direction: Direction,
    pub flags: Flags,
    pub opcode: Opcode,
    pub stream_id: i16,
    pub body: Vec<u8>,
    pub tracing_id: Option<Uuid>,
    pub warnings: Vec<String>,
}

impl Frame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: Version,
        direction: Direction,
        flags: Flags,
        opcode: Opcode,
        body: Vec<u8>,
        tracing_id: Option<Uuid>,
        warnings: Vec<String>,
    ) -> Self {
        Frame {
            version,
            direction,
            flags,
            opcode,
            stream_id: 0,
            body,
            tracing_id,
            warnings,
        }
    }

    /// Parses the raw body according to `opcode`. Borrows nothing from `self` beyond the
    /// lifetime of the call; returned variants that need bytes clone them out of `self.body`.
    pub fn body(&self) -> error::Result<ResponseBody> {
        ResponseBody::from_bytes(self.opcode, &self.body, self.version)
    }

    /// Serializes header + body for the wire, assigning the given stream id and compressing
    /// the body if `compression` isn't `None`. This is the only place a request frame's
    /// stream id is materialized, keeping the free-list (stream-id multiplexer) as the single
    /// source of truth for "which id is this write using".
    pub fn encode_with_stream_id(
        &self,
        stream_id: i16,
        compression: crate::compression::Compression,
    ) -> Vec<u8> {
        let mut flags = self.flags;
        let body = if compression != crate::compression::Compression::None {
            flags.insert(Flags::COMPRESSION);
            compression.encode(&self.body)
        } else {
            self.body.clone()
        };

        let mut out = Vec::with_capacity(self.version.header_len() + body.len());
        out.push(self.version.as_request_byte());
        out.push(flags.bits());

        if self.version >= Version::V3 {
            out.extend_from_slice(&stream_id.to_be_bytes());
        } else {
            out.push(stream_id as u8);
        }

        out.push(self.opcode as u8);
        out.extend_from_slice(&(body.len() as i32).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }
}

/// Parsed frame header, before the body has necessarily arrived in full.
#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub version: Version,
    pub flags: Flags,
    pub stream_id: i16,
    pub opcode_byte: u8,
    pub body_len: usize,
}

impl FrameHeader {
    /// Parses a complete header (`version.header_len()` bytes). The caller is responsible for
    /// having buffered that many bytes first — `decoder::FrameDecoder` does this.
    pub fn parse(bytes: &[u8]) -> error::Result<FrameHeader> {
        if bytes.is_empty() {
            return Err(error::Error::General("empty header buffer".into()));
        }

        let version = Version::try_from(bytes[0])?;
        let needed = version.header_len();
        if bytes.len() < needed {
            return Err(error::Error::UnexpectedBodyLength {
                expected: needed,
                actual: bytes.len(),
            });
        }

        let flags = Flags::from_bits_truncate(bytes[1]);

        let (stream_id, opcode_byte, len_offset) = if version >= Version::V3 {
            let stream_id = i16::from_be_bytes([bytes[2], bytes[3]]);
            (stream_id, bytes[4], 5)
        } else {
            (bytes[2] as i16, bytes[3], 4)
        };

        let body_len = i32::from_be_bytes([
            bytes[len_offset],
            bytes[len_offset + 1],
            bytes[len_offset + 2],
            bytes[len_offset + 3],
        ]);

        if body_len < 0 {
            return Err(error::Error::General(format!(
                "negative frame body length: {body_len}"
            )));
        }

        Ok(FrameHeader {
            version,
            flags,
            stream_id,
            opcode_byte,
            body_len: body_len as usize,
        })
    }
}

/// Strips the tracing id / warnings / custom-payload prefixes a response body may carry,
/// per the frame's flags, leaving `cursor` positioned at the opcode-specific payload.
pub fn strip_response_prefixes(
    flags: Flags,
    body: &[u8],
) -> error::Result<(Option<Uuid>, Vec<String>, usize)> {
    let mut cursor = Cursor::new(body);

    let tracing_id = if flags.contains(Flags::TRACING) {
        Some(Uuid::from_cursor(&mut cursor)?)
    } else {
        None
    };

    // CUSTOM_PAYLOAD is a [bytes map]; this driver does not expose user payloads back to the
    // application, so the bytes are walked (to advance the cursor) and discarded.
    if flags.contains(Flags::CUSTOM_PAYLOAD) {
        let count = crate::types::CIntShort::from_cursor(&mut cursor)?;
        for _ in 0..count {
            let _key = crate::types::from_cursor_str(&mut cursor)?;
            let _ = from_cursor_bytes(&mut cursor)?;
        }
    }

    let warnings = if flags.contains(Flags::WARNING) {
        Vec::<String>::from_cursor(&mut cursor)?
    } else {
        Vec::new()
    };

    Ok((tracing_id, warnings, cursor.position() as usize))
}

/// Writes the CUSTOM_PAYLOAD `[bytes map]` a request may carry.
pub fn serialize_custom_payload(
    cursor: &mut Cursor<&mut Vec<u8>>,
    payload: &std::collections::HashMap<String, Vec<u8>>,
) {
    (payload.len() as CInt as crate::types::CIntShort).serialize(cursor);
    for (key, value) in payload {
        crate::types::serialize_str(cursor, key);
        serialize_bytes(cursor, Some(value));
    }
}
