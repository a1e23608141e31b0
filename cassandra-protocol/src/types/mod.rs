//! Wire primitives for the CQL binary protocol: `[int]`, `[short]`, `[long]`, `[string]`,
//! `[bytes]`, `[string map]` and friends, plus the `Serialize` / `FromCursor` traits every
//! frame body is built from. No I/O happens here — only encode/decode against an in-memory
//! cursor.

pub mod blob;
pub mod value;

use std::collections::HashMap;
use std::convert::TryInto;
use std::io::Cursor;
use std::io::Read;

use crate::error;

/// `[int]` on the wire: a 4-byte signed big-endian integer.
pub type CInt = i32;
/// `[short]` on the wire: a 2-byte unsigned big-endian integer.
pub type CIntShort = i16;
/// `[long]` on the wire: an 8-byte signed big-endian integer.
pub type CLong = i64;

/// Implemented by every type that can be written into a frame body.
pub trait Serialize {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>);

    /// Convenience used by request encoders: serialize into a fresh, tightly-sized buffer.
    fn serialize_to_vec(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut cursor = Cursor::new(&mut bytes);
        self.serialize(&mut cursor);
        bytes
    }
}

/// Implemented by every type that can be read back out of a frame body.
pub trait FromCursor: Sized {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self>;
}

impl Serialize for CInt {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        cursor.get_mut().extend_from_slice(&self.to_be_bytes());
    }
}

impl FromCursor for CInt {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        read_be::<4>(cursor).map(i32::from_be_bytes)
    }
}

impl Serialize for CIntShort {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        cursor.get_mut().extend_from_slice(&self.to_be_bytes());
    }
}

impl FromCursor for CIntShort {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        read_be::<2>(cursor).map(i16::from_be_bytes)
    }
}

impl Serialize for CLong {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        cursor.get_mut().extend_from_slice(&self.to_be_bytes());
    }
}

impl FromCursor for CLong {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        read_be::<8>(cursor).map(i64::from_be_bytes)
    }
}

fn read_be<const N: usize>(cursor: &mut Cursor<&[u8]>) -> error::Result<[u8; N]> {
    let mut buf = [0u8; N];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads a `[short]`-prefixed UTF-8 string (`[string]` on the wire) without allocating an
/// intermediate owned copy; callers that need to keep it convert with `.to_string()`.
pub fn from_cursor_str<'a>(cursor: &mut Cursor<&'a [u8]>) -> error::Result<&'a str> {
    let len = CIntShort::from_cursor(cursor)? as usize;
    let position = cursor.position() as usize;
    let buf: &'a [u8] = *cursor.get_ref();
    let slice = buf
        .get(position..position + len)
        .ok_or_else(|| error::Error::General("not enough bytes for [string]".into()))?;
    cursor.set_position((position + len) as u64);
    Ok(std::str::from_utf8(slice)?)
}

/// Reads a `[int]`-prefixed UTF-8 string (`[long string]` on the wire).
pub fn from_cursor_long_str<'a>(cursor: &mut Cursor<&'a [u8]>) -> error::Result<&'a str> {
    let len = CInt::from_cursor(cursor)? as usize;
    let position = cursor.position() as usize;
    let buf: &'a [u8] = *cursor.get_ref();
    let slice = buf
        .get(position..position + len)
        .ok_or_else(|| error::Error::General("not enough bytes for [long string]".into()))?;
    cursor.set_position((position + len) as u64);
    Ok(std::str::from_utf8(slice)?)
}

/// Writes a `[string]`: `[short] len` followed by `len` UTF-8 bytes.
pub fn serialize_str(cursor: &mut Cursor<&mut Vec<u8>>, value: &str) {
    (value.len() as CIntShort).serialize(cursor);
    cursor.get_mut().extend_from_slice(value.as_bytes());
}

/// Writes a `[long string]`: `[int]` len followed by `len` UTF-8 bytes.
pub fn serialize_long_str(cursor: &mut Cursor<&mut Vec<u8>>, value: &str) {
    (value.len() as CInt).serialize(cursor);
    cursor.get_mut().extend_from_slice(value.as_bytes());
}

/// `[string list]`.
impl Serialize for Vec<String> {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        (self.len() as CIntShort).serialize(cursor);
        for s in self {
            serialize_str(cursor, s);
        }
    }
}

impl FromCursor for Vec<String> {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let len = CIntShort::from_cursor(cursor)?;
        let mut result = Vec::with_capacity(len.max(0) as usize);
        for _ in 0..len {
            result.push(from_cursor_str(cursor)?.to_string());
        }
        Ok(result)
    }
}

/// `[string multimap]`: used by the SUPPORTED response body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringMultimap {
    pub data: HashMap<String, Vec<String>>,
}

impl FromCursor for StringMultimap {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let len = CIntShort::from_cursor(cursor)?;
        let mut data = HashMap::with_capacity(len.max(0) as usize);
        for _ in 0..len {
            let key = from_cursor_str(cursor)?.to_string();
            let value = Vec::<String>::from_cursor(cursor)?;
            data.insert(key, value);
        }
        Ok(StringMultimap { data })
    }
}

/// `[bytes]`: an `[int]` length (negative means "null") followed by that many raw bytes.
pub fn serialize_bytes(cursor: &mut Cursor<&mut Vec<u8>>, bytes: Option<&[u8]>) {
    match bytes {
        Some(bytes) => {
            (bytes.len() as CInt).serialize(cursor);
            cursor.get_mut().extend_from_slice(bytes);
        }
        None => (-1i32).serialize(cursor),
    }
}

pub fn from_cursor_bytes(cursor: &mut Cursor<&[u8]>) -> error::Result<Option<Vec<u8>>> {
    let len = CInt::from_cursor(cursor)?;
    if len < 0 {
        return Ok(None);
    }

    let mut buf = vec![0u8; len as usize];
    cursor.read_exact(&mut buf)?;
    Ok(Some(buf))
}

/// `[short bytes]`: a `[short]` length followed by that many raw bytes. Used for prepared ids.
pub fn serialize_short_bytes(cursor: &mut Cursor<&mut Vec<u8>>, bytes: &[u8]) {
    (bytes.len() as CIntShort).serialize(cursor);
    cursor.get_mut().extend_from_slice(bytes);
}

pub fn from_cursor_short_bytes(cursor: &mut Cursor<&[u8]>) -> error::Result<Vec<u8>> {
    let len = CIntShort::from_cursor(cursor)?;
    let mut buf = vec![0u8; len.max(0) as usize];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}

/// `[uuid]`: 16 raw bytes, big-endian per RFC 4122. `uuid::Uuid` byte order already matches.
impl Serialize for uuid::Uuid {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        cursor.get_mut().extend_from_slice(self.as_bytes());
    }
}

impl FromCursor for uuid::Uuid {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let bytes: [u8; 16] = read_be(cursor)?;
        Ok(uuid::Uuid::from_bytes(bytes))
    }
}

/// `[inet]`: a one-byte address length (4 or 16) followed by the raw address bytes and a
/// 4-byte port.
pub fn serialize_inet(cursor: &mut Cursor<&mut Vec<u8>>, addr: std::net::SocketAddr) {
    match addr.ip() {
        std::net::IpAddr::V4(ip) => {
            cursor.get_mut().push(4);
            cursor.get_mut().extend_from_slice(&ip.octets());
        }
        std::net::IpAddr::V6(ip) => {
            cursor.get_mut().push(16);
            cursor.get_mut().extend_from_slice(&ip.octets());
        }
    }
    (addr.port() as CInt).serialize(cursor);
}

pub fn from_cursor_inet(cursor: &mut Cursor<&[u8]>) -> error::Result<std::net::SocketAddr> {
    let mut len_buf = [0u8; 1];
    cursor.read_exact(&mut len_buf)?;

    let ip = match len_buf[0] {
        4 => {
            let octets: [u8; 4] = read_be(cursor)?;
            std::net::IpAddr::V4(std::net::Ipv4Addr::from(octets))
        }
        16 => {
            let octets: [u8; 16] = read_be(cursor)?;
            std::net::IpAddr::V6(std::net::Ipv6Addr::from(octets))
        }
        other => {
            return Err(error::Error::General(format!(
                "invalid [inet] address length byte: {other}"
            )))
        }
    };

    let port = CInt::from_cursor(cursor)?;
    let port: u16 = port
        .try_into()
        .map_err(|_| error::Error::General("negative [inet] port".into()))?;
    Ok(std::net::SocketAddr::new(ip, port))
}
