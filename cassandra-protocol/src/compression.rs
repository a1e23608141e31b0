//! Frame-body compression, negotiated during STARTUP against the `COMPRESSION` option the
//! server advertised in its SUPPORTED response.

use crate::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Lz4,
    Snappy,
}

impl Compression {
    /// The `COMPRESSION` STARTUP option value, or `None` when no compression was negotiated.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Lz4 => Some("lz4"),
            Compression::Snappy => Some("snappy"),
        }
    }

    pub fn encode(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Compression::None => bytes.to_vec(),
            Compression::Lz4 => {
                // Cassandra's lz4 framing prefixes the uncompressed length as a big-endian
                // [int], which lz4_flex's block API does not add on its own.
                let mut out = Vec::with_capacity(bytes.len() + 4);
                out.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                out.extend_from_slice(&lz4_flex::block::compress(bytes));
                out
            }
            Compression::Snappy => snap::raw::Encoder::new()
                .compress_vec(bytes)
                .unwrap_or_default(),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> error::Result<Vec<u8>> {
        match self {
            Compression::None => Ok(bytes.to_vec()),
            Compression::Lz4 => {
                if bytes.len() < 4 {
                    return Err(error::Error::General("truncated lz4 frame body".into()));
                }
                let (len_bytes, payload) = bytes.split_at(4);
                let len = i32::from_be_bytes(len_bytes.try_into().unwrap()) as usize;
                lz4_flex::block::decompress(payload, len)
                    .map_err(|e| error::Error::General(format!("lz4 decompress error: {e}")))
            }
            Compression::Snappy => snap::raw::Decoder::new()
                .decompress_vec(bytes)
                .map_err(|e| error::Error::General(format!("snappy decompress error: {e}"))),
        }
    }
}
