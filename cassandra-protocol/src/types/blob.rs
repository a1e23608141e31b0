//! A thin newtype over raw bytes for the CQL `blob` type, kept distinct from `Vec<u8>` so
//! query-value conversions don't collide with other byte-carrying types.

use std::ops::Deref;

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Blob(Vec<u8>);

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
