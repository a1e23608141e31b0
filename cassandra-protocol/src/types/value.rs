//! `[value]`: a bound query parameter. Column-type-specific encoding (ints, text, collections,
//! UDTs, ...) is an external collaborator per the scope of this crate; `Value` only carries the
//! already-encoded bytes plus the three wire states a parameter can be in.

use std::io::Cursor;

use crate::types::{serialize_bytes, CInt, Serialize};

/// The three states a bound `[value]` can take on the wire: present, `NULL`, or `NOT_SET`
/// (protocol v4+, lets the server use the column default / skip the write).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Some(Vec<u8>),
    Null,
    NotSet,
}

impl Value {
    pub fn is_not_set(&self) -> bool {
        matches!(self, Value::NotSet)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Some(bytes)
    }
}

impl From<super::blob::Blob> for Value {
    fn from(blob: super::blob::Blob) -> Self {
        Value::Some(blob.into_vec())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Some(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Some(s.into_bytes())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Some(v.to_be_bytes().to_vec())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Some(v.to_be_bytes().to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl Serialize for Value {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        match self {
            Value::Some(bytes) => serialize_bytes(cursor, Some(bytes)),
            Value::Null => (-1i32 as CInt).serialize(cursor),
            Value::NotSet => (-2i32 as CInt).serialize(cursor),
        }
    }
}
