use std::collections::HashMap;
use std::io::Cursor;

use crate::types::value::Value;
use crate::types::{serialize_str, CIntShort, Serialize};

/// Bound values for a query, either positional or named (`NAMES_FOR_VALUES`). Named values are
/// rarely used (they cost an extra string per parameter) but the protocol supports them and the
/// query-flags encoding has to know which shape it's writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValues {
    SimpleValues(Vec<Value>),
    NamedValues(HashMap<String, Value>),
}

impl QueryValues {
    pub fn is_empty(&self) -> bool {
        match self {
            QueryValues::SimpleValues(v) => v.is_empty(),
            QueryValues::NamedValues(v) => v.is_empty(),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, QueryValues::NamedValues(_))
    }

    pub fn len(&self) -> usize {
        match self {
            QueryValues::SimpleValues(v) => v.len(),
            QueryValues::NamedValues(v) => v.len(),
        }
    }
}

impl From<Vec<Value>> for QueryValues {
    fn from(values: Vec<Value>) -> Self {
        QueryValues::SimpleValues(values)
    }
}

impl From<HashMap<String, Value>> for QueryValues {
    fn from(values: HashMap<String, Value>) -> Self {
        QueryValues::NamedValues(values)
    }
}

impl Serialize for QueryValues {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        match self {
            QueryValues::SimpleValues(values) => {
                (values.len() as CIntShort).serialize(cursor);
                for value in values {
                    value.serialize(cursor);
                }
            }
            QueryValues::NamedValues(values) => {
                (values.len() as CIntShort).serialize(cursor);
                for (name, value) in values {
                    serialize_str(cursor, name);
                    value.serialize(cursor);
                }
            }
        }
    }
}
