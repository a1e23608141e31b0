//! Bodies of the RESULT opcode, one variant per `kind` (§6): void, rows, set-keyspace,
//! prepared, schema-change.
//!
//! Row *metadata* (column names and wire type tags) is fully decoded here because it is part of
//! the frame layout. Turning a column's raw bytes into a typed Rust value for arbitrary CQL
//! types is an external collaborator (per spec §1); this module exposes the small set of
//! primitive decoders the control connection needs for `system.local` / `system.peers` /
//! `system_schema.*`, and otherwise leaves a cell as its raw `[bytes]`.

use std::io::Cursor;

use crate::error;
use crate::frame::frame_event::SchemaChangeType;
use crate::types::{
    from_cursor_bytes, from_cursor_inet, from_cursor_str, CInt, CIntShort, FromCursor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Void = 0x01,
    Rows = 0x02,
    SetKeyspace = 0x03,
    Prepared = 0x04,
    SchemaChange = 0x05,
}

impl TryFrom<CInt> for ResultKind {
    type Error = error::Error;

    fn try_from(value: CInt) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => ResultKind::Void,
            0x02 => ResultKind::Rows,
            0x03 => ResultKind::SetKeyspace,
            0x04 => ResultKind::Prepared,
            0x05 => ResultKind::SchemaChange,
            other => {
                return Err(error::Error::General(format!(
                    "unknown RESULT kind 0x{other:08X}"
                )))
            }
        })
    }
}

/// The wire type tag of a column, fully decoded (including nested collection/UDT/tuple
/// element types) because the length of each option varies and has to be walked to find the
/// next column spec — but not resolved into a value decoder here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Custom(String),
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Int,
    Timestamp,
    Uuid,
    Varchar,
    Varint,
    Timeuuid,
    Inet,
    Date,
    Time,
    Smallint,
    Tinyint,
    Duration,
    List(Box<ColumnType>),
    Set(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
    Udt {
        keyspace: String,
        name: String,
        fields: Vec<(String, ColumnType)>,
    },
    Tuple(Vec<ColumnType>),
}

impl FromCursor for ColumnType {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let id = CIntShort::from_cursor(cursor)?;
        Ok(match id {
            0x0000 => ColumnType::Custom(from_cursor_str(cursor)?.to_string()),
            0x0001 => ColumnType::Ascii,
            0x0002 => ColumnType::Bigint,
            0x0003 => ColumnType::Blob,
            0x0004 => ColumnType::Boolean,
            0x0005 => ColumnType::Counter,
            0x0006 => ColumnType::Decimal,
            0x0007 => ColumnType::Double,
            0x0008 => ColumnType::Float,
            0x0009 => ColumnType::Int,
            0x000B => ColumnType::Timestamp,
            0x000C => ColumnType::Uuid,
            0x000D => ColumnType::Varchar,
            0x000E => ColumnType::Varint,
            0x000F => ColumnType::Timeuuid,
            0x0010 => ColumnType::Inet,
            0x0011 => ColumnType::Date,
            0x0012 => ColumnType::Time,
            0x0013 => ColumnType::Smallint,
            0x0014 => ColumnType::Tinyint,
            0x0015 => ColumnType::Duration,
            0x0020 => ColumnType::List(Box::new(ColumnType::from_cursor(cursor)?)),
            0x0021 => {
                let key = ColumnType::from_cursor(cursor)?;
                let value = ColumnType::from_cursor(cursor)?;
                ColumnType::Map(Box::new(key), Box::new(value))
            }
            0x0022 => ColumnType::Set(Box::new(ColumnType::from_cursor(cursor)?)),
            0x0030 => {
                let keyspace = from_cursor_str(cursor)?.to_string();
                let name = from_cursor_str(cursor)?.to_string();
                let count = CIntShort::from_cursor(cursor)?;
                let mut fields = Vec::with_capacity(count.max(0) as usize);
                for _ in 0..count {
                    let field_name = from_cursor_str(cursor)?.to_string();
                    let field_type = ColumnType::from_cursor(cursor)?;
                    fields.push((field_name, field_type));
                }
                ColumnType::Udt {
                    keyspace,
                    name,
                    fields,
                }
            }
            0x0031 => {
                let count = CIntShort::from_cursor(cursor)?;
                let mut elems = Vec::with_capacity(count.max(0) as usize);
                for _ in 0..count {
                    elems.push(ColumnType::from_cursor(cursor)?);
                }
                ColumnType::Tuple(elems)
            }
            other => {
                return Err(error::Error::General(format!(
                    "unknown column type id 0x{other:04X}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub keyspace: String,
    pub table: String,
    pub name: String,
    pub col_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowsMetadataFlags {
    pub global_tables_spec: bool,
    pub has_more_pages: bool,
    pub no_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowsMetadata {
    pub flags: RowsMetadataFlags,
    pub columns_count: CInt,
    pub paging_state: Option<Vec<u8>>,
    pub column_specs: Vec<ColumnSpec>,
}

impl FromCursor for RowsMetadata {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let raw_flags = CInt::from_cursor(cursor)?;
        let flags = RowsMetadataFlags {
            global_tables_spec: raw_flags & 0x0001 != 0,
            has_more_pages: raw_flags & 0x0002 != 0,
            no_metadata: raw_flags & 0x0004 != 0,
        };

        let columns_count = CInt::from_cursor(cursor)?;

        let paging_state = if flags.has_more_pages {
            from_cursor_bytes(cursor)?
        } else {
            None
        };

        let mut column_specs = Vec::new();
        if !flags.no_metadata {
            let (global_keyspace, global_table) = if flags.global_tables_spec {
                (
                    from_cursor_str(cursor)?.to_string(),
                    from_cursor_str(cursor)?.to_string(),
                )
            } else {
                (String::new(), String::new())
            };

            for _ in 0..columns_count {
                let (keyspace, table) = if flags.global_tables_spec {
                    (global_keyspace.clone(), global_table.clone())
                } else {
                    (
                        from_cursor_str(cursor)?.to_string(),
                        from_cursor_str(cursor)?.to_string(),
                    )
                };
                let name = from_cursor_str(cursor)?.to_string();
                let col_type = ColumnType::from_cursor(cursor)?;
                column_specs.push(ColumnSpec {
                    keyspace,
                    table,
                    name,
                    col_type,
                });
            }
        }

        Ok(RowsMetadata {
            flags,
            columns_count,
            paging_state,
            column_specs,
        })
    }
}

/// A single row: one raw `[bytes]` cell per column, in `metadata.column_specs` order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub cells: Vec<Option<Vec<u8>>>,
}

impl Row {
    pub fn get_by_name(&self, metadata: &RowsMetadata, name: &str) -> Option<&Option<Vec<u8>>> {
        metadata
            .column_specs
            .iter()
            .position(|c| c.name == name)
            .and_then(|idx| self.cells.get(idx))
    }

    /// Decodes a `text`/`varchar`/`ascii` cell.
    pub fn decode_text(cell: &Option<Vec<u8>>) -> error::Result<Option<String>> {
        match cell {
            None => Ok(None),
            Some(bytes) => Ok(Some(String::from_utf8(bytes.clone())?)),
        }
    }

    /// Decodes an `inet` cell (raw address, no port — `system.peers` stores bare addresses).
    pub fn decode_inet(cell: &Option<Vec<u8>>) -> error::Result<Option<std::net::IpAddr>> {
        match cell {
            None => Ok(None),
            Some(bytes) => {
                let ip = match bytes.len() {
                    4 => std::net::IpAddr::V4(std::net::Ipv4Addr::new(
                        bytes[0], bytes[1], bytes[2], bytes[3],
                    )),
                    16 => {
                        let octets: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                            error::Error::General("malformed inet cell".into())
                        })?;
                        std::net::IpAddr::V6(std::net::Ipv6Addr::from(octets))
                    }
                    other => {
                        return Err(error::Error::General(format!(
                            "unexpected inet byte length: {other}"
                        )))
                    }
                };
                Ok(Some(ip))
            }
        }
    }

    /// Decodes a `uuid`/`timeuuid` cell.
    pub fn decode_uuid(cell: &Option<Vec<u8>>) -> error::Result<Option<uuid::Uuid>> {
        match cell {
            None => Ok(None),
            Some(bytes) => {
                let arr: [u8; 16] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| error::Error::General("malformed uuid cell".into()))?;
                Ok(Some(uuid::Uuid::from_bytes(arr)))
            }
        }
    }

    /// Decodes a `bigint` cell.
    pub fn decode_bigint(cell: &Option<Vec<u8>>) -> error::Result<Option<i64>> {
        match cell {
            None => Ok(None),
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| error::Error::General("malformed bigint cell".into()))?;
                Ok(Some(i64::from_be_bytes(arr)))
            }
        }
    }

    /// Decodes a `list<text>` / `set<text>` cell (the shape `tokens` uses on `system.local`).
    pub fn decode_text_collection(cell: &Option<Vec<u8>>) -> error::Result<Vec<String>> {
        let bytes = match cell {
            None => return Ok(Vec::new()),
            Some(bytes) => bytes,
        };

        let mut cursor = Cursor::new(bytes.as_slice());
        let count = CInt::from_cursor(&mut cursor)?;
        let mut out = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let elem = from_cursor_bytes(&mut cursor)?;
            if let Some(elem) = elem {
                out.push(String::from_utf8(elem)?);
            }
        }
        Ok(out)
    }
}

impl FromCursor for Row {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        // Caller must know the column count; use `Row::read` instead of the blanket trait when
        // metadata is available. Kept for symmetry / tests that don't need columns.
        let _ = cursor;
        Ok(Row { cells: Vec::new() })
    }
}

impl Row {
    pub fn read(cursor: &mut Cursor<&[u8]>, columns_count: usize) -> error::Result<Self> {
        let mut cells = Vec::with_capacity(columns_count);
        for _ in 0..columns_count {
            cells.push(from_cursor_bytes(cursor)?);
        }
        Ok(Row { cells })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyResResultRows {
    pub metadata: RowsMetadata,
    pub rows: Vec<Row>,
}

impl Default for RowsMetadata {
    fn default() -> Self {
        RowsMetadata {
            flags: RowsMetadataFlags::default(),
            columns_count: 0,
            paging_state: None,
            column_specs: Vec::new(),
        }
    }
}

impl FromCursor for BodyResResultRows {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let metadata = RowsMetadata::from_cursor(cursor)?;
        let rows_count = CInt::from_cursor(cursor)?;
        let mut rows = Vec::with_capacity(rows_count.max(0) as usize);
        for _ in 0..rows_count {
            rows.push(Row::read(cursor, metadata.columns_count.max(0) as usize)?);
        }
        Ok(BodyResResultRows { metadata, rows })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyResResultSetKeyspace {
    pub body: String,
}

impl FromCursor for BodyResResultSetKeyspace {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        Ok(BodyResResultSetKeyspace {
            body: from_cursor_str(cursor)?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyResResultPrepared {
    pub id: Vec<u8>,
    /// Only present on protocol v5, where the server additionally hands back a digest over the
    /// result-set metadata so subsequent EXECUTEs can skip re-sending it.
    pub result_metadata_id: Option<Vec<u8>>,
    pub metadata: RowsMetadata,
    pub result_metadata: RowsMetadata,
}

impl FromCursor for BodyResResultPrepared {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        use crate::types::from_cursor_short_bytes;

        let id = from_cursor_short_bytes(cursor)?;
        let metadata = RowsMetadata::from_cursor(cursor)?;
        let result_metadata = RowsMetadata::from_cursor(cursor)?;

        Ok(BodyResResultPrepared {
            id,
            result_metadata_id: None,
            metadata,
            result_metadata,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyResResultSchemaChange {
    pub change_type: SchemaChangeType,
    pub target: crate::frame::frame_event::SchemaChangeTarget,
    pub keyspace: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResResultBody {
    Void,
    Rows(BodyResResultRows),
    SetKeyspace(BodyResResultSetKeyspace),
    Prepared(BodyResResultPrepared),
    SchemaChange(BodyResResultSchemaChange),
}

impl ResResultBody {
    pub fn into_prepared(self) -> Option<BodyResResultPrepared> {
        match self {
            ResResultBody::Prepared(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<BodyResResultRows> {
        match self {
            ResResultBody::Rows(r) => Some(r),
            _ => None,
        }
    }

    pub fn keyspace(&self) -> Option<&str> {
        match self {
            ResResultBody::SetKeyspace(body) => Some(&body.body),
            _ => None,
        }
    }
}

impl FromCursor for ResResultBody {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let kind = ResultKind::try_from(CInt::from_cursor(cursor)?)?;
        Ok(match kind {
            ResultKind::Void => ResResultBody::Void,
            ResultKind::Rows => ResResultBody::Rows(BodyResResultRows::from_cursor(cursor)?),
            ResultKind::SetKeyspace => {
                ResResultBody::SetKeyspace(BodyResResultSetKeyspace::from_cursor(cursor)?)
            }
            ResultKind::Prepared => {
                ResResultBody::Prepared(BodyResResultPrepared::from_cursor(cursor)?)
            }
            ResultKind::SchemaChange => {
                let change = from_cursor_str(cursor)?.to_string();
                let change_type = match change.as_str() {
                    "CREATED" => SchemaChangeType::Created,
                    "UPDATED" => SchemaChangeType::Updated,
                    "DROPPED" => SchemaChangeType::Dropped,
                    other => {
                        return Err(error::Error::General(format!(
                            "unknown schema change type: {other}"
                        )))
                    }
                };
                let target_str = from_cursor_str(cursor)?.to_string();
                let target = match target_str.as_str() {
                    "KEYSPACE" => crate::frame::frame_event::SchemaChangeTarget::Keyspace,
                    "TABLE" => crate::frame::frame_event::SchemaChangeTarget::Table,
                    "TYPE" => crate::frame::frame_event::SchemaChangeTarget::Type,
                    "FUNCTION" => crate::frame::frame_event::SchemaChangeTarget::Function,
                    "AGGREGATE" => crate::frame::frame_event::SchemaChangeTarget::Aggregate,
                    other => {
                        return Err(error::Error::General(format!(
                            "unknown schema change target: {other}"
                        )))
                    }
                };
                let keyspace = from_cursor_str(cursor)?.to_string();
                let name = if target == crate::frame::frame_event::SchemaChangeTarget::Keyspace {
                    None
                } else {
                    Some(from_cursor_str(cursor)?.to_string())
                };
                ResResultBody::SchemaChange(BodyResResultSchemaChange {
                    change_type,
                    target,
                    keyspace,
                    name,
                })
            }
        })
    }
}
