use std::io::Cursor;

use crate::consistency::Consistency;
use crate::error;
use crate::types::{
    from_cursor_long_str, serialize_long_str, CInt, CIntShort, FromCursor, Serialize,
};

/// Server error codes from the CQL spec's ERROR body, as relevant to retry/connection-state
/// decisions. Codes not distinguished here (e.g. the many sub-codes of write failures) are kept
/// in `additional_info` for whoever needs them, and surfaced to the application verbatim via
/// `ErrorBody::error_code` / `ErrorBody::message` per §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorType {
    ServerError = 0x0000,
    ProtocolError = 0x000A,
    AuthError = 0x0100,
    UnavailableException = 0x1000,
    Overloaded = 0x1001,
    IsBootstrapping = 0x1002,
    TruncateError = 0x1003,
    WriteTimeout = 0x1100,
    ReadTimeout = 0x1200,
    ReadFailure = 0x1300,
    FunctionFailure = 0x1400,
    WriteFailure = 0x1500,
    SyntaxError = 0x2000,
    Unauthorized = 0x2100,
    Invalid = 0x2200,
    ConfigError = 0x2300,
    AlreadyExists = 0x2400,
    Unprepared = 0x2500,
}

impl ErrorType {
    pub const PROTOCOL_ERROR_CODE: i32 = ErrorType::ProtocolError as i32;
    pub const UNPREPARED_CODE: i32 = ErrorType::Unprepared as i32;
    pub const BAD_CREDENTIALS_CODE: i32 = ErrorType::AuthError as i32;
}

// Allow `ErrorType::Protocol` to read naturally from the state-machine table in the design doc.
#[allow(non_upper_case_globals)]
impl ErrorType {
    pub const Protocol: ErrorType = ErrorType::ProtocolError;
}

/// Extra fields some error codes carry (consistency, required/alive replica counts, ...).
/// Only the codes the driver actually branches on decode their payload; everything else is
/// left as `Server` (opaque) so the caller still gets `error_code()` / `error_message()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalErrorInfo {
    Server,
    Unavailable {
        consistency: Consistency,
        required: CInt,
        alive: CInt,
    },
    WriteTimeout {
        consistency: Consistency,
        received: CInt,
        block_for: CInt,
        write_type: String,
    },
    ReadTimeout {
        consistency: Consistency,
        received: CInt,
        block_for: CInt,
        data_present: bool,
    },
    WriteFailure {
        consistency: Consistency,
        received: CInt,
        block_for: CInt,
        num_failures: CInt,
        write_type: String,
    },
    ReadFailure {
        consistency: Consistency,
        received: CInt,
        block_for: CInt,
        num_failures: CInt,
        data_present: bool,
    },
    Unprepared {
        id: Vec<u8>,
    },
    AlreadyExists {
        keyspace: String,
        table: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error_code: CInt,
    pub message: String,
    pub additional_info: AdditionalErrorInfo,
}

impl ErrorBody {
    pub fn is_unprepared(&self) -> bool {
        self.error_code == ErrorType::UNPREPARED_CODE
    }

    pub fn is_bad_credentials(&self) -> bool {
        self.error_code == ErrorType::BAD_CREDENTIALS_CODE
    }

    pub fn is_protocol_error(&self) -> bool {
        self.error_code == ErrorType::PROTOCOL_ERROR_CODE
    }

    /// Matches the "Keyspace ... does not exist" `INVALID_QUERY` phrasing the state machine
    /// checks for when a USE statement fails during startup.
    pub fn is_missing_keyspace(&self) -> bool {
        self.error_code == ErrorType::Invalid as i32 && self.message.contains("does not exist")
    }

    pub fn is_unsupported_protocol_version(&self) -> bool {
        self.is_protocol_error() && self.message.to_lowercase().contains("protocol")
    }

    pub fn is_overloaded(&self) -> bool {
        self.error_code == ErrorType::Overloaded as i32
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.error_code == ErrorType::IsBootstrapping as i32
    }

    pub fn is_truncate_error(&self) -> bool {
        self.error_code == ErrorType::TruncateError as i32
    }

    pub fn is_read_failure(&self) -> bool {
        self.error_code == ErrorType::ReadFailure as i32
    }

    pub fn is_write_failure(&self) -> bool {
        self.error_code == ErrorType::WriteFailure as i32
    }

    pub fn is_server_error(&self) -> bool {
        self.error_code == ErrorType::ServerError as i32
    }
}

impl Serialize for ErrorBody {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        self.error_code.serialize(cursor);
        serialize_long_str(cursor, &self.message);

        match &self.additional_info {
            AdditionalErrorInfo::Unavailable {
                consistency,
                required,
                alive,
            } => {
                consistency.serialize(cursor);
                required.serialize(cursor);
                alive.serialize(cursor);
            }
            AdditionalErrorInfo::WriteTimeout {
                consistency,
                received,
                block_for,
                write_type,
            } => {
                consistency.serialize(cursor);
                received.serialize(cursor);
                block_for.serialize(cursor);
                crate::types::serialize_str(cursor, write_type);
            }
            AdditionalErrorInfo::ReadTimeout {
                consistency,
                received,
                block_for,
                data_present,
            } => {
                consistency.serialize(cursor);
                received.serialize(cursor);
                block_for.serialize(cursor);
                cursor.get_mut().push(if *data_present { 1 } else { 0 });
            }
            AdditionalErrorInfo::WriteFailure {
                consistency,
                received,
                block_for,
                num_failures,
                write_type,
            } => {
                consistency.serialize(cursor);
                received.serialize(cursor);
                block_for.serialize(cursor);
                num_failures.serialize(cursor);
                crate::types::serialize_str(cursor, write_type);
            }
            AdditionalErrorInfo::ReadFailure {
                consistency,
                received,
                block_for,
                num_failures,
                data_present,
            } => {
                consistency.serialize(cursor);
                received.serialize(cursor);
                block_for.serialize(cursor);
                num_failures.serialize(cursor);
                cursor.get_mut().push(if *data_present { 1 } else { 0 });
            }
            AdditionalErrorInfo::Unprepared { id } => {
                crate::types::serialize_short_bytes(cursor, id);
            }
            AdditionalErrorInfo::AlreadyExists { keyspace, table } => {
                crate::types::serialize_str(cursor, keyspace);
                crate::types::serialize_str(cursor, table);
            }
            AdditionalErrorInfo::Server => {}
        }
    }
}

impl FromCursor for ErrorBody {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let error_code = CInt::from_cursor(cursor)?;
        let message = from_cursor_long_str(cursor)?.to_string();

        let additional_info = match error_code {
            code if code == ErrorType::UnavailableException as i32 => {
                AdditionalErrorInfo::Unavailable {
                    consistency: Consistency::from_cursor(cursor)?,
                    required: CInt::from_cursor(cursor)?,
                    alive: CInt::from_cursor(cursor)?,
                }
            }
            code if code == ErrorType::WriteTimeout as i32 => AdditionalErrorInfo::WriteTimeout {
                consistency: Consistency::from_cursor(cursor)?,
                received: CInt::from_cursor(cursor)?,
                block_for: CInt::from_cursor(cursor)?,
                write_type: crate::types::from_cursor_str(cursor)?.to_string(),
            },
            code if code == ErrorType::ReadTimeout as i32 => AdditionalErrorInfo::ReadTimeout {
                consistency: Consistency::from_cursor(cursor)?,
                received: CInt::from_cursor(cursor)?,
                block_for: CInt::from_cursor(cursor)?,
                data_present: {
                    let mut b = [0u8; 1];
                    std::io::Read::read_exact(cursor, &mut b)?;
                    b[0] != 0
                },
            },
            code if code == ErrorType::WriteFailure as i32 => AdditionalErrorInfo::WriteFailure {
                consistency: Consistency::from_cursor(cursor)?,
                received: CInt::from_cursor(cursor)?,
                block_for: CInt::from_cursor(cursor)?,
                num_failures: CInt::from_cursor(cursor)?,
                write_type: crate::types::from_cursor_str(cursor)?.to_string(),
            },
            code if code == ErrorType::ReadFailure as i32 => AdditionalErrorInfo::ReadFailure {
                consistency: Consistency::from_cursor(cursor)?,
                received: CInt::from_cursor(cursor)?,
                block_for: CInt::from_cursor(cursor)?,
                num_failures: CInt::from_cursor(cursor)?,
                data_present: {
                    let mut b = [0u8; 1];
                    std::io::Read::read_exact(cursor, &mut b)?;
                    b[0] != 0
                },
            },
            code if code == ErrorType::UNPREPARED_CODE => AdditionalErrorInfo::Unprepared {
                id: crate::types::from_cursor_short_bytes(cursor)?,
            },
            code if code == ErrorType::AlreadyExists as i32 => {
                AdditionalErrorInfo::AlreadyExists {
                    keyspace: crate::types::from_cursor_str(cursor)?.to_string(),
                    table: crate::types::from_cursor_str(cursor)?.to_string(),
                }
            }
            _ => AdditionalErrorInfo::Server,
        };

        Ok(ErrorBody {
            error_code,
            message,
            additional_info,
        })
    }
}

// A handful of codes are read back as a `[short]`-sized sub-field in other bodies (e.g. the
// UNPREPARED code is compared against raw opcodes elsewhere); keep a thin alias for clarity.
pub type ErrorCode = CIntShort;
