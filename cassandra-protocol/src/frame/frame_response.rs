//! Dispatches a frame's raw body to the right decoder based on its opcode — the tagged union
//! the design notes (§9) call for in place of the original's per-opcode inheritance hierarchy.

use std::io::Cursor;

use crate::error;
use crate::frame::frame_auth_challenge::BodyResAuthChallenge;
use crate::frame::frame_auth_success::BodyResAuthSuccess;
use crate::frame::frame_authenticate::BodyResAuthenticate;
use crate::frame::frame_error::ErrorBody;
use crate::frame::frame_event::ServerEvent;
use crate::frame::frame_ready::BodyResReady;
use crate::frame::frame_result::{BodyResResultPrepared, BodyResResultRows, ResResultBody};
use crate::frame::frame_supported::BodyResSupported;
use crate::frame::{Opcode, Version};
use crate::types::FromCursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Error(ErrorBody),
    Ready(BodyResReady),
    Authenticate(BodyResAuthenticate),
    Supported(BodyResSupported),
    Result(ResResultBody),
    Event(ServerEvent),
    AuthChallenge(BodyResAuthChallenge),
    AuthSuccess(BodyResAuthSuccess),
}

impl ResponseBody {
    pub fn from_bytes(opcode: Opcode, bytes: &[u8], _version: Version) -> error::Result<Self> {
        let mut cursor = Cursor::new(bytes);
        Ok(match opcode {
            Opcode::Error => ResponseBody::Error(ErrorBody::from_cursor(&mut cursor)?),
            Opcode::Ready => ResponseBody::Ready(BodyResReady::from_cursor(&mut cursor)?),
            Opcode::Authenticate => {
                ResponseBody::Authenticate(BodyResAuthenticate::from_cursor(&mut cursor)?)
            }
            Opcode::Supported => {
                ResponseBody::Supported(BodyResSupported::from_cursor(&mut cursor)?)
            }
            Opcode::Result => ResponseBody::Result(ResResultBody::from_cursor(&mut cursor)?),
            Opcode::Event => ResponseBody::Event(ServerEvent::from_cursor(&mut cursor)?),
            Opcode::AuthChallenge => {
                ResponseBody::AuthChallenge(BodyResAuthChallenge::from_cursor(&mut cursor)?)
            }
            Opcode::AuthSuccess => {
                ResponseBody::AuthSuccess(BodyResAuthSuccess::from_cursor(&mut cursor)?)
            }
            other => {
                return Err(error::Error::General(format!(
                    "{other:?} is not a valid response opcode"
                )))
            }
        })
    }

    pub fn into_error(self) -> Option<ErrorBody> {
        match self {
            ResponseBody::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<BodyResResultRows> {
        match self {
            ResponseBody::Result(r) => r.into_rows(),
            _ => None,
        }
    }

    pub fn into_prepared(self) -> Option<BodyResResultPrepared> {
        match self {
            ResponseBody::Result(r) => r.into_prepared(),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&ServerEvent> {
        match self {
            ResponseBody::Event(event) => Some(event),
            _ => None,
        }
    }
}
