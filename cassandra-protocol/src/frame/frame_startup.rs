use std::collections::HashMap;
use std::io::Cursor;

use crate::frame::*;
use crate::types::*;

const CQL_VERSION: &str = "CQL_VERSION";
const CQL_VERSION_VAL: &str = "3.0.0";
const COMPRESSION: &str = "COMPRESSION";
const DRIVER_NAME: &str = "DRIVER_NAME";
const DRIVER_VERSION: &str = "DRIVER_VERSION";
const APPLICATION_NAME: &str = "APPLICATION_NAME";
const APPLICATION_VERSION: &str = "APPLICATION_VERSION";
const CLIENT_ID: &str = "CLIENT_ID";
const NO_COMPACT: &str = "NO_COMPACT";

/// Everything a STARTUP request may carry, beyond the mandatory `CQL_VERSION`. `driver_name`/
/// `driver_version` default to this crate's own identity when left unset so a server-side
/// `system.clients` view can tell connections from this driver apart from other client
/// implementations.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub compression: Option<String>,
    pub driver_name: Option<String>,
    pub driver_version: Option<String>,
    pub application_name: Option<String>,
    pub application_version: Option<String>,
    pub client_id: Option<uuid::Uuid>,
    pub no_compact: bool,
}

impl StartupOptions {
    pub fn new(compression: Option<String>) -> Self {
        StartupOptions {
            compression,
            ..Default::default()
        }
    }
}

#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct BodyReqStartup {
    pub map: HashMap<String, String>,
}

impl BodyReqStartup {
    pub fn new(compression: Option<String>) -> BodyReqStartup {
        Self::with_options(StartupOptions::new(compression))
    }

    pub fn with_options(options: StartupOptions) -> BodyReqStartup {
        let mut map = HashMap::new();
        map.insert(CQL_VERSION.into(), CQL_VERSION_VAL.into());

        if let Some(c) = options.compression {
            map.insert(COMPRESSION.into(), c);
        }
        map.insert(
            DRIVER_NAME.into(),
            options
                .driver_name
                .unwrap_or_else(|| "cdrs-tokio".to_string()),
        );
        map.insert(
            DRIVER_VERSION.into(),
            options
                .driver_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        );
        if let Some(name) = options.application_name {
            map.insert(APPLICATION_NAME.into(), name);
        }
        if let Some(version) = options.application_version {
            map.insert(APPLICATION_VERSION.into(), version);
        }
        if let Some(id) = options.client_id {
            map.insert(CLIENT_ID.into(), id.to_string());
        }
        if options.no_compact {
            map.insert(NO_COMPACT.into(), "true".to_string());
        }

        BodyReqStartup { map }
    }
}

impl Serialize for BodyReqStartup {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        let num = self.map.len() as CIntShort;
        num.serialize(cursor);

        for (key, val) in &self.map {
            serialize_str(cursor, key);
            serialize_str(cursor, val);
        }
    }
}

impl FromCursor for BodyReqStartup {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let num = CInt::from_cursor(cursor)?;

        let mut map = HashMap::with_capacity(num as usize);
        for _ in 0..num {
            map.insert(
                from_cursor_str(cursor)?.to_string(),
                from_cursor_str(cursor)?.to_string(),
            );
        }

        Ok(BodyReqStartup { map })
    }
}

// Frame implementation related to BodyReqStartup

impl Frame {
    /// Creates new frame of type `startup`.
    pub fn new_req_startup(compression: Option<String>, version: Version) -> Frame {
        Frame::new_req_startup_with_options(StartupOptions::new(compression), version)
    }

    pub fn new_req_startup_with_options(options: StartupOptions, version: Version) -> Frame {
        let direction = Direction::Request;
        let opcode = Opcode::Startup;
        let body = BodyReqStartup::with_options(options);

        Frame::new(
            version,
            direction,
            Flags::empty(),
            opcode,
            body.serialize_to_vec(),
            None,
            vec![],
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::{Flags, Frame, Opcode, Version};

    #[test]
    fn new_body_req_startup_some_compression() {
        let compression = "test_compression";
        let body = BodyReqStartup::new(Some(compression.into()));
        assert_eq!(
            body.map.get("CQL_VERSION"),
            Some("3.0.0".to_string()).as_ref()
        );
        assert_eq!(
            body.map.get("COMPRESSION"),
            Some(compression.to_string()).as_ref()
        );
        // CQL_VERSION + COMPRESSION + DRIVER_NAME + DRIVER_VERSION
        assert_eq!(body.map.len(), 4);
    }

    #[test]
    fn new_body_req_startup_none_compression() {
        let body = BodyReqStartup::new(None);
        assert_eq!(
            body.map.get("CQL_VERSION"),
            Some("3.0.0".to_string()).as_ref()
        );
        assert_eq!(body.map.len(), 3);
    }

    #[test]
    fn new_req_startup() {
        let compression = Some("test_compression".to_string());
        let frame = Frame::new_req_startup(compression, Version::V4);
        assert_eq!(frame.version, Version::V4);
        assert_eq!(frame.flags, Flags::empty());
        assert_eq!(frame.opcode, Opcode::Startup);
        assert_eq!(frame.tracing_id, None);
        assert!(frame.warnings.is_empty());
    }
}
