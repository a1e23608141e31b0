//! `[consistency]`: a `[short]`-encoded enum sent with every QUERY/EXECUTE/BATCH.

use std::convert::TryFrom;
use std::io::Cursor;

use crate::error;
use crate::types::{CIntShort, FromCursor, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consistency {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl Default for Consistency {
    fn default() -> Self {
        Consistency::LocalOne
    }
}

impl Consistency {
    /// `true` for `LOCAL_ONE` and `LOCAL_QUORUM` and `LOCAL_SERIAL`: DC-aware policies must not
    /// route these to a remote datacenter even when otherwise allowed to.
    pub fn is_local(self) -> bool {
        matches!(
            self,
            Consistency::LocalOne | Consistency::LocalQuorum | Consistency::LocalSerial
        )
    }

    pub fn is_serial(self) -> bool {
        matches!(self, Consistency::Serial | Consistency::LocalSerial)
    }
}

impl From<Consistency> for CIntShort {
    fn from(value: Consistency) -> Self {
        match value {
            Consistency::Any => 0x0000,
            Consistency::One => 0x0001,
            Consistency::Two => 0x0002,
            Consistency::Three => 0x0003,
            Consistency::Quorum => 0x0004,
            Consistency::All => 0x0005,
            Consistency::LocalQuorum => 0x0006,
            Consistency::EachQuorum => 0x0007,
            Consistency::Serial => 0x0008,
            Consistency::LocalSerial => 0x0009,
            Consistency::LocalOne => 0x000A,
        }
    }
}

impl TryFrom<CIntShort> for Consistency {
    type Error = error::Error;

    fn try_from(value: CIntShort) -> Result<Self, Self::Error> {
        Ok(match value {
            0x0000 => Consistency::Any,
            0x0001 => Consistency::One,
            0x0002 => Consistency::Two,
            0x0003 => Consistency::Three,
            0x0004 => Consistency::Quorum,
            0x0005 => Consistency::All,
            0x0006 => Consistency::LocalQuorum,
            0x0007 => Consistency::EachQuorum,
            0x0008 => Consistency::Serial,
            0x0009 => Consistency::LocalSerial,
            0x000A => Consistency::LocalOne,
            other => {
                return Err(error::Error::General(format!(
                    "unknown consistency level 0x{other:04X}"
                )))
            }
        })
    }
}

impl Serialize for Consistency {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        CIntShort::from(*self).serialize(cursor);
    }
}

impl FromCursor for Consistency {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        Consistency::try_from(CIntShort::from_cursor(cursor)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_every_level() {
        let levels = [
            Consistency::Any,
            Consistency::One,
            Consistency::Two,
            Consistency::Three,
            Consistency::Quorum,
            Consistency::All,
            Consistency::LocalQuorum,
            Consistency::EachQuorum,
            Consistency::Serial,
            Consistency::LocalSerial,
            Consistency::LocalOne,
        ];

        for level in levels {
            let wire = CIntShort::from(level);
            assert_eq!(Consistency::try_from(wire).unwrap(), level);
        }
    }

    #[test]
    fn local_levels_are_flagged() {
        assert!(Consistency::LocalOne.is_local());
        assert!(Consistency::LocalQuorum.is_local());
        assert!(!Consistency::Quorum.is_local());
    }
}
