// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

use crate::{BandError, BandOkvs};
use std::io::{Read, Write};
use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

const MAGIC: u64 = u64::from_le_bytes(*b"BANDOKVS");

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct Header {
    magic: U64,
    n: U64,
    m: U64,
    width: U32,
    seed: U64,
}

impl BandOkvs {
    /// Writes the header and then every cell, all little-endian.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), BandError> {
        let header = Header {
            magic: U64::new(MAGIC),
            n: U64::new(self.n as u64),
            m: U64::new(self.table.len() as u64),
            width: U32::new(self.width as u32),
            seed: U64::new(self.seed),
        };
        writer.write_all(header.as_bytes())?;
        let cells = self.table.iter().copied().map(U32::new).collect::<Vec<_>>();
        writer.write_all(cells.as_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, BandError> {
        let mut buffer = [0u8; size_of::<Header>()];
        reader.read_exact(&mut buffer)?;
        let header = Header::read_from_bytes(&buffer).map_err(|_| BandError::Malformed {
            reason: "bad header",
        })?;
        if header.magic.get() != MAGIC {
            return Err(BandError::Malformed {
                reason: "bad magic",
            });
        }
        let width = header.width.get() as usize;
        if width == 0 || width % 8 != 0 {
            return Err(BandError::Malformed {
                reason: "bad width",
            });
        }
        let m = usize::try_from(header.m.get()).map_err(|_| BandError::Malformed {
            reason: "too many cells",
        })?;
        if m < width {
            return Err(BandError::Malformed {
                reason: "fewer cells than width",
            });
        }
        let len = m
            .checked_mul(size_of::<U32>())
            .ok_or(BandError::Malformed {
                reason: "too many cells",
            })?;
        let mut bytes = Vec::new();
        reader.take(len as u64).read_to_end(&mut bytes)?;
        let cells = <[U32]>::ref_from_bytes(&bytes).map_err(|_| BandError::Malformed {
            reason: "truncated table",
        })?;
        if cells.len() != m {
            return Err(BandError::Malformed {
                reason: "truncated table",
            });
        }
        Ok(Self {
            n: header.n.get() as usize,
            width,
            seed: header.seed.get(),
            table: cells.iter().map(|c| c.get()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{BandError, BandOkvs, BandOptions};

    fn okvs() -> (BandOkvs, Vec<[u8; 4]>) {
        let keys = (0..500_u32).map(u32::to_le_bytes).collect::<Vec<_>>();
        let values = (0..500_u32).map(|i| i.wrapping_mul(0x9e37_79b9)).collect::<Vec<_>>();
        let options = BandOptions {
            width: 256,
            expansion: 1.2,
            seed: 3,
        };
        (BandOkvs::encode(&keys, &values, &options).unwrap(), keys)
    }

    #[test]
    fn write_then_read() {
        let (okvs, keys) = okvs();
        let mut buffer = Vec::new();
        okvs.write_to(&mut buffer).unwrap();
        assert_eq!(buffer.len(), 36 + 4 * okvs.table().len());
        assert_eq!(&buffer[..8], b"BANDOKVS");
        let read = BandOkvs::read_from(buffer.as_slice()).unwrap();
        assert_eq!(read, okvs);
        for (i, key) in keys.iter().enumerate() {
            assert!(read.check(key, (i as u32).wrapping_mul(0x9e37_79b9)));
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        let (okvs, _) = okvs();
        let mut buffer = Vec::new();
        okvs.write_to(&mut buffer).unwrap();

        let truncated = &buffer[..buffer.len() - 1];
        assert!(matches!(
            BandOkvs::read_from(truncated),
            Err(BandError::Malformed { .. })
        ));

        let mut magic = buffer.clone();
        magic[0] ^= 1;
        assert!(matches!(
            BandOkvs::read_from(magic.as_slice()),
            Err(BandError::Malformed { .. })
        ));

        let mut width = buffer.clone();
        width[24] = 12;
        assert!(matches!(
            BandOkvs::read_from(width.as_slice()),
            Err(BandError::Malformed { .. })
        ));

        let mut cells = buffer.clone();
        cells[16..24].copy_from_slice(&(1_u64 << 62).to_le_bytes());
        assert!(matches!(
            BandOkvs::read_from(cells.as_slice()),
            Err(BandError::Malformed { .. })
        ));

        assert!(matches!(
            BandOkvs::read_from(&buffer[..10]),
            Err(BandError::Io(_))
        ));
    }
}
