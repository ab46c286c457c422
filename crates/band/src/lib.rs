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

//! Band oblivious key-value store over GF(2).
//!
//! Every key hashes to a band of `width` table cells starting at a multiple
//! of 8 and to `width` coefficient bits. Encoding solves the banded linear
//! system so that, for every stored pair, the XOR of the cells selected by
//! the key's bits is the value.

mod codec;
mod error;
pub mod hash;
mod options;

pub use error::BandError;
pub use options::BandOptions;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandOkvs {
    n: usize,
    width: usize,
    seed: u64,
    table: Vec<u32>,
}

struct Equation {
    index: usize,
    pos: usize,
    row: Vec<u8>,
    value: u32,
}

impl BandOkvs {
    /// Builds a table in which every `keys[i]` decodes to `values[i]`.
    ///
    /// # Panics
    ///
    /// Panics if `keys` and `values` differ in length.
    pub fn encode<K: AsRef<[u8]>>(
        keys: &[K],
        values: &[u32],
        options: &BandOptions,
    ) -> Result<Self, BandError> {
        assert_eq!(keys.len(), values.len());
        options.validate()?;
        let n = keys.len();
        let width = options.width as usize;
        let seed = options.seed;
        let m = options.cells(n);
        let range = m - width;
        let mut equations = keys
            .iter()
            .zip(values)
            .enumerate()
            .map(|(index, (key, &value))| Equation {
                index,
                pos: hash::position(key.as_ref(), seed, range),
                row: hash::row(key.as_ref(), seed, width),
                value,
            })
            .collect::<Vec<_>>();
        equations.sort_by_key(|e| e.pos);
        let pivots = eliminate(&mut equations, width)?;
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let mut table = (0..m).map(|_| rng.random()).collect::<Vec<u32>>();
        for &pivot in pivots.iter() {
            table[pivot] = 0;
        }
        for (e, &pivot) in equations.iter().zip(pivots.iter()).rev() {
            table[pivot] = kernel::reduce(&e.row, &table, width, e.pos, e.value);
        }
        log::debug!("band: encoded {n} pairs into {m} cells, width = {width}");
        Ok(Self {
            n,
            width,
            seed,
            table,
        })
    }

    pub fn decode(&self, key: &[u8]) -> u32 {
        self.residual(key, 0)
    }

    /// `decode(key) ^ value`.
    pub fn residual(&self, key: &[u8], value: u32) -> u32 {
        let pos = hash::position(key, self.seed, self.range());
        let row = hash::row(key, self.seed, self.width);
        kernel::reduce(&row, &self.table, self.width, pos, value)
    }

    pub fn check(&self, key: &[u8], value: u32) -> bool {
        self.residual(key, value) == 0
    }

    pub fn par_decode<K: AsRef<[u8]> + Sync>(&self, keys: &[K]) -> Vec<u32> {
        keys.par_iter().map(|key| self.decode(key.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn table(&self) -> &[u32] {
        &self.table
    }

    fn range(&self) -> usize {
        self.table.len() - self.width
    }
}

/// Gaussian elimination over sorted bands. Returns the pivot cell of each
/// equation; rows are reduced in place.
fn eliminate(equations: &mut [Equation], width: usize) -> Result<Vec<usize>, BandError> {
    let bytes = width / 8;
    let mut pivots = Vec::with_capacity(equations.len());
    for i in 0..equations.len() {
        let (head, tail) = equations.split_at_mut(i + 1);
        let e = &head[i];
        let Some(offset) = simd::bit::first_set(&e.row) else {
            log::warn!("band: singular system at pair {}", e.index);
            return Err(BandError::Singular { index: e.index });
        };
        let pivot = e.pos + offset;
        for f in tail.iter_mut() {
            if f.pos > pivot {
                break;
            }
            if simd::bit::get(&f.row, pivot - f.pos) {
                let shift = (f.pos - e.pos) / 8;
                kernel::fold_inplace(&e.row, shift, bytes - shift, &mut f.row);
                f.value ^= e.value;
            }
        }
        pivots.push(pivot);
    }
    Ok(pivots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> BandOptions {
        BandOptions {
            width: 256,
            expansion: 1.1,
            seed: 0x5eed,
        }
    }

    fn pairs(n: usize) -> (Vec<Vec<u8>>, Vec<u32>) {
        let mut rng = rand::rng();
        let keys = (0..n as u64)
            .map(|i| i.to_le_bytes().to_vec())
            .collect::<Vec<_>>();
        let values = (0..n).map(|_| rng.random()).collect::<Vec<u32>>();
        (keys, values)
    }

    #[test]
    fn encode_then_decode() {
        for n in [0, 1, 2, 100, 5000] {
            let (keys, values) = pairs(n);
            let okvs = BandOkvs::encode(&keys, &values, &options()).unwrap();
            assert_eq!(okvs.len(), n);
            assert_eq!(okvs.table().len(), options().cells(n));
            for (key, &value) in keys.iter().zip(values.iter()) {
                assert_eq!(okvs.decode(key), value);
                assert!(okvs.check(key, value));
                assert_eq!(okvs.residual(key, value ^ 1), 1);
            }
        }
    }

    #[test]
    fn narrow_bands() {
        let (keys, values) = pairs(300);
        for width in [64, 128] {
            let options = BandOptions {
                width,
                expansion: 1.5,
                seed: 1,
            };
            match BandOkvs::encode(&keys, &values, &options) {
                Ok(okvs) => {
                    for (key, &value) in keys.iter().zip(values.iter()) {
                        assert!(okvs.check(key, value));
                    }
                }
                Err(BandError::Singular { .. }) => (),
                Err(e) => panic!("{e}"),
            }
        }
    }

    #[test]
    fn encode_is_deterministic() {
        let (keys, values) = pairs(1000);
        let a = BandOkvs::encode(&keys, &values, &options()).unwrap();
        let b = BandOkvs::encode(&keys, &values, &options()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_keys_are_singular() {
        let keys = [b"alpha".as_slice(), b"beta", b"alpha"];
        let values = [1, 2, 3];
        let err = BandOkvs::encode(&keys, &values, &options()).unwrap_err();
        assert!(matches!(err, BandError::Singular { index: 0 | 2 }));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let (keys, values) = pairs(10);
        let options = BandOptions {
            width: 100,
            ..options()
        };
        let err = BandOkvs::encode(&keys, &values, &options).unwrap_err();
        assert!(matches!(err, BandError::InvalidOptions(_)));
    }

    #[test]
    fn unknown_keys_decode_to_something() {
        let (keys, values) = pairs(1000);
        let okvs = BandOkvs::encode(&keys, &values, &options()).unwrap();
        let misses = (0..1000_u64)
            .filter(|i| !okvs.check(&(i + 1_000_000).to_le_bytes(), 0))
            .count();
        assert!(misses > 900);
    }

    #[test]
    fn par_decode_matches_decode() {
        let (keys, values) = pairs(4000);
        let okvs = BandOkvs::encode(&keys, &values, &options()).unwrap();
        assert_eq!(okvs.par_decode(&keys), values);
        let sequential = keys.iter().map(|k| okvs.decode(k)).collect::<Vec<_>>();
        assert_eq!(okvs.par_decode(&keys), sequential);
    }
}
