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

/// Start of the band of `key`, a multiple of 8 below `range`.
pub fn position(key: &[u8], seed: u64, range: usize) -> usize {
    if range == 0 {
        return 0;
    }
    let pos = (wyhash::wyhash(key, seed) % range as u64) as usize;
    pos & !7
}

/// Coefficient bits of `key`, `width / 8` bytes, MSB-first.
pub fn row(key: &[u8], seed: u64, width: usize) -> Vec<u8> {
    let bytes = width / 8;
    let mut row = Vec::with_capacity(bytes.next_multiple_of(8));
    let mut i = 0_u64;
    while row.len() < bytes {
        let word = wyhash::wyhash(key, seed.wrapping_add(1).wrapping_add(i));
        row.extend_from_slice(&word.to_le_bytes());
        i += 1;
    }
    row.truncate(bytes);
    row
}
