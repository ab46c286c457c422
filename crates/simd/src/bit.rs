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

//! Bit rows packed most significant bit first: bit `0` is mask `0x80` of
//! byte `0`, bit `9` is mask `0x40` of byte `1`.

/// Byte index and mask of bit `j`.
#[inline(always)]
pub const fn locate(j: usize) -> (usize, u8) {
    (j >> 3, 0x80 >> (j & 7))
}

#[inline(always)]
pub fn get(row: &[u8], j: usize) -> bool {
    let (byte, mask) = locate(j);
    row[byte] & mask != 0
}

#[inline(always)]
pub fn flip(row: &mut [u8], j: usize) {
    let (byte, mask) = locate(j);
    row[byte] ^= mask;
}

/// Index of the first set bit.
pub fn first_set(row: &[u8]) -> Option<usize> {
    let byte = row.iter().position(|&x| x != 0)?;
    Some(byte * 8 + row[byte].leading_zeros() as usize)
}

/// XOR of `window[j]` over every set bit `j` of `row`, XOR `value`.
///
/// Zero means the row decodes to `value` under `window`. Bits of `row` past
/// `window.len()` are ignored.
#[inline(always)]
pub fn reduce_xor_of_selected(row: &[u8], window: &[u32], value: u32) -> u32 {
    reduce_xor_of_selected::reduce_xor_of_selected(row, window, value)
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod reduce_xor_of_selected {
    // Lane `k` of a group of 8 takes table element `k` when bit `k` of the
    // row byte is set, so the lane masks are `0x80 >> k`.

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    fn reduce_xor_of_selected_v4(row: &[u8], window: &[u32], value: u32) -> u32 {
        use crate::emulate::emulate_mm512_reduce_xor_epi32;
        use core::arch::x86_64::*;
        assert!(row.len() * 8 >= window.len());
        let mut n = window.len();
        let mut r = row.as_ptr();
        let mut t = window.as_ptr();
        let mut xor = _mm512_setzero_si512();
        while n >= 16 {
            let (b_0, b_1) = unsafe { (r.read(), r.add(1).read()) };
            let mask = u16::from_le_bytes([b_0.reverse_bits(), b_1.reverse_bits()]);
            let x = unsafe { _mm512_maskz_loadu_epi32(mask, t.cast()) };
            xor = _mm512_xor_si512(xor, x);
            (n, r, t) = unsafe { (n - 16, r.add(2), t.add(16)) };
        }
        if n > 0 {
            let b_0 = unsafe { r.read() };
            let b_1 = if n > 8 { unsafe { r.add(1).read() } } else { 0 };
            let mask = u16::from_le_bytes([b_0.reverse_bits(), b_1.reverse_bits()]);
            let mask = _bzhi_u32(mask as u32, n as u32) as u16;
            let x = unsafe { _mm512_maskz_loadu_epi32(mask, t.cast()) };
            xor = _mm512_xor_si512(xor, x);
        }
        emulate_mm512_reduce_xor_epi32(xor) ^ value
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn reduce_xor_of_selected_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let row = (0..n / 8).map(|_| rng.random()).collect::<Vec<u8>>();
            let window = (0..n).map(|_| rng.random()).collect::<Vec<u32>>();
            let value = rng.random::<u32>();
            for z in 3984..4016 {
                let window = &window[..z];
                let specialized = unsafe { reduce_xor_of_selected_v4(&row, window, value) };
                let fallback = fallback(&row, window, value);
                assert!(
                    specialized == fallback,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    fn reduce_xor_of_selected_v3(row: &[u8], window: &[u32], value: u32) -> u32 {
        use crate::bit::locate;
        use crate::emulate::emulate_mm256_reduce_xor_epi32;
        use core::arch::x86_64::*;
        assert!(row.len() * 8 >= window.len());
        let mut n = window.len();
        let mut r = row.as_ptr();
        let mut t = window.as_ptr();
        let bits = _mm256_setr_epi32(0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01);
        let mut xor = _mm256_setzero_si256();
        while n >= 8 {
            let b = unsafe { r.read() };
            let y = _mm256_set1_epi32(b as i32);
            let mask = _mm256_cmpeq_epi32(_mm256_and_si256(y, bits), bits);
            let x = unsafe { _mm256_loadu_si256(t.cast()) };
            xor = _mm256_xor_si256(xor, _mm256_and_si256(x, mask));
            (n, r, t) = unsafe { (n - 8, r.add(1), t.add(8)) };
        }
        let mut xor = emulate_mm256_reduce_xor_epi32(xor);
        if n > 0 {
            let b = unsafe { r.read() };
            for k in 0..n {
                if b & locate(k).1 != 0 {
                    xor ^= unsafe { t.add(k).read() };
                }
            }
        }
        xor ^ value
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn reduce_xor_of_selected_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let row = (0..n / 8).map(|_| rng.random()).collect::<Vec<u8>>();
            let window = (0..n).map(|_| rng.random()).collect::<Vec<u32>>();
            let value = rng.random::<u32>();
            for z in 3984..4016 {
                let window = &window[..z];
                let specialized = unsafe { reduce_xor_of_selected_v3(&row, window, value) };
                let fallback = fallback(&row, window, value);
                assert!(
                    specialized == fallback,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    fn reduce_xor_of_selected_v2(row: &[u8], window: &[u32], value: u32) -> u32 {
        use crate::bit::locate;
        use crate::emulate::emulate_mm_reduce_xor_epi32;
        use core::arch::x86_64::*;
        assert!(row.len() * 8 >= window.len());
        let mut n = window.len();
        let mut r = row.as_ptr();
        let mut t = window.as_ptr();
        let bits_0 = _mm_setr_epi32(0x80, 0x40, 0x20, 0x10);
        let bits_1 = _mm_setr_epi32(0x08, 0x04, 0x02, 0x01);
        let mut _0 = _mm_setzero_si128();
        let mut _1 = _mm_setzero_si128();
        while n >= 8 {
            let b = unsafe { r.read() };
            let y = _mm_set1_epi32(b as i32);
            let mask_0 = _mm_cmpeq_epi32(_mm_and_si128(y, bits_0), bits_0);
            let mask_1 = _mm_cmpeq_epi32(_mm_and_si128(y, bits_1), bits_1);
            let x_0 = unsafe { _mm_loadu_si128(t.cast()) };
            let x_1 = unsafe { _mm_loadu_si128(t.add(4).cast()) };
            _0 = _mm_xor_si128(_0, _mm_and_si128(x_0, mask_0));
            _1 = _mm_xor_si128(_1, _mm_and_si128(x_1, mask_1));
            (n, r, t) = unsafe { (n - 8, r.add(1), t.add(8)) };
        }
        let mut xor = emulate_mm_reduce_xor_epi32(_mm_xor_si128(_0, _1));
        if n > 0 {
            let b = unsafe { r.read() };
            for k in 0..n {
                if b & locate(k).1 != 0 {
                    xor ^= unsafe { t.add(k).read() };
                }
            }
        }
        xor ^ value
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn reduce_xor_of_selected_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let row = (0..n / 8).map(|_| rng.random()).collect::<Vec<u8>>();
            let window = (0..n).map(|_| rng.random()).collect::<Vec<u32>>();
            let value = rng.random::<u32>();
            for z in 3984..4016 {
                let window = &window[..z];
                let specialized = unsafe { reduce_xor_of_selected_v2(&row, window, value) };
                let fallback = fallback(&row, window, value);
                assert!(
                    specialized == fallback,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    fn reduce_xor_of_selected_a2(row: &[u8], window: &[u32], value: u32) -> u32 {
        use crate::bit::locate;
        use crate::emulate::emulate_vreduce_xor_u32;
        use core::arch::aarch64::*;
        const BITS_0: [u32; 4] = [0x80, 0x40, 0x20, 0x10];
        const BITS_1: [u32; 4] = [0x08, 0x04, 0x02, 0x01];
        assert!(row.len() * 8 >= window.len());
        let mut n = window.len();
        let mut r = row.as_ptr();
        let mut t = window.as_ptr();
        let bits_0 = unsafe { vld1q_u32(BITS_0.as_ptr()) };
        let bits_1 = unsafe { vld1q_u32(BITS_1.as_ptr()) };
        let mut _0 = vdupq_n_u32(0);
        let mut _1 = vdupq_n_u32(0);
        while n >= 8 {
            let b = unsafe { r.read() };
            let y = vdupq_n_u32(b as u32);
            let x_0 = unsafe { vld1q_u32(t) };
            let x_1 = unsafe { vld1q_u32(t.add(4)) };
            _0 = veorq_u32(_0, vandq_u32(x_0, vtstq_u32(y, bits_0)));
            _1 = veorq_u32(_1, vandq_u32(x_1, vtstq_u32(y, bits_1)));
            (n, r, t) = unsafe { (n - 8, r.add(1), t.add(8)) };
        }
        let mut xor = emulate_vreduce_xor_u32(veorq_u32(_0, _1));
        if n > 0 {
            let b = unsafe { r.read() };
            for k in 0..n {
                if b & locate(k).1 != 0 {
                    xor ^= unsafe { t.add(k).read() };
                }
            }
        }
        xor ^ value
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn reduce_xor_of_selected_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let row = (0..n / 8).map(|_| rng.random()).collect::<Vec<u8>>();
            let window = (0..n).map(|_| rng.random()).collect::<Vec<u32>>();
            let value = rng.random::<u32>();
            for z in 3984..4016 {
                let window = &window[..z];
                let specialized = unsafe { reduce_xor_of_selected_a2(&row, window, value) };
                let fallback = fallback(&row, window, value);
                assert!(
                    specialized == fallback,
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[crate::multiversion(@"v4", @"v3", @"v2", @"a2")]
    pub fn reduce_xor_of_selected(row: &[u8], window: &[u32], value: u32) -> u32 {
        use crate::bit::get;
        assert!(row.len() * 8 >= window.len());
        let (groups, remainder) = window.as_chunks::<8>();
        let mut xor = 0_u32;
        for i in 0..groups.len() {
            let (b, group) = (row[i], &groups[i]);
            seq_macro::seq!(k in 0..8 {
                xor ^= group[k] & (((b >> (7 - k)) & 1) as u32).wrapping_neg();
            });
        }
        let offset = groups.len() * 8;
        for k in 0..remainder.len() {
            if get(row, offset + k) {
                xor ^= remainder[k];
            }
        }
        xor ^ value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(row: &[u8], window: &[u32], value: u32) -> u32 {
        let mut xor = value;
        for j in 0..window.len() {
            if row[j / 8] & (1 << (7 - j % 8)) != 0 {
                xor ^= window[j];
            }
        }
        xor
    }

    #[test]
    fn locate_is_msb_first() {
        assert_eq!(locate(0), (0, 0x80));
        assert_eq!(locate(7), (0, 0x01));
        assert_eq!(locate(8), (1, 0x80));
        assert_eq!(locate(13), (1, 0x04));
    }

    #[test]
    fn first_set_skips_zero_bytes() {
        assert_eq!(first_set(&[]), None);
        assert_eq!(first_set(&[0, 0, 0]), None);
        assert_eq!(first_set(&[0x80]), Some(0));
        assert_eq!(first_set(&[0, 0x11]), Some(11));
        let mut row = vec![0u8; 32];
        flip(&mut row, 201);
        assert!(get(&row, 201));
        assert_eq!(first_set(&row), Some(201));
        flip(&mut row, 201);
        assert_eq!(first_set(&row), None);
    }

    #[test]
    fn reduce_xor_of_selected_picks_set_bits() {
        let window = [5, 9, 3, 100];
        assert_eq!(reduce_xor_of_selected(&[0b1010_0000], &window[..3], 5 ^ 3), 0);
        assert_eq!(reduce_xor_of_selected(&[0b1010_0000], &window[..3], 0), 6);
        // the fourth bit is outside the window
        assert_eq!(reduce_xor_of_selected(&[0b1011_0000], &window[..3], 0), 6);
        assert_eq!(reduce_xor_of_selected(&[0b1011_0000], &window, 0), 6 ^ 100);
        assert_eq!(reduce_xor_of_selected(&[], &[], 42), 42);
    }

    #[test]
    fn reduce_xor_of_selected_matches_reference() {
        use rand::Rng;
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 64 } else { 1 } {
            let row = (0..40).map(|_| rng.random()).collect::<Vec<u8>>();
            let window = (0..320).map(|_| rng.random()).collect::<Vec<u32>>();
            let value = rng.random::<u32>();
            for z in 0..320 {
                let window = &window[..z];
                assert_eq!(
                    reduce_xor_of_selected(&row, window, value),
                    reference(&row, window, value)
                );
            }
        }
    }
}
