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

//! Windowed entry points of the XOR kernels.
//!
//! Each function cuts its windows out of the caller's buffers once, which
//! panics if a window is out of range, and hands fixed-length views to the
//! kernels in `simd`.

/// Residual of a row against `table[pos..pos + width]`.
///
/// Returns the XOR of `table[pos + j]` over every set bit `j < width` of
/// `row`, XOR `value`. Zero means the row decodes to `value`.
///
/// # Panics
///
/// Panics if `pos + width > table.len()` or `row` is shorter than
/// `width.div_ceil(8)` bytes.
pub fn reduce(row: &[u8], table: &[u32], width: usize, pos: usize, value: u32) -> u32 {
    let window = &table[pos..pos + width];
    let row = &row[..width.div_ceil(8)];
    simd::bit::reduce_xor_of_selected(row, window, value)
}

/// `result[i] = arr1[i + shiftnum] ^ arr2[i]` for `i < shifts`.
///
/// Bytes of `result` past `shifts` are left untouched.
///
/// # Panics
///
/// Panics if `arr1` is shorter than `shiftnum + shifts` bytes, or `arr2` or
/// `result` is shorter than `shifts` bytes.
pub fn fold(arr1: &[u8], arr2: &[u8], shiftnum: usize, shifts: usize, result: &mut [u8]) {
    simd::byte::vector_xor_into(
        &arr1[shiftnum..shiftnum + shifts],
        &arr2[..shifts],
        &mut result[..shifts],
    )
}

/// [`fold`] with `result` being `arr2`: `arr2[i] ^= arr1[i + shiftnum]`.
pub fn fold_inplace(arr1: &[u8], shiftnum: usize, shifts: usize, arr2: &mut [u8]) {
    simd::byte::vector_xor_inplace(&mut arr2[..shifts], &arr1[shiftnum..shiftnum + shifts])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn brute_force(row: &[u8], table: &[u32], width: usize, pos: usize, value: u32) -> u32 {
        let mut xor = value;
        for j in 0..width {
            if simd::bit::get(row, j) {
                xor ^= table[pos + j];
            }
        }
        xor
    }

    #[test]
    fn reduce_scenario() {
        let table = [5, 9, 3, 7, 11];
        assert_eq!(reduce(&[0b1010_0000], &table, 3, 0, 5 ^ 3), 0);
        assert_eq!(reduce(&[0b1010_0000], &table, 3, 1, 0), 9 ^ 7);
        assert_eq!(reduce(&[0b1010_0000], &table, 0, 5, 77), 77);
    }

    #[test]
    fn reduce_is_zero_at_the_expected_value() {
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 4 } {
            let width = rng.random_range(0..=300_usize);
            let pos = rng.random_range(0..64_usize);
            let table = (0..pos + width + 16).map(|_| rng.random()).collect::<Vec<u32>>();
            let row = (0..width.div_ceil(8)).map(|_| rng.random()).collect::<Vec<u8>>();
            let value = brute_force(&row, &table, width, pos, 0);
            assert_eq!(reduce(&row, &table, width, pos, value), 0);
        }
    }

    #[test]
    fn reduce_is_linear_in_the_row() {
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 4 } {
            let width = rng.random_range(1..=300_usize);
            let pos = rng.random_range(0..64_usize);
            let table = (0..pos + width).map(|_| rng.random()).collect::<Vec<u32>>();
            let mut row = (0..width.div_ceil(8)).map(|_| rng.random()).collect::<Vec<u8>>();
            let value = rng.random::<u32>();
            let j = rng.random_range(0..width);
            let before = reduce(&row, &table, width, pos, value);
            simd::bit::flip(&mut row, j);
            let after = reduce(&row, &table, width, pos, value);
            assert_eq!(before ^ after, table[pos + j]);
        }
    }

    #[test]
    fn reduce_does_not_depend_on_the_split_point() {
        let mut rng = rand::rng();
        let table = (0..128).map(|_| rng.random()).collect::<Vec<u32>>();
        let row = (0..8).map(|_| rng.random()).collect::<Vec<u8>>();
        let value = rng.random::<u32>();
        for width in 0..=64 {
            for pos in [0, 1, 7, 8, 13] {
                assert_eq!(
                    reduce(&row, &table, width, pos, value),
                    brute_force(&row, &table, width, pos, value),
                    "width = {width}, pos = {pos}"
                );
            }
        }
    }

    #[test]
    #[should_panic]
    fn reduce_rejects_a_window_past_the_table() {
        reduce(&[0xff; 4], &[0; 31], 32, 0, 0);
    }

    #[test]
    fn fold_scenario() {
        let arr1 = [0x00, 0x11, 0x22, 0x33];
        let arr2 = [0xff, 0xff];
        let mut result = [0u8; 2];
        fold(&arr1, &arr2, 1, 2, &mut result);
        assert_eq!(result, [0xee, 0xdd]);
    }

    #[test]
    fn fold_matches_bytewise_reference() {
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 4 } {
            let shifts = rng.random_range(0..=200_usize);
            let shiftnum = rng.random_range(0..=40_usize);
            let arr1 = (0..shiftnum + shifts).map(|_| rng.random()).collect::<Vec<u8>>();
            let arr2 = (0..shifts).map(|_| rng.random()).collect::<Vec<u8>>();
            let mut result = vec![0x5a_u8; shifts + 3];
            fold(&arr1, &arr2, shiftnum, shifts, &mut result);
            for i in 0..shifts {
                assert_eq!(result[i], arr1[i + shiftnum] ^ arr2[i]);
            }
            assert_eq!(result[shifts..], [0x5a; 3]);
        }
    }

    #[test]
    fn fold_twice_restores_the_window() {
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 64 } else { 4 } {
            let shifts = rng.random_range(0..=100_usize);
            let shiftnum = rng.random_range(0..=40_usize);
            let arr1 = (0..shiftnum + shifts).map(|_| rng.random()).collect::<Vec<u8>>();
            let arr2 = (0..shifts).map(|_| rng.random()).collect::<Vec<u8>>();
            let mut once = vec![0u8; shifts];
            fold(&arr1, &arr2, shiftnum, shifts, &mut once);
            let mut twice = vec![0u8; shifts];
            fold(&once, &arr2, 0, shifts, &mut twice);
            assert_eq!(twice, arr1[shiftnum..]);
        }
    }

    #[test]
    fn fold_inplace_agrees_with_fold() {
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 64 } else { 4 } {
            let shifts = rng.random_range(0..=100_usize);
            let shiftnum = rng.random_range(0..=40_usize);
            let arr1 = (0..shiftnum + shifts).map(|_| rng.random()).collect::<Vec<u8>>();
            let arr2 = (0..shifts + 5).map(|_| rng.random()).collect::<Vec<u8>>();
            let mut expected = arr2.clone();
            fold(&arr1, &arr2, shiftnum, shifts, &mut expected);
            let mut inplace = arr2.clone();
            fold_inplace(&arr1, shiftnum, shifts, &mut inplace);
            assert_eq!(inplace, expected);
        }
    }
}
