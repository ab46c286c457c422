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

#![allow(unsafe_code)]

//! Flat C entry points of the XOR kernels.

use std::ffi::c_int;

/// XOR of `r_p[pos + j]` over the set bits `j < w` of `row`, XOR `value`.
///
/// # Safety
///
/// * `row` is valid for reading `w.div_ceil(8)` bytes.
/// * `r_p` is valid for reading `pos + w` words.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn optimized_xor(
    row: *const u8,
    r_p: *const u32,
    w: c_int,
    pos: c_int,
    value: c_int,
) -> u32 {
    let value = value as u32;
    let (Ok(w @ 1..), Ok(pos)) = (usize::try_from(w), usize::try_from(pos)) else {
        return value;
    };
    let row = unsafe { std::slice::from_raw_parts(row, w.div_ceil(8)) };
    let table = unsafe { std::slice::from_raw_parts(r_p.add(pos), w) };
    kernel::reduce(row, table, w, 0, value)
}

/// `result[i] = arr1[i + shiftnum] ^ arr2[i]` for `i < shifts`.
///
/// # Safety
///
/// * `arr1` is valid for reading `shiftnum + shifts` bytes.
/// * `arr2` is valid for reading `shifts` bytes.
/// * `result` is valid for writing `shifts` bytes, and either is `arr2` or
///   does not overlap `arr1` or `arr2`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn xor_shift_simd(
    result: *mut u8,
    arr1: *const u8,
    arr2: *const u8,
    shifts: c_int,
    shiftnum: c_int,
) {
    let (Ok(shifts @ 1..), Ok(shiftnum)) = (usize::try_from(shifts), usize::try_from(shiftnum))
    else {
        return;
    };
    let arr1 = unsafe { std::slice::from_raw_parts(arr1.add(shiftnum), shifts) };
    if std::ptr::eq(result.cast_const(), arr2) {
        let arr2 = unsafe { std::slice::from_raw_parts_mut(result, shifts) };
        kernel::fold_inplace(arr1, 0, shifts, arr2);
    } else {
        let arr2 = unsafe { std::slice::from_raw_parts(arr2, shifts) };
        let result = unsafe { std::slice::from_raw_parts_mut(result, shifts) };
        kernel::fold(arr1, arr2, 0, shifts, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn optimized_xor_scenario() {
        let table = [5_u32, 9, 3, 7, 11];
        let row = [0b1010_0000_u8];
        unsafe {
            assert_eq!(optimized_xor(row.as_ptr(), table.as_ptr(), 3, 0, 5 ^ 3), 0);
            assert_eq!(optimized_xor(row.as_ptr(), table.as_ptr(), 3, 1, 0), 9 ^ 7);
            assert_eq!(optimized_xor(row.as_ptr(), table.as_ptr(), 3, 0, -1), !(5 ^ 3));
        }
    }

    #[test]
    fn optimized_xor_without_a_window_returns_value() {
        let row = std::ptr::null::<u8>();
        unsafe {
            assert_eq!(optimized_xor(row, std::ptr::null(), 0, 0, 77), 77);
            assert_eq!(optimized_xor(row, std::ptr::null(), -4, 0, 77), 77);
            assert_eq!(optimized_xor(row, std::ptr::null(), 8, -1, 77), 77);
        }
    }

    #[test]
    fn xor_shift_simd_scenario() {
        let arr1 = [0x00_u8, 0x11, 0x22, 0x33];
        let arr2 = [0xff_u8, 0xff];
        let mut result = [0_u8; 3];
        unsafe {
            xor_shift_simd(result.as_mut_ptr(), arr1.as_ptr(), arr2.as_ptr(), 2, 1);
        }
        assert_eq!(result, [0xee, 0xdd, 0x00]);
    }

    #[test]
    fn xor_shift_simd_in_place() {
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 64 } else { 4 } {
            let shifts = rng.random_range(1..=100_usize);
            let shiftnum = rng.random_range(0..=40_usize);
            let arr1 = (0..shiftnum + shifts).map(|_| rng.random()).collect::<Vec<u8>>();
            let mut arr2 = (0..shifts).map(|_| rng.random()).collect::<Vec<u8>>();
            let expected = (0..shifts)
                .map(|i| arr1[i + shiftnum] ^ arr2[i])
                .collect::<Vec<u8>>();
            let ptr = arr2.as_mut_ptr();
            unsafe {
                xor_shift_simd(ptr, arr1.as_ptr(), ptr, shifts as c_int, shiftnum as c_int);
            }
            assert_eq!(arr2, expected);
        }
    }

    #[test]
    fn xor_shift_simd_without_a_window_is_a_no_op() {
        let mut result = [0x5a_u8; 4];
        unsafe {
            xor_shift_simd(result.as_mut_ptr(), std::ptr::null(), std::ptr::null(), 0, 3);
            xor_shift_simd(result.as_mut_ptr(), std::ptr::null(), std::ptr::null(), -1, 3);
            xor_shift_simd(result.as_mut_ptr(), std::ptr::null(), std::ptr::null(), 4, -2);
        }
        assert_eq!(result, [0x5a; 4]);
    }

    #[test]
    fn c_entry_points_solve_a_band_table() {
        let keys = (0..200_u32).map(u32::to_le_bytes).collect::<Vec<_>>();
        let values = (0..200_u32).map(|i| i ^ 0xdead_beef).collect::<Vec<_>>();
        let options = band::BandOptions {
            width: 256,
            expansion: 1.2,
            seed: 11,
        };
        let okvs = band::BandOkvs::encode(&keys, &values, &options).unwrap();
        let range = okvs.table().len() - okvs.width();
        for (key, &value) in keys.iter().zip(values.iter()) {
            let pos = band::hash::position(key, okvs.seed(), range);
            let row = band::hash::row(key, okvs.seed(), okvs.width());
            let residual = unsafe {
                optimized_xor(
                    row.as_ptr(),
                    okvs.table().as_ptr(),
                    okvs.width() as c_int,
                    pos as c_int,
                    value as c_int,
                )
            };
            assert_eq!(residual, 0);
        }
    }
}
