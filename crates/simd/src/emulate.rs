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

// There is no horizontal xor in any instruction set we target.

#[inline]
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f")]
pub fn emulate_mm512_reduce_xor_epi32(x: core::arch::x86_64::__m512i) -> u32 {
    use core::arch::x86_64::*;
    let lo = _mm512_castsi512_si256(x);
    let hi = _mm512_extracti64x4_epi64::<1>(x);
    emulate_mm256_reduce_xor_epi32(_mm256_xor_si256(lo, hi))
}

#[inline]
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub fn emulate_mm256_reduce_xor_epi32(x: core::arch::x86_64::__m256i) -> u32 {
    use core::arch::x86_64::*;
    let lo = _mm256_castsi256_si128(x);
    let hi = _mm256_extracti128_si256::<1>(x);
    emulate_mm_reduce_xor_epi32(_mm_xor_si128(lo, hi))
}

#[inline]
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
pub fn emulate_mm_reduce_xor_epi32(x: core::arch::x86_64::__m128i) -> u32 {
    use core::arch::x86_64::*;
    // [0 ^ 2, 1 ^ 3, _, _]
    let x = _mm_xor_si128(x, _mm_unpackhi_epi64(x, x));
    // [0 ^ 1 ^ 2 ^ 3, _, _, _]
    let x = _mm_xor_si128(x, _mm_shuffle_epi32::<0b01_01_01_01>(x));
    _mm_cvtsi128_si32(x) as u32
}

#[inline]
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub fn emulate_vreduce_xor_u32(x: core::arch::aarch64::uint32x4_t) -> u32 {
    use core::arch::aarch64::*;
    // [0 ^ 2, 1 ^ 3]
    let x = veor_u32(vget_low_u32(x), vget_high_u32(x));
    vget_lane_u32::<0>(x) ^ vget_lane_u32::<1>(x)
}
