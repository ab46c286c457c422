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

/// `result[i] = lhs[i] ^ rhs[i]`.
#[inline(always)]
pub fn vector_xor_into(lhs: &[u8], rhs: &[u8], result: &mut [u8]) {
    vector_xor_into::vector_xor_into(lhs, rhs, result)
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod vector_xor_into {
    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    fn vector_xor_into_v4(lhs: &[u8], rhs: &[u8], result: &mut [u8]) {
        use core::arch::x86_64::*;
        assert_eq!(lhs.len(), rhs.len());
        assert_eq!(lhs.len(), result.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut c = result.as_mut_ptr();
        while n >= 64 {
            let x = unsafe { _mm512_loadu_si512(a.cast()) };
            let y = unsafe { _mm512_loadu_si512(b.cast()) };
            unsafe { _mm512_storeu_si512(c.cast(), _mm512_xor_si512(x, y)) };
            (n, a, b, c) = unsafe { (n - 64, a.add(64), b.add(64), c.add(64)) };
        }
        if n > 0 {
            let mask = _bzhi_u64(u64::MAX, n as u32);
            let x = unsafe { _mm512_maskz_loadu_epi8(mask, a.cast()) };
            let y = unsafe { _mm512_maskz_loadu_epi8(mask, b.cast()) };
            unsafe { _mm512_mask_storeu_epi8(c.cast(), mask, _mm512_xor_si512(x, y)) };
        }
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn vector_xor_into_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let lhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            let rhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let mut specialized = vec![0u8; z + 1];
                let mut fallback = vec![0u8; z + 1];
                unsafe { vector_xor_into_v4(lhs, rhs, &mut specialized[..z]) };
                self::fallback(lhs, rhs, &mut fallback[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    fn vector_xor_into_v3(lhs: &[u8], rhs: &[u8], result: &mut [u8]) {
        use core::arch::x86_64::*;
        assert_eq!(lhs.len(), rhs.len());
        assert_eq!(lhs.len(), result.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut c = result.as_mut_ptr();
        while n >= 32 {
            let x = unsafe { _mm256_loadu_si256(a.cast()) };
            let y = unsafe { _mm256_loadu_si256(b.cast()) };
            unsafe { _mm256_storeu_si256(c.cast(), _mm256_xor_si256(x, y)) };
            (n, a, b, c) = unsafe { (n - 32, a.add(32), b.add(32), c.add(32)) };
        }
        // this hint is used to disable loop unrolling
        while std::hint::black_box(n) > 0 {
            unsafe { c.write(a.read() ^ b.read()) };
            (n, a, b, c) = unsafe { (n - 1, a.add(1), b.add(1), c.add(1)) };
        }
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn vector_xor_into_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let lhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            let rhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let mut specialized = vec![0u8; z + 1];
                let mut fallback = vec![0u8; z + 1];
                unsafe { vector_xor_into_v3(lhs, rhs, &mut specialized[..z]) };
                self::fallback(lhs, rhs, &mut fallback[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    fn vector_xor_into_v2(lhs: &[u8], rhs: &[u8], result: &mut [u8]) {
        use core::arch::x86_64::*;
        assert_eq!(lhs.len(), rhs.len());
        assert_eq!(lhs.len(), result.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut c = result.as_mut_ptr();
        while n >= 16 {
            let x = unsafe { _mm_loadu_si128(a.cast()) };
            let y = unsafe { _mm_loadu_si128(b.cast()) };
            unsafe { _mm_storeu_si128(c.cast(), _mm_xor_si128(x, y)) };
            (n, a, b, c) = unsafe { (n - 16, a.add(16), b.add(16), c.add(16)) };
        }
        // this hint is used to disable loop unrolling
        while std::hint::black_box(n) > 0 {
            unsafe { c.write(a.read() ^ b.read()) };
            (n, a, b, c) = unsafe { (n - 1, a.add(1), b.add(1), c.add(1)) };
        }
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn vector_xor_into_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let lhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            let rhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let mut specialized = vec![0u8; z + 1];
                let mut fallback = vec![0u8; z + 1];
                unsafe { vector_xor_into_v2(lhs, rhs, &mut specialized[..z]) };
                self::fallback(lhs, rhs, &mut fallback[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    fn vector_xor_into_a2(lhs: &[u8], rhs: &[u8], result: &mut [u8]) {
        use core::arch::aarch64::*;
        assert_eq!(lhs.len(), rhs.len());
        assert_eq!(lhs.len(), result.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut c = result.as_mut_ptr();
        while n >= 16 {
            let x = unsafe { vld1q_u8(a) };
            let y = unsafe { vld1q_u8(b) };
            unsafe { vst1q_u8(c, veorq_u8(x, y)) };
            (n, a, b, c) = unsafe { (n - 16, a.add(16), b.add(16), c.add(16)) };
        }
        // this hint is used to disable loop unrolling
        while std::hint::black_box(n) > 0 {
            unsafe { c.write(a.read() ^ b.read()) };
            (n, a, b, c) = unsafe { (n - 1, a.add(1), b.add(1), c.add(1)) };
        }
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn vector_xor_into_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let lhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            let rhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            for z in 3984..4016 {
                let lhs = &lhs[..z];
                let rhs = &rhs[..z];
                let mut specialized = vec![0u8; z + 1];
                let mut fallback = vec![0u8; z + 1];
                unsafe { vector_xor_into_a2(lhs, rhs, &mut specialized[..z]) };
                self::fallback(lhs, rhs, &mut fallback[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(@"v4", @"v3", @"v2", @"a2")]
    pub fn vector_xor_into(lhs: &[u8], rhs: &[u8], result: &mut [u8]) {
        assert_eq!(lhs.len(), rhs.len());
        assert_eq!(lhs.len(), result.len());
        let n = lhs.len();
        for i in 0..n {
            result[i] = lhs[i] ^ rhs[i];
        }
    }
}

/// `lhs[i] ^= rhs[i]`.
#[inline(always)]
pub fn vector_xor_inplace(lhs: &mut [u8], rhs: &[u8]) {
    vector_xor_inplace::vector_xor_inplace(lhs, rhs)
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod vector_xor_inplace {
    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    fn vector_xor_inplace_v4(lhs: &mut [u8], rhs: &[u8]) {
        use core::arch::x86_64::*;
        assert_eq!(lhs.len(), rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_mut_ptr();
        let mut b = rhs.as_ptr();
        while n >= 64 {
            let x = unsafe { _mm512_loadu_si512(a.cast_const().cast()) };
            let y = unsafe { _mm512_loadu_si512(b.cast()) };
            unsafe { _mm512_storeu_si512(a.cast(), _mm512_xor_si512(x, y)) };
            (n, a, b) = unsafe { (n - 64, a.add(64), b.add(64)) };
        }
        if n > 0 {
            let mask = _bzhi_u64(u64::MAX, n as u32);
            let x = unsafe { _mm512_maskz_loadu_epi8(mask, a.cast_const().cast()) };
            let y = unsafe { _mm512_maskz_loadu_epi8(mask, b.cast()) };
            unsafe { _mm512_mask_storeu_epi8(a.cast(), mask, _mm512_xor_si512(x, y)) };
        }
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn vector_xor_inplace_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let lhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            let rhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            for z in 3984..4016 {
                let mut specialized = lhs.clone();
                let mut fallback = lhs.clone();
                unsafe { vector_xor_inplace_v4(&mut specialized[..z], &rhs[..z]) };
                self::fallback(&mut fallback[..z], &rhs[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    fn vector_xor_inplace_v3(lhs: &mut [u8], rhs: &[u8]) {
        use core::arch::x86_64::*;
        assert_eq!(lhs.len(), rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_mut_ptr();
        let mut b = rhs.as_ptr();
        while n >= 32 {
            let x = unsafe { _mm256_loadu_si256(a.cast_const().cast()) };
            let y = unsafe { _mm256_loadu_si256(b.cast()) };
            unsafe { _mm256_storeu_si256(a.cast(), _mm256_xor_si256(x, y)) };
            (n, a, b) = unsafe { (n - 32, a.add(32), b.add(32)) };
        }
        // this hint is used to disable loop unrolling
        while std::hint::black_box(n) > 0 {
            unsafe { a.write(a.read() ^ b.read()) };
            (n, a, b) = unsafe { (n - 1, a.add(1), b.add(1)) };
        }
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn vector_xor_inplace_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let lhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            let rhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            for z in 3984..4016 {
                let mut specialized = lhs.clone();
                let mut fallback = lhs.clone();
                unsafe { vector_xor_inplace_v3(&mut specialized[..z], &rhs[..z]) };
                self::fallback(&mut fallback[..z], &rhs[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    fn vector_xor_inplace_v2(lhs: &mut [u8], rhs: &[u8]) {
        use core::arch::x86_64::*;
        assert_eq!(lhs.len(), rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_mut_ptr();
        let mut b = rhs.as_ptr();
        while n >= 16 {
            let x = unsafe { _mm_loadu_si128(a.cast_const().cast()) };
            let y = unsafe { _mm_loadu_si128(b.cast()) };
            unsafe { _mm_storeu_si128(a.cast(), _mm_xor_si128(x, y)) };
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        // this hint is used to disable loop unrolling
        while std::hint::black_box(n) > 0 {
            unsafe { a.write(a.read() ^ b.read()) };
            (n, a, b) = unsafe { (n - 1, a.add(1), b.add(1)) };
        }
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn vector_xor_inplace_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let lhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            let rhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            for z in 3984..4016 {
                let mut specialized = lhs.clone();
                let mut fallback = lhs.clone();
                unsafe { vector_xor_inplace_v2(&mut specialized[..z], &rhs[..z]) };
                self::fallback(&mut fallback[..z], &rhs[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[cfg_attr(feature = "internal", simd_macros::public)]
    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    fn vector_xor_inplace_a2(lhs: &mut [u8], rhs: &[u8]) {
        use core::arch::aarch64::*;
        assert_eq!(lhs.len(), rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_mut_ptr();
        let mut b = rhs.as_ptr();
        while n >= 16 {
            let x = unsafe { vld1q_u8(a) };
            let y = unsafe { vld1q_u8(b) };
            unsafe { vst1q_u8(a, veorq_u8(x, y)) };
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        // this hint is used to disable loop unrolling
        while std::hint::black_box(n) > 0 {
            unsafe { a.write(a.read() ^ b.read()) };
            (n, a, b) = unsafe { (n - 1, a.add(1), b.add(1)) };
        }
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn vector_xor_inplace_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            let n = 4016;
            let lhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            let rhs = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
            for z in 3984..4016 {
                let mut specialized = lhs.clone();
                let mut fallback = lhs.clone();
                unsafe { vector_xor_inplace_a2(&mut specialized[..z], &rhs[..z]) };
                self::fallback(&mut fallback[..z], &rhs[..z]);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(@"v4", @"v3", @"v2", @"a2")]
    pub fn vector_xor_inplace(lhs: &mut [u8], rhs: &[u8]) {
        assert_eq!(lhs.len(), rhs.len());
        let n = lhs.len();
        for i in 0..n {
            lhs[i] ^= rhs[i];
        }
    }
}
