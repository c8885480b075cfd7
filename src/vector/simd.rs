/// Inner product of two equal-length rows, accumulated in `f64` so large or tiny
/// components neither overflow nor flush to zero. Uses AVX2 when available and allowed.
#[inline]
pub fn dot(a: &[f32], b: &[f32], simd_enabled: bool) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if simd_enabled {
        #[cfg(target_arch = "x86_64")]
        {
            if std::is_x86_feature_detected!("avx2") && a.len() >= 4 {
                // SAFETY: avx2 support checked above.
                unsafe {
                    return dot_avx2(a, b);
                }
            }
        }
    }
    dot_scalar(a, b)
}

#[inline]
pub fn norm(a: &[f32], simd_enabled: bool) -> f64 {
    dot(a, a, simd_enabled).sqrt()
}

/// Cosine similarity given precomputed norms. A zero-norm side scores 0.
#[inline]
pub fn cosine_with_norms(
    a: &[f32],
    norm_a: f64,
    b: &[f32],
    norm_b: f64,
    simd_enabled: bool,
) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b, simd_enabled) / norm_a / norm_b
}

#[inline]
fn dot_scalar(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

// Widens four f32 lanes at a time to f64 before multiplying.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn dot_avx2(a: &[f32], b: &[f32]) -> f64 {
    use std::arch::x86_64::*;

    let lanes = a.len() / 4 * 4;
    let mut acc = _mm256_setzero_pd();
    for offset in (0..lanes).step_by(4) {
        let va = _mm256_cvtps_pd(_mm_loadu_ps(a.as_ptr().add(offset)));
        let vb = _mm256_cvtps_pd(_mm_loadu_ps(b.as_ptr().add(offset)));
        acc = _mm256_add_pd(acc, _mm256_mul_pd(va, vb));
    }
    let mut partial = [0f64; 4];
    _mm256_storeu_pd(partial.as_mut_ptr(), acc);
    partial.iter().sum::<f64>() + dot_scalar(&a[lanes..], &b[lanes..])
}
