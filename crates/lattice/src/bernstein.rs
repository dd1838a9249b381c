//! Bernstein polynomial basis.
//!
//! At degree `n`, index `i` and parameter `t`:
//! `B(n, i, t) = C(n, i) * t^i * (1 - t)^(n - i)`.
//! The `n + 1` basis functions of one degree sum to 1 for every `t`.

/// Binomial coefficient `C(n, i)`, zero when `i > n`.
pub fn binomial(n: usize, i: usize) -> f32 {
    if i > n {
        return 0.0;
    }
    let i = i.min(n - i);
    let mut result = 1.0f64;
    for step in 0..i {
        result = result * (n - step) as f64 / (step + 1) as f64;
    }
    result as f32
}

/// Bernstein basis function `B(n, i, t)`.
pub fn bernstein(n: usize, i: usize, t: f32) -> f32 {
    if i > n {
        return 0.0;
    }
    binomial(n, i) * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32)
}

/// Fill `out` with `B(n, 0..=n, t)`.
pub fn bernstein_weights_into(n: usize, t: f32, out: &mut Vec<f32>) {
    out.clear();
    out.extend((0..=n).map(|i| bernstein(n, i, t)));
}
