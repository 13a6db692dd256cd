use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RootsError {
    #[error("function values at {a} and {b} do not bracket a root")]
    NotBracketed { a: f64, b: f64 },
    #[error("root finding did not converge within {max_iterations} iterations")]
    MaxIterations { max_iterations: usize },
}

/// Bracketed bisection for a scalar root of `f` in `[a, b]`.
///
/// Requires a sign change over the bracket. Converges once the bracket width
/// falls below `tolerance`.
pub fn bisect(
    f: impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<f64, RootsError> {
    let (mut lo, mut hi) = if a <= b { (a, b) } else { (b, a) };
    let f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() || f_lo.is_nan() || f_hi.is_nan() {
        return Err(RootsError::NotBracketed { a, b });
    }

    let mut f_lo = f_lo;
    for _ in 0..max_iterations {
        let mid = 0.5 * (lo + hi);
        if hi - lo < tolerance {
            return Ok(mid);
        }
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return Ok(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Err(RootsError::MaxIterations { max_iterations })
}

/// All sign changes of `f` on a uniform grid of `samples` points over
/// `[a, b]`, refined by bisection. Used to locate spinodal densities from the
/// derivative of a bulk chemical potential.
pub fn sign_changes(
    f: impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    samples: usize,
    tolerance: f64,
) -> Vec<f64> {
    let mut roots = Vec::new();
    if samples < 2 {
        return roots;
    }
    let step = (b - a) / (samples - 1) as f64;
    let mut x_prev = a;
    let mut f_prev = f(a);
    for i in 1..samples {
        let x = a + step * i as f64;
        let f_x = f(x);
        if f_prev.signum() != f_x.signum() && !f_prev.is_nan() && !f_x.is_nan() {
            if let Ok(root) = bisect(&f, x_prev, x, tolerance, 200) {
                roots.push(root);
            }
        }
        x_prev = x;
        f_prev = f_x;
    }
    roots
}
