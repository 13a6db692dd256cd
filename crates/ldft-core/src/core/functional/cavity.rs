//! Free energy of a zero-dimensional cavity as a function of the packing
//! fraction, together with its derivatives. These forms are the building
//! blocks of the lattice fundamental-measure functionals. All quantities are
//! multiplied by the inverse temperature and therefore dimensionless.

#[inline]
pub fn phi_0(x: f64) -> f64 {
    x + (1.0 - x) * (1.0 - x).ln()
}

#[inline]
pub fn dphi_0(x: f64) -> f64 {
    -(1.0 - x).ln()
}

#[inline]
pub fn d2phi_0(x: f64) -> f64 {
    1.0 / (1.0 - x)
}

/// Ideal-gas free energy density at occupation `r`.
#[inline]
pub fn ideal_gas(r: f64) -> f64 {
    r * (r.ln() - 1.0)
}
