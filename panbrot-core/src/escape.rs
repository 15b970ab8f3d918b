use crate::complex::Complex;

/// Squared bailout radius. An orbit keeps iterating while `|z|² <= 4`.
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// The outcome of iterating one point of the plane.
///
/// The coloring pass needs both the step count and the final orbit value
/// (for the smoothing term), so both are kept rather than a bare count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escape {
    /// Number of `z ← z² + c` steps taken before the loop stopped.
    pub iterations: u32,
    /// Orbit value when the loop stopped.
    pub z: Complex,
}

impl Escape {
    /// `true` when the loop ran out of budget without escaping.
    #[inline]
    pub fn is_interior(&self, max_iter: u32) -> bool {
        self.iterations >= max_iter
    }
}

/// Iterate `z ← z² + c` from `z = 0` until `|z|² > 4` or the budget is spent.
///
/// The continuation test is inclusive (`|z|² <= 4`), so an orbit that lands
/// exactly on the bailout circle keeps going. Any positive `max_iter` is
/// accepted; `0` returns immediately with the origin.
#[inline]
pub fn escape_time(c: Complex, max_iter: u32) -> Escape {
    let mut z = Complex::ZERO;
    let mut iterations = 0;

    while z.norm_sq() <= ESCAPE_RADIUS_SQ && iterations < max_iter {
        z = z.square_add(c);
        iterations += 1;
    }

    Escape { iterations, z }
}
