//! The number type every expression computes with.
//!
//! Selected at build time: the `f32` feature switches the whole crate to
//! single precision, otherwise numbers are `f64`.

#[cfg(feature = "f32")]
pub type Real = f32;

#[cfg(not(feature = "f32"))]
pub type Real = f64;

/// Index into the `&[Real]` slot array passed to expression evaluation.
pub type SlotId = usize;

/// Boolean results are encoded as `1` and `0`.
pub(crate) fn truth(value: bool) -> Real {
    use num_traits::{One, Zero};

    if value {
        Real::one()
    } else {
        Real::zero()
    }
}

/// Any non-zero number counts as true.
pub(crate) fn is_truthy(value: Real) -> bool {
    value != 0.0
}
