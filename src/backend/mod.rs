//! Kernel backends.
//!
//! [`reference`] is always available. The CBLAS backend is compiled with the
//! `blas` feature and layered over the reference engine, so entries CBLAS has
//! no routine for (complex kinds, structured operands) still resolve.
//! [`active`] is the single point of backend selection by Cargo feature.

#[cfg(feature = "blas")]
pub mod blas;
pub mod reference;

use crate::engine::Engine;

/// The engine selected by Cargo features: CBLAS with `blas`, otherwise the
/// reference engine.
pub fn active() -> Engine {
    #[cfg(feature = "blas")]
    {
        blas::engine()
    }
    #[cfg(not(feature = "blas"))]
    {
        reference::engine()
    }
}
