//! Scalar kinds and the boxed scalar carrier.
//!
//! [`Scalar`] carries alpha/beta arguments and scalar results across the
//! dispatcher surface without making every call site generic over the
//! element type. [`BlasScalar`] ties each element type to its kind, its real
//! counterpart and its kernel table.

use crate::engine::{KernelSet, Kernels};
use crate::{BlasError, Result};
use num_complex::{Complex, Complex32, Complex64};
use num_traits::{Float, One, Zero};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Runtime tag of a scalar element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Real32,
    Real64,
    Complex32,
    Complex64,
}

impl ScalarKind {
    /// Returns true for the complex kinds.
    #[inline]
    pub fn is_complex(self) -> bool {
        matches!(self, ScalarKind::Complex32 | ScalarKind::Complex64)
    }

    /// Kind of norms and magnitudes computed over this kind.
    #[inline]
    pub fn real(self) -> ScalarKind {
        match self {
            ScalarKind::Real32 | ScalarKind::Complex32 => ScalarKind::Real32,
            ScalarKind::Real64 | ScalarKind::Complex64 => ScalarKind::Real64,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Real32 => "real32",
            ScalarKind::Real64 => "real64",
            ScalarKind::Complex32 => "complex32",
            ScalarKind::Complex64 => "complex64",
        };
        f.write_str(name)
    }
}

/// A scalar of exactly one kind.
///
/// Extraction is checked: asking for a different kind than the one stored is
/// an error, never a conversion.
///
/// ```rust
/// use strided_blas::{Scalar, ScalarKind};
///
/// let alpha = Scalar::from(2.0f32);
/// assert_eq!(alpha.kind(), ScalarKind::Real32);
/// assert_eq!(alpha.get::<f32>().unwrap(), 2.0);
/// assert!(alpha.get::<f64>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Real32(f32),
    Real64(f64),
    Complex32(Complex32),
    Complex64(Complex64),
}

impl Scalar {
    /// The kind of the stored value.
    #[inline]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Real32(_) => ScalarKind::Real32,
            Scalar::Real64(_) => ScalarKind::Real64,
            Scalar::Complex32(_) => ScalarKind::Complex32,
            Scalar::Complex64(_) => ScalarKind::Complex64,
        }
    }

    /// Extract the value as `T`.
    ///
    /// # Errors
    /// [`BlasError::ScalarKindMismatch`] if `T::KIND` differs from the stored kind.
    #[inline]
    pub fn get<T: BlasScalar>(self) -> Result<T> {
        T::from_scalar(self).ok_or(BlasError::ScalarKindMismatch {
            expected: T::KIND,
            found: self.kind(),
        })
    }

    /// The zero of the given kind.
    pub fn zero(kind: ScalarKind) -> Scalar {
        match kind {
            ScalarKind::Real32 => Scalar::Real32(0.0),
            ScalarKind::Real64 => Scalar::Real64(0.0),
            ScalarKind::Complex32 => Scalar::Complex32(Complex32::zero()),
            ScalarKind::Complex64 => Scalar::Complex64(Complex64::zero()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Real32(v) => write!(f, "{v}"),
            Scalar::Real64(v) => write!(f, "{v}"),
            Scalar::Complex32(v) => write!(f, "{v}"),
            Scalar::Complex64(v) => write!(f, "{v}"),
        }
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Real32(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Real64(v)
    }
}

impl From<Complex32> for Scalar {
    fn from(v: Complex32) -> Self {
        Scalar::Complex32(v)
    }
}

impl From<Complex64> for Scalar {
    fn from(v: Complex64) -> Self {
        Scalar::Complex64(v)
    }
}

/// Element types the dispatcher and the kernels operate on.
///
/// Implemented for `f32`, `f64`, `Complex32` and `Complex64`.
pub trait BlasScalar:
    Copy
    + Send
    + Sync
    + fmt::Debug
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Real counterpart (`Self` for real kinds).
    type Real: BlasReal;

    /// Runtime tag of this type.
    const KIND: ScalarKind;

    /// Box the value.
    fn into_scalar(self) -> Scalar;

    /// Unbox the value if the box holds this kind.
    fn from_scalar(s: Scalar) -> Option<Self>;

    /// Real part.
    fn re(self) -> Self::Real;

    /// Imaginary part (zero for real kinds).
    fn im(self) -> Self::Real;

    /// Complex conjugate (identity for real kinds).
    fn conj(self) -> Self;

    /// Embed a real value.
    fn from_real(r: Self::Real) -> Self;

    /// `|re| + |im|`, the BLAS magnitude used by `iamax` and `asum`.
    #[inline(always)]
    fn abs1(self) -> Self::Real {
        self.re().abs() + self.im().abs()
    }

    /// Multiply by a real factor.
    #[inline(always)]
    fn scale_real(self, r: Self::Real) -> Self {
        self * Self::from_real(r)
    }

    #[doc(hidden)]
    fn kernels(set: &KernelSet) -> &Kernels<Self>;

    #[doc(hidden)]
    fn kernels_mut(set: &mut KernelSet) -> &mut Kernels<Self>;
}

/// Real element types (`f32`, `f64`).
pub trait BlasReal: BlasScalar<Real = Self> + Float {
    /// Convert a literal constant.
    fn constant(v: f64) -> Self;
}

macro_rules! impl_blas_real {
    ($t:ty, $kind:ident, $field:ident) => {
        impl BlasScalar for $t {
            type Real = $t;
            const KIND: ScalarKind = ScalarKind::$kind;

            #[inline(always)]
            fn into_scalar(self) -> Scalar {
                Scalar::$kind(self)
            }
            #[inline(always)]
            fn from_scalar(s: Scalar) -> Option<Self> {
                match s {
                    Scalar::$kind(v) => Some(v),
                    _ => None,
                }
            }
            #[inline(always)]
            fn re(self) -> $t {
                self
            }
            #[inline(always)]
            fn im(self) -> $t {
                0.0
            }
            #[inline(always)]
            fn conj(self) -> Self {
                self
            }
            #[inline(always)]
            fn from_real(r: $t) -> Self {
                r
            }
            #[inline(always)]
            fn abs1(self) -> $t {
                self.abs()
            }
            #[inline(always)]
            fn scale_real(self, r: $t) -> Self {
                self * r
            }
            fn kernels(set: &KernelSet) -> &Kernels<Self> {
                &set.$field
            }
            fn kernels_mut(set: &mut KernelSet) -> &mut Kernels<Self> {
                &mut set.$field
            }
        }

        impl BlasReal for $t {
            #[inline(always)]
            fn constant(v: f64) -> Self {
                v as $t
            }
        }
    };
}

impl_blas_real!(f32, Real32, real32);
impl_blas_real!(f64, Real64, real64);

macro_rules! impl_blas_complex {
    ($r:ty, $kind:ident, $field:ident) => {
        impl BlasScalar for Complex<$r> {
            type Real = $r;
            const KIND: ScalarKind = ScalarKind::$kind;

            #[inline(always)]
            fn into_scalar(self) -> Scalar {
                Scalar::$kind(self)
            }
            #[inline(always)]
            fn from_scalar(s: Scalar) -> Option<Self> {
                match s {
                    Scalar::$kind(v) => Some(v),
                    _ => None,
                }
            }
            #[inline(always)]
            fn re(self) -> $r {
                self.re
            }
            #[inline(always)]
            fn im(self) -> $r {
                self.im
            }
            #[inline(always)]
            fn conj(self) -> Self {
                Complex::conj(&self)
            }
            #[inline(always)]
            fn from_real(r: $r) -> Self {
                Complex::new(r, 0.0)
            }
            #[inline(always)]
            fn scale_real(self, r: $r) -> Self {
                Complex::new(self.re * r, self.im * r)
            }
            fn kernels(set: &KernelSet) -> &Kernels<Self> {
                &set.$field
            }
            fn kernels_mut(set: &mut KernelSet) -> &mut Kernels<Self> {
                &mut set.$field
            }
        }
    };
}

impl_blas_complex!(f32, Complex32, complex32);
impl_blas_complex!(f64, Complex64, complex64);
