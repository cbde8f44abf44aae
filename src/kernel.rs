//! Raw kernel contract.
//!
//! Kernels receive raw pointers plus the stride and dimension metadata of
//! already validated blocks. They are `unsafe fn` pointers: the dispatcher
//! guarantees every address they derive from their arguments is inside a live
//! block, and that output operands do not conflict with inputs beyond what
//! the kernel's [`Overlap`] declares.

use crate::layout::{Diag, Layout, PackedKind, Structure};
use crate::scalar::BlasScalar;

// ============================================================================
// Raw operands
// ============================================================================

/// Read-only vector operand. Element `i` is at `ptr.offset(i * inc)`.
#[derive(Debug)]
pub struct RawVector<T> {
    pub ptr: *const T,
    pub len: usize,
    pub inc: isize,
}

/// Writable vector operand. Same addressing as [`RawVector`].
#[derive(Debug)]
pub struct RawVectorMut<T> {
    pub ptr: *mut T,
    pub len: usize,
    pub inc: isize,
}

/// Read-only matrix operand. `ptr` is the storage origin; entries are
/// addressed according to `layout`, `ld` and `structure`.
#[derive(Debug)]
pub struct RawMatrix<T> {
    pub ptr: *const T,
    pub rows: usize,
    pub cols: usize,
    pub ld: usize,
    pub layout: Layout,
    pub structure: Structure,
}

/// Writable general matrix operand in full storage.
#[derive(Debug)]
pub struct RawMatrixMut<T> {
    pub ptr: *mut T,
    pub rows: usize,
    pub cols: usize,
    pub ld: usize,
    pub layout: Layout,
}

// Manual impls: raw operands are copyable whatever `T` is.
macro_rules! impl_copy {
    ($($name:ident),*) => {$(
        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }
        impl<T> Copy for $name<T> {}
    )*};
}

impl_copy!(RawVector, RawVectorMut, RawMatrix, RawMatrixMut);

impl<T: Copy> RawVector<T> {
    /// # Safety
    /// `i < len` and the operand must come from a live block.
    #[inline(always)]
    pub unsafe fn get(&self, i: usize) -> T {
        *self.ptr.offset(i as isize * self.inc)
    }
}

impl<T: Copy> RawVectorMut<T> {
    /// # Safety
    /// `i < len` and the operand must come from a live block.
    #[inline(always)]
    pub unsafe fn get(&self, i: usize) -> T {
        *self.ptr.offset(i as isize * self.inc)
    }

    /// # Safety
    /// As for [`RawVectorMut::get`], and no other live reference may observe the element.
    #[inline(always)]
    pub unsafe fn set(&self, i: usize, value: T) {
        *self.ptr.offset(i as isize * self.inc) = value;
    }

    /// Read-only view of the same operand.
    #[inline(always)]
    pub fn as_const(&self) -> RawVector<T> {
        RawVector {
            ptr: self.ptr,
            len: self.len,
            inc: self.inc,
        }
    }
}

impl<T> RawMatrix<T> {
    /// Storage offset of the entry that represents `(i, j)`, or `None` when
    /// the structure does not store it (outside the triangle or band, or an
    /// implicit unit diagonal). Symmetric structures map the unstored triangle
    /// onto its mirror.
    pub fn stored_index(&self, i: usize, j: usize) -> Option<usize> {
        let full = |i, j| self.layout.index(i, j, self.ld);
        match self.structure {
            Structure::General => Some(full(i, j)),
            Structure::Triangular { uplo, diag } => {
                if i == j && diag == Diag::Unit {
                    None
                } else if uplo.contains(i, j) {
                    Some(full(i, j))
                } else {
                    None
                }
            }
            Structure::Symmetric { uplo } => {
                if uplo.contains(i, j) {
                    Some(full(i, j))
                } else {
                    Some(full(j, i))
                }
            }
            Structure::Banded { kl, ku } => {
                if i <= j + kl && j <= i + ku {
                    Some(self.layout.band_index(kl, ku, i, j, self.ld))
                } else {
                    None
                }
            }
            Structure::Packed { uplo, kind } => {
                let n = self.rows;
                match kind {
                    PackedKind::Symmetric => {
                        let (i, j) = if uplo.contains(i, j) { (i, j) } else { (j, i) };
                        Some(self.layout.packed_index(uplo, n, i, j))
                    }
                    PackedKind::Triangular(diag) => {
                        if (i == j && diag == Diag::Unit) || !uplo.contains(i, j) {
                            None
                        } else {
                            Some(self.layout.packed_index(uplo, n, i, j))
                        }
                    }
                }
            }
        }
    }

    /// Entry `(i, j)` of full storage, ignoring the structure.
    ///
    /// # Safety
    /// `(i, j)` must be inside the stored rectangle of a live block.
    #[inline(always)]
    pub unsafe fn full(&self, i: usize, j: usize) -> T
    where
        T: Copy,
    {
        *self.ptr.add(self.layout.index(i, j, self.ld))
    }
}

impl<T: BlasScalar> RawMatrix<T> {
    /// Logical entry `(i, j)` of the structured matrix.
    ///
    /// # Safety
    /// `i < rows`, `j < cols`, and the operand must come from a live block.
    #[inline]
    pub unsafe fn get(&self, i: usize, j: usize) -> T {
        match self.stored_index(i, j) {
            Some(idx) => *self.ptr.add(idx),
            None if i == j => T::one(),
            None => T::zero(),
        }
    }
}

impl<T: Copy> RawMatrixMut<T> {
    /// # Safety
    /// `i < rows`, `j < cols`, and the operand must come from a live block.
    #[inline(always)]
    pub unsafe fn get(&self, i: usize, j: usize) -> T {
        *self.ptr.add(self.layout.index(i, j, self.ld))
    }

    /// # Safety
    /// As for [`RawMatrixMut::get`].
    #[inline(always)]
    pub unsafe fn set(&self, i: usize, j: usize, value: T) {
        *self.ptr.add(self.layout.index(i, j, self.ld)) = value;
    }

    /// Read-only general view of the same storage.
    #[inline(always)]
    pub fn as_const(&self) -> RawMatrix<T> {
        RawMatrix {
            ptr: self.ptr,
            rows: self.rows,
            cols: self.cols,
            ld: self.ld,
            layout: self.layout,
            structure: Structure::General,
        }
    }
}

// ============================================================================
// Kernel entry points
// ============================================================================

/// `iamax` / `iamin`: index of the extreme `|re| + |im|`; `len > 0`.
pub type IamaxFn<T> = unsafe fn(x: RawVector<T>) -> usize;
/// `rotg`: `[a, b, c, s]` → `[r, z, c, s]`; `len == 4`.
pub type RotgFn<T> = unsafe fn(abcs: RawVectorMut<T>);
/// `rotmg`: `args = [d1, d2, x1, y1]` updated in place, `param` (5 slots) written.
pub type RotmgFn<T> = unsafe fn(args: RawVectorMut<T>, param: RawVectorMut<T>);
/// `rotm`: apply the modified rotation described by `param` (5 slots).
pub type RotmFn<T> = unsafe fn(x: RawVectorMut<T>, y: RawVectorMut<T>, param: RawVector<T>);
pub type SwapFn<T> = unsafe fn(x: RawVectorMut<T>, y: RawVectorMut<T>);
pub type CopyFn<T> = unsafe fn(x: RawVector<T>, y: RawVectorMut<T>);
/// `dot`: `Σ conj(x[i]) * y[i]`.
pub type DotFn<T> = unsafe fn(x: RawVector<T>, y: RawVector<T>) -> T;
pub type Nrm2Fn<T> = unsafe fn(x: RawVector<T>) -> <T as BlasScalar>::Real;
pub type AsumFn<T> = unsafe fn(x: RawVector<T>) -> <T as BlasScalar>::Real;
pub type SumFn<T> = unsafe fn(x: RawVector<T>) -> T;
pub type RotFn<T> = unsafe fn(
    x: RawVectorMut<T>,
    y: RawVectorMut<T>,
    c: <T as BlasScalar>::Real,
    s: <T as BlasScalar>::Real,
);
pub type ScalFn<T> = unsafe fn(alpha: T, x: RawVectorMut<T>);
pub type AxpyFn<T> = unsafe fn(alpha: T, x: RawVector<T>, y: RawVectorMut<T>);
pub type AxpbyFn<T> = unsafe fn(alpha: T, x: RawVector<T>, beta: T, y: RawVectorMut<T>);
/// `mv`: `y = alpha * A * x + beta * y`; `y` is not read when `beta == 0`.
pub type MvFn<T> = unsafe fn(alpha: T, a: RawMatrix<T>, x: RawVector<T>, beta: T, y: RawVectorMut<T>);
/// `rank`: `A += alpha * x * y^T`.
pub type RankFn<T> = unsafe fn(alpha: T, x: RawVector<T>, y: RawVector<T>, a: RawMatrixMut<T>);
/// `mm`: `C = alpha * A * B + beta * C`; `C` is not read when `beta == 0`.
pub type MmFn<T> =
    unsafe fn(alpha: T, a: RawMatrix<T>, b: RawMatrix<T>, beta: T, c: RawMatrixMut<T>);

/// How a kernel tolerates outputs that share memory with other operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overlap {
    /// Outputs must be disjoint from every other operand.
    #[default]
    Disjoint,
    /// An output may also be passed as an input with an identical footprint
    /// (same start, step and length); any partial overlap is still rejected.
    Identical,
}

/// A registered kernel: entry point plus its aliasing contract.
#[derive(Debug, Clone, Copy)]
pub struct Kernel<F> {
    pub run: F,
    pub overlap: Overlap,
}

impl<F> Kernel<F> {
    /// Kernel that requires disjoint outputs.
    pub const fn new(run: F) -> Self {
        Self {
            run,
            overlap: Overlap::Disjoint,
        }
    }

    /// Kernel that supports the exact in-place form.
    pub const fn in_place(run: F) -> Self {
        Self {
            run,
            overlap: Overlap::Identical,
        }
    }
}
