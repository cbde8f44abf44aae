//! Reference Level 2 kernels: matrix-vector products and the rank-1 update.
//!
//! One `mv` kernel per structure class. Each walks only the entries its
//! structure stores; the general kernel reads full storage directly.

use crate::kernel::{RawMatrix, RawMatrixMut, RawVector, RawVectorMut};
use crate::layout::{Diag, PackedKind, Structure, Uplo};
use crate::scalar::BlasScalar;
use num_traits::{One, Zero};

/// Store `alpha * acc + beta * y[i]`, without reading `y[i]` when `beta == 0`.
#[inline(always)]
unsafe fn finish<T: BlasScalar>(alpha: T, acc: T, beta: T, y: &RawVectorMut<T>, i: usize) {
    let prev = if beta.is_zero() {
        T::zero()
    } else {
        beta * y.get(i)
    };
    y.set(i, alpha * acc + prev);
}

/// Structure-agnostic product through [`RawMatrix::get`].
unsafe fn mv_any<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    x: RawVector<T>,
    beta: T,
    y: RawVectorMut<T>,
) {
    for i in 0..a.rows {
        let mut acc = T::zero();
        for j in 0..a.cols {
            acc = acc + a.get(i, j) * x.get(j);
        }
        finish(alpha, acc, beta, &y, i);
    }
}

/// General matrix-vector product (`?gemv`).
pub unsafe fn gemv<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    x: RawVector<T>,
    beta: T,
    y: RawVectorMut<T>,
) {
    for i in 0..a.rows {
        let mut acc = T::zero();
        for j in 0..a.cols {
            acc = acc + a.full(i, j) * x.get(j);
        }
        finish(alpha, acc, beta, &y, i);
    }
}

/// Triangular matrix-vector product into a separate output (`?trmv`).
pub unsafe fn trmv<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    x: RawVector<T>,
    beta: T,
    y: RawVectorMut<T>,
) {
    let (uplo, diag) = match a.structure {
        Structure::Triangular { uplo, diag } => (uplo, diag),
        _ => return mv_any(alpha, a, x, beta, y),
    };
    let n = a.rows;
    for i in 0..n {
        let mut acc = T::zero();
        let cols = match uplo {
            Uplo::Upper => i..n,
            Uplo::Lower => 0..i + 1,
        };
        for j in cols {
            let aij = if i == j && diag == Diag::Unit {
                T::one()
            } else {
                a.full(i, j)
            };
            acc = acc + aij * x.get(j);
        }
        finish(alpha, acc, beta, &y, i);
    }
}

/// Symmetric matrix-vector product reading one triangle (`?symv`).
pub unsafe fn symv<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    x: RawVector<T>,
    beta: T,
    y: RawVectorMut<T>,
) {
    let uplo = match a.structure {
        Structure::Symmetric { uplo } => uplo,
        _ => return mv_any(alpha, a, x, beta, y),
    };
    for i in 0..a.rows {
        let mut acc = T::zero();
        for j in 0..a.cols {
            let aij = if uplo.contains(i, j) {
                a.full(i, j)
            } else {
                a.full(j, i)
            };
            acc = acc + aij * x.get(j);
        }
        finish(alpha, acc, beta, &y, i);
    }
}

/// Band matrix-vector product (`?gbmv`).
pub unsafe fn gbmv<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    x: RawVector<T>,
    beta: T,
    y: RawVectorMut<T>,
) {
    let (kl, ku) = match a.structure {
        Structure::Banded { kl, ku } => (kl, ku),
        _ => return mv_any(alpha, a, x, beta, y),
    };
    for i in 0..a.rows {
        let mut acc = T::zero();
        let lo = i.saturating_sub(kl);
        let hi = (i + ku + 1).min(a.cols);
        for j in lo..hi {
            let aij = *a.ptr.add(a.layout.band_index(kl, ku, i, j, a.ld));
            acc = acc + aij * x.get(j);
        }
        finish(alpha, acc, beta, &y, i);
    }
}

/// Packed triangular or symmetric matrix-vector product (`?tpmv`, `?spmv`).
pub unsafe fn pmv<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    x: RawVector<T>,
    beta: T,
    y: RawVectorMut<T>,
) {
    let (uplo, kind) = match a.structure {
        Structure::Packed { uplo, kind } => (uplo, kind),
        _ => return mv_any(alpha, a, x, beta, y),
    };
    let n = a.rows;
    for i in 0..n {
        let mut acc = T::zero();
        match kind {
            PackedKind::Symmetric => {
                for j in 0..n {
                    let (r, c) = if uplo.contains(i, j) { (i, j) } else { (j, i) };
                    acc = acc + *a.ptr.add(a.layout.packed_index(uplo, n, r, c)) * x.get(j);
                }
            }
            PackedKind::Triangular(diag) => {
                let cols = match uplo {
                    Uplo::Upper => i..n,
                    Uplo::Lower => 0..i + 1,
                };
                for j in cols {
                    let aij = if i == j && diag == Diag::Unit {
                        T::one()
                    } else {
                        *a.ptr.add(a.layout.packed_index(uplo, n, i, j))
                    };
                    acc = acc + aij * x.get(j);
                }
            }
        }
        finish(alpha, acc, beta, &y, i);
    }
}

/// Unconjugated rank-1 update `A += alpha * x * y^T` (`?ger`/`?geru`).
pub unsafe fn ger<T: BlasScalar>(alpha: T, x: RawVector<T>, y: RawVector<T>, a: RawMatrixMut<T>) {
    if alpha.is_zero() {
        return;
    }
    for i in 0..a.rows {
        let axi = alpha * x.get(i);
        for j in 0..a.cols {
            a.set(i, j, a.get(i, j) + axi * y.get(j));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    fn raw<T>(data: &[T]) -> RawVector<T> {
        RawVector {
            ptr: data.as_ptr(),
            len: data.len(),
            inc: 1,
        }
    }

    fn raw_mut<T>(data: &mut [T]) -> RawVectorMut<T> {
        RawVectorMut {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            inc: 1,
        }
    }

    fn matrix<T>(data: &[T], n: usize, ld: usize, layout: Layout, structure: Structure) -> RawMatrix<T> {
        RawMatrix {
            ptr: data.as_ptr(),
            rows: n,
            cols: n,
            ld,
            layout,
            structure,
        }
    }

    #[test]
    fn test_gemv_identity() {
        let a = [1.0, 0.0, 0.0, 1.0];
        let x = [1.0, 2.0];
        let mut y = [f64::NAN; 2];
        unsafe {
            gemv(
                1.0,
                matrix(&a, 2, 2, Layout::RowMajor, Structure::General),
                raw(&x),
                0.0,
                raw_mut(&mut y),
            )
        };
        assert_eq!(y, [1.0, 2.0]);
    }

    #[test]
    fn test_trmv_lower_unit_ignores_diagonal_and_upper() {
        // column-major 2x2 storage: [d, l, u, d]
        let a = [9.0, 3.0, 9.0, 9.0];
        let x = [1.0, 2.0];
        let mut y = [0.0; 2];
        let tri = Structure::Triangular {
            uplo: Uplo::Lower,
            diag: Diag::Unit,
        };
        unsafe {
            trmv(
                1.0,
                matrix(&a, 2, 2, Layout::ColMajor, tri),
                raw(&x),
                0.0,
                raw_mut(&mut y),
            )
        };
        // [[1, 0], [3, 1]] * [1, 2]
        assert_eq!(y, [1.0, 5.0]);
    }

    #[test]
    fn test_symv_mirrors_upper() {
        // row-major, upper triangle holds [[1, 2], [_, 3]]
        let a = [1.0, 2.0, f64::NAN, 3.0];
        let x = [1.0, 1.0];
        let mut y = [1.0, 1.0];
        unsafe {
            symv(
                2.0,
                matrix(&a, 2, 2, Layout::RowMajor, Structure::Symmetric { uplo: Uplo::Upper }),
                raw(&x),
                1.0,
                raw_mut(&mut y),
            )
        };
        assert_eq!(y, [7.0, 11.0]);
    }

    #[test]
    fn test_gbmv_row_major_tridiagonal() {
        // row-major band storage, kl = ku = 1, ld = 3:
        // [ 1 4 0 ]
        // [ 2 5 7 ]
        // [ 0 3 6 ]
        let band = [0.0, 1.0, 4.0, 2.0, 5.0, 7.0, 3.0, 6.0, 0.0];
        let x = [1.0, 1.0, 1.0];
        let mut y = [0.0; 3];
        unsafe {
            gbmv(
                1.0,
                matrix(&band, 3, 3, Layout::RowMajor, Structure::Banded { kl: 1, ku: 1 }),
                raw(&x),
                0.0,
                raw_mut(&mut y),
            )
        };
        assert_eq!(y, [5.0, 14.0, 9.0]);
    }

    #[test]
    fn test_pmv_packed_symmetric_and_triangular() {
        // column-major packed upper of [[1, 2, 4], [2, 3, 5], [4, 5, 6]]
        let ap = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let x = [1.0, 0.0, 0.0];
        let mut y = [0.0; 3];
        let sym = Structure::Packed {
            uplo: Uplo::Upper,
            kind: PackedKind::Symmetric,
        };
        unsafe { pmv(1.0, matrix(&ap, 3, 3, Layout::ColMajor, sym), raw(&x), 0.0, raw_mut(&mut y)) };
        assert_eq!(y, [1.0, 2.0, 4.0]);

        let tri = Structure::Packed {
            uplo: Uplo::Upper,
            kind: PackedKind::Triangular(Diag::NonUnit),
        };
        unsafe { pmv(1.0, matrix(&ap, 3, 3, Layout::ColMajor, tri), raw(&x), 0.0, raw_mut(&mut y)) };
        assert_eq!(y, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_ger_is_unconjugated() {
        use num_complex::Complex64;
        let i = Complex64::new(0.0, 1.0);
        let x = [i];
        let y = [i];
        let mut a = [Complex64::new(0.0, 0.0)];
        let m = RawMatrixMut {
            ptr: a.as_mut_ptr(),
            rows: 1,
            cols: 1,
            ld: 1,
            layout: Layout::RowMajor,
        };
        unsafe { ger(Complex64::new(1.0, 0.0), raw(&x), raw(&y), m) };
        assert_eq!(a[0], Complex64::new(-1.0, 0.0));
    }
}
