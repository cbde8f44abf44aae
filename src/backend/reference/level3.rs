//! Reference Level 3 kernels: `C = alpha * op(A, B) + beta * C`.
//!
//! Every kernel computes the inner product `(A * B)(i, j)` its structure pair
//! needs and hands it to [`update_c`], which owns the output loop. With the
//! `parallel` feature rows of `C` are split across the rayon pool once the
//! work exceeds [`MIN_PARALLEL_WORK`].

use crate::kernel::{RawMatrix, RawMatrixMut};
use crate::layout::{Diag, Structure, Uplo};
use crate::scalar::BlasScalar;
use crate::MIN_PARALLEL_WORK;
use num_traits::{One, Zero};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Raw operand shared across worker threads.
///
/// Kernels only run after validation, which guarantees the output rows each
/// worker writes are disjoint from every input.
struct Shared<R>(R);

unsafe impl<R> Send for Shared<R> {}
unsafe impl<R> Sync for Shared<R> {}

impl<R> Shared<R> {
    #[inline(always)]
    fn get(&self) -> &R {
        &self.0
    }
}

/// Drive the output loop. `inner(i, j)` returns `(A * B)(i, j)`.
unsafe fn update_c<T, F>(alpha: T, beta: T, c: RawMatrixMut<T>, work: usize, inner: F)
where
    T: BlasScalar,
    F: Fn(usize, usize) -> T + Sync,
{
    let row = |c: &RawMatrixMut<T>, i: usize| {
        for j in 0..c.cols {
            let acc = inner(i, j);
            // SAFETY: (i, j) is inside the validated output.
            unsafe {
                let prev = if beta.is_zero() {
                    T::zero()
                } else {
                    beta * c.get(i, j)
                };
                c.set(i, j, alpha * acc + prev);
            }
        }
    };

    #[cfg(feature = "parallel")]
    {
        if work > MIN_PARALLEL_WORK && c.rows > 1 && rayon::current_num_threads() > 1 {
            let shared = Shared(c);
            (0..c.rows)
                .into_par_iter()
                .for_each(|i| row(shared.get(), i));
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = (work, MIN_PARALLEL_WORK);

    for i in 0..c.rows {
        row(&c, i);
    }
}

#[inline(always)]
fn work(a: &RawMatrix<impl Sized>, b: &RawMatrix<impl Sized>) -> usize {
    a.rows.saturating_mul(a.cols).saturating_mul(b.cols)
}

/// Range of `k` for which triangular `A(i, k)` can be nonzero.
#[inline(always)]
fn row_span(uplo: Uplo, i: usize, n: usize) -> std::ops::Range<usize> {
    match uplo {
        Uplo::Upper => i..n,
        Uplo::Lower => 0..i + 1,
    }
}

#[inline(always)]
unsafe fn tri_entry<T: BlasScalar>(a: &RawMatrix<T>, diag: Diag, i: usize, k: usize) -> T {
    if i == k && diag == Diag::Unit {
        T::one()
    } else {
        a.full(i, k)
    }
}

#[inline(always)]
unsafe fn sym_entry<T: BlasScalar>(a: &RawMatrix<T>, uplo: Uplo, i: usize, k: usize) -> T {
    if uplo.contains(i, k) {
        a.full(i, k)
    } else {
        a.full(k, i)
    }
}

/// General times general (`?gemm`).
pub unsafe fn gemm<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    b: RawMatrix<T>,
    beta: T,
    c: RawMatrixMut<T>,
) {
    let w = work(&a, &b);
    let (a, b) = (Shared(a), Shared(b));
    update_c(alpha, beta, c, w, move |i, j| {
        let (a, b) = (a.get(), b.get());
        let mut acc = T::zero();
        for k in 0..a.cols {
            acc = acc + unsafe { a.full(i, k) * b.full(k, j) };
        }
        acc
    });
}

/// Triangular times general (`?trmm`, left side).
pub unsafe fn trmm_left<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    b: RawMatrix<T>,
    beta: T,
    c: RawMatrixMut<T>,
) {
    let (uplo, diag) = match a.structure {
        Structure::Triangular { uplo, diag } => (uplo, diag),
        _ => return any_mm(alpha, a, b, beta, c),
    };
    let w = work(&a, &b);
    let n = a.rows;
    let (a, b) = (Shared(a), Shared(b));
    update_c(alpha, beta, c, w, move |i, j| {
        let (a, b) = (a.get(), b.get());
        let mut acc = T::zero();
        for k in row_span(uplo, i, n) {
            acc = acc + unsafe { tri_entry(a, diag, i, k) * b.full(k, j) };
        }
        acc
    });
}

/// General times triangular (`?trmm`, right side).
pub unsafe fn trmm_right<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    b: RawMatrix<T>,
    beta: T,
    c: RawMatrixMut<T>,
) {
    let (uplo, diag) = match b.structure {
        Structure::Triangular { uplo, diag } => (uplo, diag),
        _ => return any_mm(alpha, a, b, beta, c),
    };
    let w = work(&a, &b);
    let n = b.rows;
    let (a, b) = (Shared(a), Shared(b));
    update_c(alpha, beta, c, w, move |i, j| {
        let (a, b) = (a.get(), b.get());
        let mut acc = T::zero();
        // B(k, j) is nonzero for k in the column span of j, which is the row
        // span of j in the flipped triangle.
        for k in row_span(uplo.flipped(), j, n) {
            acc = acc + unsafe { a.full(i, k) * tri_entry(b, diag, k, j) };
        }
        acc
    });
}

/// Symmetric times general (`?symm`, left side).
pub unsafe fn symm_left<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    b: RawMatrix<T>,
    beta: T,
    c: RawMatrixMut<T>,
) {
    let uplo = match a.structure {
        Structure::Symmetric { uplo } => uplo,
        _ => return any_mm(alpha, a, b, beta, c),
    };
    let w = work(&a, &b);
    let (a, b) = (Shared(a), Shared(b));
    update_c(alpha, beta, c, w, move |i, j| {
        let (a, b) = (a.get(), b.get());
        let mut acc = T::zero();
        for k in 0..a.cols {
            acc = acc + unsafe { sym_entry(a, uplo, i, k) * b.full(k, j) };
        }
        acc
    });
}

/// General times symmetric (`?symm`, right side).
pub unsafe fn symm_right<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    b: RawMatrix<T>,
    beta: T,
    c: RawMatrixMut<T>,
) {
    let uplo = match b.structure {
        Structure::Symmetric { uplo } => uplo,
        _ => return any_mm(alpha, a, b, beta, c),
    };
    let w = work(&a, &b);
    let (a, b) = (Shared(a), Shared(b));
    update_c(alpha, beta, c, w, move |i, j| {
        let (a, b) = (a.get(), b.get());
        let mut acc = T::zero();
        for k in 0..a.cols {
            acc = acc + unsafe { a.full(i, k) * sym_entry(b, uplo, k, j) };
        }
        acc
    });
}

/// Any structure pair through [`RawMatrix::get`].
unsafe fn any_mm<T: BlasScalar>(
    alpha: T,
    a: RawMatrix<T>,
    b: RawMatrix<T>,
    beta: T,
    c: RawMatrixMut<T>,
) {
    let w = work(&a, &b);
    let (a, b) = (Shared(a), Shared(b));
    update_c(alpha, beta, c, w, move |i, j| {
        let (a, b) = (a.get(), b.get());
        let mut acc = T::zero();
        for k in 0..a.cols {
            acc = acc + unsafe { a.get(i, k) * b.get(k, j) };
        }
        acc
    });
}
