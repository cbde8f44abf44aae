//! CBLAS-backed engine (feature `blas`).
//!
//! Real `f32`/`f64` kernels for the routines CBLAS provides are routed to the
//! system library; every other entry (complex kinds, structured operands,
//! `axpby`, the rotation setup routines) is inherited from the reference
//! engine this one is layered over. Calls whose lengths, increments or
//! leading dimensions do not fit a C `int` also run on the reference kernels.

use crate::backend::reference;
use crate::engine::{Engine, EngineBuilder, Kernels};
use crate::kernel::{
    AsumFn, AxpyFn, CopyFn, DotFn, IamaxFn, Kernel, MmFn, MvFn, Nrm2Fn, RankFn, RawMatrix,
    RawMatrixMut, RawVector, RawVectorMut, RotFn, ScalFn, SwapFn,
};
use crate::layout::{Layout, StructureClass};
use cblas::{Layout as CblasLayout, Transpose};

/// Name of the CBLAS engine.
pub const NAME: &str = "cblas";

/// Build the CBLAS engine on top of the reference registrations.
pub fn engine() -> Engine {
    let mut builder = EngineBuilder::from_engine(NAME, &reference::engine());
    real32::register(builder.kernels_mut::<f32>());
    real64::register(builder.kernels_mut::<f64>());
    builder.build()
}

// ============================================================================
// Operand conversion
// ============================================================================

/// Slice covering a strided vector, starting at its lowest address, plus the
/// increment CBLAS expects. With a negative increment CBLAS walks the slice
/// from its end, which puts element 0 at the highest address as blocks do.
#[inline]
unsafe fn vector<'a, T>(ptr: *const T, len: usize, inc: isize) -> (&'a [T], i32) {
    let (base, extent) = extent(ptr, len, inc);
    (std::slice::from_raw_parts(base, extent), inc as i32)
}

#[inline]
unsafe fn vector_mut<'a, T>(ptr: *mut T, len: usize, inc: isize) -> (&'a mut [T], i32) {
    let (base, extent) = extent(ptr as *const T, len, inc);
    (std::slice::from_raw_parts_mut(base as *mut T, extent), inc as i32)
}

#[inline]
unsafe fn extent<T>(ptr: *const T, len: usize, inc: isize) -> (*const T, usize) {
    if len == 0 {
        return (ptr, 0);
    }
    let base = if inc < 0 {
        ptr.offset((len as isize - 1) * inc)
    } else {
        ptr
    };
    (base, (len - 1) * inc.unsigned_abs() + 1)
}

/// Number of elements CBLAS may touch for a `rows x cols` matrix.
#[inline]
fn matrix_extent(rows: usize, cols: usize, ld: usize, layout: Layout) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        layout.index(rows - 1, cols - 1, ld) + 1
    }
}

#[inline]
fn cblas_layout(layout: Layout) -> CblasLayout {
    match layout {
        Layout::RowMajor => CblasLayout::RowMajor,
        Layout::ColMajor => CblasLayout::ColumnMajor,
    }
}

#[inline]
unsafe fn matrix<'a, T>(a: &RawMatrix<T>) -> &'a [T] {
    std::slice::from_raw_parts(a.ptr, matrix_extent(a.rows, a.cols, a.ld, a.layout))
}

#[inline]
unsafe fn matrix_mut<'a, T>(a: &RawMatrixMut<T>) -> &'a mut [T] {
    std::slice::from_raw_parts_mut(a.ptr, matrix_extent(a.rows, a.cols, a.ld, a.layout))
}

/// Whether every extent fits the `int` arguments of CBLAS.
#[inline]
fn fits_int(extents: &[usize]) -> bool {
    extents.iter().all(|&n| i32::try_from(n).is_ok())
}

/// Transpose flag for an operand stored in `layout` when the call runs in
/// `target`.
#[inline]
fn transpose_for(layout: Layout, target: Layout) -> Transpose {
    if layout == target {
        Transpose::None
    } else {
        Transpose::Ordinary
    }
}

// ============================================================================
// Kernels
// ============================================================================

macro_rules! cblas_kernels {
    (
        $module:ident, $t:ty,
        iamax = $iamax:ident, swap = $swap:ident, copy = $copy:ident, dot = $dot:ident,
        nrm2 = $nrm2:ident, asum = $asum:ident, rot = $rot:ident, scal = $scal:ident,
        axpy = $axpy:ident, gemv = $gemv:ident, ger = $ger:ident, gemm = $gemm:ident
    ) => {
        mod $module {
            use super::*;

            // CBLAS index routines ignore non-positive increments.
            unsafe fn iamax(x: RawVector<$t>) -> usize {
                if x.inc < 0 || !fits_int(&[x.len, x.inc.unsigned_abs()]) {
                    return reference::level1::iamax(x);
                }
                let (xs, incx) = vector(x.ptr, x.len, x.inc);
                cblas::$iamax(x.len as i32, xs, incx) as usize
            }

            unsafe fn swap(x: RawVectorMut<$t>, y: RawVectorMut<$t>) {
                if !fits_int(&[x.len, x.inc.unsigned_abs(), y.inc.unsigned_abs()]) {
                    return reference::level1::swap(x, y);
                }
                let (xs, incx) = vector_mut(x.ptr, x.len, x.inc);
                let (ys, incy) = vector_mut(y.ptr, y.len, y.inc);
                cblas::$swap(x.len as i32, xs, incx, ys, incy);
            }

            unsafe fn copy(x: RawVector<$t>, y: RawVectorMut<$t>) {
                if x.ptr == y.ptr as *const $t && x.inc == y.inc {
                    return;
                }
                if !fits_int(&[x.len, x.inc.unsigned_abs(), y.inc.unsigned_abs()]) {
                    return reference::level1::copy(x, y);
                }
                let (xs, incx) = vector(x.ptr, x.len, x.inc);
                let (ys, incy) = vector_mut(y.ptr, y.len, y.inc);
                cblas::$copy(x.len as i32, xs, incx, ys, incy);
            }

            unsafe fn dot(x: RawVector<$t>, y: RawVector<$t>) -> $t {
                if !fits_int(&[x.len, x.inc.unsigned_abs(), y.inc.unsigned_abs()]) {
                    return reference::level1::dot(x, y);
                }
                let (xs, incx) = vector(x.ptr, x.len, x.inc);
                let (ys, incy) = vector(y.ptr, y.len, y.inc);
                cblas::$dot(x.len as i32, xs, incx, ys, incy)
            }

            // Order-independent reductions: walk the span forward.
            unsafe fn nrm2(x: RawVector<$t>) -> $t {
                if !fits_int(&[x.len, x.inc.unsigned_abs()]) {
                    return reference::level1::nrm2(x);
                }
                let (xs, incx) = vector(x.ptr, x.len, x.inc);
                cblas::$nrm2(x.len as i32, xs, incx.abs())
            }

            unsafe fn asum(x: RawVector<$t>) -> $t {
                if !fits_int(&[x.len, x.inc.unsigned_abs()]) {
                    return reference::level1::asum(x);
                }
                let (xs, incx) = vector(x.ptr, x.len, x.inc);
                cblas::$asum(x.len as i32, xs, incx.abs())
            }

            unsafe fn rot(x: RawVectorMut<$t>, y: RawVectorMut<$t>, c: $t, s: $t) {
                if !fits_int(&[x.len, x.inc.unsigned_abs(), y.inc.unsigned_abs()]) {
                    return reference::level1::rot(x, y, c, s);
                }
                let (xs, incx) = vector_mut(x.ptr, x.len, x.inc);
                let (ys, incy) = vector_mut(y.ptr, y.len, y.inc);
                cblas::$rot(x.len as i32, xs, incx, ys, incy, c, s);
            }

            unsafe fn scal(alpha: $t, x: RawVectorMut<$t>) {
                if !fits_int(&[x.len, x.inc.unsigned_abs()]) {
                    return reference::level1::scal(alpha, x);
                }
                let (xs, incx) = vector_mut(x.ptr, x.len, x.inc);
                cblas::$scal(x.len as i32, alpha, xs, incx.abs());
            }

            // In-place form `y += alpha * y` is a scaling.
            unsafe fn axpy(alpha: $t, x: RawVector<$t>, y: RawVectorMut<$t>) {
                if alpha == 0.0 {
                    return;
                }
                if x.ptr == y.ptr as *const $t && x.inc == y.inc {
                    return scal(1.0 + alpha, y);
                }
                if !fits_int(&[x.len, x.inc.unsigned_abs(), y.inc.unsigned_abs()]) {
                    return reference::level1::axpy(alpha, x, y);
                }
                let (xs, incx) = vector(x.ptr, x.len, x.inc);
                let (ys, incy) = vector_mut(y.ptr, y.len, y.inc);
                cblas::$axpy(x.len as i32, alpha, xs, incx, ys, incy);
            }

            // CBLAS skips the `beta` scaling of `y` when `a` has no columns.
            unsafe fn gemv(
                alpha: $t,
                a: RawMatrix<$t>,
                x: RawVector<$t>,
                beta: $t,
                y: RawVectorMut<$t>,
            ) {
                if a.cols == 0
                    || !fits_int(&[
                        a.rows,
                        a.cols,
                        a.ld,
                        x.inc.unsigned_abs(),
                        y.inc.unsigned_abs(),
                    ])
                {
                    return reference::level2::gemv(alpha, a, x, beta, y);
                }
                let (xs, incx) = vector(x.ptr, x.len, x.inc);
                let (ys, incy) = vector_mut(y.ptr, y.len, y.inc);
                cblas::$gemv(
                    cblas_layout(a.layout),
                    Transpose::None,
                    a.rows as i32,
                    a.cols as i32,
                    alpha,
                    matrix(&a),
                    a.ld as i32,
                    xs,
                    incx,
                    beta,
                    ys,
                    incy,
                );
            }

            unsafe fn ger(alpha: $t, x: RawVector<$t>, y: RawVector<$t>, a: RawMatrixMut<$t>) {
                if !fits_int(&[a.rows, a.cols, a.ld, x.inc.unsigned_abs(), y.inc.unsigned_abs()]) {
                    return reference::level2::ger(alpha, x, y, a);
                }
                let (xs, incx) = vector(x.ptr, x.len, x.inc);
                let (ys, incy) = vector(y.ptr, y.len, y.inc);
                cblas::$ger(
                    cblas_layout(a.layout),
                    a.rows as i32,
                    a.cols as i32,
                    alpha,
                    xs,
                    incx,
                    ys,
                    incy,
                    matrix_mut(&a),
                    a.ld as i32,
                );
            }

            // Runs in the layout of `c`; operands stored the other way are
            // passed transposed.
            unsafe fn gemm(
                alpha: $t,
                a: RawMatrix<$t>,
                b: RawMatrix<$t>,
                beta: $t,
                c: RawMatrixMut<$t>,
            ) {
                if a.cols == 0 || !fits_int(&[c.rows, c.cols, a.cols, a.ld, b.ld, c.ld]) {
                    return reference::level3::gemm(alpha, a, b, beta, c);
                }
                cblas::$gemm(
                    cblas_layout(c.layout),
                    transpose_for(a.layout, c.layout),
                    transpose_for(b.layout, c.layout),
                    c.rows as i32,
                    c.cols as i32,
                    a.cols as i32,
                    alpha,
                    matrix(&a),
                    a.ld as i32,
                    matrix(&b),
                    b.ld as i32,
                    beta,
                    matrix_mut(&c),
                    c.ld as i32,
                );
            }

            pub(super) fn register(k: &mut Kernels<$t>) {
                let l1 = &mut k.level1;
                l1.iamax = Some(Kernel::new(iamax as IamaxFn<$t>));
                l1.swap = Some(Kernel::new(swap as SwapFn<$t>));
                l1.copy = Some(Kernel::in_place(copy as CopyFn<$t>));
                l1.dot = Some(Kernel::new(dot as DotFn<$t>));
                l1.nrm2 = Some(Kernel::new(nrm2 as Nrm2Fn<$t>));
                l1.asum = Some(Kernel::new(asum as AsumFn<$t>));
                l1.rot = Some(Kernel::new(rot as RotFn<$t>));
                l1.scal = Some(Kernel::new(scal as ScalFn<$t>));
                l1.axpy = Some(Kernel::in_place(axpy as AxpyFn<$t>));

                let general = StructureClass::General.index();
                k.mv[general] = Some(Kernel::new(gemv as MvFn<$t>));
                k.rank[general] = Some(Kernel::new(ger as RankFn<$t>));
                k.mm[general][general] = Some(Kernel::new(gemm as MmFn<$t>));
            }
        }
    };
}

cblas_kernels!(
    real32, f32,
    iamax = isamax, swap = sswap, copy = scopy, dot = sdot,
    nrm2 = snrm2, asum = sasum, rot = srot, scal = sscal,
    axpy = saxpy, gemv = sgemv, ger = sger, gemm = sgemm
);

cblas_kernels!(
    real64, f64,
    iamax = idamax, swap = dswap, copy = dcopy, dot = ddot,
    nrm2 = dnrm2, asum = dasum, rot = drot, scal = dscal,
    axpy = daxpy, gemv = dgemv, ger = dger, gemm = dgemm
);
