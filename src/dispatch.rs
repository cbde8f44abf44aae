//! The operation dispatcher.
//!
//! [`Blas`] validates every call against the rules in the crate docs, looks
//! up the kernel for the operand kind and structure in its [`Engine`], and
//! runs it. Nothing is written before validation has passed.

use crate::block::{MatrixBlock, MatrixBlockMut, VectorBlock, VectorBlockMut};
use crate::engine::{Engine, Kernels};
use crate::kernel::{IamaxFn, Kernel};
use crate::scalar::{BlasScalar, Scalar, ScalarKind};
use crate::validate::{
    checked, dims, exact_len, general_output, no_alias, non_empty, overlap_of, require, same_len,
    unbox,
};
use crate::{Operation, Result, ROTG_LEN, ROTMG_ARGS_LEN, ROTM_PARAM_LEN};
use std::sync::Arc;

#[inline(always)]
fn dispatched(op: Operation, kind: ScalarKind, len: usize) {
    tracing::trace!(op = %op, kind = %kind, len, "dispatch");
}

/// Operation dispatcher over an immutable [`Engine`].
///
/// Cloning is cheap; clones share the engine.
///
/// ```rust
/// use strided_blas::{backend, Blas, Layout, MatrixBlock, MatrixDesc, VectorBlock, VectorBlockMut};
///
/// let blas = Blas::new(backend::reference::engine());
/// let a = [1.0, 2.0, 3.0, 4.0];
/// let a = MatrixBlock::new(&a, MatrixDesc::general(2, 2, Layout::RowMajor)).unwrap();
/// let x = [1.0, 1.0];
/// let mut y = [0.0; 2];
/// blas.mv(1.0, &a, &VectorBlock::from_slice(&x), 0.0, &mut VectorBlockMut::from_slice(&mut y))
///     .unwrap();
/// assert_eq!(y, [3.0, 7.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Blas {
    engine: Arc<Engine>,
}

impl Blas {
    /// Dispatcher over `engine`.
    pub fn new(engine: impl Into<Arc<Engine>>) -> Self {
        Self {
            engine: engine.into(),
        }
    }

    /// The engine calls are routed to.
    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[inline(always)]
    fn kernels<T: BlasScalar>(&self) -> &Kernels<T> {
        self.engine.kernels::<T>()
    }

    // ------------------------------------------------------------------------
    // Level 1
    // ------------------------------------------------------------------------

    fn index_of<T: BlasScalar>(
        op: Operation,
        x: &VectorBlock<'_, T>,
        entry: Option<Kernel<IamaxFn<T>>>,
    ) -> Result<usize> {
        let kernel = checked(op, || {
            non_empty(op, "x", x.len())?;
            require(op, T::KIND, &[], entry)
        })?;
        dispatched(op, T::KIND, x.len());
        // SAFETY: `x` is a validated, non-empty block.
        Ok(unsafe { (kernel.run)(x.raw()) })
    }

    /// Index of the first element with the largest `|re| + |im|`.
    ///
    /// # Errors
    /// [`BlasError::EmptyOperand`](crate::BlasError::EmptyOperand) if `x` is empty.
    pub fn iamax<T: BlasScalar>(&self, x: &VectorBlock<'_, T>) -> Result<usize> {
        Self::index_of(Operation::Iamax, x, self.kernels::<T>().level1.iamax)
    }

    /// Index of the first element with the smallest `|re| + |im|`.
    pub fn iamin<T: BlasScalar>(&self, x: &VectorBlock<'_, T>) -> Result<usize> {
        Self::index_of(Operation::Iamin, x, self.kernels::<T>().level1.iamin)
    }

    /// Construct a Givens rotation in place: `[a, b, c, s]` becomes `[r, z, c, s]`.
    pub fn rotg<T: BlasScalar>(&self, abcs: &mut VectorBlockMut<'_, T>) -> Result<()> {
        const OP: Operation = Operation::Rotg;
        let kernel = checked(OP, || {
            exact_len(OP, abcs.len(), ROTG_LEN)?;
            require(OP, T::KIND, &[], self.kernels::<T>().level1.rotg)
        })?;
        dispatched(OP, T::KIND, abcs.len());
        // SAFETY: four validated slots of a uniquely borrowed block.
        unsafe { (kernel.run)(abcs.raw_mut()) };
        Ok(())
    }

    /// Construct a modified Givens rotation.
    ///
    /// `args = [d1, d2, x1, y1]` is updated to `[d1', d2', x1', y1]` and the
    /// five-slot `p` receives `[flag, h11, h21, h12, h22]`.
    pub fn rotmg<T: BlasScalar>(
        &self,
        p: &mut VectorBlockMut<'_, T>,
        args: &mut VectorBlockMut<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Rotmg;
        let entry = self.kernels::<T>().level1.rotmg;
        let kernel = checked(OP, || {
            exact_len(OP, args.len(), ROTMG_ARGS_LEN)?;
            exact_len(OP, p.len(), ROTM_PARAM_LEN)?;
            no_alias(OP, overlap_of(&entry), ("p", p.footprint()), ("args", args.footprint()))?;
            require(OP, T::KIND, &[], entry)
        })?;
        dispatched(OP, T::KIND, args.len());
        // SAFETY: both blocks validated and disjoint.
        unsafe { (kernel.run)(args.raw_mut(), p.raw_mut()) };
        Ok(())
    }

    /// Apply the modified Givens rotation described by `p` to `(x, y)`.
    pub fn rotm<T: BlasScalar>(
        &self,
        x: &mut VectorBlockMut<'_, T>,
        y: &mut VectorBlockMut<'_, T>,
        p: &VectorBlock<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Rotm;
        let entry = self.kernels::<T>().level1.rotm;
        let kernel = checked(OP, || {
            same_len(OP, x.len(), y.len())?;
            exact_len(OP, p.len(), ROTM_PARAM_LEN)?;
            let overlap = overlap_of(&entry);
            no_alias(OP, overlap, ("x", x.footprint()), ("y", y.footprint()))?;
            no_alias(OP, overlap, ("x", x.footprint()), ("p", p.footprint()))?;
            no_alias(OP, overlap, ("y", y.footprint()), ("p", p.footprint()))?;
            require(OP, T::KIND, &[], entry)
        })?;
        if x.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, equal length, outputs disjoint from every operand.
        unsafe { (kernel.run)(x.raw_mut(), y.raw_mut(), p.raw()) };
        Ok(())
    }

    /// Exchange the elements of `x` and `y`.
    pub fn swap<T: BlasScalar>(
        &self,
        x: &mut VectorBlockMut<'_, T>,
        y: &mut VectorBlockMut<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Swap;
        let entry = self.kernels::<T>().level1.swap;
        let kernel = checked(OP, || {
            same_len(OP, x.len(), y.len())?;
            no_alias(OP, overlap_of(&entry), ("x", x.footprint()), ("y", y.footprint()))?;
            require(OP, T::KIND, &[], entry)
        })?;
        if x.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, equal length, no conflicting overlap.
        unsafe { (kernel.run)(x.raw_mut(), y.raw_mut()) };
        Ok(())
    }

    /// Copy `x` into `y`.
    pub fn copy<T: BlasScalar>(
        &self,
        x: &VectorBlock<'_, T>,
        y: &mut VectorBlockMut<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Copy;
        let entry = self.kernels::<T>().level1.copy;
        let kernel = checked(OP, || {
            same_len(OP, x.len(), y.len())?;
            no_alias(OP, overlap_of(&entry), ("y", y.footprint()), ("x", x.footprint()))?;
            require(OP, T::KIND, &[], entry)
        })?;
        if x.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, equal length, no conflicting overlap.
        unsafe { (kernel.run)(x.raw(), y.raw_mut()) };
        Ok(())
    }

    /// Inner product `Σ conj(x[i]) * y[i]`, boxed in the operand kind.
    pub fn dot<T: BlasScalar>(&self, x: &VectorBlock<'_, T>, y: &VectorBlock<'_, T>) -> Result<Scalar> {
        const OP: Operation = Operation::Dot;
        let kernel = checked(OP, || {
            same_len(OP, x.len(), y.len())?;
            require(OP, T::KIND, &[], self.kernels::<T>().level1.dot)
        })?;
        if x.is_empty() {
            return Ok(Scalar::zero(T::KIND));
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, equal length, read-only.
        Ok(unsafe { (kernel.run)(x.raw(), y.raw()) }.into_scalar())
    }

    /// Euclidean norm, boxed in the real kind of `T`.
    pub fn nrm2<T: BlasScalar>(&self, x: &VectorBlock<'_, T>) -> Result<Scalar> {
        const OP: Operation = Operation::Nrm2;
        let kernel = checked(OP, || {
            require(OP, T::KIND, &[], self.kernels::<T>().level1.nrm2)
        })?;
        if x.is_empty() {
            return Ok(Scalar::zero(<T::Real as BlasScalar>::KIND));
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, read-only.
        Ok(unsafe { (kernel.run)(x.raw()) }.into_scalar())
    }

    /// `Σ |re(x[i])| + |im(x[i])|`, boxed in the real kind of `T`.
    pub fn asum<T: BlasScalar>(&self, x: &VectorBlock<'_, T>) -> Result<Scalar> {
        const OP: Operation = Operation::Asum;
        let kernel = checked(OP, || {
            require(OP, T::KIND, &[], self.kernels::<T>().level1.asum)
        })?;
        if x.is_empty() {
            return Ok(Scalar::zero(<T::Real as BlasScalar>::KIND));
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, read-only.
        Ok(unsafe { (kernel.run)(x.raw()) }.into_scalar())
    }

    /// Plain sum `Σ x[i]`, boxed in the operand kind.
    pub fn sum<T: BlasScalar>(&self, x: &VectorBlock<'_, T>) -> Result<Scalar> {
        const OP: Operation = Operation::Sum;
        let kernel = checked(OP, || {
            require(OP, T::KIND, &[], self.kernels::<T>().level1.sum)
        })?;
        if x.is_empty() {
            return Ok(Scalar::zero(T::KIND));
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, read-only.
        Ok(unsafe { (kernel.run)(x.raw()) }.into_scalar())
    }

    /// Plane rotation: `x' = c*x + s*y`, `y' = c*y - s*x`.
    ///
    /// `c` and `s` must be boxed in the real kind of `T`.
    pub fn rot<T: BlasScalar>(
        &self,
        x: &mut VectorBlockMut<'_, T>,
        y: &mut VectorBlockMut<'_, T>,
        c: impl Into<Scalar>,
        s: impl Into<Scalar>,
    ) -> Result<()> {
        const OP: Operation = Operation::Rot;
        let entry = self.kernels::<T>().level1.rot;
        let (kernel, c, s) = checked(OP, || {
            let c = unbox::<T::Real>(c.into())?;
            let s = unbox::<T::Real>(s.into())?;
            same_len(OP, x.len(), y.len())?;
            no_alias(OP, overlap_of(&entry), ("x", x.footprint()), ("y", y.footprint()))?;
            Ok((require(OP, T::KIND, &[], entry)?, c, s))
        })?;
        if x.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, equal length, no conflicting overlap.
        unsafe { (kernel.run)(x.raw_mut(), y.raw_mut(), c, s) };
        Ok(())
    }

    /// `x = alpha * x`.
    pub fn scal<T: BlasScalar>(&self, alpha: impl Into<Scalar>, x: &mut VectorBlockMut<'_, T>) -> Result<()> {
        const OP: Operation = Operation::Scal;
        let (kernel, alpha) = checked(OP, || {
            let alpha = unbox::<T>(alpha.into())?;
            Ok((require(OP, T::KIND, &[], self.kernels::<T>().level1.scal)?, alpha))
        })?;
        if x.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, uniquely borrowed.
        unsafe { (kernel.run)(alpha, x.raw_mut()) };
        Ok(())
    }

    /// `y = alpha * x + y`.
    pub fn axpy<T: BlasScalar>(
        &self,
        alpha: impl Into<Scalar>,
        x: &VectorBlock<'_, T>,
        y: &mut VectorBlockMut<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Axpy;
        let entry = self.kernels::<T>().level1.axpy;
        let (kernel, alpha) = checked(OP, || {
            let alpha = unbox::<T>(alpha.into())?;
            same_len(OP, x.len(), y.len())?;
            no_alias(OP, overlap_of(&entry), ("y", y.footprint()), ("x", x.footprint()))?;
            Ok((require(OP, T::KIND, &[], entry)?, alpha))
        })?;
        if x.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, equal length, no conflicting overlap.
        unsafe { (kernel.run)(alpha, x.raw(), y.raw_mut()) };
        Ok(())
    }

    /// `y = alpha * x + beta * y`; with `beta == 0` the old `y` is not read.
    pub fn axpby<T: BlasScalar>(
        &self,
        alpha: impl Into<Scalar>,
        x: &VectorBlock<'_, T>,
        beta: impl Into<Scalar>,
        y: &mut VectorBlockMut<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Axpby;
        let entry = self.kernels::<T>().level1.axpby;
        let (kernel, alpha, beta) = checked(OP, || {
            let alpha = unbox::<T>(alpha.into())?;
            let beta = unbox::<T>(beta.into())?;
            same_len(OP, x.len(), y.len())?;
            no_alias(OP, overlap_of(&entry), ("y", y.footprint()), ("x", x.footprint()))?;
            Ok((require(OP, T::KIND, &[], entry)?, alpha, beta))
        })?;
        if x.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, x.len());
        // SAFETY: validated, equal length, no conflicting overlap.
        unsafe { (kernel.run)(alpha, x.raw(), beta, y.raw_mut()) };
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Level 2
    // ------------------------------------------------------------------------

    /// `y = alpha * A * x + beta * y`, routed on the structure of `a`.
    ///
    /// There is no fallback: a structure without a registered kernel is
    /// [`BlasError::UnsupportedLayout`](crate::BlasError::UnsupportedLayout)
    /// even when a general kernel exists.
    pub fn mv<T: BlasScalar>(
        &self,
        alpha: impl Into<Scalar>,
        a: &MatrixBlock<'_, T>,
        x: &VectorBlock<'_, T>,
        beta: impl Into<Scalar>,
        y: &mut VectorBlockMut<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Mv;
        let class = a.structure().class();
        let entry = self.kernels::<T>().mv(class);
        let (kernel, alpha, beta) = checked(OP, || {
            let alpha = unbox::<T>(alpha.into())?;
            let beta = unbox::<T>(beta.into())?;
            dims(
                OP,
                &[a.rows(), a.cols()],
                &[y.len(), x.len()],
                a.cols() == x.len() && a.rows() == y.len(),
            )?;
            let overlap = overlap_of(&entry);
            no_alias(OP, overlap, ("y", y.footprint()), ("a", a.footprint()))?;
            no_alias(OP, overlap, ("y", y.footprint()), ("x", x.footprint()))?;
            Ok((require(OP, T::KIND, &[class], entry)?, alpha, beta))
        })?;
        if y.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, a.rows().saturating_mul(a.cols()));
        // SAFETY: shapes agree, y is disjoint from a and x.
        unsafe { (kernel.run)(alpha, a.raw(), x.raw(), beta, y.raw_mut()) };
        Ok(())
    }

    /// Rank-1 update `A = alpha * x * y^T + A` (unconjugated). `a` must be general.
    pub fn rank<T: BlasScalar>(
        &self,
        alpha: impl Into<Scalar>,
        x: &VectorBlock<'_, T>,
        y: &VectorBlock<'_, T>,
        a: &mut MatrixBlockMut<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Rank;
        let class = a.structure().class();
        let entry = self.kernels::<T>().rank(class);
        let (kernel, alpha) = checked(OP, || {
            let alpha = unbox::<T>(alpha.into())?;
            dims(
                OP,
                &[a.rows(), a.cols()],
                &[x.len(), y.len()],
                a.rows() == x.len() && a.cols() == y.len(),
            )?;
            let overlap = overlap_of(&entry);
            no_alias(OP, overlap, ("a", a.footprint()), ("x", x.footprint()))?;
            no_alias(OP, overlap, ("a", a.footprint()), ("y", y.footprint()))?;
            general_output(OP, T::KIND, a.structure())?;
            Ok((require(OP, T::KIND, &[class], entry)?, alpha))
        })?;
        if x.is_empty() || y.is_empty() {
            return Ok(());
        }
        dispatched(OP, T::KIND, x.len().saturating_mul(y.len()));
        // SAFETY: shapes agree, a is general and disjoint from x and y.
        unsafe { (kernel.run)(alpha, x.raw(), y.raw(), a.raw_mut()) };
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Level 3
    // ------------------------------------------------------------------------

    /// `C = alpha * A * B + beta * C`, routed on the `(a, b)` structure pair.
    /// `c` must be general.
    pub fn mm<T: BlasScalar>(
        &self,
        alpha: impl Into<Scalar>,
        a: &MatrixBlock<'_, T>,
        b: &MatrixBlock<'_, T>,
        beta: impl Into<Scalar>,
        c: &mut MatrixBlockMut<'_, T>,
    ) -> Result<()> {
        const OP: Operation = Operation::Mm;
        let classes = [a.structure().class(), b.structure().class()];
        let entry = self.kernels::<T>().mm(classes[0], classes[1]);
        let (kernel, alpha, beta) = checked(OP, || {
            let alpha = unbox::<T>(alpha.into())?;
            let beta = unbox::<T>(beta.into())?;
            dims(
                OP,
                &[a.rows(), a.cols()],
                &[b.rows(), b.cols()],
                a.cols() == b.rows(),
            )?;
            dims(
                OP,
                &[a.rows(), b.cols()],
                &[c.rows(), c.cols()],
                a.rows() == c.rows() && b.cols() == c.cols(),
            )?;
            let overlap = overlap_of(&entry);
            no_alias(OP, overlap, ("c", c.footprint()), ("a", a.footprint()))?;
            no_alias(OP, overlap, ("c", c.footprint()), ("b", b.footprint()))?;
            general_output(OP, T::KIND, c.structure())?;
            Ok((require(OP, T::KIND, &classes, entry)?, alpha, beta))
        })?;
        if c.rows() == 0 || c.cols() == 0 {
            return Ok(());
        }
        dispatched(
            OP,
            T::KIND,
            a.rows().saturating_mul(a.cols()).saturating_mul(b.cols()),
        );
        // SAFETY: shapes agree, c is general and disjoint from a and b.
        unsafe { (kernel.run)(alpha, a.raw(), b.raw(), beta, c.raw_mut()) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::reference;
    use crate::BlasError;

    #[test]
    fn test_blas_is_send_sync_and_clone() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Blas>();
        let blas = Blas::new(reference::engine());
        let other = blas.clone();
        assert!(Arc::ptr_eq(&blas.engine, &other.engine));
        assert_eq!(other.engine().name(), "reference");
    }

    #[test]
    fn test_scalar_kind_checked_before_shape() {
        let blas = Blas::new(reference::engine());
        let x = [1.0f64, 2.0];
        let mut y = [0.0f64; 3];
        let err = blas
            .axpy(
                1.0f32,
                &VectorBlock::from_slice(&x),
                &mut VectorBlockMut::from_slice(&mut y),
            )
            .unwrap_err();
        assert_eq!(
            err,
            BlasError::ScalarKindMismatch {
                expected: ScalarKind::Real64,
                found: ScalarKind::Real32,
            }
        );
    }

    #[test]
    fn test_empty_reductions_return_zero_in_their_kind() {
        let blas = Blas::new(reference::engine());
        let x: [num_complex::Complex32; 0] = [];
        let x = VectorBlock::from_slice(&x);
        assert_eq!(blas.nrm2(&x).unwrap(), Scalar::Real32(0.0));
        assert_eq!(blas.asum(&x).unwrap(), Scalar::Real32(0.0));
        assert_eq!(blas.dot(&x, &x).unwrap().kind(), ScalarKind::Complex32);
        assert_eq!(blas.sum(&x).unwrap().kind(), ScalarKind::Complex32);
    }
}
