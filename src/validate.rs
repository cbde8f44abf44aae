//! Pre-dispatch checks.
//!
//! Every helper returns the error the dispatcher reports; none of them touch
//! operand memory.

use crate::block::Footprint;
use crate::kernel::{Kernel, Overlap};
use crate::layout::{Structure, StructureClass};
use crate::scalar::{BlasScalar, Scalar, ScalarKind};
use crate::{BlasError, Operation, Result};

/// Run the checks in `f`, logging a rejection at debug level.
#[inline]
pub(crate) fn checked<R>(op: Operation, f: impl FnOnce() -> Result<R>) -> Result<R> {
    f().map_err(|err| {
        tracing::debug!(op = %op, error = %err, "rejected call");
        err
    })
}

/// Unbox a scalar argument as `T`.
#[inline]
pub(crate) fn unbox<T: BlasScalar>(s: Scalar) -> Result<T> {
    s.get::<T>()
}

/// Both vector operands must have the same length.
#[inline]
pub(crate) fn same_len(op: Operation, left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(BlasError::Shape {
            op,
            left: vec![left],
            right: vec![right],
        });
    }
    Ok(())
}

/// A fixed-size parameter block must have exactly `expected` slots.
#[inline]
pub(crate) fn exact_len(op: Operation, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(BlasError::Shape {
            op,
            left: vec![len],
            right: vec![expected],
        });
    }
    Ok(())
}

#[inline]
pub(crate) fn non_empty(op: Operation, operand: &'static str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(BlasError::EmptyOperand { op, operand });
    }
    Ok(())
}

/// Matrix/vector or matrix/matrix dimension agreement.
#[inline]
pub(crate) fn dims(op: Operation, left: &[usize], right: &[usize], agree: bool) -> Result<()> {
    if !agree {
        return Err(BlasError::Shape {
            op,
            left: left.to_vec(),
            right: right.to_vec(),
        });
    }
    Ok(())
}

/// Check an output footprint against another operand.
///
/// Disjoint footprints always pass. An identical footprint passes only when
/// the kernel declares [`Overlap::Identical`].
pub(crate) fn no_alias(
    op: Operation,
    overlap: Overlap,
    output: (&'static str, Footprint),
    other: (&'static str, Footprint),
) -> Result<()> {
    let (first, out) = output;
    let (second, fp) = other;
    if out.is_disjoint(&fp) || (overlap == Overlap::Identical && out.is_identical(&fp)) {
        return Ok(());
    }
    Err(BlasError::Aliasing { op, first, second })
}

/// The overlap policy of a possibly missing kernel; a missing kernel is
/// reported later, so aliasing is judged with the strict policy.
#[inline]
pub(crate) fn overlap_of<F>(entry: &Option<Kernel<F>>) -> Overlap {
    entry.as_ref().map_or(Overlap::Disjoint, |k| k.overlap)
}

/// Matrix outputs are written in full storage.
#[inline]
pub(crate) fn general_output(op: Operation, kind: ScalarKind, structure: Structure) -> Result<()> {
    if structure != Structure::General {
        return Err(BlasError::UnsupportedLayout {
            op,
            kind,
            classes: vec![structure.class()],
        });
    }
    Ok(())
}

/// Resolve a kernel entry.
#[inline]
pub(crate) fn require<F>(
    op: Operation,
    kind: ScalarKind,
    classes: &[StructureClass],
    entry: Option<Kernel<F>>,
) -> Result<Kernel<F>> {
    entry.ok_or_else(|| BlasError::UnsupportedLayout {
        op,
        kind,
        classes: classes.to_vec(),
    })
}
