//! Validated kernel dispatch for BLAS Level 1/2/3 operations.
//!
//! One operation set (`iamax`, `rotg`, `dot`, `nrm2`, `axpy`, `mv`, `mm`, ...)
//! runs over blocks of any supported scalar kind (`f32`, `f64`, `Complex32`,
//! `Complex64`), any memory layout (row-major, column-major, strided, negative
//! increments, transposed views) and any structural tag (general, triangular,
//! symmetric, banded, packed). The dispatcher checks every call before a
//! kernel touches memory and routes it to the kernel registered for the
//! operand's scalar kind and structure.
//!
//! # Core Types
//!
//! - [`VectorBlock`] / [`VectorBlockMut`]: strided vector views
//! - [`MatrixBlock`] / [`MatrixBlockMut`]: matrix views described by a [`MatrixDesc`]
//! - [`Scalar`]: kind-tagged carrier for alpha/beta and scalar results
//! - [`Engine`]: immutable kernel tables, built with [`EngineBuilder`]
//! - [`Blas`]: the dispatcher
//!
//! # Example
//!
//! ```rust
//! use strided_blas::{backend, Blas, VectorBlock};
//!
//! let blas = Blas::new(backend::reference::engine());
//!
//! let x_data = vec![1.0, 2.0, 3.0];
//! let y_data = vec![4.0, 5.0, 6.0];
//! let x = VectorBlock::from_slice(&x_data);
//! let y = VectorBlock::from_slice(&y_data);
//!
//! let dot = blas.dot(&x, &y).unwrap();
//! assert_eq!(dot.get::<f64>().unwrap(), 32.0);
//! ```
//!
//! # Validation
//!
//! Every call is checked in a fixed order before any write:
//! 1. scalar boxes agree with the operand kind ([`BlasError::ScalarKindMismatch`])
//! 2. operand shapes are compatible ([`BlasError::Shape`], [`BlasError::EmptyOperand`])
//! 3. outputs do not overlap other operands ([`BlasError::Aliasing`])
//! 4. a kernel is registered for the structure ([`BlasError::UnsupportedLayout`])
//!
//! # Conventions
//!
//! - complex `dot` conjugates its first operand: `Σ conj(x[i]) * y[i]`
//! - complex magnitude for `iamax`, `iamin` and `asum` is `|re| + |im|`
//! - `rank` is the unconjugated update `A += alpha * x * y^T`
//! - with `beta == 0` the output of `mv`/`mm`/`axpby` is overwritten without being read

pub mod backend;
mod block;
mod dispatch;
mod engine;
mod kernel;
mod layout;
mod scalar;
mod validate;

pub use block::{Footprint, MatrixBlock, MatrixBlockMut, MatrixDesc, VectorBlock, VectorBlockMut};
pub use dispatch::Blas;
pub use engine::{Engine, EngineBuilder, KernelSet, Kernels, Level1};
pub use kernel::{
    AsumFn, AxpbyFn, AxpyFn, CopyFn, DotFn, IamaxFn, Kernel, MmFn, MvFn, Nrm2Fn, Overlap, RankFn,
    RawMatrix, RawMatrixMut, RawVector, RawVectorMut, RotFn, RotgFn, RotmFn, RotmgFn, ScalFn,
    SumFn, SwapFn,
};
pub use layout::{Diag, Layout, PackedKind, Structure, StructureClass, Uplo};
pub use scalar::{BlasReal, BlasScalar, Scalar, ScalarKind};

use std::fmt;

/// Minimum `m * n * k` work for the reference Level 3 kernels to split rows
/// across the rayon pool (feature `parallel`).
pub const MIN_PARALLEL_WORK: usize = 1 << 15;

/// Number of slots in a modified-Givens parameter block: `[flag, h11, h21, h12, h22]`.
pub const ROTM_PARAM_LEN: usize = 5;

/// Number of slots in a `rotg` block: `[a, b, c, s]` in, `[r, z, c, s]` out.
pub const ROTG_LEN: usize = 4;

/// Number of slots in a `rotmg` argument block: `[d1, d2, x1, y1]`.
pub const ROTMG_ARGS_LEN: usize = 4;

/// Operations exposed by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Iamax,
    Iamin,
    Rotg,
    Rotmg,
    Rotm,
    Swap,
    Copy,
    Dot,
    Nrm2,
    Asum,
    Sum,
    Rot,
    Scal,
    Axpy,
    Axpby,
    Mv,
    Rank,
    Mm,
}

impl Operation {
    /// Lowercase BLAS-style name.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Iamax => "iamax",
            Operation::Iamin => "iamin",
            Operation::Rotg => "rotg",
            Operation::Rotmg => "rotmg",
            Operation::Rotm => "rotm",
            Operation::Swap => "swap",
            Operation::Copy => "copy",
            Operation::Dot => "dot",
            Operation::Nrm2 => "nrm2",
            Operation::Asum => "asum",
            Operation::Sum => "sum",
            Operation::Rot => "rot",
            Operation::Scal => "scal",
            Operation::Axpy => "axpy",
            Operation::Axpby => "axpby",
            Operation::Mv => "mv",
            Operation::Rank => "rank",
            Operation::Mm => "mm",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Error types
// ============================================================================

/// Errors raised by block construction and by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlasError {
    /// Operand dimensions are incompatible for the operation.
    #[error("{op}: incompatible shapes {left:?} and {right:?}")]
    Shape {
        op: Operation,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    /// A scalar box does not hold the kind the operands require.
    #[error("scalar kind mismatch: expected {expected}, found {found}")]
    ScalarKindMismatch {
        expected: ScalarKind,
        found: ScalarKind,
    },

    /// The engine has no kernel for this kind and structure combination.
    #[error("{op}: no kernel registered for {kind} with structure {classes:?}")]
    UnsupportedLayout {
        op: Operation,
        kind: ScalarKind,
        classes: Vec<StructureClass>,
    },

    /// An output block overlaps another operand in a way the kernel cannot handle.
    #[error("{op}: operand `{first}` overlaps operand `{second}`")]
    Aliasing {
        op: Operation,
        first: &'static str,
        second: &'static str,
    },

    /// The operation needs at least one element.
    #[error("{op}: operand `{operand}` is empty")]
    EmptyOperand {
        op: Operation,
        operand: &'static str,
    },

    /// Zero increment is not allowed for a vector block.
    #[error("invalid increment 0")]
    ZeroStride,

    /// Leading dimension smaller than the layout requires.
    #[error("leading dimension {ld} is smaller than the required {min}")]
    LeadingDimension { ld: usize, min: usize },

    /// Triangular, symmetric and packed blocks must be square.
    #[error("non-square matrix: rows={rows}, cols={cols}")]
    NonSquare { rows: usize, cols: usize },

    /// The block would reach past the end of its backing store.
    #[error("block needs {required} elements but the store holds {available}")]
    OutOfBounds { required: usize, available: usize },

    /// A raw block was created from a null pointer.
    #[error("null data pointer")]
    NullPointer,
}

/// Result type for block construction and dispatch.
pub type Result<T> = std::result::Result<T, BlasError>;
