//! Engine: immutable kernel registry.
//!
//! An [`Engine`] maps (scalar kind, structure class) to kernels through fixed
//! arrays, so lookup is a couple of loads. Backends fill an [`EngineBuilder`]
//! and freeze it with [`EngineBuilder::build`].

use crate::kernel::{
    AsumFn, AxpbyFn, AxpyFn, CopyFn, DotFn, IamaxFn, Kernel, MmFn, MvFn, Nrm2Fn, RankFn, RotFn,
    RotgFn, RotmFn, RotmgFn, ScalFn, SumFn, SwapFn,
};
use crate::layout::StructureClass;
use crate::scalar::BlasScalar;
use num_complex::{Complex32, Complex64};
use std::fmt;

const N: usize = StructureClass::COUNT;

/// Level 1 kernels of one scalar kind. Vectors carry no structure, so each
/// operation has a single slot.
#[derive(Debug, Clone, Copy)]
pub struct Level1<T: BlasScalar> {
    pub iamax: Option<Kernel<IamaxFn<T>>>,
    pub iamin: Option<Kernel<IamaxFn<T>>>,
    pub rotg: Option<Kernel<RotgFn<T>>>,
    pub rotmg: Option<Kernel<RotmgFn<T>>>,
    pub rotm: Option<Kernel<RotmFn<T>>>,
    pub swap: Option<Kernel<SwapFn<T>>>,
    pub copy: Option<Kernel<CopyFn<T>>>,
    pub dot: Option<Kernel<DotFn<T>>>,
    pub nrm2: Option<Kernel<Nrm2Fn<T>>>,
    pub asum: Option<Kernel<AsumFn<T>>>,
    pub sum: Option<Kernel<SumFn<T>>>,
    pub rot: Option<Kernel<RotFn<T>>>,
    pub scal: Option<Kernel<ScalFn<T>>>,
    pub axpy: Option<Kernel<AxpyFn<T>>>,
    pub axpby: Option<Kernel<AxpbyFn<T>>>,
}

impl<T: BlasScalar> Default for Level1<T> {
    fn default() -> Self {
        Self {
            iamax: None,
            iamin: None,
            rotg: None,
            rotmg: None,
            rotm: None,
            swap: None,
            copy: None,
            dot: None,
            nrm2: None,
            asum: None,
            sum: None,
            rot: None,
            scal: None,
            axpy: None,
            axpby: None,
        }
    }
}

impl<T: BlasScalar> Level1<T> {
    fn count(&self) -> usize {
        [
            self.iamax.is_some(),
            self.iamin.is_some(),
            self.rotg.is_some(),
            self.rotmg.is_some(),
            self.rotm.is_some(),
            self.swap.is_some(),
            self.copy.is_some(),
            self.dot.is_some(),
            self.nrm2.is_some(),
            self.asum.is_some(),
            self.sum.is_some(),
            self.rot.is_some(),
            self.scal.is_some(),
            self.axpy.is_some(),
            self.axpby.is_some(),
        ]
        .iter()
        .filter(|&&b| b)
        .count()
    }
}

/// All kernels of one scalar kind.
///
/// `mv` and `rank` are indexed by the matrix operand's [`StructureClass`];
/// `mm` by the `(a, b)` pair.
#[derive(Debug, Clone)]
pub struct Kernels<T: BlasScalar> {
    pub level1: Level1<T>,
    pub mv: [Option<Kernel<MvFn<T>>>; N],
    pub rank: [Option<Kernel<RankFn<T>>>; N],
    pub mm: [[Option<Kernel<MmFn<T>>>; N]; N],
}

impl<T: BlasScalar> Default for Kernels<T> {
    fn default() -> Self {
        Self {
            level1: Level1::default(),
            mv: [None; N],
            rank: [None; N],
            mm: [[None; N]; N],
        }
    }
}

impl<T: BlasScalar> Kernels<T> {
    #[inline]
    pub fn mv(&self, a: StructureClass) -> Option<Kernel<MvFn<T>>> {
        self.mv[a.index()]
    }

    #[inline]
    pub fn rank(&self, a: StructureClass) -> Option<Kernel<RankFn<T>>> {
        self.rank[a.index()]
    }

    #[inline]
    pub fn mm(&self, a: StructureClass, b: StructureClass) -> Option<Kernel<MmFn<T>>> {
        self.mm[a.index()][b.index()]
    }

    /// Number of registered kernels.
    pub fn count(&self) -> usize {
        self.level1.count()
            + self.mv.iter().flatten().count()
            + self.rank.iter().flatten().count()
            + self.mm.iter().flatten().flatten().count()
    }
}

/// Kernel tables for every scalar kind.
#[derive(Debug, Default, Clone)]
pub struct KernelSet {
    pub(crate) real32: Kernels<f32>,
    pub(crate) real64: Kernels<f64>,
    pub(crate) complex32: Kernels<Complex32>,
    pub(crate) complex64: Kernels<Complex64>,
}

impl KernelSet {
    /// Table for `T`.
    #[inline]
    pub fn get<T: BlasScalar>(&self) -> &Kernels<T> {
        T::kernels(self)
    }

    /// Mutable table for `T`.
    #[inline]
    pub fn get_mut<T: BlasScalar>(&mut self) -> &mut Kernels<T> {
        T::kernels_mut(self)
    }

    fn count(&self) -> usize {
        self.real32.count() + self.real64.count() + self.complex32.count() + self.complex64.count()
    }
}

/// Named, immutable set of kernels.
///
/// `Engine` is `Send + Sync` and meant to be built once and shared (usually
/// through an `Arc`).
pub struct Engine {
    name: String,
    kernels: KernelSet,
}

impl Engine {
    /// Start an empty builder.
    pub fn builder(name: impl Into<String>) -> EngineBuilder {
        EngineBuilder::new(name)
    }

    /// Engine name, e.g. `"reference"` or `"cblas"`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kernel table for `T`.
    #[inline]
    pub fn kernels<T: BlasScalar>(&self) -> &Kernels<T> {
        self.kernels.get::<T>()
    }

    /// Number of registered kernels across all kinds.
    pub fn kernel_count(&self) -> usize {
        self.kernels.count()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("kernels", &self.kernel_count())
            .finish()
    }
}

/// Mutable registry used by backends before freezing into an [`Engine`].
///
/// ```rust
/// use strided_blas::{backend::reference, Engine, StructureClass};
///
/// // An engine with only the general matrix-vector product for f64.
/// let full = reference::engine();
/// let gemv = full.kernels::<f64>().mv(StructureClass::General).unwrap();
/// let engine = Engine::builder("gemv-only")
///     .with::<f64>(|k| k.mv[StructureClass::General.index()] = Some(gemv))
///     .build();
/// assert_eq!(engine.kernel_count(), 1);
/// ```
pub struct EngineBuilder {
    name: String,
    kernels: KernelSet,
}

impl EngineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kernels: KernelSet::default(),
        }
    }

    /// Start from the registrations of an existing engine.
    pub fn from_engine(name: impl Into<String>, base: &Engine) -> Self {
        Self {
            name: name.into(),
            kernels: base.kernels.clone(),
        }
    }

    /// Mutable table for `T`.
    pub fn kernels_mut<T: BlasScalar>(&mut self) -> &mut Kernels<T> {
        self.kernels.get_mut::<T>()
    }

    /// Apply `f` to the table for `T`.
    pub fn with<T: BlasScalar>(mut self, f: impl FnOnce(&mut Kernels<T>)) -> Self {
        f(self.kernels_mut::<T>());
        self
    }

    /// Freeze the registrations.
    pub fn build(self) -> Engine {
        let engine = Engine {
            name: self.name,
            kernels: self.kernels,
        };
        tracing::debug!(
            engine = engine.name(),
            kernels = engine.kernel_count(),
            "built engine"
        );
        engine
    }
}
