//! Pure-Rust reference backend.
//!
//! Registers a kernel for every operation, scalar kind and structure the
//! dispatcher routes on (the rotation family for real kinds only). The
//! kernels are plain loops: they are the correctness baseline other engines
//! are tested against and the fallback for entries a native backend lacks.

pub mod level1;
pub mod level2;
pub mod level3;

use crate::engine::{Engine, EngineBuilder, Kernels};
use crate::kernel::{
    AsumFn, AxpbyFn, AxpyFn, CopyFn, DotFn, IamaxFn, Kernel, MmFn, MvFn, Nrm2Fn, RankFn, RotFn,
    RotgFn, RotmFn, RotmgFn, ScalFn, SumFn, SwapFn,
};
use crate::layout::StructureClass;
use crate::scalar::{BlasReal, BlasScalar};
use num_complex::{Complex32, Complex64};

/// Name of the reference engine.
pub const NAME: &str = "reference";

/// Build the reference engine.
pub fn engine() -> Engine {
    let mut builder = EngineBuilder::new(NAME);
    register::<f32>(builder.kernels_mut());
    register::<f64>(builder.kernels_mut());
    register::<Complex32>(builder.kernels_mut());
    register::<Complex64>(builder.kernels_mut());
    register_rotations::<f32>(builder.kernels_mut());
    register_rotations::<f64>(builder.kernels_mut());
    builder.build()
}

fn register<T: BlasScalar>(k: &mut Kernels<T>) {
    use StructureClass::{Banded, General, Packed, Symmetric, Triangular};

    let l1 = &mut k.level1;
    l1.iamax = Some(Kernel::new(level1::iamax::<T> as IamaxFn<T>));
    l1.iamin = Some(Kernel::new(level1::iamin::<T> as IamaxFn<T>));
    l1.swap = Some(Kernel::new(level1::swap::<T> as SwapFn<T>));
    l1.copy = Some(Kernel::in_place(level1::copy::<T> as CopyFn<T>));
    l1.dot = Some(Kernel::new(level1::dot::<T> as DotFn<T>));
    l1.nrm2 = Some(Kernel::new(level1::nrm2::<T> as Nrm2Fn<T>));
    l1.asum = Some(Kernel::new(level1::asum::<T> as AsumFn<T>));
    l1.sum = Some(Kernel::new(level1::sum::<T> as SumFn<T>));
    l1.rot = Some(Kernel::new(level1::rot::<T> as RotFn<T>));
    l1.scal = Some(Kernel::new(level1::scal::<T> as ScalFn<T>));
    l1.axpy = Some(Kernel::in_place(level1::axpy::<T> as AxpyFn<T>));
    l1.axpby = Some(Kernel::in_place(level1::axpby::<T> as AxpbyFn<T>));

    k.mv[General.index()] = Some(Kernel::new(level2::gemv::<T> as MvFn<T>));
    k.mv[Triangular.index()] = Some(Kernel::new(level2::trmv::<T> as MvFn<T>));
    k.mv[Symmetric.index()] = Some(Kernel::new(level2::symv::<T> as MvFn<T>));
    k.mv[Banded.index()] = Some(Kernel::new(level2::gbmv::<T> as MvFn<T>));
    k.mv[Packed.index()] = Some(Kernel::new(level2::pmv::<T> as MvFn<T>));

    k.rank[General.index()] = Some(Kernel::new(level2::ger::<T> as RankFn<T>));

    let mm = &mut k.mm;
    mm[General.index()][General.index()] = Some(Kernel::new(level3::gemm::<T> as MmFn<T>));
    mm[Triangular.index()][General.index()] =
        Some(Kernel::new(level3::trmm_left::<T> as MmFn<T>));
    mm[General.index()][Triangular.index()] =
        Some(Kernel::new(level3::trmm_right::<T> as MmFn<T>));
    mm[Symmetric.index()][General.index()] =
        Some(Kernel::new(level3::symm_left::<T> as MmFn<T>));
    mm[General.index()][Symmetric.index()] =
        Some(Kernel::new(level3::symm_right::<T> as MmFn<T>));
}

fn register_rotations<T: BlasReal>(k: &mut Kernels<T>) {
    k.level1.rotg = Some(Kernel::new(level1::rotg::<T> as RotgFn<T>));
    k.level1.rotmg = Some(Kernel::new(level1::rotmg::<T> as RotmgFn<T>));
    k.level1.rotm = Some(Kernel::new(level1::rotm::<T> as RotmFn<T>));
}
