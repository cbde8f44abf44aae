use num_complex::Complex32;
use strided_blas::{
    backend, Blas, BlasError, Diag, Engine, Layout, MatrixBlock, MatrixBlockMut, MatrixDesc,
    Operation, PackedKind, ScalarKind, StructureClass, Uplo, VectorBlock, VectorBlockMut,
};

fn blas() -> Blas {
    Blas::new(backend::active())
}

#[test]
fn test_partially_overlapping_vectors_are_rejected() {
    let mut data: Vec<f64> = (0..8).map(f64::from).collect();
    let before = data.clone();
    let ptr = data.as_mut_ptr();
    // x = data[0..4], y = data[2..6]
    let x = unsafe { VectorBlock::from_raw_parts(ptr, 8, 4, 0, 1) }.unwrap();
    let mut y = unsafe { VectorBlockMut::from_raw_parts(ptr, 8, 4, 2, 1) }.unwrap();

    let err = blas().axpy(1.0, &x, &mut y).unwrap_err();
    assert_eq!(
        err,
        BlasError::Aliasing {
            op: Operation::Axpy,
            first: "y",
            second: "x",
        }
    );
    let err = blas().copy(&x, &mut y).unwrap_err();
    assert!(matches!(err, BlasError::Aliasing { op: Operation::Copy, .. }));
    assert_eq!(data, before);
}

#[test]
fn test_interleaved_vectors_pass() {
    let mut data = vec![1.0f64, 10.0, 2.0, 20.0, 3.0, 30.0];
    let ptr = data.as_mut_ptr();
    // x = even slots, y = odd slots of the same buffer
    let x = unsafe { VectorBlock::from_raw_parts(ptr, 6, 3, 0, 2) }.unwrap();
    let mut y = unsafe { VectorBlockMut::from_raw_parts(ptr, 6, 3, 1, 2) }.unwrap();
    assert!(x.footprint().is_disjoint(&y.footprint()));
    blas().axpy(1.0, &x, &mut y).unwrap();
    assert_eq!(data, [1.0, 11.0, 2.0, 22.0, 3.0, 33.0]);
}

#[test]
fn test_identical_footprint_follows_kernel_overlap() {
    let blas = blas();
    let mut data = vec![1.0f64, 2.0, 3.0];
    let ptr = data.as_mut_ptr();
    let x = unsafe { VectorBlock::from_raw_parts(ptr, 3, 3, 0, 1) }.unwrap();
    let mut y = unsafe { VectorBlockMut::from_raw_parts(ptr, 3, 3, 0, 1) }.unwrap();

    // axpy supports the exact in-place form: y = 1 * y + y
    blas.axpy(1.0, &x, &mut y).unwrap();
    blas.copy(&x, &mut y).unwrap();
    assert_eq!(y.to_vec(), vec![2.0, 4.0, 6.0]);

    let mut other = unsafe { VectorBlockMut::from_raw_parts(ptr, 3, 3, 0, 1) }.unwrap();
    let err = blas.swap(&mut y, &mut other).unwrap_err();
    assert_eq!(
        err,
        BlasError::Aliasing {
            op: Operation::Swap,
            first: "x",
            second: "y",
        }
    );

    // same range walked backwards is not the identical form
    let rev = unsafe { VectorBlock::from_raw_parts(ptr, 3, 3, 0, -1) }.unwrap();
    let err = blas.axpy(1.0, &rev, &mut y).unwrap_err();
    assert!(matches!(err, BlasError::Aliasing { op: Operation::Axpy, .. }));
    drop((x, y, other, rev));
    assert_eq!(data, [2.0, 4.0, 6.0]);
}

#[test]
fn test_overlapping_matrix_output_is_rejected() {
    let mut data = vec![1.0f64; 8];
    let before = data.clone();
    let ptr = data.as_mut_ptr();
    let a = unsafe {
        MatrixBlock::from_raw_parts(ptr, 8, MatrixDesc::general(2, 2, Layout::RowMajor))
    }
    .unwrap();
    let b = unsafe {
        MatrixBlock::from_raw_parts(ptr, 8, MatrixDesc::general(2, 2, Layout::RowMajor).with_offset(4))
    }
    .unwrap();
    let mut c = unsafe {
        MatrixBlockMut::from_raw_parts(ptr, 8, MatrixDesc::general(2, 2, Layout::ColMajor).with_offset(2))
    }
    .unwrap();
    let err = blas().mm(1.0, &a, &b, 0.0, &mut c).unwrap_err();
    assert_eq!(
        err,
        BlasError::Aliasing {
            op: Operation::Mm,
            first: "c",
            second: "a",
        }
    );
    drop((a, b, c));
    assert_eq!(data, before);
}

#[test]
fn test_mv_output_overlapping_x_is_rejected() {
    let a = [1.0f64; 4];
    let a = MatrixBlock::new(&a, MatrixDesc::general(2, 2, Layout::RowMajor)).unwrap();
    let mut data = vec![1.0f64, 2.0, 3.0];
    let ptr = data.as_mut_ptr();
    let x = unsafe { VectorBlock::from_raw_parts(ptr, 3, 2, 0, 1) }.unwrap();
    let mut y = unsafe { VectorBlockMut::from_raw_parts(ptr, 3, 2, 1, 1) }.unwrap();
    let err = blas().mv(1.0, &a, &x, 0.0, &mut y).unwrap_err();
    assert_eq!(
        err,
        BlasError::Aliasing {
            op: Operation::Mv,
            first: "y",
            second: "x",
        }
    );
    drop((x, y));
    assert_eq!(data, [1.0, 2.0, 3.0]);
}

#[test]
fn test_validation_order() {
    let empty = Blas::new(Engine::builder("empty").build());
    let x = [1.0f64, 2.0];
    let mut y = [0.0f64; 3];

    // 1. scalar kind before shape
    let err = empty
        .axpy(
            Complex32::new(1.0, 0.0),
            &VectorBlock::from_slice(&x),
            &mut VectorBlockMut::from_slice(&mut y),
        )
        .unwrap_err();
    assert_eq!(
        err,
        BlasError::ScalarKindMismatch {
            expected: ScalarKind::Real64,
            found: ScalarKind::Complex32,
        }
    );

    // 2. shape before kernel lookup
    let err = empty
        .axpy(
            1.0,
            &VectorBlock::from_slice(&x),
            &mut VectorBlockMut::from_slice(&mut y),
        )
        .unwrap_err();
    assert!(matches!(err, BlasError::Shape { op: Operation::Axpy, .. }));

    // 3. aliasing before kernel lookup
    let mut data = vec![0.0f64; 4];
    let ptr = data.as_mut_ptr();
    let xa = unsafe { VectorBlock::from_raw_parts(ptr, 4, 3, 0, 1) }.unwrap();
    let mut ya = unsafe { VectorBlockMut::from_raw_parts(ptr, 4, 3, 1, 1) }.unwrap();
    let err = empty.axpy(1.0, &xa, &mut ya).unwrap_err();
    assert!(matches!(err, BlasError::Aliasing { .. }));

    // 4. kernel lookup last
    let mut y2 = [0.0f64; 2];
    let err = empty
        .axpy(
            1.0,
            &VectorBlock::from_slice(&x),
            &mut VectorBlockMut::from_slice(&mut y2),
        )
        .unwrap_err();
    assert_eq!(
        err,
        BlasError::UnsupportedLayout {
            op: Operation::Axpy,
            kind: ScalarKind::Real64,
            classes: vec![],
        }
    );
}

#[test]
fn test_mm_scalar_kinds_checked_for_alpha_and_beta() {
    let blas = blas();
    let a = [1.0f32; 4];
    let a = MatrixBlock::new(&a, MatrixDesc::general(2, 2, Layout::RowMajor)).unwrap();
    let mut c = [9.0f32; 4];
    let mut cv = MatrixBlockMut::new(&mut c, MatrixDesc::general(2, 2, Layout::RowMajor)).unwrap();
    let err = blas.mm(1.0f32, &a, &a, 0.0f64, &mut cv).unwrap_err();
    assert_eq!(
        err,
        BlasError::ScalarKindMismatch {
            expected: ScalarKind::Real32,
            found: ScalarKind::Real64,
        }
    );
    assert_eq!(c, [9.0f32; 4]);
}

#[test]
fn test_unsupported_layout_reports_kind() {
    let blas = blas();
    let mut p = [Complex32::new(0.0, 0.0); 5];
    let mut args = [Complex32::new(1.0, 0.0); 4];
    let err = blas
        .rotmg(
            &mut VectorBlockMut::from_slice(&mut p),
            &mut VectorBlockMut::from_slice(&mut args),
        )
        .unwrap_err();
    assert_eq!(
        err,
        BlasError::UnsupportedLayout {
            op: Operation::Rotmg,
            kind: ScalarKind::Complex32,
            classes: vec![],
        }
    );
    assert_eq!(
        err.to_string(),
        "rotmg: no kernel registered for complex32 with structure []"
    );
}

#[test]
fn test_vector_construction_errors() {
    let data = [0.0f64; 4];
    assert_eq!(
        VectorBlock::new(&data, 2, 0, 0).unwrap_err(),
        BlasError::ZeroStride
    );
    assert_eq!(
        VectorBlock::new(&data, 3, 0, 2).unwrap_err(),
        BlasError::OutOfBounds {
            required: 5,
            available: 4,
        }
    );
    assert_eq!(
        VectorBlock::new(&data, 2, 1, -3).unwrap_err(),
        BlasError::OutOfBounds {
            required: 5,
            available: 4,
        }
    );
    assert!(VectorBlock::new(&data, 0, 4, 1).is_ok());
    assert!(VectorBlock::new(&data, 0, 5, 1).is_err());

    // span or offset past usize::MAX
    assert_eq!(
        VectorBlock::new(&data[..2], 1, usize::MAX, 1).unwrap_err(),
        BlasError::OutOfBounds {
            required: usize::MAX,
            available: 2,
        }
    );
    assert!(VectorBlock::new(&data, 0, usize::MAX, 1).is_err());
    assert!(VectorBlock::new(&data, 3, usize::MAX - 1, 1).is_err());
    assert!(VectorBlock::new(&data, usize::MAX, 0, -1).is_err());

    let null = unsafe { VectorBlock::<f64>::from_raw_parts(std::ptr::null(), 4, 1, 0, 1) };
    assert_eq!(null.unwrap_err(), BlasError::NullPointer);
}

#[test]
fn test_matrix_construction_errors() {
    let data = [0.0f64; 12];
    assert_eq!(
        MatrixBlock::new(&data, MatrixDesc::general(3, 4, Layout::RowMajor).with_ld(3))
            .unwrap_err(),
        BlasError::LeadingDimension { ld: 3, min: 4 }
    );
    assert_eq!(
        MatrixBlock::new(&data, MatrixDesc::general(4, 3, Layout::ColMajor).with_offset(1))
            .unwrap_err(),
        BlasError::OutOfBounds {
            required: 13,
            available: 12,
        }
    );
    let desc = MatrixDesc::triangular(3, Layout::RowMajor, Uplo::Upper, Diag::Unit).transposed();
    assert_eq!(desc.layout(), Layout::ColMajor);
    assert!(MatrixBlock::new(&data, desc).is_ok());
    assert_eq!(
        MatrixBlock::new(&data, MatrixDesc::banded(4, 4, 1, 1, Layout::ColMajor).with_ld(2))
            .unwrap_err(),
        BlasError::LeadingDimension { ld: 2, min: 3 }
    );
    assert_eq!(
        MatrixBlock::new(&data[..5], MatrixDesc::packed(3, Layout::ColMajor, Uplo::Lower, PackedKind::Symmetric))
            .unwrap_err(),
        BlasError::OutOfBounds {
            required: 6,
            available: 5,
        }
    );
    assert_eq!(StructureClass::ALL.len(), StructureClass::COUNT);
}

#[test]
fn test_matrix_extent_overflow_is_out_of_bounds() {
    let data = [1.0f64, 2.0];
    let out_of_bounds = BlasError::OutOfBounds {
        required: usize::MAX,
        available: 2,
    };

    // (rows - 1) * ld wraps to 0 without checked arithmetic
    let huge_ld = MatrixDesc::general(3, 2, Layout::RowMajor).with_ld(usize::MAX / 2 + 1);
    assert_eq!(MatrixBlock::new(&data, huge_ld).unwrap_err(), out_of_bounds);
    let huge_ld = MatrixDesc::general(2, 3, Layout::ColMajor).with_ld(usize::MAX);
    assert_eq!(MatrixBlock::new(&data, huge_ld).unwrap_err(), out_of_bounds);

    let huge_offset = MatrixDesc::general(1, 1, Layout::RowMajor).with_offset(usize::MAX);
    assert_eq!(MatrixBlock::new(&data, huge_offset).unwrap_err(), out_of_bounds);
    let empty = MatrixDesc::general(0, 1, Layout::RowMajor).with_offset(usize::MAX);
    assert!(MatrixBlock::new(&data, empty).is_err());

    let wide_band = MatrixDesc::banded(1, 1, usize::MAX, 1, Layout::ColMajor);
    assert_eq!(wide_band.ld(), usize::MAX);
    assert_eq!(MatrixBlock::new(&data, wide_band).unwrap_err(), out_of_bounds);
    let wide_band = MatrixDesc::banded(3, 3, usize::MAX / 2, usize::MAX / 2, Layout::RowMajor);
    assert_eq!(MatrixBlock::new(&data, wide_band).unwrap_err(), out_of_bounds);

    let huge_packed =
        MatrixDesc::packed(usize::MAX, Layout::ColMajor, Uplo::Upper, PackedKind::Triangular(Diag::Unit));
    assert_eq!(huge_packed.required_len(), usize::MAX);
    assert_eq!(MatrixBlock::new(&data, huge_packed).unwrap_err(), out_of_bounds);

    let mut store = [0.0f64; 2];
    let huge_ld = MatrixDesc::general(3, 2, Layout::RowMajor).with_ld(usize::MAX / 2 + 1);
    assert_eq!(MatrixBlockMut::new(&mut store, huge_ld).unwrap_err(), out_of_bounds);
}
