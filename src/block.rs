//! Vector and matrix blocks: typed views over caller-owned memory.
//!
//! Blocks never allocate. A block records a pointer to its backing store, the
//! store length, and the layout metadata needed to address its elements.
//! Safe constructors borrow a slice; `from_raw_parts` constructors accept
//! foreign memory (pinned or accelerator-visible buffers) and deliberately
//! overlapping views, which the dispatcher's aliasing check then guards.

use crate::kernel::{RawMatrix, RawMatrixMut, RawVector, RawVectorMut};
use crate::layout::{Diag, Layout, PackedKind, Structure, Uplo};
use crate::scalar::BlasScalar;
use crate::{BlasError, Result};
use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr::NonNull;

// ============================================================================
// Footprint
// ============================================================================

/// The set of addresses a block touches.
///
/// `start..end` is the byte range covered. `stride` is the signed byte step
/// between consecutive logical elements for vectors and `0` for matrices,
/// whose element sets are compared by range only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub start: usize,
    pub end: usize,
    pub stride: isize,
    pub count: usize,
    pub elem_size: usize,
}

impl Footprint {
    /// Footprint that touches nothing.
    pub fn empty(elem_size: usize) -> Self {
        Self {
            start: 0,
            end: 0,
            stride: 0,
            count: 0,
            elem_size,
        }
    }

    /// Returns true if the two blocks cannot share a byte.
    ///
    /// Two vectors with the same step whose elements interleave (for example
    /// the even and odd elements of one buffer) are disjoint even though their
    /// ranges intersect.
    pub fn is_disjoint(&self, other: &Footprint) -> bool {
        if self.count == 0 || other.count == 0 {
            return true;
        }
        if self.end <= other.start || other.end <= self.start {
            return true;
        }
        let step = self.stride.unsigned_abs();
        if self.stride != 0
            && self.stride.unsigned_abs() == other.stride.unsigned_abs()
            && self.elem_size == other.elem_size
            && step > self.elem_size
        {
            let diff = self.start.abs_diff(other.start);
            let r = diff % step;
            return r >= self.elem_size && step - r >= self.elem_size;
        }
        false
    }

    /// Returns true if both blocks visit the same elements in the same order.
    pub fn is_identical(&self, other: &Footprint) -> bool {
        self.stride != 0
            && self.count > 0
            && self.start == other.start
            && self.stride == other.stride
            && self.count == other.count
    }
}

fn vector_footprint<T>(base: *const T, offset: usize, len: usize, inc: isize) -> Footprint {
    let elem = size_of::<T>();
    if len == 0 {
        return Footprint::empty(elem);
    }
    let span = (len - 1) * inc.unsigned_abs();
    let start = base as usize + offset * elem;
    Footprint {
        start,
        end: start + (span + 1) * elem,
        stride: inc * elem as isize,
        count: len,
        elem_size: elem,
    }
}

fn check_vector(store_len: usize, len: usize, offset: usize, inc: isize) -> Result<()> {
    if inc == 0 {
        return Err(BlasError::ZeroStride);
    }
    let required = if len == 0 {
        offset
    } else {
        (len - 1)
            .checked_mul(inc.unsigned_abs())
            .and_then(|span| span.checked_add(offset))
            .and_then(|last| last.checked_add(1))
            .unwrap_or(usize::MAX)
    };
    if required > store_len {
        return Err(BlasError::OutOfBounds {
            required,
            available: store_len,
        });
    }
    Ok(())
}

// ============================================================================
// Vector blocks
// ============================================================================

/// Read-only strided vector.
///
/// Element `i` lives at `offset + i * inc` when `inc > 0`. With a negative
/// increment element 0 is the highest address, `offset + (len - 1 - i) * |inc|`,
/// as in BLAS.
#[derive(Debug, Clone, Copy)]
pub struct VectorBlock<'a, T> {
    ptr: NonNull<T>,
    store_len: usize,
    len: usize,
    offset: usize,
    inc: isize,
    _marker: PhantomData<&'a [T]>,
}

/// Mutable strided vector. Same addressing as [`VectorBlock`].
#[derive(Debug)]
pub struct VectorBlockMut<'a, T> {
    ptr: NonNull<T>,
    store_len: usize,
    len: usize,
    offset: usize,
    inc: isize,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Sync> Send for VectorBlock<'_, T> {}
unsafe impl<T: Sync> Sync for VectorBlock<'_, T> {}
unsafe impl<T: Send> Send for VectorBlockMut<'_, T> {}
unsafe impl<T: Sync> Sync for VectorBlockMut<'_, T> {}

impl<'a, T: BlasScalar> VectorBlock<'a, T> {
    /// Create a strided vector over `data`.
    ///
    /// # Errors
    /// [`BlasError::ZeroStride`] if `inc == 0`, [`BlasError::OutOfBounds`] if
    /// the last element would fall outside `data`.
    pub fn new(data: &'a [T], len: usize, offset: usize, inc: isize) -> Result<Self> {
        check_vector(data.len(), len, offset, inc)?;
        Ok(Self {
            ptr: NonNull::from(data).cast(),
            store_len: data.len(),
            len,
            offset,
            inc,
            _marker: PhantomData,
        })
    }

    /// Contiguous vector over the whole slice.
    pub fn from_slice(data: &'a [T]) -> Self {
        Self {
            ptr: NonNull::from(data).cast(),
            store_len: data.len(),
            len: data.len(),
            offset: 0,
            inc: 1,
            _marker: PhantomData,
        }
    }

    /// Create a vector over foreign memory.
    ///
    /// # Safety
    /// `ptr` must be valid for reads of `store_len` elements for `'a`, and no
    /// other code may write the addressed elements while the block is alive.
    pub unsafe fn from_raw_parts(
        ptr: *const T,
        store_len: usize,
        len: usize,
        offset: usize,
        inc: isize,
    ) -> Result<Self> {
        let ptr = NonNull::new(ptr as *mut T).ok_or(BlasError::NullPointer)?;
        check_vector(store_len, len, offset, inc)?;
        Ok(Self {
            ptr,
            store_len,
            len,
            offset,
            inc,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn inc(&self) -> isize {
        self.inc
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the backing store in elements.
    #[inline]
    pub fn store_len(&self) -> usize {
        self.store_len
    }

    /// Element `i`.
    ///
    /// # Panics
    /// If `i >= len`.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        assert!(i < self.len, "index {i} out of range for length {}", self.len);
        // SAFETY: construction checked that every logical element is in the store.
        unsafe { self.raw().get(i) }
    }

    /// Copy the logical elements into a new vector.
    pub fn to_vec(&self) -> Vec<T> {
        (0..self.len).map(|i| self.get(i)).collect()
    }

    /// Raw form for kernels; `ptr` addresses logical element 0.
    #[inline]
    pub fn raw(&self) -> RawVector<T> {
        RawVector {
            ptr: first_element(self.ptr.as_ptr(), self.offset, self.len, self.inc),
            len: self.len,
            inc: self.inc,
        }
    }

    /// Addresses this block touches.
    pub fn footprint(&self) -> Footprint {
        vector_footprint(self.ptr.as_ptr(), self.offset, self.len, self.inc)
    }
}

impl<'a, T: BlasScalar> VectorBlockMut<'a, T> {
    /// Create a mutable strided vector over `data`.
    ///
    /// # Errors
    /// Same conditions as [`VectorBlock::new`].
    pub fn new(data: &'a mut [T], len: usize, offset: usize, inc: isize) -> Result<Self> {
        check_vector(data.len(), len, offset, inc)?;
        let store_len = data.len();
        Ok(Self {
            ptr: NonNull::from(data).cast(),
            store_len,
            len,
            offset,
            inc,
            _marker: PhantomData,
        })
    }

    /// Contiguous vector over the whole slice.
    pub fn from_slice(data: &'a mut [T]) -> Self {
        let len = data.len();
        Self {
            ptr: NonNull::from(data).cast(),
            store_len: len,
            len,
            offset: 0,
            inc: 1,
            _marker: PhantomData,
        }
    }

    /// Create a mutable vector over foreign memory.
    ///
    /// Two mutable blocks may be built over overlapping regions this way; the
    /// dispatcher rejects calls where they would conflict.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `store_len` elements for
    /// `'a`, and only blocks built from the same region may access it while
    /// this block is alive.
    pub unsafe fn from_raw_parts(
        ptr: *mut T,
        store_len: usize,
        len: usize,
        offset: usize,
        inc: isize,
    ) -> Result<Self> {
        let ptr = NonNull::new(ptr).ok_or(BlasError::NullPointer)?;
        check_vector(store_len, len, offset, inc)?;
        Ok(Self {
            ptr,
            store_len,
            len,
            offset,
            inc,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn inc(&self) -> isize {
        self.inc
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Element `i`.
    ///
    /// # Panics
    /// If `i >= len`.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.as_view().get(i)
    }

    /// Overwrite element `i`.
    ///
    /// # Panics
    /// If `i >= len`.
    #[inline]
    pub fn set(&mut self, i: usize, value: T) {
        assert!(i < self.len, "index {i} out of range for length {}", self.len);
        // SAFETY: construction checked bounds; `&mut self` gives exclusive access.
        unsafe { self.raw_mut().set(i, value) }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.as_view().to_vec()
    }

    /// Read-only view of the same elements.
    #[inline]
    pub fn as_view(&self) -> VectorBlock<'_, T> {
        VectorBlock {
            ptr: self.ptr,
            store_len: self.store_len,
            len: self.len,
            offset: self.offset,
            inc: self.inc,
            _marker: PhantomData,
        }
    }

    /// Raw read form for kernels.
    #[inline]
    pub fn raw(&self) -> RawVector<T> {
        self.as_view().raw()
    }

    /// Raw write form for kernels.
    #[inline]
    pub fn raw_mut(&mut self) -> RawVectorMut<T> {
        RawVectorMut {
            ptr: first_element(self.ptr.as_ptr(), self.offset, self.len, self.inc),
            len: self.len,
            inc: self.inc,
        }
    }

    pub fn footprint(&self) -> Footprint {
        vector_footprint(self.ptr.as_ptr(), self.offset, self.len, self.inc)
    }
}

#[inline]
fn first_element<T>(base: *mut T, offset: usize, len: usize, inc: isize) -> *mut T {
    let lead = if inc < 0 && len > 0 {
        (len - 1) * inc.unsigned_abs()
    } else {
        0
    };
    // wrapping_add: an empty block may sit one past the end of its store.
    base.wrapping_add(offset + lead)
}

// ============================================================================
// Matrix descriptor
// ============================================================================

/// Shape, storage and structure of a matrix block.
///
/// ```rust
/// use strided_blas::{Layout, MatrixDesc, Structure, Uplo};
///
/// let desc = MatrixDesc::symmetric(3, Layout::ColMajor, Uplo::Lower).with_ld(4);
/// assert_eq!(desc.ld(), 4);
/// assert_eq!(desc.structure(), Structure::Symmetric { uplo: Uplo::Lower });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixDesc {
    rows: usize,
    cols: usize,
    ld: usize,
    offset: usize,
    layout: Layout,
    structure: Structure,
}

impl MatrixDesc {
    /// Dense `rows x cols` matrix with the tightest leading dimension.
    pub fn general(rows: usize, cols: usize, layout: Layout) -> Self {
        Self {
            rows,
            cols,
            ld: layout.min_ld(rows, cols),
            offset: 0,
            layout,
            structure: Structure::General,
        }
    }

    /// `n x n` triangular matrix in full storage.
    pub fn triangular(n: usize, layout: Layout, uplo: Uplo, diag: Diag) -> Self {
        Self {
            structure: Structure::Triangular { uplo, diag },
            ..Self::general(n, n, layout)
        }
    }

    /// `n x n` symmetric matrix in full storage; only the `uplo` triangle is read.
    pub fn symmetric(n: usize, layout: Layout, uplo: Uplo) -> Self {
        Self {
            structure: Structure::Symmetric { uplo },
            ..Self::general(n, n, layout)
        }
    }

    /// `rows x cols` band matrix with `kl` sub- and `ku` super-diagonals.
    pub fn banded(rows: usize, cols: usize, kl: usize, ku: usize, layout: Layout) -> Self {
        Self {
            rows,
            cols,
            ld: kl.saturating_add(ku).saturating_add(1),
            offset: 0,
            layout,
            structure: Structure::Banded { kl, ku },
        }
    }

    /// `n x n` packed triangle of `n(n+1)/2` elements.
    pub fn packed(n: usize, layout: Layout, uplo: Uplo, kind: PackedKind) -> Self {
        Self {
            rows: n,
            cols: n,
            ld: n.max(1),
            offset: 0,
            layout,
            structure: Structure::Packed { uplo, kind },
        }
    }

    /// Replace the leading dimension.
    pub fn with_ld(mut self, ld: usize) -> Self {
        self.ld = ld;
        self
    }

    /// Replace the element offset of `(0, 0)`'s storage.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn ld(&self) -> usize {
        self.ld
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn structure(&self) -> Structure {
        self.structure
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Descriptor of the transposed view over the same storage.
    pub fn transposed(self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
            ld: self.ld,
            offset: self.offset,
            layout: self.layout.transposed(),
            structure: self.structure.transposed(),
        }
    }

    /// Smallest leading dimension the storage scheme accepts.
    pub fn min_ld(&self) -> usize {
        match self.structure {
            Structure::Banded { kl, ku } => kl.saturating_add(ku).saturating_add(1),
            Structure::Packed { .. } => 0,
            _ => self.layout.min_ld(self.rows, self.cols),
        }
    }

    /// Index (relative to `offset`) of the last storage element; `None` when
    /// empty. Saturates at `usize::MAX` when the index does not fit.
    fn last_index(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let last = match self.structure {
            Structure::Banded { kl, ku } => {
                let major = match self.layout {
                    Layout::ColMajor => self.cols,
                    Layout::RowMajor => self.rows,
                };
                (major - 1)
                    .checked_mul(self.ld)
                    .and_then(|base| base.checked_add(kl))
                    .and_then(|base| base.checked_add(ku))
            }
            Structure::Packed { .. } => self
                .rows
                .checked_add(1)
                .and_then(|n1| n1.checked_mul(self.rows))
                .map(|len| len / 2 - 1),
            _ => self
                .layout
                .checked_index(self.rows - 1, self.cols - 1, self.ld),
        };
        Some(last.unwrap_or(usize::MAX))
    }

    /// Number of store elements (from the start of the store) this matrix
    /// needs, saturating at `usize::MAX`.
    pub fn required_len(&self) -> usize {
        match self.last_index() {
            Some(last) => self
                .offset
                .checked_add(last)
                .and_then(|end| end.checked_add(1))
                .unwrap_or(usize::MAX),
            None => self.offset,
        }
    }

    /// Check the descriptor against a store of `store_len` elements.
    ///
    /// # Errors
    /// [`BlasError::NonSquare`], [`BlasError::LeadingDimension`] or
    /// [`BlasError::OutOfBounds`].
    pub fn validate(&self, store_len: usize) -> Result<()> {
        if self.structure.requires_square() && self.rows != self.cols {
            return Err(BlasError::NonSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let min = self.min_ld();
        if self.ld < min {
            return Err(BlasError::LeadingDimension { ld: self.ld, min });
        }
        let required = self.required_len();
        if required > store_len {
            return Err(BlasError::OutOfBounds {
                required,
                available: store_len,
            });
        }
        Ok(())
    }
}

fn matrix_footprint<T>(base: *const T, desc: &MatrixDesc) -> Footprint {
    let elem = size_of::<T>();
    match desc.last_index() {
        None => Footprint::empty(elem),
        Some(last) => {
            let start = base as usize + desc.offset * elem;
            Footprint {
                start,
                end: start + (last + 1) * elem,
                stride: 0,
                count: desc.rows.saturating_mul(desc.cols),
                elem_size: elem,
            }
        }
    }
}

// ============================================================================
// Matrix blocks
// ============================================================================

/// Read-only matrix view.
///
/// ```rust
/// use strided_blas::{Layout, MatrixBlock, MatrixDesc};
///
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let a = MatrixBlock::new(&data, MatrixDesc::general(2, 3, Layout::RowMajor)).unwrap();
/// assert_eq!(a.get(1, 0), 4.0);
/// assert_eq!(a.t().get(0, 1), 4.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MatrixBlock<'a, T> {
    ptr: NonNull<T>,
    store_len: usize,
    desc: MatrixDesc,
    _marker: PhantomData<&'a [T]>,
}

/// Mutable matrix view.
#[derive(Debug)]
pub struct MatrixBlockMut<'a, T> {
    ptr: NonNull<T>,
    store_len: usize,
    desc: MatrixDesc,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Sync> Send for MatrixBlock<'_, T> {}
unsafe impl<T: Sync> Sync for MatrixBlock<'_, T> {}
unsafe impl<T: Send> Send for MatrixBlockMut<'_, T> {}
unsafe impl<T: Sync> Sync for MatrixBlockMut<'_, T> {}

impl<'a, T: BlasScalar> MatrixBlock<'a, T> {
    /// Create a matrix view over `data`.
    ///
    /// # Errors
    /// See [`MatrixDesc::validate`].
    pub fn new(data: &'a [T], desc: MatrixDesc) -> Result<Self> {
        desc.validate(data.len())?;
        Ok(Self {
            ptr: NonNull::from(data).cast(),
            store_len: data.len(),
            desc,
            _marker: PhantomData,
        })
    }

    /// Create a matrix view over foreign memory.
    ///
    /// # Safety
    /// `ptr` must be valid for reads of `store_len` elements for `'a`, and no
    /// other code may write them while the block is alive.
    pub unsafe fn from_raw_parts(ptr: *const T, store_len: usize, desc: MatrixDesc) -> Result<Self> {
        let ptr = NonNull::new(ptr as *mut T).ok_or(BlasError::NullPointer)?;
        desc.validate(store_len)?;
        Ok(Self {
            ptr,
            store_len,
            desc,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn desc(&self) -> &MatrixDesc {
        &self.desc
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.desc.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.desc.cols
    }

    #[inline]
    pub fn ld(&self) -> usize {
        self.desc.ld
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.desc.layout
    }

    #[inline]
    pub fn structure(&self) -> Structure {
        self.desc.structure
    }

    /// Length of the backing store in elements.
    #[inline]
    pub fn store_len(&self) -> usize {
        self.store_len
    }

    /// Transposed view (zero-copy).
    pub fn t(&self) -> MatrixBlock<'a, T> {
        Self {
            desc: self.desc.transposed(),
            ..*self
        }
    }

    /// Logical element `(i, j)`, honouring the structure: zeros outside a
    /// triangle or band, mirrored entries of a symmetric matrix, implicit unit
    /// diagonals.
    ///
    /// # Panics
    /// If `(i, j)` is outside `rows x cols`.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.desc.rows && j < self.desc.cols,
            "index ({i}, {j}) out of range for {}x{}",
            self.desc.rows,
            self.desc.cols
        );
        // SAFETY: the descriptor was validated against the store.
        unsafe { self.raw().get(i, j) }
    }

    /// Dense row-major expansion of the logical matrix.
    pub fn to_dense(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.desc.rows * self.desc.cols);
        for i in 0..self.desc.rows {
            for j in 0..self.desc.cols {
                out.push(self.get(i, j));
            }
        }
        out
    }

    /// Raw form for kernels; `ptr` addresses the storage origin (`offset` applied).
    #[inline]
    pub fn raw(&self) -> RawMatrix<T> {
        RawMatrix {
            ptr: self.ptr.as_ptr().wrapping_add(self.desc.offset),
            rows: self.desc.rows,
            cols: self.desc.cols,
            ld: self.desc.ld,
            layout: self.desc.layout,
            structure: self.desc.structure,
        }
    }

    pub fn footprint(&self) -> Footprint {
        matrix_footprint(self.ptr.as_ptr(), &self.desc)
    }
}

impl<'a, T: BlasScalar> MatrixBlockMut<'a, T> {
    /// Create a mutable matrix view over `data`.
    ///
    /// # Errors
    /// See [`MatrixDesc::validate`].
    pub fn new(data: &'a mut [T], desc: MatrixDesc) -> Result<Self> {
        desc.validate(data.len())?;
        let store_len = data.len();
        Ok(Self {
            ptr: NonNull::from(data).cast(),
            store_len,
            desc,
            _marker: PhantomData,
        })
    }

    /// Create a mutable matrix view over foreign memory.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `store_len` elements for
    /// `'a`, and only blocks built from the same region may access it while
    /// this block is alive.
    pub unsafe fn from_raw_parts(ptr: *mut T, store_len: usize, desc: MatrixDesc) -> Result<Self> {
        let ptr = NonNull::new(ptr).ok_or(BlasError::NullPointer)?;
        desc.validate(store_len)?;
        Ok(Self {
            ptr,
            store_len,
            desc,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn desc(&self) -> &MatrixDesc {
        &self.desc
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.desc.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.desc.cols
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.desc.layout
    }

    #[inline]
    pub fn structure(&self) -> Structure {
        self.desc.structure
    }

    /// Transposed view (zero-copy); consumes the block so the view stays unique.
    pub fn t(self) -> MatrixBlockMut<'a, T> {
        Self {
            desc: self.desc.transposed(),
            ..self
        }
    }

    /// Read-only view of the same matrix.
    pub fn as_view(&self) -> MatrixBlock<'_, T> {
        MatrixBlock {
            ptr: self.ptr,
            store_len: self.store_len,
            desc: self.desc,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        self.as_view().get(i, j)
    }

    /// Overwrite the stored entry `(i, j)`.
    ///
    /// # Panics
    /// If `(i, j)` is out of range or not stored by the structure (outside
    /// the triangle or band, or a unit diagonal).
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(
            i < self.desc.rows && j < self.desc.cols,
            "index ({i}, {j}) out of range for {}x{}",
            self.desc.rows,
            self.desc.cols
        );
        let raw = self.as_view().raw();
        let idx = raw
            .stored_index(i, j)
            .unwrap_or_else(|| panic!("entry ({i}, {j}) is not stored by {:?}", self.desc.structure));
        // SAFETY: `stored_index` stays inside the validated storage.
        unsafe { *self.ptr.as_ptr().add(self.desc.offset + idx) = value }
    }

    pub fn to_dense(&self) -> Vec<T> {
        self.as_view().to_dense()
    }

    /// Raw read form for kernels.
    #[inline]
    pub fn raw(&self) -> RawMatrix<T> {
        self.as_view().raw()
    }

    /// Raw write form for kernels; callers route only `General` outputs here.
    #[inline]
    pub fn raw_mut(&mut self) -> RawMatrixMut<T> {
        RawMatrixMut {
            ptr: self.ptr.as_ptr().wrapping_add(self.desc.offset),
            rows: self.desc.rows,
            cols: self.desc.cols,
            ld: self.desc.ld,
            layout: self.desc.layout,
        }
    }

    pub fn footprint(&self) -> Footprint {
        matrix_footprint(self.ptr.as_ptr(), &self.desc)
    }
}
