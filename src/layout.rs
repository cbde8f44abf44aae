//! Layout and structure metadata for matrix blocks.
//!
//! [`Layout`] decides how a full-storage `(i, j)` maps to memory; [`Structure`]
//! decides which entries are stored at all and which kernel family applies.
//! Storage conventions follow CBLAS: band storage for [`Structure::Banded`] and
//! packed triangles for [`Structure::Packed`].

use std::fmt;

/// Memory layout of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// Row-major (C-style): elements in a row are contiguous.
    #[default]
    RowMajor,
    /// Column-major (Fortran-style): elements in a column are contiguous.
    ColMajor,
}

impl Layout {
    /// The layout seen through a transposed view.
    #[inline]
    pub fn transposed(self) -> Self {
        match self {
            Layout::RowMajor => Layout::ColMajor,
            Layout::ColMajor => Layout::RowMajor,
        }
    }

    /// Smallest valid leading dimension for a full-storage `rows x cols` matrix.
    #[inline]
    pub fn min_ld(self, rows: usize, cols: usize) -> usize {
        let ld = match self {
            Layout::RowMajor => cols,
            Layout::ColMajor => rows,
        };
        ld.max(1)
    }

    /// Offset of full-storage element `(i, j)`.
    #[inline(always)]
    pub fn index(self, i: usize, j: usize, ld: usize) -> usize {
        match self {
            Layout::RowMajor => i * ld + j,
            Layout::ColMajor => j * ld + i,
        }
    }

    /// [`Layout::index`] returning `None` on overflow.
    #[inline]
    pub fn checked_index(self, i: usize, j: usize, ld: usize) -> Option<usize> {
        let (major, minor) = match self {
            Layout::RowMajor => (i, j),
            Layout::ColMajor => (j, i),
        };
        major.checked_mul(ld)?.checked_add(minor)
    }

    /// Offset of band-storage element `(i, j)`; `(i, j)` must lie inside the band.
    #[inline(always)]
    pub fn band_index(self, kl: usize, ku: usize, i: usize, j: usize, ld: usize) -> usize {
        match self {
            Layout::ColMajor => j * ld + ku + i - j,
            Layout::RowMajor => i * ld + kl + j - i,
        }
    }

    /// Offset of packed element `(i, j)` of an `n x n` triangle; `(i, j)` must
    /// lie inside the `uplo` triangle.
    #[inline(always)]
    pub fn packed_index(self, uplo: Uplo, n: usize, i: usize, j: usize) -> usize {
        match (self, uplo) {
            (Layout::ColMajor, Uplo::Upper) => i + j * (j + 1) / 2,
            (Layout::ColMajor, Uplo::Lower) => i + j * (2 * n - j - 1) / 2,
            (Layout::RowMajor, Uplo::Upper) => j + i * (2 * n - i - 1) / 2,
            (Layout::RowMajor, Uplo::Lower) => j + i * (i + 1) / 2,
        }
    }
}

/// Which triangle of a triangular or symmetric matrix is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Uplo {
    #[default]
    Upper,
    Lower,
}

impl Uplo {
    /// The triangle seen through a transposed view.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Uplo::Upper => Uplo::Lower,
            Uplo::Lower => Uplo::Upper,
        }
    }

    /// Returns true if `(i, j)` lies in this triangle (diagonal included).
    #[inline(always)]
    pub fn contains(self, i: usize, j: usize) -> bool {
        match self {
            Uplo::Upper => i <= j,
            Uplo::Lower => i >= j,
        }
    }
}

/// Whether a triangular matrix has an implicit unit diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Diag {
    #[default]
    NonUnit,
    Unit,
}

/// What a packed triangle represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackedKind {
    /// The other triangle mirrors the stored one.
    Symmetric,
    /// The other triangle is zero.
    Triangular(Diag),
}

/// Structural tag of a matrix block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Structure {
    #[default]
    General,
    Triangular {
        uplo: Uplo,
        diag: Diag,
    },
    Symmetric {
        uplo: Uplo,
    },
    Banded {
        kl: usize,
        ku: usize,
    },
    Packed {
        uplo: Uplo,
        kind: PackedKind,
    },
}

impl Structure {
    /// Table class of this structure.
    #[inline]
    pub fn class(&self) -> StructureClass {
        match self {
            Structure::General => StructureClass::General,
            Structure::Triangular { .. } => StructureClass::Triangular,
            Structure::Symmetric { .. } => StructureClass::Symmetric,
            Structure::Banded { .. } => StructureClass::Banded,
            Structure::Packed { .. } => StructureClass::Packed,
        }
    }

    /// The structure seen through a transposed view.
    pub fn transposed(self) -> Self {
        match self {
            Structure::General => Structure::General,
            Structure::Triangular { uplo, diag } => Structure::Triangular {
                uplo: uplo.flipped(),
                diag,
            },
            Structure::Symmetric { uplo } => Structure::Symmetric {
                uplo: uplo.flipped(),
            },
            Structure::Banded { kl, ku } => Structure::Banded { kl: ku, ku: kl },
            Structure::Packed { uplo, kind } => Structure::Packed {
                uplo: uplo.flipped(),
                kind,
            },
        }
    }

    /// Returns true if the structure only makes sense for square matrices.
    #[inline]
    pub fn requires_square(&self) -> bool {
        matches!(
            self,
            Structure::Triangular { .. } | Structure::Symmetric { .. } | Structure::Packed { .. }
        )
    }
}

/// Structural tag without parameters; indexes the engine's kernel tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureClass {
    General = 0,
    Triangular = 1,
    Symmetric = 2,
    Banded = 3,
    Packed = 4,
}

impl StructureClass {
    /// Number of classes (table width).
    pub const COUNT: usize = 5;

    /// All classes in table order.
    pub const ALL: [StructureClass; StructureClass::COUNT] = [
        StructureClass::General,
        StructureClass::Triangular,
        StructureClass::Symmetric,
        StructureClass::Banded,
        StructureClass::Packed,
    ];

    /// Table index.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StructureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StructureClass::General => "general",
            StructureClass::Triangular => "triangular",
            StructureClass::Symmetric => "symmetric",
            StructureClass::Banded => "banded",
            StructureClass::Packed => "packed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_index() {
        // 3x4 row-major, ld = 4
        assert_eq!(Layout::RowMajor.index(1, 2, 4), 6);
        // 3x4 column-major, ld = 3
        assert_eq!(Layout::ColMajor.index(1, 2, 3), 7);
        assert_eq!(Layout::RowMajor.min_ld(3, 4), 4);
        assert_eq!(Layout::ColMajor.min_ld(3, 4), 3);
        assert_eq!(Layout::ColMajor.min_ld(0, 4), 1);
        assert_eq!(Layout::RowMajor.checked_index(1, 2, 4), Some(6));
        assert_eq!(Layout::ColMajor.checked_index(1, 2, 3), Some(7));
        assert_eq!(Layout::RowMajor.checked_index(2, 0, usize::MAX / 2 + 1), None);
        assert_eq!(Layout::ColMajor.checked_index(usize::MAX, 0, 1), Some(usize::MAX));
        assert_eq!(Layout::ColMajor.checked_index(1, 1, usize::MAX), None);
    }

    #[test]
    fn test_packed_index_covers_triangle_once() {
        let n = 5;
        for layout in [Layout::RowMajor, Layout::ColMajor] {
            for uplo in [Uplo::Upper, Uplo::Lower] {
                let mut seen = vec![false; n * (n + 1) / 2];
                for i in 0..n {
                    for j in 0..n {
                        if uplo.contains(i, j) {
                            let idx = layout.packed_index(uplo, n, i, j);
                            assert!(!seen[idx], "{layout:?} {uplo:?} ({i},{j}) revisits {idx}");
                            seen[idx] = true;
                        }
                    }
                }
                assert!(seen.iter().all(|&s| s));
            }
        }
    }

    #[test]
    fn test_packed_transpose_is_same_address() {
        // Column-major upper of A is row-major lower of A^T.
        let n = 4;
        for i in 0..n {
            for j in i..n {
                assert_eq!(
                    Layout::ColMajor.packed_index(Uplo::Upper, n, i, j),
                    Layout::RowMajor.packed_index(Uplo::Lower, n, j, i)
                );
                assert_eq!(
                    Layout::RowMajor.packed_index(Uplo::Upper, n, i, j),
                    Layout::ColMajor.packed_index(Uplo::Lower, n, j, i)
                );
            }
        }
    }

    #[test]
    fn test_band_transpose_is_same_address() {
        let (kl, ku, ld) = (1, 2, 4);
        for i in 0..5usize {
            for j in 0..5usize {
                if i <= j + kl && j <= i + ku {
                    assert_eq!(
                        Layout::ColMajor.band_index(kl, ku, i, j, ld),
                        Layout::RowMajor.band_index(ku, kl, j, i, ld)
                    );
                }
            }
        }
    }

    #[test]
    fn test_structure_transposed() {
        let s = Structure::Banded { kl: 1, ku: 3 };
        assert_eq!(s.transposed(), Structure::Banded { kl: 3, ku: 1 });
        let t = Structure::Triangular {
            uplo: Uplo::Upper,
            diag: Diag::Unit,
        };
        assert_eq!(
            t.transposed(),
            Structure::Triangular {
                uplo: Uplo::Lower,
                diag: Diag::Unit
            }
        );
        assert_eq!(t.class(), StructureClass::Triangular);
        assert!(t.requires_square());
        assert!(!s.requires_square());
    }

    #[test]
    fn test_class_index_matches_all() {
        for (i, class) in StructureClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
    }
}
