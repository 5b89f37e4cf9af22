//! Jacobian containers.
//!
//! The kinematics engine fills Jacobians column-block by column-block; how
//! the result is stored is a caller choice with no semantic content. Dense is
//! the default; sparse triplets and row-shifted storage exist for optimizers
//! that consume them natively, and `Suppressed` skips the work entirely when
//! only values are needed.

use nalgebra::DMatrix;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Requested Jacobian representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JacobianMode {
    /// Full dense matrix.
    #[default]
    Dense,
    /// Triplet list `(row, col, value)`.
    Sparse,
    /// Per-row contiguous band with a leading column shift.
    RowShifted,
    /// No Jacobian is accumulated; only dimensions are tracked.
    Suppressed,
}

/// A Jacobian in one of the selectable representations.
#[derive(Debug, Clone, PartialEq)]
pub enum Jacobian {
    /// Full dense matrix.
    Dense(DMatrix<f64>),
    /// Triplet representation; entries with the same `(row, col)` add up.
    Sparse {
        /// Number of rows.
        nrows: usize,
        /// Number of columns.
        ncols: usize,
        /// `(row, col, value)` entries.
        triplets: Vec<(usize, usize, f64)>,
    },
    /// Each row stores a contiguous band starting at `shifts[row]`.
    RowShifted {
        /// Number of rows.
        nrows: usize,
        /// Number of columns.
        ncols: usize,
        /// First stored column per row.
        shifts: Vec<usize>,
        /// Contiguous values per row.
        rows: Vec<Vec<f64>>,
    },
    /// Dimensions only.
    Suppressed {
        /// Number of rows.
        nrows: usize,
        /// Number of columns.
        ncols: usize,
    },
}

impl Jacobian {
    /// Create an all-zero Jacobian in the given representation.
    #[must_use]
    pub fn zeros(mode: JacobianMode, nrows: usize, ncols: usize) -> Self {
        match mode {
            JacobianMode::Dense => Self::Dense(DMatrix::zeros(nrows, ncols)),
            JacobianMode::Sparse => Self::Sparse {
                nrows,
                ncols,
                triplets: Vec::new(),
            },
            JacobianMode::RowShifted => Self::RowShifted {
                nrows,
                ncols,
                shifts: vec![0; nrows],
                rows: vec![Vec::new(); nrows],
            },
            JacobianMode::Suppressed => Self::Suppressed { nrows, ncols },
        }
    }

    /// Compress a dense matrix into the given representation.
    #[must_use]
    pub fn from_dense(mode: JacobianMode, m: DMatrix<f64>) -> Self {
        match mode {
            JacobianMode::Dense => Self::Dense(m),
            _ => {
                let mut j = Self::zeros(mode, m.nrows(), m.ncols());
                for i in 0..m.nrows() {
                    for k in 0..m.ncols() {
                        let v = m[(i, k)];
                        if v != 0.0 {
                            j.add(i, k, v);
                        }
                    }
                }
                j
            }
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn nrows(&self) -> usize {
        match self {
            Self::Dense(m) => m.nrows(),
            Self::Sparse { nrows, .. }
            | Self::RowShifted { nrows, .. }
            | Self::Suppressed { nrows, .. } => *nrows,
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn ncols(&self) -> usize {
        match self {
            Self::Dense(m) => m.ncols(),
            Self::Sparse { ncols, .. }
            | Self::RowShifted { ncols, .. }
            | Self::Suppressed { ncols, .. } => *ncols,
        }
    }

    /// Add `value` at `(row, col)`.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        match self {
            Self::Dense(m) => m[(row, col)] += value,
            Self::Sparse { triplets, .. } => triplets.push((row, col, value)),
            Self::RowShifted { shifts, rows, .. } => {
                let band = &mut rows[row];
                if band.is_empty() {
                    shifts[row] = col;
                    band.push(value);
                } else if col < shifts[row] {
                    let pad = shifts[row] - col;
                    let mut new = vec![0.0; pad + band.len()];
                    new[0] += value;
                    new[pad..].copy_from_slice(band);
                    *band = new;
                    shifts[row] = col;
                } else {
                    let off = col - shifts[row];
                    if off >= band.len() {
                        band.resize(off + 1, 0.0);
                    }
                    band[off] += value;
                }
            }
            Self::Suppressed { .. } => {}
        }
    }

    /// Expand to a dense matrix (`Suppressed` expands to all zeros).
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Self::Dense(m) => m.clone(),
            Self::Sparse {
                nrows,
                ncols,
                triplets,
            } => {
                let mut m = DMatrix::zeros(*nrows, *ncols);
                for &(i, k, v) in triplets {
                    m[(i, k)] += v;
                }
                m
            }
            Self::RowShifted {
                nrows,
                ncols,
                shifts,
                rows,
            } => {
                let mut m = DMatrix::zeros(*nrows, *ncols);
                for (i, band) in rows.iter().enumerate() {
                    for (off, v) in band.iter().enumerate() {
                        m[(i, shifts[i] + off)] += v;
                    }
                }
                m
            }
            Self::Suppressed { nrows, ncols } => DMatrix::zeros(*nrows, *ncols),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fill(mode: JacobianMode) -> Jacobian {
        let mut j = Jacobian::zeros(mode, 2, 5);
        j.add(0, 3, 1.5);
        j.add(0, 1, -2.0);
        j.add(1, 4, 0.5);
        j.add(0, 3, 0.5);
        j
    }

    #[test]
    fn test_representations_agree() {
        let dense = fill(JacobianMode::Dense).to_dense();
        for mode in [JacobianMode::Sparse, JacobianMode::RowShifted] {
            let other = fill(mode).to_dense();
            assert_relative_eq!(dense, other, epsilon = 1e-15);
        }
        assert_relative_eq!(dense[(0, 3)], 2.0);
        assert_relative_eq!(dense[(0, 1)], -2.0);
    }

    #[test]
    fn test_suppressed_tracks_dims_only() {
        let j = fill(JacobianMode::Suppressed);
        assert_eq!((j.nrows(), j.ncols()), (2, 5));
        assert_relative_eq!(j.to_dense().sum(), 0.0);
    }

    #[test]
    fn test_from_dense_roundtrip() {
        let dense = fill(JacobianMode::Dense).to_dense();
        let sparse = Jacobian::from_dense(JacobianMode::Sparse, dense.clone());
        assert_relative_eq!(sparse.to_dense(), dense, epsilon = 1e-15);
    }
}
