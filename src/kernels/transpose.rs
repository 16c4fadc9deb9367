//! This module contains the stride-copy kernel that reshapes librrd's row-major
//! value buffer into per-series columns.
//!
//! librrd lays out `rows` time steps one after another, each holding one value
//! per series. The host wants one sequence per series, so column `c` is the
//! strided read `values[c + r * columns]` for `r in 0..rows`.

//==================================================================================
// 1. Public API
//==================================================================================

/// Number of values in a `columns × rows` buffer, or `None` on overflow.
pub fn matrix_len(columns: usize, rows: usize) -> Option<usize> {
    columns.checked_mul(rows)
}

/// Copies series `column` out of a row-major buffer into `out`, replacing its
/// contents. `out` should already have capacity for `rows` values.
///
/// `values` must hold at least `columns * rows` values and `column < columns`.
#[inline]
pub fn gather_column(values: &[f64], columns: usize, rows: usize, column: usize, out: &mut Vec<f64>) {
    debug_assert!(column < columns);
    debug_assert!(values.len() >= columns * rows);

    out.clear();
    out.extend((0..rows).map(|row| values[column + row * columns]));
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
