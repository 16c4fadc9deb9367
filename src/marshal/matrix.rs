// In: src/marshal/matrix.rs

//! Native row-major value buffer -> host array of per-series columns.

use crate::error::BridgeError;
use crate::kernels::transpose::{gather_column, matrix_len};
use crate::traits::HostEnv;
use crate::types::TypeHandleSet;

/// Builds `columns` host arrays of `rows` values each, where
/// `result[col][row] == values[col + row * columns]`.
///
/// The outer array is allocated first and filled one column at a time. Any
/// allocation failure aborts with `ResourceExhausted`; the partially filled
/// outer array is host-owned and simply dropped by the caller. A `values`
/// buffer shorter than the shape is a broken native contract, reported as
/// `FfiError`.
pub fn values_to_matrix<H: HostEnv>(
    host: &H,
    types: &TypeHandleSet<H::TypeRef>,
    values: &[f64],
    columns: usize,
    rows: usize,
) -> Result<H::Object, BridgeError> {
    match matrix_len(columns, rows) {
        Some(len) if len <= values.len() => {}
        _ => {
            return Err(BridgeError::FfiError(format!(
                "value buffer holds {} values, too few for {} columns x {} rows",
                values.len(),
                columns,
                rows
            )))
        }
    }

    let matrix = host.new_object_array(&types.double_array, columns).ok_or_else(|| {
        BridgeError::ResourceExhausted("failed to allocate memory for double[] array".to_string())
    })?;

    // One scratch buffer, refilled per column.
    let mut scratch: Vec<f64> = Vec::new();
    scratch.try_reserve_exact(rows).map_err(|_| {
        BridgeError::ResourceExhausted("failed to allocate memory for the column values".to_string())
    })?;

    for column in 0..columns {
        gather_column(values, columns, rows, column, &mut scratch);

        let column_store = host.new_double_array(&types.double_array, &scratch)?;
        host.set_element(&matrix, column, column_store)?;
    }

    Ok(matrix)
}
