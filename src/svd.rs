//! Thin-SVD least-squares solve of `A * c = b`.
//!
//! Grounded in the teacher crate's `svd_f32`/`SvdApprox::direct_svd` use of
//! `lax::Lapack::svddc` (the LAPACK `gesdd` divide-and-conquer driver),
//! generalized from `f32` to `f64` for the numeric precision the S-Map
//! solve needs, and extended from "decompose" to "solve" by applying the
//! pseudo-inverse of the singular values.

use lax::{layout::MatrixLayout, JobSvd, Lapack};
use ndarray::{Array1, Array2};

use crate::error::{EdmError, Result};

/// Returns `c` (length `n`) minimizing `||A*c - b||_2` for `A` shape
/// `(m, n)`, via thin (economy) SVD: only `min(m, n)` singular values and
/// vectors are computed.
///
/// No explicit singular-value cutoff or regularization is applied beyond
/// the floor needed to avoid dividing by an exact (or near-exact) zero
/// singular value, matching the un-regularized core path described by the
/// spec (`svd_significance` / Tikhonov / elastic-net are reserved for a
/// future extension and are not consulted here).
pub fn lstsq(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let (m, n) = (a.nrows(), a.ncols());
    if b.len() != m {
        return Err(EdmError::DimensionMismatch(format!(
            "svd::lstsq: A has {m} rows but b has length {}",
            b.len()
        )));
    }

    let mut a_buf = a.clone();
    let layout = MatrixLayout::C {
        row: m as i32,
        lda: n as i32,
    };
    let slice = a_buf
        .as_slice_mut()
        .ok_or_else(|| EdmError::ConfigInvalid("svd::lstsq: A not contiguous".to_string()))?;

    let svd_res = f64::svddc(layout, JobSvd::Some, slice)
        .map_err(|e| EdmError::ConfigInvalid(format!("svd::lstsq: svddc failed: {e:?}")))?;

    let r = svd_res.s.len();
    let s: Array1<f64> = svd_res.s.iter().copied().collect();
    let u = Array2::from_shape_vec(
        (m, r),
        svd_res
            .u
            .ok_or_else(|| EdmError::ConfigInvalid("svd::lstsq: missing U".to_string()))?,
    )
    .map_err(|e| EdmError::DimensionMismatch(e.to_string()))?;
    let vt = Array2::from_shape_vec(
        (r, n),
        svd_res
            .vt
            .ok_or_else(|| EdmError::ConfigInvalid("svd::lstsq: missing Vt".to_string()))?,
    )
    .map_err(|e| EdmError::DimensionMismatch(e.to_string()))?;

    let utb = u.t().dot(b);
    let smax = s.iter().cloned().fold(0.0_f64, f64::max);
    let floor = smax * 1e-14;
    let scaled: Array1<f64> = utb
        .iter()
        .zip(s.iter())
        .map(|(&x, &si)| if si > floor { x / si } else { 0.0 })
        .collect();
    let c = vt.t().dot(&scaled);
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_lstsq_exact_square_system() {
        // 2x + 0y = 4, 0x + 3y = 9 -> x=2, y=3
        let a = array![[2.0, 0.0], [0.0, 3.0]];
        let b = array![4.0, 9.0];
        let c = lstsq(&a, &b).unwrap();
        assert!((c[0] - 2.0).abs() < 1e-9);
        assert!((c[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_lstsq_overdetermined_linear_fit() {
        // y = 2 + 3x, sampled exactly: bias column then slope column
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let a = Array2::from_shape_fn((xs.len(), 2), |(i, j)| if j == 0 { 1.0 } else { xs[i] });
        let b: Array1<f64> = xs.iter().map(|&x| 2.0 + 3.0 * x).collect();
        let c = lstsq(&a, &b).unwrap();
        assert!((c[0] - 2.0).abs() < 1e-9);
        assert!((c[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let a = array![[1.0, 0.0], [0.0, 1.0]];
        let b = array![1.0, 2.0, 3.0];
        assert!(lstsq(&a, &b).is_err());
    }
}
