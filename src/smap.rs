//! S-Map: locally-weighted linear projection over a prediction row's
//! nearest neighbors, solved by thin-SVD least squares.

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::embed;
use crate::error::{EdmError, Result};
use crate::frame::Frame;
use crate::neighbors::{self, Neighbors};
use crate::params::{Params, Selector};
use crate::svd;

/// Predictions (`Time, Observed, Predicted`) and coefficients
/// (`Time, C0..CE`), returned by value.
pub struct SmapValues {
    pub predictions: Frame,
    pub coefficients: Frame,
}

/// Resolve a single-column target selector against `frame`.
fn resolve_target(frame: &Frame, target: &Selector) -> Result<Vec<f64>> {
    match target {
        Selector::Names(names) => {
            let name = names.first().ok_or(EdmError::EmptySelector)?;
            frame
                .column_by_name(name)
                .ok_or_else(|| EdmError::ConfigInvalid(format!("unknown target column '{name}'")))
        }
        Selector::Index(idx) => {
            let i = *idx.first().ok_or(EdmError::EmptySelector)?;
            if i >= frame.n_cols() {
                return Err(EdmError::DimensionMismatch(format!(
                    "target index {i} out of range"
                )));
            }
            Ok(frame.column(i))
        }
        Selector::Empty => Err(EdmError::EmptySelector),
    }
}

/// Translate original-frame row indices to block-relative indices after an
/// embedding trims `n_partial` rows from the front.
fn translate_indices(original: &[usize], n_partial: usize) -> Result<Vec<usize>> {
    original
        .iter()
        .map(|&i| {
            i.checked_sub(n_partial).ok_or_else(|| {
                EdmError::DimensionMismatch(format!(
                    "row index {i} falls within the {n_partial} rows trimmed by embedding"
                ))
            })
        })
        .collect()
}

/// Run S-Map on `frame` (the original, pre-embedding table: a time column
/// at index 0 plus the data columns named by `params.columns`).
///
/// When `params.embedded` is true, `params.columns` are taken to already be
/// delay coordinates and no embedding step runs.
pub fn smap(frame: &Frame, params: &Params) -> Result<SmapValues> {
    if !params.validated {
        return Err(EdmError::ConfigInvalid(
            "smap(): Params not validated.".to_string(),
        ));
    }

    let (embedded_data, n_partial) = if params.embedded {
        let data = match &params.columns {
            Selector::Names(names) => frame.select_by_names(names)?,
            Selector::Index(idx) => frame.select_by_index(idx),
            Selector::Empty => return Err(EdmError::EmptySelector),
        };
        (data, 0usize)
    } else {
        let data = embed::embed(frame, params)?;
        (data, params.tau * params.e.saturating_sub(1))
    };
    let eff_e = embedded_data.n_cols();

    let time_full = frame.column(0);
    let target_full = resolve_target(frame, &params.target)?;

    let n_block_rows = embedded_data.n_rows();
    let target_block: Vec<f64> = (0..n_block_rows).map(|j| target_full[j + n_partial]).collect();
    let time_block: Vec<f64> = (0..n_block_rows).map(|j| time_full[j + n_partial]).collect();

    let library_block = translate_indices(&params.library, n_partial)?;
    let prediction_block = translate_indices(&params.prediction, n_partial)?;

    let mut neigh_params = params.clone();
    neigh_params.library = library_block.clone();
    neigh_params.prediction = prediction_block.clone();
    neigh_params.embedded = true;
    neigh_params.e = eff_e;

    let neighbors = neighbors::find_neighbors(embedded_data.data(), &neigh_params)?;

    let n_row = neighbors.n_rows();
    if prediction_block.len() != n_row {
        return Err(EdmError::DimensionMismatch(format!(
            "smap(): prediction rows ({}) != neighbor rows ({n_row})",
            prediction_block.len()
        )));
    }
    if neighbors.knn() != params.knn {
        return Err(EdmError::DimensionMismatch(format!(
            "smap(): neighbor columns ({}) != knn ({})",
            neighbors.knn(),
            params.knn
        )));
    }

    // library_block[0] anchors the direct-index convention inherited from
    // the reference implementation below: target/library lookups index
    // block rows directly by neighbor row number, which only lines up with
    // `library_block` when it starts at block row 0 (the common case of a
    // library spanning the start of the trajectory). See DESIGN.md.
    let library_n_row = library_block.len();
    let block = embedded_data.data();

    let results: Vec<(f64, Vec<f64>)> = (0..n_row)
        .into_par_iter()
        .map(|row| {
            smap_row(
                row,
                block,
                &neighbors,
                &prediction_block,
                &target_block,
                library_n_row,
                eff_e,
                params.tp,
                params.theta,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let mut predictions = Frame::new(n_row, vec!["Time".into(), "Observed".into(), "Predicted".into()]);
    let mut coef_names = vec!["Time".to_string()];
    for c in 0..=eff_e {
        coef_names.push(format!("C{c}"));
    }
    let mut coefficients = Frame::new(n_row, coef_names);

    for (row, (pred_val, coefs)) in results.into_iter().enumerate() {
        let block_row = prediction_block[row];
        let t = time_block[block_row];
        let observed = target_block[block_row];
        predictions.write_row(row, &[t, observed, pred_val]);

        let mut coef_row = Vec::with_capacity(eff_e + 2);
        coef_row.push(t);
        coef_row.extend(coefs);
        coefficients.write_row(row, &coef_row);
    }

    Ok(SmapValues {
        predictions,
        coefficients,
    })
}

#[allow(clippy::too_many_arguments)]
fn smap_row(
    row: usize,
    block: &Array2<f64>,
    neighbors: &Neighbors,
    prediction_block: &[usize],
    target_block: &[f64],
    library_n_row: usize,
    eff_e: usize,
    tp: isize,
    theta: f64,
) -> Result<(f64, Vec<f64>)> {
    let knn = neighbors.knn();
    let dist_row = neighbors.distances.row(row);
    let d_avg = dist_row.sum() / knn as f64;

    let w: Vec<f64> = if theta > 0.0 {
        dist_row.iter().map(|&d| (-theta * d / d_avg).exp()).collect()
    } else {
        vec![1.0; knn]
    };

    let pred_block_row = prediction_block[row];
    let pred_coords = block.row(pred_block_row);

    let mut a = Array2::<f64>::zeros((knn, eff_e + 1));
    let mut b = Array1::<f64>::zeros(knn);

    for k in 0..knn {
        let lib_row = neighbors.indices[[row, k]] as isize + tp;
        let base = if lib_row > library_n_row as isize {
            lib_row - tp
        } else {
            lib_row
        }
        .max(0) as usize;
        b[k] = w[k] * target_block[base];

        a[[k, 0]] = w[k];
        for j in 1..=eff_e {
            a[[k, j]] = w[k] * pred_coords[j - 1];
        }
    }

    let c = svd::lstsq(&a, &b)?;

    let mut prediction = c[0];
    for e in 1..=eff_e {
        prediction += c[e] * pred_coords[e - 1];
    }

    Ok((prediction, c.to_vec()))
}
