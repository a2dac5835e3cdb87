//! Simplex projection: exponentially-weighted nearest-neighbor forecast.
//!
//! The reference source tree this crate is grounded on does not carry a
//! standalone Simplex solver file; the weighting scheme below is the
//! published Sugihara & May (1990) formulation, reusing the same
//! library/prediction index-translation and neighbor-search machinery as
//! [`crate::smap`]. See DESIGN.md for the open-question note.

use rayon::prelude::*;

use crate::embed;
use crate::error::{EdmError, Result};
use crate::frame::Frame;
use crate::neighbors;
use crate::params::{Params, Selector};

pub struct SimplexValues {
    pub predictions: Frame,
}

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

/// Run Simplex projection on `frame` (a time column at index 0 plus the
/// data columns named by `params.columns`).
pub fn simplex(frame: &Frame, params: &Params) -> Result<SimplexValues> {
    if !params.validated {
        return Err(EdmError::ConfigInvalid(
            "simplex(): Params not validated.".to_string(),
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
    neigh_params.e = embedded_data.n_cols();

    let neighbors = neighbors::find_neighbors(embedded_data.data(), &neigh_params)?;

    let n_row = neighbors.n_rows();
    let library_n_row = library_block.len();
    let tp = params.tp;

    let predicted: Vec<f64> = (0..n_row)
        .into_par_iter()
        .map(|row| {
            let dist_row = neighbors.distances.row(row);
            let d_min = dist_row.iter().cloned().fold(f64::MAX, f64::min).max(1e-6);

            let weights: Vec<f64> = dist_row.iter().map(|&d| (-d / d_min).exp()).collect();
            let w_sum: f64 = weights.iter().sum();

            let mut acc = 0.0;
            for (k, &w) in weights.iter().enumerate() {
                let lib_row = neighbors.indices[[row, k]] as isize + tp;
                let base = if lib_row > library_n_row as isize {
                    lib_row - tp
                } else {
                    lib_row
                }
                .max(0) as usize;
                acc += w * target_block[base];
            }
            acc / w_sum
        })
        .collect();

    let mut predictions = Frame::new(n_row, vec!["Time".into(), "Observed".into(), "Predicted".into()]);
    for (row, &pred_val) in predicted.iter().enumerate() {
        let block_row = prediction_block[row];
        predictions.write_row(row, &[time_block[block_row], target_block[block_row], pred_val]);
    }

    Ok(SimplexValues { predictions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Method;

    fn sine_series(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.2).sin()).collect()
    }

    #[test]
    fn test_simplex_predicts_within_series_range() {
        let n = 80;
        let y = sine_series(n);
        let mut frame = Frame::new(n, vec!["Time".into(), "Y".into()]);
        frame.write_column(0, &(0..n).map(|i| i as f64).collect::<Vec<_>>());
        frame.write_column(1, &y);

        let mut params = Params {
            method: Method::Simplex,
            lib_str: "3 60".into(),
            pred_str: format!("61 {n}"),
            e: 3,
            tau: 1,
            tp: 1,
            columns_str: "Y".into(),
            target_str: "Y".into(),
            ..Default::default()
        };
        params.validate().unwrap();

        let result = simplex(&frame, &params).unwrap();
        assert_eq!(result.predictions.n_rows(), params.prediction.len());
        for v in result.predictions.column_by_name("Predicted").unwrap() {
            assert!(v >= -1.5 && v <= 1.5);
        }
    }

    #[test]
    fn test_simplex_is_deterministic() {
        let n = 80;
        let y = sine_series(n);
        let mut frame = Frame::new(n, vec!["Time".into(), "Y".into()]);
        frame.write_column(0, &(0..n).map(|i| i as f64).collect::<Vec<_>>());
        frame.write_column(1, &y);

        let mut params = Params {
            method: Method::Simplex,
            lib_str: "3 60".into(),
            pred_str: format!("61 {n}"),
            e: 3,
            tau: 1,
            tp: 1,
            columns_str: "Y".into(),
            target_str: "Y".into(),
            ..Default::default()
        };
        params.validate().unwrap();

        let r1 = simplex(&frame, &params).unwrap();
        let r2 = simplex(&frame, &params).unwrap();
        assert_eq!(
            r1.predictions.column_by_name("Predicted"),
            r2.predictions.column_by_name("Predicted")
        );
    }
}
