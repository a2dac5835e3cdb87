//! k-nearest-neighbor search over library/prediction index partitions.

use std::sync::Mutex;

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use crate::error::{EdmError, Result};
use crate::params::{DistanceMetric, Params};

/// Row count above which `find_neighbors` distributes prediction rows
/// across threads, mirroring the teacher crate's size-gated dense/sparse
/// switch in `graphlaplace::get_laplacian`.
const ROW_PARALLEL_THRESHOLD: usize = 64;

/// Aligned (indices, distances) matrices of shape `(n_prediction, knn)`.
///
/// The k positions within a row are **not** sorted by distance; only set
/// identity and row alignment matter to downstream consumers (S-Map is
/// invariant under permutation of neighbor rows).
#[derive(Debug, Clone)]
pub struct Neighbors {
    pub indices: Array2<usize>,
    pub distances: Array2<f64>,
}

impl Neighbors {
    pub fn n_rows(&self) -> usize {
        self.indices.nrows()
    }

    pub fn knn(&self) -> usize {
        self.indices.ncols()
    }
}

pub fn distance(v1: &ArrayView1<f64>, v2: &ArrayView1<f64>, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Euclidean => v1
            .iter()
            .zip(v2.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Manhattan => v1.iter().zip(v2.iter()).map(|(a, b)| (a - b).abs()).sum(),
    }
}

/// Result of scanning the library for a single prediction row.
struct RowResult {
    idx: Vec<usize>,
    dist: Vec<f64>,
    degenerate: bool,
}

fn scan_row(
    matrix: &Array2<f64>,
    pred_row: usize,
    library: &[usize],
    knn: usize,
    tp: isize,
    no_neighbor_limit: bool,
    metric: DistanceMetric,
    verbose: bool,
) -> Result<RowResult> {
    const SENTINEL: f64 = 1e300;

    let pred_vec = matrix.row(pred_row);
    let mut k_idx = vec![0usize; knn];
    let mut k_dist = vec![SENTINEL; knn];
    let n_library_rows = library.len();

    for &lib_row in library {
        if lib_row == pred_row {
            if verbose {
                log::debug!(
                    "find_neighbors(): ignoring degenerate lib_row {lib_row} and pred_row {pred_row}"
                );
            }
            continue;
        }
        if lib_row as isize + tp >= n_library_rows as isize && !no_neighbor_limit {
            continue;
        }

        let lib_vec = matrix.row(lib_row);
        let d = distance(&lib_vec, &pred_vec, metric);

        let (max_i, max_v) = k_dist
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        if d < *max_v {
            k_idx[max_i] = lib_row;
            k_dist[max_i] = d;
        }
    }

    let max_dist = k_dist.iter().cloned().fold(f64::MIN, f64::max);
    if max_dist > 1e299 {
        return Err(EdmError::LibraryTooSmall(knn));
    }

    let mut sorted_copy = k_idx.clone();
    sorted_copy.sort_unstable();
    let degenerate = {
        let before = sorted_copy.len();
        sorted_copy.dedup();
        sorted_copy.len() != before
    };

    Ok(RowResult {
        idx: k_idx,
        dist: k_dist,
        degenerate,
    })
}

/// Compute, for each `params.prediction` row, the `params.knn` nearest
/// `params.library` rows of `matrix` under the Euclidean metric.
///
/// `matrix` holds only the columns over which distance is computed (no
/// time column). Warnings for degenerate library/prediction overlap and
/// degenerate per-row neighbor sets are logged once, deduplicated, after
/// the (possibly parallel) scan.
pub fn find_neighbors(matrix: &Array2<f64>, params: &Params) -> Result<Neighbors> {
    find_neighbors_metric(matrix, params, DistanceMetric::Euclidean)
}

pub fn find_neighbors_metric(
    matrix: &Array2<f64>,
    params: &Params,
    metric: DistanceMetric,
) -> Result<Neighbors> {
    if !params.validated {
        return Err(EdmError::ConfigInvalid(
            "find_neighbors(): Params not validated.".to_string(),
        ));
    }
    if params.embedded && params.e != matrix.ncols() {
        return Err(EdmError::DimensionMismatch(format!(
            "find_neighbors(): matrix columns ({}) do not match E ({})",
            matrix.ncols(),
            params.e
        )));
    }

    let n_matrix_rows = matrix.nrows();
    if let Some(&bad) = params
        .library
        .iter()
        .chain(params.prediction.iter())
        .find(|&&row| row >= n_matrix_rows)
    {
        return Err(EdmError::DimensionMismatch(format!(
            "find_neighbors(): row index {bad} is out of bounds for a matrix of {n_matrix_rows} rows"
        )));
    }

    let mut library_sorted = params.library.clone();
    library_sorted.sort_unstable();
    let mut prediction_sorted = params.prediction.clone();
    prediction_sorted.sort_unstable();
    let overlap: Vec<usize> = library_sorted
        .iter()
        .filter(|x| prediction_sorted.binary_search(x).is_ok())
        .cloned()
        .collect();
    if !overlap.is_empty() {
        log::warn!(
            "find_neighbors(): Degenerate library and prediction data found. Overlap indices: {overlap:?}"
        );
    }

    let n_pred = params.prediction.len();
    let knn = params.knn;
    let degenerate_rows = Mutex::new(Vec::<usize>::new());

    let rows: Vec<RowResult> = if n_pred > ROW_PARALLEL_THRESHOLD {
        params
            .prediction
            .par_iter()
            .map(|&pred_row| {
                scan_row(
                    matrix,
                    pred_row,
                    &params.library,
                    knn,
                    params.tp,
                    params.no_neighbor_limit,
                    metric,
                    params.verbose,
                )
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        params
            .prediction
            .iter()
            .map(|&pred_row| {
                scan_row(
                    matrix,
                    pred_row,
                    &params.library,
                    knn,
                    params.tp,
                    params.no_neighbor_limit,
                    metric,
                    params.verbose,
                )
            })
            .collect::<Result<Vec<_>>>()?
    };

    let mut indices = Array2::<usize>::zeros((n_pred, knn));
    let mut distances = Array2::<f64>::zeros((n_pred, knn));
    for (row_i, row) in rows.iter().enumerate() {
        if row.degenerate {
            degenerate_rows.lock().unwrap().push(row_i);
        }
        for k in 0..knn {
            indices[[row_i, k]] = row.idx[k];
            distances[[row_i, k]] = row.dist[k];
        }
    }

    let degenerate_rows = degenerate_rows.into_inner().unwrap();
    if !degenerate_rows.is_empty() {
        log::warn!(
            "find_neighbors(): Degenerate neighbors in {} prediction row(s).",
            degenerate_rows.len()
        );
    }

    Ok(Neighbors { indices, distances })
}
