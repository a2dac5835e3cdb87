//! Time-delay embedding: build a delayed-coordinate block from selected
//! columns of a `Frame`.

use crate::error::{EdmError, Result};
use crate::frame::Frame;
use crate::params::{Params, Selector};

/// Build the delay-coordinate embedding of `frame`'s columns.
///
/// Output shape is `(n_rows - tau*(e-1), n_cols * e)`. Column
/// `col*e + lag` holds column `col` shifted so output row `j` contains the
/// input value from row `j + tau*(e-1) - lag*tau` (reverse-time embedding);
/// rows whose source index would be negative are trimmed. This is a pure
/// function: `frame` is read-only.
pub fn make_block(frame: &Frame, e: usize, tau: usize, column_names: &[String]) -> Result<Frame> {
    if column_names.len() != frame.n_cols() {
        return Err(EdmError::DimensionMismatch(format!(
            "make_block: the number of columns in the frame ({}) is not equal \
             to the number of columns specified ({}).",
            frame.n_cols(),
            column_names.len()
        )));
    }
    debug_assert!(e >= 1 && tau >= 1);

    let n_rows = frame.n_rows();
    let n_cols_out = frame.n_cols() * e;
    let n_partial = tau * (e - 1);
    let n_rows_out = n_rows.saturating_sub(n_partial);

    let mut new_names = Vec::with_capacity(n_cols_out);
    for name in column_names {
        for lag in 0..e {
            new_names.push(format!("{name}(t-{lag})"));
        }
    }

    let mut out = Frame::new(n_rows_out, new_names);

    for (col, _name) in column_names.iter().enumerate() {
        let input_col = frame.column(col);
        for lag in 0..e {
            let shift = lag * tau;
            let mut out_col = Vec::with_capacity(n_rows_out);
            for j in 0..n_rows_out {
                // out row j (0-based, post-truncation) corresponds to
                // shifted-frame row j + n_partial; the shift-by-`shift`
                // read offsets that back by `shift` rows.
                let src = j + n_partial - shift;
                out_col.push(input_col[src]);
            }
            out.write_column(col * e + lag, &out_col);
        }
    }

    Ok(out)
}

/// Resolve `params.columns` against `frame`'s column map and embed.
///
/// Mirrors the two `Embed(...)` overloads of the original implementation
/// (load-from-path vs. take-a-frame) collapsed into a single function: CSV
/// loading is the caller's job (via `Frame::from_csv`), this only ever
/// operates on an in-memory `Frame`.
pub fn embed(frame: &Frame, params: &Params) -> Result<Frame> {
    let (sub_frame, col_names) = match &params.columns {
        Selector::Names(names) => (frame.select_by_names(names)?, names.clone()),
        Selector::Index(idx) => {
            let names: Vec<String> = idx.iter().map(|i| format!("V{i}")).collect();
            (frame.select_by_index(idx), names)
        }
        Selector::Empty => {
            return Err(EdmError::EmptySelector);
        }
    };
    make_block(&sub_frame, params.e, params.tau, &col_names)
}
