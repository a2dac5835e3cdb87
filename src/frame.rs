//! Tabular container: a 2-D numeric matrix with named columns.
//!
//! `Frame` is the in-memory representation the numeric core reads and
//! writes. CSV I/O lives here too, playing the role of the external DataIO
//! collaborator in a form that actually compiles: a thin layer around the
//! `csv` crate that the rest of the core never touches directly.

use indexmap::IndexMap;
use ndarray::{Array2, Axis};

use crate::error::{EdmError, Result};

/// An ordered sequence of named f64 columns, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    data: Array2<f64>,
    names: IndexMap<String, usize>,
}

impl Frame {
    /// A zero-filled frame of shape `(n_rows, names.len())`.
    pub fn new(n_rows: usize, names: Vec<String>) -> Self {
        let n_cols = names.len();
        let mut map = IndexMap::with_capacity(n_cols);
        for (i, name) in names.into_iter().enumerate() {
            map.insert(name, i);
        }
        Frame {
            data: Array2::zeros((n_rows, n_cols)),
            names: map,
        }
    }

    /// Build a frame from raw data and column names.
    pub fn from_array(data: Array2<f64>, names: Vec<String>) -> Result<Self> {
        if data.ncols() != names.len() {
            return Err(EdmError::DimensionMismatch(format!(
                "Frame::from_array: {} columns of data vs {} names",
                data.ncols(),
                names.len()
            )));
        }
        let mut map = IndexMap::with_capacity(names.len());
        for (i, name) in names.into_iter().enumerate() {
            map.insert(name, i);
        }
        Ok(Frame { data, names: map })
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.names.keys().cloned().collect()
    }

    pub fn column_name_to_index(&self) -> &IndexMap<String, usize> {
        &self.names
    }

    pub fn row(&self, i: usize) -> Vec<f64> {
        self.data.row(i).to_vec()
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.data.column(j).to_vec()
    }

    pub fn column_by_name(&self, name: &str) -> Option<Vec<f64>> {
        self.names.get(name).map(|&j| self.column(j))
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn write_column(&mut self, j: usize, values: &[f64]) {
        assert_eq!(values.len(), self.n_rows());
        for (i, v) in values.iter().enumerate() {
            self.data[[i, j]] = *v;
        }
    }

    pub fn write_row(&mut self, i: usize, values: &[f64]) {
        assert_eq!(values.len(), self.n_cols());
        for (j, v) in values.iter().enumerate() {
            self.data[[i, j]] = *v;
        }
    }

    /// Sub-frame preserving column order, selected by name.
    pub fn select_by_names(&self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Err(EdmError::EmptySelector);
        }
        let mut idx = Vec::with_capacity(names.len());
        for name in names {
            let i = self.names.get(name).ok_or_else(|| {
                EdmError::ConfigInvalid(format!("select_by_names: unknown column '{name}'"))
            })?;
            idx.push(*i);
        }
        Ok(self.select_by_index(&idx))
    }

    /// Sub-frame preserving column order, selected by index.
    pub fn select_by_index(&self, idx: &[usize]) -> Self {
        let sub = self.data.select(Axis(1), idx);
        let names: Vec<String> = self.column_names();
        let sub_names: Vec<String> = idx.iter().map(|&i| names[i].clone()).collect();
        Frame::from_array(sub, sub_names).expect("select_by_index: shape invariant")
    }

    /// Read a CSV file with a header row into a Frame. All columns are
    /// parsed as f64, matching the EDM core's uniform numeric treatment.
    pub fn from_csv(path: &std::path::Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let names: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let n_cols = names.len();

        let mut rows: Vec<f64> = Vec::new();
        let mut n_rows = 0usize;
        for record in reader.records() {
            let record = record?;
            for field in record.iter() {
                let v: f64 = field.parse().map_err(|_| {
                    EdmError::ConfigInvalid(format!("Frame::from_csv: non-numeric field '{field}'"))
                })?;
                rows.push(v);
            }
            n_rows += 1;
        }
        let data = Array2::from_shape_vec((n_rows, n_cols), rows)
            .map_err(|e| EdmError::DimensionMismatch(e.to_string()))?;
        Frame::from_array(data, names)
    }

    /// Write the frame as CSV with a header row.
    pub fn to_csv(&self, path: &std::path::Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.column_names())?;
        for i in 0..self.n_rows() {
            let row = self.row(i);
            let record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_shape() {
        let f = Frame::new(4, vec!["a".into(), "b".into()]);
        assert_eq!(f.n_rows(), 4);
        assert_eq!(f.n_cols(), 2);
        assert_eq!(f.column_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_row_column_roundtrip() {
        let mut f = Frame::new(3, vec!["x".into(), "y".into()]);
        f.write_column(0, &[1.0, 2.0, 3.0]);
        f.write_column(1, &[10.0, 20.0, 30.0]);
        assert_eq!(f.row(1), vec![2.0, 20.0]);
        assert_eq!(f.column_by_name("y").unwrap(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_select_by_names_preserves_order() {
        let mut f = Frame::new(2, vec!["a".into(), "b".into(), "c".into()]);
        f.write_row(0, &[1.0, 2.0, 3.0]);
        f.write_row(1, &[4.0, 5.0, 6.0]);
        let sub = f.select_by_names(&["c".to_string(), "a".to_string()]).unwrap();
        assert_eq!(sub.column_names(), vec!["c".to_string(), "a".to_string()]);
        assert_eq!(sub.row(0), vec![3.0, 1.0]);
    }

    #[test]
    fn test_select_by_names_empty_is_error() {
        let f = Frame::new(1, vec!["a".into()]);
        assert!(matches!(f.select_by_names(&[]), Err(EdmError::EmptySelector)));
    }

    #[test]
    fn test_frame_round_trips_through_csv() {
        let mut f = Frame::new(3, vec!["x".into(), "y".into()]);
        f.write_column(0, &[1.0, 2.5, -3.0]);
        f.write_column(1, &[10.0, 20.0, 30.0]);

        let path = std::env::temp_dir().join("edm_core_frame_roundtrip_test.csv");
        f.to_csv(&path).unwrap();
        let read_back = Frame::from_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(read_back.column_names(), f.column_names());
        assert_eq!(read_back.n_rows(), f.n_rows());
        assert_eq!(read_back.column_by_name("x").unwrap(), f.column_by_name("x").unwrap());
        assert_eq!(read_back.column_by_name("y").unwrap(), f.column_by_name("y").unwrap());
    }
}
