//! Empirical dynamic modeling core: time-delay embedding, k-nearest-neighbor
//! search, and S-Map / Simplex projection over tabular time-series data.

pub mod embed;
pub mod error;
pub mod frame;
pub mod neighbors;
pub mod params;
pub mod simplex;
pub mod smap;
pub mod svd;

pub use error::{EdmError, Result};
pub use frame::Frame;
pub use params::{DistanceMetric, Method, Params, Selector};
