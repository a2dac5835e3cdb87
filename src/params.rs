//! Validated configuration for the embedding / neighbor-search / S-Map pipeline.

use crate::error::{EdmError, Result};

/// Prediction method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Simplex,
    SMap,
    Embed,
    None,
}

impl Default for Method {
    fn default() -> Self {
        Method::None
    }
}

/// Distance metric used by neighbor search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Euclidean,
    Manhattan,
}

/// Column or target selector: either names or 0-based indices, mutually
/// exclusive, derived from the raw input token list by an all-digits test.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Names(Vec<String>),
    Index(Vec<usize>),
    Empty,
}

impl Selector {
    fn from_tokens(tokens: &[String]) -> Self {
        if tokens.is_empty() {
            return Selector::Empty;
        }
        let only_digits = tokens.iter().all(|t| t.chars().all(|c| c.is_ascii_digit()) && !t.is_empty());
        if only_digits {
            Selector::Index(tokens.iter().map(|t| t.parse().unwrap()).collect())
        } else {
            Selector::Names(tokens.to_vec())
        }
    }
}

/// Immutable-after-validation pipeline configuration.
#[derive(Debug, Clone)]
pub struct Params {
    pub method: Method,

    pub library: Vec<usize>,
    pub prediction: Vec<usize>,

    pub e: usize,
    pub tau: usize,
    pub tp: isize,
    pub knn: usize,

    pub theta: f64,

    pub columns: Selector,
    pub target: Selector,

    pub jacobians: Vec<usize>,
    pub svd_significance: f64,
    pub tikhonov_alpha: f64,
    pub elastic_net_alpha: f64,

    pub embedded: bool,
    pub no_neighbor_limit: bool,
    pub forward_tau: bool,

    pub verbose: bool,
    pub validated: bool,

    // raw string inputs, retained pre-validation the way the original
    // cppEDM Parameters struct keeps both the raw strings and the derived
    // vectors around.
    pub lib_str: String,
    pub pred_str: String,
    pub columns_str: String,
    pub target_str: String,
    pub jacobian_str: String,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            method: Method::None,
            library: Vec::new(),
            prediction: Vec::new(),
            e: 0,
            tau: 1,
            tp: 0,
            knn: 0,
            theta: 0.0,
            columns: Selector::Empty,
            target: Selector::Empty,
            jacobians: Vec::new(),
            svd_significance: 1e-5,
            tikhonov_alpha: 0.0,
            elastic_net_alpha: 0.1,
            embedded: false,
            no_neighbor_limit: false,
            forward_tau: false,
            verbose: false,
            validated: false,
            lib_str: String::new(),
            pred_str: String::new(),
            columns_str: String::new(),
            target_str: String::new(),
            jacobian_str: String::new(),
        }
    }
}

fn split_tokens(s: &str) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn parse_inclusive_range(label: &str, s: &str) -> Result<Vec<usize>> {
    let tokens = split_tokens(s);
    if tokens.len() != 2 {
        return Err(EdmError::ConfigInvalid(format!(
            "{label} must be two integers."
        )));
    }
    let start: isize = tokens[0]
        .parse()
        .map_err(|_| EdmError::ConfigInvalid(format!("{label}: non-integer bound")))?;
    let end: isize = tokens[1]
        .parse()
        .map_err(|_| EdmError::ConfigInvalid(format!("{label}: non-integer bound")))?;
    if end < start {
        return Err(EdmError::ConfigInvalid(format!(
            "{label}: end must not precede start"
        )));
    }
    // 1-based inclusive input -> 0-based inclusive range.
    Ok(((start - 1)..end).map(|v| v as usize).collect())
}

impl Params {
    /// Construct and validate in one step, mirroring the cppEDM constructor
    /// that validates eagerly unless `method == Method::None`.
    pub fn build(mut self) -> Result<Self> {
        if self.method != Method::None {
            self.validate()?;
        }
        Ok(self)
    }

    /// Index offsets, derive library/prediction/columns/target/jacobians,
    /// and enforce the per-method invariants.
    pub fn validate(&mut self) -> Result<()> {
        self.validated = true;

        if !self.lib_str.is_empty() {
            self.library = parse_inclusive_range("Params: library", &self.lib_str)?;
        }
        if !self.pred_str.is_empty() {
            self.prediction = parse_inclusive_range("Params: prediction", &self.pred_str)?;
        }

        if !self.columns_str.is_empty() {
            self.columns = Selector::from_tokens(&split_tokens(&self.columns_str));
        }
        if !self.target_str.is_empty() {
            self.target = Selector::from_tokens(&split_tokens(&self.target_str));
        }

        if !self.jacobian_str.is_empty() {
            let tokens = split_tokens(&self.jacobian_str);
            if tokens.len() < 2 {
                return Err(EdmError::ConfigInvalid(
                    "jacobians must be at least two integers.".to_string(),
                ));
            }
            self.jacobians = tokens
                .iter()
                .map(|t| {
                    t.parse::<usize>()
                        .map_err(|_| EdmError::ConfigInvalid("jacobians: non-integer".to_string()))
                })
                .collect::<Result<Vec<usize>>>()?;
        }

        match self.method {
            Method::Simplex => {
                if self.knn < 1 {
                    self.knn = self.e + 1;
                    log::info!("Params::validate(): Set knn = {} (E+1) for Simplex.", self.knn);
                }
                if self.knn < self.e + 1 {
                    return Err(EdmError::ConfigInvalid(format!(
                        "Simplex knn of {} is less than E+1 = {}",
                        self.knn,
                        self.e + 1
                    )));
                }
            }
            Method::SMap => {
                if self.knn > 0 {
                    if self.knn < self.e + 1 {
                        return Err(EdmError::ConfigInvalid(format!(
                            "S-Map knn must be at least E+1 = {}",
                            self.e + 1
                        )));
                    }
                } else {
                    let knn = self.prediction.len() as isize - self.tp;
                    if knn < 1 {
                        return Err(EdmError::ConfigInvalid(
                            "S-Map: derived knn is not positive".to_string(),
                        ));
                    }
                    self.knn = knn as usize;
                    log::info!("Params::validate(): Set knn = {} for SMap.", self.knn);
                }
                if !self.embedded && matches!(&self.columns, Selector::Names(n) if n.len() > 1) {
                    log::warn!(
                        "Params::validate(): Multivariable S-Map should use embedded data \
                         input to ensure data/dimension correspondence."
                    );
                }

                if self.jacobians.len() > 1 {
                    if self.jacobians.contains(&0) {
                        return Err(EdmError::ConfigInvalid(
                            "S-Map coefficient columns for jacobians can not use column 0."
                                .to_string(),
                        ));
                    }
                    if self.jacobians.len() % 2 != 0 {
                        return Err(EdmError::ConfigInvalid(
                            "S-Map coefficient columns for jacobians must be in pairs."
                                .to_string(),
                        ));
                    }
                }

                if self.tikhonov_alpha != 0.0 && self.elastic_net_alpha != 0.0 {
                    return Err(EdmError::ConfigInvalid(
                        "Multiple S-Map solve methods specified. Use one or none of: \
                         tikhonov, elasticNet."
                            .to_string(),
                    ));
                }

                if self.elastic_net_alpha < 0.01 {
                    log::warn!("Params::validate(): ElasticNetAlpha too small. Setting to 0.01.");
                    self.elastic_net_alpha = 0.01;
                }
                if self.elastic_net_alpha > 1.0 {
                    log::warn!("Params::validate(): ElasticNetAlpha too large. Setting to 1.");
                    self.elastic_net_alpha = 1.0;
                }
            }
            Method::Embed => {
                // no-op: embedding alone doesn't constrain knn/theta.
            }
            Method::None => {
                return Err(EdmError::ConfigInvalid(
                    "Params::validate() called with Method::None".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_parsing_is_zero_based_inclusive() {
        let mut p = Params {
            method: Method::Simplex,
            lib_str: "1 10".into(),
            pred_str: "1 10".into(),
            e: 2,
            ..Default::default()
        };
        p.validate().unwrap();
        assert_eq!(p.library, (0..10).collect::<Vec<_>>());
        assert_eq!(p.prediction, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_simplex_knn_default_is_e_plus_1() {
        let mut p = Params {
            method: Method::Simplex,
            lib_str: "1 10".into(),
            pred_str: "1 10".into(),
            e: 3,
            ..Default::default()
        };
        p.validate().unwrap();
        assert_eq!(p.knn, 4);
    }

    #[test]
    fn test_simplex_knn_too_small_is_error() {
        let mut p = Params {
            method: Method::Simplex,
            lib_str: "1 10".into(),
            pred_str: "1 10".into(),
            e: 3,
            knn: 2,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_smap_knn_defaults_to_all_neighbors() {
        let mut p = Params {
            method: Method::SMap,
            lib_str: "1 20".into(),
            pred_str: "1 20".into(),
            e: 2,
            tp: 1,
            ..Default::default()
        };
        p.validate().unwrap();
        assert_eq!(p.knn, 19);
    }

    #[test]
    fn test_columns_digit_only_becomes_index() {
        let mut p = Params {
            method: Method::Embed,
            lib_str: "1 1".into(),
            pred_str: "1 1".into(),
            columns_str: "1 2 3".into(),
            e: 1,
            ..Default::default()
        };
        p.validate().unwrap();
        assert_eq!(p.columns, Selector::Index(vec![1, 2, 3]));
    }

    #[test]
    fn test_columns_names_when_not_digit_only() {
        let mut p = Params {
            method: Method::Embed,
            lib_str: "1 1".into(),
            pred_str: "1 1".into(),
            columns_str: "x,y".into(),
            e: 1,
            ..Default::default()
        };
        p.validate().unwrap();
        assert_eq!(
            p.columns,
            Selector::Names(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn test_jacobians_must_be_even_and_not_contain_zero() {
        let mut p = Params {
            method: Method::SMap,
            lib_str: "1 20".into(),
            pred_str: "1 20".into(),
            e: 2,
            tp: 1,
            jacobian_str: "1 2 3".into(),
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let mut p2 = Params {
            method: Method::SMap,
            lib_str: "1 20".into(),
            pred_str: "1 20".into(),
            e: 2,
            tp: 1,
            jacobian_str: "0 1".into(),
            ..Default::default()
        };
        assert!(p2.validate().is_err());
    }

    #[test]
    fn test_alphas_mutually_exclusive() {
        let mut p = Params {
            method: Method::SMap,
            lib_str: "1 20".into(),
            pred_str: "1 20".into(),
            e: 2,
            tp: 1,
            tikhonov_alpha: 0.5,
            elastic_net_alpha: 0.5,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_elastic_net_alpha_clamped() {
        let mut p = Params {
            method: Method::SMap,
            lib_str: "1 20".into(),
            pred_str: "1 20".into(),
            e: 2,
            tp: 1,
            elastic_net_alpha: 5.0,
            tikhonov_alpha: 0.0,
            ..Default::default()
        };
        p.validate().unwrap();
        assert_eq!(p.elastic_net_alpha, 1.0);
    }

    #[test]
    fn test_malformed_lib_str_is_config_invalid() {
        let mut p = Params {
            method: Method::Simplex,
            lib_str: "not a range".into(),
            pred_str: "1 10".into(),
            e: 2,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(EdmError::ConfigInvalid(_))));
    }

    #[test]
    fn test_malformed_pred_str_is_config_invalid() {
        let mut p = Params {
            method: Method::Simplex,
            lib_str: "1 10".into(),
            pred_str: "10 1".into(), // end precedes start
            e: 2,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(EdmError::ConfigInvalid(_))));
    }
}
