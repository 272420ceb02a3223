//! Registration gate and clustering parameters. Grouped with `TcaffConfig`
//! into the driver's `tcaff` configuration namespace, but owned here since
//! they configure this crate's algorithm.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegistrationConfig {
    pub clipper_epsilon: f64,
    pub clipper_sigma: f64,
    pub clipper_mult_repeats: u32,
    pub max_obj_width: f64,
    pub h_diff: f64,
    pub wh_scale_diff: f64,
    pub num_objs_req: usize,
    pub max_opt_fraction: f64,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("registration.{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("registration.clipper_mult_repeats must be >= 1")]
    InvalidRepeats,
    #[error("registration.num_objs_req must be >= 2, got {0}")]
    InvalidNumObjsReq(usize),
    #[error("registration.max_opt_fraction must be in (0.0, 1.0], got {0}")]
    InvalidOptFraction(f64),
}

impl RegistrationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("clipper_epsilon", self.clipper_epsilon),
            ("clipper_sigma", self.clipper_sigma),
            ("max_obj_width", self.max_obj_width),
            ("h_diff", self.h_diff),
            ("wh_scale_diff", self.wh_scale_diff),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.clipper_mult_repeats < 1 {
            return Err(ConfigError::InvalidRepeats);
        }
        if self.num_objs_req < 2 {
            return Err(ConfigError::InvalidNumObjsReq(self.num_objs_req));
        }
        if !(self.max_opt_fraction > 0.0 && self.max_opt_fraction <= 1.0) {
            return Err(ConfigError::InvalidOptFraction(self.max_opt_fraction));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RegistrationConfig {
        RegistrationConfig {
            clipper_epsilon: 0.2,
            clipper_sigma: 0.1,
            clipper_mult_repeats: 2,
            max_obj_width: 2.0,
            h_diff: 0.3,
            wh_scale_diff: 0.3,
            num_objs_req: 3,
            max_opt_fraction: 0.95,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_single_object_requirement() {
        let mut c = valid();
        c.num_objs_req = 1;
        assert_eq!(c.validate(), Err(ConfigError::InvalidNumObjsReq(1)));
    }

    #[test]
    fn rejects_opt_fraction_over_one() {
        let mut c = valid();
        c.max_opt_fraction = 1.5;
        assert!(c.validate().is_err());
    }
}
