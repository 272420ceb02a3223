//! Tree-policy parameters governing one neighbor's hypothesis tracker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TcaffConfig {
    pub prob_no_match: f64,
    pub exploring_branching_factor: u32,
    pub window_len: u32,
    pub max_branch_exp: u32,
    pub max_branch_main: u32,
    pub rho: f64,
    pub steps_before_main_tree_deletion: u32,
    pub main_tree_obj_req: u32,
    pub ts_align: f64,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("tcaff.prob_no_match must be in [0.0, 1.0], got {0}")]
    InvalidProbNoMatch(f64),
    #[error("tcaff.exploring_branching_factor must be >= 1")]
    InvalidBranchingFactor,
    #[error("tcaff.window_len must be >= 1")]
    InvalidWindowLen,
    #[error("tcaff.max_branch_exp must be >= 1")]
    InvalidMaxBranchExp,
    #[error("tcaff.max_branch_main must be >= 1")]
    InvalidMaxBranchMain,
    #[error("tcaff.rho must be positive, got {0}")]
    InvalidRho(f64),
    #[error("tcaff.main_tree_obj_req must be >= 1")]
    InvalidMainTreeObjReq,
    #[error("tcaff.main_tree_obj_req ({main_tree_obj_req}) must be <= window_len ({window_len})")]
    ObjReqExceedsWindow { main_tree_obj_req: u32, window_len: u32 },
    #[error("tcaff.ts_align must be positive, got {0}")]
    InvalidCadence(f64),
}

impl TcaffConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.prob_no_match) {
            return Err(ConfigError::InvalidProbNoMatch(self.prob_no_match));
        }
        if self.exploring_branching_factor < 1 {
            return Err(ConfigError::InvalidBranchingFactor);
        }
        if self.window_len < 1 {
            return Err(ConfigError::InvalidWindowLen);
        }
        if self.max_branch_exp < 1 {
            return Err(ConfigError::InvalidMaxBranchExp);
        }
        if self.max_branch_main < 1 {
            return Err(ConfigError::InvalidMaxBranchMain);
        }
        if !(self.rho > 0.0) {
            return Err(ConfigError::InvalidRho(self.rho));
        }
        if self.main_tree_obj_req < 1 {
            return Err(ConfigError::InvalidMainTreeObjReq);
        }
        if self.main_tree_obj_req > self.window_len {
            return Err(ConfigError::ObjReqExceedsWindow {
                main_tree_obj_req: self.main_tree_obj_req,
                window_len: self.window_len,
            });
        }
        if !(self.ts_align > 0.0) {
            return Err(ConfigError::InvalidCadence(self.ts_align));
        }
        Ok(())
    }

    /// Leaves whose chain carries more consecutive "no-match" virtual
    /// children than this are pruned outright: half the window, so a
    /// hypothesis that hasn't seen real support in that long is dead weight.
    pub(crate) fn max_no_match_streak(&self) -> u32 {
        (self.window_len / 2).max(1)
    }

    /// Consistency tolerance for promotion: candidates within `rho` radians
    /// of weighted SE(2) distance are treated as "the same" hypothesis.
    pub(crate) fn promotion_tolerance(&self) -> f64 {
        self.rho
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TcaffConfig {
        TcaffConfig {
            prob_no_match: 0.1,
            exploring_branching_factor: 2,
            window_len: 10,
            max_branch_exp: 20,
            max_branch_main: 4,
            rho: 0.3,
            steps_before_main_tree_deletion: 5,
            main_tree_obj_req: 4,
            ts_align: 1.0,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_obj_req_exceeding_window() {
        let mut c = valid();
        c.main_tree_obj_req = 20;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_prob_out_of_range() {
        let mut c = valid();
        c.prob_no_match = 1.5;
        assert!(c.validate().is_err());
    }
}
