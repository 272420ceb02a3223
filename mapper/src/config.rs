//! Typed mapping configuration. Re-architects the source's nested YAML
//! mapping into an enumerated record: every field is named at compile time,
//! so an unknown key is a construction error in the Rust type sense — it
//! simply cannot be expressed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Landmark state dimension: 4 (`x,y,w,h`) or 5 (`x,y,z,w,h`).
    pub dim: usize,
    pub q_el: f64,
    pub q_el_w: f64,
    pub q_el_h: f64,
    pub p0_el: f64,
    pub p0_el_w: f64,
    pub p0_el_h: f64,
    pub r_el: f64,
    pub tau_local: f64,
    pub kappa: u32,
    pub nu: u32,
    pub zmin: f64,
    pub zmax: f64,
    pub ts_map: f64,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("mapping.dim must be 4 or 5, got {0}")]
    InvalidDim(usize),
    #[error("mapping.{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("mapping.kappa must be >= 1")]
    InvalidKappa,
    #[error("mapping.nu must be >= 1")]
    InvalidNu,
    #[error("mapping.zmin ({zmin}) must be <= mapping.zmax ({zmax})")]
    InvalidZRange { zmin: f64, zmax: f64 },
    #[error("mapping.ts_map must be positive, got {0}")]
    InvalidCadence(f64),
}

impl MappingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dim != 4 && self.dim != 5 {
            return Err(ConfigError::InvalidDim(self.dim));
        }
        for (field, value) in [
            ("q_el", self.q_el),
            ("q_el_w", self.q_el_w),
            ("q_el_h", self.q_el_h),
            ("p0_el", self.p0_el),
            ("p0_el_w", self.p0_el_w),
            ("p0_el_h", self.p0_el_h),
            ("r_el", self.r_el),
            ("tau_local", self.tau_local),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.kappa < 1 {
            return Err(ConfigError::InvalidKappa);
        }
        if self.nu < 1 {
            return Err(ConfigError::InvalidNu);
        }
        if self.zmin > self.zmax {
            return Err(ConfigError::InvalidZRange { zmin: self.zmin, zmax: self.zmax });
        }
        if !(self.ts_map > 0.0) {
            return Err(ConfigError::InvalidCadence(self.ts_map));
        }
        Ok(())
    }

    pub(crate) fn q_diag(&self, dt: f64) -> Vec<f64> {
        let mut v = vec![self.q_el * dt; self.dim - 2];
        v.push(self.q_el_w * dt);
        v.push(self.q_el_h * dt);
        v
    }

    pub(crate) fn p0_diag(&self) -> Vec<f64> {
        let mut v = vec![self.p0_el; self.dim - 2];
        v.push(self.p0_el_w);
        v.push(self.p0_el_h);
        v
    }

    pub(crate) fn r_diag(&self) -> Vec<f64> {
        vec![self.r_el; self.dim]
    }
}
