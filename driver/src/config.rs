//! Top-level, file-loadable configuration assembled from each crate's
//! typed config record. The core crates never read files themselves; that
//! stays the driver's job.

use std::collections::BTreeMap;

use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use align_core::Time;
use mapper::MappingConfig;
use registration::RegistrationConfig;
use tcaff::TcaffConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub t_start: Time,
    pub t_duration: Time,
    pub robots: Vec<String>,
    /// Optional per-robot body-to-camera transform. Robots absent from this
    /// map use the identity (camera coincides with the body frame).
    #[serde(default)]
    pub t_bc: BTreeMap<String, Isometry3<f64>>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("run.t_duration must be positive, got {0}")]
    InvalidDuration(f64),
    #[error("run.robots must list at least two robots, got {0}")]
    NotEnoughRobots(usize),
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.t_duration > 0.0) {
            return Err(ConfigError::InvalidDuration(self.t_duration));
        }
        if self.robots.len() < 2 {
            return Err(ConfigError::NotEnoughRobots(self.robots.len()));
        }
        Ok(())
    }

    pub fn t_bc_for(&self, robot: &str) -> Isometry3<f64> {
        self.t_bc.get(robot).copied().unwrap_or_else(Isometry3::identity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mapping: MappingConfig,
    pub tcaff: TcaffConfig,
    pub registration: RegistrationConfig,
    pub run: RunConfig,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Mapping(#[from] mapper::ConfigError),
    #[error(transparent)]
    Tcaff(#[from] tcaff::ConfigError),
    #[error(transparent)]
    Registration(#[from] registration::ConfigError),
    #[error(transparent)]
    Run(#[from] ConfigError),
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        self.mapping.validate()?;
        self.tcaff.validate()?;
        self.registration.validate()?;
        self.run.validate()?;
        Ok(())
    }
}
