//! Per-robot landmark mapper (component M): a Kalman-filter-based
//! multi-object tracker that ingests detections and pose estimates and
//! maintains a persistent, uniquely-identified object map.

pub mod association;
pub mod config;
pub mod error;
pub mod landmark;

pub use config::{ConfigError, MappingConfig};
pub use error::Error;
pub use landmark::{Landmark, LandmarkId};

use nalgebra::{DVector, Isometry3};

use align_core::{Detection, LandmarkSummary, MapSnapshot, Time};
use tracking::landmark_motion_model::IdentityLandmarkModel;
use tracking::landmark_observation_model::IdentityObservationModel;

use landmark::{joseph_update, LandmarkArena};

pub struct Mapper {
    config: MappingConfig,
    arena: LandmarkArena,
    last_tick: Option<Time>,
}

impl Mapper {
    pub fn new(config: MappingConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config, arena: LandmarkArena::new(), last_tick: None })
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn confirmed_len(&self) -> usize {
        self.arena.iter().filter(|l| l.is_confirmed(self.config.kappa)).count()
    }

    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.arena.get(id)
    }

    /// Advance every landmark's covariance to `t`. `A = I`, so the mean is
    /// unchanged and `P <- P + Q * dt`.
    pub fn predict(&mut self, t: Time) {
        let dt = match self.last_tick {
            Some(last) if t > last => t - last,
            Some(_) => return,
            None => 0.0,
        };
        if dt <= 0.0 && self.last_tick.is_some() {
            return;
        }
        let model = IdentityLandmarkModel::new(&self.config.q_diag(dt.max(0.0)));
        for landmark in self.arena.iter_mut() {
            landmark.predict_in_place(&model);
        }
        self.last_tick = Some(t);
    }

    /// Ingest one tick's worth of detections: transform into the odometric
    /// frame using `pose` (body-in-odom at `t`), gate on the vertical axis,
    /// associate against existing landmarks, update matches, spawn new
    /// landmarks for leftovers, age the rest, and drop stale landmarks.
    pub fn ingest(&mut self, t: Time, pose: &Isometry3<f64>, detections: &[Detection]) {
        self.predict(t);

        let dim = self.config.dim;
        let mut world_points: Vec<(nalgebra::Point3<f64>, &Detection)> = Vec::with_capacity(detections.len());
        for d in detections {
            let world = pose * d.position_camera;
            if world.z < self.config.zmin || world.z > self.config.zmax {
                continue;
            }
            world_points.push((world, d));
        }

        let xy: Vec<(f64, f64)> = world_points.iter().map(|(p, _)| (p.x, p.y)).collect();
        let ids: Vec<LandmarkId> = self.arena.iter().map(|l| l.id).collect();
        let landmark_refs: Vec<&Landmark> = self.arena.iter().collect();
        let assignment = association::associate(&landmark_refs, &xy, self.config.tau_local);

        let r_diag = self.config.r_diag();
        let obs_model_default = IdentityObservationModel::new(&r_diag);

        let mut matched = 0usize;
        let mut created = 0usize;

        for (idx, id) in ids.iter().enumerate() {
            match assignment.landmark_to_detection[idx] {
                Some(di) => {
                    let (world, detection) = &world_points[di];
                    let measurement = measurement_vector(dim, world, detection);
                    let landmark = self.arena.get_mut(*id).expect("id from arena snapshot");
                    let obs_model = match &detection.measurement_noise {
                        Some(cov) => IdentityObservationModel::from_covariance(cov.clone()),
                        None => obs_model_default.clone(),
                    };
                    let prior = landmark.estimate_ref();
                    if let Some(posterior) = joseph_update(prior, &obs_model, &measurement) {
                        landmark.apply_update(posterior, t);
                        matched += 1;
                    } else {
                        landmark.bump_stale();
                        tracing::debug!(id = id.0, "rejected degenerate Kalman update");
                    }
                }
                None => {
                    self.arena.get_mut(*id).expect("id from arena snapshot").bump_stale();
                }
            }
        }

        let p0_diag = self.config.p0_diag();
        for di in &assignment.unassigned_detections {
            let (world, detection) = &world_points[*di];
            let measurement = measurement_vector(dim, world, detection);
            let covariance = nalgebra::DMatrix::from_diagonal(&DVector::from_row_slice(&p0_diag));
            self.arena.insert(measurement, covariance, t);
            created += 1;
        }

        let nu = self.config.nu;
        let before = self.arena.len();
        self.arena.retain_mut(|l| !l.is_stale(nu));
        let dropped = before - self.arena.len();

        tracing::debug!(t, matched, created, dropped, total = self.arena.len(), "mapper ingest");

        self.last_tick = Some(t);
    }

    /// Confirmed (`obs_count >= kappa`) and fresh (`ticks_since_seen <= nu`)
    /// landmarks, as an immutable, exchangeable cut.
    pub fn snapshot(&self, t: Time) -> MapSnapshot {
        let dim = self.config.dim;
        let kappa = self.config.kappa;
        let nu = self.config.nu;
        let landmarks = self
            .arena
            .iter()
            .filter(|l| l.is_confirmed(kappa) && l.ticks_since_seen <= nu)
            .map(|l| LandmarkSummary {
                id: l.id.0,
                position: l.position(dim),
                width: l.width(dim),
                height: l.height(dim),
            })
            .collect();
        MapSnapshot { t, landmarks }
    }
}

fn measurement_vector(dim: usize, world: &nalgebra::Point3<f64>, detection: &Detection) -> DVector<f64> {
    if dim == 5 {
        DVector::from_row_slice(&[world.x, world.y, world.z, detection.width, detection.height])
    } else {
        DVector::from_row_slice(&[world.x, world.y, detection.width, detection.height])
    }
}
