//! Landmark state storage.
//!
//! Landmarks live in a dense arena keyed by a monotonic id, with a free
//! list for reclaimed slots, so steady-state ingest does no per-landmark
//! heap allocation beyond the arena's own occasional growth. Ids are never
//! reused even when their slot is.

use std::collections::HashMap;

use adskalman::{ObservationModel as _, StateAndCovariance, TransitionModelLinearNoControl as _};
use nalgebra::{DMatrix, DVector, Dyn, Point3};

use tracking::landmark_motion_model::IdentityLandmarkModel;
use tracking::landmark_observation_model::IdentityObservationModel;

use align_core::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LandmarkId(pub u64);

#[derive(Debug, Clone)]
pub struct Landmark {
    pub id: LandmarkId,
    estimate: StateAndCovariance<f64, Dyn>,
    pub obs_count: u32,
    pub last_seen: Time,
    pub ticks_since_seen: u32,
}

impl Landmark {
    pub fn state(&self) -> &DVector<f64> {
        self.estimate.state()
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        self.estimate.covariance()
    }

    pub(crate) fn estimate_ref(&self) -> &StateAndCovariance<f64, Dyn> {
        &self.estimate
    }

    pub fn is_confirmed(&self, kappa: u32) -> bool {
        self.obs_count >= kappa
    }

    pub fn is_stale(&self, nu: u32) -> bool {
        self.ticks_since_seen > nu
    }

    pub fn xy(&self) -> (f64, f64) {
        let s = self.state();
        (s[0], s[1])
    }

    pub fn position(&self, dim: usize) -> Point3<f64> {
        let s = self.state();
        if dim == 5 {
            Point3::new(s[0], s[1], s[2])
        } else {
            Point3::new(s[0], s[1], 0.0)
        }
    }

    pub fn width(&self, dim: usize) -> f64 {
        self.state()[dim - 2]
    }

    pub fn height(&self, dim: usize) -> f64 {
        self.state()[dim - 1]
    }

    pub(crate) fn predict_in_place(&mut self, model: &IdentityLandmarkModel) {
        self.estimate = model.predict(&self.estimate);
    }

    pub(crate) fn apply_update(&mut self, estimate: StateAndCovariance<f64, Dyn>, t: Time) {
        self.estimate = estimate;
        self.obs_count += 1;
        self.last_seen = t;
        self.ticks_since_seen = 0;
    }

    pub(crate) fn bump_stale(&mut self) {
        self.ticks_since_seen += 1;
    }
}

/// Result of folding a new measurement into a landmark's estimate. `None`
/// means the update was rejected (NaN or non-positive-definite posterior);
/// the landmark is left untouched by the caller in that case.
pub(crate) fn joseph_update(
    prior: &StateAndCovariance<f64, Dyn>,
    observation_model: &IdentityObservationModel,
    measurement: &DVector<f64>,
) -> Option<StateAndCovariance<f64, Dyn>> {
    let h = observation_model.H();
    let ht = observation_model.HT();
    let r = observation_model.R();
    let p = prior.covariance();

    let predicted = observation_model.predict_observation(prior.state());
    let innovation = measurement - predicted;
    let s = h * p * ht + r;
    let s_inv = s.try_inverse()?;
    let k = p * ht * &s_inv;

    let new_state = prior.state() + &k * &innovation;

    let dim = p.nrows();
    let identity = DMatrix::<f64>::identity(dim, dim);
    let i_minus_kh = &identity - &k * h;
    // Joseph form: numerically robust to small errors in K, keeps P symmetric PD.
    let new_cov = &i_minus_kh * p * i_minus_kh.transpose() + &k * r * k.transpose();

    if !is_finite(&new_state) || !is_finite_matrix(&new_cov) || !is_symmetric_pd(&new_cov) {
        return None;
    }
    Some(StateAndCovariance::new(new_state, new_cov))
}

fn is_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn is_finite_matrix(m: &DMatrix<f64>) -> bool {
    m.iter().all(|x| x.is_finite())
}

fn is_symmetric_pd(m: &DMatrix<f64>) -> bool {
    let sym = (m + m.transpose()) * 0.5;
    nalgebra::linalg::Cholesky::new(sym).is_some()
}

/// A dense landmark arena. Slot indices are internal; external code only
/// ever sees [`LandmarkId`]s.
#[derive(Debug, Default)]
pub struct LandmarkArena {
    slots: Vec<Option<Landmark>>,
    free: Vec<usize>,
    next_id: u64,
    index: HashMap<u64, usize>,
}

impl LandmarkArena {
    pub fn new() -> Self {
        Self { slots: Vec::new(), free: Vec::new(), next_id: 0, index: HashMap::new() }
    }

    pub fn insert(&mut self, state: DVector<f64>, covariance: DMatrix<f64>, t: Time) -> LandmarkId {
        let id = LandmarkId(self.next_id);
        self.next_id += 1;
        let landmark = Landmark {
            id,
            estimate: StateAndCovariance::new(state, covariance),
            obs_count: 1,
            last_seen: t,
            ticks_since_seen: 0,
        };
        let slot_idx = if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(landmark);
            slot
        } else {
            self.slots.push(Some(landmark));
            self.slots.len() - 1
        };
        self.index.insert(id.0, slot_idx);
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Landmark> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }

    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        let slot_idx = *self.index.get(&id.0)?;
        self.slots[slot_idx].as_ref()
    }

    pub fn get_mut(&mut self, id: LandmarkId) -> Option<&mut Landmark> {
        let slot_idx = *self.index.get(&id.0)?;
        self.slots[slot_idx].as_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every landmark for which `predicate` returns `true`. Freed
    /// slots are recycled by future `insert` calls; ids are never reused.
    pub fn retain_mut(&mut self, mut keep: impl FnMut(&mut Landmark) -> bool) {
        for (slot_idx, slot) in self.slots.iter_mut().enumerate() {
            let drop_it = match slot {
                Some(landmark) => !keep(landmark),
                None => false,
            };
            if drop_it {
                let id = slot.take().expect("checked Some above").id;
                self.index.remove(&id.0);
                self.free.push(slot_idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(r: &[f64]) -> IdentityObservationModel {
        IdentityObservationModel::new(r)
    }

    #[test]
    fn arena_assigns_monotonic_unique_ids() {
        let mut arena = LandmarkArena::new();
        let a = arena.insert(DVector::from_row_slice(&[0.0, 0.0, 1.0, 1.0]), DMatrix::identity(4, 4), 0.0);
        let b = arena.insert(DVector::from_row_slice(&[1.0, 1.0, 1.0, 1.0]), DMatrix::identity(4, 4), 0.0);
        assert!(b.0 > a.0);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn freed_slot_is_reused_but_id_is_not() {
        let mut arena = LandmarkArena::new();
        let a = arena.insert(DVector::from_row_slice(&[0.0, 0.0, 1.0, 1.0]), DMatrix::identity(4, 4), 0.0);
        arena.retain_mut(|l| l.id != a);
        assert_eq!(arena.len(), 0);
        let b = arena.insert(DVector::from_row_slice(&[2.0, 2.0, 1.0, 1.0]), DMatrix::identity(4, 4), 1.0);
        assert!(b.0 > a.0);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn joseph_update_moves_state_toward_measurement() {
        let prior = StateAndCovariance::new(
            DVector::from_row_slice(&[0.0, 0.0, 1.0, 1.0]),
            DMatrix::<f64>::identity(4, 4),
        );
        let obs_model = model(&[0.01, 0.01, 0.01, 0.01]);
        let measurement = DVector::from_row_slice(&[1.0, 1.0, 1.0, 1.0]);
        let posterior = joseph_update(&prior, &obs_model, &measurement).unwrap();
        assert!(posterior.state()[0] > 0.9);
        assert!(is_symmetric_pd(posterior.covariance()));
    }

    #[test]
    fn joseph_update_rejects_nan_measurement() {
        let prior = StateAndCovariance::new(
            DVector::from_row_slice(&[0.0, 0.0, 1.0, 1.0]),
            DMatrix::<f64>::identity(4, 4),
        );
        let obs_model = model(&[0.01, 0.01, 0.01, 0.01]);
        let measurement = DVector::from_row_slice(&[f64::NAN, 1.0, 1.0, 1.0]);
        assert!(joseph_update(&prior, &obs_model, &measurement).is_none());
    }
}
