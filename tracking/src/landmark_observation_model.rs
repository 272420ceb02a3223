use nalgebra::{DMatrix, DVector, Dyn};

use adskalman::ObservationModel;

/// Direct (`H = I`) observation of a landmark's full state: a detection,
/// once transformed into the odometric frame, observes `[x, y, (z), w, h]`
/// verbatim.
#[derive(Debug, Clone)]
pub struct IdentityObservationModel {
    observation_matrix: DMatrix<f64>,
    observation_matrix_transpose: DMatrix<f64>,
    observation_noise_covariance: DMatrix<f64>,
}

impl IdentityObservationModel {
    pub fn new(r_diag: &[f64]) -> Self {
        let dim = r_diag.len();
        let observation_matrix = DMatrix::<f64>::identity(dim, dim);
        let observation_matrix_transpose = observation_matrix.transpose();
        let observation_noise_covariance = DMatrix::from_diagonal(&DVector::from_row_slice(r_diag));
        Self {
            observation_matrix,
            observation_matrix_transpose,
            observation_noise_covariance,
        }
    }

    /// Build from a dense, possibly non-diagonal, per-detection covariance
    /// supplied by the detector, rather than the mapper's default `R_el`.
    pub fn from_covariance(covariance: DMatrix<f64>) -> Self {
        let dim = covariance.nrows();
        let observation_matrix = DMatrix::<f64>::identity(dim, dim);
        let observation_matrix_transpose = observation_matrix.transpose();
        Self {
            observation_matrix,
            observation_matrix_transpose,
            observation_noise_covariance: covariance,
        }
    }
}

impl ObservationModel<f64, Dyn, Dyn> for IdentityObservationModel {
    fn H(&self) -> &DMatrix<f64> {
        &self.observation_matrix
    }
    fn HT(&self) -> &DMatrix<f64> {
        &self.observation_matrix_transpose
    }
    fn R(&self) -> &DMatrix<f64> {
        &self.observation_noise_covariance
    }
    fn predict_observation(&self, state: &DVector<f64>) -> DVector<f64> {
        &self.observation_matrix * state
    }
}
