use nalgebra::{DMatrix, DVector, Dyn};

use adskalman::TransitionModelLinearNoControl;

/// Static-landmark motion model: `A = I`, so the mean never moves and the
/// covariance simply grows by the per-tick process noise `Q`.
///
/// The state vector is `[x, y, (z), w, h]`, dimension fixed at construction
/// time (4 or 5, per the mapper's `dim` config) but not known at compile
/// time, hence the `Dyn` dimension instead of a `U4`/`U5` type parameter.
#[derive(Debug, Clone)]
pub struct IdentityLandmarkModel {
    transition_model: DMatrix<f64>,
    transition_model_transpose: DMatrix<f64>,
    transition_noise_covariance: DMatrix<f64>,
}

impl IdentityLandmarkModel {
    /// `q_diag` is the per-tick process noise diagonal, one entry per state
    /// dimension (already scaled by whatever `dt` convention the caller
    /// uses; the mapper calls this once per `predict` with `Q * dt`).
    pub fn new(q_diag: &[f64]) -> Self {
        let dim = q_diag.len();
        let transition_model = DMatrix::<f64>::identity(dim, dim);
        let transition_model_transpose = transition_model.transpose();
        let transition_noise_covariance = DMatrix::from_diagonal(&DVector::from_row_slice(q_diag));
        Self {
            transition_model,
            transition_model_transpose,
            transition_noise_covariance,
        }
    }

    pub fn dim(&self) -> usize {
        self.transition_model.nrows()
    }
}

impl TransitionModelLinearNoControl<f64, Dyn> for IdentityLandmarkModel {
    fn F(&self) -> &DMatrix<f64> {
        &self.transition_model
    }
    fn FT(&self) -> &DMatrix<f64> {
        &self.transition_model_transpose
    }
    fn Q(&self) -> &DMatrix<f64> {
        &self.transition_noise_covariance
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use adskalman::StateAndCovariance;
    use approx::assert_relative_eq;

    #[test]
    fn predict_holds_mean_and_grows_covariance() {
        let model = IdentityLandmarkModel::new(&[0.1, 0.1, 0.01, 0.02]);
        let state = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);
        let covar = DMatrix::<f64>::identity(4, 4);
        let prior = StateAndCovariance::new(state.clone(), covar);

        let posterior = model.predict(&prior);

        assert_relative_eq!(posterior.state(), &state);
        assert_relative_eq!(posterior.covariance()[(0, 0)], 1.1);
        assert_relative_eq!(posterior.covariance()[(2, 2)], 1.01);
    }

    #[test]
    fn repeated_predicts_accumulate_linearly() {
        let model = IdentityLandmarkModel::new(&[0.2, 0.2, 0.05, 0.05]);
        let state = DVector::from_row_slice(&[0.0, 0.0, 1.0, 1.0]);
        let covar = DMatrix::<f64>::zeros(4, 4);
        let mut est = StateAndCovariance::new(state, covar);
        for _ in 0..3 {
            est = model.predict(&est);
        }
        assert_relative_eq!(est.covariance()[(0, 0)], 0.6, epsilon = 1e-12);
    }
}
