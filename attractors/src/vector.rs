use nalgebra::{Matrix3, Vector3};

/// A point in the three dimensional phase space of an attractor, `(x, y, z)`.
pub type State = Vector3<f64>;

/// Dense Jacobian `df/dy` of a three dimensional vector field.
pub type Jacobian = Matrix3<f64>;

/// Norms used by the solvers for error and convergence control.
pub trait VectorNorm {
    /// Mean of the squared components of `self`, each scaled by `atol_i + rtol * |y_i|`.
    fn squared_norm(&self, y: &State, atol: &State, rtol: f64) -> f64;

    /// true if every component is neither NaN nor infinite
    fn all_finite(&self) -> bool;
}

impl VectorNorm for State {
    fn squared_norm(&self, y: &State, atol: &State, rtol: f64) -> f64 {
        let mut acc = 0.0;
        for i in 0..3 {
            let scale = atol[i] + rtol * y[i].abs();
            let e = self[i] / scale;
            acc += e * e;
        }
        acc / 3.0
    }

    fn all_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }
}
