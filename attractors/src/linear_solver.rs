use nalgebra::U3;

use crate::{
    error::{AttractorError, LinearSolverError},
    linear_solver_error, Jacobian, State, VectorField,
};

/// A linear solver for the 3x3 systems `J x = b` arising in the Newton iteration, using the LU
/// decomposition in the [`nalgebra` library](https://nalgebra.org/).
#[derive(Clone)]
pub struct LU {
    matrix: Jacobian,
    lu: Option<nalgebra::LU<f64, U3, U3>>,
}

impl Default for LU {
    fn default() -> Self {
        Self {
            matrix: Jacobian::zeros(),
            lu: None,
        }
    }
}

impl LU {
    /// Evaluate the Jacobian of `op` at `(x, t)` and factorise it.
    pub fn set_linearisation<C: VectorField>(&mut self, op: &C, x: &State, t: f64) {
        op.jacobian_inplace(x, t, &mut self.matrix);
        self.lu = Some(self.matrix.lu());
    }

    /// The matrix that was last factorised.
    pub fn matrix(&self) -> &Jacobian {
        &self.matrix
    }

    /// Solve `J x = b` in place, `b` is given in `state` and overwritten with `x`.
    pub fn solve_in_place(&self, state: &mut State) -> Result<(), AttractorError> {
        let lu = self
            .lu
            .as_ref()
            .ok_or(linear_solver_error!(LuNotInitialized))?;
        match lu.solve_mut(state) {
            true => Ok(()),
            false => Err(linear_solver_error!(SingularMatrix)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Closure;

    #[test]
    fn solves_linearised_system() {
        // f(x) = A x, so J = A
        let a = Jacobian::new(2.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 4.0);
        let op = Closure::new(
            move |x: &State, _t: f64, y: &mut State| y.copy_from(&(a * x)),
            move |_x: &State, _t: f64, j: &mut Jacobian| j.copy_from(&a),
        );
        let mut ls = LU::default();
        ls.set_linearisation(&op, &State::zeros(), 0.0);
        let expect = State::new(1.0, -2.0, 0.5);
        let mut b = a * expect;
        ls.solve_in_place(&mut b).unwrap();
        assert!((b - expect).norm() < 1e-12);
    }

    #[test]
    fn solve_before_factorisation_fails() {
        let ls = LU::default();
        let mut b = State::new(1.0, 1.0, 1.0);
        assert!(matches!(
            ls.solve_in_place(&mut b),
            Err(AttractorError::LinearSolverError(
                LinearSolverError::LuNotInitialized
            ))
        ));
    }

    #[test]
    fn singular_matrix_is_reported() {
        let op = Closure::new(
            |_x: &State, _t: f64, y: &mut State| y.fill(0.0),
            |_x: &State, _t: f64, j: &mut Jacobian| j.fill(0.0),
        );
        let mut ls = LU::default();
        ls.set_linearisation(&op, &State::zeros(), 0.0);
        let mut b = State::new(1.0, 1.0, 1.0);
        assert!(ls.solve_in_place(&mut b).is_err());
    }
}
