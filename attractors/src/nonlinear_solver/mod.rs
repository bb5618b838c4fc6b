use crate::{error::AttractorError, State, VectorField};
use convergence::Convergence;

/// A solver for the nonlinear problem `F(x) = 0`.
pub trait NonLinearSolver: Default {
    fn is_jacobian_set(&self) -> bool;

    /// Reset the approximation of the Jacobian matrix.
    fn reset_jacobian<C: VectorField>(&mut self, op: &C, x: &State, t: f64);

    /// Clear the approximation of the Jacobian matrix.
    fn clear_jacobian(&mut self);

    // Solve the problem `F(x, t) = 0` for fixed t, and return the solution `x`.
    fn solve<C: VectorField>(
        &mut self,
        op: &C,
        x: &State,
        t: f64,
        error_y: &State,
        convergence: &mut Convergence,
    ) -> Result<State, AttractorError> {
        let mut x = *x;
        self.solve_in_place(op, &mut x, t, error_y, convergence)?;
        Ok(x)
    }

    /// Solve the problem `F(x) = 0` in place.
    fn solve_in_place<C: VectorField>(
        &mut self,
        op: &C,
        x: &mut State,
        t: f64,
        error_y: &State,
        convergence: &mut Convergence,
    ) -> Result<(), AttractorError>;

    /// Solve the linearised problem `J * x = b`, where `J` was calculated using [Self::reset_jacobian].
    /// The input `b` is provided in `x`, and the solution is returned in `x`.
    fn solve_linearised_in_place(&self, x: &mut State) -> Result<(), AttractorError>;
}

pub mod convergence;
pub mod newton;
