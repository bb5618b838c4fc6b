use crate::{
    error::AttractorError, linear_solver::LU, non_linear_solver_error, Convergence,
    ConvergenceStatus, NonLinearSolver, NonLinearSolverError, State, VectorField, VectorNorm,
};

pub fn newton_iteration(
    xn: &mut State,
    tmp: &mut State,
    error_y: &State,
    fun: impl Fn(&State, &mut State),
    linear_solver: impl Fn(&mut State) -> Result<(), AttractorError>,
    convergence: &mut Convergence,
) -> Result<(), AttractorError> {
    convergence.reset();
    loop {
        fun(xn, tmp);
        //tmp = f_at_n

        linear_solver(tmp)?;
        //tmp = -delta_n

        *xn -= *tmp;
        // xn = xn + delta_n

        if !xn.all_finite() {
            break;
        }

        match convergence.check_new_iteration(tmp, error_y) {
            ConvergenceStatus::Continue => continue,
            ConvergenceStatus::Converged => return Ok(()),
            ConvergenceStatus::Diverged => break,
            ConvergenceStatus::MaximumIterations => break,
        }
    }
    Err(non_linear_solver_error!(NewtonDidNotConverge))
}

/// Newton's method with a frozen (modified Newton) Jacobian, refreshed only on [NonLinearSolver::reset_jacobian].
#[derive(Clone)]
pub struct NewtonNonlinearSolver {
    linear_solver: LU,
    is_jacobian_set: bool,
    tmp: State,
}

impl NewtonNonlinearSolver {
    pub fn new(linear_solver: LU) -> Self {
        Self {
            linear_solver,
            is_jacobian_set: false,
            tmp: State::zeros(),
        }
    }
    pub fn linear_solver(&self) -> &LU {
        &self.linear_solver
    }
}

impl Default for NewtonNonlinearSolver {
    fn default() -> Self {
        Self::new(LU::default())
    }
}

impl NonLinearSolver for NewtonNonlinearSolver {
    fn clear_jacobian(&mut self) {
        self.is_jacobian_set = false;
    }

    fn is_jacobian_set(&self) -> bool {
        self.is_jacobian_set
    }

    fn reset_jacobian<C: VectorField>(&mut self, op: &C, x: &State, t: f64) {
        self.linear_solver.set_linearisation(op, x, t);
        self.is_jacobian_set = true;
    }

    fn solve_linearised_in_place(&self, x: &mut State) -> Result<(), AttractorError> {
        self.linear_solver.solve_in_place(x)
    }

    fn solve_in_place<C: VectorField>(
        &mut self,
        op: &C,
        xn: &mut State,
        t: f64,
        error_y: &State,
        convergence: &mut Convergence,
    ) -> Result<(), AttractorError> {
        if !self.is_jacobian_set {
            return Err(non_linear_solver_error!(JacobianNotReset));
        }
        let linear_solver = |x: &mut State| self.linear_solver.solve_in_place(x);
        let fun = |x: &State, y: &mut State| op.call_inplace(x, t, y);
        newton_iteration(xn, &mut self.tmp, error_y, fun, linear_solver, convergence)
    }
}
