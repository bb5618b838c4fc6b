use crate::{
    error::{AttractorError, OdeSolverError},
    OdeSolverProblem, State, VectorField, VectorNorm,
};

/// A state holding those variables that are common to all ODE solver states,
/// can be used to create a new state for a specific solver.
pub struct StateCommon {
    pub y: State,
    pub dy: State,
    pub t: f64,
    pub h: f64,
}

/// A reference to the state of the ODE solver, containing:
/// - the current solution `y`
/// - the derivative of the solution wrt time `dy`
/// - the current time `t`
/// - the current step size `h`
pub struct StateRef<'a> {
    pub y: &'a State,
    pub dy: &'a State,
    pub t: f64,
    pub h: f64,
}

/// A mutable reference to the state of the ODE solver, see [StateRef].
pub struct StateRefMut<'a> {
    pub y: &'a mut State,
    pub dy: &'a mut State,
    pub t: &'a mut f64,
    pub h: &'a mut f64,
}

/// State for the ODE solver, containing the current solution `y`, its time derivative `dy`,
/// the current time `t` and the step size `h` to attempt next.
pub trait OdeSolverState: Clone + Sized {
    fn as_ref(&self) -> StateRef<'_>;
    fn as_mut(&mut self) -> StateRefMut<'_>;
    fn into_common(self) -> StateCommon;
    fn new_from_common(state: StateCommon) -> Self;

    /// Create a new solver state from an ODE problem.
    /// The initial step size is taken from the problem if given, otherwise it is estimated
    /// for a method of order `solver_order` using [Self::set_step_size].
    fn new<F: VectorField>(
        ode_problem: &OdeSolverProblem<F>,
        solver_order: usize,
    ) -> Result<Self, AttractorError> {
        let mut ret = Self::new_without_initialise(ode_problem)?;
        match ode_problem.h0 {
            Some(h0) => *ret.as_mut().h = h0,
            None => ret.set_step_size(
                &ode_problem.atol,
                ode_problem.rtol,
                &ode_problem.eqn,
                solver_order,
            ),
        }
        Ok(ret)
    }

    /// Create a new solver state from an ODE problem, only setting `y`, `dy` and `t`.
    fn new_without_initialise<F: VectorField>(
        ode_problem: &OdeSolverProblem<F>,
    ) -> Result<Self, AttractorError> {
        let t = ode_problem.t0;
        let y = ode_problem.y0;
        let dy = ode_problem.eqn.call(&y, t);
        if !y.all_finite() || !dy.all_finite() {
            return Err(AttractorError::from(OdeSolverError::NonFiniteState {
                time: t,
            }));
        }
        let state = StateCommon { y, dy, t, h: 1.0 };
        Ok(Self::new_from_common(state))
    }

    /// compute size of first step based on alg in Hairer, Norsett, Wanner
    /// Solving Ordinary Differential Equations I, Nonstiff Problems
    /// Section II.4.2
    fn set_step_size<F: VectorField>(
        &mut self,
        atol: &State,
        rtol: f64,
        eqn: &F,
        solver_order: usize,
    ) {
        let (h0, h1) = {
            let state = self.as_ref();
            let y0 = state.y;
            let t0 = state.t;
            let f0 = state.dy;

            let d0 = y0.squared_norm(y0, atol, rtol).sqrt();
            let d1 = f0.squared_norm(y0, atol, rtol).sqrt();

            let h0 = if d0 < 1e-5 || d1 < 1e-5 {
                1e-6
            } else {
                0.01 * (d0 / d1)
            };

            let y1 = y0 + f0 * h0;
            let f1 = eqn.call(&y1, t0 + h0);
            let d2 = (f1 - f0).squared_norm(y0, atol, rtol).sqrt() / h0;

            let max_d = d1.max(d2);
            let h1 = if max_d < 1e-15 {
                (h0 * 1e-3).max(1e-6)
            } else {
                (0.01 / max_d).powf(1.0 / (1.0 + solver_order as f64))
            };
            (h0, h1)
        };

        *self.as_mut().h = (100.0 * h0).min(h1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ode_solver::test_models::exponential_decay::exponential_decay_problem, RkState};

    #[test]
    fn initial_step_is_positive_and_bounded() {
        let (problem, _soln) = exponential_decay_problem(0.1);
        let state = RkState::new(&problem, 4).unwrap();
        let h = state.as_ref().h;
        assert!(h > 0.0 && h <= 100.0 * 0.01 * 1.0 / 0.1);
        assert_eq!(state.as_ref().t, 0.0);
        assert_eq!(*state.as_ref().y, problem.y0);
    }

    #[test]
    fn explicit_initial_step_is_used() {
        let (mut problem, _soln) = exponential_decay_problem(0.1);
        problem.h0 = Some(0.25);
        let state = RkState::new(&problem, 4).unwrap();
        assert_eq!(state.as_ref().h, 0.25);
    }
}
