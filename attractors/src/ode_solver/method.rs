use serde::Serialize;

use crate::{
    error::{AttractorError, OdeSolverError},
    ode_solver_error, OdeSolverConfig, OdeSolverProblem, OdeSolverState, State, StateRef,
    StateRefMut, VectorField,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OdeSolverStopReason {
    InternalTimestep,
    TstopReached,
}

/// Step counters kept by every solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SolverStatistics {
    pub number_of_linear_solver_setups: usize,
    pub number_of_steps: usize,
    pub number_of_error_test_failures: usize,
    pub number_of_nonlinear_solver_iterations: usize,
    pub number_of_nonlinear_solver_fails: usize,
}

/// Trait for ODE solver methods. This is the main user interface for the ODE solvers.
///
/// The solver owns its state and borrows the problem. It is responsible for stepping the solution
/// forward, and interpolating the solution within the last step.
///
/// # Example
///
/// ```
/// use attractors::{OdeSolverMethod, State, VectorField};
///
/// fn solve_ode<'a, F: VectorField + 'a>(solver: &mut impl OdeSolverMethod<'a, F>, t: f64) -> State {
///     while solver.state().t <= t {
///         solver.step().unwrap();
///     }
///     solver.interpolate(t).unwrap()
/// }
/// ```
pub trait OdeSolverMethod<'a, F>
where
    Self: Sized,
    F: VectorField + 'a,
{
    /// The state type used by the solver
    type State: OdeSolverState;

    /// The configuration type used by the solver
    type Config: OdeSolverConfig;

    /// Get the current problem
    fn problem(&self) -> &'a OdeSolverProblem<F>;

    /// Get the current state of the solver
    fn state(&self) -> StateRef<'_>;

    /// Get a mutable reference to the current state of the solver.
    /// Note that calling this will cause the next call to `step` to perform some reinitialisation to take into
    /// account the mutated state, this could be expensive for multi-step methods.
    fn state_mut(&mut self) -> StateRefMut<'_>;

    /// Consume the solver, returning its state.
    fn into_state(self) -> Self::State;

    fn config(&self) -> &Self::Config;

    fn config_mut(&mut self) -> &mut Self::Config;

    /// Order of the method for the current step.
    fn order(&self) -> usize;

    fn statistics(&self) -> &SolverStatistics;

    /// Step the solution forward by one step, altering the internal state of the solver.
    /// The return value is a `Result` containing the reason for stopping the solver, possible reasons are:
    /// - `InternalTimestep`: The solver has taken a step forward in time, the internal state of the solver is at time self.state().t
    /// - `TstopReached`: The solver has reached the stop time set by [Self::set_stop_time], the internal state of the solver is at time `tstop`, which is the same as `self.state().t`
    fn step(&mut self) -> Result<OdeSolverStopReason, AttractorError>;

    /// Set a stop time for the solver. The solver will stop when the internal time reaches this time.
    /// Once it stops, the stop time is unset. If `tstop` is at or before the current internal time, an error is returned.
    fn set_stop_time(&mut self, tstop: f64) -> Result<(), AttractorError>;

    /// Interpolate the solution at a given time. This time should be between the current time and the last solver time step
    fn interpolate(&self, t: f64) -> Result<State, AttractorError> {
        let mut y = State::zeros();
        self.interpolate_inplace(t, &mut y)?;
        Ok(y)
    }

    /// Interpolate the solution at a given time and place in `y`. This time should be between the current time and the last solver time step
    fn interpolate_inplace(&self, t: f64, y: &mut State) -> Result<(), AttractorError>;

    /// Using the provided state, solve the problem up to time `final_time`.
    /// Returns the solution at every internal step together with the step times,
    /// the final entry is at `final_time`.
    #[allow(clippy::type_complexity)]
    fn solve(&mut self, final_time: f64) -> Result<(Vec<State>, Vec<f64>), AttractorError> {
        let mut ret_y = vec![*self.state().y];
        let mut ret_t = vec![self.state().t];
        self.set_stop_time(final_time)?;
        loop {
            let reason = self.step()?;
            ret_y.push(*self.state().y);
            ret_t.push(self.state().t);
            if reason == OdeSolverStopReason::TstopReached {
                break;
            }
        }
        Ok((ret_y, ret_t))
    }

    /// Using the provided state, solve the problem up to time `t_eval[t_eval.len()-1]`.
    /// Returns the solution at each time in `t_eval`, one state per time.
    fn solve_dense(&mut self, t_eval: &[f64]) -> Result<Vec<State>, AttractorError> {
        let mut ret = Vec::with_capacity(t_eval.len());
        self.solve_dense_into(t_eval, &mut ret)?;
        Ok(ret)
    }

    /// Like [Self::solve_dense], but appends into `ret` as the integration proceeds.
    /// If an error is returned, `ret` holds the solution at every time in `t_eval` reached before the failure.
    /// When the failure is a divergence, the output of the last accepted step is discarded as well, so
    /// `ret` stops at or before the start of that step.
    fn solve_dense_into(
        &mut self,
        t_eval: &[f64],
        ret: &mut Vec<State>,
    ) -> Result<(), AttractorError> {
        let (Some(&first), Some(&last)) = (t_eval.first(), t_eval.last()) else {
            return Ok(());
        };
        if first < self.state().t || t_eval.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ode_solver_error!(InvalidTEval));
        }

        if last > self.state().t {
            self.set_stop_time(last)?;
        }
        let base = ret.len();
        let mut last_step_start = self.state().t;
        for &t in t_eval {
            while self.state().t < t {
                let step_start = self.state().t;
                let reason = match self.step() {
                    Ok(reason) => reason,
                    Err(err) => {
                        if err.divergence_time().is_some() {
                            // a step can cross a singularity with finite values before the failure shows
                            let kept = t_eval[..ret.len() - base]
                                .iter()
                                .take_while(|&&te| te <= last_step_start)
                                .count();
                            ret.truncate(base + kept);
                        }
                        return Err(err);
                    }
                };
                last_step_start = step_start;
                if reason == OdeSolverStopReason::TstopReached {
                    break;
                }
            }
            if t == self.state().t {
                ret.push(*self.state().y);
            } else {
                ret.push(self.interpolate(t)?);
            }
        }
        Ok(())
    }
}
