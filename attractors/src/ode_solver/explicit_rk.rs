use nalgebra::{DMatrix, DVector, Matrix3xX};

use crate::{
    error::{AttractorError, OdeSolverError},
    ode_solver_error, ExplicitRkConfig, OdeSolverConfig, OdeSolverMethod, OdeSolverProblem,
    OdeSolverState, OdeSolverStopReason, RkState, SolverStatistics, State, StateRef, StateRefMut, Tableau,
    VectorField, VectorNorm,
};

/// An explicit Runge-Kutta method.
///
/// The particular method is defined by the [Tableau] used to create the solver, and the `beta`
/// matrix of the tableau is used for dense output.
///
/// Restrictions:
/// - The upper triangular and diagonal parts of the `a` matrix must be zero (i.e. explicit).
/// - The last row of the `a` matrix must be the same as the `b` vector, and the last element of the `c` vector must be 1
///   (first same as last, the final stage gives the derivative at the start of the next step)
pub struct ExplicitRk<'a, F: VectorField> {
    problem: &'a OdeSolverProblem<F>,
    tableau: Tableau,
    state: RkState,
    old_state: RkState,
    // column i holds h * k_i for the current step attempt
    diff: Matrix3xX<f64>,
    tstop: Option<f64>,
    is_state_mutated: bool,
    statistics: SolverStatistics,
    config: ExplicitRkConfig,
}

impl<'a, F: VectorField> ExplicitRk<'a, F> {
    pub fn new(
        problem: &'a OdeSolverProblem<F>,
        state: RkState,
        tableau: Tableau,
    ) -> Result<Self, AttractorError> {
        let s = tableau.s();
        let last = s - 1;
        if tableau.c()[last] != 1.0 || (0..s).any(|j| tableau.a()[(last, j)] != tableau.b()[j]) {
            return Err(ode_solver_error!(
                BuilderError,
                "Explicit Runge-Kutta tableau must have the first same as last property"
            ));
        }
        Ok(Self {
            problem,
            old_state: state.clone(),
            state,
            diff: Matrix3xX::zeros(s),
            tableau,
            tstop: None,
            is_state_mutated: false,
            statistics: SolverStatistics::default(),
            config: ExplicitRkConfig::default(),
        })
    }

    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    fn start_step(&mut self) -> Result<f64, AttractorError> {
        if self.is_state_mutated {
            // the derivative of the first stage is reused, so it must match the new state
            self.problem
                .eqn
                .call_inplace(&self.state.y, self.state.t, &mut self.state.dy);
            if let Some(t_stop) = self.tstop {
                self.set_stop_time(t_stop)?;
            }
            self.is_state_mutated = false;
        }
        Ok(self.state.h)
    }

    fn factor(&self, error_norm: f64) -> f64 {
        if !error_norm.is_finite() {
            return self.config.minimum_timestep_shrink;
        }
        let factor = 0.9 * error_norm.powf(-0.5 / (self.tableau.order() as f64 + 1.0));
        factor.clamp(
            self.config.minimum_timestep_shrink,
            self.config.maximum_timestep_growth,
        )
    }

    fn start_step_attempt(&mut self, h: f64) {
        self.diff.set_column(0, &(self.state.dy * h));
    }

    fn do_stage(&mut self, i: usize, h: f64) {
        let t = self.state.t + self.tableau.c()[i] * h;
        let a = self.tableau.a();
        let mut y = self.state.y;
        for j in 0..i {
            y += self.diff.column(j) * a[(i, j)];
        }
        self.old_state.y = y;
        self.problem
            .eqn
            .call_inplace(&self.old_state.y, t, &mut self.old_state.dy);
        self.diff.set_column(i, &(self.old_state.dy * h));
    }

    fn error_norm(&self) -> f64 {
        let error: State = &self.diff * self.tableau.d();
        error.squared_norm(&self.state.y, &self.problem.atol, self.problem.rtol)
    }

    fn minimum_timestep(&self) -> f64 {
        self.config
            .minimum_timestep()
            .max(10.0 * f64::EPSILON * self.state.t.abs())
    }

    fn error_test_fail(&mut self, h: f64, nattempts: usize) -> Result<(), AttractorError> {
        self.statistics.number_of_error_test_failures += 1;
        // if too many error test failures, then fail
        if nattempts >= self.config.maximum_error_test_failures() {
            return Err(AttractorError::from(
                OdeSolverError::TooManyErrorTestFailures { time: self.state.t },
            ));
        }
        // if step size too small, then fail
        if h.abs() < self.minimum_timestep() {
            return Err(AttractorError::from(OdeSolverError::StepSizeTooSmall {
                time: self.state.t,
            }));
        }
        Ok(())
    }

    fn handle_tstop(&mut self, tstop: f64) -> Result<Option<OdeSolverStopReason>, AttractorError> {
        let state = &mut self.state;
        // check if the we are at tstop
        let troundoff = 100.0 * f64::EPSILON * (state.t.abs() + state.h.abs());
        if (state.t - tstop).abs() <= troundoff {
            return Ok(Some(OdeSolverStopReason::TstopReached));
        } else if tstop < state.t - troundoff {
            return Err(AttractorError::from(
                OdeSolverError::StopTimeBeforeCurrentTime {
                    stop_time: tstop,
                    state_time: state.t,
                },
            ));
        }

        // check if the next step will be beyond tstop, if so adjust the step size
        if state.t + state.h > tstop + troundoff {
            state.h = tstop - state.t;
        }
        Ok(None)
    }

    fn step_accepted(&mut self, h: f64, new_h: f64) -> Result<OdeSolverStopReason, AttractorError> {
        // the last stage left y(t + h) and f(y(t + h)) in old_state
        self.old_state.t = self.state.t + h;
        self.old_state.h = new_h;
        std::mem::swap(&mut self.old_state, &mut self.state);
        self.statistics.number_of_steps += 1;

        if !self.state.y.all_finite() || !self.state.dy.all_finite() {
            return Err(AttractorError::from(OdeSolverError::NonFiniteState {
                time: self.old_state.t,
            }));
        }

        if let Some(tstop) = self.tstop {
            if let Some(OdeSolverStopReason::TstopReached) = self.handle_tstop(tstop)? {
                self.state.t = tstop;
                self.tstop = None;
                return Ok(OdeSolverStopReason::TstopReached);
            }
        }
        Ok(OdeSolverStopReason::InternalTimestep)
    }

    fn interpolate_beta_function(theta: f64, beta: &DMatrix<f64>) -> DVector<f64> {
        let poly_order = beta.ncols();
        let mut thetav = Vec::with_capacity(poly_order);
        thetav.push(theta);
        for i in 1..poly_order {
            thetav.push(theta * thetav[i - 1]);
        }
        beta * DVector::from_vec(thetav)
    }
}

impl<'a, F: VectorField + 'a> OdeSolverMethod<'a, F> for ExplicitRk<'a, F> {
    type State = RkState;
    type Config = ExplicitRkConfig;

    fn problem(&self) -> &'a OdeSolverProblem<F> {
        self.problem
    }

    fn state(&self) -> StateRef<'_> {
        self.state.as_ref()
    }

    fn state_mut(&mut self) -> StateRefMut<'_> {
        self.is_state_mutated = true;
        self.state.as_mut()
    }

    fn into_state(self) -> RkState {
        self.state
    }

    fn config(&self) -> &ExplicitRkConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ExplicitRkConfig {
        &mut self.config
    }

    fn order(&self) -> usize {
        self.tableau.order()
    }

    fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    fn step(&mut self) -> Result<OdeSolverStopReason, AttractorError> {
        let mut h = self.start_step()?;

        // loop until step is accepted
        let mut nattempts = 0;
        let factor = loop {
            self.start_step_attempt(h);
            for i in 1..self.tableau.s() {
                self.do_stage(i, h);
            }
            let error_norm = self.error_norm();
            let factor = self.factor(error_norm);
            if error_norm < 1.0 {
                break factor;
            }
            h *= factor;
            nattempts += 1;
            self.error_test_fail(h, nattempts)?;
        };
        self.step_accepted(h, h * factor)
    }

    fn set_stop_time(&mut self, tstop: f64) -> Result<(), AttractorError> {
        self.tstop = Some(tstop);
        if let Some(OdeSolverStopReason::TstopReached) = self.handle_tstop(tstop)? {
            self.tstop = None;
            return Err(ode_solver_error!(StopTimeAtCurrentTime));
        }
        Ok(())
    }

    fn interpolate_inplace(&self, t: f64, y: &mut State) -> Result<(), AttractorError> {
        if self.is_state_mutated {
            if t == self.state.t {
                *y = self.state.y;
                return Ok(());
            } else {
                return Err(ode_solver_error!(InterpolationTimeOutsideCurrentStep));
            }
        }

        // check that t is within the current step
        if t > self.state.t || t < self.old_state.t {
            return Err(ode_solver_error!(InterpolationTimeOutsideCurrentStep));
        }

        let dt = self.state.t - self.old_state.t;
        let theta = if dt == 0.0 {
            1.0
        } else {
            (t - self.old_state.t) / dt
        };
        let beta_f = Self::interpolate_beta_function(theta, self.tableau.beta());
        *y = self.old_state.y + &self.diff * beta_f;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{
        ode_solver::{
            test_models::exponential_decay::{exponential_decay, exponential_decay_problem},
            tests::{test_config, test_interpolate, test_ode_solver, test_state_mut},
        },
        OdeBuilder, OdeSolverMethod, State, Tableau, VectorField,
    };

    #[test]
    fn explicit_rk_state_mut() {
        let (problem, _soln) = exponential_decay_problem(0.1);
        test_state_mut(problem.tsit45().unwrap());
    }

    #[test]
    fn explicit_rk_config() {
        let (mut problem, _soln) = exponential_decay_problem(1000.0);
        problem.h0 = Some(1.0);
        test_config(problem.tsit45().unwrap());
    }

    #[test]
    fn explicit_rk_test_interpolate() {
        let (problem, _soln) = exponential_decay_problem(0.1);
        test_interpolate(problem.tsit45().unwrap());
    }

    #[test]
    fn test_tsit45_exponential_decay() {
        let (problem, soln) = exponential_decay_problem(0.1);
        let mut s = problem.tsit45().unwrap();
        test_ode_solver(&mut s, soln, false);
        let stats = s.statistics();
        assert!(stats.number_of_steps > 0);
        assert_eq!(stats.number_of_linear_solver_setups, 0);
        assert_eq!(stats.number_of_nonlinear_solver_iterations, 0);
        // FSAL: six new evaluations per attempt, plus the initial derivative and the
        // trial evaluation of the initial step estimate
        let attempts = stats.number_of_steps + stats.number_of_error_test_failures;
        assert_eq!(
            problem.eqn.statistics().number_of_calls,
            6 * attempts + 2
        );
    }

    #[test]
    fn test_tstop_tsit45() {
        let (problem, soln) = exponential_decay_problem(0.1);
        let mut s = problem.tsit45().unwrap();
        test_ode_solver(&mut s, soln, true);
    }

    #[test]
    fn test_param_sweep_tsit45() {
        let mut old_soln: Option<State> = None;
        for a in (1..6).map(|i| 0.1 * f64::from(i)) {
            let problem = OdeBuilder::new()
                .init(State::new(1.0, 2.0, 3.0))
                .build(exponential_decay(a))
                .unwrap();
            let mut s = problem.tsit45().unwrap();
            let (ys, ts) = s.solve(10.0).unwrap();
            assert_eq!(ts.last().copied(), Some(10.0));
            let new_soln = *ys.last().unwrap();
            if let Some(old_soln) = old_soln {
                assert!((new_soln - old_soln).norm() > 1e-6);
            }
            old_soln = Some(new_soln);
        }
    }

    #[test]
    fn tsit45_rejects_non_fsal_tableau() {
        let (problem, _soln) = exponential_decay_problem(0.1);
        let t = Tableau::tsit45();
        let mut c = t.c().clone();
        c[6] = 0.5;
        let mut a = t.a().clone();
        a[(6, 0)] = 0.0;
        let tableau = Tableau::new(a, t.b().clone(), c, t.d().clone(), 4, t.beta().clone());
        let tableau = tableau.unwrap();
        let state = problem.rk_state(&tableau).unwrap();
        assert!(problem.explicit_rk_solver(state, tableau).is_err());
    }
}
