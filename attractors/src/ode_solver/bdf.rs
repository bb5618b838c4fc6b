use nalgebra::DMatrix;

use crate::{
    error::{AttractorError, OdeSolverError},
    ode_solver::{
        bdf_state::Diff,
        jacobian_update::{JacobianUpdate, SolverState},
    },
    ode_solver_error,
    op::bdf::BdfCallable,
    BdfConfig, BdfState, Convergence, NewtonNonlinearSolver, NonLinearSolver, OdeSolverConfig,
    OdeSolverMethod, OdeSolverProblem, OdeSolverState, OdeSolverStopReason, SolverStatistics,
    State, StateRef, StateRefMut, VectorField, VectorNorm,
};

fn compute_r(order: usize, factor: f64) -> DMatrix<f64> {
    //computes the R matrix with entries
    //given by the first equation on page 8 of [1]
    //
    //This is used to update the differences matrix when step size h is varied
    //according to factor = h_{n+1} / h_n
    //
    //Note that the U matrix also defined in the same section can be also be
    //found using factor = 1, which corresponds to R with a constant step size
    let n = order + 1;
    let mut r = DMatrix::zeros(n, n);

    // r[0, 0:order] = 1
    for j in 0..n {
        r[(0, j)] = 1.0;
    }

    // r[i, j] = r[i-1, j] * (i - 1 - factor * j) / i
    for j in 1..n {
        let j_t = j as f64;
        for i in 1..n {
            let i_t = i as f64;
            r[(i, j)] = r[(i - 1, j)] * (i_t - 1.0 - factor * j_t) / i_t;
        }
    }
    r
}

/// Implements a Backward Difference formula (BDF) implicit multistep integrator.
///
/// The basic algorithm is derived in \[1\]. This
/// particular implementation follows that implemented in the Matlab routine ode15s
/// described in \[2\] and the SciPy implementation
/// \[3\], which features the NDF formulas for improved
/// stability with associated differences in the error constants, and calculates
/// the jacobian at J(t_{n+1}, y^0_{n+1}). This implementation was based on that
/// implemented in the SciPy library \[3\], which also mainly
/// follows \[2\] but uses the more standard Jacobian update.
///
/// # References
///
/// \[1\] Byrne, G. D., & Hindmarsh, A. C. (1975). A polyalgorithm for the numerical solution of ordinary differential equations. ACM Transactions on Mathematical Software (TOMS), 1(1), 71-96.
/// \[2\] Shampine, L. F., & Reichelt, M. W. (1997). The matlab ode suite. SIAM journal on scientific computing, 18(1), 1-22.
/// \[3\] Virtanen, P., Gommers, R., Oliphant, T. E., Haberland, M., Reddy, T., Cournapeau, D., ... & Van Mulbregt, P. (2020). SciPy 1.0: fundamental algorithms for scientific computing in Python. Nature methods, 17(3), 261-272.
pub struct Bdf<'a, F: VectorField, Nls: NonLinearSolver = NewtonNonlinearSolver> {
    nonlinear_solver: Nls,
    convergence: Convergence,
    ode_problem: &'a OdeSolverProblem<F>,
    op: BdfCallable<'a, F>,
    n_equal_steps: usize,
    y_delta: State,
    y_predict: State,
    t_predict: f64,
    gamma: Vec<f64>,
    alpha: Vec<f64>,
    error_const2: Vec<f64>,
    u: DMatrix<f64>,
    statistics: SolverStatistics,
    state: BdfState,
    tstop: Option<f64>,
    is_state_modified: bool,
    jacobian_update: JacobianUpdate,
    config: BdfConfig,
}

impl<'a, F: VectorField, Nls: NonLinearSolver> Bdf<'a, F, Nls> {
    pub fn new(
        problem: &'a OdeSolverProblem<F>,
        mut state: BdfState,
        mut nonlinear_solver: Nls,
    ) -> Result<Self, AttractorError> {
        if !(state.h.is_finite() && state.h > 0.0) {
            return Err(ode_solver_error!(
                BuilderError,
                format!("Initial step size must be positive, got {}", state.h)
            ));
        }

        // kappa values for difference orders, taken from Table 1 of [1]
        let kappa = [0.0, -0.1850, -1.0 / 9.0, -0.0823, -0.0415, 0.0];
        let mut alpha = vec![0.0];
        let mut gamma = vec![0.0];
        let mut error_const2 = vec![1.0];

        #[allow(clippy::needless_range_loop)]
        for i in 1..=BdfState::MAX_ORDER {
            let i_t = i as f64;
            gamma.push(gamma[i - 1] + 1.0 / i_t);
            alpha.push(1.0 / ((1.0 - kappa[i]) * gamma[i]));
            error_const2.push((kappa[i] * gamma[i] + 1.0 / (i_t + 1.0)).powi(2));
        }

        let config = BdfConfig::default();
        let mut convergence = Convergence::new(problem.rtol, problem.atol);
        convergence.set_max_iter(config.maximum_newton_iterations);

        if !state.diff_initialised {
            state.initialise_diff_to_first_order();
        }

        // setup linear solver for first step
        let op = BdfCallable::new(&problem.eqn);
        let c = state.h * alpha[state.order];
        op.set_c(state.h, alpha[state.order]);
        nonlinear_solver.reset_jacobian(&op, &state.y, state.t);
        let mut jacobian_update = JacobianUpdate::default();
        jacobian_update.update_jacobian(c);
        jacobian_update.update_rhs_jacobian();

        // init U matrix
        let u = compute_r(state.order, 1.0);

        Ok(Self {
            nonlinear_solver,
            convergence,
            ode_problem: problem,
            op,
            n_equal_steps: 0,
            y_delta: State::zeros(),
            y_predict: State::zeros(),
            t_predict: 0.0,
            gamma,
            alpha,
            error_const2,
            u,
            statistics: SolverStatistics::default(),
            state,
            tstop: None,
            is_state_modified: false,
            jacobian_update,
            config,
        })
    }

    fn jacobian_updates(&mut self, c: f64, state: SolverState) {
        if self.jacobian_update.check_rhs_jacobian_update(c, &state) {
            self.op.set_jacobian_is_stale();
            self.nonlinear_solver
                .reset_jacobian(&self.op, &self.state.y, self.state.t);
            self.jacobian_update.update_rhs_jacobian();
            self.jacobian_update.update_jacobian(c);
        } else if self.jacobian_update.check_jacobian_update(c, &state) {
            self.nonlinear_solver
                .reset_jacobian(&self.op, &self.state.y, self.state.t);
            self.jacobian_update.update_jacobian(c);
        }
    }

    fn minimum_timestep(&self) -> f64 {
        self.config
            .minimum_timestep()
            .max(10.0 * f64::EPSILON * self.state.t.abs())
    }

    // change h by `factor`, rescaling D so the differences refer to the new spacing
    fn rescale_step(&mut self, factor: f64) -> f64 {
        //If step size h is changed then also need to update the terms in
        //the first equation of page 9 of [1]:
        //
        //- constant c = h / (1-kappa) gamma_k term
        //- lu factorisation of (I - c * J) used in newton iteration (same equation)
        let new_h = factor * self.state.h;
        self.n_equal_steps = 0;

        // D[0:order+1] = D[0:order+1] * R * U, section 3.2 of [1]
        let order = self.state.order;
        let ru = compute_r(order, factor) * &self.u;
        let updated = self.state.diff.columns(0, order + 1) * ru;
        self.state
            .diff
            .columns_mut(0, order + 1)
            .copy_from(&updated);

        self.op.set_c(new_h, self.alpha[order]);
        self.state.h = new_h;
        new_h
    }

    fn update_step_size(&mut self, factor: f64) -> Result<f64, AttractorError> {
        let new_h = self.rescale_step(factor);

        // if step size too small, then fail
        if new_h.is_nan() || new_h.abs() < self.minimum_timestep() {
            return Err(AttractorError::from(OdeSolverError::StepSizeTooSmall {
                time: self.state.t,
            }));
        }
        Ok(new_h)
    }

    fn update_diff(order: usize, d: &State, diff: &mut Diff) {
        //update of difference equations can be done efficiently
        //by reusing d and D.
        //
        //From first equation on page 4 of [1]:
        //d = y_n - y^0_n = D^{k + 1} y_n
        //
        //Standard backwards difference gives
        //D^{j + 1} y_n = D^{j} y_n - D^{j} y_{n - 1}
        //
        //Combining these gives the following algorithm
        let d_minus_order_plus_one = d - diff.column(order + 1);
        diff.set_column(order + 2, &d_minus_order_plus_one);
        diff.set_column(order + 1, d);
        for i in (0..=order).rev() {
            let updated = diff.column(i) + diff.column(i + 1);
            diff.set_column(i, &updated);
        }
    }

    // predict forward to new step (eq 2 in [1])
    fn predict_forward(&mut self) {
        let state = &self.state;
        self.y_predict = state.diff.columns(0, state.order + 1).column_sum();

        // update psi and c (h, D, y0 has changed)
        self.op.set_psi_and_y0(
            &state.diff,
            self.gamma.as_slice(),
            self.alpha.as_slice(),
            state.order,
            &self.y_predict,
        );

        self.t_predict = state.t + state.h;
    }

    fn handle_tstop(&mut self, tstop: f64) -> Result<Option<OdeSolverStopReason>, AttractorError> {
        // check if the we are at tstop
        let state = &self.state;
        let troundoff = 100.0 * f64::EPSILON * (state.t.abs() + state.h.abs());
        if (state.t - tstop).abs() <= troundoff {
            self.tstop = None;
            return Ok(Some(OdeSolverStopReason::TstopReached));
        } else if tstop < state.t - troundoff {
            let error = OdeSolverError::StopTimeBeforeCurrentTime {
                stop_time: tstop,
                state_time: state.t,
            };
            self.tstop = None;
            return Err(AttractorError::from(error));
        }

        // check if the next step will be beyond tstop, if so adjust the step size
        if state.t + state.h > tstop + troundoff {
            let factor = (tstop - state.t) / state.h;
            // a step that is too small is caught when it is attempted
            self.rescale_step(factor);
        }
        Ok(None)
    }

    fn initialise_to_first_order(&mut self) {
        self.n_equal_steps = 0;
        let state = &mut self.state;
        self.ode_problem
            .eqn
            .call_inplace(&state.y, state.t, &mut state.dy);
        state.initialise_diff_to_first_order();
        self.u = compute_r(1, 1.0);

        let c = self.state.h * self.alpha[1];
        self.op.set_c(self.state.h, self.alpha[1]);
        self.op.set_jacobian_is_stale();
        self.nonlinear_solver
            .reset_jacobian(&self.op, &self.state.y, self.state.t);
        self.jacobian_update.update_rhs_jacobian();
        self.jacobian_update.update_jacobian(c);
        self.is_state_modified = false;
    }

    //interpolate solution at time values t* where t-h < t* < t
    //definition of the interpolating polynomial can be found on page 7 of [1]
    fn interpolate_from_diff(t: f64, diff: &Diff, t1: f64, h: f64, order: usize) -> State {
        let mut time_factor = 1.0;
        let mut y: State = diff.column(0).into_owned();
        for i in 0..order {
            let i_t = i as f64;
            time_factor *= (t - (t1 - h * i_t)) / (h * (1.0 + i_t));
            y += diff.column(i + 1) * time_factor;
        }
        y
    }

    fn error_control(&self) -> f64 {
        let order = self.state.order;
        let atol = &self.ode_problem.atol;
        let rtol = self.ode_problem.rtol;
        self.y_delta.squared_norm(&self.state.y, atol, rtol) * self.error_const2[order]
    }

    fn predict_error_control(&self, order: usize) -> f64 {
        let atol = &self.ode_problem.atol;
        let rtol = self.ode_problem.rtol;
        let d: State = self.state.diff.column(order + 1).into_owned();
        d.squared_norm(&self.state.y, atol, rtol) * self.error_const2[order]
    }

    // optimal step size factor after a rejected step, eq 2.46 of [2]
    fn error_test_factor(&self, safety: f64, error_norm: f64, order: usize) -> f64 {
        let factor = safety * error_norm.powf(-0.5 / (order as f64 + 1.0));
        if factor.is_nan() {
            self.config.minimum_timestep_shrink
        } else {
            factor.max(self.config.minimum_timestep_shrink)
        }
    }
}

impl<'a, F: VectorField + 'a, Nls: NonLinearSolver> OdeSolverMethod<'a, F> for Bdf<'a, F, Nls> {
    type State = BdfState;
    type Config = BdfConfig;

    fn problem(&self) -> &'a OdeSolverProblem<F> {
        self.ode_problem
    }

    fn state(&self) -> StateRef<'_> {
        self.state.as_ref()
    }

    fn state_mut(&mut self) -> StateRefMut<'_> {
        self.is_state_modified = true;
        self.state.as_mut()
    }

    fn into_state(self) -> BdfState {
        self.state
    }

    fn config(&self) -> &BdfConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut BdfConfig {
        &mut self.config
    }

    fn order(&self) -> usize {
        self.state.order
    }

    fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    fn interpolate_inplace(&self, t: f64, y: &mut State) -> Result<(), AttractorError> {
        let state = &self.state;
        if self.is_state_modified {
            if t == state.t {
                *y = state.y;
                return Ok(());
            } else {
                return Err(ode_solver_error!(InterpolationTimeOutsideCurrentStep));
            }
        }
        if t > state.t {
            return Err(ode_solver_error!(InterpolationTimeOutsideCurrentStep));
        }
        *y = Self::interpolate_from_diff(t, &state.diff, state.t, state.h, state.order);
        Ok(())
    }

    fn step(&mut self) -> Result<OdeSolverStopReason, AttractorError> {
        let mut safety: f64;
        let mut error_norm: f64;
        let old_num_error_test_failures = self.statistics.number_of_error_test_failures;
        let mut convergence_fail = false;

        if self.is_state_modified {
            // reinitialise diff matrix
            self.initialise_to_first_order();

            // reinitialise tstop if needed
            if let Some(t_stop) = self.tstop {
                self.set_stop_time(t_stop)?;
            }
        }
        self.convergence
            .set_max_iter(self.config.maximum_newton_iterations);

        self.predict_forward();

        // loop until step is accepted
        loop {
            let order = self.state.order;
            self.y_delta = self.y_predict;

            // solve BDF equation using y0 as starting point
            let solve_result = self.nonlinear_solver.solve_in_place(
                &self.op,
                &mut self.y_delta,
                self.t_predict,
                &self.y_predict,
                &mut self.convergence,
            );
            self.statistics.number_of_nonlinear_solver_iterations += self.convergence.niter();

            if solve_result.is_err() {
                self.statistics.number_of_nonlinear_solver_fails += 1;
                if convergence_fail {
                    // newton iteration did not converge, but jacobian has already been
                    // evaluated so reduce step size by 0.3 (as per [1]) and try again
                    let new_h = self.update_step_size(0.3)?;
                    self.jacobian_updates(
                        new_h * self.alpha[order],
                        SolverState::SecondConvergenceFail,
                    );

                    // new prediction
                    self.predict_forward();
                } else {
                    // newton iteration did not converge, so update jacobian and try again
                    self.jacobian_updates(
                        self.state.h * self.alpha[order],
                        SolverState::FirstConvergenceFail,
                    );
                    convergence_fail = true;
                    // same prediction as last time
                }
                continue;
            }

            // test error is within tolerance
            // combine eq 3, 4 and 6 from [1] to obtain error
            // Note that error = C_k * h^{k+1} y^{k+1}
            // and d = D^{k+1} y_{n+1} \approx h^{k+1} y^{k+1}
            self.y_delta -= self.y_predict;
            error_norm = self.error_control();

            // need to caulate safety even if step is accepted
            let maxiter = self.convergence.max_iter() as f64;
            let niter = self.convergence.niter() as f64;
            safety = 0.9 * (2.0 * maxiter + 1.0) / (2.0 * maxiter + niter);

            // do the error test
            if error_norm <= 1.0 {
                // step is accepted
                break;
            }

            // step is rejected, reduce step size and try again
            let factor = self.error_test_factor(safety, error_norm, order);
            let new_h = self.update_step_size(factor)?;
            self.jacobian_updates(new_h * self.alpha[order], SolverState::ErrorTestFail);

            // new prediction
            self.predict_forward();

            // update statistics
            self.statistics.number_of_error_test_failures += 1;
            if self.statistics.number_of_error_test_failures - old_num_error_test_failures
                >= self.config.maximum_error_test_failures()
            {
                return Err(AttractorError::from(
                    OdeSolverError::TooManyErrorTestFailures { time: self.state.t },
                ));
            }
        }

        // take the accepted step
        Self::update_diff(self.state.order, &self.y_delta, &mut self.state.diff);
        {
            let state = &mut self.state;
            state.y = state.diff.column(0).into_owned();
            state.t = self.t_predict;
            state.dy = state.diff.column(1) / state.h;
        }
        if !self.state.y.all_finite() || !self.state.dy.all_finite() {
            return Err(AttractorError::from(OdeSolverError::NonFiniteState {
                time: self.state.t,
            }));
        }

        // update statistics
        self.statistics.number_of_linear_solver_setups = self.op.number_of_jac_evals();
        self.statistics.number_of_steps += 1;
        self.jacobian_update.step();

        // a change in order is only done after running at order k for k + 1 steps
        // (see page 83 of [2])
        self.n_equal_steps += 1;

        if self.n_equal_steps > self.state.order {
            let order = self.state.order;
            // similar to the optimal step size factor we calculated above for the current
            // order k, we need to calculate the optimal step size factors for orders
            // k-1 and k+1. To do this, we note that the error = C_k * D^{k+1} y_n
            let error_m_norm = if order > 1 {
                self.predict_error_control(order - 1)
            } else {
                f64::INFINITY
            };
            let error_p_norm = if order < BdfState::MAX_ORDER {
                self.predict_error_control(order + 1)
            } else {
                f64::INFINITY
            };

            let factors: Vec<f64> = [error_m_norm, error_norm, error_p_norm]
                .into_iter()
                .enumerate()
                .map(|(i, e)| {
                    let factor = e.powf(-0.5 / (i as f64 + order as f64));
                    if factor.is_nan() {
                        0.0
                    } else {
                        factor
                    }
                })
                .collect();

            // now we have the three factors for orders k-1, k and k+1, pick the maximum in
            // order to maximise the resultant step size
            let max_index = factors
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map_or(1, |(i, _)| i);

            // update order and update the U matrix
            let new_order = match max_index {
                0 => order - 1,
                2 => order + 1,
                _ => order,
            };
            self.state.order = new_order;
            if new_order != order {
                self.u = compute_r(new_order, 1.0);
            }

            let factor = (safety * factors[max_index]).clamp(
                self.config.minimum_timestep_shrink,
                self.config.maximum_timestep_growth,
            );
            if factor >= self.config.minimum_timestep_growth
                || factor < self.config.maximum_timestep_shrink
                || new_order != order
            {
                let new_h = self.update_step_size(factor)?;
                self.jacobian_updates(new_h * self.alpha[new_order], SolverState::StepSuccess);
            }
        }

        if let Some(tstop) = self.tstop {
            if let Some(reason) = self.handle_tstop(tstop)? {
                self.state.t = tstop;
                return Ok(reason);
            }
        }

        // just a normal step, tstop not reached
        Ok(OdeSolverStopReason::InternalTimestep)
    }

    fn set_stop_time(&mut self, tstop: f64) -> Result<(), AttractorError> {
        self.tstop = Some(tstop);
        if let Some(OdeSolverStopReason::TstopReached) = self.handle_tstop(tstop)? {
            let error = OdeSolverError::StopTimeAtCurrentTime;
            self.tstop = None;
            return Err(AttractorError::from(error));
        }
        Ok(())
    }
}
