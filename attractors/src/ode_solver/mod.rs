pub mod bdf;
pub mod bdf_state;
pub mod builder;
pub mod config;
pub mod explicit_rk;
pub mod jacobian_update;
pub mod method;
pub mod problem;
pub mod rk_state;
pub mod state;
pub mod tableau;

#[cfg(test)]
pub mod test_models;

#[cfg(test)]
mod tests {
    use super::test_models::{exponential_decay::exponential_decay_problem, OdeSolverSolution};

    use crate::error::{AttractorError, OdeSolverError};
    use crate::{
        OdeSolverConfig, OdeSolverMethod, OdeSolverStopReason, State, VectorField, VectorNorm,
    };

    pub fn test_ode_solver<'a, F, Method>(
        method: &mut Method,
        solution: OdeSolverSolution,
        use_tstop: bool,
    ) -> State
    where
        F: VectorField + 'a,
        Method: OdeSolverMethod<'a, F>,
    {
        for point in solution.solution_points.iter() {
            let soln = if use_tstop {
                match method.set_stop_time(point.t) {
                    Ok(_) => loop {
                        if let OdeSolverStopReason::TstopReached = method.step().unwrap() {
                            assert_eq!(method.state().t, point.t);
                            break *method.state().y;
                        }
                    },
                    Err(_) => *method.state().y,
                }
            } else {
                while method.state().t < point.t {
                    method.step().unwrap();
                }
                method.interpolate(point.t).unwrap()
            };
            let error = soln - point.state;
            let error_norm = error
                .squared_norm(&point.state, &solution.atol, solution.rtol)
                .sqrt();
            assert!(
                error_norm < 15.0,
                "error_norm: {} at t = {}. soln: {:?}, expected: {:?}",
                error_norm,
                point.t,
                soln,
                point.state
            );
        }
        *method.state().y
    }

    pub fn test_interpolate<'a, F: VectorField + 'a, Method: OdeSolverMethod<'a, F>>(
        mut s: Method,
    ) {
        let t0 = s.state().t;
        let y0 = *s.state().y;
        let t1 = t0 + 1e6;
        assert!((s.interpolate(t0).unwrap() - y0).norm() < 1e-9);
        assert!(s.interpolate(t1).is_err());
        s.step().unwrap();
        let tmid = t0 + (s.state().t - t0) / 2.0;
        assert!(s.interpolate(s.state().t).is_ok());
        assert!(s.interpolate(tmid).is_ok());
        assert!(s.interpolate(s.state().t + t1).is_err());
    }

    pub fn test_config<'a, F: VectorField + 'a, Method: OdeSolverMethod<'a, F>>(mut s: Method) {
        s.config_mut().set_minimum_timestep(1.0e8);
        assert_eq!(s.config().minimum_timestep(), 1.0e8);
        let mut failed = false;
        for _ in 0..10 {
            if let Err(AttractorError::OdeSolverError(OdeSolverError::StepSizeTooSmall {
                time: _,
            })) = s.step()
            {
                failed = true;
                break;
            }
        }
        assert!(failed);
    }

    pub fn test_state_mut<'a, F: VectorField + 'a, Method: OdeSolverMethod<'a, F>>(
        mut s: Method,
    ) {
        let y = *s.state().y;
        s.state_mut().y[0] = std::f64::consts::PI;
        assert_eq!(s.state_mut().y[0], std::f64::consts::PI);
        assert_eq!(s.state().y[1], y[1]);
        // the solver restarts from the mutated state
        let t = s.state().t;
        s.step().unwrap();
        assert!(s.state().t > t);
        assert!(s.state().y.all_finite());
    }

    #[test]
    fn solve_dense_rejects_bad_t_eval() {
        let (problem, _soln) = exponential_decay_problem(0.1);
        let mut s = problem.bdf().unwrap();
        let res = s.solve_dense(&[0.0, 2.0, 1.0]);
        assert!(matches!(
            res,
            Err(AttractorError::OdeSolverError(OdeSolverError::InvalidTEval))
        ));
        let res = s.solve_dense(&[-1.0, 1.0]);
        assert!(matches!(
            res,
            Err(AttractorError::OdeSolverError(OdeSolverError::InvalidTEval))
        ));
        assert!(s.solve_dense(&[]).unwrap().is_empty());
    }

    #[test]
    fn solve_dense_returns_one_state_per_time() {
        let (problem, soln) = exponential_decay_problem(0.1);
        let t_eval: Vec<f64> = soln.solution_points.iter().map(|p| p.t).collect();
        for ys in [
            problem.bdf().unwrap().solve_dense(&t_eval).unwrap(),
            problem.tsit45().unwrap().solve_dense(&t_eval).unwrap(),
        ] {
            assert_eq!(ys.len(), t_eval.len());
            assert_eq!(ys[0], problem.y0);
            for (y, point) in ys.iter().zip(soln.solution_points.iter()) {
                let error_norm = (y - point.state)
                    .squared_norm(&point.state, &soln.atol, soln.rtol)
                    .sqrt();
                assert!(error_norm < 15.0, "t = {}", point.t);
            }
        }
    }

    #[test]
    fn solve_dense_keeps_prefix_on_failure() {
        use crate::ode_solver::test_models::dydt_y2::dydt_y2;
        use crate::OdeBuilder;

        fn prefix<'a, F: VectorField + 'a>(
            mut s: impl OdeSolverMethod<'a, F>,
            t_eval: &[f64],
        ) -> Vec<State> {
            let mut ys = Vec::new();
            let err = s.solve_dense_into(t_eval, &mut ys).unwrap_err();
            assert!(err.divergence_time().is_some());
            ys
        }

        // y = 1 / (1 - t) blows up at t = 1
        let problem = OdeBuilder::new()
            .init(State::from_element(1.0))
            .build(dydt_y2())
            .unwrap();
        let t_eval: Vec<f64> = (0..20).map(|i| 0.1 * f64::from(i)).collect();
        let results = [
            ("bdf", prefix(problem.bdf().unwrap(), &t_eval)),
            ("tsit45", prefix(problem.tsit45().unwrap(), &t_eval)),
        ];
        for (name, ys) in results {
            // t = 1 falls inside the step that crosses the pole and must not be reported
            assert_eq!(ys.len(), 10, "{name}");
            for (y, &t) in ys.iter().zip(t_eval.iter()) {
                assert!(y.all_finite());
                let expected = 1.0 / (1.0 - t);
                assert!((y[0] - expected).abs() < 1e-3 * expected, "{name} t = {t}");
            }
        }
    }
}
