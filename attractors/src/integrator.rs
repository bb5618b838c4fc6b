use std::fmt;

use serde::{Deserialize, Serialize};
use slog::{debug, o, warn, Discard, Logger};

use crate::{
    error::AttractorError, vector_field, Attractor, BdfConfig, Completion, ExplicitRkConfig,
    OdeBuilder, OdeSolverMethod, OdeSolverProblem, ParameterMap, Parameters, SolverStatistics,
    State, Trajectory, VectorField,
};

/// The span of an integration and how densely it is sampled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Window {
    pub start: f64,
    pub end: f64,
    /// Samples per unit time.
    pub density: f64,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 100.0,
            density: 100.0,
        }
    }
}

impl Window {
    pub fn new(start: f64, end: f64, density: f64) -> Self {
        Self {
            start,
            end,
            density,
        }
    }

    /// `round(density * (end - start))` evenly spaced times, both ends included.
    pub fn grid(&self) -> Result<TimeGrid, AttractorError> {
        if !(self.start.is_finite() && self.end.is_finite()) || self.end <= self.start {
            return Err(AttractorError::InvalidTimeGrid(format!(
                "end ({}) must be greater than start ({})",
                self.end, self.start
            )));
        }
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(AttractorError::InvalidTimeGrid(format!(
                "density must be positive, got {}",
                self.density
            )));
        }
        let n = (self.density * (self.end - self.start)).round();
        if !n.is_finite() || n < 1.0 || n > TimeGrid::MAX_POINTS as f64 {
            return Err(AttractorError::InvalidTimeGrid(format!(
                "{} points is not a valid grid size, at most {} are allowed",
                n,
                TimeGrid::MAX_POINTS
            )));
        }
        TimeGrid::linspace(self.start, self.end, n as usize)
    }
}

/// Strictly increasing sample times.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    /// Largest grid [TimeGrid::linspace] and [Window::grid] will allocate.
    pub const MAX_POINTS: usize = 10_000_000;

    /// `n` evenly spaced times from `start` to `end` inclusive. A single point grid is just `start`.
    pub fn linspace(start: f64, end: f64, n: usize) -> Result<Self, AttractorError> {
        if n == 0 {
            return Err(AttractorError::InvalidTimeGrid(
                "grid must have at least one point".to_string(),
            ));
        }
        if n > Self::MAX_POINTS {
            return Err(AttractorError::InvalidTimeGrid(format!(
                "{n} points exceeds the limit of {}",
                Self::MAX_POINTS
            )));
        }
        let times = if n == 1 {
            vec![start]
        } else {
            let step = (end - start) / (n - 1) as f64;
            let mut times: Vec<f64> = (0..n - 1).map(|i| start + i as f64 * step).collect();
            times.push(end);
            times
        };
        Self::from_times(times)
    }

    /// Use the given sample times, which must be finite and strictly increasing.
    pub fn from_times(times: Vec<f64>) -> Result<Self, AttractorError> {
        if times.is_empty() {
            return Err(AttractorError::InvalidTimeGrid(
                "grid must have at least one point".to_string(),
            ));
        }
        if times.iter().any(|t| !t.is_finite()) || times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AttractorError::InvalidTimeGrid(
                "times must be finite and strictly increasing".to_string(),
            ));
        }
        Ok(Self { times })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}

/// The adaptive solver used to step between grid points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Variable order BDF with Newton iteration.
    #[default]
    Bdf,
    /// Explicit Tsitouras 5(4).
    Tsit45,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Bdf => f.write_str("bdf"),
            Method::Tsit45 => f.write_str("tsit45"),
        }
    }
}

/// What to do when the solver can no longer keep its error within tolerance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergencePolicy {
    /// Return [AttractorError::IntegrationDivergence].
    #[default]
    Fail,
    /// Return the trajectory up to the last grid point reached, marked [Completion::Partial].
    Truncate,
}

/// Solve an initial value problem on a fixed time grid.
pub trait SolveIvp {
    /// Integrate `dy/dt = field(y, t)` from `y(grid.start()) = y0`, returning one state per grid time.
    fn solve_ivp<F: VectorField>(
        &self,
        field: &F,
        y0: State,
        grid: &TimeGrid,
    ) -> Result<Trajectory, AttractorError>;
}

/// Integrates catalog attractors (or any [VectorField]) onto a time grid.
///
/// ```
/// use attractors::{Attractor, Integrator, Parameters, State, Window};
///
/// let integrator = Integrator::default();
/// let params = Parameters::preset(Attractor::Lorenz).to_map();
/// let traj = integrator
///     .integrate("lorenz", State::new(0.1, 0.0, 0.0), &params, Window::new(0.0, 1.0, 100.0))
///     .unwrap();
/// assert_eq!(traj.len(), 100);
/// assert_eq!(traj.states()[0], State::new(0.1, 0.0, 0.0));
/// ```
#[derive(Clone)]
pub struct Integrator {
    method: Method,
    rtol: f64,
    atol: f64,
    h0: Option<f64>,
    policy: DivergencePolicy,
    bdf_config: BdfConfig,
    explicit_rk_config: ExplicitRkConfig,
    logger: Logger,
}

impl Default for Integrator {
    fn default() -> Self {
        IntegratorBuilder::new().build()
    }
}

impl fmt::Debug for Integrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Integrator")
            .field("method", &self.method)
            .field("rtol", &self.rtol)
            .field("atol", &self.atol)
            .field("h0", &self.h0)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Integrator {
    pub fn builder() -> IntegratorBuilder {
        IntegratorBuilder::new()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn policy(&self) -> DivergencePolicy {
        self.policy
    }

    /// Integrate the attractor registered as `name`.
    ///
    /// The identifier and parameters are resolved before any solver work, so
    /// [AttractorError::UnknownAttractor] and [AttractorError::MissingParameter] never follow a partial computation.
    pub fn integrate(
        &self,
        name: &str,
        y0: State,
        params: &ParameterMap,
        window: Window,
    ) -> Result<Trajectory, AttractorError> {
        let params = vector_field(name, params)?;
        self.integrate_attractor(&params, y0, window)
    }

    pub fn integrate_attractor(
        &self,
        params: &Parameters,
        y0: State,
        window: Window,
    ) -> Result<Trajectory, AttractorError> {
        let grid = window.grid()?;
        let attractor: Attractor = params.attractor();
        let logger = self.logger.new(o!("attractor" => attractor.name()));
        self.solve_on_grid(&logger, params, y0, &grid)
    }

    fn problem<F: VectorField>(
        &self,
        field: F,
        y0: State,
        t0: f64,
    ) -> Result<OdeSolverProblem<F>, AttractorError> {
        let builder = OdeBuilder::new()
            .t0(t0)
            .rtol(self.rtol)
            .atol([self.atol])
            .init(y0);
        let builder = match self.h0 {
            Some(h0) => builder.h0(h0),
            None => builder,
        };
        builder.build(field)
    }

    fn solve_on_grid<F: VectorField>(
        &self,
        logger: &Logger,
        field: &F,
        y0: State,
        grid: &TimeGrid,
    ) -> Result<Trajectory, AttractorError> {
        debug!(logger, "solve start"; "method" => %self.method, "points" => grid.len(),
            "start" => grid.start(), "end" => grid.end());
        let problem = self.problem(field, y0, grid.start())?;
        let mut states = Vec::with_capacity(grid.len());
        let (res, stats) = match self.method {
            Method::Bdf => {
                let mut solver = problem.bdf()?;
                *solver.config_mut() = self.bdf_config.clone();
                solve_dense_with(solver, grid.times(), &mut states)
            }
            Method::Tsit45 => {
                let mut solver = problem.tsit45()?;
                *solver.config_mut() = self.explicit_rk_config.clone();
                solve_dense_with(solver, grid.times(), &mut states)
            }
        };
        let nsteps = stats.number_of_steps;
        let nfails = stats.number_of_error_test_failures;
        let completion = match res {
            Ok(()) => {
                debug!(logger, "solve complete"; "steps" => nsteps, "error_test_failures" => nfails,
                    "newton_iterations" => stats.number_of_nonlinear_solver_iterations,
                    "linear_solver_setups" => stats.number_of_linear_solver_setups);
                Completion::Complete
            }
            Err(err) => {
                let Some(time) = err.divergence_time() else {
                    return Err(err);
                };
                warn!(logger, "integration diverged"; "time" => time, "error" => %err,
                    "points" => states.len(), "steps" => nsteps);
                match self.policy {
                    DivergencePolicy::Fail => {
                        return Err(AttractorError::IntegrationDivergence { time })
                    }
                    DivergencePolicy::Truncate => Completion::Partial { diverged_at: time },
                }
            }
        };
        let times = grid.times()[..states.len()].to_vec();
        Ok(Trajectory::new(times, states, completion))
    }
}

fn solve_dense_with<'a, F, M>(
    mut solver: M,
    t_eval: &[f64],
    states: &mut Vec<State>,
) -> (Result<(), AttractorError>, SolverStatistics)
where
    F: VectorField + 'a,
    M: OdeSolverMethod<'a, F>,
{
    let res = solver.solve_dense_into(t_eval, states);
    (res, solver.statistics().clone())
}

impl SolveIvp for Integrator {
    fn solve_ivp<F: VectorField>(
        &self,
        field: &F,
        y0: State,
        grid: &TimeGrid,
    ) -> Result<Trajectory, AttractorError> {
        self.solve_on_grid(&self.logger, field, y0, grid)
    }
}

/// Builder for [Integrator]. Defaults: [Method::Bdf], `rtol = atol = 1e-6`, initial step chosen by
/// the solver, [DivergencePolicy::Fail], and a logger that discards everything.
#[derive(Clone)]
pub struct IntegratorBuilder {
    method: Method,
    rtol: f64,
    atol: f64,
    h0: Option<f64>,
    policy: DivergencePolicy,
    bdf_config: BdfConfig,
    explicit_rk_config: ExplicitRkConfig,
    logger: Option<Logger>,
}

impl Default for IntegratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegratorBuilder {
    pub fn new() -> Self {
        Self {
            method: Method::default(),
            rtol: 1e-6,
            atol: 1e-6,
            h0: None,
            policy: DivergencePolicy::default(),
            bdf_config: BdfConfig::default(),
            explicit_rk_config: ExplicitRkConfig::default(),
            logger: None,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    pub fn atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    pub fn h0(mut self, h0: f64) -> Self {
        self.h0 = Some(h0);
        self
    }

    pub fn divergence_policy(mut self, policy: DivergencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn bdf_config(mut self, config: BdfConfig) -> Self {
        self.bdf_config = config;
        self
    }

    pub fn explicit_rk_config(mut self, config: ExplicitRkConfig) -> Self {
        self.explicit_rk_config = config;
        self
    }

    /// Log solver progress to `logger`, see the crate docs for the emitted records.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Tolerances and `h0` are validated when a problem is built, so an invalid value surfaces as
    /// [crate::OdeSolverError::BuilderError] from the first integration.
    pub fn build(self) -> Integrator {
        Integrator {
            method: self.method,
            rtol: self.rtol,
            atol: self.atol,
            h0: self.h0,
            policy: self.policy,
            bdf_config: self.bdf_config,
            explicit_rk_config: self.explicit_rk_config,
            logger: self
                .logger
                .unwrap_or_else(|| Logger::root(Discard, o!())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::OdeSolverError, ode_solver::test_models::dydt_y2::dydt_y2, Attractor, Parameters,
        VectorNorm,
    };

    fn lorenz_map() -> ParameterMap {
        [("sigma", 10.0), ("rho", 28.0), ("beta", 8.0 / 3.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn default_window_has_ten_thousand_points() {
        let grid = Window::default().grid().unwrap();
        assert_eq!(grid.len(), 10_000);
        assert_eq!(grid.start(), 0.0);
        assert_eq!(grid.end(), 100.0);
        assert!(grid.times().windows(2).all(|w| w[0] < w[1]));
        assert!((grid.times()[1] - 100.0 / 9999.0).abs() < 1e-15);
    }

    #[test]
    fn invalid_windows_are_rejected() {
        for window in [
            Window::new(1.0, 1.0, 100.0),
            Window::new(2.0, 1.0, 100.0),
            Window::new(0.0, 1.0, 0.0),
            Window::new(0.0, 1.0, -5.0),
            Window::new(0.0, 1.0, f64::NAN),
            Window::new(0.0, f64::INFINITY, 1.0),
            Window::new(0.0, 1.0, 0.1),
        ] {
            assert!(
                matches!(window.grid(), Err(AttractorError::InvalidTimeGrid(_))),
                "{window:?}"
            );
        }
        assert!(TimeGrid::from_times(vec![0.0, 1.0, 1.0]).is_err());
        assert!(TimeGrid::from_times(vec![]).is_err());
    }

    #[test]
    fn oversized_grids_are_rejected_before_allocating() {
        for window in [
            Window::new(0.0, 1e9, 1e9),
            Window::new(0.0, 1e7, 1.0 + 1e-6),
        ] {
            assert!(
                matches!(window.grid(), Err(AttractorError::InvalidTimeGrid(_))),
                "{window:?}"
            );
        }
        assert!(matches!(
            TimeGrid::linspace(0.0, 1.0, usize::MAX),
            Err(AttractorError::InvalidTimeGrid(_))
        ));
        assert!(TimeGrid::linspace(0.0, 1.0, TimeGrid::MAX_POINTS + 1).is_err());
    }

    #[test]
    fn lorenz_scenario_is_bounded() {
        for method in [Method::Bdf, Method::Tsit45] {
            let integrator = Integrator::builder().method(method).build();
            let y0 = State::new(0.1, 0.0, 0.0);
            let traj = integrator
                .integrate("lorenz", y0, &lorenz_map(), Window::default())
                .unwrap();
            assert_eq!(traj.len(), 10_000);
            assert_eq!(traj.times().len(), 10_000);
            assert!(traj.is_complete());
            assert_eq!(traj.states()[0], y0);
            assert!(traj
                .states()
                .iter()
                .all(|s| s.iter().all(|v| v.is_finite() && v.abs() < 100.0)));
            // the trajectory leaves the origin and settles on the attractor
            let late = &traj.states()[5000..];
            assert!(late.iter().any(|s| s[0] > 5.0));
            assert!(late.iter().any(|s| s[0] < -5.0));
        }
    }

    #[test]
    fn integration_is_deterministic() {
        let integrator = Integrator::default();
        let y0 = State::new(0.1, 0.0, 0.0);
        let window = Window::new(0.0, 10.0, 100.0);
        let a = integrator
            .integrate("lorenz", y0, &lorenz_map(), window)
            .unwrap();
        let b = integrator
            .integrate("lorenz", y0, &lorenz_map(), window)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn methods_agree_on_a_short_window() {
        let params = Parameters::preset(Attractor::Rossler);
        let y0 = Attractor::Rossler.preset_initial_state();
        let window = Window::new(0.0, 2.0, 10.0);
        let tight = |method| {
            Integrator::builder()
                .method(method)
                .rtol(1e-9)
                .atol(1e-9)
                .build()
                .integrate_attractor(&params, y0, window)
                .unwrap()
        };
        let bdf = tight(Method::Bdf);
        let rk = tight(Method::Tsit45);
        for (a, b) in bdf.states().iter().zip(rk.states().iter()) {
            assert!((a - b).norm() < 1e-5 * (1.0 + a.norm()), "{a} vs {b}");
        }
    }

    #[test]
    fn unknown_identifier_fails_before_solving() {
        let err = Integrator::default()
            .integrate(
                "not_a_system",
                State::zeros(),
                &lorenz_map(),
                Window::default(),
            )
            .unwrap_err();
        assert!(matches!(err, AttractorError::UnknownAttractor { .. }));
    }

    #[test]
    fn missing_parameter_fails_before_solving() {
        let mut params = lorenz_map();
        params.remove("beta");
        // the window is invalid too, but parameters are bound before the grid is built
        let err = Integrator::default()
            .integrate("lorenz", State::zeros(), &params, Window::new(1.0, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            AttractorError::MissingParameter {
                attractor: "lorenz",
                key: "beta"
            }
        ));
    }

    #[test]
    fn divergence_fails_by_default() {
        // y = 1 / (1 - t) blows up at t = 1
        let grid = TimeGrid::linspace(0.0, 2.0, 21).unwrap();
        for method in [Method::Bdf, Method::Tsit45] {
            let integrator = Integrator::builder().method(method).build();
            let err = integrator
                .solve_ivp(&dydt_y2(), State::from_element(1.0), &grid)
                .unwrap_err();
            match err {
                AttractorError::IntegrationDivergence { time } => {
                    assert!(time > 0.9 && time <= 1.0 + 1e-3, "{method}: {time}")
                }
                other => panic!("{method}: expected IntegrationDivergence, got {other:?}"),
            }
        }
    }

    #[test]
    fn divergence_truncates_when_asked() {
        let grid = TimeGrid::linspace(0.0, 2.0, 21).unwrap();
        for method in [Method::Bdf, Method::Tsit45] {
            let integrator = Integrator::builder()
                .method(method)
                .divergence_policy(DivergencePolicy::Truncate)
                .build();
            let traj = integrator
                .solve_ivp(&dydt_y2(), State::from_element(1.0), &grid)
                .unwrap();
            let Completion::Partial { diverged_at } = traj.completion() else {
                panic!("{method}: expected a partial trajectory");
            };
            assert!(diverged_at > 0.9);
            // grid points up to t = 0.9 are reached, none past the blow up
            assert_eq!(traj.len(), 10, "{method}");
            assert_eq!(traj.times(), &grid.times()[..10]);
            for (t, y) in traj.iter() {
                assert!(y.all_finite());
                let expected = 1.0 / (1.0 - t);
                assert!((y[0] - expected).abs() < 1e-3 * expected, "{method} t = {t}");
            }
        }
    }

    #[test]
    fn builder_errors_are_not_divergence() {
        let err = Integrator::builder()
            .rtol(-1.0)
            .build()
            .integrate_attractor(
                &Parameters::preset(Attractor::Lorenz),
                State::zeros(),
                Window::new(0.0, 1.0, 10.0),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AttractorError::OdeSolverError(OdeSolverError::BuilderError(_))
        ));
    }
}
