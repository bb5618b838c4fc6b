use crate::{
    error::{AttractorError, OdeSolverError},
    ode_solver_error, OdeSolverProblem, State, VectorField,
};

/// Builder for ODE problems. Use methods to set parameters and then call one of the build methods when done.
///
/// # Example
///
/// ```
/// use attractors::{ClosureNoJac, OdeBuilder, OdeSolverMethod, State};
///
/// let eqn = ClosureNoJac::new(|y: &State, _t: f64, dy: &mut State| *dy = -y * 0.1);
/// let problem = OdeBuilder::new()
///     .rtol(1e-6)
///     .atol([1e-6])
///     .init(State::new(1.0, 1.0, 1.0))
///     .build(eqn)
///     .unwrap();
/// let mut solver = problem.bdf().unwrap();
/// let y = solver.solve_dense(&[0.0, 1.0, 2.0]).unwrap();
/// assert_eq!(y.len(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct OdeBuilder {
    t0: f64,
    h0: Option<f64>,
    rtol: f64,
    atol: Vec<f64>,
    y0: Option<State>,
}

impl Default for OdeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OdeBuilder {
    /// Create a new builder with default parameters:
    /// - t0 = 0.0
    /// - h0 = chosen by the solver
    /// - rtol = 1e-6
    /// - atol = [1e-6]
    pub fn new() -> Self {
        Self {
            t0: 0.0,
            h0: None,
            rtol: 1e-6,
            atol: vec![1e-6],
            y0: None,
        }
    }

    /// Set the initial time.
    pub fn t0(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }

    /// Set the initial step size, otherwise the solver estimates one.
    pub fn h0(mut self, h0: f64) -> Self {
        self.h0 = Some(h0);
        self
    }

    /// Set the relative tolerance.
    pub fn rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    /// Set the absolute tolerance, either one value for all components or one per component.
    pub fn atol<V>(mut self, atol: V) -> Self
    where
        V: IntoIterator<Item = f64>,
    {
        self.atol = atol.into_iter().collect();
        self
    }

    /// Set the initial state.
    pub fn init(mut self, y0: State) -> Self {
        self.y0 = Some(y0);
        self
    }

    fn build_atol(atol: Vec<f64>) -> Result<State, AttractorError> {
        let atol = match atol.len() {
            1 => State::from_element(atol[0]),
            3 => State::from_iterator(atol),
            n => {
                return Err(ode_solver_error!(
                    BuilderError,
                    format!("Invalid number of absolute tolerances. Expected 1 or 3, got {n}.")
                ))
            }
        };
        if atol.iter().any(|&a| !a.is_finite() || a < 0.0) {
            return Err(ode_solver_error!(
                BuilderError,
                "Absolute tolerances must be finite and non-negative"
            ));
        }
        Ok(atol)
    }

    /// Build an ODE problem for the vector field `eqn`.
    pub fn build<F: VectorField>(self, eqn: F) -> Result<OdeSolverProblem<F>, AttractorError> {
        let y0 = self
            .y0
            .ok_or_else(|| ode_solver_error!(BuilderError, "Initial state not set"))?;
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(ode_solver_error!(
                BuilderError,
                format!("Relative tolerance must be positive, got {}", self.rtol)
            ));
        }
        if let Some(h0) = self.h0 {
            if !h0.is_finite() || h0 <= 0.0 {
                return Err(ode_solver_error!(
                    BuilderError,
                    format!("Initial step size must be positive, got {h0}")
                ));
            }
        }
        let atol = Self::build_atol(self.atol)?;
        Ok(OdeSolverProblem::new(
            eqn, y0, self.rtol, atol, self.t0, self.h0,
        ))
    }
}
