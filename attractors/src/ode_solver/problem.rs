use crate::{
    error::AttractorError, Bdf, BdfState, ExplicitRk, NewtonNonlinearSolver, OdeSolverState,
    RkState, State, Tableau, VectorField,
};

/// An initial value problem `dy/dt = f(y, t)`, `y(t0) = y0`, together with the error tolerances
/// used by every solver built from it. Usually created with [crate::OdeBuilder].
pub struct OdeSolverProblem<F: VectorField> {
    pub eqn: F,
    pub y0: State,
    pub rtol: f64,
    pub atol: State,
    pub t0: f64,
    pub h0: Option<f64>,
}

impl<F: VectorField> OdeSolverProblem<F> {
    pub fn new(eqn: F, y0: State, rtol: f64, atol: State, t0: f64, h0: Option<f64>) -> Self {
        Self {
            eqn,
            y0,
            rtol,
            atol,
            t0,
            h0,
        }
    }

    pub fn eqn(&self) -> &F {
        &self.eqn
    }

    pub fn bdf_state(&self) -> Result<BdfState, AttractorError> {
        BdfState::new(self, 1)
    }

    /// Create a new Bdf solver starting from `state`.
    pub fn bdf_solver(
        &self,
        state: BdfState,
    ) -> Result<Bdf<'_, F, NewtonNonlinearSolver>, AttractorError> {
        let newton_solver = NewtonNonlinearSolver::default();
        Bdf::new(self, state, newton_solver)
    }

    pub fn bdf(&self) -> Result<Bdf<'_, F, NewtonNonlinearSolver>, AttractorError> {
        let state = self.bdf_state()?;
        self.bdf_solver(state)
    }

    /// Create a new state for an explicit Runge-Kutta solver using `tableau`,
    /// the initial step is chosen for the order of the tableau.
    pub fn rk_state(&self, tableau: &Tableau) -> Result<RkState, AttractorError> {
        RkState::new(self, tableau.order())
    }

    pub fn explicit_rk_solver(
        &self,
        state: RkState,
        tableau: Tableau,
    ) -> Result<ExplicitRk<'_, F>, AttractorError> {
        ExplicitRk::new(self, state, tableau)
    }

    /// Tsitouras 5(4) solver starting from `state`.
    pub fn tsit45_solver(&self, state: RkState) -> Result<ExplicitRk<'_, F>, AttractorError> {
        self.explicit_rk_solver(state, Tableau::tsit45())
    }

    pub fn tsit45(&self) -> Result<ExplicitRk<'_, F>, AttractorError> {
        let tableau = Tableau::tsit45();
        let state = self.rk_state(&tableau)?;
        self.explicit_rk_solver(state, tableau)
    }
}
