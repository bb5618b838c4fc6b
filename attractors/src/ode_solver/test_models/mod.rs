use crate::State;

pub mod dydt_y2;
pub mod exponential_decay;

#[derive(Debug, Clone)]
pub struct OdeSolverSolutionPoint {
    pub state: State,
    pub t: f64,
}

/// Reference solution of a test problem, kept sorted in time.
pub struct OdeSolverSolution {
    pub solution_points: Vec<OdeSolverSolutionPoint>,
    pub rtol: f64,
    pub atol: State,
}

impl OdeSolverSolution {
    pub fn push(&mut self, state: State, t: f64) {
        // find the index to insert the new point keeping the times sorted
        let index = self
            .solution_points
            .iter()
            .position(|x| x.t > t)
            .unwrap_or(self.solution_points.len());
        self.solution_points
            .insert(index, OdeSolverSolutionPoint { state, t });
    }
}

impl Default for OdeSolverSolution {
    fn default() -> Self {
        Self {
            solution_points: Vec::new(),
            rtol: 1e-6,
            atol: State::from_element(1e-6),
        }
    }
}
