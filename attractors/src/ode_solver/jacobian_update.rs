/// Outcome of the last step attempt, used to decide when the iteration matrix is refreshed.
pub enum SolverState {
    StepSuccess,
    FirstConvergenceFail,
    SecondConvergenceFail,
    ErrorTestFail,
}

/// Tracks when to re-factorise the Newton iteration matrix `I - c J` (cheap, only `c` changed)
/// and when to re-evaluate the vector field Jacobian `J` itself.
#[derive(Clone)]
pub struct JacobianUpdate {
    steps_since_jacobian_eval: usize,
    steps_since_rhs_jacobian_eval: usize,
    c_at_last_jacobian_update: f64,
    threshold_to_update_jacobian: f64,
    threshold_to_update_rhs_jacobian: f64,
    update_jacobian_after_steps: usize,
    update_rhs_jacobian_after_steps: usize,
}

impl JacobianUpdate {
    pub fn new() -> Self {
        Self {
            steps_since_jacobian_eval: 0,
            steps_since_rhs_jacobian_eval: 0,
            c_at_last_jacobian_update: 1.0,
            threshold_to_update_jacobian: 0.3,
            threshold_to_update_rhs_jacobian: 0.2,
            update_jacobian_after_steps: 20,
            update_rhs_jacobian_after_steps: 50,
        }
    }

    pub fn update_jacobian(&mut self, c: f64) {
        self.steps_since_jacobian_eval = 0;
        self.c_at_last_jacobian_update = c;
    }

    pub fn update_rhs_jacobian(&mut self) {
        self.steps_since_rhs_jacobian_eval = 0;
    }

    pub fn step(&mut self) {
        self.steps_since_jacobian_eval += 1;
        self.steps_since_rhs_jacobian_eval += 1;
    }

    pub fn check_jacobian_update(&self, c: f64, state: &SolverState) -> bool {
        match state {
            SolverState::StepSuccess => {
                self.steps_since_jacobian_eval >= self.update_jacobian_after_steps
                    || (c / self.c_at_last_jacobian_update - 1.0).abs()
                        > self.threshold_to_update_jacobian
            }
            SolverState::FirstConvergenceFail => true,
            SolverState::SecondConvergenceFail => true,
            SolverState::ErrorTestFail => true,
        }
    }

    pub fn check_rhs_jacobian_update(&self, c: f64, state: &SolverState) -> bool {
        match state {
            SolverState::StepSuccess => {
                self.steps_since_rhs_jacobian_eval >= self.update_rhs_jacobian_after_steps
            }
            SolverState::FirstConvergenceFail => {
                (c / self.c_at_last_jacobian_update - 1.0).abs()
                    < self.threshold_to_update_rhs_jacobian
            }
            SolverState::SecondConvergenceFail => self.steps_since_rhs_jacobian_eval > 0,
            SolverState::ErrorTestFail => false,
        }
    }
}

impl Default for JacobianUpdate {
    fn default() -> Self {
        Self::new()
    }
}
