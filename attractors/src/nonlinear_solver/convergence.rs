use crate::{State, VectorNorm};

/// Rate based convergence test for the Newton iteration.
///
/// The rate of convergence is estimated from the ratio of successive update norms. The iteration
/// is declared diverged if the rate is not below one, or if at this rate it cannot reach the
/// tolerance within the remaining iterations.
#[derive(Clone)]
pub struct Convergence {
    pub rtol: f64,
    pub atol: State,
    tol: f64,
    max_iter: usize,
    niter: usize,
    old_norm: Option<f64>,
}

#[derive(Debug, PartialEq)]
pub enum ConvergenceStatus {
    Converged,
    Diverged,
    Continue,
    MaximumIterations,
}

impl Convergence {
    pub fn new(rtol: f64, atol: State) -> Self {
        let tol = (10.0 * f64::EPSILON / rtol).max(0.03f64.min(rtol.sqrt()));
        Self {
            rtol,
            atol,
            tol,
            max_iter: 4,
            niter: 0,
            old_norm: None,
        }
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }
    pub fn set_max_iter(&mut self, value: usize) {
        self.max_iter = value;
    }
    pub fn niter(&self) -> usize {
        self.niter
    }
    pub fn tol(&self) -> f64 {
        self.tol
    }

    pub fn reset(&mut self) {
        self.niter = 0;
        self.old_norm = None;
    }

    pub fn norm(&self, dy: &State, y: &State) -> f64 {
        dy.squared_norm(y, &self.atol, self.rtol).sqrt()
    }

    /// Record the Newton update `dy` about the current iterate `y` and classify the iteration.
    pub fn check_new_iteration(&mut self, dy: &State, y: &State) -> ConvergenceStatus {
        let norm = self.norm(dy, y);
        self.check_norm(norm)
    }

    pub fn check_norm(&mut self, norm: f64) -> ConvergenceStatus {
        self.niter += 1;
        if !norm.is_finite() {
            return ConvergenceStatus::Diverged;
        }
        if norm == 0.0 {
            return ConvergenceStatus::Converged;
        }
        let rate = self.old_norm.map(|old_norm| norm / old_norm);
        self.old_norm = Some(norm);
        if let Some(rate) = rate {
            if rate >= 1.0 {
                return ConvergenceStatus::Diverged;
            }
            let remaining = (self.max_iter + 1).saturating_sub(self.niter);
            if rate.powi(remaining as i32) / (1.0 - rate) * norm > self.tol {
                return ConvergenceStatus::Diverged;
            }
            if rate / (1.0 - rate) * norm < self.tol {
                return ConvergenceStatus::Converged;
            }
        }
        if self.niter >= self.max_iter {
            return ConvergenceStatus::MaximumIterations;
        }
        ConvergenceStatus::Continue
    }
}
