use serde::Serialize;

use crate::{Jacobian, State};

pub mod bdf;
pub mod closure;
pub mod closure_no_jac;

/// The right-hand side `dy/dt = f(y, t)` of a three dimensional autonomous (or not) ODE system.
///
/// This is the single seam consumed by every solver in this crate. Implementations must be pure and
/// deterministic: the same `(x, t)` always yields the same derivative, and evaluation never fails
/// for finite input.
///
/// Only [Self::call_inplace] is required. The Jacobian defaults to a forward difference
/// approximation, override [Self::jacobian_inplace] when an analytic form is available.
pub trait VectorField {
    /// Compute the derivative `y = f(x, t)`.
    fn call_inplace(&self, x: &State, t: f64, y: &mut State);

    /// Compute the Jacobian `J = df/dx` evaluated at `(x, t)`.
    fn jacobian_inplace(&self, x: &State, t: f64, j: &mut Jacobian) {
        let mut f0 = State::zeros();
        self.call_inplace(x, t, &mut f0);
        let mut xp = *x;
        let mut fp = State::zeros();
        for k in 0..3 {
            let delta = f64::EPSILON.sqrt() * x[k].abs().max(1.0);
            xp[k] = x[k] + delta;
            self.call_inplace(&xp, t, &mut fp);
            j.set_column(k, &((fp - f0) / delta));
            xp[k] = x[k];
        }
    }

    fn call(&self, x: &State, t: f64) -> State {
        let mut y = State::zeros();
        self.call_inplace(x, t, &mut y);
        y
    }

    fn jacobian(&self, x: &State, t: f64) -> Jacobian {
        let mut j = Jacobian::zeros();
        self.jacobian_inplace(x, t, &mut j);
        j
    }

    /// Call counters, if the implementation keeps any.
    fn statistics(&self) -> OpStatistics {
        OpStatistics::default()
    }
}

impl<F: VectorField + ?Sized> VectorField for &F {
    fn call_inplace(&self, x: &State, t: f64, y: &mut State) {
        (**self).call_inplace(x, t, y)
    }
    fn jacobian_inplace(&self, x: &State, t: f64, j: &mut Jacobian) {
        (**self).jacobian_inplace(x, t, j)
    }
    fn statistics(&self) -> OpStatistics {
        (**self).statistics()
    }
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct OpStatistics {
    pub number_of_calls: usize,
    pub number_of_jacobian_evals: usize,
}

impl OpStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_call(&mut self) {
        self.number_of_calls += 1;
    }

    pub fn increment_jacobian_eval(&mut self) {
        self.number_of_jacobian_evals += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClosureNoJac;

    #[test]
    fn finite_difference_jacobian_of_linear_field() {
        // f(x) = A x
        let a = Jacobian::new(1.0, 2.0, 0.0, -1.0, 0.5, 3.0, 0.0, 0.0, -2.0);
        let op = ClosureNoJac::new(move |x: &State, _t: f64, y: &mut State| {
            y.copy_from(&(a * x));
        });
        let j = op.jacobian(&State::new(0.3, -1.2, 4.0), 0.0);
        for (got, expect) in j.iter().zip(a.iter()) {
            assert!((got - expect).abs() < 1e-6, "{got} != {expect}");
        }
    }
}
