use std::cell::RefCell;

use crate::{Jacobian, State, VectorField};

use super::OpStatistics;

/// A [VectorField] given by a right-hand side closure and a closure computing its dense Jacobian.
///
/// ```
/// use attractors::{Closure, Jacobian, State, VectorField};
///
/// // dy/dt = -y
/// let decay = Closure::new(
///     |x: &State, _t: f64, y: &mut State| y.copy_from(&(-x)),
///     |_x: &State, _t: f64, j: &mut Jacobian| *j = -Jacobian::identity(),
/// );
/// assert_eq!(decay.call(&State::new(1.0, 2.0, 3.0), 0.0), State::new(-1.0, -2.0, -3.0));
/// ```
pub struct Closure<F, G>
where
    F: Fn(&State, f64, &mut State),
    G: Fn(&State, f64, &mut Jacobian),
{
    func: F,
    jacobian: G,
    statistics: RefCell<OpStatistics>,
}

impl<F, G> Closure<F, G>
where
    F: Fn(&State, f64, &mut State),
    G: Fn(&State, f64, &mut Jacobian),
{
    pub fn new(func: F, jacobian: G) -> Self {
        Self {
            func,
            jacobian,
            statistics: RefCell::new(OpStatistics::default()),
        }
    }
}

impl<F, G> VectorField for Closure<F, G>
where
    F: Fn(&State, f64, &mut State),
    G: Fn(&State, f64, &mut Jacobian),
{
    fn call_inplace(&self, x: &State, t: f64, y: &mut State) {
        self.statistics.borrow_mut().increment_call();
        (self.func)(x, t, y)
    }
    fn jacobian_inplace(&self, x: &State, t: f64, j: &mut Jacobian) {
        self.statistics.borrow_mut().increment_jacobian_eval();
        (self.jacobian)(x, t, j)
    }
    fn statistics(&self) -> OpStatistics {
        self.statistics.borrow().clone()
    }
}
