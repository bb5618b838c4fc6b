use std::cell::RefCell;

use crate::{State, VectorField};

use super::OpStatistics;

/// A [VectorField] given only by its right-hand side. The Jacobian is approximated by forward differences.
pub struct ClosureNoJac<F>
where
    F: Fn(&State, f64, &mut State),
{
    func: F,
    statistics: RefCell<OpStatistics>,
}

impl<F> ClosureNoJac<F>
where
    F: Fn(&State, f64, &mut State),
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            statistics: RefCell::new(OpStatistics::default()),
        }
    }
}

impl<F> VectorField for ClosureNoJac<F>
where
    F: Fn(&State, f64, &mut State),
{
    fn call_inplace(&self, x: &State, t: f64, y: &mut State) {
        self.statistics.borrow_mut().increment_call();
        (self.func)(x, t, y)
    }
    fn statistics(&self) -> OpStatistics {
        self.statistics.borrow().clone()
    }
}
